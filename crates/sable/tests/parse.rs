use anyhow::Context as _;
use sable::{
    build_table, parse, parse_with, Action, ActionTable, AstNode, BuildError, Compiled,
    ConflictKind, Item, Literal, Param, ParseError, ParserDefinition, Position, Reduce,
    RuleIndex, StateKey, Token, TokenKind, Warning,
};
use sable_runtime::{AstBuilderError, Discard, Parser, Step, TableConsistencyError};
use std::{env, fs, path::PathBuf};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn compile(name: &str) -> anyhow::Result<Compiled> {
    init_tracing();
    let path = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?)
        .join(format!("tests/{}.grammar", name));
    let source = fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
    Ok(build_table(source.lines())?)
}

/// Split `source` on whitespace, one token per word.
fn lex(source: &str) -> Vec<Token> {
    source
        .split_whitespace()
        .enumerate()
        .map(|(i, word)| {
            let position = Position {
                line: 1,
                column: i as u32 + 1,
            };
            let kind = match word {
                "#" => return Token::end(position),
                "var" | "func" | "while" | "if" | "else" => TokenKind::Keyword,
                "+" | "-" | "*" | "/" | "=" => TokenKind::Operator,
                w if w.chars().all(|c| c.is_ascii_digit()) => TokenKind::Integer,
                w if w.starts_with(char::is_alphabetic) => TokenKind::Identifier,
                _ => TokenKind::Punct,
            };
            Token::new(kind, word, position)
        })
        .collect()
}

fn int(n: i64) -> AstNode {
    AstNode::Literal(Literal::Integer(n))
}

fn ident(name: &str) -> AstNode {
    AstNode::Identifier(name.to_owned())
}

fn binary(left: AstNode, op: &str, right: AstNode) -> AstNode {
    AstNode::Binary {
        left: Box::new(left),
        op: op.to_owned(),
        right: Box::new(right),
    }
}

fn var_decl(name: &str, ty: &str, init: Option<AstNode>) -> AstNode {
    AstNode::VarDecl {
        name: name.to_owned(),
        ty: ty.to_owned(),
        init: init.map(Box::new),
    }
}

fn assign(target: &str, value: AstNode) -> AstNode {
    AstNode::Assign {
        target: target.to_owned(),
        value: Box::new(value),
    }
}

const SIMPLE: &[&str] = &[
    "<Z> -> <S> #",
    "<S> -> <S> + <T> ~BinaryExpr",
    "<S> -> <T>",
    "<T> -> id ~Ident",
];

#[test]
fn accepts_binary_expression() -> anyhow::Result<()> {
    init_tracing();
    let compiled = build_table(SIMPLE)?;
    let ast = compiled.parse(&lex("a + b #"))?;
    assert_eq!(ast, binary(ident("a"), "+", ident("b")));
    Ok(())
}

#[test]
fn rejects_adjacent_identifiers() -> anyhow::Result<()> {
    init_tracing();
    let compiled = build_table(SIMPLE)?;
    match compiled.parse(&lex("a b #")) {
        Err(ParseError::UnexpectedToken { state, symbol, .. }) => {
            assert_eq!(state, "id:3:1");
            assert_eq!(symbol, "id");
        }
        res => panic!("unexpected result: {:?}", res),
    }
    Ok(())
}

#[test]
fn arithmetic_precedence() -> anyhow::Result<()> {
    let compiled = compile("arithmetic")?;
    assert!(compiled.conflicts.is_empty(), "{:?}", compiled.conflicts);

    let ast = compiled.parse(&lex("1 + 2 * 3 #"))?;
    assert_eq!(ast, binary(int(1), "+", binary(int(2), "*", int(3))));
    Ok(())
}

#[test]
fn arithmetic_parentheses() -> anyhow::Result<()> {
    let compiled = compile("arithmetic")?;
    let ast = compiled.parse(&lex("( 1 + 2 ) * 3 #"))?;
    assert_eq!(ast, binary(binary(int(1), "+", int(2)), "*", int(3)));
    Ok(())
}

#[test]
fn arithmetic_unary_minus() -> anyhow::Result<()> {
    let compiled = compile("arithmetic")?;
    let ast = compiled.parse(&lex("- x - 1 #"))?;
    let negated = AstNode::Unary {
        op: "-".to_owned(),
        operand: Box::new(ident("x")),
    };
    assert_eq!(ast, binary(negated, "-", int(1)));
    Ok(())
}

#[test]
fn unexpected_token() -> anyhow::Result<()> {
    let compiled = compile("arithmetic")?;
    let err = compiled.parse(&lex("1 + + 2 #")).unwrap_err();
    assert_eq!(err.code(), "P008");
    match err {
        ParseError::UnexpectedToken {
            state,
            symbol,
            position,
        } => {
            assert_eq!(state, "+:1:2");
            assert_eq!(symbol, "+");
            assert_eq!(position, Position { line: 1, column: 3 });
        }
        err => panic!("unexpected error: {}", err),
    }
    Ok(())
}

#[test]
fn statements() -> anyhow::Result<()> {
    let compiled = compile("statements")?;
    assert!(compiled.conflicts.is_empty(), "{:?}", compiled.conflicts);

    let source = "
        var x : int = 1 ;
        var y : int ;
        while x { x = x + 1 ; }
        if x { y = 1 ; } else { y = 2 ; }
        #";
    let mut warnings = vec![];
    let ast = parse_with(&lex(source), &compiled.table, &compiled.grammar, &mut warnings)?;
    assert!(warnings.is_empty(), "{:?}", warnings);

    let expected = AstNode::Program(vec![
        var_decl("x", "int", Some(int(1))),
        var_decl("y", "int", None),
        AstNode::While {
            condition: Box::new(ident("x")),
            body: Box::new(AstNode::Block(vec![assign(
                "x",
                binary(ident("x"), "+", int(1)),
            )])),
        },
        AstNode::If {
            condition: Box::new(ident("x")),
            then_branch: Box::new(AstNode::Block(vec![assign("y", int(1))])),
            elifs: vec![],
            else_branch: Some(Box::new(AstNode::Block(vec![assign("y", int(2))]))),
        },
    ]);
    assert_eq!(ast, expected);
    Ok(())
}

#[test]
fn function_declarations() -> anyhow::Result<()> {
    let compiled = compile("statements")?;
    assert!(compiled.conflicts.is_empty(), "{:?}", compiled.conflicts);

    let source = "
        func add ( a : int , b : int ) : int { var s : int = a + b ; }
        func main ( ) : void { x = 1 ; }
        #";
    let ast = compiled.parse(&lex(source))?;

    let param = |name: &str| Param {
        name: name.to_owned(),
        ty: "int".to_owned(),
    };
    let expected = AstNode::Program(vec![
        AstNode::FuncDecl {
            name: "add".to_owned(),
            params: vec![param("a"), param("b")],
            return_type: "int".to_owned(),
            body: Box::new(AstNode::Block(vec![var_decl(
                "s",
                "int",
                Some(binary(ident("a"), "+", ident("b"))),
            )])),
        },
        AstNode::FuncDecl {
            name: "main".to_owned(),
            params: vec![],
            return_type: "void".to_owned(),
            body: Box::new(AstNode::Block(vec![assign("x", int(1))])),
        },
    ]);
    assert_eq!(ast, expected);
    Ok(())
}

#[test]
fn var_decl_without_type_name() -> anyhow::Result<()> {
    init_tracing();
    let compiled = build_table([
        "<Z> -> <D> #",
        "<D> -> var id : int = <E> ; ~VarDecl",
        "<E> -> num ~Literal",
    ])?;
    assert!(compiled.conflicts.is_empty(), "{:?}", compiled.conflicts);

    // `int` as a keyword never reaches the AST stack
    let tokens: Vec<Token> = lex("var x : int = 1 ; #")
        .into_iter()
        .map(|token| match token.lexeme.as_str() {
            "int" => Token::new(TokenKind::Keyword, "int", token.position),
            _ => token,
        })
        .collect();

    let err = compiled.parse(&tokens).unwrap_err();
    assert_eq!(err.code(), "P007");
    assert!(matches!(
        err,
        ParseError::AstBuilder(AstBuilderError::Shape { rule: 1, .. })
    ));
    Ok(())
}

#[test]
fn dangling_else_prefers_shift() -> anyhow::Result<()> {
    let compiled = compile("dangling_else")?;
    assert_eq!(compiled.conflicts.len(), 1);
    let conflict = &compiled.conflicts[0];
    assert_eq!(conflict.kind, ConflictKind::ShiftReduce);
    assert_eq!(conflict.symbol, "else");
    assert_eq!(conflict.rejected, RuleIndex::new(1));
    Ok(())
}

#[test]
fn reduced_symbol_is_requeued_before_lookahead() -> anyhow::Result<()> {
    let compiled = compile("arithmetic")?;
    let tokens = lex("x #");
    let mut parser = Parser::new(
        ParserDefinition::new(&compiled.grammar, &compiled.table),
        &tokens,
    );

    assert_eq!(
        parser.step(&mut Discard)?,
        Step::Shifted {
            symbol: "id".to_owned()
        }
    );
    assert_eq!(
        parser.step(&mut Discard)?,
        Step::Reduced {
            rule: 9,
            left: "<F>".to_owned()
        }
    );

    let input: Vec<&str> = parser.input().iter().map(|q| q.symbol.as_str()).collect();
    assert_eq!(input, ["<F>", "#", "#"]);
    assert!(parser.input()[0].is_reduced());
    assert!(!parser.input()[1].is_reduced());
    Ok(())
}

fn corrupt(compiled: &mut Compiled, symbol: &str, rule: u32) {
    let key = StateKey::Item(Item::new("num", RuleIndex::new(10), 1));
    let state = compiled.table.find_state(&key).unwrap();
    compiled.table.insert(
        state,
        symbol,
        Action::Reduce(Reduce {
            rule: RuleIndex::new(rule),
            action: Some("BinaryExpr".to_owned()),
        }),
    );
}

#[test]
fn corrupted_reduce_is_table_inconsistency() -> anyhow::Result<()> {
    let mut compiled = compile("arithmetic")?;
    corrupt(&mut compiled, "+", 1);

    let err = compiled.parse(&lex("1 + 2 #")).unwrap_err();
    assert_eq!(err.code(), "P005");
    assert!(matches!(
        err,
        ParseError::TableConsistency(TableConsistencyError::StackMismatch { rule: 1, .. })
    ));
    Ok(())
}

#[test]
fn reduce_by_unknown_rule() -> anyhow::Result<()> {
    let mut compiled = compile("arithmetic")?;
    corrupt(&mut compiled, "#", 99);

    let err = compiled.parse(&lex("1 #")).unwrap_err();
    assert_eq!(err.code(), "P003");
    Ok(())
}

#[test]
fn deterministic_tables() -> anyhow::Result<()> {
    let a = compile("statements")?;
    let b = compile("statements")?;
    assert_eq!(a.table.to_json()?, b.table.to_json()?);
    Ok(())
}

#[test]
fn parse_with_loaded_table() -> anyhow::Result<()> {
    let compiled = compile("statements")?;
    let table = ActionTable::from_json(&compiled.table.to_json()?)?;
    assert_eq!(table.len(), compiled.table.len());

    let tokens = lex("var a : int = 1 ; a = a + 2 ; #");
    assert_eq!(
        parse(&tokens, &table, &compiled.grammar)?,
        compiled.parse(&tokens)?
    );
    Ok(())
}

#[test]
fn rule_without_action_promotes_first_node() -> anyhow::Result<()> {
    init_tracing();
    let compiled = build_table(["<Z> -> <P> #", "<P> -> <A> <A>", "<A> -> id ~Ident"])?;
    let mut warnings = vec![];
    let ast = parse_with(&lex("a b #"), &compiled.table, &compiled.grammar, &mut warnings)?;

    assert_eq!(ast, ident("a"));
    assert_eq!(warnings.len(), 1);
    assert!(matches!(
        &warnings[0],
        Warning::BuilderUsage {
            rule: 1,
            children: 2,
            promoted: true,
            ..
        }
    ));
    Ok(())
}

#[test]
fn rule_without_action_or_children() -> anyhow::Result<()> {
    init_tracing();
    let compiled = build_table(["<Z> -> <S> #", "<S> -> ( )"])?;
    let mut warnings = vec![];
    let err = parse_with(&lex("( ) #"), &compiled.table, &compiled.grammar, &mut warnings)
        .unwrap_err();

    // neither rule produces a node, so nothing is left to return
    assert_eq!(err.code(), "P006");
    assert_eq!(warnings.len(), 2);
    assert!(matches!(
        &warnings[0],
        Warning::BuilderUsage {
            rule: 1,
            children: 0,
            promoted: false,
            ..
        }
    ));
    Ok(())
}

#[test]
fn epsilon_rule_is_never_reduced() -> anyhow::Result<()> {
    let compiled = compile("optional")?;

    // `<Opt> -> e` has no item states, so the bare form is rejected
    match compiled.parse(&lex("a #")) {
        Err(ParseError::UnexpectedToken { symbol, .. }) => assert_eq!(symbol, "#"),
        res => panic!("unexpected result: {:?}", res),
    }
    Ok(())
}

#[test]
fn unknown_semantic_action() -> anyhow::Result<()> {
    init_tracing();
    let compiled = build_table(["<Z> -> <T> #", "<T> -> id ~Bogus"])?;
    let err = compiled.parse(&lex("x #")).unwrap_err();
    assert_eq!(err.code(), "P007");
    assert!(matches!(err, ParseError::AstBuilder(..)));
    Ok(())
}

#[test]
fn malformed_grammar() {
    let err = build_table(["<Z> -> <T> #", "<T> id"]).unwrap_err();
    assert_eq!(err.code(), "B002");
    match err {
        BuildError::Grammar(err) => assert!(err.to_string().starts_with("line 2:"), "{}", err),
        err => panic!("unexpected error: {}", err),
    }
}
