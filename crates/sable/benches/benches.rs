use std::{env, path::PathBuf};

use criterion::{criterion_group, criterion_main, Criterion};
use sable::{
    automaton::Config,
    first_sets::{FirstSets, FollowSets},
    grammar::Grammar,
    Discard,
};

criterion_main!(benches);
criterion_group!(benches, bench_expressions, bench_statements);

fn bench_expressions(c: &mut Criterion) {
    bench_table_gen(c, "arithmetic");
    bench_table_gen(c, "dangling_else");
}

fn bench_statements(c: &mut Criterion) {
    bench_table_gen(c, "statements");
    bench_table_gen(c, "optional");
}

fn bench_table_gen(c: &mut Criterion, grammar_name: &str) {
    let project_root = env::var_os("CARGO_MANIFEST_DIR")
        .map(PathBuf::from)
        .expect("missing environment variable: `CARGO_MANIFEST_DIR'");
    let grammar =
        Grammar::from_file(project_root.join(format!("tests/{}.grammar", grammar_name))).unwrap();

    let mut group = c.benchmark_group(grammar_name);
    group.bench_function("FirstFollow", |b| {
        b.iter(|| {
            let first = FirstSets::new(&grammar);
            FollowSets::new(&grammar, &first)
        });
    });
    let first = FirstSets::new(&grammar);
    let follow = FollowSets::new(&grammar, &first);
    group.bench_function("Table", |b| {
        b.iter(|| Config::new().build(&grammar, &follow, &mut Discard));
    });
    group.finish();
}
