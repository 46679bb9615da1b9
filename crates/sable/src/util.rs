use std::fmt;

/// Turn a formatting closure into a `Display` value.
///
/// Dumps that need the grammar for symbol names (`TerminalSet`, the
/// action table) are built on this.
pub fn display_fn<F>(f: F) -> impl fmt::Display
where
    F: Fn(&mut fmt::Formatter<'_>) -> fmt::Result,
{
    struct DisplayFn<F>(F);

    impl<F> fmt::Display for DisplayFn<F>
    where
        F: Fn(&mut fmt::Formatter<'_>) -> fmt::Result,
    {
        fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            (self.0)(formatter)
        }
    }

    DisplayFn(f)
}

/// Write `items` separated by a single space.
pub fn write_spaced<I>(f: &mut fmt::Formatter<'_>, items: I) -> fmt::Result
where
    I: IntoIterator,
    I::Item: fmt::Display,
{
    for (i, item) in items.into_iter().enumerate() {
        if i > 0 {
            f.write_str(" ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spaced_symbols() {
        let items = ["id:3:1", "num:4:1"];
        let shown = display_fn(|f| write_spaced(f, items)).to_string();
        assert_eq!(shown, "id:3:1 num:4:1");
        assert_eq!(display_fn(|f| write_spaced(f, [0u8; 0])).to_string(), "");
    }
}
