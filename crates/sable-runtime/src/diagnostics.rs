//! Non-fatal diagnostics.

use std::fmt;

/// A sink receiving non-fatal diagnostics of type `D`.
pub trait Diagnostics<D> {
    fn report(&mut self, diagnostic: D);
}

impl<D> Diagnostics<D> for Vec<D> {
    fn report(&mut self, diagnostic: D) {
        self.push(diagnostic);
    }
}

impl<D, T: ?Sized> Diagnostics<D> for &mut T
where
    T: Diagnostics<D>,
{
    fn report(&mut self, diagnostic: D) {
        (**self).report(diagnostic)
    }
}

/// A sink that drops every diagnostic.
#[derive(Debug, Default, Copy, Clone)]
pub struct Discard;

impl<D> Diagnostics<D> for Discard {
    fn report(&mut self, _: D) {}
}

/// A warning raised while synthesizing the AST.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Warning {
    /// A rule without semantic action reduced children that cannot be
    /// promoted unchanged.
    BuilderUsage {
        rule: usize,
        left: String,
        children: usize,
        promoted: bool,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BuilderUsage {
                rule,
                left,
                children,
                promoted,
            } => {
                write!(
                    f,
                    "rule {} ({}) has no semantic action but reduced {} AST children",
                    rule, left, children
                )?;
                if *promoted {
                    f.write_str("; the first node is kept")?;
                } else {
                    f.write_str("; no node is kept")?;
                }
                Ok(())
            }
        }
    }
}
