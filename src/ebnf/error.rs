//! Errors raised while reshaping a parsed grammar

use std::fmt;

/// Failure of an inline or extract request against a grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrammarError {
    /// A root or inline target is not defined in the grammar.
    UnknownProduction { name: String },
    /// Inlining the production would substitute it into itself forever.
    InlineCycle { name: String },
    /// Alternative filters removed every alternative of the root.
    EmptyExtraction { root: String },
}

impl fmt::Display for GrammarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrammarError::UnknownProduction { name } => {
                write!(f, "couldn't find production `{}`", name)
            }
            GrammarError::InlineCycle { name } => {
                write!(f, "cannot inline `{}`: its body refers back to itself", name)
            }
            GrammarError::EmptyExtraction { root } => {
                write!(f, "no alternative of `{}` survives the match/exclude filters", root)
            }
        }
    }
}

impl std::error::Error for GrammarError {}
