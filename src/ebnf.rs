//! EBNF grammar handling
//!
//! A grammar is parsed once into a [`Grammar`], then reshaped per request:
//! [`Grammar::inlined`] substitutes productions into their users and an
//! [`Extractor`] pulls a bounded sub-grammar out of the result.
//!
//! ```rust
//! use sqldiagram::ebnf::{Extractor, Grammar, Presentation};
//!
//! let grammar = Grammar::parse("drop_stmt ::= 'DROP' ( 'TABLE' | 'VIEW' ) IDENT\n")?;
//! let fragment = Extractor::new("drop_stmt")
//!     .extract(&grammar)?
//!     .to_fragment(&Presentation::default());
//! assert_eq!(
//!     fragment.ebnf,
//!     "drop_stmt ::=\n\t'DROP' 'TABLE' identifier\n\t| 'DROP' 'VIEW' identifier\n"
//! );
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod error;
pub mod extract;
pub mod grammar;
pub mod inline;
pub mod lexer;
pub mod parser;

pub use error::GrammarError;
pub use extract::{ExtractedFragment, ExtractedProduction, Extraction, Extractor, Presentation};
pub use grammar::{write_production, Expression, Grammar, Quantifier, Repetition};
pub use parser::{parse, SyntaxError};
