//! # sqldiagram
//!
//! Reduces a full SQL grammar written in EBNF to small per-statement
//! sub-grammars and turns them into railroad diagrams.
//!
//! The pieces, leaf first:
//!
//! - [`ebnf`]: grammar model, parser, inliner and extractor
//! - [`pipeline`]: composable stages running one statement end to end
//! - [`batch`]: the statement catalog and the concurrent batch runner
//! - [`source`], [`render`], [`markup`], [`emit`]: loading grammars, talking to
//!   the diagram generator, post-processing its markup and writing files

pub mod batch;
pub mod ebnf;
pub mod emit;
pub mod markup;
pub mod pipeline;
pub mod render;
pub mod source;
