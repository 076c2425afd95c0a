//! Composable processing stages
//!
//! Every step applied to one statement (inline, extract, rewrite, render) is a
//! [`Runnable`] stage. Stages chain into a [`Transform`] whose input and
//! output types are checked at compile time:
//!
//! ```rust,ignore
//! let reduce = Transform::<Arc<Grammar>, Arc<Grammar>>::from_fn(Ok)
//!     .then(Inlining::new(["drop_target"]))      // Arc<Grammar> -> Grammar
//!     .then(Extracting::new(extractor, presentation)); // Grammar -> ExtractedFragment
//! let fragment = reduce.run(grammar)?;
//! ```
//!
//! Transforms are `Send + Sync`, so one built pipeline can be handed to a
//! worker thread. See [`stages`] for the individual steps.

pub mod stages;

use crate::ebnf::{GrammarError, SyntaxError};
use crate::render::RenderError;
use std::fmt;

/// Anything that can go wrong between grammar text and finished markup.
///
/// `Syntax` aborts a whole run; every other variant is scoped to one statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    Syntax(SyntaxError),
    Grammar(GrammarError),
    Render(RenderError),
    /// A worker panicked before producing a result.
    Panicked(String),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Syntax(err) => write!(f, "{}", err),
            PipelineError::Grammar(err) => write!(f, "{}", err),
            PipelineError::Render(err) => write!(f, "{}", err),
            PipelineError::Panicked(message) => write!(f, "worker panicked: {}", message),
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PipelineError::Syntax(err) => Some(err),
            PipelineError::Grammar(err) => Some(err),
            PipelineError::Render(err) => Some(err),
            PipelineError::Panicked(_) => None,
        }
    }
}

impl From<SyntaxError> for PipelineError {
    fn from(err: SyntaxError) -> Self {
        PipelineError::Syntax(err)
    }
}

impl From<GrammarError> for PipelineError {
    fn from(err: GrammarError) -> Self {
        PipelineError::Grammar(err)
    }
}

impl From<RenderError> for PipelineError {
    fn from(err: RenderError) -> Self {
        PipelineError::Render(err)
    }
}

/// A single processing step from `I` to `O`.
pub trait Runnable<I, O> {
    fn run(&self, input: I) -> Result<O, PipelineError>;
}

/// A chain of stages from `I` to `O`.
pub struct Transform<I, O> {
    run_fn: Box<dyn Fn(I) -> Result<O, PipelineError> + Send + Sync>,
}

impl<I, O> Transform<I, O> {
    /// Create a transform from a function
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(I) -> Result<O, PipelineError> + Send + Sync + 'static,
    {
        Transform {
            run_fn: Box::new(f),
        }
    }

    /// Feed this transform's output into `stage`.
    pub fn then<O2, S>(self, stage: S) -> Transform<I, O2>
    where
        S: Runnable<O, O2> + Send + Sync + 'static,
        I: 'static,
        O: 'static,
        O2: 'static,
    {
        let prev_run = self.run_fn;
        Transform {
            run_fn: Box::new(move |input| {
                let intermediate = prev_run(input)?;
                stage.run(intermediate)
            }),
        }
    }

    pub fn run(&self, input: I) -> Result<O, PipelineError> {
        (self.run_fn)(input)
    }
}

impl<I, O> Runnable<I, O> for Transform<I, O>
where
    I: 'static,
    O: 'static,
{
    fn run(&self, input: I) -> Result<O, PipelineError> {
        Transform::run(self, input)
    }
}
