//! Grammar source loading
//!
//! [`GrammarSource`] holds raw grammar text read from a file, stdin or an
//! `http(s)://` URL, and hands it to a parser or any other [`Transform`].
//!
//! ```rust,ignore
//! let grammar = GrammarSource::open("sql.ebnf")?.parse()?;
//! ```

use crate::ebnf::{Grammar, SyntaxError};
use crate::pipeline::{PipelineError, Transform};
use std::fmt;
use std::fs;
use std::io::Read;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// The file or stdin could not be read.
    Io(String),
    /// The URL could not be fetched.
    Http(String),
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceError::Io(msg) => write!(f, "IO error: {}", msg),
            SourceError::Http(msg) => write!(f, "HTTP error: {}", msg),
        }
    }
}

impl std::error::Error for SourceError {}

impl From<std::io::Error> for SourceError {
    fn from(err: std::io::Error) -> Self {
        SourceError::Io(err.to_string())
    }
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        SourceError::Http(err.to_string())
    }
}

/// Raw grammar text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrammarSource {
    source: String,
}

impl GrammarSource {
    /// Load from `addr`: `-` is stdin, `http://` and `https://` are fetched,
    /// anything else is a file path.
    pub fn open(addr: &str) -> Result<Self, SourceError> {
        if addr == "-" {
            Self::from_stdin()
        } else if addr.starts_with("http://") || addr.starts_with("https://") {
            Self::from_url(addr)
        } else {
            Self::from_path(addr)
        }
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, SourceError> {
        let source = fs::read_to_string(path)?;
        Ok(GrammarSource { source })
    }

    pub fn from_stdin() -> Result<Self, SourceError> {
        let mut source = String::new();
        std::io::stdin().read_to_string(&mut source)?;
        Ok(GrammarSource { source })
    }

    /// Fetch with a blocking request; call outside of an async context.
    pub fn from_url(url: &str) -> Result<Self, SourceError> {
        log::info!("fetching grammar: {}", url);
        let response = reqwest::blocking::get(url)?.error_for_status()?;
        Ok(GrammarSource {
            source: response.text()?,
        })
    }

    pub fn from_string<S: Into<String>>(source: S) -> Self {
        GrammarSource {
            source: source.into(),
        }
    }

    pub fn text(&self) -> &str {
        &self.source
    }

    pub fn parse(&self) -> Result<Grammar, SyntaxError> {
        Grammar::parse(&self.source)
    }

    /// Run a transform on the source text.
    pub fn with<O: 'static>(&self, transform: &Transform<String, O>) -> Result<O, PipelineError> {
        transform.run(self.source.clone())
    }
}
