//! Diagram rendering
//!
//! A [`Renderer`] turns an EBNF fragment into diagram markup. The batch runner
//! only sees the trait; [`HttpRenderer`] talks to a Railroad Diagram Generator
//! endpoint and closures can stand in for it in tests.

use sqldiagram_config::RendererConfig;
use std::fmt;
use std::time::Duration;

/// Failure while producing or post-processing diagram markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// The request could not be sent or its response could not be read.
    Http(String),
    /// The endpoint answered with a non-success status.
    Status { status: u16, body: String },
    /// The renderer output has no element with this tag.
    MissingElement { tag: String },
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::Http(message) => write!(f, "renderer request failed: {}", message),
            RenderError::Status { status, body } => {
                write!(f, "renderer answered {}: {}", status, body)
            }
            RenderError::MissingElement { tag } => {
                write!(f, "renderer output has no <{}> element", tag)
            }
        }
    }
}

impl std::error::Error for RenderError {}

impl From<reqwest::Error> for RenderError {
    fn from(err: reqwest::Error) -> Self {
        RenderError::Http(err.to_string())
    }
}

/// Turns EBNF text into diagram markup.
///
/// Called from blocking worker threads, possibly several at once.
pub trait Renderer: Send + Sync {
    fn render(&self, ebnf: &str) -> Result<String, RenderError>;
}

impl<F> Renderer for F
where
    F: Fn(&str) -> Result<String, RenderError> + Send + Sync,
{
    fn render(&self, ebnf: &str) -> Result<String, RenderError> {
        self(ebnf)
    }
}

/// Posts EBNF to a Railroad Diagram Generator endpoint.
///
/// The underlying client is blocking: build and drop it outside of an async
/// context.
#[derive(Debug, Clone)]
pub struct HttpRenderer {
    client: reqwest::blocking::Client,
    url: String,
    width: u32,
    options: Vec<String>,
}

impl HttpRenderer {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, RenderError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(HttpRenderer {
            client,
            url: url.into(),
            width: 620,
            options: vec![
                "eliminaterecursion".to_string(),
                "factoring".to_string(),
                "inline".to_string(),
            ],
        })
    }

    pub fn from_config(config: &RendererConfig) -> Result<Self, RenderError> {
        Ok(Self::new(config.url.clone(), Duration::from_secs(config.timeout_secs))?
            .with_width(config.width)
            .with_options(config.options.clone()))
    }

    pub fn with_width(mut self, width: u32) -> Self {
        self.width = width;
        self
    }

    pub fn with_options(mut self, options: Vec<String>) -> Self {
        self.options = options;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn form(&self, ebnf: &str) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("frame", "diagram".to_string()),
            ("text", ebnf.to_string()),
            ("width", self.width.to_string()),
        ];
        fields.extend(self.options.iter().map(|option| ("options", option.clone())));
        fields
    }
}

impl Renderer for HttpRenderer {
    fn render(&self, ebnf: &str) -> Result<String, RenderError> {
        log::debug!("posting {} bytes of EBNF to {}", ebnf.len(), self.url);
        let response = self.client.post(&self.url).form(&self.form(ebnf)).send()?;
        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            return Err(RenderError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }
}
