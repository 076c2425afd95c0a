//! Shared configuration loader for sqldiagram.
//!
//! `defaults/sqldiagram.default.toml` is embedded into every binary so that the
//! statement catalog and runtime behavior stay in sync. Applications layer
//! user-specific files on top of those defaults via [`Loader`] before
//! deserializing into [`DiagramConfig`].

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, ValueKind};
use serde::Deserialize;
use std::path::Path;

const DEFAULT_TOML: &str = include_str!("../defaults/sqldiagram.default.toml");

/// Top-level configuration consumed by sqldiagram applications.
#[derive(Debug, Clone, Deserialize)]
pub struct DiagramConfig {
    pub source: SourceConfig,
    pub output: OutputConfig,
    pub presentation: PresentationConfig,
    pub renderer: RendererConfig,
    #[serde(default)]
    pub statements: Vec<StatementConfig>,
}

/// Where the grammar is read from.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Local path, `-` for stdin, or an `http(s)://` URL.
    pub addr: String,
}

/// Output locations and link rewriting.
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    pub base_dir: String,
    /// Page that cross-reference links inside diagrams point to.
    pub link_prefix: String,
    pub overview: OverviewConfig,
}

/// The full, unfiltered grammar diagram.
#[derive(Debug, Clone, Deserialize)]
pub struct OverviewConfig {
    pub root: String,
    pub file: String,
}

/// Display normalization applied to names when serializing fragments.
#[derive(Debug, Clone, Deserialize)]
pub struct PresentationConfig {
    pub identifier_token: String,
    pub identifier_display: String,
    pub lookahead_suffix: String,
}

/// Railroad Diagram Generator endpoint settings.
#[derive(Debug, Clone, Deserialize)]
pub struct RendererConfig {
    pub url: String,
    pub width: u32,
    pub options: Vec<String>,
    pub timeout_secs: u64,
}

/// One documented statement: which production to extract and how to tidy it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatementConfig {
    pub name: String,
    /// Source production; the statement name is used when absent.
    #[serde(default)]
    pub stmt: Option<String>,
    #[serde(default)]
    pub inline: Vec<String>,
    #[serde(default)]
    pub replace: Vec<ReplacementConfig>,
    #[serde(default)]
    pub regreplace: Vec<ReplacementConfig>,
    #[serde(default, rename = "match")]
    pub matches: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
    #[serde(default)]
    pub unlink: Vec<String>,
    #[serde(default)]
    pub nosplit: bool,
    /// Draw `( ',' item )*` lists as their first item.
    #[serde(default)]
    pub collapse_lists: bool,
}

/// An ordered `from -> to` rewrite.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReplacementConfig {
    pub from: String,
    pub to: String,
}

/// Layers run settings and the statement catalog.
///
/// Sources merge key by key, later ones winning: the embedded defaults, then
/// user files, then command-line overrides. Arrays are not merged, so a file
/// declaring any `[[statements]]` swaps in its own catalog wholesale while a
/// file touching only `[renderer]` keeps the built-in catalog.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    /// Seeded with the embedded defaults and the full statement catalog.
    pub fn new() -> Self {
        let builder = Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        Self { builder }
    }

    /// Layer a TOML file given with `--config`; it must exist.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(true);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Layer a per-directory `sqldiagram.toml`, skipped when absent.
    pub fn with_optional_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(false);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Override one dotted key such as `source.addr` or `output.base_dir`.
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    /// Merge the layers into a [`DiagramConfig`]. Statements with missing
    /// optional keys get empty inline, filter and replacement lists.
    pub fn build(self) -> Result<DiagramConfig, ConfigError> {
        self.builder.build()?.try_deserialize()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// The built-in settings and catalog with nothing layered on top.
pub fn load_defaults() -> Result<DiagramConfig, ConfigError> {
    Loader::new().build()
}

impl DiagramConfig {
    /// Look up a catalog entry by statement name.
    pub fn statement(&self, name: &str) -> Option<&StatementConfig> {
        self.statements.iter().find(|s| s.name == name)
    }
}
