//! Statement specifications
//!
//! A [`StatementSpec`] says which production a documented statement comes
//! from and how to tidy it before rendering. Specs are built in code or
//! compiled from the configured catalog, where every pattern is checked up
//! front.

use crate::ebnf::{Extractor, Presentation};
use crate::pipeline::stages::Rewriting;
use regex::Regex;
use sqldiagram_config::{PresentationConfig, StatementConfig};
use std::fmt;

/// A catalog entry carries a pattern that does not compile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogError {
    pub statement: String,
    pub pattern: String,
    pub message: String,
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "statement `{}`: invalid pattern `{}`: {}",
            self.statement, self.pattern, self.message
        )
    }
}

impl std::error::Error for CatalogError {}

#[derive(Debug, Clone)]
pub struct StatementSpec {
    /// Display name, also the base of the output file name.
    pub name: String,
    /// Production the diagram is extracted from.
    pub stmt: String,
    pub inline: Vec<String>,
    pub replace: Vec<(String, String)>,
    pub regreplace: Vec<(Regex, String)>,
    pub matches: Vec<Regex>,
    pub exclude: Vec<Regex>,
    /// Names whose cross-reference links are stripped from the diagram.
    pub unlink: Vec<String>,
    pub no_split: bool,
    pub collapse_lists: bool,
}

impl StatementSpec {
    /// A spec drawing production `name` as is.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        StatementSpec {
            stmt: name.clone(),
            name,
            inline: Vec::new(),
            replace: Vec::new(),
            regreplace: Vec::new(),
            matches: Vec::new(),
            exclude: Vec::new(),
            unlink: Vec::new(),
            no_split: false,
            collapse_lists: false,
        }
    }

    pub fn stmt(mut self, stmt: impl Into<String>) -> Self {
        self.stmt = stmt.into();
        self
    }

    pub fn inline<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inline.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn replace(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.replace.push((from.into(), to.into()));
        self
    }

    pub fn regreplace(mut self, pattern: Regex, to: impl Into<String>) -> Self {
        self.regreplace.push((pattern, to.into()));
        self
    }

    pub fn matching(mut self, pattern: Regex) -> Self {
        self.matches.push(pattern);
        self
    }

    pub fn excluding(mut self, pattern: Regex) -> Self {
        self.exclude.push(pattern);
        self
    }

    pub fn unlink<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.unlink.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn no_split(mut self, no_split: bool) -> Self {
        self.no_split = no_split;
        self
    }

    pub fn collapse_lists(mut self, collapse_lists: bool) -> Self {
        self.collapse_lists = collapse_lists;
        self
    }

    /// File stem of the statement's diagram: the name with its first `_stmt`
    /// removed.
    pub fn output_name(&self) -> String {
        self.name.replacen("_stmt", "", 1)
    }

    pub fn extractor(&self) -> Extractor {
        Extractor::new(self.stmt.clone())
            .no_split(self.no_split)
            .collapse_lists(self.collapse_lists)
            .matching(self.matches.iter().cloned())
            .excluding(self.exclude.iter().cloned())
    }

    pub fn rewriting(&self) -> Rewriting {
        Rewriting::new(self.replace.clone(), self.regreplace.clone())
    }

    pub fn from_config(config: &StatementConfig) -> Result<Self, CatalogError> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|err| CatalogError {
                statement: config.name.clone(),
                pattern: pattern.to_string(),
                message: err.to_string(),
            })
        };

        let mut spec = StatementSpec::new(config.name.clone())
            .inline(config.inline.iter().cloned())
            .unlink(config.unlink.iter().cloned())
            .no_split(config.nosplit)
            .collapse_lists(config.collapse_lists);
        if let Some(stmt) = &config.stmt {
            spec = spec.stmt(stmt.clone());
        }
        for replacement in &config.replace {
            spec = spec.replace(replacement.from.clone(), replacement.to.clone());
        }
        for replacement in &config.regreplace {
            spec = spec.regreplace(compile(&replacement.from)?, replacement.to.clone());
        }
        for pattern in &config.matches {
            spec = spec.matching(compile(pattern)?);
        }
        for pattern in &config.exclude {
            spec = spec.excluding(compile(pattern)?);
        }
        Ok(spec)
    }
}

/// Compile a whole catalog, stopping at the first bad pattern.
pub fn catalog(statements: &[StatementConfig]) -> Result<Vec<StatementSpec>, CatalogError> {
    statements.iter().map(StatementSpec::from_config).collect()
}

impl From<&PresentationConfig> for Presentation {
    fn from(config: &PresentationConfig) -> Self {
        Presentation {
            identifier_token: config.identifier_token.clone(),
            identifier_display: config.identifier_display.clone(),
            lookahead_suffix: config.lookahead_suffix.clone(),
        }
    }
}
