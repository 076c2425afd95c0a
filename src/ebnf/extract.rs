//! Sub-grammar extraction
//!
//! An [`Extractor`] starts at a root production and produces the productions
//! needed to draw it. Only the root's alternatives are reshaped:
//!
//! - Splitting (the default) distributes every nested alternation of a root
//!   branch, so `'DROP' ( 'TABLE' name | 'INDEX' name )` becomes the two
//!   alternatives `'DROP' 'TABLE' name` and `'DROP' 'INDEX' name`. Repetitions
//!   and optional groups such as `( 'IF' 'EXISTS' | )` are never split, so a
//!   statement with many optional clauses still yields one alternative per
//!   real keyword choice.
//! - `match` / `exclude` patterns are tested against the text of each root
//!   alternative. A filter that keeps nothing is an error.
//! - With `collapse_lists`, separated list tails like `( ',' name )*` are cut
//!   from the kept alternatives after filtering.
//!
//! With `descend`, every production reachable from the kept alternatives is
//! appended, breadth-first, each name once. Productions that are referenced
//! but not defined stay as plain names.

use super::error::GrammarError;
use super::grammar::{write_production, Expression, Grammar};
use regex::Regex;
use std::collections::HashSet;

/// Display normalization applied to names when a fragment is serialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Presentation {
    /// Terminal name used by the grammar for identifiers.
    pub identifier_token: String,
    /// Name shown in diagrams instead of `identifier_token`.
    pub identifier_display: String,
    /// Suffix marking lookahead-only token variants, stripped for display.
    pub lookahead_suffix: String,
}

impl Default for Presentation {
    fn default() -> Self {
        Presentation {
            identifier_token: "IDENT".to_string(),
            identifier_display: "identifier".to_string(),
            lookahead_suffix: "_LA".to_string(),
        }
    }
}

impl Presentation {
    pub fn display_name(&self, name: &str) -> String {
        if name == self.identifier_token {
            return self.identifier_display.clone();
        }
        if !self.lookahead_suffix.is_empty() {
            if let Some(stripped) = name.strip_suffix(self.lookahead_suffix.as_str()) {
                if !stripped.is_empty() {
                    return stripped.to_string();
                }
            }
        }
        name.to_string()
    }
}

/// Serialized extraction result handed to the text fix-ups and renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedFragment {
    pub ebnf: String,
    /// Names still referenced by the fragment, in order of first appearance.
    pub references: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedProduction {
    pub name: String,
    pub alternatives: Vec<Expression>,
}

/// The productions chosen by an [`Extractor`], root first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub productions: Vec<ExtractedProduction>,
}

impl Extraction {
    pub fn root(&self) -> &ExtractedProduction {
        &self.productions[0]
    }

    /// Serialize in railroad notation, one blank line between productions.
    pub fn to_fragment(&self, presentation: &Presentation) -> ExtractedFragment {
        let rename = |name: &str| presentation.display_name(name);
        let mut ebnf = String::new();
        let mut references: Vec<String> = Vec::new();

        for (index, production) in self.productions.iter().enumerate() {
            if index > 0 {
                ebnf.push('\n');
            }
            let alternatives: Vec<Expression> = production
                .alternatives
                .iter()
                .cloned()
                .map(|mut alternative| {
                    alternative.map_references(&rename);
                    alternative
                })
                .collect();
            for alternative in &alternatives {
                for name in alternative.references() {
                    if !references.iter().any(|known| known == name) {
                        references.push(name.to_string());
                    }
                }
            }
            write_production(&mut ebnf, &rename(&production.name), &alternatives);
        }

        ExtractedFragment { ebnf, references }
    }
}

/// Extraction request for one root production.
#[derive(Debug, Clone)]
pub struct Extractor {
    root: String,
    descend: bool,
    no_split: bool,
    collapse_lists: bool,
    matches: Vec<Regex>,
    excludes: Vec<Regex>,
}

impl Extractor {
    pub fn new(root: impl Into<String>) -> Self {
        Extractor {
            root: root.into(),
            descend: false,
            no_split: false,
            collapse_lists: false,
            matches: Vec::new(),
            excludes: Vec::new(),
        }
    }

    /// Also emit every production reachable from the root.
    pub fn descend(mut self, descend: bool) -> Self {
        self.descend = descend;
        self
    }

    /// Keep the root's alternatives as written instead of distributing nested
    /// alternations.
    pub fn no_split(mut self, no_split: bool) -> Self {
        self.no_split = no_split;
        self
    }

    /// Draw separated lists as their first item only.
    pub fn collapse_lists(mut self, collapse_lists: bool) -> Self {
        self.collapse_lists = collapse_lists;
        self
    }

    /// Keep only root alternatives matching every pattern.
    pub fn matching(mut self, patterns: impl IntoIterator<Item = Regex>) -> Self {
        self.matches.extend(patterns);
        self
    }

    /// Drop root alternatives matching any pattern.
    pub fn excluding(mut self, patterns: impl IntoIterator<Item = Regex>) -> Self {
        self.excludes.extend(patterns);
        self
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn extract(&self, grammar: &Grammar) -> Result<Extraction, GrammarError> {
        let root_body = grammar
            .get(&self.root)
            .ok_or_else(|| GrammarError::UnknownProduction {
                name: self.root.clone(),
            })?;

        let mut productions = vec![ExtractedProduction {
            name: self.root.clone(),
            alternatives: self.root_alternatives(root_body)?,
        }];

        if self.descend {
            let mut seen: HashSet<String> = HashSet::new();
            seen.insert(self.root.clone());
            let mut index = 0;
            while index < productions.len() {
                let mut next = Vec::new();
                for alternative in &productions[index].alternatives {
                    for name in alternative.references() {
                        if let Some(body) = grammar.get(name) {
                            if seen.insert(name.to_string()) {
                                next.push(ExtractedProduction {
                                    name: name.to_string(),
                                    alternatives: body.branches().into_iter().cloned().collect(),
                                });
                            }
                        }
                    }
                }
                productions.extend(next);
                index += 1;
            }
        }

        Ok(Extraction { productions })
    }

    fn root_alternatives(&self, body: &Expression) -> Result<Vec<Expression>, GrammarError> {
        let candidates: Vec<Expression> = if self.no_split {
            body.branches().into_iter().cloned().collect()
        } else {
            body.branches()
                .into_iter()
                .flat_map(split)
                .map(Expression::sequence)
                .collect()
        };

        let mut seen = HashSet::new();
        let kept: Vec<Expression> = candidates
            .into_iter()
            .filter(|alternative| self.accepts(&alternative.to_string()))
            .map(|mut alternative| {
                if self.collapse_lists {
                    alternative.strip_separated_lists();
                }
                alternative
            })
            .filter(|alternative| seen.insert(alternative.to_string()))
            .collect();

        if kept.is_empty() {
            return Err(GrammarError::EmptyExtraction {
                root: self.root.clone(),
            });
        }
        Ok(kept)
    }

    fn accepts(&self, text: &str) -> bool {
        self.matches.iter().all(|pattern| pattern.is_match(text))
            && !self.excludes.iter().any(|pattern| pattern.is_match(text))
    }
}

// every flat sequence obtainable by picking one branch of each nested
// alternation; optional groups count as a single item
fn split(expr: &Expression) -> Vec<Vec<Expression>> {
    match expr {
        Expression::Sequence(items) => {
            let mut out: Vec<Vec<Expression>> = vec![Vec::new()];
            for item in items {
                let choices = split(item);
                out = out
                    .iter()
                    .flat_map(|prefix| {
                        choices.iter().map(move |choice| {
                            let mut combined = prefix.clone();
                            combined.extend(choice.iter().cloned());
                            combined
                        })
                    })
                    .collect();
            }
            out
        }
        Expression::Alternation(branches) => branches.iter().flat_map(split).collect(),
        Expression::Group(_) if expr.is_optional() => vec![vec![expr.clone()]],
        Expression::Group(inner) => split(inner),
        Expression::Literal(_) | Expression::Reference(_) | Expression::Repetition(_) => {
            vec![vec![expr.clone()]]
        }
    }
}
