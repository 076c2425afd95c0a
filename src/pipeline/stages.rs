//! The stages a statement goes through
//!
//! - [`Inlining`]: `Arc<Grammar>` to a private, inlined `Grammar`
//! - [`Extracting`]: `Grammar` to an [`ExtractedFragment`]
//! - [`Rewriting`]: literal then regex fix-ups of the fragment text
//! - [`Rendering`]: fragment to a statement diagram (`<svg>` with fixed links)
//! - [`OverviewRendering`]: fragment to the full grammar page body

use crate::ebnf::{ExtractedFragment, Extractor, Grammar, Presentation};
use crate::markup;
use crate::pipeline::{PipelineError, Runnable};
use crate::render::{RenderError, Renderer};
use regex::Regex;
use std::sync::Arc;

/// Copies the shared grammar and inlines `names` into the copy.
pub struct Inlining {
    names: Vec<String>,
}

impl Inlining {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Inlining {
            names: names.into_iter().map(Into::into).collect(),
        }
    }
}

impl Runnable<Arc<Grammar>, Grammar> for Inlining {
    fn run(&self, input: Arc<Grammar>) -> Result<Grammar, PipelineError> {
        Ok(input.inlined(&self.names)?)
    }
}

pub struct Extracting {
    extractor: Extractor,
    presentation: Presentation,
}

impl Extracting {
    pub fn new(extractor: Extractor, presentation: Presentation) -> Self {
        Extracting {
            extractor,
            presentation,
        }
    }
}

impl Runnable<Grammar, ExtractedFragment> for Extracting {
    fn run(&self, input: Grammar) -> Result<ExtractedFragment, PipelineError> {
        let extraction = self.extractor.extract(&input)?;
        log::debug!(
            "{}: extracted {} production(s), {} root alternative(s)",
            self.extractor.root(),
            extraction.productions.len(),
            extraction.root().alternatives.len()
        );
        Ok(extraction.to_fragment(&self.presentation))
    }
}

/// Ordered text fix-ups: every literal replacement, then every regex one.
#[derive(Debug, Clone, Default)]
pub struct Rewriting {
    replace: Vec<(String, String)>,
    regreplace: Vec<(Regex, String)>,
}

impl Rewriting {
    pub fn new(replace: Vec<(String, String)>, regreplace: Vec<(Regex, String)>) -> Self {
        Rewriting {
            replace,
            regreplace,
        }
    }

    pub fn apply(&self, text: &str) -> String {
        let mut text = text.to_string();
        for (from, to) in &self.replace {
            text = text.replace(from.as_str(), to);
        }
        for (pattern, to) in &self.regreplace {
            text = pattern.replace_all(&text, to.as_str()).into_owned();
        }
        text
    }
}

impl Runnable<ExtractedFragment, ExtractedFragment> for Rewriting {
    fn run(&self, input: ExtractedFragment) -> Result<ExtractedFragment, PipelineError> {
        Ok(ExtractedFragment {
            ebnf: self.apply(&input.ebnf),
            references: input.references,
        })
    }
}

/// Renders a statement fragment, normalizes the page to HTML and keeps its
/// first `<svg>` element, with
/// cross-reference links pointed at `link_prefix` and `unlink` names stripped.
pub struct Rendering {
    renderer: Arc<dyn Renderer>,
    link_prefix: String,
    unlink: Vec<String>,
}

impl Rendering {
    pub fn new(renderer: Arc<dyn Renderer>, link_prefix: impl Into<String>, unlink: Vec<String>) -> Self {
        Rendering {
            renderer,
            link_prefix: link_prefix.into(),
            unlink,
        }
    }
}

impl Runnable<ExtractedFragment, String> for Rendering {
    fn run(&self, input: ExtractedFragment) -> Result<String, PipelineError> {
        let page = markup::xhtml_to_html(&self.renderer.render(&input.ebnf)?);
        let svg = markup::extract_tag(&page, "svg").ok_or_else(|| RenderError::MissingElement {
            tag: "svg".to_string(),
        })?;
        let mut diagram = markup::rewrite_links(svg, &self.link_prefix);
        for name in &self.unlink {
            diagram = markup::unlink(&diagram, &self.link_prefix, name);
        }
        Ok(diagram)
    }
}

/// Renders the overview fragment and cuts the page down to its body.
pub struct OverviewRendering {
    renderer: Arc<dyn Renderer>,
}

impl OverviewRendering {
    pub fn new(renderer: Arc<dyn Renderer>) -> Self {
        OverviewRendering { renderer }
    }
}

impl Runnable<ExtractedFragment, String> for OverviewRendering {
    fn run(&self, input: ExtractedFragment) -> Result<String, PipelineError> {
        let page = markup::xhtml_to_html(&self.renderer.render(&input.ebnf)?);
        markup::overview_fragment(&page).ok_or_else(|| {
            RenderError::MissingElement {
                tag: "body".to_string(),
            }
            .into()
        })
    }
}
