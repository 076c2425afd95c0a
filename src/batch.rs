//! Spec-driven batch runner
//!
//! [`run_batch`] parses the grammar once and fans the shared, read-only
//! result out to one blocking worker per statement plus one for the overview.
//! Each worker inlines into its own copy, extracts, rewrites and renders.
//! A failing or panicking worker only fails its own statement; results come
//! back in catalog order whatever order the workers finish in.

pub mod spec;

pub use spec::{catalog, CatalogError, StatementSpec};

use crate::ebnf::{ExtractedFragment, Extractor, Grammar, Presentation, SyntaxError};
use crate::pipeline::stages::{Extracting, Inlining, OverviewRendering, Rendering};
use crate::pipeline::{PipelineError, Runnable, Transform};
use crate::render::Renderer;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tokio::task::JoinSet;

/// What each worker produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Render diagrams.
    Render,
    /// Stop before rendering and report the EBNF text.
    PrintEbnf,
}

/// The full-grammar diagram drawn next to the statements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Overview {
    pub root: String,
    pub file: String,
}

impl Default for Overview {
    fn default() -> Self {
        Overview {
            root: "stmt_block".to_string(),
            file: "grammar.html".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Run only the statement (or overview root) with this name.
    pub filter: Option<String>,
    pub mode: Mode,
    pub overview: Option<Overview>,
    pub link_prefix: String,
    pub presentation: Presentation,
}

impl Default for BatchOptions {
    fn default() -> Self {
        BatchOptions {
            filter: None,
            mode: Mode::Render,
            overview: Some(Overview::default()),
            link_prefix: "sql-grammar.html".to_string(),
            presentation: Presentation::default(),
        }
    }
}

impl BatchOptions {
    fn selects(&self, name: &str) -> bool {
        self.filter.as_deref().map_or(true, |filter| filter == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Artifact {
    /// Finished markup ready to be written out.
    Diagram {
        markup: String,
        references: Vec<String>,
    },
    /// EBNF before and after the text fix-ups. The overview has no fix-ups.
    Ebnf {
        pre_replace: String,
        post_replace: Option<String>,
        references: Vec<String>,
    },
}

/// A statement that did not make it through the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecFailure {
    pub spec: String,
    pub error: PipelineError,
}

impl fmt::Display for SpecFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.spec, self.error)
    }
}

impl std::error::Error for SpecFailure {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecOutcome {
    pub name: String,
    /// Artifact file name under the output directory.
    pub file: String,
    pub result: Result<Artifact, SpecFailure>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Overview first when it ran, then statements in catalog order.
    pub outcomes: Vec<SpecOutcome>,
}

impl BatchReport {
    pub fn failures(&self) -> impl Iterator<Item = &SpecFailure> {
        self.outcomes
            .iter()
            .filter_map(|outcome| outcome.result.as_ref().err())
    }

    pub fn is_success(&self) -> bool {
        self.failures().next().is_none()
    }

    pub fn get(&self, name: &str) -> Option<&SpecOutcome> {
        self.outcomes.iter().find(|outcome| outcome.name == name)
    }
}

enum Job {
    Overview(Overview),
    Statement(StatementSpec),
}

impl Job {
    fn name(&self) -> &str {
        match self {
            Job::Overview(overview) => &overview.root,
            Job::Statement(spec) => &spec.name,
        }
    }

    fn file(&self) -> String {
        match self {
            Job::Overview(overview) => overview.file.clone(),
            Job::Statement(spec) => format!("{}.html", spec.output_name()),
        }
    }
}

/// Run every selected statement against `source`.
///
/// Only a grammar that does not parse fails the whole batch; everything else
/// is reported per statement in the returned [`BatchReport`].
pub async fn run_batch(
    source: &str,
    specs: &[StatementSpec],
    options: &BatchOptions,
    renderer: Arc<dyn Renderer>,
) -> Result<BatchReport, SyntaxError> {
    let grammar = Arc::new(Grammar::parse(source)?);
    log::info!("parsed grammar: {} production(s)", grammar.len());

    let mut jobs = Vec::new();
    if let Some(overview) = &options.overview {
        if options.selects(&overview.root) {
            jobs.push(Job::Overview(overview.clone()));
        }
    }
    jobs.extend(
        specs
            .iter()
            .filter(|spec| options.selects(&spec.name))
            .cloned()
            .map(Job::Statement),
    );

    let mut slots: Vec<Option<SpecOutcome>> = vec![None; jobs.len()];
    let names: Vec<(String, String)> = jobs
        .iter()
        .map(|job| (job.name().to_string(), job.file()))
        .collect();

    let mut workers = JoinSet::new();
    for (index, job) in jobs.into_iter().enumerate() {
        let grammar = Arc::clone(&grammar);
        let renderer = Arc::clone(&renderer);
        let options = options.clone();
        workers.spawn_blocking(move || {
            let name = job.name().to_string();
            let file = job.file();
            let result = panic::catch_unwind(AssertUnwindSafe(|| {
                run_job(&job, grammar, &options, renderer)
            }))
            .unwrap_or_else(|payload| Err(PipelineError::Panicked(panic_message(payload))));

            match &result {
                Ok(_) => log::info!("{}: done", name),
                Err(err) => log::error!("{}: {}", name, err),
            }
            let result = result.map_err(|error| SpecFailure {
                spec: name.clone(),
                error,
            });
            (index, SpecOutcome { name, file, result })
        });
    }

    while let Some(joined) = workers.join_next().await {
        match joined {
            Ok((index, outcome)) => slots[index] = Some(outcome),
            Err(err) => log::error!("worker did not finish: {}", err),
        }
    }

    let outcomes = slots
        .into_iter()
        .zip(names)
        .map(|(slot, (name, file))| {
            slot.unwrap_or_else(|| SpecOutcome {
                result: Err(SpecFailure {
                    spec: name.clone(),
                    error: PipelineError::Panicked("worker was cancelled".to_string()),
                }),
                name,
                file,
            })
        })
        .collect();

    Ok(BatchReport { outcomes })
}

fn run_job(
    job: &Job,
    grammar: Arc<Grammar>,
    options: &BatchOptions,
    renderer: Arc<dyn Renderer>,
) -> Result<Artifact, PipelineError> {
    match job {
        Job::Overview(overview) => run_overview(overview, grammar, options, renderer),
        Job::Statement(spec) => run_statement(spec, grammar, options, renderer),
    }
}

fn run_statement(
    spec: &StatementSpec,
    grammar: Arc<Grammar>,
    options: &BatchOptions,
    renderer: Arc<dyn Renderer>,
) -> Result<Artifact, PipelineError> {
    log::info!("{}: extracting {}, inline: {:?}", spec.name, spec.stmt, spec.inline);
    let fragment = Transform::<Arc<Grammar>, Arc<Grammar>>::from_fn(Ok)
        .then(Inlining::new(spec.inline.iter().cloned()))
        .then(Extracting::new(spec.extractor(), options.presentation.clone()))
        .run(grammar)?;

    match options.mode {
        Mode::PrintEbnf => {
            let rewritten = spec.rewriting().apply(&fragment.ebnf);
            Ok(Artifact::Ebnf {
                pre_replace: fragment.ebnf,
                post_replace: Some(rewritten),
                references: fragment.references,
            })
        }
        Mode::Render => {
            let references = fragment.references.clone();
            let markup = Transform::<ExtractedFragment, ExtractedFragment>::from_fn(Ok)
                .then(spec.rewriting())
                .then(Rendering::new(
                    renderer,
                    options.link_prefix.clone(),
                    spec.unlink.clone(),
                ))
                .run(fragment)?;
            log::info!("{}: generated railroad diagram", spec.name);
            Ok(Artifact::Diagram { markup, references })
        }
    }
}

fn run_overview(
    overview: &Overview,
    grammar: Arc<Grammar>,
    options: &BatchOptions,
    renderer: Arc<dyn Renderer>,
) -> Result<Artifact, PipelineError> {
    let extractor = Extractor::new(overview.root.clone())
        .descend(true)
        .no_split(true);
    let fragment = Extracting::new(extractor, options.presentation.clone()).run((*grammar).clone())?;

    match options.mode {
        Mode::PrintEbnf => Ok(Artifact::Ebnf {
            pre_replace: fragment.ebnf,
            post_replace: None,
            references: fragment.references,
        }),
        Mode::Render => {
            let references = fragment.references.clone();
            let markup = OverviewRendering::new(renderer).run(fragment)?;
            log::info!("{}: generated railroad diagram", overview.root);
            Ok(Artifact::Diagram { markup, references })
        }
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
