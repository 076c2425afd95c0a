//! Command-line interface for sqldiagram
//! Reduces a SQL EBNF grammar to per-statement sub-grammars and renders them as railroad diagrams.
//!
//! Usage:
//!   sqldiagram generate [--addr `<src>`] [--base `<dir>`] [--filter `<name>`] [--bnf] [--config `<file>`]
//!   sqldiagram reduce [--stmt `<name>`] [--descend `<bool>`] [--inline `<a,b>`] [--in `<file>`] [--out `<file>`]
//!   sqldiagram bnf [--addr `<src>`] [--out `<file>`]          - Print the normalized grammar
//!   sqldiagram rr [--in `<file>`] [--out `<file>`]            - Render EBNF to an HTML page
//!   sqldiagram body [--in `<file>`] [--out `<file>`]          - Extract HTML <body> contents
//!   sqldiagram list-statements [--config `<file>`]            - List the statement catalog

use clap::{Arg, ArgAction, ArgMatches, Command};
use sqldiagram::batch::{self, Artifact, BatchOptions, BatchReport, Mode, Overview};
use sqldiagram::ebnf::{Extractor, Grammar, Presentation};
use sqldiagram::emit;
use sqldiagram::markup;
use sqldiagram::pipeline::stages::{Extracting, Inlining};
use sqldiagram::pipeline::Transform;
use sqldiagram::render::{HttpRenderer, RenderError, Renderer};
use sqldiagram::source::GrammarSource;
use sqldiagram_config::{DiagramConfig, Loader};
use std::error::Error;
use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;
use std::sync::Arc;

type CliResult<T> = Result<T, Box<dyn Error>>;

/// Per-directory configuration picked up when `--config` is not given.
const LOCAL_CONFIG: &str = "sqldiagram.toml";

fn input_arg() -> Arg {
    Arg::new("in")
        .long("in")
        .help("Input path; stdin if empty")
}

fn output_arg() -> Arg {
    Arg::new("out")
        .long("out")
        .help("Output path; stdout if empty")
}

fn config_arg() -> Arg {
    Arg::new("config")
        .long("config")
        .short('c')
        .help("Configuration file layered over the built-in defaults")
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let matches = Command::new("sqldiagram")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Extracts per-statement SQL grammars and renders them as railroad diagrams")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("generate")
                .about("Generate a diagram for every statement in the catalog")
                .arg(
                    Arg::new("addr")
                        .long("addr")
                        .help("Location of the EBNF grammar: a path, '-' for stdin, or a URL"),
                )
                .arg(
                    Arg::new("base")
                        .long("base")
                        .help("Base directory for html output"),
                )
                .arg(
                    Arg::new("filter")
                        .long("filter")
                        .help("Only generate the statement with this name"),
                )
                .arg(
                    Arg::new("bnf")
                        .long("bnf")
                        .help("Print BNF only; don't generate railroad diagrams")
                        .action(ArgAction::SetTrue),
                )
                .arg(config_arg()),
        )
        .subcommand(
            Command::new("reduce")
                .about("Reduce and simplify an EBNF grammar to a smaller grammar")
                .arg(
                    Arg::new("stmt")
                        .long("stmt")
                        .help("Name of the top-level production")
                        .default_value("stmt_block"),
                )
                .arg(
                    Arg::new("descend")
                        .long("descend")
                        .help("Also emit every production reachable from --stmt")
                        .value_parser(clap::value_parser!(bool))
                        .default_value("true"),
                )
                .arg(
                    Arg::new("inline")
                        .long("inline")
                        .help("Comma-separated productions to inline")
                        .value_delimiter(',')
                        .action(ArgAction::Append),
                )
                .arg(input_arg())
                .arg(output_arg())
                .arg(config_arg()),
        )
        .subcommand(
            Command::new("bnf")
                .about("Load the grammar and print it normalized")
                .arg(
                    Arg::new("addr")
                        .long("addr")
                        .help("Location of the EBNF grammar: a path, '-' for stdin, or a URL"),
                )
                .arg(output_arg())
                .arg(config_arg()),
        )
        .subcommand(
            Command::new("rr")
                .about("Generate a railroad diagram page from EBNF")
                .arg(input_arg())
                .arg(output_arg())
                .arg(config_arg()),
        )
        .subcommand(
            Command::new("body")
                .about("Extract HTML <body> contents")
                .arg(input_arg())
                .arg(output_arg()),
        )
        .subcommand(
            Command::new("list-statements")
                .about("List the configured statement catalog")
                .arg(config_arg()),
        )
        .get_matches();

    let result = match matches.subcommand() {
        Some(("generate", generate_matches)) => handle_generate_command(generate_matches),
        Some(("reduce", reduce_matches)) => handle_reduce_command(reduce_matches),
        Some(("bnf", bnf_matches)) => handle_bnf_command(bnf_matches),
        Some(("rr", rr_matches)) => handle_rr_command(rr_matches),
        Some(("body", body_matches)) => handle_body_command(body_matches),
        Some(("list-statements", list_matches)) => handle_list_statements_command(list_matches),
        _ => unreachable!(),
    };

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Defaults, then `--config` or `./sqldiagram.toml`, then command-line overrides.
fn load_config(matches: &ArgMatches, overrides: &[(&str, &str)]) -> CliResult<DiagramConfig> {
    let mut loader = match matches.get_one::<String>("config") {
        Some(path) => Loader::new().with_file(path),
        None => Loader::new().with_optional_file(LOCAL_CONFIG),
    };
    for (key, id) in overrides {
        if let Some(value) = matches.get_one::<String>(id) {
            loader = loader.set_override(key, value.as_str())?;
        }
    }
    Ok(loader.build()?)
}

fn read_input(matches: &ArgMatches) -> CliResult<String> {
    match matches.get_one::<String>("in") {
        Some(path) => Ok(fs::read_to_string(path)?),
        None => {
            let mut input = String::new();
            io::stdin().read_to_string(&mut input)?;
            Ok(input)
        }
    }
}

fn write_output(matches: &ArgMatches, contents: &str) -> CliResult<()> {
    match matches.get_one::<String>("out") {
        Some(path) => fs::write(path, contents)?,
        None => io::stdout().write_all(contents.as_bytes())?,
    }
    Ok(())
}

/// Handle the generate command
fn handle_generate_command(matches: &ArgMatches) -> CliResult<bool> {
    let config = load_config(
        matches,
        &[("source.addr", "addr"), ("output.base_dir", "base")],
    )?;
    let specs = batch::catalog(&config.statements)?;
    let print_bnf = matches.get_flag("bnf");

    let options = BatchOptions {
        filter: matches.get_one::<String>("filter").cloned(),
        mode: if print_bnf { Mode::PrintEbnf } else { Mode::Render },
        overview: Some(Overview {
            root: config.output.overview.root.clone(),
            file: config.output.overview.file.clone(),
        }),
        link_prefix: config.output.link_prefix.clone(),
        presentation: Presentation::from(&config.presentation),
    };

    // Blocking HTTP clients are built here and outlive the runtime below.
    let source = GrammarSource::open(&config.source.addr)?;
    let renderer: Arc<dyn Renderer> = if print_bnf {
        Arc::new(|_: &str| -> Result<String, RenderError> {
            Err(RenderError::Http("rendering is disabled with --bnf".to_string()))
        })
    } else {
        Arc::new(HttpRenderer::from_config(&config.renderer)?)
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let report = runtime.block_on(batch::run_batch(
        source.text(),
        &specs,
        &options,
        Arc::clone(&renderer),
    ))?;
    drop(runtime);

    if print_bnf {
        print_ebnf(&report);
    } else {
        let written = emit::write_report(Path::new(&config.output.base_dir), &report)?;
        log::info!("wrote {} file(s) to {}", written.len(), config.output.base_dir);
    }

    for failure in report.failures() {
        eprintln!("{}", failure);
    }
    Ok(report.is_success())
}

fn print_ebnf(report: &BatchReport) {
    for outcome in &report.outcomes {
        match &outcome.result {
            Ok(Artifact::Ebnf {
                pre_replace,
                post_replace: Some(post_replace),
                ..
            }) => {
                println!("{}: (PRE REPLACE)\n\n{}", outcome.name, pre_replace);
                println!("{}: (POST REPLACE)\n\n{}", outcome.name, post_replace);
            }
            Ok(Artifact::Ebnf {
                pre_replace,
                post_replace: None,
                ..
            }) => println!("{}:\n\n{}", outcome.name, pre_replace),
            Ok(Artifact::Diagram { .. }) | Err(_) => {}
        }
    }
}

/// Handle the reduce command
fn handle_reduce_command(matches: &ArgMatches) -> CliResult<bool> {
    let config = load_config(matches, &[])?;
    let stmt = matches
        .get_one::<String>("stmt")
        .map(String::as_str)
        .unwrap_or("stmt_block");
    let descend = matches.get_one::<bool>("descend").copied().unwrap_or(true);
    let inline: Vec<&String> = matches
        .get_many::<String>("inline")
        .map(|values| values.collect())
        .unwrap_or_default();
    log::info!("reduce: {}, inline: {:?}, descend: {}", stmt, inline, descend);

    let addr = matches.get_one::<String>("in").map(String::as_str).unwrap_or("-");
    let reduce = Transform::<String, Arc<Grammar>>::from_fn(|text| Ok(Arc::new(Grammar::parse(&text)?)))
        .then(Inlining::new(inline))
        .then(Extracting::new(
            Extractor::new(stmt).descend(descend).no_split(true),
            Presentation::from(&config.presentation),
        ));
    let fragment = GrammarSource::open(addr)?.with(&reduce)?;

    write_output(matches, &fragment.ebnf)?;
    Ok(true)
}

/// Handle the bnf command
fn handle_bnf_command(matches: &ArgMatches) -> CliResult<bool> {
    let config = load_config(matches, &[("source.addr", "addr")])?;
    let grammar = GrammarSource::open(&config.source.addr)?.parse()?;
    write_output(matches, &grammar.to_string())?;
    Ok(true)
}

/// Handle the rr command
fn handle_rr_command(matches: &ArgMatches) -> CliResult<bool> {
    let config = load_config(matches, &[])?;
    let renderer = HttpRenderer::from_config(&config.renderer)?;
    let page = markup::xhtml_to_html(&renderer.render(&read_input(matches)?)?);
    log::info!("generated railroad diagram");
    write_output(matches, &page)?;
    Ok(true)
}

/// Handle the body command
fn handle_body_command(matches: &ArgMatches) -> CliResult<bool> {
    let input = read_input(matches)?;
    let body = markup::inner_tag(&input, "body").ok_or_else(|| RenderError::MissingElement {
        tag: "body".to_string(),
    })?;
    write_output(matches, body)?;
    Ok(true)
}

/// Handle the list-statements command
fn handle_list_statements_command(matches: &ArgMatches) -> CliResult<bool> {
    let config = load_config(matches, &[])?;
    println!("Configured statements:\n");
    for statement in &config.statements {
        match &statement.stmt {
            Some(stmt) => println!("  {} (from {})", statement.name, stmt),
            None => println!("  {}", statement.name),
        }
    }
    Ok(true)
}
