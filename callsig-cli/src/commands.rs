//! CLI command implementations.

use callsig_core::languages::{self, get_parser};
use callsig_core::{
    parse_source, search_file, CallMatch, Matcher, MatcherOptions, Signature, TraversalKeys,
};
use colored::Colorize;
use ignore::WalkBuilder;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info};

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

/// Options for the `find` command.
#[derive(Debug, Clone, Default)]
pub struct FindOptions {
    pub json: bool,
    pub limit: Option<usize>,
    pub follow_symlinks: bool,
}

/// Outcome of searching a set of paths.
#[derive(Debug, Default, Serialize)]
struct SearchReport {
    signature: String,
    files_searched: usize,
    matches: Vec<CallMatch>,
    /// Files that could not be read or parsed.
    errors: Vec<(String, String)>,
    duration_ms: u64,
}

/// Loads traversal keys, merging an optional JSON file over the defaults.
pub fn load_keys(path: Option<&Path>) -> Result<TraversalKeys> {
    let defaults = TraversalKeys::default();
    let Some(path) = path else {
        return Ok(defaults);
    };

    let json = fs::read_to_string(path)
        .map_err(|e| format!("failed to read keys file '{}': {}", path.display(), e))?;
    let overrides = TraversalKeys::from_json(&json)
        .map_err(|e| format!("invalid keys file '{}': {}", path.display(), e))?;
    debug!("Loaded traversal keys from {}", path.display());

    Ok(defaults.merge(overrides))
}

fn compile(signature: &str, keys: TraversalKeys) -> Result<Matcher> {
    let signature = Signature::parse(signature)?;
    let options = MatcherOptions {
        traversal_keys: keys,
    };
    Ok(Matcher::with_options(signature, options))
}

/// Validate a signature and describe it.
pub fn check(signature: &str, keys: TraversalKeys) -> Result<()> {
    let matcher = compile(signature, keys)?;

    println!(
        "{} {}",
        "✓".green(),
        matcher.signature().to_string().cyan()
    );
    println!(
        "  {} {}",
        "callee depth:".dimmed(),
        matcher.callee_depth()
    );
    println!(
        "  {} {}..={}",
        "arguments:".dimmed(),
        matcher.min_arg_count(),
        matcher.max_arg_count()
    );

    for (index, parameter) in matcher.parameters().iter().enumerate() {
        println!(
            "  {} {} {}",
            index.to_string().dimmed(),
            parameter.name.yellow(),
            format!("({})", parameter.kind).dimmed()
        );
    }

    Ok(())
}

/// Search paths for calls matching a signature.
pub fn find(
    signature: &str,
    paths: &[PathBuf],
    keys: TraversalKeys,
    options: FindOptions,
) -> Result<()> {
    let matcher = compile(signature, keys)?;

    let spinner = if options.json {
        ProgressBar::hidden()
    } else {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
        spinner.enable_steady_tick(Duration::from_millis(80));
        spinner.set_message("Searching files...");
        spinner
    };

    let mut report = search_paths(paths, &matcher, options.follow_symlinks);
    spinner.finish_and_clear();

    if let Some(limit) = options.limit {
        report.matches.truncate(limit);
    }

    if options.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_report(&report);
    Ok(())
}

/// Walks every path, respecting .gitignore, and searches supported files.
fn search_paths(paths: &[PathBuf], matcher: &Matcher, follow_symlinks: bool) -> SearchReport {
    let start = Instant::now();
    let mut report = SearchReport {
        signature: matcher.signature().to_string(),
        ..Default::default()
    };

    for root in paths {
        info!("Searching {}", root.display());

        let walker = WalkBuilder::new(root)
            .hidden(true) // Skip hidden files
            .git_ignore(true) // Respect .gitignore
            .git_global(true)
            .git_exclude(true)
            .follow_links(follow_symlinks)
            .build();

        for entry in walker.filter_map(|entry| entry.ok()) {
            let path = entry.path();
            if path.is_dir() {
                continue;
            }

            let supported = path
                .extension()
                .and_then(|e| e.to_str())
                .map(languages::is_supported)
                .unwrap_or(false);
            if !supported {
                continue;
            }

            report.files_searched += 1;
            match search_file(path, matcher) {
                Ok(found) => report.matches.extend(found),
                Err(e) => {
                    debug!("Skipping {}: {}", path.display(), e);
                    report
                        .errors
                        .push((path.display().to_string(), e.to_string()));
                }
            }
        }
    }

    report.duration_ms = start.elapsed().as_millis() as u64;
    report
}

fn print_report(report: &SearchReport) {
    for call in &report.matches {
        println!(
            "{}  {}",
            format!("{}:{}:{}", call.file, call.line, call.column + 1).dimmed(),
            call.text.cyan()
        );
        for argument in &call.arguments {
            let parameter = match &argument.parameter {
                Some(p) => format!("{} ({})", p.name.yellow(), p.kind),
                None => "?".red().to_string(),
            };
            println!("    {} → {}", argument.text, parameter);
        }
    }

    println!(
        "\n{} {} matches in {} files ({}ms)",
        "✓".green(),
        report.matches.len().to_string().cyan(),
        report.files_searched.to_string().cyan(),
        report.duration_ms
    );

    // Show any errors
    if !report.errors.is_empty() {
        println!("\n{} files could not be searched:", "⚠".yellow());
        for (file, error) in report.errors.iter().take(5) {
            println!("  {} - {}", file.red(), error);
        }
        if report.errors.len() > 5 {
            println!("  ... and {} more", report.errors.len() - 5);
        }
    }
}

/// Print the lowered tree of a snippet.
pub fn ast(source: &str, tsx: bool, purify: bool) -> Result<()> {
    let extension = if tsx { "tsx" } else { "ts" };
    let parser = get_parser(extension).ok_or("no parser for snippet")?;
    let parsed = parse_source(source, parser.as_ref())?;

    if let Some(error) = &parsed.first_error {
        eprintln!("{} {}", "⚠ Warning:".yellow(), error);
    }

    let program = if purify {
        parsed.program.purify()
    } else {
        parsed.program
    };
    println!("{}", serde_json::to_string_pretty(&program)?);

    Ok(())
}
