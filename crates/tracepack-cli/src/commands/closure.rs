//! `tracepack closure` command implementation.

use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use std::collections::BTreeSet;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracepack_core::{
    compute_closure_with, Closure, Host, MemoryCache, ResolutionCache, TraceConfig, TraceError,
    CLOSURE_SCHEMA_VERSION,
};
use tracepack_util::path::to_slash;

/// Exit code when at least one entry failed to trace.
const EXIT_TRACE_FAILED: i32 = 2;

/// Closure command action.
#[derive(Debug, Clone)]
pub struct ClosureAction {
    pub cwd: PathBuf,
    pub entries: Vec<PathBuf>,
    /// Service root; defaults to the working directory.
    pub root: Option<PathBuf>,
    pub no_cache: bool,
    pub union: bool,
    /// Print paths relative to the service root.
    pub relative: bool,
}

#[derive(Serialize)]
struct ClosureOutputJson<'a> {
    schema_version: u32,
    root: String,
    /// Effective configuration (probe extensions, `NODE_PATH` roots).
    config: &'a TraceConfig,
    entries: Vec<EntryResultJson>,
    #[serde(skip_serializing_if = "Option::is_none")]
    union: Option<Vec<String>>,
}

#[derive(Serialize)]
struct EntryResultJson {
    entry: String,
    ok: bool,
    files: Vec<String>,
    packages: Vec<String>,
    warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ClosureErrorJson>,
}

#[derive(Serialize)]
struct ClosureErrorJson {
    code: &'static str,
    message: String,
}

struct EntryOutcome {
    entry: PathBuf,
    result: std::result::Result<Closure, TraceError>,
}

/// Run the closure command.
pub fn run(action: ClosureAction, json: bool) -> Result<()> {
    let root = action
        .root
        .as_ref()
        .map_or_else(|| action.cwd.clone(), |r| absolutize(&action.cwd, r));
    let root = dunce::canonicalize(&root).into_diagnostic()?;

    let config = TraceConfig::from_env(&root);
    let host = Host::native(&config);
    let mut cache = MemoryCache::new();

    let mut outcomes = Vec::with_capacity(action.entries.len());
    for entry in &action.entries {
        let entry = absolutize(&action.cwd, entry);
        let entry = dunce::canonicalize(&entry).unwrap_or(entry);
        let shared: Option<&mut dyn ResolutionCache> = if action.no_cache {
            None
        } else {
            Some(&mut cache)
        };
        let result = compute_closure_with(&host, &config, &entry, shared);
        if let Err(e) = &result {
            tracing::debug!(code = e.code(), entry = %entry.display(), "trace failed");
        }
        outcomes.push(EntryOutcome { entry, result });
    }

    let render = |p: &Path| display_path(p, &root, action.relative);

    if json {
        print_json(&outcomes, &root, &config, action.union, &render)?;
    } else {
        let shared = !action.no_cache && outcomes.len() > 1;
        print_human(&outcomes, action.union, shared, &render)?;
    }

    if outcomes.iter().any(|o| o.result.is_err()) {
        std::process::exit(EXIT_TRACE_FAILED);
    }
    Ok(())
}

fn print_json(
    outcomes: &[EntryOutcome],
    root: &Path,
    config: &TraceConfig,
    union: bool,
    render: &dyn Fn(&Path) -> String,
) -> Result<()> {
    let entries = outcomes
        .iter()
        .map(|outcome| match &outcome.result {
            Ok(closure) => EntryResultJson {
                entry: render(outcome.entry.as_path()),
                ok: true,
                files: closure.files.iter().map(|p| render(p.as_path())).collect(),
                packages: closure.packages.iter().map(|p| render(p.as_path())).collect(),
                warnings: closure.warnings.clone(),
                error: None,
            },
            Err(e) => EntryResultJson {
                entry: render(outcome.entry.as_path()),
                ok: false,
                files: Vec::new(),
                packages: Vec::new(),
                warnings: Vec::new(),
                error: Some(ClosureErrorJson {
                    code: e.code(),
                    message: e.to_string(),
                }),
            },
        })
        .collect();

    let output = ClosureOutputJson {
        schema_version: CLOSURE_SCHEMA_VERSION,
        root: to_slash(root),
        config,
        entries,
        union: union.then(|| union_of(outcomes, render)),
    };
    println!("{}", serde_json::to_string(&output).into_diagnostic()?);
    Ok(())
}

fn print_human(
    outcomes: &[EntryOutcome],
    union: bool,
    shared: bool,
    render: &dyn Fn(&Path) -> String,
) -> Result<()> {
    let mut out = io::stdout().lock();

    if union {
        for file in union_of(outcomes, render) {
            writeln!(out, "{file}").into_diagnostic()?;
        }
    } else {
        if shared {
            eprintln!(
                "note: entries share lookups; packages listed under an earlier entry are not repeated (use --union or --no-cache)"
            );
        }
        for outcome in outcomes {
            if let Ok(closure) = &outcome.result {
                writeln!(
                    out,
                    "# {} ({} files, {} packages)",
                    render(outcome.entry.as_path()),
                    closure.len(),
                    closure.packages.len()
                )
                .into_diagnostic()?;
                for file in &closure.files {
                    writeln!(out, "{}", render(file.as_path())).into_diagnostic()?;
                }
            }
        }
    }

    for outcome in outcomes {
        match &outcome.result {
            Ok(closure) => {
                for name in &closure.warnings {
                    eprintln!("warning: missing optional dependency: {name}");
                }
            }
            Err(e) => {
                eprintln!("error: {}: {}: {e}", render(outcome.entry.as_path()), e.code());
            }
        }
    }

    Ok(())
}

/// Sorted union of every successful closure.
fn union_of(outcomes: &[EntryOutcome], render: &dyn Fn(&Path) -> String) -> Vec<String> {
    outcomes
        .iter()
        .filter_map(|o| o.result.as_ref().ok())
        .flat_map(|closure| closure.files.iter().map(|p| render(p.as_path())))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn absolutize(cwd: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}

fn display_path(path: &Path, root: &Path, relative: bool) -> String {
    if relative {
        if let Ok(rel) = path.strip_prefix(root) {
            return to_slash(rel);
        }
    }
    to_slash(path)
}
