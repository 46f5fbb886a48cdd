#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::struct_excessive_bools)]

mod commands;
mod logging;

use clap::Parser;
use miette::Result;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "tracepack")]
#[command(author, version, about = "Trace the runtime file closure of Node.js entry points", long_about = None)]
struct Cli {
    /// Increase logging verbosity (-v for DEBUG, -vv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit JSON formatted output (stable, machine-readable)
    #[arg(long, global = true)]
    json: bool,

    /// Override the working directory
    #[arg(long, global = true, value_name = "PATH")]
    cwd: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Print version information
    Version,

    /// Compute the files needed at runtime by one or more entry files
    Closure {
        /// Entry files (relative to the working directory)
        #[arg(required = true)]
        entries: Vec<PathBuf>,

        /// Service root: where top-level packages are resolved and aliases are read
        #[arg(long, env = "TRACEPACK_ROOT", value_name = "DIR")]
        root: Option<PathBuf>,

        /// Compute every entry independently instead of sharing lookups.
        ///
        /// By default entries share one lookup cache: a package already listed
        /// under an earlier entry is not repeated for later entries.
        #[arg(long)]
        no_cache: bool,

        /// Print a single sorted union of all closures (the full artifact contents)
        #[arg(long)]
        union: bool,

        /// Print paths relative to the service root
        #[arg(long)]
        relative: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let cwd = cli
        .cwd
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."));

    logging::init(cli.verbose, cli.json);

    match cli.command {
        Some(Commands::Version) | None => commands::version::run(cli.json),
        Some(Commands::Closure {
            entries,
            root,
            no_cache,
            union,
            relative,
        }) => {
            let span = tracing::info_span!("closure", cmd = "closure", cwd = %cwd.display());
            let _guard = span.enter();
            commands::closure::run(
                commands::closure::ClosureAction {
                    cwd,
                    entries,
                    root,
                    no_cache,
                    union,
                    relative,
                },
                cli.json,
            )
        }
    }
}
