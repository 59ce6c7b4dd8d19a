#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::cast_possible_truncation)]

mod commands;
mod logging;

use clap::Parser;
use miette::Result;
use relink_core::ModuleFormat;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "relink")]
#[command(
    author,
    version,
    about = "Rewrite imports in bundled chunks to concrete on-disk files",
    long_about = None
)]
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
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Rewrite import specifiers in chunk files to concrete paths
    Rewrite {
        /// Chunk files or directories to process (default: working directory)
        paths: Vec<PathBuf>,

        /// Module format of the chunks
        #[arg(long, value_enum, default_value_t = FormatArg::Esm)]
        format: FormatArg,

        /// Report planned rewrites without writing files
        #[arg(long)]
        dry_run: bool,
    },

    /// Resolve one specifier and print the rewrite decision
    Resolve {
        /// The specifier as it appears in a chunk
        specifier: String,

        /// Directory the specifier resolves from (default: working directory)
        #[arg(long, value_name = "DIR")]
        base: Option<PathBuf>,

        /// Module format the chunk is loaded as
        #[arg(long, value_enum, default_value_t = FormatArg::Esm)]
        format: FormatArg,
    },

    /// List the import specifiers found in a file
    Scan {
        /// File to scan
        file: PathBuf,
    },
}

#[derive(clap::ValueEnum, Debug, Clone, Copy)]
enum FormatArg {
    Esm,
    Cjs,
}

impl From<FormatArg> for ModuleFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Esm => ModuleFormat::Esm,
            FormatArg::Cjs => ModuleFormat::Cjs,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Determine working directory
    let cwd = cli
        .cwd
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."));

    logging::init(cli.verbose, cli.json);

    match cli.command {
        Commands::Rewrite {
            paths,
            format,
            dry_run,
        } => commands::rewrite::run(&cwd, &paths, format.into(), dry_run, cli.json),
        Commands::Resolve {
            specifier,
            base,
            format,
        } => commands::resolve::run(&cwd, &specifier, base.as_deref(), format.into(), cli.json),
        Commands::Scan { file } => commands::scan::run(&cwd, &file, cli.json),
    }
}
