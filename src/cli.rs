//! Command-line interface for mockshift.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::MigrateOptions;

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

/// Rhino.Mocks to Moq test migration.
///
/// Mockshift rewrites C# unit tests from the record/replay style of
/// Rhino.Mocks to the fluent style of Moq, one source file at a time,
/// preserving the surrounding code and formatting. Constructs it cannot
/// translate are left unchanged and reported as warnings.
#[derive(Parser)]
#[command(name = "mockshift")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Rewrite Rhino.Mocks test sources to Moq
    Migrate(MigrateArgs),
}

/// Arguments for the migrate command.
#[derive(Parser)]
pub struct MigrateArgs {
    /// Path to migrate (file or directory of projects)
    pub path: PathBuf,

    /// Report what would change without writing any file
    #[arg(long)]
    pub dry_run: bool,

    /// Output format: text or json
    #[arg(short, long, default_value = "text")]
    pub format: String,

    /// Suppress progress and warnings on stderr
    #[arg(short, long)]
    pub quiet: bool,
}

/// Run the migrate command.
pub fn run_migrate(args: &MigrateArgs) -> anyhow::Result<i32> {
    if args.format != "text" && args.format != "json" {
        eprintln!(
            "Error: invalid format {:?}, must be 'text' or 'json'",
            args.format
        );
        return Ok(EXIT_ERROR);
    }

    let summary = crate::migrate(
        &args.path,
        &MigrateOptions {
            dry_run: args.dry_run,
            quiet: args.quiet || args.format == "json",
        },
    )?;

    if args.format == "json" {
        println!("{}", summary.render_json()?);
    } else {
        print!("{}", summary.render_text());
    }

    Ok(if summary.has_failures() {
        EXIT_FAILED
    } else {
        EXIT_SUCCESS
    })
}
