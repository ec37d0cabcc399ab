//! Mockshift - Rhino.Mocks to Moq test migration.
//!
//! Mockshift rewrites C# unit tests from the record/replay style of
//! Rhino.Mocks to the fluent style of Moq. Files are parsed into a
//! trivia-preserving syntax tree, bound against built-in metadata for
//! the two mocking libraries, and pushed through an ordered pipeline of
//! rewrite passes. Anything the passes cannot translate is left exactly
//! as written and reported as a warning.
//!
//! # Architecture
//!
//! - `syntax`: lossless parser, printer, and node correlation tracker
//! - `sema`: per-file semantic model over built-in assembly metadata
//! - `catalog`: up-front resolution of every Rhino/Moq symbol the
//!   passes match against
//! - `rewrite`: the ten rewrite passes and the per-file pipeline
//! - `workspace`: compilation discovery and BOM-preserving file I/O
//! - `diag` / `report`: warnings and the run summary

use std::path::Path;

pub mod catalog;
pub mod cli;
pub mod diag;
pub mod report;
pub mod rewrite;
pub mod sema;
pub mod syntax;
pub mod workspace;

pub use catalog::{CatalogError, MoqSymbols, RhinoSymbols};
pub use diag::{Diagnostic, DiagnosticSink};
pub use report::{CompilationSummary, RunSummary};
pub use rewrite::pipeline::MigrationPipeline;
pub use sema::{Compilation, SemanticModel};
pub use workspace::Workspace;

pub struct MigrateOptions {
    pub dry_run: bool,
    pub quiet: bool,
}

/// Migrate every compilation under `root`. IO failures on single files
/// are counted and reported, not fatal; a catalog failure skips the
/// whole compilation.
pub fn migrate(root: &Path, opts: &MigrateOptions) -> anyhow::Result<RunSummary> {
    let ws = Workspace::discover(root)?;
    let comp = sema::metadata::default_compilation();
    let diags = DiagnosticSink::new(opts.quiet);
    let pipeline = MigrationPipeline::new();

    let mut summaries = Vec::new();
    for compilation in &ws.compilations {
        let catalogs = RhinoSymbols::resolve(&comp.symbols)
            .map_err(anyhow::Error::from)
            .and_then(|r| Ok((r, MoqSymbols::resolve(&comp.symbols)?)));
        let (rhino, moq) = match catalogs {
            Ok(pair) => pair,
            Err(e) => {
                diags.warn(&compilation.name, 0, format!("{e}; compilation skipped"));
                summaries.push(CompilationSummary {
                    name: compilation.name.clone(),
                    files_scanned: compilation.files.len(),
                    files_rewritten: 0,
                    files_failed: compilation.files.len(),
                });
                continue;
            }
        };

        let mut scanned = 0;
        let mut rewritten = 0;
        let mut failed = 0;
        for path in &compilation.files {
            let file = path.display().to_string();
            scanned += 1;
            let source = match workspace::read_source(path) {
                Ok(s) => s,
                Err(e) => {
                    diags.warn(&file, 0, e.to_string());
                    failed += 1;
                    continue;
                }
            };
            if !workspace::mentions_rhino(&source.text) {
                continue;
            }
            let Some(new_text) =
                pipeline.rewrite_source(&file, &source.text, comp, &rhino, &moq, &diags)
            else {
                continue;
            };
            if opts.dry_run {
                diags.info(&format!("would rewrite {file}"));
                rewritten += 1;
                continue;
            }
            match workspace::write_source(path, &new_text, source.bom) {
                Ok(()) => {
                    diags.info(&format!("rewrote {file}"));
                    rewritten += 1;
                }
                Err(e) => {
                    diags.warn(&file, 0, e.to_string());
                    failed += 1;
                }
            }
        }
        summaries.push(CompilationSummary {
            name: compilation.name.clone(),
            files_scanned: scanned,
            files_rewritten: rewritten,
            files_failed: failed,
        });
    }

    Ok(RunSummary {
        dry_run: opts.dry_run,
        compilations: summaries,
        warnings: diags.entries(),
    })
}
