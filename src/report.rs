//! Run summary output.
//!
//! Two formats: colored text for humans, JSON for programmatic
//! consumption. The JSON shape is stable; warnings are carried verbatim
//! from the diagnostics sink.

use colored::Colorize;
use serde::Serialize;

use crate::diag::Diagnostic;

/// Per-compilation counters.
#[derive(Serialize)]
pub struct CompilationSummary {
    pub name: String,
    /// `.cs` files examined.
    pub files_scanned: usize,
    /// Files whose content changed.
    pub files_rewritten: usize,
    /// Files that could not be read or written.
    pub files_failed: usize,
}

#[derive(Serialize)]
pub struct RunSummary {
    pub dry_run: bool,
    pub compilations: Vec<CompilationSummary>,
    pub warnings: Vec<Diagnostic>,
}

impl RunSummary {
    pub fn files_rewritten(&self) -> usize {
        self.compilations.iter().map(|c| c.files_rewritten).sum()
    }

    pub fn has_failures(&self) -> bool {
        self.compilations.iter().any(|c| c.files_failed > 0)
    }

    pub fn render_text(&self) -> String {
        let mut out = String::new();
        for c in &self.compilations {
            let line = format!(
                "{}: {} of {} files rewritten",
                c.name, c.files_rewritten, c.files_scanned
            );
            if c.files_failed > 0 {
                out.push_str(&format!(
                    "{} ({} failed)\n",
                    line.red(),
                    c.files_failed
                ));
            } else if c.files_rewritten > 0 {
                out.push_str(&format!("{line}\n"));
            } else {
                out.push_str(&format!("{}\n", line.dimmed()));
            }
        }
        out.push_str(&format!(
            "\n{} file(s) rewritten, {} warning(s)\n",
            self.files_rewritten().to_string().bold(),
            self.warnings.len()
        ));
        if self.dry_run {
            out.push_str(&format!("{}\n", "dry run: no files were written".yellow()));
        }
        out
    }

    pub fn render_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> RunSummary {
        RunSummary {
            dry_run: false,
            compilations: vec![CompilationSummary {
                name: "ProjectA".to_string(),
                files_scanned: 3,
                files_rewritten: 2,
                files_failed: 0,
            }],
            warnings: vec![Diagnostic {
                file: "a.cs".to_string(),
                line: 4,
                message: "something".to_string(),
            }],
        }
    }

    #[test]
    fn test_text_carries_the_counters() {
        colored::control::set_override(false);
        let text = summary().render_text();
        assert!(text.contains("ProjectA: 2 of 3 files rewritten"));
        assert!(text.contains("2 file(s) rewritten, 1 warning(s)"));
    }

    #[test]
    fn test_json_is_stable() {
        let json = summary().render_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["compilations"][0]["files_rewritten"], 2);
        assert_eq!(value["warnings"][0]["line"], 4);
        assert_eq!(value["dry_run"], false);
    }
}
