//! Diagnostics channel.
//!
//! Warnings are advisory: a pass that cannot complete a local transform
//! reports here and leaves the code alone, and nothing downstream changes
//! behavior based on what was reported. Entries are collected in memory
//! for the run summary and mirrored to stderr as they happen.

use std::sync::Mutex;

use colored::Colorize;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub file: String,
    /// 0-based source line.
    pub line: u32,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct DiagnosticSink {
    quiet: bool,
    entries: Mutex<Vec<Diagnostic>>,
}

impl DiagnosticSink {
    pub fn new(quiet: bool) -> DiagnosticSink {
        DiagnosticSink {
            quiet,
            entries: Mutex::new(Vec::new()),
        }
    }

    pub fn warn(&self, file: &str, line: u32, message: impl Into<String>) {
        let diag = Diagnostic {
            file: file.to_string(),
            line,
            message: message.into(),
        };
        if !self.quiet {
            eprintln!(
                "{} {}:{}: {}",
                "warning:".yellow().bold(),
                diag.file,
                diag.line,
                diag.message
            );
        }
        self.entries.lock().expect("sink poisoned").push(diag);
    }

    /// Progress line, one per file processed.
    pub fn info(&self, message: &str) {
        if !self.quiet {
            eprintln!("{}", message.dimmed());
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("sink poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn entries(&self) -> Vec<Diagnostic> {
        self.entries.lock().expect("sink poisoned").clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entries_are_collected_in_order() {
        let sink = DiagnosticSink::new(true);
        sink.warn("a.cs", 3, "first");
        sink.warn("b.cs", 0, "second");
        let entries = sink.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].message, "first");
        assert_eq!(entries[1].line, 0);
    }
}
