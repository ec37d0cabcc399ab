//! Trivia arithmetic for passes that add or remove whole statements.

/// The indentation of the line a token starts: everything after the last
/// newline in its leading trivia. Leading trivia without a newline is
/// returned whole only when it is pure spacing.
pub fn indentation(leading: &str) -> &str {
    let tail = match leading.rfind('\n') {
        Some(pos) => &leading[pos + 1..],
        None => leading,
    };
    if tail.chars().all(|c| c == ' ' || c == '\t') {
        tail
    } else {
        ""
    }
}

/// Leading trivia that starts a new line at the given indentation.
pub fn line_break(indent: &str) -> String {
    format!("\n{indent}")
}

/// Replace the final-line indentation of a leading-trivia run, keeping
/// comments and blank lines above it.
pub fn reindent(leading: &str, indent: &str) -> String {
    match leading.rfind('\n') {
        Some(pos) => {
            let tail = &leading[pos + 1..];
            if tail.chars().all(|c| c == ' ' || c == '\t') {
                format!("{}{}", &leading[..pos + 1], indent)
            } else {
                leading.to_string()
            }
        }
        None => indent.to_string(),
    }
}

/// True if the trivia run carries anything worth keeping when its token
/// is deleted (comments or preprocessor lines, not just spacing).
pub fn has_comment(leading: &str) -> bool {
    leading.contains("//") || leading.contains("/*") || leading.contains('#')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indentation_after_newline() {
        assert_eq!(indentation("\n      "), "      ");
        assert_eq!(indentation("  "), "  ");
        assert_eq!(indentation("\n  // note\n    "), "    ");
    }

    #[test]
    fn test_reindent_keeps_comment_lines() {
        assert_eq!(reindent("\n  // note\n      ", "  "), "\n  // note\n  ");
        assert_eq!(reindent("      ", "  "), "  ");
    }

    #[test]
    fn test_comment_detection() {
        assert!(has_comment("\n  // keep me\n  "));
        assert!(!has_comment("\n\n    "));
    }
}
