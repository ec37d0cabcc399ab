//! Passes 2 and 10: the using directives.
//!
//! `using Moq;` is inserted early (pass 2) so the later passes bind Moq
//! symbols, directly before the first Rhino.Mocks directive. The
//! Rhino.Mocks directives themselves are removed last (pass 10), when
//! nothing in the file refers to them anymore. Both passes handle
//! directives at the top level and inside namespace blocks.

use super::{format, PassContext, RewritePass};
use crate::syntax::ast::{CompilationUnit, Member, UsingDirective};
use crate::syntax::token::Token;

pub struct MoqUsingDirectivePass;

impl RewritePass for MoqUsingDirectivePass {
    fn name(&self) -> &'static str {
        "moq-using-directive"
    }

    fn rewrite(&self, unit: &mut CompilationUnit, ctx: &PassContext<'_>) {
        if !ctx.model.rhino_imported() || ctx.model.moq_imported() {
            return;
        }
        if insert_moq(&mut unit.usings) {
            return;
        }
        for member in &mut unit.members {
            if insert_into_member(member) {
                return;
            }
        }
    }
}

fn insert_into_member(member: &mut Member) -> bool {
    if let Member::Namespace {
        usings, members, ..
    } = member
    {
        if insert_moq(usings) {
            return true;
        }
        for m in members {
            if insert_into_member(m) {
                return true;
            }
        }
    }
    false
}

/// Insert `using Moq;` before the first Rhino.Mocks directive of the
/// list. The new directive takes over the old one's leading trivia.
fn insert_moq(usings: &mut Vec<UsingDirective>) -> bool {
    let Some(pos) = usings
        .iter()
        .position(|u| u.namespace().starts_with("Rhino.Mocks"))
    else {
        return false;
    };
    let old_leading = usings[pos].kw.leading.clone();
    let indent = format::indentation(&old_leading).to_string();
    usings[pos].kw.leading = format::line_break(&indent);
    usings.insert(
        pos,
        UsingDirective {
            kw: Token::ident("using").with_leading(&old_leading),
            name: vec![Token::ident("Moq").with_leading(" ")],
            semi: Token::punct(";"),
        },
    );
    true
}

pub struct RhinoUsingDirectivePass;

impl RewritePass for RhinoUsingDirectivePass {
    fn name(&self) -> &'static str {
        "rhino-using-directive"
    }

    fn rewrite(&self, unit: &mut CompilationUnit, _ctx: &PassContext<'_>) {
        let salvage = remove_rhino(&mut unit.usings);
        if !salvage.is_empty() {
            let next = match unit.members.first_mut() {
                Some(member) => member_first_token_mut(member),
                None => &mut unit.eof,
            };
            next.leading = format!("{salvage}{}", next.leading);
        }
        for member in &mut unit.members {
            remove_in_member(member);
        }
    }
}

fn remove_in_member(member: &mut Member) {
    if let Member::Namespace {
        usings,
        members,
        close,
        ..
    } = member
    {
        let salvage = remove_rhino(usings);
        if !salvage.is_empty() {
            let next = match members.first_mut() {
                Some(m) => member_first_token_mut(m),
                None => close,
            };
            next.leading = format!("{salvage}{}", next.leading);
        }
        for m in members {
            remove_in_member(m);
        }
    }
}

/// Drop every `using Rhino.Mocks...;`, returning the comment lines that
/// rode on removed directives.
fn remove_rhino(usings: &mut Vec<UsingDirective>) -> String {
    let mut salvage = String::new();
    usings.retain(|u| {
        if !u.namespace().starts_with("Rhino.Mocks") {
            return true;
        }
        let leading = &u.kw.leading;
        if format::has_comment(leading) {
            salvage.push_str(&leading[..leading.rfind('\n').unwrap_or(0)]);
        }
        false
    });
    salvage
}

fn member_first_token_mut(member: &mut Member) -> &mut Token {
    match member {
        Member::Namespace { kw, .. } => kw,
        Member::Type(decl) => match decl.prefix.first_mut() {
            Some(t) => t,
            None => &mut decl.kw,
        },
        Member::Opaque(tokens) => &mut tokens[0],
    }
}

#[cfg(test)]
mod tests {
    use crate::rewrite::pipeline::test_support::run_single_pass;

    #[test]
    fn test_moq_is_inserted_before_rhino() {
        let output = run_single_pass(
            "moq-using-directive",
            "using System;\nusing Rhino.Mocks;\n\npublic class T\n{\n}\n",
        );
        assert!(output.starts_with("using System;\nusing Moq;\nusing Rhino.Mocks;\n"));
    }

    #[test]
    fn test_existing_moq_import_is_kept_single() {
        let source = "using Moq;\nusing Rhino.Mocks;\n\npublic class T\n{\n}\n";
        assert_eq!(run_single_pass("moq-using-directive", source), source);
    }

    #[test]
    fn test_files_without_rhino_are_untouched() {
        let source = "using System;\n\npublic class T\n{\n}\n";
        assert_eq!(run_single_pass("moq-using-directive", source), source);
    }

    #[test]
    fn test_rhino_directives_are_removed() {
        let output = run_single_pass(
            "rhino-using-directive",
            "using Moq;\nusing Rhino.Mocks;\nusing Rhino.Mocks.Constraints;\n\npublic class T\n{\n}\n",
        );
        assert_eq!(output, "using Moq;\n\npublic class T\n{\n}\n");
    }

    #[test]
    fn test_namespace_scoped_directives_are_removed() {
        let output = run_single_pass(
            "rhino-using-directive",
            "namespace App.Tests\n{\n  using Moq;\n  using Rhino.Mocks;\n\n  public class T\n  {\n  }\n}\n",
        );
        assert!(!output.contains("Rhino.Mocks"));
        assert!(output.contains("using Moq;"));
    }
}
