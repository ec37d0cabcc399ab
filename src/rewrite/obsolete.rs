//! Pass 8: record/replay state transitions.
//!
//! `Replay`, `BackToRecord`, `ReplayAll` and `BackToRecordAll` have no
//! Moq counterpart; their statements are removed outright, as is a bare
//! `repository.Ordered ();` left outside a `using` header. Comments
//! riding on a removed statement move onto whatever follows it.

use super::{format, PassContext, RewritePass};
use crate::syntax::ast::{walk_blocks_mut, Block, CompilationUnit, StmtKind};

pub struct ObsoleteCallPass;

impl RewritePass for ObsoleteCallPass {
    fn name(&self) -> &'static str {
        "obsolete-call"
    }

    fn rewrite(&self, unit: &mut CompilationUnit, ctx: &PassContext<'_>) {
        if !ctx.model.rhino_imported() {
            return;
        }
        walk_blocks_mut(unit, &mut |block| remove_obsolete(block, ctx));
    }
}

fn remove_obsolete(block: &mut Block, ctx: &PassContext<'_>) {
    let mut i = 0;
    while i < block.stmts.len() {
        let obsolete = match &block.stmts[i].kind {
            StmtKind::ExprStmt { expr, .. } => ctx
                .model
                .symbol_of(expr)
                .map(|s| ctx.rhino.obsolete_calls.contains(&s) || s == ctx.rhino.repo_ordered)
                .unwrap_or(false),
            _ => false,
        };
        if !obsolete {
            i += 1;
            continue;
        }
        let stmt = block.stmts.remove(i);
        ctx.warn(
            stmt.line(),
            "record/replay state call removed; Moq has no record/replay model",
        );
        let leading = stmt.first_token().leading.clone();
        if format::has_comment(&leading) {
            // Keep the comment lines, drop the removed statement's own
            // indentation.
            let kept = &leading[..leading.rfind('\n').unwrap_or(0)];
            let next = match block.stmts.get_mut(i) {
                Some(next) => next.first_token_mut(),
                None => &mut block.close,
            };
            next.leading = format!("{kept}{}", next.leading);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::rewrite::pipeline::test_support::run_single_pass;

    fn fixture(body: &str) -> String {
        format!(
            r#"using Rhino.Mocks;

public interface IAccount
{{
  int Balance ();
}}

public class T
{{
  private IAccount _mock;
  private MockRepository _repo;

  public void M ()
  {{
{body}
  }}
}}
"#
        )
    }

    #[test]
    fn test_replay_statements_are_removed() {
        let output = run_single_pass(
            "obsolete-call",
            &fixture("    _mock.Replay ();\n    _repo.ReplayAll ();\n    _mock.Balance ();"),
        );
        assert!(!output.contains("Replay"));
        assert!(output.contains("_mock.Balance ();"));
    }

    #[test]
    fn test_back_to_record_is_removed() {
        let output = run_single_pass(
            "obsolete-call",
            &fixture("    _mock.BackToRecord ();\n    _repo.BackToRecordAll ();"),
        );
        assert!(!output.contains("BackToRecord"));
    }

    #[test]
    fn test_bare_ordered_statement_is_removed() {
        let output = run_single_pass("obsolete-call", &fixture("    _repo.Ordered ();"));
        assert!(!output.contains("Ordered"));
    }

    #[test]
    fn test_comments_survive_removal() {
        let output = run_single_pass(
            "obsolete-call",
            &fixture("    // switch to replay\n    _mock.Replay ();\n    _mock.Balance ();"),
        );
        assert!(output.contains("// switch to replay"));
        assert!(!output.contains("Replay ()"));
    }
}
