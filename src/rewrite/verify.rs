//! Pass 4: verification calls.
//!
//! `mock.VerifyAllExpectations ()` is renamed to `mock.Verify ()`.
//! `repository.VerifyAll ()` fans out into one `name.Verify ();`
//! statement per mock created through that repository instance, in
//! creation order; a repository with no known mocks is left alone with a
//! warning.

use super::{factory, format, PassContext, RewritePass};
use crate::syntax::ast::{
    methods_mut, walk_blocks_mut, walk_stmt_exprs_mut, Block, CompilationUnit, ExprKind, Stmt,
    StmtKind,
};
use crate::syntax::token::Token;

pub struct VerifyPass;

impl RewritePass for VerifyPass {
    fn name(&self) -> &'static str {
        "verify"
    }

    fn rewrite(&self, unit: &mut CompilationUnit, ctx: &PassContext<'_>) {
        if !ctx.model.rhino_imported() {
            return;
        }
        for method in methods_mut(unit) {
            if let Some(body) = &mut method.body {
                for stmt in &mut body.stmts {
                    walk_stmt_exprs_mut(stmt, &mut |expr| {
                        if ctx.model.symbol_of(expr)
                            == Some(ctx.rhino.ext_verify_all_expectations)
                        {
                            if let ExprKind::Invoke { callee, .. } = &mut expr.kind {
                                if let ExprKind::Member { name, .. } = &mut callee.kind {
                                    name.first_token_mut().text = "Verify".to_string();
                                }
                            }
                        }
                    });
                }
            }
        }
        walk_blocks_mut(unit, &mut |block| expand_repository_verify(block, ctx));
    }
}

fn expand_repository_verify(block: &mut Block, ctx: &PassContext<'_>) {
    let mut i = 0;
    while i < block.stmts.len() {
        let Some(repo) = repository_verify_all(&block.stmts[i], ctx) else {
            i += 1;
            continue;
        };
        let line = block.stmts[i].line();
        let mocks = ctx.model.mocks_of_repository(&repo);
        if mocks.is_empty() {
            ctx.warn(
                line,
                format!("no mocks created through `{repo}` are known; VerifyAll left unchanged"),
            );
            i += 1;
            continue;
        }
        let leading = block.stmts[i].first_token().leading.clone();
        let indent = format::indentation(&leading).to_string();
        let replacements: Vec<Stmt> = mocks
            .iter()
            .enumerate()
            .map(|(n, mock)| {
                let mut receiver = factory::ident(mock);
                let lead = if n == 0 {
                    leading.clone()
                } else {
                    format::line_break(&indent)
                };
                factory::set_leading(&mut receiver, &lead);
                Stmt::new(StmtKind::ExprStmt {
                    expr: factory::chain_call(receiver, "Verify", vec![]),
                    semi: Token::punct(";"),
                })
            })
            .collect();
        let count = replacements.len();
        block.stmts.splice(i..i + 1, replacements);
        i += count;
    }
}

/// The repository variable when the statement is `repo.VerifyAll ();`.
fn repository_verify_all(stmt: &Stmt, ctx: &PassContext<'_>) -> Option<String> {
    let StmtKind::ExprStmt { expr, .. } = &stmt.kind else {
        return None;
    };
    if ctx.model.symbol_of(expr) != Some(ctx.rhino.repo_verify_all) {
        return None;
    }
    let receiver = expr.invocation_receiver()?;
    let name = receiver.first_identifier()?;
    ctx.model
        .is_repository_variable(&name.text)
        .then(|| name.text.clone())
}

#[cfg(test)]
mod tests {
    use crate::rewrite::pipeline::test_support::{run_single_pass, run_single_pass_with_warnings};

    #[test]
    fn test_verify_all_expectations_is_renamed() {
        let output = run_single_pass(
            "verify",
            r#"using Rhino.Mocks;

public interface IAccount
{
  int Balance ();
}

public class T
{
  private IAccount _mock;

  public void M ()
  {
    _mock.VerifyAllExpectations ();
  }
}
"#,
        );
        assert!(output.contains("_mock.Verify ();"));
        assert!(!output.contains("VerifyAllExpectations"));
    }

    #[test]
    fn test_repository_verify_all_fans_out() {
        let output = run_single_pass(
            "verify",
            r#"using Rhino.Mocks;

public interface IAccount
{
  int Balance ();
}

public class T
{
  public void M ()
  {
    var repo = new MockRepository ();
    var first = repo.StrictMock<IAccount>();
    var second = repo.StrictMock<IAccount>();
    repo.VerifyAll ();
  }
}
"#,
        );
        assert!(output.contains("    first.Verify();\n    second.Verify();"));
        assert!(!output.contains("repo.VerifyAll"));
    }

    #[test]
    fn test_repository_without_mocks_is_left() {
        let (output, warnings) = run_single_pass_with_warnings(
            "verify",
            r#"using Rhino.Mocks;

public class T
{
  public void M ()
  {
    var repo = new MockRepository ();
    repo.VerifyAll ();
  }
}
"#,
        );
        assert!(output.contains("repo.VerifyAll ();"));
        assert!(warnings.iter().any(|w| w.contains("repo")));
    }
}
