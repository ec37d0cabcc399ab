//! Pass 3: expectation chains become Moq setup chains.
//!
//! The root link is renamed (`Expect`/`Stub` -> `Setup`) and the trailing
//! links are rebuilt in canonical order: result (`Returns`/`Throws`),
//! then callbacks, then `.Verifiable()` for chains that started as
//! `Expect`. `.Repeat.*` has no Moq counterpart and is dropped with a
//! warning; a chain containing any link we cannot place is left whole.

use super::chain::{Chain, Link};
use super::factory;
use super::{PassContext, RewritePass};
use crate::syntax::ast::{methods_mut, CompilationUnit, Expr, Stmt, StmtKind};

pub struct MockSetupPass;

impl RewritePass for MockSetupPass {
    fn name(&self) -> &'static str {
        "mock-setup"
    }

    fn rewrite(&self, unit: &mut CompilationUnit, ctx: &PassContext<'_>) {
        if !ctx.model.rhino_imported() {
            return;
        }
        for method in methods_mut(unit) {
            if let Some(body) = &mut method.body {
                for stmt in &mut body.stmts {
                    rewrite_stmt(stmt, ctx);
                }
            }
        }
    }
}

fn rewrite_stmt(stmt: &mut Stmt, ctx: &PassContext<'_>) {
    match &mut stmt.kind {
        StmtKind::ExprStmt { expr, .. } => rewrite_chain(expr, ctx),
        StmtKind::Block(block) => {
            for s in &mut block.stmts {
                rewrite_stmt(s, ctx);
            }
        }
        StmtKind::Using { body, .. } => rewrite_stmt(body, ctx),
        _ => {}
    }
}

fn rewrite_chain(expr: &mut Expr, ctx: &PassContext<'_>) {
    let line = expr.line();
    let Some(chain) = Chain::decompose(ctx.model, expr) else {
        return;
    };
    let root = match chain.links.iter().position(|l| {
        l.symbol == Some(ctx.rhino.ext_expect) || l.symbol == Some(ctx.rhino.ext_stub)
    }) {
        Some(i) => i,
        None => return,
    };
    let verifiable = chain.links[root].symbol == Some(ctx.rhino.ext_expect);

    let Chain {
        receiver,
        mut links,
    } = chain;
    let rest: Vec<Link> = links.split_off(root + 1);
    let mut root_link = links.pop().expect("root link exists");
    let prefix = links;

    let mut results: Vec<Link> = Vec::new();
    let mut callbacks: Vec<Link> = Vec::new();
    let mut iter = rest.into_iter().peekable();
    while let Some(mut link) = iter.next() {
        let Some(symbol) = link.symbol else {
            ctx.warn(
                line,
                format!(
                    "fluent call `{}` is not recognized; statement left unchanged",
                    link.name_text()
                ),
            );
            return;
        };
        if symbol == ctx.rhino.opt_return {
            link.rename("Returns");
            results.push(link);
        } else if symbol == ctx.rhino.opt_throw {
            link.rename("Throws");
            results.push(link);
        } else if symbol == ctx.rhino.opt_when_called
            || symbol == ctx.rhino.opt_do
            || symbol == ctx.rhino.opt_callback
        {
            link.rename("Callback");
            callbacks.push(link);
        } else if symbol == ctx.rhino.opt_repeat {
            // `.Repeat.Any ()` spans two links; drop both.
            if iter
                .peek()
                .and_then(|next| next.symbol)
                .map(|s| ctx.rhino.repeat_members.contains(&s))
                .unwrap_or(false)
            {
                iter.next();
            }
            ctx.warn(
                line,
                "`.Repeat` has no Moq equivalent; call-count constraint dropped",
            );
        } else {
            ctx.warn(
                line,
                format!(
                    "fluent call `{}` has no Moq equivalent; statement left unchanged",
                    link.name_text()
                ),
            );
            return;
        }
    }

    root_link.rename("Setup");
    let mut rebuilt_links = prefix;
    rebuilt_links.push(root_link);
    rebuilt_links.extend(results);
    rebuilt_links.extend(callbacks);
    if verifiable {
        rebuilt_links.push(Link::synthesized(
            "Verifiable",
            Some(factory::arg_list(vec![])),
        ));
    }

    *expr = Chain {
        receiver,
        links: rebuilt_links,
    }
    .rebuild();
}

#[cfg(test)]
mod tests {
    use crate::rewrite::pipeline::test_support::{run_single_pass, run_single_pass_with_warnings};

    fn fixture(body: &str) -> String {
        format!(
            r#"using Rhino.Mocks;

public interface IAccount
{{
  void DoSomething ();
  int Balance ();
}}

public class T
{{
  private IAccount _mock;

  public void M ()
  {{
    {body}
  }}
}}
"#
        )
    }

    #[test]
    fn test_expect_becomes_verifiable_setup() {
        let output = run_single_pass(
            "mock-setup",
            &fixture("_mock.Expect (m => m.DoSomething());"),
        );
        assert!(output.contains("_mock.Setup (m => m.DoSomething()).Verifiable();"));
    }

    #[test]
    fn test_stub_becomes_plain_setup() {
        let output = run_single_pass(
            "mock-setup",
            &fixture("_mock.Stub (m => m.Balance ()).Return (42);"),
        );
        assert!(output.contains("_mock.Setup (m => m.Balance ()).Returns (42);"));
        assert!(!output.contains("Verifiable"));
    }

    #[test]
    fn test_links_are_reordered_canonically() {
        let output = run_single_pass(
            "mock-setup",
            &fixture("_mock.Expect (m => m.Balance ()).WhenCalled (i => i.ToString ()).Return (1);"),
        );
        assert!(output.contains(
            "_mock.Setup (m => m.Balance ()).Returns (1).Callback (i => i.ToString ()).Verifiable();"
        ));
    }

    #[test]
    fn test_repeat_is_dropped_with_warning() {
        let (output, warnings) = run_single_pass_with_warnings(
            "mock-setup",
            &fixture("_mock.Expect (m => m.Balance ()).Return (1).Repeat.Any ();"),
        );
        assert!(output.contains("_mock.Setup (m => m.Balance ()).Returns (1).Verifiable();"));
        assert!(warnings.iter().any(|w| w.contains("Repeat")));
    }

    #[test]
    fn test_unknown_link_leaves_statement() {
        let source = fixture("_mock.Expect (m => m.Balance ()).CallOriginalMethod ();");
        let (output, warnings) = run_single_pass_with_warnings("mock-setup", &source);
        assert!(output.contains("CallOriginalMethod"));
        assert!(!output.contains("Setup"));
        assert!(!warnings.is_empty());
    }
}
