//! Pass 9: `.Object` insertion.
//!
//! After pass 5 the mock variables hold `Mock<T>` wrappers, but the code
//! around them still passes and dereferences them as if they were the
//! mocked type. Every use of a mock variable outside the Moq wrapper API
//! gains `.Object`: argument positions, assignment sources, returns,
//! initializer elements, member accesses and lambda results. Uses that
//! bind to the wrapper itself (`Setup`, `Verify`, `InSequence`, `Object`,
//! ...) are left alone, which also makes the pass a no-op on already
//! converted code.

use super::{PassContext, RewritePass};
use crate::syntax::ast::{
    methods_mut, visit_expr_mut, CompilationUnit, Expr, ExprKind, LambdaBody, Stmt, StmtKind,
};
use crate::syntax::print::clean_type_text;
use crate::syntax::token::Token;

pub struct MockObjectPass;

impl RewritePass for MockObjectPass {
    fn name(&self) -> &'static str {
        "mock-object"
    }

    fn rewrite(&self, unit: &mut CompilationUnit, ctx: &PassContext<'_>) {
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
        StmtKind::ExprStmt { expr, .. } => rewrite_expr_tree(expr, ctx),
        StmtKind::Return { expr: Some(e), .. } => {
            rewrite_expr_tree(e, ctx);
            wrap_if_bare_mock(e, ctx);
        }
        StmtKind::LocalDecl { ty, decls, .. } => {
            let target_is_mock = ty.is_var() || clean_type_text(ty).starts_with("Mock<");
            for d in decls {
                if let Some((_, init)) = &mut d.init {
                    rewrite_expr_tree(init, ctx);
                    if !target_is_mock {
                        wrap_if_bare_mock(init, ctx);
                    }
                }
            }
        }
        StmtKind::Using { resource, body, .. } => {
            rewrite_expr_tree(resource, ctx);
            rewrite_stmt(body, ctx);
        }
        StmtKind::Block(block) => {
            for s in &mut block.stmts {
                rewrite_stmt(s, ctx);
            }
        }
        _ => {}
    }
}

fn rewrite_expr_tree(expr: &mut Expr, ctx: &PassContext<'_>) {
    visit_expr_mut(expr, &mut |e| {
        let binds_wrapper = ctx
            .model
            .symbol_of(e)
            .map(|s| ctx.moq.wrapper_members.contains(&s))
            .unwrap_or(false);
        match &mut e.kind {
            ExprKind::Member { base, .. } => {
                if !binds_wrapper {
                    wrap_if_bare_mock(base, ctx);
                }
            }
            ExprKind::Invoke { args, .. } => {
                for arg in &mut args.args {
                    wrap_if_bare_mock(&mut arg.expr, ctx);
                }
            }
            ExprKind::New { args, init, .. } => {
                if let Some(args) = args {
                    for arg in &mut args.args {
                        wrap_if_bare_mock(&mut arg.expr, ctx);
                    }
                }
                if let Some(init) = init {
                    for (elem, _) in &mut init.elems {
                        wrap_if_bare_mock(elem, ctx);
                    }
                }
            }
            ExprKind::Init(init) => {
                for (elem, _) in &mut init.elems {
                    wrap_if_bare_mock(elem, ctx);
                }
            }
            ExprKind::Assign { left, right, .. } => {
                let target_is_mock = left
                    .first_identifier()
                    .and_then(|t| ctx.model.identifier_type(&t.text))
                    .map(|ty| ty.starts_with("Mock<"))
                    .unwrap_or(false);
                if !target_is_mock {
                    wrap_if_bare_mock(right, ctx);
                }
            }
            ExprKind::Lambda {
                body: LambdaBody::Expr(body),
                ..
            } => wrap_if_bare_mock(body, ctx),
            _ => {}
        }
    });
}

/// `mock` -> `mock.Object` when the identifier is a known mock variable.
fn wrap_if_bare_mock(slot: &mut Expr, ctx: &PassContext<'_>) {
    let is_mock = match &slot.kind {
        ExprKind::Ident(t) => ctx.model.is_mock_variable(&t.text),
        _ => false,
    };
    if !is_mock {
        return;
    }
    let inner = std::mem::replace(
        slot,
        Expr::new(ExprKind::Ident(Token::ident(""))),
    );
    *slot = Expr::new(ExprKind::Member {
        base: Box::new(inner),
        dot: Token::punct("."),
        name: Box::new(Expr::new(ExprKind::Ident(Token::ident("Object")))),
    });
}

#[cfg(test)]
mod tests {
    use crate::rewrite::pipeline::test_support::run_single_pass;

    fn fixture(body: &str) -> String {
        format!(
            r#"using Moq;

public interface IAccount
{{
  int Balance ();
}}

public class T
{{
  private Mock<IAccount> _mock;

  public void M ()
  {{
    {body}
  }}
}}
"#
        )
    }

    #[test]
    fn test_argument_position_gains_object() {
        let output = run_single_pass("mock-object", &fixture("Use (_mock);"));
        assert!(output.contains("Use (_mock.Object);"));
    }

    #[test]
    fn test_wrapper_calls_are_untouched() {
        let source = fixture("_mock.Setup (m => m.Balance ()).Returns (1);");
        assert_eq!(run_single_pass("mock-object", &source), source);
    }

    #[test]
    fn test_member_access_goes_through_object() {
        let output = run_single_pass("mock-object", &fixture("_mock.Balance ();"));
        assert!(output.contains("_mock.Object.Balance ();"));
    }

    #[test]
    fn test_assignment_source_gains_object() {
        let output = run_single_pass("mock-object", &fixture("IAccount account = _mock;"));
        assert!(output.contains("IAccount account = _mock.Object;"));
    }

    #[test]
    fn test_already_converted_code_is_stable() {
        let source = fixture("Use (_mock.Object);");
        assert_eq!(run_single_pass("mock-object", &source), source);
    }
}
