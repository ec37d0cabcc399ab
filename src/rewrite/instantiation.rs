//! Pass 5: mock construction.
//!
//! Repository factory calls become `new Mock<T> (...)`: strict factories
//! gain a leading `MockBehavior.Strict` argument, partial factories gain
//! a `{ CallBase = true }` initializer, and `typeof (T)` factory
//! arguments move into the type position. Declarations follow the value:
//! explicitly typed locals initialized with a mock become `var`, and
//! fields holding mocks are wrapped as `Mock<T>`.

use super::{factory, PassContext, RewritePass};
use crate::syntax::ast::{
    fields_mut, methods_mut, walk_stmt_exprs_mut, CompilationUnit, Expr, ExprKind, Stmt, StmtKind,
    TypeKind, TypeSyntax,
};
use crate::syntax::token::Token;

pub struct MockInstantiationPass;

impl RewritePass for MockInstantiationPass {
    fn name(&self) -> &'static str {
        "mock-instantiation"
    }

    fn rewrite(&self, unit: &mut CompilationUnit, ctx: &PassContext<'_>) {
        if !ctx.model.rhino_imported() {
            return;
        }
        for method in methods_mut(unit) {
            if let Some(body) = &mut method.body {
                for stmt in &mut body.stmts {
                    walk_stmt_exprs_mut(stmt, &mut |expr| rewrite_factory_call(expr, ctx));
                }
                for stmt in &mut body.stmts {
                    retype_locals(stmt);
                }
            }
        }
        for field in fields_mut(unit) {
            let holds_mock = field
                .decls
                .iter()
                .any(|d| ctx.model.is_mock_variable(&d.name.text));
            if holds_mock && field.ty.simple_name() != Some("Mock") {
                wrap_type(&mut field.ty);
            }
        }
    }
}

fn rewrite_factory_call(expr: &mut Expr, ctx: &PassContext<'_>) {
    let Some(symbol) = ctx.model.symbol_of(expr) else {
        return;
    };
    if !ctx.rhino.factories.contains(&symbol) {
        return;
    }
    let line = expr.line();
    let ExprKind::Invoke { callee, args } = &expr.kind else {
        return;
    };

    let mut ctor: Vec<Expr> = args.args.iter().map(|a| a.expr.clone()).collect();
    let mocked = match generic_type_argument(callee) {
        Some((ty, extra)) => {
            if extra {
                ctx.warn(
                    line,
                    "Moq mocks a single type; additional mocked types dropped",
                );
            }
            Some(ty)
        }
        None => match ctor.first().map(|e| &e.kind) {
            Some(ExprKind::TypeOf { ty, .. }) => {
                let ty = ty.clone();
                ctor.remove(0);
                Some(ty)
            }
            _ => None,
        },
    };
    let Some(mut mocked) = mocked else {
        ctx.warn(line, "cannot determine the mocked type; factory call left unchanged");
        return;
    };
    mocked.first_token_mut().leading.clear();

    let strict = ctx.rhino.strict_factories.contains(&symbol);
    let partial = ctx.rhino.partial_factories.contains(&symbol);
    if strict {
        ctor.insert(
            0,
            factory::member_named(factory::ident("MockBehavior"), "Strict"),
        );
    }

    let ctor_args = if ctor.is_empty() && partial {
        None
    } else {
        Some(factory::arg_list(ctor))
    };
    let init = partial.then(|| factory::initializer_assign("CallBase", "true"));

    let mut replacement = Expr::new(ExprKind::New {
        new_kw: Token::ident("new"),
        ty: TypeSyntax {
            kind: TypeKind::Generic {
                name: Token::ident("Mock").with_leading(" "),
                lt: Token::punct("<"),
                args: vec![(mocked, None)],
                gt: Token::punct(">"),
            },
        },
        args: ctor_args,
        init,
    });
    factory::inherit_leading(&mut replacement, expr);
    *expr = replacement;
}

/// The explicit type argument of a factory callee, plus whether extra
/// type arguments were present (multi-interface mocks).
fn generic_type_argument(callee: &Expr) -> Option<(TypeSyntax, bool)> {
    let ExprKind::Member { name, .. } = &callee.kind else {
        return None;
    };
    let ExprKind::Generic { args, .. } = &name.kind else {
        return None;
    };
    let first = args.first()?.0.clone();
    Some((first, args.len() > 1))
}

/// `IAccount mock = new Mock<IAccount>...` -> `var mock = ...`.
fn retype_locals(stmt: &mut Stmt) {
    match &mut stmt.kind {
        StmtKind::LocalDecl { ty, decls, .. } => {
            if ty.is_var() {
                return;
            }
            let initializes_mock = decls.iter().any(|d| {
                d.init.as_ref().map(|(_, init)| is_mock_new(init)).unwrap_or(false)
            });
            if initializes_mock {
                let leading = ty.first_token().leading.clone();
                *ty = TypeSyntax {
                    kind: TypeKind::Simple(Token::ident("var").with_leading(&leading)),
                };
            }
        }
        StmtKind::Block(block) => {
            for s in &mut block.stmts {
                retype_locals(s);
            }
        }
        StmtKind::Using { body, .. } => retype_locals(body),
        _ => {}
    }
}

fn is_mock_new(expr: &Expr) -> bool {
    matches!(
        &expr.kind,
        ExprKind::New { ty, .. } if ty.simple_name() == Some("Mock")
    )
}

fn wrap_type(ty: &mut TypeSyntax) {
    let leading = ty.first_token().leading.clone();
    let mut inner = std::mem::replace(ty, TypeSyntax::simple("var"));
    inner.first_token_mut().leading.clear();
    *ty = TypeSyntax {
        kind: TypeKind::Generic {
            name: Token::ident("Mock").with_leading(&leading),
            lt: Token::punct("<"),
            args: vec![(inner, None)],
            gt: Token::punct(">"),
        },
    };
}

#[cfg(test)]
mod tests {
    use crate::rewrite::pipeline::test_support::{run_single_pass, run_single_pass_with_warnings};

    fn fixture(field: &str, body: &str) -> String {
        format!(
            r#"using Rhino.Mocks;

public interface IAccount
{{
  int Balance ();
}}

public class T
{{
  {field}

  public void M ()
  {{
    {body}
  }}
}}
"#
        )
    }

    #[test]
    fn test_generate_mock_becomes_new_mock() {
        let output = run_single_pass(
            "mock-instantiation",
            &fixture(
                "private string _mock;",
                "_mock = MockRepository.GenerateMock<string>();",
            ),
        );
        assert!(output.contains("_mock = new Mock<string>();"));
        assert!(output.contains("private Mock<string> _mock;"));
    }

    #[test]
    fn test_strict_factory_adds_behavior_argument() {
        let output = run_single_pass(
            "mock-instantiation",
            &fixture(
                "private string _mock;",
                "_mock = MockRepository.GenerateStrictMock<string> (42);",
            ),
        );
        assert!(output.contains("_mock = new Mock<string> (MockBehavior.Strict, 42);"));
    }

    #[test]
    fn test_partial_factory_sets_call_base() {
        let output = run_single_pass(
            "mock-instantiation",
            &fixture(
                "",
                "var mock = MockRepository.GeneratePartialMock<IAccount>();",
            ),
        );
        assert!(output.contains("var mock = new Mock<IAccount> { CallBase = true };"));
    }

    #[test]
    fn test_typeof_argument_moves_to_type_position() {
        let output = run_single_pass(
            "mock-instantiation",
            &fixture("", "var mock = MockRepository.GenerateStub (typeof (IAccount));"),
        );
        assert!(output.contains("var mock = new Mock<IAccount>();"));
    }

    #[test]
    fn test_multi_interface_keeps_first_type() {
        let (output, warnings) = run_single_pass_with_warnings(
            "mock-instantiation",
            &fixture(
                "",
                "var mock = MockRepository.GenerateMock<IAccount, IDisposable>();",
            ),
        );
        assert!(output.contains("var mock = new Mock<IAccount>();"));
        assert!(warnings.iter().any(|w| w.contains("single type")));
    }

    #[test]
    fn test_explicitly_typed_local_becomes_var() {
        let output = run_single_pass(
            "mock-instantiation",
            &fixture("", "IAccount mock = MockRepository.GenerateMock<IAccount>();"),
        );
        assert!(output.contains("var mock = new Mock<IAccount>();"));
    }
}
