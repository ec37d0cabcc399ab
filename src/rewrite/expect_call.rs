//! Pass 1: normalize expectation roots.
//!
//! `Expect.Call (x.Act (a))` and `SetupResult.For (x.Act (a))` become the
//! extension-method form `x.Expect (_ => _.Act (a))` / `x.Stub (...)`,
//! which is the single shape every later pass matches on. The inner
//! invocation is tracked before its receiver is substituted away, so the
//! constraint folding below can still reach the original receiver.
//!
//! `.Constraints (...)` and `.IgnoreArguments ()` links are folded here,
//! while the original method binding is still reachable: each constraint
//! becomes a positional matcher argument typed by the invoked method's
//! parameter, and the link is dropped.

use super::argument::{it_is_any, translate_constraint};
use super::chain::Chain;
use super::factory;
use super::{PassContext, Rewrite, RewritePass};
use crate::syntax::ast::{
    walk_stmt_exprs_mut, CompilationUnit, Expr, ExprKind, LambdaBody, LambdaParams, Stmt, StmtKind,
};

pub struct ExpectCallPass;

impl RewritePass for ExpectCallPass {
    fn name(&self) -> &'static str {
        "expect-call"
    }

    fn rewrite(&self, unit: &mut CompilationUnit, ctx: &PassContext<'_>) {
        if !ctx.model.rhino_imported() {
            return;
        }

        // Convert static roots bottom-up first, so the chain shape is
        // uniform before constraints are folded.
        let mut stmts: Vec<&mut Stmt> = Vec::new();
        collect_stmts(unit, &mut stmts);
        for stmt in stmts {
            walk_stmt_exprs_mut(stmt, &mut |expr| {
                let symbol = match ctx.model.symbol_of(expr) {
                    Some(s) => s,
                    None => return,
                };
                if symbol == ctx.rhino.expect_call {
                    convert_root(expr, "Expect", ctx);
                } else if symbol == ctx.rhino.setup_result_for {
                    convert_root(expr, "Stub", ctx);
                }
            });
        }

        let mut stmts: Vec<&mut Stmt> = Vec::new();
        collect_stmts(unit, &mut stmts);
        for stmt in stmts {
            if let StmtKind::ExprStmt { expr, .. } = &mut stmt.kind {
                fold_argument_links(expr, ctx);
            }
        }
    }
}

fn collect_stmts<'a>(unit: &'a mut CompilationUnit, out: &mut Vec<&'a mut Stmt>) {
    for method in crate::syntax::ast::methods_mut(unit) {
        if let Some(body) = &mut method.body {
            for stmt in &mut body.stmts {
                collect_nested(stmt, out);
            }
        }
    }
}

fn collect_nested<'a>(stmt: &'a mut Stmt, out: &mut Vec<&'a mut Stmt>) {
    // Using bodies and nested blocks hold expectation statements too;
    // opaque statements cannot. The resource expression of a `using`
    // never holds expectations.
    if !matches!(stmt.kind, StmtKind::Block(_) | StmtKind::Using { .. }) {
        out.push(stmt);
        return;
    }
    match &mut stmt.kind {
        StmtKind::Block(block) => {
            for s in &mut block.stmts {
                collect_nested(s, out);
            }
        }
        StmtKind::Using { body, .. } => collect_nested(body, out),
        _ => {}
    }
}

/// `Expect.Call (x.Act (a))` -> `x.Expect (_ => _.Act (a))`, in place.
fn convert_root(expr: &mut Expr, extension_name: &str, ctx: &PassContext<'_>) {
    let line = expr.line();
    let ExprKind::Invoke { args, .. } = &mut expr.kind else {
        return;
    };
    if args.args.len() != 1 {
        ctx.warn(line, "expectation root does not take exactly one call; left unchanged");
        return;
    }
    let mut inner = args.args.remove(0).expr;

    // Remember the untouched call, original receiver included. The
    // `() => x.Act ()` form keeps the call inside a wrapper lambda.
    let call = expectation_call_mut(&mut inner);
    ctx.tracker.track(call);

    let receiver = match substitute_receiver(call) {
        Some(r) => r,
        None => {
            ctx.warn(
                line,
                "cannot identify the mocked receiver of the expectation; left unchanged",
            );
            // Put the argument back; the node stays as it was.
            let restored = std::mem::replace(&mut inner, factory::ident(""));
            args.args.push(crate::syntax::ast::Arg {
                expr: restored,
                comma: None,
            });
            return;
        }
    };

    let mut receiver = receiver;
    factory::inherit_leading(&mut receiver, expr);
    let mut call = into_expectation_call(inner);
    factory::set_leading(&mut call, "");
    let rebuilt = factory::call(
        factory::member_named(receiver, extension_name),
        vec![factory::lambda("_", call)],
    );
    *expr = rebuilt;
}

/// The call expression behind an expectation argument, looking through
/// the `() => x.Act ()` wrapper lambda when present.
fn expectation_call_mut(expr: &mut Expr) -> &mut Expr {
    if !matches!(
        expr.kind,
        ExprKind::Lambda {
            body: LambdaBody::Expr(_),
            ..
        }
    ) {
        return expr;
    }
    match &mut expr.kind {
        ExprKind::Lambda {
            body: LambdaBody::Expr(body),
            ..
        } => body,
        _ => unreachable!("matched above"),
    }
}

/// Consuming twin of [`expectation_call_mut`]: splices the call out of
/// the wrapper lambda.
fn into_expectation_call(expr: Expr) -> Expr {
    match expr {
        Expr {
            kind:
                ExprKind::Lambda {
                    body: LambdaBody::Expr(body),
                    ..
                },
            ..
        } => *body,
        other => other,
    }
}

/// Replace the leftmost identifier of a member chain with `_`, returning
/// the identifier that was there.
fn substitute_receiver(expr: &mut Expr) -> Option<Expr> {
    match &mut expr.kind {
        ExprKind::Member { base, .. } => {
            if matches!(base.kind, ExprKind::Ident(_)) {
                let mut replacement = factory::ident("_");
                replacement.first_token_mut().leading = base.first_token().leading.clone();
                return Some(std::mem::replace(base, Box::new(replacement)).as_ref().clone());
            }
            substitute_receiver(base)
        }
        ExprKind::Invoke { callee, .. } => substitute_receiver(callee),
        _ => None,
    }
}

/// Fold `.Constraints (...)` / `.IgnoreArguments ()` links of an
/// expectation chain into the setup lambda's argument list.
fn fold_argument_links(expr: &mut Expr, ctx: &PassContext<'_>) {
    let line = expr.line();
    let Some(mut chain) = Chain::decompose(ctx.model, expr) else {
        return;
    };
    let root = match chain.links.iter().position(|l| {
        l.symbol == Some(ctx.rhino.ext_expect) || l.symbol == Some(ctx.rhino.ext_stub)
    }) {
        Some(i) => i,
        None => return,
    };
    let constraints = chain
        .links
        .iter()
        .position(|l| l.symbol == Some(ctx.rhino.opt_constraints));
    let ignore = chain
        .links
        .iter()
        .position(|l| l.symbol == Some(ctx.rhino.opt_ignore_arguments));
    if constraints.is_none() && ignore.is_none() {
        return;
    }

    let Some((method, receiver_ty)) = lambda_target(&chain, root, ctx) else {
        ctx.warn(
            line,
            "cannot resolve the expected call behind this constraint; left unchanged",
        );
        return;
    };
    let Some(sig) = ctx.model.method_sig(&receiver_ty, &method) else {
        ctx.warn(
            line,
            format!("no declaration of `{receiver_ty}.{method}` in scope; constraints left unchanged"),
        );
        return;
    };
    let params = sig.params.clone();

    let new_args: Vec<Expr> = if let Some(ci) = constraints {
        let Some(arg_exprs) = chain.links[ci].args.as_ref() else {
            return;
        };
        if arg_exprs.args.len() != params.len() {
            ctx.warn(
                line,
                format!(
                    "{} constraints given for {} parameters of `{method}`; left unchanged",
                    arg_exprs.args.len(),
                    params.len()
                ),
            );
            return;
        }
        let mut translated = Vec::new();
        for (arg, param_ty) in arg_exprs.args.iter().zip(&params) {
            match translate_constraint(&arg.expr, param_ty, ctx.model, ctx.rhino) {
                Rewrite::Done(e) => translated.push(e),
                Rewrite::Skip => {
                    ctx.warn(
                        line,
                        "unrecognized constraint expression; left unchanged",
                    );
                    return;
                }
            }
        }
        translated
    } else {
        params.iter().map(|ty| it_is_any(ty)).collect()
    };

    if !replace_lambda_call_args(&mut chain, root, new_args) {
        return;
    }
    // A chain can carry both links; drop from the back so the earlier
    // index stays valid.
    let mut drop: Vec<usize> = constraints.into_iter().chain(ignore).collect();
    drop.sort_unstable();
    for idx in drop.into_iter().rev() {
        chain.links.remove(idx);
    }

    let rebuilt = chain.rebuild();
    *expr = rebuilt;
}

/// The method name invoked inside the setup lambda and the display type
/// of its receiver. For lambdas synthesized by this pass the original
/// receiver is recovered through the tracker.
fn lambda_target(chain: &Chain, root: usize, ctx: &PassContext<'_>) -> Option<(String, String)> {
    let args = chain.links[root].args.as_ref()?;
    let lambda = &args.args.first()?.expr;
    let ExprKind::Lambda { params, body, .. } = &lambda.kind else {
        return None;
    };
    let LambdaBody::Expr(body) = body else {
        return None;
    };
    let method = body.callee_name().or_else(|| body.member_name())?.to_string();

    let synthesized = matches!(params, LambdaParams::Single(t) if t.text == "_");
    let receiver_ty = if synthesized {
        let original = ctx.tracker.original_of(body)?;
        let recv = original.invocation_receiver().or_else(|| match &original.kind {
            ExprKind::Member { base, .. } => Some(base),
            _ => None,
        })?;
        ctx.model.mocked_type_of(recv)?
    } else {
        ctx.model.mocked_type_of(&chain.receiver)?
    };
    Some((method, receiver_ty))
}

fn replace_lambda_call_args(chain: &mut Chain, root: usize, new_args: Vec<Expr>) -> bool {
    let Some(args) = chain.links[root].args.as_mut() else {
        return false;
    };
    let Some(first) = args.args.first_mut() else {
        return false;
    };
    let ExprKind::Lambda { body, .. } = &mut first.expr.kind else {
        return false;
    };
    let LambdaBody::Expr(body) = body else {
        return false;
    };
    let ExprKind::Invoke { args: call_args, .. } = &mut body.kind else {
        return false;
    };
    let open_leading = call_args.open.leading.clone();
    let mut list = factory::arg_list(new_args);
    // Keep the call's own spacing before the parenthesis.
    list.open.leading = open_leading;
    *call_args = list;
    true
}

#[cfg(test)]
mod tests {
    use crate::rewrite::pipeline::test_support::run_single_pass;

    #[test]
    fn test_expect_call_becomes_extension_form() {
        let output = run_single_pass(
            "expect-call",
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
    Expect.Call (_mock.Balance ()).Return (42);
  }
}
"#,
        );
        assert!(output.contains("_mock.Expect (_ => _.Balance ()).Return (42);"));
        assert!(!output.contains("Expect.Call"));
    }

    #[test]
    fn test_setup_result_for_becomes_stub() {
        let output = run_single_pass(
            "expect-call",
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
    SetupResult.For (_mock.Balance ()).Return (7);
  }
}
"#,
        );
        assert!(output.contains("_mock.Stub (_ => _.Balance ()).Return (7);"));
    }

    #[test]
    fn test_constraints_fold_into_typed_matchers() {
        let output = run_single_pass(
            "expect-call",
            r#"using Rhino.Mocks;
using Rhino.Mocks.Constraints;

public interface IAccount
{
  void Deposit (int amount, string note);
}

public class T
{
  private IAccount _mock;

  public void M ()
  {
    Expect.Call (_mock.Deposit (0, null)).Constraints (Is.GreaterThan (10), Is.Anything ());
  }
}
"#,
        );
        assert!(output.contains(
            "_mock.Expect (_ => _.Deposit (It.Is<int> (param => param > 10), It.IsAny<string>()));"
        ));
        // The using directive stays; pass 10 owns its removal.
        assert!(!output.contains(".Constraints"));
        assert!(output.contains("using Rhino.Mocks.Constraints;"));
    }

    #[test]
    fn test_ignore_arguments_becomes_is_any() {
        let output = run_single_pass(
            "expect-call",
            r#"using Rhino.Mocks;

public interface IAccount
{
  void Deposit (int amount);
}

public class T
{
  private IAccount _mock;

  public void M ()
  {
    _mock.Expect (m => m.Deposit (3)).IgnoreArguments ();
  }
}
"#,
        );
        assert!(output.contains("_mock.Expect (m => m.Deposit (It.IsAny<int>()));"));
        assert!(!output.contains("IgnoreArguments"));
    }

    #[test]
    fn test_lambda_wrapped_expectation_unwraps() {
        let output = run_single_pass(
            "expect-call",
            r#"using Rhino.Mocks;

public interface IAccount
{
  void DoSomething ();
}

public class T
{
  private IAccount _mock;

  public void M ()
  {
    Expect.Call (() => _mock.DoSomething ());
  }
}
"#,
        );
        assert!(output.contains("_mock.Expect (_ => _.DoSomething ());"));
        assert!(!output.contains("()=>") && !output.contains("() =>"));
    }

    #[test]
    fn test_expectations_inside_using_bodies_convert() {
        let output = run_single_pass(
            "expect-call",
            r#"using Rhino.Mocks;

public interface IAccount
{
  int Balance ();
}

public class T
{
  private MockRepository _repo;
  private IAccount _mock;

  public void M ()
  {
    using (_repo.Ordered ())
    {
      Expect.Call (_mock.Balance ()).Return (1);
    }
  }
}
"#,
        );
        assert!(output.contains("_mock.Expect (_ => _.Balance ()).Return (1);"));
        assert!(!output.contains("Expect.Call"));
    }

    #[test]
    fn test_constraints_with_ignore_arguments_drops_both_links() {
        let output = run_single_pass(
            "expect-call",
            r#"using Rhino.Mocks;
using Rhino.Mocks.Constraints;

public interface IAccount
{
  void Deposit (int amount);
}

public class T
{
  private IAccount _mock;

  public void M ()
  {
    Expect.Call (_mock.Deposit (0)).Constraints (Is.GreaterThan (10)).IgnoreArguments ();
  }
}
"#,
        );
        assert!(output.contains("_mock.Expect (_ => _.Deposit (It.Is<int> (param => param > 10)));"));
        assert!(!output.contains(".Constraints"));
        assert!(!output.contains("IgnoreArguments"));
    }

    #[test]
    fn test_unrelated_calls_pass_through() {
        let source = r#"using NUnit.Framework;

public class T
{
  public void M ()
  {
    Assert.That (1, Is.EqualTo (1));
  }
}
"#;
        assert_eq!(run_single_pass("expect-call", source), source);
    }
}

