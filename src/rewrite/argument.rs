//! Pass 7: inline argument matchers.
//!
//! `Arg<T>.Is.Anything`, `Arg<T>.Matches (...)`, `Arg<T>.List.IsIn (...)`
//! and `Arg.Text.Like (...)` become their `It.*` counterparts. The same
//! translation table serves pass 1, which folds `.Constraints (...)`
//! factories (`Is.GreaterThan (10)`) into argument positions.
//!
//! Equality constraints disappear entirely: Moq compares plain values, so
//! `Arg<int>.Is.Equal (5)` is just `5`.

use super::factory;
use super::{PassContext, Rewrite, RewritePass};
use crate::catalog::RhinoSymbols;
use crate::sema::SemanticModel;
use crate::syntax::ast::{
    methods_mut, visit_expr, walk_stmt_exprs_mut, CompilationUnit, Expr, ExprKind,
};
use crate::syntax::print::clean_type_text;
use crate::syntax::token::Token;

pub struct ArgumentMatcherPass;

impl RewritePass for ArgumentMatcherPass {
    fn name(&self) -> &'static str {
        "argument-matcher"
    }

    fn rewrite(&self, unit: &mut CompilationUnit, ctx: &PassContext<'_>) {
        if !ctx.model.rhino_imported() {
            return;
        }
        for method in methods_mut(unit) {
            if let Some(body) = &mut method.body {
                for stmt in &mut body.stmts {
                    walk_stmt_exprs_mut(stmt, &mut |expr| {
                        rewrite_matcher(expr, ctx);
                    });
                }
            }
        }
    }
}

fn rewrite_matcher(expr: &mut Expr, ctx: &PassContext<'_>) {
    let Some(symbol) = ctx.model.symbol_of(expr) else {
        return;
    };
    if !ctx.rhino.inline_matchers.contains(&symbol) {
        return;
    }
    match translate_inline(expr, ctx.model, ctx.rhino) {
        Rewrite::Done(mut replacement) => {
            factory::inherit_leading(&mut replacement, expr);
            *expr = replacement;
        }
        Rewrite::Skip => {
            ctx.warn(
                expr.line(),
                "argument matcher has no Moq equivalent; left unchanged",
            );
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MatcherFamily {
    Is,
    List,
    Text,
    /// `Arg<T>.Matches (...)` and `Is.Matching (...)`.
    Predicate,
}

/// Translate one inline matcher expression. The matched type comes from
/// the `Arg<T>` generic name inside the expression itself.
pub(crate) fn translate_inline(
    expr: &Expr,
    model: &SemanticModel<'_>,
    rhino: &RhinoSymbols,
) -> Rewrite<Expr> {
    let Some(symbol) = model.symbol_of(expr) else {
        return Rewrite::Skip;
    };
    if !rhino.inline_matchers.contains(&symbol) {
        return Rewrite::Skip;
    }
    let Some((family, member)) = classify(model, symbol) else {
        return Rewrite::Skip;
    };
    let ty = match family {
        MatcherFamily::Text => Some("string".to_string()),
        _ => arg_type_display(expr),
    };
    let Some(ty) = ty else {
        return Rewrite::Skip;
    };
    apply(family, &member, &ty, first_argument(expr))
}

/// Translate one `.Constraints (...)` factory expression against the
/// parameter type it constrains.
pub(crate) fn translate_constraint(
    expr: &Expr,
    param_ty: &str,
    model: &SemanticModel<'_>,
    rhino: &RhinoSymbols,
) -> Rewrite<Expr> {
    let Some(symbol) = model.symbol_of(expr) else {
        return Rewrite::Skip;
    };
    if !rhino.constraint_factories.contains(&symbol) {
        return Rewrite::Skip;
    }
    let Some((family, member)) = classify(model, symbol) else {
        return Rewrite::Skip;
    };
    apply(family, &member, param_ty, first_argument(expr))
}

fn classify(model: &SemanticModel<'_>, symbol: crate::sema::SymbolId) -> Option<(MatcherFamily, String)> {
    let data = model.symbols().symbol(symbol);
    let container = model.symbols().symbol(data.container?);
    let container_name = container.name.split('`').next().unwrap_or(&container.name);
    let family = match container_name {
        "IsArg" | "Is" => MatcherFamily::Is,
        "ListArg" | "List" => MatcherFamily::List,
        "TextArg" | "Text" => MatcherFamily::Text,
        "Arg" => MatcherFamily::Predicate,
        _ => return None,
    };
    if family == MatcherFamily::Is && (data.name == "Matching") {
        return Some((MatcherFamily::Predicate, data.name.clone()));
    }
    Some((family, data.name.clone()))
}

fn apply(family: MatcherFamily, member: &str, ty: &str, value: Option<Expr>) -> Rewrite<Expr> {
    use MatcherFamily::*;
    match (family, member) {
        (Is, "Anything") => Rewrite::Done(it_is_any(ty)),
        (Is, "Null") => Rewrite::Done(factory::literal("null")),
        (Is, "NotNull") => Rewrite::Done(it_is_not_null(ty)),
        (Is, "Equal") | (Is, "Same") | (Text, "Like") => match value {
            Some(mut v) => {
                factory::set_leading(&mut v, "");
                Rewrite::Done(v)
            }
            None => Rewrite::Skip,
        },
        (Is, "NotEqual") | (Is, "NotSame") => compare(ty, "!=", value),
        (Is, "GreaterThan") => compare(ty, ">", value),
        (Is, "GreaterThanOrEqual") => compare(ty, ">=", value),
        (Is, "LessThan") => compare(ty, "<", value),
        (Is, "LessThanOrEqual") => compare(ty, "<=", value),
        (Predicate, _) => match value {
            Some(mut v) => {
                factory::set_leading(&mut v, "");
                Rewrite::Done(it_is(ty, v))
            }
            None => Rewrite::Skip,
        },
        (List, "IsIn") => match value {
            Some(mut v) => {
                factory::set_leading(&mut v, "");
                Rewrite::Done(it_is(
                    ty,
                    factory::lambda(
                        "param",
                        factory::chain_call(factory::ident("param"), "Contains", vec![v]),
                    ),
                ))
            }
            None => Rewrite::Skip,
        },
        (List, "ContainsAll") => match value {
            Some(mut coll) => {
                factory::set_leading(&mut coll, "");
                let all_items = factory::lambda(
                    "item",
                    factory::chain_call(
                        factory::ident("param"),
                        "Contains",
                        vec![factory::ident("item")],
                    ),
                );
                Rewrite::Done(it_is(
                    ty,
                    factory::lambda(
                        "param",
                        factory::chain_call(coll, "All", vec![all_items]),
                    ),
                ))
            }
            None => Rewrite::Skip,
        },
        (List, "Equal") => match value {
            Some(mut coll) => {
                factory::set_leading(&mut coll, "");
                Rewrite::Done(it_is(
                    ty,
                    factory::lambda(
                        "param",
                        factory::chain_call(factory::ident("param"), "SequenceEqual", vec![coll]),
                    ),
                ))
            }
            None => Rewrite::Skip,
        },
        _ => Rewrite::Skip,
    }
}

/// `It.IsAny<T>()`.
pub(crate) fn it_is_any(ty: &str) -> Expr {
    factory::call(
        factory::member(factory::ident("It"), factory::generic("IsAny", ty)),
        vec![],
    )
}

fn it_is_not_null(ty: &str) -> Expr {
    factory::call(
        factory::member(factory::ident("It"), factory::generic("IsNotNull", ty)),
        vec![],
    )
}

/// `It.Is<T> (predicate)`.
fn it_is(ty: &str, predicate: Expr) -> Expr {
    factory::call(
        factory::member(factory::ident("It"), factory::generic("Is", ty)),
        vec![predicate],
    )
}

/// `It.Is<T> (param => param OP value)`.
fn compare(ty: &str, op: &str, value: Option<Expr>) -> Rewrite<Expr> {
    let Some(mut value) = value else {
        return Rewrite::Skip;
    };
    factory::set_leading(&mut value, " ");
    let test = Expr::new(ExprKind::Binary {
        left: Box::new(factory::ident("param")),
        op: Token::punct(op).with_leading(" "),
        right: Box::new(value),
    });
    Rewrite::Done(it_is(ty, factory::lambda("param", test)))
}

/// The `T` of the innermost `Arg<T>` generic name in the expression.
fn arg_type_display(expr: &Expr) -> Option<String> {
    let mut found = None;
    visit_expr(expr, &mut |e| {
        if found.is_some() {
            return;
        }
        if let ExprKind::Generic { name, args, .. } = &e.kind {
            if name.text == "Arg" {
                found = args.first().map(|(ty, _)| clean_type_text(ty));
            }
        }
    });
    found
}

fn first_argument(expr: &Expr) -> Option<Expr> {
    match &expr.kind {
        ExprKind::Invoke { args, .. } => args.args.first().map(|a| a.expr.clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use crate::rewrite::pipeline::test_support::run_single_pass;

    fn fixture(call: &str) -> String {
        format!(
            r#"using Moq;
using Rhino.Mocks;

public interface IAccount
{{
  void Deposit (int amount);
  void Describe (string note);
}}

public class T
{{
  private Mock<IAccount> _mock;

  public void M ()
  {{
    {call}
  }}
}}
"#
        )
    }

    #[test]
    fn test_anything_becomes_is_any() {
        let output = run_single_pass(
            "argument-matcher",
            &fixture("_mock.Setup (m => m.Deposit (Arg<int>.Is.Anything));"),
        );
        assert!(output.contains("m.Deposit (It.IsAny<int>())"));
    }

    #[test]
    fn test_equal_becomes_bare_value() {
        let output = run_single_pass(
            "argument-matcher",
            &fixture("_mock.Setup (m => m.Deposit (Arg<int>.Is.Equal (5)));"),
        );
        assert!(output.contains("m.Deposit (5)"));
    }

    #[test]
    fn test_null_becomes_null_literal() {
        let output = run_single_pass(
            "argument-matcher",
            &fixture("_mock.Setup (m => m.Describe (Arg<string>.Is.Null));"),
        );
        assert!(output.contains("m.Describe (null)"));
    }

    #[test]
    fn test_comparison_becomes_predicate() {
        let output = run_single_pass(
            "argument-matcher",
            &fixture("_mock.Setup (m => m.Deposit (Arg<int>.Is.GreaterThan (3)));"),
        );
        assert!(output.contains("m.Deposit (It.Is<int> (param => param > 3))"));
    }

    #[test]
    fn test_matches_keeps_the_predicate() {
        let output = run_single_pass(
            "argument-matcher",
            &fixture("_mock.Setup (m => m.Deposit (Arg<int>.Matches (x => x > 3)));"),
        );
        assert!(output.contains("m.Deposit (It.Is<int> (x => x > 3))"));
    }

    #[test]
    fn test_text_like_becomes_bare_value() {
        let output = run_single_pass(
            "argument-matcher",
            &fixture("_mock.Setup (m => m.Describe (Arg.Text.Like (\"note\")));"),
        );
        assert!(output.contains("m.Describe (\"note\")"));
    }
}
