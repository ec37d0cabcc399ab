//! Construction of replacement nodes with canonical spacing.
//!
//! All synthesized code follows one spacing convention: a space before a
//! non-empty argument list (`mock.Setup (m => ...)`), none before an
//! empty one (`.Verifiable()`), a space on both sides of `=>` and `=`.
//! Replacement roots take over the leading trivia of the node they
//! replace, which is what keeps surrounding comments and line structure
//! intact without a separate formatting step.

use crate::syntax::ast::{
    Arg, ArgList, Expr, ExprKind, Initializer, LambdaBody, LambdaParams, TypeKind, TypeSyntax,
};
use crate::syntax::token::{lex, Token, TokenKind};

pub fn ident(text: &str) -> Expr {
    Expr::new(ExprKind::Ident(Token::ident(text)))
}

pub fn ident_with(text: &str, leading: &str) -> Expr {
    Expr::new(ExprKind::Ident(Token::ident(text).with_leading(leading)))
}

pub fn literal(text: &str) -> Expr {
    let kind = if text.starts_with('"') {
        TokenKind::StringLiteral
    } else if text.chars().next().map(|c| c.is_ascii_digit()) == Some(true) {
        TokenKind::IntLiteral
    } else {
        TokenKind::Ident
    };
    Expr::new(ExprKind::Literal(Token {
        kind,
        text: text.to_string(),
        leading: String::new(),
        line: 0,
    }))
}

/// `base.name`, dot attached directly to the base.
pub fn member(base: Expr, name: Expr) -> Expr {
    Expr::new(ExprKind::Member {
        base: Box::new(base),
        dot: Token::punct("."),
        name: Box::new(name),
    })
}

pub fn member_named(base: Expr, name: &str) -> Expr {
    member(base, ident(name))
}

/// `name<T>` with the type argument taken from a display string.
pub fn generic(name: &str, type_display: &str) -> Expr {
    Expr::new(ExprKind::Generic {
        name: Token::ident(name),
        lt: Token::punct("<"),
        args: vec![(type_from_display(type_display), None)],
        gt: Token::punct(">"),
    })
}

/// Turn a clean display string (`IAccount`, `Func<int, bool>`) back into
/// type syntax. The tokens carry no trivia.
pub fn type_from_display(display: &str) -> TypeSyntax {
    let mut tokens = lex(display);
    tokens.pop(); // end-of-file
    if tokens.len() == 1 {
        return TypeSyntax {
            kind: TypeKind::Simple(tokens.into_iter().next().expect("one token")),
        };
    }
    TypeSyntax {
        kind: TypeKind::Opaque(tokens),
    }
}

/// Argument list: ` (a, b)` when non-empty, `()` when empty.
pub fn arg_list(mut exprs: Vec<Expr>) -> ArgList {
    let open = if exprs.is_empty() {
        Token::punct("(")
    } else {
        Token::punct("(").with_leading(" ")
    };
    let last = exprs.len().saturating_sub(1);
    let args = exprs
        .drain(..)
        .enumerate()
        .map(|(i, mut expr)| {
            if i > 0 {
                ensure_leading(&mut expr, " ");
            }
            Arg {
                expr,
                comma: (i < last).then(|| Token::punct(",")),
            }
        })
        .collect();
    ArgList {
        open,
        args,
        close: Token::punct(")"),
    }
}

pub fn invoke(callee: Expr, args: ArgList) -> Expr {
    Expr::new(ExprKind::Invoke {
        callee: Box::new(callee),
        args,
    })
}

pub fn call(callee: Expr, args: Vec<Expr>) -> Expr {
    invoke(callee, arg_list(args))
}

/// `base.name (args)` with canonical spacing.
pub fn chain_call(base: Expr, name: &str, args: Vec<Expr>) -> Expr {
    call(member_named(base, name), args)
}

/// `param => body` with canonical spacing.
pub fn lambda(param: &str, mut body: Expr) -> Expr {
    ensure_leading(&mut body, " ");
    Expr::new(ExprKind::Lambda {
        params: LambdaParams::Single(Token::ident(param)),
        arrow: Token::punct("=>").with_leading(" "),
        body: LambdaBody::Expr(Box::new(body)),
    })
}

/// ` { CallBase = true }` style object initializer with one assignment.
pub fn initializer_assign(name: &str, value: &str) -> Initializer {
    let assign = Expr::new(ExprKind::Assign {
        left: Box::new(ident_with(name, " ")),
        op: Token::punct("=").with_leading(" "),
        right: Box::new(Expr::new(ExprKind::Literal(
            Token::ident(value).with_leading(" "),
        ))),
    });
    Initializer {
        open: Token::punct("{").with_leading(" "),
        elems: vec![(assign, None)],
        close: Token::punct("}").with_leading(" "),
    }
}

pub fn set_leading(expr: &mut Expr, leading: &str) {
    expr.first_token_mut().leading = leading.to_string();
}

/// Set the leading trivia only when the expression has none, so callers
/// can move nodes into spaced positions without clobbering real trivia.
pub fn ensure_leading(expr: &mut Expr, leading: &str) {
    let first = expr.first_token_mut();
    if first.leading.is_empty() {
        first.leading = leading.to_string();
    }
}

/// Give the new node the leading trivia of the node it replaces.
pub fn inherit_leading(new: &mut Expr, old: &Expr) {
    new.first_token_mut().leading = old.first_token().leading.clone();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::print::expr_text;

    #[test]
    fn test_empty_call_has_no_space() {
        let e = chain_call(ident("mock"), "Verify", vec![]);
        assert_eq!(expr_text(&e), "mock.Verify()");
    }

    #[test]
    fn test_call_with_args_is_spaced() {
        let e = chain_call(ident("mock"), "Setup", vec![lambda("m", {
            chain_call(ident("m"), "DoSomething", vec![])
        })]);
        assert_eq!(expr_text(&e), "mock.Setup (m => m.DoSomething())");
    }

    #[test]
    fn test_generic_call() {
        let e = call(member(ident("It"), generic("IsAny", "int")), vec![]);
        assert_eq!(expr_text(&e), "It.IsAny<int>()");
    }

    #[test]
    fn test_initializer() {
        let init = initializer_assign("CallBase", "true");
        let e = Expr::new(ExprKind::Init(init));
        assert_eq!(expr_text(&e), " { CallBase = true }");
    }
}
