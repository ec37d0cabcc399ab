//! Fluent-chain decomposition.
//!
//! An expectation statement is a receiver followed by member links:
//! `mock.Expect (m => m.Act()).Return (1).Repeat.Any ()`. Passes that
//! reorder, rename, or drop links work on this flattened form and
//! rebuild the expression afterwards. Node identity and annotations of
//! each link node survive the round trip, so tracked nodes stay
//! resolvable after a chain rewrite.

use crate::sema::metadata::SymbolId;
use crate::sema::SemanticModel;
use crate::syntax::ast::{Annotation, ArgList, Expr, ExprKind, NodeId};
use crate::syntax::token::Token;

pub struct Link {
    pub dot: Token,
    /// `Ident` or `Generic` name expression.
    pub name: Expr,
    /// `None` for property accesses.
    pub args: Option<ArgList>,
    pub symbol: Option<SymbolId>,
    id: NodeId,
    notes: Vec<Annotation>,
}

impl Link {
    /// A synthesized link appended by a pass: `.name (args)`.
    pub fn synthesized(name: &str, args: Option<ArgList>) -> Link {
        Link {
            dot: Token::punct("."),
            name: super::factory::ident(name),
            args,
            symbol: None,
            id: NodeId::fresh(),
            notes: Vec::new(),
        }
    }

    pub fn name_text(&self) -> &str {
        self.name.member_name().unwrap_or("")
    }

    /// Rename the link in place, keeping its trivia.
    pub fn rename(&mut self, name: &str) {
        self.name.first_token_mut().text = name.to_string();
    }
}

pub struct Chain {
    pub receiver: Expr,
    /// Links in application order, receiver-side first.
    pub links: Vec<Link>,
}

impl Chain {
    /// Flatten a member/invocation chain. `None` when the expression is
    /// not chain-shaped at the top.
    pub fn decompose(model: &SemanticModel<'_>, expr: &Expr) -> Option<Chain> {
        let mut links = Vec::new();
        let receiver = collect(model, expr, &mut links)?;
        links.reverse();
        Some(Chain { receiver, links })
    }

    /// Index of the first link bound to any of the given symbols.
    pub fn find_link(&self, symbols: &std::collections::HashSet<SymbolId>) -> Option<usize> {
        self.links
            .iter()
            .position(|l| l.symbol.map(|s| symbols.contains(&s)).unwrap_or(false))
    }

    pub fn rebuild(self) -> Expr {
        let mut expr = self.receiver;
        for link in self.links {
            let callee = Expr::new(ExprKind::Member {
                base: Box::new(expr),
                dot: link.dot,
                name: Box::new(link.name),
            });
            let kind = match link.args {
                Some(args) => ExprKind::Invoke {
                    callee: Box::new(callee),
                    args,
                },
                None => {
                    // Property link: the member node itself carries the
                    // original identity.
                    if let ExprKind::Member { base, dot, name } = callee.kind {
                        ExprKind::Member { base, dot, name }
                    } else {
                        unreachable!("callee built as member above")
                    }
                }
            };
            expr = Expr {
                id: link.id,
                notes: link.notes,
                kind,
            };
        }
        expr
    }
}

fn collect(model: &SemanticModel<'_>, expr: &Expr, links: &mut Vec<Link>) -> Option<Expr> {
    match &expr.kind {
        ExprKind::Invoke { callee, args } => match &callee.kind {
            ExprKind::Member { base, dot, name } => {
                links.push(Link {
                    dot: dot.clone(),
                    name: (**name).clone(),
                    args: Some(args.clone()),
                    symbol: model.symbol_of(expr),
                    id: expr.id,
                    notes: expr.notes.clone(),
                });
                descend(model, base, links)
            }
            _ => None,
        },
        ExprKind::Member { base, dot, name } => {
            links.push(Link {
                dot: dot.clone(),
                name: (**name).clone(),
                args: None,
                symbol: model.symbol_of(expr),
                id: expr.id,
                notes: expr.notes.clone(),
            });
            descend(model, base, links)
        }
        _ => None,
    }
}

fn descend(model: &SemanticModel<'_>, base: &Expr, links: &mut Vec<Link>) -> Option<Expr> {
    match &base.kind {
        ExprKind::Invoke { .. } | ExprKind::Member { .. } => {
            match collect(model, base, links) {
                Some(receiver) => Some(receiver),
                None => {
                    // The base is itself not chain-shaped (e.g. a call on
                    // a parenthesized expression); treat it as receiver.
                    Some(base.clone())
                }
            }
        }
        _ => Some(base.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sema::metadata::Compilation;
    use crate::syntax::ast::{walk_stmts, StmtKind};
    use crate::syntax::parse;
    use crate::syntax::print::expr_text;

    fn first_chain(source: &str) -> (Expr, Compilation) {
        let unit = parse(source);
        let comp = Compilation::with_default_references();
        let mut found = None;
        walk_stmts(&unit, &mut |s| {
            if let StmtKind::ExprStmt { expr, .. } = &s.kind {
                found = Some(expr.clone());
            }
        });
        (found.expect("expression statement"), comp)
    }

    #[test]
    fn test_decompose_rebuild_is_identity() {
        let (expr, comp) = first_chain(
            "using Rhino.Mocks;\npublic class T { public void M () { mock.Expect (m => m.Act ()).Return (1).Repeat.Any (); } }",
        );
        let unit = parse("");
        let model = crate::sema::SemanticModel::bind(&unit, &comp);
        let original = expr_text(&expr);
        let chain = Chain::decompose(&model, &expr).unwrap();
        assert_eq!(chain.links.len(), 4);
        assert_eq!(chain.links[0].name_text(), "Expect");
        assert_eq!(chain.links[2].name_text(), "Repeat");
        assert!(chain.links[2].args.is_none());
        assert_eq!(expr_text(&chain.rebuild()), original);
    }

    #[test]
    fn test_non_chain_is_none() {
        let (expr, comp) = first_chain("public class T { public void M () { x = 1; } }");
        let unit = parse("");
        let model = crate::sema::SemanticModel::bind(&unit, &comp);
        assert!(Chain::decompose(&model, &expr).is_none());
    }
}
