//! Node correlation across rewrites.
//!
//! A rewrite pass that needs to look back at a node as it was before a
//! structural transform tracks it first: tracking stamps the node with an
//! annotation carrying the tracker's session id and stores a clone of the
//! untouched node. Annotations travel with the node through clones and
//! re-parenting, so after the transform the pass can walk from the
//! current node back to the stored original, or from a tracked handle
//! forward to its descendant in the current tree.
//!
//! A tracker is owned by a single file's rewrite and dropped with it, so
//! sessions never leak between files and there is nothing to clear.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use super::ast::{
    walk_stmt_exprs, walk_stmts, Annotation, CompilationUnit, CorrelationId, Expr, NodeId,
};

static NEXT_SESSION: AtomicU64 = AtomicU64::new(1);

/// Per-file correlation session.
#[derive(Debug)]
pub struct NodeTracker {
    session: CorrelationId,
    originals: Mutex<HashMap<NodeId, Expr>>,
}

impl NodeTracker {
    pub fn new() -> NodeTracker {
        NodeTracker {
            session: CorrelationId(NEXT_SESSION.fetch_add(1, Ordering::Relaxed)),
            originals: Mutex::new(HashMap::new()),
        }
    }

    pub fn session(&self) -> CorrelationId {
        self.session
    }

    /// Stamp the node for later lookup, store its pre-transform clone,
    /// and return the handle to find it by. Tracking the same node twice
    /// in one session is a no-op.
    pub fn track(&self, expr: &mut Expr) -> NodeId {
        let handle = expr.id;
        let already = expr
            .notes
            .iter()
            .any(|a| a.correlation == self.session && a.original == handle);
        if !already {
            self.originals
                .lock()
                .expect("tracker poisoned")
                .insert(handle, expr.clone());
            expr.notes.push(Annotation {
                correlation: self.session,
                original: handle,
            });
        }
        handle
    }

    /// The stored pre-transform node this (possibly rewritten) node was
    /// tracked as in this session, if any.
    pub fn original_of(&self, expr: &Expr) -> Option<Expr> {
        let handle = self.handle_of(expr)?;
        self.original_by_handle(handle)
    }

    pub fn original_by_handle(&self, handle: NodeId) -> Option<Expr> {
        self.originals
            .lock()
            .expect("tracker poisoned")
            .get(&handle)
            .cloned()
    }

    /// The handle this node was tracked under in this session, if any.
    pub fn handle_of(&self, expr: &Expr) -> Option<NodeId> {
        expr.notes
            .iter()
            .find(|a| a.correlation == self.session)
            .map(|a| a.original)
    }

    /// Find the current node for a tracked handle inside an expression.
    /// Returns `None` when the node was dropped by an intervening rewrite;
    /// callers treat that as "skip this transform".
    pub fn current_in<'a>(&self, root: &'a Expr, handle: NodeId) -> Option<&'a Expr> {
        let mut found = None;
        super::ast::visit_expr(root, &mut |e| {
            if found.is_none() && self.matches(e, handle) {
                found = Some(e);
            }
        });
        found
    }

    /// Find the current node for a tracked handle anywhere in the unit.
    pub fn current_in_unit<'a>(
        &self,
        unit: &'a CompilationUnit,
        handle: NodeId,
    ) -> Option<&'a Expr> {
        let mut found = None;
        walk_stmts(unit, &mut |stmt| {
            if found.is_some() {
                return;
            }
            walk_stmt_exprs(stmt, &mut |e| {
                if found.is_none() && self.matches(e, handle) {
                    found = Some(e);
                }
            });
        });
        found
    }

    fn matches(&self, expr: &Expr, handle: NodeId) -> bool {
        expr.notes
            .iter()
            .any(|a| a.correlation == self.session && a.original == handle)
    }
}

impl Default for NodeTracker {
    fn default() -> Self {
        NodeTracker::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::ast::{ArgList, ExprKind};
    use crate::syntax::print::expr_text;
    use crate::syntax::token::Token;

    fn ident(name: &str) -> Expr {
        Expr::new(ExprKind::Ident(Token::ident(name)))
    }

    fn invoke(callee: Expr) -> Expr {
        Expr::new(ExprKind::Invoke {
            callee: Box::new(callee),
            args: ArgList {
                open: Token::punct("("),
                args: Vec::new(),
                close: Token::punct(")"),
            },
        })
    }

    #[test]
    fn test_round_trip_current_to_original_to_current() {
        let mut inner = ident("balance");
        let tracker = NodeTracker::new();
        let handle = tracker.track(&mut inner);

        // Wrap the tracked node in a new invocation, as a rewrite would.
        let rebuilt = invoke(inner);

        let current = tracker.current_in(&rebuilt, handle).unwrap();
        let original = tracker.original_of(current).unwrap();
        assert_eq!(expr_text(&original), "balance");
        // The stored original predates tracking's annotation round trip;
        // resolving it forward lands on the same current node.
        let again = tracker.current_in(&rebuilt, handle).unwrap();
        assert_eq!(again.id, current.id);
    }

    #[test]
    fn test_untracked_node_is_not_found() {
        let tracker = NodeTracker::new();
        let expr = ident("x");
        assert!(tracker.current_in(&expr, NodeId(999_999)).is_none());
        assert!(tracker.original_of(&expr).is_none());
    }

    #[test]
    fn test_sessions_are_isolated() {
        let mut expr = ident("shared");
        let first = NodeTracker::new();
        let second = NodeTracker::new();
        let handle = first.track(&mut expr);

        assert!(first.current_in(&expr, handle).is_some());
        assert!(second.current_in(&expr, handle).is_none());
        assert!(second.original_of(&expr).is_none());
    }

    #[test]
    fn test_tracking_twice_adds_one_annotation() {
        let mut expr = ident("once");
        let tracker = NodeTracker::new();
        tracker.track(&mut expr);
        tracker.track(&mut expr);
        assert_eq!(expr.notes.len(), 1);
    }
}
