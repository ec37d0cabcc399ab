//! Pass 6: ordered expectation blocks.
//!
//! `using (repository.Ordered ()) { ... }` disappears: a
//! `var sequence = new MockSequence();` declaration takes its place and
//! every setup chain inside gains an `.InSequence (sequence)` link right
//! before `.Setup`. The block's statements move up one level, reindented
//! to the `using`'s own indentation. Multiple ordered blocks in one
//! method get numbered sequence variables.

use super::chain::{Chain, Link};
use super::{factory, format, PassContext, RewritePass};
use crate::syntax::ast::{
    methods_mut, Block, CompilationUnit, Declarator, Expr, ExprKind, Stmt, StmtKind, TypeKind,
    TypeSyntax,
};
use crate::syntax::token::Token;

pub struct OrderedMockPass;

impl RewritePass for OrderedMockPass {
    fn name(&self) -> &'static str {
        "ordered-mock"
    }

    fn rewrite(&self, unit: &mut CompilationUnit, ctx: &PassContext<'_>) {
        if !ctx.model.rhino_imported() {
            return;
        }
        for method in methods_mut(unit) {
            if let Some(body) = &mut method.body {
                let total = count_ordered(body, ctx);
                if total == 0 {
                    continue;
                }
                let mut counter = 0;
                expand_block(body, ctx, &mut counter, total);
            }
        }
    }
}

fn count_ordered(block: &Block, ctx: &PassContext<'_>) -> usize {
    let mut n = 0;
    for stmt in &block.stmts {
        n += count_stmt(stmt, ctx);
    }
    n
}

fn count_stmt(stmt: &Stmt, ctx: &PassContext<'_>) -> usize {
    match &stmt.kind {
        StmtKind::Using { resource, body, .. } => {
            let own = usize::from(is_ordered(resource, ctx));
            own + count_stmt(body, ctx)
        }
        StmtKind::Block(block) => count_ordered(block, ctx),
        _ => 0,
    }
}

fn is_ordered(resource: &Expr, ctx: &PassContext<'_>) -> bool {
    ctx.model.symbol_of(resource) == Some(ctx.rhino.repo_ordered)
}

fn expand_block(block: &mut Block, ctx: &PassContext<'_>, counter: &mut usize, total: usize) {
    let mut i = 0;
    while i < block.stmts.len() {
        match &block.stmts[i].kind {
            StmtKind::Using { resource, .. } if is_ordered(resource, ctx) => {
                *counter += 1;
                let name = if total > 1 {
                    format!("sequence{counter}")
                } else {
                    "sequence".to_string()
                };
                let stmt = block.stmts.remove(i);
                let StmtKind::Using { kw, body, .. } = stmt.kind else {
                    unreachable!("matched above");
                };
                let leading = kw.leading;
                let indent = format::indentation(&leading).to_string();

                let mut replacements = vec![sequence_decl(&name, &leading)];
                let mut inner = match body.kind {
                    StmtKind::Block(inner) => inner.stmts,
                    other => vec![Stmt {
                        id: body.id,
                        notes: body.notes,
                        kind: other,
                    }],
                };
                for s in &mut inner {
                    let lead = s.first_token().leading.clone();
                    s.first_token_mut().leading = format::reindent(&lead, &indent);
                    insert_in_sequence(s, &name, ctx);
                }
                replacements.extend(inner);
                block.stmts.splice(i..i, replacements);
                // Step past the declaration only: the spliced statements
                // are re-scanned, an ordered block can nest another one.
                i += 1;
            }
            StmtKind::Block(_) => {
                if let StmtKind::Block(b) = &mut block.stmts[i].kind {
                    expand_block(b, ctx, counter, total);
                }
                i += 1;
            }
            StmtKind::Using { .. } => {
                if let StmtKind::Using { body, .. } = &mut block.stmts[i].kind {
                    if let StmtKind::Block(b) = &mut body.kind {
                        expand_block(b, ctx, counter, total);
                    }
                }
                i += 1;
            }
            _ => i += 1,
        }
    }
}

/// `var sequence = new MockSequence();`
fn sequence_decl(name: &str, leading: &str) -> Stmt {
    Stmt::new(StmtKind::LocalDecl {
        ty: TypeSyntax {
            kind: TypeKind::Simple(Token::ident("var").with_leading(leading)),
        },
        decls: vec![Declarator {
            name: Token::ident(name).with_leading(" "),
            init: Some((
                Token::punct("=").with_leading(" "),
                Expr::new(ExprKind::New {
                    new_kw: Token::ident("new").with_leading(" "),
                    ty: TypeSyntax {
                        kind: TypeKind::Simple(Token::ident("MockSequence").with_leading(" ")),
                    },
                    args: Some(factory::arg_list(vec![])),
                    init: None,
                }),
            )),
            comma: None,
        }],
        semi: Token::punct(";"),
    })
}

fn insert_in_sequence(stmt: &mut Stmt, name: &str, ctx: &PassContext<'_>) {
    let StmtKind::ExprStmt { expr, .. } = &mut stmt.kind else {
        return;
    };
    let Some(mut chain) = Chain::decompose(ctx.model, expr) else {
        return;
    };
    let Some(setup) = chain
        .links
        .iter()
        .position(|l| l.symbol == Some(ctx.moq.mock_setup))
    else {
        return;
    };
    chain.links.insert(
        setup,
        Link::synthesized(
            "InSequence",
            Some(factory::arg_list(vec![factory::ident(name)])),
        ),
    );
    *expr = chain.rebuild();
}

#[cfg(test)]
mod tests {
    use crate::rewrite::pipeline::test_support::run_single_pass;

    fn fixture(body: &str) -> String {
        format!(
            r#"using Moq;
using Rhino.Mocks;

public interface IAccount
{{
  int Balance ();
  void DoSomething ();
}}

public class T
{{
  private MockRepository _repo;
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
    fn test_ordered_block_becomes_sequence() {
        let output = run_single_pass(
            "ordered-mock",
            &fixture(
                "    using (_repo.Ordered ())\n    {\n      _mock.Setup (m => m.Balance ()).Returns (1);\n    }",
            ),
        );
        assert!(output.contains("    var sequence = new MockSequence();"));
        assert!(output
            .contains("    _mock.InSequence (sequence).Setup (m => m.Balance ()).Returns (1);"));
        assert!(!output.contains("Ordered"));
    }

    #[test]
    fn test_multiple_blocks_get_numbered_sequences() {
        let output = run_single_pass(
            "ordered-mock",
            &fixture(
                "    using (_repo.Ordered ())\n    {\n      _mock.Setup (m => m.Balance ()).Returns (1);\n    }\n    using (_repo.Ordered ())\n    {\n      _mock.Setup (m => m.DoSomething());\n    }",
            ),
        );
        assert!(output.contains("var sequence1 = new MockSequence();"));
        assert!(output.contains("var sequence2 = new MockSequence();"));
        assert!(output.contains("_mock.InSequence (sequence1).Setup"));
        assert!(output.contains("_mock.InSequence (sequence2).Setup"));
    }

    #[test]
    fn test_nested_ordered_blocks_both_expand() {
        let output = run_single_pass(
            "ordered-mock",
            &fixture(
                "    using (_repo.Ordered ())\n    {\n      _mock.Setup (m => m.Balance ()).Returns (1);\n      using (_repo.Ordered ())\n      {\n        _mock.Setup (m => m.DoSomething());\n      }\n    }",
            ),
        );
        assert!(output.contains("var sequence1 = new MockSequence();"));
        assert!(output.contains("var sequence2 = new MockSequence();"));
        assert!(output.contains("_mock.InSequence (sequence1).Setup (m => m.Balance ())"));
        assert!(output.contains("_mock.InSequence (sequence2).Setup (m => m.DoSomething())"));
        assert!(!output.contains("Ordered"));
    }

    #[test]
    fn test_non_setup_statements_move_unchanged() {
        let output = run_single_pass(
            "ordered-mock",
            &fixture(
                "    using (_repo.Ordered ())\n    {\n      Prepare ();\n    }",
            ),
        );
        assert!(output.contains("    var sequence = new MockSequence();"));
        assert!(output.contains("    Prepare ();"));
    }
}
