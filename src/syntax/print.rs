//! Full-fidelity printing. The printed text of an unmodified tree is
//! byte-identical to the source it was parsed from.

use super::ast::*;
use super::token::Token;

pub fn unit_text(unit: &CompilationUnit) -> String {
    let mut out = String::new();
    for u in &unit.usings {
        using_directive(u, &mut out);
    }
    for m in &unit.members {
        member(m, &mut out);
    }
    token(&unit.eof, &mut out);
    out
}

pub fn stmt_text(stmt: &Stmt) -> String {
    let mut out = String::new();
    stmt_into(stmt, &mut out);
    out
}

pub fn expr_text(expr: &Expr) -> String {
    let mut out = String::new();
    expr_into(expr, &mut out);
    out
}

pub fn type_text(ty: &TypeSyntax) -> String {
    let mut out = String::new();
    type_into(ty, &mut out);
    out
}

/// Type name without any trivia, e.g. `Func<int>` for ` Func< int >`.
pub fn clean_type_text(ty: &TypeSyntax) -> String {
    let mut out = String::new();
    clean_type_into(ty, &mut out);
    out
}

fn clean_type_into(ty: &TypeSyntax, out: &mut String) {
    match &ty.kind {
        TypeKind::Simple(t) => out.push_str(&t.text),
        TypeKind::Generic { name, args, .. } => {
            out.push_str(&name.text);
            out.push('<');
            for (i, (arg, _)) in args.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                clean_type_into(arg, out);
            }
            out.push('>');
        }
        TypeKind::Qualified { segments } => {
            for t in segments {
                out.push_str(&t.text);
            }
        }
        TypeKind::Array { elem, .. } => {
            clean_type_into(elem, out);
            out.push_str("[]");
        }
        TypeKind::Opaque(tokens) => {
            for t in tokens {
                out.push_str(&t.text);
            }
        }
    }
}

fn token(t: &Token, out: &mut String) {
    out.push_str(&t.leading);
    out.push_str(&t.text);
}

fn tokens(ts: &[Token], out: &mut String) {
    for t in ts {
        token(t, out);
    }
}

fn using_directive(u: &UsingDirective, out: &mut String) {
    token(&u.kw, out);
    tokens(&u.name, out);
    token(&u.semi, out);
}

fn member(m: &Member, out: &mut String) {
    match m {
        Member::Namespace {
            kw,
            name,
            open,
            usings,
            members,
            close,
        } => {
            token(kw, out);
            tokens(name, out);
            token(open, out);
            for u in usings {
                using_directive(u, out);
            }
            for m in members {
                member(m, out);
            }
            token(close, out);
        }
        Member::Type(decl) => type_decl(decl, out),
        Member::Opaque(ts) => tokens(ts, out),
    }
}

fn type_decl(decl: &TypeDecl, out: &mut String) {
    tokens(&decl.prefix, out);
    token(&decl.kw, out);
    token(&decl.name, out);
    tokens(&decl.heritage, out);
    token(&decl.open, out);
    for m in &decl.members {
        match m {
            TypeMember::Field(field) => {
                tokens(&field.modifiers, out);
                type_into(&field.ty, out);
                declarators(&field.decls, out);
                token(&field.semi, out);
            }
            TypeMember::Method(method) => method_decl(method, out),
            TypeMember::Opaque(ts) => tokens(ts, out),
        }
    }
    token(&decl.close, out);
}

fn method_decl(method: &MethodDecl, out: &mut String) {
    tokens(&method.prefix, out);
    type_into(&method.ret, out);
    token(&method.name, out);
    tokens(&method.type_params, out);
    token(&method.params.open, out);
    for p in &method.params.params {
        tokens(&p.modifiers, out);
        type_into(&p.ty, out);
        token(&p.name, out);
        if let Some(comma) = &p.comma {
            token(comma, out);
        }
    }
    token(&method.params.close, out);
    tokens(&method.constraints, out);
    if let Some(body) = &method.body {
        block(body, out);
    }
    if let Some(semi) = &method.semi {
        token(semi, out);
    }
}

fn block(b: &Block, out: &mut String) {
    token(&b.open, out);
    for s in &b.stmts {
        stmt_into(s, out);
    }
    token(&b.close, out);
}

fn stmt_into(s: &Stmt, out: &mut String) {
    match &s.kind {
        StmtKind::LocalDecl { ty, decls, semi } => {
            type_into(ty, out);
            declarators(decls, out);
            token(semi, out);
        }
        StmtKind::ExprStmt { expr, semi } => {
            expr_into(expr, out);
            token(semi, out);
        }
        StmtKind::Return { kw, expr, semi } => {
            token(kw, out);
            if let Some(e) = expr {
                expr_into(e, out);
            }
            token(semi, out);
        }
        StmtKind::Using {
            kw,
            open,
            resource,
            close,
            body,
        } => {
            token(kw, out);
            token(open, out);
            expr_into(resource, out);
            token(close, out);
            stmt_into(body, out);
        }
        StmtKind::Block(b) => block(b, out),
        StmtKind::Opaque(ts) => tokens(ts, out),
    }
}

fn declarators(decls: &[Declarator], out: &mut String) {
    for d in decls {
        token(&d.name, out);
        if let Some((eq, init)) = &d.init {
            token(eq, out);
            expr_into(init, out);
        }
        if let Some(comma) = &d.comma {
            token(comma, out);
        }
    }
}

fn expr_into(e: &Expr, out: &mut String) {
    match &e.kind {
        ExprKind::Ident(t) | ExprKind::Literal(t) => token(t, out),
        ExprKind::Generic { name, lt, args, gt } => {
            token(name, out);
            token(lt, out);
            type_args(args, out);
            token(gt, out);
        }
        ExprKind::Member { base, dot, name } => {
            expr_into(base, out);
            token(dot, out);
            expr_into(name, out);
        }
        ExprKind::Invoke { callee, args } => {
            expr_into(callee, out);
            arg_list(args, out);
        }
        ExprKind::Lambda {
            params,
            arrow,
            body,
        } => {
            match params {
                LambdaParams::Single(t) => token(t, out),
                LambdaParams::Parenthesized { open, tokens: ts, close } => {
                    token(open, out);
                    tokens(ts, out);
                    token(close, out);
                }
            }
            token(arrow, out);
            match body {
                LambdaBody::Expr(e) => expr_into(e, out),
                LambdaBody::Block(b) => block(b, out),
            }
        }
        ExprKind::New {
            new_kw,
            ty,
            args,
            init,
        } => {
            token(new_kw, out);
            type_into(ty, out);
            if let Some(args) = args {
                arg_list(args, out);
            }
            if let Some(init) = init {
                initializer(init, out);
            }
        }
        ExprKind::TypeOf {
            kw,
            open,
            ty,
            close,
        } => {
            token(kw, out);
            token(open, out);
            type_into(ty, out);
            token(close, out);
        }
        ExprKind::Assign { left, op, right } | ExprKind::Binary { left, op, right } => {
            expr_into(left, out);
            token(op, out);
            expr_into(right, out);
        }
        ExprKind::Unary { op, inner } => {
            token(op, out);
            expr_into(inner, out);
        }
        ExprKind::Paren { open, inner, close } => {
            token(open, out);
            expr_into(inner, out);
            token(close, out);
        }
        ExprKind::Cast {
            open,
            ty,
            close,
            inner,
        } => {
            token(open, out);
            type_into(ty, out);
            token(close, out);
            expr_into(inner, out);
        }
        ExprKind::Init(init) => initializer(init, out),
        ExprKind::Opaque(ts) => tokens(ts, out),
    }
}

fn arg_list(args: &ArgList, out: &mut String) {
    token(&args.open, out);
    for arg in &args.args {
        expr_into(&arg.expr, out);
        if let Some(comma) = &arg.comma {
            token(comma, out);
        }
    }
    token(&args.close, out);
}

fn initializer(init: &Initializer, out: &mut String) {
    token(&init.open, out);
    for (e, comma) in &init.elems {
        expr_into(e, out);
        if let Some(comma) = comma {
            token(comma, out);
        }
    }
    token(&init.close, out);
}

fn type_into(ty: &TypeSyntax, out: &mut String) {
    match &ty.kind {
        TypeKind::Simple(t) => token(t, out),
        TypeKind::Generic { name, lt, args, gt } => {
            token(name, out);
            token(lt, out);
            type_args(args, out);
            token(gt, out);
        }
        TypeKind::Qualified { segments } => tokens(segments, out),
        TypeKind::Array { elem, open, close } => {
            type_into(elem, out);
            token(open, out);
            token(close, out);
        }
        TypeKind::Opaque(ts) => tokens(ts, out),
    }
}

fn type_args(args: &[(TypeSyntax, Option<Token>)], out: &mut String) {
    for (ty, comma) in args {
        type_into(ty, out);
        if let Some(comma) = comma {
            token(comma, out);
        }
    }
}
