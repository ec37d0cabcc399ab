//! Syntax tree for the C# subset the rewriters understand.
//!
//! Trees are plain owned values: a rewrite produces a new (partially
//! cloned) tree instead of mutating shared state. Constructs outside the
//! subset are kept as opaque token runs and survive every pass verbatim.
//!
//! Every expression and statement carries a [`NodeId`] and an annotation
//! list used by the correlation tracker (`syntax::track`); ids are unique
//! per process so nodes synthesized mid-pass never collide with parsed
//! ones.

use std::sync::atomic::{AtomicU32, Ordering};

use super::token::Token;

/// Process-unique node identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

static NEXT_NODE_ID: AtomicU32 = AtomicU32::new(1);

impl NodeId {
    pub fn fresh() -> NodeId {
        NodeId(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Correlation session key. Fresh per pass-per-file application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CorrelationId(pub u64);

/// Correlation annotation attached to a node: "under session `correlation`,
/// this node corresponds to original node `original`".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Annotation {
    pub correlation: CorrelationId,
    pub original: NodeId,
}

// ---------------------------------------------------------------------------
// Expressions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Expr {
    pub id: NodeId,
    pub notes: Vec<Annotation>,
    pub kind: ExprKind,
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    /// Identifier or contextual keyword used as an expression.
    Ident(Token),
    Literal(Token),
    /// Generic name, e.g. `GenerateMock<IAccount>`.
    Generic {
        name: Token,
        lt: Token,
        args: Vec<(TypeSyntax, Option<Token>)>,
        gt: Token,
    },
    /// `base.name` where `name` is an `Ident` or `Generic` expression.
    Member {
        base: Box<Expr>,
        dot: Token,
        name: Box<Expr>,
    },
    Invoke {
        callee: Box<Expr>,
        args: ArgList,
    },
    Lambda {
        params: LambdaParams,
        arrow: Token,
        body: LambdaBody,
    },
    New {
        new_kw: Token,
        ty: TypeSyntax,
        args: Option<ArgList>,
        init: Option<Initializer>,
    },
    TypeOf {
        kw: Token,
        open: Token,
        ty: TypeSyntax,
        close: Token,
    },
    Assign {
        left: Box<Expr>,
        op: Token,
        right: Box<Expr>,
    },
    /// Binary operator chain, left-associative and untyped; kept only so
    /// expressions like `x > 3` inside lambdas stay structured.
    Binary {
        left: Box<Expr>,
        op: Token,
        right: Box<Expr>,
    },
    /// Prefix operator, e.g. `!flag`.
    Unary {
        op: Token,
        inner: Box<Expr>,
    },
    Paren {
        open: Token,
        inner: Box<Expr>,
        close: Token,
    },
    Cast {
        open: Token,
        ty: TypeSyntax,
        close: Token,
        inner: Box<Expr>,
    },
    /// Array or collection initializer used as an expression.
    Init(Initializer),
    /// Anything else: a balanced token run printed back verbatim.
    Opaque(Vec<Token>),
}

#[derive(Debug, Clone)]
pub enum LambdaParams {
    /// `m => ...`
    Single(Token),
    /// `(...) => ...` with the parameter tokens kept raw.
    Parenthesized {
        open: Token,
        tokens: Vec<Token>,
        close: Token,
    },
}

#[derive(Debug, Clone)]
pub enum LambdaBody {
    Expr(Box<Expr>),
    Block(Block),
}

#[derive(Debug, Clone)]
pub struct ArgList {
    pub open: Token,
    pub args: Vec<Arg>,
    pub close: Token,
}

/// One argument plus the comma that follows it, if any.
#[derive(Debug, Clone)]
pub struct Arg {
    pub expr: Expr,
    pub comma: Option<Token>,
}

#[derive(Debug, Clone)]
pub struct Initializer {
    pub open: Token,
    pub elems: Vec<(Expr, Option<Token>)>,
    pub close: Token,
}

impl Expr {
    pub fn new(kind: ExprKind) -> Expr {
        Expr {
            id: NodeId::fresh(),
            notes: Vec::new(),
            kind,
        }
    }

    /// First token of the expression, used for trivia and line lookup.
    pub fn first_token(&self) -> &Token {
        match &self.kind {
            ExprKind::Ident(t) | ExprKind::Literal(t) => t,
            ExprKind::Generic { name, .. } => name,
            ExprKind::Member { base, .. } => base.first_token(),
            ExprKind::Invoke { callee, .. } => callee.first_token(),
            ExprKind::Lambda { params, .. } => match params {
                LambdaParams::Single(t) => t,
                LambdaParams::Parenthesized { open, .. } => open,
            },
            ExprKind::New { new_kw, .. } => new_kw,
            ExprKind::TypeOf { kw, .. } => kw,
            ExprKind::Assign { left, .. } => left.first_token(),
            ExprKind::Binary { left, .. } => left.first_token(),
            ExprKind::Unary { op, .. } => op,
            ExprKind::Paren { open, .. } => open,
            ExprKind::Cast { open, .. } => open,
            ExprKind::Init(init) => &init.open,
            ExprKind::Opaque(tokens) => &tokens[0],
        }
    }

    pub fn first_token_mut(&mut self) -> &mut Token {
        match &mut self.kind {
            ExprKind::Ident(t) | ExprKind::Literal(t) => t,
            ExprKind::Generic { name, .. } => name,
            ExprKind::Member { base, .. } => base.first_token_mut(),
            ExprKind::Invoke { callee, .. } => callee.first_token_mut(),
            ExprKind::Lambda { params, .. } => match params {
                LambdaParams::Single(t) => t,
                LambdaParams::Parenthesized { open, .. } => open,
            },
            ExprKind::New { new_kw, .. } => new_kw,
            ExprKind::TypeOf { kw, .. } => kw,
            ExprKind::Assign { left, .. } => left.first_token_mut(),
            ExprKind::Binary { left, .. } => left.first_token_mut(),
            ExprKind::Unary { op, .. } => op,
            ExprKind::Paren { open, .. } => open,
            ExprKind::Cast { open, .. } => open,
            ExprKind::Init(init) => &mut init.open,
            ExprKind::Opaque(tokens) => &mut tokens[0],
        }
    }

    pub fn line(&self) -> u32 {
        self.first_token().line
    }

    /// For an invocation, the simple name being called (`Setup` in
    /// `mock.Setup (...)`, `GenerateMock` in `MockRepository.GenerateMock<T>()`).
    pub fn callee_name(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Invoke { callee, .. } => callee.member_name(),
            _ => None,
        }
    }

    /// Simple name of this expression when it is an identifier, generic
    /// name, or the member name of a member access.
    pub fn member_name(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Ident(t) => Some(&t.text),
            ExprKind::Generic { name, .. } => Some(&name.text),
            ExprKind::Member { name, .. } => name.member_name(),
            _ => None,
        }
    }

    /// The receiver of a member-access invocation: `mock` in
    /// `mock.Expect (...)`.
    pub fn invocation_receiver(&self) -> Option<&Expr> {
        match &self.kind {
            ExprKind::Invoke { callee, .. } => match &callee.kind {
                ExprKind::Member { base, .. } => Some(base),
                _ => None,
            },
            _ => None,
        }
    }

    /// Leftmost identifier token of the expression, if any.
    pub fn first_identifier(&self) -> Option<&Token> {
        let t = self.first_token();
        if t.is_ident() {
            Some(t)
        } else {
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct TypeSyntax {
    pub kind: TypeKind,
}

#[derive(Debug, Clone)]
pub enum TypeKind {
    /// `int`, `string`, `IAccount`, `var`.
    Simple(Token),
    /// `Mock<IAccount>`, `Func<T>`.
    Generic {
        name: Token,
        lt: Token,
        args: Vec<(TypeSyntax, Option<Token>)>,
        gt: Token,
    },
    /// Dotted name, e.g. `Rhino.Mocks.MockRepository`.
    Qualified { segments: Vec<Token> },
    Array {
        elem: Box<TypeSyntax>,
        open: Token,
        close: Token,
    },
    Opaque(Vec<Token>),
}

impl TypeSyntax {
    pub fn simple(name: &str) -> TypeSyntax {
        TypeSyntax {
            kind: TypeKind::Simple(Token::ident(name)),
        }
    }

    pub fn first_token(&self) -> &Token {
        match &self.kind {
            TypeKind::Simple(t) => t,
            TypeKind::Generic { name, .. } => name,
            TypeKind::Qualified { segments } => &segments[0],
            TypeKind::Array { elem, .. } => elem.first_token(),
            TypeKind::Opaque(tokens) => &tokens[0],
        }
    }

    pub fn first_token_mut(&mut self) -> &mut Token {
        match &mut self.kind {
            TypeKind::Simple(t) => t,
            TypeKind::Generic { name, .. } => name,
            TypeKind::Qualified { segments } => &mut segments[0],
            TypeKind::Array { elem, .. } => elem.first_token_mut(),
            TypeKind::Opaque(tokens) => &mut tokens[0],
        }
    }

    /// Rightmost simple name: `MockRepository` for
    /// `Rhino.Mocks.MockRepository`, `Mock` for `Mock<IAccount>`.
    pub fn simple_name(&self) -> Option<&str> {
        match &self.kind {
            TypeKind::Simple(t) => Some(&t.text),
            TypeKind::Generic { name, .. } => Some(&name.text),
            TypeKind::Qualified { segments } => segments.last().map(|t| t.text.as_str()),
            TypeKind::Array { elem, .. } => elem.simple_name(),
            TypeKind::Opaque(_) => None,
        }
    }

    pub fn type_args(&self) -> &[(TypeSyntax, Option<Token>)] {
        match &self.kind {
            TypeKind::Generic { args, .. } => args,
            _ => &[],
        }
    }

    pub fn is_var(&self) -> bool {
        matches!(&self.kind, TypeKind::Simple(t) if t.text == "var")
    }
}

// ---------------------------------------------------------------------------
// Statements
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Stmt {
    pub id: NodeId,
    pub notes: Vec<Annotation>,
    pub kind: StmtKind,
}

#[derive(Debug, Clone)]
pub enum StmtKind {
    LocalDecl {
        ty: TypeSyntax,
        decls: Vec<Declarator>,
        semi: Token,
    },
    ExprStmt {
        expr: Expr,
        semi: Token,
    },
    Return {
        kw: Token,
        expr: Option<Expr>,
        semi: Token,
    },
    Using {
        kw: Token,
        open: Token,
        resource: Expr,
        close: Token,
        body: Box<Stmt>,
    },
    Block(Block),
    Opaque(Vec<Token>),
}

#[derive(Debug, Clone)]
pub struct Declarator {
    pub name: Token,
    /// `= <expr>` initializer.
    pub init: Option<(Token, Expr)>,
    pub comma: Option<Token>,
}

#[derive(Debug, Clone)]
pub struct Block {
    pub open: Token,
    pub stmts: Vec<Stmt>,
    pub close: Token,
}

impl Stmt {
    pub fn new(kind: StmtKind) -> Stmt {
        Stmt {
            id: NodeId::fresh(),
            notes: Vec::new(),
            kind,
        }
    }

    pub fn first_token(&self) -> &Token {
        match &self.kind {
            StmtKind::LocalDecl { ty, .. } => ty.first_token(),
            StmtKind::ExprStmt { expr, .. } => expr.first_token(),
            StmtKind::Return { kw, .. } => kw,
            StmtKind::Using { kw, .. } => kw,
            StmtKind::Block(block) => &block.open,
            StmtKind::Opaque(tokens) => &tokens[0],
        }
    }

    pub fn first_token_mut(&mut self) -> &mut Token {
        match &mut self.kind {
            StmtKind::LocalDecl { ty, .. } => ty.first_token_mut(),
            StmtKind::ExprStmt { expr, .. } => expr.first_token_mut(),
            StmtKind::Return { kw, .. } => kw,
            StmtKind::Using { kw, .. } => kw,
            StmtKind::Block(block) => &mut block.open,
            StmtKind::Opaque(tokens) => &mut tokens[0],
        }
    }

    pub fn line(&self) -> u32 {
        self.first_token().line
    }
}

// ---------------------------------------------------------------------------
// Declarations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct UsingDirective {
    pub kw: Token,
    /// Dotted name tokens including the separating dots.
    pub name: Vec<Token>,
    pub semi: Token,
}

impl UsingDirective {
    /// The imported namespace as written, without trivia.
    pub fn namespace(&self) -> String {
        self.name.iter().map(|t| t.text.as_str()).collect()
    }
}

#[derive(Debug, Clone)]
pub enum Member {
    Namespace {
        kw: Token,
        name: Vec<Token>,
        open: Token,
        usings: Vec<UsingDirective>,
        members: Vec<Member>,
        close: Token,
    },
    Type(TypeDecl),
    Opaque(Vec<Token>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeDeclKind {
    Class,
    Interface,
}

#[derive(Debug, Clone)]
pub struct TypeDecl {
    /// Attributes and modifiers, kept raw.
    pub prefix: Vec<Token>,
    pub kind: TypeDeclKind,
    pub kw: Token,
    pub name: Token,
    /// Base-list and constraint tokens up to the opening brace, kept raw.
    pub heritage: Vec<Token>,
    pub open: Token,
    pub members: Vec<TypeMember>,
    pub close: Token,
}

#[derive(Debug, Clone)]
pub enum TypeMember {
    Field(FieldDecl),
    Method(MethodDecl),
    Opaque(Vec<Token>),
}

#[derive(Debug, Clone)]
pub struct FieldDecl {
    pub modifiers: Vec<Token>,
    pub ty: TypeSyntax,
    pub decls: Vec<Declarator>,
    pub semi: Token,
}

#[derive(Debug, Clone)]
pub struct MethodDecl {
    /// Attributes and modifiers, kept raw.
    pub prefix: Vec<Token>,
    pub ret: TypeSyntax,
    pub name: Token,
    /// `<T, U>` type parameter tokens, kept raw.
    pub type_params: Vec<Token>,
    pub params: ParamList,
    /// `where` constraint tokens, kept raw.
    pub constraints: Vec<Token>,
    /// `None` for interface members and abstract methods.
    pub body: Option<Block>,
    pub semi: Option<Token>,
}

#[derive(Debug, Clone)]
pub struct ParamList {
    pub open: Token,
    pub params: Vec<Param>,
    pub close: Token,
}

#[derive(Debug, Clone)]
pub struct Param {
    pub modifiers: Vec<Token>,
    pub ty: TypeSyntax,
    pub name: Token,
    pub comma: Option<Token>,
}

#[derive(Debug, Clone)]
pub struct CompilationUnit {
    pub usings: Vec<UsingDirective>,
    pub members: Vec<Member>,
    pub eof: Token,
}

impl CompilationUnit {
    /// True if the file imports the given namespace (exact match).
    pub fn has_using(&self, namespace: &str) -> bool {
        fn search(usings: &[UsingDirective], members: &[Member], namespace: &str) -> bool {
            usings.iter().any(|u| u.namespace() == namespace)
                || members.iter().any(|m| match m {
                    Member::Namespace {
                        usings, members, ..
                    } => search(usings, members, namespace),
                    _ => false,
                })
        }
        search(&self.usings, &self.members, namespace)
    }
}

// ---------------------------------------------------------------------------
// Walkers
// ---------------------------------------------------------------------------

/// Visit every statement in the unit, pre-order, including statements
/// nested in blocks, `using` bodies, and lambda block bodies.
pub fn walk_stmts<'a>(unit: &'a CompilationUnit, f: &mut dyn FnMut(&'a Stmt)) {
    for method in methods(unit) {
        if let Some(body) = &method.body {
            for stmt in &body.stmts {
                visit_stmt(stmt, f);
            }
        }
    }
}

fn visit_stmt<'a>(stmt: &'a Stmt, f: &mut dyn FnMut(&'a Stmt)) {
    f(stmt);
    match &stmt.kind {
        StmtKind::Block(block) => {
            for s in &block.stmts {
                visit_stmt(s, f);
            }
        }
        StmtKind::Using { body, .. } => visit_stmt(body, f),
        StmtKind::ExprStmt { expr, .. } => visit_lambda_blocks(expr, f),
        StmtKind::LocalDecl { decls, .. } => {
            for d in decls {
                if let Some((_, init)) = &d.init {
                    visit_lambda_blocks(init, f);
                }
            }
        }
        StmtKind::Return {
            expr: Some(expr), ..
        } => visit_lambda_blocks(expr, f),
        _ => {}
    }
}

fn visit_lambda_blocks<'a>(expr: &'a Expr, f: &mut dyn FnMut(&'a Stmt)) {
    visit_expr(expr, &mut |e| {
        if let ExprKind::Lambda {
            body: LambdaBody::Block(block),
            ..
        } = &e.kind
        {
            for s in &block.stmts {
                visit_stmt(s, f);
            }
        }
    });
}

/// Visit an expression and all sub-expressions, pre-order.
pub fn visit_expr<'a>(expr: &'a Expr, f: &mut dyn FnMut(&'a Expr)) {
    f(expr);
    match &expr.kind {
        ExprKind::Member { base, name, .. } => {
            visit_expr(base, f);
            visit_expr(name, f);
        }
        ExprKind::Invoke { callee, args } => {
            visit_expr(callee, f);
            for arg in &args.args {
                visit_expr(&arg.expr, f);
            }
        }
        ExprKind::Lambda { body, .. } => match body {
            LambdaBody::Expr(e) => visit_expr(e, f),
            LambdaBody::Block(_) => {}
        },
        ExprKind::New { args, init, .. } => {
            if let Some(args) = args {
                for arg in &args.args {
                    visit_expr(&arg.expr, f);
                }
            }
            if let Some(init) = init {
                for (e, _) in &init.elems {
                    visit_expr(e, f);
                }
            }
        }
        ExprKind::Assign { left, right, .. } | ExprKind::Binary { left, right, .. } => {
            visit_expr(left, f);
            visit_expr(right, f);
        }
        ExprKind::Paren { inner, .. }
        | ExprKind::Cast { inner, .. }
        | ExprKind::Unary { inner, .. } => visit_expr(inner, f),
        ExprKind::Init(init) => {
            for (e, _) in &init.elems {
                visit_expr(e, f);
            }
        }
        _ => {}
    }
}

/// Visit an expression and all sub-expressions mutably, post-order, so a
/// callback may replace a node after its children were processed.
pub fn visit_expr_mut(expr: &mut Expr, f: &mut dyn FnMut(&mut Expr)) {
    match &mut expr.kind {
        ExprKind::Member { base, name, .. } => {
            visit_expr_mut(base, f);
            visit_expr_mut(name, f);
        }
        ExprKind::Invoke { callee, args } => {
            visit_expr_mut(callee, f);
            for arg in &mut args.args {
                visit_expr_mut(&mut arg.expr, f);
            }
        }
        ExprKind::Lambda { body, .. } => {
            if let LambdaBody::Expr(e) = body {
                visit_expr_mut(e, f);
            }
        }
        ExprKind::New { args, init, .. } => {
            if let Some(args) = args {
                for arg in &mut args.args {
                    visit_expr_mut(&mut arg.expr, f);
                }
            }
            if let Some(init) = init {
                for (e, _) in &mut init.elems {
                    visit_expr_mut(e, f);
                }
            }
        }
        ExprKind::Assign { left, right, .. } | ExprKind::Binary { left, right, .. } => {
            visit_expr_mut(left, f);
            visit_expr_mut(right, f);
        }
        ExprKind::Paren { inner, .. }
        | ExprKind::Cast { inner, .. }
        | ExprKind::Unary { inner, .. } => visit_expr_mut(inner, f),
        ExprKind::Init(init) => {
            for (e, _) in &mut init.elems {
                visit_expr_mut(e, f);
            }
        }
        _ => {}
    }
    f(expr);
}

/// Visit every top-level expression of a statement, recursing into
/// sub-expressions, `using` bodies and nested blocks.
pub fn walk_stmt_exprs<'a>(stmt: &'a Stmt, f: &mut dyn FnMut(&'a Expr)) {
    match &stmt.kind {
        StmtKind::ExprStmt { expr, .. } => visit_expr(expr, f),
        StmtKind::LocalDecl { decls, .. } => {
            for d in decls {
                if let Some((_, init)) = &d.init {
                    visit_expr(init, f);
                }
            }
        }
        StmtKind::Return {
            expr: Some(expr), ..
        } => visit_expr(expr, f),
        StmtKind::Using { resource, body, .. } => {
            visit_expr(resource, f);
            walk_stmt_exprs(body, f);
        }
        StmtKind::Block(block) => {
            for s in &block.stmts {
                walk_stmt_exprs(s, f);
            }
        }
        _ => {}
    }
}

/// Visit every top-level expression of every statement mutably.
pub fn walk_stmt_exprs_mut(stmt: &mut Stmt, f: &mut dyn FnMut(&mut Expr)) {
    match &mut stmt.kind {
        StmtKind::ExprStmt { expr, .. } => visit_expr_mut(expr, f),
        StmtKind::LocalDecl { decls, .. } => {
            for d in decls {
                if let Some((_, init)) = &mut d.init {
                    visit_expr_mut(init, f);
                }
            }
        }
        StmtKind::Return {
            expr: Some(expr), ..
        } => visit_expr_mut(expr, f),
        StmtKind::Using { resource, body, .. } => {
            visit_expr_mut(resource, f);
            walk_stmt_exprs_mut(body, f);
        }
        StmtKind::Block(block) => {
            for s in &mut block.stmts {
                walk_stmt_exprs_mut(s, f);
            }
        }
        _ => {}
    }
}

/// Visit every block in the unit mutably (method bodies, nested blocks,
/// `using` bodies, lambda block bodies), innermost blocks first so that
/// splicing in an outer block sees already-rewritten inner statements.
pub fn walk_blocks_mut(unit: &mut CompilationUnit, f: &mut dyn FnMut(&mut Block)) {
    for method in methods_mut(unit) {
        if let Some(body) = &mut method.body {
            visit_block_mut(body, f);
        }
    }
}

fn visit_block_mut(block: &mut Block, f: &mut dyn FnMut(&mut Block)) {
    for stmt in &mut block.stmts {
        visit_stmt_blocks_mut(stmt, f);
    }
    f(block);
}

fn visit_stmt_blocks_mut(stmt: &mut Stmt, f: &mut dyn FnMut(&mut Block)) {
    match &mut stmt.kind {
        StmtKind::Block(block) => visit_block_mut(block, f),
        StmtKind::Using { body, .. } => visit_stmt_blocks_mut(body, f),
        StmtKind::ExprStmt { expr, .. } => visit_expr_mut(expr, &mut |e| {
            if let ExprKind::Lambda {
                body: LambdaBody::Block(block),
                ..
            } = &mut e.kind
            {
                visit_block_mut(block, f);
            }
        }),
        _ => {}
    }
}

/// All method declarations in the unit.
pub fn methods(unit: &CompilationUnit) -> Vec<&MethodDecl> {
    let mut out = Vec::new();
    fn collect<'a>(members: &'a [Member], out: &mut Vec<&'a MethodDecl>) {
        for member in members {
            match member {
                Member::Namespace { members, .. } => collect(members, out),
                Member::Type(decl) => {
                    for m in &decl.members {
                        if let TypeMember::Method(method) = m {
                            out.push(method);
                        }
                    }
                }
                Member::Opaque(_) => {}
            }
        }
    }
    collect(&unit.members, &mut out);
    out
}

/// All method declarations in the unit, mutable.
pub fn methods_mut(unit: &mut CompilationUnit) -> Vec<&mut MethodDecl> {
    let mut out = Vec::new();
    fn collect<'a>(members: &'a mut [Member], out: &mut Vec<&'a mut MethodDecl>) {
        for member in members {
            match member {
                Member::Namespace { members, .. } => collect(members, out),
                Member::Type(decl) => {
                    for m in &mut decl.members {
                        if let TypeMember::Method(method) = m {
                            out.push(method);
                        }
                    }
                }
                Member::Opaque(_) => {}
            }
        }
    }
    collect(&mut unit.members, &mut out);
    out
}

/// All type declarations in the unit.
pub fn type_decls(unit: &CompilationUnit) -> Vec<&TypeDecl> {
    let mut out = Vec::new();
    fn collect<'a>(members: &'a [Member], out: &mut Vec<&'a TypeDecl>) {
        for member in members {
            match member {
                Member::Namespace { members, .. } => collect(members, out),
                Member::Type(decl) => out.push(decl),
                Member::Opaque(_) => {}
            }
        }
    }
    collect(&unit.members, &mut out);
    out
}

/// All field declarations in the unit, mutable.
pub fn fields_mut(unit: &mut CompilationUnit) -> Vec<&mut FieldDecl> {
    let mut out = Vec::new();
    fn collect<'a>(members: &'a mut [Member], out: &mut Vec<&'a mut FieldDecl>) {
        for member in members {
            match member {
                Member::Namespace { members, .. } => collect(members, out),
                Member::Type(decl) => {
                    for m in &mut decl.members {
                        if let TypeMember::Field(field) = m {
                            out.push(field);
                        }
                    }
                }
                Member::Opaque(_) => {}
            }
        }
    }
    collect(&mut unit.members, &mut out);
    out
}
