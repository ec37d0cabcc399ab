//! The semantic model: name binding over one file against the
//! compilation's metadata.
//!
//! A model is a snapshot. It is bound from the current tree before each
//! pass and thrown away afterwards, so a pass always sees the types and
//! symbols of the tree it is about to rewrite, never a stale view from
//! before an earlier pass ran.
//!
//! Binding is deliberately shallow compared to a real compiler: one
//! symbol stands for a whole overload group, and locals are keyed by name
//! across the file (a name bound to two different types becomes ambiguous
//! and stops participating in inference). Test fixtures in the wild stay
//! comfortably inside those limits, and every miss degrades to "leave the
//! code alone", never to a wrong rewrite.

use std::collections::{HashMap, HashSet};

use crate::sema::metadata::{Compilation, ReturnShape, SymbolId, SymbolKind};
use crate::syntax::ast::{
    methods, type_decls, walk_stmts, CompilationUnit, Expr, ExprKind, Member, Stmt, StmtKind,
    TypeDeclKind, TypeMember, UsingDirective,
};
use crate::syntax::print::clean_type_text;

/// Signature of a method declared in the file being rewritten.
#[derive(Debug, Clone)]
pub struct MethodSig {
    pub params: Vec<String>,
    pub ret: String,
}

/// A type declared in the file being rewritten.
#[derive(Debug)]
pub struct DeclaredType {
    pub kind: TypeDeclKind,
    pub methods: HashMap<String, MethodSig>,
}

#[derive(Debug, Clone)]
enum Binding {
    Unique(String),
    Ambiguous,
}

pub struct SemanticModel<'c> {
    comp: &'c Compilation,
    rhino_imported: bool,
    moq_imported: bool,
    locals: HashMap<String, Binding>,
    declared: HashMap<String, DeclaredType>,
    /// Repository variable -> mock variables created through it.
    repo_mocks: HashMap<String, Vec<String>>,
    /// Every variable known to hold a mock (factory result or `Mock<T>`).
    mock_vars: HashSet<String>,
}

impl<'c> SemanticModel<'c> {
    /// Bind a file against the compilation. Never fails; unresolvable
    /// constructs simply stay untyped.
    pub fn bind(unit: &CompilationUnit, comp: &'c Compilation) -> SemanticModel<'c> {
        let mut model = SemanticModel {
            comp,
            rhino_imported: false,
            moq_imported: false,
            locals: HashMap::new(),
            declared: HashMap::new(),
            repo_mocks: HashMap::new(),
            mock_vars: HashSet::new(),
        };
        model.bind_usings(&unit.usings, &unit.members);
        model.bind_declared_types(unit);
        model.bind_fields(unit);
        model.bind_params(unit);

        let mut stmts: Vec<&Stmt> = Vec::new();
        walk_stmts(unit, &mut |s| stmts.push(s));
        for stmt in stmts {
            model.bind_stmt(stmt);
        }
        model
    }

    pub fn rhino_imported(&self) -> bool {
        self.rhino_imported
    }

    pub fn moq_imported(&self) -> bool {
        self.moq_imported
    }

    /// The metadata symbol table this model binds against.
    pub fn symbols(&self) -> &'c crate::sema::metadata::SymbolTable {
        &self.comp.symbols
    }

    // -- binding ------------------------------------------------------------

    fn bind_usings(&mut self, usings: &[UsingDirective], members: &[Member]) {
        for u in usings {
            let ns = u.namespace();
            if ns.starts_with("Rhino.Mocks") {
                self.rhino_imported = true;
            }
            if ns == "Moq" {
                self.moq_imported = true;
            }
        }
        for m in members {
            if let Member::Namespace {
                usings, members, ..
            } = m
            {
                self.bind_usings(usings, members);
            }
        }
    }

    fn bind_declared_types(&mut self, unit: &CompilationUnit) {
        for decl in type_decls(unit) {
            let mut sigs = HashMap::new();
            for member in &decl.members {
                if let TypeMember::Method(method) = member {
                    let params = method
                        .params
                        .params
                        .iter()
                        .map(|p| clean_type_text(&p.ty))
                        .collect();
                    sigs.insert(
                        method.name.text.clone(),
                        MethodSig {
                            params,
                            ret: clean_type_text(&method.ret),
                        },
                    );
                }
            }
            self.declared.insert(
                decl.name.text.clone(),
                DeclaredType {
                    kind: decl.kind,
                    methods: sigs,
                },
            );
        }
    }

    fn bind_fields(&mut self, unit: &CompilationUnit) {
        for decl in type_decls(unit) {
            for member in &decl.members {
                if let TypeMember::Field(field) = member {
                    let ty = clean_type_text(&field.ty);
                    for d in &field.decls {
                        self.bind_name(&d.name.text, &ty);
                    }
                }
            }
        }
    }

    fn bind_params(&mut self, unit: &CompilationUnit) {
        for method in methods(unit) {
            for p in &method.params.params {
                let ty = clean_type_text(&p.ty);
                self.bind_name(&p.name.text, &ty);
            }
        }
    }

    fn bind_stmt(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::LocalDecl { ty, decls, .. } => {
                for d in decls {
                    let bound = if ty.is_var() {
                        d.init
                            .as_ref()
                            .and_then(|(_, init)| self.display_type_of(init))
                    } else {
                        Some(clean_type_text(ty))
                    };
                    if let Some(bound) = bound {
                        self.bind_name(&d.name.text, &bound);
                    }
                    if let Some((_, init)) = &d.init {
                        self.record_factory_result(&d.name.text, init);
                    }
                }
            }
            StmtKind::ExprStmt { expr, .. } => {
                if let ExprKind::Assign { left, right, .. } = &expr.kind {
                    if let ExprKind::Ident(name) = &left.kind {
                        self.record_factory_result(&name.text, right);
                    }
                }
            }
            _ => {}
        }
    }

    fn bind_name(&mut self, name: &str, ty: &str) {
        if ty.starts_with("Mock<") {
            self.mock_vars.insert(name.to_string());
        }
        match self.locals.get(name) {
            None => {
                self.locals
                    .insert(name.to_string(), Binding::Unique(ty.to_string()));
            }
            Some(Binding::Unique(existing)) if existing != ty => {
                self.locals.insert(name.to_string(), Binding::Ambiguous);
            }
            _ => {}
        }
    }

    /// Remember that `name` was produced by a mock factory, and through
    /// which repository instance if any.
    fn record_factory_result(&mut self, name: &str, init: &Expr) {
        let Some(symbol) = self.symbol_of(init) else {
            return;
        };
        let data = self.comp.symbols.symbol(symbol);
        let from_repository = data
            .container
            .map(|c| self.comp.symbols.symbol(c).full_name == "Rhino.Mocks.MockRepository")
            .unwrap_or(false);
        if !(from_repository && data.returns == ReturnShape::TypeArg0) {
            return;
        }
        self.mock_vars.insert(name.to_string());
        if !data.is_static {
            if let Some(recv) = init.invocation_receiver() {
                if let Some(repo) = recv.first_identifier() {
                    self.repo_mocks
                        .entry(repo.text.clone())
                        .or_default()
                        .push(name.to_string());
                }
            }
        }
    }

    // -- queries ------------------------------------------------------------

    /// Declared type of an identifier (field, parameter, or local).
    pub fn identifier_type(&self, name: &str) -> Option<&str> {
        match self.locals.get(name)? {
            Binding::Unique(ty) => Some(ty),
            Binding::Ambiguous => None,
        }
    }

    pub fn is_mock_variable(&self, name: &str) -> bool {
        self.mock_vars.contains(name)
    }

    pub fn is_repository_variable(&self, name: &str) -> bool {
        self.identifier_type(name) == Some("MockRepository")
    }

    /// Mock variables created through the given repository instance, in
    /// creation order.
    pub fn mocks_of_repository(&self, repo: &str) -> &[String] {
        self.repo_mocks.get(repo).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn declared_type(&self, name: &str) -> Option<&DeclaredType> {
        self.declared.get(name)
    }

    /// Signature of `method` on a file-declared type. Mock wrappers are
    /// looked through: `Mock<IAccount>` resolves against `IAccount`.
    pub fn method_sig(&self, type_display: &str, method: &str) -> Option<&MethodSig> {
        let target = unwrap_mock(type_display);
        self.declared.get(target)?.methods.get(method)
    }

    /// Resolve an invocation or member access to a metadata symbol.
    /// `None` means the node does not bind to anything we model.
    pub fn symbol_of(&self, expr: &Expr) -> Option<SymbolId> {
        match &expr.kind {
            ExprKind::Invoke { callee, .. } => match &callee.kind {
                ExprKind::Member { base, name, .. } => {
                    self.resolve_member(base, name.member_name()?)
                }
                _ => None,
            },
            ExprKind::Member { base, name, .. } => self.resolve_member(base, name.member_name()?),
            _ => None,
        }
    }

    fn resolve_member(&self, base: &Expr, name: &str) -> Option<SymbolId> {
        // Static access through a type name, unless a local shadows it.
        let static_target = match &base.kind {
            ExprKind::Ident(t) if !self.locals.contains_key(&t.text) => {
                self.comp.symbols.type_short(&t.text)
            }
            ExprKind::Generic { name: t, .. } if !self.locals.contains_key(&t.text) => {
                self.comp.symbols.type_short_generic(&t.text)
            }
            _ => None,
        };
        if let Some(ty) = static_target {
            if self.namespace_imported(&self.comp.symbols.symbol(ty).namespace) {
                if let Some(member) = self.comp.symbols.member(ty, name) {
                    return Some(member);
                }
            }
        }

        // Instance access through a typed expression.
        if let Some(display) = self.display_type_of(base) {
            if let Some(ty) = self.resolve_display(&display) {
                if self.namespace_imported(&self.comp.symbols.symbol(ty).namespace) {
                    if let Some(member) = self.comp.symbols.member(ty, name) {
                        return Some(member);
                    }
                }
            }
        }

        // Extension methods, gated on the defining namespace's import.
        let ext = self.comp.symbols.extension(name)?;
        if self.namespace_imported(&self.comp.symbols.symbol(ext).namespace) {
            return Some(ext);
        }
        None
    }

    fn resolve_display(&self, display: &str) -> Option<SymbolId> {
        if let Some(short) = display.split('<').next() {
            if display.contains('<') {
                return self.comp.symbols.type_short_generic(short);
            }
            return self.comp.symbols.type_short(short);
        }
        None
    }

    fn namespace_imported(&self, namespace: &str) -> bool {
        if namespace.starts_with("Rhino.Mocks") {
            return self.rhino_imported;
        }
        if namespace == "Moq" || namespace.starts_with("Moq.") {
            return self.moq_imported;
        }
        true
    }

    /// Clean display type of an expression (`IAccount`, `Mock<IAccount>`,
    /// `IMethodOptions`), or `None` when it cannot be inferred.
    pub fn display_type_of(&self, expr: &Expr) -> Option<String> {
        match &expr.kind {
            ExprKind::Ident(t) => self.identifier_type(&t.text).map(str::to_string),
            ExprKind::Literal(t) => literal_type(&t.text).map(str::to_string),
            ExprKind::Paren { inner, .. } => self.display_type_of(inner),
            ExprKind::Cast { ty, .. } => Some(clean_type_text(ty)),
            ExprKind::New { ty, .. } => Some(clean_type_text(ty)),
            ExprKind::Invoke { callee, .. } => {
                let symbol = self.symbol_of(expr)?;
                self.apply_return_shape(symbol, expr, callee)
            }
            ExprKind::Member { base, .. } => {
                let symbol = self.symbol_of(expr)?;
                let data = self.comp.symbols.symbol(symbol);
                if data.kind == SymbolKind::Property {
                    return self.shape_display(data.returns, base, None);
                }
                None
            }
            _ => None,
        }
    }

    /// Display type with any `Mock<...>` wrapper removed.
    pub fn mocked_type_of(&self, expr: &Expr) -> Option<String> {
        self.display_type_of(expr)
            .map(|d| unwrap_mock(&d).to_string())
    }

    fn apply_return_shape(&self, symbol: SymbolId, invoke: &Expr, callee: &Expr) -> Option<String> {
        let data = self.comp.symbols.symbol(symbol);
        let receiver = match &callee.kind {
            ExprKind::Member { base, .. } => Some(base.as_ref()),
            _ => None,
        };
        self.shape_display(data.returns, receiver?, Some(invoke))
    }

    fn shape_display(
        &self,
        shape: ReturnShape,
        receiver: &Expr,
        invoke: Option<&Expr>,
    ) -> Option<String> {
        match shape {
            ReturnShape::Void | ReturnShape::Unknown => None,
            ReturnShape::SelfType => self.display_type_of(receiver),
            ReturnShape::Named(full) => {
                let short = full.rsplit('.').next().unwrap_or(full);
                Some(short.split('`').next().unwrap_or(short).to_string())
            }
            ReturnShape::TypeArg0 => {
                let invoke = invoke?;
                // `GenerateMock<IAccount>()`: explicit type argument.
                if let ExprKind::Invoke { callee, args } = &invoke.kind {
                    if let ExprKind::Member { name, .. } = &callee.kind {
                        if let ExprKind::Generic { args: tys, .. } = &name.kind {
                            return tys.first().map(|(ty, _)| clean_type_text(ty));
                        }
                    }
                    // `GenerateMock (typeof (IAccount))`: inferred from the
                    // first argument.
                    if let Some(first) = args.args.first() {
                        if let ExprKind::TypeOf { ty, .. } = &first.expr.kind {
                            return Some(clean_type_text(ty));
                        }
                    }
                }
                None
            }
        }
    }
}

/// `Mock<IAccount>` -> `IAccount`; anything else is returned unchanged.
pub fn unwrap_mock(display: &str) -> &str {
    display
        .strip_prefix("Mock<")
        .and_then(|rest| rest.strip_suffix('>'))
        .unwrap_or(display)
}

fn literal_type(text: &str) -> Option<&'static str> {
    match text {
        "true" | "false" => Some("bool"),
        "null" => None,
        _ => {
            let first = text.chars().next()?;
            if first == '"' || text.starts_with("@\"") {
                Some("string")
            } else if first == '\'' {
                Some("char")
            } else if first.is_ascii_digit() {
                Some("int")
            } else {
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parse;

    fn fixture(body: &str) -> CompilationUnit {
        parse(&format!(
            r#"using System;
using Rhino.Mocks;

public interface IAccount
{{
  void Deposit (int amount);
  int Balance ();
}}

public class Fixture
{{
  private IAccount _field;

  public void Run ()
  {{
{body}
  }}
}}
"#
        ))
    }

    fn find_expr_stmt(unit: &CompilationUnit, needle: &str) -> Expr {
        let mut found = None;
        walk_stmts(unit, &mut |s| {
            if let StmtKind::ExprStmt { expr, .. } = &s.kind {
                if crate::syntax::print::expr_text(expr).contains(needle) {
                    found = Some(expr.clone());
                }
            }
        });
        found.expect("statement not found")
    }

    #[test]
    fn test_var_infers_through_generic_factory() {
        let unit = fixture("    var mock = MockRepository.GenerateMock<IAccount>();\n    mock.ToString ();");
        let comp = Compilation::with_default_references();
        let model = SemanticModel::bind(&unit, &comp);
        assert_eq!(model.identifier_type("mock"), Some("IAccount"));
        assert!(model.is_mock_variable("mock"));
    }

    #[test]
    fn test_var_infers_through_typeof_factory() {
        let unit =
            fixture("    var mock = MockRepository.GenerateStub (typeof (IAccount));\n    mock.ToString ();");
        let comp = Compilation::with_default_references();
        let model = SemanticModel::bind(&unit, &comp);
        assert_eq!(model.identifier_type("mock"), Some("IAccount"));
    }

    #[test]
    fn test_repository_instance_factories_are_associated() {
        let unit = fixture(
            "    var repo = new MockRepository ();\n    var first = repo.StrictMock<IAccount>();\n    var second = repo.StrictMock<IAccount>();",
        );
        let comp = Compilation::with_default_references();
        let model = SemanticModel::bind(&unit, &comp);
        assert!(model.is_repository_variable("repo"));
        assert_eq!(model.mocks_of_repository("repo"), ["first", "second"]);
    }

    #[test]
    fn test_extension_binding_requires_rhino_using() {
        let comp = Compilation::with_default_references();

        let with = fixture("    _field.Expect (m => m.Balance ());");
        let model = SemanticModel::bind(&with, &comp);
        let expect = find_expr_stmt(&with, ".Expect");
        let symbol = model.symbol_of(&expect).expect("should bind");
        assert!(comp.symbols.symbol(symbol).is_extension);

        let source = crate::syntax::print::unit_text(&with).replace("using Rhino.Mocks;\n", "");
        let without = parse(&source);
        let model = SemanticModel::bind(&without, &comp);
        let expect = find_expr_stmt(&without, ".Expect");
        assert!(model.symbol_of(&expect).is_none());
    }

    #[test]
    fn test_fluent_chain_types_flow() {
        let unit = fixture("    _field.Expect (m => m.Balance ()).Return (42).Repeat.Any ();");
        let comp = Compilation::with_default_references();
        let model = SemanticModel::bind(&unit, &comp);
        let chain = find_expr_stmt(&unit, "Repeat");
        // The whole chain re-enters IMethodOptions after Repeat.Any ().
        assert_eq!(model.display_type_of(&chain).as_deref(), Some("IMethodOptions"));
        let symbol = model.symbol_of(&chain).unwrap();
        assert_eq!(comp.symbols.symbol(symbol).name, "Any");
    }

    #[test]
    fn test_declared_method_signatures() {
        let unit = fixture("    _field.Deposit (1);");
        let comp = Compilation::with_default_references();
        let model = SemanticModel::bind(&unit, &comp);
        let sig = model.method_sig("IAccount", "Deposit").unwrap();
        assert_eq!(sig.params, ["int"]);
        assert_eq!(sig.ret, "void");
        // Mock wrappers resolve against the mocked interface.
        assert!(model.method_sig("Mock<IAccount>", "Balance").is_some());
    }

    #[test]
    fn test_conflicting_bindings_become_ambiguous() {
        let unit = fixture("    var x = 1;\n    string x2 = \"a\";");
        let comp = Compilation::with_default_references();
        let mut model = SemanticModel::bind(&unit, &comp);
        model.bind_name("x", "string");
        assert_eq!(model.identifier_type("x"), None);
    }
}
