//! Built-in metadata for the referenced assemblies.
//!
//! The rewriters never see these names as strings scattered through pass
//! code; they resolve them once, up front, into [`SymbolId`]s (see
//! `catalog`). The tables below describe the slice of Rhino.Mocks, Moq
//! and the BCL that migration needs: type and member names, staticness,
//! extension-ness, and a coarse return shape used for receiver-type
//! inference along fluent chains.

use std::collections::HashMap;

use once_cell::sync::Lazy;

/// Index into a [`SymbolTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SymbolId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Type,
    Method,
    Property,
}

/// What a member invocation evaluates to, in just enough detail to walk
/// a fluent chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnShape {
    Void,
    /// Not modeled; chains stop here.
    Unknown,
    /// The first generic type argument of the call, e.g.
    /// `GenerateMock<IAccount>()` has type `IAccount`.
    TypeArg0,
    /// The receiver's own type (fluent builders).
    SelfType,
    /// A fixed type, given by full metadata name.
    Named(&'static str),
}

#[derive(Debug, Clone)]
pub struct SymbolData {
    pub name: String,
    /// `Namespace.Name` for types, `Owner.Name` for members.
    pub full_name: String,
    pub kind: SymbolKind,
    pub container: Option<SymbolId>,
    pub namespace: String,
    pub is_static: bool,
    pub is_extension: bool,
    pub returns: ReturnShape,
}

/// Flat symbol storage with the lookup maps the model and catalog use.
#[derive(Debug, Default)]
pub struct SymbolTable {
    data: Vec<SymbolData>,
    types_by_full_name: HashMap<String, SymbolId>,
    types_by_short_name: HashMap<String, SymbolId>,
    generic_types_by_short_name: HashMap<String, SymbolId>,
    members: HashMap<(SymbolId, String), SymbolId>,
    extensions: HashMap<String, SymbolId>,
}

impl SymbolTable {
    pub fn new() -> SymbolTable {
        SymbolTable::default()
    }

    pub fn symbol(&self, id: SymbolId) -> &SymbolData {
        &self.data[id.0 as usize]
    }

    pub fn type_named(&self, full_name: &str) -> Option<SymbolId> {
        self.types_by_full_name.get(full_name).copied()
    }

    /// Resolve a type by the short name it is written with in source.
    /// Prefers a non-generic type of that name, then a generic one;
    /// `Arg` and `Arg<T>` are distinct symbols.
    pub fn type_short(&self, short_name: &str) -> Option<SymbolId> {
        self.types_by_short_name
            .get(short_name)
            .or_else(|| self.generic_types_by_short_name.get(short_name))
            .copied()
    }

    /// Resolve a generic type by the short name it is written with.
    pub fn type_short_generic(&self, short_name: &str) -> Option<SymbolId> {
        self.generic_types_by_short_name.get(short_name).copied()
    }

    pub fn member(&self, owner: SymbolId, name: &str) -> Option<SymbolId> {
        self.members.get(&(owner, name.to_string())).copied()
    }

    /// Resolve an extension method by name. One symbol per name; the
    /// overload groups of the real assemblies collapse onto it.
    pub fn extension(&self, name: &str) -> Option<SymbolId> {
        self.extensions.get(name).copied()
    }

    fn push(&mut self, data: SymbolData) -> SymbolId {
        let id = SymbolId(self.data.len() as u32);
        self.data.push(data);
        id
    }

    pub fn add_type(&mut self, namespace: &str, name: &str) -> SymbolId {
        let full_name = format!("{namespace}.{name}");
        let id = self.push(SymbolData {
            name: name.to_string(),
            full_name: full_name.clone(),
            kind: SymbolKind::Type,
            container: None,
            namespace: namespace.to_string(),
            is_static: false,
            is_extension: false,
            returns: ReturnShape::Unknown,
        });
        self.types_by_full_name.insert(full_name, id);
        // Generic arity suffixes (`Mock` for `Mock<T>`) are not part of
        // the written name.
        let short = name.split('`').next().unwrap_or(name).to_string();
        if name.contains('`') {
            self.generic_types_by_short_name.insert(short, id);
        } else {
            self.types_by_short_name.insert(short, id);
        }
        id
    }

    pub fn add_method(&mut self, owner: SymbolId, name: &str, returns: ReturnShape) -> SymbolId {
        self.add_member(owner, name, SymbolKind::Method, false, returns)
    }

    pub fn add_static_method(
        &mut self,
        owner: SymbolId,
        name: &str,
        returns: ReturnShape,
    ) -> SymbolId {
        let id = self.add_member(owner, name, SymbolKind::Method, false, returns);
        self.data[id.0 as usize].is_static = true;
        id
    }

    pub fn add_extension_method(
        &mut self,
        owner: SymbolId,
        name: &str,
        returns: ReturnShape,
    ) -> SymbolId {
        let id = self.add_member(owner, name, SymbolKind::Method, true, returns);
        self.extensions.insert(name.to_string(), id);
        id
    }

    pub fn add_property(&mut self, owner: SymbolId, name: &str, returns: ReturnShape) -> SymbolId {
        self.add_member(owner, name, SymbolKind::Property, false, returns)
    }

    fn add_member(
        &mut self,
        owner: SymbolId,
        name: &str,
        kind: SymbolKind,
        is_extension: bool,
        returns: ReturnShape,
    ) -> SymbolId {
        let owner_data = self.symbol(owner);
        let namespace = owner_data.namespace.clone();
        let full_name = format!("{}.{}", owner_data.full_name, name);
        let id = self.push(SymbolData {
            name: name.to_string(),
            full_name,
            kind,
            container: Some(owner),
            namespace,
            is_static: is_extension,
            is_extension,
            returns,
        });
        self.members.insert((owner, name.to_string()), id);
        id
    }
}

/// One referenced assembly: a name plus the symbols it contributes.
pub struct AssemblyMetadata {
    pub name: &'static str,
    install: fn(&mut SymbolTable),
}

impl AssemblyMetadata {
    pub fn rhino_mocks() -> AssemblyMetadata {
        AssemblyMetadata {
            name: "Rhino.Mocks",
            install: install_rhino_mocks,
        }
    }

    pub fn moq() -> AssemblyMetadata {
        AssemblyMetadata {
            name: "Moq",
            install: install_moq,
        }
    }

    pub fn system() -> AssemblyMetadata {
        AssemblyMetadata {
            name: "System",
            install: install_system,
        }
    }
}

/// The compilation: referenced assemblies flattened into one symbol table.
pub struct Compilation {
    pub symbols: SymbolTable,
    pub assemblies: Vec<&'static str>,
}

impl Compilation {
    /// A compilation referencing Rhino.Mocks, Moq and the BCL slice.
    pub fn with_default_references() -> Compilation {
        Compilation::new(vec![
            AssemblyMetadata::system(),
            AssemblyMetadata::rhino_mocks(),
            AssemblyMetadata::moq(),
        ])
    }

    pub fn new(assemblies: Vec<AssemblyMetadata>) -> Compilation {
        let mut symbols = SymbolTable::new();
        let mut names = Vec::new();
        for assembly in &assemblies {
            (assembly.install)(&mut symbols);
            names.push(assembly.name);
        }
        Compilation {
            symbols,
            assemblies: names,
        }
    }
}

static DEFAULT_COMPILATION: Lazy<Compilation> = Lazy::new(Compilation::with_default_references);

/// The shared compilation with the default references. The symbol table
/// is immutable after construction, so one instance serves the run.
pub fn default_compilation() -> &'static Compilation {
    &DEFAULT_COMPILATION
}

const METHOD_OPTIONS: &str = "Rhino.Mocks.Interfaces.IMethodOptions`1";
const REPEAT: &str = "Rhino.Mocks.Interfaces.IRepeat`1";
const SETUP_FLOW: &str = "Moq.Language.Flow.ISetup`1";

fn install_rhino_mocks(t: &mut SymbolTable) {
    use ReturnShape::*;

    let repository = t.add_type("Rhino.Mocks", "MockRepository");
    for factory in [
        "GenerateMock",
        "GenerateStub",
        "GenerateStrictMock",
        "GeneratePartialMock",
    ] {
        t.add_static_method(repository, factory, TypeArg0);
    }
    for factory in ["StrictMock", "DynamicMock", "PartialMock", "Stub"] {
        t.add_method(repository, factory, TypeArg0);
    }
    t.add_method(repository, "Ordered", Named("System.IDisposable"));
    t.add_method(repository, "Unordered", Named("System.IDisposable"));
    t.add_method(repository, "ReplayAll", Void);
    t.add_method(repository, "VerifyAll", Void);
    t.add_method(repository, "BackToRecordAll", Void);

    let expect = t.add_type("Rhino.Mocks", "Expect");
    t.add_static_method(expect, "Call", Named(METHOD_OPTIONS));

    let setup_result = t.add_type("Rhino.Mocks", "SetupResult");
    t.add_static_method(setup_result, "For", Named(METHOD_OPTIONS));

    let extensions = t.add_type("Rhino.Mocks", "RhinoMocksExtensions");
    t.add_extension_method(extensions, "Expect", Named(METHOD_OPTIONS));
    t.add_extension_method(extensions, "Stub", Named(METHOD_OPTIONS));
    t.add_extension_method(extensions, "VerifyAllExpectations", Void);
    t.add_extension_method(extensions, "Replay", Void);
    t.add_extension_method(extensions, "BackToRecord", Void);
    t.add_extension_method(extensions, "GetMockRepository", Named("Rhino.Mocks.MockRepository"));

    let options = t.add_type("Rhino.Mocks.Interfaces", "IMethodOptions`1");
    for fluent in [
        "Return",
        "Throw",
        "WhenCalled",
        "Do",
        "Callback",
        "Constraints",
        "IgnoreArguments",
        "OutRef",
        "CallOriginalMethod",
    ] {
        t.add_method(options, fluent, SelfType);
    }
    t.add_property(options, "Repeat", Named(REPEAT));

    let repeat = t.add_type("Rhino.Mocks.Interfaces", "IRepeat`1");
    for times in ["Once", "Twice", "Any", "Never", "AtLeastOnce", "Times"] {
        t.add_method(repeat, times, Named(METHOD_OPTIONS));
    }

    // Inline argument constraints: Arg<T>.Is.*, Arg<T>.List.*, Arg.Text.*.
    let arg_generic = t.add_type("Rhino.Mocks", "Arg`1");
    t.add_property(arg_generic, "Is", Named("Rhino.Mocks.Constraints.IsArg`1"));
    t.add_property(arg_generic, "List", Named("Rhino.Mocks.Constraints.ListArg`1"));
    t.add_static_method(arg_generic, "Matches", TypeArg0);

    let arg = t.add_type("Rhino.Mocks", "Arg");
    t.add_property(arg, "Text", Named("Rhino.Mocks.Constraints.TextArg"));

    let is_arg = t.add_type("Rhino.Mocks.Constraints", "IsArg`1");
    for constraint in [
        "Anything",
        "Equal",
        "NotEqual",
        "Same",
        "NotSame",
        "Null",
        "NotNull",
        "GreaterThan",
        "GreaterThanOrEqual",
        "LessThan",
        "LessThanOrEqual",
    ] {
        t.add_method(is_arg, constraint, TypeArg0);
    }

    let list_arg = t.add_type("Rhino.Mocks.Constraints", "ListArg`1");
    for constraint in ["IsIn", "ContainsAll", "Equal"] {
        t.add_method(list_arg, constraint, TypeArg0);
    }

    let text_arg = t.add_type("Rhino.Mocks.Constraints", "TextArg");
    t.add_method(text_arg, "Like", Unknown);

    // Constraint factories used inside `.Constraints (...)` argument lists.
    let is_constraints = t.add_type("Rhino.Mocks.Constraints", "Is");
    for constraint in [
        "Anything",
        "Equal",
        "NotEqual",
        "Same",
        "NotSame",
        "Null",
        "NotNull",
        "GreaterThan",
        "GreaterThanOrEqual",
        "LessThan",
        "LessThanOrEqual",
        "Matching",
        "TypeOf",
    ] {
        t.add_static_method(is_constraints, constraint, Unknown);
    }

    let list_constraints = t.add_type("Rhino.Mocks.Constraints", "List");
    for constraint in ["IsIn", "ContainsAll", "Equal", "Count"] {
        t.add_static_method(list_constraints, constraint, Unknown);
    }

    let text_constraints = t.add_type("Rhino.Mocks.Constraints", "Text");
    t.add_static_method(text_constraints, "Like", Unknown);

    let property_constraints = t.add_type("Rhino.Mocks.Constraints", "Property");
    t.add_static_method(property_constraints, "Value", Unknown);
}

fn install_moq(t: &mut SymbolTable) {
    use ReturnShape::*;

    let mock = t.add_type("Moq", "Mock`1");
    t.add_method(mock, "Setup", Named(SETUP_FLOW));
    t.add_method(mock, "Verify", Void);
    t.add_method(mock, "VerifyAll", Void);
    t.add_method(mock, "InSequence", Named(SETUP_FLOW));
    t.add_method(mock, "Protected", Unknown);
    t.add_property(mock, "Object", TypeArg0);

    let setup = t.add_type("Moq.Language.Flow", "ISetup`1");
    for fluent in ["Returns", "Throws", "Callback", "Verifiable"] {
        t.add_method(setup, fluent, SelfType);
    }

    t.add_type("Moq", "MockSequence");
    t.add_type("Moq", "MockBehavior");

    let it = t.add_type("Moq", "It");
    t.add_static_method(it, "IsAny", Unknown);
    t.add_static_method(it, "Is", Unknown);
    t.add_static_method(it, "IsNotNull", Unknown);
}

fn install_system(t: &mut SymbolTable) {
    t.add_type("System", "IDisposable");
    t.add_type("System", "Type");
    t.add_type("System", "Exception");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_references_resolve_core_types() {
        let comp = Compilation::with_default_references();
        for full in [
            "Rhino.Mocks.MockRepository",
            "Rhino.Mocks.Expect",
            "Rhino.Mocks.SetupResult",
            "Rhino.Mocks.RhinoMocksExtensions",
            "Moq.Mock`1",
            "Moq.MockSequence",
        ] {
            assert!(comp.symbols.type_named(full).is_some(), "missing {full}");
        }
    }

    #[test]
    fn test_short_names_drop_generic_arity() {
        let comp = Compilation::with_default_references();
        let mock = comp.symbols.type_short("Mock").unwrap();
        assert_eq!(comp.symbols.symbol(mock).full_name, "Moq.Mock`1");
    }

    #[test]
    fn test_fluent_chain_shapes() {
        let comp = Compilation::with_default_references();
        let options = comp
            .symbols
            .type_named("Rhino.Mocks.Interfaces.IMethodOptions`1")
            .unwrap();
        let ret = comp.symbols.member(options, "Return").unwrap();
        assert_eq!(comp.symbols.symbol(ret).returns, ReturnShape::SelfType);

        let repeat = comp.symbols.member(options, "Repeat").unwrap();
        assert!(matches!(
            comp.symbols.symbol(repeat).returns,
            ReturnShape::Named(n) if n.contains("IRepeat")
        ));
    }

    #[test]
    fn test_extension_lookup() {
        let comp = Compilation::with_default_references();
        let expect = comp.symbols.extension("Expect").unwrap();
        assert!(comp.symbols.symbol(expect).is_extension);
    }
}
