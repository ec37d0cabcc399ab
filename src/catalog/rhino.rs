//! The Rhino.Mocks side of the migration: every symbol a pass matches
//! against, resolved up front.

use std::collections::HashSet;

use super::{member_group, require_extension, require_member, require_type, CatalogError};
use crate::sema::metadata::{SymbolId, SymbolTable};

const REPOSITORY: &str = "Rhino.Mocks.MockRepository";
const OPTIONS: &str = "Rhino.Mocks.Interfaces.IMethodOptions`1";
const REPEAT: &str = "Rhino.Mocks.Interfaces.IRepeat`1";

#[derive(Debug)]
pub struct RhinoSymbols {
    pub repository: SymbolId,

    // Mock creation.
    pub static_factories: HashSet<SymbolId>,
    pub instance_factories: HashSet<SymbolId>,
    /// Union of static and instance factories.
    pub factories: HashSet<SymbolId>,
    pub strict_factories: HashSet<SymbolId>,
    pub partial_factories: HashSet<SymbolId>,
    pub stub_factories: HashSet<SymbolId>,

    // Expectation roots.
    pub expect_call: SymbolId,
    pub setup_result_for: SymbolId,
    pub ext_expect: SymbolId,
    pub ext_stub: SymbolId,
    /// Union of all four expectation roots.
    pub expectation_roots: HashSet<SymbolId>,

    // Fluent options chain.
    pub opt_return: SymbolId,
    pub opt_throw: SymbolId,
    pub opt_when_called: SymbolId,
    pub opt_do: SymbolId,
    pub opt_callback: SymbolId,
    pub opt_constraints: SymbolId,
    pub opt_ignore_arguments: SymbolId,
    pub opt_repeat: SymbolId,
    /// Every member of `IRepeat<T>`.
    pub repeat_members: HashSet<SymbolId>,

    // Verification and state transitions.
    pub ext_verify_all_expectations: SymbolId,
    pub repo_verify_all: SymbolId,
    pub ext_replay: SymbolId,
    pub ext_back_to_record: SymbolId,
    pub repo_replay_all: SymbolId,
    pub repo_back_to_record_all: SymbolId,
    /// Record/replay state transitions with no Moq counterpart; their
    /// statements are removed outright.
    pub obsolete_calls: HashSet<SymbolId>,

    // Ordering.
    pub repo_ordered: SymbolId,

    // Inline argument matchers (`Arg<T>.Is.Anything` and friends).
    pub arg_is: SymbolId,
    pub arg_list: SymbolId,
    pub arg_matches: SymbolId,
    pub arg_text: SymbolId,
    /// Every matcher member reachable from `Arg<T>` / `Arg`.
    pub inline_matchers: HashSet<SymbolId>,
    /// Constraint factories legal only inside `.Constraints (...)`.
    pub constraint_factories: HashSet<SymbolId>,
}

impl RhinoSymbols {
    pub fn resolve(table: &SymbolTable) -> Result<RhinoSymbols, CatalogError> {
        let repository = require_type(table, REPOSITORY)?;

        let static_factories = member_group(
            table,
            repository,
            &[
                "GenerateMock",
                "GenerateStub",
                "GenerateStrictMock",
                "GeneratePartialMock",
            ],
        );
        let instance_factories = member_group(
            table,
            repository,
            &["StrictMock", "DynamicMock", "PartialMock", "Stub"],
        );
        let factories: HashSet<SymbolId> = static_factories
            .union(&instance_factories)
            .copied()
            .collect();
        let strict_factories =
            member_group(table, repository, &["GenerateStrictMock", "StrictMock"]);
        let partial_factories =
            member_group(table, repository, &["GeneratePartialMock", "PartialMock"]);
        let stub_factories = member_group(table, repository, &["GenerateStub", "Stub"]);

        let expect_type = require_type(table, "Rhino.Mocks.Expect")?;
        let expect_call = require_member(table, expect_type, "Rhino.Mocks.Expect", "Call")?;
        let setup_result = require_type(table, "Rhino.Mocks.SetupResult")?;
        let setup_result_for =
            require_member(table, setup_result, "Rhino.Mocks.SetupResult", "For")?;
        let ext_expect = require_extension(table, "Expect")?;
        let ext_stub = require_extension(table, "Stub")?;
        let expectation_roots = [expect_call, setup_result_for, ext_expect, ext_stub]
            .into_iter()
            .collect();

        let options = require_type(table, OPTIONS)?;
        let opt = |name| require_member(table, options, OPTIONS, name);
        let opt_return = opt("Return")?;
        let opt_throw = opt("Throw")?;
        let opt_when_called = opt("WhenCalled")?;
        let opt_do = opt("Do")?;
        let opt_callback = opt("Callback")?;
        let opt_constraints = opt("Constraints")?;
        let opt_ignore_arguments = opt("IgnoreArguments")?;
        let opt_repeat = opt("Repeat")?;

        let repeat = require_type(table, REPEAT)?;
        let repeat_members = member_group(
            table,
            repeat,
            &["Once", "Twice", "Any", "Never", "AtLeastOnce", "Times"],
        );

        let ext_verify_all_expectations = require_extension(table, "VerifyAllExpectations")?;
        let repo_verify_all = require_member(table, repository, REPOSITORY, "VerifyAll")?;
        let ext_replay = require_extension(table, "Replay")?;
        let ext_back_to_record = require_extension(table, "BackToRecord")?;
        let repo_replay_all = require_member(table, repository, REPOSITORY, "ReplayAll")?;
        let repo_back_to_record_all =
            require_member(table, repository, REPOSITORY, "BackToRecordAll")?;
        let obsolete_calls = [
            ext_replay,
            ext_back_to_record,
            repo_replay_all,
            repo_back_to_record_all,
        ]
        .into_iter()
        .collect();

        let repo_ordered = require_member(table, repository, REPOSITORY, "Ordered")?;

        let arg_generic = require_type(table, "Rhino.Mocks.Arg`1")?;
        let arg_is = require_member(table, arg_generic, "Rhino.Mocks.Arg`1", "Is")?;
        let arg_list = require_member(table, arg_generic, "Rhino.Mocks.Arg`1", "List")?;
        let arg_matches = require_member(table, arg_generic, "Rhino.Mocks.Arg`1", "Matches")?;
        let arg_plain = require_type(table, "Rhino.Mocks.Arg")?;
        let arg_text = require_member(table, arg_plain, "Rhino.Mocks.Arg", "Text")?;

        let mut inline_matchers = HashSet::new();
        inline_matchers.insert(arg_matches);
        let is_arg = require_type(table, "Rhino.Mocks.Constraints.IsArg`1")?;
        inline_matchers.extend(member_group(
            table,
            is_arg,
            &[
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
            ],
        ));
        let list_arg = require_type(table, "Rhino.Mocks.Constraints.ListArg`1")?;
        inline_matchers.extend(member_group(
            table,
            list_arg,
            &["IsIn", "ContainsAll", "Equal"],
        ));
        let text_arg = require_type(table, "Rhino.Mocks.Constraints.TextArg")?;
        inline_matchers.extend(member_group(table, text_arg, &["Like"]));

        let is_factory = require_type(table, "Rhino.Mocks.Constraints.Is")?;
        let mut constraint_factories = member_group(
            table,
            is_factory,
            &[
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
            ],
        );
        let list_factory = require_type(table, "Rhino.Mocks.Constraints.List")?;
        constraint_factories.extend(member_group(
            table,
            list_factory,
            &["IsIn", "ContainsAll", "Equal"],
        ));
        let text_factory = require_type(table, "Rhino.Mocks.Constraints.Text")?;
        constraint_factories.extend(member_group(table, text_factory, &["Like"]));

        Ok(RhinoSymbols {
            repository,
            static_factories,
            instance_factories,
            factories,
            strict_factories,
            partial_factories,
            stub_factories,
            expect_call,
            setup_result_for,
            ext_expect,
            ext_stub,
            expectation_roots,
            opt_return,
            opt_throw,
            opt_when_called,
            opt_do,
            opt_callback,
            opt_constraints,
            opt_ignore_arguments,
            opt_repeat,
            repeat_members,
            ext_verify_all_expectations,
            repo_verify_all,
            ext_replay,
            ext_back_to_record,
            repo_replay_all,
            repo_back_to_record_all,
            obsolete_calls,
            repo_ordered,
            arg_is,
            arg_list,
            arg_matches,
            arg_text,
            inline_matchers,
            constraint_factories,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sema::metadata::{AssemblyMetadata, Compilation};

    #[test]
    fn test_resolves_against_default_references() {
        let comp = Compilation::with_default_references();
        let rhino = RhinoSymbols::resolve(&comp.symbols).unwrap();
        assert_eq!(rhino.factories.len(), 8);
        assert_eq!(rhino.expectation_roots.len(), 4);
        assert_eq!(rhino.obsolete_calls.len(), 4);
    }

    #[test]
    fn test_missing_assembly_is_fatal() {
        let comp = Compilation::new(vec![AssemblyMetadata::system(), AssemblyMetadata::moq()]);
        let err = RhinoSymbols::resolve(&comp.symbols).unwrap_err();
        assert!(matches!(err, CatalogError::MissingType(_)));
    }
}
