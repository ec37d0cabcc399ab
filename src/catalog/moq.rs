//! The Moq side of the migration: target symbols the rewrites emit and
//! the wrapper members allowed directly on a `Mock<T>` receiver.

use std::collections::HashSet;

use super::{require_member, require_type, CatalogError};
use crate::sema::metadata::{SymbolId, SymbolTable};

const MOCK: &str = "Moq.Mock`1";
const SETUP_FLOW: &str = "Moq.Language.Flow.ISetup`1";

pub struct MoqSymbols {
    pub mock: SymbolId,
    pub mock_setup: SymbolId,
    pub mock_verify: SymbolId,
    pub mock_verify_all: SymbolId,
    pub mock_in_sequence: SymbolId,
    pub mock_object: SymbolId,
    pub setup_returns: SymbolId,
    pub setup_throws: SymbolId,
    pub setup_callback: SymbolId,
    pub setup_verifiable: SymbolId,
    pub mock_sequence: SymbolId,
    pub mock_behavior: SymbolId,
    pub it: SymbolId,
    /// Members invoked directly on the `Mock<T>` wrapper; any other
    /// member access on a mock variable goes through `.Object`.
    pub wrapper_members: HashSet<SymbolId>,
}

impl MoqSymbols {
    pub fn resolve(table: &SymbolTable) -> Result<MoqSymbols, CatalogError> {
        let mock = require_type(table, MOCK)?;
        let mock_setup = require_member(table, mock, MOCK, "Setup")?;
        let mock_verify = require_member(table, mock, MOCK, "Verify")?;
        let mock_verify_all = require_member(table, mock, MOCK, "VerifyAll")?;
        let mock_in_sequence = require_member(table, mock, MOCK, "InSequence")?;
        let mock_object = require_member(table, mock, MOCK, "Object")?;
        let mock_protected = require_member(table, mock, MOCK, "Protected")?;

        let setup = require_type(table, SETUP_FLOW)?;
        let setup_returns = require_member(table, setup, SETUP_FLOW, "Returns")?;
        let setup_throws = require_member(table, setup, SETUP_FLOW, "Throws")?;
        let setup_callback = require_member(table, setup, SETUP_FLOW, "Callback")?;
        let setup_verifiable = require_member(table, setup, SETUP_FLOW, "Verifiable")?;

        let mock_sequence = require_type(table, "Moq.MockSequence")?;
        let mock_behavior = require_type(table, "Moq.MockBehavior")?;
        let it = require_type(table, "Moq.It")?;

        let wrapper_members = [
            mock_setup,
            mock_verify,
            mock_verify_all,
            mock_in_sequence,
            mock_object,
            mock_protected,
        ]
        .into_iter()
        .collect();

        Ok(MoqSymbols {
            mock,
            mock_setup,
            mock_verify,
            mock_verify_all,
            mock_in_sequence,
            mock_object,
            setup_returns,
            setup_throws,
            setup_callback,
            setup_verifiable,
            mock_sequence,
            mock_behavior,
            it,
            wrapper_members,
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
        let moq = MoqSymbols::resolve(&comp.symbols).unwrap();
        assert_eq!(moq.wrapper_members.len(), 6);
    }

    #[test]
    fn test_missing_assembly_is_fatal() {
        let comp = Compilation::new(vec![AssemblyMetadata::system()]);
        assert!(MoqSymbols::resolve(&comp.symbols).is_err());
    }
}
