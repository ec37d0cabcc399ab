//! Resolved symbol catalogs.
//!
//! Every pass works in terms of [`SymbolId`]s resolved here once per run,
//! never in terms of name strings. Resolution is eager, so a missing
//! assembly surfaces as one fatal [`CatalogError`] before any file is
//! touched instead of as a silent non-match deep inside a pass. Fatality
//! is reserved for types and the individually named members the passes
//! emit or pivot on; set-valued member groups skip what the table does
//! not have, so `contains` checks degrade to non-matches.

mod moq;
mod rhino;

pub use moq::MoqSymbols;
pub use rhino::RhinoSymbols;

use std::collections::HashSet;

use thiserror::Error;

use crate::sema::metadata::{SymbolId, SymbolTable};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("required type `{0}` is not present in the referenced assemblies")]
    MissingType(&'static str),
    #[error("required member `{type_name}.{member}` is not present in the referenced assemblies")]
    MissingMember {
        type_name: &'static str,
        member: &'static str,
    },
    #[error("required extension method `{0}` is not present in the referenced assemblies")]
    MissingExtension(&'static str),
}

pub(crate) fn require_type(
    table: &SymbolTable,
    full_name: &'static str,
) -> Result<SymbolId, CatalogError> {
    table
        .type_named(full_name)
        .ok_or(CatalogError::MissingType(full_name))
}

pub(crate) fn require_member(
    table: &SymbolTable,
    owner: SymbolId,
    type_name: &'static str,
    member: &'static str,
) -> Result<SymbolId, CatalogError> {
    table
        .member(owner, member)
        .ok_or(CatalogError::MissingMember { type_name, member })
}

pub(crate) fn require_extension(
    table: &SymbolTable,
    name: &'static str,
) -> Result<SymbolId, CatalogError> {
    table
        .extension(name)
        .ok_or(CatalogError::MissingExtension(name))
}

/// Lookup for set-valued member groups: members the table does not have
/// contribute nothing.
pub(crate) fn member_group(
    table: &SymbolTable,
    owner: SymbolId,
    names: &[&str],
) -> HashSet<SymbolId> {
    names.iter().filter_map(|n| table.member(owner, n)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sema::metadata::ReturnShape;

    #[test]
    fn test_member_groups_skip_missing_members() {
        let mut table = SymbolTable::new();
        let owner = table.add_type("Fake", "Thing");
        let present = table.add_method(owner, "Here", ReturnShape::Void);
        let group = member_group(&table, owner, &["Here", "Missing"]);
        assert_eq!(group.len(), 1);
        assert!(group.contains(&present));
    }
}
