//! Semantic layer: assembly metadata and per-file name binding.

pub mod metadata;
pub mod model;

pub use metadata::{Compilation, ReturnShape, SymbolId};
pub use model::SemanticModel;
