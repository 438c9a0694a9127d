//! Crate root: lightweight module orchestration and public re-exports.
//!
//! Modules:
//! - `taxon`: gene-suffix normalization of leaf labels.
//! - `newick`: statement lexing and shape checks ahead of `phylotree`.
//! - `tree`: editable arena tree built from `phylotree` parses.
//! - `prune`: deduplication, shared-taxon resolution and pruning.
//! - `io`: discovering, reading and writing Newick tree files.
//! - `pipeline`: batch run over a set of tree files.
//! - `error`: error types.
//! - `api`: Python bindings via `pyo3` (gated behind "python" feature).

pub mod error;
pub mod io;
mod newick;
pub mod pipeline;
pub mod prune;
pub mod taxon;
pub mod tree;

#[cfg(feature = "python")]
pub mod api;

// Re-export frequently used types & functions
pub use error::{PruneError, TreeError};
pub use pipeline::{PruneConfig, RunReport, run};
pub use prune::{deduplicate, prune, shared_taxa};
pub use taxon::{Normalizer, normalize};
pub use tree::GeneTree;
