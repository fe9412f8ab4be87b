//! Reshaping module.
//!
//! - Normalize: item list to rectangular table
//! - Pivot: grouped cross-tabulation with flattened column labels
//! - Change: period-over-period differences of a pivot
//! - Pipeline: all of the above into an export bundle

pub mod change;
pub mod normalize;
pub mod pipeline;
pub mod pivot;

pub use change::derive_change;
pub use normalize::to_table;
pub use pipeline::{build_table_view, reshape, reshape_document, TableView};
pub use pivot::{build_default_pivot, build_pivot, default_pivot_spec, normalize_period_label};
