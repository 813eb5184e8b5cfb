//! Physical Operators Module

mod bound;
pub(crate) mod cursor;
mod merge_append;
mod physical_operator;
mod result;
mod skip;
mod sort;
mod values_scan;

pub use bound::pass_down_bound;
pub use merge_append::MergeAppendOperator;
pub use physical_operator::{
    OperatorKindMut, PhysicalOperator, Row, TupleSlot, exec_pull, rescan_child,
};
pub use result::ResultOperator;
pub use skip::{SkipOperator, SkipState};
pub use sort::SortOperator;
pub use values_scan::ValuesScanOperator;
