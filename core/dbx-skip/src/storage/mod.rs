//! Storage module — value representation shared by all operators.

pub mod columnar;

pub use columnar::{ColumnarStore, ScalarValue};
