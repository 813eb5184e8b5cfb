//! SQL Query Executor Module

use crate::error::DbxResult;
use crate::sql::planner::PhysicalPlan;
use crate::storage::columnar::ColumnarStore;
use arrow::array::RecordBatch;
use std::borrow::Cow;
use std::sync::Arc;
use tracing::debug;

pub mod expr;
pub mod operators;
pub mod state;

pub use expr::ExprContext;
pub use operators::{
    MergeAppendOperator, OperatorKindMut, PhysicalOperator, ResultOperator, Row, SkipOperator,
    SkipState, SortOperator, TupleSlot, ValuesScanOperator, exec_pull, pass_down_bound,
    rescan_child,
};
pub use state::{ExecutorState, InitFlags, ScanDirection};

use state::check_unsupported_flags;

/// 물리 플랜으로부터 연산자 트리 생성
///
/// Children are built first. `flags` travel down unchanged except below a
/// Sort, which materialises its input and needs nothing extra from it.
pub fn init_node(
    plan: &PhysicalPlan,
    estate: &ExecutorState,
    flags: InitFlags,
) -> DbxResult<Box<dyn PhysicalOperator>> {
    let op: Box<dyn PhysicalOperator> = match plan {
        PhysicalPlan::Skip { input, skip } => {
            check_unsupported_flags("Skip", flags, InitFlags::MARK)?;
            let child = init_node(input, estate, flags)?;
            Box::new(SkipOperator::new(child, skip.clone(), estate, flags)?)
        }
        PhysicalPlan::Sort { input, order_by } => {
            let child_flags =
                flags.without(InitFlags::REWIND | InitFlags::BACKWARD | InitFlags::MARK);
            let child = init_node(input, estate, child_flags)?;
            Box::new(
                SortOperator::new(child, order_by.clone())
                    .with_bound_threshold(estate.config().sort_bound_threshold),
            )
        }
        PhysicalPlan::MergeAppend { inputs, order_by } => {
            check_unsupported_flags("MergeAppend", flags, InitFlags::BACKWARD | InitFlags::MARK)?;
            let children = inputs
                .iter()
                .map(|input| init_node(input, estate, flags))
                .collect::<DbxResult<Vec<_>>>()?;
            Box::new(MergeAppendOperator::new(children, order_by.clone())?)
        }
        PhysicalPlan::Result { input, projection } => {
            check_unsupported_flags("Result", flags, InitFlags::MARK)?;
            let child = input
                .as_deref()
                .map(|input| init_node(input, estate, flags))
                .transpose()?;
            Box::new(ResultOperator::new(child, projection.clone())?)
        }
        PhysicalPlan::Values { schema, rows } => {
            Box::new(ValuesScanOperator::new(Arc::clone(schema), rows.clone())?)
        }
    };

    debug!(target: "executor", node = op.name(), flags = ?flags, "operator initialised");
    Ok(op)
}

/// Drain `op` forward into a single RecordBatch.
pub fn collect_batch(op: &mut dyn PhysicalOperator, estate: &ExecutorState) -> DbxResult<RecordBatch> {
    let estate: Cow<'_, ExecutorState> = if estate.direction().is_forward() {
        Cow::Borrowed(estate)
    } else {
        let mut forward = estate.clone();
        forward.set_direction(ScanDirection::Forward);
        Cow::Owned(forward)
    };

    let mut store = ColumnarStore::new(Arc::new(op.schema().clone()));
    while let Some(slot) = exec_pull(op, &estate)? {
        store.append_row(&slot)?;
    }
    debug!(target: "executor", node = op.name(), rows = store.row_count(), "collected batch");
    store.to_record_batch()
}
