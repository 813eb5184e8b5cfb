//! Bound hint propagation — tell sorts below a Skip how many rows are read

use crate::sql::executor::operators::{OperatorKindMut, PhysicalOperator};
use tracing::debug;

/// Pass the row bound of a Skip node down to `child`.
///
/// A Sort gets `count + skip` as its hint, or has its hint cleared when
/// there is no count or the sum does not fit. MergeAppend forwards to every
/// input, since it never reads more from one input than it emits. Result
/// forwards only while its projection keeps one output row per input row.
/// Anything else ends the walk.
pub fn pass_down_bound(child: &mut dyn PhysicalOperator, skip: i64, count: Option<i64>) {
    match child.as_kind_mut() {
        OperatorKindMut::Sort(sort) => {
            let needed = count
                .and_then(|count| count.checked_add(skip))
                .filter(|needed| *needed >= 0);
            debug!(target: "executor", skip, ?count, ?needed, "bound hint reached sort");
            sort.set_bound(needed);
        }
        OperatorKindMut::MergeAppend(merge) => {
            for input in merge.inputs_mut() {
                pass_down_bound(input.as_mut(), skip, count);
            }
        }
        OperatorKindMut::Result(result) => {
            // a filter qual on Result would also have to stop the walk here
            if result.projection_returns_set() {
                return;
            }
            if let Some(input) = result.input_mut() {
                pass_down_bound(input, skip, count);
            }
        }
        OperatorKindMut::Other => {}
    }
}
