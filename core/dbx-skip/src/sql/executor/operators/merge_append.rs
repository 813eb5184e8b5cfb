//! MergeAppend Operator — k-way merge of pre-sorted inputs

use crate::error::{DbxError, DbxResult};
use crate::sql::executor::operators::{
    OperatorKindMut, PhysicalOperator, TupleSlot, exec_pull, rescan_child,
};
use crate::sql::executor::state::ExecutorState;
use crate::sql::planner::{ParamId, SortKey, compare_rows};
use arrow::datatypes::Schema;
use smallvec::SmallVec;
use std::cmp::Ordering;

/// MergeAppend 연산자 — 각 입력이 이미 `order_by` 순서로 정렬되어 있어야 함
///
/// Forward scans only. Ties go to the earlier input.
pub struct MergeAppendOperator {
    inputs: SmallVec<[Box<dyn PhysicalOperator>; 4]>,
    order_by: Vec<SortKey>,
    /// Next tuple of each input; filled on the first pull of a scan
    heads: Vec<Option<TupleSlot>>,
    initialized: bool,
    pending: bool,
}

impl MergeAppendOperator {
    pub fn new(inputs: Vec<Box<dyn PhysicalOperator>>, order_by: Vec<SortKey>) -> DbxResult<Self> {
        let Some(first) = inputs.first() else {
            return Err(DbxError::InvalidOperation {
                message: "merge append needs at least one input".into(),
                context: "MergeAppendOperator::new".into(),
            });
        };
        let width = first.schema().fields().len();
        if let Some(bad) = inputs
            .iter()
            .position(|input| input.schema().fields().len() != width)
        {
            return Err(DbxError::Schema(format!(
                "merge input {bad} has {} columns, expected {width}",
                inputs[bad].schema().fields().len()
            )));
        }

        let heads = vec![None; inputs.len()];
        Ok(Self {
            inputs: inputs.into_iter().collect(),
            order_by,
            heads,
            initialized: false,
            pending: false,
        })
    }

    /// Merge inputs, for walking the tree below.
    pub fn inputs_mut(&mut self) -> impl Iterator<Item = &mut Box<dyn PhysicalOperator>> {
        self.inputs.iter_mut()
    }

    /// Index of the input holding the smallest head.
    fn smallest_head(&self) -> Option<usize> {
        let mut best: Option<(usize, &TupleSlot)> = None;
        for (idx, head) in self.heads.iter().enumerate() {
            let Some(head) = head else { continue };
            best = match best {
                Some((_, current)) if compare_rows(&self.order_by, head, current) != Ordering::Less => best,
                _ => Some((idx, head)),
            };
        }
        best.map(|(idx, _)| idx)
    }
}

impl PhysicalOperator for MergeAppendOperator {
    fn name(&self) -> &'static str {
        "MergeAppend"
    }

    fn schema(&self) -> &Schema {
        self.inputs[0].schema()
    }

    fn next(&mut self, estate: &ExecutorState) -> DbxResult<Option<TupleSlot>> {
        if !estate.direction().is_forward() {
            return Err(DbxError::InvalidOperation {
                message: "merge append cannot scan backward".into(),
                context: "MergeAppendOperator::next".into(),
            });
        }

        if !self.initialized {
            for (input, head) in self.inputs.iter_mut().zip(self.heads.iter_mut()) {
                *head = exec_pull(input.as_mut(), estate)?;
            }
            self.initialized = true;
        }

        let Some(idx) = self.smallest_head() else {
            return Ok(None);
        };
        let refill = exec_pull(self.inputs[idx].as_mut(), estate)?;
        Ok(std::mem::replace(&mut self.heads[idx], refill))
    }

    fn rescan(&mut self, estate: &ExecutorState) -> DbxResult<()> {
        self.heads.iter_mut().for_each(|head| *head = None);
        self.initialized = false;
        self.pending = false;
        for input in self.inputs.iter_mut() {
            rescan_child(input.as_mut(), estate)?;
        }
        Ok(())
    }

    fn shutdown(&mut self) -> DbxResult<()> {
        self.heads.clear();
        for input in self.inputs.iter_mut() {
            input.shutdown()?;
        }
        Ok(())
    }

    fn notify_param_change(&mut self, changed: &[ParamId]) {
        for input in self.inputs.iter_mut() {
            input.notify_param_change(changed);
            self.pending |= input.has_pending_rescan();
        }
    }

    fn has_pending_rescan(&self) -> bool {
        self.pending
    }

    fn as_kind_mut(&mut self) -> OperatorKindMut<'_> {
        OperatorKindMut::MergeAppend(self)
    }
}
