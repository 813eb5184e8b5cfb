//! Sort Operator — ORDER BY clause handling, with optional top-N bound

use crate::error::DbxResult;
use crate::sql::executor::operators::cursor::Cursor;
use crate::sql::executor::operators::{
    OperatorKindMut, PhysicalOperator, TupleSlot, exec_pull, rescan_child,
};
use crate::sql::executor::state::{ExecutorState, ScanDirection};
use crate::sql::planner::{ParamId, SortKey, compare_rows};
use arrow::datatypes::Schema;
use rayon::prelude::*;
use std::borrow::Cow;
use tracing::debug;

/// Sort 연산자 (ORDER BY) — 입력 전체를 모은 뒤 정렬, 양방향 스캔 지원
///
/// A parent may set a bound hint (see `pass_down_bound`): only the first
/// `bound` rows of the sorted output will be read, so the sort keeps just
/// those. The hint is read when sorting starts and lasts for one scan: a
/// rescan drops it unless it was set again since the sort last started.
pub struct SortOperator {
    input: Box<dyn PhysicalOperator>,
    order_by: Vec<SortKey>,
    bounded: bool,
    bound: i64,
    /// `set_bound` called since the last rescan or sort start
    hint_fresh: bool,
    /// Hint in effect when `sorted` was produced
    bounded_done: bool,
    bound_done: i64,
    /// Inputs at or below this many rows are fully sorted even when bounded
    bound_threshold: usize,
    /// Materialized sorted result (sort requires all data)
    sorted: Option<Vec<TupleSlot>>,
    cursor: Cursor,
    pending: bool,
}

impl SortOperator {
    pub fn new(input: Box<dyn PhysicalOperator>, order_by: Vec<SortKey>) -> Self {
        Self {
            input,
            order_by,
            bounded: false,
            bound: 0,
            hint_fresh: false,
            bounded_done: false,
            bound_done: 0,
            bound_threshold: 0,
            sorted: None,
            cursor: Cursor::new(),
            pending: false,
        }
    }

    pub fn with_bound_threshold(mut self, threshold: usize) -> Self {
        self.bound_threshold = threshold;
        self
    }

    /// Set or clear the row-count hint. `None` means every row is needed.
    pub fn set_bound(&mut self, bound: Option<i64>) {
        self.hint_fresh = true;
        match bound {
            Some(bound) => {
                self.bounded = true;
                self.bound = bound;
            }
            None => self.bounded = false,
        }
    }

    /// Current hint.
    pub fn bound(&self) -> Option<i64> {
        self.bounded.then_some(self.bound)
    }

    /// Hint the current sorted result was produced with, if sorted.
    pub fn bound_used(&self) -> Option<Option<i64>> {
        self.sorted
            .as_ref()
            .map(|_| self.bounded_done.then_some(self.bound_done))
    }

    /// Rows currently held by the sort.
    pub fn sorted_len(&self) -> Option<usize> {
        self.sorted.as_ref().map(Vec::len)
    }

    /// Read the whole input forward and sort it.
    fn materialize(&mut self, estate: &ExecutorState) -> DbxResult<()> {
        let estate: Cow<'_, ExecutorState> = if estate.direction().is_forward() {
            Cow::Borrowed(estate)
        } else {
            let mut forward = estate.clone();
            forward.set_direction(ScanDirection::Forward);
            Cow::Owned(forward)
        };

        let mut rows: Vec<(usize, TupleSlot)> = Vec::new();
        while let Some(slot) = exec_pull(self.input.as_mut(), &estate)? {
            rows.push((rows.len(), slot));
        }

        // input order breaks ties, so bounded and full sorts agree on the prefix
        let keys = self.order_by.as_slice();
        let cmp = |a: &(usize, TupleSlot), b: &(usize, TupleSlot)| {
            compare_rows(keys, &a.1, &b.1).then(a.0.cmp(&b.0))
        };

        let input_rows = rows.len();
        let limit = usize::try_from(self.bound).unwrap_or(usize::MAX);
        if self.bounded && input_rows > self.bound_threshold && limit < input_rows {
            if limit > 0 {
                rows.select_nth_unstable_by(limit - 1, cmp);
            }
            rows.truncate(limit);
            rows.sort_unstable_by(cmp);
        } else {
            rows.par_sort_unstable_by(cmp);
        }

        debug!(
            target: "executor",
            input_rows,
            kept = rows.len(),
            bound = ?self.bound(),
            "sort complete"
        );

        self.hint_fresh = false;
        self.bounded_done = self.bounded;
        self.bound_done = self.bound;
        self.sorted = Some(rows.into_iter().map(|(_, slot)| slot).collect());
        self.cursor.rewind();
        Ok(())
    }
}

impl PhysicalOperator for SortOperator {
    fn name(&self) -> &'static str {
        "Sort"
    }

    fn schema(&self) -> &Schema {
        self.input.schema()
    }

    fn next(&mut self, estate: &ExecutorState) -> DbxResult<Option<TupleSlot>> {
        if self.sorted.is_none() {
            self.materialize(estate)?;
        }
        let rows = self.sorted.as_deref().unwrap_or_default();
        Ok(self.cursor.step(rows, estate.direction().is_forward()))
    }

    fn rescan(&mut self, estate: &ExecutorState) -> DbxResult<()> {
        self.pending = false;

        if !std::mem::take(&mut self.hint_fresh) {
            self.bounded = false;
        }

        // Not sorted yet: the input has not been read, nothing to reset.
        if self.sorted.is_none() {
            return Ok(());
        }

        let hint_changed = self.bounded != self.bounded_done
            || (self.bounded && self.bound != self.bound_done);
        if self.input.has_pending_rescan() || hint_changed {
            self.sorted = None;
            rescan_child(self.input.as_mut(), estate)
        } else {
            self.cursor.rewind();
            Ok(())
        }
    }

    fn shutdown(&mut self) -> DbxResult<()> {
        self.sorted = None;
        self.input.shutdown()
    }

    fn notify_param_change(&mut self, changed: &[ParamId]) {
        self.input.notify_param_change(changed);
        self.pending |= self.input.has_pending_rescan();
    }

    fn has_pending_rescan(&self) -> bool {
        self.pending
    }

    fn as_kind_mut(&mut self) -> OperatorKindMut<'_> {
        OperatorKindMut::Sort(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::executor::operators::ValuesScanOperator;
    use crate::storage::columnar::ScalarValue;

    fn sort_of(values: &[i64]) -> SortOperator {
        SortOperator::new(
            Box::new(ValuesScanOperator::from_i64s("v", values)),
            vec![SortKey::asc(0)],
        )
    }

    fn drain(op: &mut SortOperator, estate: &ExecutorState) -> Vec<i64> {
        let mut out = Vec::new();
        while let Some(slot) = op.next(estate).unwrap() {
            match slot[0] {
                ScalarValue::Int64(v) => out.push(v),
                _ => unreachable!(),
            }
        }
        out
    }

    #[test]
    fn sorts_ascending() {
        let mut sort = sort_of(&[3, 1, 2]);
        let estate = ExecutorState::default();
        assert_eq!(drain(&mut sort, &estate), vec![1, 2, 3]);
        assert_eq!(sort.bound_used(), Some(None));
    }

    #[test]
    fn bounded_sort_keeps_prefix() {
        let mut sort = sort_of(&[5, 4, 3, 2, 1]);
        sort.set_bound(Some(2));
        let estate = ExecutorState::default();
        assert_eq!(drain(&mut sort, &estate), vec![1, 2]);
        assert_eq!(sort.bound_used(), Some(Some(2)));
        assert_eq!(sort.sorted_len(), Some(2));
    }

    #[test]
    fn bounded_sort_below_threshold_sorts_everything() {
        let mut sort = sort_of(&[5, 4, 3]).with_bound_threshold(10);
        sort.set_bound(Some(1));
        let estate = ExecutorState::default();
        assert_eq!(drain(&mut sort, &estate), vec![3, 4, 5]);
    }

    #[test]
    fn rescan_with_changed_hint_resorts() {
        let mut sort = sort_of(&[3, 1, 2]);
        let estate = ExecutorState::default();
        sort.set_bound(Some(1));
        assert_eq!(drain(&mut sort, &estate), vec![1]);

        sort.set_bound(None);
        sort.rescan(&estate).unwrap();
        assert_eq!(sort.bound_used(), None);
        assert_eq!(drain(&mut sort, &estate), vec![1, 2, 3]);
    }

    #[test]
    fn rescan_with_same_hint_rewinds() {
        let mut sort = sort_of(&[2, 1]);
        let estate = ExecutorState::default();
        assert_eq!(drain(&mut sort, &estate), vec![1, 2]);
        sort.rescan(&estate).unwrap();
        assert_eq!(sort.bound_used(), Some(None));
        assert_eq!(drain(&mut sort, &estate), vec![1, 2]);
    }

    #[test]
    fn rescan_without_new_hint_drops_old_one() {
        let mut sort = sort_of(&[3, 1, 2]);
        let estate = ExecutorState::default();
        sort.set_bound(Some(1));
        assert_eq!(drain(&mut sort, &estate), vec![1]);

        sort.rescan(&estate).unwrap();
        assert_eq!(sort.bound(), None);
        assert_eq!(drain(&mut sort, &estate), vec![1, 2, 3]);
    }

    #[test]
    fn hint_set_before_rescan_survives_it() {
        let mut sort = sort_of(&[3, 1, 2]);
        let estate = ExecutorState::default();
        assert_eq!(drain(&mut sort, &estate), vec![1, 2, 3]);

        sort.set_bound(Some(2));
        sort.rescan(&estate).unwrap();
        assert_eq!(sort.bound(), Some(2));
        assert_eq!(drain(&mut sort, &estate), vec![1, 2]);

        // a second rescan with nothing set in between forgets it
        sort.rescan(&estate).unwrap();
        assert_eq!(drain(&mut sort, &estate), vec![1, 2, 3]);
    }

    #[test]
    fn backward_first_pull_still_reads_input_forward() {
        let mut sort = sort_of(&[2, 1]);
        let mut estate = ExecutorState::default();
        estate.set_direction(ScanDirection::Backward);
        assert!(sort.next(&estate).unwrap().is_none());
        estate.set_direction(ScanDirection::Forward);
        assert_eq!(drain(&mut sort, &estate), vec![1, 2]);
    }
}
