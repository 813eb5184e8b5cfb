//! Physical Operator Trait — Volcano Execution Model (tuple at a time)

use crate::error::DbxResult;
use crate::sql::executor::operators::{MergeAppendOperator, ResultOperator, SortOperator};
use crate::sql::executor::state::ExecutorState;
use crate::sql::planner::ParamId;
use crate::storage::columnar::ScalarValue;
use arrow::datatypes::Schema;
use std::sync::Arc;

/// 한 행
pub type Row = Vec<ScalarValue>;

/// Shared handle to a tuple produced by an operator. Parents may keep it
/// across their own calls; the producing child never mutates it.
pub type TupleSlot = Arc<Row>;

/// 물리 연산자 트레이트 — Volcano 실행 모델 (Pull 기반)
pub trait PhysicalOperator: Send {
    /// Node name for logging and errors.
    fn name(&self) -> &'static str;

    /// 출력 스키마 반환
    fn schema(&self) -> &Schema;

    /// 다음 튜플 반환 (None이면 현재 방향의 끝)
    ///
    /// The direction is read from `estate` on every call and may change
    /// between calls. Parents call this through [`exec_pull`].
    fn next(&mut self, estate: &ExecutorState) -> DbxResult<Option<TupleSlot>>;

    /// 처음부터 다시 스캔하도록 상태 초기화
    fn rescan(&mut self, estate: &ExecutorState) -> DbxResult<()>;

    /// Release resources and shut down children. Called once.
    fn shutdown(&mut self) -> DbxResult<()>;

    /// Runtime parameters changed. Operators whose subtree reads any of them
    /// must rescan before producing their next tuple.
    fn notify_param_change(&mut self, changed: &[ParamId]);

    /// True when a parameter change is pending and the next pull will rescan.
    fn has_pending_rescan(&self) -> bool;

    /// Concrete kind, for the few places that need to look inside a child.
    fn as_kind_mut(&mut self) -> OperatorKindMut<'_> {
        OperatorKindMut::Other
    }
}

/// Mutable view of an operator's concrete kind.
pub enum OperatorKindMut<'a> {
    Sort(&'a mut SortOperator),
    MergeAppend(&'a mut MergeAppendOperator),
    Result(&'a mut ResultOperator),
    Other,
}

/// Pull one tuple from `child`, first running a rescan deferred by a
/// pending parameter change.
pub fn exec_pull(
    child: &mut dyn PhysicalOperator,
    estate: &ExecutorState,
) -> DbxResult<Option<TupleSlot>> {
    if child.has_pending_rescan() {
        child.rescan(estate)?;
    }
    child.next(estate)
}

/// Rescan `child` unless a pending parameter change will make it rescan
/// itself on its next pull.
pub fn rescan_child(child: &mut dyn PhysicalOperator, estate: &ExecutorState) -> DbxResult<()> {
    if child.has_pending_rescan() {
        return Ok(());
    }
    child.rescan(estate)
}
