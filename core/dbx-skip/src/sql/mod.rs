// SQL 모듈 진입점
pub mod executor;
pub mod planner;

pub use executor::{
    ExecutorState, InitFlags, MergeAppendOperator, OperatorKindMut, PhysicalOperator,
    ResultOperator, ScanDirection, SkipOperator, SkipState, SortOperator, TupleSlot,
    ValuesScanOperator, collect_batch, exec_pull, init_node, pass_down_bound,
};
pub use planner::{BinaryOperator, Expr, ParamId, PhysicalPlan, SortKey};
