//! # DBX Skip — Bounded-Skip Pull Operator
//!
//! DBX 실행기의 OFFSET 연산자입니다. Volcano(pull) 모델 위에서 자식 플랜의 선행
//! K개 튜플을 건너뛰고 나머지를 전달하며, 정방향/역방향 스캔과 재스캔을 지원합니다.
//!
//! ## 주요 특징
//!
//! - **양방향 스캔**: 스캔 방향은 매 pull마다 [`ExecutorState`]에서 읽음
//! - **재스캔**: 파라미터가 바뀌면 K를 다시 계산
//! - **Bound hint 전파**: 아래쪽 Sort에 필요한 행 수를 알려 top-N 정렬 유도
//! - **Apache Arrow 출력**: [`collect_batch`]로 결과를 `RecordBatch`로 수집
//!
//! ## 빠른 시작
//!
//! ```rust
//! use dbx_skip::{
//!     ExecutorState, Expr, InitFlags, PhysicalOperator, PhysicalPlan, SortKey, collect_batch,
//!     init_node,
//! };
//! use arrow::datatypes::{DataType, Field, Schema};
//! use std::sync::Arc;
//!
//! # fn main() -> dbx_skip::DbxResult<()> {
//! let schema = Arc::new(Schema::new(vec![Field::new("v", DataType::Int64, false)]));
//! let values = PhysicalPlan::Values {
//!     schema,
//!     rows: [4, 2, 5, 1, 3].iter().map(|v| vec![Expr::lit_i64(*v)]).collect(),
//! };
//!
//! // SELECT v FROM values ORDER BY v OFFSET 2
//! let plan = PhysicalPlan::Skip {
//!     input: Box::new(PhysicalPlan::Sort {
//!         input: Box::new(values),
//!         order_by: vec![SortKey::asc(0)],
//!     }),
//!     skip: Some(Expr::lit_i64(2)),
//! };
//!
//! let estate = ExecutorState::default();
//! let mut op = init_node(&plan, &estate, InitFlags::REWIND | InitFlags::BACKWARD)?;
//! let batch = collect_batch(op.as_mut(), &estate)?;
//! assert_eq!(batch.num_rows(), 3);
//! op.shutdown()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## 실행 파이프라인
//!
//! ```text
//! PhysicalPlan → init_node → 연산자 트리 → next()/rescan() → shutdown()
//! ```
//!
//! ## 모듈 구조
//!
//! - [`sql`] — 물리 플랜, 연산자(Skip, Sort, MergeAppend, Result, Values)
//! - [`storage`] — 스칼라 값과 Arrow 컬럼 빌더
//! - [`config`] — 실행기 설정
//! - [`error`] — 오류 타입

pub mod config;
pub mod error;
pub mod sql;
pub mod storage;

// Logging utilities
pub mod logging;

// Re-export commonly used types
pub use config::ExecutorConfig;
pub use error::{DbxError, DbxResult};
pub use sql::executor::{
    ExecutorState, InitFlags, MergeAppendOperator, OperatorKindMut, PhysicalOperator,
    ResultOperator, ScanDirection, SkipOperator, SkipState, SortOperator, TupleSlot,
    ValuesScanOperator, collect_batch, exec_pull, init_node, pass_down_bound,
};
pub use sql::planner::{BinaryOperator, Expr, ParamId, PhysicalPlan, SortKey};
pub use storage::ScalarValue;
