//! 플래너 타입 정의
//!
//! 실행기가 소비하는 PhysicalPlan, Expr, SortKey 등의 핵심 타입들을 정의합니다.

use crate::error::{DbxError, DbxResult};
use crate::storage::columnar::ScalarValue;
use arrow::datatypes::{DataType, Schema, SchemaRef};
use smallvec::SmallVec;
use std::cmp::Ordering;

/// Runtime parameter slot, set by upper operators between (re)scans.
pub type ParamId = usize;

/// Set of parameter ids; almost always a handful.
pub type ParamSet = SmallVec<[ParamId; 4]>;

/// 표현식 — 컬럼, 리터럴, 파라미터, 연산자, 함수
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// 입력 튜플의 컬럼 참조 (0-based)
    Column(usize),
    /// 리터럴 값
    Literal(ScalarValue),
    /// 런타임 파라미터
    Param { id: ParamId, data_type: DataType },
    /// 이항 산술 연산
    BinaryOp {
        left: Box<Expr>,
        op: BinaryOperator,
        right: Box<Expr>,
    },
    /// 단항 부호 반전
    Negate(Box<Expr>),
    /// IS NULL
    IsNull(Box<Expr>),
    /// generate_series(start, stop) — set-returning function
    GenerateSeries { start: Box<Expr>, stop: Box<Expr> },
}

/// 이항 연산자
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Plus,
    Minus,
    Multiply,
    Divide,
    Modulo,
}

impl BinaryOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOperator::Plus => "+",
            BinaryOperator::Minus => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Modulo => "%",
        }
    }
}

impl Expr {
    pub fn lit_i64(value: i64) -> Self {
        Expr::Literal(ScalarValue::Int64(value))
    }

    pub fn null() -> Self {
        Expr::Literal(ScalarValue::Null)
    }

    /// Integer-typed parameter reference.
    pub fn param(id: ParamId) -> Self {
        Expr::Param {
            id,
            data_type: DataType::Int64,
        }
    }

    pub fn binary(left: Expr, op: BinaryOperator, right: Expr) -> Self {
        Expr::BinaryOp {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    pub fn generate_series(start: Expr, stop: Expr) -> Self {
        Expr::GenerateSeries {
            start: Box::new(start),
            stop: Box::new(stop),
        }
    }

    /// True if evaluating this expression can yield other than one value per row.
    pub fn returns_set(&self) -> bool {
        match self {
            Expr::GenerateSeries { .. } => true,
            Expr::Column(_) | Expr::Literal(_) | Expr::Param { .. } => false,
            Expr::BinaryOp { left, right, .. } => left.returns_set() || right.returns_set(),
            Expr::Negate(inner) | Expr::IsNull(inner) => inner.returns_set(),
        }
    }

    /// Append every parameter this expression reads to `out`.
    pub fn collect_params(&self, out: &mut ParamSet) {
        match self {
            Expr::Param { id, .. } => {
                if !out.contains(id) {
                    out.push(*id);
                }
            }
            Expr::Column(_) | Expr::Literal(_) => {}
            Expr::BinaryOp { left, right, .. } => {
                left.collect_params(out);
                right.collect_params(out);
            }
            Expr::GenerateSeries { start, stop } => {
                start.collect_params(out);
                stop.collect_params(out);
            }
            Expr::Negate(inner) | Expr::IsNull(inner) => inner.collect_params(out),
        }
    }

    /// Output type of the expression against an optional input schema.
    pub fn data_type(&self, input: Option<&Schema>) -> DbxResult<DataType> {
        match self {
            Expr::Column(idx) => {
                let schema = input.ok_or_else(|| DbxError::Schema(format!(
                    "column reference #{idx} without an input row"
                )))?;
                if *idx >= schema.fields().len() {
                    return Err(DbxError::Schema(format!(
                        "column index {} out of range ({})",
                        idx,
                        schema.fields().len()
                    )));
                }
                Ok(schema.field(*idx).data_type().clone())
            }
            // untyped NULL defaults to Int64
            Expr::Literal(ScalarValue::Null) => Ok(DataType::Int64),
            Expr::Literal(scalar) => Ok(scalar.data_type()),
            Expr::Param { data_type, .. } => Ok(data_type.clone()),
            Expr::BinaryOp { left, right, .. } => {
                let l = left.data_type(input)?;
                let r = right.data_type(input)?;
                match (&l, &r) {
                    (DataType::Float64, _) | (_, DataType::Float64) => Ok(DataType::Float64),
                    (DataType::Int32, DataType::Int32) => Ok(DataType::Int32),
                    (DataType::Int32 | DataType::Int64, DataType::Int32 | DataType::Int64) => {
                        Ok(DataType::Int64)
                    }
                    _ => Err(DbxError::TypeMismatch {
                        expected: "numeric operands".to_string(),
                        actual: format!("{l:?}, {r:?}"),
                    }),
                }
            }
            Expr::Negate(inner) => inner.data_type(input),
            Expr::IsNull(_) => Ok(DataType::Boolean),
            Expr::GenerateSeries { .. } => Ok(DataType::Int64),
        }
    }
}

/// 정렬 키 — 컬럼 인덱스 + 방향 + NULL 위치
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub column: usize,
    pub asc: bool,
    pub nulls_first: bool,
}

impl SortKey {
    pub fn asc(column: usize) -> Self {
        Self {
            column,
            asc: true,
            nulls_first: false,
        }
    }

    pub fn desc(column: usize) -> Self {
        Self {
            column,
            asc: false,
            nulls_first: true,
        }
    }

    fn compare(&self, a: &[ScalarValue], b: &[ScalarValue]) -> Ordering {
        let (x, y) = (&a[self.column], &b[self.column]);
        match (x.is_null(), y.is_null()) {
            (true, true) => Ordering::Equal,
            (true, false) if self.nulls_first => Ordering::Less,
            (true, false) => Ordering::Greater,
            (false, true) if self.nulls_first => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) if self.asc => x.total_cmp(y),
            (false, false) => y.total_cmp(x),
        }
    }
}

/// Lexicographic row comparison over `keys`.
pub fn compare_rows(keys: &[SortKey], a: &[ScalarValue], b: &[ScalarValue]) -> Ordering {
    keys.iter()
        .map(|key| key.compare(a, b))
        .find(|ord| *ord != Ordering::Equal)
        .unwrap_or(Ordering::Equal)
}

// ===== Physical Plan =====

/// 물리 플랜 — 실행 가능한 연산자 트리
#[derive(Debug, Clone, PartialEq)]
pub enum PhysicalPlan {
    /// 선행 K개 튜플 건너뛰기 (OFFSET)
    Skip {
        input: Box<PhysicalPlan>,
        skip: Option<Expr>,
    },
    /// ORDER BY
    Sort {
        input: Box<PhysicalPlan>,
        order_by: Vec<SortKey>,
    },
    /// 정렬된 입력들의 병합
    MergeAppend {
        inputs: Vec<PhysicalPlan>,
        order_by: Vec<SortKey>,
    },
    /// Projection (빈 리스트면 identity pass-through), 입력 없으면 상수 한 행
    Result {
        input: Option<Box<PhysicalPlan>>,
        projection: Vec<(Expr, Option<String>)>,
    },
    /// 리터럴/파라미터 행 스캔
    Values {
        schema: SchemaRef,
        rows: Vec<Vec<Expr>>,
    },
}

impl PhysicalPlan {
    pub fn name(&self) -> &'static str {
        match self {
            PhysicalPlan::Skip { .. } => "Skip",
            PhysicalPlan::Sort { .. } => "Sort",
            PhysicalPlan::MergeAppend { .. } => "MergeAppend",
            PhysicalPlan::Result { .. } => "Result",
            PhysicalPlan::Values { .. } => "Values",
        }
    }
}
