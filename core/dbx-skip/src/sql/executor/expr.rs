//! Expression Evaluation — one row at a time, inside a per-operator context

use crate::error::{DbxError, DbxResult};
use crate::sql::executor::state::ExecutorState;
use crate::sql::planner::{BinaryOperator, Expr};
use crate::storage::columnar::ScalarValue;

/// Per-operator expression context.
///
/// Owned by the operator that registered it and released on shutdown;
/// evaluating through a released context is an error.
#[derive(Debug)]
pub struct ExprContext {
    owner: &'static str,
    evaluations: u64,
}

impl ExprContext {
    pub fn new(owner: &'static str) -> Self {
        Self {
            owner,
            evaluations: 0,
        }
    }

    pub fn owner(&self) -> &'static str {
        self.owner
    }

    /// Number of top-level evaluations run in this context.
    pub fn evaluations(&self) -> u64 {
        self.evaluations
    }

    /// Evaluate a single-valued expression.
    pub fn evaluate(
        &mut self,
        expr: &Expr,
        row: Option<&[ScalarValue]>,
        estate: &ExecutorState,
    ) -> DbxResult<ScalarValue> {
        if expr.returns_set() {
            return Err(DbxError::SqlExecution {
                message: "set-valued expression used where a single value is required".into(),
                context: self.owner.to_string(),
            });
        }
        self.evaluations += 1;
        eval_scalar(expr, row, estate)
    }

    /// Evaluate an expression that may return a set. Single-valued
    /// expressions yield exactly one element.
    pub fn evaluate_set(
        &mut self,
        expr: &Expr,
        row: Option<&[ScalarValue]>,
        estate: &ExecutorState,
    ) -> DbxResult<Vec<ScalarValue>> {
        self.evaluations += 1;
        eval_set(expr, row, estate)
    }
}

fn eval_scalar(
    expr: &Expr,
    row: Option<&[ScalarValue]>,
    estate: &ExecutorState,
) -> DbxResult<ScalarValue> {
    match expr {
        Expr::Column(idx) => {
            let row = row.ok_or_else(|| DbxError::SqlExecution {
                message: format!("column reference #{idx} without an input row"),
                context: "eval_scalar".to_string(),
            })?;
            row.get(*idx).cloned().ok_or_else(|| DbxError::SqlExecution {
                message: format!("column index {} out of range ({})", idx, row.len()),
                context: "eval_scalar".to_string(),
            })
        }
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Param { id, .. } => estate.param(*id).cloned(),
        Expr::BinaryOp { left, op, right } => {
            let l = eval_scalar(left, row, estate)?;
            let r = eval_scalar(right, row, estate)?;
            eval_binary(&l, *op, &r)
        }
        Expr::Negate(inner) => negate(eval_scalar(inner, row, estate)?),
        Expr::IsNull(inner) => Ok(ScalarValue::Boolean(
            eval_scalar(inner, row, estate)?.is_null(),
        )),
        Expr::GenerateSeries { .. } => Err(DbxError::SqlExecution {
            message: "generate_series called in a scalar context".into(),
            context: "eval_scalar".to_string(),
        }),
    }
}

fn eval_set(
    expr: &Expr,
    row: Option<&[ScalarValue]>,
    estate: &ExecutorState,
) -> DbxResult<Vec<ScalarValue>> {
    if !expr.returns_set() {
        return Ok(vec![eval_scalar(expr, row, estate)?]);
    }
    match expr {
        Expr::GenerateSeries { start, stop } => {
            let start = eval_scalar(start, row, estate)?.as_i64()?;
            let stop = eval_scalar(stop, row, estate)?.as_i64()?;
            match (start, stop) {
                (Some(start), Some(stop)) => Ok((start..=stop).map(ScalarValue::Int64).collect()),
                // NULL bounds produce no rows
                _ => Ok(Vec::new()),
            }
        }
        Expr::BinaryOp { left, op, right } => {
            let l = eval_set(left, row, estate)?;
            let r = eval_set(right, row, estate)?;
            let len = match (left.returns_set(), right.returns_set()) {
                (true, false) => l.len(),
                (false, true) => r.len(),
                _ => l.len().max(r.len()),
            };
            (0..len)
                .map(|i| {
                    let lv = pick(&l, i, left.returns_set());
                    let rv = pick(&r, i, right.returns_set());
                    eval_binary(lv, *op, rv)
                })
                .collect()
        }
        Expr::Negate(inner) => eval_set(inner, row, estate)?
            .into_iter()
            .map(negate)
            .collect(),
        Expr::IsNull(inner) => Ok(eval_set(inner, row, estate)?
            .into_iter()
            .map(|v| ScalarValue::Boolean(v.is_null()))
            .collect()),
        Expr::Column(_) | Expr::Literal(_) | Expr::Param { .. } => {
            Ok(vec![eval_scalar(expr, row, estate)?])
        }
    }
}

static NULL: ScalarValue = ScalarValue::Null;

/// Element `i` of a lock-step set; single values broadcast, short sets pad with NULL.
fn pick(values: &[ScalarValue], i: usize, is_set: bool) -> &ScalarValue {
    if is_set {
        values.get(i).unwrap_or(&NULL)
    } else {
        values.first().unwrap_or(&NULL)
    }
}

fn negate(value: ScalarValue) -> DbxResult<ScalarValue> {
    match value {
        ScalarValue::Null => Ok(ScalarValue::Null),
        ScalarValue::Int32(v) => v.checked_neg().map(ScalarValue::Int32).ok_or_else(out_of_range),
        ScalarValue::Int64(v) => v.checked_neg().map(ScalarValue::Int64).ok_or_else(out_of_range),
        ScalarValue::Float64(v) => Ok(ScalarValue::Float64(-v)),
        other => Err(DbxError::TypeMismatch {
            expected: "numeric".to_string(),
            actual: format!("{:?}", other.data_type()),
        }),
    }
}

fn out_of_range() -> DbxError {
    DbxError::SqlExecution {
        message: "integer out of range".into(),
        context: "arithmetic".into(),
    }
}

/// Evaluate a binary arithmetic operation on two scalars.
fn eval_binary(l: &ScalarValue, op: BinaryOperator, r: &ScalarValue) -> DbxResult<ScalarValue> {
    use ScalarValue::*;

    let context = || format!("{l} {} {r}", op.symbol());
    let division_by_zero = || DbxError::SqlExecution {
        message: "division by zero".into(),
        context: context(),
    };

    match (l, r) {
        (Null, _) | (_, Null) => Ok(Null),
        (Int32(a), Int32(b)) => {
            let (a, b) = (*a, *b);
            let out = match op {
                BinaryOperator::Plus => a.checked_add(b),
                BinaryOperator::Minus => a.checked_sub(b),
                BinaryOperator::Multiply => a.checked_mul(b),
                BinaryOperator::Divide if b == 0 => return Err(division_by_zero()),
                BinaryOperator::Divide => a.checked_div(b),
                BinaryOperator::Modulo if b == 0 => return Err(division_by_zero()),
                BinaryOperator::Modulo => a.checked_rem(b),
            };
            out.map(Int32).ok_or_else(out_of_range)
        }
        (Int32(_) | Int64(_), Int32(_) | Int64(_)) => {
            // Int32 ↔ Int64 → promote both to Int64
            let a = l.as_i64()?.unwrap_or_default();
            let b = r.as_i64()?.unwrap_or_default();
            let out = match op {
                BinaryOperator::Plus => a.checked_add(b),
                BinaryOperator::Minus => a.checked_sub(b),
                BinaryOperator::Multiply => a.checked_mul(b),
                BinaryOperator::Divide if b == 0 => return Err(division_by_zero()),
                BinaryOperator::Divide => a.checked_div(b),
                BinaryOperator::Modulo if b == 0 => return Err(division_by_zero()),
                BinaryOperator::Modulo => a.checked_rem(b),
            };
            out.map(Int64).ok_or_else(out_of_range)
        }
        (Int32(_) | Int64(_) | Float64(_), Int32(_) | Int64(_) | Float64(_)) => {
            // Int ↔ Float64 → promote to Float64
            let a = as_f64(l);
            let b = as_f64(r);
            let out = match op {
                BinaryOperator::Plus => a + b,
                BinaryOperator::Minus => a - b,
                BinaryOperator::Multiply => a * b,
                BinaryOperator::Divide | BinaryOperator::Modulo if b == 0.0 => {
                    return Err(division_by_zero());
                }
                BinaryOperator::Divide => a / b,
                BinaryOperator::Modulo => a % b,
            };
            Ok(Float64(out))
        }
        _ => Err(DbxError::TypeMismatch {
            expected: "numeric operands".to_string(),
            actual: context(),
        }),
    }
}

fn as_f64(value: &ScalarValue) -> f64 {
    match value {
        ScalarValue::Int32(v) => f64::from(*v),
        ScalarValue::Int64(v) => *v as f64,
        ScalarValue::Float64(v) => *v,
        _ => f64::NAN,
    }
}
