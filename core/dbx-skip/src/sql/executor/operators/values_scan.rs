//! Values Scan Operator — literal / parameterised rows

use crate::error::{DbxError, DbxResult};
use crate::sql::executor::expr::ExprContext;
use crate::sql::executor::operators::cursor::Cursor;
use crate::sql::executor::operators::{PhysicalOperator, TupleSlot};
use crate::sql::executor::state::ExecutorState;
use crate::sql::planner::{Expr, ParamId, ParamSet};
use arrow::datatypes::{Schema, SchemaRef};
use std::sync::Arc;

/// Values 스캔 연산자 — 리프 노드, 양방향 스캔 지원
pub struct ValuesScanOperator {
    schema: SchemaRef,
    rows: Vec<Vec<Expr>>,
    /// Parameters read by any row expression
    params: ParamSet,
    expr_ctx: ExprContext,
    /// Rows evaluated for the current scan
    materialized: Option<Vec<TupleSlot>>,
    cursor: Cursor,
    pending: bool,
}

impl ValuesScanOperator {
    pub fn new(schema: SchemaRef, rows: Vec<Vec<Expr>>) -> DbxResult<Self> {
        let width = schema.fields().len();
        if let Some(bad) = rows.iter().position(|row| row.len() != width) {
            return Err(DbxError::Schema(format!(
                "values row {bad} has {} columns, expected {width}",
                rows[bad].len()
            )));
        }
        if rows.iter().flatten().any(Expr::returns_set) {
            return Err(DbxError::InvalidOperation {
                message: "set-returning function in VALUES".into(),
                context: "ValuesScanOperator::new".into(),
            });
        }

        let mut params = ParamSet::new();
        rows.iter()
            .flatten()
            .for_each(|expr| expr.collect_params(&mut params));

        Ok(Self {
            schema,
            rows,
            params,
            expr_ctx: ExprContext::new("Values"),
            materialized: None,
            cursor: Cursor::new(),
            pending: false,
        })
    }

    /// Literal integer rows with a single `Int64` column.
    pub fn from_i64s(name: &str, values: &[i64]) -> Self {
        use arrow::datatypes::{DataType, Field};

        let schema = Arc::new(Schema::new(vec![Field::new(name, DataType::Int64, false)]));
        Self {
            schema,
            rows: values.iter().map(|v| vec![Expr::lit_i64(*v)]).collect(),
            params: ParamSet::new(),
            expr_ctx: ExprContext::new("Values"),
            materialized: None,
            cursor: Cursor::new(),
            pending: false,
        }
    }

    fn materialize(&mut self, estate: &ExecutorState) -> DbxResult<Vec<TupleSlot>> {
        self.rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|expr| self.expr_ctx.evaluate(expr, None, estate))
                    .collect::<DbxResult<Vec<_>>>()
                    .map(Arc::new)
            })
            .collect()
    }
}

impl PhysicalOperator for ValuesScanOperator {
    fn name(&self) -> &'static str {
        "Values"
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn next(&mut self, estate: &ExecutorState) -> DbxResult<Option<TupleSlot>> {
        if self.materialized.is_none() {
            let rows = self.materialize(estate)?;
            self.materialized = Some(rows);
        }
        let rows = self.materialized.as_deref().unwrap_or_default();
        Ok(self.cursor.step(rows, estate.direction().is_forward()))
    }

    fn rescan(&mut self, _estate: &ExecutorState) -> DbxResult<()> {
        // literal rows survive a rescan; parameterised ones are re-evaluated
        if !self.params.is_empty() {
            self.materialized = None;
        }
        self.cursor.rewind();
        self.pending = false;
        Ok(())
    }

    fn shutdown(&mut self) -> DbxResult<()> {
        self.materialized = None;
        Ok(())
    }

    fn notify_param_change(&mut self, changed: &[ParamId]) {
        if changed.iter().any(|id| self.params.contains(id)) {
            self.pending = true;
        }
    }

    fn has_pending_rescan(&self) -> bool {
        self.pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::executor::state::ScanDirection;
    use crate::storage::columnar::ScalarValue;
    use arrow::datatypes::{DataType, Field};

    fn one_col() -> SchemaRef {
        Arc::new(Schema::new(vec![Field::new("v", DataType::Int64, true)]))
    }

    #[test]
    fn scans_both_directions() {
        let mut scan = ValuesScanOperator::from_i64s("v", &[1, 2]);
        let mut estate = ExecutorState::default();
        assert_eq!(scan.next(&estate).unwrap().unwrap()[0], ScalarValue::Int64(1));
        assert_eq!(scan.next(&estate).unwrap().unwrap()[0], ScalarValue::Int64(2));
        assert!(scan.next(&estate).unwrap().is_none());
        estate.set_direction(ScanDirection::Backward);
        assert_eq!(scan.next(&estate).unwrap().unwrap()[0], ScalarValue::Int64(2));
    }

    #[test]
    fn param_change_marks_pending_and_rescan_reevaluates() {
        let mut scan = ValuesScanOperator::new(one_col(), vec![vec![Expr::param(0)]]).unwrap();
        let mut estate = ExecutorState::default();
        estate.set_param(0, ScalarValue::Int64(1));
        assert_eq!(scan.next(&estate).unwrap().unwrap()[0], ScalarValue::Int64(1));

        estate.set_param(0, ScalarValue::Int64(9));
        scan.notify_param_change(&[3]);
        assert!(!scan.has_pending_rescan());
        scan.notify_param_change(&[0]);
        assert!(scan.has_pending_rescan());

        scan.rescan(&estate).unwrap();
        assert!(!scan.has_pending_rescan());
        assert_eq!(scan.next(&estate).unwrap().unwrap()[0], ScalarValue::Int64(9));
    }

    #[test]
    fn arity_is_checked() {
        let err = ValuesScanOperator::new(one_col(), vec![vec![Expr::lit_i64(1), Expr::lit_i64(2)]]);
        assert!(matches!(err, Err(DbxError::Schema(_))));
    }
}
