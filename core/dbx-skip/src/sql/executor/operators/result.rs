//! Result Operator — identity pass-through or per-tuple projection

use crate::error::{DbxError, DbxResult};
use crate::sql::executor::expr::ExprContext;
use crate::sql::executor::operators::cursor::Cursor;
use crate::sql::executor::operators::{
    OperatorKindMut, PhysicalOperator, TupleSlot, exec_pull, rescan_child,
};
use crate::sql::executor::state::ExecutorState;
use crate::sql::planner::{Expr, ParamId, ParamSet};
use crate::storage::columnar::ScalarValue;
use arrow::datatypes::{Field, Schema, SchemaRef};
use std::sync::Arc;

/// Result 연산자 (SELECT 컬럼 계산)
///
/// An empty projection passes input tuples through untouched. A projection
/// containing set-returning functions expands each input tuple into zero or
/// more output tuples. Without an input, projects a single constant row.
pub struct ResultOperator {
    input: Option<Box<dyn PhysicalOperator>>,
    projection: Vec<Expr>,
    schema: SchemaRef,
    expr_ctx: ExprContext,
    returns_set: bool,
    params: ParamSet,
    /// Output tuples of the current input tuple, and the one last returned
    expanded: Vec<TupleSlot>,
    idx: usize,
    /// Stand-in input for the constant case: one empty row
    unit: Vec<TupleSlot>,
    unit_cursor: Cursor,
    pending: bool,
}

impl ResultOperator {
    pub fn new(
        input: Option<Box<dyn PhysicalOperator>>,
        projection: Vec<(Expr, Option<String>)>,
    ) -> DbxResult<Self> {
        let schema = match (&input, projection.is_empty()) {
            (Some(input), true) => Arc::new(input.schema().clone()),
            (None, true) => {
                return Err(DbxError::InvalidOperation {
                    message: "pass-through result needs an input".into(),
                    context: "ResultOperator::new".into(),
                });
            }
            (input, false) => {
                let input_schema = input.as_ref().map(|op| op.schema());
                let fields = projection
                    .iter()
                    .enumerate()
                    .map(|(i, (expr, alias))| {
                        let name = alias.clone().unwrap_or_else(|| format!("col_{i}"));
                        Ok(Field::new(name, expr.data_type(input_schema)?, true))
                    })
                    .collect::<DbxResult<Vec<_>>>()?;
                Arc::new(Schema::new(fields))
            }
        };

        let projection: Vec<Expr> = projection.into_iter().map(|(expr, _)| expr).collect();
        let returns_set = projection.iter().any(Expr::returns_set);
        let mut params = ParamSet::new();
        projection
            .iter()
            .for_each(|expr| expr.collect_params(&mut params));

        Ok(Self {
            input,
            projection,
            schema,
            expr_ctx: ExprContext::new("Result"),
            returns_set,
            params,
            expanded: Vec::new(),
            idx: 0,
            unit: vec![Arc::new(Vec::new())],
            unit_cursor: Cursor::new(),
            pending: false,
        })
    }

    /// True if the projection can change the number of tuples.
    pub fn projection_returns_set(&self) -> bool {
        self.returns_set
    }

    pub fn input_mut(&mut self) -> Option<&mut dyn PhysicalOperator> {
        match self.input.as_mut() {
            Some(input) => Some(input.as_mut()),
            None => None,
        }
    }

    fn fetch_input(&mut self, estate: &ExecutorState) -> DbxResult<Option<TupleSlot>> {
        match self.input.as_mut() {
            Some(input) => exec_pull(input.as_mut(), estate),
            None => Ok(self
                .unit_cursor
                .step(&self.unit, estate.direction().is_forward())),
        }
    }

    fn project(&mut self, row: &[ScalarValue], estate: &ExecutorState) -> DbxResult<Vec<TupleSlot>> {
        if !self.returns_set {
            let values = self
                .projection
                .iter()
                .map(|expr| self.expr_ctx.evaluate(expr, Some(row), estate))
                .collect::<DbxResult<Vec<_>>>()?;
            return Ok(vec![Arc::new(values)]);
        }

        let columns = self
            .projection
            .iter()
            .map(|expr| self.expr_ctx.evaluate_set(expr, Some(row), estate))
            .collect::<DbxResult<Vec<_>>>()?;
        // set-returning columns advance in lock-step; shorter ones pad with NULL
        let len = self
            .projection
            .iter()
            .zip(&columns)
            .filter(|(expr, _)| expr.returns_set())
            .map(|(_, values)| values.len())
            .max()
            .unwrap_or(0);

        Ok((0..len)
            .map(|i| {
                let values = self
                    .projection
                    .iter()
                    .zip(&columns)
                    .map(|(expr, values)| {
                        let at = if expr.returns_set() { i } else { 0 };
                        values.get(at).cloned().unwrap_or(ScalarValue::Null)
                    })
                    .collect();
                Arc::new(values)
            })
            .collect())
    }
}

impl PhysicalOperator for ResultOperator {
    fn name(&self) -> &'static str {
        "Result"
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn next(&mut self, estate: &ExecutorState) -> DbxResult<Option<TupleSlot>> {
        if self.projection.is_empty() {
            return match self.input.as_mut() {
                Some(input) => exec_pull(input.as_mut(), estate),
                None => Ok(None),
            };
        }

        let forward = estate.direction().is_forward();
        loop {
            if forward && self.idx + 1 < self.expanded.len() {
                self.idx += 1;
                return Ok(Some(TupleSlot::clone(&self.expanded[self.idx])));
            }
            if !forward && self.idx > 0 && !self.expanded.is_empty() {
                self.idx -= 1;
                return Ok(Some(TupleSlot::clone(&self.expanded[self.idx])));
            }

            let Some(row) = self.fetch_input(estate)? else {
                self.expanded.clear();
                self.idx = 0;
                return Ok(None);
            };
            self.expanded = self.project(&row, estate)?;
            if let Some(last) = self.expanded.len().checked_sub(1) {
                self.idx = if forward { 0 } else { last };
                return Ok(Some(TupleSlot::clone(&self.expanded[self.idx])));
            }
            // input tuple expanded to nothing; keep going
        }
    }

    fn rescan(&mut self, estate: &ExecutorState) -> DbxResult<()> {
        self.expanded.clear();
        self.idx = 0;
        self.unit_cursor.rewind();
        self.pending = false;
        match self.input.as_mut() {
            Some(input) => rescan_child(input.as_mut(), estate),
            None => Ok(()),
        }
    }

    fn shutdown(&mut self) -> DbxResult<()> {
        self.expanded.clear();
        match self.input.as_mut() {
            Some(input) => input.shutdown(),
            None => Ok(()),
        }
    }

    fn notify_param_change(&mut self, changed: &[ParamId]) {
        if changed.iter().any(|id| self.params.contains(id)) {
            self.pending = true;
        }
        if let Some(input) = self.input.as_mut() {
            input.notify_param_change(changed);
            self.pending |= input.has_pending_rescan();
        }
    }

    fn has_pending_rescan(&self) -> bool {
        self.pending
    }

    fn as_kind_mut(&mut self) -> OperatorKindMut<'_> {
        OperatorKindMut::Result(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::executor::operators::ValuesScanOperator;
    use crate::sql::executor::state::ScanDirection;
    use crate::sql::planner::BinaryOperator;

    fn values(vals: &[i64]) -> Option<Box<dyn PhysicalOperator>> {
        Some(Box::new(ValuesScanOperator::from_i64s("v", vals)))
    }

    fn first_col(slot: Option<TupleSlot>) -> Option<i64> {
        slot.map(|t| match t[0] {
            ScalarValue::Int64(v) => v,
            _ => unreachable!(),
        })
    }

    #[test]
    fn identity_passes_through() {
        let mut op = ResultOperator::new(values(&[1, 2]), vec![]).unwrap();
        let estate = ExecutorState::default();
        assert!(!op.projection_returns_set());
        assert_eq!(first_col(op.next(&estate).unwrap()), Some(1));
        assert_eq!(first_col(op.next(&estate).unwrap()), Some(2));
        assert_eq!(first_col(op.next(&estate).unwrap()), None);
    }

    #[test]
    fn projects_expressions() {
        let proj = vec![(
            Expr::binary(Expr::Column(0), BinaryOperator::Multiply, Expr::lit_i64(10)),
            Some("v10".to_string()),
        )];
        let mut op = ResultOperator::new(values(&[1, 2]), proj).unwrap();
        assert_eq!(op.schema().field(0).name(), "v10");
        let estate = ExecutorState::default();
        assert_eq!(first_col(op.next(&estate).unwrap()), Some(10));
        assert_eq!(first_col(op.next(&estate).unwrap()), Some(20));
    }

    #[test]
    fn srf_expands_both_directions() {
        // each v expands to v..=v+1
        let proj = vec![(
            Expr::generate_series(
                Expr::Column(0),
                Expr::binary(Expr::Column(0), BinaryOperator::Plus, Expr::lit_i64(1)),
            ),
            None,
        )];
        let mut op = ResultOperator::new(values(&[10, 20]), proj).unwrap();
        assert!(op.projection_returns_set());

        let mut estate = ExecutorState::default();
        let forward: Vec<_> = (0..4)
            .map(|_| first_col(op.next(&estate).unwrap()).unwrap())
            .collect();
        assert_eq!(forward, vec![10, 11, 20, 21]);
        assert_eq!(first_col(op.next(&estate).unwrap()), None);

        estate.set_direction(ScanDirection::Backward);
        let backward: Vec<_> = (0..4)
            .map(|_| first_col(op.next(&estate).unwrap()).unwrap())
            .collect();
        assert_eq!(backward, vec![21, 20, 11, 10]);
        assert_eq!(first_col(op.next(&estate).unwrap()), None);
    }

    #[test]
    fn constant_result_without_input() {
        let mut op = ResultOperator::new(None, vec![(Expr::lit_i64(42), None)]).unwrap();
        let estate = ExecutorState::default();
        assert_eq!(first_col(op.next(&estate).unwrap()), Some(42));
        assert_eq!(first_col(op.next(&estate).unwrap()), None);
        op.rescan(&estate).unwrap();
        assert_eq!(first_col(op.next(&estate).unwrap()), Some(42));
        assert!(op.input_mut().is_none());
    }

    #[test]
    fn passthrough_without_input_is_rejected() {
        assert!(ResultOperator::new(None, vec![]).is_err());
    }
}
