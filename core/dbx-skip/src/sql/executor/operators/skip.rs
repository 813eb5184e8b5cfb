//! Skip Operator — OFFSET clause handling
//!
//! Discards the first K tuples of its input and returns the rest, in either
//! scan direction. K comes from an optional expression evaluated on every
//! (re)scan, so it may depend on runtime parameters.
//!
//! ```text
//!            forward                         backward
//! Initial ──resolve──▶ Rescan            Rescan      ─▶ (eos)
//! Rescan  ──pos > K──▶ InWindow          InWindow    ─▶ WindowStart  (pos ≤ K+1)
//! Rescan  ──child eos─▶ Empty            InWindow    ─▶ InWindow     (pos -= 1)
//! InWindow ─child eos─▶ SubplanExhausted SubplanExhausted ─▶ InWindow (pull back)
//! WindowStart ─replay─▶ InWindow         WindowEnd   ─▶ InWindow     (replay)
//! ```

use crate::error::{DbxError, DbxResult};
use crate::sql::executor::expr::ExprContext;
use crate::sql::executor::operators::bound::pass_down_bound;
use crate::sql::executor::operators::{PhysicalOperator, TupleSlot, exec_pull, rescan_child};
use crate::sql::executor::state::{ExecutorState, InitFlags, check_unsupported_flags};
use crate::sql::planner::{Expr, ParamId, ParamSet};
use arrow::datatypes::Schema;
use tracing::{debug, instrument, trace};

/// Skip 연산자의 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipState {
    /// Bound not resolved yet
    Initial,
    /// Bound resolved, nothing pulled from the input in this scan
    Rescan,
    /// Input is positioned on the tuple last returned
    InWindow,
    /// Input ran out before passing K tuples
    Empty,
    /// Input ran out while moving forward inside the window
    SubplanExhausted,
    /// Forward scan stopped at the row count (reserved; no count is ever set)
    WindowEnd,
    /// Backward scan stepped off the first tuple of the window
    WindowStart,
}

/// Skip 연산자 (OFFSET)
pub struct SkipOperator {
    input: Box<dyn PhysicalOperator>,
    skip_expr: Option<Expr>,
    /// Released on shutdown
    expr_ctx: Option<ExprContext>,
    /// Parameters read by `skip_expr`
    params: ParamSet,
    state: SkipState,
    /// K for the current scan
    skip: i64,
    /// Upper row count. Always unbounded for now.
    count: Option<i64>,
    /// Forward input pulls minus backward input pulls in this scan
    position: i64,
    /// Input tuple last seen, replayed when the direction reverses
    cached: Option<TupleSlot>,
    pending: bool,
    bound_hints: bool,
    trace_transitions: bool,
}

impl SkipOperator {
    /// Set up a Skip node above an already built `input`.
    ///
    /// The bound is resolved lazily, on the first pull.
    #[instrument(target = "executor", level = "debug", skip_all, fields(node = "Skip"))]
    pub fn new(
        input: Box<dyn PhysicalOperator>,
        skip: Option<Expr>,
        estate: &ExecutorState,
        flags: InitFlags,
    ) -> DbxResult<Self> {
        check_unsupported_flags("Skip", flags, InitFlags::MARK)?;

        let mut params = ParamSet::new();
        if let Some(expr) = &skip {
            expr.collect_params(&mut params);
        }
        debug!(
            target: "executor",
            input = input.name(),
            has_skip = skip.is_some(),
            params = ?params,
            "skip node initialised"
        );

        Ok(Self {
            input,
            skip_expr: skip,
            expr_ctx: Some(ExprContext::new("Skip")),
            params,
            state: SkipState::Initial,
            skip: 0,
            count: None,
            position: 0,
            cached: None,
            pending: false,
            bound_hints: estate.config().bound_hints,
            trace_transitions: estate.config().trace_transitions,
        })
    }

    pub fn state(&self) -> SkipState {
        self.state
    }

    /// K resolved for the current scan (0 before the first resolve).
    pub fn skip(&self) -> i64 {
        self.skip
    }

    pub fn position(&self) -> i64 {
        self.position
    }

    /// Input operator, for walking the tree below.
    pub fn input_mut(&mut self) -> &mut dyn PhysicalOperator {
        self.input.as_mut()
    }

    /// Expression context, until shutdown releases it.
    pub fn expr_context(&self) -> Option<&ExprContext> {
        self.expr_ctx.as_ref()
    }

    #[cfg(test)]
    pub(crate) fn set_count(&mut self, count: Option<i64>) {
        self.count = count;
    }

    /// Evaluate the skip expression and start a new scan.
    ///
    /// On error nothing is modified.
    fn resolve_bound(&mut self, estate: &ExecutorState) -> DbxResult<()> {
        let skip = match (&self.skip_expr, self.expr_ctx.as_mut()) {
            (None, _) => 0,
            (Some(expr), Some(ctx)) => match ctx.evaluate(expr, None, estate)?.as_i64()? {
                None => 0,
                Some(value) if value < 0 => {
                    return Err(DbxError::InvalidBound {
                        clause: "SKIP",
                        value,
                    });
                }
                Some(value) => value,
            },
            (Some(_), None) => {
                return Err(DbxError::ImpossibleState(
                    "SKIP evaluated after shutdown".to_string(),
                ));
            }
        };

        debug!(target: "executor", skip, count = ?self.count, "skip bound resolved");

        self.skip = skip;
        self.position = 0;
        self.cached = None;
        self.transition(SkipState::Rescan);

        let count = if self.bound_hints { self.count } else { None };
        pass_down_bound(self.input.as_mut(), skip, count);
        Ok(())
    }

    fn transition(&mut self, to: SkipState) {
        if self.trace_transitions && self.state != to {
            trace!(
                target: "executor",
                from = ?self.state,
                to = ?to,
                position = self.position,
                skip = self.skip,
                "skip state change"
            );
        }
        self.state = to;
    }

    /// Forward pull from Rescan: throw away the first K input tuples.
    fn enter_window(&mut self, estate: &ExecutorState) -> DbxResult<Option<TupleSlot>> {
        if self.count.is_some_and(|count| count <= 0) {
            self.transition(SkipState::Empty);
            return Ok(None);
        }

        loop {
            let Some(slot) = exec_pull(self.input.as_mut(), estate)? else {
                self.transition(SkipState::Empty);
                return Ok(None);
            };
            self.cached = Some(TupleSlot::clone(&slot));
            self.position += 1;
            if self.position > self.skip {
                self.transition(SkipState::InWindow);
                return Ok(Some(slot));
            }
        }
    }

    fn advance(&mut self, estate: &ExecutorState) -> DbxResult<Option<TupleSlot>> {
        if self
            .count
            .is_some_and(|count| self.position - self.skip >= count)
        {
            self.transition(SkipState::WindowEnd);
            return Ok(None);
        }

        let Some(slot) = exec_pull(self.input.as_mut(), estate)? else {
            self.transition(SkipState::SubplanExhausted);
            return Ok(None);
        };
        self.cached = Some(TupleSlot::clone(&slot));
        self.position += 1;
        Ok(Some(slot))
    }

    fn retreat(&mut self, estate: &ExecutorState) -> DbxResult<Option<TupleSlot>> {
        // on the first tuple of the window; never read below K
        if self.position - 1 <= self.skip {
            self.transition(SkipState::WindowStart);
            return Ok(None);
        }

        let slot = self.pull_backward(estate)?;
        self.cached = Some(TupleSlot::clone(&slot));
        self.position -= 1;
        Ok(Some(slot))
    }

    fn pull_backward(&mut self, estate: &ExecutorState) -> DbxResult<TupleSlot> {
        exec_pull(self.input.as_mut(), estate)?.ok_or_else(|| {
            DbxError::InternalConsistency("SKIP subplan failed to run backwards".to_string())
        })
    }

    /// Return the cached tuple again without touching the input.
    fn replay(&mut self) -> DbxResult<Option<TupleSlot>> {
        let slot = self.cached.clone().ok_or_else(|| {
            DbxError::ImpossibleState(format!("no cached tuple to replay in {:?}", self.state))
        })?;
        self.transition(SkipState::InWindow);
        Ok(Some(slot))
    }
}

impl PhysicalOperator for SkipOperator {
    fn name(&self) -> &'static str {
        "Skip"
    }

    fn schema(&self) -> &Schema {
        self.input.schema()
    }

    fn next(&mut self, estate: &ExecutorState) -> DbxResult<Option<TupleSlot>> {
        let forward = estate.direction().is_forward();

        match self.state {
            SkipState::Initial => {
                self.resolve_bound(estate)?;
                if forward {
                    self.enter_window(estate)
                } else {
                    Ok(None)
                }
            }
            SkipState::Rescan => {
                if forward {
                    self.enter_window(estate)
                } else {
                    Ok(None)
                }
            }
            SkipState::Empty => Ok(None),
            SkipState::InWindow => {
                if forward {
                    self.advance(estate)
                } else {
                    self.retreat(estate)
                }
            }
            SkipState::SubplanExhausted => {
                if forward {
                    return Ok(None);
                }
                // the forward step in here consumed nothing; position stays
                let slot = self.pull_backward(estate)?;
                self.cached = Some(TupleSlot::clone(&slot));
                self.transition(SkipState::InWindow);
                Ok(Some(slot))
            }
            SkipState::WindowEnd => {
                if forward {
                    Ok(None)
                } else {
                    self.replay()
                }
            }
            SkipState::WindowStart => {
                if forward {
                    self.replay()
                } else {
                    Ok(None)
                }
            }
        }
    }

    #[instrument(target = "executor", level = "debug", skip_all, fields(node = "Skip"))]
    fn rescan(&mut self, estate: &ExecutorState) -> DbxResult<()> {
        // hint first: a sort below reads it when it starts over
        self.resolve_bound(estate)?;
        self.pending = false;
        rescan_child(self.input.as_mut(), estate)
    }

    #[instrument(target = "executor", level = "debug", skip_all, fields(node = "Skip"))]
    fn shutdown(&mut self) -> DbxResult<()> {
        if let Some(ctx) = self.expr_ctx.take() {
            debug!(
                target: "executor",
                evaluations = ctx.evaluations(),
                "skip expression context released"
            );
        }
        self.cached = None;
        self.input.shutdown()
    }

    fn notify_param_change(&mut self, changed: &[ParamId]) {
        if changed.iter().any(|id| self.params.contains(id)) {
            self.pending = true;
        }
        self.input.notify_param_change(changed);
        self.pending |= self.input.has_pending_rescan();
    }

    fn has_pending_rescan(&self) -> bool {
        self.pending
    }
}
