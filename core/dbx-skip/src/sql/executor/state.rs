//! Executor state — scan direction, runtime parameters and init flags

use crate::config::ExecutorConfig;
use crate::error::{DbxError, DbxResult};
use crate::sql::planner::ParamId;
use crate::storage::columnar::ScalarValue;
use std::ops::BitOr;

/// 스캔 방향 — 매 pull마다 실행기 상태에서 읽는다
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanDirection {
    #[default]
    Forward,
    Backward,
}

impl ScanDirection {
    pub fn is_forward(self) -> bool {
        matches!(self, ScanDirection::Forward)
    }

    pub fn reversed(self) -> Self {
        match self {
            ScanDirection::Forward => ScanDirection::Backward,
            ScanDirection::Backward => ScanDirection::Forward,
        }
    }
}

/// Capabilities requested from an operator tree at init time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InitFlags(u8);

impl InitFlags {
    pub const NONE: InitFlags = InitFlags(0);
    /// Plan is only being explained; nothing will be pulled.
    pub const EXPLAIN_ONLY: InitFlags = InitFlags(1 << 0);
    /// Caller may rescan the tree.
    pub const REWIND: InitFlags = InitFlags(1 << 1);
    /// Caller may pull backward.
    pub const BACKWARD: InitFlags = InitFlags(1 << 2);
    /// Caller may mark/restore positions.
    pub const MARK: InitFlags = InitFlags(1 << 3);

    pub fn contains(self, other: InitFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn intersection(self, other: InitFlags) -> InitFlags {
        InitFlags(self.0 & other.0)
    }

    pub fn without(self, other: InitFlags) -> InitFlags {
        InitFlags(self.0 & !other.0)
    }
}

impl BitOr for InitFlags {
    type Output = InitFlags;

    fn bitor(self, rhs: InitFlags) -> InitFlags {
        InitFlags(self.0 | rhs.0)
    }
}

/// Reject init flags an operator cannot honour.
pub(crate) fn check_unsupported_flags(
    node: &'static str,
    flags: InitFlags,
    unsupported: InitFlags,
) -> DbxResult<()> {
    let offending = flags.intersection(unsupported);
    if offending != InitFlags::NONE {
        return Err(DbxError::InvalidOperation {
            message: format!("{node} does not support init flags {offending:?}"),
            context: format!("requested {flags:?}"),
        });
    }
    Ok(())
}

/// 실행기 상태 — 하나의 쿼리 실행 동안 연산자 트리 전체가 공유
#[derive(Debug, Clone, Default)]
pub struct ExecutorState {
    config: ExecutorConfig,
    direction: ScanDirection,
    params: Vec<Option<ScalarValue>>,
}

impl ExecutorState {
    pub fn new(config: ExecutorConfig) -> Self {
        Self {
            config,
            direction: ScanDirection::Forward,
            params: Vec::new(),
        }
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    pub fn direction(&self) -> ScanDirection {
        self.direction
    }

    pub fn set_direction(&mut self, direction: ScanDirection) {
        self.direction = direction;
    }

    /// Current value of a runtime parameter.
    pub fn param(&self, id: ParamId) -> DbxResult<&ScalarValue> {
        self.params
            .get(id)
            .and_then(Option::as_ref)
            .ok_or(DbxError::ParamNotFound(id))
    }

    /// Bind a runtime parameter. Callers notify the affected operator tree
    /// through `PhysicalOperator::notify_param_change`.
    pub fn set_param(&mut self, id: ParamId, value: ScalarValue) {
        if id >= self.params.len() {
            self.params.resize(id + 1, None);
        }
        self.params[id] = Some(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_param_is_an_error() {
        let mut estate = ExecutorState::default();
        estate.set_param(2, ScalarValue::Int64(5));
        assert_eq!(estate.param(2).unwrap(), &ScalarValue::Int64(5));
        assert!(matches!(estate.param(0), Err(DbxError::ParamNotFound(0))));
        assert!(matches!(estate.param(9), Err(DbxError::ParamNotFound(9))));
    }

    #[test]
    fn direction_round_trip() {
        let mut estate = ExecutorState::default();
        assert!(estate.direction().is_forward());
        estate.set_direction(estate.direction().reversed());
        assert_eq!(estate.direction(), ScanDirection::Backward);
    }

    #[test]
    fn flags_contain_and_reject() {
        let flags = InitFlags::REWIND | InitFlags::MARK;
        assert!(flags.contains(InitFlags::MARK));
        assert!(!flags.contains(InitFlags::BACKWARD));
        assert!(check_unsupported_flags("Skip", flags, InitFlags::MARK).is_err());
        assert!(check_unsupported_flags("Skip", flags.without(InitFlags::MARK), InitFlags::MARK).is_ok());
        assert!(
            check_unsupported_flags("MergeAppend", InitFlags::BACKWARD, InitFlags::BACKWARD | InitFlags::MARK)
                .is_err()
        );
    }
}
