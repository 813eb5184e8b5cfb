//! Executor configuration
//!
//! 실행기 동작 설정 — JSON 파일 또는 환경 변수(`DBX_EXECUTOR_*`)에서 로드

use crate::error::{DbxError, DbxResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

const ENV_BOUND_HINTS: &str = "DBX_EXECUTOR_BOUND_HINTS";
const ENV_TRACE_TRANSITIONS: &str = "DBX_EXECUTOR_TRACE_TRANSITIONS";
const ENV_SORT_BOUND_THRESHOLD: &str = "DBX_EXECUTOR_SORT_BOUND_THRESHOLD";

/// 실행기 설정
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Let Skip pass its row bound down to sorts. When off, every hint the
    /// propagator reaches is cleared instead.
    pub bound_hints: bool,

    /// Emit a `trace` event on every Skip state transition.
    pub trace_transitions: bool,

    /// A bounded sort only switches to top-N once its input has more rows
    /// than this.
    pub sort_bound_threshold: usize,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            bound_hints: true,
            trace_transitions: false,
            sort_bound_threshold: 0,
        }
    }
}

impl ExecutorConfig {
    /// JSON 문자열에서 파싱 (누락된 필드는 기본값)
    pub fn from_json_str(json: &str) -> DbxResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// 파일에서 로드
    pub fn load_from_file(path: &Path) -> DbxResult<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// 파일에 저장
    pub fn save_to_file(&self, path: &Path) -> DbxResult<()> {
        let json = serde_json::to_string_pretty(self)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, json)?;
        Ok(())
    }

    /// 환경 변수로 덮어쓰기
    pub fn apply_env(&mut self) -> DbxResult<()> {
        if let Ok(value) = env::var(ENV_BOUND_HINTS) {
            self.bound_hints = parse_flag(&value);
        }
        if let Ok(value) = env::var(ENV_TRACE_TRANSITIONS) {
            self.trace_transitions = parse_flag(&value);
        }
        if let Ok(value) = env::var(ENV_SORT_BOUND_THRESHOLD) {
            self.sort_bound_threshold =
                value
                    .trim()
                    .parse()
                    .map_err(|_| DbxError::InvalidOperation {
                        message: format!("invalid {ENV_SORT_BOUND_THRESHOLD} value '{value}'"),
                        context: "ExecutorConfig::apply_env".to_string(),
                    })?;
        }
        Ok(())
    }

    /// Defaults overridden by the environment.
    pub fn from_env() -> DbxResult<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }
}

fn parse_flag(value: &str) -> bool {
    value.to_lowercase() == "true" || value == "1"
}
