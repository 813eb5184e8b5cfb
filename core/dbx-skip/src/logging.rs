//! 실행기 로깅 초기화
//!
//! Operators emit `tracing` events under the `executor` target. The helpers
//! here scope the filter to that target; anything else stays at `warn`
//! unless `RUST_LOG` says otherwise.

#[cfg(feature = "logging")]
use tracing_subscriber::{EnvFilter, fmt};

/// Target every operator logs under.
pub const EXECUTOR_TARGET: &str = "executor";

/// Filter directive for executor events at `level`, everything else at `warn`.
///
/// ```rust
/// assert_eq!(dbx_skip::logging::executor_directive("debug"), "warn,executor=debug");
/// ```
pub fn executor_directive(level: &str) -> String {
    format!("warn,{EXECUTOR_TARGET}={level}")
}

/// Executor events at `info` (`RUST_LOG` overrides).
#[cfg(feature = "logging")]
pub fn init() {
    init_with_level("info")
}

/// Executor events at `level` (`RUST_LOG` overrides).
///
/// Skip state changes are logged at `trace` and only when
/// `ExecutorConfig::trace_transitions` is set.
#[cfg(feature = "logging")]
pub fn init_with_level(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(executor_directive(level)));

    let _ = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_line_number(true)
        .try_init();
}

/// Every executor event, written through the test harness capture.
#[cfg(feature = "logging")]
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new(executor_directive("trace")))
        .with_test_writer()
        .without_time()
        .try_init();
}

#[cfg(not(feature = "logging"))]
pub fn init() {}

#[cfg(not(feature = "logging"))]
pub fn init_with_level(_level: &str) {}

#[cfg(not(feature = "logging"))]
pub fn init_test() {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directive_scopes_level_to_executor() {
        assert_eq!(executor_directive("trace"), "warn,executor=trace");
    }

    #[test]
    fn init_twice_is_harmless() {
        init_test();
        init_test();
        tracing::trace!(target: "executor", "after init");
    }
}
