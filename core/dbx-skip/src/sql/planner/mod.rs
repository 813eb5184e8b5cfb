//! 플래너 타입 모듈
//!
//! 실행기에 전달되는 PhysicalPlan과 표현식 타입을 정의합니다.

pub mod types;

// Re-export main types
pub use types::*;
