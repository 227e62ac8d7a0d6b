//! 브레이슬릿 도메인 모델.
//!
//! 모든 모델은 `serde` Serialize/Deserialize를 구현한다.

pub mod actuator;
pub mod audit;
pub mod command;
pub mod identity;
pub mod snapshot;
pub mod status;
pub mod telemetry;
