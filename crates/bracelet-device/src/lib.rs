//! # bracelet-device
//!
//! 시뮬레이션 디바이스 본체.
//! 세션 상태 머신, 명령 채널, 시뮬레이션 스케줄러, 스냅샷 저장소.

pub mod command_channel;
pub mod events;
pub mod random;
pub mod scheduler;
pub mod session;
pub mod shared;
pub mod snapshot_store;

#[cfg(test)]
pub(crate) mod test_support;
