//! # bracelet-core
//!
//! 가상 브레이슬릿 도메인 모델, 포트(trait) 정의, 에러 타입.
//! 모든 크레이트가 공유하는 핵심 타입과 인터페이스를 제공한다.
//!
//! ## 구조
//!
//! - [`models`] — 식별 정보, 텔레메트리, 상태 머신, 명령, 감사 로그, 스냅샷
//! - [`ports`] — 백엔드/난수 포트 인터페이스 (async_trait)
//! - [`error`] — 핵심 에러 타입 (thiserror)
//! - [`config`] — 애플리케이션 설정 구조체

pub mod config;
pub mod error;
pub mod models;
pub mod ports;
