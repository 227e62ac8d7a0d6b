//! # bracelet-network
//!
//! 브레이슬릿 백엔드 네트워크 어댑터.
//! `BraceletBackend` 포트를 reqwest 기반 REST 클라이언트로 구현한다.
//!
//! ## 사용 예시
//!
//! ```rust,ignore
//! use bracelet_network::http_client::HttpBraceletClient;
//!
//! let client = HttpBraceletClient::new("http://localhost:8000/api/devices", timeout)?;
//! ```

pub mod http_client;
