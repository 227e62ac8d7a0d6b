//! 브레이슬릿 백엔드 포트.
//!
//! 구현: `bracelet-network` crate (reqwest)

use async_trait::async_trait;
use serde_json::Value;

use crate::error::CoreError;
use crate::models::command::CommandId;
use crate::models::identity::UniqueCode;
use crate::models::status::Button;
use crate::models::telemetry::{LocationReport, TelemetryReport};

/// 백엔드 응답 — 도달 가능한 백엔드는 상태 코드와 무관하게 이 값을 돌려준다
#[derive(Debug, Clone, PartialEq)]
pub struct BackendResponse {
    /// HTTP 상태 코드
    pub status: u16,
    /// 응답 본문 (JSON이 아니면 문자열, 비어 있으면 null)
    pub body: Value,
}

impl BackendResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    /// 본문을 사람이 읽을 수 있는 텍스트로
    pub fn body_text(&self) -> String {
        match &self.body {
            Value::String(text) => text.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }
}

/// 디바이스 프로토콜 엔드포인트
///
/// 모든 요청은 `X-Bracelet-ID: <unique_code>` 헤더를 포함한다.
/// 성공 상태 코드 판별은 호출자(세션)의 몫이며, `Err`는 전송 계층 실패에만 쓰인다.
#[async_trait]
pub trait BraceletBackend: Send + Sync {
    /// `POST /auth` — `{unique_code}`
    async fn authenticate(&self, code: &UniqueCode) -> Result<BackendResponse, CoreError>;

    /// `POST /heartbeat` — 텔레메트리 스냅샷
    async fn heartbeat(
        &self,
        code: &UniqueCode,
        report: &TelemetryReport,
    ) -> Result<BackendResponse, CoreError>;

    /// `POST /button/{arrived|lost|danger}` — 텔레메트리 스냅샷
    async fn press_button(
        &self,
        code: &UniqueCode,
        button: Button,
        report: &TelemetryReport,
    ) -> Result<BackendResponse, CoreError>;

    /// `POST /danger/update` — 위치
    async fn update_danger_location(
        &self,
        code: &UniqueCode,
        report: &LocationReport,
    ) -> Result<BackendResponse, CoreError>;

    /// `GET /commands` — 대기 중인 명령 최대 1개
    async fn poll_commands(&self, code: &UniqueCode) -> Result<BackendResponse, CoreError>;

    /// `POST /commands/{id}/ack`
    async fn acknowledge_command(
        &self,
        code: &UniqueCode,
        command_id: &CommandId,
    ) -> Result<BackendResponse, CoreError>;
}
