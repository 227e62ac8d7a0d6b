//! HTTP REST 백엔드 클라이언트.
//!
//! `BraceletBackend` 포트 구현. 모든 요청에 `X-Bracelet-ID` 헤더를 주입하고
//! 요청마다 타임아웃을 적용한다. 재시도는 하지 않는다 (다음 틱이 재시도).

use async_trait::async_trait;
use bracelet_core::error::CoreError;
use bracelet_core::models::command::CommandId;
use bracelet_core::models::identity::UniqueCode;
use bracelet_core::models::status::Button;
use bracelet_core::models::telemetry::{LocationReport, TelemetryReport};
use bracelet_core::ports::backend::{BackendResponse, BraceletBackend};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// 디바이스 식별 헤더
pub const BRACELET_ID_HEADER: &str = "X-Bracelet-ID";

/// REST 백엔드 클라이언트 — `BraceletBackend` 포트 구현
pub struct HttpBraceletClient {
    client: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

impl HttpBraceletClient {
    /// 새 HTTP 클라이언트 생성
    ///
    /// `endpoint`는 디바이스 API 기준 URL (예: `http://localhost:8000/api/devices`)
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, CoreError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CoreError::Network(format!("HTTP 클라이언트 빌드 실패: {e}")))?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    /// 기준 URL
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// 식별 헤더가 포함된 요청 빌더 반환
    fn request(
        &self,
        method: reqwest::Method,
        path: &str,
        code: &UniqueCode,
    ) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.endpoint, path);
        self.client
            .request(method, &url)
            .header(BRACELET_ID_HEADER, code.as_str())
    }

    /// reqwest 에러를 전송 계층 에러로 매핑
    fn map_transport(&self, context: &str, error: reqwest::Error) -> CoreError {
        if error.is_timeout() {
            CoreError::Timeout {
                timeout_ms: self.timeout.as_millis() as u64,
            }
        } else {
            CoreError::Network(format!("{context}: {error}"))
        }
    }

    /// 요청 전송 후 상태 코드와 본문을 그대로 반환
    async fn send(
        &self,
        context: &str,
        builder: reqwest::RequestBuilder,
    ) -> Result<BackendResponse, CoreError> {
        let resp = builder
            .send()
            .await
            .map_err(|e| self.map_transport(context, e))?;

        let status = resp.status().as_u16();
        let text = resp
            .text()
            .await
            .map_err(|e| self.map_transport(context, e))?;

        debug!("{context}: status={status}, {}바이트", text.len());
        Ok(BackendResponse::new(status, parse_body(&text)))
    }
}

/// 응답 본문 해석 — 비어 있으면 null, JSON이 아니면 문자열
fn parse_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

#[async_trait]
impl BraceletBackend for HttpBraceletClient {
    async fn authenticate(&self, code: &UniqueCode) -> Result<BackendResponse, CoreError> {
        debug!("인증 요청: {code}");
        let body = serde_json::json!({ "unique_code": code.as_str() });
        let req = self.request(reqwest::Method::POST, "/auth", code).json(&body);
        self.send("인증 요청 실패", req).await
    }

    async fn heartbeat(
        &self,
        code: &UniqueCode,
        report: &TelemetryReport,
    ) -> Result<BackendResponse, CoreError> {
        debug!("하트비트 전송: battery={}", report.battery_level);
        let req = self
            .request(reqwest::Method::POST, "/heartbeat", code)
            .json(report);
        self.send("하트비트 전송 실패", req).await
    }

    async fn press_button(
        &self,
        code: &UniqueCode,
        button: Button,
        report: &TelemetryReport,
    ) -> Result<BackendResponse, CoreError> {
        debug!("버튼 보고: {button}");
        let path = format!("/button/{}", button.path_segment());
        let req = self.request(reqwest::Method::POST, &path, code).json(report);
        self.send("버튼 보고 실패", req).await
    }

    async fn update_danger_location(
        &self,
        code: &UniqueCode,
        report: &LocationReport,
    ) -> Result<BackendResponse, CoreError> {
        debug!(
            "위험 위치 갱신: ({}, {}) ±{}m",
            report.latitude, report.longitude, report.accuracy
        );
        let req = self
            .request(reqwest::Method::POST, "/danger/update", code)
            .json(report);
        self.send("위험 위치 갱신 실패", req).await
    }

    async fn poll_commands(&self, code: &UniqueCode) -> Result<BackendResponse, CoreError> {
        let req = self.request(reqwest::Method::GET, "/commands", code);
        self.send("명령 폴링 실패", req).await
    }

    async fn acknowledge_command(
        &self,
        code: &UniqueCode,
        command_id: &CommandId,
    ) -> Result<BackendResponse, CoreError> {
        debug!("명령 확인: {command_id}");
        let path = format!("/commands/{command_id}/ack");
        let req = self.request(reqwest::Method::POST, &path, code);
        self.send("명령 확인 실패", req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use mockito::Matcher;
    use serde_json::json;

    fn code() -> UniqueCode {
        UniqueCode::parse("ABC123DEF456").unwrap()
    }

    fn report() -> TelemetryReport {
        TelemetryReport {
            battery_level: 97,
            latitude: 48.85661234,
            longitude: 2.35221234,
            accuracy: 15,
        }
    }

    fn client_for(server: &mockito::ServerGuard) -> HttpBraceletClient {
        HttpBraceletClient::new(&format!("{}/api/devices", server.url()), Duration::from_secs(5))
            .unwrap()
    }

    #[test]
    fn endpoint_trailing_slash_trimmed() {
        let client =
            HttpBraceletClient::new("http://localhost:8000/api/devices/", Duration::from_secs(1))
                .unwrap();
        assert_eq!(client.endpoint(), "http://localhost:8000/api/devices");
    }

    #[test]
    fn parse_body_variants() {
        assert_eq!(parse_body(""), Value::Null);
        assert_eq!(parse_body(r#"{"a":1}"#), json!({"a": 1}));
        assert_eq!(parse_body("Unauthorized"), json!("Unauthorized"));
    }

    #[tokio::test]
    async fn authenticate_sends_code_and_header() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/devices/auth")
            .match_header("x-bracelet-id", "ABC123DEF456")
            .match_body(Matcher::Json(json!({"unique_code": "ABC123DEF456"})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"success":true,"bracelet":{"id":3}}"#)
            .create_async()
            .await;

        let resp = client_for(&server).authenticate(&code()).await.unwrap();
        assert_eq!(resp.status, 200);
        assert_eq!(resp.body["bracelet"]["id"], 3);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn heartbeat_posts_telemetry() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/devices/heartbeat")
            .match_header("x-bracelet-id", "ABC123DEF456")
            .match_body(Matcher::Json(json!({
                "battery_level": 97,
                "latitude": 48.85661234,
                "longitude": 2.35221234,
                "accuracy": 15
            })))
            .with_status(200)
            .create_async()
            .await;

        let resp = client_for(&server)
            .heartbeat(&code(), &report())
            .await
            .unwrap();
        assert_eq!(resp.status, 200);
        assert_eq!(resp.body, Value::Null);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn button_paths_per_button() {
        let mut server = mockito::Server::new_async().await;
        let client = client_for(&server);

        for button in Button::ALL {
            let mock = server
                .mock("POST", format!("/api/devices/button/{}", button.path_segment()).as_str())
                .match_header("x-bracelet-id", "ABC123DEF456")
                .with_status(201)
                .with_body(r#"{"event_id":1}"#)
                .create_async()
                .await;

            let resp = client.press_button(&code(), button, &report()).await.unwrap();
            assert_eq!(resp.status, 201);
            mock.assert_async().await;
        }
    }

    #[tokio::test]
    async fn danger_update_omits_battery() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/devices/danger/update")
            .match_body(Matcher::Json(json!({
                "latitude": 48.857,
                "longitude": 2.353,
                "accuracy": 9
            })))
            .with_status(200)
            .create_async()
            .await;

        let update = LocationReport {
            latitude: 48.857,
            longitude: 2.353,
            accuracy: 9,
        };
        let resp = client_for(&server)
            .update_danger_location(&code(), &update)
            .await
            .unwrap();
        assert_eq!(resp.status, 200);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn poll_commands_uses_get() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/devices/commands")
            .match_header("x-bracelet-id", "ABC123DEF456")
            .with_status(200)
            .with_body(r#"{"command":"vibrate_sos","command_id":42}"#)
            .create_async()
            .await;

        let resp = client_for(&server).poll_commands(&code()).await.unwrap();
        assert_eq!(resp.body["command"], "vibrate_sos");
        assert_eq!(resp.body["command_id"], 42);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn acknowledge_builds_path_from_id() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/devices/commands/42/ack")
            .match_header("x-bracelet-id", "ABC123DEF456")
            .with_status(200)
            .create_async()
            .await;

        let resp = client_for(&server)
            .acknowledge_command(&code(), &CommandId::from(42u64))
            .await
            .unwrap();
        assert_eq!(resp.status, 200);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn rejected_status_is_not_an_error() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/devices/auth")
            .with_status(404)
            .with_body("Bracelet not found")
            .create_async()
            .await;

        let resp = client_for(&server).authenticate(&code()).await.unwrap();
        assert_eq!(resp.status, 404);
        assert_eq!(resp.body_text(), "Bracelet not found");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn unreachable_backend_is_network_error() {
        let client =
            HttpBraceletClient::new("http://127.0.0.1:1/api/devices", Duration::from_secs(2))
                .unwrap();
        let err = client.poll_commands(&code()).await.unwrap_err();
        assert_matches!(err, CoreError::Network(_) | CoreError::Timeout { .. });
    }

    #[tokio::test]
    async fn slow_backend_hits_timeout() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/devices/heartbeat")
            .with_status(200)
            .with_chunked_body(|w| {
                use std::io::Write;
                std::thread::sleep(std::time::Duration::from_millis(500));
                w.write_all(b"{}")
            })
            .create_async()
            .await;

        let client = HttpBraceletClient::new(
            &format!("{}/api/devices", server.url()),
            Duration::from_millis(100),
        )
        .unwrap();
        let err = client.heartbeat(&code(), &report()).await.unwrap_err();
        assert_matches!(err, CoreError::Timeout { .. } | CoreError::Network(_));
    }
}
