//! 단위 테스트용 가짜 백엔드.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use bracelet_core::config::DeviceConfig;
use bracelet_core::error::CoreError;
use bracelet_core::models::command::CommandId;
use bracelet_core::models::identity::{DeviceIdentity, UniqueCode};
use bracelet_core::models::status::Button;
use bracelet_core::models::telemetry::{LocationReport, Telemetry, TelemetryReport};
use bracelet_core::ports::backend::{BackendResponse, BraceletBackend};
use bracelet_core::ports::random::ScriptedRandom;
use parking_lot::Mutex;
use serde_json::{json, Value};

use crate::session::DeviceSession;

pub(crate) const TEST_CODE: &str = "ABC123DEF456";

/// 엔드포인트 구분
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Endpoint {
    Auth,
    Heartbeat,
    Button(Button),
    DangerUpdate,
    Poll,
    Ack,
}

/// 스크립트 응답
#[derive(Debug, Clone)]
pub(crate) enum Reply {
    Status(u16, Value),
    Timeout,
    Unreachable,
}

impl Reply {
    fn into_result(self) -> Result<BackendResponse, CoreError> {
        match self {
            Reply::Status(status, body) => Ok(BackendResponse::new(status, body)),
            Reply::Timeout => Err(CoreError::Timeout { timeout_ms: 10_000 }),
            Reply::Unreachable => Err(CoreError::Network("connection refused".to_string())),
        }
    }
}

/// 기록된 호출
#[derive(Debug, Clone)]
pub(crate) struct Call {
    pub endpoint: Endpoint,
    pub bracelet_id: String,
    pub body: Value,
    pub command_id: Option<CommandId>,
}

#[derive(Default)]
struct FakeState {
    defaults: HashMap<Endpoint, Reply>,
    queued: HashMap<Endpoint, VecDeque<Reply>>,
    calls: Vec<Call>,
}

/// 엔드포인트별 응답을 스크립트로 지정하는 백엔드
#[derive(Default)]
pub(crate) struct FakeBackend {
    state: Mutex<FakeState>,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// 기본 응답 교체
    pub fn set(&self, endpoint: Endpoint, reply: Reply) {
        self.state.lock().defaults.insert(endpoint, reply);
    }

    /// 1회성 응답 추가 (기본 응답보다 우선)
    pub fn push(&self, endpoint: Endpoint, reply: Reply) {
        self.state
            .lock()
            .queued
            .entry(endpoint)
            .or_default()
            .push_back(reply);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }

    pub fn count(&self, endpoint: Endpoint) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|c| c.endpoint == endpoint)
            .count()
    }

    fn record(
        &self,
        endpoint: Endpoint,
        code: &UniqueCode,
        body: Value,
        command_id: Option<CommandId>,
    ) -> Result<BackendResponse, CoreError> {
        let mut state = self.state.lock();
        state.calls.push(Call {
            endpoint,
            bracelet_id: code.as_str().to_string(),
            body,
            command_id,
        });
        let queued = state.queued.get_mut(&endpoint).and_then(|q| q.pop_front());
        let reply = queued
            .or_else(|| state.defaults.get(&endpoint).cloned())
            .unwrap_or_else(|| default_reply(endpoint));
        reply.into_result()
    }
}

fn default_reply(endpoint: Endpoint) -> Reply {
    match endpoint {
        Endpoint::Auth => Reply::Status(200, json!({"success": true, "bracelet": {"id": 1}})),
        Endpoint::Button(_) => Reply::Status(201, json!({"event_id": 1})),
        Endpoint::Poll => Reply::Status(200, json!({})),
        _ => Reply::Status(200, json!({"success": true})),
    }
}

#[async_trait]
impl BraceletBackend for FakeBackend {
    async fn authenticate(&self, code: &UniqueCode) -> Result<BackendResponse, CoreError> {
        let body = json!({"unique_code": code.as_str()});
        self.record(Endpoint::Auth, code, body, None)
    }

    async fn heartbeat(
        &self,
        code: &UniqueCode,
        report: &TelemetryReport,
    ) -> Result<BackendResponse, CoreError> {
        let body = serde_json::to_value(report)?;
        self.record(Endpoint::Heartbeat, code, body, None)
    }

    async fn press_button(
        &self,
        code: &UniqueCode,
        button: Button,
        report: &TelemetryReport,
    ) -> Result<BackendResponse, CoreError> {
        let body = serde_json::to_value(report)?;
        self.record(Endpoint::Button(button), code, body, None)
    }

    async fn update_danger_location(
        &self,
        code: &UniqueCode,
        report: &LocationReport,
    ) -> Result<BackendResponse, CoreError> {
        let body = serde_json::to_value(report)?;
        self.record(Endpoint::DangerUpdate, code, body, None)
    }

    async fn poll_commands(&self, code: &UniqueCode) -> Result<BackendResponse, CoreError> {
        self.record(Endpoint::Poll, code, Value::Null, None)
    }

    async fn acknowledge_command(
        &self,
        code: &UniqueCode,
        command_id: &CommandId,
    ) -> Result<BackendResponse, CoreError> {
        self.record(Endpoint::Ack, code, Value::Null, Some(command_id.clone()))
    }
}

/// 기본 설정(파리, 배터리 100)의 미인증 세션
pub(crate) fn session_with(backend: Arc<FakeBackend>, random: ScriptedRandom) -> DeviceSession {
    let identity = DeviceIdentity::new(UniqueCode::parse(TEST_CODE).unwrap(), None);
    DeviceSession::new(
        identity,
        Telemetry::from_config(&DeviceConfig::default()),
        backend,
        Box::new(random),
    )
}

/// 인증까지 마친 세션
pub(crate) async fn authenticated_session(
    backend: Arc<FakeBackend>,
    random: ScriptedRandom,
) -> DeviceSession {
    let mut session = session_with(backend, random);
    assert!(session.authenticate().await);
    session
}
