//! 디바이스 세션.
//!
//! 식별 정보, 인증 상태, 텔레메트리, 상태 머신, 액추에이터, 감사 로그를 단독 소유하고
//! 백엔드 프로토콜 연산을 노출한다. 모든 네트워크 연산은 호출당 정확히 한 개의
//! 감사 항목을 남기며 `Err`를 돌려주지 않는다.

use std::sync::Arc;

use bracelet_core::config::AppConfig;
use bracelet_core::error::CoreError;
use bracelet_core::models::actuator::ActuatorState;
use bracelet_core::models::audit::{AuditAction, AuditLog, Outcome};
use bracelet_core::models::identity::{DeviceIdentity, UniqueCode};
use bracelet_core::models::snapshot::SessionSnapshot;
use bracelet_core::models::status::{Button, DeviceStatus};
use bracelet_core::models::telemetry::{
    Telemetry, DANGER_ACCURACY_RANGE, DANGER_DRIFT_DEGREES, HEARTBEAT_DRAIN_RANGE,
    HEARTBEAT_DRIFT_DEGREES,
};
use bracelet_core::ports::backend::{BackendResponse, BraceletBackend};
use bracelet_core::ports::random::RandomSource;
use serde_json::{json, Value};
use tracing::debug;

pub(crate) const NOT_AUTHENTICATED: &str = "not authenticated";
const NOT_IN_EMERGENCY: &str = "status is not emergency";

/// 백엔드 호출 결과 분류
pub(crate) enum CallOutcome {
    /// 성공 상태 코드
    Accepted(BackendResponse),
    /// 도달했지만 성공 코드가 아님
    Rejected(BackendResponse),
    /// 전송 계층 실패
    Transport(CoreError),
}

impl CallOutcome {
    pub(crate) fn classify(result: Result<BackendResponse, CoreError>, success: &[u16]) -> Self {
        match result {
            Ok(resp) if success.contains(&resp.status) => CallOutcome::Accepted(resp),
            Ok(resp) => CallOutcome::Rejected(resp),
            Err(e) => CallOutcome::Transport(e),
        }
    }

    pub(crate) fn outcome(&self) -> Outcome {
        match self {
            CallOutcome::Accepted(_) => Outcome::Success,
            CallOutcome::Rejected(_) => Outcome::Failed,
            CallOutcome::Transport(_) => Outcome::Error,
        }
    }
}

/// 시뮬레이션 디바이스 세션
pub struct DeviceSession {
    pub(crate) identity: DeviceIdentity,
    pub(crate) telemetry: Telemetry,
    pub(crate) status: DeviceStatus,
    pub(crate) authenticated: bool,
    pub(crate) actuators: ActuatorState,
    pub(crate) log: AuditLog,
    pub(crate) backend: Arc<dyn BraceletBackend>,
    pub(crate) random: Box<dyn RandomSource>,
}

impl DeviceSession {
    /// 새 세션 생성 (미인증, 상태 active)
    pub fn new(
        identity: DeviceIdentity,
        telemetry: Telemetry,
        backend: Arc<dyn BraceletBackend>,
        random: Box<dyn RandomSource>,
    ) -> Self {
        Self {
            identity,
            telemetry,
            status: DeviceStatus::Active,
            authenticated: false,
            actuators: ActuatorState::default(),
            log: AuditLog::new(),
            backend,
            random,
        }
    }

    /// 설정의 초기 텔레메트리로 세션 생성
    pub fn from_config(
        config: &AppConfig,
        identity: DeviceIdentity,
        backend: Arc<dyn BraceletBackend>,
        random: Box<dyn RandomSource>,
    ) -> Self {
        Self::new(identity, Telemetry::from_config(&config.device), backend, random)
    }

    pub fn identity(&self) -> &DeviceIdentity {
        &self.identity
    }

    pub fn unique_code(&self) -> &UniqueCode {
        &self.identity.unique_code
    }

    pub fn telemetry(&self) -> &Telemetry {
        &self.telemetry
    }

    pub fn status(&self) -> DeviceStatus {
        self.status
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn actuators(&self) -> &ActuatorState {
        &self.actuators
    }

    pub fn log(&self) -> &AuditLog {
        &self.log
    }

    /// 인증
    ///
    /// 200이면 인증 플래그를 세운다. 한번 인증되면 이후 실패로 되돌리지 않는다.
    pub async fn authenticate(&mut self) -> bool {
        let result = self.backend.authenticate(&self.identity.unique_code).await;

        let outcome = CallOutcome::classify(result, &[200]);
        let action = AuditAction::auth(outcome.outcome());
        let accepted = matches!(outcome, CallOutcome::Accepted(_));
        let details = match outcome {
            CallOutcome::Accepted(resp) => resp.body,
            CallOutcome::Rejected(resp) => {
                json!({"status": resp.status, "error": resp.body_text()})
            }
            CallOutcome::Transport(e) => json!({"error": e.to_string()}),
        };
        if accepted {
            self.authenticated = true;
        }
        self.log.append(action, details);
        accepted
    }

    /// 하트비트
    ///
    /// 배터리 소모와 위치 드리프트는 보고 결과와 무관하게 먼저 적용된다.
    pub async fn send_heartbeat(&mut self) -> bool {
        if !self.authenticated {
            self.skip(AuditAction::HeartbeatSkipped, json!({"reason": NOT_AUTHENTICATED}));
            return false;
        }

        let (low, high) = HEARTBEAT_DRAIN_RANGE;
        let drain = self.random.range_u32(low, high).min(u32::from(u8::MAX)) as u8;
        self.telemetry.drain_battery(drain);
        let delta_lat = self
            .random
            .range_f64(-HEARTBEAT_DRIFT_DEGREES, HEARTBEAT_DRIFT_DEGREES);
        let delta_lon = self
            .random
            .range_f64(-HEARTBEAT_DRIFT_DEGREES, HEARTBEAT_DRIFT_DEGREES);
        self.telemetry.location.shift(delta_lat, delta_lon);
        debug!(
            "하트비트 텔레메트리: battery={} (-{drain})",
            self.telemetry.battery_level
        );

        let report = self.telemetry.report();
        let result = self
            .backend
            .heartbeat(&self.identity.unique_code, &report)
            .await;

        let outcome = CallOutcome::classify(result, &[200]);
        let details = match &outcome {
            CallOutcome::Accepted(_) => json!({
                "battery": report.battery_level,
                "location": [report.latitude, report.longitude],
            }),
            CallOutcome::Rejected(resp) => json!({"status": resp.status}),
            CallOutcome::Transport(e) => json!({"error": e.to_string()}),
        };
        self.log.append(AuditAction::heartbeat(outcome.outcome()), details);
        matches!(outcome, CallOutcome::Accepted(_))
    }

    /// 버튼 입력
    ///
    /// 성공(200/201)일 때만 상태를 전이한다. 같은 버튼 반복은 재보고일 뿐이다.
    pub async fn press_button(&mut self, button: Button) -> bool {
        if !self.authenticated {
            self.skip(
                AuditAction::button(button, Outcome::Skipped),
                json!({"reason": NOT_AUTHENTICATED}),
            );
            return false;
        }

        let report = self.telemetry.report();
        let result = self
            .backend
            .press_button(&self.identity.unique_code, button, &report)
            .await;

        let outcome = CallOutcome::classify(result, &[200, 201]);
        let action = AuditAction::button(button, outcome.outcome());
        match outcome {
            CallOutcome::Accepted(resp) => {
                let previous = self.status;
                self.status = previous.after_press(button);
                debug!("상태 전이: {previous} -> {} ({button})", self.status);
                self.log.append(action, resp.body);
                true
            }
            CallOutcome::Rejected(resp) => {
                self.log.append(action, json!({"status": resp.status}));
                false
            }
            CallOutcome::Transport(e) => {
                self.log.append(action, json!({"error": e.to_string()}));
                false
            }
        }
    }

    pub async fn button_arrived(&mut self) -> bool {
        self.press_button(Button::Arrived).await
    }

    pub async fn button_lost(&mut self) -> bool {
        self.press_button(Button::Lost).await
    }

    pub async fn button_danger(&mut self) -> bool {
        self.press_button(Button::Danger).await
    }

    /// 긴급 상태 위치 갱신
    ///
    /// 인증되어 있고 상태가 emergency일 때만 드리프트(±0.001°)와 정확도 재추첨 후 보고한다.
    pub async fn update_danger_location(&mut self) -> bool {
        if !self.authenticated {
            self.skip(
                AuditAction::DangerUpdateSkipped,
                json!({"reason": NOT_AUTHENTICATED}),
            );
            return false;
        }
        if self.status != DeviceStatus::Emergency {
            self.skip(
                AuditAction::DangerUpdateSkipped,
                json!({"reason": NOT_IN_EMERGENCY, "status": self.status}),
            );
            return false;
        }

        let delta_lat = self
            .random
            .range_f64(-DANGER_DRIFT_DEGREES, DANGER_DRIFT_DEGREES);
        let delta_lon = self
            .random
            .range_f64(-DANGER_DRIFT_DEGREES, DANGER_DRIFT_DEGREES);
        self.telemetry.location.shift(delta_lat, delta_lon);
        let (low, high) = DANGER_ACCURACY_RANGE;
        self.telemetry.location.accuracy = self.random.range_u32(low, high);

        let report = self.telemetry.location_report();
        let result = self
            .backend
            .update_danger_location(&self.identity.unique_code, &report)
            .await;

        let outcome = CallOutcome::classify(result, &[200]);
        let details = match &outcome {
            CallOutcome::Accepted(_) => json!({
                "location": [report.latitude, report.longitude],
                "accuracy": report.accuracy,
            }),
            CallOutcome::Rejected(resp) => json!({"status": resp.status}),
            CallOutcome::Transport(e) => json!({"error": e.to_string()}),
        };
        self.log
            .append(AuditAction::danger_update(outcome.outcome()), details);
        matches!(outcome, CallOutcome::Accepted(_))
    }

    /// 관리자 배터리 리셋 (배터리가 증가하는 유일한 경로)
    pub fn reset_battery(&mut self, level: u8) {
        let from = self.telemetry.battery_level;
        self.telemetry.reset_battery(level);
        self.log.append(
            AuditAction::BatteryReset,
            json!({"from": from, "to": self.telemetry.battery_level}),
        );
    }

    /// 종료 스냅샷
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            bracelet_id: self.identity.unique_code.to_string(),
            name: self.identity.name.clone(),
            final_battery: self.telemetry.battery_level,
            final_status: self.status,
            final_location: self.telemetry.location.rounded(),
            log_entries: self.log.entries().to_vec(),
        }
    }

    pub(crate) fn skip(&mut self, action: AuditAction, details: Value) {
        self.log.append(action, details);
    }
}
