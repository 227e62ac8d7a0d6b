//! 감사 로그.
//!
//! 프로토콜 이벤트를 시각 순서대로 기록하는 append-only 로그.
//! 추가(`append`)가 유일한 변경 연산이며 항목은 삭제되거나 재정렬되지 않는다.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use tracing::{info, warn};

use crate::models::status::Button;

/// 감사 항목 상세 정보
pub type AuditDetails = Map<String, Value>;

/// 작업 결과 분류
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// 성공 상태 코드
    Success,
    /// 백엔드 응답은 받았으나 실패 상태 코드
    Failed,
    /// 전송 실패 (연결 불가, 타임아웃, 잘못된 응답)
    Error,
    /// 전제 조건 미충족으로 실행하지 않음
    Skipped,
}

/// 감사 액션
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    Authenticated,
    AuthFailed,
    AuthError,

    HeartbeatOk,
    HeartbeatFailed,
    HeartbeatError,
    HeartbeatSkipped,

    ButtonArrivedPressed,
    ButtonArrivedFailed,
    ButtonArrivedError,
    ButtonArrivedSkipped,
    ButtonLostPressed,
    ButtonLostFailed,
    ButtonLostError,
    ButtonLostSkipped,
    ButtonDangerPressed,
    ButtonDangerFailed,
    ButtonDangerError,
    ButtonDangerSkipped,

    DangerUpdateOk,
    DangerUpdateFailed,
    DangerUpdateError,
    DangerUpdateSkipped,

    CommandReceived,
    NoPendingCommands,
    CommandCheckFailed,
    CommandCheckError,
    CommandCheckSkipped,
    CommandIgnored,

    VibrateShort,
    VibrateMedium,
    VibrateSos,
    LedOn,
    LedBlink,
    LedOff,

    CommandAcknowledged,
    AckFailed,
    AckError,
    AckSkipped,

    BatteryReset,
}

impl AuditAction {
    /// 와이어/파일 표기 (예: `HEARTBEAT_OK`)
    pub fn as_str(&self) -> &'static str {
        use AuditAction::*;
        match self {
            Authenticated => "AUTHENTICATED",
            AuthFailed => "AUTH_FAILED",
            AuthError => "AUTH_ERROR",
            HeartbeatOk => "HEARTBEAT_OK",
            HeartbeatFailed => "HEARTBEAT_FAILED",
            HeartbeatError => "HEARTBEAT_ERROR",
            HeartbeatSkipped => "HEARTBEAT_SKIPPED",
            ButtonArrivedPressed => "BUTTON_ARRIVED_PRESSED",
            ButtonArrivedFailed => "BUTTON_ARRIVED_FAILED",
            ButtonArrivedError => "BUTTON_ARRIVED_ERROR",
            ButtonArrivedSkipped => "BUTTON_ARRIVED_SKIPPED",
            ButtonLostPressed => "BUTTON_LOST_PRESSED",
            ButtonLostFailed => "BUTTON_LOST_FAILED",
            ButtonLostError => "BUTTON_LOST_ERROR",
            ButtonLostSkipped => "BUTTON_LOST_SKIPPED",
            ButtonDangerPressed => "BUTTON_DANGER_PRESSED",
            ButtonDangerFailed => "BUTTON_DANGER_FAILED",
            ButtonDangerError => "BUTTON_DANGER_ERROR",
            ButtonDangerSkipped => "BUTTON_DANGER_SKIPPED",
            DangerUpdateOk => "DANGER_UPDATE_OK",
            DangerUpdateFailed => "DANGER_UPDATE_FAILED",
            DangerUpdateError => "DANGER_UPDATE_ERROR",
            DangerUpdateSkipped => "DANGER_UPDATE_SKIPPED",
            CommandReceived => "COMMAND_RECEIVED",
            NoPendingCommands => "NO_PENDING_COMMANDS",
            CommandCheckFailed => "COMMAND_CHECK_FAILED",
            CommandCheckError => "COMMAND_CHECK_ERROR",
            CommandCheckSkipped => "COMMAND_CHECK_SKIPPED",
            CommandIgnored => "COMMAND_IGNORED",
            VibrateShort => "VIBRATE_SHORT",
            VibrateMedium => "VIBRATE_MEDIUM",
            VibrateSos => "VIBRATE_SOS",
            LedOn => "LED_ON",
            LedBlink => "LED_BLINK",
            LedOff => "LED_OFF",
            CommandAcknowledged => "COMMAND_ACKNOWLEDGED",
            AckFailed => "ACK_FAILED",
            AckError => "ACK_ERROR",
            AckSkipped => "ACK_SKIPPED",
            BatteryReset => "BATTERY_RESET",
        }
    }

    /// 인증 결과 액션 (인증에는 스킵이 없다)
    pub fn auth(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Success => AuditAction::Authenticated,
            Outcome::Failed | Outcome::Skipped => AuditAction::AuthFailed,
            Outcome::Error => AuditAction::AuthError,
        }
    }

    pub fn heartbeat(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Success => AuditAction::HeartbeatOk,
            Outcome::Failed => AuditAction::HeartbeatFailed,
            Outcome::Error => AuditAction::HeartbeatError,
            Outcome::Skipped => AuditAction::HeartbeatSkipped,
        }
    }

    pub fn button(button: Button, outcome: Outcome) -> Self {
        use AuditAction::*;
        match (button, outcome) {
            (Button::Arrived, Outcome::Success) => ButtonArrivedPressed,
            (Button::Arrived, Outcome::Failed) => ButtonArrivedFailed,
            (Button::Arrived, Outcome::Error) => ButtonArrivedError,
            (Button::Arrived, Outcome::Skipped) => ButtonArrivedSkipped,
            (Button::Lost, Outcome::Success) => ButtonLostPressed,
            (Button::Lost, Outcome::Failed) => ButtonLostFailed,
            (Button::Lost, Outcome::Error) => ButtonLostError,
            (Button::Lost, Outcome::Skipped) => ButtonLostSkipped,
            (Button::Danger, Outcome::Success) => ButtonDangerPressed,
            (Button::Danger, Outcome::Failed) => ButtonDangerFailed,
            (Button::Danger, Outcome::Error) => ButtonDangerError,
            (Button::Danger, Outcome::Skipped) => ButtonDangerSkipped,
        }
    }

    pub fn danger_update(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Success => AuditAction::DangerUpdateOk,
            Outcome::Failed => AuditAction::DangerUpdateFailed,
            Outcome::Error => AuditAction::DangerUpdateError,
            Outcome::Skipped => AuditAction::DangerUpdateSkipped,
        }
    }

    pub fn acknowledge(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Success => AuditAction::CommandAcknowledged,
            Outcome::Failed => AuditAction::AckFailed,
            Outcome::Error => AuditAction::AckError,
            Outcome::Skipped => AuditAction::AckSkipped,
        }
    }

    /// 실패/에러/스킵 계열 여부
    pub fn is_failure(&self) -> bool {
        let name = self.as_str();
        name.ends_with("_FAILED") || name.ends_with("_ERROR") || name.ends_with("_SKIPPED")
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 감사 로그 항목 (추가 후 불변)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// 기록 시각
    pub timestamp: DateTime<Utc>,
    /// 액션
    pub action: AuditAction,
    /// 상세 정보
    #[serde(default)]
    pub details: AuditDetails,
}

/// JSON 값을 상세 정보 맵으로 변환
///
/// 객체는 그대로, null은 빈 맵, 그 외 값은 `{"response": 값}`으로 감싼다.
pub fn details_from(value: Value) -> AuditDetails {
    match value {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => {
            let mut map = Map::new();
            map.insert("response".to_string(), other);
            map
        }
    }
}

/// append-only 감사 로그
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuditLog {
    entries: Vec<AuditEntry>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// 항목 추가 (현재 시각, tracing 이벤트 동시 기록)
    pub fn append(&mut self, action: AuditAction, details: Value) -> &AuditEntry {
        let entry = AuditEntry {
            timestamp: Utc::now(),
            action,
            details: details_from(details),
        };

        let details_text = Value::Object(entry.details.clone());
        if action.is_failure() {
            warn!(action = %action, details = %details_text, "감사 로그");
        } else {
            info!(action = %action, details = %details_text, "감사 로그");
        }

        self.entries.push(entry);
        &self.entries[self.entries.len() - 1]
    }

    /// 전체 항목 (기록 순서)
    pub fn entries(&self) -> &[AuditEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&AuditEntry> {
        self.entries.last()
    }

    /// 최근 N개 항목 (기록 순서 유지)
    pub fn recent(&self, limit: usize) -> &[AuditEntry] {
        let start = self.entries.len().saturating_sub(limit);
        &self.entries[start..]
    }

    /// `index` 이후에 추가된 항목
    pub fn since(&self, index: usize) -> &[AuditEntry] {
        &self.entries[index.min(self.entries.len())..]
    }

    /// 특정 액션 항목 수
    pub fn count(&self, action: AuditAction) -> usize {
        self.entries.iter().filter(|e| e.action == action).count()
    }

    /// 액션 이름 목록 (기록 순서)
    pub fn actions(&self) -> Vec<AuditAction> {
        self.entries.iter().map(|e| e.action).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serde_names_match_display() {
        for action in [
            AuditAction::Authenticated,
            AuditAction::HeartbeatOk,
            AuditAction::ButtonLostPressed,
            AuditAction::VibrateSos,
            AuditAction::LedOn,
            AuditAction::AckFailed,
            AuditAction::NoPendingCommands,
            AuditAction::DangerUpdateSkipped,
        ] {
            let json = serde_json::to_string(&action).unwrap();
            assert_eq!(json, format!("\"{}\"", action.as_str()));
        }
    }

    #[test]
    fn outcome_mapping_for_buttons() {
        assert_eq!(
            AuditAction::button(Button::Danger, Outcome::Success),
            AuditAction::ButtonDangerPressed
        );
        assert_eq!(
            AuditAction::button(Button::Arrived, Outcome::Skipped),
            AuditAction::ButtonArrivedSkipped
        );
        assert_eq!(
            AuditAction::button(Button::Lost, Outcome::Error),
            AuditAction::ButtonLostError
        );
    }

    #[test]
    fn outcome_mapping_for_auth() {
        assert_eq!(AuditAction::auth(Outcome::Success), AuditAction::Authenticated);
        assert_eq!(AuditAction::auth(Outcome::Failed), AuditAction::AuthFailed);
        assert_eq!(AuditAction::auth(Outcome::Error), AuditAction::AuthError);
    }

    #[test]
    fn failure_classification() {
        assert!(AuditAction::HeartbeatSkipped.is_failure());
        assert!(AuditAction::AckError.is_failure());
        assert!(AuditAction::AuthFailed.is_failure());
        assert!(!AuditAction::ButtonDangerPressed.is_failure());
        assert!(!AuditAction::NoPendingCommands.is_failure());
    }

    #[test]
    fn append_preserves_order() {
        let mut log = AuditLog::new();
        log.append(AuditAction::Authenticated, json!({"ok": true}));
        log.append(AuditAction::HeartbeatOk, json!({"battery": 98}));
        log.append(AuditAction::NoPendingCommands, Value::Null);

        assert_eq!(
            log.actions(),
            vec![
                AuditAction::Authenticated,
                AuditAction::HeartbeatOk,
                AuditAction::NoPendingCommands
            ]
        );
        assert!(log.entries()[2].details.is_empty());
        assert!(log.entries()[0].timestamp <= log.entries()[1].timestamp);
        assert_eq!(log.since(1).len(), 2);
        assert_eq!(log.recent(1)[0].action, AuditAction::NoPendingCommands);
        assert_eq!(log.recent(10).len(), 3);
    }

    #[test]
    fn non_object_details_are_wrapped() {
        let details = details_from(json!("ok"));
        assert_eq!(details["response"], "ok");
    }

    #[test]
    fn entry_serializes_with_action_name() {
        let mut log = AuditLog::new();
        log.append(AuditAction::VibrateSos, json!({"pattern": "SOS"}));
        let value = serde_json::to_value(&log).unwrap();
        assert_eq!(value[0]["action"], "VIBRATE_SOS");
        assert_eq!(value[0]["details"]["pattern"], "SOS");
        assert!(value[0]["timestamp"].is_string());
    }
}
