//! 명령 채널.
//!
//! 폴링 → 디코딩 → 실행 → 확인(ack) 하위 프로토콜. 실행기는 로컬 액추에이터 상태를
//! 먼저 바꾸고, 명령 ID가 있으면 곧바로 확인을 보낸다. 확인 실패는 로컬 변경을
//! 되돌리지 않는다.

use bracelet_core::error::CoreError;
use bracelet_core::models::actuator::{
    VibrationPattern, DEFAULT_LED_BLINK_COLOR, DEFAULT_LED_BLINK_PATTERN, DEFAULT_LED_ON_COLOR,
};
use bracelet_core::models::audit::{AuditAction, Outcome};
use bracelet_core::models::command::{CommandId, CommandKind, CommandPollResponse, PolledCommand};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::session::{CallOutcome, DeviceSession, NOT_AUTHENTICATED};

impl DeviceSession {
    /// 대기 중인 명령 폴링
    ///
    /// 명령이 있으면 `COMMAND_RECEIVED`를 남기고 즉시 실행한 뒤 반환한다.
    pub async fn check_commands(&mut self) -> Option<PolledCommand> {
        if !self.authenticated {
            self.skip(
                AuditAction::CommandCheckSkipped,
                json!({"reason": NOT_AUTHENTICATED}),
            );
            return None;
        }

        let result = self.backend.poll_commands(&self.identity.unique_code).await;
        let resp = match CallOutcome::classify(result, &[200]) {
            CallOutcome::Accepted(resp) => resp,
            CallOutcome::Rejected(resp) => {
                self.log
                    .append(AuditAction::CommandCheckFailed, json!({"status": resp.status}));
                return None;
            }
            CallOutcome::Transport(e) => {
                self.log
                    .append(AuditAction::CommandCheckError, json!({"error": e.to_string()}));
                return None;
            }
        };

        let poll = match resp.body {
            Value::Null => CommandPollResponse::default(),
            body => match serde_json::from_value::<CommandPollResponse>(body) {
                Ok(poll) => poll,
                Err(e) => {
                    let err = CoreError::InvalidResponse(format!("invalid command payload: {e}"));
                    warn!("명령 응답 디코딩 실패: {err}");
                    self.log
                        .append(AuditAction::CommandCheckError, json!({"error": err.to_string()}));
                    return None;
                }
            },
        };

        let Some(command) = poll.into_command() else {
            self.log.append(AuditAction::NoPendingCommands, json!({}));
            return None;
        };

        self.log.append(
            AuditAction::CommandReceived,
            json!({"command": command.kind.as_wire(), "id": command.id}),
        );
        self.dispatch(&command).await;
        Some(command)
    }

    /// 명령 종류별 실행기로 분기
    pub async fn dispatch(&mut self, command: &PolledCommand) {
        let id = command.id.clone();
        match &command.kind {
            CommandKind::VibrateShort => self.vibrate(VibrationPattern::Short, id).await,
            CommandKind::VibrateMedium => self.vibrate(VibrationPattern::Medium, id).await,
            CommandKind::VibrateSos => self.vibrate(VibrationPattern::Sos, id).await,
            CommandKind::LedOn => {
                let color = command.color.as_deref().unwrap_or(DEFAULT_LED_ON_COLOR);
                self.led_on(color, id).await
            }
            CommandKind::LedBlink => {
                let color = command.color.as_deref().unwrap_or(DEFAULT_LED_BLINK_COLOR);
                let pattern = command
                    .pattern
                    .as_deref()
                    .unwrap_or(DEFAULT_LED_BLINK_PATTERN);
                self.led_blink(color, pattern, id).await
            }
            CommandKind::Unknown(kind) => {
                warn!("알 수 없는 명령 무시: {kind}");
                self.log.append(
                    AuditAction::CommandIgnored,
                    json!({"command": kind, "id": command.id}),
                );
                None
            }
        };
    }

    /// 진동 실행
    ///
    /// 반환값은 확인 결과 (ID가 없어 확인하지 않았으면 None)
    pub async fn vibrate(
        &mut self,
        pattern: VibrationPattern,
        command_id: Option<CommandId>,
    ) -> Option<bool> {
        self.actuators.vibrate(pattern);
        let action = match pattern {
            VibrationPattern::Short => AuditAction::VibrateShort,
            VibrationPattern::Medium => AuditAction::VibrateMedium,
            VibrationPattern::Sos => AuditAction::VibrateSos,
        };
        debug!("진동: {}", pattern.description());
        self.log
            .append(action, json!({"pattern": pattern.description()}));
        self.acknowledge_if_present(command_id).await
    }

    pub async fn vibrate_short(&mut self, command_id: Option<CommandId>) -> Option<bool> {
        self.vibrate(VibrationPattern::Short, command_id).await
    }

    pub async fn vibrate_medium(&mut self, command_id: Option<CommandId>) -> Option<bool> {
        self.vibrate(VibrationPattern::Medium, command_id).await
    }

    pub async fn vibrate_sos(&mut self, command_id: Option<CommandId>) -> Option<bool> {
        self.vibrate(VibrationPattern::Sos, command_id).await
    }

    /// LED 켜기
    pub async fn led_on(&mut self, color: &str, command_id: Option<CommandId>) -> Option<bool> {
        self.actuators.led_on(color);
        self.log.append(AuditAction::LedOn, json!({"color": color}));
        self.acknowledge_if_present(command_id).await
    }

    /// LED 점멸
    pub async fn led_blink(
        &mut self,
        color: &str,
        pattern: &str,
        command_id: Option<CommandId>,
    ) -> Option<bool> {
        self.actuators.led_blink(color, pattern);
        self.log.append(
            AuditAction::LedBlink,
            json!({"color": color, "pattern": pattern}),
        );
        self.acknowledge_if_present(command_id).await
    }

    /// LED 끄기 (운영자 전용, 확인 없음)
    pub fn led_off(&mut self) {
        self.actuators.led_off();
        self.log.append(AuditAction::LedOff, json!({}));
    }

    /// 명령 확인
    pub async fn acknowledge(&mut self, command_id: &CommandId) -> bool {
        if !self.authenticated {
            self.skip(
                AuditAction::AckSkipped,
                json!({"command_id": command_id, "reason": NOT_AUTHENTICATED}),
            );
            return false;
        }

        let result = self
            .backend
            .acknowledge_command(&self.identity.unique_code, command_id)
            .await;

        let outcome = CallOutcome::classify(result, &[200]);
        let details = match &outcome {
            CallOutcome::Accepted(_) => json!({"command_id": command_id}),
            CallOutcome::Rejected(resp) => {
                json!({"command_id": command_id, "status": resp.status})
            }
            CallOutcome::Transport(e) => {
                json!({"command_id": command_id, "error": e.to_string()})
            }
        };
        self.log
            .append(AuditAction::acknowledge(outcome.outcome()), details);
        matches!(outcome.outcome(), Outcome::Success)
    }

    async fn acknowledge_if_present(&mut self, command_id: Option<CommandId>) -> Option<bool> {
        match command_id {
            Some(id) => Some(self.acknowledge(&id).await),
            None => None,
        }
    }
}
