//! 백엔드 원격 명령.
//!
//! 폴링 응답(`{command?, command_id?, led_color?, led_pattern?}`)을 닫힌 열거형으로 디코딩한다.
//! 알 수 없는 명령 종류는 `CommandKind::Unknown`으로 보존되어 실행되지 않는다.

use serde::{Deserialize, Serialize};
use std::fmt;

/// 명령 식별자. 백엔드가 내려준 JSON 숫자(음수, 소수 포함) 또는 문자열을 그대로 보존한다
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CommandId {
    Number(serde_json::Number),
    Text(String),
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandId::Number(n) => write!(f, "{n}"),
            CommandId::Text(s) => f.write_str(s),
        }
    }
}

impl From<u64> for CommandId {
    fn from(value: u64) -> Self {
        CommandId::Number(value.into())
    }
}

impl From<&str> for CommandId {
    fn from(value: &str) -> Self {
        CommandId::Text(value.to_string())
    }
}

/// 명령 종류
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandKind {
    VibrateShort,
    VibrateMedium,
    VibrateSos,
    LedOn,
    LedBlink,
    /// 이 클라이언트가 모르는 명령 (원본 문자열 보존)
    Unknown(String),
}

impl CommandKind {
    /// 와이어 문자열에서 디코딩
    pub fn from_wire(value: &str) -> Self {
        match value {
            "vibrate_short" => CommandKind::VibrateShort,
            "vibrate_medium" => CommandKind::VibrateMedium,
            "vibrate_sos" => CommandKind::VibrateSos,
            "led_on" => CommandKind::LedOn,
            "led_blink" => CommandKind::LedBlink,
            other => CommandKind::Unknown(other.to_string()),
        }
    }

    pub fn as_wire(&self) -> &str {
        match self {
            CommandKind::VibrateShort => "vibrate_short",
            CommandKind::VibrateMedium => "vibrate_medium",
            CommandKind::VibrateSos => "vibrate_sos",
            CommandKind::LedOn => "led_on",
            CommandKind::LedBlink => "led_blink",
            CommandKind::Unknown(other) => other,
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

/// `GET /commands` 응답 본문
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommandPollResponse {
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub command_id: Option<CommandId>,
    /// LED 색상 (백엔드 키는 `led_color`)
    #[serde(default, alias = "led_color")]
    pub color: Option<String>,
    /// LED 점멸 패턴 (백엔드 키는 `led_pattern`)
    #[serde(default, alias = "led_pattern")]
    pub pattern: Option<String>,
}

impl CommandPollResponse {
    /// 대기 중인 명령으로 변환 — 명령이 없거나 빈 문자열이면 None
    pub fn into_command(self) -> Option<PolledCommand> {
        let command = self.command.filter(|c| !c.trim().is_empty())?;
        Some(PolledCommand {
            kind: CommandKind::from_wire(command.trim()),
            id: self.command_id,
            color: self.color,
            pattern: self.pattern,
        })
    }
}

/// 폴링으로 수신한 명령
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolledCommand {
    pub kind: CommandKind,
    /// 확인(ack)용 식별자
    pub id: Option<CommandId>,
    pub color: Option<String>,
    pub pattern: Option<String>,
}
