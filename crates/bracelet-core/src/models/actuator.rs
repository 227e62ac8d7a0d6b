//! 액추에이터 상태 (진동 모터, LED).
//!
//! 관찰 용도로만 유지되며 백엔드 확인 여부와 무관하게 즉시 반영된다.

use serde::{Deserialize, Serialize};

/// 기본 LED 색상 (`led_on`)
pub const DEFAULT_LED_ON_COLOR: &str = "blue";
/// 기본 점멸 색상 (`led_blink`)
pub const DEFAULT_LED_BLINK_COLOR: &str = "red";
/// 기본 점멸 패턴
pub const DEFAULT_LED_BLINK_PATTERN: &str = "fast";

/// 진동 패턴
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VibrationPattern {
    Short,
    Medium,
    Sos,
}

impl VibrationPattern {
    /// 펄스 패턴 설명 (감사 로그용)
    pub fn description(&self) -> &'static str {
        match self {
            VibrationPattern::Short => "100ms",
            VibrationPattern::Medium => "200ms",
            VibrationPattern::Sos => "100-100-100-200-200-200-100-100-100ms",
        }
    }
}

/// LED 상태
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedState {
    /// 켜진 색상 (None이면 꺼짐)
    pub color: Option<String>,
    /// 점멸 중 여부
    pub blinking: bool,
    /// 점멸 패턴
    pub pattern: Option<String>,
}

/// 액추에이터 상태
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActuatorState {
    /// 마지막으로 실행된 진동 패턴
    pub last_vibration: Option<VibrationPattern>,
    /// 누적 진동 횟수
    pub vibration_count: u32,
    /// LED
    pub led: LedState,
}

impl ActuatorState {
    /// 진동 실행 기록
    pub fn vibrate(&mut self, pattern: VibrationPattern) {
        self.last_vibration = Some(pattern);
        self.vibration_count = self.vibration_count.saturating_add(1);
    }

    /// LED 점등
    pub fn led_on(&mut self, color: &str) {
        self.led = LedState {
            color: Some(color.to_string()),
            blinking: false,
            pattern: None,
        };
    }

    /// LED 점멸
    pub fn led_blink(&mut self, color: &str, pattern: &str) {
        self.led = LedState {
            color: Some(color.to_string()),
            blinking: true,
            pattern: Some(pattern.to_string()),
        };
    }

    /// LED 소등
    pub fn led_off(&mut self) {
        self.led = LedState::default();
    }
}
