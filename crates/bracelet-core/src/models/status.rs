//! 디바이스 상태와 물리 버튼.
//!
//! 상태 전이는 버튼 입력으로만 일어난다. 전이 표는 전체 함수다:
//! 어느 상태에서든 버튼을 누르면 그 버튼의 목표 상태가 된다 (같은 버튼 반복 포함).

use serde::{Deserialize, Serialize};
use std::fmt;

/// 디바이스 상태
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    /// 정상 (초기 상태)
    #[default]
    Active,
    /// 길을 잃음
    Lost,
    /// 위험/긴급
    Emergency,
}

impl DeviceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceStatus::Active => "active",
            DeviceStatus::Lost => "lost",
            DeviceStatus::Emergency => "emergency",
        }
    }

    /// 버튼 입력 후 상태
    pub fn after_press(self, button: Button) -> DeviceStatus {
        button.target_status()
    }
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 브레이슬릿 물리 버튼
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Button {
    /// 버튼 1: 안전 도착
    Arrived,
    /// 버튼 2: 길 잃음
    Lost,
    /// 버튼 3: 위험
    Danger,
}

impl Button {
    pub const ALL: [Button; 3] = [Button::Arrived, Button::Lost, Button::Danger];

    /// 백엔드 경로 세그먼트 (`/button/{segment}`)
    pub fn path_segment(&self) -> &'static str {
        match self {
            Button::Arrived => "arrived",
            Button::Lost => "lost",
            Button::Danger => "danger",
        }
    }

    /// 성공 시 전이될 상태
    pub fn target_status(&self) -> DeviceStatus {
        match self {
            Button::Arrived => DeviceStatus::Active,
            Button::Lost => DeviceStatus::Lost,
            Button::Danger => DeviceStatus::Emergency,
        }
    }
}

impl fmt::Display for Button {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path_segment())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_table() {
        use Button::{Arrived, Danger};
        use DeviceStatus::{Active, Emergency};

        let table = [
            (Active, Button::Lost, DeviceStatus::Lost),
            (Active, Danger, Emergency),
            (DeviceStatus::Lost, Arrived, Active),
            (DeviceStatus::Lost, Danger, Emergency),
            (Emergency, Arrived, Active),
            (Emergency, Button::Lost, DeviceStatus::Lost),
            (Active, Arrived, Active),
            (DeviceStatus::Lost, Button::Lost, DeviceStatus::Lost),
            (Emergency, Danger, Emergency),
        ];
        for (from, button, to) in table {
            assert_eq!(from.after_press(button), to, "{from} --{button}-->");
        }
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&DeviceStatus::Emergency).unwrap(),
            r#""emergency""#
        );
        assert_eq!(DeviceStatus::default(), DeviceStatus::Active);
    }
}
