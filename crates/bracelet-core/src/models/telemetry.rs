//! 디바이스 텔레메트리.
//!
//! 배터리, 위치, 정확도. 백엔드로 전송되는 보고 페이로드 포함.

use serde::{Deserialize, Serialize};

use crate::config::DeviceConfig;

/// 전송 시 좌표 소수점 자릿수
pub const COORDINATE_DECIMALS: i32 = 8;

/// 하트비트 1회 배터리 소모량 범위 (양 끝 포함)
pub const HEARTBEAT_DRAIN_RANGE: (u32, u32) = (1, 3);

/// 하트비트 시 위치 드리프트 최대값 (도)
pub const HEARTBEAT_DRIFT_DEGREES: f64 = 0.0001;

/// 위험 상황 위치 드리프트 최대값 (도)
pub const DANGER_DRIFT_DEGREES: f64 = 0.001;

/// 위험 상황 정확도 범위 (미터, 양 끝 포함)
pub const DANGER_ACCURACY_RANGE: (u32, u32) = (8, 20);

/// 좌표를 전송 정밀도(소수점 8자리)로 반올림
pub fn round_coordinate(value: f64) -> f64 {
    let factor = 10f64.powi(COORDINATE_DECIMALS);
    (value * factor).round() / factor
}

/// 위치 정보
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// 위도
    pub latitude: f64,
    /// 경도
    pub longitude: f64,
    /// 정확도 반경 (미터)
    pub accuracy: u32,
}

impl Location {
    /// 전송 정밀도로 반올림한 사본
    pub fn rounded(&self) -> Self {
        Self {
            latitude: round_coordinate(self.latitude),
            longitude: round_coordinate(self.longitude),
            accuracy: self.accuracy,
        }
    }

    /// 위도/경도에 변위 적용
    pub fn shift(&mut self, delta_latitude: f64, delta_longitude: f64) {
        self.latitude += delta_latitude;
        self.longitude += delta_longitude;
    }
}

/// 디바이스 텔레메트리 (세션이 단독 소유)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Telemetry {
    /// 배터리 잔량 (0~100)
    pub battery_level: u8,
    /// 현재 위치
    pub location: Location,
}

impl Telemetry {
    /// 설정에서 초기 텔레메트리 생성
    pub fn from_config(config: &DeviceConfig) -> Self {
        Self {
            battery_level: config.initial_battery.min(100),
            location: Location {
                latitude: config.initial_latitude,
                longitude: config.initial_longitude,
                accuracy: config.initial_accuracy,
            },
        }
    }

    /// 배터리 소모 (0에서 멈춤)
    pub fn drain_battery(&mut self, amount: u8) {
        self.battery_level = self.battery_level.saturating_sub(amount);
    }

    /// 관리자 배터리 리셋 (100으로 제한)
    pub fn reset_battery(&mut self, level: u8) {
        self.battery_level = level.min(100);
    }

    /// 버튼/하트비트 보고 페이로드
    pub fn report(&self) -> TelemetryReport {
        let location = self.location.rounded();
        TelemetryReport {
            battery_level: self.battery_level,
            latitude: location.latitude,
            longitude: location.longitude,
            accuracy: location.accuracy,
        }
    }

    /// 위험 위치 갱신 페이로드
    pub fn location_report(&self) -> LocationReport {
        let location = self.location.rounded();
        LocationReport {
            latitude: location.latitude,
            longitude: location.longitude,
            accuracy: location.accuracy,
        }
    }
}

impl Default for Telemetry {
    fn default() -> Self {
        Self::from_config(&DeviceConfig::default())
    }
}

/// 텔레메트리 스냅샷 보고 (`/heartbeat`, `/button/*`)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TelemetryReport {
    pub battery_level: u8,
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: u32,
}

/// 위치 보고 (`/danger/update`)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationReport {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: u32,
}
