//! 애플리케이션 설정 구조체.
//!
//! 백엔드 URL, 시뮬레이션 주기, 초기 텔레메트리, 로그 저장 경로 등
//! 런타임 설정을 정의한다. `config` crate를 통해 파일/환경변수에서 로드.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::CoreError;

/// 최상위 애플리케이션 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// 백엔드 연결 설정
    #[serde(default)]
    pub server: ServerConfig,
    /// 시뮬레이션 스케줄 설정
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// 디바이스 초기 텔레메트리
    #[serde(default)]
    pub device: DeviceConfig,
    /// 감사 로그 저장 설정
    #[serde(default)]
    pub storage: StorageConfig,
}

/// 백엔드 연결 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// 백엔드 기본 URL (예: "http://localhost:8000")
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// 디바이스 API 경로 접두사
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,
    /// 요청 타임아웃 (밀리초)
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_prefix: default_api_prefix(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

/// 시뮬레이션 스케줄 설정
///
/// 주기는 모두 틱 단위. 틱 하나의 실제 길이는 `tick_interval_ms`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// 틱 간격 (밀리초)
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// 하트비트 주기 (틱)
    #[serde(default = "default_heartbeat_every_ticks")]
    pub heartbeat_every_ticks: u64,
    /// 명령 폴링 주기 (틱)
    #[serde(default = "default_command_poll_every_ticks")]
    pub command_poll_every_ticks: u64,
    /// 위험 위치 갱신 주기 (틱)
    #[serde(default = "default_danger_update_every_ticks")]
    pub danger_update_every_ticks: u64,
    /// 무인 모드에서 하트비트마다 임의 버튼을 누를 확률
    #[serde(default = "default_auto_press_probability")]
    pub auto_press_probability: f64,
    /// 자동 시뮬레이션 지속 시간 (분)
    #[serde(default = "default_duration_minutes")]
    pub duration_minutes: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            heartbeat_every_ticks: default_heartbeat_every_ticks(),
            command_poll_every_ticks: default_command_poll_every_ticks(),
            danger_update_every_ticks: default_danger_update_every_ticks(),
            auto_press_probability: default_auto_press_probability(),
            duration_minutes: default_duration_minutes(),
        }
    }
}

/// 디바이스 초기 텔레메트리
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// 초기 위도
    #[serde(default = "default_latitude")]
    pub initial_latitude: f64,
    /// 초기 경도
    #[serde(default = "default_longitude")]
    pub initial_longitude: f64,
    /// 초기 정확도 반경 (미터)
    #[serde(default = "default_accuracy")]
    pub initial_accuracy: u32,
    /// 초기 배터리 잔량 (%)
    #[serde(default = "default_battery")]
    pub initial_battery: u8,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            initial_latitude: default_latitude(),
            initial_longitude: default_longitude(),
            initial_accuracy: default_accuracy(),
            initial_battery: default_battery(),
        }
    }
}

/// 감사 로그 저장 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// 스냅샷 저장 디렉토리 (None이면 `./simulation_logs`)
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}
fn default_api_prefix() -> String {
    "/api/devices".to_string()
}
fn default_request_timeout_ms() -> u64 {
    10_000
}
fn default_tick_interval_ms() -> u64 {
    1_000
}
fn default_heartbeat_every_ticks() -> u64 {
    10
}
fn default_command_poll_every_ticks() -> u64 {
    5
}
fn default_danger_update_every_ticks() -> u64 {
    30
}
fn default_auto_press_probability() -> f64 {
    0.05
}
fn default_duration_minutes() -> u64 {
    5
}
// 파리 시청 부근
fn default_latitude() -> f64 {
    48.8566
}
fn default_longitude() -> f64 {
    2.3522
}
fn default_accuracy() -> u32 {
    15
}
fn default_battery() -> u8 {
    100
}

impl AppConfig {
    /// 기본 설정값 반환
    pub fn default_config() -> Self {
        Self::default()
    }

    /// 백엔드 요청 타임아웃을 Duration으로 반환
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.server.request_timeout_ms)
    }

    /// 틱 간격을 Duration으로 반환
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.simulation.tick_interval_ms)
    }

    /// 디바이스 API 엔드포인트 기준 URL (`base_url` + `api_prefix`)
    pub fn api_endpoint(&self) -> String {
        format!(
            "{}/{}",
            self.server.base_url.trim_end_matches('/'),
            self.server.api_prefix.trim_matches('/')
        )
    }

    /// 지속 시간 동안 실행될 총 틱 수
    pub fn total_ticks(&self) -> u64 {
        let duration_ms = self.simulation.duration_minutes.saturating_mul(60_000);
        duration_ms / self.simulation.tick_interval_ms.max(1)
    }

    /// 설정값 검증
    pub fn validate(&self) -> Result<(), CoreError> {
        url::Url::parse(&self.server.base_url)
            .map_err(|e| CoreError::Config(format!("잘못된 base_url '{}': {e}", self.server.base_url)))?;

        if self.server.request_timeout_ms == 0 {
            return Err(CoreError::Config("request_timeout_ms는 0보다 커야 합니다".to_string()));
        }

        let sim = &self.simulation;
        for (name, value) in [
            ("tick_interval_ms", sim.tick_interval_ms),
            ("heartbeat_every_ticks", sim.heartbeat_every_ticks),
            ("command_poll_every_ticks", sim.command_poll_every_ticks),
            ("danger_update_every_ticks", sim.danger_update_every_ticks),
        ] {
            if value == 0 {
                return Err(CoreError::Config(format!("{name}는 0보다 커야 합니다")));
            }
        }

        if !(0.0..=1.0).contains(&sim.auto_press_probability) {
            return Err(CoreError::Config(format!(
                "auto_press_probability는 0과 1 사이여야 합니다: {}",
                sim.auto_press_probability
            )));
        }

        if self.device.initial_battery > 100 {
            return Err(CoreError::Config(format!(
                "initial_battery는 100 이하여야 합니다: {}",
                self.device.initial_battery
            )));
        }

        Ok(())
    }
}
