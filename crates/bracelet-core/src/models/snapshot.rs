//! 세션 종료 스냅샷.
//!
//! 식별 정보, 최종 텔레메트리/상태, 전체 감사 로그를 하나의 문서로 직렬화한다.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::models::audit::AuditEntry;
use crate::models::status::DeviceStatus;
use crate::models::telemetry::Location;

/// 세션 스냅샷 (영속화 포맷)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// 브레이슬릿 고유 코드
    pub bracelet_id: String,
    /// 이름
    pub name: String,
    /// 최종 배터리 잔량
    pub final_battery: u8,
    /// 최종 상태
    pub final_status: DeviceStatus,
    /// 최종 위치 (소수점 8자리 반올림)
    pub final_location: Location,
    /// 감사 로그 (기록 순서)
    pub log_entries: Vec<AuditEntry>,
}

impl SessionSnapshot {
    /// 보기 좋은 JSON 문서로 직렬화
    pub fn to_json_pretty(&self) -> Result<String, CoreError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// JSON 문서에서 복원
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        Ok(serde_json::from_str(json)?)
    }

    /// 기본 파일 이름 (`<코드>_simulation.json`)
    pub fn default_file_name(&self) -> String {
        format!("{}_simulation.json", self.bracelet_id)
    }
}
