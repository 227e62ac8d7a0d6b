//! 종료 스냅샷 저장소.
//!
//! `<dir>/<코드>_simulation.json` 형식으로 세션 스냅샷을 보관한다.

use std::fs;
use std::path::{Path, PathBuf};

use bracelet_core::error::CoreError;
use bracelet_core::models::snapshot::SessionSnapshot;
use tracing::info;

/// 파일 기반 스냅샷 저장소
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// 스냅샷 저장. 같은 코드의 이전 파일은 덮어쓴다
    pub fn save(&self, snapshot: &SessionSnapshot) -> Result<PathBuf, CoreError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(snapshot.default_file_name());
        fs::write(&path, snapshot.to_json_pretty()?)?;
        info!(
            "시뮬레이션 로그 저장: {} ({}개 항목)",
            path.display(),
            snapshot.log_entries.len()
        );
        Ok(path)
    }

    /// 파일에서 스냅샷 읽기
    pub fn load(path: &Path) -> Result<SessionSnapshot, CoreError> {
        let json = fs::read_to_string(path)?;
        SessionSnapshot::from_json(&json)
    }
}
