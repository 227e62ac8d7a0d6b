//! 설정 로드.
//!
//! 기본값 → 설정 파일 → 환경 변수(`BRACELET__SECTION__KEY`) → CLI 순으로 덮어쓴다.
//! `--config`가 없으면 플랫폼 설정 디렉토리의 `config.toml`을 (있을 때만) 읽는다.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use bracelet_core::config::AppConfig;
use config::{Config, Environment, File};
use directories::ProjectDirs;
use tracing::{debug, info};

/// 환경 변수 접두사
pub const ENV_PREFIX: &str = "BRACELET";

/// 기본 스냅샷 디렉토리
const DEFAULT_LOG_DIR: &str = "./simulation_logs";

const CONFIG_FILE_NAME: &str = "config.toml";

/// CLI에서 지정한 덮어쓰기 값
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub server: Option<String>,
    pub duration_minutes: Option<u64>,
    pub log_dir: Option<PathBuf>,
}

/// 플랫폼별 기본 설정 파일 경로
///
/// - macOS: `~/Library/Application Support/com.leguardian.bracelet-sim/config.toml`
/// - Linux: `~/.config/bracelet-sim/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("com", "leguardian", "bracelet-sim")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

/// 프로세스 환경 변수를 사용해 설정 로드
pub fn load(config_file: Option<&Path>, overrides: &CliOverrides) -> Result<AppConfig> {
    load_with_env(config_file, overrides, environment())
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

/// 계층 설정 로드 후 검증
pub fn load_with_env(
    config_file: Option<&Path>,
    overrides: &CliOverrides,
    env: Environment,
) -> Result<AppConfig> {
    let defaults = Config::try_from(&AppConfig::default_config())
        .context("기본 설정 직렬화 실패")?;

    let mut builder = Config::builder().add_source(defaults);
    match config_file {
        Some(path) => {
            info!("설정 파일: {}", path.display());
            builder = builder.add_source(File::from(path).required(true));
        }
        None => {
            if let Some(path) = default_config_path() {
                debug!("기본 설정 파일 확인: {}", path.display());
                builder = builder.add_source(File::from(path).required(false));
            }
        }
    }

    let mut config: AppConfig = builder
        .add_source(env)
        .build()
        .context("설정 로드 실패")?
        .try_deserialize()
        .context("설정 형식 오류")?;

    apply_overrides(&mut config, overrides);
    config.validate().context("설정 검증 실패")?;
    Ok(config)
}

fn apply_overrides(config: &mut AppConfig, overrides: &CliOverrides) {
    if let Some(server) = &overrides.server {
        config.server.base_url = server.clone();
    }
    if let Some(minutes) = overrides.duration_minutes {
        config.simulation.duration_minutes = minutes;
    }
    if let Some(dir) = &overrides.log_dir {
        config.storage.log_dir = Some(dir.clone());
    }
}

/// 스냅샷 저장 디렉토리
pub fn log_dir(config: &AppConfig) -> PathBuf {
    config
        .storage
        .log_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_DIR))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env_from(vars: &[(&str, &str)]) -> Environment {
        let map: config::Map<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        environment().source(Some(map))
    }

    fn missing_file(dir: &tempfile::TempDir) -> PathBuf {
        dir.path().join("absent.toml")
    }

    #[test]
    fn defaults_without_sources() {
        let config = load_with_env(None, &CliOverrides::default(), env_from(&[])).unwrap();
        assert_eq!(config.server.base_url, "http://localhost:8000");
        assert_eq!(config.api_endpoint(), "http://localhost:8000/api/devices");
        assert_eq!(config.simulation.heartbeat_every_ticks, 10);
        assert_eq!(log_dir(&config), PathBuf::from("./simulation_logs"));
    }

    #[test]
    fn file_then_env_then_cli() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bracelet.toml");
        std::fs::write(
            &path,
            r#"
[server]
base_url = "http://file-host:9000"

[simulation]
heartbeat_every_ticks = 7
duration_minutes = 2
"#,
        )
        .unwrap();

        let env = env_from(&[
            ("BRACELET__SIMULATION__COMMAND_POLL_EVERY_TICKS", "3"),
            ("BRACELET__SIMULATION__DURATION_MINUTES", "4"),
        ]);
        let overrides = CliOverrides {
            duration_minutes: Some(9),
            log_dir: Some(dir.path().join("logs")),
            ..Default::default()
        };
        let config = load_with_env(Some(&path), &overrides, env).unwrap();

        assert_eq!(config.server.base_url, "http://file-host:9000");
        assert_eq!(config.simulation.heartbeat_every_ticks, 7);
        assert_eq!(config.simulation.command_poll_every_ticks, 3);
        assert_eq!(config.simulation.duration_minutes, 9);
        assert_eq!(log_dir(&config), dir.path().join("logs"));
    }

    #[test]
    fn cli_server_override() {
        let overrides = CliOverrides {
            server: Some("http://127.0.0.1:8080".to_string()),
            ..Default::default()
        };
        let config = load_with_env(None, &overrides, env_from(&[])).unwrap();
        assert_eq!(config.api_endpoint(), "http://127.0.0.1:8080/api/devices");
    }

    #[test]
    fn explicit_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_with_env(
            Some(&missing_file(&dir)),
            &CliOverrides::default(),
            env_from(&[]),
        );
        assert!(result.is_err());
    }

    #[test]
    fn invalid_values_rejected() {
        let env = env_from(&[("BRACELET__SIMULATION__AUTO_PRESS_PROBABILITY", "1.5")]);
        assert!(load_with_env(None, &CliOverrides::default(), env).is_err());

        let overrides = CliOverrides {
            server: Some("not a url".to_string()),
            ..Default::default()
        };
        assert!(load_with_env(None, &overrides, env_from(&[])).is_err());
    }
}
