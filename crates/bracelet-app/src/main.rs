//! # bracelet-app
//!
//! 가상 브레이슬릿 시뮬레이터 바이너리 진입점.
//! DI 역할, 실행 모드 선택, 라이프사이클 관리, 종료 시 스냅샷 저장.

mod console;
mod interactive;
mod lifecycle;
mod settings;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Result};
use bracelet_core::config::AppConfig;
use bracelet_core::models::identity::{DeviceIdentity, UniqueCode};
use bracelet_core::ports::random::RandomSource;
use bracelet_device::random::SeededRandom;
use bracelet_device::scheduler::{Scheduler, SchedulerConfig, SimulationMode};
use bracelet_device::session::DeviceSession;
use bracelet_device::shared::SharedSession;
use bracelet_device::snapshot_store::SnapshotStore;
use bracelet_network::http_client::HttpBraceletClient;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::interactive::InteractiveShell;
use crate::lifecycle::Lifecycle;
use crate::settings::CliOverrides;

/// 가상 브레이슬릿 시뮬레이터
///
/// 백엔드에 인증하고 하트비트, 버튼, 위험 위치, 명령 폴링을 흉내 낸다.
#[derive(Parser, Debug)]
#[command(name = "bracelet-sim")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// 표시 이름 (기본: "Bracelet-<코드 앞 8자>")
    #[arg(long, short = 'n')]
    name: Option<String>,

    /// 12자리 고유 코드 (없으면 무작위 생성)
    #[arg(long, short = 'c')]
    code: Option<String>,

    /// 서버 URL 지정 (기본: http://localhost:8000)
    #[arg(long, short = 's')]
    server: Option<String>,

    /// 무인 모드로 실행 (자동 버튼 입력 포함)
    #[arg(long, short = 'a')]
    auto: bool,

    /// 무인 모드 실행 시간 (분)
    #[arg(long, short = 'd')]
    duration: Option<u64>,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, short = 'l', default_value = "info")]
    log_level: String,

    /// 설정 파일 경로
    #[arg(long)]
    config: Option<PathBuf>,

    /// 스냅샷 저장 디렉토리 (기본: ./simulation_logs)
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// 난수 시드 (재현 가능한 실행)
    #[arg(long)]
    seed: Option<u64>,
}

fn init_tracing(log_level: &str) {
    let log_filter = [
        "bracelet_sim",
        "bracelet_app",
        "bracelet_core",
        "bracelet_network",
        "bracelet_device",
    ]
    .iter()
    .map(|target| format!("{target}={log_level}"))
    .collect::<Vec<_>>()
    .join(",");
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_filter)),
        )
        .init();
}

fn random_source(seed: Option<u64>) -> Box<dyn RandomSource> {
    match seed {
        Some(seed) => Box::new(SeededRandom::with_seed(seed)),
        None => Box::new(SeededRandom::from_entropy()),
    }
}

/// 무인 모드. 인증 실패 시 스케줄러를 시작하지 않는다
async fn run_unattended(
    session: &SharedSession,
    config: &AppConfig,
    lifecycle: &Lifecycle,
    seed: Option<u64>,
) -> Result<()> {
    if !session.authenticate().await {
        bail!("인증 실패: 시뮬레이션을 시작하지 않습니다");
    }

    let scheduler_config = SchedulerConfig::from_app_config(config, SimulationMode::Unattended);
    info!(
        "무인 시뮬레이션 시작: {}분 ({}틱)",
        config.simulation.duration_minutes,
        config.total_ticks()
    );
    let scheduler = Scheduler::new(
        scheduler_config,
        session.clone(),
        random_source(seed.map(|s| s.wrapping_add(1))),
    );
    let (scheduler, reason) = lifecycle
        .supervise(scheduler.run(lifecycle.shutdown_receiver()))
        .await;
    info!(
        "무인 시뮬레이션 종료 ({reason}, {}틱)",
        scheduler.ticks_elapsed()
    );
    Ok(())
}

/// 대화형 모드. 인증 실패 시 메뉴를 열지 않는다
async fn run_interactive(
    session: &SharedSession,
    config: &AppConfig,
    lifecycle: &Lifecycle,
    seed: Option<u64>,
) -> Result<()> {
    if !session.authenticate().await {
        bail!("인증 실패: 백엔드에 등록된 코드인지 확인하세요");
    }

    let shell = InteractiveShell::new(session.clone(), config.clone(), seed);
    let ((), reason) = lifecycle
        .supervise(shell.run(lifecycle.shutdown_receiver()))
        .await;
    info!("대화형 모드 종료 ({reason})");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level);

    let overrides = CliOverrides {
        server: args.server.clone(),
        duration_minutes: args.duration,
        log_dir: args.log_dir.clone(),
    };
    let config = settings::load(args.config.as_deref(), &overrides)?;

    let mut random = random_source(args.seed);
    let unique_code = match args.code.as_deref() {
        Some(code) => UniqueCode::parse(code)?,
        None => UniqueCode::generate(random.as_mut()),
    };
    let identity = DeviceIdentity::new(unique_code, args.name.clone());
    console::print_banner(&identity, &config);

    let backend = HttpBraceletClient::new(&config.api_endpoint(), config.request_timeout())?;
    let session = SharedSession::new(DeviceSession::from_config(
        &config,
        identity,
        Arc::new(backend),
        random,
    ));
    let printer = console::spawn_event_printer(session.subscribe());
    let lifecycle = Lifecycle::new();

    let result = if args.auto {
        run_unattended(&session, &config, &lifecycle, args.seed).await
    } else {
        run_interactive(&session, &config, &lifecycle, args.seed).await
    };

    let store = SnapshotStore::new(settings::log_dir(&config));
    match store.save(&session.snapshot().await) {
        Ok(path) => println!("💾 시뮬레이션 로그 저장: {}", path.display()),
        Err(e) => warn!("스냅샷 저장 실패: {e}"),
    }

    printer.abort();
    result
}
