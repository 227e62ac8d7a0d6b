//! 실행 수명 관리.
//!
//! 시뮬레이션 작업을 OS 시그널과 함께 감독한다. 시그널이 먼저 오면 watch 채널로
//! 종료를 알리고, 작업이 진행 중인 틱이나 명령을 마무리할 때까지 기다린다.

use std::fmt;
use std::future::Future;

use tokio::sync::watch;
use tracing::{info, warn};

/// 감독한 작업이 끝난 이유
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// 작업이 스스로 끝남 (틱 수 도달, 종료 명령, 입력 종료)
    Completed,
    /// OS 시그널 수신
    Signal(&'static str),
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Completed => f.write_str("완료"),
            StopReason::Signal(name) => write!(f, "{name} 수신"),
        }
    }
}

/// 종료 신호 소유자
pub struct Lifecycle {
    shutdown_tx: watch::Sender<bool>,
}

impl Lifecycle {
    pub fn new() -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self { shutdown_tx }
    }

    /// 작업에 넘길 종료 수신기
    pub fn shutdown_receiver(&self) -> watch::Receiver<bool> {
        self.shutdown_tx.subscribe()
    }

    /// 종료 요청 (여러 번 호출해도 한 번만 기록)
    pub fn request_shutdown(&self, reason: &str) {
        if !self.shutdown_tx.send_replace(true) {
            info!("종료 요청: {reason}");
        }
    }

    /// 작업이 끝나거나 시그널이 올 때까지 감독
    pub async fn supervise<F: Future>(&self, task: F) -> (F::Output, StopReason) {
        tokio::pin!(task);
        let signal = tokio::select! {
            output = &mut task => return (output, StopReason::Completed),
            name = next_signal() => name,
        };
        self.request_shutdown(signal);
        (task.await, StopReason::Signal(signal))
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

/// 다음 종료 시그널 이름. 핸들러 등록에 실패하면 돌아오지 않는다
#[cfg(unix)]
async fn next_signal() -> &'static str {
    use tokio::signal::unix::{signal, SignalKind};

    let (mut sigint, mut sigterm) =
        match (signal(SignalKind::interrupt()), signal(SignalKind::terminate())) {
            (Ok(sigint), Ok(sigterm)) => (sigint, sigterm),
            (Err(e), _) | (_, Err(e)) => {
                warn!("시그널 핸들러 등록 실패: {e}");
                return std::future::pending().await;
            }
        };
    tokio::select! {
        _ = sigint.recv() => "SIGINT",
        _ = sigterm.recv() => "SIGTERM",
    }
}

#[cfg(not(unix))]
async fn next_signal() -> &'static str {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Ctrl+C 핸들러 등록 실패: {e}");
        return std::future::pending().await;
    }
    "Ctrl+C"
}
