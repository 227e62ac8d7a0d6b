//! 시뮬레이션 스케줄러.
//!
//! 틱마다 활동(하트비트, 위험 위치 갱신, 명령 폴링)별로 각자의 주기가 지났는지 판단해
//! 세션 연산을 호출한다. 틱 번호는 1부터 시작하고, 한 활동의 실패는 다른 활동에
//! 영향을 주지 않는다. 정지 요청은 진행 중인 틱이 끝난 뒤에 반영된다.

use std::time::Duration;

use bracelet_core::config::AppConfig;
use bracelet_core::error::CoreError;
use bracelet_core::models::command::PolledCommand;
use bracelet_core::models::status::{Button, DeviceStatus};
use bracelet_core::ports::random::RandomSource;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::shared::SharedSession;

/// 실행 모드
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationMode {
    /// 운영자 입력과 병행 (자동 버튼 입력 없음)
    Attended,
    /// 무인 실행. 하트비트 틱마다 확률적으로 버튼을 누른다
    Unattended,
}

/// 스케줄러 설정 (주기는 틱 단위)
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub tick_interval: Duration,
    pub heartbeat_every: u64,
    pub command_poll_every: u64,
    pub danger_update_every: u64,
    pub auto_press_probability: f64,
    pub mode: SimulationMode,
    /// 지정하면 해당 틱 수만큼 실행 후 스스로 종료
    pub max_ticks: Option<u64>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(1),
            heartbeat_every: 10,
            command_poll_every: 5,
            danger_update_every: 30,
            auto_press_probability: 0.05,
            mode: SimulationMode::Attended,
            max_ticks: None,
        }
    }
}

impl SchedulerConfig {
    /// 앱 설정에서 생성. 무인 모드는 `duration_minutes`만큼의 틱으로 제한
    pub fn from_app_config(config: &AppConfig, mode: SimulationMode) -> Self {
        let simulation = &config.simulation;
        Self {
            tick_interval: config.tick_interval(),
            heartbeat_every: simulation.heartbeat_every_ticks,
            command_poll_every: simulation.command_poll_every_ticks,
            danger_update_every: simulation.danger_update_every_ticks,
            auto_press_probability: simulation.auto_press_probability,
            mode,
            max_ticks: match mode {
                SimulationMode::Unattended => Some(config.total_ticks()),
                SimulationMode::Attended => None,
            },
        }
    }
}

/// 활동별 주기 타이머
#[derive(Debug, Clone, Copy)]
struct ActivityTimer {
    every: u64,
    last_run: u64,
}

impl ActivityTimer {
    fn new(every: u64) -> Self {
        Self {
            every: every.max(1),
            last_run: 0,
        }
    }

    fn is_due(&self, tick: u64) -> bool {
        tick.saturating_sub(self.last_run) >= self.every
    }

    fn mark(&mut self, tick: u64) {
        self.last_run = tick;
    }
}

/// 한 틱의 실행 결과 (실행되지 않은 활동은 None)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub tick: u64,
    pub heartbeat: Option<bool>,
    pub auto_press: Option<(Button, bool)>,
    pub danger_update: Option<bool>,
    pub command_polled: bool,
    pub command: Option<PolledCommand>,
}

impl TickReport {
    pub fn ran_anything(&self) -> bool {
        self.heartbeat.is_some() || self.danger_update.is_some() || self.command_polled
    }
}

/// 시뮬레이션 스케줄러
pub struct Scheduler {
    config: SchedulerConfig,
    session: SharedSession,
    random: Box<dyn RandomSource>,
    heartbeat: ActivityTimer,
    danger_update: ActivityTimer,
    command_poll: ActivityTimer,
    tick: u64,
}

impl Scheduler {
    pub fn new(
        config: SchedulerConfig,
        session: SharedSession,
        random: Box<dyn RandomSource>,
    ) -> Self {
        Self {
            heartbeat: ActivityTimer::new(config.heartbeat_every),
            danger_update: ActivityTimer::new(config.danger_update_every),
            command_poll: ActivityTimer::new(config.command_poll_every),
            config,
            session,
            random,
            tick: 0,
        }
    }

    /// 지금까지 실행한 틱 수
    pub fn ticks_elapsed(&self) -> u64 {
        self.tick
    }

    pub fn session(&self) -> &SharedSession {
        &self.session
    }

    /// 틱 한 번 실행
    pub async fn tick(&mut self) -> TickReport {
        self.tick += 1;
        let tick = self.tick;
        let mut report = TickReport {
            tick,
            ..Default::default()
        };

        if self.heartbeat.is_due(tick) {
            self.heartbeat.mark(tick);
            report.heartbeat = Some(self.session.send_heartbeat().await);

            if self.config.mode == SimulationMode::Unattended
                && self.random.chance(self.config.auto_press_probability)
            {
                let index = self.random.range_u32(0, Button::ALL.len() as u32 - 1) as usize;
                let button = Button::ALL[index.min(Button::ALL.len() - 1)];
                info!("자동 버튼 입력: {button}");
                let ok = self.session.press_button(button).await;
                report.auto_press = Some((button, ok));
            }
        }

        // 긴급 상태가 아니면 타이머를 진행시키지 않는다
        if self.danger_update.is_due(tick)
            && self.session.status().await == DeviceStatus::Emergency
        {
            self.danger_update.mark(tick);
            report.danger_update = Some(self.session.update_danger_location().await);
        }

        if self.command_poll.is_due(tick) {
            self.command_poll.mark(tick);
            report.command_polled = true;
            report.command = self.session.check_commands().await;
        }

        if report.ran_anything() {
            debug!("틱 {tick}: {report:?}");
        }
        report
    }

    /// 정지 신호가 오거나 `max_ticks`에 도달할 때까지 실행
    pub async fn run(mut self, mut shutdown_rx: watch::Receiver<bool>) -> Self {
        info!(
            "스케줄러 시작: tick={}ms, heartbeat={}틱, poll={}틱, danger={}틱, mode={:?}",
            self.config.tick_interval.as_millis(),
            self.config.heartbeat_every,
            self.config.command_poll_every,
            self.config.danger_update_every,
            self.config.mode,
        );

        let mut interval = tokio::time::interval(self.config.tick_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // 첫 tick은 즉시 완료된다
        interval.tick().await;

        loop {
            if *shutdown_rx.borrow() {
                break;
            }
            if let Some(max) = self.config.max_ticks {
                if self.tick >= max {
                    info!("설정된 틱 수 도달: {max}");
                    break;
                }
            }

            tokio::select! {
                _ = interval.tick() => {
                    self.tick().await;
                }
                _ = shutdown_rx.changed() => {
                    info!("스케줄러 종료 신호 수신");
                    break;
                }
            }
        }

        info!("스케줄러 종료: {}틱 실행", self.tick);
        self
    }

    /// 백그라운드 태스크로 실행
    pub fn spawn(self) -> SchedulerHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(self.run(shutdown_rx));
        SchedulerHandle { shutdown_tx, task }
    }
}

/// 백그라운드 스케줄러 핸들
pub struct SchedulerHandle {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<Scheduler>,
}

impl SchedulerHandle {
    /// 정지 요청 후 진행 중인 틱이 끝날 때까지 대기
    pub async fn stop(self) -> Result<Scheduler, CoreError> {
        let _ = self.shutdown_tx.send(true);
        self.join().await
    }

    /// 스스로 종료할 때까지 대기 (`max_ticks`)
    pub async fn join(self) -> Result<Scheduler, CoreError> {
        self.task
            .await
            .map_err(|e| CoreError::Internal(format!("스케줄러 태스크 실패: {e}")))
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
