//! 대화형 모드.
//!
//! 표준 입력에서 메뉴 명령을 읽어 공유 세션에 적용한다. 백그라운드 시뮬레이션은
//! 같은 세션 위에서 운영자 입력과 동시에 돈다.

use bracelet_core::config::AppConfig;
use bracelet_core::models::actuator::{
    VibrationPattern, DEFAULT_LED_BLINK_COLOR, DEFAULT_LED_BLINK_PATTERN, DEFAULT_LED_ON_COLOR,
};
use bracelet_core::models::status::Button;
use bracelet_core::ports::random::RandomSource;
use bracelet_device::random::SeededRandom;
use bracelet_device::scheduler::{Scheduler, SchedulerConfig, SchedulerHandle, SimulationMode};
use bracelet_device::shared::SharedSession;
use std::io::BufRead;
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};

use crate::console;

/// 로그 보기에서 표시할 항목 수
const RECENT_LOG_ENTRIES: usize = 10;

/// 메뉴 명령
#[derive(Debug, Clone, PartialEq)]
pub enum MenuCommand {
    Press(Button),
    Heartbeat,
    CheckCommands,
    ToggleBackground,
    ShowBattery,
    ShowLocation,
    ShowLog,
    Vibrate(VibrationPattern),
    LedOn(String),
    LedBlink(String),
    LedOff,
    ResetBattery(u8),
    Help,
    Exit,
}

/// 입력 한 줄 해석
///
/// 빈 줄은 `Ok(None)`.
pub fn parse(line: &str) -> Result<Option<MenuCommand>, String> {
    let mut parts = line.split_whitespace();
    let Some(key) = parts.next() else {
        return Ok(None);
    };
    let arg = parts.next();

    let command = match key.to_ascii_lowercase().as_str() {
        "1" => MenuCommand::Press(Button::Arrived),
        "2" => MenuCommand::Press(Button::Lost),
        "3" => MenuCommand::Press(Button::Danger),
        "4" => MenuCommand::Heartbeat,
        "5" => MenuCommand::CheckCommands,
        "6" => MenuCommand::ToggleBackground,
        "7" => MenuCommand::ShowBattery,
        "8" => MenuCommand::ShowLocation,
        "9" => MenuCommand::ShowLog,
        "v" => MenuCommand::Vibrate(VibrationPattern::Short),
        "m" => MenuCommand::Vibrate(VibrationPattern::Medium),
        "s" => MenuCommand::Vibrate(VibrationPattern::Sos),
        "l" => MenuCommand::LedOn(arg.unwrap_or(DEFAULT_LED_ON_COLOR).to_string()),
        "b" => MenuCommand::LedBlink(arg.unwrap_or(DEFAULT_LED_BLINK_COLOR).to_string()),
        "o" => MenuCommand::LedOff,
        "r" => {
            let level = match arg {
                Some(raw) => raw
                    .parse::<u8>()
                    .map_err(|_| format!("배터리 값은 0-100 사이 정수여야 합니다: {raw}"))?,
                None => 100,
            };
            MenuCommand::ResetBattery(level.min(100))
        }
        "h" | "?" => MenuCommand::Help,
        "0" | "q" => MenuCommand::Exit,
        other => return Err(format!("알 수 없는 명령: {other}")),
    };
    Ok(Some(command))
}

/// 메뉴 출력
pub fn print_menu() {
    println!("┌─────────────────────────────────────────────┐");
    println!("│ 1 도착   2 길 잃음   3 위험                  │");
    println!("│ 4 하트비트   5 명령 확인                     │");
    println!("│ 6 백그라운드 시뮬레이션 시작/중지            │");
    println!("│ 7 배터리   8 위치   9 최근 로그              │");
    println!("│ v 짧은 진동   m 중간 진동   s SOS 진동        │");
    println!("│ l [색상] LED 켜기   b [색상] LED 점멸         │");
    println!("│ o LED 끄기   r [0-100] 배터리 재설정          │");
    println!("│ h 도움말   0 종료                            │");
    println!("└─────────────────────────────────────────────┘");
}

/// 대화형 셸
pub struct InteractiveShell {
    session: SharedSession,
    config: AppConfig,
    seed: Option<u64>,
    background: Option<SchedulerHandle>,
    background_runs: u64,
}

impl InteractiveShell {
    pub fn new(session: SharedSession, config: AppConfig, seed: Option<u64>) -> Self {
        Self {
            session,
            config,
            seed,
            background: None,
            background_runs: 0,
        }
    }

    /// 입력 루프. 종료 명령이나 EOF, 종료 신호에서 멈춘다
    pub async fn run(mut self, mut shutdown_rx: watch::Receiver<bool>) {
        print_menu();
        let mut lines = spawn_stdin_reader();

        loop {
            let line = tokio::select! {
                line = lines.recv() => line,
                _ = shutdown_rx.changed() => {
                    info!("종료 신호로 대화형 모드 종료");
                    break;
                }
            };

            let Some(line) = line else {
                info!("입력 종료");
                break;
            };

            match parse(&line) {
                Ok(Some(MenuCommand::Exit)) => break,
                Ok(Some(command)) => self.execute(command).await,
                Ok(None) => {}
                Err(message) => println!("  ⚠️  {message} (h: 도움말)"),
            }
        }

        self.stop_background().await;
    }

    async fn execute(&mut self, command: MenuCommand) {
        let session = &self.session;
        match command {
            MenuCommand::Press(button) => {
                let ok = session.press_button(button).await;
                report(&format!("버튼 {button}"), ok);
            }
            MenuCommand::Heartbeat => {
                let ok = session.send_heartbeat().await;
                report("하트비트", ok);
            }
            MenuCommand::CheckCommands => match session.check_commands().await {
                Some(command) => println!("  📨 명령 수신: {}", command.kind.as_wire()),
                None => println!("  대기 중인 명령 없음"),
            },
            MenuCommand::ToggleBackground => self.toggle_background().await,
            MenuCommand::ShowBattery => {
                let view = session.view().await;
                println!("  🔋 배터리 {}%", view.telemetry.battery_level);
            }
            MenuCommand::ShowLocation => {
                let view = session.view().await;
                println!(
                    "  📍 {}",
                    console::format_location(&view.telemetry.location)
                );
            }
            MenuCommand::ShowLog => {
                for entry in session.recent_entries(RECENT_LOG_ENTRIES).await {
                    println!("  {}", console::format_entry(&entry));
                }
            }
            MenuCommand::Vibrate(pattern) => {
                session.vibrate(pattern, None).await;
            }
            MenuCommand::LedOn(color) => {
                session.led_on(&color, None).await;
            }
            MenuCommand::LedBlink(color) => {
                session
                    .led_blink(&color, DEFAULT_LED_BLINK_PATTERN, None)
                    .await;
            }
            MenuCommand::LedOff => session.led_off().await,
            MenuCommand::ResetBattery(level) => session.reset_battery(level).await,
            MenuCommand::Help => print_menu(),
            MenuCommand::Exit => {}
        }
    }

    async fn toggle_background(&mut self) {
        match self.background.take() {
            Some(handle) if !handle.is_finished() => {
                if let Err(e) = handle.stop().await {
                    warn!("백그라운드 시뮬레이션 정지 실패: {e}");
                }
                println!("  ⏸  백그라운드 시뮬레이션 중지");
            }
            _ => {
                self.background_runs += 1;
                let config = SchedulerConfig::from_app_config(&self.config, SimulationMode::Attended);
                let scheduler = Scheduler::new(config, self.session.clone(), self.scheduler_random());
                self.background = Some(scheduler.spawn());
                println!("  ▶  백그라운드 시뮬레이션 시작");
            }
        }
    }

    fn scheduler_random(&self) -> Box<dyn RandomSource> {
        match self.seed {
            Some(seed) => Box::new(SeededRandom::with_seed(
                seed.wrapping_add(self.background_runs),
            )),
            None => Box::new(SeededRandom::from_entropy()),
        }
    }

    async fn stop_background(&mut self) {
        if let Some(handle) = self.background.take() {
            match handle.stop().await {
                Ok(scheduler) => info!(
                    "백그라운드 시뮬레이션 정지 ({}틱)",
                    scheduler.ticks_elapsed()
                ),
                Err(e) => warn!("백그라운드 시뮬레이션 정지 실패: {e}"),
            }
        }
    }
}

/// 표준 입력을 별도 스레드에서 줄 단위로 읽는다
///
/// 런타임의 blocking 풀을 쓰지 않으므로 읽기 대기 중에도 프로세스가 종료될 수 있다.
fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(16);
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if tx.blocking_send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!("입력 읽기 실패: {e}");
                    break;
                }
            }
        }
    });
    rx
}

fn report(label: &str, ok: bool) {
    if ok {
        println!("  ✅ {label} 성공");
    } else {
        println!("  ❌ {label} 실패 (로그 확인)");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_line_is_ignored() {
        assert_eq!(parse(""), Ok(None));
        assert_eq!(parse("   "), Ok(None));
    }

    #[test]
    fn buttons_and_protocol_actions() {
        assert_eq!(parse("1"), Ok(Some(MenuCommand::Press(Button::Arrived))));
        assert_eq!(parse("2"), Ok(Some(MenuCommand::Press(Button::Lost))));
        assert_eq!(parse(" 3 "), Ok(Some(MenuCommand::Press(Button::Danger))));
        assert_eq!(parse("4"), Ok(Some(MenuCommand::Heartbeat)));
        assert_eq!(parse("5"), Ok(Some(MenuCommand::CheckCommands)));
        assert_eq!(parse("6"), Ok(Some(MenuCommand::ToggleBackground)));
        assert_eq!(parse("0"), Ok(Some(MenuCommand::Exit)));
    }

    #[test]
    fn local_actuators() {
        assert_eq!(
            parse("S"),
            Ok(Some(MenuCommand::Vibrate(VibrationPattern::Sos)))
        );
        assert_eq!(parse("l"), Ok(Some(MenuCommand::LedOn("blue".into()))));
        assert_eq!(parse("l green"), Ok(Some(MenuCommand::LedOn("green".into()))));
        assert_eq!(parse("b"), Ok(Some(MenuCommand::LedBlink("red".into()))));
        assert_eq!(parse("o"), Ok(Some(MenuCommand::LedOff)));
    }

    #[test]
    fn battery_reset_argument() {
        assert_eq!(parse("r"), Ok(Some(MenuCommand::ResetBattery(100))));
        assert_eq!(parse("r 40"), Ok(Some(MenuCommand::ResetBattery(40))));
        assert_eq!(parse("r 250"), Ok(Some(MenuCommand::ResetBattery(100))));
        assert!(parse("r lots").is_err());
    }

    #[test]
    fn unknown_key_is_error() {
        let err = parse("x").unwrap_err();
        assert!(err.contains("x"));
    }
}
