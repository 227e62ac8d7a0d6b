//! 콘솔 출력.
//!
//! 배너, 세션 이벤트, 로그 항목을 터미널에 표시한다.

use bracelet_core::config::AppConfig;
use bracelet_core::models::audit::AuditEntry;
use bracelet_core::models::identity::DeviceIdentity;
use bracelet_core::models::telemetry::Location;
use bracelet_device::events::SessionEvent;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::warn;

/// 배너 출력
pub fn print_banner(identity: &DeviceIdentity, config: &AppConfig) {
    println!();
    println!("╔══════════════════════════════════════════════════════════╗");
    println!("║              가상 브레이슬릿 시뮬레이터                  ║");
    println!("╚══════════════════════════════════════════════════════════╝");
    println!("  ID:       {}", identity.unique_code);
    println!("  이름:     {}", identity.name);
    println!("  백엔드:   {}", config.api_endpoint());
    println!(
        "  위치:     {:.4}, {:.4}",
        config.device.initial_latitude, config.device.initial_longitude
    );
    println!("  배터리:   {}%", config.device.initial_battery);
    println!();
}

/// 위치 한 줄 요약
pub fn format_location(location: &Location) -> String {
    format!(
        "{:.8}, {:.8} (±{}m)",
        location.latitude, location.longitude, location.accuracy
    )
}

/// 로그 항목 한 줄 요약
pub fn format_entry(entry: &AuditEntry) -> String {
    format!(
        "[{}] {}",
        entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
        entry.action
    )
}

/// 이벤트 한 줄 요약 (로그 항목 추가는 표시하지 않음)
pub fn format_event(event: &SessionEvent) -> Option<String> {
    match event {
        SessionEvent::AuthenticationChanged(true) => Some("🔐 인증됨".to_string()),
        SessionEvent::AuthenticationChanged(false) => Some("🔓 인증 해제".to_string()),
        SessionEvent::BatteryChanged(level) => Some(format!("🔋 배터리 {level}%")),
        SessionEvent::StatusChanged { from, to } => Some(format!("📟 상태 {from} → {to}")),
        SessionEvent::LocationChanged(location) => {
            Some(format!("📍 위치 {}", format_location(location)))
        }
        SessionEvent::ActuatorChanged(actuators) => {
            let led = match (&actuators.led.color, actuators.led.blinking) {
                (Some(color), true) => format!(
                    "{color} 점멸({})",
                    actuators.led.pattern.as_deref().unwrap_or("-")
                ),
                (Some(color), false) => color.clone(),
                (None, _) => "꺼짐".to_string(),
            };
            let vibration = actuators
                .last_vibration
                .map(|p| p.description())
                .unwrap_or("-");
            Some(format!(
                "📳 진동 {vibration} (누적 {}회), LED {led}",
                actuators.vibration_count
            ))
        }
        SessionEvent::EntryAppended(_) => None,
    }
}

/// 이벤트 구독 후 출력하는 태스크
pub fn spawn_event_printer(mut rx: broadcast::Receiver<SessionEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    if let Some(line) = format_event(&event) {
                        println!("  {line}");
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("이벤트 {skipped}개 누락");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}
