//! 세션 변경 알림.
//!
//! `tokio::broadcast` 기반. 연산 전후 [`SessionView`]를 비교해 바뀐 항목만 발행한다.

use bracelet_core::models::actuator::ActuatorState;
use bracelet_core::models::audit::AuditEntry;
use bracelet_core::models::status::DeviceStatus;
use bracelet_core::models::telemetry::{Location, Telemetry};
use tokio::sync::broadcast;
use tracing::debug;

use crate::session::DeviceSession;

/// 세션 변경 이벤트
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// 인증 상태 변경
    AuthenticationChanged(bool),
    /// 배터리 잔량 변경
    BatteryChanged(u8),
    /// 상태 전이
    StatusChanged {
        from: DeviceStatus,
        to: DeviceStatus,
    },
    /// 위치/정확도 변경
    LocationChanged(Location),
    /// 진동 또는 LED 변경
    ActuatorChanged(ActuatorState),
    /// 감사 로그 항목 추가
    EntryAppended(AuditEntry),
}

/// 관찰용 세션 상태 사본
#[derive(Debug, Clone, PartialEq)]
pub struct SessionView {
    pub unique_code: String,
    pub name: String,
    pub authenticated: bool,
    pub status: DeviceStatus,
    pub telemetry: Telemetry,
    pub actuators: ActuatorState,
    pub log_len: usize,
}

impl SessionView {
    pub fn capture(session: &DeviceSession) -> Self {
        Self {
            unique_code: session.unique_code().to_string(),
            name: session.identity().name.clone(),
            authenticated: session.is_authenticated(),
            status: session.status(),
            telemetry: *session.telemetry(),
            actuators: session.actuators().clone(),
            log_len: session.log().len(),
        }
    }

    /// `before` 이후 변경 사항을 이벤트 목록으로
    pub fn changes_since(before: &SessionView, session: &DeviceSession) -> Vec<SessionEvent> {
        let mut events = Vec::new();

        if session.is_authenticated() != before.authenticated {
            events.push(SessionEvent::AuthenticationChanged(
                session.is_authenticated(),
            ));
        }
        if session.status() != before.status {
            events.push(SessionEvent::StatusChanged {
                from: before.status,
                to: session.status(),
            });
        }
        let telemetry = session.telemetry();
        if telemetry.battery_level != before.telemetry.battery_level {
            events.push(SessionEvent::BatteryChanged(telemetry.battery_level));
        }
        if telemetry.location != before.telemetry.location {
            events.push(SessionEvent::LocationChanged(telemetry.location));
        }
        if *session.actuators() != before.actuators {
            events.push(SessionEvent::ActuatorChanged(session.actuators().clone()));
        }
        events.extend(
            session
                .log()
                .since(before.log_len)
                .iter()
                .cloned()
                .map(SessionEvent::EntryAppended),
        );

        events
    }
}

/// 세션 이벤트 버스
pub struct EventBus {
    tx: broadcast::Sender<SessionEvent>,
}

impl EventBus {
    /// 새 이벤트 버스 생성
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// 이벤트 발행 (구독자가 없으면 버린다)
    pub fn publish(&self, event: SessionEvent) {
        debug!("이벤트 발행: {:?}", std::mem::discriminant(&event));
        let _ = self.tx.send(event);
    }

    /// 구독자 생성
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{authenticated_session, session_with, FakeBackend};
    use bracelet_core::models::audit::AuditAction;
    use bracelet_core::ports::random::ScriptedRandom;

    #[tokio::test]
    async fn publish_and_receive() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        bus.publish(SessionEvent::BatteryChanged(97));

        assert_eq!(rx.recv().await.unwrap(), SessionEvent::BatteryChanged(97));
    }

    #[tokio::test]
    async fn multiple_subscribers() {
        let bus = EventBus::new(16);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.publish(SessionEvent::AuthenticationChanged(true));

        assert!(matches!(
            rx1.recv().await.unwrap(),
            SessionEvent::AuthenticationChanged(true)
        ));
        assert!(matches!(
            rx2.recv().await.unwrap(),
            SessionEvent::AuthenticationChanged(true)
        ));
    }

    #[test]
    fn publish_without_subscribers_is_noop() {
        let bus = EventBus::default();
        bus.publish(SessionEvent::BatteryChanged(1));
    }

    #[tokio::test]
    async fn diff_reports_authentication_and_entry() {
        let backend = FakeBackend::new();
        let mut session = session_with(backend, ScriptedRandom::new());
        let before = SessionView::capture(&session);

        session.authenticate().await;
        let events = SessionView::changes_since(&before, &session);

        assert_eq!(events.len(), 2);
        assert_eq!(events[0], SessionEvent::AuthenticationChanged(true));
        assert!(matches!(
            &events[1],
            SessionEvent::EntryAppended(entry) if entry.action == AuditAction::Authenticated
        ));
    }

    #[tokio::test]
    async fn diff_reports_status_and_telemetry() {
        let backend = FakeBackend::new();
        let random = ScriptedRandom::new().with_ints(vec![1]).with_fractions(vec![1.0]);
        let mut session = authenticated_session(backend, random).await;

        let before = SessionView::capture(&session);
        session.button_danger().await;
        let events = SessionView::changes_since(&before, &session);
        assert_eq!(
            events[0],
            SessionEvent::StatusChanged {
                from: DeviceStatus::Active,
                to: DeviceStatus::Emergency,
            }
        );

        let before = SessionView::capture(&session);
        session.send_heartbeat().await;
        let events = SessionView::changes_since(&before, &session);
        assert_eq!(events[0], SessionEvent::BatteryChanged(99));
        assert!(matches!(events[1], SessionEvent::LocationChanged(_)));
        assert!(matches!(events[2], SessionEvent::EntryAppended(_)));
    }
}
