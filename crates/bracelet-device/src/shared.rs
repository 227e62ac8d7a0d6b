//! 공유 세션.
//!
//! 스케줄러 태스크와 운영자 입력이 같은 세션을 다룬다. 임계 구역은 프로토콜 연산 하나이며,
//! 연산이 끝나면 바뀐 항목을 이벤트 버스로 알린다.

use std::sync::Arc;

use bracelet_core::models::actuator::VibrationPattern;
use bracelet_core::models::audit::AuditEntry;
use bracelet_core::models::command::{CommandId, PolledCommand};
use bracelet_core::models::snapshot::SessionSnapshot;
use bracelet_core::models::status::{Button, DeviceStatus};
use tokio::sync::{broadcast, Mutex, MutexGuard};

use crate::events::{EventBus, SessionEvent, SessionView};
use crate::session::DeviceSession;

/// 복제 가능한 세션 핸들
#[derive(Clone)]
pub struct SharedSession {
    inner: Arc<Mutex<DeviceSession>>,
    events: Arc<EventBus>,
}

impl SharedSession {
    pub fn new(session: DeviceSession) -> Self {
        Self::with_event_bus(session, EventBus::default())
    }

    pub fn with_event_bus(session: DeviceSession, events: EventBus) -> Self {
        Self {
            inner: Arc::new(Mutex::new(session)),
            events: Arc::new(events),
        }
    }

    /// 변경 알림 구독
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// 현재 상태 사본
    pub async fn view(&self) -> SessionView {
        SessionView::capture(&*self.inner.lock().await)
    }

    pub async fn status(&self) -> DeviceStatus {
        self.inner.lock().await.status()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.inner.lock().await.is_authenticated()
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        self.inner.lock().await.snapshot()
    }

    /// 최근 감사 항목 (기록 순서)
    pub async fn recent_entries(&self, limit: usize) -> Vec<AuditEntry> {
        self.inner.lock().await.log().recent(limit).to_vec()
    }

    pub async fn authenticate(&self) -> bool {
        let (mut session, before) = self.begin().await;
        let ok = session.authenticate().await;
        self.finish(&before, &session);
        ok
    }

    pub async fn send_heartbeat(&self) -> bool {
        let (mut session, before) = self.begin().await;
        let ok = session.send_heartbeat().await;
        self.finish(&before, &session);
        ok
    }

    pub async fn press_button(&self, button: Button) -> bool {
        let (mut session, before) = self.begin().await;
        let ok = session.press_button(button).await;
        self.finish(&before, &session);
        ok
    }

    pub async fn update_danger_location(&self) -> bool {
        let (mut session, before) = self.begin().await;
        let ok = session.update_danger_location().await;
        self.finish(&before, &session);
        ok
    }

    pub async fn check_commands(&self) -> Option<PolledCommand> {
        let (mut session, before) = self.begin().await;
        let command = session.check_commands().await;
        self.finish(&before, &session);
        command
    }

    pub async fn vibrate(
        &self,
        pattern: VibrationPattern,
        command_id: Option<CommandId>,
    ) -> Option<bool> {
        let (mut session, before) = self.begin().await;
        let acked = session.vibrate(pattern, command_id).await;
        self.finish(&before, &session);
        acked
    }

    pub async fn led_on(&self, color: &str, command_id: Option<CommandId>) -> Option<bool> {
        let (mut session, before) = self.begin().await;
        let acked = session.led_on(color, command_id).await;
        self.finish(&before, &session);
        acked
    }

    pub async fn led_blink(
        &self,
        color: &str,
        pattern: &str,
        command_id: Option<CommandId>,
    ) -> Option<bool> {
        let (mut session, before) = self.begin().await;
        let acked = session.led_blink(color, pattern, command_id).await;
        self.finish(&before, &session);
        acked
    }

    pub async fn led_off(&self) {
        let (mut session, before) = self.begin().await;
        session.led_off();
        self.finish(&before, &session);
    }

    pub async fn reset_battery(&self, level: u8) {
        let (mut session, before) = self.begin().await;
        session.reset_battery(level);
        self.finish(&before, &session);
    }

    async fn begin(&self) -> (MutexGuard<'_, DeviceSession>, SessionView) {
        let session = self.inner.lock().await;
        let before = SessionView::capture(&session);
        (session, before)
    }

    fn finish(&self, before: &SessionView, session: &DeviceSession) {
        for event in SessionView::changes_since(before, session) {
            self.events.publish(event);
        }
    }
}
