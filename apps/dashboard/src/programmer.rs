#![allow(dead_code)]

//! Programmer dashboard controller: notifications and scheduled
//! sessions on two independent polling cadences.
//!
//! Notification latency is prioritized over session-list freshness, so
//! the two loops are intentionally decoupled.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use tracing::warn;
use uuid::Uuid;

use crate::api_client::{ApiError, NotificationSummary, PortalApi, ResolvedRequest, SessionSummary};
use crate::poller::PollHandle;

pub const NOTIFICATION_POLL_PERIOD: Duration = Duration::from_secs(15);
pub const SESSION_POLL_PERIOD: Duration = Duration::from_secs(30);

pub struct ProgrammerDashboard {
    programmer_id: Uuid,
    api: Arc<dyn PortalApi>,
    notifications: Arc<RwLock<Vec<NotificationSummary>>>,
    sessions: Arc<RwLock<Vec<SessionSummary>>>,
    pollers: Vec<PollHandle>,
}

impl ProgrammerDashboard {
    /// Creates the controller without starting the pollers. Used
    /// directly in tests; production code goes through `mount`.
    pub fn new(api: Arc<dyn PortalApi>, programmer_id: Uuid) -> Self {
        Self {
            programmer_id,
            api,
            notifications: Arc::new(RwLock::new(Vec::new())),
            sessions: Arc::new(RwLock::new(Vec::new())),
            pollers: Vec::new(),
        }
    }

    /// Creates the controller and starts both polling loops.
    pub fn mount(api: Arc<dyn PortalApi>, programmer_id: Uuid) -> Self {
        let mut dashboard = Self::new(api, programmer_id);
        dashboard.start_polling(NOTIFICATION_POLL_PERIOD, SESSION_POLL_PERIOD);
        dashboard
    }

    fn start_polling(&mut self, notification_period: Duration, session_period: Duration) {
        let api = self.api.clone();
        let programmer_id = self.programmer_id;
        let notifications = self.notifications.clone();
        self.pollers.push(PollHandle::spawn(
            "programmer-notifications",
            notification_period,
            move |token| {
                let api = api.clone();
                let notifications = notifications.clone();
                async move {
                    match api.notifications(programmer_id).await {
                        Ok(rows) => {
                            if !token.is_cancelled() {
                                let mut current = notifications.write().unwrap();
                                *current = merge_notifications(&current, rows);
                            }
                        }
                        // Failed polls degrade silently to stale data.
                        Err(e) => warn!("Notification poll failed: {e}"),
                    }
                }
            },
        ));

        let api = self.api.clone();
        let sessions = self.sessions.clone();
        self.pollers.push(PollHandle::spawn(
            "programmer-sessions",
            session_period,
            move |token| {
                let api = api.clone();
                let sessions = sessions.clone();
                async move {
                    match api.sessions_for_programmer(programmer_id).await {
                        Ok(rows) => {
                            if !token.is_cancelled() {
                                *sessions.write().unwrap() = rows;
                            }
                        }
                        Err(e) => warn!("Session poll failed: {e}"),
                    }
                }
            },
        ));
    }

    pub fn notifications(&self) -> Vec<NotificationSummary> {
        self.notifications.read().unwrap().clone()
    }

    pub fn sessions(&self) -> Vec<SessionSummary> {
        self.sessions.read().unwrap().clone()
    }

    pub fn unread_count(&self) -> usize {
        self.notifications
            .read()
            .unwrap()
            .iter()
            .filter(|n| !n.is_read)
            .count()
    }

    /// Immediate notification refresh outside the polling cadence.
    pub async fn refresh_notifications(&self) -> Result<(), ApiError> {
        let rows = self.api.notifications(self.programmer_id).await?;
        let mut current = self.notifications.write().unwrap();
        *current = merge_notifications(&current, rows);
        Ok(())
    }

    /// Immediate session refresh outside the polling cadence.
    pub async fn refresh_sessions(&self) -> Result<(), ApiError> {
        let rows = self.api.sessions_for_programmer(self.programmer_id).await?;
        *self.sessions.write().unwrap() = rows;
        Ok(())
    }

    /// Acknowledges a notification. Local state flips immediately and
    /// the server call is dispatched fire-and-forget, so the next poll
    /// cycle is never blocked on the acknowledgement.
    pub fn mark_read(&self, notification_id: Uuid) {
        {
            let mut notifications = self.notifications.write().unwrap();
            if let Some(notification) =
                notifications.iter_mut().find(|n| n.id == notification_id)
            {
                notification.is_read = true;
            }
        }

        let api = self.api.clone();
        tokio::spawn(async move {
            if let Err(e) = api.mark_notification_read(notification_id).await {
                warn!("Mark-read for notification {notification_id} failed: {e}");
            }
        });
    }

    /// Asks a guide for mentorship time. User-initiated, so errors are
    /// returned for display rather than swallowed.
    pub async fn request_session(&self, guide_id: Uuid) -> Result<ResolvedRequest, ApiError> {
        self.api
            .submit_session_request(guide_id, self.programmer_id)
            .await
    }

    /// Stops both pollers deterministically.
    pub async fn unmount(mut self) {
        for poller in self.pollers.drain(..) {
            poller.shutdown().await;
        }
    }
}

/// Merges a freshly polled snapshot with local read state. The read
/// flag is monotonic: a notification already read locally stays read
/// even when the poll raced the acknowledgement and still reports the
/// server copy unread.
fn merge_notifications(
    current: &[NotificationSummary],
    mut incoming: Vec<NotificationSummary>,
) -> Vec<NotificationSummary> {
    for notification in incoming.iter_mut() {
        if !notification.is_read {
            let locally_read = current
                .iter()
                .any(|c| c.id == notification.id && c.is_read);
            if locally_read {
                notification.is_read = true;
            }
        }
    }
    incoming
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api_client::{GuideSummary, PendingRequest, ResolveDecision};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::sync::Notify;

    fn make_notification(message: &str) -> NotificationSummary {
        NotificationSummary {
            id: Uuid::new_v4(),
            message: message.to_string(),
            is_read: false,
            created_at: Utc::now(),
        }
    }

    fn make_session(title: &str) -> SessionSummary {
        SessionSummary {
            id: Uuid::new_v4(),
            title: title.to_string(),
            description: "Career guidance".to_string(),
            meeting_link: "https://meet.example/abc".to_string(),
            guide_name: "Marcus".to_string(),
            created_at: Utc::now(),
        }
    }

    struct FakeApi {
        notifications: Mutex<Vec<NotificationSummary>>,
        sessions: Mutex<Vec<SessionSummary>>,
        mark_read_calls: AtomicUsize,
        mark_read_done: Notify,
        fail_mark_read: AtomicBool,
        fail_submit: AtomicBool,
    }

    impl FakeApi {
        fn new() -> Self {
            Self {
                notifications: Mutex::new(Vec::new()),
                sessions: Mutex::new(Vec::new()),
                mark_read_calls: AtomicUsize::new(0),
                mark_read_done: Notify::new(),
                fail_mark_read: AtomicBool::new(false),
                fail_submit: AtomicBool::new(false),
            }
        }
    }

    #[async_trait]
    impl PortalApi for FakeApi {
        async fn submit_session_request(
            &self,
            guide_id: Uuid,
            _programmer_id: Uuid,
        ) -> Result<ResolvedRequest, ApiError> {
            if self.fail_submit.load(Ordering::SeqCst) {
                return Err(ApiError::Api {
                    status: 404,
                    code: "NOT_FOUND".to_string(),
                    message: format!("User {guide_id} not found"),
                });
            }
            Ok(ResolvedRequest {
                id: Uuid::new_v4(),
                status: "pending".to_string(),
            })
        }

        async fn pending_requests(
            &self,
            _guide_id: Uuid,
        ) -> Result<Vec<PendingRequest>, ApiError> {
            Ok(Vec::new())
        }

        async fn resolve_request(
            &self,
            _request_id: Uuid,
            _decision: &ResolveDecision,
        ) -> Result<ResolvedRequest, ApiError> {
            unimplemented!("not exercised by programmer dashboard tests")
        }

        async fn sessions_for_programmer(
            &self,
            _programmer_id: Uuid,
        ) -> Result<Vec<SessionSummary>, ApiError> {
            Ok(self.sessions.lock().unwrap().clone())
        }

        async fn list_guides(&self) -> Result<Vec<GuideSummary>, ApiError> {
            Ok(Vec::new())
        }

        async fn notifications(
            &self,
            _recipient_id: Uuid,
        ) -> Result<Vec<NotificationSummary>, ApiError> {
            Ok(self.notifications.lock().unwrap().clone())
        }

        async fn mark_notification_read(&self, _notification_id: Uuid) -> Result<(), ApiError> {
            self.mark_read_calls.fetch_add(1, Ordering::SeqCst);
            let failed = self.fail_mark_read.load(Ordering::SeqCst);
            self.mark_read_done.notify_one();
            if failed {
                return Err(ApiError::Api {
                    status: 404,
                    code: "NOT_FOUND".to_string(),
                    message: "Notification not found".to_string(),
                });
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_refresh_populates_sessions_and_notifications() {
        let api = Arc::new(FakeApi::new());
        api.sessions.lock().unwrap().push(make_session("Intro"));
        api.notifications
            .lock()
            .unwrap()
            .push(make_notification("Your session request has been approved."));

        let dashboard = ProgrammerDashboard::new(api, Uuid::new_v4());
        dashboard.refresh_sessions().await.unwrap();
        dashboard.refresh_notifications().await.unwrap();

        assert_eq!(dashboard.sessions().len(), 1);
        assert_eq!(dashboard.notifications().len(), 1);
        assert_eq!(dashboard.unread_count(), 1);
    }

    #[tokio::test]
    async fn test_mark_read_flips_local_state_immediately() {
        let api = Arc::new(FakeApi::new());
        let notification = make_notification("hello");
        api.notifications.lock().unwrap().push(notification.clone());

        let dashboard = ProgrammerDashboard::new(api.clone(), Uuid::new_v4());
        dashboard.refresh_notifications().await.unwrap();

        dashboard.mark_read(notification.id);
        // Local state is already read, before the server call lands.
        assert_eq!(dashboard.unread_count(), 0);

        api.mark_read_done.notified().await;
        assert_eq!(api.mark_read_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_read_state_survives_a_stale_poll() {
        let api = Arc::new(FakeApi::new());
        let notification = make_notification("hello");
        api.notifications.lock().unwrap().push(notification.clone());

        let dashboard = ProgrammerDashboard::new(api.clone(), Uuid::new_v4());
        dashboard.refresh_notifications().await.unwrap();
        dashboard.mark_read(notification.id);
        assert_eq!(dashboard.unread_count(), 0);

        // The server copy still says unread; the local flag must not
        // regress when the next poll merges it in.
        dashboard.refresh_notifications().await.unwrap();
        assert_eq!(dashboard.unread_count(), 0);
        assert!(dashboard.notifications()[0].is_read);
    }

    #[tokio::test]
    async fn test_mark_read_failure_does_not_unread_locally() {
        let api = Arc::new(FakeApi::new());
        api.fail_mark_read.store(true, Ordering::SeqCst);
        let notification = make_notification("hello");
        api.notifications.lock().unwrap().push(notification.clone());

        let dashboard = ProgrammerDashboard::new(api.clone(), Uuid::new_v4());
        dashboard.refresh_notifications().await.unwrap();
        dashboard.mark_read(notification.id);

        api.mark_read_done.notified().await;
        // Fire-and-forget: the failure is logged, local state stays read.
        assert_eq!(dashboard.unread_count(), 0);
    }

    #[tokio::test]
    async fn test_request_session_surfaces_errors() {
        let api = Arc::new(FakeApi::new());
        let dashboard = ProgrammerDashboard::new(api.clone(), Uuid::new_v4());

        let submitted = dashboard.request_session(Uuid::new_v4()).await.unwrap();
        assert_eq!(submitted.status, "pending");

        api.fail_submit.store(true, Ordering::SeqCst);
        let err = dashboard.request_session(Uuid::new_v4()).await.unwrap_err();
        assert!(err.user_message().contains("not found"));
    }

    #[test]
    fn test_merge_preserves_incoming_order_and_read_flags() {
        let a = make_notification("a");
        let mut b = make_notification("b");
        b.is_read = true;

        let merged = merge_notifications(&[b.clone()], vec![a.clone(), b.clone()]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].id, a.id);
        assert!(!merged[0].is_read);
        assert!(merged[1].is_read);
    }
}
