#![allow(dead_code)]

//! Guide dashboard controller: surfaces pending session requests and
//! carries the two-step approve interaction.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use crate::api_client::{ApiError, PendingRequest, PortalApi, ResolveDecision};
use crate::poller::PollHandle;

pub const PENDING_POLL_PERIOD: Duration = Duration::from_secs(30);

/// Client-held state between "Approve" and the confirmed meeting link.
///
/// This draft lives only in the controller: it is not persisted, and
/// restarting the dashboard abandons an approval in progress, leaving
/// the request pending. Known limitation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalDraft {
    AwaitingMeetingLink { request_id: Uuid },
}

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("no approval is in progress")]
    NoApprovalInProgress,

    #[error("a decision for this request is already in flight")]
    DecisionInFlight,

    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    #[error(transparent)]
    Api(#[from] ApiError),
}

pub struct GuideDashboard {
    guide_id: Uuid,
    api: Arc<dyn PortalApi>,
    pending: Arc<RwLock<Vec<PendingRequest>>>,
    in_flight: Arc<Mutex<HashSet<Uuid>>>,
    draft: Mutex<Option<ApprovalDraft>>,
    poller: Option<PollHandle>,
}

impl GuideDashboard {
    /// Creates the controller without starting the poller. Used directly
    /// in tests; production code goes through `mount`.
    pub fn new(api: Arc<dyn PortalApi>, guide_id: Uuid) -> Self {
        Self {
            guide_id,
            api,
            pending: Arc::new(RwLock::new(Vec::new())),
            in_flight: Arc::new(Mutex::new(HashSet::new())),
            draft: Mutex::new(None),
            poller: None,
        }
    }

    /// Creates the controller and starts polling pending requests.
    pub fn mount(api: Arc<dyn PortalApi>, guide_id: Uuid) -> Self {
        let mut dashboard = Self::new(api, guide_id);
        dashboard.start_polling(PENDING_POLL_PERIOD);
        dashboard
    }

    fn start_polling(&mut self, period: Duration) {
        let api = self.api.clone();
        let guide_id = self.guide_id;
        let pending = self.pending.clone();
        self.poller = Some(PollHandle::spawn("guide-pending", period, move |token| {
            let api = api.clone();
            let pending = pending.clone();
            async move {
                match api.pending_requests(guide_id).await {
                    Ok(rows) => {
                        // Discard a fetch that outlived the dashboard.
                        if !token.is_cancelled() {
                            *pending.write().unwrap() = rows;
                        }
                    }
                    // Failed polls degrade silently to stale data.
                    Err(e) => warn!("Pending-request poll failed: {e}"),
                }
            }
        }));
    }

    /// Snapshot of pending requests, oldest first.
    pub fn pending(&self) -> Vec<PendingRequest> {
        self.pending.read().unwrap().clone()
    }

    /// Immediate refresh outside the polling cadence.
    pub async fn refresh_now(&self) -> Result<(), ApiError> {
        let rows = self.api.pending_requests(self.guide_id).await?;
        *self.pending.write().unwrap() = rows;
        Ok(())
    }

    /// Whether a decision for this request is currently in flight. The
    /// UI disables the request's action buttons while it is, so resolve
    /// cannot be double-submitted for one id.
    pub fn is_in_flight(&self, request_id: Uuid) -> bool {
        self.in_flight.lock().unwrap().contains(&request_id)
    }

    pub fn draft(&self) -> Option<ApprovalDraft> {
        *self.draft.lock().unwrap()
    }

    /// First approval step: remember which request the meeting-link
    /// dialog is collecting details for.
    pub fn begin_approval(&self, request_id: Uuid) -> Result<(), DashboardError> {
        if self.is_in_flight(request_id) {
            return Err(DashboardError::DecisionInFlight);
        }
        *self.draft.lock().unwrap() = Some(ApprovalDraft::AwaitingMeetingLink { request_id });
        Ok(())
    }

    pub fn cancel_approval(&self) {
        *self.draft.lock().unwrap() = None;
    }

    /// Second approval step: the dialog was confirmed. Validation
    /// failures keep the draft so the guide can fix the form; only a
    /// dispatched decision clears it.
    pub async fn confirm_approval(
        &self,
        title: &str,
        description: &str,
        meeting_link: &str,
    ) -> Result<(), DashboardError> {
        let request_id = match *self.draft.lock().unwrap() {
            Some(ApprovalDraft::AwaitingMeetingLink { request_id }) => request_id,
            None => return Err(DashboardError::NoApprovalInProgress),
        };
        if title.trim().is_empty() {
            return Err(DashboardError::EmptyField("title"));
        }
        if meeting_link.trim().is_empty() {
            return Err(DashboardError::EmptyField("meeting link"));
        }

        self.resolve(
            request_id,
            ResolveDecision::Approve {
                title: title.trim().to_string(),
                description: description.trim().to_string(),
                meeting_link: meeting_link.trim().to_string(),
            },
        )
        .await?;

        *self.draft.lock().unwrap() = None;
        Ok(())
    }

    pub async fn reject(&self, request_id: Uuid) -> Result<(), DashboardError> {
        self.resolve(request_id, ResolveDecision::Reject).await
    }

    async fn resolve(
        &self,
        request_id: Uuid,
        decision: ResolveDecision,
    ) -> Result<(), DashboardError> {
        let _guard = InFlightGuard::acquire(&self.in_flight, request_id)
            .ok_or(DashboardError::DecisionInFlight)?;

        self.api.resolve_request(request_id, &decision).await?;

        // The request is terminal; drop it from the local queue rather
        // than waiting for the next poll.
        self.pending.write().unwrap().retain(|r| r.id != request_id);
        Ok(())
    }

    /// Stops the poller deterministically.
    pub async fn unmount(mut self) {
        if let Some(poller) = self.poller.take() {
            poller.shutdown().await;
        }
    }
}

/// Marks a request id as having a decision in flight; releases the mark
/// when dropped, including on error paths.
struct InFlightGuard {
    set: Arc<Mutex<HashSet<Uuid>>>,
    id: Uuid,
}

impl InFlightGuard {
    fn acquire(set: &Arc<Mutex<HashSet<Uuid>>>, id: Uuid) -> Option<Self> {
        if set.lock().unwrap().insert(id) {
            Some(Self {
                set: set.clone(),
                id,
            })
        } else {
            None
        }
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.set.lock().unwrap().remove(&self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api_client::{
        GuideSummary, NotificationSummary, ResolvedRequest, SessionSummary,
    };
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tokio::sync::Notify;

    fn make_request(guide_id: Uuid) -> PendingRequest {
        PendingRequest {
            id: Uuid::new_v4(),
            guide_id,
            programmer_id: Uuid::new_v4(),
            programmer_name: "Priya".to_string(),
            programmer_email: "priya@devs.example".to_string(),
            status: "pending".to_string(),
            created_at: Utc::now(),
        }
    }

    /// In-memory API: serves a fixed pending queue, counts resolves,
    /// optionally fails or blocks them.
    struct FakeApi {
        pending: Mutex<Vec<PendingRequest>>,
        resolve_calls: AtomicUsize,
        fail_resolve: AtomicBool,
        block_resolve: AtomicBool,
        entered: Notify,
        release: Notify,
    }

    impl FakeApi {
        fn new(pending: Vec<PendingRequest>) -> Self {
            Self {
                pending: Mutex::new(pending),
                resolve_calls: AtomicUsize::new(0),
                fail_resolve: AtomicBool::new(false),
                block_resolve: AtomicBool::new(false),
                entered: Notify::new(),
                release: Notify::new(),
            }
        }
    }

    #[async_trait]
    impl PortalApi for FakeApi {
        async fn submit_session_request(
            &self,
            _guide_id: Uuid,
            _programmer_id: Uuid,
        ) -> Result<ResolvedRequest, ApiError> {
            unimplemented!("not exercised by guide dashboard tests")
        }

        async fn pending_requests(
            &self,
            _guide_id: Uuid,
        ) -> Result<Vec<PendingRequest>, ApiError> {
            Ok(self.pending.lock().unwrap().clone())
        }

        async fn resolve_request(
            &self,
            request_id: Uuid,
            _decision: &ResolveDecision,
        ) -> Result<ResolvedRequest, ApiError> {
            self.resolve_calls.fetch_add(1, Ordering::SeqCst);
            if self.block_resolve.load(Ordering::SeqCst) {
                self.entered.notify_one();
                self.release.notified().await;
            }
            if self.fail_resolve.load(Ordering::SeqCst) {
                return Err(ApiError::Api {
                    status: 502,
                    code: "PARTIAL_UPDATE".to_string(),
                    message: "Request was approved but session creation failed".to_string(),
                });
            }
            Ok(ResolvedRequest {
                id: request_id,
                status: "approved".to_string(),
            })
        }

        async fn sessions_for_programmer(
            &self,
            _programmer_id: Uuid,
        ) -> Result<Vec<SessionSummary>, ApiError> {
            Ok(Vec::new())
        }

        async fn list_guides(&self) -> Result<Vec<GuideSummary>, ApiError> {
            Ok(Vec::new())
        }

        async fn notifications(
            &self,
            _recipient_id: Uuid,
        ) -> Result<Vec<NotificationSummary>, ApiError> {
            Ok(Vec::new())
        }

        async fn mark_notification_read(&self, _notification_id: Uuid) -> Result<(), ApiError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_confirm_without_draft_fails_and_calls_nothing() {
        let guide_id = Uuid::new_v4();
        let api = Arc::new(FakeApi::new(vec![]));
        let dashboard = GuideDashboard::new(api.clone(), guide_id);

        let err = dashboard
            .confirm_approval("Intro", "", "https://meet.example/abc")
            .await
            .unwrap_err();

        assert!(matches!(err, DashboardError::NoApprovalInProgress));
        assert_eq!(api.resolve_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_meeting_link_keeps_the_draft() {
        let guide_id = Uuid::new_v4();
        let request = make_request(guide_id);
        let api = Arc::new(FakeApi::new(vec![request.clone()]));
        let dashboard = GuideDashboard::new(api.clone(), guide_id);

        dashboard.begin_approval(request.id).unwrap();
        let err = dashboard
            .confirm_approval("Intro", "Career guidance", "   ")
            .await
            .unwrap_err();

        assert!(matches!(err, DashboardError::EmptyField("meeting link")));
        assert_eq!(
            dashboard.draft(),
            Some(ApprovalDraft::AwaitingMeetingLink {
                request_id: request.id
            })
        );
        assert_eq!(api.resolve_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_confirmed_approval_clears_draft_and_queue_entry() {
        let guide_id = Uuid::new_v4();
        let request = make_request(guide_id);
        let api = Arc::new(FakeApi::new(vec![request.clone()]));
        let dashboard = GuideDashboard::new(api.clone(), guide_id);
        dashboard.refresh_now().await.unwrap();
        assert_eq!(dashboard.pending().len(), 1);

        dashboard.begin_approval(request.id).unwrap();
        dashboard
            .confirm_approval("Intro", "Career guidance", "https://meet.example/abc")
            .await
            .unwrap();

        assert_eq!(dashboard.draft(), None);
        assert!(dashboard.pending().is_empty());
        assert_eq!(api.resolve_calls.load(Ordering::SeqCst), 1);
        assert!(!dashboard.is_in_flight(request.id));
    }

    #[tokio::test]
    async fn test_failed_decision_surfaces_error_and_releases_guard() {
        let guide_id = Uuid::new_v4();
        let request = make_request(guide_id);
        let api = Arc::new(FakeApi::new(vec![request.clone()]));
        api.fail_resolve.store(true, Ordering::SeqCst);
        let dashboard = GuideDashboard::new(api.clone(), guide_id);

        let err = dashboard.reject(request.id).await.unwrap_err();
        match err {
            DashboardError::Api(api_err) => assert!(api_err.is_partial_update()),
            other => panic!("expected Api error, got {other:?}"),
        }

        // The guard must release so the guide can retry.
        assert!(!dashboard.is_in_flight(request.id));
    }

    #[tokio::test]
    async fn test_in_flight_decision_blocks_a_second_one() {
        let guide_id = Uuid::new_v4();
        let request = make_request(guide_id);
        let api = Arc::new(FakeApi::new(vec![request.clone()]));
        api.block_resolve.store(true, Ordering::SeqCst);
        let dashboard = Arc::new(GuideDashboard::new(api.clone(), guide_id));

        let background = dashboard.clone();
        let request_id = request.id;
        let first = tokio::spawn(async move { background.reject(request_id).await });

        // Wait for the first decision to park inside the API call.
        api.entered.notified().await;
        assert!(dashboard.is_in_flight(request.id));

        let err = dashboard.reject(request.id).await.unwrap_err();
        assert!(matches!(err, DashboardError::DecisionInFlight));
        let err = dashboard.begin_approval(request.id).unwrap_err();
        assert!(matches!(err, DashboardError::DecisionInFlight));

        api.release.notify_one();
        first.await.unwrap().unwrap();
        assert!(!dashboard.is_in_flight(request.id));
        // The blocked second decision never reached the API.
        assert_eq!(api.resolve_calls.load(Ordering::SeqCst), 1);
    }
}
