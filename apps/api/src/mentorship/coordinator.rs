//! Approval Coordinator: sequences the side effects of a guide's
//! decision so the programmer observes it as a single atomic update.
//!
//! Write order is fixed: ledger first, then session, then notification.
//! A crash or failure between steps leaves the request terminal but
//! never a dangling session. Failures after the ledger commit are
//! surfaced as `PartialUpdate` and are not rolled back; the operator can
//! recreate a session for an approved-but-session-less request by hand.

use std::sync::Arc;

use tracing::{error, info};
use uuid::Uuid;

use crate::errors::AppError;
use crate::mentorship::notifications::{NotificationKind, NotificationStore};
use crate::mentorship::requests::{Decision, RequestLedger, SessionRequestRow};
use crate::mentorship::sessions::{NewSession, SessionRegistry, SessionRow};
use crate::users::UserDirectory;

/// Session details supplied by the guide alongside an approval.
#[derive(Debug, Clone)]
pub struct SessionDetails {
    pub title: String,
    pub description: String,
    pub meeting_link: String,
}

#[derive(Debug, Clone)]
pub struct ApprovalOutcome {
    pub request: SessionRequestRow,
    pub session: SessionRow,
}

#[derive(Clone)]
pub struct ApprovalCoordinator {
    ledger: Arc<dyn RequestLedger>,
    registry: Arc<dyn SessionRegistry>,
    notifier: Arc<dyn NotificationStore>,
    users: Arc<dyn UserDirectory>,
}

impl ApprovalCoordinator {
    pub fn new(
        ledger: Arc<dyn RequestLedger>,
        registry: Arc<dyn SessionRegistry>,
        notifier: Arc<dyn NotificationStore>,
        users: Arc<dyn UserDirectory>,
    ) -> Self {
        Self {
            ledger,
            registry,
            notifier,
            users,
        }
    }

    /// Approves a pending request: resolves the ledger, creates the
    /// session, then notifies the programmer with the guide's name and
    /// the meeting link.
    ///
    /// Input validation happens before any mutation. Once the ledger has
    /// committed, later failures return `PartialUpdate` instead of
    /// pretending nothing happened.
    pub async fn approve(
        &self,
        request_id: Uuid,
        details: SessionDetails,
    ) -> Result<ApprovalOutcome, AppError> {
        let meeting_link = details.meeting_link.trim().to_string();
        if meeting_link.is_empty() {
            return Err(AppError::Validation(
                "meetingLink must not be empty when approving".to_string(),
            ));
        }
        if details.title.trim().is_empty() {
            return Err(AppError::Validation(
                "title must not be empty when approving".to_string(),
            ));
        }

        let request = self.ledger.resolve(request_id, Decision::Approve).await?;

        let session = match self
            .registry
            .create(NewSession {
                title: details.title,
                description: details.description,
                meeting_link: meeting_link.clone(),
                guide_id: request.guide_id,
                invited_programmer_email: request.programmer_email.clone(),
            })
            .await
        {
            Ok(session) => session,
            Err(e) => {
                error!("Session creation failed after approving request {request_id}: {e}");
                return Err(AppError::PartialUpdate(format!(
                    "Request {request_id} was approved but session creation failed"
                )));
            }
        };

        if let Err(e) = self
            .notify(
                request.programmer_id,
                request.guide_id,
                |guide_name| NotificationKind::SessionApproved {
                    guide_name,
                    meeting_link: meeting_link.clone(),
                },
            )
            .await
        {
            error!("Notification dispatch failed after approving request {request_id}: {e}");
            return Err(AppError::PartialUpdate(format!(
                "Request {request_id} was approved and the session created, but the programmer could not be notified"
            )));
        }

        info!(
            "Approved request {request_id}: session {} for {}",
            session.id, request.programmer_email
        );
        Ok(ApprovalOutcome { request, session })
    }

    /// Rejects a pending request and notifies the programmer. No session
    /// is created.
    pub async fn reject(&self, request_id: Uuid) -> Result<SessionRequestRow, AppError> {
        let request = self.ledger.resolve(request_id, Decision::Reject).await?;

        if let Err(e) = self
            .notify(request.programmer_id, request.guide_id, |guide_name| {
                NotificationKind::SessionRejected { guide_name }
            })
            .await
        {
            error!("Notification dispatch failed after rejecting request {request_id}: {e}");
            return Err(AppError::PartialUpdate(format!(
                "Request {request_id} was rejected but the programmer could not be notified"
            )));
        }

        info!("Rejected request {request_id}");
        Ok(request)
    }

    async fn notify(
        &self,
        recipient_id: Uuid,
        guide_id: Uuid,
        kind: impl FnOnce(String) -> NotificationKind,
    ) -> Result<(), AppError> {
        let guide = self.users.fetch(guide_id).await?;
        self.notifier.create(recipient_id, &kind(guide.name)).await?;
        Ok(())
    }
}
