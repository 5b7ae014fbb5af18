#![allow(dead_code)]

//! Typed client for the Aegis API.
//!
//! All HTTP traffic from the dashboards goes through `PortalApi`; the
//! controllers hold it as `Arc<dyn PortalApi>` so tests can swap in an
//! in-memory implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a structured response: DNS, refused
    /// connection, timeout. Retry-safe from the caller's perspective,
    /// but never retried automatically.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API error (status {status}): {code}: {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },
}

impl ApiError {
    /// Message suitable for showing directly to the user after a failed
    /// action.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Network(_) => "Network error. Please check your connection.".to_string(),
            ApiError::Api { message, .. } => message.clone(),
        }
    }

    /// True when the server reports it committed the ledger update but a
    /// later coordinator step failed. The UI must present this
    /// differently from both success and plain failure.
    pub fn is_partial_update(&self) -> bool {
        matches!(self, ApiError::Api { code, .. } if code == "PARTIAL_UPDATE")
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: String,
    message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PendingRequest {
    pub id: Uuid,
    pub guide_id: Uuid,
    pub programmer_id: Uuid,
    pub programmer_name: String,
    pub programmer_email: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResolvedRequest {
    pub id: Uuid,
    pub status: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionSummary {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    #[serde(rename = "meetingLink")]
    pub meeting_link: String,
    #[serde(rename = "guideName")]
    pub guide_name: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotificationSummary {
    pub id: Uuid,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GuideSummary {
    pub id: Uuid,
    pub name: String,
    pub expertise: String,
    pub email: String,
}

/// A guide's decision as sent to the resolve endpoint.
#[derive(Debug, Clone)]
pub enum ResolveDecision {
    Approve {
        title: String,
        description: String,
        meeting_link: String,
    },
    Reject,
}

impl ResolveDecision {
    fn to_body(&self) -> serde_json::Value {
        match self {
            ResolveDecision::Approve {
                title,
                description,
                meeting_link,
            } => json!({
                "status": "approved",
                "title": title,
                "description": description,
                "meetingLink": meeting_link,
            }),
            ResolveDecision::Reject => json!({ "status": "rejected" }),
        }
    }
}

#[derive(Deserialize)]
struct RequestsEnvelope {
    requests: Vec<PendingRequest>,
}

#[derive(Deserialize)]
struct SessionsEnvelope {
    sessions: Vec<SessionSummary>,
}

#[derive(Deserialize)]
struct NotificationsEnvelope {
    notifications: Vec<NotificationSummary>,
}

#[async_trait]
pub trait PortalApi: Send + Sync {
    async fn submit_session_request(
        &self,
        guide_id: Uuid,
        programmer_id: Uuid,
    ) -> Result<ResolvedRequest, ApiError>;

    async fn pending_requests(&self, guide_id: Uuid) -> Result<Vec<PendingRequest>, ApiError>;

    async fn resolve_request(
        &self,
        request_id: Uuid,
        decision: &ResolveDecision,
    ) -> Result<ResolvedRequest, ApiError>;

    async fn sessions_for_programmer(
        &self,
        programmer_id: Uuid,
    ) -> Result<Vec<SessionSummary>, ApiError>;

    async fn list_guides(&self) -> Result<Vec<GuideSummary>, ApiError>;

    async fn notifications(&self, recipient_id: Uuid)
        -> Result<Vec<NotificationSummary>, ApiError>;

    async fn mark_notification_read(&self, notification_id: Uuid) -> Result<(), ApiError>;
}

/// The HTTP implementation used by the real dashboards.
pub struct HttpPortalApi {
    client: Client,
    base_url: String,
}

impl HttpPortalApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        let base_url = base_url.trim_end_matches('/').to_string();
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(DEFAULT_TIMEOUT_SECS))
                .build()
                .expect("Failed to build HTTP client"),
            base_url,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let (code, message) = serde_json::from_str::<ErrorEnvelope>(&body)
                .map(|e| (e.error.code, e.error.message))
                .unwrap_or_else(|_| ("UNKNOWN".to_string(), body));
            return Err(ApiError::Api {
                status: status.as_u16(),
                code,
                message,
            });
        }
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl PortalApi for HttpPortalApi {
    async fn submit_session_request(
        &self,
        guide_id: Uuid,
        programmer_id: Uuid,
    ) -> Result<ResolvedRequest, ApiError> {
        let response = self
            .client
            .post(self.url("/api/v1/session-requests"))
            .json(&json!({ "guideId": guide_id, "programmerId": programmer_id }))
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn pending_requests(&self, guide_id: Uuid) -> Result<Vec<PendingRequest>, ApiError> {
        let response = self
            .client
            .get(self.url(&format!("/api/v1/session-requests/{guide_id}")))
            .send()
            .await?;
        let envelope: RequestsEnvelope = Self::decode(response).await?;
        Ok(envelope.requests)
    }

    async fn resolve_request(
        &self,
        request_id: Uuid,
        decision: &ResolveDecision,
    ) -> Result<ResolvedRequest, ApiError> {
        let response = self
            .client
            .post(self.url(&format!("/api/v1/session-requests/{request_id}/update")))
            .json(&decision.to_body())
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn sessions_for_programmer(
        &self,
        programmer_id: Uuid,
    ) -> Result<Vec<SessionSummary>, ApiError> {
        let response = self
            .client
            .get(self.url(&format!("/api/v1/sessions/programmer/{programmer_id}")))
            .send()
            .await?;
        let envelope: SessionsEnvelope = Self::decode(response).await?;
        Ok(envelope.sessions)
    }

    async fn list_guides(&self) -> Result<Vec<GuideSummary>, ApiError> {
        let response = self.client.get(self.url("/api/v1/guides")).send().await?;
        Self::decode(response).await
    }

    async fn notifications(
        &self,
        recipient_id: Uuid,
    ) -> Result<Vec<NotificationSummary>, ApiError> {
        let response = self
            .client
            .get(self.url(&format!("/api/v1/notifications/{recipient_id}")))
            .send()
            .await?;
        let envelope: NotificationsEnvelope = Self::decode(response).await?;
        Ok(envelope.notifications)
    }

    async fn mark_notification_read(&self, notification_id: Uuid) -> Result<(), ApiError> {
        let response = self
            .client
            .post(self.url(&format!("/api/v1/notifications/{notification_id}/read")))
            .json(&json!({}))
            .send()
            .await?;
        Self::decode::<serde_json::Value>(response).await?;
        Ok(())
    }
}
