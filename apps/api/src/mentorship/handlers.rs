use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::warn;
use uuid::Uuid;

use crate::errors::AppError;
use crate::mentorship::coordinator::SessionDetails;
use crate::mentorship::notifications::{NotificationKind, NotificationRow};
use crate::mentorship::requests::SessionRequestRow;
use crate::mentorship::sessions::{NewSession, SessionRow};
use crate::models::user::Role;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct SubmitRequestBody {
    #[serde(rename = "guideId")]
    pub guide_id: Uuid,
    #[serde(rename = "programmerId")]
    pub programmer_id: Uuid,
}

#[derive(Serialize)]
pub struct RequestStatusResponse {
    pub id: Uuid,
    pub status: String,
}

/// POST /api/v1/session-requests
///
/// A programmer asks a guide for mentorship time. The request lands
/// pending; the guide also gets a heads-up notification, but that write
/// is advisory and never fails the submit.
pub async fn handle_submit_request(
    State(state): State<AppState>,
    Json(body): Json<SubmitRequestBody>,
) -> Result<(StatusCode, Json<RequestStatusResponse>), AppError> {
    let guide = state.users.fetch(body.guide_id).await?;
    if !guide.has_role(Role::Guide) {
        return Err(AppError::Validation(format!(
            "User {} is not a guide",
            guide.id
        )));
    }

    let programmer = state.users.fetch(body.programmer_id).await?;
    if !programmer.has_role(Role::Programmer) {
        return Err(AppError::Validation(format!(
            "User {} is not a programmer",
            programmer.id
        )));
    }

    let request = state.ledger.submit(guide.id, &programmer).await?;

    if let Err(e) = state
        .notifier
        .create(
            guide.id,
            &NotificationKind::RequestReceived {
                programmer_name: programmer.name.clone(),
            },
        )
        .await
    {
        warn!("Could not notify guide {} of new request: {e}", guide.id);
    }

    Ok((
        StatusCode::CREATED,
        Json(RequestStatusResponse {
            id: request.id,
            status: request.status,
        }),
    ))
}

#[derive(Serialize)]
pub struct RequestListResponse {
    pub requests: Vec<SessionRequestRow>,
}

/// GET /api/v1/session-requests/:guide_id
///
/// Pending requests for a guide, oldest first.
pub async fn handle_list_requests(
    State(state): State<AppState>,
    Path(guide_id): Path<Uuid>,
) -> Result<Json<RequestListResponse>, AppError> {
    let requests = state.ledger.list_pending(guide_id).await?;
    Ok(Json(RequestListResponse { requests }))
}

#[derive(Deserialize)]
pub struct ResolveRequestBody {
    pub status: String,
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "meetingLink")]
    pub meeting_link: Option<String>,
}

/// POST /api/v1/session-requests/:id/update
///
/// The guide's decision. Approvals must carry session details; the
/// coordinator sequences ledger, session, and notification writes.
pub async fn handle_resolve_request(
    State(state): State<AppState>,
    Path(request_id): Path<Uuid>,
    Json(body): Json<ResolveRequestBody>,
) -> Result<Json<RequestStatusResponse>, AppError> {
    let resolved = match body.status.as_str() {
        "approved" => {
            let details = SessionDetails {
                title: body.title.unwrap_or_default(),
                description: body.description.unwrap_or_default(),
                meeting_link: body.meeting_link.unwrap_or_default(),
            };
            state.coordinator.approve(request_id, details).await?.request
        }
        "rejected" => state.coordinator.reject(request_id).await?,
        other => {
            return Err(AppError::Validation(format!(
                "Invalid status '{other}': expected 'approved' or 'rejected'"
            )))
        }
    };

    Ok(Json(RequestStatusResponse {
        id: resolved.id,
        status: resolved.status,
    }))
}

#[derive(Deserialize)]
pub struct CreateSessionBody {
    pub title: String,
    pub description: String,
    #[serde(rename = "meetingLink")]
    pub meeting_link: String,
    #[serde(rename = "guideId")]
    pub guide_id: Uuid,
    #[serde(rename = "programmerEmail")]
    pub programmer_email: String,
}

/// POST /api/v1/sessions
///
/// Direct guide-authored session, not tied to any request. The invited
/// programmer is notified when the email resolves to a known user.
pub async fn handle_create_session(
    State(state): State<AppState>,
    Json(body): Json<CreateSessionBody>,
) -> Result<Json<Value>, AppError> {
    if body.title.trim().is_empty()
        || body.description.trim().is_empty()
        || body.meeting_link.trim().is_empty()
    {
        return Err(AppError::Validation(
            "title, description and meetingLink are required".to_string(),
        ));
    }

    let guide = state.users.fetch(body.guide_id).await?;
    if !guide.has_role(Role::Guide) {
        return Err(AppError::Validation(format!(
            "User {} is not a guide",
            guide.id
        )));
    }

    let session = state
        .registry
        .create(NewSession {
            title: body.title.clone(),
            description: body.description,
            meeting_link: body.meeting_link,
            guide_id: guide.id,
            invited_programmer_email: body.programmer_email.clone(),
        })
        .await?;

    match state.users.find_by_email(&body.programmer_email).await {
        Ok(Some(programmer)) => {
            if let Err(e) = state
                .notifier
                .create(
                    programmer.id,
                    &NotificationKind::SessionScheduled { title: body.title },
                )
                .await
            {
                warn!("Could not notify {} of new session: {e}", programmer.id);
            }
        }
        Ok(None) => {}
        Err(e) => warn!("Lookup of invited programmer failed: {e}"),
    }

    Ok(Json(json!({ "id": session.id })))
}

/// Session as rendered for programmer-facing listings.
#[derive(Serialize)]
pub struct SessionView {
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

#[derive(Serialize)]
pub struct SessionListResponse {
    pub sessions: Vec<SessionView>,
}

async fn render_sessions(
    state: &AppState,
    rows: Vec<SessionRow>,
) -> Result<Vec<SessionView>, AppError> {
    let mut guide_names: HashMap<Uuid, String> = HashMap::new();
    let mut views = Vec::with_capacity(rows.len());
    for row in rows {
        let guide_name = match guide_names.get(&row.guide_id) {
            Some(name) => name.clone(),
            None => {
                let name = state
                    .users
                    .fetch(row.guide_id)
                    .await
                    .map(|g| g.name)
                    .unwrap_or_else(|_| "Unknown guide".to_string());
                guide_names.insert(row.guide_id, name.clone());
                name
            }
        };
        views.push(SessionView {
            id: row.id,
            title: row.title,
            description: row.description,
            meeting_link: row.meeting_link,
            guide_name,
            created_at: row.created_at,
        });
    }
    Ok(views)
}

/// GET /api/v1/sessions
pub async fn handle_list_sessions(
    State(state): State<AppState>,
) -> Result<Json<SessionListResponse>, AppError> {
    let rows = state.registry.list_all().await?;
    let sessions = render_sessions(&state, rows).await?;
    Ok(Json(SessionListResponse { sessions }))
}

#[derive(Serialize)]
pub struct GuideSessionListResponse {
    pub sessions: Vec<SessionRow>,
}

/// GET /api/v1/sessions/guide/:guide_id
pub async fn handle_list_guide_sessions(
    State(state): State<AppState>,
    Path(guide_id): Path<Uuid>,
) -> Result<Json<GuideSessionListResponse>, AppError> {
    let sessions = state.registry.list_for_guide(guide_id).await?;
    Ok(Json(GuideSessionListResponse { sessions }))
}

/// GET /api/v1/sessions/programmer/:programmer_id
pub async fn handle_list_programmer_sessions(
    State(state): State<AppState>,
    Path(programmer_id): Path<Uuid>,
) -> Result<Json<SessionListResponse>, AppError> {
    let programmer = state.users.fetch(programmer_id).await?;
    let rows = state.registry.list_for_programmer(&programmer.email).await?;
    let sessions = render_sessions(&state, rows).await?;
    Ok(Json(SessionListResponse { sessions }))
}

#[derive(Serialize)]
pub struct GuideView {
    pub id: Uuid,
    pub name: String,
    pub expertise: String,
    pub email: String,
}

/// GET /api/v1/guides
pub async fn handle_list_guides(
    State(state): State<AppState>,
) -> Result<Json<Vec<GuideView>>, AppError> {
    let guides = state.users.list_guides().await?;
    Ok(Json(
        guides
            .into_iter()
            .map(|g| GuideView {
                id: g.id,
                name: g.name,
                // Expertise is not modeled yet; every guide advertises
                // general guidance for now.
                expertise: "General Guidance".to_string(),
                email: g.email,
            })
            .collect(),
    ))
}

#[derive(Deserialize)]
pub struct NotifyProgrammerBody {
    pub email: String,
    #[allow(dead_code)]
    pub name: Option<String>,
    pub status: String,
    #[serde(rename = "guideName")]
    pub guide_name: String,
    #[serde(rename = "meetingLink")]
    pub meeting_link: Option<String>,
}

/// POST /api/v1/notify-programmer
///
/// Boundary entry point for dispatching a decision notification to a
/// programmer addressed by email.
pub async fn handle_notify_programmer(
    State(state): State<AppState>,
    Json(body): Json<NotifyProgrammerBody>,
) -> Result<Json<Value>, AppError> {
    let programmer = state
        .users
        .find_by_email(&body.email)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No user with email {}", body.email)))?;

    let kind = match body.status.as_str() {
        "approved" => {
            let meeting_link = body
                .meeting_link
                .filter(|l| !l.trim().is_empty())
                .ok_or_else(|| {
                    AppError::Validation(
                        "meetingLink is required for approved notifications".to_string(),
                    )
                })?;
            NotificationKind::SessionApproved {
                guide_name: body.guide_name,
                meeting_link,
            }
        }
        "rejected" => NotificationKind::SessionRejected {
            guide_name: body.guide_name,
        },
        other => {
            return Err(AppError::Validation(format!(
                "Invalid status '{other}': expected 'approved' or 'rejected'"
            )))
        }
    };

    state.notifier.create(programmer.id, &kind).await?;
    Ok(Json(json!({})))
}

#[derive(Serialize)]
pub struct NotificationListResponse {
    pub notifications: Vec<NotificationRow>,
}

/// GET /api/v1/notifications/:recipient_id
pub async fn handle_list_notifications(
    State(state): State<AppState>,
    Path(recipient_id): Path<Uuid>,
) -> Result<Json<NotificationListResponse>, AppError> {
    let notifications = state.notifier.list_for(recipient_id).await?;
    Ok(Json(NotificationListResponse { notifications }))
}

/// POST /api/v1/notifications/:id/read
pub async fn handle_mark_notification_read(
    State(state): State<AppState>,
    Path(notification_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    state.notifier.mark_read(notification_id).await?;
    Ok(Json(json!({})))
}
