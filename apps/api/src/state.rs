use std::sync::Arc;

use crate::mentorship::coordinator::ApprovalCoordinator;
use crate::mentorship::notifications::NotificationStore;
use crate::mentorship::requests::RequestLedger;
use crate::mentorship::sessions::SessionRegistry;
use crate::users::UserDirectory;

/// Shared application state injected into all route handlers via Axum
/// extractors.
///
/// The stores are trait objects so handlers and the coordinator run
/// against in-memory implementations in tests; production wires the
/// Postgres-backed impls in `main`.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserDirectory>,
    pub ledger: Arc<dyn RequestLedger>,
    pub registry: Arc<dyn SessionRegistry>,
    pub notifier: Arc<dyn NotificationStore>,
    pub coordinator: ApprovalCoordinator,
}
