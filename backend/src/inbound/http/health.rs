//! Liveness and readiness probes. Unauthenticated and exempt from
//! admission.

use std::sync::atomic::{AtomicBool, Ordering};

use actix_web::{web, HttpResponse};
use serde_json::json;

use super::envelope;

/// Readiness flag flipped once the server is wired and listening.
#[derive(Debug, Default)]
pub struct HealthState {
    ready: AtomicBool,
}

impl HealthState {
    /// Start not ready.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the process ready to serve traffic.
    pub fn mark_ready(&self) {
        self.ready.store(true, Ordering::Release);
    }

    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }
}

/// The process is up.
#[utoipa::path(
    get,
    path = "/health/live",
    responses((status = 200, description = "Process is live"))
)]
pub async fn live() -> HttpResponse {
    envelope::ok(json!({ "status": "live" }))
}

/// The process is wired and accepting traffic.
#[utoipa::path(
    get,
    path = "/health/ready",
    responses(
        (status = 200, description = "Ready to serve traffic"),
        (status = 503, description = "Still starting"),
    )
)]
pub async fn ready(state: web::Data<HealthState>) -> HttpResponse {
    if state.is_ready() {
        envelope::ok(json!({ "status": "ready" }))
    } else {
        HttpResponse::ServiceUnavailable().json(json!({
            "success": false,
            "error": "Not ready",
        }))
    }
}
