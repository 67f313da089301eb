//! Admission middleware: route-group classification and the 429 gate.
//!
//! Classifies each request into a [`RouteGroup`], asks the shared
//! [`AdmissionController`] for a decision, and short-circuits throttled or
//! blocklisted requests with a fixed 429 envelope before they can reach
//! ingestion or ranking. Rejected requests never partially apply a write
//! because the guarded handler is never invoked.

use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::task::{Context, Poll};

use actix_web::body::{BoxBody, EitherBody};
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::USER_AGENT;
use actix_web::http::Method;
use actix_web::{Error, HttpResponse};
use futures_util::future::{ready, LocalBoxFuture, Ready};
use serde_json::json;
use tracing::info;

use crate::domain::admission::{AdmissionController, Decision, RouteGroup};

/// Route-group classification; `None` means the path is not rate limited.
fn classify(method: &Method, path: &str) -> Option<RouteGroup> {
    if path.starts_with("/health") || path.starts_with("/api-docs") {
        return None;
    }
    if *method == Method::POST && path == "/users" {
        return Some(RouteGroup::UserCreation);
    }
    if *method == Method::POST && path.starts_with("/scores/new/") {
        return Some(RouteGroup::ScoreSubmission);
    }
    Some(RouteGroup::General)
}

fn client_ip(req: &ServiceRequest) -> IpAddr {
    req.peer_addr()
        .map_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED), |addr| addr.ip())
}

fn rejection(decision: Decision) -> HttpResponse {
    let message = match decision {
        Decision::Blocked => "Too many requests",
        _ => "Rate limit exceeded",
    };
    HttpResponse::TooManyRequests().json(json!({
        "success": false,
        "error": message,
    }))
}

/// Admission middleware factory.
#[derive(Clone)]
pub struct AdmissionGate {
    controller: Arc<AdmissionController>,
}

impl AdmissionGate {
    /// Build the gate around a shared controller.
    pub fn new(controller: Arc<AdmissionController>) -> Self {
        Self { controller }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AdmissionGate
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B, BoxBody>>;
    type Error = Error;
    type InitError = ();
    type Transform = AdmissionGateMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AdmissionGateMiddleware {
            service,
            controller: self.controller.clone(),
        }))
    }
}

/// Service wrapper produced by [`AdmissionGate`].
pub struct AdmissionGateMiddleware<S> {
    service: S,
    controller: Arc<AdmissionController>,
}

impl<S, B> Service<ServiceRequest> for AdmissionGateMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B, BoxBody>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, ctx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if let Some(group) = classify(req.method(), req.path()) {
            let ip = client_ip(&req);
            let agent = req
                .headers()
                .get(USER_AGENT)
                .and_then(|value| value.to_str().ok());
            // Quotas stack: every governed request drains the general
            // window, and the dedicated routes drain their own window on
            // top, so one client never exceeds the general quota in total.
            let mut verdict = self.controller.check(ip, agent, RouteGroup::General);
            if verdict == Decision::Admitted && group != RouteGroup::General {
                verdict = self.controller.check(ip, agent, group);
            }
            if verdict != Decision::Admitted {
                info!(%ip, ?group, ?verdict, "request rejected by admission");
                let res = req.into_response(rejection(verdict)).map_into_right_body();
                return Box::pin(ready(Ok(res)));
            }
        }

        let fut = self.service.call(req);
        Box::pin(async move { Ok(fut.await?.map_into_left_body()) })
    }
}
