//! Shared-secret API-key gate.
//!
//! Every API request must present the configured key in the
//! [`API_KEY_HEADER`] header. The key is loaded once at startup into an
//! [`ApiKey`] and handed to the middleware at construction; request
//! handling never reads the process environment. Comparison goes through
//! SHA-256 digests of both sides, so it does not leak key length or a
//! matching prefix through timing.
//!
//! Health probes and the OpenAPI document are exempt.

use std::sync::Arc;
use std::task::{Context, Poll};

use actix_web::body::{BoxBody, EitherBody};
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{Error, HttpResponse};
use futures_util::future::{ready, LocalBoxFuture, Ready};
use serde_json::json;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

/// Request header carrying the shared secret.
pub const API_KEY_HEADER: &str = "Podium-Api-Key";

/// Paths served without authentication.
fn is_exempt(path: &str) -> bool {
    path.starts_with("/health") || path.starts_with("/api-docs")
}

/// The configured shared secret, zeroized on drop.
#[derive(Clone)]
pub struct ApiKey {
    secret: Zeroizing<String>,
}

impl ApiKey {
    /// Wrap a secret loaded from configuration.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: Zeroizing::new(secret.into()),
        }
    }

    fn digest(value: &str) -> [u8; 32] {
        Sha256::digest(value.as_bytes()).into()
    }

    /// Whether the presented key matches, compared digest to digest.
    pub fn matches(&self, presented: &str) -> bool {
        Self::digest(presented) == Self::digest(&self.secret)
    }

    /// Truncated SHA-256 fingerprint for startup logging; never reveals
    /// the key itself.
    pub fn fingerprint(&self) -> String {
        let digest = Self::digest(&self.secret);
        hex::encode(&digest[..8])
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKey")
            .field("fingerprint", &self.fingerprint())
            .finish()
    }
}

fn unauthorized_body() -> HttpResponse {
    HttpResponse::Unauthorized().json(json!({
        "success": false,
        "error": "Unauthorized",
    }))
}

/// API-key middleware factory.
#[derive(Clone)]
pub struct ApiKeyAuth {
    key: Arc<ApiKey>,
}

impl ApiKeyAuth {
    /// Build the gate around the configured key.
    pub fn new(key: Arc<ApiKey>) -> Self {
        Self { key }
    }
}

impl<S, B> Transform<S, ServiceRequest> for ApiKeyAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B, BoxBody>>;
    type Error = Error;
    type InitError = ();
    type Transform = ApiKeyAuthMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(ApiKeyAuthMiddleware {
            service,
            key: self.key.clone(),
        }))
    }
}

/// Service wrapper produced by [`ApiKeyAuth`].
pub struct ApiKeyAuthMiddleware<S> {
    service: S,
    key: Arc<ApiKey>,
}

impl<S, B> Service<ServiceRequest> for ApiKeyAuthMiddleware<S>
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
        let authorized = is_exempt(req.path())
            || req
                .headers()
                .get(API_KEY_HEADER)
                .and_then(|value| value.to_str().ok())
                .is_some_and(|presented| self.key.matches(presented));

        if authorized {
            let fut = self.service.call(req);
            return Box::pin(async move { Ok(fut.await?.map_into_left_body()) });
        }

        let res = req.into_response(unauthorized_body()).map_into_right_body();
        Box::pin(ready(Ok(res)))
    }
}
