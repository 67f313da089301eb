//! Actix middleware: tracing, the API-key gate, and request admission.

pub mod admission;
pub mod auth;
pub mod trace;

pub use admission::AdmissionGate;
pub use auth::{ApiKey, ApiKeyAuth, API_KEY_HEADER};
pub use trace::Trace;
