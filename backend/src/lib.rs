//! Podium: a leaderboard backend.
//!
//! The domain layer owns ranking, ingestion, and admission semantics and
//! talks to storage only through repository ports; the `inbound` HTTP
//! adapter and the `outbound` in-memory store plug into those ports.
//! Middleware supplies request tracing, API-key authentication, and the
//! admission (rate-limit) gate.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod server;

pub use middleware::Trace;
