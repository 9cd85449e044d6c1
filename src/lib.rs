//! School Atlas — a small HTTP API that stores school records and lists
//! them ordered by distance from a caller-supplied location.
//!
//! The core is [`geo::rank`]: haversine distance plus a stable ascending
//! sort. Storage is an injectable seam ([`storage::SchoolStore`]) with a
//! durable SQLite implementation and a volatile in-memory fallback; the
//! HTTP layer is axum.

pub mod geo;
pub mod school;
pub mod server;
pub mod storage;
