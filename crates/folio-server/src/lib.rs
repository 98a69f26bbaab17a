//! HTTP server for Folio.
//!
//! Serves a branch's commit history, diffs between commits and rollbacks
//! over JSON. The acting user is taken from the `x-actor-id` header set by
//! an upstream authentication layer. Errors are returned as
//! `{"error": {"kind", "message"}}` with a status derived from the error
//! class.

pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;

pub use config::ServerConfig;
pub use error::{status_for, ApiError, ServerError, ServerResult};
pub use handler::ACTOR_HEADER;
pub use server::FolioServer;
