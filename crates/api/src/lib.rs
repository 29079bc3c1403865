//! qspool HTTP gateway library.
//!
//! Exposes config, state, error handling, the registry and routes so
//! integration tests and the binary entrypoint share the same building blocks.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod registry;
pub mod response;
pub mod router;
pub mod routes;
pub mod state;
