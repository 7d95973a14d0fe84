//! HTTP API layer for the Animals API.
//!
//! Provides the REST endpoints of the `/animals` resource.

pub mod handlers;
mod routes;
mod types;

pub use routes::build_router;
