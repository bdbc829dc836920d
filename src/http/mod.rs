//! # HTTP Boundary
//!
//! Thin axum surface over the sync context: conditional domain reads with
//! ETag validators, the mutation endpoint (the CRUD collaborator performing
//! the explicit invalidate/broadcast side effects), the push-channel (SSE)
//! admission endpoint, and observability.

pub mod routes;
pub mod server;

pub use routes::api_routes;
pub use server::HttpServer;
