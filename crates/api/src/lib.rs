//! Mediagen proxy server library.
//!
//! The HTTP surface the generation pages talk to: uploads, one submit
//! route per feature, and job status. Exposes config, state, error handling
//! and routes so integration tests and the binary entrypoint can both
//! access them.

pub mod config;
pub mod error;
pub mod handlers;
pub mod registry;
pub mod response;
pub mod router;
pub mod routes;
pub mod state;
pub mod tracker;
