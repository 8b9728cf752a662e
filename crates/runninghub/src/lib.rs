//! RunningHub REST client library.
//!
//! Provides the typed wire format, an HTTP implementation of the vendor's
//! upload / run / status / outputs calls, and [`AsyncJobClient`], which
//! drives one generation job from submission to a resolved artifact or a
//! classified failure.

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod wire;

pub use api::{RunningHubApi, StatusReport, VendorApi};
pub use client::AsyncJobClient;
pub use config::RunningHubConfig;
pub use error::RunningHubError;
