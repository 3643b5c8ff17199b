//! Dashboard backend client.
//!
//! This module provides the collaborator traits the core services call
//! (`SubmissionApi`, `ReportsApi`, `ProgressSource`) and an HTTP
//! implementation of all three.

mod http;
mod types;

pub use http::HttpBackend;
pub use types::*;
