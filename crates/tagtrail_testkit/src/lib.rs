//! # tagtrail Testkit
//!
//! Test utilities for tagtrail.
//!
//! This crate provides:
//! - Profile fixtures and an in-process server harness
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust
//! use tagtrail_testkit::prelude::*;
//!
//! let server = TestServer::memory();
//! let token = server.sign_up("uid-1", "Ada");
//! let response = server.call(Endpoint::SignIn, &token, serde_json::json!({}));
//! assert_eq!(response.status, 200);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use tagtrail_server::Endpoint;
}

pub use fixtures::*;
pub use generators::*;
