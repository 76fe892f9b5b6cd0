//! # tagtrail server
//!
//! Account and bookmark endpoints for tagtrail.
//!
//! This crate provides:
//! - Identity verification through a pluggable provider
//!   (HMAC-SHA256 tokens out of the box)
//! - Profile persistence with conditional writes
//! - Handlers for sign-up, sign-in, store-history, store-tag and remove-tag
//! - Transport-neutral routing with JSON bodies
//!
//! # Endpoints
//!
//! Every endpoint takes the identity token as the `token` query parameter
//! and accepts only POST.
//!
//! | Path | Body | Success |
//! |---|---|---|
//! | `/signUp` | `name` | `{success, user}` |
//! | `/signIn` | (none) | `{success, user}` |
//! | `/storeHistory` | `site`, `siteName` | `{sites}` |
//! | `/storeTag` | `site`, `tag` | `{sites, tags}` |
//! | `/removeTag` | `site`, `tag` | `{sites, tags}` |
//!
//! Failures carry `{error}`.
//!
//! # Concurrency
//!
//! Requests are independent. Two requests mutating the same profile race on
//! the document revision; the loser re-reads and re-applies its change, so no
//! update is lost.

#![deny(unsafe_code)]
#![warn(missing_docs)]
// Production code MUST NOT use panic!/unwrap()/expect()
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod auth;
mod config;
mod error;
mod handler;
mod messages;
mod repository;
mod server;

pub use auth::{AuthConfig, Identity, IdentityProvider, TokenIdentityProvider};
pub use config::ServerConfig;
pub use error::{
    ServerError, ServerResult, MSG_NOT_ALLOWED, MSG_NOT_FOUND, MSG_TAKEN, MSG_TOO_LONG,
    MSG_TOO_SHORT,
};
pub use handler::{HandlerContext, RequestHandler};
pub use messages::{
    ErrorResponse, SignUpRequest, SitesResponse, TagRequest, TaggedResponse, VisitRequest,
    WelcomeResponse,
};
pub use repository::ProfileRepository;
pub use server::{ApiRequest, ApiResponse, ApiServer, Endpoint};
