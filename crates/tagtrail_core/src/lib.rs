//! # tagtrail core
//!
//! Profile model and reconcilers for tagtrail.
//!
//! This crate provides:
//! - The [`UserProfile`] aggregate with its `sites` and `tags` collections
//! - The history reconciler ([`record_visit`])
//! - The tag reconciler ([`attach_tag`], [`detach_tag`])
//! - Account derivation for new profiles ([`provision`])
//! - Integrity checking and repair of stored profiles
//!
//! Every reconciler is a pure function: it takes a profile snapshot and
//! returns a new one, together with a flag telling the caller whether the
//! snapshot needs to be written back. Persistence lives elsewhere.
//!
//! ```rust
//! use chrono::Utc;
//! use tagtrail_core::{attach_tag, record_visit, UserProfile};
//!
//! let profile = UserProfile::new("ada@example.com", "ada0badf00d", "Ada", "#336699");
//! let profile = record_visit(profile, "a.com", "A", Utc::now()).unwrap().profile;
//! let profile = attach_tag(profile, "a.com", "news").unwrap().profile;
//! assert_eq!(profile.tag("news").unwrap().count, 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
// Production code MUST NOT use panic!/unwrap()/expect()
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod account;
mod error;
mod history;
pub mod integrity;
mod profile;
mod tags;

pub use account::{
    derive_username, provision, random_avatar, DisplayName, MAX_DISPLAY_NAME_LEN,
    MIN_DISPLAY_NAME_LEN,
};
pub use error::{CoreError, CoreResult};
pub use history::record_visit;
pub use profile::{
    PublicProfile, Reconciled, SiteEntry, TagStyle, TagUsage, UserProfile, DEFAULT_TAG_FILL,
};
pub use tags::{attach_tag, detach_tag};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
