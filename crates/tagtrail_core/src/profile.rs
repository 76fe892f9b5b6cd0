//! The per-user profile aggregate.
//!
//! A [`UserProfile`] is stored as one document per subject identifier. It
//! holds two ordered collections that the reconcilers keep consistent:
//!
//! - `sites`: visited pages, most recently visited first, unique by `url`
//! - `tags`: tag usage counters, unique by `name`, never holding a zero count
//!
//! Field names serialize in camelCase so stored documents and API payloads
//! share one layout.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fill color given to every new tag usage entry.
pub const DEFAULT_TAG_FILL: &str = "#1abc9c";

/// A persisted user profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Email reported by the identity provider at sign-up.
    pub email: String,
    /// Unique handle derived from the display name plus a random suffix.
    pub name: String,
    /// Human-chosen name.
    pub display_name: String,
    /// Color token chosen at creation.
    pub avatar: String,
    /// Reputation counter. No reconciler touches it.
    #[serde(default)]
    pub reputation: i64,
    /// Archive flag. No reconciler touches it.
    #[serde(default)]
    pub archived: bool,
    /// Visited sites, most recent first.
    #[serde(default)]
    pub sites: Vec<SiteEntry>,
    /// Tag usage counters.
    #[serde(default)]
    pub tags: Vec<TagUsage>,
}

impl UserProfile {
    /// Creates an empty profile.
    pub fn new(
        email: impl Into<String>,
        name: impl Into<String>,
        display_name: impl Into<String>,
        avatar: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            name: name.into(),
            display_name: display_name.into(),
            avatar: avatar.into(),
            reputation: 0,
            archived: false,
            sites: Vec::new(),
            tags: Vec::new(),
        }
    }

    /// Returns the site entry for `url`, if any.
    pub fn site(&self, url: &str) -> Option<&SiteEntry> {
        self.sites.iter().find(|site| site.url == url)
    }

    /// Returns the index of the last site entry for `url`.
    pub fn site_position(&self, url: &str) -> Option<usize> {
        self.sites.iter().rposition(|site| site.url == url)
    }

    /// Returns the usage counter for `name`, if any.
    pub fn tag(&self, name: &str) -> Option<&TagUsage> {
        self.tags.iter().find(|tag| tag.name == name)
    }

    /// Returns the index of the first usage counter for `name`.
    pub fn tag_position(&self, name: &str) -> Option<usize> {
        self.tags.iter().position(|tag| tag.name == name)
    }

    /// Returns the view of this profile exposed to its owner.
    ///
    /// Email and the archive flag stay private.
    pub fn public_view(&self) -> PublicProfile {
        PublicProfile {
            name: self.name.clone(),
            display_name: self.display_name.clone(),
            avatar: self.avatar.clone(),
            reputation: self.reputation,
            tags: self.tags.clone(),
            sites: self.sites.clone(),
        }
    }
}

/// One visited site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteEntry {
    /// Site URL, unique within a profile.
    pub url: String,
    /// Display label recorded on the first visit.
    pub site_name: String,
    /// Time of the first visit.
    pub first_visit: DateTime<Utc>,
    /// Time of the latest visit.
    pub last_visit: DateTime<Utc>,
    /// Tags attached to this site, newest first, without duplicates.
    #[serde(default)]
    pub tags: Vec<String>,
}

impl SiteEntry {
    /// Creates an untagged entry for a first visit at `now`.
    pub fn new(url: impl Into<String>, site_name: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            url: url.into(),
            site_name: site_name.into(),
            first_visit: now,
            last_visit: now,
            tags: Vec::new(),
        }
    }

    /// Returns true if `tag` is attached to this site.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Removes `tag` from this site. Returns true if it was present.
    pub fn remove_tag(&mut self, tag: &str) -> bool {
        match self.tags.iter().position(|t| t == tag) {
            Some(index) => {
                self.tags.remove(index);
                true
            }
            None => false,
        }
    }
}

/// Per-profile count of sites carrying a tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagUsage {
    /// Tag label, unique within a profile.
    pub name: String,
    /// Number of sites currently carrying this tag.
    pub count: u32,
    /// Presentation metadata.
    #[serde(default)]
    pub svg: TagStyle,
}

impl TagUsage {
    /// Creates a counter for a tag's first attachment.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_count(name, 1)
    }

    /// Creates a counter with an explicit count.
    pub fn with_count(name: impl Into<String>, count: u32) -> Self {
        Self {
            name: name.into(),
            count,
            svg: TagStyle::default(),
        }
    }
}

/// Presentation style of a tag in the tag cloud.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagStyle {
    /// Fill color.
    pub fill: String,
}

impl Default for TagStyle {
    fn default() -> Self {
        Self {
            fill: DEFAULT_TAG_FILL.to_string(),
        }
    }
}

/// Profile fields returned to the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicProfile {
    /// Unique handle.
    pub name: String,
    /// Human-chosen name.
    pub display_name: String,
    /// Color token.
    pub avatar: String,
    /// Reputation counter.
    pub reputation: i64,
    /// Tag usage counters.
    pub tags: Vec<TagUsage>,
    /// Visited sites, most recent first.
    pub sites: Vec<SiteEntry>,
}

/// Result of applying a reconciler to a profile snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciled {
    /// The resulting snapshot.
    pub profile: UserProfile,
    /// Whether the snapshot differs from the input and must be written back.
    pub changed: bool,
}

impl Reconciled {
    /// Wraps a snapshot that was modified.
    pub fn changed(profile: UserProfile) -> Self {
        Self {
            profile,
            changed: true,
        }
    }

    /// Wraps a snapshot that was left as-is.
    pub fn unchanged(profile: UserProfile) -> Self {
        Self {
            profile,
            changed: false,
        }
    }
}
