//! Request and response bodies of the endpoints.

use serde::{Deserialize, Serialize};
use tagtrail_core::{PublicProfile, SiteEntry, TagUsage};

/// Body of a sign-up request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignUpRequest {
    /// Requested display name.
    pub name: String,
}

/// Body of a store-history request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitRequest {
    /// Visited URL.
    pub site: String,
    /// Display label for the site.
    #[serde(default)]
    pub site_name: String,
}

/// Body of a store-tag or remove-tag request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRequest {
    /// URL of the tagged site.
    pub site: String,
    /// Tag label.
    pub tag: String,
}

/// Successful sign-up or sign-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WelcomeResponse {
    /// Greeting.
    pub success: String,
    /// The caller's profile.
    pub user: PublicProfile,
}

/// Sites after a recorded visit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SitesResponse {
    /// Visited sites, most recent first.
    pub sites: Vec<SiteEntry>,
}

/// Sites and tag counters after a tag change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedResponse {
    /// Visited sites, most recent first.
    pub sites: Vec<SiteEntry>,
    /// Tag usage counters.
    pub tags: Vec<TagUsage>,
}

/// Body of every failed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable reason.
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visit_request_fields() {
        let req: VisitRequest =
            serde_json::from_str(r#"{"site":"a.com","siteName":"A"}"#).unwrap();
        assert_eq!(req.site, "a.com");
        assert_eq!(req.site_name, "A");

        let req: VisitRequest = serde_json::from_str(r#"{"site":"a.com"}"#).unwrap();
        assert_eq!(req.site_name, "");
    }

    #[test]
    fn tag_request_requires_both_fields() {
        assert!(serde_json::from_str::<TagRequest>(r#"{"site":"a.com"}"#).is_err());
    }
}
