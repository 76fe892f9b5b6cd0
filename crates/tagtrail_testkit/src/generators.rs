//! Property-based test generators using proptest.
//!
//! URL and tag strategies draw from small alphabets so that generated
//! operation sequences revisit the same sites and tags often.

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use tagtrail_core::{attach_tag, detach_tag, record_visit, CoreResult, Reconciled, UserProfile};

/// Strategy for site URLs from a pool of eight.
pub fn url_strategy() -> impl Strategy<Value = String> {
    (0u8..8).prop_map(|i| format!("site-{i}.example"))
}

/// Strategy for tag labels from a pool of five.
pub fn tag_strategy() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["news", "rust", "later", "work", "fun"]).prop_map(String::from)
}

/// Strategy for display names accepted by sign-up.
pub fn display_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Za-z][A-Za-z0-9 ]{1,14}[A-Za-z0-9]").expect("Invalid regex")
}

/// A single profile mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileOp {
    /// Record a visit.
    Visit {
        /// Site URL.
        url: String,
    },
    /// Attach a tag.
    Attach {
        /// Site URL.
        url: String,
        /// Tag label.
        tag: String,
    },
    /// Detach a tag.
    Detach {
        /// Site URL.
        url: String,
        /// Tag label.
        tag: String,
    },
}

impl ProfileOp {
    /// Applies the operation at time `now`.
    pub fn apply(&self, profile: UserProfile, now: DateTime<Utc>) -> CoreResult<Reconciled> {
        match self {
            ProfileOp::Visit { url } => record_visit(profile, url, &url.to_uppercase(), now),
            ProfileOp::Attach { url, tag } => attach_tag(profile, url, tag),
            ProfileOp::Detach { url, tag } => detach_tag(profile, url, tag),
        }
    }
}

/// Strategy for one profile mutation.
pub fn profile_op_strategy() -> impl Strategy<Value = ProfileOp> {
    prop_oneof![
        url_strategy().prop_map(|url| ProfileOp::Visit { url }),
        (url_strategy(), tag_strategy()).prop_map(|(url, tag)| ProfileOp::Attach { url, tag }),
        (url_strategy(), tag_strategy()).prop_map(|(url, tag)| ProfileOp::Detach { url, tag }),
    ]
}

/// Strategy for sequences of profile mutations.
pub fn profile_ops_strategy(max_len: usize) -> impl Strategy<Value = Vec<ProfileOp>> {
    prop::collection::vec(profile_op_strategy(), 0..max_len)
}

/// Applies `ops` in order to `profile`, one second apart.
///
/// # Panics
///
/// Panics if an operation fails; generated operations are always valid.
pub fn apply_all(mut profile: UserProfile, ops: &[ProfileOp]) -> UserProfile {
    let start = Utc.timestamp_opt(1_700_000_000, 0).single().unwrap_or_default();
    for (i, op) in ops.iter().enumerate() {
        let now = start + Duration::seconds(i as i64);
        profile = op.apply(profile, now).expect("Generated op failed").profile;
    }
    profile
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Creates a configuration for thorough tests.
    #[must_use]
    pub fn thorough() -> Self {
        Self {
            cases: 1024,
            max_shrink_iters: 10000,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tagtrail_core::DisplayName;

    proptest! {
        #![proptest_config(PropTestConfig::quick().to_proptest_config())]

        #[test]
        fn generated_display_names_are_accepted(name in display_name_strategy()) {
            prop_assert!(DisplayName::parse(&name).is_ok());
        }

        #[test]
        fn generated_ops_apply(ops in profile_ops_strategy(32)) {
            let profile = apply_all(crate::fixtures::empty_profile(), &ops);
            prop_assert!(profile.sites.len() <= 8);
        }
    }
}
