//! Profile integrity checks and repair.
//!
//! The reconcilers preserve the profile invariants by construction, but
//! stored documents may predate them or have been edited by hand. [`check`]
//! lists every violation and [`repair`] rebuilds a consistent profile:
//!
//! - one site entry per URL
//! - one usage counter per tag name
//! - each counter equals the number of sites carrying the tag
//! - no counter is zero

use crate::profile::{SiteEntry, TagUsage, UserProfile};
use std::collections::HashMap;
use std::fmt;

/// A single invariant violation found in a profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// More than one site entry shares a URL.
    DuplicateSite {
        /// The shared URL.
        url: String,
        /// Number of entries carrying it.
        occurrences: usize,
    },
    /// More than one usage counter shares a tag name.
    DuplicateUsage {
        /// The shared name.
        name: String,
        /// Number of counters carrying it.
        occurrences: usize,
    },
    /// A site lists the same tag more than once.
    DuplicateSiteTag {
        /// Site URL.
        url: String,
        /// Repeated tag.
        tag: String,
    },
    /// A counter disagrees with the number of sites carrying the tag.
    CountMismatch {
        /// Tag name.
        name: String,
        /// Stored count.
        recorded: u32,
        /// Number of sites carrying the tag.
        actual: u32,
    },
    /// A counter holds zero.
    ZeroCount {
        /// Tag name.
        name: String,
    },
    /// Sites carry a tag that has no counter.
    MissingUsage {
        /// Tag name.
        name: String,
        /// Number of sites carrying the tag.
        actual: u32,
    },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::DuplicateSite { url, occurrences } => {
                write!(f, "site {url} appears {occurrences} times")
            }
            Violation::DuplicateUsage { name, occurrences } => {
                write!(f, "tag counter {name} appears {occurrences} times")
            }
            Violation::DuplicateSiteTag { url, tag } => {
                write!(f, "site {url} lists tag {tag} more than once")
            }
            Violation::CountMismatch {
                name,
                recorded,
                actual,
            } => write!(f, "tag {name} counts {recorded}, carried by {actual} sites"),
            Violation::ZeroCount { name } => write!(f, "tag {name} has a zero count"),
            Violation::MissingUsage { name, actual } => {
                write!(f, "tag {name} carried by {actual} sites has no counter")
            }
        }
    }
}

/// Result of [`repair`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repaired {
    /// The consistent profile.
    pub profile: UserProfile,
    /// Violations found before repair. Empty if nothing changed.
    pub violations: Vec<Violation>,
}

impl Repaired {
    /// Returns true if the profile was modified.
    pub fn changed(&self) -> bool {
        !self.violations.is_empty()
    }
}

/// Counts entries per key, keeping keys in first-seen order.
fn occurrences<'a>(keys: impl Iterator<Item = &'a str>) -> Vec<(&'a str, usize)> {
    let mut order: Vec<(&str, usize)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for key in keys {
        match index.get(key) {
            Some(&i) => order[i].1 += 1,
            None => {
                index.insert(key, order.len());
                order.push((key, 1));
            }
        }
    }
    order
}

/// Counts, per tag, the sites carrying it. Tags repeated on one site count
/// once. Keys are in first-seen order.
fn carried_counts(sites: &[SiteEntry]) -> Vec<(String, u32)> {
    let mut order: Vec<(String, u32)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for site in sites {
        for (tag, _) in occurrences(site.tags.iter().map(String::as_str)) {
            match index.get(tag) {
                Some(&i) => order[i].1 += 1,
                None => {
                    index.insert(tag.to_string(), order.len());
                    order.push((tag.to_string(), 1));
                }
            }
        }
    }
    order
}

/// Lists every invariant violation in `profile`.
pub fn check(profile: &UserProfile) -> Vec<Violation> {
    let mut violations = Vec::new();

    for (url, n) in occurrences(profile.sites.iter().map(|s| s.url.as_str())) {
        if n > 1 {
            violations.push(Violation::DuplicateSite {
                url: url.to_string(),
                occurrences: n,
            });
        }
    }

    for site in &profile.sites {
        for (tag, n) in occurrences(site.tags.iter().map(String::as_str)) {
            if n > 1 {
                violations.push(Violation::DuplicateSiteTag {
                    url: site.url.clone(),
                    tag: tag.to_string(),
                });
            }
        }
    }

    let carried: HashMap<String, u32> = carried_counts(&profile.sites).into_iter().collect();

    for (name, n) in occurrences(profile.tags.iter().map(|t| t.name.as_str())) {
        if n > 1 {
            violations.push(Violation::DuplicateUsage {
                name: name.to_string(),
                occurrences: n,
            });
        }
    }

    for usage in &profile.tags {
        let actual = carried.get(&usage.name).copied().unwrap_or(0);
        if usage.count == 0 {
            violations.push(Violation::ZeroCount {
                name: usage.name.clone(),
            });
        } else if usage.count != actual {
            violations.push(Violation::CountMismatch {
                name: usage.name.clone(),
                recorded: usage.count,
                actual,
            });
        }
    }

    for (name, actual) in carried_counts(&profile.sites) {
        if profile.tag(&name).is_none() {
            violations.push(Violation::MissingUsage { name, actual });
        }
    }

    violations
}

/// Rebuilds `profile` so that it satisfies every invariant.
///
/// Duplicate site entries merge into the first one: earliest first visit,
/// latest last visit, union of tags. Counters are recomputed from the sites;
/// existing counters keep their position and style, new ones are appended.
pub fn repair(profile: UserProfile) -> Repaired {
    let violations = check(&profile);
    if violations.is_empty() {
        return Repaired {
            profile,
            violations,
        };
    }

    let UserProfile {
        email,
        name,
        display_name,
        avatar,
        reputation,
        archived,
        sites,
        tags,
    } = profile;

    let mut merged: Vec<SiteEntry> = Vec::with_capacity(sites.len());
    let mut index: HashMap<String, usize> = HashMap::new();
    for site in sites {
        match index.get(&site.url) {
            Some(&i) => {
                let target = &mut merged[i];
                target.first_visit = target.first_visit.min(site.first_visit);
                target.last_visit = target.last_visit.max(site.last_visit);
                for tag in site.tags {
                    if !target.has_tag(&tag) {
                        target.tags.push(tag);
                    }
                }
            }
            None => {
                index.insert(site.url.clone(), merged.len());
                merged.push(site);
            }
        }
    }
    for site in &mut merged {
        let mut seen = Vec::with_capacity(site.tags.len());
        site.tags.retain(|tag| {
            if seen.contains(tag) {
                false
            } else {
                seen.push(tag.clone());
                true
            }
        });
    }

    let carried = carried_counts(&merged);
    let counts: HashMap<&str, u32> = carried.iter().map(|(n, c)| (n.as_str(), *c)).collect();

    let mut rebuilt: Vec<TagUsage> = Vec::with_capacity(carried.len());
    for mut usage in tags {
        if rebuilt.iter().any(|u| u.name == usage.name) {
            continue;
        }
        if let Some(&count) = counts.get(usage.name.as_str()) {
            usage.count = count;
            rebuilt.push(usage);
        }
    }
    for (tag, count) in carried {
        if !rebuilt.iter().any(|u| u.name == tag) {
            rebuilt.push(TagUsage::with_count(tag, count));
        }
    }

    Repaired {
        profile: UserProfile {
            email,
            name,
            display_name,
            avatar,
            reputation,
            archived,
            sites: merged,
            tags: rebuilt,
        },
        violations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags::attach_tag;
    use chrono::{Duration, TimeZone, Utc};

    fn site(url: &str, minutes: i64, tags: &[&str]) -> SiteEntry {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap() + Duration::minutes(minutes);
        let mut entry = SiteEntry::new(url, url, at);
        entry.tags = tags.iter().map(|t| t.to_string()).collect();
        entry
    }

    fn profile(sites: Vec<SiteEntry>, tags: Vec<TagUsage>) -> UserProfile {
        let mut p = UserProfile::new("e@example.com", "ada00000000", "Ada", "#000000");
        p.sites = sites;
        p.tags = tags;
        p
    }

    #[test]
    fn reconciled_profile_is_clean() {
        let p = profile(vec![site("a", 0, &[]), site("b", 0, &[])], vec![]);
        let p = attach_tag(p, "a", "news").unwrap().profile;
        let p = attach_tag(p, "b", "news").unwrap().profile;
        let p = attach_tag(p, "b", "rust").unwrap().profile;
        assert!(check(&p).is_empty());

        let repaired = repair(p.clone());
        assert!(!repaired.changed());
        assert_eq!(repaired.profile, p);
    }

    #[test]
    fn detects_each_violation() {
        let p = profile(
            vec![
                site("a", 0, &["x", "x"]),
                site("a", 1, &["y"]),
                site("b", 0, &["z"]),
            ],
            vec![
                TagUsage::with_count("x", 3),
                TagUsage::with_count("y", 1),
                TagUsage::with_count("y", 1),
                TagUsage::with_count("gone", 0),
            ],
        );

        let violations = check(&p);
        assert!(violations.contains(&Violation::DuplicateSite {
            url: "a".into(),
            occurrences: 2
        }));
        assert!(violations.contains(&Violation::DuplicateSiteTag {
            url: "a".into(),
            tag: "x".into()
        }));
        assert!(violations.contains(&Violation::CountMismatch {
            name: "x".into(),
            recorded: 3,
            actual: 1
        }));
        assert!(violations.contains(&Violation::DuplicateUsage {
            name: "y".into(),
            occurrences: 2
        }));
        assert!(violations.contains(&Violation::ZeroCount {
            name: "gone".into()
        }));
        assert!(violations.contains(&Violation::MissingUsage {
            name: "z".into(),
            actual: 1
        }));
    }

    #[test]
    fn repair_merges_duplicate_sites() {
        let p = profile(
            vec![
                site("a", 5, &["x"]),
                site("b", 0, &[]),
                site("a", 1, &["y", "x"]),
            ],
            vec![TagUsage::with_count("x", 2), TagUsage::with_count("y", 1)],
        );
        let mut later = p.clone();
        later.sites[2].last_visit = later.sites[0].last_visit + Duration::minutes(30);
        let expected_last = later.sites[2].last_visit;
        let expected_first = later.sites[2].first_visit;

        let repaired = repair(later);
        assert!(repaired.changed());
        let fixed = repaired.profile;
        assert_eq!(fixed.sites.len(), 2);
        assert_eq!(fixed.sites[0].url, "a");
        assert_eq!(fixed.sites[0].first_visit, expected_first);
        assert_eq!(fixed.sites[0].last_visit, expected_last);
        assert_eq!(fixed.sites[0].tags, vec!["x".to_string(), "y".to_string()]);
        assert_eq!(fixed.tag("x").unwrap().count, 1);
        assert!(check(&fixed).is_empty());
    }

    #[test]
    fn repair_recomputes_counters() {
        let mut styled = TagUsage::with_count("keep", 9);
        styled.svg.fill = "#ff0000".into();
        let p = profile(
            vec![site("a", 0, &["keep", "new"]), site("b", 0, &["keep"])],
            vec![TagUsage::with_count("stale", 4), styled],
        );

        let fixed = repair(p).profile;
        let names: Vec<_> = fixed.tags.iter().map(|t| (t.name.as_str(), t.count)).collect();
        assert_eq!(names, vec![("keep", 2), ("new", 1)]);
        assert_eq!(fixed.tags[0].svg.fill, "#ff0000");
        assert!(check(&fixed).is_empty());
    }

    #[test]
    fn violation_display() {
        let v = Violation::CountMismatch {
            name: "news".into(),
            recorded: 3,
            actual: 1,
        };
        assert_eq!(v.to_string(), "tag news counts 3, carried by 1 sites");
    }
}
