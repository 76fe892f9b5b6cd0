//! History reconciler.
//!
//! Keeps `sites` unique by URL and ordered by recency: a visit to a known URL
//! moves its entry to the front, a visit to a new URL inserts one there.

use crate::error::{CoreError, CoreResult};
use crate::profile::{Reconciled, SiteEntry, UserProfile};
use chrono::{DateTime, Utc};

/// Records a visit to `url` at `now`.
///
/// Every entry with a matching URL gets its `last_visit` set, and the last
/// of them moves to the front. A profile that already holds duplicates keeps
/// them until [`crate::integrity::repair`] merges them. `site_name` is only
/// used when the URL has not been seen before.
///
/// # Errors
///
/// Returns [`CoreError::EmptyField`] if `url` is empty.
pub fn record_visit(
    mut profile: UserProfile,
    url: &str,
    site_name: &str,
    now: DateTime<Utc>,
) -> CoreResult<Reconciled> {
    if url.is_empty() {
        return Err(CoreError::empty("site"));
    }

    match profile.site_position(url) {
        Some(index) => {
            for site in profile.sites.iter_mut().filter(|s| s.url == url) {
                site.last_visit = now;
            }
            let entry = profile.sites.remove(index);
            profile.sites.insert(0, entry);
        }
        None => profile.sites.insert(0, SiteEntry::new(url, site_name, now)),
    }

    Ok(Reconciled::changed(profile))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t(minutes: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(minutes)
    }

    fn empty() -> UserProfile {
        UserProfile::new("e@example.com", "ada00000000", "Ada", "#000000")
    }

    fn urls(profile: &UserProfile) -> Vec<&str> {
        profile.sites.iter().map(|s| s.url.as_str()).collect()
    }

    #[test]
    fn first_visit_inserts_at_front() {
        let p = record_visit(empty(), "a.com", "A", t(0)).unwrap().profile;
        assert_eq!(urls(&p), vec!["a.com"]);
        let a = &p.sites[0];
        assert_eq!(a.site_name, "A");
        assert_eq!(a.first_visit, t(0));
        assert_eq!(a.last_visit, t(0));
        assert!(a.tags.is_empty());
    }

    #[test]
    fn revisit_moves_to_front() {
        let p = record_visit(empty(), "a.com", "A", t(0)).unwrap().profile;
        let p = record_visit(p, "b.com", "B", t(1)).unwrap().profile;
        assert_eq!(urls(&p), vec!["b.com", "a.com"]);

        let p = record_visit(p, "a.com", "A", t(2)).unwrap().profile;
        assert_eq!(urls(&p), vec!["a.com", "b.com"]);
        assert_eq!(p.sites[0].first_visit, t(0));
        assert_eq!(p.sites[0].last_visit, t(2));
    }

    #[test]
    fn revisit_keeps_original_name_and_tags() {
        let mut p = record_visit(empty(), "a.com", "A", t(0)).unwrap().profile;
        p.sites[0].tags.push("news".into());
        let p = record_visit(p, "a.com", "Renamed", t(5)).unwrap().profile;
        assert_eq!(p.sites.len(), 1);
        assert_eq!(p.sites[0].site_name, "A");
        assert_eq!(p.sites[0].tags, vec!["news".to_string()]);
    }

    #[test]
    fn preserves_relative_order_of_others() {
        let mut p = empty();
        for (i, url) in ["a", "b", "c", "d"].iter().enumerate() {
            p = record_visit(p, url, url, t(i as i64)).unwrap().profile;
        }
        assert_eq!(urls(&p), vec!["d", "c", "b", "a"]);

        let p = record_visit(p, "b", "b", t(10)).unwrap().profile;
        assert_eq!(urls(&p), vec!["b", "d", "c", "a"]);
    }

    #[test]
    fn duplicate_entries_all_touched_last_moves() {
        let mut p = empty();
        p.sites.push(SiteEntry::new("x", "X", t(0)));
        p.sites.push(SiteEntry::new("a", "first-a", t(0)));
        p.sites.push(SiteEntry::new("a", "last-a", t(0)));

        let p = record_visit(p, "a", "A", t(9)).unwrap().profile;
        assert_eq!(urls(&p), vec!["a", "x", "a"]);
        assert_eq!(p.sites[0].site_name, "last-a");
        assert_eq!(p.sites[0].last_visit, t(9));
        assert_eq!(p.sites[1].last_visit, t(0));
        assert_eq!(p.sites[2].site_name, "first-a");
        assert_eq!(p.sites[2].last_visit, t(9));
    }

    #[test]
    fn empty_url_rejected() {
        let err = record_visit(empty(), "", "A", t(0)).unwrap_err();
        assert_eq!(err, CoreError::empty("site"));
    }
}
