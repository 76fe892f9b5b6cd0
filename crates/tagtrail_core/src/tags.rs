//! Tag reconciler.
//!
//! Attaching or detaching a tag touches two collections: the site's own tag
//! list and the profile-wide usage counters. After every operation the
//! counter for a tag equals the number of sites carrying it, and counters
//! that reach zero are removed.

use crate::error::{CoreError, CoreResult};
use crate::profile::{Reconciled, TagUsage, UserProfile};

fn validate(url: &str, tag: &str) -> CoreResult<()> {
    if url.is_empty() {
        return Err(CoreError::empty("site"));
    }
    if tag.is_empty() {
        return Err(CoreError::empty("tag"));
    }
    Ok(())
}

/// Attaches `tag` to the site at `url`.
///
/// Unknown sites and tags already on the site leave the profile unchanged.
/// Otherwise the tag goes to the front of the site's list and its usage
/// counter is incremented, or created at the front of `tags`.
///
/// # Errors
///
/// Returns [`CoreError::EmptyField`] if `url` or `tag` is empty.
pub fn attach_tag(mut profile: UserProfile, url: &str, tag: &str) -> CoreResult<Reconciled> {
    validate(url, tag)?;

    let Some(site) = profile.sites.iter_mut().find(|site| site.url == url) else {
        return Ok(Reconciled::unchanged(profile));
    };
    if site.has_tag(tag) {
        return Ok(Reconciled::unchanged(profile));
    }
    site.tags.insert(0, tag.to_string());

    match profile.tags.iter_mut().find(|usage| usage.name == tag) {
        Some(usage) => usage.count += 1,
        None => profile.tags.insert(0, TagUsage::new(tag)),
    }

    Ok(Reconciled::changed(profile))
}

/// Detaches `tag` from the site at `url`.
///
/// The usage counter is only decremented when the tag was actually removed
/// from the site, so redundant calls cannot under-count. A counter that
/// drops to zero is removed.
///
/// # Errors
///
/// Returns [`CoreError::EmptyField`] if `url` or `tag` is empty.
pub fn detach_tag(mut profile: UserProfile, url: &str, tag: &str) -> CoreResult<Reconciled> {
    validate(url, tag)?;

    let removed = profile
        .sites
        .iter_mut()
        .find(|site| site.url == url)
        .is_some_and(|site| site.remove_tag(tag));
    if !removed {
        return Ok(Reconciled::unchanged(profile));
    }

    if let Some(index) = profile.tag_position(tag) {
        let usage = &mut profile.tags[index];
        usage.count = usage.count.saturating_sub(1);
        if usage.count == 0 {
            profile.tags.remove(index);
        }
    }

    Ok(Reconciled::changed(profile))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::record_visit;
    use chrono::Utc;

    fn with_sites(urls: &[&str]) -> UserProfile {
        let mut p = UserProfile::new("e@example.com", "ada00000000", "Ada", "#000000");
        for url in urls.iter().rev() {
            p = record_visit(p, url, url, Utc::now()).unwrap().profile;
        }
        p
    }

    fn counts(p: &UserProfile) -> Vec<(&str, u32)> {
        p.tags.iter().map(|t| (t.name.as_str(), t.count)).collect()
    }

    #[test]
    fn attach_then_detach_scenario() {
        let p = with_sites(&["a.com", "b.com"]);

        let p = attach_tag(p, "a.com", "news").unwrap().profile;
        assert_eq!(p.site("a.com").unwrap().tags, vec!["news".to_string()]);
        assert_eq!(counts(&p), vec![("news", 1)]);

        let p = attach_tag(p, "b.com", "news").unwrap().profile;
        assert_eq!(counts(&p), vec![("news", 2)]);

        let p = detach_tag(p, "a.com", "news").unwrap().profile;
        assert_eq!(counts(&p), vec![("news", 1)]);
        assert!(p.site("a.com").unwrap().tags.is_empty());

        let p = detach_tag(p, "b.com", "news").unwrap().profile;
        assert!(p.tags.is_empty());
    }

    #[test]
    fn attach_is_idempotent() {
        let p = with_sites(&["a.com"]);
        let once = attach_tag(p, "a.com", "rust").unwrap();
        assert!(once.changed);
        let twice = attach_tag(once.profile.clone(), "a.com", "rust").unwrap();
        assert!(!twice.changed);
        assert_eq!(twice.profile, once.profile);
    }

    #[test]
    fn attach_orders_newest_first() {
        let p = with_sites(&["a.com"]);
        let p = attach_tag(p, "a.com", "one").unwrap().profile;
        let p = attach_tag(p, "a.com", "two").unwrap().profile;
        assert_eq!(
            p.site("a.com").unwrap().tags,
            vec!["two".to_string(), "one".to_string()]
        );
        assert_eq!(counts(&p), vec![("two", 1), ("one", 1)]);
    }

    #[test]
    fn attach_to_unknown_site_is_noop() {
        let p = with_sites(&["a.com"]);
        let result = attach_tag(p.clone(), "missing.com", "news").unwrap();
        assert!(!result.changed);
        assert_eq!(result.profile, p);
    }

    #[test]
    fn detach_absent_tag_does_not_decrement() {
        let p = with_sites(&["a.com", "b.com"]);
        let p = attach_tag(p, "a.com", "news").unwrap().profile;

        let result = detach_tag(p, "b.com", "news").unwrap();
        assert!(!result.changed);
        assert_eq!(counts(&result.profile), vec![("news", 1)]);

        let result = detach_tag(result.profile, "missing.com", "news").unwrap();
        assert!(!result.changed);
        assert_eq!(counts(&result.profile), vec![("news", 1)]);
    }

    #[test]
    fn detach_twice_counts_once() {
        let p = with_sites(&["a.com", "b.com"]);
        let p = attach_tag(p, "a.com", "news").unwrap().profile;
        let p = attach_tag(p, "b.com", "news").unwrap().profile;
        let p = detach_tag(p, "a.com", "news").unwrap().profile;
        let p = detach_tag(p, "a.com", "news").unwrap().profile;
        assert_eq!(counts(&p), vec![("news", 1)]);
    }

    #[test]
    fn empty_inputs_rejected() {
        let p = with_sites(&["a.com"]);
        assert_eq!(
            attach_tag(p.clone(), "", "x").unwrap_err(),
            CoreError::empty("site")
        );
        assert_eq!(
            detach_tag(p, "a.com", "").unwrap_err(),
            CoreError::empty("tag")
        );
    }
}
