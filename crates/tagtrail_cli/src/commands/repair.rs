//! Repair command implementation.

use super::open_profiles;
use std::path::Path;
use tagtrail_core::integrity::{self, Violation};
use tagtrail_core::Reconciled;
use tracing::{info, warn};

/// Repair statistics.
#[derive(Debug, Default)]
pub struct RepairStats {
    /// Number of profiles examined.
    pub profiles_checked: usize,
    /// Number of profiles rebuilt (or that would be, on a dry run).
    pub profiles_repaired: usize,
    /// Violations found, per subject.
    pub findings: Vec<(String, Vec<Violation>)>,
    /// Profiles that could not be loaded or written, one line each.
    pub errors: Vec<String>,
}

/// Repairs every inconsistent profile in the store at `path`.
///
/// Writes go through the same conditional update as the endpoints, so a
/// repair never overwrites a concurrent change. Profiles that fail to load
/// or write are reported in [`RepairStats::errors`] and the run continues.
pub fn repair(path: &Path, dry_run: bool) -> Result<RepairStats, Box<dyn std::error::Error>> {
    let profiles = open_profiles(path)?;
    let mut stats = RepairStats::default();

    for subject in profiles.subjects()? {
        stats.profiles_checked += 1;

        let outcome = if dry_run {
            profiles
                .load(&subject)
                .map(|profile| profile.map(|p| integrity::check(&p)).unwrap_or_default())
        } else {
            let mut found = Vec::new();
            let written = profiles.update(&subject, |profile| {
                let repaired = integrity::repair(profile);
                let changed = repaired.changed();
                found = repaired.violations;
                Ok(Reconciled {
                    profile: repaired.profile,
                    changed,
                })
            });
            written.map(|_| found)
        };

        let violations = match outcome {
            Ok(violations) => violations,
            Err(e) => {
                warn!(subject = %subject, error = %e, "profile skipped");
                stats.errors.push(format!("{subject}: {e}"));
                continue;
            }
        };

        if !violations.is_empty() {
            if !dry_run {
                info!(subject = %subject, fixed = violations.len(), "profile repaired");
            }
            stats.profiles_repaired += 1;
            stats.findings.push((subject, violations));
        }
    }

    Ok(stats)
}

/// Runs the repair command.
pub fn run(path: &Path, dry_run: bool) -> Result<(), Box<dyn std::error::Error>> {
    if dry_run {
        println!("Dry run - no changes will be made");
        println!();
    }

    let stats = repair(path, dry_run)?;

    for (subject, violations) in &stats.findings {
        println!("{subject}:");
        for violation in violations {
            println!("  {violation}");
        }
    }
    if !stats.findings.is_empty() {
        println!();
    }

    for error in &stats.errors {
        println!("ERROR: {error}");
    }

    let verb = if dry_run { "would be repaired" } else { "repaired" };
    println!(
        "{} profiles checked, {} {}, {} failed",
        stats.profiles_checked,
        stats.profiles_repaired,
        verb,
        stats.errors.len()
    );

    if stats.errors.is_empty() {
        Ok(())
    } else {
        Err("Repair incomplete".into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tagtrail_core::{SiteEntry, TagUsage, UserProfile};
    use tagtrail_store::{DocumentStore, FileStore};
    use tempfile::tempdir;

    fn broken_profile() -> UserProfile {
        let mut profile = UserProfile::new("ada@example.com", "ada0000", "Ada", "#123456");
        let mut site = SiteEntry::new("a.com", "A", Default::default());
        site.tags.push("news".into());
        profile.sites.push(site.clone());
        profile.sites.push(site);
        profile.tags.push(TagUsage::with_count("news", 5));
        profile
    }

    #[test]
    fn dry_run_leaves_store_untouched() {
        let dir = tempdir().unwrap();
        open_profiles(dir.path())
            .unwrap()
            .create("uid-1", &broken_profile())
            .unwrap();

        let stats = repair(dir.path(), true).unwrap();
        assert_eq!(stats.profiles_repaired, 1);

        let stored = open_profiles(dir.path()).unwrap().load("uid-1").unwrap();
        assert_eq!(stored, Some(broken_profile()));
    }

    #[test]
    fn repair_rewrites_profile() {
        let dir = tempdir().unwrap();
        open_profiles(dir.path())
            .unwrap()
            .create("uid-1", &broken_profile())
            .unwrap();

        let stats = repair(dir.path(), false).unwrap();
        assert_eq!(stats.profiles_checked, 1);
        assert_eq!(stats.profiles_repaired, 1);

        let stored = open_profiles(dir.path())
            .unwrap()
            .load("uid-1")
            .unwrap()
            .unwrap();
        assert_eq!(stored.sites.len(), 1);
        assert_eq!(stored.tags[0].count, 1);
        assert!(integrity::check(&stored).is_empty());

        let again = repair(dir.path(), false).unwrap();
        assert_eq!(again.profiles_repaired, 0);
    }

    #[test]
    fn undecodable_profile_does_not_stop_repair() {
        let dir = tempdir().unwrap();
        FileStore::open(dir.path())
            .unwrap()
            .create("garbled", b"not json")
            .unwrap();
        open_profiles(dir.path())
            .unwrap()
            .create("uid-1", &broken_profile())
            .unwrap();

        for dry_run in [true, false] {
            let stats = repair(dir.path(), dry_run).unwrap();
            assert_eq!(stats.profiles_checked, 2);
            assert_eq!(stats.errors.len(), 1);
            assert!(stats.errors[0].starts_with("garbled:"));
        }

        let stored = open_profiles(dir.path())
            .unwrap()
            .load("uid-1")
            .unwrap()
            .unwrap();
        assert!(integrity::check(&stored).is_empty());
    }
}
