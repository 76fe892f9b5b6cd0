//! Inspect command implementation.

use super::open_profiles;
use serde::Serialize;
use std::path::Path;
use tagtrail_core::{integrity, UserProfile};

/// Profile inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Subject identifier.
    pub subject: String,
    /// Number of visited sites.
    pub site_count: usize,
    /// Number of distinct tags.
    pub tag_count: usize,
    /// Inconsistencies found in the stored profile.
    pub violations: Vec<String>,
    /// The stored profile.
    pub profile: UserProfile,
}

impl InspectResult {
    fn new(subject: &str, profile: UserProfile) -> Self {
        Self {
            subject: subject.to_string(),
            site_count: profile.sites.len(),
            tag_count: profile.tags.len(),
            violations: integrity::check(&profile)
                .iter()
                .map(ToString::to_string)
                .collect(),
            profile,
        }
    }
}

/// Loads the profile of `subject` from the store at `path`.
pub fn inspect(path: &Path, subject: &str) -> Result<InspectResult, Box<dyn std::error::Error>> {
    let profiles = open_profiles(path)?;
    let profile = profiles
        .load(subject)?
        .ok_or_else(|| format!("No profile for subject {subject:?}"))?;
    Ok(InspectResult::new(subject, profile))
}

/// Runs the inspect command.
pub fn run(path: &Path, subject: &str, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let result = inspect(path, subject)?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&result)?),
        _ => print_text_output(&result),
    }

    Ok(())
}

fn print_text_output(result: &InspectResult) {
    let profile = &result.profile;

    println!("tagtrail Profile Inspection");
    println!("===========================");
    println!();
    println!("Subject:      {}", result.subject);
    println!("Username:     {}", profile.name);
    println!("Display name: {}", profile.display_name);
    println!("Email:        {}", profile.email);
    println!("Avatar:       {}", profile.avatar);
    println!("Reputation:   {}", profile.reputation);
    println!("Archived:     {}", profile.archived);
    println!();

    println!("Sites ({})", result.site_count);
    println!("-----");
    for site in &profile.sites {
        println!(
            "  {} ({}) last visited {}",
            site.url,
            site.site_name,
            site.last_visit.to_rfc3339()
        );
        if !site.tags.is_empty() {
            println!("    tags: {}", site.tags.join(", "));
        }
    }
    println!();

    println!("Tags ({})", result.tag_count);
    println!("----");
    for usage in &profile.tags {
        println!("  {:<20} {:>5}", usage.name, usage.count);
    }

    if !result.violations.is_empty() {
        println!();
        println!("Inconsistencies");
        println!("---------------");
        for violation in &result.violations {
            println!("  {violation}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tagtrail_core::{SiteEntry, TagUsage};
    use tempfile::tempdir;

    fn profile_with_site() -> UserProfile {
        let mut profile = UserProfile::new("ada@example.com", "ada0000", "Ada", "#123456");
        let mut site = SiteEntry::new("a.com", "A", Default::default());
        site.tags.push("news".into());
        profile.sites.push(site);
        profile.tags.push(TagUsage::with_count("news", 2));
        profile
    }

    #[test]
    fn reports_counts_and_violations() {
        let dir = tempdir().unwrap();
        open_profiles(dir.path())
            .unwrap()
            .create("uid-1", &profile_with_site())
            .unwrap();

        let result = inspect(dir.path(), "uid-1").unwrap();
        assert_eq!(result.site_count, 1);
        assert_eq!(result.tag_count, 1);
        assert_eq!(result.violations.len(), 1);
    }

    #[test]
    fn missing_subject() {
        let dir = tempdir().unwrap();
        assert!(inspect(dir.path(), "nobody").is_err());
    }
}
