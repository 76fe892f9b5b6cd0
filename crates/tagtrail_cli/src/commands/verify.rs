//! Verify command implementation.

use super::open_profiles;
use std::path::Path;
use tagtrail_core::integrity;

/// Verification result.
#[derive(Debug, Default)]
pub struct VerifyResult {
    /// Number of profiles checked.
    pub profiles_checked: usize,
    /// Number of consistent profiles.
    pub valid_profiles: usize,
    /// Problems found, one line each.
    pub errors: Vec<String>,
}

impl VerifyResult {
    /// Returns true if no problem was found.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Checks every profile in the store at `path`.
///
/// Undecodable documents are reported as errors rather than aborting the run.
pub fn verify(path: &Path) -> Result<VerifyResult, Box<dyn std::error::Error>> {
    let profiles = open_profiles(path)?;
    let mut result = VerifyResult::default();

    for subject in profiles.subjects()? {
        result.profiles_checked += 1;
        match profiles.load(&subject) {
            Ok(Some(profile)) => {
                let violations = integrity::check(&profile);
                if violations.is_empty() {
                    result.valid_profiles += 1;
                }
                result
                    .errors
                    .extend(violations.iter().map(|v| format!("{subject}: {v}")));
            }
            Ok(None) => {}
            Err(e) => result.errors.push(format!("{subject}: {e}")),
        }
    }

    Ok(result)
}

/// Runs the verify command.
pub fn run(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    println!("Verifying profile store at {:?}", path);
    println!();

    let result = verify(path)?;
    print_result(&result);

    println!();
    if result.is_ok() {
        println!("✓ Profile verification passed");
        Ok(())
    } else {
        println!("✗ Profile verification failed");
        Err("Verification failed".into())
    }
}

fn print_result(result: &VerifyResult) {
    println!(
        "  {} profiles checked: {} consistent, {} problems",
        result.profiles_checked,
        result.valid_profiles,
        result.errors.len()
    );
    for error in &result.errors {
        println!("    ERROR: {}", error);
    }
}
