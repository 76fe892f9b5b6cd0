//! Account provisioning.
//!
//! Validates display names and derives the generated fields of a new
//! profile: the unique handle and the avatar color.

use crate::error::{CoreError, CoreResult};
use crate::profile::UserProfile;
use rand::Rng;
use std::fmt;

/// Minimum display name length, in characters.
pub const MIN_DISPLAY_NAME_LEN: usize = 3;

/// Maximum display name length, in characters.
pub const MAX_DISPLAY_NAME_LEN: usize = 16;

/// Number of random bytes appended (hex encoded) to a username.
const USERNAME_SUFFIX_BYTES: usize = 4;

/// A validated display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayName(String);

impl DisplayName {
    /// Trims and validates `raw` against the default length bounds.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DisplayNameTooShort`] or
    /// [`CoreError::DisplayNameTooLong`].
    pub fn parse(raw: &str) -> CoreResult<Self> {
        Self::parse_within(raw, MIN_DISPLAY_NAME_LEN, MAX_DISPLAY_NAME_LEN)
    }

    /// Trims and validates `raw` against `min..=max` characters.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DisplayNameTooShort`] or
    /// [`CoreError::DisplayNameTooLong`].
    pub fn parse_within(raw: &str, min: usize, max: usize) -> CoreResult<Self> {
        let trimmed = raw.trim();
        let len = trimmed.chars().count();
        if len > max {
            return Err(CoreError::DisplayNameTooLong { len, max });
        }
        if len < min {
            return Err(CoreError::DisplayNameTooShort { len, min });
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DisplayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Derives a username: the lowercased ASCII alphanumerics of the display
/// name followed by eight random hex characters.
///
/// Collisions are not checked; the 32-bit suffix makes them negligible.
pub fn derive_username<R: Rng + ?Sized>(display_name: &DisplayName, rng: &mut R) -> String {
    let mut username: String = display_name
        .as_str()
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect();

    let mut suffix = [0u8; USERNAME_SUFFIX_BYTES];
    rng.fill(&mut suffix);
    for byte in suffix {
        username.push_str(&format!("{byte:02x}"));
    }
    username
}

/// Picks a uniformly random `#RRGGBB` color.
pub fn random_avatar<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!("#{:06x}", rng.gen_range(0..=0x00ff_ffffu32))
}

/// Builds the initial profile for a new account.
pub fn provision<R: Rng + ?Sized>(
    email: &str,
    display_name: &DisplayName,
    rng: &mut R,
) -> UserProfile {
    let name = derive_username(display_name, rng);
    let avatar = random_avatar(rng);
    UserProfile::new(email, name, display_name.as_str(), avatar)
}
