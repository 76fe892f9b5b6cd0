//! CLI command implementations.

pub mod call;
pub mod inspect;
pub mod repair;
pub mod token;
pub mod verify;

use std::path::Path;
use std::sync::Arc;
use tagtrail_server::{ProfileRepository, ServerConfig};
use tagtrail_store::FileStore;

/// Opens the profile store at `path`.
pub fn open_profiles(path: &Path) -> Result<ProfileRepository, Box<dyn std::error::Error>> {
    let store = FileStore::open(path)?;
    Ok(ProfileRepository::new(
        Arc::new(store),
        ServerConfig::default().max_write_retries,
    ))
}
