//! File-based document store for persistent storage.
//!
//! Layout on disk:
//!
//! ```text
//! <store_path>/
//! ├─ LOCK              # Advisory lock for single-writer
//! └─ docs/
//!    └─ <key>.doc      # One file per document, key is base64url-encoded
//! ```
//!
//! Each document file starts with a 14-byte header (6-byte magic followed by
//! the big-endian revision) and is followed by the opaque body.

use crate::backend::{validate_key, Document, DocumentStore, INITIAL_REVISION};
use crate::error::{StoreError, StoreResult};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use fs2::FileExt;
use parking_lot::Mutex;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

const LOCK_FILE: &str = "LOCK";
const DOCS_DIR: &str = "docs";
const DOC_EXT: &str = "doc";
const TEMP_EXT: &str = "tmp";

const MAGIC: &[u8; 6] = b"TTDOC1";
const HEADER_LEN: usize = MAGIC.len() + 8;

/// A directory-backed document store.
///
/// Data survives process restarts. Every write goes to a temporary file that
/// is synced and then renamed over the document, followed by an fsync of the
/// directory, so a crash leaves either the old or the new revision.
///
/// # Thread Safety
///
/// The store holds an exclusive lock on its directory for its whole
/// lifetime; a second process opening the same directory gets
/// [`StoreError::Locked`]. Within the process, writes are serialized so the
/// revision check and the rename happen atomically.
///
/// # Example
///
/// ```no_run
/// use tagtrail_store::{DocumentStore, FileStore};
/// use std::path::Path;
///
/// let store = FileStore::open(Path::new("profiles")).unwrap();
/// let rev = store.create("user-1", b"{}").unwrap();
/// store.replace("user-1", b"{\"sites\":[]}", rev).unwrap();
/// ```
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
    _lock_file: File,
}

impl FileStore {
    /// Opens or creates a store rooted at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The directory cannot be created
    /// - `path` exists but is not a directory
    /// - Another process holds the lock (returns `Locked`)
    pub fn open(path: &Path) -> StoreResult<Self> {
        fs::create_dir_all(path.join(DOCS_DIR))?;

        if !path.is_dir() {
            return Err(StoreError::Corrupted(format!(
                "path is not a directory: {}",
                path.display()
            )));
        }

        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path.join(LOCK_FILE))?;

        if lock_file.try_lock_exclusive().is_err() {
            return Err(StoreError::Locked);
        }

        Ok(Self {
            path: path.to_path_buf(),
            write_lock: Mutex::new(()),
            _lock_file: lock_file,
        })
    }

    /// Returns the store directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn docs_dir(&self) -> PathBuf {
        self.path.join(DOCS_DIR)
    }

    fn doc_path(&self, key: &str) -> PathBuf {
        self.docs_dir()
            .join(format!("{}.{DOC_EXT}", URL_SAFE_NO_PAD.encode(key)))
    }

    fn read_doc(&self, key: &str) -> StoreResult<Option<Document>> {
        let mut file = match File::open(self.doc_path(key)) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let mut data = Vec::new();
        file.read_to_end(&mut data)?;
        decode(key, data).map(Some)
    }

    fn write_doc(&self, key: &str, revision: u64, body: &[u8]) -> StoreResult<()> {
        let doc_path = self.doc_path(key);
        let temp_path = doc_path.with_extension(TEMP_EXT);

        let mut file = File::create(&temp_path)?;
        file.write_all(MAGIC)?;
        file.write_all(&revision.to_be_bytes())?;
        file.write_all(body)?;
        file.sync_all()?;
        drop(file);

        fs::rename(&temp_path, &doc_path)?;
        self.sync_directory()
    }

    #[cfg(unix)]
    fn sync_directory(&self) -> StoreResult<()> {
        File::open(self.docs_dir())?.sync_all()?;
        Ok(())
    }

    #[cfg(not(unix))]
    fn sync_directory(&self) -> StoreResult<()> {
        // NTFS journals metadata; directory fsync is not available.
        Ok(())
    }
}

fn decode(key: &str, mut data: Vec<u8>) -> StoreResult<Document> {
    if data.len() < HEADER_LEN || &data[..MAGIC.len()] != MAGIC {
        return Err(StoreError::Corrupted(format!(
            "document {key} has an invalid header"
        )));
    }

    let mut revision = [0u8; 8];
    revision.copy_from_slice(&data[MAGIC.len()..HEADER_LEN]);
    let body = data.split_off(HEADER_LEN);

    Ok(Document {
        revision: u64::from_be_bytes(revision),
        body,
    })
}

impl DocumentStore for FileStore {
    fn get(&self, key: &str) -> StoreResult<Option<Document>> {
        validate_key(key)?;
        self.read_doc(key)
    }

    fn create(&self, key: &str, body: &[u8]) -> StoreResult<u64> {
        validate_key(key)?;
        let _guard = self.write_lock.lock();

        if self.doc_path(key).exists() {
            return Err(StoreError::AlreadyExists {
                key: key.to_string(),
            });
        }

        self.write_doc(key, INITIAL_REVISION, body)?;
        Ok(INITIAL_REVISION)
    }

    fn replace(&self, key: &str, body: &[u8], expected_revision: u64) -> StoreResult<u64> {
        validate_key(key)?;
        let _guard = self.write_lock.lock();

        let current = self.read_doc(key)?.ok_or_else(|| StoreError::NotFound {
            key: key.to_string(),
        })?;

        if current.revision != expected_revision {
            return Err(StoreError::RevisionMismatch {
                key: key.to_string(),
                expected: expected_revision,
                actual: current.revision,
            });
        }

        let revision = current.revision + 1;
        self.write_doc(key, revision, body)?;
        Ok(revision)
    }

    fn keys(&self) -> StoreResult<Vec<String>> {
        let mut keys = Vec::new();

        for entry in fs::read_dir(self.docs_dir())? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(DOC_EXT) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let raw = URL_SAFE_NO_PAD
                .decode(stem)
                .map_err(|e| StoreError::Corrupted(format!("bad document name {stem}: {e}")))?;
            let key = String::from_utf8(raw)
                .map_err(|e| StoreError::Corrupted(format!("bad document name {stem}: {e}")))?;
            keys.push(key);
        }

        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn open_creates_layout() {
        let temp = tempdir().unwrap();
        let root = temp.path().join("store");
        let store = FileStore::open(&root).unwrap();
        assert!(root.join(LOCK_FILE).exists());
        assert!(root.join(DOCS_DIR).is_dir());
        assert_eq!(store.path(), root.as_path());
    }

    #[test]
    fn second_open_is_locked() {
        let temp = tempdir().unwrap();
        let _first = FileStore::open(temp.path()).unwrap();
        assert!(matches!(
            FileStore::open(temp.path()),
            Err(StoreError::Locked)
        ));
    }

    #[test]
    fn lock_released_on_drop() {
        let temp = tempdir().unwrap();
        drop(FileStore::open(temp.path()).unwrap());
        assert!(FileStore::open(temp.path()).is_ok());
    }

    #[test]
    fn documents_survive_reopen() {
        let temp = tempdir().unwrap();
        {
            let store = FileStore::open(temp.path()).unwrap();
            let rev = store.create("user/1", b"first").unwrap();
            store.replace("user/1", b"second", rev).unwrap();
        }

        let store = FileStore::open(temp.path()).unwrap();
        let doc = store.get("user/1").unwrap().unwrap();
        assert_eq!(doc.revision, 2);
        assert_eq!(doc.body, b"second");
        assert_eq!(store.keys().unwrap(), vec!["user/1"]);
    }

    #[test]
    fn create_rejects_existing() {
        let temp = tempdir().unwrap();
        let store = FileStore::open(temp.path()).unwrap();
        store.create("a", b"1").unwrap();
        assert!(matches!(
            store.create("a", b"2"),
            Err(StoreError::AlreadyExists { .. })
        ));
    }

    #[test]
    fn replace_checks_revision() {
        let temp = tempdir().unwrap();
        let store = FileStore::open(temp.path()).unwrap();
        let rev = store.create("a", b"1").unwrap();
        store.replace("a", b"2", rev).unwrap();

        let err = store.replace("a", b"3", rev).unwrap_err();
        assert!(err.is_conflict());
        assert!(matches!(
            store.replace("missing", b"x", 1),
            Err(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn corrupted_header_detected() {
        let temp = tempdir().unwrap();
        let store = FileStore::open(temp.path()).unwrap();
        store.create("a", b"body").unwrap();
        fs::write(store.doc_path("a"), b"garbage").unwrap();
        assert!(matches!(store.get("a"), Err(StoreError::Corrupted(_))));
    }

    #[test]
    fn keys_ignore_temp_files() {
        let temp = tempdir().unwrap();
        let store = FileStore::open(temp.path()).unwrap();
        store.create("b", b"").unwrap();
        store.create("a", b"").unwrap();
        fs::write(store.docs_dir().join("stray.tmp"), b"").unwrap();
        assert_eq!(store.keys().unwrap(), vec!["a", "b"]);
    }
}
