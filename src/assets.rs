//! Disk-backed store for uploaded avatar files
//!
//! Files land in a single directory under generated names of the form
//! `<unix-millis>-<counter><.ext>` and are handed out as URLs below
//! [`UPLOADS_ROUTE`], where the HTTP layer serves them back.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use tracing::debug;

/// Path under which stored files are served.
pub const UPLOADS_ROUTE: &str = "/uploads";

const MAX_NAME_ATTEMPTS: usize = 16;
const MAX_EXTENSION_LEN: usize = 8;

#[derive(Error, Debug)]
pub enum AssetError {
    #[error("asset I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("not an uploads reference: {0}")]
    InvalidReference(String),
    #[error("could not allocate a fresh asset name")]
    NameExhausted,
}

/// An uploaded file as received from a client.
#[derive(Debug, Clone)]
pub struct AvatarUpload {
    pub file_name: Option<String>,
    pub bytes: Vec<u8>,
}

pub struct AssetStore {
    root: PathBuf,
    base_url: String,
    counter: AtomicU64,
}

impl AssetStore {
    pub fn open<P: Into<PathBuf>>(root: P, public_base_url: &str) -> Result<Self, AssetError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            base_url: public_base_url.trim_end_matches('/').to_string(),
            counter: AtomicU64::new(0),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Persist an upload under a new name and return its reference.
    ///
    /// Existing files are never overwritten: names are opened with
    /// `create_new`, and a clash moves on to the next counter value.
    pub fn store(&self, upload: &AvatarUpload) -> Result<String, AssetError> {
        let ext = extension_of(upload.file_name.as_deref());
        let millis = chrono::Utc::now().timestamp_millis();

        for _ in 0..MAX_NAME_ATTEMPTS {
            let seq = self.counter.fetch_add(1, Ordering::Relaxed);
            let name = format!("{}-{}{}", millis, seq, ext);
            let path = self.root.join(&name);

            let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => file,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            };

            if let Err(e) = file.write_all(&upload.bytes).and_then(|_| file.sync_all()) {
                let _ = fs::remove_file(&path);
                return Err(e.into());
            }

            debug!("stored asset {} ({} bytes)", name, upload.bytes.len());
            return Ok(self.reference_for(&name));
        }

        Err(AssetError::NameExhausted)
    }

    /// Read back the bytes behind a reference.
    pub fn resolve(&self, reference: &str) -> Result<Vec<u8>, AssetError> {
        let name = self.name_of(reference)?;
        Ok(fs::read(self.root.join(name))?)
    }

    pub fn remove(&self, reference: &str) -> Result<(), AssetError> {
        let name = self.name_of(reference)?;
        fs::remove_file(self.root.join(name))?;
        debug!("removed asset {}", name);
        Ok(())
    }

    fn reference_for(&self, name: &str) -> String {
        format!("{}{}/{}", self.base_url, UPLOADS_ROUTE, name)
    }

    /// File name of a `.../uploads/<name>` reference. The host part is not
    /// checked, so references issued under an earlier base URL still resolve.
    fn name_of<'a>(&self, reference: &'a str) -> Result<&'a str, AssetError> {
        let invalid = || AssetError::InvalidReference(reference.to_string());
        let name = reference
            .rsplit_once('/')
            .filter(|(parent, _)| parent.ends_with(UPLOADS_ROUTE))
            .map(|(_, name)| name)
            .ok_or_else(invalid)?;

        let well_formed = !name.is_empty()
            && !name.starts_with('.')
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.');
        if well_formed {
            Ok(name)
        } else {
            Err(invalid())
        }
    }
}

/// `.ext` of the client's file name, or nothing if it is absent or odd.
fn extension_of(file_name: Option<&str>) -> String {
    file_name
        .and_then(|n| Path::new(n).extension())
        .and_then(|e| e.to_str())
        .filter(|e| {
            !e.is_empty() && e.len() <= MAX_EXTENSION_LEN && e.chars().all(|c| c.is_ascii_alphanumeric())
        })
        .map(|e| format!(".{}", e.to_ascii_lowercase()))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    fn upload(name: &str, bytes: &[u8]) -> AvatarUpload {
        AvatarUpload {
            file_name: Some(name.to_string()),
            bytes: bytes.to_vec(),
        }
    }

    #[test]
    fn test_store_and_resolve() {
        let dir = tempfile::tempdir().unwrap();
        let store = AssetStore::open(dir.path(), "http://localhost:3000/").unwrap();

        let reference = store.store(&upload("me.PNG", b"\x89PNG data")).unwrap();
        assert!(reference.starts_with("http://localhost:3000/uploads/"));
        assert!(reference.ends_with(".png"));
        assert_eq!(store.resolve(&reference).unwrap(), b"\x89PNG data");
    }

    #[test]
    fn test_names_never_collide() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(AssetStore::open(dir.path(), "http://h").unwrap());

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    (0..10)
                        .map(|j| store.store(&upload("a.jpg", &[i, j])).unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut seen = HashSet::new();
        for h in handles {
            for r in h.join().unwrap() {
                assert!(seen.insert(r));
            }
        }
        assert_eq!(seen.len(), 80);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 80);
    }

    #[test]
    fn test_existing_file_is_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let store = AssetStore::open(dir.path(), "http://h").unwrap();
        let millis = chrono::Utc::now().timestamp_millis();
        // squat the next few names
        for seq in 0..3 {
            fs::write(dir.path().join(format!("{}-{}", millis, seq)), b"keep").unwrap();
            fs::write(dir.path().join(format!("{}-{}", millis + 1, seq)), b"keep").unwrap();
        }

        let reference = store
            .store(&AvatarUpload { file_name: None, bytes: b"new".to_vec() })
            .unwrap();
        assert_eq!(store.resolve(&reference).unwrap(), b"new");
        for seq in 0..3 {
            assert_eq!(fs::read(dir.path().join(format!("{}-{}", millis, seq))).unwrap(), b"keep");
        }
    }

    #[test]
    fn test_foreign_references_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = AssetStore::open(dir.path(), "http://h").unwrap();

        for bad in [
            "http://h/avatars/x.png",
            "x.png",
            "http://h/uploads/",
            "http://h/uploads/../secret",
            "http://h/uploads/a/b.png",
        ] {
            assert!(matches!(store.resolve(bad), Err(AssetError::InvalidReference(_))), "{}", bad);
        }
    }

    #[test]
    fn test_references_survive_base_url_change() {
        let dir = tempfile::tempdir().unwrap();
        let reference = AssetStore::open(dir.path(), "http://old:3000")
            .unwrap()
            .store(&upload("me.png", b"png"))
            .unwrap();

        let store = AssetStore::open(dir.path(), "https://new.example").unwrap();
        assert_eq!(store.resolve(&reference).unwrap(), b"png");
        store.remove(&reference).unwrap();
        assert!(matches!(store.resolve(&reference), Err(AssetError::Io(_))));
    }

    #[test]
    fn test_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = AssetStore::open(dir.path(), "http://h").unwrap();
        let reference = store.store(&upload("x.gif", b"gif")).unwrap();

        store.remove(&reference).unwrap();
        assert!(matches!(store.resolve(&reference), Err(AssetError::Io(_))));
    }

    #[test]
    fn test_extension_sanitizing() {
        assert_eq!(extension_of(Some("photo.JPEG")), ".jpeg");
        assert_eq!(extension_of(Some("noext")), "");
        assert_eq!(extension_of(Some("evil.p/hp")), "");
        assert_eq!(extension_of(Some("x.waytoolongext")), "");
        assert_eq!(extension_of(None), "");
    }
}
