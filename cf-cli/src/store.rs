//! File-backed session store

use crate::error::StoreError;
use cf_client::SessionStore;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use zeroize::Zeroize;

const SESSION_FILE: &str = "session.json";

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredSession {
    #[serde(default)]
    handle: Option<String>,
    #[serde(default)]
    cookie: Option<String>,
}

impl Drop for StoredSession {
    fn drop(&mut self) {
        if let Some(cookie) = self.cookie.as_mut() {
            cookie.zeroize();
        }
    }
}

/// Persists the login handle and cookie as JSON
///
/// File layout: `{dir}/session.json`. Every write goes to a sibling temp
/// file that is renamed over the target.
pub struct FileSessionStore {
    dir: PathBuf,
}

impl FileSessionStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(SESSION_FILE)
    }

    /// Handle of the stored login
    pub fn handle(&self) -> Result<Option<String>, StoreError> {
        Ok(self.read()?.handle.take())
    }

    /// Record the handle next to the stored cookie
    pub fn set_handle(&self, handle: &str) -> Result<(), StoreError> {
        let mut stored = self.read()?;
        stored.handle = Some(handle.to_string());
        self.write(&stored)
    }

    fn read(&self) -> Result<StoredSession, StoreError> {
        let path = self.path();
        if !path.exists() {
            return Ok(StoredSession::default());
        }
        let mut text = fs::read_to_string(&path)?;
        let stored: Result<StoredSession, _> = serde_json::from_str(&text);
        text.zeroize();
        Ok(stored?)
    }

    fn write(&self, stored: &StoredSession) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir).map_err(|e| {
            StoreError::DirCreation(format!("Failed to create {}: {}", self.dir.display(), e))
        })?;

        let path = self.path();
        let temp = path.with_extension("json.tmp");
        let mut json = serde_json::to_string_pretty(stored)?;
        let written = write_private(&temp, &json);
        json.zeroize();
        written?;

        fs::rename(&temp, &path)?;
        Ok(())
    }
}

#[cfg(unix)]
fn write_private(path: &Path, contents: &str) -> std::io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::OpenOptionsExt;

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    file.write_all(contents.as_bytes())
}

#[cfg(not(unix))]
fn write_private(path: &Path, contents: &str) -> std::io::Result<()> {
    fs::write(path, contents)
}

impl SessionStore for FileSessionStore {
    type Error = StoreError;

    fn get(&self) -> Result<Option<String>, Self::Error> {
        Ok(self.read()?.cookie.take())
    }

    fn set(&self, cookie: &str) -> Result<(), Self::Error> {
        let mut stored = self.read()?;
        stored.cookie = Some(cookie.to_string());
        self.write(&stored)
    }

    /// Forget both the cookie and the handle
    fn clear(&self) -> Result<(), Self::Error> {
        match fs::remove_file(self.path()) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cf_client::{CookieJar, Session};
    use tempfile::TempDir;

    #[test]
    fn test_session_path_format() {
        let temp = TempDir::new().unwrap();
        let store = FileSessionStore::new(temp.path().join("cf-helper"));
        assert!(store.path().ends_with("cf-helper/session.json"));
    }

    #[test]
    fn test_store_roundtrip() {
        let temp = TempDir::new().unwrap();
        let store = FileSessionStore::new(temp.path().join("nested"));

        // Initially empty
        assert!(!store.exists().unwrap());
        assert!(!store.load().unwrap().is_logged_in());

        let mut jar = CookieJar::new();
        jar.insert("JSESSIONID", "abc");
        jar.insert("39ce7", "CFa");
        store.save(&Session::with_cookie(jar)).unwrap();
        store.set_handle("tourist").unwrap();

        let reopened = FileSessionStore::new(temp.path().join("nested"));
        assert_eq!(reopened.get().unwrap().as_deref(), Some("JSESSIONID=abc; 39ce7=CFa"));
        assert_eq!(reopened.handle().unwrap().as_deref(), Some("tourist"));
        assert_eq!(
            reopened.load().unwrap().cookie().and_then(|c| c.get("39ce7")),
            Some("CFa")
        );
        assert!(!temp.path().join("nested/session.json.tmp").exists());
    }

    #[test]
    fn test_replace_is_whole_value() {
        let temp = TempDir::new().unwrap();
        let store = FileSessionStore::new(temp.path().to_path_buf());

        store.set("JSESSIONID=old; extra=1").unwrap();
        store.set("JSESSIONID=new").unwrap();
        assert_eq!(store.get().unwrap().as_deref(), Some("JSESSIONID=new"));
    }

    #[test]
    fn test_clear_forgets_everything() {
        let temp = TempDir::new().unwrap();
        let store = FileSessionStore::new(temp.path().to_path_buf());

        store.set("JSESSIONID=abc").unwrap();
        store.set_handle("tourist").unwrap();
        store.save(&Session::anonymous()).unwrap();

        assert_eq!(store.get().unwrap(), None);
        assert_eq!(store.handle().unwrap(), None);
        // Clearing twice is fine
        store.clear().unwrap();
    }

    #[test]
    fn test_corrupt_file_is_reported() {
        let temp = TempDir::new().unwrap();
        let store = FileSessionStore::new(temp.path().to_path_buf());
        fs::write(store.path(), "{not json").unwrap();
        assert!(matches!(store.get(), Err(StoreError::Json(_))));
    }
}
