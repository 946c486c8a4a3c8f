//! Persistence for the OAuth credential and saved places.
//!
//! Both live as pretty-printed JSON in the data directory.

use std::collections::BTreeMap;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result, bail};
use async_trait::async_trait;
use lyft_client::Location;
use lyft_oauth::Credential;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// Credential file name within the data directory.
pub const CREDENTIAL_FILE: &str = "credential.json";

/// Saved places file name within the data directory.
pub const PLACES_FILE: &str = "places.json";

/// A credential together with the app it was issued to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredCredential {
    pub client_id: String,
    pub credential: Credential,
}

impl StoredCredential {
    /// Whether the credential was issued to `client_id`.
    pub fn matches(&self, client_id: &str) -> bool {
        self.client_id == client_id
    }
}

// ============================================================================
// Traits
// ============================================================================

/// Storage for the user's credential.
#[async_trait]
pub trait CredentialStore: Send + Sync + std::fmt::Debug {
    async fn load_credential(&self) -> Result<Option<StoredCredential>>;

    async fn save_credential(&self, credential: &StoredCredential) -> Result<()>;

    /// Remove the stored credential. Returns whether one existed.
    async fn delete_credential(&self) -> Result<bool>;
}

/// Storage for named ride locations.
#[async_trait]
pub trait PlaceStore: Send + Sync + std::fmt::Debug {
    /// All saved places, ordered by name.
    async fn places(&self) -> Result<BTreeMap<String, Location>>;

    async fn load_place(&self, name: &str) -> Result<Option<Location>>;

    /// Save a new place. Fails if the name is taken.
    async fn save_place(&self, name: &str, location: &Location) -> Result<()>;

    /// Remove places by name. Fails without changes if any is unknown.
    async fn remove_place(&self, names: &[String]) -> Result<()>;
}

// ============================================================================
// FileStore
// ============================================================================

/// JSON files in a directory.
#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
    cached_credential: RwLock<Option<StoredCredential>>,
}

impl FileStore {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
            cached_credential: RwLock::new(None),
        }
    }

    pub fn credential_path(&self) -> PathBuf {
        self.dir.join(CREDENTIAL_FILE)
    }

    pub fn places_path(&self) -> PathBuf {
        self.dir.join(PLACES_FILE)
    }

    fn write(&self, path: &Path, contents: &str) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create {}", self.dir.display()))?;
        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write {}", path.display()))
    }

    /// Like `write`, but the file is owner-only (0600 on unix) before any
    /// bytes reach it.
    fn write_private(&self, path: &Path, contents: &str) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create {}", self.dir.display()))?;

        let mut options = std::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options
            .open(path)
            .with_context(|| format!("Failed to open {}", path.display()))?;

        // `mode` only applies on creation; tighten a file left by an older run.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(0o600))
                .with_context(|| format!("Failed to restrict {}", path.display()))?;
        }

        file.write_all(contents.as_bytes())
            .with_context(|| format!("Failed to write {}", path.display()))
    }

    fn read_places(&self) -> Result<BTreeMap<String, Location>> {
        let path = self.places_path();
        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(e).with_context(|| format!("Failed to read {}", path.display())),
        };
        let places: Option<BTreeMap<String, Location>> = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(places.unwrap_or_default())
    }

    fn write_places(&self, places: &BTreeMap<String, Location>) -> Result<()> {
        let json = serde_json::to_string_pretty(places)?;
        self.write(&self.places_path(), &json)
    }
}

#[async_trait]
impl CredentialStore for FileStore {
    async fn load_credential(&self) -> Result<Option<StoredCredential>> {
        {
            let cache = self.cached_credential.read().await;
            if cache.is_some() {
                return Ok(cache.clone());
            }
        }

        let path = self.credential_path();
        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e).with_context(|| format!("Failed to read {}", path.display())),
        };
        let stored: StoredCredential = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        *self.cached_credential.write().await = Some(stored.clone());
        Ok(Some(stored))
    }

    async fn save_credential(&self, credential: &StoredCredential) -> Result<()> {
        let path = self.credential_path();
        let json = serde_json::to_string_pretty(credential)?;
        self.write_private(&path, &json)?;

        *self.cached_credential.write().await = Some(credential.clone());
        tracing::debug!(path = %path.display(), "credential saved");
        Ok(())
    }

    async fn delete_credential(&self) -> Result<bool> {
        *self.cached_credential.write().await = None;

        let path = self.credential_path();
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e).with_context(|| format!("Failed to delete {}", path.display())),
        }
    }
}

#[async_trait]
impl PlaceStore for FileStore {
    async fn places(&self) -> Result<BTreeMap<String, Location>> {
        self.read_places()
    }

    async fn load_place(&self, name: &str) -> Result<Option<Location>> {
        Ok(self.read_places()?.remove(name))
    }

    async fn save_place(&self, name: &str, location: &Location) -> Result<()> {
        let mut places = self.read_places()?;
        if places.contains_key(name) {
            bail!("place {name:?} already exists; remove before re-adding");
        }
        places.insert(name.to_string(), location.clone());
        self.write_places(&places)
    }

    async fn remove_place(&self, names: &[String]) -> Result<()> {
        let mut places = self.read_places()?;
        for name in names {
            if places.remove(name).is_none() {
                bail!("place {name:?} not found; not making any changes");
            }
        }
        self.write_places(&places)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::time::Duration;

    fn stored(client_id: &str) -> StoredCredential {
        StoredCredential {
            client_id: client_id.to_string(),
            credential: Credential {
                access_token: "access".to_string(),
                refresh_token: Some("refresh".to_string()),
                token_type: "Bearer".to_string(),
                expires_in: Duration::from_secs(3600),
                scopes: vec!["public".to_string()],
                issued_at: Utc::now(),
            },
        }
    }

    #[tokio::test]
    async fn test_credential_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        assert!(store.load_credential().await.unwrap().is_none());

        let credential = stored("app");
        store.save_credential(&credential).await.unwrap();
        assert!(store.credential_path().exists());

        let fresh = FileStore::new(dir.path());
        let loaded = fresh.load_credential().await.unwrap().unwrap();
        assert_eq!(loaded.client_id, "app");
        assert_eq!(loaded.credential.access_token, "access");
        assert!(loaded.matches("app"));
        assert!(!loaded.matches("other"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_credential_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        store.save_credential(&stored("app")).await.unwrap();
        let mode = std::fs::metadata(store.credential_path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);

        // A readable file from elsewhere is tightened before it is rewritten.
        std::fs::set_permissions(
            store.credential_path(),
            std::fs::Permissions::from_mode(0o644),
        )
        .unwrap();
        store.save_credential(&stored("other")).await.unwrap();
        let mode = std::fs::metadata(store.credential_path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(
            FileStore::new(dir.path())
                .load_credential()
                .await
                .unwrap()
                .unwrap()
                .client_id,
            "other"
        );
    }

    #[tokio::test]
    async fn test_delete_credential() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        assert!(!store.delete_credential().await.unwrap());

        store.save_credential(&stored("app")).await.unwrap();
        assert!(store.delete_credential().await.unwrap());
        assert!(store.load_credential().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_places() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("nested").as_path());
        assert!(store.places().await.unwrap().is_empty());

        let home = Location::new(37.7763, -122.3918).with_address("185 Berry St");
        store.save_place("home", &home).await.unwrap();
        store
            .save_place("work", &Location::new(37.7972, -122.4533))
            .await
            .unwrap();

        assert_eq!(store.load_place("home").await.unwrap(), Some(home.clone()));
        assert_eq!(store.load_place("gym").await.unwrap(), None);
        let names: Vec<_> = store.places().await.unwrap().into_keys().collect();
        assert_eq!(names, vec!["home", "work"]);

        let err = store.save_place("home", &home).await.unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }

    #[tokio::test]
    async fn test_remove_is_all_or_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        store.save_place("a", &Location::new(1.0, 2.0)).await.unwrap();
        store.save_place("b", &Location::new(3.0, 4.0)).await.unwrap();

        let err = store
            .remove_place(&["a".to_string(), "missing".to_string()])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not found"));
        assert_eq!(store.places().await.unwrap().len(), 2);

        store.remove_place(&["a".to_string()]).await.unwrap();
        assert_eq!(store.places().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_null_places_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(PLACES_FILE), "null").unwrap();
        let store = FileStore::new(dir.path());
        assert!(store.places().await.unwrap().is_empty());
    }
}
