use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::credentials::CredentialSet;
use super::error::StoreError;

const CONFIG_FILE_VERSION: u32 = 1;
const CONFIG_FILE_NAME: &str = "config.toml";

/// Durable configuration entry for one connected Livly account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedConfig {
    pub phone_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
    #[serde(default)]
    pub token_expires_at: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
}

impl PersistedConfig {
    /// Client credentials seeded from this entry.
    pub fn credentials(&self) -> CredentialSet {
        CredentialSet {
            access_token: self.access_token.clone(),
            refresh_token: self.refresh_token.clone(),
            id_token: self.id_token.clone(),
            expires_at: self.token_expires_at,
            user_id: self.user_id,
        }
    }

    /// Writes the fields carried by `update`, leaving every other field untouched.
    pub fn apply(&mut self, update: &CredentialUpdate) {
        for field in update.fields() {
            match field {
                CredentialField::AccessToken(value) => self.access_token = value.clone(),
                CredentialField::RefreshToken(value) => self.refresh_token = value.clone(),
                CredentialField::IdToken(value) => self.id_token = value.clone(),
                CredentialField::ExpiresAt(value) => self.token_expires_at = *value,
            }
        }
    }
}

/// One token-related field of a persisted entry.
#[derive(Debug, Clone, PartialEq)]
pub enum CredentialField {
    AccessToken(Option<String>),
    RefreshToken(Option<String>),
    IdToken(Option<String>),
    ExpiresAt(f64),
}

/// The token fields whose in-memory value differs from the stored one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CredentialUpdate {
    fields: Vec<CredentialField>,
}

impl CredentialUpdate {
    /// Compares the four token fields of `current` against `stored`, field by field.
    pub fn diff(current: &CredentialSet, stored: &PersistedConfig) -> Self {
        let mut fields = Vec::new();
        if current.access_token != stored.access_token {
            fields.push(CredentialField::AccessToken(current.access_token.clone()));
        }
        if current.refresh_token != stored.refresh_token {
            fields.push(CredentialField::RefreshToken(current.refresh_token.clone()));
        }
        if current.id_token != stored.id_token {
            fields.push(CredentialField::IdToken(current.id_token.clone()));
        }
        if current.expires_at != stored.token_expires_at {
            fields.push(CredentialField::ExpiresAt(current.expires_at));
        }
        Self { fields }
    }

    pub fn fields(&self) -> &[CredentialField] {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Storage abstraction for the persisted configuration entry.
pub trait ConfigStore: Send + Sync {
    fn load(&self) -> Result<Option<PersistedConfig>, StoreError>;
    fn save(&self, config: &PersistedConfig) -> Result<(), StoreError>;
    fn clear(&self) -> Result<(), StoreError>;

    /// Field-level merge of `update` into the stored entry.
    fn merge(&self, update: &CredentialUpdate) -> Result<(), StoreError> {
        let mut config = self.load()?.ok_or(StoreError::NotConfigured)?;
        config.apply(update);
        self.save(&config)
    }
}

/// File-backed config store using a single TOML file.
///
/// # Example
/// ```no_run
/// use livly::auth::{ConfigStore, FileConfigStore};
///
/// let store = FileConfigStore::new(std::path::PathBuf::from("/tmp/livly"));
/// let entry = store.load()?;
/// # Ok::<(), livly::auth::StoreError>(())
/// ```
#[derive(Debug, Clone)]
pub struct FileConfigStore {
    base_dir: PathBuf,
}

impl FileConfigStore {
    pub fn new(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn path(&self) -> PathBuf {
        self.base_dir.join(CONFIG_FILE_NAME)
    }

    fn ensure_parent(path: &Path) -> Result<(), StoreError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Result<Option<PersistedConfig>, StoreError> {
        let raw = match fs::read_to_string(self.path()) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let file: ConfigFile = toml::from_str(&raw)?;
        Ok(Some(file.entry))
    }

    fn save(&self, config: &PersistedConfig) -> Result<(), StoreError> {
        let path = self.path();
        Self::ensure_parent(&path)?;
        let file = ConfigFile {
            version: CONFIG_FILE_VERSION,
            saved_at: Utc::now(),
            entry: config.clone(),
        };
        let serialized = toml::to_string(&file)?;
        // Rename over the old file so readers never observe a partial write.
        let staging = path.with_extension("toml.tmp");
        fs::write(&staging, serialized)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&staging, fs::Permissions::from_mode(0o600))?;
        }
        fs::rename(&staging, &path)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        match fs::remove_file(self.path()) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfigFile {
    version: u32,
    saved_at: DateTime<Utc>,
    entry: PersistedConfig,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn temp_store() -> (TempDir, FileConfigStore) {
        let dir = TempDir::new().unwrap();
        let store = FileConfigStore::new(dir.path().to_path_buf());
        (dir, store)
    }

    fn entry() -> PersistedConfig {
        PersistedConfig {
            phone_number: "+15551234567".to_string(),
            access_token: Some("A1".to_string()),
            refresh_token: Some("R1".to_string()),
            id_token: Some("I1".to_string()),
            token_expires_at: 1_700_000_000.0,
            user_id: Some(42),
        }
    }

    #[test]
    fn load_returns_none_when_missing() {
        let (_dir, store) = temp_store();
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn saved_entry_loads_back() {
        let (_dir, store) = temp_store();
        store.save(&entry()).unwrap();
        assert_eq!(store.load().unwrap(), Some(entry()));
    }

    #[cfg(unix)]
    #[test]
    fn saved_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;
        let (_dir, store) = temp_store();
        store.save(&entry()).unwrap();
        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn clear_removes_entry_and_tolerates_missing_file() {
        let (_dir, store) = temp_store();
        store.save(&entry()).unwrap();
        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
        store.clear().unwrap();
    }

    #[test]
    fn diff_reports_only_changed_fields() {
        let stored = entry();
        let mut current = stored.credentials();
        current.access_token = Some("A2".to_string());

        let update = CredentialUpdate::diff(&current, &stored);
        assert_eq!(
            update.fields(),
            &[CredentialField::AccessToken(Some("A2".to_string()))]
        );
    }

    #[test]
    fn diff_of_identical_credentials_is_empty() {
        let stored = entry();
        assert!(CredentialUpdate::diff(&stored.credentials(), &stored).is_empty());
    }

    #[test]
    fn merge_preserves_unrelated_fields() {
        let (_dir, store) = temp_store();
        store.save(&entry()).unwrap();

        let mut current = entry().credentials();
        current.refresh_token = Some("R2".to_string());
        current.expires_at = 1_700_003_600.0;
        store
            .merge(&CredentialUpdate::diff(&current, &entry()))
            .unwrap();

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.phone_number, "+15551234567");
        assert_eq!(loaded.user_id, Some(42));
        assert_eq!(loaded.access_token.as_deref(), Some("A1"));
        assert_eq!(loaded.refresh_token.as_deref(), Some("R2"));
        assert_eq!(loaded.token_expires_at, 1_700_003_600.0);
    }

    #[test]
    fn merge_without_entry_is_not_configured() {
        let (_dir, store) = temp_store();
        let err = store.merge(&CredentialUpdate::default()).unwrap_err();
        assert!(matches!(err, StoreError::NotConfigured));
    }
}
