use std::collections::BTreeMap;

use async_trait::async_trait;
use keyring::Entry;
use tracing::warn;

use super::{KeyValueStore, StorageError};

const SERVICE_NAME: &str = "profilematch";

/// Key-value store backed by the OS keychain.
///
/// All keys live in one keychain entry as a JSON object, so batch writes
/// replace a single secret.
pub struct KeyringStore {
    account: String,
}

impl KeyringStore {
    pub fn new(account: impl Into<String>) -> Self {
        Self {
            account: account.into(),
        }
    }

    fn entry(&self) -> Result<Entry, keyring::Error> {
        Entry::new(SERVICE_NAME, &self.account)
    }

    fn fetch_secret(&self) -> Result<String, keyring::Error> {
        self.entry()?.get_password()
    }

    fn read_map(&self) -> Result<BTreeMap<String, String>, StorageError> {
        decode_for_read(self.fetch_secret())
    }

    fn write_map(&self, map: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let entry = self
            .entry()
            .map_err(|e| StorageError::Write(format!("Failed to create keyring entry: {}", e)))?;

        if map.is_empty() {
            return match entry.delete_credential() {
                Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
                Err(e) => Err(StorageError::Write(format!(
                    "Failed to delete credential from keychain: {}",
                    e
                ))),
            };
        }

        let secret = serde_json::to_string(map).map_err(|e| StorageError::Write(e.to_string()))?;
        entry
            .set_password(&secret)
            .map_err(|e| StorageError::Write(format!("Failed to store secret in keychain: {}", e)))
    }
}

fn decode_for_read(secret: Result<String, keyring::Error>) -> Result<BTreeMap<String, String>, StorageError> {
    match secret {
        Ok(secret) => serde_json::from_str(&secret)
            .map_err(|e| StorageError::Read(format!("Malformed keychain entry: {}", e))),
        Err(keyring::Error::NoEntry) => Ok(BTreeMap::new()),
        Err(e) => Err(StorageError::Read(format!(
            "Failed to retrieve secret from keychain: {}",
            e
        ))),
    }
}

/// Existing entries to merge a write into.
///
/// A malformed entry is overwritten. Any other read failure aborts the
/// write, since starting from an empty map would drop the stored keys.
fn decode_for_update(secret: Result<String, keyring::Error>) -> Result<BTreeMap<String, String>, StorageError> {
    match secret {
        Ok(secret) => Ok(serde_json::from_str(&secret).unwrap_or_else(|e| {
            warn!(error = %e, "Replacing malformed keychain entry");
            BTreeMap::new()
        })),
        Err(keyring::Error::NoEntry) => Ok(BTreeMap::new()),
        Err(e) => Err(StorageError::Write(format!(
            "Failed to read existing keychain entry before writing: {}",
            e
        ))),
    }
}

#[async_trait]
impl KeyValueStore for KeyringStore {
    async fn get_many(&self, keys: &[&str]) -> Result<Vec<Option<String>>, StorageError> {
        let map = self.read_map()?;
        Ok(keys.iter().map(|k| map.get(*k).cloned()).collect())
    }

    async fn set_many(&self, entries: &[(&str, &str)]) -> Result<(), StorageError> {
        let mut map = decode_for_update(self.fetch_secret())?;
        for (key, value) in entries {
            map.insert((*key).to_string(), (*value).to_string());
        }
        self.write_map(&map)
    }

    async fn remove_many(&self, keys: &[&str]) -> Result<(), StorageError> {
        let mut map = decode_for_update(self.fetch_secret())?;
        for key in keys {
            map.remove(*key);
        }
        self.write_map(&map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locked() -> keyring::Error {
        keyring::Error::NoStorageAccess("keychain is locked".into())
    }

    #[test]
    fn test_read_of_missing_entry_is_empty() {
        assert!(decode_for_read(Err(keyring::Error::NoEntry)).unwrap().is_empty());
    }

    #[test]
    fn test_read_of_malformed_entry_fails() {
        let err = decode_for_read(Ok("not json".to_string())).unwrap_err();
        assert!(matches!(err, StorageError::Read(_)));
    }

    #[test]
    fn test_update_replaces_malformed_entry() {
        assert!(decode_for_update(Ok("not json".to_string())).unwrap().is_empty());
    }

    #[test]
    fn test_update_keeps_existing_keys() {
        let map = decode_for_update(Ok(r#"{"auth_token":"abc"}"#.to_string())).unwrap();
        assert_eq!(map.get("auth_token").map(String::as_str), Some("abc"));
    }

    #[test]
    fn test_update_aborts_on_platform_read_error() {
        let err = decode_for_update(Err(locked())).unwrap_err();
        assert!(err.is_write());
        assert!(matches!(decode_for_read(Err(locked())), Err(StorageError::Read(_))));
    }
}
