//! Secure, single-slot persistence for the session credential.
//!
//! The backend issues one bearer credential per installation. It lives in
//! the OS keychain under a fixed service/account pair; `CredentialStore`
//! owns the slot's invariants (values are trimmed, blanks are rejected,
//! the old value is cleared before a new one is written) and absorbs
//! backend failures so a flaky keychain degrades to "no stored credential"
//! instead of an error the caller has to handle.

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use keyring::Entry;
use tracing::{debug, warn};

/// Keychain service name for all Readbound entries.
const SERVICE_NAME: &str = "readbound";

/// Account key for the single credential slot.
const CREDENTIAL_KEY: &str = "session-token";

/// Backend for secure string storage.
pub trait SecureStore: Send + Sync {
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn delete(&self, key: &str) -> Result<()>;
}

/// OS keychain backend via `keyring`.
pub struct KeyringStore;

impl SecureStore for KeyringStore {
    fn set(&self, key: &str, value: &str) -> Result<()> {
        let entry = Entry::new(SERVICE_NAME, key).context("Failed to create keyring entry")?;
        entry
            .set_password(value)
            .context("Failed to store credential in keychain")?;
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        let entry = Entry::new(SERVICE_NAME, key).context("Failed to create keyring entry")?;
        match entry.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e).context("Failed to read credential from keychain"),
        }
    }

    fn delete(&self, key: &str) -> Result<()> {
        let entry = Entry::new(SERVICE_NAME, key).context("Failed to create keyring entry")?;
        match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e).context("Failed to delete credential from keychain"),
        }
    }
}

/// In-memory backend for tests, CI, and hosts without a keychain.
#[derive(Default)]
pub struct MemoryStore {
    data: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.data.lock().map_err(|_| anyhow!("storage mutex poisoned"))
    }
}

impl SecureStore for MemoryStore {
    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}

/// The single credential slot.
pub struct CredentialStore {
    backend: Box<dyn SecureStore>,
}

impl CredentialStore {
    pub fn new(backend: Box<dyn SecureStore>) -> Self {
        Self { backend }
    }

    /// Slot backed by the OS keychain.
    pub fn keyring() -> Self {
        Self::new(Box::new(KeyringStore))
    }

    /// Slot backed by process memory.
    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryStore::new()))
    }

    /// Persist a credential, replacing any prior value.
    ///
    /// The value is trimmed first; a value that trims to nothing is
    /// rejected without touching the slot, because a blank credential
    /// satisfies presence checks downstream while being unusable. A failed
    /// write is logged, not raised: the in-memory credential from the
    /// handshake still serves the current process.
    pub fn save(&self, value: &str) {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            warn!("Refusing to store a blank credential");
            return;
        }

        // Clear the slot first so a failed write cannot leave two
        // conflicting entries.
        if let Err(e) = self.backend.delete(CREDENTIAL_KEY) {
            debug!(error = %e, "Could not clear the credential slot before writing");
        }
        if let Err(e) = self.backend.set(CREDENTIAL_KEY, trimmed) {
            warn!(error = %e, "Failed to persist credential");
        }
    }

    /// Read the stored credential. Backend failures read as "no credential".
    pub fn read(&self) -> Option<String> {
        match self.backend.get(CREDENTIAL_KEY) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "Failed to read credential from storage");
                None
            }
        }
    }

    /// Remove the stored credential, if any.
    pub fn delete(&self) {
        if let Err(e) = self.backend.delete(CREDENTIAL_KEY) {
            warn!(error = %e, "Failed to delete stored credential");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    /// Backend that records the order of operations it receives.
    struct RecordingStore {
        inner: MemoryStore,
        ops: Arc<Mutex<Vec<String>>>,
    }

    impl RecordingStore {
        fn new() -> (Self, Arc<Mutex<Vec<String>>>) {
            let ops = Arc::new(Mutex::new(Vec::new()));
            let store = Self {
                inner: MemoryStore::new(),
                ops: Arc::clone(&ops),
            };
            (store, ops)
        }
    }

    impl SecureStore for RecordingStore {
        fn set(&self, key: &str, value: &str) -> Result<()> {
            self.ops.lock().unwrap().push("set".to_string());
            self.inner.set(key, value)
        }

        fn get(&self, key: &str) -> Result<Option<String>> {
            self.inner.get(key)
        }

        fn delete(&self, key: &str) -> Result<()> {
            self.ops.lock().unwrap().push("delete".to_string());
            self.inner.delete(key)
        }
    }

    /// Backend whose every operation fails.
    struct BrokenStore;

    impl SecureStore for BrokenStore {
        fn set(&self, _key: &str, _value: &str) -> Result<()> {
            Err(anyhow!("keychain locked"))
        }

        fn get(&self, _key: &str) -> Result<Option<String>> {
            Err(anyhow!("keychain locked"))
        }

        fn delete(&self, _key: &str) -> Result<()> {
            Err(anyhow!("keychain locked"))
        }
    }

    #[test]
    fn test_save_and_read_round_trip() {
        let store = CredentialStore::in_memory();
        assert_eq!(store.read(), None);

        store.save("abc");
        assert_eq!(store.read().as_deref(), Some("abc"));
    }

    #[test]
    fn test_saved_values_are_trimmed() {
        let store = CredentialStore::in_memory();
        store.save("  tok-1\n");
        assert_eq!(store.read().as_deref(), Some("tok-1"));
    }

    #[test]
    fn test_blank_saves_are_rejected() {
        let store = CredentialStore::in_memory();

        store.save("");
        assert_eq!(store.read(), None);

        store.save("   \n");
        assert_eq!(store.read(), None);
    }

    #[test]
    fn test_blank_saves_preserve_the_prior_value() {
        let store = CredentialStore::in_memory();
        store.save("keep-me");

        store.save("");
        assert_eq!(store.read().as_deref(), Some("keep-me"));

        store.save("   \n");
        assert_eq!(store.read().as_deref(), Some("keep-me"));
    }

    #[test]
    fn test_save_replaces_the_prior_value() {
        let store = CredentialStore::in_memory();
        store.save("first");
        store.save("second");
        assert_eq!(store.read().as_deref(), Some("second"));
    }

    #[test]
    fn test_delete_then_read_returns_none() {
        let store = CredentialStore::in_memory();
        store.save("abc");
        store.delete();
        assert_eq!(store.read(), None);

        // Deleting an empty slot is fine too.
        store.delete();
        assert_eq!(store.read(), None);
    }

    #[test]
    fn test_save_clears_the_slot_before_writing() {
        let (backend, ops) = RecordingStore::new();
        let store = CredentialStore::new(Box::new(backend));

        store.save("tok");

        let recorded = ops.lock().unwrap().clone();
        assert_eq!(recorded, vec!["delete".to_string(), "set".to_string()]);
    }

    #[test]
    fn test_backend_failures_are_absorbed() {
        let store = CredentialStore::new(Box::new(BrokenStore));

        // None of these panic or propagate.
        store.save("tok");
        assert_eq!(store.read(), None);
        store.delete();
    }
}
