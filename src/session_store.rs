use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use log::{debug, warn};

use crate::config::Config;
use crate::error::Result;

/// Token and username identifying a logged-in user across reloads.
#[derive(Hash, Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Credential {
    pub token: String,
    pub username: String,
}

impl Credential {
    pub fn new(token: impl Into<String>, username: impl Into<String>) -> Self {
        Credential {
            token: token.into(),
            username: username.into(),
        }
    }
}

/// Synchronous string storage that outlives the page, such as `localStorage`.
pub trait KeyValueStorage {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

/// In-process storage. Clones share the same map, so a clone stands in for
/// the storage a reloaded page would see.
#[derive(Clone, Debug, Default)]
pub struct MemoryStorage {
    items: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        MemoryStorage::default()
    }

    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.items.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.items
            .borrow_mut()
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.items.borrow_mut().clear();
        Ok(())
    }
}

pub struct SessionStore<S> {
    storage: S,
    token_key: String,
    username_key: String,
}

impl<S: KeyValueStorage> SessionStore<S> {
    pub fn new(storage: S, config: &Config) -> Self {
        SessionStore {
            storage,
            token_key: config.token_key.clone(),
            username_key: config.username_key.clone(),
        }
    }

    /// Only a complete credential counts; a lone token or username is ignored.
    pub fn load(&self) -> Option<Credential> {
        let token = self.storage.get(&self.token_key)?;
        let username = self.storage.get(&self.username_key)?;

        if token.is_empty() || username.is_empty() {
            return None;
        }
        Some(Credential { token, username })
    }

    pub fn save(&self, credential: Option<&Credential>) -> Result<()> {
        if let Some(credential) = credential {
            debug!("persisting session for {}", credential.username);
            let written = self
                .storage
                .set(&self.token_key, &credential.token)
                .and_then(|()| self.storage.set(&self.username_key, &credential.username));

            // a token must never sit next to someone else's username
            if let Err(err) = written {
                warn!("could not persist session for {}: {}", credential.username, err);
                self.clear()?;
                return Err(err);
            }
        }
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        debug!("clearing persisted session");
        self.storage.clear()
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    /// Refuses writes to one key.
    struct ReadOnlyKey {
        inner: MemoryStorage,
        key: &'static str,
    }

    impl KeyValueStorage for ReadOnlyKey {
        fn get(&self, key: &str) -> Option<String> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<()> {
            if key == self.key {
                return Err(Error::Storage("quota exceeded".into()));
            }
            self.inner.set(key, value)
        }

        fn clear(&self) -> Result<()> {
            self.inner.clear()
        }
    }

    fn store() -> SessionStore<MemoryStorage> {
        SessionStore::new(MemoryStorage::new(), &Config::default())
    }

    #[test]
    fn empty_storage_loads_nothing() {
        assert_eq!(store().load(), None);
    }

    #[test]
    fn save_then_load() {
        let store = store();
        let credential = Credential::new("tok", "alice");
        store.save(Some(&credential)).unwrap();

        assert_eq!(store.storage().get("token").as_deref(), Some("tok"));
        assert_eq!(store.storage().get("username").as_deref(), Some("alice"));
        assert_eq!(store.load(), Some(credential));
    }

    #[test]
    fn saving_nothing_is_a_no_op() {
        let store = store();
        store.save(Some(&Credential::new("tok", "alice"))).unwrap();
        store.save(None).unwrap();
        assert_eq!(store.load(), Some(Credential::new("tok", "alice")));
    }

    #[test]
    fn partial_credential_is_absent() {
        let store = store();
        store.storage().set("token", "tok").unwrap();
        assert_eq!(store.load(), None);
    }

    #[test]
    fn failed_save_leaves_no_half_credential() {
        let inner = MemoryStorage::new();
        inner.set("token", "old-tok").unwrap();
        inner.set("username", "alice").unwrap();
        let store = SessionStore::new(
            ReadOnlyKey {
                inner: inner.clone(),
                key: "username",
            },
            &Config::default(),
        );

        let err = store.save(Some(&Credential::new("new-tok", "bob"))).unwrap_err();

        assert_eq!(err, Error::Storage("quota exceeded".into()));
        assert_eq!(store.load(), None);
        assert_eq!(inner.get("token"), None);
    }

    #[test]
    fn clear_forgets_everything() {
        let store = store();
        store.save(Some(&Credential::new("tok", "alice"))).unwrap();
        store.storage().set("unrelated", "1").unwrap();
        store.clear().unwrap();

        assert_eq!(store.load(), None);
        assert!(store.storage().is_empty());
    }

    #[test]
    fn custom_keys() {
        let config = Config {
            token_key: "t".into(),
            username_key: "u".into(),
            ..Config::default()
        };
        let storage = MemoryStorage::new();
        let store = SessionStore::new(storage.clone(), &config);
        store.save(Some(&Credential::new("tok", "bob"))).unwrap();

        assert_eq!(storage.get("t").as_deref(), Some("tok"));
        assert_eq!(storage.get("token"), None);
    }
}
