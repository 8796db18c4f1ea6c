use story_feed::error::{Error, Result};
use story_feed::KeyValueStorage;
use web_sys::{Storage, Window};

/// The browser's `localStorage`.
pub struct LocalStorage {
    storage: Storage,
}

impl LocalStorage {
    pub fn from_window(window: &Window) -> Result<Self> {
        let storage = window
            .local_storage()
            .map_err(|err| Error::Storage(format!("{:?}", err)))?
            .ok_or_else(|| Error::Storage("localStorage is not available".into()))?;

        Ok(LocalStorage { storage })
    }
}

impl KeyValueStorage for LocalStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.storage.get_item(key).ok().flatten()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.storage
            .set_item(key, value)
            .map_err(|err| Error::Storage(format!("could not write {}: {:?}", key, err)))
    }

    fn clear(&self) -> Result<()> {
        self.storage
            .clear()
            .map_err(|err| Error::Storage(format!("{:?}", err)))
    }
}
