use crate::config::CUSTOM_COLORS_KEY;
use crate::models::CustomColors;
use serde::{Deserialize, Serialize};
#[cfg(test)]
use std::cell::RefCell;
#[cfg(test)]
use std::collections::HashMap;

/// Minimal string key-value store; `localStorage` in the browser.
pub(crate) trait KeyValueStore {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&self, key: &str, value: &str);

    fn load_json<T: for<'de> Deserialize<'de>>(&self, key: &str) -> Option<T> {
        let json = self.get_item(key)?;
        match serde_json::from_str(&json) {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!("Discarding unreadable value under {key}: {e}");
                None
            }
        }
    }

    fn save_json<T: Serialize>(&self, key: &str, value: &T) {
        match serde_json::to_string(value) {
            Ok(json) => self.set_item(key, &json),
            Err(e) => tracing::error!("Could not serialize value for {key}: {e}"),
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct BrowserStorage;

impl BrowserStorage {
    fn storage() -> Option<web_sys::Storage> {
        web_sys::window().and_then(|w| w.local_storage().ok().flatten())
    }
}

impl KeyValueStore for BrowserStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        Self::storage()?.get_item(key).ok().flatten()
    }

    fn set_item(&self, key: &str, value: &str) {
        if let Some(storage) = Self::storage() {
            let _ = storage.set_item(key, value);
        }
    }
}

#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct MemoryStorage {
    items: RefCell<HashMap<String, String>>,
}

#[cfg(test)]
impl KeyValueStore for MemoryStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.borrow().get(key).cloned()
    }

    fn set_item(&self, key: &str, value: &str) {
        self.items
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
    }
}

/// Per-guide custom color lists.
///
/// Loaded lazily on first access; every write persists the whole mapping.
pub(crate) struct CustomColorStore<S: KeyValueStore> {
    storage: S,
    cache: Option<CustomColors>,
}

impl<S: KeyValueStore> CustomColorStore<S> {
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            cache: None,
        }
    }

    fn loaded(&mut self) -> &mut CustomColors {
        let storage = &self.storage;
        self.cache.get_or_insert_with(|| {
            storage
                .load_json::<CustomColors>(CUSTOM_COLORS_KEY)
                .unwrap_or_default()
        })
    }

    pub fn get_colors(&mut self, guide_id: u64) -> Vec<String> {
        self.loaded().get(guide_id).cloned().unwrap_or_default()
    }

    pub fn set_colors(&mut self, guide_id: u64, colors: Vec<String>) {
        let colors = colors.into_iter().map(|c| c.to_uppercase()).collect();
        self.loaded().set(guide_id, colors);

        if let Some(cache) = &self.cache {
            self.storage.save_json(CUSTOM_COLORS_KEY, cache);
        }
    }

    #[cfg(test)]
    pub fn storage(&self) -> &S {
        &self.storage
    }
}
