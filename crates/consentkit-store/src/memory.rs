//! In-process preference store.

use std::collections::HashMap;

use parking_lot::RwLock;

use consentkit_core::Result;

use crate::types::{Edit, PrefValue, PreferenceStore};

/// Preference store held in memory behind a single lock.
#[derive(Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, PrefValue>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store with string values.
    pub fn with_strings<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let values = pairs
            .into_iter()
            .map(|(k, v)| (k.to_string(), PrefValue::from(v)))
            .collect();
        Self {
            values: RwLock::new(values),
        }
    }

    pub fn len(&self) -> usize {
        self.values.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.read().is_empty()
    }
}

impl PreferenceStore for MemoryStore {
    fn get(&self, key: &str) -> Option<PrefValue> {
        self.values.read().get(key).cloned()
    }

    fn apply(&self, edits: Vec<Edit>) -> Result<()> {
        let mut values = self.values.write();
        for edit in edits {
            match edit {
                Edit::Put(key, value) => {
                    values.insert(key, value);
                }
                Edit::Remove(key) => {
                    values.remove(&key);
                }
            }
        }
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.values.read().keys().cloned().collect();
        keys.sort();
        keys
    }
}
