//! Store value types and the `PreferenceStore` trait.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use consentkit_core::Result;

/// A typed preference value, mirroring what the consent dialog can write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrefValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl PrefValue {
    /// Storage tag used by persistent backends.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::String(_) => "string",
            Self::Int(_) => "int",
            Self::Bool(_) => "bool",
            Self::Float(_) => "float",
        }
    }

    /// Rebuild a value from its storage tag and text form.
    pub fn from_parts(kind: &str, raw: &str) -> Option<Self> {
        match kind {
            "string" => Some(Self::String(raw.to_string())),
            "int" => raw.parse().ok().map(Self::Int),
            "bool" => raw.parse().ok().map(Self::Bool),
            "float" => raw.parse().ok().map(Self::Float),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

impl std::fmt::Display for PrefValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            Self::Int(i) => write!(f, "{}", i),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Float(v) => write!(f, "{}", v),
        }
    }
}

impl From<&str> for PrefValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for PrefValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

/// One mutation inside an atomic batch.
#[derive(Debug, Clone, PartialEq)]
pub enum Edit {
    Put(String, PrefValue),
    Remove(String),
}

impl Edit {
    pub fn put(key: impl Into<String>, value: impl Into<PrefValue>) -> Self {
        Self::Put(key.into(), value.into())
    }

    pub fn remove(key: impl Into<String>) -> Self {
        Self::Remove(key.into())
    }

    pub fn key(&self) -> &str {
        match self {
            Self::Put(key, _) | Self::Remove(key) => key,
        }
    }
}

/// Key/value access to persisted consent signals.
///
/// `apply` must be atomic: a concurrent reader observes either none or all of
/// a batch.
pub trait PreferenceStore: Send + Sync {
    /// Read a value of any type.
    fn get(&self, key: &str) -> Option<PrefValue>;

    /// Apply a batch of edits atomically.
    fn apply(&self, edits: Vec<Edit>) -> Result<()>;

    /// All stored keys, sorted.
    fn keys(&self) -> Vec<String>;

    /// Read a string value. Values stored with another type read as absent.
    fn get_string(&self, key: &str) -> Option<String> {
        match self.get(key) {
            Some(PrefValue::String(s)) => Some(s),
            _ => None,
        }
    }

    fn put_string(&self, key: &str, value: &str) -> Result<()> {
        self.apply(vec![Edit::put(key, value)])
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.apply(vec![Edit::remove(key)])
    }
}

impl<T: PreferenceStore + ?Sized> PreferenceStore for Arc<T> {
    fn get(&self, key: &str) -> Option<PrefValue> {
        (**self).get(key)
    }

    fn apply(&self, edits: Vec<Edit>) -> Result<()> {
        (**self).apply(edits)
    }

    fn keys(&self) -> Vec<String> {
        (**self).keys()
    }
}
