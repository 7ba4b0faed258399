//! consentkit Store: typed key/value access to persisted consent signals.
//!
//! The consent dialog writes IAB TCF, GPP, and Google Consent Mode values
//! into a preference store; everything else in consentkit only reads them.
//! `MemoryStore` backs tests and embedded hosts, `SqliteStore` persists to disk.

pub mod keys;
pub mod memory;
pub mod schema;
pub mod sqlite;
pub mod types;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use types::*;
