//! consentkit Decode: turns stored consent strings into queryable grants.
//!
//! Decoders never fail. Missing input decodes to `None` so callers can tell
//! "no data" apart from "nothing granted"; malformed input degrades to `None`
//! or `false` per field.

pub mod decoders;
pub mod export;

pub use decoders::*;
pub use export::{ConsentExport, ExportSnapshot};
