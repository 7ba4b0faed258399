//! consentkit Engine: consent status lifecycle and the public query surface.
//!
//! A [`ConsentEngine`] is built once by the host's composition root. It
//! fetches the consent scope in the background, delivers completion on the
//! host's UI context, exposes scope/state/grant queries, decides when the
//! consent dialog opens, and re-propagates consent after every decision.

pub mod connectivity;
pub mod context;
pub mod engine;
pub mod ready;
pub mod session;
pub mod types;

pub use connectivity::{AlwaysOnline, Connectivity, ConnectivityFlag};
pub use context::{ImmediateContext, QueuedContext, UiContext, UiTask};
pub use engine::{ConsentEngine, EngineBuilder, FetchHandle};
pub use ready::ReadyLatch;
pub use session::{DialogSession, ReadOnlyBridge};
pub use types::*;
