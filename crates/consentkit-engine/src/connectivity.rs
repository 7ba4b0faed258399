//! Network reachability check supplied by the host.

use std::sync::atomic::{AtomicBool, Ordering};

/// Answers "can we reach the network right now?" synchronously.
pub trait Connectivity: Send + Sync {
    fn is_available(&self) -> bool;
}

/// Assumes the network is always there.
pub struct AlwaysOnline;

impl Connectivity for AlwaysOnline {
    fn is_available(&self) -> bool {
        true
    }
}

/// Reachability flag the host flips from its own network callbacks.
pub struct ConnectivityFlag {
    online: AtomicBool,
}

impl ConnectivityFlag {
    pub fn new(online: bool) -> Self {
        Self {
            online: AtomicBool::new(online),
        }
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }
}

impl Connectivity for ConnectivityFlag {
    fn is_available(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }
}
