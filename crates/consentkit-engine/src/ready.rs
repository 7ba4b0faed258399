//! One-shot readiness latch.
//!
//! Listeners registered before the latch fires run once when it fires;
//! listeners registered afterwards run immediately on the registering thread.

use parking_lot::Mutex;
use tokio::sync::watch;

type Listener = Box<dyn FnOnce() + Send + 'static>;

struct LatchInner {
    fired: bool,
    listeners: Vec<Listener>,
}

pub struct ReadyLatch {
    inner: Mutex<LatchInner>,
    tx: watch::Sender<bool>,
}

impl ReadyLatch {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self {
            inner: Mutex::new(LatchInner {
                fired: false,
                listeners: Vec::new(),
            }),
            tx,
        }
    }

    pub fn is_fired(&self) -> bool {
        self.inner.lock().fired
    }

    /// Fire the latch. Returns `false` if it had already fired.
    pub fn fire(&self) -> bool {
        let listeners = {
            let mut inner = self.inner.lock();
            if inner.fired {
                return false;
            }
            inner.fired = true;
            std::mem::take(&mut inner.listeners)
        };
        self.tx.send_replace(true);
        for listener in listeners {
            listener();
        }
        true
    }

    pub fn register(&self, listener: impl FnOnce() + Send + 'static) {
        {
            let mut inner = self.inner.lock();
            if !inner.fired {
                inner.listeners.push(Box::new(listener));
                return;
            }
        }
        listener();
    }

    /// Resolve once the latch has fired.
    pub async fn wait(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait.
        let _ = rx.wait_for(|fired| *fired).await;
    }
}

impl Default for ReadyLatch {
    fn default() -> Self {
        Self::new()
    }
}
