//! Delivery of fetch completions onto the host's UI context.

use parking_lot::Mutex;
use tokio::sync::mpsc;

/// Work posted to the UI context.
pub type UiTask = Box<dyn FnOnce() + Send + 'static>;

/// The execution context where readiness and propagation side effects run.
pub trait UiContext: Send + Sync {
    fn post(&self, task: UiTask);
}

/// Runs posted work inline on the posting thread.
///
/// Suitable for hosts without a dedicated UI thread (servers, CLIs, tests).
pub struct ImmediateContext;

impl UiContext for ImmediateContext {
    fn post(&self, task: UiTask) {
        task();
    }
}

/// Queues posted work until the host's main loop drains it.
pub struct QueuedContext {
    tx: mpsc::UnboundedSender<UiTask>,
    rx: Mutex<mpsc::UnboundedReceiver<UiTask>>,
}

impl QueuedContext {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx: Mutex::new(rx),
        }
    }

    /// Run everything queued so far, including work posted by those tasks.
    /// Returns how many tasks ran.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        loop {
            let next = self.rx.lock().try_recv();
            match next {
                Ok(task) => {
                    task();
                    ran += 1;
                }
                Err(_) => return ran,
            }
        }
    }
}

impl Default for QueuedContext {
    fn default() -> Self {
        Self::new()
    }
}

impl UiContext for QueuedContext {
    fn post(&self, task: UiTask) {
        // The receiver lives as long as `self`, so sending cannot fail.
        let _ = self.tx.send(task);
    }
}
