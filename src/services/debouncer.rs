//! Single-shot cancellable timer that collapses bursts of notifications into one action.
//!
//! Each [`Debouncer::notify`] cancels the pending timer and arms a new one; only the
//! last armed timer fires. Once a timer expires its action is spawned on its own task,
//! so a later `notify` cannot cancel an action that has already started.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;

pub struct Debouncer {
    delay: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
    fired: Arc<AtomicUsize>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: Mutex::new(None),
            fired: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Restarts the quiet period; `action` runs once it elapses without another notify.
    ///
    /// Must be called from within a tokio runtime.
    pub fn notify<F>(&self, action: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let delay = self.delay;
        let fired = Arc::clone(&self.fired);
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(timer) = pending.take() {
            timer.abort();
        }
        *pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            fired.fetch_add(1, Ordering::SeqCst);
            tokio::spawn(action);
        }));
    }

    /// Cancels the pending timer, if any. Returns whether a timer was still waiting.
    pub fn cancel(&self) -> bool {
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        match pending.take() {
            Some(timer) => {
                let waiting = !timer.is_finished();
                timer.abort();
                waiting
            }
            None => false,
        }
    }

    /// Whether a timer is armed and has not expired yet.
    pub fn is_pending(&self) -> bool {
        let pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        pending.as_ref().map_or(false, |timer| !timer.is_finished())
    }

    /// How many timers have expired since construction.
    pub fn fired_count(&self) -> usize {
        self.fired.load(Ordering::SeqCst)
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
