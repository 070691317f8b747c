//! Delay-and-collapse wrapper for bursty callbacks such as search box input.

use std::{
    fmt,
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use tokio::{task::JoinHandle, time::Instant};

type Callback<T> = Arc<dyn Fn(T) + Send + Sync>;

/// Runs the wrapped callback once per burst of [`Debouncer::call`]s, with the
/// argument of the last call, `delay` after that last call.
///
/// The pending invocation is a spawned tokio task whose deadline is fixed at
/// call time. Every call aborts the task it replaces, and dropping the
/// debouncer aborts whatever is still pending; [`Debouncer::flush`] waits for
/// it instead.
pub struct Debouncer<T> {
    callback: Callback<T>,
    delay: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl<T> Debouncer<T>
where
    T: Send + 'static,
{
    pub fn new(delay: Duration, callback: impl Fn(T) + Send + Sync + 'static) -> Self {
        Self {
            callback: Arc::new(callback),
            delay,
            pending: Mutex::new(None),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Must be called from within a tokio runtime.
    pub fn call(&self, arg: T) {
        let mut pending = self.pending_slot();
        if let Some(previous) = pending.take() {
            previous.abort();
        }

        let callback = Arc::clone(&self.callback);
        let deadline = Instant::now() + self.delay;
        *pending = Some(tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            callback(arg);
        }));
    }

    /// Waits for the pending invocation, if any, to run its callback.
    pub async fn flush(&self) {
        let pending = self.pending_slot().take();
        if let Some(handle) = pending {
            let _ = handle.await;
        }
    }

    pub fn cancel(&self) {
        if let Some(previous) = self.pending_slot().take() {
            previous.abort();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending_slot()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    fn pending_slot(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        // The slot only holds a handle; a poisoned lock leaves it usable.
        self.pending.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        let slot = match self.pending.get_mut() {
            Ok(slot) => slot,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(handle) = slot.take() {
            handle.abort();
        }
    }
}

impl<T> fmt::Debug for Debouncer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Debouncer")
            .field("delay", &self.delay)
            .finish_non_exhaustive()
    }
}
