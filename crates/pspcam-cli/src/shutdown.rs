use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex};
use std::time::Duration;

/// A shutdown signal that supports interruptible waits.
///
/// The polling loop sleeps between ticks on this signal instead of
/// `thread::sleep()`, so Ctrl+C takes effect at the next tick boundary
/// rather than after the sleep completes.
pub struct ShutdownSignal {
    shutdown: AtomicBool,
    condvar: Condvar,
    mutex: Mutex<()>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self {
            shutdown: AtomicBool::new(false),
            condvar: Condvar::new(),
            mutex: Mutex::new(()),
        }
    }

    /// Trigger the shutdown signal, waking all waiting threads.
    pub fn trigger(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
        self.condvar.notify_all();
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    /// Wait for the duration or until shutdown is triggered.
    ///
    /// Returns `true` if shutdown was triggered, `false` if the wait
    /// completed normally.
    pub fn wait(&self, duration: Duration) -> bool {
        if self.is_shutdown() {
            return true;
        }

        let guard = self.mutex.lock().unwrap();
        let result = self
            .condvar
            .wait_timeout_while(guard, duration, |_| !self.is_shutdown());

        match result {
            Ok((_, timeout_result)) => !timeout_result.timed_out(),
            // Mutex poisoned, treat as shutdown
            Err(_) => true,
        }
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}
