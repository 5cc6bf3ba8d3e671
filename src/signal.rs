// signal.rs - Cross-thread Completion Signals
//
// Single-fire signals used to hand readiness and shutdown from the render
// thread back to callers, plus the cooperative cancellation flag checked at
// the top of every frame.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Set-once value that any number of threads can wait on
#[derive(Debug)]
pub struct Signal<T> {
    value: Mutex<Option<T>>,
    fired: Condvar,
}

impl<T> Default for Signal<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Signal<T> {
    pub fn new() -> Self {
        Self {
            value: Mutex::new(None),
            fired: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<T>> {
        self.value.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fire the signal. Returns false (and drops `value`) if it already fired.
    pub fn set(&self, value: T) -> bool {
        let mut slot = self.lock();
        if slot.is_some() {
            return false;
        }
        *slot = Some(value);
        self.fired.notify_all();
        true
    }

    pub fn is_set(&self) -> bool {
        self.lock().is_some()
    }
}

impl<T: Clone> Signal<T> {
    pub fn try_get(&self) -> Option<T> {
        self.lock().clone()
    }

    /// Block until the signal fires
    pub fn wait(&self) -> T {
        let mut slot = self.lock();
        loop {
            if let Some(value) = slot.as_ref() {
                return value.clone();
            }
            slot = self.fired.wait(slot).unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Block until the signal fires or `timeout` elapses
    pub fn wait_timeout(&self, timeout: Duration) -> Option<T> {
        let slot = self.lock();
        let (slot, _) = self
            .fired
            .wait_timeout_while(slot, timeout, |value| value.is_none())
            .unwrap_or_else(PoisonError::into_inner);
        slot.clone()
    }
}

/// Cooperative shutdown request shared by every handle to one overlay
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Returns true only for the first request.
    pub fn cancel(&self) -> bool {
        !self.0.swap(true, Ordering::SeqCst)
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
