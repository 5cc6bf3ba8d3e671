// overlay/state.rs - Overlay Lifecycle State
//
// The lifecycle state machine shared between the caller and the render
// thread, and the router that holds back window lifecycle messages until the
// swap chain they would resize exists.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU8, Ordering};

use crate::platform::WindowEvent;

/// Where an overlay is in its life
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    NotStarted,
    /// Render thread is creating the device, window and renderer
    Initializing,
    /// Ready signal fired, first frame not yet rendered
    Ready,
    Running,
    /// Cancellation observed, teardown hooks running
    ClosingDown,
    Closed,
}

impl LifecycleState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => LifecycleState::Initializing,
            2 => LifecycleState::Ready,
            3 => LifecycleState::Running,
            4 => LifecycleState::ClosingDown,
            5 => LifecycleState::Closed,
            _ => LifecycleState::NotStarted,
        }
    }

    /// True once the render thread has finished for good
    pub fn is_closed(self) -> bool {
        self == LifecycleState::Closed
    }
}

/// Lock-free cell holding the current state
#[derive(Debug)]
pub struct StateCell(AtomicU8);

impl Default for StateCell {
    fn default() -> Self {
        Self(AtomicU8::new(LifecycleState::NotStarted as u8))
    }
}

impl StateCell {
    pub fn get(&self) -> LifecycleState {
        LifecycleState::from_u8(self.0.load(Ordering::SeqCst))
    }

    pub fn set(&self, state: LifecycleState) {
        self.0.store(state as u8, Ordering::SeqCst);
    }
}

/// Defers resize/destroy messages that arrive before the overlay is ready
#[derive(Debug, Default)]
pub struct MessageRouter {
    ready: bool,
    deferred: VecDeque<WindowEvent>,
}

impl MessageRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn deferred_count(&self) -> usize {
        self.deferred.len()
    }

    /// Pass `event` through, or queue it if the overlay is not ready yet
    pub fn route(&mut self, event: WindowEvent) -> Option<WindowEvent> {
        if self.ready {
            Some(event)
        } else {
            self.deferred.push_back(event);
            None
        }
    }

    /// Mark the overlay ready and hand back everything queued, oldest first
    pub fn mark_ready(&mut self) -> Vec<WindowEvent> {
        self.ready = true;
        self.deferred.drain(..).collect()
    }
}
