//! Shift modifier state shared between the dispatch thread and the app
//!
//! Only the shift handler writes it; the hotcue, effect knob and beat size
//! handlers read it. Events are dispatched one at a time, so a read always
//! sees the most recent shift press or release. If events are ever dispatched
//! from more than one thread, a read may lag one event behind.

use std::sync::atomic::{AtomicBool, Ordering};

/// Whether the shift button is currently held
#[derive(Debug, Default)]
pub struct ShiftState {
    held: AtomicBool,
}

impl ShiftState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if shift is held
    pub fn is_held(&self) -> bool {
        self.held.load(Ordering::Relaxed)
    }

    /// Update shift state
    pub fn set_held(&self, held: bool) {
        self.held.store(held, Ordering::Relaxed);
    }
}
