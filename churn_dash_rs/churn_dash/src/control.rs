//! Busy-state handling for the button that triggered a call, and sequencing of
//! overlapping prediction calls.

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::debug;

/// A control that can be put into a busy state while a call is in flight.
pub trait BusyControl {
    fn label(&self) -> String;
    fn set_label(&self, label: &str);
    fn set_disabled(&self, disabled: bool);
}

/// Disables a control and swaps its label for the duration of a call. The
/// original label and the enabled state come back when the guard is dropped,
/// whichever way the call ended.
#[must_use = "the control is restored as soon as the guard is dropped"]
pub struct BusyGuard<C: BusyControl> {
    control: C,
    original_label: String,
}

impl<C: BusyControl> BusyGuard<C> {
    pub fn engage(control: C, busy_label: &str) -> Self {
        let original_label = control.label();
        control.set_label(busy_label);
        control.set_disabled(true);
        Self {
            control,
            original_label,
        }
    }

    pub fn original_label(&self) -> &str {
        &self.original_label
    }
}

impl<C: BusyControl> Drop for BusyGuard<C> {
    fn drop(&mut self) {
        self.control.set_label(&self.original_label);
        self.control.set_disabled(false);
    }
}

/// Generation tag handed out when a prediction call starts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

/// Orders overlapping prediction calls: only the response to the most recently
/// started call may update the display.
#[derive(Debug, Default)]
pub struct RequestSequencer {
    latest: AtomicU64,
}

impl RequestSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self) -> Ticket {
        Ticket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        let current = self.latest.load(Ordering::SeqCst) == ticket.0;
        if !current {
            debug!(ticket = ticket.0, "discarding stale prediction result");
        }
        current
    }
}
