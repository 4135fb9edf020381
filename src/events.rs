//! Interrupt-driven event queue.
//!
//! Events are produced by:
//! - GPIO ISRs (mode and setup buttons, after debouncing)
//! - The control loop (setup-button long press) and the panic hook, both
//!   requesting a shutdown
//!
//! and consumed by the control loop, which drains the queue at the start of
//! every tick so mode state is only ever mutated from one place.
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ Mode ISR    │────▶│              │     │              │
//! │ Setup ISR   │────▶│  EventQueue  │────▶│ Control loop │
//! │ Software    │────▶│  (lock-free) │     │  (consumer)  │
//! └─────────────┘     └──────────────┘     └──────────────┘
//! ```

use heapless::mpmc::Q16;

/// System events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Cycle Manual -> Timed -> Automatic -> Manual.
    ModeToggle,
    /// Enter or leave configuration mode.
    SetupToggle,
    /// Release outputs and stop background services.
    Shutdown,
}

/// Fixed-capacity MPMC queue, safe to push from interrupt context.
pub struct EventQueue {
    inner: Q16<Event>,
}

impl EventQueue {
    pub const fn new() -> Self {
        Self { inner: Q16::new() }
    }

    /// Push an event. Returns `false` if the queue is full (event dropped).
    pub fn push(&self, event: Event) -> bool {
        self.inner.enqueue(event).is_ok()
    }

    pub fn pop(&self) -> Option<Event> {
        self.inner.dequeue()
    }

    /// Drain all pending events into a callback, in FIFO order.
    pub fn drain(&self, mut handler: impl FnMut(Event)) {
        while let Some(event) = self.pop() {
            handler(event);
        }
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// Queue shared by the GPIO ISRs and the firmware control loop.
pub static EVENTS: EventQueue = EventQueue::new();
