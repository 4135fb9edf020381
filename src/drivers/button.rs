//! Button inputs.
//!
//! ## Hardware
//!
//! | Button | Wiring                         | Handling                        |
//! |--------|--------------------------------|---------------------------------|
//! | Mode   | active-low, falling-edge ISR   | debounced -> `Event::ModeToggle`  |
//! | Setup  | active-low, falling-edge ISR   | debounced -> `Event::SetupToggle` |
//! | Open   | HIGH while pressed             | level-polled each control tick  |
//! | Close  | HIGH while pressed             | level-polled each control tick  |
//!
//! ## Debounce
//!
//! Edge buttons use a re-trigger lockout rather than a settle delay: the
//! first edge is accepted immediately and every edge inside the interval
//! after it is ignored. The ISR only touches atomics and the event queue.
//!
//! ## Long press
//!
//! Holding the setup button for [`SHUTDOWN_HOLD_MS`] requests a shutdown.
//! The level is sampled by the control loop through [`HoldDetector`]; the
//! press edge itself still toggles configuration mode as usual.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use embedded_hal::digital::InputPin;

use crate::events::{Event, EventQueue};

/// Default re-trigger interval for the edge buttons.
pub const DEFAULT_DEBOUNCE_MS: u32 = 2000;

/// Continuous setup-button hold that requests a shutdown.
pub const SHUTDOWN_HOLD_MS: u32 = 5000;

/// Re-trigger lockout for one edge-triggered line.
///
/// Timestamps are milliseconds since boot truncated to `u32`; comparisons
/// use wrapping arithmetic so the ~49-day rollover is harmless.
pub struct EdgeDebouncer {
    interval_ms: AtomicU32,
    last_accepted_ms: AtomicU32,
    fired: AtomicBool,
}

impl EdgeDebouncer {
    pub const fn new(interval_ms: u32) -> Self {
        Self {
            interval_ms: AtomicU32::new(interval_ms),
            last_accepted_ms: AtomicU32::new(0),
            fired: AtomicBool::new(false),
        }
    }

    /// Change the lockout; takes effect on the next edge.
    pub fn set_interval(&self, interval_ms: u32) {
        self.interval_ms.store(interval_ms, Ordering::Relaxed);
    }

    pub fn interval_ms(&self) -> u32 {
        self.interval_ms.load(Ordering::Relaxed)
    }

    /// Whether an edge at `now_ms` falls outside the lockout. Does not
    /// start a new lockout; see [`commit`](Self::commit).
    pub fn ready(&self, now_ms: u32) -> bool {
        if !self.fired.load(Ordering::Acquire) {
            return true;
        }
        let last = self.last_accepted_ms.load(Ordering::Acquire);
        now_ms.wrapping_sub(last) >= self.interval_ms()
    }

    /// Start the lockout at `now_ms`.
    pub fn commit(&self, now_ms: u32) {
        self.last_accepted_ms.store(now_ms, Ordering::Release);
        self.fired.store(true, Ordering::Release);
    }

    /// Returns `true` if an edge at `now_ms` should be acted on.
    pub fn accept(&self, now_ms: u32) -> bool {
        if !self.ready(now_ms) {
            return false;
        }
        self.commit(now_ms);
        true
    }
}

/// An edge-triggered button bound to the event it produces.
pub struct ButtonLine {
    event: Event,
    debouncer: EdgeDebouncer,
}

impl ButtonLine {
    pub const fn new(event: Event, interval_ms: u32) -> Self {
        Self {
            event,
            debouncer: EdgeDebouncer::new(interval_ms),
        }
    }

    pub fn event(&self) -> Event {
        self.event
    }

    pub fn debouncer(&self) -> &EdgeDebouncer {
        &self.debouncer
    }

    /// ISR entry point. Lock-free; safe from interrupt context.
    /// Returns `true` if the edge was accepted and queued. An edge dropped
    /// on a full queue leaves the line unlocked.
    pub fn on_edge(&self, now_ms: u32, queue: &EventQueue) -> bool {
        if !self.debouncer.ready(now_ms) || !queue.push(self.event) {
            return false;
        }
        self.debouncer.commit(now_ms);
        true
    }
}

/// Mode button line, fed by its GPIO ISR.
pub static MODE_BUTTON: ButtonLine = ButtonLine::new(Event::ModeToggle, DEFAULT_DEBOUNCE_MS);
/// Setup button line, fed by its GPIO ISR.
pub static SETUP_BUTTON: ButtonLine = ButtonLine::new(Event::SetupToggle, DEFAULT_DEBOUNCE_MS);

/// Apply a configured re-trigger interval to both edge-triggered buttons.
pub fn set_debounce_interval(interval_ms: u32) {
    MODE_BUTTON.debouncer().set_interval(interval_ms);
    SETUP_BUTTON.debouncer().set_interval(interval_ms);
}

/// Fires once when a level-sampled button has been held for `hold_ms`.
///
/// Owned by the control loop, not shared with ISRs.
#[derive(Debug)]
pub struct HoldDetector {
    hold_ms: u32,
    pressed_since: Option<u32>,
    fired: bool,
}

impl HoldDetector {
    pub const fn new(hold_ms: u32) -> Self {
        Self {
            hold_ms,
            pressed_since: None,
            fired: false,
        }
    }

    /// Feed one sample. Returns `true` on the sample where the hold first
    /// reaches `hold_ms`; a release re-arms the detector.
    pub fn update(&mut self, now_ms: u32, pressed: bool) -> bool {
        if !pressed {
            self.pressed_since = None;
            self.fired = false;
            return false;
        }
        let since = *self.pressed_since.get_or_insert(now_ms);
        if self.fired || now_ms.wrapping_sub(since) < self.hold_ms {
            return false;
        }
        self.fired = true;
        true
    }
}

/// Level state of the two manual jog buttons.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ManualButtons {
    pub open: bool,
    pub close: bool,
}

/// Polled open/close buttons (HIGH = pressed).
pub struct ManualButtonPair<I: InputPin> {
    open: I,
    close: I,
}

impl<I: InputPin> ManualButtonPair<I> {
    pub fn new(open: I, close: I) -> Self {
        Self { open, close }
    }

    /// Read both buttons. A line that fails to read counts as released.
    pub fn read(&mut self) -> ManualButtons {
        ManualButtons {
            open: self.open.is_high().unwrap_or(false),
            close: self.close.is_high().unwrap_or(false),
        }
    }
}
