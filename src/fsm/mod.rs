//! Function-pointer operation-mode state machine.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │  StateTable                                          │
//! │  ┌───────────┬──────────┬──────────┬─────────────┐   │
//! │  │ Mode      │ on_enter │ on_exit  │ on_update   │   │
//! │  ├───────────┼──────────┼──────────┼─────────────┤   │
//! │  │ Manual    │ fn(ctx)  │ fn(ctx)  │ fn(ctx)     │   │
//! │  │ Timed     │ fn(ctx)  │ fn(ctx)  │ fn(ctx)     │   │
//! │  │ Automatic │ fn(ctx)  │ fn(ctx)  │ fn(ctx)     │   │
//! │  └───────────┴──────────┴──────────┴─────────────┘   │
//! │  config_active: bool   (orthogonal overlay)          │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! Modes only change on a mode-toggle event, cycling
//! Manual → Timed → Automatic → Manual. Configuration mode is an overlay
//! toggled by the setup button: while it is active mode toggles are
//! ignored and `tick` runs no handler, so nothing actuates.
//!
//! Each tick the engine calls `on_update` for the current mode, which
//! writes a motion command into the shared [`ControlContext`].

pub mod context;
pub mod states;

use context::{ControlContext, MotionCommand};
use log::{debug, info};

use crate::drivers::indicator::IndicatorPattern;

// ---------------------------------------------------------------------------
// Mode identity
// ---------------------------------------------------------------------------

/// Operation modes. Must stay in sync with [`states::build_state_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum OperationMode {
    #[default]
    Manual = 0,
    Timed = 1,
    Automatic = 2,
}

impl OperationMode {
    pub const COUNT: usize = 3;

    /// Convert an index back to a mode. Out-of-range indices fall back to
    /// `Manual` (asserts in debug builds).
    pub fn from_index(idx: usize) -> Self {
        match idx {
            0 => Self::Manual,
            1 => Self::Timed,
            2 => Self::Automatic,
            _ => {
                debug_assert!(false, "invalid mode index: {idx}");
                Self::Manual
            }
        }
    }

    /// The mode a toggle moves to.
    pub fn next(self) -> Self {
        Self::from_index((self as usize + 1) % Self::COUNT)
    }
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// `on_enter` / `on_exit` action; runs once per transition.
pub type StateActionFn = fn(&mut ControlContext);

/// Per-tick handler; writes `ctx.commands`.
pub type StateUpdateFn = fn(&mut ControlContext);

/// One row of the mode table.
pub struct StateDescriptor {
    pub mode: OperationMode,
    pub name: &'static str,
    pub on_enter: Option<StateActionFn>,
    pub on_exit: Option<StateActionFn>,
    pub on_update: StateUpdateFn,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

pub struct ModeMachine {
    /// Indexed by `OperationMode as usize`.
    table: [StateDescriptor; OperationMode::COUNT],
    current: usize,
    config_active: bool,
    tick_count: u64,
    mode_entry_tick: u64,
}

impl ModeMachine {
    pub fn new(table: [StateDescriptor; OperationMode::COUNT], initial: OperationMode) -> Self {
        Self {
            table,
            current: initial as usize,
            config_active: false,
            tick_count: 0,
            mode_entry_tick: 0,
        }
    }

    /// Run the initial `on_enter`. Call once before the first `tick()`.
    pub fn start(&mut self, ctx: &mut ControlContext) {
        info!("Mode machine starting in: {}", self.table[self.current].name);
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }

    /// Handle a mode-toggle event. Returns the new mode, or `None` when
    /// ignored because configuration mode is active.
    pub fn toggle_mode(&mut self, ctx: &mut ControlContext) -> Option<OperationMode> {
        if self.config_active {
            debug!("Mode toggle ignored: configuration active");
            return None;
        }
        let next = self.current_mode().next();
        self.transition(next, ctx);
        Some(next)
    }

    /// Handle a setup-toggle event. Returns the new `config_active` value.
    pub fn toggle_config(&mut self, ctx: &mut ControlContext) -> bool {
        self.config_active = !self.config_active;
        ctx.commands.motion = MotionCommand::Hold;
        if self.config_active {
            info!("Configuration mode: entered");
            ctx.commands.indicator = IndicatorPattern::Config;
        } else {
            info!(
                "Configuration mode: left, back to {}",
                self.table[self.current].name
            );
            ctx.commands.indicator = IndicatorPattern::Mode(self.current_mode());
        }
        self.config_active
    }

    /// Advance one control tick. Returns `false` (and holds) while
    /// configuration mode suppresses the strategies.
    pub fn tick(&mut self, ctx: &mut ControlContext) -> bool {
        if self.config_active {
            ctx.commands.motion = MotionCommand::Hold;
            return false;
        }
        self.tick_count += 1;
        ctx.ticks_in_mode = self.tick_count - self.mode_entry_tick;
        ctx.total_ticks = self.tick_count;

        (self.table[self.current].on_update)(ctx);
        true
    }

    pub fn current_mode(&self) -> OperationMode {
        self.table[self.current].mode
    }

    pub fn current_name(&self) -> &'static str {
        self.table[self.current].name
    }

    pub fn config_active(&self) -> bool {
        self.config_active
    }

    pub fn ticks_in_current_mode(&self) -> u64 {
        self.tick_count - self.mode_entry_tick
    }

    fn transition(&mut self, next: OperationMode, ctx: &mut ControlContext) {
        let next_idx = next as usize;

        info!(
            "Mode transition: {} -> {}",
            self.table[self.current].name, self.table[next_idx].name
        );

        if let Some(exit) = self.table[self.current].on_exit {
            exit(ctx);
        }

        self.current = next_idx;
        self.mode_entry_tick = self.tick_count;
        ctx.ticks_in_mode = 0;

        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }
}
