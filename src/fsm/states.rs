//! Mode handler functions and table builder.
//!
//! ```text
//!  MANUAL ──[mode]──▶ TIMED ──[mode]──▶ AUTOMATIC
//!    ▲                                      │
//!    └──────────────────[mode]──────────────┘
//!
//!  any mode ──[setup]──▶ (configuring) ──[setup]──▶ same mode
//! ```
//!
//! | Mode      | Strategy                                                  |
//! |-----------|-----------------------------------------------------------|
//! | Manual    | open/close buttons jog one step per tick                  |
//! | Timed     | closed inside the close window, fully open outside        |
//! | Automatic | closed at night and in the window, else follows the light |

use super::context::{ControlContext, MotionCommand};
use super::{OperationMode, StateDescriptor};
use crate::control::solar::{SolarDay, automatic_target};
use crate::control::timed::timed_target;
use crate::drivers::indicator::IndicatorPattern;
use crate::drivers::stepper::Direction;
use log::{debug, info};

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the mode table. Called once at startup.
pub fn build_state_table() -> [StateDescriptor; OperationMode::COUNT] {
    [
        // Index 0: Manual
        StateDescriptor {
            mode: OperationMode::Manual,
            name: "Manual",
            on_enter: Some(manual_enter),
            on_exit: Some(hold),
            on_update: manual_update,
        },
        // Index 1: Timed
        StateDescriptor {
            mode: OperationMode::Timed,
            name: "Timed",
            on_enter: Some(timed_enter),
            on_exit: Some(hold),
            on_update: timed_update,
        },
        // Index 2: Automatic
        StateDescriptor {
            mode: OperationMode::Automatic,
            name: "Automatic",
            on_enter: Some(automatic_enter),
            on_exit: Some(hold),
            on_update: automatic_update,
        },
    ]
}

fn hold(ctx: &mut ControlContext) {
    ctx.commands.motion = MotionCommand::Hold;
}

// ═══════════════════════════════════════════════════════════════════════════
//  MANUAL
// ═══════════════════════════════════════════════════════════════════════════

fn manual_enter(ctx: &mut ControlContext) {
    ctx.commands.indicator = IndicatorPattern::Mode(OperationMode::Manual);
    ctx.commands.motion = MotionCommand::Hold;
    info!("MANUAL: jog with the open/close buttons");
}

fn manual_update(ctx: &mut ControlContext) {
    let b = ctx.sensors.buttons;
    ctx.commands.motion = match (b.open, b.close) {
        (true, false) => MotionCommand::Jog(Direction::Open),
        (false, true) => MotionCommand::Jog(Direction::Close),
        _ => MotionCommand::Hold,
    };
}

// ═══════════════════════════════════════════════════════════════════════════
//  TIMED
// ═══════════════════════════════════════════════════════════════════════════

fn timed_enter(ctx: &mut ControlContext) {
    ctx.commands.indicator = IndicatorPattern::Mode(OperationMode::Timed);
    let w = ctx.settings.close_window;
    info!(
        "TIMED: closed from {} for {} min",
        w.start, w.duration_mins
    );
}

fn timed_update(ctx: &mut ControlContext) {
    let target = timed_target(
        &ctx.settings.close_window,
        ctx.sensors.local.minute_of_day,
    );
    ctx.commands.motion = MotionCommand::Seek(target);
}

// ═══════════════════════════════════════════════════════════════════════════
//  AUTOMATIC
// ═══════════════════════════════════════════════════════════════════════════

fn automatic_enter(ctx: &mut ControlContext) {
    ctx.commands.indicator = IndicatorPattern::Mode(OperationMode::Automatic);
    let day = solar_day(ctx);
    info!("AUTOMATIC: today {:?}", day);
}

fn automatic_update(ctx: &mut ControlContext) {
    let day = solar_day(ctx);
    let target = automatic_target(
        &day,
        ctx.sensors.local.minute_of_day,
        ctx.in_close_window(),
        ctx.sensors.brightness.map(|b| b.percent),
    );
    ctx.commands.motion = match target {
        Some(pct) => MotionCommand::Seek(pct),
        None => {
            debug!("AUTOMATIC: no brightness sample, holding");
            MotionCommand::Hold
        }
    };
}

fn solar_day(ctx: &ControlContext) -> SolarDay {
    let cfg = &ctx.settings.config;
    SolarDay::compute(
        ctx.sensors.local.day_of_year,
        cfg.latitude,
        cfg.longitude,
        cfg.utc_offset_minutes,
    )
}
