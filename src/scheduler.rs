//! Photoperiod scheduler.
//!
//! Alternates between a lit and a dark phase using the durations in
//! [`Settings`], independent of whether a controller is connected.  The
//! scheduler only keeps time; rendering is delegated through
//! [`SchedulerDelegate`] so it stays testable without a light engine.
//!
//! ```text
//!            auto_cycle_enabled
//!   Dormant ───────────────────▶ On ──(elapsed ≥ on_h)──▶ Off
//!      ▲                          ▲                        │
//!      │ disabled (any phase)     └──(elapsed ≥ off_h)─────┘
//! ```
//!
//! Elapsed time comes from monotonic timestamps passed to [`Scheduler::tick`],
//! so a late or skipped tick still accounts for the real time that passed.
//! Settings are re-read on every tick; nothing is cached between ticks.

use core::time::Duration;

use log::{debug, info};

use crate::app::ports::SchedulerDelegate;
use crate::config::Settings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Auto-cycle disabled: no transitions, no renders.
    Dormant,
    On,
    Off,
}

impl Phase {
    fn next(self) -> Self {
        match self {
            Self::On => Self::Off,
            Self::Off | Self::Dormant => Self::On,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseChange {
    pub from: Phase,
    pub to: Phase,
}

pub struct Scheduler {
    phase: Phase,
    phase_elapsed: Duration,
    last_tick_us: u64,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            phase: Phase::Dormant,
            phase_elapsed: Duration::ZERO,
            last_tick_us: 0,
        }
    }

    /// Boot entry: lit phase with zero elapsed time, or dormant.
    pub fn start(
        &mut self,
        now_us: u64,
        settings: &Settings,
        delegate: &mut dyn SchedulerDelegate,
    ) -> Option<PhaseChange> {
        self.last_tick_us = now_us;
        self.phase_elapsed = Duration::ZERO;
        if !settings.auto_cycle_enabled {
            info!("Scheduler: auto-cycle disabled, dormant");
            self.phase = Phase::Dormant;
            return None;
        }
        Some(self.enter(Phase::On, settings, delegate))
    }

    /// Advance by the time since the previous tick. Call once per loop iteration.
    ///
    /// At most one transition happens per tick.  Disabling the cycle goes
    /// dormant without rendering, so the last frame stays on the strip;
    /// re-enabling restarts the lit phase from zero.
    pub fn tick(
        &mut self,
        now_us: u64,
        settings: &Settings,
        delegate: &mut dyn SchedulerDelegate,
    ) -> Option<PhaseChange> {
        let delta = Duration::from_micros(now_us.saturating_sub(self.last_tick_us));
        self.last_tick_us = now_us;

        match (self.phase, settings.auto_cycle_enabled) {
            (Phase::Dormant, false) => None,
            (from, false) => {
                self.phase = Phase::Dormant;
                self.phase_elapsed = Duration::ZERO;
                let change = PhaseChange {
                    from,
                    to: Phase::Dormant,
                };
                delegate.phase_changed(change);
                Some(change)
            }
            (Phase::Dormant, true) => Some(self.enter(Phase::On, settings, delegate)),
            (phase, true) => {
                self.phase_elapsed = self.phase_elapsed.saturating_add(delta);
                if self.phase_elapsed < phase_length(phase, settings) {
                    return None;
                }
                Some(self.enter(phase.next(), settings, delegate))
            }
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn phase_elapsed(&self) -> Duration {
        self.phase_elapsed
    }

    pub fn last_tick_us(&self) -> u64 {
        self.last_tick_us
    }

    fn enter(
        &mut self,
        to: Phase,
        settings: &Settings,
        delegate: &mut dyn SchedulerDelegate,
    ) -> PhaseChange {
        let change = PhaseChange {
            from: self.phase,
            to,
        };
        self.phase = to;
        self.phase_elapsed = Duration::ZERO;
        delegate.phase_changed(change);

        // A zero-length phase is passed through on the next tick without
        // ever showing its frame.
        if phase_length(to, settings).is_zero() {
            debug!("Scheduler: {:?} has zero length, not rendering", to);
            return change;
        }
        match to {
            Phase::On => delegate.light_on(settings.auto_recipe),
            Phase::Off => delegate.light_off(),
            Phase::Dormant => {}
        }
        change
    }
}

fn phase_length(phase: Phase, settings: &Settings) -> Duration {
    match phase {
        Phase::On => settings.on_duration(),
        Phase::Off => settings.off_duration(),
        Phase::Dormant => Duration::MAX,
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
