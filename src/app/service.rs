//! Application service: the hexagonal core.
//!
//! [`AppService`] owns the settings, the light engine, and the scheduler.
//! It exposes a clean, hardware-agnostic API.  All I/O flows through
//! port traits injected at call sites, making the entire service
//! testable with mock adapters.
//!
//! ```text
//!  control-point write ──▶ ┌─────────────────────────────┐ ──▶ EventSink
//!                          │         AppService          │
//!       SettingsPort ◀─────│ Settings · Light · Schedule │────▶ PixelPort
//!                          └─────────────────────────────┘
//! ```
//!
//! Settings mutations are write-through: a candidate copy is saved first
//! and only committed in memory once the store accepts it.
//!
//! Outcomes are reported through the [`EventSink`] only; the service
//! itself never logs.

use crate::config::Settings;
use crate::error::{Error, RenderFailure, Result};
use crate::protocol::{ControlCommand, ControlPoint, Request, decode_write};
use crate::recipes::RecipeId;
use crate::scheduler::{PhaseChange, Scheduler};

use super::events::AppEvent;
use super::light_engine::{AppliedLightState, LightEngine, Source};
use super::ports::{EventSink, PixelPort, SchedulerDelegate, SettingsPort};

/// Follow-up work for a successfully handled write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WriteOutcome {
    /// Push the settings record to the connected peer.
    pub notify_settings: bool,
}

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

pub struct AppService {
    settings: Settings,
    light: LightEngine,
    scheduler: Scheduler,
}

impl AppService {
    /// Construct the service. Does not render; call [`start`](Self::start) next.
    pub fn new(settings: Settings, pixel_count: usize) -> Self {
        Self {
            settings: settings.clamped(),
            light: LightEngine::new(pixel_count),
            scheduler: Scheduler::new(),
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Start the scheduler; renders the auto recipe if the cycle is enabled.
    pub fn start(
        &mut self,
        now_us: u64,
        pixels: &mut impl PixelPort,
        sink: &mut impl EventSink,
    ) -> Option<PhaseChange> {
        let mut delegate = ScheduledLighting {
            light: &mut self.light,
            pixels,
            sink,
        };
        self.scheduler.start(now_us, &self.settings, &mut delegate)
    }

    /// Advance the scheduler. Call once per loop iteration.
    pub fn tick(
        &mut self,
        now_us: u64,
        pixels: &mut impl PixelPort,
        sink: &mut impl EventSink,
    ) -> Option<PhaseChange> {
        let mut delegate = ScheduledLighting {
            light: &mut self.light,
            pixels,
            sink,
        };
        self.scheduler.tick(now_us, &self.settings, &mut delegate)
    }

    // ── Write handling ────────────────────────────────────────

    /// Decode and apply one control-point write.
    ///
    /// Nothing is mutated unless the payload is valid.
    pub fn handle_write(
        &mut self,
        point: ControlPoint,
        data: &[u8],
        pixels: &mut impl PixelPort,
        store: &mut impl SettingsPort,
        sink: &mut impl EventSink,
    ) -> Result<WriteOutcome> {
        match decode_write(point, data)? {
            Request::SelectRecipe(code) => {
                let result = self.light.apply_recipe(code, Source::Manual, pixels);
                report_write(&self.light, result, sink)?;
                Ok(WriteOutcome::default())
            }
            Request::CustomColor(c) => {
                let result = self.light.apply_custom(
                    i32::from(c.r),
                    i32::from(c.g),
                    i32::from(c.b),
                    i32::from(c.w),
                    pixels,
                );
                report_write(&self.light, result, sink)?;
                Ok(WriteOutcome::default())
            }
            Request::Command(cmd) => self.handle_command(cmd, pixels, store, sink),
        }
    }

    /// Process a control command.
    pub fn handle_command(
        &mut self,
        cmd: ControlCommand,
        pixels: &mut impl PixelPort,
        store: &mut impl SettingsPort,
        sink: &mut impl EventSink,
    ) -> Result<WriteOutcome> {
        match cmd {
            ControlCommand::Off => self.apply_manual(RecipeId::Off, pixels, sink)?,
            ControlCommand::On => self.apply_manual(self.settings.auto_recipe, pixels, sink)?,
            ControlCommand::SetSchedule {
                on_hours,
                off_hours,
            } => self.update_settings(store, sink, |s| {
                s.on_duration_hours = on_hours;
                s.off_duration_hours = off_hours;
            })?,
            ControlCommand::SetAutoRecipe(code) => {
                let recipe = RecipeId::from_code(code)?;
                self.update_settings(store, sink, |s| s.auto_recipe = recipe)?;
            }
            ControlCommand::SetAutoEnabled(enabled) => {
                self.update_settings(store, sink, |s| s.auto_cycle_enabled = enabled)?;
            }
            ControlCommand::GetSettings => {}
        }
        Ok(WriteOutcome {
            notify_settings: matches!(cmd, ControlCommand::GetSettings) || cmd.mutates_settings(),
        })
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn light_state(&self) -> AppliedLightState {
        self.light.current_state()
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    // ── Internal ──────────────────────────────────────────────

    fn apply_manual(
        &mut self,
        recipe: RecipeId,
        pixels: &mut impl PixelPort,
        sink: &mut impl EventSink,
    ) -> core::result::Result<(), RenderFailure> {
        let result = self.light.apply(recipe, Source::Manual, pixels);
        report_render(&self.light, result, sink);
        result
    }

    fn update_settings(
        &mut self,
        store: &mut impl SettingsPort,
        sink: &mut impl EventSink,
        change: impl FnOnce(&mut Settings),
    ) -> Result<()> {
        let mut candidate = self.settings;
        change(&mut candidate);
        let candidate = candidate.clamped();

        if let Err(e) = store.save(&candidate) {
            sink.emit(&AppEvent::PersistFailed(e));
            return Err(e.into());
        }
        self.settings = candidate;
        sink.emit(&AppEvent::SettingsSaved(candidate));
        Ok(())
    }
}

fn report_render(
    light: &LightEngine,
    result: core::result::Result<(), RenderFailure>,
    sink: &mut impl EventSink,
) {
    match result {
        Ok(()) => sink.emit(&AppEvent::LightApplied(light.current_state())),
        Err(e) => sink.emit(&AppEvent::RenderFailed(e)),
    }
}

/// Like [`report_render`], but validation errors stay silent: they never
/// reached the strip.
fn report_write(light: &LightEngine, result: Result<()>, sink: &mut impl EventSink) -> Result<()> {
    match result {
        Ok(()) => sink.emit(&AppEvent::LightApplied(light.current_state())),
        Err(Error::Render(e)) => sink.emit(&AppEvent::RenderFailed(e)),
        Err(_) => {}
    }
    result
}

// ───────────────────────────────────────────────────────────────
// Scheduler delegate
// ───────────────────────────────────────────────────────────────

/// Bridges scheduler phase entries to the light engine.
struct ScheduledLighting<'a, P, E> {
    light: &'a mut LightEngine,
    pixels: &'a mut P,
    sink: &'a mut E,
}

impl<P: PixelPort, E: EventSink> SchedulerDelegate for ScheduledLighting<'_, P, E> {
    fn light_on(&mut self, recipe: RecipeId) {
        let result = self.light.apply(recipe, Source::Scheduled, self.pixels);
        report_render(self.light, result, self.sink);
    }

    fn light_off(&mut self) {
        let result = self.light.turn_off(Source::Scheduled, self.pixels);
        report_render(self.light, result, self.sink);
    }

    fn phase_changed(&mut self, change: PhaseChange) {
        self.sink.emit(&AppEvent::PhaseChanged(change));
    }
}
