//! System configuration parameters
//!
//! [`Settings`] is the only field-writable configuration and lives in NVS.
//! Everything else here is compiled in per build.

use core::time::Duration;

use serde::{Deserialize, Serialize};

use crate::recipes::RecipeId;

/// Upper bound for either photoperiod phase.
pub const MAX_PHASE_HOURS: u8 = 24;

const SECS_PER_HOUR: u64 = 3600;

/// Durable photoperiod settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Length of the lit phase (0-24 h)
    pub on_duration_hours: u8,
    /// Length of the dark phase (0-24 h)
    pub off_duration_hours: u8,
    /// Recipe rendered when the scheduler enters the lit phase
    pub auto_recipe: RecipeId,
    /// Whether the scheduler runs at all
    pub auto_cycle_enabled: bool,
}

impl Settings {
    /// Build settings with each duration clamped to `[0, 24]`.
    pub fn new(on_hours: u8, off_hours: u8, auto_recipe: RecipeId, enabled: bool) -> Self {
        Self {
            on_duration_hours: on_hours,
            off_duration_hours: off_hours,
            auto_recipe,
            auto_cycle_enabled: enabled,
        }
        .clamped()
    }

    #[must_use]
    pub fn clamped(self) -> Self {
        Self {
            on_duration_hours: self.on_duration_hours.min(MAX_PHASE_HOURS),
            off_duration_hours: self.off_duration_hours.min(MAX_PHASE_HOURS),
            ..self
        }
    }

    pub fn on_duration(&self) -> Duration {
        hours(self.on_duration_hours)
    }

    pub fn off_duration(&self) -> Duration {
        hours(self.off_duration_hours)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            on_duration_hours: 16,
            off_duration_hours: 8,
            auto_recipe: RecipeId::VegGrowth,
            auto_cycle_enabled: true,
        }
    }
}

fn hours(h: u8) -> Duration {
    Duration::from_secs(u64::from(h) * SECS_PER_HOUR)
}

/// Strip wiring.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HardwareConfig {
    /// GPIO driving the strip data line
    pub led_gpio: i32,
    /// Number of RGBW pixels on the strip
    pub pixel_count: usize,
}

impl Default for HardwareConfig {
    fn default() -> Self {
        Self {
            led_gpio: 5,
            pixel_count: 96,
        }
    }
}

/// Run-loop and liveness timing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Period of one loop iteration (milliseconds)
    pub loop_interval_ms: u32,
    /// Task watchdog deadline (milliseconds)
    pub watchdog_timeout_ms: u32,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            loop_interval_ms: 200,
            watchdog_timeout_ms: 8000,
        }
    }
}

/// Advertised identity shared by every compatible unit.
pub const DEVICE_NAME_PREFIX: &str = "PicoLight";

/// Advertising interval (milliseconds).
pub const ADV_INTERVAL_MS: u32 = 100;
