//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (pixel strip, NVS, BLE stack, watchdog, event sinks)
//! implement these traits.  The [`Runtime`](super::runtime::Runtime) and
//! [`AppService`](super::service::AppService) consume them via generics,
//! so the domain core never touches hardware directly.

use log::warn;

use crate::config::Settings;
use crate::connection::PeerHandle;
use crate::error::{Error, PersistFailure, RenderFailure};
use crate::events::WriteRequest;
use crate::protocol::{ControlPoint, ProtocolStatus};
use crate::recipes::{RecipeId, Rgbw};
use crate::scheduler::PhaseChange;

// ───────────────────────────────────────────────────────────────
// Pixel port (driven adapter: domain → LED strip)
// ───────────────────────────────────────────────────────────────

/// Writes one full frame to the strip.
pub trait PixelPort {
    /// `frame` holds exactly one entry per pixel.
    fn render(&mut self, frame: &[Rgbw]) -> Result<(), RenderFailure>;
}

// ───────────────────────────────────────────────────────────────
// Settings port (driven adapter: domain ↔ persistent settings)
// ───────────────────────────────────────────────────────────────

/// Durable storage for the single [`Settings`] record.
///
/// Writes MUST be atomic: after a failed `save` the previous record is
/// still the one returned by `load_saved`.
pub trait SettingsPort {
    /// The stored record, or `Ok(None)` if nothing was ever saved.
    fn load_saved(&self) -> Result<Option<Settings>, LoadError>;

    /// Persist all four fields in one commit.
    fn save(&mut self, settings: &Settings) -> Result<(), PersistFailure>;

    /// Stored record if it parses cleanly, compiled defaults otherwise.
    ///
    /// Falling back to defaults never writes them back.
    fn load(&self) -> Settings {
        match self.load_saved() {
            Ok(Some(settings)) => settings.clamped(),
            Ok(None) => Settings::default(),
            Err(e) => {
                warn!("Settings: stored record unusable ({}), using defaults", e);
                Settings::default()
            }
        }
    }
}

// ───────────────────────────────────────────────────────────────
// BLE ports (driven adapter: domain → radio)
// ───────────────────────────────────────────────────────────────

/// Controls the link layer: advertising and dropping peers.
pub trait AdvertisingPort {
    fn start_advertising(&mut self) -> Result<(), AdvertisingError>;

    /// Terminate the link to `peer`.
    fn disconnect(&mut self, peer: PeerHandle);
}

/// Answers GATT requests and publishes characteristic values.
pub trait ResponderPort {
    /// Acknowledge or reject a queued write.
    fn respond(&mut self, request: &WriteRequest, status: ProtocolStatus);

    /// Replace the value served on reads of `point`.
    fn set_value(&mut self, point: ControlPoint, value: &[u8]);

    /// Push `value` to `peer` as a notification on `point`.
    fn notify(&mut self, peer: PeerHandle, point: ControlPoint, value: &[u8]);
}

// ───────────────────────────────────────────────────────────────
// Liveness port (driven adapter: domain → task watchdog)
// ───────────────────────────────────────────────────────────────

pub trait LivenessPort {
    /// Subscribe the calling task. Called once before the loop starts.
    ///
    /// An error means the loop would run unguarded; boot must not continue.
    fn arm(&mut self) -> Result<(), Error>;

    /// Prove progress. Called once per loop iteration.
    fn feed(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Scheduler delegate (decouples scheduler from the light engine)
// ───────────────────────────────────────────────────────────────

/// Callback trait the [`Scheduler`](crate::scheduler::Scheduler) invokes
/// when it enters a phase.
///
/// The scheduler only does timing bookkeeping.  The application service
/// implements this by driving the light engine with `Source::Scheduled`.
pub trait SchedulerDelegate {
    /// The lit phase started and should show `recipe`.
    fn light_on(&mut self, recipe: RecipeId);

    /// The dark phase started.
    fn light_off(&mut self);

    /// Called for every transition, including ones that render nothing.
    fn phase_changed(&mut self, change: PhaseChange);
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Why a stored settings record could not be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadError {
    /// Record failed deserialisation.
    Corrupted,
    /// Record was written by an incompatible firmware.
    UnsupportedVersion(u8),
    /// Storage backend error code.
    Io(i32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvertisingError {
    /// GATT registration has not finished yet.
    StackNotReady,
    /// The controller refused the request.
    Rejected(i32),
}

impl core::fmt::Display for LoadError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Corrupted => write!(f, "record corrupted"),
            Self::UnsupportedVersion(v) => write!(f, "unsupported record version {}", v),
            Self::Io(code) => write!(f, "I/O error {}", code),
        }
    }
}

impl core::fmt::Display for AdvertisingError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::StackNotReady => write!(f, "BLE stack not ready"),
            Self::Rejected(code) => write!(f, "controller rejected advertising ({})", code),
        }
    }
}
