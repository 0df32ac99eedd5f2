//! Outbound application events.
//!
//! The run loop and [`AppService`](super::service::AppService) emit these
//! through the [`EventSink`](super::ports::EventSink) port.  Adapters on
//! the other side decide what to do with them.

use crate::config::Settings;
use crate::connection::PeerHandle;
use crate::error::{Error, PersistFailure, RenderFailure};
use crate::protocol::{ControlPoint, ProtocolStatus};
use crate::scheduler::PhaseChange;

use super::light_engine::AppliedLightState;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// Boot finished. `restored` is false when compiled defaults are in use.
    Started { settings: Settings, restored: bool },

    /// A frame reached the strip.
    LightApplied(AppliedLightState),

    /// The scheduler moved between phases (or went dormant / resumed).
    PhaseChanged(PhaseChange),

    /// A settings mutation was committed to storage.
    SettingsSaved(Settings),

    /// A settings mutation was rolled back because storage failed.
    PersistFailed(PersistFailure),

    /// The pixel driver rejected a frame.
    RenderFailed(RenderFailure),

    /// A write was rejected before any state changed (or rolled back).
    WriteRejected {
        point: ControlPoint,
        status: ProtocolStatus,
        error: Error,
    },

    /// A write arrived from a central that does not own the session.
    WriteNotPermitted { peer: PeerHandle, point: ControlPoint },

    SessionOpened(PeerHandle),
    SessionClosed(PeerHandle),
    /// A second central tried to connect while a session was active.
    SessionRejected(PeerHandle),

    AdvertisingStarted,
    /// Advertising could not be (re)started; retried every iteration.
    AdvertisingFailed,
}
