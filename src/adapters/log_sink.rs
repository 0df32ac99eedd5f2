//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to UART / USB-CDC in production).
//! Every line starts with a fixed tag so the console can be grepped.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::light_engine::{AppliedLightState, Selection};
use crate::app::ports::EventSink;
use crate::config::Settings;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started { settings, restored } => {
                info!(
                    "START | restored={} | {}",
                    restored,
                    SettingsFields(settings)
                );
            }
            AppEvent::LightApplied(state) => {
                info!("LIGHT | {}", LightFields(state));
            }
            AppEvent::PhaseChanged(change) => {
                info!("PHASE | {:?} -> {:?}", change.from, change.to);
            }
            AppEvent::SettingsSaved(settings) => {
                info!("SAVE  | {}", SettingsFields(settings));
            }
            AppEvent::PersistFailed(e) => {
                warn!("SAVE  | failed: {}", e);
            }
            AppEvent::RenderFailed(e) => {
                warn!("LIGHT | render failed: {}", e);
            }
            AppEvent::WriteRejected {
                point,
                status,
                error,
            } => {
                warn!(
                    "WRITE | point={} status=0x{:02X} error={}",
                    point.name(),
                    status.code(),
                    error
                );
            }
            AppEvent::WriteNotPermitted { peer, point } => {
                warn!("WRITE | point={} peer={} not permitted", point.name(), peer.0);
            }
            AppEvent::SessionOpened(peer) => info!("LINK  | open peer={}", peer.0),
            AppEvent::SessionClosed(peer) => info!("LINK  | closed peer={}", peer.0),
            AppEvent::SessionRejected(peer) => info!("LINK  | rejected peer={}", peer.0),
            AppEvent::AdvertisingStarted => info!("ADV   | started"),
            AppEvent::AdvertisingFailed => warn!("ADV   | failed, retrying"),
        }
    }
}

struct SettingsFields<'a>(&'a Settings);

impl core::fmt::Display for SettingsFields<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = self.0;
        write!(
            f,
            "on={}h off={}h recipe={} auto={}",
            s.on_duration_hours, s.off_duration_hours, s.auto_recipe, s.auto_cycle_enabled
        )
    }
}

struct LightFields<'a>(&'a AppliedLightState);

impl core::fmt::Display for LightFields<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = self.0;
        match s.selection {
            Selection::Recipe(id) => write!(f, "recipe={}", id)?,
            Selection::Custom => write!(f, "custom")?,
        }
        write!(f, " color={} source={:?}", s.frame, s.source)
    }
}
