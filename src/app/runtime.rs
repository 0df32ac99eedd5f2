//! Run loop: the single thread that owns all mutable state.
//!
//! Each iteration does the same four things in order:
//!
//! ```text
//!  ┌─ drain TRANSPORT_EVENTS ─▶ connect / disconnect / write dispatch
//!  ├─ ConnectionManager::poll ─▶ advertising retry
//!  ├─ AppService::tick ────────▶ photoperiod transitions
//!  └─ LivenessPort::feed
//! ```
//!
//! After every dispatched event and every tick the characteristic values
//! are republished if they changed, so a read never sees stale state.

use embedded_hal::delay::DelayNs;
use log::info;

use crate::config::{HardwareConfig, Settings};
use crate::connection::{ConnectOutcome, ConnectionManager};
use crate::error::Result;
use crate::events::{EventQueue, TransportEvent, WriteRequest, drain_events};
use crate::protocol::codec::{encode_color, encode_recipe, encode_settings};
use crate::protocol::{ControlPoint, ProtocolStatus};

use super::events::AppEvent;
use super::light_engine::AppliedLightState;
use super::ports::{
    AdvertisingPort, EventSink, LivenessPort, PixelPort, ResponderPort, SettingsPort,
};
use super::service::AppService;

/// Every adapter the loop drives.
pub struct Ports<P, S, B, W, E> {
    pub pixels: P,
    pub store: S,
    pub ble: B,
    pub watchdog: W,
    pub sink: E,
}

pub struct Runtime<P, S, B, W, E> {
    app: AppService,
    connection: ConnectionManager,
    ports: Ports<P, S, B, W, E>,
    /// Last values handed to the responder.
    published: Option<(AppliedLightState, Settings)>,
}

impl<P, S, B, W, E> Runtime<P, S, B, W, E>
where
    P: PixelPort,
    S: SettingsPort,
    B: AdvertisingPort + ResponderPort,
    W: LivenessPort,
    E: EventSink,
{
    /// Boot sequence: settings, first render, advertising, watchdog.
    ///
    /// Fails only if the watchdog cannot be armed.
    pub fn boot(
        mut ports: Ports<P, S, B, W, E>,
        hardware: &HardwareConfig,
        now_us: u64,
    ) -> Result<Self> {
        let restored = matches!(ports.store.load_saved(), Ok(Some(_)));
        let settings = ports.store.load();
        ports.sink.emit(&AppEvent::Started { settings, restored });

        let mut app = AppService::new(settings, hardware.pixel_count);
        app.start(now_us, &mut ports.pixels, &mut ports.sink);

        let mut runtime = Self {
            app,
            connection: ConnectionManager::new(),
            ports,
            published: None,
        };
        runtime.publish_values();
        runtime
            .connection
            .start(&mut runtime.ports.ble, &mut runtime.ports.sink);
        runtime.ports.watchdog.arm()?;
        Ok(runtime)
    }

    /// One loop iteration. Returns the number of transport events handled.
    pub fn run_once(&mut self, now_us: u64, queue: &EventQueue) -> usize {
        let handled = drain_events(queue, |event| self.dispatch(event));

        self.connection
            .poll(&mut self.ports.ble, &mut self.ports.sink);

        self.app
            .tick(now_us, &mut self.ports.pixels, &mut self.ports.sink);
        self.publish_values();

        self.ports.watchdog.feed();
        handled
    }

    /// Run the loop at a fixed cadence. Never returns.
    pub fn run_forever(
        &mut self,
        queue: &EventQueue,
        now_us: impl Fn() -> u64,
        delay: &mut impl DelayNs,
        interval_ms: u32,
    ) -> ! {
        info!("Run loop: {} ms cadence", interval_ms);
        loop {
            let started = now_us();
            self.run_once(started, queue);
            let spent_ms = now_us().saturating_sub(started) / 1000;
            delay.delay_ms(sleep_budget(interval_ms, spent_ms));
        }
    }

    // ── Accessors ─────────────────────────────────────────────

    pub fn app(&self) -> &AppService {
        &self.app
    }

    pub fn connection(&self) -> &ConnectionManager {
        &self.connection
    }

    pub fn ports(&self) -> &Ports<P, S, B, W, E> {
        &self.ports
    }

    pub fn ports_mut(&mut self) -> &mut Ports<P, S, B, W, E> {
        &mut self.ports
    }

    pub fn into_ports(self) -> Ports<P, S, B, W, E> {
        self.ports
    }

    // ── Dispatch ──────────────────────────────────────────────

    fn dispatch(&mut self, event: TransportEvent) {
        let ports = &mut self.ports;
        match event {
            TransportEvent::Connected(peer) => {
                let outcome = self
                    .connection
                    .on_connect(peer, &mut ports.ble, &mut ports.sink);
                if outcome == ConnectOutcome::Accepted {
                    // Fresh session: make sure the cache is complete.
                    self.published = None;
                }
            }
            TransportEvent::Disconnected(peer) => {
                self.connection
                    .on_disconnect(peer, &mut ports.ble, &mut ports.sink);
            }
            TransportEvent::AdvertisingStopped => {
                self.connection.on_advertising_stopped(&mut ports.sink);
            }
            TransportEvent::Write(request) => self.handle_write(&request),
        }
        self.publish_values();
    }

    fn handle_write(&mut self, request: &WriteRequest) {
        let ports = &mut self.ports;

        if self.connection.active_peer() != Some(request.peer) {
            ports.sink.emit(&AppEvent::WriteNotPermitted {
                peer: request.peer,
                point: request.point,
            });
            respond(&mut ports.ble, request, ProtocolStatus::WriteNotPermitted);
            return;
        }

        let result = self.app.handle_write(
            request.point,
            &request.data,
            &mut ports.pixels,
            &mut ports.store,
            &mut ports.sink,
        );
        match result {
            Ok(outcome) => {
                respond(&mut ports.ble, request, ProtocolStatus::Success);
                if outcome.notify_settings {
                    let record = encode_settings(self.app.settings());
                    ports
                        .ble
                        .set_value(ControlPoint::ControlCommand, &record);
                    ports
                        .ble
                        .notify(request.peer, ControlPoint::ControlCommand, &record);
                }
            }
            Err(error) => {
                let status = ProtocolStatus::from(&error);
                ports.sink.emit(&AppEvent::WriteRejected {
                    point: request.point,
                    status,
                    error,
                });
                respond(&mut ports.ble, request, status);
            }
        }
    }

    /// Push changed characteristic values to the responder's read cache.
    fn publish_values(&mut self) {
        let current = (self.app.light_state(), *self.app.settings());
        if self.published == Some(current) {
            return;
        }
        let (light, settings) = current;
        let ble = &mut self.ports.ble;
        ble.set_value(ControlPoint::RecipeSelect, &encode_recipe(&light));
        ble.set_value(ControlPoint::CustomColor, &encode_color(&light));
        ble.set_value(ControlPoint::ControlCommand, &encode_settings(&settings));
        self.published = Some(current);
    }
}

fn respond(ble: &mut impl ResponderPort, request: &WriteRequest, status: ProtocolStatus) {
    if request.need_rsp {
        ble.respond(request, status);
    }
}

/// Milliseconds left to sleep in an iteration of `interval_ms`.
///
/// Never returns zero so lower-priority tasks always get the CPU.
pub fn sleep_budget(interval_ms: u32, spent_ms: u64) -> u32 {
    let spent = u32::try_from(spent_ms).unwrap_or(u32::MAX);
    interval_ms.saturating_sub(spent).max(1)
}
