//! Mock adapters for integration tests.
//!
//! Every port records what the run loop asked of it so tests can assert
//! on the full history without touching real RMT, NVS, or radio hardware.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use growlight::app::events::AppEvent;
use growlight::app::ports::{
    AdvertisingError, AdvertisingPort, EventSink, LivenessPort, LoadError, PixelPort,
    ResponderPort, SettingsPort,
};
use growlight::app::runtime::{Ports, Runtime};
use growlight::config::{HardwareConfig, Settings};
use growlight::connection::PeerHandle;
use growlight::error::{Error, PersistFailure, RenderFailure};
use growlight::events::{EventQueue, TransportEvent, WriteRequest, push_event};
use growlight::protocol::{ControlPoint, ProtocolStatus};
use growlight::recipes::Rgbw;

pub const PIXELS: usize = 4;
pub const HOUR_US: u64 = 3_600_000_000;

// ── MockPixels ────────────────────────────────────────────────

#[derive(Default)]
pub struct MockPixels {
    pub frames: Vec<Vec<Rgbw>>,
    pub fail: bool,
}

#[allow(dead_code)]
impl MockPixels {
    /// Colour of the last frame accepted (all pixels are equal).
    pub fn showing(&self) -> Option<Rgbw> {
        self.frames.last().and_then(|f| f.first().copied())
    }
}

impl PixelPort for MockPixels {
    fn render(&mut self, frame: &[Rgbw]) -> Result<(), RenderFailure> {
        if self.fail {
            return Err(RenderFailure::Transmit);
        }
        self.frames.push(frame.to_vec());
        Ok(())
    }
}

// ── MockStore ─────────────────────────────────────────────────

/// Flash contents survive a simulated reboot through [`MockStore::reboot`].
#[derive(Default)]
pub struct MockStore {
    flash: Rc<RefCell<Option<Settings>>>,
    pub fail_writes: bool,
    pub corrupted: bool,
    pub saves: u32,
}

#[allow(dead_code)]
impl MockStore {
    pub fn with(settings: Settings) -> Self {
        let store = Self::default();
        *store.flash.borrow_mut() = Some(settings);
        store
    }

    /// A fresh store backed by the same flash.
    pub fn reboot(&self) -> Self {
        Self {
            flash: Rc::clone(&self.flash),
            ..Self::default()
        }
    }

    pub fn stored(&self) -> Option<Settings> {
        *self.flash.borrow()
    }
}

impl SettingsPort for MockStore {
    fn load_saved(&self) -> Result<Option<Settings>, LoadError> {
        if self.corrupted {
            return Err(LoadError::Corrupted);
        }
        Ok(*self.flash.borrow())
    }

    fn save(&mut self, settings: &Settings) -> Result<(), PersistFailure> {
        if self.fail_writes {
            return Err(PersistFailure::Io(-1));
        }
        *self.flash.borrow_mut() = Some(*settings);
        self.saves += 1;
        Ok(())
    }
}

// ── MockBle ───────────────────────────────────────────────────

#[derive(Default)]
pub struct MockBle {
    pub adv_failures_left: u32,
    pub adv_starts: u32,
    pub responses: Vec<(u32, ProtocolStatus)>,
    pub values: HashMap<ControlPoint, Vec<u8>>,
    pub notifications: Vec<(PeerHandle, ControlPoint, Vec<u8>)>,
    pub dropped: Vec<PeerHandle>,
}

#[allow(dead_code)]
impl MockBle {
    pub fn value(&self, point: ControlPoint) -> &[u8] {
        self.values.get(&point).map_or(&[], Vec::as_slice)
    }

    pub fn last_status(&self) -> Option<ProtocolStatus> {
        self.responses.last().map(|(_, s)| *s)
    }
}

impl AdvertisingPort for MockBle {
    fn start_advertising(&mut self) -> Result<(), AdvertisingError> {
        self.adv_starts += 1;
        if self.adv_failures_left > 0 {
            self.adv_failures_left -= 1;
            return Err(AdvertisingError::Rejected(-1));
        }
        Ok(())
    }

    fn disconnect(&mut self, peer: PeerHandle) {
        self.dropped.push(peer);
    }
}

impl ResponderPort for MockBle {
    fn respond(&mut self, request: &WriteRequest, status: ProtocolStatus) {
        self.responses.push((request.trans_id, status));
    }

    fn set_value(&mut self, point: ControlPoint, value: &[u8]) {
        self.values.insert(point, value.to_vec());
    }

    fn notify(&mut self, peer: PeerHandle, point: ControlPoint, value: &[u8]) {
        self.notifications.push((peer, point, value.to_vec()));
    }
}

// ── MockWatchdog ──────────────────────────────────────────────

#[derive(Default)]
pub struct MockWatchdog {
    pub armed: bool,
    pub feeds: u32,
    pub fail_arm: bool,
}

impl LivenessPort for MockWatchdog {
    fn arm(&mut self) -> Result<(), Error> {
        if self.fail_arm {
            return Err(Error::Init("task watchdog"));
        }
        self.armed = true;
        Ok(())
    }

    fn feed(&mut self) {
        self.feeds += 1;
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Harness ───────────────────────────────────────────────────

pub type TestPorts = Ports<MockPixels, MockStore, MockBle, MockWatchdog, RecordingSink>;
pub type TestRuntime = Runtime<MockPixels, MockStore, MockBle, MockWatchdog, RecordingSink>;

pub fn hardware() -> HardwareConfig {
    HardwareConfig {
        led_gpio: 5,
        pixel_count: PIXELS,
    }
}

pub fn ports(store: MockStore, ble: MockBle) -> TestPorts {
    Ports {
        pixels: MockPixels::default(),
        store,
        ble,
        watchdog: MockWatchdog::default(),
        sink: RecordingSink::default(),
    }
}

pub fn boot_with_store(store: MockStore, ble: MockBle) -> TestRuntime {
    Runtime::boot(ports(store, ble), &hardware(), 0).expect("boot failed")
}

#[allow(dead_code)]
pub fn boot(settings: Option<Settings>) -> TestRuntime {
    let store = settings.map_or_else(MockStore::default, MockStore::with);
    boot_with_store(store, MockBle::default())
}

/// Queue `event` and run one iteration at `now_us`.
#[allow(dead_code)]
pub fn deliver(rt: &mut TestRuntime, now_us: u64, event: TransportEvent) {
    let queue = EventQueue::new();
    assert!(push_event(&queue, event));
    assert_eq!(rt.run_once(now_us, &queue), 1);
}

/// Deliver a write from `peer` and return the status it was answered with.
#[allow(dead_code)]
pub fn write(
    rt: &mut TestRuntime,
    peer: u16,
    point: ControlPoint,
    data: &[u8],
) -> ProtocolStatus {
    let trans_id = rt.ports().ble.responses.len() as u32 + 1000;
    let request = WriteRequest::new(PeerHandle(peer), point, trans_id, data);
    deliver(rt, 0, TransportEvent::Write(request));
    let (id, status) = *rt
        .ports()
        .ble
        .responses
        .last()
        .expect("write was not answered");
    assert_eq!(id, trans_id);
    status
}

/// Boot and connect peer 1.
#[allow(dead_code)]
pub fn connected(settings: Option<Settings>) -> TestRuntime {
    let mut rt = boot(settings);
    deliver(&mut rt, 0, TransportEvent::Connected(PeerHandle(1)));
    rt
}
