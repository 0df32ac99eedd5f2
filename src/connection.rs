//! Connection lifecycle: advertise, hold one session, advertise again.
//!
//! ```text
//!        start / retry ok            connect
//!  Idle ─────────────────▶ Advertising ─────────▶ Connected(peer)
//!   ▲  ◀── start failed ──┘     ▲                     │
//!   │                           └──── disconnect ─────┘
//!   └──────────────── restart failed ─────────────────┘
//! ```
//!
//! Every disconnect cause (explicit close, supervision timeout, link error)
//! arrives as the same event and is handled identically.  Advertising is
//! restarted unconditionally and, if the controller refuses, retried on
//! every loop iteration with no backoff.

use log::debug;

use crate::app::events::AppEvent;
use crate::app::ports::{AdvertisingPort, EventSink};

/// Opaque link identifier assigned by the BLE stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PeerHandle(pub u16);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// Not advertising; a restart is pending.
    Idle,
    Advertising,
    Connected(PeerHandle),
}

/// Result of a connect attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectOutcome {
    Accepted,
    /// A session already exists; the new link was dropped.
    Rejected,
}

pub struct ConnectionManager {
    state: LinkState,
    sessions: u32,
    /// Set while advertising keeps failing, so the streak is reported once.
    retrying: bool,
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self {
            state: LinkState::Idle,
            sessions: 0,
            retrying: false,
        }
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    /// The peer that owns the current session, if any.
    pub fn active_peer(&self) -> Option<PeerHandle> {
        match self.state {
            LinkState::Connected(peer) => Some(peer),
            _ => None,
        }
    }

    /// Sessions accepted since boot.
    pub fn sessions(&self) -> u32 {
        self.sessions
    }

    /// Begin advertising. Failure leaves the manager idle for [`poll`](Self::poll).
    pub fn start(&mut self, radio: &mut impl AdvertisingPort, sink: &mut impl EventSink) {
        self.advertise(radio, sink);
    }

    /// Retry advertising if a previous attempt failed.
    pub fn poll(&mut self, radio: &mut impl AdvertisingPort, sink: &mut impl EventSink) {
        if self.state == LinkState::Idle {
            self.advertise(radio, sink);
        }
    }

    pub fn on_connect(
        &mut self,
        peer: PeerHandle,
        radio: &mut impl AdvertisingPort,
        sink: &mut impl EventSink,
    ) -> ConnectOutcome {
        if let LinkState::Connected(current) = self.state {
            debug!("BLE: peer {} arrived while {} holds the session", peer.0, current.0);
            radio.disconnect(peer);
            sink.emit(&AppEvent::SessionRejected(peer));
            return ConnectOutcome::Rejected;
        }
        self.state = LinkState::Connected(peer);
        self.sessions = self.sessions.wrapping_add(1);
        sink.emit(&AppEvent::SessionOpened(peer));
        ConnectOutcome::Accepted
    }

    /// Returns `true` if this ended the active session.
    ///
    /// Disconnects of peers that never owned the session (for example a
    /// rejected second central) are ignored.
    pub fn on_disconnect(
        &mut self,
        peer: PeerHandle,
        radio: &mut impl AdvertisingPort,
        sink: &mut impl EventSink,
    ) -> bool {
        if self.active_peer() != Some(peer) {
            return false;
        }
        sink.emit(&AppEvent::SessionClosed(peer));
        self.advertise(radio, sink);
        true
    }

    /// The stack reported that advertising stopped without a connection.
    pub fn on_advertising_stopped(&mut self, sink: &mut impl EventSink) {
        if self.state == LinkState::Advertising {
            self.state = LinkState::Idle;
            self.retrying = true;
            sink.emit(&AppEvent::AdvertisingFailed);
        }
    }

    fn advertise(&mut self, radio: &mut impl AdvertisingPort, sink: &mut impl EventSink) {
        match radio.start_advertising() {
            Ok(()) => {
                self.state = LinkState::Advertising;
                self.retrying = false;
                sink.emit(&AppEvent::AdvertisingStarted);
            }
            Err(e) => {
                if !self.retrying {
                    debug!("BLE: start_advertising returned {}", e);
                    sink.emit(&AppEvent::AdvertisingFailed);
                }
                self.retrying = true;
                self.state = LinkState::Idle;
            }
        }
    }
}
