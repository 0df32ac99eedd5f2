//! Transport → main-loop event queue.
//!
//! BLE stack callbacks run in the Bluedroid task and must not touch
//! application state.  They only push a [`TransportEvent`] here; the run
//! loop drains the queue once per iteration and dispatches synchronously.
//!
//! ```text
//! ┌──────────────┐     ┌──────────────────┐     ┌──────────────┐
//! │ GAP callback │────▶│                  │     │              │
//! │ GATTS connect│────▶│  TRANSPORT_EVENTS│────▶│   Run loop   │
//! │ GATTS write  │────▶│  (bounded MPSC)  │     │  (consumer)  │
//! └──────────────┘     └──────────────────┘     └──────────────┘
//! ```

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::{error, warn};

use crate::connection::PeerHandle;
use crate::protocol::ControlPoint;

/// Maximum number of pending events.
pub const EVENT_QUEUE_DEPTH: usize = 16;

/// Slots writes may never take, so connects and disconnects always fit.
///
/// Bluedroid stops advertising when a central connects and only the run
/// loop restarts it, so one drain interval sees at most a stop, a connect,
/// and two disconnects (the session and a rejected central).
pub const LINK_RESERVE: usize = 4;

/// Pending writes beyond this are refused at the callback.
pub const MAX_PENDING_WRITES: usize = EVENT_QUEUE_DEPTH - LINK_RESERVE;

/// Bytes kept from a single write.
///
/// Longer writes are truncated.  Every valid payload is shorter than
/// this, so a truncated payload is still rejected for its length.
pub const MAX_WRITE_LEN: usize = 8;

pub type WritePayload = heapless::Vec<u8, MAX_WRITE_LEN>;

/// A GATT write waiting for dispatch and a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteRequest {
    pub peer: PeerHandle,
    pub point: ControlPoint,
    /// Stack transaction id, echoed in the response.
    pub trans_id: u32,
    /// Write-with-response; write-without-response needs no reply.
    pub need_rsp: bool,
    pub data: WritePayload,
}

impl WriteRequest {
    pub fn new(peer: PeerHandle, point: ControlPoint, trans_id: u32, data: &[u8]) -> Self {
        let keep = data.len().min(MAX_WRITE_LEN);
        let mut payload = WritePayload::new();
        // Cannot fail: `keep` never exceeds the capacity.
        let _ = payload.extend_from_slice(&data[..keep]);
        Self {
            peer,
            point,
            trans_id,
            need_rsp: true,
            data: payload,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Connected(PeerHandle),
    Disconnected(PeerHandle),
    Write(WriteRequest),
    /// Advertising ended without a connection (or failed to start).
    AdvertisingStopped,
}

pub type EventQueue = Channel<CriticalSectionRawMutex, TransportEvent, EVENT_QUEUE_DEPTH>;

/// Queue fed by the BLE stack callbacks.
pub static TRANSPORT_EVENTS: EventQueue = Channel::new();

/// Push an event. Never blocks.
///
/// Returns `false` if the event was dropped.  Writes are refused once
/// [`MAX_PENDING_WRITES`] events are queued; lifecycle events may use the
/// whole queue.  All pushes come from the single Bluedroid task, so the
/// length check cannot race another producer.
pub fn push_event(queue: &EventQueue, event: TransportEvent) -> bool {
    if matches!(event, TransportEvent::Write(_)) && queue.len() >= MAX_PENDING_WRITES {
        warn!("Event queue busy, refusing write");
        return false;
    }
    match queue.try_send(event) {
        Ok(()) => true,
        Err(_) => {
            error!("Event queue full, dropping lifecycle event");
            false
        }
    }
}

/// Drain all pending events into a callback, in FIFO order.
/// Returns the number of events handled.
pub fn drain_events(queue: &EventQueue, mut handler: impl FnMut(TransportEvent)) -> usize {
    let mut handled = 0;
    while let Ok(event) = queue.try_receive() {
        handler(event);
        handled += 1;
    }
    handled
}
