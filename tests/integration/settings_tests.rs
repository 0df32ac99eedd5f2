//! Settings persistence across boots.

use crate::mock_hw::{MockBle, MockStore, boot_with_store, deliver, write};
use growlight::app::events::AppEvent;
use growlight::config::Settings;
use growlight::connection::PeerHandle;
use growlight::events::TransportEvent;
use growlight::protocol::ControlPoint::ControlCommand;
use growlight::protocol::ProtocolStatus;
use growlight::recipes::RecipeId;

fn started(events: &[AppEvent]) -> Option<(Settings, bool)> {
    events.iter().find_map(|e| match e {
        AppEvent::Started { settings, restored } => Some((*settings, *restored)),
        _ => None,
    })
}

#[test]
fn empty_store_boots_with_defaults() {
    let rt = boot_with_store(MockStore::default(), MockBle::default());
    assert_eq!(*rt.app().settings(), Settings::default());
    assert_eq!(
        started(&rt.ports().sink.events),
        Some((Settings::default(), false))
    );
    // Defaults are never written back.
    assert_eq!(rt.ports().store.saves, 0);
    assert!(rt.ports().store.stored().is_none());
}

#[test]
fn corrupted_store_boots_with_defaults() {
    let mut store = MockStore::with(Settings::new(2, 2, RecipeId::Warm, false));
    store.corrupted = true;
    let rt = boot_with_store(store, MockBle::default());
    assert_eq!(*rt.app().settings(), Settings::default());
    assert_eq!(started(&rt.ports().sink.events).map(|s| s.1), Some(false));
}

#[test]
fn persisted_settings_win_after_reboot() {
    let mut rt = boot_with_store(MockStore::default(), MockBle::default());
    deliver(&mut rt, 0, TransportEvent::Connected(PeerHandle(1)));
    assert_eq!(
        write(&mut rt, 1, ControlCommand, &[0x02, 20, 4]),
        ProtocolStatus::Success
    );
    assert_eq!(
        write(&mut rt, 1, ControlCommand, &[0x03, RecipeId::Bloom.code()]),
        ProtocolStatus::Success
    );
    assert_eq!(
        write(&mut rt, 1, ControlCommand, &[0x04, 0]),
        ProtocolStatus::Success
    );

    let store = rt.into_ports().store.reboot();
    let rt = boot_with_store(store, MockBle::default());
    let expected = Settings::new(20, 4, RecipeId::Bloom, false);
    assert_eq!(*rt.app().settings(), expected);
    assert_eq!(started(&rt.ports().sink.events), Some((expected, true)));
    assert_eq!(
        rt.ports().ble.value(ControlCommand),
        &[0x8C, 20, 4, RecipeId::Bloom.code(), 0]
    );
}

#[test]
fn failed_save_leaves_flash_and_memory_untouched() {
    let before = Settings::new(12, 12, RecipeId::Cool, true);
    let mut rt = boot_with_store(MockStore::with(before), MockBle::default());
    deliver(&mut rt, 0, TransportEvent::Connected(PeerHandle(1)));
    rt.ports_mut().store.fail_writes = true;

    assert_eq!(
        write(&mut rt, 1, ControlCommand, &[0x02, 1, 1]),
        ProtocolStatus::PersistFailure
    );
    assert_eq!(*rt.app().settings(), before);

    let store = rt.into_ports().store.reboot();
    let rt = boot_with_store(store, MockBle::default());
    assert_eq!(*rt.app().settings(), before);
}

#[test]
fn redundant_update_still_saves() {
    let mut rt = boot_with_store(MockStore::default(), MockBle::default());
    deliver(&mut rt, 0, TransportEvent::Connected(PeerHandle(1)));
    assert_eq!(
        write(&mut rt, 1, ControlCommand, &[0x02, 16, 8]),
        ProtocolStatus::Success
    );
    assert_eq!(rt.ports().store.saves, 1);
    assert_eq!(rt.ports().store.stored(), Some(Settings::default()));
}
