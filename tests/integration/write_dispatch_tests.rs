//! Control-point writes end to end: queue → dispatch → response → read cache.

use crate::mock_hw::{PIXELS, connected, deliver, write};
use growlight::app::events::AppEvent;
use growlight::app::light_engine::{Selection, Source};
use growlight::config::Settings;
use growlight::connection::PeerHandle;
use growlight::events::{TransportEvent, WriteRequest};
use growlight::protocol::ControlPoint::{ControlCommand, CustomColor, RecipeSelect};
use growlight::protocol::ProtocolStatus;
use growlight::recipes::{RecipeId, Rgbw};

// ── Recipe select ─────────────────────────────────────────────

#[test]
fn recipe_write_renders_and_updates_reads() {
    let mut rt = connected(None);
    assert_eq!(write(&mut rt, 1, RecipeSelect, &[5]), ProtocolStatus::Success);

    let ports = rt.ports();
    assert_eq!(ports.pixels.showing(), Some(RecipeId::Bloom.color()));
    assert_eq!(ports.pixels.frames.last().unwrap().len(), PIXELS);
    assert_eq!(ports.ble.value(RecipeSelect), &[5]);
    assert_eq!(
        ports.ble.value(CustomColor),
        &RecipeId::Bloom.color().to_bytes()
    );
    assert_eq!(rt.app().light_state().source, Source::Manual);
}

#[test]
fn unknown_recipe_is_rejected_without_render() {
    let mut rt = connected(None);
    let frames = rt.ports().pixels.frames.len();
    let before = rt.app().light_state();

    assert_eq!(
        write(&mut rt, 1, RecipeSelect, &[16]),
        ProtocolStatus::InvalidRecipe
    );
    assert_eq!(rt.ports().pixels.frames.len(), frames);
    assert_eq!(rt.app().light_state(), before);
    assert_eq!(
        rt.ports().sink.count(|e| matches!(
            e,
            AppEvent::WriteRejected {
                status: ProtocolStatus::InvalidRecipe,
                ..
            }
        )),
        1
    );
}

#[test]
fn recipe_write_must_be_one_byte() {
    let mut rt = connected(None);
    assert_eq!(
        write(&mut rt, 1, RecipeSelect, &[]),
        ProtocolStatus::InvalidLength
    );
    assert_eq!(
        write(&mut rt, 1, RecipeSelect, &[1, 2]),
        ProtocolStatus::InvalidLength
    );
}

// ── Custom colour ─────────────────────────────────────────────

#[test]
fn custom_color_write_uses_sentinel_on_recipe_read() {
    let mut rt = connected(None);
    assert_eq!(
        write(&mut rt, 1, CustomColor, &[10, 20, 30, 40]),
        ProtocolStatus::Success
    );

    let ports = rt.ports();
    assert_eq!(ports.pixels.showing(), Some(Rgbw::new(10, 20, 30, 40)));
    assert_eq!(ports.ble.value(RecipeSelect), &[0xFF]);
    assert_eq!(ports.ble.value(CustomColor), &[10, 20, 30, 40]);
    assert_eq!(rt.app().light_state().selection, Selection::Custom);
}

#[test]
fn custom_color_wrong_length_changes_nothing() {
    let mut rt = connected(None);
    let frames = rt.ports().pixels.frames.len();
    assert_eq!(
        write(&mut rt, 1, CustomColor, &[1, 2, 3]),
        ProtocolStatus::InvalidLength
    );
    assert_eq!(
        write(&mut rt, 1, CustomColor, &[1, 2, 3, 4, 5]),
        ProtocolStatus::InvalidLength
    );
    assert_eq!(rt.ports().pixels.frames.len(), frames);
}

// ── Control commands ──────────────────────────────────────────

#[test]
fn off_then_on_uses_auto_recipe() {
    let settings = Settings::new(16, 8, RecipeId::Aquarium, true);
    let mut rt = connected(Some(settings));

    assert_eq!(write(&mut rt, 1, ControlCommand, &[0x00]), ProtocolStatus::Success);
    assert_eq!(rt.ports().pixels.showing(), Some(Rgbw::OFF));
    assert_eq!(rt.ports().ble.value(RecipeSelect), &[RecipeId::Off.code()]);

    assert_eq!(write(&mut rt, 1, ControlCommand, &[0x01]), ProtocolStatus::Success);
    assert_eq!(rt.ports().pixels.showing(), Some(RecipeId::Aquarium.color()));
    assert_eq!(rt.app().light_state().source, Source::Manual);
}

#[test]
fn off_twice_is_idempotent() {
    let mut rt = connected(None);
    assert_eq!(write(&mut rt, 1, ControlCommand, &[0x00]), ProtocolStatus::Success);
    let first = rt.app().light_state();
    assert_eq!(write(&mut rt, 1, ControlCommand, &[0x00]), ProtocolStatus::Success);

    assert_eq!(rt.app().light_state(), first);
    assert_eq!(first.selection, Selection::Recipe(RecipeId::Off));
    assert_eq!(rt.ports().pixels.showing(), Some(Rgbw::OFF));
    assert_eq!(rt.ports().ble.value(RecipeSelect), &[RecipeId::Off.code()]);
}

#[test]
fn get_settings_notifies_record_without_saving() {
    let mut rt = connected(None);
    assert_eq!(write(&mut rt, 1, ControlCommand, &[0x0C]), ProtocolStatus::Success);

    let ports = rt.ports();
    assert_eq!(
        ports.ble.notifications,
        vec![(PeerHandle(1), ControlCommand, vec![0x8C, 16, 8, 4, 1])]
    );
    assert_eq!(ports.store.saves, 0);
}

#[test]
fn set_schedule_persists_and_notifies() {
    let mut rt = connected(None);
    assert_eq!(
        write(&mut rt, 1, ControlCommand, &[0x02, 12, 12]),
        ProtocolStatus::Success
    );

    let ports = rt.ports();
    let stored = ports.store.stored().unwrap();
    assert_eq!((stored.on_duration_hours, stored.off_duration_hours), (12, 12));
    assert_eq!(*rt.app().settings(), stored);
    assert_eq!(ports.ble.value(ControlCommand), &[0x8C, 12, 12, 4, 1]);
    assert_eq!(
        ports.ble.notifications.last().map(|n| n.2.clone()),
        Some(vec![0x8C, 12, 12, 4, 1])
    );
}

#[test]
fn schedule_hours_above_24_are_rejected() {
    let mut rt = connected(None);
    assert_eq!(
        write(&mut rt, 1, ControlCommand, &[0x02, 25, 1]),
        ProtocolStatus::ValueNotAllowed
    );
    assert_eq!(
        write(&mut rt, 1, ControlCommand, &[0x02, 1, 200]),
        ProtocolStatus::ValueNotAllowed
    );
    assert_eq!(rt.ports().store.saves, 0);
    assert!(rt.ports().ble.notifications.is_empty());
    assert_eq!(*rt.app().settings(), Settings::default());
}

#[test]
fn auto_recipe_is_validated_against_table() {
    let mut rt = connected(None);
    assert_eq!(
        write(&mut rt, 1, ControlCommand, &[0x03, 16]),
        ProtocolStatus::InvalidRecipe
    );
    assert_eq!(rt.ports().store.saves, 0);

    assert_eq!(write(&mut rt, 1, ControlCommand, &[0x03, 9]), ProtocolStatus::Success);
    assert_eq!(rt.app().settings().auto_recipe, RecipeId::Sunrise);
    assert_eq!(rt.ports().store.stored().unwrap().auto_recipe, RecipeId::Sunrise);
}

#[test]
fn auto_enabled_accepts_only_zero_or_one() {
    let mut rt = connected(None);
    assert_eq!(
        write(&mut rt, 1, ControlCommand, &[0x04, 2]),
        ProtocolStatus::ValueNotAllowed
    );
    assert_eq!(write(&mut rt, 1, ControlCommand, &[0x04, 0]), ProtocolStatus::Success);
    assert!(!rt.app().settings().auto_cycle_enabled);
}

#[test]
fn unknown_and_malformed_commands() {
    let mut rt = connected(None);
    assert_eq!(
        write(&mut rt, 1, ControlCommand, &[0x7F]),
        ProtocolStatus::UnknownCommand
    );
    assert_eq!(
        write(&mut rt, 1, ControlCommand, &[]),
        ProtocolStatus::InvalidLength
    );
    assert_eq!(
        write(&mut rt, 1, ControlCommand, &[0x00, 0x00]),
        ProtocolStatus::InvalidLength
    );
    assert_eq!(
        write(&mut rt, 1, ControlCommand, &[0x02, 12]),
        ProtocolStatus::InvalidLength
    );
}

// ── Failure paths ─────────────────────────────────────────────

#[test]
fn failed_save_rolls_back_and_skips_notify() {
    let mut rt = connected(None);
    rt.ports_mut().store.fail_writes = true;

    assert_eq!(
        write(&mut rt, 1, ControlCommand, &[0x04, 0]),
        ProtocolStatus::PersistFailure
    );
    assert!(rt.app().settings().auto_cycle_enabled);
    assert!(rt.ports().store.stored().is_none());
    assert!(rt.ports().ble.notifications.is_empty());
    assert_eq!(
        rt.ports()
            .sink
            .count(|e| matches!(e, AppEvent::PersistFailed(_))),
        1
    );
}

#[test]
fn render_failure_keeps_previous_state() {
    let mut rt = connected(None);
    let before = rt.app().light_state();
    rt.ports_mut().pixels.fail = true;

    assert_eq!(
        write(&mut rt, 1, RecipeSelect, &[3]),
        ProtocolStatus::RenderFailure
    );
    assert_eq!(rt.app().light_state(), before);
    assert_eq!(rt.ports().ble.value(RecipeSelect), &[RecipeId::VegGrowth.code()]);
}

#[test]
fn write_from_foreign_peer_is_not_permitted() {
    let mut rt = connected(None);
    let frames = rt.ports().pixels.frames.len();

    assert_eq!(
        write(&mut rt, 7, RecipeSelect, &[2]),
        ProtocolStatus::WriteNotPermitted
    );
    assert_eq!(rt.ports().pixels.frames.len(), frames);
    assert_eq!(
        rt.ports()
            .sink
            .count(|e| matches!(e, AppEvent::WriteNotPermitted { .. })),
        1
    );
}

#[test]
fn write_without_response_is_applied_silently() {
    let mut rt = connected(None);
    let mut request = WriteRequest::new(PeerHandle(1), RecipeSelect, 1, &[6]);
    request.need_rsp = false;
    deliver(&mut rt, 0, TransportEvent::Write(request));

    assert!(rt.ports().ble.responses.is_empty());
    assert_eq!(rt.ports().pixels.showing(), Some(RecipeId::Seedling.color()));
}
