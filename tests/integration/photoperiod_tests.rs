//! Photoperiod behaviour driven through `Runtime::run_once` at explicit times.

use crate::mock_hw::{HOUR_US, TestRuntime, boot, deliver};
use growlight::app::events::AppEvent;
use growlight::app::light_engine::Source;
use growlight::config::Settings;
use growlight::connection::PeerHandle;
use growlight::events::{EventQueue, TransportEvent, WriteRequest};
use growlight::protocol::ControlPoint::{self, ControlCommand, RecipeSelect};
use growlight::protocol::ProtocolStatus;
use growlight::recipes::{RecipeId, Rgbw};
use growlight::scheduler::Phase;

fn tick(rt: &mut TestRuntime, now_us: u64) {
    rt.run_once(now_us, &EventQueue::new());
}

fn write_at(rt: &mut TestRuntime, now_us: u64, point: ControlPoint, data: &[u8]) {
    let request = WriteRequest::new(PeerHandle(1), point, 1, data);
    deliver(rt, now_us, TransportEvent::Write(request));
}

#[test]
fn boot_renders_auto_recipe_in_on_phase() {
    let rt = boot(Some(Settings::new(1, 2, RecipeId::Bloom, true)));
    assert_eq!(rt.app().scheduler().phase(), Phase::On);
    assert_eq!(rt.ports().pixels.showing(), Some(RecipeId::Bloom.color()));
    assert_eq!(rt.app().light_state().source, Source::Scheduled);
    assert_eq!(rt.ports().ble.value(RecipeSelect), &[RecipeId::Bloom.code()]);
}

#[test]
fn one_hour_on_two_hours_off() {
    let mut rt = boot(Some(Settings::new(1, 2, RecipeId::Bloom, true)));

    tick(&mut rt, HOUR_US - 1);
    assert_eq!(rt.app().scheduler().phase(), Phase::On);

    tick(&mut rt, HOUR_US);
    assert_eq!(rt.app().scheduler().phase(), Phase::Off);
    assert_eq!(rt.ports().pixels.showing(), Some(Rgbw::OFF));
    assert_eq!(rt.ports().ble.value(RecipeSelect), &[RecipeId::Off.code()]);

    tick(&mut rt, 3 * HOUR_US - 1);
    assert_eq!(rt.app().scheduler().phase(), Phase::Off);

    tick(&mut rt, 3 * HOUR_US);
    assert_eq!(rt.app().scheduler().phase(), Phase::On);
    assert_eq!(rt.ports().pixels.showing(), Some(RecipeId::Bloom.color()));
    assert_eq!(
        rt.ports()
            .sink
            .count(|e| matches!(e, AppEvent::PhaseChanged(_))),
        3
    );
}

#[test]
fn manual_write_is_overridden_at_next_transition() {
    let mut rt = boot(Some(Settings::new(1, 1, RecipeId::Bloom, true)));
    deliver(&mut rt, 0, TransportEvent::Connected(PeerHandle(1)));

    write_at(&mut rt, HOUR_US / 2, RecipeSelect, &[RecipeId::Forest.code()]);
    assert_eq!(rt.ports().pixels.showing(), Some(RecipeId::Forest.color()));
    assert_eq!(rt.ports().ble.last_status(), Some(ProtocolStatus::Success));

    tick(&mut rt, HOUR_US);
    assert_eq!(rt.app().scheduler().phase(), Phase::Off);
    assert_eq!(rt.ports().pixels.showing(), Some(Rgbw::OFF));
    assert_eq!(rt.app().light_state().source, Source::Scheduled);
}

#[test]
fn disabling_freezes_and_reenabling_restarts_on() {
    let mut rt = boot(Some(Settings::new(1, 1, RecipeId::Bloom, true)));
    deliver(&mut rt, 0, TransportEvent::Connected(PeerHandle(1)));

    write_at(&mut rt, 10, ControlCommand, &[0x04, 0]);
    assert_eq!(rt.app().scheduler().phase(), Phase::Dormant);
    let frames = rt.ports().pixels.frames.len();

    for h in 1..=10 {
        tick(&mut rt, h * HOUR_US);
    }
    assert_eq!(rt.ports().pixels.frames.len(), frames);
    assert_eq!(rt.ports().pixels.showing(), Some(RecipeId::Bloom.color()));

    write_at(&mut rt, 10 * HOUR_US + 5, ControlCommand, &[0x04, 1]);
    assert_eq!(rt.app().scheduler().phase(), Phase::On);
    assert_eq!(rt.ports().pixels.frames.len(), frames + 1);

    tick(&mut rt, 11 * HOUR_US + 4);
    assert_eq!(rt.app().scheduler().phase(), Phase::On);
    tick(&mut rt, 11 * HOUR_US + 5);
    assert_eq!(rt.app().scheduler().phase(), Phase::Off);
}

#[test]
fn disabled_at_boot_leaves_strip_dark() {
    let rt = boot(Some(Settings::new(16, 8, RecipeId::Bloom, false)));
    assert_eq!(rt.app().scheduler().phase(), Phase::Dormant);
    assert!(rt.ports().pixels.frames.is_empty());
    assert_eq!(rt.ports().ble.value(RecipeSelect), &[RecipeId::Off.code()]);
}

#[test]
fn zero_length_on_phase_never_lights() {
    let mut rt = boot(Some(Settings::new(0, 2, RecipeId::Bloom, true)));
    assert!(rt.ports().pixels.frames.is_empty());

    tick(&mut rt, 1_000);
    assert_eq!(rt.app().scheduler().phase(), Phase::Off);
    assert_eq!(rt.ports().pixels.showing(), Some(Rgbw::OFF));

    tick(&mut rt, 2 * HOUR_US + 1_000);
    assert_eq!(rt.app().scheduler().phase(), Phase::On);
    assert_eq!(rt.ports().pixels.frames.len(), 1);
}

#[test]
fn late_tick_still_counts_real_time() {
    let mut rt = boot(Some(Settings::new(2, 2, RecipeId::Bloom, true)));
    tick(&mut rt, HOUR_US);
    // A stalled loop: the next tick arrives well past the boundary.
    tick(&mut rt, 5 * HOUR_US);
    assert_eq!(rt.app().scheduler().phase(), Phase::Off);
    assert_eq!(rt.app().scheduler().phase_elapsed().as_secs(), 0);
}

#[test]
fn schedule_change_applies_to_running_phase() {
    let mut rt = boot(Some(Settings::new(10, 10, RecipeId::Bloom, true)));
    deliver(&mut rt, 0, TransportEvent::Connected(PeerHandle(1)));
    tick(&mut rt, 2 * HOUR_US);

    write_at(&mut rt, 2 * HOUR_US + 1, ControlCommand, &[0x02, 1, 1]);
    assert_eq!(rt.app().scheduler().phase(), Phase::Off);
}
