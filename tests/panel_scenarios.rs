mod common;

use common::manual_panel;
use timer_panel::{
    clock::Clock,
    panel::{ChartOutput, KindFilter, Trend},
    state::TimerKind,
};

#[test]
fn countdown_auto_pauses_at_zero() {
    let (mut panel, clock) = manual_panel(KindFilter::Countdown);
    let id = panel.create(TimerKind::Countdown, "Foco", 5_000).unwrap().id;
    panel.start(id);

    // 16 ms frames up to 5100 ms of simulated time
    while clock.now() < 5_100 {
        clock.advance(16);
        panel.tick();
    }

    let timer = panel.store().get(id).unwrap();
    assert!(!timer.is_running());
    assert_eq!(timer.remaining(panel.store().now()), 0);
    assert!(timer.elapsed_ms >= 5_000);

    let view = panel.scheduler().view(id).unwrap();
    assert_eq!(view.time_text, "00:00:00.000");
    assert_eq!(view.status_text, "Paused");
}

#[test]
fn countdown_remaining_plus_elapsed_is_target() {
    let (mut panel, clock) = manual_panel(KindFilter::Countdown);
    let id = panel.create(TimerKind::Countdown, "Foco", 5_000).unwrap().id;
    panel.start(id);

    for step in [0, 700, 1_300, 2_999] {
        clock.advance(step);
        panel.tick();
        let t = panel.store().get(id).unwrap();
        let now = panel.store().now();
        assert!(t.current_elapsed(now) <= 5_000);
        assert_eq!(t.remaining(now) + t.current_elapsed(now), 5_000);
    }
}

#[test]
fn stopwatch_attempts_are_chronological() {
    let (mut panel, clock) = manual_panel(KindFilter::Stopwatch);
    let id = panel.create(TimerKind::Stopwatch, "Prática", 0).unwrap().id;
    panel.start(id);

    clock.advance(2_340);
    panel.tick();
    let first = panel.save_attempt(id).unwrap();
    clock.advance(1_010);
    panel.tick();
    let second = panel.save_attempt(id).unwrap();

    let logs = panel.store().get(id).unwrap().logs();
    assert_eq!(logs.len(), 2);
    assert_eq!(logs[0], first);
    assert_eq!(logs[1], second);
    assert_eq!(logs[0].ms, 2_340);
    assert_eq!(logs[1].ms, 3_350);
    assert!(logs[0].captured_at < logs[1].captured_at);

    let view = panel.scheduler().view(id).unwrap();
    assert_eq!(view.chart.scene().unwrap().trend, Trend::Regression);
}

#[test]
fn filter_switch_stops_stopwatch_repaints() {
    let (mut panel, clock) = manual_panel(KindFilter::Stopwatch);
    let sw = panel.create(TimerKind::Stopwatch, "Laps", 0).unwrap().id;
    let cd = panel.create(TimerKind::Countdown, "Foco", 60_000).unwrap().id;
    panel.start(sw);
    panel.start(cd);

    clock.advance(16);
    assert_eq!(panel.tick().repainted, vec![sw]);

    panel.set_filter(KindFilter::Countdown);
    assert!(panel.scheduler().view(sw).is_none());
    assert_eq!(panel.scheduler().mounted(), &[cd]);

    for _ in 0..10 {
        clock.advance(16);
        let report = panel.tick();
        assert_eq!(report.repainted, vec![cd]);
    }

    // a mutation on the unmounted stopwatch does not mount it
    panel.pause(sw);
    assert!(panel.scheduler().view(sw).is_none());

    panel.set_filter(KindFilter::Stopwatch);
    let view = panel.scheduler().view(sw).unwrap();
    assert_eq!(view.repaints, 1);
    assert_eq!(view.status_text, "Paused");
}

#[test]
fn chart_placeholder_until_two_attempts() {
    let (mut panel, clock) = manual_panel(KindFilter::Stopwatch);
    let id = panel.create(TimerKind::Stopwatch, "Laps", 0).unwrap().id;
    assert!(panel.scheduler().view(id).unwrap().chart.is_placeholder());

    panel.start(id);
    clock.advance(900);
    panel.save_attempt(id);
    assert!(panel.scheduler().view(id).unwrap().chart.is_placeholder());

    clock.advance(100);
    panel.save_attempt(id);
    let view = panel.scheduler().view(id).unwrap();
    assert!(matches!(view.chart, ChartOutput::Drawn(_)));
    assert!(view.note.is_some());
}

#[test]
fn countdown_attempts_are_accepted_without_chart() {
    let (mut panel, _) = manual_panel(KindFilter::Countdown);
    let id = panel.create(TimerKind::Countdown, "Foco", 1_000).unwrap().id;
    assert!(panel.save_attempt(id).is_some());
    assert_eq!(panel.store().get(id).unwrap().logs().len(), 1);

    let view = panel.scheduler().view(id).unwrap();
    assert!(view.chart.is_placeholder());
    assert!(view.note.is_none());
    assert!(!panel.toggle_chart(id).unwrap().chart_open);
}

#[test]
fn create_rejects_empty_countdown_without_mutation() {
    let (mut panel, _) = manual_panel(KindFilter::Countdown);
    assert!(panel.create(TimerKind::Countdown, "Zero", 0).is_err());
    assert!(panel.store().is_empty());
    assert!(!panel.is_loop_active());
}
