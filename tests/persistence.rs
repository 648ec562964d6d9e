mod common;

use std::{sync::Arc, time::Duration};
use common::{eventually, FailingStore, JitterStore};
use serde_json::{json, Value};
use timer_panel::{
    clock::{Clock, ManualClock},
    panel::{KindFilter, TimerPanel},
    state::{AppState, TimerKind, TimerStore},
    storage::{KvStore, MemoryStore, Persister, FILTER_KEY, TIMERS_KEY},
    tasks::persistence_notice_task,
};

fn persisted_panel(backend: Arc<dyn KvStore>, filter: KindFilter) -> (TimerPanel, ManualClock) {
    let clock = ManualClock::new(0);
    let store = TimerStore::with_persister(Arc::new(clock.clone()), Persister::new(backend));
    (TimerPanel::new(store, filter), clock)
}

async fn stored_timers(backend: &MemoryStore) -> Vec<Value> {
    match backend.get(TIMERS_KEY).await {
        Ok(Some(Value::Array(timers))) => timers,
        _ => Vec::new(),
    }
}

#[tokio::test]
async fn mutations_write_the_whole_collection() {
    let backend = Arc::new(MemoryStore::new());
    let (mut panel, clock) = persisted_panel(backend.clone(), KindFilter::Stopwatch);

    let first = panel.create(TimerKind::Stopwatch, "Laps", 0).unwrap().id;
    panel.create(TimerKind::Countdown, "Tea", 180_000).unwrap();
    panel.start(first);
    clock.advance(1_200);
    panel.save_attempt(first);

    let written = eventually(|| {
        let backend = backend.clone();
        async move {
            let timers = stored_timers(&backend).await;
            timers.len() == 2
                && timers[1]["logs"].as_array().map(Vec::len) == Some(1)
        }
    })
    .await;
    assert!(written, "backend never caught up with the store");

    let timers = stored_timers(&backend).await;
    // newest first
    assert_eq!(timers[0]["name"], "Tea");
    assert_eq!(timers[1]["running"], true);
    assert_eq!(timers[1]["logs"][0]["ms"], 1_200);
}

#[tokio::test]
async fn latest_snapshot_survives_uneven_backend_latency() {
    let backend = Arc::new(JitterStore::default());
    let (mut panel, _) = persisted_panel(backend.clone(), KindFilter::Stopwatch);

    panel.create(TimerKind::Stopwatch, "a", 0).unwrap();
    tokio::task::yield_now().await;
    panel.create(TimerKind::Stopwatch, "b", 0).unwrap();

    tokio::time::sleep(Duration::from_millis(200)).await;
    let timers = match backend.get(TIMERS_KEY).await {
        Ok(Some(Value::Array(timers))) => timers,
        other => panic!("unexpected stored value: {:?}", other),
    };
    assert_eq!(timers.len(), panel.store().len());
    assert_eq!(timers[0]["name"], "b");
    assert_eq!(timers[1]["name"], "a");
}

#[tokio::test]
async fn reset_is_not_undone_by_an_earlier_write() {
    let backend = Arc::new(JitterStore::default());
    let clock: Arc<dyn Clock> = Arc::new(ManualClock::new(0));
    let mut panel = TimerPanel::restore(clock, Persister::new(backend.clone())).await;

    panel.create(TimerKind::Stopwatch, "a", 0).unwrap();
    tokio::task::yield_now().await;
    panel.clear_all();

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(panel.store().is_empty());
    assert_eq!(backend.get(TIMERS_KEY).await.unwrap(), None);
}

#[tokio::test]
async fn auto_pause_is_written_through() {
    let backend = Arc::new(MemoryStore::new());
    let (mut panel, clock) = persisted_panel(backend.clone(), KindFilter::Countdown);

    let id = panel.create(TimerKind::Countdown, "Foco", 5_000).unwrap().id;
    panel.start(id);
    clock.advance(5_100);
    let report = panel.tick();
    assert_eq!(report.auto_paused, vec![id]);

    let paused = eventually(|| {
        let backend = backend.clone();
        async move {
            let timers = stored_timers(&backend).await;
            timers.len() == 1 && timers[0]["running"] == false
        }
    })
    .await;
    assert!(paused, "auto-pause never reached the backend");
    assert_eq!(stored_timers(&backend).await[0]["elapsedMs"], 5_100);
}

#[tokio::test]
async fn failed_writes_keep_memory_and_raise_notices() {
    let backend: Arc<dyn KvStore> = Arc::new(FailingStore);
    let persister = Persister::new(backend);
    let failures = persister.subscribe();
    let clock: Arc<dyn Clock> = Arc::new(ManualClock::new(0));
    let store = TimerStore::with_persister(clock, persister);
    let panel = TimerPanel::new(store, KindFilter::Stopwatch);

    let state = Arc::new(AppState::new(panel, 0, "127.0.0.1".to_string(), Duration::from_millis(16)));
    tokio::spawn(persistence_notice_task(Arc::clone(&state), failures));

    let created = state
        .update_panel("create", |panel| panel.create(TimerKind::Stopwatch, "Laps", 0))
        .unwrap()
        .unwrap();

    let notified = eventually(|| {
        let state = Arc::clone(&state);
        async move { !state.get_notices().is_empty() }
    })
    .await;
    assert!(notified, "no notice for the failed write");
    assert!(state.get_notices()[0].message.contains("quota exceeded"));

    let still_there = state
        .read_panel(|panel| panel.store().get(created.id).is_some())
        .unwrap();
    assert!(still_there);
}

#[tokio::test]
async fn restore_pauses_running_timers_and_reads_filter() {
    let backend = Arc::new(MemoryStore::new());
    let id = uuid::Uuid::new_v4();
    backend
        .set(
            TIMERS_KEY,
            json!([{
                "id": id,
                "kind": "countdown",
                "name": "Tea",
                "targetMs": 180000,
                "elapsedMs": 42000,
                "running": true,
                "startedAt": 987654,
                "logs": [],
                "chartOpen": true
            }]),
        )
        .await
        .unwrap();
    backend.set(FILTER_KEY, json!("countdown")).await.unwrap();

    let clock: Arc<dyn Clock> = Arc::new(ManualClock::new(0));
    let panel = TimerPanel::restore(clock, Persister::new(backend)).await;

    assert_eq!(panel.filter(), KindFilter::Countdown);
    let timer = &panel.store().timers()[0];
    assert!(!timer.is_running());
    assert_eq!(timer.elapsed_ms, 42_000);
    assert!(!timer.chart_open);
    assert_eq!(panel.scheduler().mounted().len(), 1);
    assert!(panel.is_loop_active());
}

#[tokio::test]
async fn restore_falls_back_on_unreadable_values() {
    let backend = Arc::new(MemoryStore::new());
    backend.set(TIMERS_KEY, json!({"not": "a list"})).await.unwrap();
    backend.set(FILTER_KEY, json!("hourglass")).await.unwrap();

    let clock: Arc<dyn Clock> = Arc::new(ManualClock::new(0));
    let panel = TimerPanel::restore(clock, Persister::new(backend)).await;

    assert!(panel.store().is_empty());
    assert_eq!(panel.filter(), KindFilter::Stopwatch);
    assert!(!panel.is_loop_active());
    assert!(panel.empty_hint().is_some());
}

#[tokio::test]
async fn filter_is_persisted() {
    let backend = Arc::new(MemoryStore::new());
    let clock: Arc<dyn Clock> = Arc::new(ManualClock::new(0));
    let mut panel = TimerPanel::restore(clock, Persister::new(backend.clone())).await;

    panel.set_filter(KindFilter::Countdown);

    let saved = eventually(|| {
        let backend = backend.clone();
        async move { backend.get(FILTER_KEY).await.ok().flatten() == Some(json!("countdown")) }
    })
    .await;
    assert!(saved);
}
