use std::sync::Arc;
use std::time::Duration;

use steadyhand_common::config::FilterConfig;
use steadyhand_filter_core::event::{serialize_events, ButtonState, RawEvent};
use steadyhand_filter_core::{
    ClickEvent, Effect, EngineEvent, FilterEngine, MouseButton, RecordingAdapter, TimedSample,
};
use steadyhand_input::backends::{ReplaySource, StubSource};
use steadyhand_input::decision_log::{DecisionLogHeader, JsonlDecisionLog};
use steadyhand_input::FilterLoop;

const MS: u64 = 1_000_000;

fn tremor_session() -> Vec<RawEvent> {
    vec![
        RawEvent::pointer(0, 100.0, 100.0),
        // tremor around the stable point
        RawEvent::pointer(10 * MS, 102.0, 101.0),
        RawEvent::pointer(20 * MS, 99.0, 98.0),
        RawEvent::pointer(30 * MS, 101.0, 102.0),
        // spasm
        RawEvent::pointer(40 * MS, 160.0, 100.0),
        RawEvent::click(45 * MS, MouseButton::Left, ButtonState::Down, 160.0, 100.0),
        RawEvent::click(60 * MS, MouseButton::Left, ButtonState::Up, 160.0, 100.0),
        // deliberate move and click
        RawEvent::pointer(600 * MS, 400.0, 300.0),
        RawEvent::pointer(900 * MS, 401.0, 300.0),
        RawEvent::click(1000 * MS, MouseButton::Left, ButtonState::Down, 401.0, 300.0),
        RawEvent::click(1080 * MS, MouseButton::Left, ButtonState::Up, 401.0, 300.0),
    ]
}

#[tokio::test]
async fn replayed_session_filters_tremor_and_spasm_click() {
    let dir = std::env::temp_dir().join("steadyhand_test_replay_pipeline");
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();

    let events_path = dir.join("events.jsonl");
    let jsonl = format!(
        "# {{\"schema_version\":\"1.0\"}}\n{}",
        serialize_events(&tremor_session()).unwrap()
    );
    std::fs::write(&events_path, jsonl).unwrap();

    let log_path = dir.join("decisions.jsonl");
    let header = DecisionLogHeader {
        schema_version: "1.0".to_string(),
        epoch_wall: "2026-01-01T00:00:00Z".to_string(),
        filter: FilterConfig::discrete(),
    };
    let log = JsonlDecisionLog::create(&log_path, &header).unwrap();

    let engine = Arc::new(
        FilterEngine::new(FilterConfig::discrete(), RecordingAdapter::new())
            .unwrap()
            .with_decision_sink(Box::new(log)),
    );
    let source = ReplaySource::open(&events_path).unwrap();
    let mut filter_loop = FilterLoop::new(Box::new(source), engine.clone());

    let processed = filter_loop.run().await.unwrap();
    assert_eq!(processed, 11);
    assert!(!engine.is_running());

    let stats = engine.stats();
    assert_eq!(stats.samples, 7);
    assert_eq!(stats.seeded, 1);
    assert_eq!(stats.suppressed_jitter, 3);
    assert_eq!(stats.suppressed_jerk, 1);
    assert_eq!(stats.accepted, 2);
    assert_eq!(stats.presses, 2);
    assert_eq!(stats.presses_cancelled, 1);
    assert_eq!(stats.releases, 2);

    let effects = engine.adapter().effects();
    assert_eq!(
        effects
            .iter()
            .filter(|e| matches!(e, Effect::Reposition { .. }))
            .count(),
        4
    );
    assert_eq!(
        effects
            .iter()
            .filter(|e| matches!(e, Effect::CancelPress { .. }))
            .count(),
        1
    );

    // Shutdown flushed the log: header plus one line per event.
    let content = std::fs::read_to_string(&log_path).unwrap();
    assert_eq!(content.lines().count(), 12);

    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn stop_flag_ends_an_idle_loop() {
    let engine = Arc::new(FilterEngine::new(FilterConfig::smoothing(), RecordingAdapter::new()).unwrap());
    let source = StubSource::new(vec![
        EngineEvent::Position(TimedSample::new(0.0, 10.0, 10.0)),
        EngineEvent::Button(ClickEvent::press(0.01, MouseButton::Left, 10.0, 10.0)),
    ]);
    let mut filter_loop = FilterLoop::new(Box::new(source), engine.clone());
    let stop = filter_loop.stop_flag();

    let stopper = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        stop.store(true, std::sync::atomic::Ordering::SeqCst);
    });

    let processed = filter_loop.run().await.unwrap();
    stopper.await.unwrap();

    assert_eq!(processed, 2);
    assert_eq!(engine.stats().samples, 1);
    assert_eq!(engine.stats().presses, 1);
    assert!(!engine.is_running());
}
