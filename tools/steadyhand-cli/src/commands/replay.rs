//! Run a recorded event stream through the filter.

use std::path::PathBuf;
use std::sync::Arc;

use steadyhand_common::clock::EngineClock;
use steadyhand_common::config::AppConfig;
use steadyhand_filter_core::{Effect, FilterEngine, RecordingAdapter};
use steadyhand_input::backends::ReplaySource;
use steadyhand_input::FilterLoop;

pub async fn run(config: AppConfig, events: PathBuf) -> anyhow::Result<()> {
    let source = ReplaySource::open(&events)?;

    println!("Replaying: {}", events.display());
    println!("  Events: {}", source.remaining());
    println!("  Policy: {}", super::policy_label(&config.filter.policy));

    let mut engine = FilterEngine::new(config.filter.clone(), RecordingAdapter::new())?;
    if let Some(path) = &config.decision_log {
        let clock = EngineClock::start();
        let log = super::open_decision_log(path, &config.filter, &clock)?;
        engine = engine.with_decision_sink(Box::new(log));
    }
    let engine = Arc::new(engine);

    let mut filter_loop = FilterLoop::new(Box::new(source), engine.clone());
    let processed = filter_loop.run().await?;

    let effects = engine.adapter().effects();
    let repositions = effects
        .iter()
        .filter(|e| matches!(e, Effect::Reposition { .. }))
        .count();
    let cancels = effects.len() - repositions;

    println!();
    println!("Replay complete: {processed} events");
    super::print_stats(&engine.stats());
    println!("  Effects: {repositions} reposition(s), {cancels} cancelled press(es)");

    Ok(())
}
