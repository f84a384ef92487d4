//! Filter the live pointer.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use steadyhand_common::clock::EngineClock;
use steadyhand_common::config::AppConfig;
use steadyhand_filter_core::{FilterEngine, NullAdapter, OutputAdapter};
use steadyhand_input::backends::detect_best_source;
use steadyhand_input::tracker::PointerTracker;
use steadyhand_input::FilterLoop;

pub async fn run(config: AppConfig) -> anyhow::Result<()> {
    println!("Starting tremor filter");
    println!("  Policy: {}", super::policy_label(&config.filter.policy));
    println!(
        "  Click gate: {}",
        if config.filter.click_gate.enabled {
            "on"
        } else {
            "off"
        }
    );

    let clock = EngineClock::start();
    let tracker = Arc::new(PointerTracker::new(
        config.devices.screen_width,
        config.devices.screen_height,
    ));

    let mut engine = FilterEngine::new(config.filter.clone(), output_adapter(tracker.clone()))?;
    if let Some(path) = &config.decision_log {
        let log = super::open_decision_log(path, &config.filter, &clock)?;
        engine = engine.with_decision_sink(Box::new(log));
    }
    let engine = Arc::new(engine);

    let source = detect_best_source(&config.devices, tracker, clock);
    let stop_flag = Arc::new(AtomicBool::new(false));

    if config.devices.stop_on_escape {
        watch_escape(stop_flag.clone());
    }

    let ctrl_c_flag = stop_flag.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c_flag.store(true, Ordering::SeqCst);
        }
    });

    println!("Press Ctrl+C to stop filtering...");
    println!();

    let mut filter_loop = FilterLoop::new(source, engine.clone()).with_stop_flag(stop_flag);
    let events = filter_loop.run().await?;

    println!();
    println!("Filter stopped after {events} events");
    super::print_stats(&engine.stats());

    Ok(())
}

#[cfg(target_os = "linux")]
fn output_adapter(tracker: Arc<PointerTracker>) -> Box<dyn OutputAdapter> {
    match steadyhand_input::uinput::UinputPointer::new(tracker) {
        Ok(pointer) => Box::new(pointer),
        Err(e) => {
            tracing::warn!(error = %e, "Virtual pointer unavailable; corrections will be dropped");
            Box::new(NullAdapter)
        }
    }
}

#[cfg(not(target_os = "linux"))]
fn output_adapter(_tracker: Arc<PointerTracker>) -> Box<dyn OutputAdapter> {
    tracing::warn!("No virtual pointer on this platform; corrections will be dropped");
    Box::new(NullAdapter)
}

#[cfg(target_os = "linux")]
fn watch_escape(stop_flag: Arc<AtomicBool>) {
    match steadyhand_input::keyboard::spawn_escape_watcher(stop_flag) {
        Ok(count) => println!("  Press ESC on any of {count} keyboard(s) to stop"),
        Err(e) => tracing::warn!(error = %e, "ESC watcher not started"),
    }
}

#[cfg(not(target_os = "linux"))]
fn watch_escape(_stop_flag: Arc<AtomicBool>) {
    tracing::warn!("ESC watcher is not supported on this platform");
}
