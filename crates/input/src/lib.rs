//! Steadyhand Input
//!
//! Connects the filter engine to real devices. Uses a pluggable source
//! architecture:
//!
//! - **Mice:** `/dev/input/mice` relative packets (requires `input` group)
//! - **Replay:** a recorded JSONL event stream
//! - **Stub:** preloaded events, for tests
//!
//! Corrections go out through an evdev uinput virtual pointer. The loop in
//! [`FilterLoop`] polls a source and feeds every event to the engine until
//! the stop flag is set or the source runs dry.

pub mod backends;
pub mod decision_log;
#[cfg(target_os = "linux")]
pub mod keyboard;
pub mod tracker;
#[cfg(target_os = "linux")]
pub mod uinput;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use steadyhand_common::error::{SteadyError, SteadyResult};
use steadyhand_filter_core::{EngineEvent, FilterEngine, OutputAdapter};

/// Something an input source produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SourceEvent {
    Event(EngineEvent),
    /// The source will never produce another event.
    EndOfStream,
}

/// Trait for pointer input sources.
pub trait InputSource: Send {
    /// Poll for the next event. Returns `None` if no event is available yet.
    fn poll(&mut self) -> SteadyResult<Option<SourceEvent>>;

    /// Source name for logging.
    fn name(&self) -> &str;

    /// Check if the source can deliver events on this system.
    fn is_available(&self) -> bool;
}

/// Drives a filter engine from an input source.
pub struct FilterLoop<A: OutputAdapter> {
    source: Box<dyn InputSource>,
    engine: Arc<FilterEngine<A>>,
    stop_flag: Arc<AtomicBool>,
    events_processed: u64,
}

impl<A: OutputAdapter> FilterLoop<A> {
    pub fn new(source: Box<dyn InputSource>, engine: Arc<FilterEngine<A>>) -> Self {
        Self {
            source,
            engine,
            stop_flag: Arc::new(AtomicBool::new(false)),
            events_processed: 0,
        }
    }

    /// Share an existing stop flag (e.g. one the keyboard watcher sets).
    pub fn with_stop_flag(mut self, stop_flag: Arc<AtomicBool>) -> Self {
        self.stop_flag = stop_flag;
        self
    }

    /// Run until the stop flag is set or the source ends, then shut the engine down.
    ///
    /// Fails without touching the engine if the source cannot deliver events.
    pub async fn run(&mut self) -> SteadyResult<u64> {
        if !self.source.is_available() {
            return Err(SteadyError::input_source(format!(
                "Input source '{}' is not available",
                self.source.name()
            )));
        }
        tracing::info!(source = %self.source.name(), "Filter loop started");

        while !self.stop_flag.load(Ordering::Relaxed) {
            match self.source.poll() {
                Ok(Some(SourceEvent::Event(event))) => {
                    let outcome = self.engine.on_event(event);
                    tracing::trace!(t = event.time(), ?outcome, "Event handled");
                    self.events_processed += 1;
                }
                Ok(Some(SourceEvent::EndOfStream)) => {
                    tracing::debug!("Input source reached end of stream");
                    break;
                }
                Ok(None) => {
                    // No event available, yield briefly
                    tokio::time::sleep(tokio::time::Duration::from_millis(1)).await;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Input source error");
                }
            }
        }

        self.engine.shutdown();
        tracing::info!(events = self.events_processed, "Filter loop stopped");
        Ok(self.events_processed)
    }

    /// Get the stop flag for external coordination.
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        self.stop_flag.clone()
    }

    /// Number of events handed to the engine so far.
    pub fn events_processed(&self) -> u64 {
        self.events_processed
    }

    pub fn engine(&self) -> &Arc<FilterEngine<A>> {
        &self.engine
    }
}
