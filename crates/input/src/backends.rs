//! Input source implementations.
//!
//! Each source provides a different way to obtain pointer events.

#[cfg(target_os = "linux")]
mod linux;
#[cfg(not(target_os = "linux"))]
mod non_linux;

#[cfg(target_os = "linux")]
pub use linux::{detect_best_source, mice_device_diagnostic, MiceSource};
#[cfg(not(target_os = "linux"))]
pub use non_linux::{detect_best_source, mice_device_diagnostic};

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use steadyhand_common::error::{SteadyError, SteadyResult};
use steadyhand_filter_core::event::{parse_events, RawEvent};
use steadyhand_filter_core::EngineEvent;

use crate::{InputSource, SourceEvent};

/// Stub source for testing: yields pre-loaded events, then nothing.
pub struct StubSource {
    events: Vec<EngineEvent>,
    index: usize,
}

impl StubSource {
    /// Create a stub source with pre-loaded events.
    pub fn new(events: Vec<EngineEvent>) -> Self {
        Self { events, index: 0 }
    }

    /// Create an empty stub that never produces events.
    pub fn empty() -> Self {
        Self {
            events: vec![],
            index: 0,
        }
    }
}

impl InputSource for StubSource {
    fn poll(&mut self) -> SteadyResult<Option<SourceEvent>> {
        if self.index < self.events.len() {
            let event = self.events[self.index];
            self.index += 1;
            Ok(Some(SourceEvent::Event(event)))
        } else {
            Ok(None)
        }
    }

    fn name(&self) -> &str {
        "stub"
    }

    fn is_available(&self) -> bool {
        true
    }
}

/// Replays a recorded JSONL event stream, then reports end of stream.
pub struct ReplaySource {
    path: PathBuf,
    events: VecDeque<EngineEvent>,
}

impl ReplaySource {
    /// Load every event from a JSONL file.
    pub fn open(path: &Path) -> SteadyResult<Self> {
        if !path.exists() {
            return Err(SteadyError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        let events = parse_events(&content).map_err(|e| {
            SteadyError::input_source(format!("Failed to parse {}: {e}", path.display()))
        })?;
        Ok(Self::from_raw(path.to_path_buf(), &events))
    }

    pub fn from_raw(path: PathBuf, events: &[RawEvent]) -> Self {
        Self {
            path,
            events: events.iter().map(RawEvent::to_engine_event).collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.events.len()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl InputSource for ReplaySource {
    fn poll(&mut self) -> SteadyResult<Option<SourceEvent>> {
        Ok(Some(match self.events.pop_front() {
            Some(event) => SourceEvent::Event(event),
            None => SourceEvent::EndOfStream,
        }))
    }

    fn name(&self) -> &str {
        "replay"
    }

    fn is_available(&self) -> bool {
        true
    }
}
