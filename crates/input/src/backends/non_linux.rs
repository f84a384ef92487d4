//! Fallbacks for platforms without evdev.

use std::path::Path;
use std::sync::Arc;

use steadyhand_common::clock::EngineClock;
use steadyhand_common::config::DeviceConfig;

use super::StubSource;
use crate::tracker::PointerTracker;
use crate::InputSource;

pub fn detect_best_source(
    _devices: &DeviceConfig,
    _tracker: Arc<PointerTracker>,
    _clock: EngineClock,
) -> Box<dyn InputSource> {
    tracing::warn!(
        "Live pointer sources for this platform are not implemented yet; using stub source"
    );
    Box::new(StubSource::empty())
}

pub fn mice_device_diagnostic(path: &Path) -> String {
    format!(
        "device={} unsupported: live pointer filtering requires Linux evdev",
        path.display()
    )
}
