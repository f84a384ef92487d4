//! Linux input source reading `/dev/input/mice`.

use std::collections::VecDeque;
use std::fs::OpenOptions;
use std::io::Read;
use std::os::unix::fs::MetadataExt;
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use steadyhand_common::clock::EngineClock;
use steadyhand_common::config::DeviceConfig;
use steadyhand_common::error::{SteadyError, SteadyResult};
use steadyhand_filter_core::{ClickEvent, EngineEvent, MouseButton, TimedSample};

use super::StubSource;
use crate::tracker::PointerTracker;
use crate::{InputSource, SourceEvent};

const BUTTONS: [(u8, MouseButton); 3] = [
    (0b001, MouseButton::Left),
    (0b010, MouseButton::Right),
    (0b100, MouseButton::Middle),
];

/// Pointer source decoding 3-byte PS/2 packets from the kernel's aggregated mouse device.
pub struct MiceSource {
    device: std::fs::File,
    path: PathBuf,
    pending: VecDeque<SourceEvent>,
    tracker: Arc<PointerTracker>,
    clock: EngineClock,
    button_state: u8,
}

impl MiceSource {
    pub fn new(path: &Path, tracker: Arc<PointerTracker>, clock: EngineClock) -> SteadyResult<Self> {
        let device = OpenOptions::new()
            .read(true)
            .custom_flags(libc::O_NONBLOCK)
            .open(path)
            .map_err(|e| {
                SteadyError::input_source(format!("Failed to open {}: {e}", path.display()))
            })?;

        Ok(Self {
            device,
            path: path.to_path_buf(),
            pending: VecDeque::new(),
            tracker,
            clock,
            button_state: 0,
        })
    }

    pub fn is_supported(path: &Path) -> bool {
        OpenOptions::new().read(true).open(path).is_ok()
    }

    fn ingest_packets(&mut self) -> SteadyResult<()> {
        loop {
            let mut packet = [0u8; 3];
            match self.device.read(&mut packet) {
                Ok(3) => {
                    self.process_packet(packet);
                }
                Ok(_) => break,
                Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => break,
                Err(err) => {
                    return Err(SteadyError::input_source(format!(
                        "Failed reading {}: {err}",
                        self.path.display()
                    )));
                }
            }
        }
        Ok(())
    }

    fn process_packet(&mut self, packet: [u8; 3]) {
        let time = self.clock.elapsed_secs();
        let dx = packet[1] as i8 as i32;
        // PS/2 reports +y as up; the screen's +y is down.
        let dy = -(packet[2] as i8 as i32);

        if dx != 0 || dy != 0 {
            let update = self.tracker.apply_motion(dx, dy);
            if !update.echo {
                self.pending
                    .push_back(SourceEvent::Event(EngineEvent::Position(TimedSample {
                        time,
                        pos: update.pos,
                    })));
            }
        }

        let pos = self.tracker.position();
        for (mask, button) in BUTTONS {
            let now = packet[0] & mask != 0;
            let previous = self.button_state & mask != 0;
            if now == previous {
                continue;
            }
            self.button_state ^= mask;

            if !now && self.tracker.take_expected_release(button) {
                continue;
            }
            let event = if now {
                ClickEvent::press(time, button, pos.x, pos.y)
            } else {
                ClickEvent::release(time, button, pos.x, pos.y)
            };
            self.pending
                .push_back(SourceEvent::Event(EngineEvent::Button(event)));
        }
    }
}

impl InputSource for MiceSource {
    fn poll(&mut self) -> SteadyResult<Option<SourceEvent>> {
        if let Some(event) = self.pending.pop_front() {
            return Ok(Some(event));
        }

        self.ingest_packets()?;
        Ok(self.pending.pop_front())
    }

    fn name(&self) -> &str {
        "mice"
    }

    fn is_available(&self) -> bool {
        true
    }
}

/// Detect the best available input source for the current system.
pub fn detect_best_source(
    devices: &DeviceConfig,
    tracker: Arc<PointerTracker>,
    clock: EngineClock,
) -> Box<dyn InputSource> {
    if MiceSource::is_supported(&devices.mice_path) {
        match MiceSource::new(&devices.mice_path, tracker, clock) {
            Ok(source) => {
                tracing::info!(path = %devices.mice_path.display(), "Using mice input source");
                return Box::new(source);
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to initialize mice source, using stub");
            }
        }
    }

    tracing::warn!(
        details = %mice_device_diagnostic(&devices.mice_path),
        "Using stub input source; pointer events will not be filtered"
    );
    Box::new(StubSource::empty())
}

/// Human-readable explanation of why a device node can or cannot be opened.
pub fn mice_device_diagnostic(path: &Path) -> String {
    let uid = unsafe { libc::geteuid() };
    let gid = unsafe { libc::getegid() };

    match std::fs::metadata(path) {
        Ok(meta) => {
            let mode = meta.mode() & 0o777;
            let owner = meta.uid();
            let group = meta.gid();
            format!(
                "device={} mode={mode:o} owner_uid={owner} owner_gid={group} process_uid={uid} process_gid={gid}; likely missing 'input' group membership. Fix: sudo usermod -aG input $USER && log out/in",
                path.display()
            )
        }
        Err(err) => format!(
            "device={} unavailable ({err}); ensure kernel input device exists and permissions allow read access",
            path.display()
        ),
    }
}
