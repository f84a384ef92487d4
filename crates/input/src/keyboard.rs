//! Stop the session when ESC is pressed on any keyboard.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use evdev::{Device, InputEventKind, Key};
use steadyhand_common::error::{SteadyError, SteadyResult};

/// Number of keyboards found that report an ESC key.
pub fn escape_capable_keyboards() -> usize {
    evdev::enumerate()
        .filter(|(_, device)| has_escape(device))
        .count()
}

fn has_escape(device: &Device) -> bool {
    device
        .supported_keys()
        .map_or(false, |keys| keys.contains(Key::KEY_ESC))
}

/// Spawn one blocking reader thread per keyboard; the first ESC press sets `stop_flag`.
///
/// Readers are detached: they block in the kernel and end with the process.
pub fn spawn_escape_watcher(stop_flag: Arc<AtomicBool>) -> SteadyResult<usize> {
    let mut watchers = 0;
    for (path, mut device) in evdev::enumerate().filter(|(_, device)| has_escape(device)) {
        let stop_flag = stop_flag.clone();
        let name = device.name().unwrap_or("unknown").to_string();
        tracing::debug!(path = %path.display(), %name, "Watching keyboard for ESC");

        std::thread::Builder::new()
            .name(format!("esc-watch-{watchers}"))
            .spawn(move || loop {
                let events = match device.fetch_events() {
                    Ok(events) => events,
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "Keyboard read failed");
                        return;
                    }
                };
                for event in events {
                    if event.kind() == InputEventKind::Key(Key::KEY_ESC) && event.value() == 1 {
                        tracing::info!("ESC pressed, stopping");
                        stop_flag.store(true, Ordering::SeqCst);
                        return;
                    }
                }
            })?;
        watchers += 1;
    }

    if watchers == 0 {
        return Err(SteadyError::permission_denied(
            "no readable keyboard reports an ESC key; add the user to the 'input' group",
        ));
    }
    Ok(watchers)
}
