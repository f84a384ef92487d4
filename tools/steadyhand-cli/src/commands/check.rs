//! Check device permissions.

use steadyhand_common::config::AppConfig;
use steadyhand_input::backends::mice_device_diagnostic;

pub fn run(config: &AppConfig) -> anyhow::Result<()> {
    println!("Steadyhand System Check");
    println!("{}", "=".repeat(50));

    let ready = platform_checks(config);

    println!();
    match config.filter.validate() {
        Ok(()) => println!(
            "[OK] Filter config: {} policy",
            super::policy_label(&config.filter.policy)
        ),
        Err(e) => println!("[FAIL] Filter config: {e}"),
    }

    println!();
    if ready {
        println!("All required devices are available. Steadyhand is ready.");
    } else {
        println!("Some required devices are missing. See above for fixes.");
    }

    Ok(())
}

#[cfg(target_os = "linux")]
fn platform_checks(config: &AppConfig) -> bool {
    use steadyhand_input::backends::MiceSource;
    use steadyhand_input::keyboard::escape_capable_keyboards;
    use steadyhand_input::uinput::uinput_available;

    let mice = &config.devices.mice_path;
    let mice_ok = MiceSource::is_supported(mice);
    if mice_ok {
        println!("[OK] Pointer input: {}", mice.display());
    } else {
        println!("[FAIL] Pointer input: {}", mice_device_diagnostic(mice));
    }

    let uinput_ok = uinput_available();
    if uinput_ok {
        println!("[OK] Virtual pointer: /dev/uinput is writable");
    } else {
        println!(
            "[FAIL] Virtual pointer: /dev/uinput is not writable. Fix: load the uinput module and grant the input group write access"
        );
    }

    if config.devices.stop_on_escape {
        match escape_capable_keyboards() {
            0 => println!("[WARN] ESC stop: no readable keyboard found; use Ctrl+C instead"),
            n => println!("[OK] ESC stop: {n} keyboard(s) readable"),
        }
    }

    mice_ok && uinput_ok
}

#[cfg(not(target_os = "linux"))]
fn platform_checks(config: &AppConfig) -> bool {
    println!(
        "[FAIL] Pointer input: {}",
        mice_device_diagnostic(&config.devices.mice_path)
    );
    false
}
