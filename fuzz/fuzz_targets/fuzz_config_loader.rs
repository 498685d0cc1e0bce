#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Parse and validation errors are fine; panics are not.
    if let Ok(cfg) = turret_config::load_toml(data) {
        if cfg.validate().is_ok() {
            // A valid config must convert into the engine's runtime config.
            let _ = turret_core::CycleCfg::from(&cfg);
        }
    }
});
