//! Oxidized-VB - Virtual Boy emulator
//!
//! Main entry point. Runs one session on the headless platform:
//!
//! ```text
//! oxidized-vb [ROM] [FRAMES]
//! ```
//!
//! Without a ROM argument the ROM selection counts as cancelled. FRAMES is
//! the number of host frames to run before closing (default 600).

use std::path::PathBuf;
use vb_core::{logging, OptionsStore, TomlOptionsStore};
use vb_integration::{headless, EmulatorRunner, SessionOutcome};

const DEFAULT_FRAMES: u64 = 600;

fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let rom = args.next().map(PathBuf::from);
    let frames = match args.next() {
        Some(arg) => arg.parse()?,
        None => DEFAULT_FRAMES,
    };

    // Stored options pick the log level and the ROM directory; startup
    // falls back to the same defaults when they cannot be read
    let mut store = TomlOptionsStore::in_config_dir();
    let options = store.load().unwrap_or_default();
    logging::init(options.effective_log_level());

    tracing::info!("Starting Oxidized-VB");

    let platform = headless::platform(&options, store, rom, frames);

    let mut runner = EmulatorRunner::new(platform);
    match runner.run() {
        SessionOutcome::Faulted(error) => Err(anyhow::anyhow!("emulation stopped: {}", error)),
        outcome => {
            tracing::info!("Session ended: {:?}", outcome);
            Ok(())
        }
    }
}
