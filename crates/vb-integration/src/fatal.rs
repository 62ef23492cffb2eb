//! Handling of CPU-engine faults
//!
//! A failed step ends the run. The fault is logged, the engine state is
//! dumped to the diagnostics sink, and the handler then waits for the user to
//! press a key before tearing the platform down. The wait has no timeout; the
//! run stays halted with the dump on screen until a key arrives.

use crate::lifecycle::LifecycleController;
use tracing::error;
use vb_core::EmulationError;

/// Shown before the state dump
pub const DUMP_NOTICE: &str = "Dumping debug info...";

/// Shown while waiting for acknowledgment
pub const ACK_PROMPT: &str = "Press any key to exit";

#[derive(Debug, Default)]
pub struct FatalErrorHandler {
    dumped: bool,
}

impl FatalErrorHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report `error`, wait for acknowledgment, then shut the platform down
    pub fn handle(&mut self, error: EmulationError, lifecycle: &mut LifecycleController) {
        error!("CPU engine fault: error #{} @ PC=0x{:08X}", error.code, error.pc);

        let platform = &mut lifecycle.platform;
        if !self.dumped {
            self.dumped = true;
            platform.diagnostics.message(DUMP_NOTICE);
            platform.diagnostics.dump_state(&error);
        }

        platform.diagnostics.message(ACK_PROMPT);
        platform.input.wait_for_key();

        lifecycle.shutdown();
    }
}
