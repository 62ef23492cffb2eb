//! Main emulator runner
//!
//! This module provides the frame loop and the [`EmulatorRunner`] which ties
//! together:
//! - Lifecycle controller (startup and teardown)
//! - Input/menu bridge
//! - CPU-engine step batches with stereo eye tracking
//! - Fatal error handling
//! - Frame rendering, presentation and vblank pacing

use crate::fatal::FatalErrorHandler;
use crate::input::{BridgeEvent, InputBridge};
use crate::lifecycle::{LifecycleController, Platform};
use std::ops::ControlFlow;
use std::time::Instant;
use vb_core::{EmulationError, FrameState, OverlayStats, StartupAbort};

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Exit chosen from the menu
    Exited,
    /// The host closed the application
    Closed,
    /// A CPU-engine step failed
    Faulted(EmulationError),
    /// Startup did not complete
    Aborted(StartupAbort),
}

impl SessionOutcome {
    pub fn is_fault(&self) -> bool {
        matches!(self, Self::Faulted(_))
    }
}

/// Fixed-cadence frame loop
pub struct FrameScheduler<'a> {
    lifecycle: &'a mut LifecycleController,
    state: FrameState,
    bridge: InputBridge,
    fatal: FatalErrorHandler,
}

impl<'a> FrameScheduler<'a> {
    pub fn new(lifecycle: &'a mut LifecycleController) -> Self {
        Self::with_bridge(lifecycle, InputBridge::default())
    }

    pub fn with_bridge(lifecycle: &'a mut LifecycleController, bridge: InputBridge) -> Self {
        Self {
            lifecycle,
            state: FrameState::new(),
            bridge,
            fatal: FatalErrorHandler::new(),
        }
    }

    /// Run until the menu exits, the host closes, or the engine faults.
    /// The platform has been shut down by the time this returns.
    pub fn run(&mut self) -> SessionOutcome {
        tracing::info!("Entering frame loop");
        loop {
            if let ControlFlow::Break(outcome) = self.run_frame() {
                tracing::info!(
                    "Frame loop finished after {} frames: {:?}",
                    self.state.frame,
                    outcome
                );
                return outcome;
            }
        }
    }

    /// One outer iteration: input, step batch, render, present, vblank
    pub fn run_frame(&mut self) -> ControlFlow<SessionOutcome> {
        let frame_start = Instant::now();

        let (platform, context) = self.lifecycle.parts();
        let event = self.bridge.poll(
            platform.input.as_mut(),
            platform.menu.as_mut(),
            platform.display.as_mut(),
            context,
        );
        match event {
            BridgeEvent::Continue => {}
            BridgeEvent::MenuExit => {
                self.lifecycle.shutdown();
                return ControlFlow::Break(SessionOutcome::Exited);
            }
            BridgeEvent::Close => {
                self.lifecycle.shutdown();
                return ControlFlow::Break(SessionOutcome::Closed);
            }
        }

        let steps = context.options.steps_per_frame();
        if let Err(error) = self.run_steps(steps) {
            self.fatal.handle(error, self.lifecycle);
            return ControlFlow::Break(SessionOutcome::Faulted(error));
        }

        let (platform, _) = self.lifecycle.parts();
        if platform.video.display_control().output_enabled() {
            platform.display.render_frame(self.state.eye());
        }

        let stats = OverlayStats::new(
            &self.state,
            steps,
            frame_start.elapsed(),
            platform.cpu.cache_utilization(),
        );
        platform.diagnostics.write_overlay(&stats);

        platform.display.present();
        platform.display.wait_vblank();
        self.state.presented += 1;

        ControlFlow::Continue(())
    }

    /// Run `steps` engine steps, updating the eye selector after each one
    fn run_steps(&mut self, steps: u32) -> Result<(), EmulationError> {
        let (platform, _) = self.lifecycle.parts();
        for _ in 0..steps {
            if let Err(error) = platform.cpu.step() {
                self.state.pc = error.pc;
                return Err(error);
            }
            self.state.pc = platform.cpu.program_counter();
            self.state.stereo.observe_step(platform.video.frame_cycle());
            self.state.frame += 1;
        }
        tracing::trace!("Ran {} steps, PC=0x{:08x}", steps, self.state.pc);
        Ok(())
    }

    pub fn state(&self) -> &FrameState {
        &self.state
    }
}

/// Runs one emulation session from startup to shutdown
pub struct EmulatorRunner {
    lifecycle: LifecycleController,
    last_frame_state: Option<FrameState>,
}

impl EmulatorRunner {
    pub fn new(platform: Platform) -> Self {
        Self {
            lifecycle: LifecycleController::new(platform),
            last_frame_state: None,
        }
    }

    /// Start the platform, run the frame loop and shut down.
    ///
    /// Subsystems are released exactly once whichever way the run ends.
    pub fn run(&mut self) -> SessionOutcome {
        let outcome = match self.lifecycle.start() {
            Ok(()) => {
                let mut scheduler = FrameScheduler::new(&mut self.lifecycle);
                let outcome = scheduler.run();
                self.last_frame_state = Some(scheduler.state().clone());
                outcome
            }
            Err(abort) => {
                tracing::warn!("Startup aborted: {}", abort);
                SessionOutcome::Aborted(abort)
            }
        };

        self.lifecycle.shutdown();
        outcome
    }

    /// Frame state at the end of the last run, if the loop was entered
    pub fn frame_state(&self) -> Option<&FrameState> {
        self.last_frame_state.as_ref()
    }

    pub fn lifecycle(&self) -> &LifecycleController {
        &self.lifecycle
    }
}
