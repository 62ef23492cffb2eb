//! Per-run frame loop state and diagnostic statistics

use crate::platform::Eye;
use crate::stereo::EyeSelector;
use std::fmt;
use std::time::Duration;

/// Mutable state of one frame loop run. Never persisted.
#[derive(Debug, Clone, Default)]
pub struct FrameState {
    /// CPU-engine steps completed (one emulated frame each)
    pub frame: u64,
    /// Host frames presented
    pub presented: u64,
    /// Program counter after the most recent step
    pub pc: u32,
    pub stereo: EyeSelector,
}

impl FrameState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eye(&self) -> Eye {
        self.stereo.eye()
    }
}

/// Operator-facing statistics written to the overlay each frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayStats {
    /// Emulated frames per second over the measured interval
    pub fps: f64,
    pub frame: u64,
    pub pc: u32,
    /// Recompilation cache use in percent
    pub cache_percent: f64,
    /// Steps run in the measured interval
    pub steps: u32,
    /// Time from the start of the iteration to the overlay write
    pub elapsed: Duration,
}

impl OverlayStats {
    pub fn new(state: &FrameState, steps: u32, elapsed: Duration, cache_utilization: f64) -> Self {
        Self {
            fps: frames_per_second(steps, elapsed),
            frame: state.frame,
            pc: state.pc,
            cache_percent: cache_utilization * 100.0,
            steps,
            elapsed,
        }
    }
}

/// `steps * 1000 / elapsed_ms`, or 0.0 when no time was measured
pub fn frames_per_second(steps: u32, elapsed: Duration) -> f64 {
    let elapsed_ms = elapsed.as_micros() as f64 / 1000.0;
    if elapsed_ms > 0.0 {
        f64::from(steps) * 1000.0 / elapsed_ms
    } else {
        0.0
    }
}

impl fmt::Display for OverlayStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "FPS: {:.2}\nFrame: {}\nPC: 0x{:x}\nDRC cache: {:.2}%",
            self.fps, self.frame, self.pc, self.cache_percent
        )
    }
}
