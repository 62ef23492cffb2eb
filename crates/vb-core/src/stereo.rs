//! Stereo eye selection
//!
//! The emulated display alternates between its left and right framebuffers
//! at a rate set by the frame cycle register. After every CPU-engine step the
//! step count is compared against the low byte of that register; reaching it
//! resets the count and switches eyes. The register is read fresh for every
//! step since the guest may rewrite it at any time.
//!
//! The count carries over when the threshold changes. Lowering the threshold
//! to or below the current count switches on the next step, and a threshold of
//! zero switches on every step.

use crate::platform::Eye;

/// Mask applied to the frame cycle register
pub const FRAME_CYCLE_MASK: u16 = 0x00FF;

/// Tracks steps since the last eye switch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EyeSelector {
    accumulator: u32,
    eye: Eye,
}

impl EyeSelector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Account for one completed step. Returns true if the eye switched.
    pub fn observe_step(&mut self, frame_cycle: u16) -> bool {
        let threshold = u32::from(frame_cycle & FRAME_CYCLE_MASK);
        self.accumulator += 1;

        if self.accumulator >= threshold {
            self.accumulator = 0;
            self.eye = self.eye.other();
            tracing::trace!("Eye switched to {:?} (threshold {})", self.eye, threshold);
            true
        } else {
            false
        }
    }

    /// Eye that receives the next rendered frame
    pub fn eye(&self) -> Eye {
        self.eye
    }

    pub fn accumulator(&self) -> u32 {
        self.accumulator
    }
}
