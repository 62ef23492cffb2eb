//! Collaborator interfaces driven by the orchestration layer
//!
//! The CPU recompiler, display/audio backends, menu UI and the rest of the
//! platform are supplied from outside. This module fixes the calls the frame
//! loop and lifecycle controller make into them.

use crate::config::RuntimeOptions;
use crate::error::EmulationError;
use crate::frame::OverlayStats;
use bitflags::bitflags;
use std::path::Path;

bitflags! {
    /// Display control register (DPCTRL)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DisplayControl: u16 {
        const DPRST  = 0x0001;
        /// Video output enabled
        const DISP   = 0x0002;
        const DPBSY  = 0x003C;
        const SCANRDY = 0x0040;
        const FCLK   = 0x0080;
        const RE     = 0x0100;
        const SYNCE  = 0x0200;
        const LOCK   = 0x0400;
    }
}

impl DisplayControl {
    pub fn output_enabled(self) -> bool {
        self.contains(Self::DISP)
    }
}

bitflags! {
    /// Keys newly pressed since the previous poll
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Keys: u32 {
        const A      = 1 << 0;
        const B      = 1 << 1;
        const SELECT = 1 << 2;
        const START  = 1 << 3;
        const DRIGHT = 1 << 4;
        const DLEFT  = 1 << 5;
        const DUP    = 1 << 6;
        const DDOWN  = 1 << 7;
        const R      = 1 << 8;
        const L      = 1 << 9;
        const X      = 1 << 10;
        const Y      = 1 << 11;
        /// Touch screen tap, opens the menu
        const TOUCH  = 1 << 20;
    }
}

/// Result of one input poll
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputState {
    pub keys_down: Keys,
    /// The host asked the application to close
    pub close_requested: bool,
}

/// Stereoscopic output buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Eye {
    #[default]
    Left,
    Right,
}

impl Eye {
    pub fn other(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

/// Value returned when the menu closes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MenuOutcome {
    pub exit_requested: bool,
}

/// Recompiling CPU engine
pub trait CpuEngine {
    fn init(&mut self) -> Result<(), String>;

    /// Map a ROM image into the guest address space
    fn load_rom(&mut self, path: &Path) -> Result<(), String>;

    /// Reset architectural state
    fn reset(&mut self);

    /// Prepare the recompilation cache for execution
    fn prime_cache(&mut self);

    /// Run one step (one emulated frame worth of guest code)
    fn step(&mut self) -> Result<(), EmulationError>;

    fn program_counter(&self) -> u32;

    /// Fraction of the recompilation cache in use, 0.0 to 1.0
    fn cache_utilization(&self) -> f64;

    fn close(&mut self);
}

/// Display backend
pub trait DisplayBackend {
    fn init(&mut self) -> Result<(), String>;
    fn set_stereo_enabled(&mut self, enabled: bool);
    fn render_frame(&mut self, eye: Eye);
    fn present(&mut self);

    /// Block until the next vertical blank
    fn wait_vblank(&mut self);

    fn close(&mut self);
}

/// Audio backend
pub trait AudioBackend {
    fn init(&mut self) -> Result<(), String>;
    fn close(&mut self);
}

/// Storage holding ROMs and the options file
pub trait FileSystem {
    fn mount(&mut self) -> Result<(), String>;
    fn unmount(&mut self);
}

/// Interactive ROM chooser
pub trait RomPicker {
    /// Returns the chosen file name, `None` if the user cancelled
    fn select_file(&mut self, prompt: &str, extension: &str) -> Option<String>;
}

/// In-game menu. May edit options and ask the emulator to exit.
pub trait Menu {
    fn open(&mut self, options: &mut RuntimeOptions) -> MenuOutcome;
}

/// Debug console and state dumps
pub trait DiagnosticsSink {
    /// Dump engine state after a fault
    fn dump_state(&mut self, error: &EmulationError);
    fn write_overlay(&mut self, stats: &OverlayStats);
    fn message(&mut self, text: &str);
}

/// Emulated video-controller registers, read live
pub trait VideoRegisters {
    fn display_control(&self) -> DisplayControl;

    /// Frame cycle register (FRMCYC); the low byte is the step threshold
    fn frame_cycle(&self) -> u16;
}

/// Input device
pub trait InputDevice {
    fn poll(&mut self) -> InputState;

    /// Block until any key is pressed. There is no timeout.
    fn wait_for_key(&mut self);
}
