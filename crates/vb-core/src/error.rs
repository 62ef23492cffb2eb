//! Error types for the oxidized-vb emulator

use std::path::PathBuf;
use thiserror::Error;

/// Fault raised by a failed CPU-engine step.
///
/// Terminal for the run: the engine is never stepped again once one of
/// these has been observed.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("engine error #{code} @ PC=0x{pc:08X}")]
pub struct EmulationError {
    /// Engine-specific error code
    pub code: u32,
    /// Guest program counter at the time of the fault
    pub pc: u32,
}

impl EmulationError {
    pub fn new(code: u32, pc: u32) -> Self {
        Self { code, pc }
    }
}

/// Reasons startup can stop before the frame loop begins
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StartupAbort {
    #[error("ROM selection cancelled")]
    RomSelectionCancelled,

    #[error("Invalid ROM {}: {reason}", .path.display())]
    InvalidRom { path: PathBuf, reason: String },

    #[error("{subsystem} initialization failed: {reason}")]
    Subsystem { subsystem: Subsystem, reason: String },
}

/// Options persistence errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Platform subsystems owned by the lifecycle controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subsystem {
    Display,
    FileSystem,
    CpuEngine,
    Audio,
}

impl std::fmt::Display for Subsystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Display => write!(f, "display"),
            Self::FileSystem => write!(f, "filesystem"),
            Self::CpuEngine => write!(f, "CPU engine"),
            Self::Audio => write!(f, "audio"),
        }
    }
}
