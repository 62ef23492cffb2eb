//! Core types for the oxidized-vb Virtual Boy emulator
//!
//! This crate provides the error types, runtime options, logging setup,
//! collaborator interfaces and stereo frame bookkeeping shared by the
//! orchestration layer.

pub mod config;
pub mod error;
pub mod frame;
pub mod logging;
pub mod platform;
pub mod stereo;

pub use config::{DisplayMode, LogLevel, OptionsStore, RuntimeOptions, TomlOptionsStore};
pub use error::{ConfigError, EmulationError, StartupAbort, Subsystem};
pub use frame::{FrameState, OverlayStats};
pub use platform::{
    AudioBackend, CpuEngine, DiagnosticsSink, DisplayBackend, DisplayControl, Eye, FileSystem,
    InputDevice, InputState, Keys, Menu, MenuOutcome, RomPicker, VideoRegisters,
};
pub use stereo::EyeSelector;
