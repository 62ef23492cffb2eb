//! Execution orchestration layer for oxidized-vb
//!
//! This crate drives a recompiling CPU engine at the host display cadence,
//! owning startup and teardown of the platform subsystems around it.

pub mod fatal;
pub mod headless;
pub mod input;
pub mod lifecycle;
pub mod runner;

pub use fatal::FatalErrorHandler;
pub use input::{BridgeEvent, InputBridge};
pub use lifecycle::{EmulatorContext, LifecycleController, Platform};
pub use runner::{EmulatorRunner, FrameScheduler, SessionOutcome};
