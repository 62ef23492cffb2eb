//! Subsystem startup and teardown
//!
//! The [`LifecycleController`] owns every platform collaborator and the
//! [`EmulatorContext`]. Subsystems are acquired in a fixed order and released
//! in reverse, once, no matter how the run ends.

use std::path::Path;
use tracing::{debug, info, warn};
use vb_core::{
    AudioBackend, CpuEngine, DiagnosticsSink, DisplayBackend, FileSystem, InputDevice, Menu,
    OptionsStore, RomPicker, RuntimeOptions, StartupAbort, Subsystem, VideoRegisters,
};

/// Prompt shown by the ROM picker
pub const ROM_PROMPT: &str = "Load ROM";

/// Extension accepted by the ROM picker
pub const ROM_EXTENSION: &str = "vb";

/// The collaborators a run is assembled from
pub struct Platform {
    pub display: Box<dyn DisplayBackend>,
    pub filesystem: Box<dyn FileSystem>,
    pub cpu: Box<dyn CpuEngine>,
    pub audio: Box<dyn AudioBackend>,
    pub options_store: Box<dyn OptionsStore>,
    pub rom_picker: Box<dyn RomPicker>,
    pub menu: Box<dyn Menu>,
    pub diagnostics: Box<dyn DiagnosticsSink>,
    pub video: Box<dyn VideoRegisters>,
    pub input: Box<dyn InputDevice>,
}

/// State shared by the frame loop and the menu for one run
#[derive(Debug, Clone, Default)]
pub struct EmulatorContext {
    pub options: RuntimeOptions,
    exit_requested: bool,
}

impl EmulatorContext {
    pub fn new(options: RuntimeOptions) -> Self {
        Self {
            options,
            exit_requested: false,
        }
    }

    /// Ask the frame loop to stop at the next iteration boundary
    pub fn request_exit(&mut self) {
        self.exit_requested = true;
    }

    pub fn exit_requested(&self) -> bool {
        self.exit_requested
    }
}

/// Acquires and releases platform subsystems
pub struct LifecycleController {
    pub(crate) platform: Platform,
    context: EmulatorContext,
    /// Acquired subsystems in acquisition order
    acquired: Vec<Subsystem>,
    started: bool,
    shut_down: bool,
}

impl LifecycleController {
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            context: EmulatorContext::default(),
            acquired: Vec::new(),
            started: false,
            shut_down: false,
        }
    }

    /// Bring the platform up and load a ROM.
    ///
    /// On error the subsystems acquired so far stay held until
    /// [`shutdown`](Self::shutdown) runs.
    pub fn start(&mut self) -> Result<(), StartupAbort> {
        info!("Starting platform subsystems");

        self.acquire(Subsystem::Display)?;
        self.acquire(Subsystem::FileSystem)?;

        self.context = EmulatorContext::new(self.load_options());

        self.acquire(Subsystem::CpuEngine)?;
        self.acquire(Subsystem::Audio)?;

        let stereo = self.context.options.display_mode.is_stereo();
        self.platform.display.set_stereo_enabled(stereo);
        debug!("Stereo output {}", if stereo { "enabled" } else { "disabled" });

        let name = self
            .platform
            .rom_picker
            .select_file(ROM_PROMPT, ROM_EXTENSION)
            .ok_or(StartupAbort::RomSelectionCancelled)?;
        let path = self.context.options.rom_path(&name);
        check_extension(&path)?;

        self.platform
            .cpu
            .load_rom(&path)
            .map_err(|reason| StartupAbort::InvalidRom {
                path: path.clone(),
                reason,
            })?;
        self.context.options.rom_name = Some(name);
        info!("Loaded ROM {}", path.display());

        self.platform.cpu.reset();
        self.platform.cpu.prime_cache();
        self.started = true;

        Ok(())
    }

    /// Options from the store, or persisted defaults if they can't be read
    fn load_options(&mut self) -> RuntimeOptions {
        match self.platform.options_store.load() {
            Ok(options) => options,
            Err(e) => {
                warn!("Failed to load options ({}), using defaults", e);
                let options = RuntimeOptions::default();
                if let Err(e) = self.platform.options_store.save(&options) {
                    warn!("Failed to save default options: {}", e);
                }
                options
            }
        }
    }

    fn acquire(&mut self, subsystem: Subsystem) -> Result<(), StartupAbort> {
        let result = match subsystem {
            Subsystem::Display => self.platform.display.init(),
            Subsystem::FileSystem => self.platform.filesystem.mount(),
            Subsystem::CpuEngine => self.platform.cpu.init(),
            Subsystem::Audio => self.platform.audio.init(),
        };
        result.map_err(|reason| StartupAbort::Subsystem { subsystem, reason })?;

        debug!("Acquired {}", subsystem);
        self.acquired.push(subsystem);
        Ok(())
    }

    fn release(&mut self, subsystem: Subsystem) {
        match subsystem {
            Subsystem::Display => self.platform.display.close(),
            Subsystem::FileSystem => self.platform.filesystem.unmount(),
            Subsystem::CpuEngine => self.platform.cpu.close(),
            Subsystem::Audio => self.platform.audio.close(),
        }
        debug!("Released {}", subsystem);
    }

    /// Release every acquired subsystem in reverse order.
    ///
    /// Only the first call does anything; returns whether this call did.
    pub fn shutdown(&mut self) -> bool {
        if self.shut_down {
            return false;
        }
        self.shut_down = true;

        info!("Shutting down");
        while let Some(subsystem) = self.acquired.pop() {
            self.release(subsystem);
        }
        true
    }

    /// True once `start` has completed successfully
    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    /// Subsystems currently held, in acquisition order
    pub fn acquired(&self) -> &[Subsystem] {
        &self.acquired
    }

    pub fn context(&self) -> &EmulatorContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut EmulatorContext {
        &mut self.context
    }

    pub(crate) fn parts(&mut self) -> (&mut Platform, &mut EmulatorContext) {
        (&mut self.platform, &mut self.context)
    }
}

impl Drop for LifecycleController {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn check_extension(path: &Path) -> Result<(), StartupAbort> {
    let matches = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(ROM_EXTENSION));

    if matches {
        Ok(())
    } else {
        Err(StartupAbort::InvalidRom {
            path: path.to_path_buf(),
            reason: format!("expected a .{} file", ROM_EXTENSION),
        })
    }
}
