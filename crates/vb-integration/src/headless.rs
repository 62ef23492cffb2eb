//! Host-side collaborators for running without console hardware
//!
//! These let the binary and tests drive a full session on a desktop: the
//! display only paces vblanks, the CPU engine walks a synthetic program
//! counter through the loaded ROM, and diagnostics go to the log.

use crate::lifecycle::Platform;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, trace};
use vb_core::{
    AudioBackend, CpuEngine, DiagnosticsSink, DisplayBackend, DisplayControl, EmulationError, Eye,
    FileSystem, InputDevice, InputState, Menu, MenuOutcome, OptionsStore, OverlayStats,
    RomPicker, RuntimeOptions, VideoRegisters,
};

/// Host refresh interval (60 Hz)
pub const HOST_FRAME_TIME: Duration = Duration::from_micros(16667);

/// Largest ROM image the address space can map (16 MiB)
pub const MAX_ROM_SIZE: usize = 0x0100_0000;

/// Size of the synthetic recompilation cache
pub const CACHE_SIZE: usize = 0x0040_0000;

/// Base of ROM in the guest address space
const ROM_BASE: u32 = 0x0700_0000;

/// Reset vector
const RESET_PC: u32 = 0xFFFF_FFF0;

/// Bytes of cache consumed per step until the cache is full
const CACHE_BYTES_PER_STEP: usize = 64;

/// Error code reported when stepping without a ROM
pub const ERROR_NO_ROM: u32 = 1;

/// Display that presents nothing and paces vblank with the host clock
pub struct NullDisplay {
    frame_time: Duration,
    last_vblank: Instant,
    stereo: bool,
    frames_rendered: u64,
    frames_presented: u64,
    last_eye: Option<Eye>,
}

impl NullDisplay {
    pub fn new() -> Self {
        Self::with_frame_time(HOST_FRAME_TIME)
    }

    pub fn with_frame_time(frame_time: Duration) -> Self {
        Self {
            frame_time,
            last_vblank: Instant::now(),
            stereo: false,
            frames_rendered: 0,
            frames_presented: 0,
            last_eye: None,
        }
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }
}

impl Default for NullDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplayBackend for NullDisplay {
    fn init(&mut self) -> Result<(), String> {
        self.last_vblank = Instant::now();
        Ok(())
    }

    fn set_stereo_enabled(&mut self, enabled: bool) {
        self.stereo = enabled;
    }

    fn render_frame(&mut self, eye: Eye) {
        self.frames_rendered += 1;
        self.last_eye = Some(eye);
    }

    fn present(&mut self) {
        self.frames_presented += 1;
    }

    fn wait_vblank(&mut self) {
        let elapsed = self.last_vblank.elapsed();
        if elapsed < self.frame_time {
            std::thread::sleep(self.frame_time - elapsed);
        }
        self.last_vblank = Instant::now();
    }

    fn close(&mut self) {
        debug!(
            "Null display closed after {} rendered / {} presented frames",
            self.frames_rendered, self.frames_presented
        );
    }
}

/// Audio backend without output
#[derive(Debug, Default)]
pub struct NullAudio;

impl AudioBackend for NullAudio {
    fn init(&mut self) -> Result<(), String> {
        Ok(())
    }

    fn close(&mut self) {}
}

/// Host directory holding the ROMs
#[derive(Debug, Clone)]
pub struct HostFileSystem {
    root: PathBuf,
}

impl HostFileSystem {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl FileSystem for HostFileSystem {
    fn mount(&mut self) -> Result<(), String> {
        std::fs::create_dir_all(&self.root)
            .map_err(|e| format!("cannot mount {}: {}", self.root.display(), e))
    }

    fn unmount(&mut self) {}
}

/// CPU engine stand-in that maps the ROM and advances a synthetic PC
#[derive(Debug, Default)]
pub struct IdleCpuEngine {
    rom: Vec<u8>,
    pc: u32,
    cache_used: usize,
    steps: u64,
}

impl IdleCpuEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }
}

impl CpuEngine for IdleCpuEngine {
    fn init(&mut self) -> Result<(), String> {
        self.rom.clear();
        Ok(())
    }

    fn load_rom(&mut self, path: &Path) -> Result<(), String> {
        let rom = std::fs::read(path).map_err(|e| e.to_string())?;
        if rom.is_empty() || rom.len() > MAX_ROM_SIZE || !rom.len().is_power_of_two() {
            return Err(format!("unexpected ROM size {} bytes", rom.len()));
        }

        info!("Mapped {} KiB ROM", rom.len() / 1024);
        self.rom = rom;
        Ok(())
    }

    fn reset(&mut self) {
        self.pc = RESET_PC;
        self.steps = 0;
    }

    fn prime_cache(&mut self) {
        self.cache_used = 0;
    }

    fn step(&mut self) -> Result<(), EmulationError> {
        if self.rom.is_empty() {
            return Err(EmulationError::new(ERROR_NO_ROM, self.pc));
        }

        let mask = (self.rom.len() - 1) as u32;
        let offset = self.pc.wrapping_add(0x20) & mask;
        self.pc = ROM_BASE | offset;
        self.cache_used = (self.cache_used + CACHE_BYTES_PER_STEP).min(CACHE_SIZE);
        self.steps += 1;
        Ok(())
    }

    fn program_counter(&self) -> u32 {
        self.pc
    }

    fn cache_utilization(&self) -> f64 {
        self.cache_used as f64 / CACHE_SIZE as f64
    }

    fn close(&mut self) {
        self.rom = Vec::new();
    }
}

/// Video registers with fixed contents
#[derive(Debug, Clone, Copy)]
pub struct StaticVideoRegisters {
    pub display_control: DisplayControl,
    pub frame_cycle: u16,
}

impl Default for StaticVideoRegisters {
    fn default() -> Self {
        Self {
            display_control: DisplayControl::DISP,
            frame_cycle: 0,
        }
    }
}

impl VideoRegisters for StaticVideoRegisters {
    fn display_control(&self) -> DisplayControl {
        self.display_control
    }

    fn frame_cycle(&self) -> u16 {
        self.frame_cycle
    }
}

/// Picks the ROM given on the command line
#[derive(Debug, Clone, Default)]
pub struct ArgRomPicker {
    path: Option<PathBuf>,
}

impl ArgRomPicker {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }
}

impl RomPicker for ArgRomPicker {
    fn select_file(&mut self, prompt: &str, extension: &str) -> Option<String> {
        debug!("{} (*.{})", prompt, extension);
        let path = self.path.take()?;
        // Absolute, so joining onto the ROM directory keeps it unchanged
        let path = std::path::absolute(&path).unwrap_or(path);
        Some(path.to_string_lossy().into_owned())
    }
}

/// Input that never presses keys and asks to close after a number of polls
#[derive(Debug, Clone)]
pub struct ScriptedInput {
    polls_left: u64,
}

impl ScriptedInput {
    pub fn close_after(polls: u64) -> Self {
        Self { polls_left: polls }
    }
}

impl InputDevice for ScriptedInput {
    fn poll(&mut self) -> InputState {
        if self.polls_left == 0 {
            return InputState {
                close_requested: true,
                ..Default::default()
            };
        }
        self.polls_left -= 1;
        InputState::default()
    }

    /// Blocks on a line from stdin
    fn wait_for_key(&mut self) {
        let mut line = String::new();
        let _ = std::io::stdin().lock().read_line(&mut line);
    }
}

/// Menu that closes immediately without changes
#[derive(Debug, Default)]
pub struct NoMenu;

impl Menu for NoMenu {
    fn open(&mut self, _options: &mut RuntimeOptions) -> MenuOutcome {
        MenuOutcome::default()
    }
}

/// Diagnostics written to the log
#[derive(Debug, Default)]
pub struct TracingDiagnostics;

impl DiagnosticsSink for TracingDiagnostics {
    fn dump_state(&mut self, error: &EmulationError) {
        error!("State dump: code={} pc=0x{:08X}", error.code, error.pc);
    }

    fn write_overlay(&mut self, stats: &OverlayStats) {
        trace!("{}", stats.to_string().replace('\n', " | "));
    }

    fn message(&mut self, text: &str) {
        info!("{}", text);
    }
}

/// Desktop platform for one session.
///
/// `options` are the ones already read from `store`; the filesystem mounts
/// their ROM directory so it matches where startup resolves the ROM name.
pub fn platform(
    options: &RuntimeOptions,
    store: impl OptionsStore + 'static,
    rom: Option<PathBuf>,
    frames: u64,
) -> Platform {
    Platform {
        display: Box::new(NullDisplay::new()),
        filesystem: Box::new(HostFileSystem::new(options.paths.rom_dir.clone())),
        cpu: Box::new(IdleCpuEngine::new()),
        audio: Box::new(NullAudio),
        options_store: Box::new(store),
        rom_picker: Box::new(ArgRomPicker::new(rom)),
        menu: Box::new(NoMenu),
        diagnostics: Box::new(TracingDiagnostics),
        video: Box::new(StaticVideoRegisters::default()),
        input: Box::new(ScriptedInput::close_after(frames)),
    }
}
