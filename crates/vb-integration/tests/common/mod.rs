//! Recording collaborators for scenario tests
//!
//! Every mock appends to one shared call log so tests can assert on the
//! exact interleaving of calls across subsystems.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use vb_core::{
    AudioBackend, ConfigError, CpuEngine, DiagnosticsSink, DisplayBackend, DisplayControl,
    DisplayMode, EmulationError, Eye, FileSystem, InputDevice, InputState, Keys, Menu,
    MenuOutcome, OptionsStore, OverlayStats, RomPicker, RuntimeOptions, Subsystem, VideoRegisters,
};
use vb_integration::Platform;

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Init(Subsystem),
    Close(Subsystem),
    SetStereo(bool),
    Render(Eye),
    Present,
    WaitVBlank,
    LoadRom(PathBuf),
    Reset,
    PrimeCache,
    Step,
    OptionsLoad,
    OptionsSave(RuntimeOptions),
    SelectFile { prompt: String, extension: String },
    MenuOpen,
    MenuClosed,
    DumpState(EmulationError),
    Overlay(OverlayStats),
    Message(String),
    Poll,
    WaitKey,
}

pub type Log = Rc<RefCell<Vec<Event>>>;

/// Changes a menu visit applies
#[derive(Debug, Clone, Default)]
pub struct MenuAction {
    pub frame_skip: Option<u32>,
    pub display_mode: Option<DisplayMode>,
    pub exit: bool,
}

/// Describes how the mocks behave for one run
#[derive(Debug, Clone)]
pub struct Scenario {
    /// `None` makes loading fail
    pub stored_options: Option<RuntimeOptions>,
    /// `None` cancels selection
    pub rom: Option<String>,
    pub rom_error: Option<String>,
    pub failing_init: Option<Subsystem>,
    /// Fail the nth step (1-based)
    pub fault: Option<(u64, EmulationError)>,
    pub display_control: DisplayControl,
    /// Frame cycle values returned by successive reads; the last one repeats
    pub frame_cycles: Vec<u16>,
    /// Polls to return before the host requests a close
    pub inputs: VecDeque<InputState>,
    pub menu_actions: VecDeque<MenuAction>,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            stored_options: Some(RuntimeOptions::default()),
            rom: Some("mario_tennis.vb".to_string()),
            rom_error: None,
            failing_init: None,
            fault: None,
            display_control: DisplayControl::DISP,
            frame_cycles: vec![0],
            inputs: VecDeque::new(),
            menu_actions: VecDeque::new(),
        }
    }
}

impl Scenario {
    pub fn with_frame_skip(mut self, frame_skip: u32) -> Self {
        let mut options = self.stored_options.take().unwrap_or_default();
        options.frame_skip = frame_skip;
        self.stored_options = Some(options);
        self
    }

    /// `count` idle polls before the close request
    pub fn idle_frames(mut self, count: usize) -> Self {
        self.inputs.extend(std::iter::repeat(InputState::default()).take(count));
        self
    }

    pub fn touch(mut self) -> Self {
        self.inputs.push_back(InputState {
            keys_down: Keys::TOUCH,
            close_requested: false,
        });
        self
    }

    pub fn build(self) -> (Platform, Log, Counters) {
        let log: Log = Rc::new(RefCell::new(Vec::new()));
        let counters = Counters::default();

        let platform = Platform {
            display: Box::new(MockDisplay {
                log: log.clone(),
                fail: self.failing_init == Some(Subsystem::Display),
            }),
            filesystem: Box::new(MockFileSystem {
                log: log.clone(),
                fail: self.failing_init == Some(Subsystem::FileSystem),
            }),
            cpu: Box::new(MockCpu {
                log: log.clone(),
                fail: self.failing_init == Some(Subsystem::CpuEngine),
                rom_error: self.rom_error,
                fault: self.fault,
                steps: 0,
                pc: 0,
            }),
            audio: Box::new(MockAudio {
                log: log.clone(),
                fail: self.failing_init == Some(Subsystem::Audio),
            }),
            options_store: Box::new(MockOptionsStore {
                log: log.clone(),
                stored: self.stored_options,
            }),
            rom_picker: Box::new(MockRomPicker {
                log: log.clone(),
                rom: self.rom,
            }),
            menu: Box::new(MockMenu {
                log: log.clone(),
                actions: self.menu_actions,
            }),
            diagnostics: Box::new(MockDiagnostics { log: log.clone() }),
            video: Box::new(MockVideo {
                display_control: self.display_control,
                frame_cycles: self.frame_cycles,
                counters: counters.clone(),
            }),
            input: Box::new(MockInput {
                log: log.clone(),
                inputs: self.inputs,
            }),
        };

        (platform, log, counters)
    }
}

/// Counters that aren't part of the call log
#[derive(Debug, Clone, Default)]
pub struct Counters {
    pub frame_cycle_reads: Rc<RefCell<usize>>,
}

pub fn count(log: &Log, pred: impl Fn(&Event) -> bool) -> usize {
    log.borrow().iter().filter(|e| pred(e)).count()
}

pub fn position(log: &Log, pred: impl Fn(&Event) -> bool) -> Option<usize> {
    log.borrow().iter().position(pred)
}

pub fn closes(log: &Log) -> Vec<Subsystem> {
    log.borrow()
        .iter()
        .filter_map(|e| match e {
            Event::Close(s) => Some(*s),
            _ => None,
        })
        .collect()
}

/// Steps logged between consecutive polls, one entry per polled iteration
pub fn steps_per_iteration(log: &Log) -> Vec<usize> {
    let mut batches = Vec::new();
    for event in log.borrow().iter() {
        match event {
            Event::Poll => batches.push(0),
            Event::Step => {
                if let Some(last) = batches.last_mut() {
                    *last += 1;
                }
            }
            _ => {}
        }
    }
    batches
}

struct MockDisplay {
    log: Log,
    fail: bool,
}

impl DisplayBackend for MockDisplay {
    fn init(&mut self) -> Result<(), String> {
        if self.fail {
            return Err("no framebuffer".to_string());
        }
        self.log.borrow_mut().push(Event::Init(Subsystem::Display));
        Ok(())
    }

    fn set_stereo_enabled(&mut self, enabled: bool) {
        self.log.borrow_mut().push(Event::SetStereo(enabled));
    }

    fn render_frame(&mut self, eye: Eye) {
        self.log.borrow_mut().push(Event::Render(eye));
    }

    fn present(&mut self) {
        self.log.borrow_mut().push(Event::Present);
    }

    fn wait_vblank(&mut self) {
        self.log.borrow_mut().push(Event::WaitVBlank);
    }

    fn close(&mut self) {
        self.log.borrow_mut().push(Event::Close(Subsystem::Display));
    }
}

struct MockFileSystem {
    log: Log,
    fail: bool,
}

impl FileSystem for MockFileSystem {
    fn mount(&mut self) -> Result<(), String> {
        if self.fail {
            return Err("no sd card".to_string());
        }
        self.log.borrow_mut().push(Event::Init(Subsystem::FileSystem));
        Ok(())
    }

    fn unmount(&mut self) {
        self.log.borrow_mut().push(Event::Close(Subsystem::FileSystem));
    }
}

struct MockCpu {
    log: Log,
    fail: bool,
    rom_error: Option<String>,
    fault: Option<(u64, EmulationError)>,
    steps: u64,
    pc: u32,
}

impl CpuEngine for MockCpu {
    fn init(&mut self) -> Result<(), String> {
        if self.fail {
            return Err("out of code memory".to_string());
        }
        self.log.borrow_mut().push(Event::Init(Subsystem::CpuEngine));
        Ok(())
    }

    fn load_rom(&mut self, path: &Path) -> Result<(), String> {
        self.log.borrow_mut().push(Event::LoadRom(path.to_path_buf()));
        match &self.rom_error {
            Some(reason) => Err(reason.clone()),
            None => Ok(()),
        }
    }

    fn reset(&mut self) {
        self.pc = 0xFFFF_FFF0;
        self.log.borrow_mut().push(Event::Reset);
    }

    fn prime_cache(&mut self) {
        self.log.borrow_mut().push(Event::PrimeCache);
    }

    fn step(&mut self) -> Result<(), EmulationError> {
        self.log.borrow_mut().push(Event::Step);
        self.steps += 1;
        if let Some((at, error)) = self.fault {
            if self.steps == at {
                return Err(error);
            }
        }
        self.pc = 0x0700_0000 + (self.steps as u32) * 4;
        Ok(())
    }

    fn program_counter(&self) -> u32 {
        self.pc
    }

    fn cache_utilization(&self) -> f64 {
        0.5
    }

    fn close(&mut self) {
        self.log.borrow_mut().push(Event::Close(Subsystem::CpuEngine));
    }
}

struct MockAudio {
    log: Log,
    fail: bool,
}

impl AudioBackend for MockAudio {
    fn init(&mut self) -> Result<(), String> {
        if self.fail {
            return Err("no dsp firmware".to_string());
        }
        self.log.borrow_mut().push(Event::Init(Subsystem::Audio));
        Ok(())
    }

    fn close(&mut self) {
        self.log.borrow_mut().push(Event::Close(Subsystem::Audio));
    }
}

struct MockOptionsStore {
    log: Log,
    stored: Option<RuntimeOptions>,
}

impl OptionsStore for MockOptionsStore {
    fn load(&mut self) -> Result<RuntimeOptions, ConfigError> {
        self.log.borrow_mut().push(Event::OptionsLoad);
        self.stored.clone().ok_or_else(|| {
            ConfigError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "options.toml",
            ))
        })
    }

    fn save(&mut self, options: &RuntimeOptions) -> Result<(), ConfigError> {
        self.log.borrow_mut().push(Event::OptionsSave(options.clone()));
        Ok(())
    }
}

struct MockRomPicker {
    log: Log,
    rom: Option<String>,
}

impl RomPicker for MockRomPicker {
    fn select_file(&mut self, prompt: &str, extension: &str) -> Option<String> {
        self.log.borrow_mut().push(Event::SelectFile {
            prompt: prompt.to_string(),
            extension: extension.to_string(),
        });
        self.rom.clone()
    }
}

struct MockMenu {
    log: Log,
    actions: VecDeque<MenuAction>,
}

impl Menu for MockMenu {
    fn open(&mut self, options: &mut RuntimeOptions) -> MenuOutcome {
        self.log.borrow_mut().push(Event::MenuOpen);
        let action = self.actions.pop_front().unwrap_or_default();
        if let Some(frame_skip) = action.frame_skip {
            options.frame_skip = frame_skip;
        }
        if let Some(mode) = action.display_mode {
            options.display_mode = mode;
        }
        self.log.borrow_mut().push(Event::MenuClosed);
        MenuOutcome {
            exit_requested: action.exit,
        }
    }
}

struct MockDiagnostics {
    log: Log,
}

impl DiagnosticsSink for MockDiagnostics {
    fn dump_state(&mut self, error: &EmulationError) {
        self.log.borrow_mut().push(Event::DumpState(*error));
    }

    fn write_overlay(&mut self, stats: &OverlayStats) {
        self.log.borrow_mut().push(Event::Overlay(*stats));
    }

    fn message(&mut self, text: &str) {
        self.log.borrow_mut().push(Event::Message(text.to_string()));
    }
}

struct MockVideo {
    display_control: DisplayControl,
    frame_cycles: Vec<u16>,
    counters: Counters,
}

impl VideoRegisters for MockVideo {
    fn display_control(&self) -> DisplayControl {
        self.display_control
    }

    fn frame_cycle(&self) -> u16 {
        let mut reads = self.counters.frame_cycle_reads.borrow_mut();
        let value = self
            .frame_cycles
            .get(*reads)
            .or(self.frame_cycles.last())
            .copied()
            .unwrap_or(0);
        *reads += 1;
        value
    }
}

struct MockInput {
    log: Log,
    inputs: VecDeque<InputState>,
}

impl InputDevice for MockInput {
    fn poll(&mut self) -> InputState {
        self.log.borrow_mut().push(Event::Poll);
        self.inputs.pop_front().unwrap_or(InputState {
            keys_down: Keys::empty(),
            close_requested: true,
        })
    }

    fn wait_for_key(&mut self) {
        self.log.borrow_mut().push(Event::WaitKey);
    }
}
