//! Input polling and the in-game menu

use crate::lifecycle::EmulatorContext;
use tracing::{debug, info};
use vb_core::{DisplayBackend, InputDevice, Keys, Menu};

/// What the frame loop should do after polling input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeEvent {
    /// Run the next batch of steps
    Continue,
    /// The menu asked to exit
    MenuExit,
    /// The host asked the application to close
    Close,
}

/// Polls input once per frame and opens the menu on the menu gesture
#[derive(Debug, Clone)]
pub struct InputBridge {
    menu_gesture: Keys,
}

impl Default for InputBridge {
    fn default() -> Self {
        Self::new(Keys::TOUCH)
    }
}

impl InputBridge {
    pub fn new(menu_gesture: Keys) -> Self {
        Self { menu_gesture }
    }

    /// Poll the device. If the gesture fired, run the menu to completion
    /// before returning, then check the exit signal.
    pub fn poll(
        &self,
        input: &mut dyn InputDevice,
        menu: &mut dyn Menu,
        display: &mut dyn DisplayBackend,
        context: &mut EmulatorContext,
    ) -> BridgeEvent {
        let state = input.poll();
        if state.close_requested {
            info!("Close requested by host");
            return BridgeEvent::Close;
        }

        if state.keys_down.intersects(self.menu_gesture) {
            debug!("Opening menu");
            let stereo_before = context.options.display_mode.is_stereo();
            let outcome = menu.open(&mut context.options);
            if outcome.exit_requested {
                context.request_exit();
            }

            let stereo_after = context.options.display_mode.is_stereo();
            if stereo_after != stereo_before {
                display.set_stereo_enabled(stereo_after);
            }
            debug!("Menu closed");
        }

        if context.exit_requested() {
            info!("Exit requested from menu");
            BridgeEvent::MenuExit
        } else {
            BridgeEvent::Continue
        }
    }
}
