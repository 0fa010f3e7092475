use crate::error::Result;
use crate::gpio::OutputPin;
use std::sync::Arc;
use tracing::{info, warn};

const ON_VALUES: [&str; 4] = ["1", "on", "true", "True"];
const OFF_VALUES: [&str; 4] = ["0", "off", "false", "False"];

/// Desired fan state parsed from a control payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanCommand {
    On,
    Off,
}

impl FanCommand {
    /// Parse a payload. Anything that isn't a recognised "on" value switches the fan off.
    #[must_use]
    pub fn parse(payload: &str) -> Self {
        let payload = payload.trim();
        if ON_VALUES.contains(&payload) {
            Self::On
        } else {
            if !OFF_VALUES.contains(&payload) {
                warn!("Unrecognised fan payload {:?}, switching fan off", payload);
            }
            Self::Off
        }
    }

    #[must_use]
    pub const fn is_on(self) -> bool {
        matches!(self, Self::On)
    }
}

/// Fan relay on a single output pin.
pub struct FanController {
    pin: Arc<dyn OutputPin>,
}

impl FanController {
    #[must_use]
    pub fn new(pin: Arc<dyn OutputPin>) -> Self {
        Self { pin }
    }

    /// Apply a control payload and return the resulting fan state.
    ///
    /// # Errors
    ///
    /// Returns an error if the pin cannot be written or read back.
    pub fn apply(&self, payload: &str) -> Result<bool> {
        let command = FanCommand::parse(payload);
        self.pin.write(command.is_on())?;
        let state = self.pin.read()?;
        info!("Fan switched {}", if state { "on" } else { "off" });
        Ok(state)
    }

    /// # Errors
    ///
    /// Returns an error if the pin cannot be read.
    pub fn is_on(&self) -> Result<bool> {
        self.pin.read()
    }
}
