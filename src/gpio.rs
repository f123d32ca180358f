//! Supply pin of the bus interface board
//!
//! The level shifter on the PPS interface board is powered from header
//! pin 12 (BCM GPIO 18), which has to be driven high before any byte can be
//! received.

use crate::error::PpsError;
use rppal::gpio::{Gpio, OutputPin};

/// BCM number of header pin 12
pub const SUPPLY_PIN: u8 = 18;

/// Holds the supply pin high until dropped
#[derive(Debug)]
pub struct BoardSupply {
    pin: OutputPin,
}

impl BoardSupply {
    pub fn enable() -> Result<Self, PpsError> {
        Self::enable_pin(SUPPLY_PIN)
    }

    pub fn enable_pin(bcm_pin: u8) -> Result<Self, PpsError> {
        let gpio = Gpio::new().map_err(|e| PpsError::Gpio(format!("GPIO initialization failed: {e}")))?;
        let pin = gpio
            .get(bcm_pin)
            .map_err(|e| PpsError::Gpio(format!("Failed to get pin {bcm_pin}: {e}")))?
            .into_output_high();
        log::info!("Interface board supply enabled on GPIO {bcm_pin}");
        Ok(BoardSupply { pin })
    }

    pub fn pin(&self) -> u8 {
        self.pin.pin()
    }
}

impl Drop for BoardSupply {
    fn drop(&mut self) {
        self.pin.set_low();
        log::debug!("Interface board supply released");
    }
}
