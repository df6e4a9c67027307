//! Device configuration.

use drivers::hw::bcm2835::gpio::{GPIO_BANK_SIZE, GPIO_BASE, MAX_PIN};
use drivers::platform::bcm2835::gpio::GpioError;

use crate::device::STATUS_LEN;
use crate::error::ActivationError;

/// Default buffer capacity: one page.
pub const PAGE_SIZE: usize = 4096;

/// GPIO line the LED is wired to on the reference board.
pub const LED_PIN: u8 = 17;

/// Node name of the LED variant.
pub const LED_DEVICE_NAME: &str = "gpio_led";

/// Node name of the plain-buffer variant.
pub const BUFFER_DEVICE_NAME: &str = "simple_dev";

/// Register window and line driven by a control-capable device.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PinConfig {
    /// GPIO line number.
    pub pin: u8,
    /// Physical base of the GPIO register window.
    pub register_base: usize,
    /// Size of the register window in bytes.
    pub register_size: usize,
}

impl PinConfig {
    /// `pin` on the platform's GPIO controller.
    pub const fn new(pin: u8) -> Self {
        Self {
            pin,
            register_base: GPIO_BASE,
            register_size: GPIO_BANK_SIZE,
        }
    }
}

/// Whether a device carries a pin controller.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DeviceMode {
    /// Plain buffer: cursor-based reads and writes only.
    Buffer,
    /// Buffer plus a GPIO output controlled by `'1'` / `'0'` writes.
    PinControl(PinConfig),
}

/// Activation parameters of a [`Device`](crate::Device).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DeviceConfig {
    /// Node name, also used as the log prefix.
    pub name: &'static str,
    /// Buffer capacity in bytes.
    pub capacity: usize,
    pub mode: DeviceMode,
}

impl DeviceConfig {
    /// Plain-buffer device of `capacity` bytes.
    pub const fn buffer(capacity: usize) -> Self {
        Self {
            name: BUFFER_DEVICE_NAME,
            capacity,
            mode: DeviceMode::Buffer,
        }
    }

    /// LED device on `pin` with a one-page buffer.
    pub const fn pin_control(pin: u8) -> Self {
        Self {
            name: LED_DEVICE_NAME,
            capacity: PAGE_SIZE,
            mode: DeviceMode::PinControl(PinConfig::new(pin)),
        }
    }

    pub const fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    pub const fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Check the parameters before anything is acquired.
    ///
    /// An LED device must hold a whole status line, since serving it moves
    /// the session cursor past the status bytes.
    pub fn validate(&self) -> Result<(), ActivationError> {
        if self.capacity == 0 {
            return Err(ActivationError::InvalidConfig);
        }
        if let DeviceMode::PinControl(pin) = self.mode {
            if self.capacity < STATUS_LEN {
                return Err(ActivationError::InvalidConfig);
            }
            if pin.pin > MAX_PIN {
                return Err(ActivationError::Gpio(GpioError::InvalidPin));
            }
        }
        Ok(())
    }

    pub fn is_control_capable(&self) -> bool {
        matches!(self.mode, DeviceMode::PinControl(_))
    }
}

impl Default for DeviceConfig {
    /// Default configuration: LED on GPIO 17, 4 KiB buffer.
    fn default() -> Self {
        Self::pin_control(LED_PIN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_the_led_on_gpio17() {
        let config = DeviceConfig::default();
        assert_eq!(config.name, "gpio_led");
        assert_eq!(config.capacity, 4096);
        assert_eq!(
            config.mode,
            DeviceMode::PinControl(PinConfig {
                pin: 17,
                register_base: GPIO_BASE,
                register_size: 0x1000,
            })
        );
    }

    #[test]
    fn validate_rejects_empty_buffer_and_bad_pin() {
        assert_eq!(
            DeviceConfig::buffer(0).validate(),
            Err(ActivationError::InvalidConfig)
        );
        assert_eq!(
            DeviceConfig::pin_control(54).validate(),
            Err(ActivationError::Gpio(GpioError::InvalidPin))
        );
        assert!(DeviceConfig::buffer(1).validate().is_ok());
    }

    #[test]
    fn led_buffer_must_fit_the_status_line() {
        let led = DeviceConfig::default();
        assert_eq!(
            led.with_capacity(STATUS_LEN - 1).validate(),
            Err(ActivationError::InvalidConfig)
        );
        assert!(led.with_capacity(STATUS_LEN).validate().is_ok());
        assert!(DeviceConfig::buffer(STATUS_LEN - 1).validate().is_ok());
    }

    #[test]
    fn renamed_config_keeps_its_mode() {
        let config = DeviceConfig::pin_control(4).with_name("status_led");
        assert_eq!(config.name, "status_led");
        assert!(config.is_control_capable());
        assert!(!DeviceConfig::buffer(8).with_name("scratch").is_control_capable());
    }
}
