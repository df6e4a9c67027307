//! BCM2835 GPIO Output Driver
//!
//! [`PinController`] drives one GPIO line through a mapped register bank.
//! Function selection is a read-modify-write of the shared GPFSELn
//! register; driving the line uses the write-only GPSETn/GPCLRn registers,
//! so it never touches other pins' bits.
//!
//! GPSET/GPCLR cannot be read back, so the controller keeps the last
//! commanded level and reports that.

use core::convert::Infallible;
use core::fmt;

use log::info;

use crate::hal::gpio::{OutputPin, PinLevel, StatefulOutputPin};
use crate::hal::register_bank::RegisterBank;
use crate::hw::bcm2835::gpio::{
    FuncSelect, GPCLR0, GPIO_REGS_END, GPSET0, MAX_PIN, fsel_location, pin_reg_and_bit,
};

fn check_pin(pin: u8) -> Result<(), GpioError> {
    if pin <= MAX_PIN {
        Ok(())
    } else {
        Err(GpioError::InvalidPin)
    }
}

/// Driver for a single GPIO output line.
pub struct PinController<B> {
    bank: B,
    pin: u8,
    level: PinLevel,
}

impl<B: RegisterBank> PinController<B> {
    /// Take ownership of `bank` to drive `pin`.
    ///
    /// No register is touched; call [`configure_output`](Self::configure_output)
    /// before driving the line. The logical level starts low.
    pub fn new(bank: B, pin: u8) -> Result<Self, GpioError> {
        check_pin(pin)?;
        if bank.size() < GPIO_REGS_END {
            return Err(GpioError::BankTooSmall);
        }

        Ok(Self {
            bank,
            pin,
            level: PinLevel::Low,
        })
    }

    /// Program the pin's 3-bit function select field.
    ///
    /// Bits belonging to the other nine pins of the register are preserved.
    pub fn set_function(&mut self, func: FuncSelect) {
        let (offset, shift) = fsel_location(self.pin);
        let mask = 0b111 << shift;

        self.bank
            .modify32(offset, |fsel| (fsel & !mask) | ((func as u32) << shift));
    }

    /// Configure the pin as a push-pull output. Idempotent.
    pub fn configure_output(&mut self) {
        self.set_function(FuncSelect::Output);
        info!("gpio: configured pin {} as output", self.pin);
    }

    /// Drive the pin high with a single write to GPSETn.
    pub fn drive_high(&mut self) {
        let (reg, bit) = pin_reg_and_bit(self.pin);
        self.bank.write32(GPSET0 + reg, bit);
        self.level = PinLevel::High;
        info!("gpio: pin {} ON", self.pin);
    }

    /// Drive the pin low with a single write to GPCLRn.
    pub fn drive_low(&mut self) {
        let (reg, bit) = pin_reg_and_bit(self.pin);
        self.bank.write32(GPCLR0 + reg, bit);
        self.level = PinLevel::Low;
        info!("gpio: pin {} OFF", self.pin);
    }

    /// Last commanded level. Performs no register access.
    pub fn level(&self) -> PinLevel {
        self.level
    }

    /// `true` if the pin was last driven high.
    pub fn is_on(&self) -> bool {
        self.level.into()
    }
}

impl<B> fmt::Debug for PinController<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PinController")
            .field("pin", &self.pin)
            .field("level", &self.level)
            .finish()
    }
}

impl<B: RegisterBank> OutputPin for PinController<B> {
    type Error = Infallible;

    fn set_level(&mut self, level: PinLevel) -> Result<(), Self::Error> {
        match level {
            PinLevel::High => self.drive_high(),
            PinLevel::Low => self.drive_low(),
        }
        Ok(())
    }
}

impl<B: RegisterBank> StatefulOutputPin for PinController<B> {
    fn output_level(&self) -> PinLevel {
        self.level
    }
}

/// GPIO errors.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum GpioError {
    /// The requested pin number is outside the valid range.
    InvalidPin,
    /// The register bank does not span the set/clear registers.
    BankTooSmall,
}

impl fmt::Display for GpioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpioError::InvalidPin => write!(f, "invalid GPIO pin"),
            GpioError::BankTooSmall => write!(f, "register bank too small for GPIO"),
        }
    }
}
