//! GPIO drivers over mapped register banks.
//!
//! - [`hal`]: register bank and output pin traits
//! - [`hw`]: raw BCM283x register layout, MMIO banks, simulated banks
//! - [`platform`]: the BCM2835 pin controller
//!
//! # Example
//!
//! ```no_run
//! use drivers::hal::register_bank::RegisterMapper;
//! use drivers::hw::bcm2835::gpio::{GPIO_BASE, GPIO_BANK_SIZE, IdentityMapper};
//! use drivers::platform::bcm2835::gpio::PinController;
//!
//! let mapper = unsafe { IdentityMapper::new() };
//! let bank = mapper.map(GPIO_BASE, GPIO_BANK_SIZE).unwrap();
//! let mut led = PinController::new(bank, 17).unwrap();
//! led.configure_output();
//! led.drive_high();
//! ```

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod hal;
pub mod hw;
pub mod platform;

pub use hal::gpio::{OutputPin, PinLevel, StatefulOutputPin};
pub use hal::register_bank::{MapError, RegisterBank, RegisterMapper};
