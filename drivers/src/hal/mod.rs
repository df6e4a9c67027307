//! Hardware Abstraction Layer (HAL) - Platform-Independent Traits
//!
//! This module defines generic traits for interacting with hardware
//! peripherals. These traits are implemented by platform-specific
//! drivers, allowing device code to be written in a platform-independent
//! manner and tested against simulated hardware.
//!
//! # Available Interfaces
//!
//! - [`gpio`]: General Purpose Input/Output control
//! - [`register_bank`]: Offset-addressed 32-bit register windows and their mapping

pub mod gpio;
pub mod register_bank;
