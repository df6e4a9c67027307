//! Character device layer
//!
//! A [`Device`] exposes a fixed-capacity byte buffer through
//! open/read/write/close semantics and, in its LED variant, routes the
//! one-byte commands `'1'` and `'0'` to a GPIO output driven through a
//! mapped register bank.
//!
//! # Module Organization
//!
//! - [`config`]: Device configuration and platform defaults
//! - [`channel`]: The buffered byte store
//! - [`device`]: Activation, locking, command routing, deactivation
//! - [`session`]: Per-caller cursor
//! - [`registry`]: Named device nodes
//! - [`fd`]: Integer handle table for callers
//! - [`uaccess`]: Copies across the caller memory boundary
//!
//! # Usage Example
//!
//! ```
//! use chardev::{Device, DeviceConfig};
//! use drivers::hw::sim::SimMapper;
//!
//! let mapper = SimMapper::new();
//! let led = Device::activate(&DeviceConfig::default(), &mapper).unwrap();
//!
//! let mut session = led.open();
//! led.write(&mut session, b"1").unwrap();
//!
//! let mut status = [0u8; 8];
//! let n = led.read(&mut session, &mut status).unwrap();
//! assert_eq!(&status[..n], b"LED=1\n");
//! ```

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod channel;
pub mod config;
pub mod device;
pub mod error;
pub mod fd;
pub mod registry;
pub mod session;
pub mod uaccess;

pub use channel::BufferedChannel;
pub use config::{DeviceConfig, DeviceMode, PinConfig};
pub use device::Device;
pub use error::{ActivationError, DevError};
pub use fd::{Fd, SessionTable};
pub use registry::{DeviceRegistry, RegistryError};
pub use session::Session;
pub use uaccess::{Fault, UserSink, UserSource};
