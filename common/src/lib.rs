//! Primitives shared by the driver and device-file crates.

#![cfg_attr(not(test), no_std)]

pub mod sync;
