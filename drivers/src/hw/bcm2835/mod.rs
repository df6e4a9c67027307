//! Raw BCM283x register layouts.
//!
//! The peripheral window moved between SoC revisions; the Cargo feature
//! selects which one is addressed. The GPIO block layout used here is the
//! same on all of them.

pub mod gpio;

cfg_if::cfg_if! {
    if #[cfg(feature = "bcm2835")] {
        /// Physical base of the peripheral window (Pi 1 / Zero).
        pub const PERIPHERAL_BASE: usize = 0x2000_0000;
    } else if #[cfg(feature = "bcm2837")] {
        /// Physical base of the peripheral window (Pi 3).
        pub const PERIPHERAL_BASE: usize = 0x3F00_0000;
    } else if #[cfg(feature = "bcm2711")] {
        /// Physical base of the peripheral window (Pi 4, low peripheral mode).
        pub const PERIPHERAL_BASE: usize = 0xFE00_0000;
    } else {
        compile_error!(
            "No platform selected!\n\
            Use: cargo build --features bcm2835\n\
            Or:  cargo build --features bcm2837\n\
            Or:  cargo build --features bcm2711"
        );
    }
}

#[cfg(any(
    all(feature = "bcm2835", feature = "bcm2837"),
    all(feature = "bcm2835", feature = "bcm2711"),
    all(feature = "bcm2837", feature = "bcm2711"),
))]
compile_error!("Multiple platforms selected! Choose only one: bcm2835, bcm2837 OR bcm2711");
