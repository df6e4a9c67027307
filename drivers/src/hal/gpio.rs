//! GPIO output abstraction.
//!
//! Only output lines are modelled: a driver sets a level and may remember
//! the last one it set.

/// Logic level of a line.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PinLevel {
    Low,
    High,
}

impl PinLevel {
    /// The level as the ASCII digit used on the wire (`b'0'` / `b'1'`).
    pub const fn as_digit(self) -> u8 {
        match self {
            PinLevel::Low => b'0',
            PinLevel::High => b'1',
        }
    }

    pub const fn toggled(self) -> Self {
        match self {
            PinLevel::Low => PinLevel::High,
            PinLevel::High => PinLevel::Low,
        }
    }
}

impl From<bool> for PinLevel {
    fn from(high: bool) -> Self {
        if high { PinLevel::High } else { PinLevel::Low }
    }
}

impl From<PinLevel> for bool {
    fn from(level: PinLevel) -> bool {
        level == PinLevel::High
    }
}

/// A line configured as an output.
pub trait OutputPin {
    type Error: core::fmt::Debug;

    /// Drive the line to `level`.
    fn set_level(&mut self, level: PinLevel) -> Result<(), Self::Error>;

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.set_level(PinLevel::High)
    }

    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.set_level(PinLevel::Low)
    }
}

/// Output that remembers what it was last told.
///
/// The reported level is the last commanded one, not a hardware sample.
pub trait StatefulOutputPin: OutputPin {
    fn output_level(&self) -> PinLevel;

    fn toggle(&mut self) -> Result<(), Self::Error> {
        let next = self.output_level().toggled();
        self.set_level(next)
    }

    fn is_set_high(&self) -> bool {
        self.output_level() == PinLevel::High
    }
}
