use core::ptr::{read_volatile, write_volatile};

use log::debug;

use super::PERIPHERAL_BASE;
use crate::hal::register_bank::{MapError, RegisterBank, RegisterMapper, offset_in_bounds};

/// Base physical address of the GPIO controller.
///
/// The caller must ensure this address is correctly mapped into the
/// kernel's virtual address space before use.
pub const GPIO_BASE: usize = PERIPHERAL_BASE + 0x20_0000;

/// Size of the GPIO register window in bytes.
pub const GPIO_BANK_SIZE: usize = 0x1000;

/// GPIO Function Select 0. GPFSEL1..5 follow at 4-byte steps.
pub const GPFSEL0: usize = 0x00;
/// GPIO Pin Output Set 0 (write-only). GPSET1 follows.
pub const GPSET0: usize = 0x1C;
/// GPIO Pin Output Clear 0 (write-only). GPCLR1 follows.
pub const GPCLR0: usize = 0x28;

/// Highest GPIO line exposed by the controller.
pub const MAX_PIN: u8 = 53;

/// Pins covered by one function select register.
pub const PINS_PER_FSEL: u8 = 10;

/// Width of one pin's function select field.
pub const FSEL_BITS: u32 = 3;

/// Bytes a bank must span to reach every set/clear register.
pub const GPIO_REGS_END: usize = GPCLR0 + 8;

/// GPIO pin function selection.
///
/// Each GPIO pin can be configured as an input, output,
/// or one of several alternate functions (ALT0–ALT5),
/// depending on the SoC peripheral muxing.
#[repr(u32)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FuncSelect {
    /// Pin is configured as an input.
    Input = 0b000,
    /// Pin is configured as a push-pull output.
    Output = 0b001,
    /// Alternate function 0.
    Alt0 = 0b100,
    /// Alternate function 1.
    Alt1 = 0b101,
    /// Alternate function 2.
    Alt2 = 0b110,
    /// Alternate function 3.
    Alt3 = 0b111,
    /// Alternate function 4.
    Alt4 = 0b011,
    /// Alternate function 5.
    Alt5 = 0b010,
}

/// Byte offset of the function select register covering `pin`, and the
/// bit position of the pin's field inside it.
#[inline]
pub const fn fsel_location(pin: u8) -> (usize, u32) {
    let offset = GPFSEL0 + (pin / PINS_PER_FSEL) as usize * 4;
    let shift = (pin % PINS_PER_FSEL) as u32 * FSEL_BITS;
    (offset, shift)
}

/// Byte offset of the 32-pin register group containing `pin`, relative to
/// the group's first register, and the pin's bit inside it.
#[inline]
pub const fn pin_reg_and_bit(pin: u8) -> (usize, u32) {
    let reg = (pin / 32) as usize * 4;
    let bit = 1u32 << (pin % 32);
    (reg, bit)
}

/// Memory-mapped register window accessed with volatile loads and stores.
#[derive(Debug)]
pub struct MmioBank {
    base: *mut u32,
    size: usize,
}

// SAFETY: the window is plain device memory; exclusive access for writes is
// enforced by `&mut self`, and callers serialise banks behind a lock.
unsafe impl Send for MmioBank {}

impl MmioBank {
    /// Wrap the register window at virtual address `base`.
    ///
    /// # Safety
    /// `base` must be the 4-byte aligned virtual address of `size` bytes of
    /// device registers, valid for the lifetime of this object.
    pub const unsafe fn new(base: usize, size: usize) -> Self {
        Self {
            base: base as *mut u32,
            size,
        }
    }
}

impl RegisterBank for MmioBank {
    fn size(&self) -> usize {
        self.size
    }

    fn read32(&self, offset: usize) -> u32 {
        debug_assert!(offset_in_bounds(offset, self.size));
        unsafe { read_volatile(self.base.add(offset / 4)) }
    }

    fn write32(&mut self, offset: usize, value: u32) {
        debug_assert!(offset_in_bounds(offset, self.size));
        unsafe { write_volatile(self.base.add(offset / 4), value) }
    }
}

impl Drop for MmioBank {
    fn drop(&mut self) {
        debug!("gpio: released register window at {:#x}", self.base as usize);
    }
}

/// Mapper for a flat physical address space where peripherals are reachable
/// at their physical address.
#[derive(Debug)]
pub struct IdentityMapper {
    _private: (),
}

impl IdentityMapper {
    /// Create a new identity mapper.
    ///
    /// # Safety
    ///
    /// The peripheral window must be identity mapped (MMU off, or a 1:1
    /// device mapping installed) for every bank this mapper hands out.
    pub const unsafe fn new() -> Self {
        Self { _private: () }
    }
}

impl RegisterMapper for IdentityMapper {
    type Bank = MmioBank;

    fn map(&self, phys: usize, size: usize) -> Result<MmioBank, MapError> {
        if phys % 4 != 0 || size % 4 != 0 {
            return Err(MapError::Unaligned);
        }
        if size == 0 || phys.checked_add(size).is_none() {
            return Err(MapError::OutOfRange);
        }

        debug!("gpio: mapped {:#x}..{:#x}", phys, phys + size);
        Ok(unsafe { MmioBank::new(phys, size) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fsel_location_covers_ten_pins_per_register() {
        assert_eq!(fsel_location(0), (0x00, 0));
        assert_eq!(fsel_location(9), (0x00, 27));
        assert_eq!(fsel_location(10), (0x04, 0));
        assert_eq!(fsel_location(17), (0x04, 21));
        assert_eq!(fsel_location(53), (0x14, 9));
    }

    #[test]
    fn pin_groups_split_at_32() {
        assert_eq!(pin_reg_and_bit(17), (0, 1 << 17));
        assert_eq!(pin_reg_and_bit(31), (0, 1 << 31));
        assert_eq!(pin_reg_and_bit(32), (4, 1));
    }

    #[test]
    fn identity_mapper_rejects_bad_windows() {
        let mapper = unsafe { IdentityMapper::new() };
        assert_eq!(mapper.map(GPIO_BASE + 2, 16).err(), Some(MapError::Unaligned));
        assert_eq!(mapper.map(GPIO_BASE, 0).err(), Some(MapError::OutOfRange));
        assert_eq!(mapper.map(usize::MAX - 3, 8).err(), Some(MapError::OutOfRange));
    }

    #[test]
    fn mmio_bank_uses_volatile_word_access() {
        let mut words = [0u32; 16];
        let mut bank = unsafe { MmioBank::new(words.as_mut_ptr() as usize, 64) };

        bank.write32(GPSET0, 0xdead_beef);
        bank.modify32(GPFSEL0 + 4, |v| v | 0b001 << 21);

        assert_eq!(bank.read32(GPSET0), 0xdead_beef);
        drop(bank);
        assert_eq!(words[GPSET0 / 4], 0xdead_beef);
        assert_eq!(words[1], 1 << 21);
    }
}
