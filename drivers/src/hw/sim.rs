//! Simulated register bank.
//!
//! [`SimMapper`] hands out [`SimBank`]s backed by ordinary memory. Every
//! access is recorded in a journal so tests can assert the exact register
//! traffic a driver produced, and the mapper counts live mappings so
//! release on every exit path can be checked.

use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;
use core::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use common::sync::SpinLock;

use super::bcm2835::gpio::GPIO_BANK_SIZE;
use crate::hal::register_bank::{MapError, RegisterBank, RegisterMapper, offset_in_bounds};

/// One recorded register access.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Access {
    Read { offset: usize, value: u32 },
    Write { offset: usize, value: u32 },
}

struct SimState {
    words: Vec<u32>,
    journal: Vec<Access>,
}

/// Shared view of simulated register contents and access history.
///
/// Cloning yields another handle to the same registers.
#[derive(Clone)]
pub struct SimRegisters {
    state: Arc<SpinLock<SimState>>,
}

impl SimRegisters {
    /// Zeroed registers spanning `size` bytes.
    pub fn new(size: usize) -> Self {
        Self {
            state: Arc::new(SpinLock::new(SimState {
                words: vec![0; size / 4],
                journal: Vec::new(),
            })),
        }
    }

    /// Current value at `offset`, without journaling.
    pub fn peek(&self, offset: usize) -> u32 {
        self.state.lock().words[offset / 4]
    }

    /// Overwrite `offset`, without journaling. Models hardware-side state.
    pub fn poke(&self, offset: usize, value: u32) {
        self.state.lock().words[offset / 4] = value;
    }

    /// Snapshot of every access since the last [`clear_journal`](Self::clear_journal).
    pub fn journal(&self) -> Vec<Access> {
        self.state.lock().journal.clone()
    }

    pub fn clear_journal(&self) {
        self.state.lock().journal.clear();
    }

    /// Values written to `offset`, in order.
    pub fn writes_to(&self, offset: usize) -> Vec<u32> {
        self.state
            .lock()
            .journal
            .iter()
            .filter_map(|access| match *access {
                Access::Write { offset: o, value } if o == offset => Some(value),
                _ => None,
            })
            .collect()
    }

    fn read(&self, offset: usize) -> u32 {
        let mut state = self.state.lock();
        let value = state.words[offset / 4];
        state.journal.push(Access::Read { offset, value });
        value
    }

    fn write(&self, offset: usize, value: u32) {
        let mut state = self.state.lock();
        state.words[offset / 4] = value;
        state.journal.push(Access::Write { offset, value });
    }
}

/// A mapped simulated register window.
pub struct SimBank {
    regs: SimRegisters,
    size: usize,
    live: Option<Arc<AtomicUsize>>,
}

impl SimBank {
    /// A standalone bank not tracked by any mapper.
    pub fn new(size: usize) -> Self {
        Self {
            regs: SimRegisters::new(size),
            size,
            live: None,
        }
    }

    pub fn registers(&self) -> SimRegisters {
        self.regs.clone()
    }
}

impl RegisterBank for SimBank {
    fn size(&self) -> usize {
        self.size
    }

    fn read32(&self, offset: usize) -> u32 {
        assert!(offset_in_bounds(offset, self.size), "read outside bank: {offset:#x}");
        self.regs.read(offset)
    }

    fn write32(&mut self, offset: usize, value: u32) {
        assert!(offset_in_bounds(offset, self.size), "write outside bank: {offset:#x}");
        self.regs.write(offset, value)
    }
}

impl Drop for SimBank {
    fn drop(&mut self) {
        if let Some(live) = &self.live {
            live.fetch_sub(1, Ordering::AcqRel);
        }
    }
}

/// Mapper producing [`SimBank`]s that share one set of registers.
pub struct SimMapper {
    regs: SimRegisters,
    live: Arc<AtomicUsize>,
    fail: AtomicBool,
}

impl SimMapper {
    /// Mapper over a zeroed GPIO-sized register window.
    pub fn new() -> Self {
        Self {
            regs: SimRegisters::new(GPIO_BANK_SIZE),
            live: Arc::new(AtomicUsize::new(0)),
            fail: AtomicBool::new(false),
        }
    }

    /// Mapper whose every `map` call fails with [`MapError::Unavailable`].
    pub fn failing() -> Self {
        let mapper = Self::new();
        mapper.set_failing(true);
        mapper
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::Release);
    }

    pub fn registers(&self) -> SimRegisters {
        self.regs.clone()
    }

    /// Number of banks handed out and not yet dropped.
    pub fn live_mappings(&self) -> usize {
        self.live.load(Ordering::Acquire)
    }
}

impl Default for SimMapper {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterMapper for SimMapper {
    type Bank = SimBank;

    fn map(&self, phys: usize, size: usize) -> Result<SimBank, MapError> {
        if self.fail.load(Ordering::Acquire) {
            return Err(MapError::Unavailable);
        }
        if phys % 4 != 0 || size % 4 != 0 {
            return Err(MapError::Unaligned);
        }
        if size == 0 || size > GPIO_BANK_SIZE {
            return Err(MapError::OutOfRange);
        }

        self.live.fetch_add(1, Ordering::AcqRel);
        Ok(SimBank {
            regs: self.regs.clone(),
            size,
            live: Some(self.live.clone()),
        })
    }
}
