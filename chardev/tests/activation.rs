//! Activation either completes or leaves nothing behind.
//!
//! A counting global allocator tracks live blocks of a few distinctive
//! sizes, used as buffer capacities, so a leaked channel shows up as a
//! non-zero count.

use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::atomic::{AtomicIsize, Ordering};

use chardev::{ActivationError, Device, DeviceConfig, DeviceMode, PinConfig};
use drivers::MapError;
use drivers::hw::sim::SimMapper;
use drivers::platform::bcm2835::gpio::GpioError;

const MAP_FAILS: usize = 12_345;
const BANK_TOO_SMALL: usize = 12_347;
const SUCCEEDS: usize = 12_349;

static LIVE: [AtomicIsize; 3] = [
    AtomicIsize::new(0),
    AtomicIsize::new(0),
    AtomicIsize::new(0),
];

fn slot(size: usize) -> Option<&'static AtomicIsize> {
    match size {
        MAP_FAILS => Some(&LIVE[0]),
        BANK_TOO_SMALL => Some(&LIVE[1]),
        SUCCEEDS => Some(&LIVE[2]),
        _ => None,
    }
}

fn live_blocks(size: usize) -> isize {
    slot(size).map_or(0, |count| count.load(Ordering::SeqCst))
}

struct Counting;

unsafe impl GlobalAlloc for Counting {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = unsafe { System.alloc(layout) };
        if !ptr.is_null() {
            if let Some(count) = slot(layout.size()) {
                count.fetch_add(1, Ordering::SeqCst);
            }
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        if let Some(count) = slot(layout.size()) {
            count.fetch_sub(1, Ordering::SeqCst);
        }
        unsafe { System.dealloc(ptr, layout) }
    }
}

#[global_allocator]
static GLOBAL: Counting = Counting;

#[test]
fn failed_mapping_releases_the_buffer() {
    let mapper = SimMapper::failing();
    let config = DeviceConfig::default().with_capacity(MAP_FAILS);

    let result = Device::activate(&config, &mapper);

    assert_eq!(
        result.err(),
        Some(ActivationError::Map(MapError::Unavailable))
    );
    assert_eq!(live_blocks(MAP_FAILS), 0);
    assert_eq!(mapper.live_mappings(), 0);
    assert!(mapper.registers().journal().is_empty());
}

#[test]
fn failed_pin_setup_releases_mapping_and_buffer() {
    let mapper = SimMapper::new();
    let mut config = DeviceConfig::default().with_capacity(BANK_TOO_SMALL);
    config.mode = DeviceMode::PinControl(PinConfig {
        register_size: 16,
        ..PinConfig::new(17)
    });

    let result = Device::activate(&config, &mapper);

    assert_eq!(
        result.err(),
        Some(ActivationError::Gpio(GpioError::BankTooSmall))
    );
    assert_eq!(live_blocks(BANK_TOO_SMALL), 0);
    assert_eq!(mapper.live_mappings(), 0);
    assert!(mapper.registers().journal().is_empty());
}

#[test]
fn deactivation_releases_everything() {
    let mapper = SimMapper::new();
    let config = DeviceConfig::default().with_capacity(SUCCEEDS);

    let device = Device::activate(&config, &mapper).unwrap();
    assert_eq!(live_blocks(SUCCEEDS), 2);
    assert_eq!(mapper.live_mappings(), 1);

    device.deactivate();
    assert_eq!(live_blocks(SUCCEEDS), 0);
    assert_eq!(mapper.live_mappings(), 0);
}

#[test]
fn invalid_configuration_is_rejected_up_front() {
    let mapper = SimMapper::new();

    assert_eq!(
        Device::activate(&DeviceConfig::default().with_capacity(0), &mapper).err(),
        Some(ActivationError::InvalidConfig)
    );
    assert_eq!(
        Device::activate(&DeviceConfig::pin_control(54), &mapper).err(),
        Some(ActivationError::Gpio(GpioError::InvalidPin))
    );
    assert_eq!(mapper.live_mappings(), 0);
}
