//! Device orchestration.
//!
//! A [`Device`] owns one [`BufferedChannel`], an optional GPIO
//! [`PinController`] and the single lock serialising every read and write
//! body. Which of the two a write reaches is decided here:
//!
//! | Device        | Write                          | Read                                   |
//! |---------------|--------------------------------|----------------------------------------|
//! | plain buffer  | cursor write, clipped          | cursor read up to extent               |
//! | LED           | `'1'`/`'0'` drive the pin, anything else replaces the buffer | stored payload, or `"LED=n\n"` once per session |
//!
//! # Lifecycle
//!
//! [`Device::activate`] allocates the buffer, then maps the register bank,
//! configures the pin as output and drives it low. Dropping the device
//! drives the pin low, unmaps the bank, then frees the buffer.

use alloc::boxed::Box;
use alloc::sync::Arc;
use core::sync::atomic::{AtomicUsize, Ordering};

use common::sync::{CancelSignal, SpinLock, SpinLockGuard};
use drivers::hal::gpio::PinLevel;
use drivers::hal::register_bank::{RegisterBank, RegisterMapper};
use drivers::platform::bcm2835::gpio::PinController;
use log::{debug, error, info, warn};

use crate::channel::BufferedChannel;
use crate::config::{DeviceConfig, DeviceMode};
use crate::error::{ActivationError, DevError};
use crate::session::{DeviceId, Session};
use crate::uaccess::{UserSink, UserSource};

/// Command byte that turns the LED on.
pub const LED_CMD_ON: u8 = b'1';
/// Command byte that turns the LED off.
pub const LED_CMD_OFF: u8 = b'0';

/// Length of the status line, `"LED=n\n"`.
pub const STATUS_LEN: usize = 6;

/// Register bank as held by a device.
pub type DeviceBank = Box<dyn RegisterBank + Send>;

static NEXT_DEVICE_ID: AtomicUsize = AtomicUsize::new(0);

/// Status line reported to readers of an LED device.
pub fn status_line(level: PinLevel) -> [u8; STATUS_LEN] {
    [b'L', b'E', b'D', b'=', level.as_digit(), b'\n']
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Command {
    On,
    Off,
}

impl Command {
    fn parse(byte: u8) -> Option<Self> {
        match byte {
            LED_CMD_ON => Some(Command::On),
            LED_CMD_OFF => Some(Command::Off),
            _ => None,
        }
    }
}

struct DeviceState {
    // Field order is release order: the mapping goes before the buffer.
    controller: Option<PinController<DeviceBank>>,
    channel: BufferedChannel,
}

/// A buffered character device, optionally driving a GPIO line.
pub struct Device {
    id: DeviceId,
    name: &'static str,
    capacity: usize,
    control_capable: bool,
    state: SpinLock<DeviceState>,
}

impl Device {
    /// Bring a device up as described by `config`.
    ///
    /// `mapper` is only consulted for [`DeviceMode::PinControl`]. On error
    /// everything acquired by this call has been released.
    pub fn activate<M: RegisterMapper>(
        config: &DeviceConfig,
        mapper: &M,
    ) -> Result<Self, ActivationError> {
        config.validate().inspect_err(|err| {
            error!("{}: {}", config.name, err);
        })?;

        let channel = BufferedChannel::new(config.capacity).inspect_err(|err| {
            error!("{}: {}", config.name, err);
        })?;

        let controller = match config.mode {
            DeviceMode::Buffer => None,
            DeviceMode::PinControl(pin) => {
                let bank = mapper
                    .map(pin.register_base, pin.register_size)
                    .inspect_err(|err| {
                        error!("{}: failed to map GPIO registers: {}", config.name, err);
                    })?;

                let mut controller = PinController::new(Box::new(bank) as DeviceBank, pin.pin)?;
                controller.configure_output();
                controller.drive_low();
                Some(controller)
            }
        };

        let device = Self {
            id: DeviceId(NEXT_DEVICE_ID.fetch_add(1, Ordering::Relaxed)),
            name: config.name,
            capacity: config.capacity,
            control_capable: controller.is_some(),
            state: SpinLock::new(DeviceState {
                controller,
                channel,
            }),
        };

        info!(
            "{}: initialized, {} byte buffer{}",
            device.name,
            device.capacity,
            if device.control_capable {
                ", write '1' to turn LED on, '0' to turn LED off"
            } else {
                ""
            }
        );
        Ok(device)
    }

    /// Plain-buffer device with no register bank.
    pub fn buffer_only(capacity: usize) -> Result<Self, ActivationError> {
        Self::activate(&DeviceConfig::buffer(capacity), &NoMapper)
    }

    /// Deactivate explicitly. Equivalent to dropping the device.
    pub fn deactivate(self) {
        drop(self)
    }

    pub fn id(&self) -> DeviceId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Whether writes of `'1'`/`'0'` drive a pin.
    pub fn is_control_capable(&self) -> bool {
        self.control_capable
    }

    /// Open a session whose lock waits cannot be cancelled.
    pub fn open(&self) -> Session {
        debug!("{}: device opened", self.name);
        Session::new(self.id, None)
    }

    /// Open a session whose lock waits give up once `signal` is raised.
    pub fn open_with_signal(&self, signal: Arc<dyn CancelSignal>) -> Session {
        debug!("{}: device opened", self.name);
        Session::new(self.id, Some(signal))
    }

    /// Release a session. Stored data is untouched.
    pub fn close(&self, session: Session) -> Result<(), DevError> {
        self.check_session(&session)?;
        debug!("{}: device closed", self.name);
        Ok(())
    }

    /// Read from the device at the session cursor.
    ///
    /// Returns 0 at end of data.
    pub fn read<S: UserSink + ?Sized>(
        &self,
        session: &mut Session,
        buf: &mut S,
    ) -> Result<usize, DevError> {
        let guard = self.lock(session)?;
        let state = &*guard;

        let Some(led) = state.controller.as_ref() else {
            return state.channel.read_at(&mut session.position, buf);
        };

        if session.served_status {
            return Ok(0);
        }
        if session.position > 0 || state.channel.extent() > 0 {
            return state.channel.read_at(&mut session.position, buf);
        }

        let status = status_line(led.level());
        let count = buf.len().min(STATUS_LEN);
        buf.copy_to_user(&status[..count])?;

        session.position += count;
        session.served_status = count > 0;
        Ok(count)
    }

    /// Write to the device.
    ///
    /// On a plain buffer this is a cursor write. On an LED device the first
    /// byte decides: `'1'`/`'0'` drive the pin and report the whole input as
    /// consumed, anything else replaces the buffer content and reports the
    /// stored length.
    pub fn write<S: UserSource + ?Sized>(
        &self,
        session: &mut Session,
        src: &S,
    ) -> Result<usize, DevError> {
        let mut guard = self.lock(session)?;
        let state = &mut *guard;

        let Some(led) = state.controller.as_mut() else {
            return state.channel.write_at(&mut session.position, src);
        };

        if src.is_empty() {
            return Err(DevError::InvalidArgument);
        }

        // The whole input must be readable before the pin is touched.
        let staged = state.channel.stage(src)?;
        let (first, count) = match staged.first() {
            Some(&byte) => (byte, staged.len()),
            None => return Err(DevError::InvalidArgument),
        };

        match Command::parse(first) {
            Some(Command::On) => {
                led.drive_high();
                state.channel.reset();
                Ok(src.len())
            }
            Some(Command::Off) => {
                led.drive_low();
                state.channel.reset();
                Ok(src.len())
            }
            None => {
                let stored = state.channel.commit_staged(count);
                debug!("{}: stored {} of {} bytes", self.name, stored, src.len());
                Ok(stored)
            }
        }
    }

    /// Last commanded pin level, without touching hardware.
    ///
    /// `None` on a plain-buffer device.
    pub fn logical_state(&self) -> Option<PinLevel> {
        self.state
            .lock()
            .controller
            .as_ref()
            .map(PinController::level)
    }

    fn check_session(&self, session: &Session) -> Result<(), DevError> {
        if session.device == self.id {
            Ok(())
        } else {
            Err(DevError::InvalidArgument)
        }
    }

    fn lock(&self, session: &Session) -> Result<SpinLockGuard<'_, DeviceState>, DevError> {
        self.check_session(session)?;
        self.state.lock_interruptible(session.signal()).map_err(|err| {
            warn!("{}: {}", self.name, err);
            DevError::from(err)
        })
    }
}

impl Drop for Device {
    fn drop(&mut self) {
        if let Some(led) = self.state.get_mut().controller.as_mut() {
            led.drive_low();
        }
        info!("{}: unloaded", self.name);
    }
}

impl core::fmt::Debug for Device {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Device")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("capacity", &self.capacity)
            .field("control_capable", &self.control_capable)
            .finish()
    }
}

/// Mapper for devices that never map registers.
struct NoMapper;

impl RegisterMapper for NoMapper {
    type Bank = DeviceBank;

    fn map(&self, _phys: usize, _size: usize) -> Result<DeviceBank, drivers::MapError> {
        Err(drivers::MapError::Unavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::sync::SignalFlag;
    use drivers::hw::bcm2835::gpio::{GPCLR0, GPSET0};
    use drivers::hw::sim::SimMapper;
    use std::thread;

    fn led() -> (Device, SimMapper) {
        let mapper = SimMapper::new();
        let device = Device::activate(&DeviceConfig::default(), &mapper).unwrap();
        (device, mapper)
    }

    #[test]
    fn status_line_format() {
        assert_eq!(&status_line(PinLevel::Low), b"LED=0\n");
        assert_eq!(&status_line(PinLevel::High), b"LED=1\n");
    }

    #[test]
    fn activation_configures_output_and_drives_low() {
        let (device, mapper) = led();
        let regs = mapper.registers();

        assert_eq!(regs.peek(0x04) >> 21 & 0b111, 0b001);
        assert_eq!(regs.writes_to(GPCLR0), [1 << 17]);
        assert_eq!(device.logical_state(), Some(PinLevel::Low));
        assert_eq!(mapper.live_mappings(), 1);
    }

    #[test]
    fn drop_drives_low_before_unmapping() {
        let (device, mapper) = led();
        let regs = mapper.registers();
        let mut session = device.open();
        device.write(&mut session, b"1").unwrap();
        regs.clear_journal();

        drop(device);

        assert_eq!(regs.writes_to(GPCLR0), [1 << 17]);
        assert_eq!(mapper.live_mappings(), 0);
    }

    #[test]
    fn buffer_only_device_has_no_controller() {
        let device = Device::buffer_only(32).unwrap();
        assert!(!device.is_control_capable());
        assert_eq!(device.logical_state(), None);
    }

    #[test]
    fn control_capability_is_known_without_the_lock() {
        let (device, _mapper) = led();
        let held = device.state.lock();
        assert!(device.is_control_capable());
        drop(held);
    }

    #[test]
    fn command_writes_consume_the_whole_input() {
        let (device, mapper) = led();
        let mut session = device.open();

        assert_eq!(device.write(&mut session, b"1 please\n").unwrap(), 9);
        assert_eq!(mapper.registers().writes_to(GPSET0), [1 << 17]);
        assert_eq!(session.position(), 0);
    }

    #[test]
    fn foreign_session_is_invalid() {
        let (a, _ma) = led();
        let (b, _mb) = led();
        assert_ne!(a.id(), b.id());
        let mut session = a.open();

        assert_eq!(b.write(&mut session, b"1"), Err(DevError::InvalidArgument));
        assert_eq!(b.read(&mut session, &mut [0u8; 8]), Err(DevError::InvalidArgument));
        assert_eq!(b.close(session), Err(DevError::InvalidArgument));
    }

    #[test]
    fn contended_write_is_interrupted_without_side_effects() {
        let (device, mapper) = led();
        let regs = mapper.registers();
        regs.clear_journal();

        let signal = Arc::new(SignalFlag::new());
        let mut session = device.open_with_signal(signal.clone());
        let held = device.state.lock();

        thread::scope(|s| {
            let writer = s.spawn(|| device.write(&mut session, b"1"));
            signal.raise();
            assert_eq!(writer.join().unwrap(), Err(DevError::Interrupted));
        });

        drop(held);
        assert!(regs.journal().is_empty());
        assert_eq!(device.logical_state(), Some(PinLevel::Low));

        signal.clear();
        assert_eq!(device.write(&mut session, b"1").unwrap(), 1);
        assert_eq!(device.logical_state(), Some(PinLevel::High));
    }

    #[test]
    fn contended_read_is_interrupted_without_consuming_status() {
        let (device, _mapper) = led();
        let signal = Arc::new(SignalFlag::new());
        let mut session = device.open_with_signal(signal.clone());
        let held = device.state.lock();

        thread::scope(|s| {
            let reader = s.spawn(|| device.read(&mut session, &mut [0u8; 8]));
            signal.raise();
            assert_eq!(reader.join().unwrap(), Err(DevError::Interrupted));
        });

        drop(held);
        assert_eq!(session.position, 0);
        assert!(!session.served_status);

        signal.clear();
        let mut out = [0u8; 8];
        assert_eq!(device.read(&mut session, &mut out), Ok(STATUS_LEN));
        assert_eq!(&out[..STATUS_LEN], b"LED=0\n");
    }

    #[test]
    fn faulting_command_tail_leaves_pin_and_buffer_alone() {
        struct TailFault<'a>(&'a [u8]);

        impl UserSource for TailFault<'_> {
            fn len(&self) -> usize {
                self.0.len()
            }

            fn copy_from_user(&self, dst: &mut [u8]) -> Result<(), crate::uaccess::Fault> {
                if dst.len() > 1 {
                    return Err(crate::uaccess::Fault);
                }
                dst.copy_from_slice(&self.0[..dst.len()]);
                Ok(())
            }
        }

        let (device, mapper) = led();
        let regs = mapper.registers();
        let mut session = device.open();
        device.write(&mut session, b"note").unwrap();
        regs.clear_journal();

        assert_eq!(device.write(&mut session, &TailFault(b"1abc")), Err(DevError::Fault));
        assert!(regs.journal().is_empty());
        assert_eq!(device.logical_state(), Some(PinLevel::Low));

        let mut reader = device.open();
        let mut out = [0u8; 8];
        let n = device.read(&mut reader, &mut out).unwrap();
        assert_eq!(&out[..n], b"note");
    }
}
