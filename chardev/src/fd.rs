use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;

use crate::device::Device;
use crate::error::DevError;
use crate::registry::{DeviceRegistry, RegistryError};
use crate::session::Session;
use crate::uaccess::{UserSink, UserSource};

/// Handle number (index into a caller's handle table)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Fd(pub usize);

/// An open device together with the caller's session on it
struct OpenDevice {
    device: Arc<Device>,
    session: Session,
}

/// Per-caller table of open device sessions
///
/// Handles are small integers; the lowest free slot is reused first.
pub struct SessionTable {
    slots: Vec<Option<OpenDevice>>,
}

impl SessionTable {
    pub const fn new() -> Self {
        Self { slots: Vec::new() }
    }

    /// Open the node called `name` and return its handle
    pub fn open(&mut self, registry: &DeviceRegistry, name: &str) -> Result<Fd, RegistryError> {
        let (device, session) = registry.open(name)?;
        Ok(self.install(device, session))
    }

    /// Store an already opened session
    pub fn install(&mut self, device: Arc<Device>, session: Session) -> Fd {
        let entry = OpenDevice { device, session };

        if let Some(i) = self.slots.iter().position(Option::is_none) {
            self.slots[i] = Some(entry);
            return Fd(i);
        }

        self.slots.push(Some(entry));
        Fd(self.slots.len() - 1)
    }

    pub fn read<S: UserSink + ?Sized>(&mut self, fd: Fd, buf: &mut S) -> Result<usize, DevError> {
        let open = self.get_mut(fd)?;
        open.device.read(&mut open.session, buf)
    }

    pub fn write<S: UserSource + ?Sized>(&mut self, fd: Fd, src: &S) -> Result<usize, DevError> {
        let open = self.get_mut(fd)?;
        open.device.write(&mut open.session, src)
    }

    pub fn close(&mut self, fd: Fd) -> Result<(), DevError> {
        let open = self
            .slots
            .get_mut(fd.0)
            .and_then(Option::take)
            .ok_or(DevError::InvalidArgument)?;

        open.device.close(open.session)
    }

    /// Cursor of the session behind `fd`
    pub fn position(&self, fd: Fd) -> Result<usize, DevError> {
        self.slots
            .get(fd.0)
            .and_then(Option::as_ref)
            .map(|open| open.session.position())
            .ok_or(DevError::InvalidArgument)
    }

    pub fn count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    fn get_mut(&mut self, fd: Fd) -> Result<&mut OpenDevice, DevError> {
        self.slots
            .get_mut(fd.0)
            .and_then(Option::as_mut)
            .ok_or(DevError::InvalidArgument)
    }
}

impl Default for SessionTable {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SessionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionTable")
            .field("open", &self.count())
            .field("capacity", &self.slots.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry_with_buffer() -> DeviceRegistry {
        let registry = DeviceRegistry::new();
        registry
            .register(Arc::new(Device::buffer_only(64).unwrap()))
            .unwrap();
        registry
    }

    #[test]
    fn lowest_free_handle_is_reused() {
        let registry = registry_with_buffer();
        let mut table = SessionTable::new();

        let a = table.open(&registry, "simple_dev").unwrap();
        let b = table.open(&registry, "simple_dev").unwrap();
        assert_eq!((a, b), (Fd(0), Fd(1)));

        table.close(a).unwrap();
        assert_eq!(table.open(&registry, "simple_dev").unwrap(), Fd(0));
        assert_eq!(table.count(), 2);
    }

    #[test]
    fn unknown_or_closed_handle_is_invalid() {
        let registry = registry_with_buffer();
        let mut table = SessionTable::new();
        let fd = table.open(&registry, "simple_dev").unwrap();
        table.close(fd).unwrap();

        assert_eq!(table.read(fd, &mut [0u8; 4]), Err(DevError::InvalidArgument));
        assert_eq!(table.write(Fd(7), b"x"), Err(DevError::InvalidArgument));
        assert_eq!(table.close(fd), Err(DevError::InvalidArgument));
        assert_eq!(
            table.open(&registry, "missing").err(),
            Some(RegistryError::NotFound)
        );
    }

    #[test]
    fn handles_keep_independent_cursors() {
        let registry = registry_with_buffer();
        let mut table = SessionTable::new();
        let writer = table.open(&registry, "simple_dev").unwrap();
        let reader = table.open(&registry, "simple_dev").unwrap();

        assert_eq!(table.write(writer, b"abcdef").unwrap(), 6);
        assert_eq!(table.position(writer), Ok(6));

        let mut out = [0u8; 4];
        assert_eq!(table.read(reader, &mut out).unwrap(), 4);
        assert_eq!(&out, b"abcd");
        assert_eq!(table.position(reader), Ok(4));
    }
}
