//! Character-device dispatch.
//!
//! The file layer calls into a device by major number with the file's inode
//! locked. Device entry points that may suspend must drop that lock for the
//! duration and take it back before returning.

use crate::error::ConsoleError;

/// Number of device slots.
pub const NDEV: usize = 10;

/// Major number of the console.
pub const CONSOLE: usize = 1;

/// The lock of the inode a device file was opened through.
pub trait InodeLock {
    fn lock(&self);
    fn unlock(&self);
}

/// Read/write entry points of a character device.
pub trait Device: Sync {
    fn read(&self, ip: &dyn InodeLock, dst: &mut [u8]) -> Result<usize, ConsoleError>;
    fn write(&self, ip: &dyn InodeLock, src: &[u8]) -> Result<usize, ConsoleError>;
}

pub struct DeviceTable<'d> {
    slots: [Option<&'d dyn Device>; NDEV],
}

impl<'d> DeviceTable<'d> {
    pub const fn new() -> Self {
        Self { slots: [None; NDEV] }
    }

    pub fn register(&mut self, major: usize, dev: &'d dyn Device) -> Result<(), ConsoleError> {
        let slot = self
            .slots
            .get_mut(major)
            .ok_or(ConsoleError::BadDevice(major))?;
        if slot.is_some() {
            return Err(ConsoleError::DeviceTaken(major));
        }
        *slot = Some(dev);
        Ok(())
    }

    pub fn get(&self, major: usize) -> Result<&'d dyn Device, ConsoleError> {
        self.slots
            .get(major)
            .copied()
            .flatten()
            .ok_or(ConsoleError::BadDevice(major))
    }

    pub fn read(&self, major: usize, ip: &dyn InodeLock, dst: &mut [u8]) -> Result<usize, ConsoleError> {
        self.get(major)?.read(ip, dst)
    }

    pub fn write(&self, major: usize, ip: &dyn InodeLock, src: &[u8]) -> Result<usize, ConsoleError> {
        self.get(major)?.write(ip, src)
    }
}

impl Default for DeviceTable<'_> {
    fn default() -> Self {
        Self::new()
    }
}
