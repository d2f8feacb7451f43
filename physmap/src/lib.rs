#![no_std]

extern crate alloc;
#[cfg(test)]
extern crate std;

mod error;
pub mod snapshot;
pub mod uefi;

use alloc::vec::Vec;

pub use self::{
    error::{status_name, Error},
    snapshot::Snapshot,
};

pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Granularity of descriptor page counts. UEFI fixes this at 4 KiB regardless of the CPU page size.
pub const PAGE_SIZE: u64 = 0x1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryType {
    Reserved,
    LoaderCode,
    LoaderData,
    BootServicesCode,
    BootServicesData,
    RuntimeServicesCode,
    RuntimeServicesData,
    Conventional,
    Unusable,
    AcpiReclaim,
    AcpiNvs,
    MemoryMappedIo,
    MemoryMappedIoPortSpace,
    PalCode,
    Persistent,
    Unaccepted,
    Other(u32),
}

impl MemoryType {
    /// Memory the firmware reports as free for general use.
    #[inline]
    pub fn is_usable(self) -> bool {
        matches!(self, MemoryType::Conventional)
    }
}

impl From<u32> for MemoryType {
    fn from(value: u32) -> Self {
        match value {
            0 => Self::Reserved,
            1 => Self::LoaderCode,
            2 => Self::LoaderData,
            3 => Self::BootServicesCode,
            4 => Self::BootServicesData,
            5 => Self::RuntimeServicesCode,
            6 => Self::RuntimeServicesData,
            7 => Self::Conventional,
            8 => Self::Unusable,
            9 => Self::AcpiReclaim,
            10 => Self::AcpiNvs,
            11 => Self::MemoryMappedIo,
            12 => Self::MemoryMappedIoPortSpace,
            13 => Self::PalCode,
            14 => Self::Persistent,
            15 => Self::Unaccepted,
            other => Self::Other(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryDescriptor {
    pub ty: MemoryType,
    pub phys_start: u64,
    pub page_count: u64,
}

impl MemoryDescriptor {
    pub const fn new(ty: MemoryType, phys_start: u64, page_count: u64) -> Self {
        Self { ty, phys_start, page_count }
    }

    /// Byte length of the range, `None` if the page count is nonsensical.
    #[inline]
    pub fn size(&self) -> Option<u64> {
        self.page_count.checked_mul(PAGE_SIZE)
    }

    #[inline]
    pub fn end(&self) -> Option<u64> {
        self.phys_start.checked_add(self.size()?)
    }
}

/// Source of the platform's physical memory layout.
///
/// Firmware interfaces usually want a size probe before delivering the table;
/// implementations hide that and hand back an owned list that stays fixed for the run.
pub trait MemoryLayout {
    fn fetch_layout(&self) -> Result<Vec<MemoryDescriptor>>;
}

pub trait PhysicalMemoryRead {
    /// Fills `buf` with the bytes starting at physical `address`.
    fn read_at(&self, buf: &mut [u8], address: u64) -> Result<()>;
}

impl<T: MemoryLayout + ?Sized> MemoryLayout for &T {
    fn fetch_layout(&self) -> Result<Vec<MemoryDescriptor>> {
        (**self).fetch_layout()
    }
}

impl<T: PhysicalMemoryRead + ?Sized> PhysicalMemoryRead for &T {
    fn read_at(&self, buf: &mut [u8], address: u64) -> Result<()> {
        (**self).read_at(buf, address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_type_from_raw() {
        assert_eq!(MemoryType::from(7), MemoryType::Conventional);
        assert_eq!(MemoryType::from(11), MemoryType::MemoryMappedIo);
        assert_eq!(MemoryType::from(0x7000_0000), MemoryType::Other(0x7000_0000));
        assert!(MemoryType::from(7).is_usable());
        assert!(!MemoryType::AcpiReclaim.is_usable());
        assert!(!MemoryType::BootServicesData.is_usable());
    }

    #[test]
    fn test_descriptor_size() {
        let desc = MemoryDescriptor::new(MemoryType::Conventional, 0x10_0000, 3);
        assert_eq!(desc.size(), Some(0x3000));
        assert_eq!(desc.end(), Some(0x10_3000));

        let desc = MemoryDescriptor::new(MemoryType::Conventional, u64::MAX - 0xfff, 2);
        assert_eq!(desc.end(), None);
        assert_eq!(MemoryDescriptor::new(MemoryType::Reserved, 0, u64::MAX).size(), None);
    }
}
