use alloc::vec::Vec;

use physmap::MemoryDescriptor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsableRegion {
    pub start: u64,
    pub len: u64,
}

impl UsableRegion {
    #[inline]
    pub fn end(&self) -> u64 {
        self.start + self.len
    }
}

/// Keeps the descriptors marked available for general use, in enumeration order, and
/// returns them with their combined byte length.
pub fn select_usable(descriptors: &[MemoryDescriptor]) -> (Vec<UsableRegion>, u64) {
    let regions = descriptors
        .iter()
        .filter(|d| d.ty.is_usable())
        .filter_map(|d| match d.end() {
            Some(_) => Some(UsableRegion { start: d.phys_start, len: d.size()? }),
            None => {
                log::warn!("skipping descriptor at {:#x} with {} pages: range overflows", d.phys_start, d.page_count);
                None
            }
        })
        .filter(|r| r.len != 0)
        .collect::<Vec<_>>();

    let total = regions.iter().map(|r| r.len).sum();
    (regions, total)
}

#[cfg(test)]
mod tests {
    use physmap::{MemoryType, PAGE_SIZE};

    use super::*;

    #[test]
    fn test_select_usable() {
        let descriptors = [
            MemoryDescriptor::new(MemoryType::BootServicesCode, 0, 1),
            MemoryDescriptor::new(MemoryType::Conventional, 0x1000, 0x9f),
            MemoryDescriptor::new(MemoryType::Reserved, 0xa0000, 0x60),
            MemoryDescriptor::new(MemoryType::Conventional, 0x10_0000, 0),
            MemoryDescriptor::new(MemoryType::AcpiReclaim, 0x20_0000, 4),
            MemoryDescriptor::new(MemoryType::Conventional, 0x40_0000, 0x100),
            MemoryDescriptor::new(MemoryType::MemoryMappedIo, 0xfec0_0000, 1),
        ];

        let (regions, total) = select_usable(&descriptors);
        assert_eq!(
            regions,
            [
                UsableRegion { start: 0x1000, len: 0x9f * PAGE_SIZE },
                UsableRegion { start: 0x40_0000, len: 0x100 * PAGE_SIZE }
            ]
        );
        assert_eq!(total, (0x9f + 0x100) * PAGE_SIZE);
        assert_eq!(regions[1].end(), 0x50_0000);
    }

    #[test]
    fn test_select_usable_empty() {
        let descriptors = [MemoryDescriptor::new(MemoryType::Reserved, 0, 16)];
        let (regions, total) = select_usable(&descriptors);
        assert!(regions.is_empty());
        assert_eq!(total, 0);
    }

    #[test]
    fn test_select_usable_overflow() {
        let descriptors = [
            MemoryDescriptor::new(MemoryType::Conventional, u64::MAX - 0xfff, 2),
            MemoryDescriptor::new(MemoryType::Conventional, 0x2000, 1),
        ];
        let (regions, total) = select_usable(&descriptors);
        assert_eq!(regions, [UsableRegion { start: 0x2000, len: PAGE_SIZE }]);
        assert_eq!(total, PAGE_SIZE);
    }
}
