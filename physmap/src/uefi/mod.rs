pub mod raw;

use alloc::vec::Vec;
use core::{mem, ptr};

use self::raw::{BootServices, RawMemoryDescriptor, Status};
use super::{Error, MemoryDescriptor, MemoryLayout, MemoryType, PhysicalMemoryRead, Result};

/// Extra room requested on top of the probed map size; allocating the map buffer itself
/// can split a descriptor and grow the table.
const MAP_PADDING: usize = 0x1000;

const MAX_ATTEMPTS: usize = 4;

/// Boot-services view of the machine: memory map queries and identity-mapped physical reads.
pub struct Firmware<'a> {
    bs: &'a BootServices,
}

impl<'a> Firmware<'a> {
    /// # Safety
    /// `bs` must be the live boot services table and boot services must not have been exited.
    pub unsafe fn new(bs: &'a BootServices) -> Self {
        Self { bs }
    }

    fn probe(&self) -> Result<Option<usize>> {
        let (mut size, mut key, mut desc_size, mut version) = (0, 0, 0, 0);
        let status =
            unsafe { (self.bs.get_memory_map)(&mut size, ptr::null_mut(), &mut key, &mut desc_size, &mut version) };
        match status {
            Status::BUFFER_TOO_SMALL => Ok(Some(size)),
            Status::SUCCESS => Ok(None),
            status => Err(Error::Provider { op: "GetMemoryMap (probe)", status: status.0 }),
        }
    }
}

impl MemoryLayout for Firmware<'_> {
    fn fetch_layout(&self) -> Result<Vec<MemoryDescriptor>> {
        let Some(mut size) = self.probe()? else {
            return Ok(Vec::new());
        };

        // u64 storage keeps the buffer aligned for the firmware's descriptor writes
        let mut buf: Vec<u64> = Vec::new();
        for _ in 0..MAX_ATTEMPTS {
            let capacity = size + MAP_PADDING;
            let words = capacity.div_ceil(mem::size_of::<u64>());
            buf.clear();
            buf.try_reserve_exact(words).map_err(|_| Error::ResourceExhausted(capacity))?;
            buf.resize(words, 0);

            size = words * mem::size_of::<u64>();
            let (mut key, mut desc_size, mut version) = (0, 0, 0);
            let status = unsafe {
                (self.bs.get_memory_map)(&mut size, buf.as_mut_ptr().cast(), &mut key, &mut desc_size, &mut version)
            };
            match status {
                Status::SUCCESS => return parse_map(&buf, size, desc_size),
                Status::BUFFER_TOO_SMALL => continue,
                status => return Err(Error::Provider { op: "GetMemoryMap", status: status.0 }),
            }
        }

        Err(Error::Provider { op: "GetMemoryMap", status: Status::BUFFER_TOO_SMALL.0 })
    }
}

/// Walks a `GetMemoryMap` buffer. `size` is the byte count the firmware filled in and
/// `desc_size` its stride, which may exceed `size_of::<RawMemoryDescriptor>()`. A trailing
/// partial entry is ignored.
pub fn parse_map(buf: &[u64], size: usize, desc_size: usize) -> Result<Vec<MemoryDescriptor>> {
    if desc_size < mem::size_of::<RawMemoryDescriptor>() {
        return Err(Error::Provider { op: "GetMemoryMap (descriptor size)", status: Status::INVALID_PARAMETER.0 });
    }

    let size = size.min(mem::size_of_val(buf));
    let count = size / desc_size;
    let base = buf.as_ptr().cast::<u8>();
    let descriptors = (0..count)
        .map(|i| {
            // SAFETY: i * desc_size + size_of::<RawMemoryDescriptor>() <= size <= buffer length
            let raw = unsafe { ptr::read_unaligned(base.add(i * desc_size).cast::<RawMemoryDescriptor>()) };
            MemoryDescriptor::new(MemoryType::from(raw.ty), raw.physical_start, raw.number_of_pages)
        })
        .collect::<Vec<_>>();

    log::debug!("memory map: {count} descriptors, stride {desc_size:#x}");
    Ok(descriptors)
}

impl PhysicalMemoryRead for Firmware<'_> {
    fn read_at(&self, buf: &mut [u8], address: u64) -> Result<()> {
        let source = usize::try_from(address).map_err(|_| Error::OutOfRange { address, len: buf.len() })?;
        // CopyMem instead of a Rust pointer read: conventional memory can start at physical 0
        unsafe { (self.bs.copy_mem)(buf.as_mut_ptr().cast(), source as *const _, buf.len()) };
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;

    const STRIDE: usize = 48;

    /// Lays `entries` out the way firmware does, `STRIDE` bytes apart, with junk in the
    /// attribute word and the padding past it.
    fn map_buffer(entries: &[(u32, u64, u64)], extra: usize) -> (Vec<u64>, usize) {
        let size = entries.len() * STRIDE + extra;
        let mut bytes = vec![0xa5u8; size.next_multiple_of(8)];
        for (i, &(ty, start, pages)) in entries.iter().enumerate() {
            let at = i * STRIDE;
            bytes[at..at + 4].copy_from_slice(&ty.to_ne_bytes());
            bytes[at + 8..at + 16].copy_from_slice(&start.to_ne_bytes());
            bytes[at + 16..at + 24].copy_from_slice(&0u64.to_ne_bytes());
            bytes[at + 24..at + 32].copy_from_slice(&pages.to_ne_bytes());
        }
        let words = bytes.chunks_exact(8).map(|w| u64::from_ne_bytes(w.try_into().unwrap())).collect();
        (words, size)
    }

    #[test]
    fn test_parse_map_stride() {
        let entries = [(3, 0, 1), (7, 0x1000, 0x9f), (0, 0xa0000, 0x60)];
        let (buf, size) = map_buffer(&entries, 0);
        let descriptors = parse_map(&buf, size, STRIDE).unwrap();
        assert_eq!(
            descriptors,
            [
                MemoryDescriptor::new(MemoryType::BootServicesCode, 0, 1),
                MemoryDescriptor::new(MemoryType::Conventional, 0x1000, 0x9f),
                MemoryDescriptor::new(MemoryType::Reserved, 0xa0000, 0x60),
            ]
        );
    }

    #[test]
    fn test_parse_map_partial_entry() {
        let (buf, size) = map_buffer(&[(7, 0x10_0000, 4), (7, 0x20_0000, 8)], 24);
        let descriptors = parse_map(&buf, size, STRIDE).unwrap();
        assert_eq!(descriptors.len(), 2);
        assert_eq!(descriptors[1], MemoryDescriptor::new(MemoryType::Conventional, 0x20_0000, 8));

        // a size past the end of the buffer is clamped
        assert_eq!(parse_map(&buf, size + 4 * STRIDE, STRIDE).unwrap().len(), 2);
    }

    #[test]
    fn test_parse_map_short_stride() {
        let (buf, size) = map_buffer(&[(7, 0, 1)], 0);
        assert!(matches!(parse_map(&buf, size, 32), Err(Error::Provider { .. })));
        assert!(matches!(parse_map(&buf, size, 39), Err(Error::Provider { .. })));
        assert_eq!(parse_map(&buf, size, 40).unwrap().len(), 1);
    }
}
