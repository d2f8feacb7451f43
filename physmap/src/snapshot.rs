use alloc::{collections::BTreeMap, vec::Vec};

use super::{Error, MemoryDescriptor, MemoryLayout, MemoryType, PhysicalMemoryRead, Result, PAGE_SIZE};

/// An in-memory stand-in for the platform: a descriptor table plus the bytes behind the
/// ranges that have them. Used to replay a known layout through the acquisition engine.
#[derive(Debug, Default, Clone)]
pub struct Snapshot {
    descriptors: Vec<MemoryDescriptor>,
    // key: physical start, value: contents
    memory: BTreeMap<u64, Vec<u8>>,
    layout_error: Option<Error>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a backed range. Contents are zero-padded up to a whole number of pages.
    pub fn with_region(mut self, ty: MemoryType, phys_start: u64, mut contents: Vec<u8>) -> Self {
        let pages = (contents.len() as u64).div_ceil(PAGE_SIZE);
        contents.resize((pages * PAGE_SIZE) as usize, 0);
        self.descriptors.push(MemoryDescriptor::new(ty, phys_start, pages));
        if !contents.is_empty() {
            self.memory.insert(phys_start, contents);
        }
        self
    }

    /// Adds a descriptor with nothing behind it. Reads from it fail.
    pub fn with_descriptor(mut self, desc: MemoryDescriptor) -> Self {
        self.descriptors.push(desc);
        self
    }

    /// Makes every `fetch_layout` fail with `err`.
    pub fn with_layout_error(mut self, err: Error) -> Self {
        self.layout_error = Some(err);
        self
    }

    pub fn descriptors(&self) -> &[MemoryDescriptor] {
        &self.descriptors
    }

    /// Bytes behind the range starting at `phys_start`, if any.
    pub fn contents(&self, phys_start: u64) -> Option<&[u8]> {
        self.memory.get(&phys_start).map(Vec::as_slice)
    }
}

impl MemoryLayout for Snapshot {
    fn fetch_layout(&self) -> Result<Vec<MemoryDescriptor>> {
        match &self.layout_error {
            Some(err) => Err(err.clone()),
            None => Ok(self.descriptors.clone()),
        }
    }
}

impl PhysicalMemoryRead for Snapshot {
    fn read_at(&self, buf: &mut [u8], address: u64) -> Result<()> {
        let err = || Error::OutOfRange { address, len: buf.len() };
        let (&start, data) = self.memory.range(..=address).next_back().ok_or_else(err)?;
        let offset = usize::try_from(address - start).map_err(|_| err())?;
        let end = offset.checked_add(buf.len()).ok_or_else(err)?;
        let data = data.get(offset..end).ok_or_else(err)?;
        buf.copy_from_slice(data);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;

    #[test]
    fn test_snapshot_layout() {
        let snap = Snapshot::new()
            .with_region(MemoryType::Conventional, 0x1000, vec![1; 0x1800])
            .with_descriptor(MemoryDescriptor::new(MemoryType::MemoryMappedIo, 0xfee0_0000, 1));

        let layout = snap.fetch_layout().unwrap();
        assert_eq!(
            layout,
            [
                MemoryDescriptor::new(MemoryType::Conventional, 0x1000, 2),
                MemoryDescriptor::new(MemoryType::MemoryMappedIo, 0xfee0_0000, 1)
            ]
        );
        let contents = snap.contents(0x1000).unwrap();
        assert_eq!(contents.len(), 0x2000);
        assert!(contents[..0x1800].iter().all(|&b| b == 1));
        assert!(contents[0x1800..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_snapshot_read_at() {
        let data = (0..0x2000u32).map(|i| i as u8).collect::<Vec<_>>();
        let snap = Snapshot::new().with_region(MemoryType::Conventional, 0x4000, data);

        let mut buf = [0; 4];
        snap.read_at(&mut buf, 0x4ffe).unwrap();
        assert_eq!(buf, [0xfe, 0xff, 0x00, 0x01]);

        assert_eq!(snap.read_at(&mut buf, 0x3fff), Err(Error::OutOfRange { address: 0x3fff, len: 4 }));
        assert_eq!(snap.read_at(&mut buf, 0x5ffd), Err(Error::OutOfRange { address: 0x5ffd, len: 4 }));
        assert!(snap.read_at(&mut buf, 0x5ffc).is_ok());
    }

    #[test]
    fn test_snapshot_layout_error() {
        let err = Error::Provider { op: "GetMemoryMap", status: 7 };
        let snap = Snapshot::new().with_layout_error(err.clone());
        assert_eq!(snap.fetch_layout(), Err(err));
    }
}
