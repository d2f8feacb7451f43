use alloc::string::String;

use super::{DumpConfig, Result};

/// An open output file on the dump volume.
pub trait DumpFile {
    fn write_all(&mut self, buf: &[u8]) -> Result<()>;
    fn close(self) -> Result<()>;
}

/// Where output files are created.
pub trait Volume {
    type File: DumpFile;

    /// Creates (or truncates) `name` and opens it for writing.
    fn create(&mut self, name: &str) -> Result<Self::File>;
}

#[derive(Debug)]
pub struct OutputFile<F> {
    pub index: u32,
    pub name: String,
    pub written: u64,
    handle: F,
}

/// Counters and the open file, threaded through every step of a run.
#[derive(Debug)]
pub struct AcquisitionState<F> {
    pub total_planned: u64,
    pub total_written: u64,
    pub current: Option<OutputFile<F>>,
    pub files_closed: u32,
    next_index: u32,
}

impl<F> AcquisitionState<F> {
    pub fn new(total_planned: u64) -> Self {
        Self { total_planned, total_written: 0, current: None, files_closed: 0, next_index: 1 }
    }

    #[inline]
    pub fn is_complete(&self) -> bool {
        self.total_written >= self.total_planned
    }
}

/// Appends chunks to numbered files, moving on to the next file once the current one has
/// reached `max_file_size`.
///
/// The threshold is checked after a chunk is written, so a chunk is never split and a file
/// may end up to one chunk past the threshold.
pub struct SinkManager<'a, V> {
    volume: &'a mut V,
    config: &'a DumpConfig,
}

impl<'a, V: Volume> SinkManager<'a, V> {
    pub fn new(volume: &'a mut V, config: &'a DumpConfig) -> Self {
        Self { volume, config }
    }

    fn create(&mut self, state: &mut AcquisitionState<V::File>) -> Result<OutputFile<V::File>> {
        debug_assert!(state.current.is_none());
        let index = state.next_index;
        let name = self.config.file_name(index);
        let handle = self.volume.create(&name)?;
        log::info!("Generating new bin file: {name}");
        state.next_index += 1;
        Ok(OutputFile { index, name, written: 0, handle })
    }

    fn close(&mut self, state: &mut AcquisitionState<V::File>, file: OutputFile<V::File>) -> Result<()> {
        let OutputFile { name, written, handle, .. } = file;
        handle.close()?;
        state.files_closed += 1;
        log::debug!("closed {name}: {written:#x} bytes");
        Ok(())
    }

    pub fn write_chunk(&mut self, state: &mut AcquisitionState<V::File>, bytes: &[u8]) -> Result<()> {
        let mut file = match state.current.take() {
            Some(file) => file,
            None => self.create(state)?,
        };

        if let Err(err) = file.handle.write_all(bytes) {
            state.current = Some(file);
            return Err(err);
        }
        file.written += bytes.len() as u64;
        state.total_written += bytes.len() as u64;

        // no next file when nothing is left to write
        if file.written >= self.config.max_file_size && !state.is_complete() {
            self.close(state, file)?;
            let next = self.create(state)?;
            state.current = Some(next);
        } else {
            state.current = Some(file);
        }
        Ok(())
    }

    /// Closes the open file, if any.
    pub fn finish(&mut self, state: &mut AcquisitionState<V::File>) -> Result<()> {
        match state.current.take() {
            Some(file) => self.close(state, file),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use alloc::{rc::Rc, string::ToString, vec, vec::Vec};
    use core::cell::RefCell;

    use super::*;
    use crate::Error;

    pub(crate) const VOLUME_FULL: usize = (1 << (usize::BITS - 1)) | 11;

    #[derive(Debug, Default)]
    pub(crate) struct Disk {
        pub files: Vec<(String, Vec<u8>)>,
        pub open: usize,
        pub max_open: usize,
        pub closed: Vec<String>,
    }

    /// In-memory volume with failure injection.
    #[derive(Debug, Default, Clone)]
    pub(crate) struct MemVolume {
        pub disk: Rc<RefCell<Disk>>,
        pub fail_create: Option<String>,
        pub fail_write_at: Option<u64>,
    }

    pub(crate) struct MemFile {
        disk: Rc<RefCell<Disk>>,
        slot: usize,
        fail_write_at: Option<u64>,
    }

    impl MemVolume {
        pub fn files(&self) -> Vec<(String, Vec<u8>)> {
            self.disk.borrow().files.clone()
        }
    }

    impl Volume for MemVolume {
        type File = MemFile;

        fn create(&mut self, name: &str) -> Result<MemFile> {
            if self.fail_create.as_deref() == Some(name) {
                return Err(Error::io("create", name, VOLUME_FULL));
            }
            let mut disk = self.disk.borrow_mut();
            disk.files.push((name.to_string(), Vec::new()));
            disk.open += 1;
            disk.max_open = disk.max_open.max(disk.open);
            let slot = disk.files.len() - 1;
            Ok(MemFile { disk: self.disk.clone(), slot, fail_write_at: self.fail_write_at })
        }
    }

    impl DumpFile for MemFile {
        fn write_all(&mut self, buf: &[u8]) -> Result<()> {
            let mut disk = self.disk.borrow_mut();
            let written = disk.files.iter().map(|(_, data)| data.len() as u64).sum::<u64>();
            if self.fail_write_at.is_some_and(|at| written + buf.len() as u64 > at) {
                let name = disk.files[self.slot].0.clone();
                return Err(Error::io("write", name, VOLUME_FULL));
            }
            disk.files[self.slot].1.extend_from_slice(buf);
            Ok(())
        }

        fn close(self) -> Result<()> {
            let mut disk = self.disk.borrow_mut();
            disk.open -= 1;
            let name = disk.files[self.slot].0.clone();
            disk.closed.push(name);
            Ok(())
        }
    }

    fn config() -> DumpConfig {
        DumpConfig::default().with_chunk_size(4).with_max_file_size(10)
    }

    #[test]
    fn test_rollover_after_threshold() {
        let config = config();
        let mut volume = MemVolume::default();
        let mut state = AcquisitionState::new(20);
        let mut sink = SinkManager::new(&mut volume, &config);

        for chunk in [[1; 4], [2; 4], [3; 4], [4; 4], [5; 4]] {
            sink.write_chunk(&mut state, &chunk).unwrap();
        }
        sink.finish(&mut state).unwrap();

        // the third chunk crosses 10 bytes and still lands in dump1
        assert_eq!(
            volume.files(),
            [
                ("dump1.bin".to_string(), [vec![1; 4], vec![2; 4], vec![3; 4]].concat()),
                ("dump2.bin".to_string(), [vec![4; 4], vec![5; 4]].concat()),
            ]
        );
        assert_eq!(state.total_written, 20);
        assert_eq!(state.files_closed, 2);
        assert_eq!(volume.disk.borrow().max_open, 1);
        assert_eq!(volume.disk.borrow().open, 0);
    }

    #[test]
    fn test_no_trailing_empty_file() {
        let config = DumpConfig::default().with_chunk_size(5).with_max_file_size(10);
        let mut volume = MemVolume::default();
        let mut state = AcquisitionState::new(10);
        let mut sink = SinkManager::new(&mut volume, &config);

        sink.write_chunk(&mut state, &[7; 5]).unwrap();
        sink.write_chunk(&mut state, &[8; 5]).unwrap();
        sink.finish(&mut state).unwrap();

        let files = volume.files();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].1.len(), 10);
        assert!(state.is_complete());
    }

    #[test]
    fn test_create_failure_on_rollover() {
        let config = config();
        let mut volume = MemVolume { fail_create: Some("dump2.bin".to_string()), ..Default::default() };
        let mut state = AcquisitionState::new(16);
        let mut sink = SinkManager::new(&mut volume, &config);

        sink.write_chunk(&mut state, &[1; 4]).unwrap();
        sink.write_chunk(&mut state, &[1; 4]).unwrap();
        let err = sink.write_chunk(&mut state, &[1; 4]).unwrap_err();
        assert_eq!(err, Error::io("create", "dump2.bin", VOLUME_FULL));

        // dump1 was closed before the failing create and keeps its bytes
        assert_eq!(volume.disk.borrow().closed, ["dump1.bin"]);
        assert_eq!(volume.files(), [("dump1.bin".to_string(), vec![1; 12])]);
        assert!(state.current.is_none());
    }

    #[test]
    fn test_write_failure_keeps_file_open() {
        let config = config();
        let mut volume = MemVolume { fail_write_at: Some(6), ..Default::default() };
        let mut state = AcquisitionState::new(8);
        let mut sink = SinkManager::new(&mut volume, &config);

        sink.write_chunk(&mut state, &[1; 4]).unwrap();
        assert!(matches!(sink.write_chunk(&mut state, &[2; 4]), Err(Error::Io { op: "write", .. })));
        assert_eq!(state.total_written, 4);
        assert_eq!(state.current.as_ref().map(|f| f.written), Some(4));
    }
}
