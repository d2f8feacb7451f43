use alloc::vec::Vec;

use physmap::{MemoryLayout, PhysicalMemoryRead};

use super::{
    select_usable, AcquisitionState, DumpConfig, Error, Progress, ProgressSink, Result, SinkManager, Volume,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub regions: usize,
    pub bytes_written: u64,
    pub files: u32,
}

/// Copies every usable physical range, in enumeration order, through one reusable staging
/// buffer into numbered output files.
pub struct Engine {
    config: DumpConfig,
    staging: Vec<u8>,
}

impl Engine {
    /// Validates `config` and allocates the staging buffer up front, so a host that cannot
    /// spare `chunk_size` bytes fails before any file is touched.
    pub fn new(config: DumpConfig) -> Result<Self> {
        config.validate()?;
        let mut staging = Vec::new();
        staging
            .try_reserve_exact(config.chunk_size)
            .map_err(|_| Error::ResourceExhausted(config.chunk_size))?;
        staging.resize(config.chunk_size, 0);
        Ok(Self { config, staging })
    }

    pub fn config(&self) -> &DumpConfig {
        &self.config
    }

    pub fn run<P, V, S>(&mut self, platform: &P, volume: &mut V, progress: &mut S) -> Result<Summary>
    where
        P: MemoryLayout + PhysicalMemoryRead + ?Sized,
        V: Volume,
        S: ProgressSink + ?Sized,
    {
        let descriptors = platform.fetch_layout()?;
        let (regions, total) = select_usable(&descriptors);
        log::debug!("{} descriptors, {} usable, {total:#x} bytes planned", descriptors.len(), regions.len());

        let mut state = AcquisitionState::new(total);
        let mut tracker = Progress::new();
        if total == 0 {
            log::warn!("no usable memory reported, nothing to dump");
            tracker.update(0, 0, progress);
            return Ok(Summary { regions: 0, bytes_written: 0, files: 0 });
        }

        let chunk_size = self.config.chunk_size as u64;
        let mut sink = SinkManager::new(volume, &self.config);
        for region in &regions {
            log::debug!("region {:#x}..{:#x}", region.start, region.end());
            let mut address = region.start;
            let mut remaining = region.len;
            while remaining != 0 {
                // bounded by chunk_size, which is a usize
                let len = remaining.min(chunk_size) as usize;
                let buf = &mut self.staging[..len];
                platform.read_at(buf, address)?;
                sink.write_chunk(&mut state, buf)?;
                tracker.update(state.total_written, state.total_planned, progress);
                address += len as u64;
                remaining -= len as u64;
            }
        }
        sink.finish(&mut state)?;

        Ok(Summary { regions: regions.len(), bytes_written: state.total_written, files: state.files_closed })
    }
}
