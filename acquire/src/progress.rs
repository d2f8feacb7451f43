pub trait ProgressSink {
    fn report(&mut self, percent: u8);
}

impl<F: FnMut(u8)> ProgressSink for F {
    #[inline]
    fn report(&mut self, percent: u8) {
        self(percent)
    }
}

/// `floor(written * 100 / planned)`. Nothing planned counts as done.
#[inline]
pub fn percent(written: u64, planned: u64) -> u8 {
    if planned == 0 {
        return 100;
    }
    (u128::from(written) * 100 / u128::from(planned)).min(100) as u8
}

/// Turns byte counters into a non-decreasing stream of percentages.
#[derive(Debug, Default)]
pub struct Progress {
    last: u8,
}

impl Progress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update<S: ProgressSink + ?Sized>(&mut self, written: u64, planned: u64, sink: &mut S) -> u8 {
        self.last = self.last.max(percent(written, planned));
        sink.report(self.last);
        self.last
    }
}
