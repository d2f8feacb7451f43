use super::{Result, Summary};

/// Called once the run is over and its outcome has been reported, before the program exits.
///
/// On an attended console this is where the operator gets to read the screen before the
/// machine reboots.
pub trait Acknowledge {
    fn acknowledge(&mut self);
}

/// For unattended runs: returns immediately.
#[derive(Debug, Default, Clone, Copy)]
pub struct Headless;

impl Acknowledge for Headless {
    fn acknowledge(&mut self) {}
}

impl<F: FnMut()> Acknowledge for F {
    fn acknowledge(&mut self) {
        self()
    }
}

/// Reports the outcome of a run, waits for acknowledgment and hands the result back.
pub fn conclude<A: Acknowledge + ?Sized>(result: Result<Summary>, ack: &mut A) -> Result<Summary> {
    match &result {
        Ok(summary) => log::info!(
            "Successfully dumped memory to dump files. ({:#x} bytes in {} files)",
            summary.bytes_written,
            summary.files
        ),
        Err(err) => log::error!("{err}"),
    }
    ack.acknowledge();
    result
}
