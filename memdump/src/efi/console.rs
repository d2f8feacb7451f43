use core::{
    fmt::{self, Write},
    ptr,
    sync::atomic::{AtomicBool, AtomicPtr, Ordering},
};

use acquire::{Acknowledge, ProgressSink};
use log::{Level, LevelFilter, Log, Metadata, Record};
use physmap::uefi::raw::{InputKey, SimpleTextInputProtocol, SimpleTextOutputProtocol, Status};

use crate::text::{encode_console, ProgressLine};

static CON_OUT: AtomicPtr<SimpleTextOutputProtocol> = AtomicPtr::new(ptr::null_mut());

/// Set while the cursor sits at the end of the progress line.
static MID_LINE: AtomicBool = AtomicBool::new(false);

#[cfg(feature = "verbose")]
const MAX_LEVEL: LevelFilter = LevelFilter::Debug;
#[cfg(not(feature = "verbose"))]
const MAX_LEVEL: LevelFilter = LevelFilter::Info;

/// Writer over the firmware text console.
pub struct ConOut;

impl Write for ConOut {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let con_out = CON_OUT.load(Ordering::Acquire);
        if con_out.is_null() {
            return Err(fmt::Error);
        }
        let mut status = Status::SUCCESS;
        // SAFETY: set from the system table in `init` and valid while boot services run
        encode_console(s, |piece| unsafe {
            let ret = ((*con_out).output_string)(con_out, piece.as_ptr());
            if ret.is_error() {
                status = ret;
            }
        });
        match status.is_error() {
            true => Err(fmt::Error),
            false => Ok(()),
        }
    }
}

macro_rules! println {
    ($($arg:tt)*) => {{
        let _ = core::fmt::Write::write_fmt(&mut $crate::efi::console::ConOut, format_args!($($arg)*));
        let _ = core::fmt::Write::write_str(&mut $crate::efi::console::ConOut, "\n");
    }};
}

/// Ends a pending progress line so the next message starts on its own row.
fn break_line() {
    if MID_LINE.swap(false, Ordering::Relaxed) {
        let _ = ConOut.write_str("\n");
    }
}

struct ConsoleLogger;

static LOGGER: ConsoleLogger = ConsoleLogger;

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= MAX_LEVEL
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        break_line();
        match record.level() {
            Level::Error => println!("error: {}", record.args()),
            Level::Warn => println!("warning: {}", record.args()),
            Level::Info => println!("{}", record.args()),
            Level::Debug | Level::Trace => println!("[{}] {}", record.target(), record.args()),
        }
    }

    fn flush(&self) {}
}

/// Routes `log` records to `con_out`.
///
/// # Safety
/// `con_out` must stay valid while boot services run.
pub unsafe fn init(con_out: *mut SimpleTextOutputProtocol) {
    CON_OUT.store(con_out, Ordering::Release);
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(MAX_LEVEL);
    }
}

/// Renders acquisition progress as `Overall Progress: N%` on a single, rewritten line.
#[derive(Debug, Default)]
pub struct ConsoleProgress {
    line: ProgressLine,
}

impl ProgressSink for ConsoleProgress {
    fn report(&mut self, percent: u8) {
        if let Some(text) = self.line.render(percent) {
            let _ = ConOut.write_str(&text);
            MID_LINE.store(true, Ordering::Relaxed);
        }
    }
}

/// Holds the final screen until a key is pressed.
pub struct KeyPress {
    con_in: *mut SimpleTextInputProtocol,
}

impl KeyPress {
    /// # Safety
    /// `con_in` must be the system table's console input protocol or null.
    pub unsafe fn new(con_in: *mut SimpleTextInputProtocol) -> Self {
        Self { con_in }
    }
}

impl Acknowledge for KeyPress {
    fn acknowledge(&mut self) {
        break_line();
        if self.con_in.is_null() {
            return;
        }
        println!("Press any key to exit...");
        let mut key = InputKey::default();
        // SAFETY: checked non-null above, valid per `new`
        unsafe {
            ((*self.con_in).reset)(self.con_in, false);
            while ((*self.con_in).read_key_stroke)(self.con_in, &mut key) == Status::NOT_READY {
                core::hint::spin_loop();
            }
        }
    }
}
