use std::{
    borrow::Cow,
    fmt::Display,
    io::{stdout, Write},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
    time::{Duration, Instant},
};

pub struct Spinner {
    thread_handle: Option<thread::JoinHandle<()>>,
    still_spinning: Arc<AtomicBool>,
}

impl Spinner {
    pub fn start(msg: impl Into<Cow<'static, str>>) -> Self {
        let still_spinning = Arc::new(AtomicBool::new(true));
        let spinner_chars = ['-', '\\', '|', '/'];
        let msg = msg.into();
        let time = Instant::now();
        let ssp = still_spinning.clone();
        let handle = thread::spawn(move || {
            let mut stdout = stdout();
            for c in spinner_chars.iter().cycle().take_while(|_| ssp.load(Ordering::Relaxed)) {
                let _ = write!(stdout, "\r\x1B[34m[{c}]\x1B[0m {msg}  Time: {:.1}s", time.elapsed().as_secs_f32());
                let _ = stdout.flush();
                thread::sleep(Duration::from_millis(100));
            }
            let _ = write!(stdout, "\r\x1B[2K");
        });

        Self { thread_handle: Some(handle), still_spinning }
    }

    fn halt(&mut self) {
        self.still_spinning.store(false, Ordering::Relaxed);
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }

    pub fn stop(&mut self, msg: impl Display) {
        self.halt();
        println!("\x1B[34m[*]\x1B[0m {msg}")
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        self.halt()
    }
}
