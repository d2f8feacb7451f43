use std::{
    fs::{self, File},
    io::{self, BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

use super::{ConcatCommand, Error, Spinner, BLOCK_SIZE};

impl ConcatCommand {
    pub fn init(self) -> Result<(), Error> {
        let ConcatCommand { output, mut inputs } = self;
        if inputs.is_empty() {
            return Err("no input files given".into());
        }
        if let Ok(out) = fs::canonicalize(&output) {
            if inputs.iter().any(|p| fs::canonicalize(p).is_ok_and(|p| p == out)) {
                return Err(format!("output {} is also an input", output.display()).into());
            }
        }
        sort_inputs(&mut inputs);

        let mut out = BufWriter::with_capacity(BLOCK_SIZE, File::create(&output)?);
        let mut total = 0;
        for input in &inputs {
            let mut spinner = Spinner::start(format!("Adding {}", input.display()));
            let size = append_file(input, &mut out)?;
            spinner.stop(format!("Added {} ({size:#x} bytes)", input.display()));
            total += size;
        }
        out.flush()?;

        println!("Files have been concatenated into '{}' ({total:#x} bytes)", output.display());
        Ok(())
    }
}

/// First run of decimal digits in the file name, e.g. `12` for `dump12.bin`. Names
/// without digits get 0.
pub fn extract_index(path: &Path) -> u64 {
    let name = path.file_name().map(|f| f.to_string_lossy()).unwrap_or_default();
    name.bytes()
        .skip_while(|b| !b.is_ascii_digit())
        .take_while(u8::is_ascii_digit)
        .fold(0u64, |acc, b| acc.saturating_mul(10).saturating_add(u64::from(b - b'0')))
}

/// Orders dump files by their numeric index. Ties keep their command-line order.
pub fn sort_inputs(inputs: &mut [PathBuf]) {
    inputs.sort_by_key(|path| extract_index(path))
}

/// Appends `input` to `out` in bounded reads and returns the number of bytes copied.
pub fn append_file<W: Write + ?Sized>(input: &Path, out: &mut W) -> io::Result<u64> {
    let mut reader = BufReader::with_capacity(BLOCK_SIZE, File::open(input)?);
    io::copy(&mut reader, out)
}
