use std::{
    fs::File,
    io::{self, ErrorKind, Read},
};

use memchr::memmem::Finder;

use super::{Count, Error, Pattern, SearchCommand, BLOCK_SIZE};

impl SearchCommand {
    pub fn init(self) -> Result<(), Error> {
        let SearchCommand { path, pattern, nth } = self;
        match (pattern, nth) {
            (Some(Pattern(pattern)), None) => {
                let file = File::open(path)?;
                let mut matches = 0u64;
                scan_pattern(file, &pattern, BLOCK_SIZE, |offset| {
                    matches += 1;
                    println!("Pattern found at offset: 0x{offset:x}");
                })?;
                if matches == 0 {
                    println!("Pattern not found.");
                }
            }
            (None, Some(Count(nth))) => match find_nth_nonzero(File::open(path)?, nth, BLOCK_SIZE)? {
                Some(offset) => println!("Occurrence {nth} of non-zero byte found at offset: 0x{offset:x}"),
                None => println!("{nth}-th non-zero byte not found."),
            },
            _ => return Err("use exactly one of -s <pattern> or -n <count>".into()),
        }
        Ok(())
    }
}

/// Decodes a search pattern: `0x` followed by an even number of hex digits, or anything
/// else taken as its literal bytes.
pub fn parse_pattern(value: &str) -> Result<Vec<u8>, Error> {
    if value.is_empty() {
        return Err("empty pattern provided for search".into());
    }
    let Some(digits) = value.strip_prefix("0x") else {
        return Ok(value.as_bytes().to_vec());
    };
    if digits.is_empty() {
        return Err("empty hex pattern".into());
    }
    if digits.len() % 2 != 0 {
        return Err(format!("invalid pattern length {}, hex patterns need an even number of digits", digits.len()).into());
    }
    hex::decode(digits).map_err(|err| Error::Config(format!("invalid hex pattern: {err}")))
}

pub fn parse_count(value: &str) -> Result<u64, Error> {
    match value.parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(format!("invalid count `{value}`, expected a positive integer").into()),
    }
}

fn read_some<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    loop {
        match reader.read(buf) {
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            ret => return ret,
        }
    }
}

/// Calls `found` with the offset of every occurrence of `pattern`, in ascending order.
/// Overlapping occurrences are all reported.
///
/// The last `pattern.len() - 1` bytes of each block are carried into the next one, so a
/// match spanning two reads is still seen.
pub fn scan_pattern<R, F>(mut reader: R, pattern: &[u8], block_size: usize, mut found: F) -> io::Result<()>
where
    R: Read,
    F: FnMut(u64),
{
    if pattern.is_empty() {
        return Ok(());
    }
    let finder = Finder::new(pattern);
    let keep = pattern.len() - 1;
    let mut buf = vec![0; block_size.max(1) + keep];
    let mut filled = 0;
    // file offset of buf[0]
    let mut base = 0u64;

    loop {
        let n = read_some(&mut reader, &mut buf[filled..])?;
        if n == 0 {
            return Ok(());
        }
        filled += n;

        let window = &buf[..filled];
        let mut pos = 0;
        while let Some(i) = finder.find(&window[pos..]) {
            found(base + (pos + i) as u64);
            pos += i + 1;
        }

        let tail = filled.saturating_sub(keep);
        buf.copy_within(tail..filled, 0);
        base += tail as u64;
        filled -= tail;
    }
}

/// Offset of the `nth` (1-based) non-zero byte.
pub fn find_nth_nonzero<R: Read>(mut reader: R, nth: u64, block_size: usize) -> io::Result<Option<u64>> {
    let mut buf = vec![0; block_size.max(1)];
    let mut base = 0u64;
    let mut seen = 0u64;

    loop {
        let n = read_some(&mut reader, &mut buf)?;
        if n == 0 {
            return Ok(None);
        }
        let block = &buf[..n];
        let here = block.iter().filter(|&&b| b != 0).count() as u64;
        if seen + here >= nth {
            let skip = (nth - seen - 1) as usize;
            let offset = block.iter().enumerate().filter(|&(_, &b)| b != 0).nth(skip).map(|(i, _)| i);
            return Ok(offset.map(|i| base + i as u64));
        }
        seen += here;
        base += n as u64;
    }
}
