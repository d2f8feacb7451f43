//! Console and file-name text in the firmware's UCS-2 encoding.

use alloc::{format, string::String, vec::Vec};
use core::iter;

/// Code units per `OutputString` call, not counting the terminator.
const CHUNK: usize = 128;

const REPLACEMENT: u16 = 0xfffd;

#[inline]
fn code_unit(c: char) -> u16 {
    u16::try_from(u32::from(c)).unwrap_or(REPLACEMENT)
}

/// Feeds `s` to `emit` as NUL-terminated UCS-2 pieces, turning `\n` into `\r\n`.
/// Characters outside the basic plane are replaced with U+FFFD.
pub fn encode_console(s: &str, mut emit: impl FnMut(&[u16])) {
    let mut buf = [0u16; CHUNK + 1];
    let mut len = 0;
    for c in s.chars() {
        if len + 2 > CHUNK {
            buf[len] = 0;
            emit(&buf[..=len]);
            len = 0;
        }
        if c == '\n' {
            buf[len] = u16::from(b'\r');
            len += 1;
        }
        buf[len] = code_unit(c);
        len += 1;
    }
    if len != 0 {
        buf[len] = 0;
        emit(&buf[..=len]);
    }
}

/// NUL-terminated UCS-2 copy of `s`, for file names.
pub fn to_cstr16(s: &str) -> Vec<u16> {
    s.chars().map(code_unit).chain(iter::once(0)).collect()
}

/// The `Overall Progress` line, redrawn in place and only when the value moves.
#[derive(Debug, Default)]
pub struct ProgressLine {
    last: Option<u8>,
}

impl ProgressLine {
    pub fn render(&mut self, percent: u8) -> Option<String> {
        if self.last == Some(percent) {
            return None;
        }
        self.last = Some(percent);
        Some(format!("\rOverall Progress: {percent}%"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(s: &str) -> Vec<Vec<u16>> {
        let mut pieces = Vec::new();
        encode_console(s, |piece| pieces.push(piece.to_vec()));
        pieces
    }

    #[test]
    fn test_encode_console() {
        let pieces = collect("ok\n");
        assert_eq!(pieces, [vec![b'o' as u16, b'k' as u16, b'\r' as u16, b'\n' as u16, 0]]);

        assert!(collect("").is_empty());
        assert_eq!(collect("é😀"), [vec![0xe9, REPLACEMENT, 0]]);
    }

    #[test]
    fn test_encode_console_long() {
        let line = "a\n".repeat(200);
        let pieces = collect(&line);
        assert!(pieces.len() > 1);
        assert!(pieces.iter().all(|p| p.len() <= CHUNK + 1 && p.last() == Some(&0)));

        let joined = pieces.iter().flat_map(|p| &p[..p.len() - 1]).copied().collect::<Vec<_>>();
        let expected = "a\r\n".repeat(200).encode_utf16().collect::<Vec<_>>();
        assert_eq!(joined, expected);
        // a \r\n pair never straddles two pieces
        assert!(pieces.iter().all(|p| p[p.len() - 2] != u16::from(b'\r')));
    }

    #[test]
    fn test_to_cstr16() {
        assert_eq!(to_cstr16("dump1.bin"), "dump1.bin\0".encode_utf16().collect::<Vec<_>>());
    }

    #[test]
    fn test_progress_line() {
        let mut line = ProgressLine::default();
        assert_eq!(line.render(0).as_deref(), Some("\rOverall Progress: 0%"));
        assert_eq!(line.render(0), None);
        assert_eq!(line.render(42).as_deref(), Some("\rOverall Progress: 42%"));
        assert_eq!(line.render(42), None);
        assert_eq!(line.render(100).as_deref(), Some("\rOverall Progress: 100%"));
    }
}
