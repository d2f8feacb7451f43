use core::fmt;

const ERROR_BIT: usize = 1 << (usize::BITS - 1);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The platform refused or failed a layout query. `status` is the raw firmware code.
    Provider { op: &'static str, status: usize },
    /// An allocation of the given number of bytes failed.
    ResourceExhausted(usize),
    /// A physical read touched an address the backend cannot serve.
    OutOfRange { address: u64, len: usize },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Provider { op, status } => match status_name(*status) {
                Some(name) => write!(f, "{op}: {name}"),
                None => write!(f, "{op}: status {status:#x}"),
            },
            Error::ResourceExhausted(size) => write!(f, "failed to allocate {size:#x} bytes"),
            Error::OutOfRange { address, len } => write!(f, "physical range {address:#x}+{len:#x} is not readable"),
        }
    }
}

/// Names the common UEFI status codes.
pub fn status_name(status: usize) -> Option<&'static str> {
    if status == 0 {
        return Some("Success");
    }
    if status & ERROR_BIT == 0 {
        return match status {
            1 => Some("Unknown Glyph"),
            2 => Some("Delete Failure"),
            3 => Some("Write Failure"),
            _ => None,
        };
    }
    let name = match status & !ERROR_BIT {
        1 => "Load Error",
        2 => "Invalid Parameter",
        3 => "Unsupported",
        4 => "Bad Buffer Size",
        5 => "Buffer Too Small",
        6 => "Not Ready",
        7 => "Device Error",
        8 => "Write Protected",
        9 => "Out of Resources",
        10 => "Volume Corrupt",
        11 => "Volume Full",
        12 => "No Media",
        13 => "Media Changed",
        14 => "Not Found",
        15 => "Access Denied",
        18 => "Timeout",
        _ => return None,
    };
    Some(name)
}
