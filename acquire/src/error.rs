use alloc::string::String;
use core::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Layout query or physical read failed.
    Provider(physmap::Error),
    ResourceExhausted(usize),
    /// Output file create, write or close failed. `status` is the backend's raw code.
    Io { op: &'static str, file: String, status: usize },
    Config(&'static str),
}

impl Error {
    pub fn io(op: &'static str, file: impl Into<String>, status: usize) -> Self {
        Self::Io { op, file: file.into(), status }
    }
}

impl From<physmap::Error> for Error {
    fn from(value: physmap::Error) -> Self {
        match value {
            physmap::Error::ResourceExhausted(size) => Self::ResourceExhausted(size),
            err => Self::Provider(err),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Provider(err) => write!(f, "{err}"),
            Error::ResourceExhausted(size) => write!(f, "failed to allocate {size:#x} bytes"),
            Error::Io { op, file, status } => match physmap::status_name(*status) {
                Some(name) => write!(f, "failed to {op} {file}: {name}"),
                None => write!(f, "failed to {op} {file}: status {status:#x}"),
            },
            Error::Config(msg) => write!(f, "invalid configuration: {msg}"),
        }
    }
}

pub type Result<T, E = Error> = core::result::Result<T, E>;
