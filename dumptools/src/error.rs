use std::{fmt, io};

#[derive(Debug)]
pub enum Error {
    Io(io::Error),
    /// Bad command-line input.
    Config(String),
}

impl From<io::Error> for Error {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<&str> for Error {
    fn from(value: &str) -> Self {
        Self::Config(value.to_string())
    }
}

impl From<String> for Error {
    fn from(value: String) -> Self {
        Self::Config(value)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(err) => write!(f, "{err}"),
            Error::Config(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for Error {}
