mod cmd;
mod concat;
mod error;
mod search;
mod utils;

pub use cmd::*;
pub use concat::*;
pub use error::*;
pub use search::*;
pub use utils::*;

/// Read size for streaming through dump files.
pub const BLOCK_SIZE: usize = 0x100000;
