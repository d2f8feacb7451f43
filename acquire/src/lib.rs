#![no_std]

extern crate alloc;
#[cfg(test)]
extern crate std;

mod config;
mod engine;
mod error;
mod hook;
mod progress;
mod region;
mod sink;

pub use config::*;
pub use engine::*;
pub use error::*;
pub use hook::*;
pub use progress::*;
pub use region::*;
pub use sink::*;
