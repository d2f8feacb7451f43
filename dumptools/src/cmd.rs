use std::path::PathBuf;

use argh::{FromArgValue, FromArgs};

use super::{parse_count, parse_pattern};

/// Search pattern from `-s`, already decoded to bytes.
pub struct Pattern(pub Vec<u8>);

impl FromArgValue for Pattern {
    fn from_arg_value(value: &str) -> Result<Self, String> {
        parse_pattern(value).map(Self).map_err(|e| e.to_string())
    }
}

pub struct Count(pub u64);

impl FromArgValue for Count {
    fn from_arg_value(value: &str) -> Result<Self, String> {
        parse_count(value).map(Self).map_err(|e| e.to_string())
    }
}

#[derive(FromArgs)]
#[argh(description = "Concatenate numbered dump files into one image, in index order.")]
pub struct ConcatCommand {
    #[argh(positional, description = "output file path")]
    pub output: PathBuf,

    #[argh(positional, description = "dump files, e.g. dump1.bin dump2.bin")]
    pub inputs: Vec<PathBuf>,
}

#[derive(FromArgs)]
#[argh(description = "Search a dump file for a byte pattern or the n-th non-zero byte.")]
pub struct SearchCommand {
    #[argh(positional, description = "dump file path")]
    pub path: PathBuf,

    #[argh(option, short = 's', description = "pattern, 0x-prefixed hex or literal text")]
    pub pattern: Option<Pattern>,

    #[argh(option, short = 'n', description = "report the offset of the n-th non-zero byte")]
    pub nth: Option<Count>,
}
