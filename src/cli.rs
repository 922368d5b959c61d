//! Command line definition

use std::path::PathBuf;

use clap::Parser;

use crate::error::{Error, Result};
use crate::shm::layout::STATE_ALIGN;

pub const DEFAULT_BACKING: &str = "/dev/mem";
pub const DEFAULT_OFFSET: &str = "200000000";

/// Snake shared between two terminals through a memory-mapped region.
/// Start it twice: one instance plays, the other watches and takes over on
/// T (transfer) or when the player disappears.
#[derive(Debug, Parser)]
#[command(
    name = "handoff-snake",
    version,
    after_help = "Keys: arrows/WASD move, P pause, R restart, T transfer control, Q quit"
)]
pub struct Cli {
    /// File or memory device holding the shared state
    #[arg(value_name = "FILE", default_value = DEFAULT_BACKING)]
    pub path: PathBuf,

    /// Hex byte offset into FILE, e.g. 1000 or 0x1000
    #[arg(value_name = "OFFSET", default_value = DEFAULT_OFFSET)]
    pub offset: String,

    /// JSON file overriding timing settings
    #[arg(long, value_name = "FILE")]
    pub settings: Option<PathBuf>,

    /// Write logs here instead of stderr
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Print the shared state as JSON and exit without joining
    #[arg(long)]
    pub status: bool,
}

impl Cli {
    pub fn offset(&self) -> Result<u64> {
        parse_offset(&self.offset)
    }
}

/// Parse a hexadecimal offset with optional `0x` prefix
pub fn parse_offset(text: &str) -> Result<u64> {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    let offset = u64::from_str_radix(digits, 16)
        .map_err(|_| Error::Argument(format!("invalid hex offset: {text}")))?;
    if offset % STATE_ALIGN as u64 != 0 {
        return Err(Error::Argument(format!(
            "offset {text} must be a multiple of {STATE_ALIGN}"
        )));
    }
    Ok(offset)
}
