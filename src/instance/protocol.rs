//! Loopback messages between application instances
//!
//! Each message is a single newline-terminated ASCII token. No response is
//! sent; the sender closes its connection right after flushing.

use std::io::{BufRead, Read, Write};

/// Default loopback port used for the single-instance lock
pub const DEFAULT_PORT: u16 = 38727;

/// Token asking the running instance to raise its window
pub const FOCUS_COMMAND: &str = "VORTEX::FOCUS_WINDOW";

/// Longest line accepted from a peer, terminator included
pub const MAX_LINE_LEN: u64 = 64;

/// Commands understood by the primary instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceCommand {
    FocusWindow,
}

impl InstanceCommand {
    pub fn token(self) -> &'static str {
        match self {
            InstanceCommand::FocusWindow => FOCUS_COMMAND,
        }
    }

    /// Match a received line exactly against the known tokens
    pub fn parse(line: &str) -> Option<Self> {
        match line {
            FOCUS_COMMAND => Some(InstanceCommand::FocusWindow),
            _ => None,
        }
    }
}

/// Write a command followed by a newline and flush
pub fn write_command<W: Write>(writer: &mut W, command: InstanceCommand) -> std::io::Result<()> {
    writer.write_all(command.token().as_bytes())?;
    writer.write_all(b"\n")?;
    writer.flush()
}

/// Read one line of at most [`MAX_LINE_LEN`] bytes, without its terminator
/// Returns None if the peer closed without sending anything
pub fn read_line<R: BufRead>(reader: &mut R) -> std::io::Result<Option<String>> {
    let mut line = String::new();
    let read = reader.take(MAX_LINE_LEN).read_line(&mut line)?;
    if read == 0 {
        return Ok(None);
    }

    if read as u64 == MAX_LINE_LEN && !line.ends_with('\n') {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "Message too large",
        ));
    }

    let trimmed = line.trim_end_matches(['\n', '\r']).len();
    line.truncate(trimmed);
    Ok(Some(line))
}
