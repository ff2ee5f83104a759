//! Output formatting for search results

use crate::query::FileRecord;
use std::io::{self, Write};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Print records one per line: type marker, size, full path
pub fn print_records(records: &[FileRecord], color: bool) -> io::Result<()> {
    let choice = if color {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    };
    let mut stdout = StandardStream::stdout(choice);
    write_records(&mut stdout, records)
}

/// Print records as a JSON array
pub fn print_records_json(records: &[FileRecord]) -> io::Result<()> {
    let stdout = io::stdout();
    let mut lock = stdout.lock();
    serde_json::to_writer_pretty(&mut lock, records).map_err(io::Error::from)?;
    writeln!(lock)
}

pub fn write_records<W: WriteColor>(out: &mut W, records: &[FileRecord]) -> io::Result<()> {
    for record in records {
        if record.is_folder() {
            out.set_color(ColorSpec::new().set_fg(Some(Color::Blue)).set_bold(true))?;
            write!(out, "d")?;
            out.reset()?;
            write!(out, " {:>9} ", "-")?;
        } else {
            write!(out, "f {:>9} ", format_size(record.size))?;
        }

        // Dim the parent so the name stands out
        let parent_len = record.full_path.len().saturating_sub(record.name.len());
        if parent_len > 0 && record.full_path.ends_with(&record.name) {
            out.set_color(ColorSpec::new().set_fg(Some(Color::Magenta)))?;
            write!(out, "{}", &record.full_path[..parent_len])?;
            out.reset()?;
            writeln!(out, "{}", record.name)?;
        } else {
            writeln!(out, "{}", record.full_path)?;
        }
    }

    Ok(())
}

/// Human-readable byte count
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}
