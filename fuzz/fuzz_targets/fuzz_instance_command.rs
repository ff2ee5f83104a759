#![no_main]

use libfuzzer_sys::fuzz_target;
use std::io::Cursor;
use vortex_core::instance::protocol::{read_line, InstanceCommand};

fuzz_target!(|data: &[u8]| {
    // Arbitrary peer input must never panic the listener
    let mut reader = Cursor::new(data);
    if let Ok(Some(line)) = read_line(&mut reader) {
        let _ = InstanceCommand::parse(&line);
    }
});
