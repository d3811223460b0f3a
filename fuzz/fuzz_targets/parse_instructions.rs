//! The parser must reject malformed text with an error, never a panic.

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let input = String::from_utf8_lossy(data);
    if let Ok(instructions) = netgen_core::parse(&input) {
        let lines: usize = instructions.iter().map(netgen_core::Instruction::line_count).sum();
        assert!(lines <= input.lines().count());
    }
});
