//! Replaying any parseable file must not panic, whatever state it drives
//! the mirrored network into.

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let input = String::from_utf8_lossy(data);
    if let Ok(report) = netgen_core::replay_text(&input) {
        let tallied: usize = report
            .per_command
            .values()
            .map(|t| t.normal + t.failed)
            .sum();
        assert_eq!(tallied + report.unmodeled.len(), report.instructions);
    }
});
