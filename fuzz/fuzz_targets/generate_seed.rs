//! Every seed yields a run whose predictions the classifier agrees with.

#![no_main]

use libfuzzer_sys::fuzz_target;
use netgen_core::classify::classify;
use netgen_core::{GeneratorConfig, Mode, Network, generate_run, update};

fuzz_target!(|data: [u8; 10]| {
    let seed = u64::from_le_bytes([
        data[0], data[1], data[2], data[3], data[4], data[5], data[6], data[7],
    ]);
    let target = usize::from(u16::from_le_bytes([data[8], data[9]]) % 600) + 1;
    let Ok(generation) = generate_run(GeneratorConfig::new(Mode::Mutual, target, seed)) else {
        return;
    };

    let mut net = Network::new();
    for (instruction, predicted) in generation.instructions.iter().zip(&generation.outcomes) {
        assert_eq!(classify(&net, instruction), Ok(*predicted), "{instruction}");
        if predicted.is_normal() {
            update::apply(&mut net, instruction);
        }
    }
    assert!(netgen_core::invariants::check_all(&net).passed);
});
