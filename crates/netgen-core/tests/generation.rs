use netgen_core::catalog::{FailureKey, FailureKind, Outcome};
use netgen_core::classify::classify;
use netgen_core::generate::{Request, generate};
use netgen_core::model::Person;
use netgen_core::rng::DeterministicRng;
use netgen_core::{
    CommandKind, GeneratorConfig, Instruction, LoadBlock, Mode, Network, generate_run, parse,
    replay, update,
};

fn run(mode: Mode, target: usize, seed: u64) -> netgen_core::Generation {
    generate_run(GeneratorConfig::new(mode, target, seed)).expect("valid config")
}

// ── Determinism ──────────────────────────────────────────────────────────────

#[test]
fn same_seed_gives_byte_identical_output() {
    let a = run(Mode::Public, 800, 31);
    let b = run(Mode::Public, 800, 31);
    assert_eq!(a.render(), b.render());
    assert_eq!(a.report, b.report);
}

#[test]
fn different_seeds_diverge() {
    let a = run(Mode::Mutual, 300, 1);
    let b = run(Mode::Mutual, 300, 2);
    assert_ne!(a.render(), b.render());
}

// ── Coverage ─────────────────────────────────────────────────────────────────

#[test]
fn large_run_covers_every_catalogued_failure() {
    let generation = run(Mode::Public, 5_000, 2024);
    let coverage = &generation.report.coverage;
    assert!(
        coverage.missing_failures.is_empty(),
        "uncovered: {:?}",
        coverage.missing_failures
    );
    assert_eq!(coverage.failures_covered, 73);
}

#[test]
fn small_runs_still_cover_orphaned_broadcasts() {
    let key = FailureKey::new(CommandKind::SendMessage, FailureKind::TagMissing).to_string();
    for seed in 100..108 {
        let generation = run(Mode::Mutual, 500, seed);
        let coverage = &generation.report.coverage;
        assert!(
            !coverage.missing_failures.contains(&key),
            "seed {seed}: {:?}",
            coverage.missing_failures
        );
    }
}

#[test]
fn replay_agrees_with_the_run_on_success_coverage() {
    let generation = run(Mode::Public, 2_000, 77);
    let report = replay(&generation.instructions);
    assert!(report.is_clean(), "{:?}", report.unmodeled);
    assert_eq!(
        report.coverage.missing_successes,
        generation.report.coverage.missing_successes
    );
}

// ── Prediction agreement ─────────────────────────────────────────────────────

#[test]
fn every_prediction_matches_the_classifier() {
    for seed in [3, 8, 13] {
        let generation = run(Mode::Mutual, 1_500, seed);
        assert_eq!(generation.outcomes.len(), generation.instructions.len());

        let mut net = Network::new();
        for (i, (instruction, predicted)) in generation
            .instructions
            .iter()
            .zip(&generation.outcomes)
            .enumerate()
        {
            let actual = classify(&net, instruction).expect("modeled instruction");
            assert_eq!(actual, *predicted, "seed {seed}, step {i}: {instruction}");
            if actual.is_normal() {
                update::apply(&mut net, instruction);
            }
        }
        assert_eq!(net, generation.network);
    }
}

#[test]
fn successful_add_person_always_uses_a_fresh_id() {
    let generation = run(Mode::Public, 1_000, 5);
    let mut net = Network::new();
    for (instruction, outcome) in generation.instructions.iter().zip(&generation.outcomes) {
        if let (Instruction::AddPerson { id, .. }, Outcome::Normal) = (instruction, outcome) {
            assert!(!net.contains_person(*id), "ap reused id {id}");
        }
        if outcome.is_normal() {
            update::apply(&mut net, instruction);
        }
    }
}

#[test]
fn rendered_text_round_trips_through_the_parser() {
    let generation = run(Mode::Public, 1_200, 64);
    let parsed = parse(&generation.render()).expect("parse");
    assert_eq!(parsed, generation.instructions);
}

// ── Concrete scenarios ───────────────────────────────────────────────────────

#[test]
fn count_of_one_yields_only_the_bulk_load() {
    let generation = run(Mode::Public, 1, 1);
    assert_eq!(generation.instructions.len(), 1);
    let text = generation.render();
    assert!(text.starts_with("ln "));
    let Some(Instruction::LoadNetwork(block)) = generation.instructions.first() else {
        panic!("expected a bulk load");
    };
    assert_eq!(text.lines().count(), block.line_count());
}

#[test]
fn bulk_load_block_has_the_documented_layout() {
    let generation = run(Mode::Public, 3_000, 99);
    let Some(Instruction::LoadNetwork(block)) = generation.instructions.first() else {
        panic!("expected a bulk load");
    };
    let n = block.len();
    assert!(n <= Mode::Public.max_load_persons());

    let text = generation.render();
    let lines: Vec<&str> = text.lines().take(block.line_count()).collect();
    assert_eq!(lines[0], format!("ln {n}"));
    assert_eq!(lines[1].split(' ').count(), n);
    assert_eq!(lines[2].split(' ').count(), n);
    assert_eq!(lines[3].split(' ').count(), n);
    for (row, line) in lines[4..].iter().enumerate() {
        let values: Vec<i32> = line
            .split(' ')
            .map(|v| v.parse().expect("integer"))
            .collect();
        assert_eq!(values.len(), row + 1);
        assert!(values.iter().all(|v| *v >= 0));
    }
    assert_eq!(lines.len(), 4 + n - 1);

    let mut ids = block.ids.clone();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), n);
}

#[test]
fn mutual_mode_respects_its_ceilings() {
    let generation = run(Mode::Mutual, 3_000, 12);
    assert!(generation.render().lines().count() <= 3_000);
    let Some(Instruction::LoadNetwork(block)) = generation.instructions.first() else {
        panic!("expected a bulk load");
    };
    assert!(block.len() <= 100);
}

#[test]
fn query_value_relation_not_found_names_two_unrelated_people() {
    let mut net = Network::new();
    for id in 1..=4 {
        net.insert_person(Person::new(id, format!("p{id}"), 30));
    }
    let mut rng = DeterministicRng::new(7);
    for _ in 0..20 {
        let generated = generate(
            CommandKind::QueryValue,
            Request::Failure(FailureKind::RelationNotFound),
            &net,
            &mut rng,
        )
        .expect("state supports the request");
        let Instruction::QueryValue { id1, id2 } = generated.instruction else {
            panic!("expected qv");
        };
        assert_ne!(id1, id2);
        assert!(net.contains_person(id1) && net.contains_person(id2));
        assert!(net.relation(id1, id2).is_none());
    }
}

#[test]
fn modify_relation_to_zero_cascades_out_of_tags() {
    let mut net = Network::new();
    update::apply(
        &mut net,
        &Instruction::LoadNetwork(LoadBlock {
            ids: vec![10, 20, 30],
            names: vec!["a".into(), "b".into(), "c".into()],
            ages: vec![1, 2, 3],
            values: vec![vec![6], vec![2, 3]],
        }),
    );
    let setup = [
        Instruction::AddTag { person: 10, tag: 1 },
        Instruction::AddTag { person: 20, tag: 2 },
        Instruction::AddToTag {
            member: 20,
            owner: 10,
            tag: 1,
        },
        Instruction::AddToTag {
            member: 10,
            owner: 20,
            tag: 2,
        },
        Instruction::AddToTag {
            member: 30,
            owner: 10,
            tag: 1,
        },
    ];
    for instruction in &setup {
        assert_eq!(classify(&net, instruction), Ok(Outcome::Normal));
        update::apply(&mut net, instruction);
    }

    let mr = Instruction::ModifyRelation {
        id1: 20,
        id2: 10,
        delta: -6,
    };
    assert_eq!(classify(&net, &mr), Ok(Outcome::Normal));
    update::apply(&mut net, &mr);

    assert!(net.relation(10, 20).is_none());
    assert!(!net.tag_has_member(10, 1, 20));
    assert!(!net.tag_has_member(20, 2, 10));
    assert!(net.tag_has_member(10, 1, 30));
    assert_eq!(net.triple_count(), 0);
    assert!(netgen_core::invariants::check_all(&net).passed);
}
