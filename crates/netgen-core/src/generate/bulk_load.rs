//! The bulk-load generator. Unlike every other generator it owns the network
//! for the duration of the call: it resets it and installs the block it
//! emits.

use crate::instruction::LoadBlock;
use crate::model::{Network, PERSON_POOL, Person};
use crate::rng::DeterministicRng;

use super::sample::Sampler;

/// Build a random bulk load sized against `target` and install it.
///
/// The person count is drawn from `1..=max(1, min(max_persons, target / 10))`.
/// Returns `None` when `max_persons` is zero; the caller then falls back to
/// [`LoadBlock::minimal`].
pub fn generate(
    net: &mut Network,
    rng: &mut DeterministicRng,
    max_persons: usize,
    target: usize,
) -> Option<LoadBlock> {
    let max_n = max_persons.min(PERSON_POOL.len());
    if max_n == 0 {
        return None;
    }
    let upper = (target / 10).min(max_n).max(1);
    let n = rng.range_usize(1, upper);

    let pool: Vec<i32> = PERSON_POOL.iter().collect();
    let ids = rng.sample_distinct(&pool, n);

    let empty = Network::new();
    let mut s = Sampler::new(&empty, rng);
    let names: Vec<String> = (0..n).map(|_| s.name()).collect();
    let ages: Vec<i32> = (0..n).map(|_| s.age()).collect();
    let values: Vec<Vec<i32>> = (1..n)
        .map(|len| (0..len).map(|_| s.rng.range_inclusive(0, 200)).collect())
        .collect();

    let block = LoadBlock {
        ids,
        names,
        ages,
        values,
    };
    install(net, &block);
    Some(block)
}

/// Replace the network's contents with exactly what `block` describes.
pub fn install(net: &mut Network, block: &LoadBlock) {
    net.reset();
    for ((id, name), age) in block.ids.iter().zip(&block.names).zip(&block.ages) {
        net.insert_person(Person::new(*id, name.clone(), *age));
    }
    for (a, b, value) in block.relations() {
        net.link(a, b, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_size_follows_target() {
        let mut rng = DeterministicRng::new(3);
        for _ in 0..50 {
            let mut net = Network::new();
            let block = generate(&mut net, &mut rng, 300, 40).expect("block");
            assert!((1..=4).contains(&block.len()));
            assert_eq!(net.person_count(), block.len());
        }
    }

    #[test]
    fn tiny_target_still_loads_one_person() {
        let mut rng = DeterministicRng::new(3);
        let mut net = Network::new();
        let block = generate(&mut net, &mut rng, 100, 1).expect("block");
        assert_eq!(block.len(), 1);
        assert!(block.values.is_empty());
    }

    #[test]
    fn zero_capacity_is_a_miss() {
        let mut rng = DeterministicRng::new(3);
        let mut net = Network::new();
        assert!(generate(&mut net, &mut rng, 0, 500).is_none());
    }

    #[test]
    fn install_replaces_previous_state_and_counts_triples() {
        let mut net = Network::new();
        net.insert_person(Person::new(77, "old", 1));
        let block = LoadBlock {
            ids: vec![1, 2, 3],
            names: vec!["a".into(), "b".into(), "c".into()],
            ages: vec![1, 2, 3],
            values: vec![vec![4], vec![5, 6]],
        };
        install(&mut net, &block);
        assert!(!net.contains_person(77));
        assert_eq!(net.relation(2, 1), Some(4));
        assert_eq!(net.relation(3, 1), Some(5));
        assert_eq!(net.relation(3, 2), Some(6));
        assert_eq!(net.triple_count(), 1);
    }

    #[test]
    fn generated_ids_are_distinct_and_in_pool() {
        let mut rng = DeterministicRng::new(21);
        let mut net = Network::new();
        let block = generate(&mut net, &mut rng, 300, 3000).expect("block");
        let mut ids = block.ids.clone();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), block.len());
        assert!(block.ids.iter().all(|id| PERSON_POOL.contains(*id)));
        assert_eq!(block.values.len(), block.len() - 1);
        for (i, row) in block.values.iter().enumerate() {
            assert_eq!(row.len(), i + 1);
        }
    }
}
