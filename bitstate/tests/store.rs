//! Behavioral tests driving a [StateStore] against a plain `Vec<bool>` model.

use bitstate::StateStore;
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Reference model: the same semantics over an unpacked vector.
struct Model {
    bits: Vec<bool>,
}

impl Model {
    fn new(capacity: usize) -> Self {
        Self {
            bits: vec![false; capacity],
        }
    }

    fn active(&self) -> Option<usize> {
        self.bits.iter().position(|&bit| bit)
    }

    fn set(&mut self, index: usize, value: bool, exclusive: bool) {
        if index >= self.bits.len() {
            return;
        }
        if value && exclusive {
            self.bits.fill(false);
        }
        self.bits[index] = value;
    }

    fn toggle(&mut self, index: usize) {
        if index >= self.bits.len() {
            return;
        }
        let value = !self.bits[index];
        if value {
            self.bits.fill(false);
        }
        self.bits[index] = value;
    }

    fn set_range(&mut self, start: usize, end: usize, value: bool) {
        if start >= self.bits.len() {
            return;
        }
        self.bits.fill(false);
        let end = end.min(self.bits.len() - 1);
        if start > end {
            return;
        }
        for index in start..=end {
            self.bits[index] = value;
        }
    }
}

fn assert_matches(store: &StateStore, model: &Model) {
    assert_eq!(store.capacity(), model.bits.len());
    assert_eq!(store.active(), model.active());
    let expected: Vec<usize> = model
        .bits
        .iter()
        .enumerate()
        .filter_map(|(index, &bit)| bit.then_some(index))
        .collect();
    assert_eq!(store.set_indices(), expected);
    assert_eq!(store.count_set(), expected.len());
    assert_eq!(store.any_set(), !expected.is_empty());
    for (index, &bit) in model.bits.iter().enumerate() {
        assert_eq!(store.get(index), bit, "slot {index} diverged");
    }
}

#[test]
fn random_operations_match_model() {
    let mut rng = StdRng::seed_from_u64(42);
    for capacity in [1usize, 7, 8, 9, 64, 254] {
        let mut store = StateStore::new(capacity);
        let mut model = Model::new(capacity);
        for _ in 0..500 {
            // Indices occasionally out of range on purpose.
            let index = rng.gen_range(0..capacity + 4);
            match rng.gen_range(0..8) {
                0 => {
                    let exclusive = rng.gen::<bool>();
                    store.set(index, true, exclusive);
                    model.set(index, true, exclusive);
                }
                1 => {
                    store.set(index, false, rng.gen::<bool>());
                    model.set(index, false, false);
                }
                2 => {
                    store.toggle(index);
                    model.toggle(index);
                }
                3 => {
                    store.reset();
                    model.bits.fill(false);
                }
                4 => {
                    let value = rng.gen::<bool>();
                    store.fill(value);
                    model.bits.fill(value);
                }
                5 => {
                    store.set_default();
                    model.bits.fill(false);
                    model.bits[0] = true;
                }
                6 => {
                    let end = rng.gen_range(0..capacity + 4);
                    let value = rng.gen::<bool>();
                    store.set_range(index, end, value);
                    model.set_range(index, end, value);
                }
                _ => {
                    store.invert();
                    for bit in &mut model.bits {
                        *bit = !*bit;
                    }
                }
            }
            assert_matches(&store, &model);
        }
    }
}

#[test]
fn snapshot_survives_arbitrary_mutation() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut store = StateStore::new(33);
    for _ in 0..50 {
        // Scramble, save, scramble again, then restore and compare.
        for _ in 0..10 {
            store.set(rng.gen_range(0..33), rng.gen::<bool>(), rng.gen::<bool>());
        }
        let saved = store.clone();
        store.save();
        for _ in 0..10 {
            store.toggle(rng.gen_range(0..40));
        }
        store.restore();
        assert_eq!(store, saved);
        assert_eq!(store.active(), saved.active());
    }
}

#[test]
fn wire_roundtrip_under_random_state() {
    let mut rng = StdRng::seed_from_u64(1234);
    for capacity in [1usize, 8, 13, 254] {
        let mut store = StateStore::new(capacity);
        for _ in 0..capacity {
            store.set(rng.gen_range(0..capacity), rng.gen::<bool>(), false);
        }
        let mut buf = store.encode();
        let decoded = StateStore::read(&mut buf).unwrap();
        assert_eq!(decoded, store);
    }
}

#[test]
fn bit_string_parses_back() {
    let mut rng = StdRng::seed_from_u64(99);
    let mut store = StateStore::new(21);
    for _ in 0..21 {
        store.set(rng.gen_range(0..21), rng.gen::<bool>(), false);
    }
    let text = store.serialize_bits(store.serialized_size());
    assert_eq!(text.len(), 21);
    let mut parsed = StateStore::new(21);
    for (index, ch) in text.chars().enumerate() {
        parsed.set(index, ch == '1', false);
    }
    assert_eq!(parsed, store);
}

#[test]
fn example_scenario() {
    let mut store = StateStore::new(5);
    store.set_default();
    store.toggle(3);
    assert_eq!(store.describe_active(32), "3 assigned");
    store.toggle(3);
    assert_eq!(store.describe_active(32), "- unassigned");
}
