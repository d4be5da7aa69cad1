#![no_main]

use arbitrary::Arbitrary;
use bitstate::StateStore;
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
enum StoreOperation {
    Set(u16, bool, bool),
    Select(u16),
    Toggle(u16),
    Reset,
    Fill(bool),
    SetDefault,
    SetRange(u16, u16, bool),
    Invert,
    Save,
    Restore,
    CopyFrom(u8),
    SerializeBits(u16),
    DescribeActive(u16),
    Codec,
}

/// The cached active index must always equal the lowest true slot, and the
/// derived queries must agree with the enumeration.
fn check_invariants(store: &StateStore) {
    let indices = store.set_indices();
    assert_eq!(store.active(), indices.first().copied());
    assert_eq!(store.count_set(), indices.len());
    assert_eq!(store.any_set(), !indices.is_empty());
    assert_eq!(store.exactly_one_set(), indices.len() == 1);
    assert_eq!(store.find(true), indices.first().copied());
    for &index in &indices {
        assert!(store.get(index));
    }
    assert!(!store.get(store.capacity()));
}

fn fuzz(capacity: u16, ops: Vec<StoreOperation>) {
    let mut store = StateStore::new(capacity as usize);
    for op in ops {
        match op {
            StoreOperation::Set(index, value, exclusive) => {
                store.set(index as usize, value, exclusive);
                if value && exclusive && (index as usize) < store.capacity() {
                    assert!(store.exactly_one_set());
                    assert_eq!(store.active(), Some(index as usize));
                }
            }

            StoreOperation::Select(index) => {
                store.select(index as usize);
            }

            StoreOperation::Toggle(index) => {
                let before = store.get(index as usize);
                store.toggle(index as usize);
                if (index as usize) < store.capacity() {
                    assert_eq!(store.get(index as usize), !before);
                }
            }

            StoreOperation::Reset => {
                store.reset();
                assert_eq!(store.count_set(), 0);
                assert_eq!(store.active(), None);
            }

            StoreOperation::Fill(value) => {
                store.fill(value);
                if value {
                    assert_eq!(store.count_set(), store.capacity());
                } else {
                    assert_eq!(store.count_set(), 0);
                }
            }

            StoreOperation::SetDefault => {
                store.set_default();
                assert_eq!(store.active(), Some(0));
                assert!(store.exactly_one_set());
            }

            StoreOperation::SetRange(start, end, value) => {
                store.set_range(start as usize, end as usize, value);
            }

            StoreOperation::Invert => {
                let ones = store.count_set();
                store.invert();
                assert_eq!(store.count_set(), store.capacity() - ones);
            }

            StoreOperation::Save => {
                store.save();
                assert!(store.has_snapshot());
            }

            StoreOperation::Restore => {
                store.restore();
            }

            StoreOperation::CopyFrom(other_capacity) => {
                let mut other = StateStore::new(other_capacity as usize);
                other.set_default();
                let result = other.copy_from(&store);
                assert_eq!(result.is_ok(), other.capacity() == store.capacity());
                if result.is_ok() {
                    assert_eq!(other, store);
                }
            }

            StoreOperation::SerializeBits(buf_capacity) => {
                let text = store.serialize_bits(buf_capacity as usize);
                assert!(text.len() <= (buf_capacity as usize).saturating_sub(1));
                assert!(text.len() <= store.capacity());
                assert!(text.chars().all(|ch| ch == '0' || ch == '1'));
            }

            StoreOperation::DescribeActive(buf_capacity) => {
                let text = store.describe_active(buf_capacity as usize);
                assert!(text.len() <= (buf_capacity as usize).saturating_sub(1));
            }

            StoreOperation::Codec => {
                let mut buf = store.encode();
                assert_eq!(buf.len(), store.encoded_size());
                let decoded = StateStore::read(&mut buf).unwrap();
                assert_eq!(decoded, store);
            }
        }
        check_invariants(&store);
    }
}

fuzz_target!(|input: (u16, Vec<StoreOperation>)| {
    let (capacity, ops) = input;
    fuzz(capacity, ops);
});
