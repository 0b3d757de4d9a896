//! Property tests for linelog-core
//!
//! These check the log's observable guarantees over arbitrary inputs:
//! chunking invariance, the capacity bound, read completeness and
//! end-of-stream behavior.

use linelog_core::{CursorResolver, PartialAssembler, Record, RecordStore, RingLog};
use proptest::prelude::*;

/// Byte strings biased towards containing terminators
fn command_bytes() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(
        prop_oneof![3 => b'a'..=b'z', 1 => Just(b'\n')],
        0..200,
    )
}

/// Split `data` at the given cut points (taken modulo its length)
fn split_at_points(data: &[u8], mut cuts: Vec<usize>) -> Vec<&[u8]> {
    if data.is_empty() {
        return vec![data];
    }
    for cut in cuts.iter_mut() {
        *cut %= data.len();
    }
    cuts.sort_unstable();
    cuts.dedup();

    let mut pieces = Vec::new();
    let mut start = 0;
    for cut in cuts {
        pieces.push(&data[start..cut]);
        start = cut;
    }
    pieces.push(&data[start..]);
    pieces
}

fn feed_all(asm: &mut PartialAssembler, pieces: &[&[u8]]) -> Vec<Record> {
    pieces
        .iter()
        .flat_map(|piece| asm.feed(piece).expect("feed should not fail"))
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn prop_chunking_invariance(
        data in command_bytes(),
        cuts in prop::collection::vec(any::<usize>(), 0..20),
    ) {
        let mut whole = PartialAssembler::new();
        let expected = whole.feed(&data).unwrap();

        let mut chunked = PartialAssembler::new();
        let actual = feed_all(&mut chunked, &split_at_points(&data, cuts));

        let terminators = data.iter().filter(|&&b| b == b'\n').count();
        prop_assert_eq!(expected.len(), terminators);
        prop_assert_eq!(&actual, &expected);
        prop_assert_eq!(chunked.pending(), whole.pending());
    }

    #[test]
    fn prop_capacity_bound_keeps_newest(
        count in 0usize..60,
        capacity in 1usize..16,
    ) {
        let mut asm = PartialAssembler::new();
        let mut ring = RingLog::with_capacity(capacity).unwrap();
        let mut evicted = Vec::new();

        for i in 0..count {
            for record in asm.feed(format!("cmd-{}\n", i).as_bytes()).unwrap() {
                if let Some(old) = ring.append(record) {
                    evicted.push(old);
                }
            }
        }

        prop_assert_eq!(ring.len(), count.min(capacity));
        prop_assert_eq!(evicted.len(), count.saturating_sub(capacity));

        let kept: Vec<String> = ring
            .iter()
            .map(|r| String::from_utf8_lossy(r.as_bytes()).into_owned())
            .collect();
        let expected: Vec<String> = (count.saturating_sub(capacity)..count)
            .map(|i| format!("cmd-{}\n", i))
            .collect();
        prop_assert_eq!(kept, expected);

        // Evictions happen oldest first
        for (i, old) in evicted.iter().enumerate() {
            let expected_old = format!("cmd-{}\n", i);
            prop_assert_eq!(old.as_bytes(), expected_old.as_bytes());
        }
    }

    #[test]
    fn prop_read_completeness(data in command_bytes(), chunk in 1usize..32) {
        let mut asm = PartialAssembler::new();
        let mut ring = RingLog::default();
        for record in asm.feed(&data).unwrap() {
            ring.append(record);
        }

        let expected: Vec<u8> = ring.iter().flat_map(|r| r.as_bytes().to_vec()).collect();
        prop_assert_eq!(&CursorResolver::read_all(&ring)[..], &expected[..]);
        prop_assert_eq!(ring.total_length(), expected.len() as u64);

        // Walking with a cursor in small steps yields the same stream
        let mut offset = 0u64;
        let mut walked = Vec::new();
        loop {
            let bytes = CursorResolver::read(&ring, offset, chunk);
            if bytes.is_empty() {
                break;
            }
            offset += bytes.len() as u64;
            walked.extend_from_slice(&bytes);
        }
        prop_assert_eq!(walked, expected);
    }

    #[test]
    fn prop_eof_reads_are_empty(data in command_bytes(), past in 0u64..1_000) {
        let mut asm = PartialAssembler::new();
        let mut ring = RingLog::default();
        for record in asm.feed(&data).unwrap() {
            ring.append(record);
        }

        let offset = RecordStore::total_length(&ring) + past;
        prop_assert!(CursorResolver::locate(&ring, offset).is_none());
        prop_assert!(CursorResolver::read(&ring, offset, 64).is_empty());
    }
}

#[test]
fn test_scenario_partial_excluded_from_reads() {
    let mut asm = PartialAssembler::new();
    let mut ring = RingLog::default();
    for record in asm.feed(b"first\n").unwrap() {
        ring.append(record);
    }
    assert!(asm.feed(b"partial").unwrap().is_empty());

    assert_eq!(&CursorResolver::read_all(&ring)[..], b"first\n");
    assert_eq!(asm.pending(), b"partial");
}
