//! Scan planner: byte ranges, residual predicates, point-get candidates.

mod common;

use trellis::scan::{ScanRangeBuilder, CONTINUATION, EXCLUSIVE};
use trellis::{Filter, IndexPart, Indexable, PartialMatch, PropertyPath, ScalarType, Value};

fn number_index() -> Indexable {
    Indexable::single(IndexPart::new(PropertyPath::field(1), ScalarType::U32))
}

fn number_time_index() -> Indexable {
    Indexable::multiple(vec![
        IndexPart::new(PropertyPath::field(1), ScalarType::U32),
        IndexPart::new(PropertyPath::field(2), ScalarType::Time),
    ])
}

// =============================================================================
// Single-Part Ranges
// =============================================================================

#[test]
fn equality_pins_both_bounds_to_one_prefix() {
    let index = number_index();
    let range = ScanRangeBuilder::new(&index)
        .build(&Filter::equals(PropertyPath::field(1), Value::Number(5)));

    assert_eq!(range.start, vec![0, 0, 0, 5, CONTINUATION]);
    assert_eq!(range.end, vec![0, 0, 0, 5, CONTINUATION]);
    assert!(range.start_inclusive);
    assert!(range.end_inclusive);
    assert_eq!(range.equal_pairs.len(), 1);
    assert_eq!(range.equal_pairs[0].offset, 0);
    assert_eq!(range.equal_pairs[0].bytes, vec![0, 0, 0, 5]);

    // Every continuation of the pinned prefix stays in range.
    assert!(range.key_matches(&[0, 0, 0, 5, CONTINUATION, 9, 9]));
    assert!(!range.key_matches(&[0, 0, 0, 4, CONTINUATION]));
    assert!(!range.key_matches(&[0, 0, 0, 6, CONTINUATION]));
}

#[test]
fn strict_lower_bound_uses_the_exclusive_marker() {
    let index = number_index();
    let range = ScanRangeBuilder::new(&index)
        .build(&Filter::greater_than(PropertyPath::field(1), Value::Number(5)));

    assert_eq!(range.start, vec![0, 0, 0, 5, EXCLUSIVE]);
    assert!(range.end.is_empty());

    // 0x02 sorts after every continuation of 5, so 5's entries fall out.
    assert!(!range.key_matches(&[0, 0, 0, 5, CONTINUATION, 1]));
    assert!(range.key_matches(&[0, 0, 0, 6, CONTINUATION]));
}

#[test]
fn membership_brackets_the_extremes_and_keeps_a_predicate() {
    let index = number_index();
    let range = ScanRangeBuilder::new(&index).build(&Filter::value_in(
        PropertyPath::field(1),
        vec![Value::Number(5), Value::Number(3), Value::Number(6)],
    ));

    assert_eq!(range.start, vec![0, 0, 0, 3, CONTINUATION]);
    assert_eq!(range.end, vec![0, 0, 0, 6, CONTINUATION]);

    // 4 is inside the bracket but not a member; 9 is out of range outright.
    assert!(range.key_matches(&[0, 0, 0, 5, CONTINUATION]));
    assert!(!range.key_matches(&[0, 0, 0, 4, CONTINUATION]));
    assert!(!range.key_matches(&[0, 0, 0, 9, CONTINUATION]));

    // All parts pinned but the membership: point-get candidates come out.
    assert_eq!(
        range.uniques,
        vec![
            vec![0, 0, 0, 3, CONTINUATION],
            vec![0, 0, 0, 5, CONTINUATION],
            vec![0, 0, 0, 6, CONTINUATION],
        ]
    );
}

#[test]
fn between_is_inclusive_on_both_ends() {
    let index = number_index();
    let range = ScanRangeBuilder::new(&index).build(&Filter::between(
        PropertyPath::field(1),
        Value::Number(3),
        Value::Number(6),
    ));

    assert_eq!(range.start, vec![0, 0, 0, 3, CONTINUATION]);
    assert_eq!(range.end, vec![0, 0, 0, 6, CONTINUATION]);
    assert!(range.key_matches(&[0, 0, 0, 3, CONTINUATION]));
    assert!(range.key_matches(&[0, 0, 0, 6, CONTINUATION, 4]));
}

// =============================================================================
// Composite Keys
// =============================================================================

#[test]
fn equality_prefix_extends_into_the_next_part() {
    let index = number_time_index();
    let filter = Filter::and(vec![
        Filter::equals(PropertyPath::field(1), Value::Number(5)),
        Filter::greater_than_equals(PropertyPath::field(2), Value::Time(100)),
    ]);
    let range = ScanRangeBuilder::new(&index).build(&filter);

    let mut start = vec![0, 0, 0, 5, CONTINUATION];
    start.extend_from_slice(&100u64.to_be_bytes());
    start.push(CONTINUATION);
    assert_eq!(range.start, start);
    // The end stays at the pinned prefix and covers all larger times.
    assert_eq!(range.end, vec![0, 0, 0, 5, CONTINUATION]);
    assert!(range.end_inclusive);
}

#[test]
fn unbounded_earlier_part_demotes_later_clauses_to_predicates() {
    let index = number_time_index();
    let range = ScanRangeBuilder::new(&index)
        .build(&Filter::greater_than(PropertyPath::field(2), Value::Time(100)));

    assert!(range.start.is_empty());
    assert!(range.end.is_empty());
    assert_eq!(range.partial_matches.len(), 1);
    match &range.partial_matches[0] {
        PartialMatch::ToBeBigger { offset, bytes, inclusive } => {
            assert_eq!(*offset, 5); // 4 value bytes + 1 marker
            assert_eq!(bytes, &100u64.to_be_bytes().to_vec());
            assert!(!inclusive);
        }
        other => panic!("expected a lower-bound predicate, got {other:?}"),
    }

    let mut low_key = vec![0, 0, 0, 1, CONTINUATION];
    low_key.extend_from_slice(&50u64.to_be_bytes());
    low_key.push(CONTINUATION);
    assert!(!range.key_matches(&low_key));

    let mut high_key = vec![0, 0, 0, 1, CONTINUATION];
    high_key.extend_from_slice(&200u64.to_be_bytes());
    high_key.push(CONTINUATION);
    assert!(range.key_matches(&high_key));
}

#[test]
fn non_equality_part_closes_the_bounds_for_later_parts() {
    let index = number_time_index();
    let filter = Filter::and(vec![
        Filter::greater_than(PropertyPath::field(1), Value::Number(5)),
        Filter::equals(PropertyPath::field(2), Value::Time(100)),
    ]);
    let range = ScanRangeBuilder::new(&index).build(&filter);

    assert_eq!(range.start, vec![0, 0, 0, 5, EXCLUSIVE]);
    assert!(range.end.is_empty());
    assert_eq!(range.partial_matches.len(), 1);
    assert!(matches!(
        &range.partial_matches[0],
        PartialMatch::ToMatch { offset: 5, .. }
    ));
}

// =============================================================================
// Reversed Parts
// =============================================================================

#[test]
fn reversed_part_swaps_and_inverts_the_bounds() {
    let index = Indexable::single(
        IndexPart::new(PropertyPath::field(1), ScalarType::U32).reversed(),
    );
    let range = ScanRangeBuilder::new(&index)
        .build(&Filter::greater_than(PropertyPath::field(1), Value::Number(5)));

    // Bigger values sort earlier under reversal: the clause becomes an
    // exclusive upper bound on the inverted encoding.
    assert!(range.start.is_empty());
    assert_eq!(range.end, vec![0xFF, 0xFF, 0xFF, 0xFA, CONTINUATION]);
    assert!(!range.end_inclusive);

    // 6 (inverted: ...F9) is in range; 5 sits on the excluded boundary.
    assert!(range.key_matches(&[0xFF, 0xFF, 0xFF, 0xF9, CONTINUATION]));
    assert!(!range.key_matches(&[0xFF, 0xFF, 0xFF, 0xFA, CONTINUATION]));
}

#[test]
fn reversed_equality_still_pins_one_prefix() {
    let index = Indexable::single(
        IndexPart::new(PropertyPath::field(1), ScalarType::U32).reversed(),
    );
    let range = ScanRangeBuilder::new(&index)
        .build(&Filter::equals(PropertyPath::field(1), Value::Number(5)));

    assert_eq!(range.start, vec![0xFF, 0xFF, 0xFF, 0xFA, CONTINUATION]);
    assert_eq!(range.end, range.start);
}

// =============================================================================
// Degradation
// =============================================================================

#[test]
fn off_index_clauses_widen_to_the_open_range() {
    let index = number_index();
    let range = ScanRangeBuilder::new(&index)
        .build(&Filter::equals(PropertyPath::field(99), Value::Number(1)));

    assert!(range.is_open());
}

#[test]
fn unencodable_values_widen_instead_of_failing() {
    let index = number_index();
    // Text against a numeric part cannot encode; the planner must not error.
    let range = ScanRangeBuilder::new(&index)
        .build(&Filter::equals(PropertyPath::field(1), Value::Text("x".into())));

    assert!(range.is_open());
}

#[test]
fn contradictory_equalities_produce_an_empty_range() {
    let index = number_index();
    let filter = Filter::and(vec![
        Filter::equals(PropertyPath::field(1), Value::Number(3)),
        Filter::equals(PropertyPath::field(1), Value::Number(5)),
    ]);
    let range = ScanRangeBuilder::new(&index).build(&filter);

    // start > end: no key can satisfy both bounds.
    assert!(range.start > range.end);
    assert!(!range.key_matches(&[0, 0, 0, 3, CONTINUATION]));
    assert!(!range.key_matches(&[0, 0, 0, 4, CONTINUATION]));
    assert!(!range.key_matches(&[0, 0, 0, 5, CONTINUATION]));
}
