//! Value reader: round-trips, selection masks, corruption policies.

mod common;

use std::collections::{BTreeMap, BTreeSet};

use common::*;
use trellis::{
    read_values, Cell, CorruptCellPolicy, PathMask, PathSegment, PropertyPath, ReadConfig,
    TrellisError, Value, ValueTree,
};

fn rich_tree() -> ValueTree {
    let author = ValueTree::new()
        .with(1, Value::Text("ada".into()))
        .with(2, Value::Number(42));
    ValueTree::new()
        .with(ID, Value::Number(5))
        .with(CREATED, Value::Time(1_700_000_000_000))
        .with(TITLE, Value::Text("qualifiers".into()))
        .with(
            TAGS,
            Value::Set(BTreeSet::from([Value::Number(1), Value::Number(3)])),
        )
        .with(SCORES, Value::List(vec![Value::Number(-1), Value::Number(7)]))
        .with(
            ATTRS,
            Value::Map(BTreeMap::from([(
                Value::Text("hue".into()),
                Value::Number(200),
            )])),
        )
        .with(HISTORY, Value::List(vec![Value::Time(10), Value::Time(20)]))
        .with(AUTHOR, Value::Object(author))
        .with(
            BODY,
            Value::Multi {
                tag: 0,
                value: Box::new(Value::Text("hello".into())),
            },
        )
}

// =============================================================================
// Round-Trips
// =============================================================================

#[test]
fn rebuilds_what_the_walker_emitted() {
    let registry = fixture_registry();
    let model = article(&registry);

    let tree = rich_tree();
    let cells = cells_for(model, &registry, tree.clone(), 1);
    let record = read_values(cells, model, &registry, None, &ReadConfig::default()).unwrap();

    assert_eq!(record.tree, tree);
    assert!(record.ignored.is_empty());
}

#[test]
fn empty_collections_round_trip() {
    let registry = fixture_registry();
    let model = article(&registry);

    let tree = ValueTree::new()
        .with(SCORES, Value::List(Vec::new()))
        .with(TAGS, Value::Set(BTreeSet::new()));
    let cells = cells_for(model, &registry, tree.clone(), 1);
    let record = read_values(cells, model, &registry, None, &ReadConfig::default()).unwrap();

    assert_eq!(record.tree, tree);
}

#[test]
fn absent_payload_cells_are_plain_absence() {
    let registry = fixture_registry();
    let model = article(&registry);

    let cells = vec![
        Cell::new(vec![0x01], 1, vec![0, 0, 0, 5]),
        Cell::tombstone(vec![0x03], 1),
    ];
    let record = read_values(cells, model, &registry, None, &ReadConfig::default()).unwrap();

    assert_eq!(record.tree.get(ID), Some(&Value::Number(5)));
    assert!(record.tree.get(TITLE).is_none());
}

// =============================================================================
// Selection Masks
// =============================================================================

#[test]
fn mask_restricts_materialized_paths() {
    let registry = fixture_registry();
    let model = article(&registry);

    let cells = cells_for(model, &registry, rich_tree(), 1);
    let mask = PathMask::default().select(PropertyPath::field(SCORES));
    let record = read_values(cells, model, &registry, Some(&mask), &ReadConfig::default()).unwrap();

    assert_eq!(
        record.tree.get(SCORES),
        Some(&Value::List(vec![Value::Number(-1), Value::Number(7)]))
    );
    assert!(record.tree.get(ID).is_none());
    assert!(record.tree.get(AUTHOR).is_none());
}

#[test]
fn mask_on_a_leaf_keeps_its_enclosing_container() {
    let registry = fixture_registry();
    let model = article(&registry);

    let cells = cells_for(model, &registry, rich_tree(), 1);
    let selected = PropertyPath::field(SCORES).child(PathSegment::ListIndex(1));
    let mask = PathMask::default().select(selected);
    let record = read_values(cells, model, &registry, Some(&mask), &ReadConfig::default()).unwrap();

    // Index 0 was not selected; the slot stays a placeholder.
    assert_eq!(
        record.tree.get(SCORES),
        Some(&Value::List(vec![Value::Null, Value::Number(7)]))
    );
}

// =============================================================================
// Corruption and Integrity
// =============================================================================

#[test]
fn malformed_qualifier_is_skipped_and_reported_by_default() {
    let registry = fixture_registry();
    let model = article(&registry);

    let mut cells = cells_for(model, &registry, rich_tree(), 1);
    cells.push(Cell::new(vec![0x05, 0x00], 1, vec![1, 2, 3]));
    let record = read_values(cells, model, &registry, None, &ReadConfig::default()).unwrap();

    assert_eq!(record.ignored.len(), 1);
    assert_eq!(record.ignored[0].as_ref(), [0x05, 0x00]);
}

#[test]
fn malformed_qualifier_aborts_under_the_strict_policy() {
    let registry = fixture_registry();
    let model = article(&registry);

    let cells = vec![Cell::new(vec![0x05, 0x00], 1, vec![1, 2, 3])];
    let config = ReadConfig::builder()
        .corrupt_cells(CorruptCellPolicy::Abort)
        .build();
    let err = read_values(cells, model, &registry, None, &config).unwrap_err();
    assert!(matches!(err, TrellisError::MalformedQualifier(_)));
}

#[test]
fn unknown_field_tags_are_skipped_not_failed() {
    let registry = fixture_registry();
    let model = article(&registry);

    let mut cells = cells_for(
        model,
        &registry,
        ValueTree::new().with(ID, Value::Number(5)),
        1,
    );
    cells.push(Cell::new(vec![0x63], 1, vec![0xDE, 0xAD]));
    let record = read_values(cells, model, &registry, None, &ReadConfig::default()).unwrap();

    assert_eq!(record.tree.get(ID), Some(&Value::Number(5)));
    assert_eq!(record.ignored.len(), 1);
}

#[test]
fn truncated_collections_fail_count_validation() {
    let registry = fixture_registry();
    let model = article(&registry);

    let tree = ValueTree::new().with(SCORES, Value::List(vec![Value::Number(7), Value::Number(9)]));
    let cells: Vec<Cell> = cells_for(model, &registry, tree, 1)
        .into_iter()
        .filter(|c| c.qualifier.as_ref() != [0x05, 0, 0, 0, 1])
        .collect();

    let err = read_values(cells, model, &registry, None, &ReadConfig::default()).unwrap_err();
    assert!(matches!(err, TrellisError::InvalidCell(_)));
}

#[test]
fn count_validation_can_be_disabled() {
    let registry = fixture_registry();
    let model = article(&registry);

    let tree = ValueTree::new().with(SCORES, Value::List(vec![Value::Number(7), Value::Number(9)]));
    let cells: Vec<Cell> = cells_for(model, &registry, tree, 1)
        .into_iter()
        .filter(|c| c.qualifier.as_ref() != [0x05, 0, 0, 0, 1])
        .collect();

    let config = ReadConfig::builder().validate_counts(false).build();
    let record = read_values(cells, model, &registry, None, &config).unwrap();
    assert_eq!(
        record.tree.get(SCORES),
        Some(&Value::List(vec![Value::Number(7)]))
    );
}
