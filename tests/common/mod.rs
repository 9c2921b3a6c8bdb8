//! Shared test fixtures: a representative schema pair and cell helpers.

#![allow(dead_code)]

use bytes::Bytes;
use trellis::{
    walk, Cell, FieldDef, ModelSchema, PropertyPath, PropertyType, ScalarType, SchemaRegistry,
    StorageOp, ValueTree,
};

/// Field tags of the `article` fixture model.
pub const ID: u8 = 1;
pub const CREATED: u8 = 2;
pub const TITLE: u8 = 3;
pub const TAGS: u8 = 4;
pub const SCORES: u8 = 5;
pub const ATTRS: u8 = 6;
pub const HISTORY: u8 = 7;
pub const AUTHOR: u8 = 8;
pub const BODY: u8 = 9;

/// Registry holding an `article` model (every property shape, one reversed
/// field) and the `author` model it embeds.
pub fn fixture_registry() -> SchemaRegistry {
    let author = ModelSchema::new("author")
        .with_field(FieldDef::new(
            1,
            "name",
            PropertyType::Scalar(ScalarType::Text),
        ))
        .with_field(FieldDef::new(
            2,
            "karma",
            PropertyType::Scalar(ScalarType::U32),
        ));

    let article = ModelSchema::new("article")
        .with_field(FieldDef::new(ID, "id", PropertyType::Scalar(ScalarType::U32)))
        .with_field(FieldDef::new(
            CREATED,
            "created",
            PropertyType::Scalar(ScalarType::Time),
        ))
        .with_field(FieldDef::new(
            TITLE,
            "title",
            PropertyType::Scalar(ScalarType::Text),
        ))
        .with_field(FieldDef::new(TAGS, "tags", PropertyType::Set(ScalarType::U32)))
        .with_field(FieldDef::new(
            SCORES,
            "scores",
            PropertyType::List(Box::new(PropertyType::Scalar(ScalarType::I64))),
        ))
        .with_field(FieldDef::new(
            ATTRS,
            "attrs",
            PropertyType::Map {
                key: ScalarType::Text,
                value: Box::new(PropertyType::Scalar(ScalarType::U32)),
            },
        ))
        .with_field(
            FieldDef::new(
                HISTORY,
                "history",
                PropertyType::List(Box::new(PropertyType::Scalar(ScalarType::Time))),
            )
            .reversed(),
        )
        .with_field(FieldDef::new(
            AUTHOR,
            "author",
            PropertyType::Model("author".into()),
        ))
        .with_field(FieldDef::new(
            BODY,
            "body",
            PropertyType::Multi(vec![
                PropertyType::Scalar(ScalarType::Text),
                PropertyType::Scalar(ScalarType::Blob),
            ]),
        ));

    let mut registry = SchemaRegistry::new();
    registry.register(author).expect("author fixture is valid");
    registry.register(article).expect("article fixture is valid");
    registry
}

/// The article model out of a fixture registry.
pub fn article<'a>(registry: &'a SchemaRegistry) -> &'a ModelSchema {
    registry.get("article").expect("fixture model registered")
}

/// Flatten a tree into storage ops, panicking on schema errors.
pub fn ops_for(
    model: &ModelSchema,
    registry: &SchemaRegistry,
    tree: ValueTree,
) -> Vec<StorageOp> {
    walk(model, registry, tree)
        .collect::<Result<Vec<_>, _>>()
        .expect("fixture tree matches schema")
}

/// Flatten a tree into cells, all stamped with one version.
pub fn cells_for(
    model: &ModelSchema,
    registry: &SchemaRegistry,
    tree: ValueTree,
    version: u64,
) -> Vec<Cell> {
    ops_for(model, registry, tree)
        .into_iter()
        .map(|op| op.into_cell(version))
        .collect()
}

/// Locate the cell written at a given qualifier.
pub fn cell_at<'a>(cells: &'a [Cell], qualifier: &[u8]) -> &'a Cell {
    cells
        .iter()
        .find(|c| c.qualifier.as_ref() == qualifier)
        .unwrap_or_else(|| panic!("no cell at qualifier {qualifier:02x?}"))
}

/// Shorthand for a path literal.
pub fn qualifier_of(
    path: &PropertyPath,
    model: &ModelSchema,
    registry: &SchemaRegistry,
) -> Bytes {
    Bytes::from(trellis::encode_qualifier(path, model, registry).expect("path fits schema"))
}
