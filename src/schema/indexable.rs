//! Indexable key definitions
//!
//! An [`Indexable`] describes one schema-declared key or secondary index:
//! an ordered list of parts, each a property path with a scalar type and a
//! sort direction. The scan planner compiles filters against these parts
//! into byte ranges.

use serde::{Deserialize, Serialize};

use crate::path::PropertyPath;
use crate::schema::ScalarType;

/// One part of a (possibly composite) index key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexPart {
    /// The indexed property.
    pub path: PropertyPath,

    /// Scalar type of the indexed value; decides the encoded width.
    pub ty: ScalarType,

    /// Reversed sort direction: the part's value bytes are bitwise-inverted
    /// in the index key.
    pub reversed: bool,
}

impl IndexPart {
    /// Plain ascending part.
    pub fn new(path: PropertyPath, ty: ScalarType) -> Self {
        Self {
            path,
            ty,
            reversed: false,
        }
    }

    /// Mark the part as descending.
    pub fn reversed(mut self) -> Self {
        self.reversed = true;
        self
    }

    /// Encoded byte width, `None` for variable-length types.
    pub fn width(&self) -> Option<usize> {
        self.ty.width()
    }
}

/// A key or secondary-index definition: one part, or a "Multiple" composite
/// of parts concatenated in declared order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Indexable {
    parts: Vec<IndexPart>,
}

impl Indexable {
    /// Single-part index.
    pub fn single(part: IndexPart) -> Self {
        Self { parts: vec![part] }
    }

    /// Composite index over the parts in declared order.
    pub fn multiple(parts: Vec<IndexPart>) -> Self {
        Self { parts }
    }

    /// Parts in declared order.
    pub fn parts(&self) -> &[IndexPart] {
        &self.parts
    }

    /// Find the part covering a filter path, with its position.
    pub fn part_for(&self, path: &PropertyPath) -> Option<(usize, &IndexPart)> {
        self.parts
            .iter()
            .enumerate()
            .find(|(_, part)| &part.path == path)
    }

    /// Byte offset of part `index` inside an index entry key. Each earlier
    /// part contributes its fixed width plus the one-byte continuation
    /// marker. `None` when any earlier part is variable-length.
    pub fn part_offset(&self, index: usize) -> Option<usize> {
        let mut offset = 0;
        for part in &self.parts[..index] {
            offset += part.width()? + 1;
        }
        Some(offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn part_offsets_include_continuation_markers() {
        let index = Indexable::multiple(vec![
            IndexPart::new(PropertyPath::field(1), ScalarType::U32),
            IndexPart::new(PropertyPath::field(2), ScalarType::Time),
            IndexPart::new(PropertyPath::field(3), ScalarType::Bool),
        ]);
        assert_eq!(index.part_offset(0), Some(0));
        assert_eq!(index.part_offset(1), Some(5)); // 4 + marker
        assert_eq!(index.part_offset(2), Some(14)); // 5 + 8 + marker
    }

    #[test]
    fn part_lookup_by_path() {
        let index = Indexable::multiple(vec![
            IndexPart::new(PropertyPath::field(1), ScalarType::U32),
            IndexPart::new(PropertyPath::field(2), ScalarType::Time).reversed(),
        ]);
        let (pos, part) = index.part_for(&PropertyPath::field(2)).unwrap();
        assert_eq!(pos, 1);
        assert!(part.reversed);
        assert!(index.part_for(&PropertyPath::field(9)).is_none());
    }
}
