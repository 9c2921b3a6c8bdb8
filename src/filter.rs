//! Query filters
//!
//! The filter tree the scan planner compiles: comparisons against property
//! paths, membership tests, and conjunctions. Filters also evaluate
//! directly against value trees, which is what the planner's soundness
//! property is stated over: every tree a filter matches must fall inside
//! the compiled scan range.

use serde::{Deserialize, Serialize};

use crate::path::PropertyPath;
use crate::value::{Value, ValueTree};

/// One filter node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Filter {
    Equals {
        path: PropertyPath,
        value: Value,
    },
    GreaterThan {
        path: PropertyPath,
        value: Value,
    },
    GreaterThanEquals {
        path: PropertyPath,
        value: Value,
    },
    LessThan {
        path: PropertyPath,
        value: Value,
    },
    LessThanEquals {
        path: PropertyPath,
        value: Value,
    },
    /// Inclusive on both ends.
    Between {
        path: PropertyPath,
        low: Value,
        high: Value,
    },
    ValueIn {
        path: PropertyPath,
        values: Vec<Value>,
    },
    And(Vec<Filter>),
}

impl Filter {
    pub fn equals(path: PropertyPath, value: Value) -> Self {
        Filter::Equals { path, value }
    }

    pub fn greater_than(path: PropertyPath, value: Value) -> Self {
        Filter::GreaterThan { path, value }
    }

    pub fn greater_than_equals(path: PropertyPath, value: Value) -> Self {
        Filter::GreaterThanEquals { path, value }
    }

    pub fn less_than(path: PropertyPath, value: Value) -> Self {
        Filter::LessThan { path, value }
    }

    pub fn less_than_equals(path: PropertyPath, value: Value) -> Self {
        Filter::LessThanEquals { path, value }
    }

    pub fn between(path: PropertyPath, low: Value, high: Value) -> Self {
        Filter::Between { path, low, high }
    }

    pub fn value_in(path: PropertyPath, values: Vec<Value>) -> Self {
        Filter::ValueIn { path, values }
    }

    pub fn and(children: Vec<Filter>) -> Self {
        Filter::And(children)
    }

    /// The referenced path, for leaf filters.
    pub fn path(&self) -> Option<&PropertyPath> {
        match self {
            Filter::Equals { path, .. }
            | Filter::GreaterThan { path, .. }
            | Filter::GreaterThanEquals { path, .. }
            | Filter::LessThan { path, .. }
            | Filter::LessThanEquals { path, .. }
            | Filter::Between { path, .. }
            | Filter::ValueIn { path, .. } => Some(path),
            Filter::And(_) => None,
        }
    }

    /// Evaluate against a value tree. Absent paths never match.
    pub fn matches(&self, tree: &ValueTree) -> bool {
        match self {
            Filter::And(children) => children.iter().all(|child| child.matches(tree)),
            Filter::Equals { path, value } => tree.lookup(path) == Some(value),
            Filter::GreaterThan { path, value } => {
                tree.lookup(path).is_some_and(|v| v > value)
            }
            Filter::GreaterThanEquals { path, value } => {
                tree.lookup(path).is_some_and(|v| v >= value)
            }
            Filter::LessThan { path, value } => tree.lookup(path).is_some_and(|v| v < value),
            Filter::LessThanEquals { path, value } => {
                tree.lookup(path).is_some_and(|v| v <= value)
            }
            Filter::Between { path, low, high } => {
                tree.lookup(path).is_some_and(|v| v >= low && v <= high)
            }
            Filter::ValueIn { path, values } => {
                tree.lookup(path).is_some_and(|v| values.contains(v))
            }
        }
    }
}
