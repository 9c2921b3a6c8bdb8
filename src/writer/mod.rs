//! Storage Writer Module
//!
//! Flattens a value tree into a lazy sequence of storage operations, in
//! ascending qualifier order, with every collection's size/type marker
//! emitted before its children. The walk is pure: no side effects, each
//! container consumed through a single forward pass.
//!
//! ## Emission order (one record)
//! ```text
//! Embed     ""            (record marker)
//! Value     [01]          scalar field, tag 1
//! ListSize  [02]          list field, tag 2 — count cell first
//! Value     [02 00000000] list[0]
//! Value     [02 00000001] list[1]
//! ...
//! ```
//!
//! The explicit task stack replaces recursive descent so pathological
//! nesting depth cannot overflow the call stack.

use bytes::Bytes;

use crate::cell::{encode_count, StorageOp, StorageType};
use crate::error::{Result, TrellisError};
use crate::path::PropertyPath;
use crate::qualifier::{
    append_byte, append_bytes, encode_qualifier, encode_scalar, encode_scalar_segment,
};
use crate::schema::{ModelSchema, PropertyType, SchemaRegistry};
use crate::value::{Value, ValueTree};

/// Lazy iterator over the storage operations of one record.
pub struct StorageWalker<'a> {
    registry: &'a SchemaRegistry,
    stack: Vec<Task<'a>>,
    done: bool,
}

enum Task<'a> {
    Emit(StorageOp),
    Visit {
        qualifier: Vec<u8>,
        invert: bool,
        ty: &'a PropertyType,
        value: Value,
    },
    VisitObject {
        qualifier: Vec<u8>,
        invert: bool,
        model: &'a ModelSchema,
        tree: ValueTree,
    },
}

impl<'a> StorageWalker<'a> {
    /// Start a walk over one record.
    pub fn new(model: &'a ModelSchema, registry: &'a SchemaRegistry, tree: ValueTree) -> Self {
        Self {
            registry,
            stack: vec![Task::VisitObject {
                qualifier: Vec::new(),
                invert: false,
                model,
                tree,
            }],
            done: false,
        }
    }

    /// Expand an object: embed marker first, then fields in wire order.
    fn expand_object(
        &mut self,
        qualifier: Vec<u8>,
        invert: bool,
        model: &'a ModelSchema,
        tree: ValueTree,
    ) -> Result<()> {
        let mut children: Vec<Task<'a>> = Vec::with_capacity(tree.len());
        for (tag, value) in tree.into_fields() {
            if value.is_null() {
                // Null means absent; nothing reaches storage.
                continue;
            }
            let field = model.field_by_tag(tag).ok_or_else(|| {
                TrellisError::Schema(format!(
                    "value tree carries tag 0x{tag:02x} not defined on model '{}'",
                    model.name()
                ))
            })?;
            let mut child_qualifier = qualifier.clone();
            append_byte(&mut child_qualifier, tag, invert);
            children.push(Task::Visit {
                qualifier: child_qualifier,
                invert: invert ^ field.reversed,
                ty: &field.ty,
                value,
            });
        }
        if invert {
            // Under a reversed ancestor the wire order of siblings flips.
            children.reverse();
        }

        for task in children.into_iter().rev() {
            self.stack.push(task);
        }
        self.stack.push(Task::Emit(StorageOp {
            kind: StorageType::Embed,
            qualifier: Bytes::from(qualifier),
            value: Some(Bytes::new()),
        }));
        Ok(())
    }

    /// Expand one typed value at its qualifier.
    fn expand_value(
        &mut self,
        qualifier: Vec<u8>,
        invert: bool,
        ty: &'a PropertyType,
        value: Value,
    ) -> Result<()> {
        match (ty, value) {
            (PropertyType::Model(name), Value::Object(tree)) => {
                let model = self.registry.get(name)?;
                self.expand_object(qualifier, invert, model, tree)
            }
            (PropertyType::Scalar(st), value) => {
                let payload = encode_scalar(&value, st)?;
                self.stack.push(Task::Emit(StorageOp {
                    kind: StorageType::Value,
                    qualifier: Bytes::from(qualifier),
                    value: Some(Bytes::from(payload)),
                }));
                Ok(())
            }
            (PropertyType::List(elem), Value::List(items)) => {
                let count = items.len() as u32;
                let mut children: Vec<Task<'a>> = Vec::with_capacity(items.len());
                for (index, item) in items.into_iter().enumerate() {
                    let mut child_qualifier = qualifier.clone();
                    append_bytes(&mut child_qualifier, &(index as u32).to_be_bytes(), invert);
                    children.push(Task::Visit {
                        qualifier: child_qualifier,
                        invert,
                        ty: &**elem,
                        value: item,
                    });
                }
                if invert {
                    children.reverse();
                }
                for task in children.into_iter().rev() {
                    self.stack.push(task);
                }
                self.stack.push(Task::Emit(StorageOp {
                    kind: StorageType::ListSize,
                    qualifier: Bytes::from(qualifier),
                    value: Some(encode_count(count)),
                }));
                Ok(())
            }
            (PropertyType::Set(item_ty), Value::Set(members)) => {
                let count = members.len() as u32;
                let mut children: Vec<Task<'a>> = Vec::with_capacity(members.len());
                for member in members {
                    let bytes = encode_scalar_segment(&member, item_ty)?;
                    let mut child_qualifier = qualifier.clone();
                    append_bytes(&mut child_qualifier, &bytes, invert);
                    // The member lives in the qualifier; the cell payload is
                    // a bare presence marker.
                    children.push(Task::Emit(StorageOp {
                        kind: StorageType::Value,
                        qualifier: Bytes::from(child_qualifier),
                        value: Some(Bytes::new()),
                    }));
                }
                if invert {
                    children.reverse();
                }
                for task in children.into_iter().rev() {
                    self.stack.push(task);
                }
                self.stack.push(Task::Emit(StorageOp {
                    kind: StorageType::SetSize,
                    qualifier: Bytes::from(qualifier),
                    value: Some(encode_count(count)),
                }));
                Ok(())
            }
            (PropertyType::Map { key, value: val_ty }, Value::Map(entries)) => {
                let count = entries.len() as u32;
                let mut children: Vec<Task<'a>> = Vec::with_capacity(entries.len());
                for (k, v) in entries {
                    let bytes = encode_scalar_segment(&k, key)?;
                    let mut child_qualifier = qualifier.clone();
                    append_bytes(&mut child_qualifier, &bytes, invert);
                    children.push(Task::Visit {
                        qualifier: child_qualifier,
                        invert,
                        ty: &**val_ty,
                        value: v,
                    });
                }
                if invert {
                    children.reverse();
                }
                for task in children.into_iter().rev() {
                    self.stack.push(task);
                }
                self.stack.push(Task::Emit(StorageOp {
                    kind: StorageType::MapSize,
                    qualifier: Bytes::from(qualifier),
                    value: Some(encode_count(count)),
                }));
                Ok(())
            }
            (PropertyType::Multi(variants), Value::Multi { tag, value: inner }) => {
                let variant = variants.get(tag as usize).ok_or_else(|| {
                    TrellisError::Schema(format!(
                        "type tag {tag} out of range ({} variants)",
                        variants.len()
                    ))
                })?;
                let mut child_qualifier = qualifier.clone();
                append_byte(&mut child_qualifier, tag, invert);
                if !inner.is_null() {
                    self.stack.push(Task::Visit {
                        qualifier: child_qualifier,
                        invert,
                        ty: variant,
                        value: *inner,
                    });
                }
                self.stack.push(Task::Emit(StorageOp {
                    kind: StorageType::TypeValue,
                    qualifier: Bytes::from(qualifier),
                    value: Some(Bytes::copy_from_slice(&[tag])),
                }));
                Ok(())
            }
            (ty, value) => Err(TrellisError::TypeMismatch(format!(
                "{} value does not fit declared type {:?}",
                value.kind(),
                ty
            ))),
        }
    }
}

impl Iterator for StorageWalker<'_> {
    type Item = Result<StorageOp>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            let task = match self.stack.pop() {
                Some(task) => task,
                None => {
                    self.done = true;
                    return None;
                }
            };
            let result = match task {
                Task::Emit(op) => return Some(Ok(op)),
                Task::Visit {
                    qualifier,
                    invert,
                    ty,
                    value,
                } => self.expand_value(qualifier, invert, ty, value),
                Task::VisitObject {
                    qualifier,
                    invert,
                    model,
                    tree,
                } => self.expand_object(qualifier, invert, model, tree),
            };
            if let Err(e) = result {
                self.done = true;
                return Some(Err(e));
            }
        }
    }
}

/// Walk one record (convenience constructor).
pub fn walk<'a>(
    model: &'a ModelSchema,
    registry: &'a SchemaRegistry,
    tree: ValueTree,
) -> StorageWalker<'a> {
    StorageWalker::new(model, registry, tree)
}

/// Tombstone a whole object subtree (or the record itself at the root
/// path).
pub fn delete_object(
    path: &PropertyPath,
    model: &ModelSchema,
    registry: &SchemaRegistry,
) -> Result<StorageOp> {
    let qualifier = encode_qualifier(path, model, registry)?;
    Ok(StorageOp {
        kind: StorageType::ObjectDelete,
        qualifier: Bytes::from(qualifier),
        value: None,
    })
}
