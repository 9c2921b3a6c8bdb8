//! Model registry
//!
//! Arena of model schemas keyed by name. Embedded models are referenced by
//! name ([`PropertyType::Model`]) and resolved lazily through the registry,
//! so a model may reference itself without recursing at definition time.
//! The registry is an explicit parameter to every codec/reader/builder call;
//! there is no process-wide ambient state.

use std::collections::HashMap;

use crate::error::{Result, TrellisError};
use crate::schema::{ModelSchema, PropertyType};

/// Named collection of validated model schemas.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    models: HashMap<String, ModelSchema>,
}

impl SchemaRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and register a model, replacing any previous definition of
    /// the same name.
    pub fn register(&mut self, model: ModelSchema) -> Result<()> {
        model.validate()?;
        self.models.insert(model.name().to_string(), model);
        Ok(())
    }

    /// Resolve a model by name.
    pub fn get(&self, name: &str) -> Result<&ModelSchema> {
        self.models
            .get(name)
            .ok_or_else(|| TrellisError::Schema(format!("unknown model '{name}'")))
    }

    /// Resolve `Model(name)` indirections until a concrete type remains.
    ///
    /// Returns the model when the type is an embedded object, or the type
    /// itself otherwise.
    pub fn resolve<'a>(&'a self, ty: &'a PropertyType) -> Result<ResolvedType<'a>> {
        match ty {
            PropertyType::Model(name) => Ok(ResolvedType::Object(self.get(name)?)),
            other => Ok(ResolvedType::Plain(other)),
        }
    }
}

/// Outcome of resolving one property type through the registry.
#[derive(Debug, Clone, Copy)]
pub enum ResolvedType<'a> {
    /// An embedded model.
    Object(&'a ModelSchema),

    /// Any non-model type, untouched.
    Plain(&'a PropertyType),
}
