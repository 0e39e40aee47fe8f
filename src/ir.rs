// Shared shape model for both directions. No regexes or templates here.

use indexmap::IndexMap;

/// Declared types in source order: type name → (field name → raw type expression).
///
/// Re-declaring a field overwrites its type but keeps its original slot, so
/// field order always follows first appearance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeRegistry {
    types: IndexMap<String, IndexMap<String, String>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `name` with no fields unless it already exists.
    pub fn declare(&mut self, name: &str) {
        if !self.types.contains_key(name) {
            self.types.insert(name.to_string(), IndexMap::new());
        }
    }

    /// Record `field: declared_type` on `owner`, declaring the owner if needed.
    pub fn insert_field(&mut self, owner: &str, field: &str, declared_type: &str) {
        self.declare(owner);
        if let Some(fields) = self.types.get_mut(owner) {
            fields.insert(field.to_string(), declared_type.to_string());
        }
    }

    pub fn fields(&self, name: &str) -> Option<&IndexMap<String, String>> {
        self.types.get(name)
    }

    /// The most recently declared type, used as the default root.
    pub fn last_declared(&self) -> Option<&str> {
        self.types.keys().last().map(String::as_str)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

/// A composite type synthesized from a JSON value.
///
/// `props` maps the original JSON key to an already dialect-specific type
/// expression (`Address`, `Address[]`, `[]Address`, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferredType {
    pub name: String,
    pub props: IndexMap<String, String>,
}
