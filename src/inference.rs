//! Type inference over a single JSON document (JSON → ordered type list).
//!
//! Every JSON object becomes a named composite type. Children are finished
//! before their parent is registered, so the resulting list is already in
//! dependency order and the root, being the outermost object, comes last.
//! Names are reserved when a child is spawned, which keeps them unique across
//! the whole document (`Address`, `Address1`, ...).
//!
//! Arrays only look at their first non-null element; there is no merging of
//! element shapes.
pub mod naming;

use std::collections::HashSet;

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::ir::InferredType;
use crate::rules::Rule;

pub use naming::{field_name, singularize, to_pascal_case};

// ------------------------------- Builder --------------------------------- //

pub struct TypeBuilder<'r> {
    rule: &'r Rule,
    reserved: HashSet<String>,
    types: Vec<InferredType>,
}

impl<'r> TypeBuilder<'r> {
    pub fn new(rule: &'r Rule) -> Self {
        Self {
            rule,
            reserved: HashSet::new(),
            types: Vec::new(),
        }
    }

    /// Consume the builder and infer every type reachable from `root`.
    pub fn build(mut self, root: &Map<String, Value>, root_name: &str) -> Vec<InferredType> {
        let name = self.reserve(&naming::type_name(root_name));
        self.observe_object(root, name);
        self.types
    }

    /// First free name among `base`, `base1`, `base2`, ...
    fn reserve(&mut self, base: &str) -> String {
        let mut candidate = base.to_string();
        let mut n = 1;
        while self.reserved.contains(&candidate) {
            candidate = format!("{base}{n}");
            n += 1;
        }
        self.reserved.insert(candidate.clone());
        candidate
    }

    fn observe_object(&mut self, obj: &Map<String, Value>, name: String) {
        let mut props = IndexMap::with_capacity(obj.len());
        for (key, value) in obj {
            let ty = self.field_type(key, value);
            props.insert(key.clone(), ty);
        }
        tracing::debug!(%name, fields = props.len(), "inferred type");
        self.types.push(InferredType { name, props });
    }

    fn field_type(&mut self, key: &str, value: &Value) -> String {
        match value {
            Value::Object(child) => self.spawn(&naming::type_name(key), child),
            Value::Array(items) => self.array_type(key, items),
            scalar => self.rule.type_for(scalar_kind(scalar)),
        }
    }

    fn array_type(&mut self, key: &str, items: &[Value]) -> String {
        match items.iter().find(|item| !item.is_null()) {
            None | Some(Value::Array(_)) => self.rule.any_array(),
            Some(Value::Object(first)) => {
                let element = self.spawn(&naming::type_name(&singularize(key)), first);
                self.rule.array_of(&element)
            }
            Some(scalar) => {
                let element = self.rule.type_for(scalar_kind(scalar));
                self.rule.array_of(&element)
            }
        }
    }

    fn spawn(&mut self, base: &str, obj: &Map<String, Value>) -> String {
        let name = self.reserve(base);
        self.observe_object(obj, name.clone());
        name
    }
}

fn scalar_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ------------------------------- Front API -------------------------------- //

/// Infer the dependency-ordered type list for `root`; the root type is last.
pub fn build_types(root: &Map<String, Value>, rule: &Rule, root_name: &str) -> Vec<InferredType> {
    TypeBuilder::new(rule).build(root, root_name)
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RuleSet;
    use serde_json::json;

    fn infer(dialect: &str, value: Value, root: &str) -> Vec<InferredType> {
        let rules = RuleSet::bundled().unwrap();
        let rule = rules.get(dialect).unwrap();
        build_types(value.as_object().unwrap(), rule, root)
    }

    fn names(types: &[InferredType]) -> Vec<&str> {
        types.iter().map(|t| t.name.as_str()).collect()
    }

    #[test]
    fn primitives_use_type_map() {
        let types = infer("typescript", json!({"s": "x", "n": 1.5, "b": true, "z": null}), "root");
        assert_eq!(names(&types), vec!["Root"]);
        let props = &types[0].props;
        assert_eq!(props["s"], "string");
        assert_eq!(props["n"], "number");
        assert_eq!(props["b"], "boolean");
        assert_eq!(props["z"], "any");
    }

    #[test]
    fn children_precede_parents_and_root_is_last() {
        let types = infer(
            "typescript",
            json!({"address": {"geo": {"lat": 1}}, "name": "x"}),
            "Person",
        );
        assert_eq!(names(&types), vec!["Geo", "Address", "Person"]);
        assert_eq!(types[1].props["geo"], "Geo");
        assert_eq!(types[2].props["address"], "Address");
    }

    #[test]
    fn colliding_names_get_numeric_suffixes() {
        let types = infer(
            "typescript",
            json!({
                "work": {"address": {"city": "a"}},
                "address": {"street": "b"},
                "home": {"address": {"zip": "c"}}
            }),
            "Root",
        );
        assert_eq!(
            names(&types),
            vec!["Address", "Work", "Address1", "Address2", "Home", "Root"]
        );
        assert_eq!(types[5].props["address"], "Address1");
        assert_eq!(types[4].props["address"], "Address2");
    }

    #[test]
    fn child_named_like_root_is_disambiguated() {
        let types = infer("typescript", json!({"root": {"x": 1}}), "Root");
        assert_eq!(names(&types), vec!["Root1", "Root"]);
    }

    #[test]
    fn object_arrays_spawn_singular_types() {
        let types = infer(
            "typescript",
            json!({"phoneNumbers": [{"type": "home"}, {"other": 1}], "categories": [{"id": 1}]}),
            "Root",
        );
        assert_eq!(names(&types), vec!["PhoneNumber", "Category", "Root"]);
        assert_eq!(types[0].props.keys().collect::<Vec<_>>(), vec!["type"]);
        assert_eq!(types[2].props["phoneNumbers"], "PhoneNumber[]");
        assert_eq!(types[2].props["categories"], "Category[]");
    }

    #[test]
    fn array_fallbacks() {
        let types = infer(
            "typescript",
            json!({"empty": [], "nested": [[1]], "tags": ["a"], "nulls": [null]}),
            "Root",
        );
        let props = &types[0].props;
        assert_eq!(props["empty"], "any[]");
        assert_eq!(props["nested"], "any[]");
        assert_eq!(props["tags"], "string[]");
        assert_eq!(props["nulls"], "any[]");
    }

    #[test]
    fn leading_nulls_are_skipped_in_arrays() {
        let types = infer("go", json!({"items": [null, {"id": 1}]}), "Root");
        assert_eq!(names(&types), vec!["Item", "Root"]);
        assert_eq!(types[1].props["items"], "[]Item");
    }

    #[test]
    fn array_style_follows_rule() {
        let go = infer("go", json!({"tags": ["a"], "n": [1]}), "Root");
        assert_eq!(go[0].props["tags"], "[]string");
        assert_eq!(go[0].props["n"], "[]float64");

        let cs = infer("csharp", json!({"scores": [1], "empty": []}), "Root");
        assert_eq!(cs[0].props["scores"], "List<double>");
        assert_eq!(cs[0].props["empty"], "List<object>");
    }
}
