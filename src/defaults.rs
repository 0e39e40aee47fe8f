//! Default values for declared types (registry → JSON) and the Code→JSON entry point.
//!
//! Resolution order for a type expression:
//! empty → union → promise-like wrapper → array → primitive bucket → declared
//! type → `{}`. The recursion path doubles as the cycle guard: a type that is
//! already being expanded resolves to `{}`, while siblings may expand the same
//! type again.
use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::ir::TypeRegistry;
use crate::parser;
use crate::rules::RuleSet;

/// Wrappers that only delay or box a value; the inner type decides the default.
const PASS_THROUGH_WRAPPERS: &[&str] = &[
    "promise",
    "task",
    "valuetask",
    "future",
    "completablefuture",
    "observable",
    "optional",
    "option",
    "nullable",
];

/// Generic containers that default to an empty array.
const LIST_WRAPPERS: &[&str] = &[
    "array",
    "list",
    "vec",
    "set",
    "hashset",
    "ilist",
    "ienumerable",
    "icollection",
    "readonlyarray",
    "sequence",
];

const STRING_LIKE: &[&str] = &["string", "text", "uuid", "date", "datetime", "string?"];
const NUMBER_LIKE: &[&str] = &["number", "int", "float", "double", "long", "integer"];
const BOOL_LIKE: &[&str] = &["boolean", "bool"];
const OBJECT_LIKE: &[&str] = &["any", "object", "map"];

// ————————————————————————————————————————————————————————————————————————————
// RESOLVER
// ————————————————————————————————————————————————————————————————————————————

/// Default value for `type_expr` with a fresh recursion path.
pub fn default_value(type_expr: &str, registry: &TypeRegistry) -> Value {
    default_for_type(type_expr, registry, &mut Vec::new())
}

/// Default value for `type_expr`. `path` holds the declared types currently
/// being expanded; it is restored before returning.
pub fn default_for_type(type_expr: &str, registry: &TypeRegistry, path: &mut Vec<String>) -> Value {
    let expr = type_expr.trim();
    if expr.is_empty() {
        return Value::Object(Map::new());
    }

    let alternatives: Vec<&str> = expr
        .split('|')
        .map(str::trim)
        .filter(|alt| !alt.is_empty())
        .collect();
    let expr = match alternatives.as_slice() {
        [] => return Value::Object(Map::new()),
        [single] => *single,
        [first, ..] => {
            let pick = alternatives
                .iter()
                .find(|alt| !is_nullish(alt))
                .unwrap_or(first);
            return default_for_type(pick, registry, path);
        }
    };

    let expr = expr.trim_start_matches(['*', '&']).trim();

    if let Some(inner) = unwrap_generic(expr, PASS_THROUGH_WRAPPERS) {
        return default_for_type(inner, registry, path);
    }

    if is_array_expr(expr) {
        return Value::Array(Vec::new());
    }

    if let Some(value) = primitive_default(expr) {
        return value;
    }

    let plain = expr.split('<').next().unwrap_or(expr).trim();
    match registry.fields(plain) {
        Some(fields) if !path.iter().any(|seen| seen == plain) => {
            expand(plain, fields, registry, path)
        }
        Some(_) => {
            tracing::trace!(ty = plain, "cyclic reference");
            Value::Object(Map::new())
        }
        None => Value::Object(Map::new()),
    }
}

fn expand(
    name: &str,
    fields: &IndexMap<String, String>,
    registry: &TypeRegistry,
    path: &mut Vec<String>,
) -> Value {
    path.push(name.to_string());
    let mut out = Map::new();
    for (field, declared) in fields {
        out.insert(field.clone(), default_for_type(declared, registry, path));
    }
    path.pop();
    Value::Object(out)
}

fn is_nullish(alt: &str) -> bool {
    alt.eq_ignore_ascii_case("null") || alt.eq_ignore_ascii_case("undefined")
}

/// `Wrapper<Inner>` → `Inner` when `Wrapper` is one of `names` (case-insensitive).
fn unwrap_generic<'a>(expr: &'a str, names: &[&str]) -> Option<&'a str> {
    let open = expr.find('<')?;
    let inner = expr.strip_suffix('>')?.get(open + 1..)?;
    let head = expr[..open].trim().to_ascii_lowercase();
    names.contains(&head.as_str()).then(|| inner.trim())
}

fn is_array_expr(expr: &str) -> bool {
    if expr.ends_with("[]") || expr.starts_with("[]") {
        return true;
    }
    // Swift `[T]`; `[K: V]` is a dictionary.
    if expr.starts_with('[') && expr.ends_with(']') && !expr.contains(':') {
        return true;
    }
    unwrap_generic(expr, LIST_WRAPPERS).is_some()
}

fn primitive_default(expr: &str) -> Option<Value> {
    let lower = expr.to_ascii_lowercase();
    let lower = lower.as_str();
    if STRING_LIKE.contains(&lower) {
        Some(Value::String(String::new()))
    } else if NUMBER_LIKE.contains(&lower) {
        Some(Value::from(0))
    } else if BOOL_LIKE.contains(&lower) {
        Some(Value::Bool(false))
    } else if lower == "null" {
        Some(Value::Null)
    } else if OBJECT_LIKE.contains(&lower) || lower.starts_with("record") || lower.starts_with('{') {
        Some(Value::Object(Map::new()))
    } else {
        None
    }
}

// ————————————————————————————————————————————————————————————————————————————
// CODE → JSON
// ————————————————————————————————————————————————————————————————————————————

/// Parse declarations and build the default-value object for the root type.
///
/// The root is the last declared type; each of its fields is resolved with a
/// fresh recursion path. Without any recognized type, bare `name: type` lines
/// form an anonymous root; with neither, the result is `{}`.
pub fn generate_value(source: &str, dialect: Option<&str>, rules: Option<&RuleSet>) -> Value {
    let registry = parser::parse(source, dialect, rules);

    let root = registry
        .last_declared()
        .and_then(|name| registry.fields(name).map(|fields| (name, fields)));
    if let Some((name, fields)) = root {
        tracing::debug!(root = name, fields = fields.len(), "resolving root type");
        let mut out = Map::new();
        for (field, declared) in fields {
            out.insert(field.clone(), default_value(declared, &registry));
        }
        return Value::Object(out);
    }

    let pairs = parser::top_level_pairs(source);
    tracing::debug!(fields = pairs.len(), "no type headers; using top-level fields");
    let mut out = Map::new();
    for (field, declared) in pairs {
        let value = default_value(&declared, &registry);
        out.insert(field, value);
    }
    Value::Object(out)
}

/// [`generate_value`] rendered as 2-space indented JSON.
pub fn generate(source: &str, dialect: Option<&str>, rules: Option<&RuleSet>) -> String {
    format!("{:#}", generate_value(source, dialect, rules))
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn registry(decls: &[(&str, &[(&str, &str)])]) -> TypeRegistry {
        let mut reg = TypeRegistry::new();
        for (name, fields) in decls {
            reg.declare(name);
            for (field, ty) in *fields {
                reg.insert_field(name, field, ty);
            }
        }
        reg
    }

    #[test]
    fn primitive_buckets_ignore_case_and_whitespace() {
        let reg = TypeRegistry::new();
        for ty in ["string", "  STRING ", "Text", "uuid", "DateTime", "string?"] {
            assert_eq!(default_value(ty, &reg), json!(""), "{ty}");
        }
        for ty in ["number", "Int", " float", "Double", "LONG", "integer"] {
            assert_eq!(default_value(ty, &reg), json!(0), "{ty}");
        }
        for ty in ["boolean", "Bool"] {
            assert_eq!(default_value(ty, &reg), json!(false), "{ty}");
        }
        assert_eq!(default_value("NULL", &reg), Value::Null);
        for ty in ["any", "Object", "map", "Record<string, number>", "{ a: string }", ""] {
            assert_eq!(default_value(ty, &reg), json!({}), "{ty}");
        }
    }

    #[test]
    fn unions_skip_null_like_alternatives() {
        let reg = TypeRegistry::new();
        assert_eq!(default_value("null | number", &reg), json!(0));
        assert_eq!(default_value("undefined|string|null", &reg), json!(""));
        assert_eq!(default_value("null|undefined", &reg), Value::Null);
        assert_eq!(default_value("boolean |", &reg), json!(false));
    }

    #[test]
    fn wrappers_defer_to_inner_type() {
        let reg = TypeRegistry::new();
        assert_eq!(default_value("Promise<string>", &reg), json!(""));
        assert_eq!(default_value("Task<int>", &reg), json!(0));
        assert_eq!(default_value("Option<bool>", &reg), json!(false));
        assert_eq!(default_value("Promise<Address[]>", &reg), json!([]));
        assert_eq!(default_value("*float", &reg), json!(0));
    }

    #[test]
    fn arrays_default_to_empty() {
        let reg = registry(&[("Address", &[("street", "string")])]);
        for ty in ["string[]", "Array<number>", "List<Address>", "Vec<String>", "[]string", "[Address]"] {
            assert_eq!(default_value(ty, &reg), json!([]), "{ty}");
        }
        assert_eq!(default_value("[String: Any]", &reg), json!({}));
    }

    #[test]
    fn references_expand_declared_types() {
        let reg = registry(&[
            ("Address", &[("street", "string"), ("zip", "number")]),
            ("Page", &[("total", "int")]),
        ]);
        assert_eq!(default_value("Address", &reg), json!({ "street": "", "zip": 0 }));
        assert_eq!(default_value("Page<Address>", &reg), json!({ "total": 0 }));
        assert_eq!(default_value("Unknown", &reg), json!({}));
    }

    #[test]
    fn self_reference_terminates() {
        let reg = registry(&[("Node", &[("value", "number"), ("next", "Node")])]);
        assert_eq!(default_value("Node", &reg), json!({ "value": 0, "next": {} }));
    }

    #[test]
    fn mutual_reference_terminates() {
        let reg = registry(&[("A", &[("b", "B")]), ("B", &[("a", "A")])]);
        assert_eq!(default_value("A", &reg), json!({ "b": { "a": {} } }));
    }

    #[test]
    fn siblings_may_expand_the_same_type() {
        let reg = registry(&[
            ("Address", &[("street", "string")]),
            ("Person", &[("home", "Address"), ("work", "Address")]),
        ]);
        assert_eq!(
            default_value("Person", &reg),
            json!({ "home": { "street": "" }, "work": { "street": "" } })
        );
    }

    #[test]
    fn path_is_restored_after_resolution() {
        let reg = registry(&[("A", &[("x", "string")])]);
        let mut path = vec!["Outer".to_string()];
        default_for_type("A", &reg, &mut path);
        assert_eq!(path, vec!["Outer".to_string()]);
    }

    #[test]
    fn root_is_last_declared_type() {
        let out = generate_value("A\n  x: number\n\nB\n  y: string", None, None);
        assert_eq!(out, json!({ "y": "" }));
    }

    #[test]
    fn self_referencing_root_expands_once_more() {
        let out = generate_value("Tree\n  label: string\n  parent: Tree", None, None);
        assert_eq!(out, json!({ "label": "", "parent": { "label": "", "parent": {} } }));
    }

    #[test]
    fn root_fields_match_fresh_resolution() {
        let src = "Parent\n  child: Child\n\nChild\n  parent: Parent\n  name: string";
        let registry = parser::parse(src, None, None);
        let mut expected = Map::new();
        for (field, declared) in registry.fields("Child").unwrap() {
            expected.insert(field.clone(), default_value(declared, &registry));
        }
        assert_eq!(generate_value(src, None, None), Value::Object(expected));
    }

    #[test]
    fn headerless_input_uses_top_level_fields() {
        let out = generate_value("name: string;\nage: number,\n", None, None);
        assert_eq!(out, json!({ "name": "", "age": 0 }));
    }

    #[test]
    fn unrecognized_input_yields_empty_object() {
        assert_eq!(generate("{ ;; }", None, None), "{}");
        assert_eq!(generate("", None, None), "{}");
    }

    #[test]
    fn output_is_two_space_indented() {
        let out = generate("Person\n  name: string", None, None);
        assert_eq!(out, "{\n  \"name\": \"\"\n}");
    }
}
