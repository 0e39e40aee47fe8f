//! Render inferred types as declarations (ordered type list → code).
//!
//! All dialect knowledge comes from the [`Rule`]: field casing, the property
//! template (`{name}`, `{type}`, `{jsonName}`) and the class template
//! (`{name}`, `{properties}`).
use serde_json::Value;

use crate::error::{Error, Result};
use crate::inference::{self, field_name};
use crate::ir::InferredType;
use crate::rules::{Rule, RuleSet};

// ————————————————————————————————————————————————————————————————————————————
// TEMPLATES
// ————————————————————————————————————————————————————————————————————————————

/// Substitute `{key}` slots in one pass. Braces that do not enclose a known
/// key are copied through, and substituted values are never re-scanned.
pub fn fill_template(template: &str, slots: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let slot = after.find('}').and_then(|close| {
            let key = &after[..close];
            slots
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, value)| (*value, close))
        });
        match slot {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// One declaration block for `ty`.
pub fn render_type(ty: &InferredType, rule: &Rule) -> String {
    let properties = ty
        .props
        .iter()
        .map(|(json_name, rendered)| {
            let name = field_name(json_name, rule.property_case());
            fill_template(
                rule.property_template(),
                &[
                    ("name", name.as_str()),
                    ("type", rendered.as_str()),
                    ("jsonName", json_name.as_str()),
                ],
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    fill_template(
        rule.class_template(),
        &[("name", ty.name.as_str()), ("properties", properties.as_str())],
    )
}

// ————————————————————————————————————————————————————————————————————————————
// CODEGEN
// ————————————————————————————————————————————————————————————————————————————

pub struct Codegen<'r> {
    rule: &'r Rule,
    blocks: Vec<String>,
}

impl<'r> Codegen<'r> {
    pub fn new(rule: &'r Rule) -> Self {
        Self {
            rule,
            blocks: Vec::new(),
        }
    }

    pub fn emit(&mut self, types: &[InferredType]) {
        self.blocks
            .extend(types.iter().map(|ty| render_type(ty, self.rule)));
    }

    /// Declarations separated by a blank line.
    pub fn into_string(self) -> String {
        self.blocks.join("\n\n")
    }
}

// ————————————————————————————————————————————————————————————————————————————
// JSON → CODE
// ————————————————————————————————————————————————————————————————————————————

/// Render declarations for an already parsed JSON document.
pub fn generate_value(
    value: &Value,
    dialect: &str,
    rules: &RuleSet,
    root_name: &str,
) -> Result<String> {
    let Value::Object(root) = value else {
        return Err(Error::InvalidShape);
    };
    let rule = rules
        .get(dialect)
        .ok_or_else(|| Error::UnknownRule(dialect.to_string()))?;

    let types = inference::build_types(root, rule, root_name);
    tracing::debug!(dialect, types = types.len(), "rendering declarations");

    let mut cg = Codegen::new(rule);
    cg.emit(&types);
    Ok(cg.into_string())
}

/// Parse `json_text` and render declarations in `dialect`.
pub fn generate(json_text: &str, dialect: &str, rules: &RuleSet, root_name: &str) -> Result<String> {
    let value: Value = serde_json::from_str(json_text).map_err(Error::InvalidJson)?;
    generate_value(&value, dialect, rules, root_name)
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
