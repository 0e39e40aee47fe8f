//! Dialect rule sets.
//!
//! A rule set is a JSON document keyed by dialect (`typescript`, `go`, ...).
//! Each entry carries the parsing patterns used by the declaration parser and
//! the naming/template policy used by the code renderer. Documents are
//! validated eagerly: every pattern is compiled and every template checked when
//! the set is loaded, so the pipelines never see a half-valid rule.
use std::path::Path;

use indexmap::IndexMap;
use regex::{Regex, RegexBuilder};
use serde::Deserialize;

use crate::error::{Error, Result};

/// Rule set shipped with the crate.
pub const BUNDLED_RULES: &str = include_str!("../rules/dialects.json");

const DEFAULT_PROPERTY_TEMPLATE: &str = "{name}: {type}";
const DEFAULT_CLASS_TEMPLATE: &str = "{name}\n{properties}";

// ————————————————————————————————————————————————————————————————————————————
// DOCUMENT SHAPE
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RuleDoc {
    label: Option<String>,
    #[serde(default)]
    parsing: ParsingDoc,
    #[serde(default)]
    property_case: PropertyCase,
    #[serde(default)]
    type_map: IndexMap<String, String>,
    #[serde(default)]
    array_style: ArrayStyleKind,
    array_generic_template: Option<String>,
    property_template: Option<String>,
    class_template: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ParsingDoc {
    #[serde(default)]
    header_regex: Vec<String>,
    #[serde(default)]
    property_patterns: Vec<PatternDoc>,
}

#[derive(Debug, Deserialize)]
struct PatternDoc {
    pattern: String,
    #[serde(default)]
    groups: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ArrayStyleKind {
    #[default]
    Suffix,
    Prefix,
    Generic,
}

// ————————————————————————————————————————————————————————————————————————————
// VALIDATED RULES
// ————————————————————————————————————————————————————————————————————————————

/// How field names are cased when rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyCase {
    Pascal,
    Camel,
    Snake,
    #[default]
    Default,
}

/// How an array of `T` is spelled in the target dialect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArrayStyle {
    /// `T[]`
    Suffix,
    /// `[]T`
    Prefix,
    /// A template with a `{T}` slot, e.g. `List<{T}>`.
    Generic(String),
}

/// What a positional capture of a property pattern holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureRole {
    Name,
    Type,
    Other,
}

#[derive(Debug, Clone)]
pub struct PropertyPattern {
    regex: Regex,
    groups: Vec<CaptureRole>,
}

impl PropertyPattern {
    pub fn regex(&self) -> &Regex {
        &self.regex
    }
    /// Roles of positional captures; empty when the document gave no metadata.
    pub fn groups(&self) -> &[CaptureRole] {
        &self.groups
    }
}

#[derive(Debug, Clone)]
pub struct Rule {
    key: String,
    label: Option<String>,
    header_patterns: Vec<Regex>,
    property_patterns: Vec<PropertyPattern>,
    property_case: PropertyCase,
    type_map: IndexMap<String, String>,
    array_style: ArrayStyle,
    property_template: String,
    class_template: String,
}

impl Rule {
    fn from_doc(key: &str, doc: RuleDoc) -> Result<Self> {
        let header_patterns = doc
            .parsing
            .header_regex
            .iter()
            .map(|pattern| compile(key, pattern))
            .collect::<Result<Vec<_>>>()?;
        for (pattern, regex) in doc.parsing.header_regex.iter().zip(&header_patterns) {
            if regex.captures_len() < 2 {
                return Err(Error::invalid_rule(
                    key,
                    format!("header pattern `{pattern}` has no capture group"),
                ));
            }
        }

        let mut property_patterns = Vec::with_capacity(doc.parsing.property_patterns.len());
        for entry in &doc.parsing.property_patterns {
            let regex = compile(key, &entry.pattern)?;
            if regex.captures_len() < 2 {
                return Err(Error::invalid_rule(
                    key,
                    format!("property pattern `{}` has no capture group", entry.pattern),
                ));
            }
            let groups = entry
                .groups
                .iter()
                .map(|g| match g.as_str() {
                    "name" => CaptureRole::Name,
                    "type" => CaptureRole::Type,
                    _ => CaptureRole::Other,
                })
                .collect();
            property_patterns.push(PropertyPattern { regex, groups });
        }

        let array_style = match (doc.array_style, doc.array_generic_template) {
            (ArrayStyleKind::Suffix, _) => ArrayStyle::Suffix,
            (ArrayStyleKind::Prefix, _) => ArrayStyle::Prefix,
            (ArrayStyleKind::Generic, Some(template)) if template.contains("{T}") => {
                ArrayStyle::Generic(template)
            }
            (ArrayStyleKind::Generic, Some(template)) => {
                return Err(Error::invalid_rule(
                    key,
                    format!("arrayGenericTemplate `{template}` has no {{T}} slot"),
                ));
            }
            (ArrayStyleKind::Generic, None) => {
                return Err(Error::invalid_rule(
                    key,
                    "arrayStyle \"generic\" requires arrayGenericTemplate",
                ));
            }
        };

        Ok(Self {
            key: key.to_string(),
            label: doc.label,
            header_patterns,
            property_patterns,
            property_case: doc.property_case,
            type_map: doc.type_map,
            array_style,
            property_template: doc
                .property_template
                .unwrap_or_else(|| DEFAULT_PROPERTY_TEMPLATE.to_string()),
            class_template: doc
                .class_template
                .unwrap_or_else(|| DEFAULT_CLASS_TEMPLATE.to_string()),
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }
    pub fn header_patterns(&self) -> &[Regex] {
        &self.header_patterns
    }
    pub fn property_patterns(&self) -> &[PropertyPattern] {
        &self.property_patterns
    }
    pub fn property_case(&self) -> PropertyCase {
        self.property_case
    }
    pub fn array_style(&self) -> &ArrayStyle {
        &self.array_style
    }
    pub fn property_template(&self) -> &str {
        &self.property_template
    }
    pub fn class_template(&self) -> &str {
        &self.class_template
    }

    /// Literal for a semantic kind (`string`, `number`, `boolean`, `null`, `array`).
    /// Falls back to the `object` mapping, then to the kind itself.
    pub fn type_for(&self, kind: &str) -> String {
        self.type_map
            .get(kind)
            .or_else(|| self.type_map.get("object"))
            .cloned()
            .unwrap_or_else(|| kind.to_string())
    }

    /// Spell an array of `element` in this dialect.
    pub fn array_of(&self, element: &str) -> String {
        match &self.array_style {
            ArrayStyle::Suffix => format!("{element}[]"),
            ArrayStyle::Prefix => format!("[]{element}"),
            ArrayStyle::Generic(template) => template.replace("{T}", element),
        }
    }

    /// The dialect's "array of anything", used when element type is unknown.
    pub fn any_array(&self) -> String {
        self.type_for("array").replace("{T}", "any")
    }
}

fn compile(dialect: &str, pattern: &str) -> Result<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|source| Error::InvalidPattern {
            dialect: dialect.to_string(),
            pattern: pattern.to_string(),
            source,
        })
}

// ————————————————————————————————————————————————————————————————————————————
// RULE SET
// ————————————————————————————————————————————————————————————————————————————

/// Validated rules keyed by dialect, in document order.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: IndexMap<String, Rule>,
}

impl RuleSet {
    pub fn from_json_str(src: &str) -> Result<Self> {
        let de = &mut serde_json::Deserializer::from_str(src);
        let docs = serde_path_to_error::deserialize::<_, IndexMap<String, RuleDoc>>(de)
            .map_err(|err| Error::RuleDocument {
                path: err.path().to_string(),
                message: err.into_inner().to_string(),
            })?;
        let mut rules = IndexMap::with_capacity(docs.len());
        for (key, doc) in docs {
            let rule = Rule::from_doc(&key, doc)?;
            rules.insert(key, rule);
        }
        tracing::debug!(dialects = rules.len(), "loaded rule set");
        Ok(Self { rules })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let src = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&src)
    }

    /// The rule set compiled into the crate (`rules/dialects.json`).
    pub fn bundled() -> Result<Self> {
        Self::from_json_str(BUNDLED_RULES)
    }

    pub fn get(&self, key: &str) -> Option<&Rule> {
        self.rules.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.values()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Every dialect's property patterns pooled in document order. Used to
    /// parse declarations whose dialect is unknown.
    pub fn aggregated_property_patterns(&self) -> Vec<&PropertyPattern> {
        self.rules
            .values()
            .flat_map(|rule| rule.property_patterns.iter())
            .collect()
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
