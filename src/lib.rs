//! Rule-driven conversion between type declarations and JSON shapes.
//!
//! - Code → JSON: [`parser`] builds a [`TypeRegistry`] from loosely structured
//!   declarations, then [`defaults`] expands the root type into default values.
//! - JSON → Code: [`inference`] turns a JSON object into dependency-ordered
//!   [`InferredType`]s, then [`codegen`] renders them with a dialect [`Rule`].
//!
//! Dialect knowledge lives entirely in a [`RuleSet`]; the crate bundles one
//! (`RuleSet::bundled`) and accepts user documents of the same shape.
pub mod cli;
pub mod codegen;
pub mod defaults;
pub mod error;
pub mod inference;
pub mod ir;
pub mod parser;
pub mod preprocess;
pub mod rules;

pub use error::{Error, Result};
pub use ir::{InferredType, TypeRegistry};
pub use rules::{Rule, RuleSet};

/// Code → JSON: pretty-printed default values for the last declared type.
pub fn code_to_json(source: &str, dialect: Option<&str>, rules: Option<&RuleSet>) -> String {
    defaults::generate(source, dialect, rules)
}

/// JSON → Code: declarations for `json_text`, root type last.
pub fn json_to_code(json_text: &str, dialect: &str, rules: &RuleSet, root_name: &str) -> Result<String> {
    codegen::generate(json_text, dialect, rules, root_name)
}
