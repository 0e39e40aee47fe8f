//! Narrow a JSON document before type building: JSON Pointer selection and jq
//! filtering (via jaq).
use jaq_core::{Compiler, Ctx, RcIter, compile::Undefined, load};
use jaq_json::Val;
use serde_json::Value;

use crate::error::{Error, Result};

/// The node at `pointer` (RFC 6901), cloned out of `doc`.
pub fn select_pointer(doc: &Value, pointer: &str) -> Result<Value> {
    doc.pointer(pointer)
        .cloned()
        .ok_or_else(|| Error::PointerMiss(pointer.to_string()))
}

/// Run a jq filter over `input`. A filter may yield any number of outputs.
pub fn run_jq(filter_src: &str, input: &Value) -> Result<Vec<Value>> {
    let loader = load::Loader::new(jaq_std::defs().chain(jaq_json::defs()));
    let arena = load::Arena::default();
    let program = load::File {
        code: filter_src,
        path: (),
    };

    let modules = loader.load(&arena, program).map_err(format_parse_errors)?;

    let filter = Compiler::default()
        .with_funs(jaq_std::funs().chain(jaq_json::funs()))
        .compile(modules)
        .map_err(format_undefined_errors)?;

    let inputs = RcIter::new(core::iter::empty());
    let outputs = filter.run((Ctx::new([], &inputs), Val::from(input.clone())));

    let mut out = Vec::new();
    for item in outputs {
        let val = item.map_err(|e| Error::Jq(format!("{e:?}")))?;
        // Val renders as JSON text; round-trip through serde_json to keep key order.
        let value = serde_json::from_str(&val.to_string())
            .map_err(|e| Error::Jq(format!("filter produced non-JSON output: {e}")))?;
        out.push(value);
    }
    tracing::debug!(filter = filter_src, outputs = out.len(), "applied jq filter");
    Ok(out)
}

/// Apply the optional pointer, then the optional jq filter.
pub fn prepare(doc: Value, pointer: Option<&str>, jq_expr: Option<&str>) -> Result<Vec<Value>> {
    let doc = match pointer {
        Some(pointer) => select_pointer(&doc, pointer)?,
        None => doc,
    };
    match jq_expr {
        Some(filter) => run_jq(filter, &doc),
        None => Ok(vec![doc]),
    }
}

fn format_parse_errors(errs: Vec<(load::File<&str, ()>, load::Error<&str>)>) -> Error {
    let mut s = String::new();
    for (file, err) in errs {
        s.push_str(&format!("parse error: {err:?} in `{}`\n", file.code));
    }
    Error::Jq(s.trim_end().to_string())
}

fn format_undefined_errors(errs: Vec<(load::File<&str, ()>, Vec<(&str, Undefined)>)>) -> Error {
    let mut s = String::new();
    for (file, list) in errs {
        for (name, undef) in list {
            s.push_str(&format!("undefined `{name}`: {undef:?} in `{}`\n", file.code));
        }
    }
    Error::Jq(s.trim_end().to_string())
}
