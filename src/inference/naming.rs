use crate::rules::PropertyCase;

/// Replace everything outside `[A-Za-z0-9_]` with `_`.
pub fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

/// `last_name` → `LastName`, `firstName` → `FirstName`. Only the first
/// character of each `_`-separated part changes.
pub fn to_pascal_case(name: &str) -> String {
    let cleaned = sanitize(name);
    let joined: String = cleaned
        .split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect();
    if joined.is_empty() { cleaned } else { joined }
}

pub fn to_camel_case(name: &str) -> String {
    let pascal = to_pascal_case(name);
    let mut chars = pascal.chars();
    match chars.next() {
        Some(first) => first.to_ascii_lowercase().to_string() + chars.as_str(),
        None => pascal,
    }
}

/// Collapse non-alphanumeric runs to `_` and lowercase. Humps are not split:
/// `firstName` → `firstname`.
pub fn to_snake_case(name: &str) -> String {
    let cleaned = sanitize(name);
    let mut out = String::with_capacity(cleaned.len());
    let mut in_gap = false;
    for c in cleaned.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
            in_gap = false;
        } else if !in_gap {
            out.push('_');
            in_gap = true;
        }
    }
    out
}

/// `categories` → `category`, `phoneNumbers` → `phoneNumber`.
pub fn singularize(name: &str) -> String {
    if let Some(stem) = name.strip_suffix("ies") {
        format!("{stem}y")
    } else if let Some(stem) = name.strip_suffix('s') {
        stem.to_string()
    } else {
        name.to_string()
    }
}

/// Field name as the dialect spells it.
pub fn field_name(name: &str, case: PropertyCase) -> String {
    match case {
        PropertyCase::Pascal => to_pascal_case(name),
        PropertyCase::Camel => to_camel_case(name),
        PropertyCase::Snake => to_snake_case(name),
        PropertyCase::Default => sanitize(name),
    }
}

/// Type name derived from a JSON key; never empty.
pub fn type_name(key: &str) -> String {
    let name = to_pascal_case(key);
    if name.is_empty() { "Type".to_string() } else { name }
}
