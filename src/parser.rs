//! Line-oriented declaration scanner (source text → [`TypeRegistry`]).
//!
//! The scanner is a two-state machine: either no type is open, or fields are
//! being collected for one. Each line is classified on its own into a
//! [`LineEvent`] and the event drives a single transition. Nothing here ever
//! fails: a line that matches no strategy is skipped.
//!
//! Strategy order per line:
//! 1. blank line → close the open type
//! 2. header patterns (dialect-supplied, else built-in fallbacks)
//! 3. bare block name (`Person` on its own line)
//! 4. property patterns (dialect, else every dialect pooled, then generic)
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};

use crate::ir::TypeRegistry;
use crate::rules::{CaptureRole, PropertyPattern, RuleSet};

// ————————————————————————————————————————————————————————————————————————————
// BUILT-IN PATTERNS
// ————————————————————————————————————————————————————————————————————————————

fn builtin(pattern: &str) -> Regex {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .expect("built-in pattern compiles")
}

static FALLBACK_HEADERS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"^\s*(?:export\s+)?(?:interface|class)\s+([A-Za-z0-9_]+)",
        r"^\s*(?:public\s+)?(?:class|interface)\s+([A-Za-z0-9_]+)",
        r"^\s*type\s+([A-Za-z0-9_]+)\s+struct\b",
        r"^\s*class\s+([A-Za-z0-9_]+)",
    ]
    .into_iter()
    .map(builtin)
    .collect()
});

/// `<modifier>? name?: type`
static COLON_FIELD: Lazy<Regex> = Lazy::new(|| {
    builtin(
        r"^\s*(?:(?:public|private|protected|readonly|static|final|var|let|const)\s+)?([A-Za-z0-9_]+)\??\s*:\s*([^;=\{]+)",
    )
});

/// `type name`, C-like field declarations.
static SPACED_FIELD: Lazy<Regex> = Lazy::new(|| {
    builtin(
        r"^\s*(?:(?:public|private|protected|internal|static|final|readonly)\s+)*([A-Za-z0-9_<>,\[\]]+)\s+([A-Za-z0-9_]+)\s*[;\{=]?",
    )
});

/// `name: type` pairs outside of any block.
static TOP_LEVEL_PAIR: Lazy<Regex> =
    Lazy::new(|| builtin(r"^\s*([A-Za-z0-9_]+)\s*:\s*([^;#]+)"));

// ————————————————————————————————————————————————————————————————————————————
// STATE MACHINE
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ScanState {
    #[default]
    NoActiveType,
    InType(String),
}

/// What a single line means, independent of what it does to the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineEvent {
    Blank,
    Header(String),
    Field { name: String, declared_type: String },
    Skipped,
}

enum PropertySource<'r> {
    Dialect(&'r [PropertyPattern]),
    Aggregated(Vec<&'r PropertyPattern>),
    GenericOnly,
}

pub struct Parser<'r> {
    headers: &'r [Regex],
    properties: PropertySource<'r>,
}

impl<'r> Parser<'r> {
    pub fn new(dialect: Option<&str>, rules: Option<&'r RuleSet>) -> Self {
        let rule = dialect.and_then(|key| rules.and_then(|set| set.get(key)));
        if let (Some(key), None) = (dialect, rule) {
            tracing::debug!(dialect = key, "no rule for dialect; using fallbacks");
        }

        let headers: &'r [Regex] = match rule {
            Some(rule) if !rule.header_patterns().is_empty() => rule.header_patterns(),
            _ => FALLBACK_HEADERS.as_slice(),
        };

        let properties = match (rule, rules) {
            (Some(rule), _) if !rule.property_patterns().is_empty() => {
                PropertySource::Dialect(rule.property_patterns())
            }
            (_, Some(set)) => PropertySource::Aggregated(set.aggregated_property_patterns()),
            (_, None) => PropertySource::GenericOnly,
        };

        Self { headers, properties }
    }

    /// Classify one raw line given the current state.
    pub fn classify(&self, raw: &str, state: &ScanState) -> LineEvent {
        let line = strip_comment(raw);
        if line.is_empty() {
            return LineEvent::Blank;
        }

        if let Some(name) = self.match_header(line) {
            return LineEvent::Header(name);
        }

        if let Some(name) = bare_block_name(line, state) {
            return LineEvent::Header(name);
        }

        if matches!(state, ScanState::NoActiveType) {
            return LineEvent::Skipped;
        }

        match self.match_property(line) {
            Some((name, declared_type)) => LineEvent::Field {
                name,
                declared_type,
            },
            None => LineEvent::Skipped,
        }
    }

    /// Consume one line: classify it, apply it to the registry, return the next state.
    pub fn step(&self, state: ScanState, raw: &str, registry: &mut TypeRegistry) -> ScanState {
        match self.classify(raw, &state) {
            LineEvent::Blank => ScanState::NoActiveType,
            LineEvent::Header(name) => {
                tracing::trace!(%name, "type header");
                registry.declare(&name);
                ScanState::InType(name)
            }
            LineEvent::Field {
                name,
                declared_type,
            } => {
                if let ScanState::InType(owner) = &state {
                    tracing::trace!(%owner, %name, %declared_type, "field");
                    registry.insert_field(owner, &name, &declared_type);
                }
                state
            }
            LineEvent::Skipped => {
                tracing::trace!(line = raw.trim(), "skipped");
                state
            }
        }
    }

    pub fn parse(&self, source: &str) -> TypeRegistry {
        let mut registry = TypeRegistry::new();
        let mut state = ScanState::NoActiveType;
        for line in source.lines() {
            state = self.step(state, line, &mut registry);
        }
        tracing::debug!(types = registry.len(), "parsed declarations");
        registry
    }

    fn match_header(&self, line: &str) -> Option<String> {
        self.headers.iter().find_map(|re| {
            let caps = re.captures(line)?;
            let name = caps.name("name").or_else(|| caps.get(1))?.as_str().trim();
            (!name.is_empty()).then(|| name.to_string())
        })
    }

    fn match_property(&self, line: &str) -> Option<(String, String)> {
        let configured = match &self.properties {
            PropertySource::Dialect(patterns) => {
                patterns.iter().find_map(|p| extract_with(p, line))
            }
            PropertySource::Aggregated(patterns) => {
                patterns.iter().find_map(|p| extract_with(p, line))
            }
            PropertySource::GenericOnly => None,
        };
        configured.or_else(|| extract_generic(line))
    }
}

/// Parse declaration text with an optional dialect and rule set.
pub fn parse(source: &str, dialect: Option<&str>, rules: Option<&RuleSet>) -> TypeRegistry {
    Parser::new(dialect, rules).parse(source)
}

/// Collect `name: type` pairs from every line, ignoring block structure.
pub fn top_level_pairs(source: &str) -> Vec<(String, String)> {
    source
        .lines()
        .filter_map(|raw| {
            let caps = TOP_LEVEL_PAIR.captures(strip_comment(raw))?;
            Some((caps[1].trim().to_string(), clean_type(&caps[2])))
        })
        .collect()
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn strip_comment(raw: &str) -> &str {
    match raw.find("//") {
        Some(at) => raw[..at].trim(),
        None => raw.trim(),
    }
}

fn clean_type(ty: &str) -> String {
    ty.trim().trim_end_matches([';', ',']).trim().to_string()
}

/// A line with no field punctuation opens a new block named by its first token.
/// While a block is open only a lone identifier counts, so C-like field lines
/// (`Name string`) still reach property extraction.
fn bare_block_name(line: &str, state: &ScanState) -> Option<String> {
    if line.contains([':', '{', '}', ';', '=', '(', ')']) {
        return None;
    }
    let mut tokens = line.split_whitespace();
    let first = tokens.next()?;
    if !first.starts_with(|c: char| c.is_alphabetic() || c == '_') {
        return None;
    }
    let lone = tokens.next().is_none();
    match state {
        ScanState::NoActiveType => Some(first.to_string()),
        ScanState::InType(_) if lone => Some(first.to_string()),
        ScanState::InType(_) => None,
    }
}

fn extract_with(pattern: &PropertyPattern, line: &str) -> Option<(String, String)> {
    let caps = pattern.regex().captures(line)?;

    if let Some(name) = caps.name("name") {
        let name = name.as_str().trim();
        let ty = caps.name("type").map_or("any", |m| m.as_str().trim());
        return (!name.is_empty()).then(|| (name.to_string(), clean_type(ty)));
    }

    let captures: Vec<&str> = (1..caps.len())
        .map(|i| caps.get(i).map_or("", |m| m.as_str().trim()))
        .collect();

    let mut name = "";
    let mut ty = "any";
    if pattern.groups().is_empty() {
        match captures.as_slice() {
            [only] => name = only,
            [first, second, ..] => {
                name = first;
                ty = second;
            }
            [] => {}
        }
    } else {
        for (i, role) in pattern.groups().iter().enumerate() {
            let value = captures.get(i).copied().unwrap_or("");
            match role {
                CaptureRole::Name => name = value,
                CaptureRole::Type => ty = value,
                CaptureRole::Other => {}
            }
        }
        if name.is_empty() && captures.len() >= 2 {
            name = captures[captures.len() - 1];
        }
    }

    (!name.is_empty()).then(|| (name.to_string(), clean_type(ty)))
}

fn extract_generic(line: &str) -> Option<(String, String)> {
    if let Some(caps) = COLON_FIELD.captures(line) {
        return Some((caps[1].trim().to_string(), clean_type(&caps[2])));
    }
    let caps = SPACED_FIELD.captures(line)?;
    Some((caps[2].trim().to_string(), clean_type(&caps[1])))
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————

#[cfg(test)]
mod tests {
    use super::*;

    fn field(name: &str, ty: &str) -> LineEvent {
        LineEvent::Field {
            name: name.into(),
            declared_type: ty.into(),
        }
    }

    fn in_type(name: &str) -> ScanState {
        ScanState::InType(name.into())
    }

    #[test]
    fn blank_line_closes_open_type() {
        let parser = Parser::new(None, None);
        let mut reg = TypeRegistry::new();
        let state = parser.step(in_type("A"), "   // only a comment", &mut reg);
        assert_eq!(state, ScanState::NoActiveType);
    }

    #[test]
    fn fallback_headers_detect_interfaces_and_structs() {
        let parser = Parser::new(None, None);
        let idle = ScanState::NoActiveType;
        assert_eq!(
            parser.classify("export interface Person {", &idle),
            LineEvent::Header("Person".into())
        );
        assert_eq!(
            parser.classify("type Point struct {", &idle),
            LineEvent::Header("Point".into())
        );
        assert_eq!(
            parser.classify("public class User {", &idle),
            LineEvent::Header("User".into())
        );
    }

    #[test]
    fn bare_name_opens_block() {
        let parser = Parser::new(None, None);
        assert_eq!(
            parser.classify("Person", &ScanState::NoActiveType),
            LineEvent::Header("Person".into())
        );
        assert_eq!(
            parser.classify("Friend", &in_type("Person")),
            LineEvent::Header("Friend".into())
        );
    }

    #[test]
    fn multi_token_line_inside_block_is_not_a_header() {
        let parser = Parser::new(None, None);
        assert_eq!(parser.classify("String title", &in_type("User")), field("title", "String"));
    }

    #[test]
    fn field_without_open_type_is_skipped() {
        let parser = Parser::new(None, None);
        assert_eq!(
            parser.classify("name: string", &ScanState::NoActiveType),
            LineEvent::Skipped
        );
    }

    #[test]
    fn generic_fallbacks_handle_colon_and_space_styles() {
        let parser = Parser::new(None, None);
        let state = in_type("T");
        assert_eq!(parser.classify("readonly id?: number;", &state), field("id", "number"));
        assert_eq!(parser.classify("private int count;", &state), field("count", "int"));
        assert_eq!(parser.classify("name: string, // trailing", &state), field("name", "string"));
    }

    #[test]
    fn dialect_patterns_map_groups_to_roles() {
        let rules = RuleSet::bundled().unwrap();
        let parser = Parser::new(Some("csharp"), Some(&rules));
        assert_eq!(
            parser.classify("public List<Address> Homes { get; set; }", &in_type("P")),
            field("Homes", "List<Address>")
        );
    }

    #[test]
    fn unknown_dialect_pools_every_pattern() {
        let rules = RuleSet::bundled().unwrap();
        let parser = Parser::new(Some("cobol"), Some(&rules));
        assert_eq!(
            parser.classify("public String firstName;", &in_type("User")),
            field("firstName", "String")
        );
    }

    #[test]
    fn named_groups_win_over_metadata() {
        let rules = RuleSet::from_json_str(
            r#"{ "x": { "parsing": { "propertyPatterns": [
                { "pattern": "^let (?P<type>\\w+) (?P<name>\\w+)$", "groups": ["name", "type"] }
            ] } } }"#,
        )
        .unwrap();
        let parser = Parser::new(Some("x"), Some(&rules));
        assert_eq!(parser.classify("let int total", &in_type("T")), field("total", "int"));
    }

    #[test]
    fn positional_captures_without_metadata() {
        let rules = RuleSet::from_json_str(
            r#"{ "x": { "parsing": { "propertyPatterns": [
                { "pattern": "^field (\\w+)$" },
                { "pattern": "^(\\w+) as (\\w+)$" }
            ] } } }"#,
        )
        .unwrap();
        let parser = Parser::new(Some("x"), Some(&rules));
        let state = in_type("T");
        assert_eq!(parser.classify("field label", &state), field("label", "any"));
        assert_eq!(parser.classify("size as long", &state), field("size", "long"));
    }

    #[test]
    fn metadata_without_name_uses_last_capture() {
        let rules = RuleSet::from_json_str(
            r#"{ "x": { "parsing": { "propertyPatterns": [
                { "pattern": "^(\\w+) (\\w+)!$", "groups": ["type", "other"] }
            ] } } }"#,
        )
        .unwrap();
        let parser = Parser::new(Some("x"), Some(&rules));
        assert_eq!(parser.classify("text title!", &in_type("T")), field("title", "text"));
    }

    #[test]
    fn garbage_degrades_to_empty_registry() {
        let reg = parse("{{{ ;;; }}}\n=== ::: ===\n", Some("typescript"), None);
        assert!(reg.is_empty());
    }

    #[test]
    fn parse_collects_blocks_in_order() {
        let src = "Address\n  street: string\n\nPerson\n  name: string\n  address: Address\n";
        let reg = parse(src, None, None);
        assert_eq!(reg.names().collect::<Vec<_>>(), vec!["Address", "Person"]);
        assert_eq!(reg.fields("Person").unwrap()["address"], "Address");
    }

    #[test]
    fn top_level_pairs_strip_terminators() {
        let pairs = top_level_pairs("id: number;\nname: string, // label\n\n");
        assert_eq!(
            pairs,
            vec![
                ("id".to_string(), "number".to_string()),
                ("name".to_string(), "string".to_string()),
            ]
        );
    }
}
