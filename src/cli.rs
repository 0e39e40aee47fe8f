//! Command-line surface: code-to-json | json-to-code | languages
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use rayon::prelude::*;
use serde_json::Value;

use crate::error::Error;
use crate::inference::to_pascal_case;
use crate::rules::RuleSet;
use crate::{codegen, defaults, preprocess};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// convert type declarations to default-value JSON, or JSON to type declarations
#[derive(Parser, Debug)]
#[command(name = "codeshape", version)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// parse declarations and print default values for the last declared type
    CodeToJson(CodeToJsonOut),
    /// infer types from JSON and render declarations in a target language
    JsonToCode(JsonToCodeOut),
    /// list the languages known to the active rule set
    Languages(LanguagesOut),
}

#[derive(Args, Debug, Clone)]
struct RuleSettings {
    /// rule document (JSON) to use instead of the bundled one
    #[arg(long, env = "CODESHAPE_RULES")]
    rules: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// One or more inputs. May be literal paths or quoted glob patterns or '-' for stdin
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(clap::Parser, Debug)]
struct CodeToJsonOut {
    #[command(flatten)]
    input_settings: InputSettings,

    #[command(flatten)]
    rule_settings: RuleSettings,

    /// language of the declarations; patterns from every language are tried if omitted
    #[arg(long, short)]
    language: Option<String>,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct JsonToCodeOut {
    #[command(flatten)]
    input_settings: InputSettings,

    #[command(flatten)]
    rule_settings: RuleSettings,

    /// target language key (see `languages`)
    #[arg(long, short)]
    language: String,

    /// top-level type name
    #[arg(long, default_value = "Root")]
    root_type: String,

    /// name the top-level type after each input file instead of --root-type
    #[arg(long, default_value_t = false)]
    root_from_file_stem: bool,

    /// JSON Pointer to select a subnode in each document (e.g. /data/items/0/payload)
    #[arg(long)]
    json_pointer: Option<String>,

    /// JQ pre-process filter for each document.
    #[arg(long)]
    jq_expr: Option<String>,

    /// output source file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct LanguagesOut {
    #[command(flatten)]
    rule_settings: RuleSettings,
}

/// Where one input comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Source {
    Stdin,
    File(PathBuf),
}

/// An input that has been read into memory.
struct Loaded {
    source: Source,
    text: String,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl RuleSettings {
    fn load(&self) -> Result<RuleSet> {
        let rules = match self.rules.as_ref() {
            Some(path) => RuleSet::from_path(path)
                .with_context(|| format!("failed to load rules from {}", path.display()))?,
            None => RuleSet::bundled().context("bundled rule set is invalid")?,
        };
        Ok(rules)
    }
}

impl InputSettings {
    /// Resolve patterns and read every input. Stdin is read at most once.
    fn load(&self) -> Result<Vec<Loaded>> {
        let sources = resolve_file_path_patterns(&self.input)?;
        let mut stdin_text: Option<String> = None;
        let mut loaded = Vec::with_capacity(sources.len());
        for source in sources {
            let text = match &source {
                Source::Stdin => match stdin_text.as_ref() {
                    Some(text) => text.clone(),
                    None => {
                        let text = std::io::read_to_string(std::io::stdin())
                            .context("failed to read stdin")?;
                        stdin_text = Some(text.clone());
                        text
                    }
                },
                Source::File(path) => std::fs::read_to_string(path).map_err(|source| Error::Io {
                    path: path.clone(),
                    source,
                })?,
            };
            loaded.push(Loaded { source, text });
        }
        tracing::debug!(inputs = loaded.len(), "loaded inputs");
        Ok(loaded)
    }
}

impl Source {
    fn label(&self) -> String {
        match self {
            Source::Stdin => "<stdin>".to_string(),
            Source::File(path) => path.display().to_string(),
        }
    }

    fn file_stem(&self) -> Option<&str> {
        match self {
            Source::Stdin => None,
            Source::File(path) => path.file_stem().and_then(|stem| stem.to_str()),
        }
    }
}

impl CodeToJsonOut {
    fn run(&self) -> Result<String> {
        let rules = self.rule_settings.load()?;
        let inputs = self.input_settings.load()?;
        let language = self.language.as_deref();
        if let Some(key) = language {
            if rules.get(key).is_none() {
                tracing::warn!(language = key, "unknown language; using generic patterns");
            }
        }
        let outputs: Vec<String> = inputs
            .par_iter()
            .map(|input| defaults::generate(&input.text, language, Some(&rules)))
            .collect();
        Ok(outputs.join("\n\n"))
    }
}

impl JsonToCodeOut {
    fn root_name_for(&self, source: &Source) -> String {
        match source.file_stem() {
            Some(stem) if self.root_from_file_stem => to_pascal_case(stem),
            _ => self.root_type.clone(),
        }
    }

    fn convert(&self, input: &Loaded, rules: &RuleSet) -> Result<Vec<String>> {
        let label = input.source.label();
        let doc: Value = serde_json::from_str(&input.text)
            .map_err(Error::InvalidJson)
            .with_context(|| format!("failed to parse {label}"))?;
        let docs = preprocess::prepare(doc, self.json_pointer.as_deref(), self.jq_expr.as_deref())
            .with_context(|| format!("failed to preprocess {label}"))?;
        let root_name = self.root_name_for(&input.source);
        docs.iter()
            .map(|doc| {
                codegen::generate_value(doc, &self.language, rules, &root_name)
                    .with_context(|| format!("failed to generate code for {label}"))
            })
            .collect()
    }

    fn run(&self) -> Result<String> {
        let rules = self.rule_settings.load()?;
        if rules.get(&self.language).is_none() {
            return Err(Error::UnknownRule(self.language.clone()).into());
        }
        let inputs = self.input_settings.load()?;
        let outputs = inputs
            .par_iter()
            .map(|input| self.convert(input, &rules))
            .collect::<Result<Vec<_>>>()?;
        Ok(outputs.into_iter().flatten().collect::<Vec<_>>().join("\n\n"))
    }
}

impl LanguagesOut {
    fn run(&self) -> Result<String> {
        let rules = self.rule_settings.load()?;
        list_languages(&rules)
    }
}

/// One line per dialect: padded key, then its label.
fn list_languages(rules: &RuleSet) -> Result<String> {
    if rules.is_empty() {
        bail!("rule set defines no languages");
    }
    tracing::debug!(languages = rules.len(), "listing languages");
    let width = rules.iter().map(|rule| rule.key().len()).max().unwrap_or(0);
    let lines: Vec<String> = rules
        .iter()
        .map(|rule| {
            let key = format!("{:width$}", rule.key());
            match rule.label() {
                Some(label) => format!("{}  {}", key.green().bold(), label.dimmed()),
                None => key.green().bold().to_string(),
            }
        })
        .collect();
    Ok(lines.join("\n"))
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }
    pub fn run(&self) -> Result<()> {
        match &self.cmd {
            Command::CodeToJson(target) => {
                let json_src = target.run()?;
                write_output(target.out.as_deref(), &json_src)
            }
            Command::JsonToCode(target) => {
                let code_src = target.run()?;
                write_output(target.out.as_deref(), &code_src)
            }
            Command::Languages(target) => {
                println!("{}", target.run()?);
                Ok(())
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn write_output(out: Option<&Path>, text: &str) -> Result<()> {
    let Some(out) = out else {
        println!("{text}");
        return Ok(());
    };
    if let Some(parent) = out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(out, text).with_context(|| format!("failed to write {}", out.display()))?;
    tracing::debug!(path = %out.display(), "wrote output");
    Ok(())
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<Source>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<Source>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if pattern == "-" {
            out.push(Source::Stdin);
        } else if has_glob_chars(pattern) {
            let mut matched_any = false;
            let entries =
                glob::glob(pattern).with_context(|| format!("invalid glob pattern: {pattern}"))?;
            for entry in entries {
                out.push(Source::File(entry?));
                matched_any = true;
            }
            if !matched_any {
                bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.push(Source::File(PathBuf::from(pattern)));
        }
    }

    Ok(out)
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
