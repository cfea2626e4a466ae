//! Front-matter extraction

use anyhow::{anyhow, Result};
use lazy_static::lazy_static;
use regex::Regex;

use crate::data::{Mapping, Value};

lazy_static! {
    /// `---` (or `= yaml =`) fence at the very top, closed by `---` or `...`
    static ref YAML_BLOCK: Regex = Regex::new(
        r"(?s)\A\x{FEFF}?(?:---|= yaml =)[ \t]*\r?\n((?:.*?\r?\n)?)(?:---|\.\.\.)[ \t]*(?:\r?\n|\z)"
    )
    .expect("front-matter pattern is valid");
}

/// Splits raw file content into metadata and body
pub trait FrontMatterExtractor: Send + Sync {
    /// Returns `(front_matter, body)`; content without a block yields an
    /// empty mapping and the content unchanged
    fn extract<'a>(&self, content: &'a str) -> Result<(Mapping, &'a str)>;
}

/// YAML front-matter delimited by `---` lines
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlFrontMatter;

impl FrontMatterExtractor for YamlFrontMatter {
    fn extract<'a>(&self, content: &'a str) -> Result<(Mapping, &'a str)> {
        let Some(caps) = YAML_BLOCK.captures(content) else {
            return Ok((Mapping::new(), content));
        };

        let block_end = caps.get(0).map(|m| m.end()).unwrap_or(0);
        let body = &content[block_end..];
        let yaml = caps.get(1).map(|m| m.as_str()).unwrap_or("");

        if yaml.trim().is_empty() {
            return Ok((Mapping::new(), body));
        }

        match serde_yaml::from_str::<Value>(yaml)? {
            Value::Object(map) => Ok((map, body)),
            Value::Null => Ok((Mapping::new(), body)),
            other => Err(anyhow!(
                "front-matter must be a mapping, found {}",
                kind_of(&other)
            )),
        }
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a mapping",
    }
}
