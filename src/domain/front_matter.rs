//! Front matter extraction and the typed view the pipeline reads from it.
//!
//! Metadata is kept shape-free as a JSON object so unknown keys survive
//! untouched; only the accessors below interpret values.

use serde_json::{Map, Value};

use super::error::DomainError;

const FENCE: &str = "---";
const CLOSING_FENCES: [&str; 2] = ["---", "..."];

/// Metadata block parsed from the head of a Markdown document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrontMatter {
    fields: Map<String, Value>,
}

/// Raw document split into its metadata and renderable body.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitDocument {
    pub front_matter: FrontMatter,
    pub body: String,
}

/// Split `raw` into front matter and body.
///
/// A document without an opening fence on its first line, or without a
/// closing fence, has no front matter and its whole text is the body.
pub fn split(raw: &str) -> Result<SplitDocument, DomainError> {
    let text = raw.strip_prefix('\u{feff}').unwrap_or(raw);

    let mut lines = text.split_inclusive('\n');
    let Some(first) = lines.next() else {
        return Ok(SplitDocument::without_front_matter(text));
    };
    if trim_line_ending(first) != FENCE {
        return Ok(SplitDocument::without_front_matter(text));
    }

    let block_start = first.len();
    let mut offset = block_start;
    for line in lines {
        let line_start = offset;
        offset += line.len();
        if CLOSING_FENCES.contains(&trim_line_ending(line)) {
            let front_matter = FrontMatter::parse(&text[block_start..line_start])?;
            return Ok(SplitDocument {
                front_matter,
                body: text[offset..].to_string(),
            });
        }
    }

    Ok(SplitDocument::without_front_matter(text))
}

impl SplitDocument {
    fn without_front_matter(text: &str) -> Self {
        Self {
            front_matter: FrontMatter::default(),
            body: text.to_string(),
        }
    }
}

fn trim_line_ending(line: &str) -> &str {
    line.trim_end_matches(['\n', '\r']).trim_end()
}

impl FrontMatter {
    /// Parse a YAML block. Blank blocks and non-mapping roots yield no fields.
    pub fn parse(block: &str) -> Result<Self, DomainError> {
        if block.trim().is_empty() {
            return Ok(Self::default());
        }

        let document: serde_yaml::Value = serde_yaml::from_str(block)
            .map_err(|err| DomainError::front_matter(err.to_string()))?;
        let serde_yaml::Value::Mapping(mapping) = document else {
            return Ok(Self::default());
        };

        Ok(Self {
            fields: json_object(mapping),
        })
    }

    pub fn from_fields(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Textual value of a scalar field. Empty strings, `false`, `null` and
    /// compound values count as absent.
    pub fn text(&self, key: &str) -> Option<String> {
        match self.fields.get(key)? {
            Value::Bool(false) => None,
            value => scalar_text(value).filter(|text| !text.is_empty()),
        }
    }

    /// Boolean-like view of a field; unrecognised shapes are `None`.
    pub fn flag(&self, key: &str) -> Option<bool> {
        self.fields.get(key).and_then(coerce_flag)
    }

    /// Scalar-or-sequence view of a field. `None` only when the key is absent
    /// or `null`, so an explicitly empty list stays distinguishable.
    pub fn list(&self, key: &str) -> Option<Vec<String>> {
        let entries = match self.fields.get(key)? {
            Value::Null | Value::Object(_) => return None,
            Value::Array(items) => items.iter().filter_map(scalar_text).collect::<Vec<_>>(),
            scalar => scalar_text(scalar).into_iter().collect(),
        };

        Some(
            entries
                .into_iter()
                .map(|entry| entry.trim().to_string())
                .filter(|entry| !entry.is_empty())
                .collect(),
        )
    }

    pub fn title(&self) -> Option<String> {
        self.text("title")
    }

    pub fn lang(&self) -> Option<String> {
        self.text("lang")
    }

    pub fn output_name(&self) -> Option<String> {
        self.text("output_name")
    }

    pub fn css(&self) -> Option<Vec<String>> {
        self.list("css")
    }

    /// `draft`/`skip` coercing to true, or `publish` coercing to exactly false.
    pub fn should_skip(&self) -> bool {
        if self.flag("draft") == Some(true) || self.flag("skip") == Some(true) {
            return true;
        }
        self.flag("publish") == Some(false)
    }
}

/// Coerce native booleans, numbers and the usual string tokens.
pub fn coerce_flag(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(flag) => Some(*flag),
        Value::Number(number) => number.as_f64().map(|number| number != 0.0),
        Value::String(text) => match text.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Some(true),
            "false" | "0" | "no" | "off" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

/// Keys that have no scalar text (null, sequences, mappings) are dropped.
fn json_object(mapping: serde_yaml::Mapping) -> Map<String, Value> {
    mapping
        .into_iter()
        .filter_map(|(key, value)| key_text(&key).map(|key| (key, json_value(value))))
        .collect()
}

fn json_value(value: serde_yaml::Value) -> Value {
    match value {
        serde_yaml::Value::Null => Value::Null,
        serde_yaml::Value::Bool(flag) => Value::Bool(flag),
        serde_yaml::Value::Number(number) => {
            if let Some(int) = number.as_i64() {
                Value::from(int)
            } else if let Some(int) = number.as_u64() {
                Value::from(int)
            } else {
                number
                    .as_f64()
                    .and_then(serde_json::Number::from_f64)
                    .map_or(Value::Null, Value::Number)
            }
        }
        serde_yaml::Value::String(text) => Value::String(text),
        serde_yaml::Value::Sequence(items) => {
            Value::Array(items.into_iter().map(json_value).collect())
        }
        serde_yaml::Value::Mapping(mapping) => Value::Object(json_object(mapping)),
        serde_yaml::Value::Tagged(tagged) => json_value(tagged.value),
    }
}

fn key_text(key: &serde_yaml::Value) -> Option<String> {
    match key {
        serde_yaml::Value::String(text) => Some(text.clone()),
        serde_yaml::Value::Number(number) => Some(number.to_string()),
        serde_yaml::Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}
