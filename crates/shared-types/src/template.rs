//! # Templates
//!
//! A template is the renderable body of a config. Placeholders take the form
//! `{{ .name }}` (whitespace inside the braces is optional) and are replaced
//! with resolved parameter values when the config is deployed.
//!
//! Only simple placeholders are supported. Anything else between `{{` and
//! `}}` is reported as malformed content.

use crate::errors::TemplateError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// A placeholder occurrence inside template content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    /// Parameter name without the leading dot
    pub name: String,
    /// Byte offset of the opening `{{`
    pub start: usize,
    /// Byte offset one past the closing `}}`
    pub end: usize,
}

/// Template id plus body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    /// Local template id (usually the file name the loader read it from)
    pub id: String,
    /// Raw content with placeholders
    pub content: String,
}

impl Template {
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
        }
    }

    /// Parse all placeholders in order of appearance.
    pub fn placeholders(&self) -> Result<Vec<Placeholder>, TemplateError> {
        let mut found = Vec::new();
        let mut cursor = 0;

        while let Some(rel) = self.content[cursor..].find(OPEN) {
            let start = cursor + rel;
            let inner_start = start + OPEN.len();
            let Some(close_rel) = self.content[inner_start..].find(CLOSE) else {
                return Err(TemplateError::Unclosed {
                    template: self.id.clone(),
                    offset: start,
                });
            };
            let inner_end = inner_start + close_rel;
            let name = parse_placeholder(&self.content[inner_start..inner_end]).ok_or_else(
                || TemplateError::InvalidPlaceholder {
                    template: self.id.clone(),
                    placeholder: self.content[start..inner_end + CLOSE.len()].to_string(),
                },
            )?;
            let end = inner_end + CLOSE.len();
            found.push(Placeholder {
                name: name.to_string(),
                start,
                end,
            });
            cursor = end;
        }

        Ok(found)
    }

    /// Check the content is well formed.
    pub fn validate(&self) -> Result<(), TemplateError> {
        self.placeholders().map(|_| ())
    }

    /// Render the content, substituting every placeholder from `values`.
    pub fn render(
        &self,
        values: &BTreeMap<String, serde_json::Value>,
    ) -> Result<String, TemplateError> {
        let placeholders = self.placeholders()?;
        let mut out = String::with_capacity(self.content.len());
        let mut cursor = 0;

        for placeholder in placeholders {
            let value = values
                .get(&placeholder.name)
                .ok_or_else(|| TemplateError::UnknownParameter {
                    template: self.id.clone(),
                    name: placeholder.name.clone(),
                })?;
            out.push_str(&self.content[cursor..placeholder.start]);
            out.push_str(&render_value(value));
            cursor = placeholder.end;
        }
        out.push_str(&self.content[cursor..]);

        Ok(out)
    }

    /// Placeholder token for a parameter name.
    pub fn placeholder_for(name: &str) -> String {
        format!("{{{{ .{} }}}}", name)
    }
}

fn parse_placeholder(inner: &str) -> Option<&str> {
    let name = inner.trim().strip_prefix('.')?.trim();
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    valid.then_some(name)
}

fn render_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => {
            let quoted = serde_json::Value::String(s.clone()).to_string();
            quoted[1..quoted.len() - 1].to_string()
        }
        other => other.to_string(),
    }
}
