//! # Error Types
//!
//! Errors shared across subsystems.

use thiserror::Error;

/// Malformed or unrenderable template content.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    /// `{{` without a matching `}}`.
    #[error("template {template}: unclosed placeholder at offset {offset}")]
    Unclosed { template: String, offset: usize },

    /// Anything other than `{{ .name }}` between the delimiters.
    #[error("template {template}: unsupported placeholder {placeholder}")]
    InvalidPlaceholder {
        template: String,
        placeholder: String,
    },

    /// Placeholder without a resolved value.
    #[error("template {template}: no value for placeholder .{name}")]
    UnknownParameter { template: String, name: String },
}
