//! Deserialization of keyword definitions from JSON.
//!
//! [`from_json`] reads a single definition object, [`from_json_array`] a
//! whole definition set. Both validate shape beyond what serde checks:
//! name syntax, unique item names, `ALL` placement, default value types.

use crate::names::{is_valid_name, is_wildcard_name};
use crate::types::*;
use serde::Deserialize;
use std::collections::HashSet;

/// Errors while reading keyword definitions.
#[derive(Debug, thiserror::Error)]
pub enum DefinitionError {
    #[error("malformed keyword definition: {0}")]
    Json(#[from] serde_json::Error),

    #[error("keyword definition set must be a JSON array")]
    NotAnArray,

    #[error("invalid keyword definition '{name}': {message}")]
    Invalid { name: String, message: String },
}

impl DefinitionError {
    fn invalid(name: &str, message: impl Into<String>) -> Self {
        DefinitionError::Invalid {
            name: name.to_owned(),
            message: message.into(),
        }
    }
}

/// Deserialize and validate one keyword definition object.
pub fn from_json(value: &serde_json::Value) -> Result<KeywordSpec, DefinitionError> {
    let spec = KeywordSpec::deserialize(value)?;
    validate(&spec)?;
    Ok(spec)
}

/// Deserialize and validate a definition set. Any malformed entry fails the
/// whole set.
pub fn from_json_array(value: &serde_json::Value) -> Result<Vec<KeywordSpec>, DefinitionError> {
    let entries = value.as_array().ok_or(DefinitionError::NotAnArray)?;
    entries.iter().map(from_json).collect()
}

/// Parse a definition object from JSON text.
pub fn from_str(src: &str) -> Result<KeywordSpec, DefinitionError> {
    let value: serde_json::Value = serde_json::from_str(src)?;
    from_json(&value)
}

fn validate(spec: &KeywordSpec) -> Result<(), DefinitionError> {
    let name = spec.name.as_str();
    if !is_valid_name(name) && !is_wildcard_name(name) {
        return Err(DefinitionError::invalid(
            name,
            "name must be 1-8 uppercase characters, optionally ending in '*'",
        ));
    }

    if let SizeSpec::FromItem { keyword, item } = &spec.size {
        if !is_valid_name(keyword) {
            return Err(DefinitionError::invalid(
                name,
                format!("size keyword '{}' is not a valid keyword name", keyword),
            ));
        }
        if item.is_empty() {
            return Err(DefinitionError::invalid(name, "size item name is empty"));
        }
    }

    let mut seen = HashSet::new();
    for (index, item) in spec.items.iter().enumerate() {
        if item.name.is_empty() {
            return Err(DefinitionError::invalid(
                name,
                format!("item {} has an empty name", index),
            ));
        }
        if !seen.insert(item.name.as_str()) {
            return Err(DefinitionError::invalid(
                name,
                format!("duplicate item name '{}'", item.name),
            ));
        }
        if item.size_type == ItemSizeSpec::All && index + 1 != spec.items.len() {
            return Err(DefinitionError::invalid(
                name,
                format!("item '{}' takes ALL tokens but is not the last item", item.name),
            ));
        }
        if let Some(default) = &item.default {
            if !default_matches(item.value_type, default) {
                return Err(DefinitionError::invalid(
                    name,
                    format!(
                        "default for item '{}' does not match its {:?} type",
                        item.name, item.value_type
                    ),
                ));
            }
        }
    }
    Ok(())
}

fn default_matches(value_type: ValueTypeSpec, default: &serde_json::Value) -> bool {
    match value_type {
        ValueTypeSpec::Int => default.is_i64(),
        ValueTypeSpec::Double => default.is_number(),
        ValueTypeSpec::String => default.is_string(),
    }
}
