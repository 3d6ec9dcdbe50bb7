//! deckparse-definitions: the serialized keyword definition format.
//!
//! Provides typed structs for one keyword definition (name or wildcard
//! pattern, action, size, item schema) and the `from_json()` /
//! `from_json_array()` entry points that turn a `serde_json::Value` into
//! validated [`KeywordSpec`] values.
//!
//! The parser core depends on this crate for bulk registration, then
//! converts the shared specs into its own runtime definitions.

pub mod deserialize;
pub mod names;
pub mod types;

pub use deserialize::{from_json, from_json_array, from_str, DefinitionError};
pub use names::{is_valid_name, is_wildcard_name, wildcard_prefix, MAX_NAME_LENGTH};
pub use types::*;
