//! Typed structs for serialized keyword definitions.
//!
//! One JSON object describes one keyword:
//!
//! ```json
//! { "name": "EQUIL",
//!   "action": "INTERNALIZE",
//!   "size": { "keyword": "EQLDIMS", "item": "NTEQUL" },
//!   "items": [ { "name": "DATUM_DEPTH", "value_type": "DOUBLE" } ] }
//! ```

use serde::{Deserialize, Serialize};

/// What the parser does with a completed occurrence of the keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionSpec {
    #[default]
    Internalize,
    IgnoreWarning,
    ThrowException,
    Ignore,
}

/// Open-ended record counts spelled as strings in the `size` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OpenSize {
    SlashTerminated,
    Unknown,
}

/// The `size` field: a record count, an open-ended marker, or a reference
/// to an item of an earlier keyword holding the count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SizeSpec {
    Fixed(usize),
    Open(OpenSize),
    FromItem { keyword: String, item: String },
}

impl Default for SizeSpec {
    fn default() -> Self {
        SizeSpec::Open(OpenSize::SlashTerminated)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValueTypeSpec {
    Int,
    Double,
    String,
}

/// `SINGLE` items take one token; an `ALL` item takes every remaining
/// token of the record and must be the last item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemSizeSpec {
    #[default]
    Single,
    All,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemSpec {
    pub name: String,
    pub value_type: ValueTypeSpec,
    #[serde(default)]
    pub size_type: ItemSizeSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordSpec {
    pub name: String,
    #[serde(default)]
    pub action: ActionSpec,
    #[serde(default)]
    pub size: SizeSpec,
    #[serde(default)]
    pub items: Vec<ItemSpec>,
    #[serde(default)]
    pub table_collection: bool,
}
