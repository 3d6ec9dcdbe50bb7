//! The structured parse output handed to downstream interpretation.
//!
//! A [`Deck`] keeps every keyword in completion order across the root file
//! and all included files, plus the warnings raised in lenient handling.

use serde::Serialize;

/// One typed value inside a [`DeckItem`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DeckValue {
    Int(i64),
    Double(f64),
    String(String),
}

impl DeckValue {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            DeckValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Integers widen to doubles.
    pub fn as_double(&self) -> Option<f64> {
        match self {
            DeckValue::Double(v) => Some(*v),
            DeckValue::Int(v) => Some(*v as f64),
            DeckValue::String(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            DeckValue::String(v) => Some(v),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeckItem {
    name: String,
    values: Vec<DeckValue>,
    defaulted: Vec<bool>,
}

impl DeckItem {
    pub fn new(name: impl Into<String>) -> Self {
        DeckItem {
            name: name.into(),
            values: Vec::new(),
            defaulted: Vec::new(),
        }
    }

    pub fn push(&mut self, value: DeckValue) {
        self.values.push(value);
        self.defaulted.push(false);
    }

    pub fn push_default(&mut self, value: DeckValue) {
        self.values.push(value);
        self.defaulted.push(true);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[DeckValue] {
        &self.values
    }

    pub fn value(&self, index: usize) -> Option<&DeckValue> {
        self.values.get(index)
    }

    pub fn get_int(&self, index: usize) -> Option<i64> {
        self.value(index).and_then(DeckValue::as_int)
    }

    pub fn get_double(&self, index: usize) -> Option<f64> {
        self.value(index).and_then(DeckValue::as_double)
    }

    pub fn get_string(&self, index: usize) -> Option<&str> {
        self.value(index).and_then(DeckValue::as_str)
    }

    /// True when the value at `index` came from a default rather than input.
    pub fn is_defaulted(&self, index: usize) -> bool {
        self.defaulted.get(index).copied().unwrap_or(false)
    }
}

/// An ordered, uniquely-named sequence of items.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct DeckRecord {
    items: Vec<DeckItem>,
}

impl DeckRecord {
    pub fn new(items: Vec<DeckItem>) -> Self {
        DeckRecord { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[DeckItem] {
        &self.items
    }

    pub fn item(&self, name: &str) -> Option<&DeckItem> {
        self.items.iter().find(|item| item.name == name)
    }

    pub fn item_at(&self, index: usize) -> Option<&DeckItem> {
        self.items.get(index)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeckKeyword {
    name: String,
    records: Vec<DeckRecord>,
    recognized: bool,
    file: String,
    line: u32,
}

impl DeckKeyword {
    pub fn new(name: &str, records: Vec<DeckRecord>, file: &str, line: u32) -> Self {
        DeckKeyword {
            name: name.to_owned(),
            records,
            recognized: true,
            file: file.to_owned(),
            line,
        }
    }

    /// Placeholder for a keyword the registry could not resolve.
    pub fn unrecognized(name: &str, file: &str, line: u32) -> Self {
        DeckKeyword {
            recognized: false,
            ..DeckKeyword::new(name, Vec::new(), file, line)
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn records(&self) -> &[DeckRecord] {
        &self.records
    }

    pub fn record(&self, index: usize) -> Option<&DeckRecord> {
        self.records.get(index)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn is_recognized(&self) -> bool {
        self.recognized
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn line(&self) -> u32 {
        self.line
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warning {
    pub message: String,
    pub file: String,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Deck {
    keywords: Vec<DeckKeyword>,
    warnings: Vec<Warning>,
}

impl Deck {
    pub fn new() -> Self {
        Deck::default()
    }

    pub fn add_keyword(&mut self, keyword: DeckKeyword) {
        tracing::debug!(
            keyword = %keyword.name,
            records = keyword.records.len(),
            file = %keyword.file,
            line = keyword.line,
            "keyword added to deck"
        );
        self.keywords.push(keyword);
    }

    pub fn add_warning(&mut self, message: impl Into<String>, file: &str, line: u32) {
        let message = message.into();
        tracing::warn!(file, line, "{}", message);
        self.warnings.push(Warning {
            message,
            file: file.to_owned(),
            line,
        });
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    pub fn keywords(&self) -> &[DeckKeyword] {
        &self.keywords
    }

    pub fn iter(&self) -> impl Iterator<Item = &DeckKeyword> {
        self.keywords.iter()
    }

    pub fn keyword_at(&self, index: usize) -> Option<&DeckKeyword> {
        self.keywords.get(index)
    }

    /// The most recent occurrence of `name`.
    pub fn keyword(&self, name: &str) -> Option<&DeckKeyword> {
        self.keywords.iter().rev().find(|kw| kw.name == name)
    }

    pub fn keywords_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a DeckKeyword> {
        self.keywords.iter().filter(move |kw| kw.name == name)
    }

    pub fn has_keyword(&self, name: &str) -> bool {
        self.keywords.iter().any(|kw| kw.name == name)
    }

    pub fn count(&self, name: &str) -> usize {
        self.keywords_named(name).count()
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }
}
