//! Runtime keyword definitions and materialization of raw keywords into
//! typed deck keywords.

use crate::deck::{DeckItem, DeckKeyword, DeckRecord, DeckValue};
use crate::error::DeckError;
use crate::raw::{RawKeyword, RawRecord};
use crate::tokenizer::Token;
use deckparse_definitions::{
    is_wildcard_name, wildcard_prefix, ActionSpec, DefinitionError, ItemSizeSpec, ItemSpec,
    KeywordSpec, OpenSize, SizeSpec, ValueTypeSpec,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Internalize,
    IgnoreWithWarning,
    ThrowFatal,
    IgnoreSilently,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SizeRule {
    Fixed(usize),
    SlashTerminated,
    Unknown,
    /// Record count read from an integer item of an earlier keyword.
    DynamicFromItem { keyword: String, item: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Int,
    Double,
    String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemArity {
    Single,
    /// Every remaining token of the record.
    All,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ItemSchema {
    pub name: String,
    pub value_type: ValueType,
    pub arity: ItemArity,
    pub default: Option<DeckValue>,
}

impl ItemSchema {
    pub fn single(name: &str, value_type: ValueType) -> Self {
        ItemSchema {
            name: name.to_owned(),
            value_type,
            arity: ItemArity::Single,
            default: None,
        }
    }

    pub fn all(name: &str, value_type: ValueType) -> Self {
        ItemSchema {
            arity: ItemArity::All,
            ..ItemSchema::single(name, value_type)
        }
    }

    pub fn with_default(mut self, default: DeckValue) -> Self {
        self.default = Some(default);
        self
    }

    fn default_value(&self) -> DeckValue {
        match &self.default {
            Some(value) => value.clone(),
            None => match self.value_type {
                ValueType::Int => DeckValue::Int(0),
                ValueType::Double => DeckValue::Double(0.0),
                ValueType::String => DeckValue::String(String::new()),
            },
        }
    }

    fn parse_token(&self, text: &str) -> Option<DeckValue> {
        match self.value_type {
            ValueType::Int => text.parse::<i64>().ok().map(DeckValue::Int),
            // Fortran-style exponents (1.0D+3) are common in decks
            ValueType::Double => text
                .replace(['D', 'd'], "E")
                .parse::<f64>()
                .ok()
                .map(DeckValue::Double),
            ValueType::String => Some(DeckValue::String(text.to_owned())),
        }
    }
}

/// An immutable keyword definition held by the registry.
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordDefinition {
    name: String,
    action: Action,
    size: SizeRule,
    table_collection: bool,
    items: Vec<ItemSchema>,
}

impl KeywordDefinition {
    pub fn new(name: &str, size: SizeRule) -> Self {
        KeywordDefinition {
            name: name.to_owned(),
            action: Action::Internalize,
            size,
            table_collection: false,
            items: Vec::new(),
        }
    }

    pub fn with_action(mut self, action: Action) -> Self {
        self.action = action;
        self
    }

    pub fn with_item(mut self, item: ItemSchema) -> Self {
        self.items.push(item);
        self
    }

    pub fn table_collection(mut self) -> Self {
        self.table_collection = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn action(&self) -> Action {
        self.action
    }

    pub fn size(&self) -> &SizeRule {
        &self.size
    }

    pub fn is_table_collection(&self) -> bool {
        self.table_collection
    }

    pub fn items(&self) -> &[ItemSchema] {
        &self.items
    }

    pub fn is_wildcard(&self) -> bool {
        is_wildcard_name(&self.name)
    }

    /// Whether `name` is this keyword, or matches it as a wildcard pattern.
    pub fn matches(&self, name: &str) -> bool {
        match wildcard_prefix(&self.name) {
            Some(prefix) => name.starts_with(prefix),
            None => self.name == name,
        }
    }

    /// Type every record of `raw` against the item schema.
    pub fn materialize(&self, raw: &RawKeyword) -> Result<DeckKeyword, DeckError> {
        let records = raw
            .records()
            .iter()
            .enumerate()
            .map(|(index, record)| self.materialize_record(raw, index, record))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(DeckKeyword::new(raw.name(), records, raw.file(), raw.line()))
    }

    fn materialize_record(
        &self,
        raw: &RawKeyword,
        record_index: usize,
        record: &RawRecord,
    ) -> Result<DeckRecord, DeckError> {
        let mut tokens = record.tokens().iter();
        let mut items = Vec::with_capacity(self.items.len());

        for (item_index, schema) in self.items.iter().enumerate() {
            let mut item = DeckItem::new(&schema.name);
            match schema.arity {
                ItemArity::Single => match tokens.next() {
                    Some(token) => {
                        push_token(&mut item, schema, token).map_err(|text| {
                            type_error(raw, record, record_index, item_index, schema, &text)
                        })?;
                    }
                    None => item.push_default(schema.default_value()),
                },
                ItemArity::All => {
                    for token in tokens.by_ref() {
                        push_token(&mut item, schema, token).map_err(|text| {
                            type_error(raw, record, record_index, item_index, schema, &text)
                        })?;
                    }
                    if item.is_empty() {
                        item.push_default(schema.default_value());
                    }
                }
            }
            items.push(item);
        }

        let surplus = tokens.count();
        if surplus > 0 {
            return Err(DeckError::data(
                raw.name(),
                raw.file(),
                record.line(),
                format!(
                    "record {} has {} tokens, schema holds {} items",
                    record_index,
                    record.len(),
                    self.items.len()
                ),
            ));
        }

        Ok(DeckRecord::new(items))
    }
}

fn push_token(item: &mut DeckItem, schema: &ItemSchema, token: &Token) -> Result<(), String> {
    match token {
        Token::Default => {
            item.push_default(schema.default_value());
            Ok(())
        }
        Token::Value(text) => {
            let value = schema.parse_token(text).ok_or_else(|| text.clone())?;
            item.push(value);
            Ok(())
        }
    }
}

fn type_error(
    raw: &RawKeyword,
    record: &RawRecord,
    record_index: usize,
    item_index: usize,
    schema: &ItemSchema,
    text: &str,
) -> DeckError {
    DeckError::data(
        raw.name(),
        raw.file(),
        record.line(),
        format!(
            "record {} item {} ('{}'): cannot read '{}' as {:?}",
            record_index, item_index, schema.name, text, schema.value_type
        ),
    )
}

// ── Conversion from the serialized definition format ────────────────

impl TryFrom<KeywordSpec> for KeywordDefinition {
    type Error = DefinitionError;

    fn try_from(spec: KeywordSpec) -> Result<Self, Self::Error> {
        let action = match spec.action {
            ActionSpec::Internalize => Action::Internalize,
            ActionSpec::IgnoreWarning => Action::IgnoreWithWarning,
            ActionSpec::ThrowException => Action::ThrowFatal,
            ActionSpec::Ignore => Action::IgnoreSilently,
        };
        let size = match spec.size {
            SizeSpec::Fixed(n) => SizeRule::Fixed(n),
            SizeSpec::Open(OpenSize::SlashTerminated) => SizeRule::SlashTerminated,
            SizeSpec::Open(OpenSize::Unknown) => SizeRule::Unknown,
            SizeSpec::FromItem { keyword, item } => SizeRule::DynamicFromItem { keyword, item },
        };
        let items = spec
            .items
            .into_iter()
            .map(|item| item_schema(&spec.name, item))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(KeywordDefinition {
            name: spec.name,
            action,
            size,
            table_collection: spec.table_collection,
            items,
        })
    }
}

fn item_schema(keyword: &str, spec: ItemSpec) -> Result<ItemSchema, DefinitionError> {
    let value_type = match spec.value_type {
        ValueTypeSpec::Int => ValueType::Int,
        ValueTypeSpec::Double => ValueType::Double,
        ValueTypeSpec::String => ValueType::String,
    };
    let arity = match spec.size_type {
        ItemSizeSpec::Single => ItemArity::Single,
        ItemSizeSpec::All => ItemArity::All,
    };
    let default = match &spec.default {
        None => None,
        Some(value) => Some(default_value(value_type, value).ok_or_else(|| {
            DefinitionError::Invalid {
                name: keyword.to_owned(),
                message: format!("default for item '{}' does not match its type", spec.name),
            }
        })?),
    };
    Ok(ItemSchema {
        name: spec.name,
        value_type,
        arity,
        default,
    })
}

fn default_value(value_type: ValueType, value: &serde_json::Value) -> Option<DeckValue> {
    match value_type {
        ValueType::Int => value.as_i64().map(DeckValue::Int),
        ValueType::Double => value.as_f64().map(DeckValue::Double),
        ValueType::String => value.as_str().map(|s| DeckValue::String(s.to_owned())),
    }
}
