//! deckparse-core: keyword deck parser core library.
//!
//! Turns a line-oriented, keyword-structured deck (a root file plus any
//! files it INCLUDEs) into a typed in-memory [`Deck`].
//!
//! # Public API
//!
//! Key types are re-exported at the crate root for convenience:
//!
//! - [`parse_file()`], [`parse_str()`], [`parse_with_provider()`] -- run a parse
//! - [`KeywordRegistry`] -- keyword definitions, exact and wildcard lookup
//! - [`KeywordDefinition`], [`Action`], [`SizeRule`], [`ItemSchema`] -- definitions
//! - [`Deck`], [`DeckKeyword`], [`DeckRecord`], [`DeckItem`], [`Warning`] -- output
//! - [`ParseOptions`], [`ParseMode`] -- per-parse configuration
//! - [`DeckError`], [`ErrorCategory`] -- fatal errors
//!
//! The lower-level pieces (tokenizer, raw keywords, size resolution, source
//! providers) are public modules for callers that drive parsing themselves.

pub mod deck;
pub mod error;
pub mod keyword;
pub mod options;
pub mod parser;
pub mod raw;
pub mod registry;
pub mod size;
pub mod source;
pub mod tokenizer;

// ── Convenience re-exports: key types ────────────────────────────────

pub use deck::{Deck, DeckItem, DeckKeyword, DeckRecord, DeckValue, Warning};
pub use error::{DeckError, ErrorCategory};
pub use keyword::{Action, ItemArity, ItemSchema, KeywordDefinition, SizeRule, ValueType};
pub use options::{ParseMode, ParseOptions};
pub use registry::{KeywordRegistry, LoadFailure, LoadReport};
pub use source::{FileSystemProvider, InMemoryProvider, SourceProvider};

// ── Convenience re-exports: entry points ─────────────────────────────

pub use parser::{parse_file, parse_str, parse_with_provider, INCLUDE_KEYWORD};
pub use size::resolve_size;
