//! The parse driver: streams deck files line by line, builds raw keywords,
//! dispatches them through the registry, and expands INCLUDE directives.
//!
//! Every open file has a `ParseState`. Included files push a new state on
//! an explicit stack that shares the root directory and the target deck;
//! control returns to the includer once the included file is exhausted.
//!
//! About INCLUDE: the path of an included file is always resolved against
//! the directory of the root deck file, never against the directory of the
//! file issuing the INCLUDE, however deep the nesting.

use crate::deck::{Deck, DeckKeyword};
use crate::error::DeckError;
use crate::keyword::{Action, KeywordDefinition};
use crate::options::ParseOptions;
use crate::raw::{RawKeyword, RawSize};
use crate::registry::KeywordRegistry;
use crate::size::resolve_size;
use crate::source::{FileSystemProvider, InMemoryProvider, SourceProvider};
use crate::tokenizer::{classify, keyword_candidate, tokenize, trim_line, LineKind, Token};
use std::io::BufRead;
use std::path::{Path, PathBuf};

/// Reserved directive, handled by the driver whether or not it is registered.
pub const INCLUDE_KEYWORD: &str = "INCLUDE";

/// File name used for decks parsed from a string.
pub const INLINE_DECK_NAME: &str = "DECK.DATA";

/// Parse the deck rooted at `path` and every file it includes.
///
/// Uses the default [`FileSystemProvider`] for file access.
pub fn parse_file(
    path: &Path,
    registry: &KeywordRegistry,
    options: &ParseOptions,
) -> Result<Deck, DeckError> {
    parse_with_provider(path, registry, options, &FileSystemProvider)
}

/// Parse deck text held in memory. INCLUDE directives in `text` resolve
/// against an empty in-memory directory and therefore fail.
pub fn parse_str(
    text: &str,
    registry: &KeywordRegistry,
    options: &ParseOptions,
) -> Result<Deck, DeckError> {
    let provider = InMemoryProvider::default().with_file(INLINE_DECK_NAME, text);
    parse_with_provider(Path::new(INLINE_DECK_NAME), registry, options, &provider)
}

/// Parse the deck rooted at `path` using the given [`SourceProvider`].
pub fn parse_with_provider(
    path: &Path,
    registry: &KeywordRegistry,
    options: &ParseOptions,
    provider: &dyn SourceProvider,
) -> Result<Deck, DeckError> {
    let root = provider
        .canonicalize(path)
        .map_err(|e| DeckError::file_system(path, e))?;
    let root_dir = root.parent().unwrap_or(Path::new("")).to_owned();
    let ctx = Context {
        registry,
        options,
        provider,
        root_dir: &root_dir,
    };

    tracing::info!(file = %root.display(), mode = ?options.mode, "parsing deck");

    let mut deck = Deck::new();
    let mut stack = vec![ParseState::open(root, provider)?];

    while let Some(state) = stack.last_mut() {
        match state.step(&ctx, &mut deck)? {
            Step::Continue => {}
            Step::Done => {
                stack.pop();
            }
            Step::Include { path, file, line } => {
                let child = open_include(&ctx, &stack, &path, &file, line)?;
                stack.push(child);
            }
        }
    }

    tracing::info!(
        keywords = deck.len(),
        warnings = deck.warnings().len(),
        "finished parsing deck"
    );
    Ok(deck)
}

struct Context<'a> {
    registry: &'a KeywordRegistry,
    options: &'a ParseOptions,
    provider: &'a dyn SourceProvider,
    root_dir: &'a Path,
}

fn open_include<'a>(
    ctx: &Context<'a>,
    stack: &[ParseState<'a>],
    include: &str,
    file: &str,
    line: u32,
) -> Result<ParseState<'a>, DeckError> {
    let depth = stack.len();
    if depth > ctx.options.max_include_depth {
        return Err(DeckError::include(
            file,
            line,
            format!(
                "include depth limit of {} exceeded by '{}'",
                ctx.options.max_include_depth, include
            ),
        ));
    }

    let resolved = ctx.provider.resolve_include(ctx.root_dir, include);
    let canon = ctx
        .provider
        .canonicalize(&resolved)
        .map_err(|e| DeckError::source_access(file, line, &resolved, e))?;

    if stack.iter().any(|state| state.path == canon) {
        let chain: Vec<String> = stack
            .iter()
            .map(|state| display_name(&state.path))
            .chain(std::iter::once(display_name(&canon)))
            .collect();
        return Err(DeckError::include(
            file,
            line,
            format!("include cycle detected: {}", chain.join(" \u{2192} ")),
        ));
    }

    tracing::info!(file = %canon.display(), depth, "opening included file");
    let reader = ctx
        .provider
        .open(&canon)
        .map_err(|e| DeckError::source_access(file, line, &canon, e))?;
    Ok(ParseState::new(canon, reader))
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string()
}

// ──────────────────────────────────────────────
// Per-file state
// ──────────────────────────────────────────────

enum Step {
    Continue,
    /// The file is exhausted; pop its state.
    Done,
    Include {
        path: String,
        file: String,
        line: u32,
    },
}

enum BuilderState<'a> {
    AwaitingKeywordStart,
    AccumulatingRecords {
        raw: RawKeyword,
        definition: Option<&'a KeywordDefinition>,
    },
}

struct ParseState<'a> {
    path: PathBuf,
    file: String,
    reader: Box<dyn BufRead>,
    buf: Vec<u8>,
    line_no: u32,
    /// A keyword-start line read while closing an unknown-sized keyword.
    lookahead: Option<(String, u32)>,
    builder: BuilderState<'a>,
    last_keyword: Option<String>,
}

impl<'a> ParseState<'a> {
    fn open(path: PathBuf, provider: &dyn SourceProvider) -> Result<Self, DeckError> {
        let reader = provider
            .open(&path)
            .map_err(|e| DeckError::file_system(&path, e))?;
        Ok(ParseState::new(path, reader))
    }

    fn new(path: PathBuf, reader: Box<dyn BufRead>) -> Self {
        ParseState {
            file: path.display().to_string(),
            path,
            reader,
            buf: Vec::new(),
            line_no: 0,
            lookahead: None,
            builder: BuilderState::AwaitingKeywordStart,
            last_keyword: None,
        }
    }

    fn next_line(&mut self) -> Result<Option<(String, u32)>, DeckError> {
        if let Some(line) = self.lookahead.take() {
            return Ok(Some(line));
        }
        // Decks are not guaranteed to be UTF-8 (Latin-1 comments are common);
        // undecodable bytes become U+FFFD instead of failing the read.
        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => Ok(None),
            Ok(_) => {
                self.line_no += 1;
                if self.buf.last() == Some(&b'\n') {
                    self.buf.pop();
                }
                let text = String::from_utf8_lossy(&self.buf).into_owned();
                Ok(Some((text, self.line_no)))
            }
            Err(e) => Err(DeckError::source_access(
                &self.file,
                self.line_no + 1,
                &self.path,
                e,
            )),
        }
    }

    fn step(&mut self, ctx: &Context<'a>, deck: &mut Deck) -> Result<Step, DeckError> {
        let Some((text, line_no)) = self.next_line()? else {
            return self.finish(ctx, deck);
        };

        match std::mem::replace(&mut self.builder, BuilderState::AwaitingKeywordStart) {
            BuilderState::AwaitingKeywordStart => match classify(trim_line(&text)) {
                LineKind::Blank | LineKind::Comment => Ok(Step::Continue),
                LineKind::KeywordStart(name) => self.start_keyword(name, line_no, ctx, deck),
                LineKind::Data => self.stray_data(line_no, ctx, deck),
            },
            BuilderState::AccumulatingRecords { raw, definition } => {
                self.accumulate(raw, definition, text, line_no, ctx, deck)
            }
        }
    }

    fn start_keyword(
        &mut self,
        name: &str,
        line_no: u32,
        ctx: &Context<'a>,
        deck: &mut Deck,
    ) -> Result<Step, DeckError> {
        let (raw, definition) = if name == INCLUDE_KEYWORD {
            (
                RawKeyword::new(name, &self.file, line_no, RawSize::Fixed(1)),
                None,
            )
        } else {
            match ctx.registry.resolve(name) {
                Some(def) => {
                    if def.action() == Action::ThrowFatal {
                        return Err(DeckError::FatalKeyword {
                            keyword: name.to_owned(),
                            file: self.file.clone(),
                            line: line_no,
                        });
                    }
                    let size = resolve_size(def, deck, &self.file, line_no)?;
                    (RawKeyword::new(name, &self.file, line_no, size), Some(def))
                }
                None if ctx.options.is_strict() => {
                    return Err(DeckError::StrictModeViolation {
                        keyword: name.to_owned(),
                        file: self.file.clone(),
                        line: line_no,
                    });
                }
                None => (RawKeyword::unrecognized(name, &self.file, line_no), None),
            }
        };

        self.last_keyword = Some(name.to_owned());
        if raw.is_finished() {
            return self.complete(raw, definition, deck);
        }
        self.builder = BuilderState::AccumulatingRecords { raw, definition };
        Ok(Step::Continue)
    }

    fn accumulate(
        &mut self,
        mut raw: RawKeyword,
        definition: Option<&'a KeywordDefinition>,
        text: String,
        line_no: u32,
        ctx: &Context<'a>,
        deck: &mut Deck,
    ) -> Result<Step, DeckError> {
        // Unknown-sized keywords end where the next keyword starts; that line
        // is stashed and read again as the seed of the next keyword.
        let ends_keyword = raw.size() == RawSize::Unknown
            && keyword_candidate(trim_line(&text)).is_some_and(|next| {
                !raw.is_recognized() || next == INCLUDE_KEYWORD || ctx.registry.can_parse(next)
            });
        if ends_keyword {
            raw.close();
            self.lookahead = Some((text, line_no));
            return self.complete(raw, definition, deck);
        }

        let line = trim_line(&text);
        let is_data = !matches!(classify(line), LineKind::Blank | LineKind::Comment);
        // Placeholder records are discarded, so their data is not tokenized.
        if is_data && raw.is_recognized() {
            let tokens = tokenize(line)
                .map_err(|e| DeckError::data(raw.name(), &self.file, line_no, e.to_string()))?;
            raw.add_line(tokens, line_no);
            if raw.is_finished() {
                return self.complete(raw, definition, deck);
            }
        }

        self.builder = BuilderState::AccumulatingRecords { raw, definition };
        Ok(Step::Continue)
    }

    /// Data outside any keyword: surplus records of a fixed-size keyword or
    /// text before the first keyword.
    fn stray_data(
        &mut self,
        line_no: u32,
        ctx: &Context<'a>,
        deck: &mut Deck,
    ) -> Result<Step, DeckError> {
        let after = self.last_keyword.as_deref().unwrap_or("<none>");
        if ctx.options.is_strict() {
            return Err(DeckError::data(
                after,
                &self.file,
                line_no,
                "unexpected data line outside of any keyword",
            ));
        }
        deck.add_warning(
            format!("Unexpected data line after keyword {} is ignored", after),
            &self.file,
            line_no,
        );
        Ok(Step::Continue)
    }

    /// End of file: close any keyword still accumulating.
    fn finish(&mut self, ctx: &Context<'a>, deck: &mut Deck) -> Result<Step, DeckError> {
        let (mut raw, definition) =
            match std::mem::replace(&mut self.builder, BuilderState::AwaitingKeywordStart) {
                BuilderState::AwaitingKeywordStart => {
                    tracing::debug!(file = %self.file, lines = self.line_no, "finished file");
                    return Ok(Step::Done);
                }
                BuilderState::AccumulatingRecords { raw, definition } => (raw, definition),
            };

        // A last record missing only its '/' still counts.
        raw.close();
        if let RawSize::Fixed(target) = raw.size() {
            let read = raw.records().len();
            if read < target {
                let message =
                    format!("reached end of file after {} of {} records", read, target);
                if ctx.options.is_strict() {
                    return Err(DeckError::data(raw.name(), raw.file(), raw.line(), message));
                }
                deck.add_warning(
                    format!("Keyword {} {}", raw.name(), message),
                    raw.file(),
                    raw.line(),
                );
            }
        }

        self.complete(raw, definition, deck)
    }

    /// Apply the outcome of a finished raw keyword.
    fn complete(
        &mut self,
        raw: RawKeyword,
        definition: Option<&KeywordDefinition>,
        deck: &mut Deck,
    ) -> Result<Step, DeckError> {
        tracing::debug!(
            keyword = raw.name(),
            records = raw.records().len(),
            line = raw.line(),
            "keyword complete"
        );

        if raw.name() == INCLUDE_KEYWORD && definition.is_none() && raw.is_recognized() {
            let path = raw
                .record(0)
                .and_then(|record| record.tokens().first())
                .and_then(|token| match token {
                    Token::Value(path) => Some(path.clone()),
                    Token::Default => None,
                })
                .ok_or_else(|| {
                    DeckError::include(raw.file(), raw.line(), "INCLUDE requires a file path")
                })?;
            return Ok(Step::Include {
                path,
                file: raw.file().to_owned(),
                line: raw.line(),
            });
        }

        let Some(def) = definition else {
            deck.add_keyword(DeckKeyword::unrecognized(raw.name(), raw.file(), raw.line()));
            deck.add_warning(
                format!("The keyword {} is not recognized", raw.name()),
                raw.file(),
                raw.line(),
            );
            return Ok(Step::Continue);
        };

        match def.action() {
            Action::Internalize => deck.add_keyword(def.materialize(&raw)?),
            Action::IgnoreWithWarning => deck.add_warning(
                format!(
                    "The keyword {} is ignored - this might potentially affect the results",
                    raw.name()
                ),
                raw.file(),
                raw.line(),
            ),
            Action::ThrowFatal => {
                return Err(DeckError::FatalKeyword {
                    keyword: raw.name().to_owned(),
                    file: raw.file().to_owned(),
                    line: raw.line(),
                })
            }
            Action::IgnoreSilently => {
                tracing::debug!(keyword = raw.name(), "keyword silently ignored")
            }
        }
        Ok(Step::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;
    use crate::keyword::{ItemSchema, SizeRule, ValueType};

    fn registry() -> KeywordRegistry {
        let mut registry = KeywordRegistry::new();
        registry.register(
            KeywordDefinition::new("DIMENS", SizeRule::Fixed(1))
                .with_item(ItemSchema::single("NX", ValueType::Int))
                .with_item(ItemSchema::single("NY", ValueType::Int))
                .with_item(ItemSchema::single("NZ", ValueType::Int)),
        );
        registry.register(
            KeywordDefinition::new("TITLE", SizeRule::Fixed(1))
                .with_item(ItemSchema::all("TITLE", ValueType::String)),
        );
        registry.register(KeywordDefinition::new("RUNSPEC", SizeRule::Fixed(0)));
        registry.register(
            KeywordDefinition::new("WELSPECS", SizeRule::SlashTerminated)
                .with_item(ItemSchema::single("WELL", ValueType::String))
                .with_item(ItemSchema::single("GROUP", ValueType::String)),
        );
        registry.register(
            KeywordDefinition::new("VFPPROD", SizeRule::Unknown)
                .with_item(ItemSchema::all("DATA", ValueType::Double)),
        );
        registry
    }

    fn names(deck: &Deck) -> Vec<&str> {
        deck.iter().map(DeckKeyword::name).collect()
    }

    #[test]
    fn end_to_end_two_fixed_keywords() {
        let deck = parse_str(
            "DIMENS\n 1 1 1 /\nTITLE\n 'TEST' /\n",
            &registry(),
            &ParseOptions::strict(),
        )
        .unwrap();
        assert_eq!(names(&deck), vec!["DIMENS", "TITLE"]);
        assert_eq!(deck.keyword("DIMENS").unwrap().len(), 1);
        assert_eq!(deck.keyword("TITLE").unwrap().len(), 1);
        assert_eq!(
            deck.keyword("TITLE").unwrap().record(0).unwrap().item("TITLE").unwrap().get_string(0),
            Some("TEST")
        );
        assert!(deck.warnings().is_empty());
    }

    #[test]
    fn keyword_order_follows_text() {
        let src = "RUNSPEC\n-- comment\n\nTITLE\n'A' /\nDIMENS\n2 2 2 /\nRUNSPEC\n";
        let deck = parse_str(src, &registry(), &ParseOptions::strict()).unwrap();
        assert_eq!(names(&deck), vec!["RUNSPEC", "TITLE", "DIMENS", "RUNSPEC"]);
        assert_eq!(deck.keyword_at(2).unwrap().line(), 6);
    }

    #[test]
    fn carriage_returns_are_trimmed() {
        let deck = parse_str(
            "DIMENS\r\n 1 2 3 /\r\n",
            &registry(),
            &ParseOptions::strict(),
        )
        .unwrap();
        assert_eq!(names(&deck), vec!["DIMENS"]);
    }

    #[test]
    fn slash_terminated_with_zero_records() {
        let deck = parse_str("WELSPECS\n/\n", &registry(), &ParseOptions::strict()).unwrap();
        assert_eq!(deck.keyword("WELSPECS").unwrap().len(), 0);
    }

    #[test]
    fn slash_terminated_runs_to_eof_without_terminator() {
        let deck = parse_str(
            "WELSPECS\n'W1' 'G1' /\n'W2' 'G1' /\n",
            &registry(),
            &ParseOptions::strict(),
        )
        .unwrap();
        assert_eq!(deck.keyword("WELSPECS").unwrap().len(), 2);
    }

    #[test]
    fn unknown_size_ends_at_next_registered_keyword() {
        let src = "VFPPROD\n1 2 3 /\n4 5 /\nDIMENS\n1 1 1 /\n";
        let deck = parse_str(src, &registry(), &ParseOptions::strict()).unwrap();
        assert_eq!(names(&deck), vec!["VFPPROD", "DIMENS"]);
        assert_eq!(deck.keyword("VFPPROD").unwrap().len(), 2);
        // the lookahead line is consumed exactly once, at its own line number
        assert_eq!(deck.keyword("DIMENS").unwrap().line(), 4);
    }

    #[test]
    fn unknown_size_ends_at_eof() {
        let deck = parse_str("VFPPROD\n1 2 /\n3 4\n", &registry(), &ParseOptions::strict()).unwrap();
        assert_eq!(deck.keyword("VFPPROD").unwrap().len(), 2);
    }

    #[test]
    fn unrecognized_keyword_strict_vs_lenient() {
        let src = "FOOBAR\n 1 2 /\nDIMENS\n1 1 1 /\n";

        let err = parse_str(src, &registry(), &ParseOptions::strict()).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::StrictModeViolation);
        assert_eq!(err.location(), Some((INLINE_DECK_NAME, 1)));

        let deck = parse_str(src, &registry(), &ParseOptions::lenient()).unwrap();
        assert_eq!(names(&deck), vec!["FOOBAR", "DIMENS"]);
        assert!(!deck.keyword("FOOBAR").unwrap().is_recognized());
        assert_eq!(deck.warnings().len(), 1);
        assert!(deck.warnings()[0].message.contains("FOOBAR"));
    }

    #[test]
    fn fixed_keyword_short_at_eof() {
        let mut registry = registry();
        registry.register(
            KeywordDefinition::new("PAIR", SizeRule::Fixed(2))
                .with_item(ItemSchema::single("V", ValueType::Int)),
        );
        let src = "PAIR\n1 /\n";

        let err = parse_str(src, &registry, &ParseOptions::strict()).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::DataError);
        assert!(err.to_string().contains("1 of 2 records"), "{}", err);

        let deck = parse_str(src, &registry, &ParseOptions::lenient()).unwrap();
        assert_eq!(deck.keyword("PAIR").unwrap().len(), 1);
        assert_eq!(deck.warnings().len(), 1);
    }

    #[test]
    fn unterminated_last_record_completes_fixed_keyword() {
        let mut registry = registry();
        registry.register(
            KeywordDefinition::new("PAIR", SizeRule::Fixed(2))
                .with_item(ItemSchema::single("V", ValueType::Int)),
        );
        let src = "PAIR\n1 /\n2\n";

        let deck = parse_str(src, &registry, &ParseOptions::strict()).unwrap();
        let pair = deck.keyword("PAIR").unwrap();
        assert_eq!(pair.len(), 2);
        assert_eq!(pair.record(1).unwrap().item("V").unwrap().get_int(0), Some(2));

        let deck = parse_str(src, &registry, &ParseOptions::lenient()).unwrap();
        assert_eq!(deck.keyword("PAIR").unwrap().len(), 2);
        assert!(deck.warnings().is_empty(), "{:?}", deck.warnings());
    }

    #[test]
    fn short_keyword_warning_matches_emitted_records() {
        let mut registry = registry();
        registry.register(
            KeywordDefinition::new("TRIPLE", SizeRule::Fixed(3))
                .with_item(ItemSchema::single("V", ValueType::Int)),
        );
        let deck =
            parse_str("TRIPLE\n1 /\n2\n", &registry, &ParseOptions::lenient()).unwrap();
        assert_eq!(deck.keyword("TRIPLE").unwrap().len(), 2);
        assert!(deck.warnings()[0].message.contains("2 of 3 records"));
    }

    #[test]
    fn undecodable_bytes_do_not_stop_the_parse() {
        let registry = registry();
        let options = ParseOptions::strict();
        let provider = InMemoryProvider::default();
        let text: &'static [u8] = b"RUNSPEC\n-- caf\xE9\nTITLE\n 'caf\xE9' /\n";
        let mut stack = vec![ParseState::new(PathBuf::from("CASE.DATA"), Box::new(text))];
        let ctx = Context {
            registry: &registry,
            options: &options,
            provider: &provider,
            root_dir: Path::new(""),
        };
        let mut deck = Deck::new();
        while let Some(state) = stack.last_mut() {
            match state.step(&ctx, &mut deck).unwrap() {
                Step::Continue => {}
                Step::Done => {
                    stack.pop();
                }
                Step::Include { .. } => unreachable!(),
            }
        }
        assert_eq!(names(&deck), vec!["RUNSPEC", "TITLE"]);
        let title = deck.keyword("TITLE").unwrap().record(0).unwrap();
        assert_eq!(title.item("TITLE").unwrap().get_string(0), Some("caf\u{FFFD}"));
    }

    #[test]
    fn surplus_records_are_stray_data() {
        let src = "DIMENS\n1 1 1 /\n2 2 2 /\nTITLE\n'T' /\n";

        let err = parse_str(src, &registry(), &ParseOptions::strict()).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::DataError);
        assert_eq!(err.location(), Some((INLINE_DECK_NAME, 3)));

        let deck = parse_str(src, &registry(), &ParseOptions::lenient()).unwrap();
        assert_eq!(names(&deck), vec!["DIMENS", "TITLE"]);
        assert_eq!(deck.keyword("DIMENS").unwrap().len(), 1);
        assert_eq!(deck.warnings().len(), 1);
        assert_eq!(deck.warnings()[0].line, 3);
    }

    #[test]
    fn include_in_string_deck_fails_with_missing_file() {
        let err = parse_str(
            "INCLUDE\n 'missing.inc' /\n",
            &registry(),
            &ParseOptions::strict(),
        )
        .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::FileSystemError);
        assert!(err.to_string().contains("missing.inc"), "{}", err);
        assert_eq!(err.location(), Some((INLINE_DECK_NAME, 1)));
    }

    #[test]
    fn include_without_path_is_rejected() {
        let err = parse_str("INCLUDE\n /\n", &registry(), &ParseOptions::strict()).unwrap_err();
        assert!(matches!(err, DeckError::Include { .. }), "{}", err);
    }
}
