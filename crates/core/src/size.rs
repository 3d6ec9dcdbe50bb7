//! Record-count resolution for a keyword occurrence.

use crate::deck::Deck;
use crate::error::DeckError;
use crate::keyword::{KeywordDefinition, SizeRule};
use crate::raw::RawSize;

/// Compute how many records the next occurrence of `def` owns.
///
/// An item-derived size is read from the first record of the most recent
/// occurrence of the size keyword already in `deck`; a missing keyword or
/// item is a configuration error, never deferred.
pub fn resolve_size(
    def: &KeywordDefinition,
    deck: &Deck,
    file: &str,
    line: u32,
) -> Result<RawSize, DeckError> {
    let size = match def.size() {
        SizeRule::Fixed(n) => RawSize::Fixed(*n),
        SizeRule::SlashTerminated => RawSize::SlashTerminated,
        SizeRule::Unknown => RawSize::Unknown,
        SizeRule::DynamicFromItem { keyword, item } => {
            let unresolved = |reason: &str| {
                DeckError::configuration(
                    file,
                    line,
                    format!(
                        "size of keyword '{}' depends on {}::{} but {}",
                        def.name(),
                        keyword,
                        item,
                        reason
                    ),
                )
            };
            let size_keyword = deck
                .keyword(keyword)
                .ok_or_else(|| unresolved(&format!("'{}' has not been read yet", keyword)))?;
            let size_item = size_keyword
                .record(0)
                .and_then(|record| record.item(item))
                .ok_or_else(|| unresolved(&format!("'{}' has no item '{}'", keyword, item)))?;
            let count = size_item
                .get_int(0)
                .ok_or_else(|| unresolved("the item is not an integer"))?;
            let count = usize::try_from(count)
                .map_err(|_| unresolved(&format!("the item holds negative count {}", count)))?;
            RawSize::Fixed(count)
        }
    };
    tracing::debug!(keyword = def.name(), ?size, "resolved keyword size");
    Ok(size)
}
