//! Line classification and record tokenization.
//!
//! A deck line is either blank, a comment (`--`), a keyword start (a bare
//! keyword name alone on its line) or data. Data lines split into tokens;
//! a `/` token closes the current record and the rest of the line is
//! ignored. `n*value` expands to `n` copies of `value`, `n*` to `n`
//! default markers.

use deckparse_definitions::is_valid_name;

pub const COMMENT_MARKER: &str = "--";
pub const RECORD_TERMINATOR: char = '/';

/// Largest `n` accepted in `n*value`. A full-field property array of a
/// large grid stays well below this.
pub const MAX_REPEAT_COUNT: usize = 100_000_000;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// A literal value, quotes removed.
    Value(String),
    /// A `n*` default marker (one per repetition).
    Default,
}

/// The tokens of one physical line and whether it closed a record.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LineTokens {
    pub tokens: Vec<Token>,
    pub terminated: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind<'a> {
    Blank,
    Comment,
    KeywordStart(&'a str),
    Data,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenizeError {
    #[error("unterminated quoted string")]
    UnterminatedQuote,
    #[error("invalid repeat count in '{0}'")]
    BadRepeat(String),
}

/// Strip trailing whitespace and control characters (e.g. `\r`).
pub fn trim_line(line: &str) -> &str {
    line.trim_end_matches(|c: char| c.is_whitespace() || c.is_control())
}

pub fn classify(line: &str) -> LineKind<'_> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        LineKind::Blank
    } else if trimmed.starts_with(COMMENT_MARKER) {
        LineKind::Comment
    } else if let Some(name) = keyword_candidate(trimmed) {
        LineKind::KeywordStart(name)
    } else {
        LineKind::Data
    }
}

/// The keyword name a line would start, if its first token is a valid name
/// and nothing but a comment follows it.
pub fn keyword_candidate(line: &str) -> Option<&str> {
    let trimmed = line.trim();
    let end = trimmed.find(char::is_whitespace).unwrap_or(trimmed.len());
    let (name, rest) = trimmed.split_at(end);
    let rest = rest.trim_start();
    if !rest.is_empty() && !rest.starts_with(COMMENT_MARKER) {
        return None;
    }
    is_valid_name(name).then_some(name)
}

pub fn tokenize(line: &str) -> Result<LineTokens, TokenizeError> {
    let chars: Vec<char> = line.chars().collect();
    let mut out = LineTokens::default();
    let mut pos = 0usize;

    while pos < chars.len() {
        let c = chars[pos];

        if c.is_whitespace() {
            pos += 1;
            continue;
        }

        if c == '-' && chars.get(pos + 1) == Some(&'-') {
            break;
        }

        if c == RECORD_TERMINATOR {
            out.terminated = true;
            break;
        }

        if c == '\'' || c == '"' {
            let (value, next) = read_quoted(&chars, pos)?;
            out.tokens.push(Token::Value(value));
            pos = next;
            continue;
        }

        // Repeat shorthand: digits immediately followed by '*'
        let digits_end = scan_while(&chars, pos, |c| c.is_ascii_digit());
        if chars.get(digits_end) == Some(&'*') {
            let count_text: String = chars[pos..digits_end].iter().collect();
            let star = digits_end;
            let after = star + 1;
            let count = if count_text.is_empty() {
                1
            } else {
                match count_text.parse::<usize>() {
                    Ok(n) if n > 0 && n <= MAX_REPEAT_COUNT => n,
                    _ => {
                        let end = scan_bare(&chars, pos);
                        return Err(TokenizeError::BadRepeat(chars[pos..end].iter().collect()));
                    }
                }
            };

            match chars.get(after) {
                None => push_defaults(&mut out, count),
                Some(&n) if n.is_whitespace() || n == RECORD_TERMINATOR => {
                    push_defaults(&mut out, count)
                }
                Some(&q) if q == '\'' || q == '"' => {
                    let (value, next) = read_quoted(&chars, after)?;
                    push_repeated(&mut out, &value, count);
                    pos = next;
                    continue;
                }
                Some(_) => {
                    let end = scan_bare(&chars, after);
                    let value: String = chars[after..end].iter().collect();
                    push_repeated(&mut out, &value, count);
                    pos = end;
                    continue;
                }
            }
            pos = after;
            continue;
        }

        let end = scan_bare(&chars, pos);
        out.tokens.push(Token::Value(chars[pos..end].iter().collect()));
        pos = end;
    }

    Ok(out)
}

fn scan_while(chars: &[char], start: usize, pred: impl Fn(char) -> bool) -> usize {
    let mut pos = start;
    while pos < chars.len() && pred(chars[pos]) {
        pos += 1;
    }
    pos
}

fn scan_bare(chars: &[char], start: usize) -> usize {
    scan_while(chars, start, |c| {
        !c.is_whitespace() && c != RECORD_TERMINATOR && c != '\'' && c != '"'
    })
}

fn read_quoted(chars: &[char], start: usize) -> Result<(String, usize), TokenizeError> {
    let quote = chars[start];
    let close = chars[start + 1..]
        .iter()
        .position(|&c| c == quote)
        .ok_or(TokenizeError::UnterminatedQuote)?;
    let value: String = chars[start + 1..start + 1 + close].iter().collect();
    Ok((value, start + close + 2))
}

fn push_defaults(out: &mut LineTokens, count: usize) {
    out.tokens.extend(std::iter::repeat(Token::Default).take(count));
}

fn push_repeated(out: &mut LineTokens, value: &str, count: usize) {
    out.tokens
        .extend(std::iter::repeat(Token::Value(value.to_owned())).take(count));
}
