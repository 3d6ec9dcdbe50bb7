//! Raw keywords: untyped records accumulated for one keyword occurrence.
//!
//! A [`RawKeyword`] is created when a keyword start is read, fed one data
//! line at a time, and reports [`RawKeyword::is_finished`] once its size
//! rule is satisfied. Records may span several physical lines; a record
//! closes at its `/`.

use crate::tokenizer::{LineTokens, Token};

/// Record count of one keyword occurrence, with any item-derived size
/// already resolved to a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawSize {
    Fixed(usize),
    SlashTerminated,
    Unknown,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    tokens: Vec<Token>,
    line: u32,
}

impl RawRecord {
    fn new(line: u32) -> Self {
        RawRecord {
            tokens: Vec::new(),
            line,
        }
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Line the record started on.
    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct RawKeyword {
    name: String,
    file: String,
    line: u32,
    size: RawSize,
    recognized: bool,
    records: Vec<RawRecord>,
    pending: Option<RawRecord>,
    terminated: bool,
}

impl RawKeyword {
    pub fn new(name: &str, file: &str, line: u32, size: RawSize) -> Self {
        RawKeyword {
            name: name.to_owned(),
            file: file.to_owned(),
            line,
            size,
            recognized: true,
            records: Vec::new(),
            pending: None,
            terminated: false,
        }
    }

    /// A keyword the registry cannot resolve. It swallows data lines until
    /// the next keyword start of any kind.
    pub fn unrecognized(name: &str, file: &str, line: u32) -> Self {
        RawKeyword {
            recognized: false,
            ..RawKeyword::new(name, file, line, RawSize::Unknown)
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn size(&self) -> RawSize {
        self.size
    }

    pub fn is_recognized(&self) -> bool {
        self.recognized
    }

    pub fn records(&self) -> &[RawRecord] {
        &self.records
    }

    pub fn record(&self, index: usize) -> Option<&RawRecord> {
        self.records.get(index)
    }

    /// Append one tokenized data line.
    pub fn add_line(&mut self, line: LineTokens, line_no: u32) {
        if self.is_finished() {
            return;
        }

        // A bare "/" with nothing pending ends a slash-terminated keyword.
        if self.size == RawSize::SlashTerminated
            && line.terminated
            && line.tokens.is_empty()
            && self.pending.is_none()
        {
            self.terminated = true;
            return;
        }

        let record = self.pending.get_or_insert_with(|| RawRecord::new(line_no));
        record.tokens.extend(line.tokens);

        if line.terminated {
            if let Some(record) = self.pending.take() {
                self.records.push(record);
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        match self.size {
            RawSize::Fixed(n) => self.records.len() >= n,
            RawSize::SlashTerminated => self.terminated,
            RawSize::Unknown => false,
        }
    }

    /// True while a record has been started but not closed by `/`.
    pub fn has_pending_record(&self) -> bool {
        self.pending.is_some()
    }

    /// Close the keyword at its natural end (next keyword or end of file),
    /// keeping any unterminated trailing record.
    pub fn close(&mut self) {
        if let Some(record) = self.pending.take() {
            if !record.is_empty() {
                self.records.push(record);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::tokenize;

    fn feed(raw: &mut RawKeyword, lines: &[&str]) {
        for (i, line) in lines.iter().enumerate() {
            raw.add_line(tokenize(line).unwrap(), i as u32 + 2);
        }
    }

    #[test]
    fn fixed_size_finishes_at_target() {
        let mut raw = RawKeyword::new("DIMENS", "T.DATA", 1, RawSize::Fixed(1));
        assert!(!raw.is_finished());
        feed(&mut raw, &[" 10 10 3 /"]);
        assert!(raw.is_finished());
        assert_eq!(raw.records().len(), 1);
        assert_eq!(raw.records()[0].len(), 3);
    }

    #[test]
    fn fixed_zero_is_finished_immediately() {
        let raw = RawKeyword::new("RUNSPEC", "T.DATA", 1, RawSize::Fixed(0));
        assert!(raw.is_finished());
    }

    #[test]
    fn record_spans_lines_until_slash() {
        let mut raw = RawKeyword::new("PORO", "T.DATA", 1, RawSize::Fixed(1));
        feed(&mut raw, &["0.1 0.2", "0.3", "0.4 /"]);
        assert!(raw.is_finished());
        assert_eq!(raw.records()[0].len(), 4);
        assert_eq!(raw.records()[0].line(), 2);
    }

    #[test]
    fn slash_terminated_ends_on_bare_slash() {
        let mut raw = RawKeyword::new("WELSPECS", "T.DATA", 1, RawSize::SlashTerminated);
        feed(&mut raw, &["'W1' 'G1' /", "'W2' 'G1' /"]);
        assert!(!raw.is_finished());
        feed(&mut raw, &["/"]);
        assert!(raw.is_finished());
        assert_eq!(raw.records().len(), 2);
    }

    #[test]
    fn slash_terminated_with_no_records() {
        let mut raw = RawKeyword::new("WELSPECS", "T.DATA", 1, RawSize::SlashTerminated);
        feed(&mut raw, &["/"]);
        assert!(raw.is_finished());
        assert!(raw.records().is_empty());
    }

    #[test]
    fn bare_slash_is_an_empty_record_for_fixed_keywords() {
        let mut raw = RawKeyword::new("EQLDIMS", "T.DATA", 1, RawSize::Fixed(1));
        feed(&mut raw, &["/"]);
        assert!(raw.is_finished());
        assert_eq!(raw.records().len(), 1);
        assert!(raw.records()[0].is_empty());
    }

    #[test]
    fn unknown_never_finishes_by_itself() {
        let mut raw = RawKeyword::new("VFPPROD", "T.DATA", 1, RawSize::Unknown);
        feed(&mut raw, &["1 2 /", "3 4"]);
        assert!(!raw.is_finished());
        assert!(raw.has_pending_record());
        raw.close();
        assert_eq!(raw.records().len(), 2);
        assert!(!raw.has_pending_record());
    }

    #[test]
    fn unrecognized_keyword_is_unknown_sized() {
        let raw = RawKeyword::unrecognized("FOOBAR", "T.DATA", 4);
        assert!(!raw.is_recognized());
        assert_eq!(raw.size(), RawSize::Unknown);
    }
}
