//! Outcome statistics for a crawl
//!
//! Counters are purely additive. Content-type rejections are additionally
//! broken out by the observed `Content-Type` header value.

use std::collections::BTreeMap;
use std::fmt;

/// Why a traversal step (or a fetch) ended the way it did
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// Page fetched, buffered and (if depth allowed) expanded
    Done,
    /// URL had already been claimed by another task
    Scrapped,
    /// Transient failures exhausted every attempt
    ConnectionError,
    /// Body could not be decoded as text
    UnicodeDecodeError,
    /// HEAD reported something other than `text/html`
    WrongContentType(String),
}

/// Outcome without its payload, used as the counter key
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OutcomeKind {
    Done,
    Scrapped,
    ConnectionError,
    UnicodeDecodeError,
    WrongContentType,
}

impl Outcome {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            Self::Done => OutcomeKind::Done,
            Self::Scrapped => OutcomeKind::Scrapped,
            Self::ConnectionError => OutcomeKind::ConnectionError,
            Self::UnicodeDecodeError => OutcomeKind::UnicodeDecodeError,
            Self::WrongContentType(_) => OutcomeKind::WrongContentType,
        }
    }
}

impl OutcomeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Done => "done",
            Self::Scrapped => "scrapped",
            Self::ConnectionError => "connection_error",
            Self::UnicodeDecodeError => "unicode_decode_error",
            Self::WrongContentType => "wrong_content_type",
        }
    }
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accumulated outcome counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlStats {
    counts: BTreeMap<OutcomeKind, u64>,
    wrong_content_type: BTreeMap<String, u64>,
}

impl CrawlStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one occurrence of `outcome`
    pub fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::WrongContentType(content_type) => {
                *self
                    .wrong_content_type
                    .entry(content_type.clone())
                    .or_insert(0) += 1;
            }
            other => {
                *self.counts.entry(other.kind()).or_insert(0) += 1;
            }
        }
    }

    /// Count for a kind; for `WrongContentType` this sums every content type
    pub fn count(&self, kind: OutcomeKind) -> u64 {
        match kind {
            OutcomeKind::WrongContentType => self.wrong_content_type.values().sum(),
            other => self.counts.get(&other).copied().unwrap_or(0),
        }
    }

    /// Count of rejections for one observed content type
    pub fn wrong_content_type(&self, content_type: &str) -> u64 {
        self.wrong_content_type
            .get(content_type)
            .copied()
            .unwrap_or(0)
    }

    /// Rejected content types and their counts
    pub fn content_types(&self) -> &BTreeMap<String, u64> {
        &self.wrong_content_type
    }

    /// Number of distinct outcome kinds seen so far
    pub fn len(&self) -> usize {
        self.counts.len() + usize::from(!self.wrong_content_type.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flat `(kind, count)` pairs in a stable order
    pub fn iter(&self) -> impl Iterator<Item = (OutcomeKind, u64)> + '_ {
        self.counts.iter().map(|(kind, count)| (*kind, *count))
    }
}

impl fmt::Display for CrawlStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (kind, count) in self.iter() {
            writeln!(f, "  {}: {}", kind, count)?;
        }

        if !self.wrong_content_type.is_empty() {
            writeln!(f, "  {}:", OutcomeKind::WrongContentType)?;
            for (content_type, count) in &self.wrong_content_type {
                let label = if content_type.is_empty() {
                    "<missing>"
                } else {
                    content_type.as_str()
                };
                writeln!(f, "    {}: {}", label, count)?;
            }
        }

        Ok(())
    }
}
