//! Stationery token lists (pen/ink/paper).
//!
//! # Responsibility
//! - Parse free-text stationery fields into ordered token lists.
//! - Rename one token inside a list with exact-match semantics.
//! - Serialize lists to the newline-joined storage form.
//!
//! # Invariants
//! - Tokens are trimmed, non-empty and unique, in first-seen order.
//! - `;` and `\n` are separators. There is no escaping, so a token can never
//!   contain either character.
//! - An empty list is stored as SQL `NULL`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static TOKEN_SEPARATOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[;\n]").expect("valid stationery separator regex"));

const STORAGE_SEPARATOR: &str = "\n";

/// Which stationery field of an event a token list belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StationeryKind {
    Pen,
    Ink,
    Paper,
}

impl StationeryKind {
    pub const ALL: [StationeryKind; 3] = [Self::Pen, Self::Ink, Self::Paper];

    /// Column holding this field in the `events` table.
    pub fn column(self) -> &'static str {
        match self {
            Self::Pen => "pen",
            Self::Ink => "ink",
            Self::Paper => "paper",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Pen => "Pen",
            Self::Ink => "Ink",
            Self::Paper => "Paper",
        }
    }

    /// Parses a field name as used by FFI callers (`pen|ink|paper`).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pen" | "pens" => Some(Self::Pen),
            "ink" | "inks" => Some(Self::Ink),
            "paper" | "papers" => Some(Self::Paper),
            _ => None,
        }
    }
}

/// Ordered, deduplicated stationery tokens for one event field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct StationeryList {
    tokens: Vec<String>,
}

impl StationeryList {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses delimited free text. `None` and blank input give an empty list.
    pub fn parse(text: Option<&str>) -> Self {
        match text {
            Some(value) => Self::from_tokens(TOKEN_SEPARATOR_RE.split(value)),
            None => Self::new(),
        }
    }

    /// Builds a list from raw tokens, trimming, dropping blanks and
    /// duplicates.
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut list = Self::new();
        for token in tokens {
            list.push(token.as_ref());
        }
        list
    }

    /// Appends one token unless it is blank or already present.
    ///
    /// Returns whether the list changed.
    pub fn push(&mut self, token: &str) -> bool {
        let trimmed = token.trim();
        if trimmed.is_empty() || self.contains(trimmed) {
            return false;
        }
        self.tokens.push(trimmed.to_string());
        true
    }

    /// Replaces every token exactly equal to `from` with `to`, then
    /// deduplicates.
    ///
    /// A blank `to` removes the token. Returns whether any token matched.
    pub fn rename(&mut self, from: &str, to: &str) -> bool {
        let from = from.trim();
        if !self.contains(from) {
            return false;
        }
        let renamed = self
            .tokens
            .iter()
            .map(|token| if token == from { to } else { token.as_str() })
            .collect::<Vec<_>>();
        let rebuilt = Self::from_tokens(renamed);
        *self = rebuilt;
        true
    }

    pub fn contains(&self, token: &str) -> bool {
        self.tokens.iter().any(|existing| existing == token)
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Joins tokens with newlines. Empty lists join to an empty string.
    pub fn join(&self) -> String {
        self.tokens.join(STORAGE_SEPARATOR)
    }

    /// Storage form: newline-joined text, or `None` for an empty list.
    pub fn to_storage(&self) -> Option<String> {
        if self.is_empty() {
            None
        } else {
            Some(self.join())
        }
    }
}

impl From<Vec<String>> for StationeryList {
    fn from(value: Vec<String>) -> Self {
        Self::from_tokens(value)
    }
}

impl From<StationeryList> for Vec<String> {
    fn from(value: StationeryList) -> Self {
        value.tokens
    }
}

impl<'a> IntoIterator for &'a StationeryList {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.tokens.iter()
    }
}

/// Splits delimited text into trimmed, non-empty, unique tokens.
pub fn parse_tokens(text: Option<&str>) -> Vec<String> {
    StationeryList::parse(text).into()
}

/// Renames one token inside delimited text and re-joins with newlines.
///
/// Returns `None` when the input is `None` or holds no tokens after the
/// rename.
pub fn rename_token(text: Option<&str>, from: &str, to: &str) -> Option<String> {
    let mut list = StationeryList::parse(text);
    list.rename(from, to);
    list.to_storage()
}
