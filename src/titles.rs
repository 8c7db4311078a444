//! Title shortening
//!
//! Product names on coupons are long ("Long Chicken® + Medium King Pommes +
//! 0,4 L Coca-Cola®"). Shortened titles feed the dedup key and the short
//! display text.

use serde::{Deserialize, Serialize};

/// Shortens product titles.
pub trait TitleShortener {
    /// Return the shortened form of `title`.
    fn shorten(&self, title: &str) -> String;
}

/// Shortener that returns titles unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl TitleShortener for Identity {
    fn shorten(&self, title: &str) -> String {
        title.trim().to_string()
    }
}

/// A single `from -> to` replacement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Abbreviation {
    /// Text to replace (matched case-insensitively)
    pub from: String,

    /// Replacement
    pub to: String,
}

/// Ordered abbreviation table. Replacements run in order, each on the output of
/// the previous one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AbbreviationTable {
    entries: Vec<Abbreviation>,
}

impl AbbreviationTable {
    /// Create a table from `(from, to)` pairs.
    pub fn new<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            entries: pairs
                .into_iter()
                .filter(|(from, _)| !from.is_empty())
                .map(|(from, to)| Abbreviation {
                    from: from.to_string(),
                    to: to.to_string(),
                })
                .collect(),
        }
    }

    /// Number of replacements.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl TitleShortener for AbbreviationTable {
    fn shorten(&self, title: &str) -> String {
        let shortened = self
            .entries
            .iter()
            .fold(title.to_string(), |acc, entry| {
                replace_ignore_case(&acc, &entry.from, &entry.to)
            });

        collapse_whitespace(&shortened)
    }
}

fn replace_ignore_case(haystack: &str, needle: &str, replacement: &str) -> String {
    if needle.is_empty() {
        return haystack.to_string();
    }

    let needle: Vec<char> = needle.chars().flat_map(char::to_lowercase).collect();
    let chars: Vec<char> = haystack.chars().collect();
    let mut out = String::with_capacity(haystack.len());
    let mut pos = 0;

    while pos < chars.len() {
        if let Some(len) = match_len(chars.get(pos..).unwrap_or_default(), &needle) {
            out.push_str(replacement);
            pos += len;
        } else {
            if let Some(c) = chars.get(pos) {
                out.push(*c);
            }
            pos += 1;
        }
    }

    out
}

/// Number of haystack chars consumed when `needle` (lowercased) matches at the
/// start of `chars`.
fn match_len(chars: &[char], needle: &[char]) -> Option<usize> {
    let mut lowered = needle.iter();
    let mut consumed = 0;

    for c in chars {
        if lowered.len() == 0 {
            break;
        }

        for lower in c.to_lowercase() {
            if lowered.next() != Some(&lower) {
                return None;
            }
        }

        consumed += 1;
    }

    (lowered.len() == 0).then_some(consumed)
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> AbbreviationTable {
        AbbreviationTable::new([
            ("Chicken", "Ckn"),
            ("Medium", "M"),
            ("Coca-Cola", "Cola"),
            ("®", ""),
        ])
    }

    #[test]
    fn replacements_are_case_insensitive_and_ordered() {
        assert_eq!(
            table().shorten("Long CHICKEN® + Medium Pommes + 0,4 L Coca-Cola®"),
            "Long Ckn + M Pommes + 0,4 L Cola"
        );
    }

    #[test]
    fn unmatched_titles_only_collapse_whitespace() {
        assert_eq!(table().shorten("  Whopper   Jr. "), "Whopper Jr.");
    }

    #[test]
    fn partial_match_at_end_is_kept() {
        assert_eq!(table().shorten("Chick"), "Chick");
    }

    #[test]
    fn empty_from_entries_are_dropped() {
        let table = AbbreviationTable::new([("", "x"), ("a", "b")]);

        assert_eq!(table.len(), 1);
        assert_eq!(table.shorten("aa"), "bb");
    }

    #[test]
    fn deserializes_from_list() -> Result<(), serde_norway::Error> {
        let table: AbbreviationTable =
            serde_norway::from_str("- from: Chicken\n  to: Ckn\n- from: \"®\"\n  to: \"\"\n")?;

        assert_eq!(table.shorten("Chicken® Nuggets"), "Ckn Nuggets");

        Ok(())
    }

    #[test]
    fn identity_trims() {
        assert_eq!(Identity.shorten(" Whopper "), "Whopper");
    }
}
