//! Coupon Tags
//!
//! Free-text tags delivered by coupon sources. Tags are stored lowercased, sorted
//! and deduplicated so membership checks can binary search, while heuristics use
//! substring matching through [`CouponTags::mentions`].

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// A sorted, lowercased tag collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct CouponTags {
    tags: SmallVec<[String; 5]>,
}

impl CouponTags {
    /// Create a new tag collection, normalising every tag.
    #[must_use]
    pub fn new(tags: impl IntoIterator<Item = String>) -> Self {
        let mut tags: SmallVec<[String; 5]> = tags
            .into_iter()
            .map(|tag| tag.trim().to_lowercase())
            .filter(|tag| !tag.is_empty())
            .collect();

        tags.sort();
        tags.dedup();

        Self { tags }
    }

    /// Create a new tag collection from string slices.
    pub fn from_strs(tags: &[&str]) -> Self {
        Self::new(tags.iter().map(ToString::to_string))
    }

    /// Exact, case-insensitive membership.
    pub fn contains(&self, tag: &str) -> bool {
        self.tags.binary_search(&tag.to_lowercase()).is_ok()
    }

    /// Whether any tag contains `needle` (case-insensitive).
    pub fn mentions(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();

        self.tags.iter().any(|tag| tag.contains(&needle))
    }

    /// Whether any tag contains any of `needles`.
    pub fn mentions_any(&self, needles: &[&str]) -> bool {
        needles.iter().any(|needle| self.mentions(needle))
    }

    /// Add a tag.
    pub fn add(&mut self, tag: &str) {
        let tag = tag.trim().to_lowercase();

        if tag.is_empty() {
            return;
        }

        if let Err(pos) = self.tags.binary_search(&tag) {
            self.tags.insert(pos, tag);
        }
    }

    /// Remove a tag.
    pub fn remove(&mut self, tag: &str) {
        if let Ok(pos) = self.tags.binary_search(&tag.to_lowercase()) {
            self.tags.remove(pos);
        }
    }

    /// Iterate over the tags in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(String::as_str)
    }

    /// Check if this collection is empty.
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Get the number of tags.
    pub fn len(&self) -> usize {
        self.tags.len()
    }
}

impl From<Vec<String>> for CouponTags {
    fn from(tags: Vec<String>) -> Self {
        Self::new(tags)
    }
}

impl From<CouponTags> for Vec<String> {
    fn from(tags: CouponTags) -> Self {
        tags.tags.into_vec()
    }
}
