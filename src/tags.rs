//! Hashtag index.
//!
//! Tags are `#`-prefixed words found in an item's text after a light
//! normalization pass. The index borrows the items it lists; it never
//! copies or changes them.

use std::collections::BTreeMap;

use compact_str::CompactString;

use crate::extract::TodoItem;

/// Characters treated as word separators before splitting.
const SEPARATORS: &[char] = &['\t', '\n', ',', '.', '(', ')'];

/// Replace separator characters with spaces, trim, and collapse space runs.
pub fn normalize_text(text: &str) -> String {
    let replaced: String = text
        .chars()
        .map(|c| if SEPARATORS.contains(&c) { ' ' } else { c })
        .collect();

    let mut normalized = String::with_capacity(replaced.len());
    for word in replaced.trim().split(' ').filter(|w| !w.is_empty()) {
        if !normalized.is_empty() {
            normalized.push(' ');
        }
        normalized.push_str(word);
    }
    normalized
}

/// All tags in `text`, one entry per occurrence, in text order.
pub fn extract_tags(text: &str) -> Vec<CompactString> {
    normalize_text(text)
        .split(' ')
        .filter(|word| word.len() > 1 && word.starts_with('#'))
        .map(CompactString::from)
        .collect()
}

/// Map from tag to the items that mention it.
///
/// Keys iterate in sorted order. Items under a tag keep encounter order,
/// and an item appears at most once per tag however often it repeats it.
#[derive(Debug, Clone, Default)]
pub struct TagIndex<'a> {
    tags: BTreeMap<CompactString, Vec<&'a TodoItem>>,
}

impl<'a> TagIndex<'a> {
    /// Index every item in order.
    pub fn build<I>(items: I) -> Self
    where
        I: IntoIterator<Item = &'a TodoItem>,
    {
        let mut tags: BTreeMap<CompactString, Vec<&'a TodoItem>> = BTreeMap::new();

        for item in items {
            for tag in extract_tags(&item.text) {
                let listed = tags.entry(tag).or_default();
                let already = listed.last().is_some_and(|last| std::ptr::eq(*last, item));
                if !already {
                    listed.push(item);
                }
            }
        }

        Self { tags }
    }

    /// Items carrying `tag` (including the leading `#`).
    pub fn get(&self, tag: &str) -> Option<&[&'a TodoItem]> {
        self.tags.get(tag).map(Vec::as_slice)
    }

    /// Tags in sorted order with their items.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[&'a TodoItem])> {
        self.tags.iter().map(|(tag, items)| (tag.as_str(), items.as_slice()))
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.tags.keys().map(CompactString::as_str)
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}
