use std::collections::HashSet;

use crate::models::CandidateItem;

/// Maximum number of items in a result
pub const TARGET_COUNT: usize = 3;

/// Order-preserving, case-insensitive de-duplication of candidates
///
/// Holds the accepted items; the first occurrence of a title always wins, whether it came
/// from an earlier attempt, a later one, or the fallback generator.
#[derive(Debug, Default, Clone)]
pub struct UniqueItems {
    items: Vec<CandidateItem>,
    seen: HashSet<String>,
}

impl UniqueItems {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= TARGET_COUNT
    }

    pub fn contains_title(&self, title: &str) -> bool {
        self.seen.contains(&title.trim().to_lowercase())
    }

    /// Normalizes and inserts one candidate; returns whether it was kept
    pub fn push(&mut self, item: CandidateItem) -> bool {
        if self.is_full() {
            return false;
        }
        let Some(item) = normalize(item) else {
            return false;
        };
        if !self.seen.insert(item.title_key()) {
            return false;
        }
        self.items.push(item);
        true
    }

    /// Pulls from `candidates` until full or exhausted; returns how many were kept
    ///
    /// Stops consuming as soon as the target is reached, so a lazy source is not scanned
    /// further than needed.
    pub fn extend_from<I>(&mut self, candidates: I) -> usize
    where
        I: IntoIterator<Item = CandidateItem>,
    {
        let mut candidates = candidates.into_iter();
        let mut kept = 0;
        while !self.is_full() {
            let Some(item) = candidates.next() else {
                break;
            };
            if self.push(item) {
                kept += 1;
            }
        }
        kept
    }

    pub fn items(&self) -> &[CandidateItem] {
        &self.items
    }

    pub fn into_items(self) -> Vec<CandidateItem> {
        self.items
    }
}

fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whitespace-normalizes a candidate, rejecting it when the title is empty
pub fn normalize(mut item: CandidateItem) -> Option<CandidateItem> {
    item.title = collapse(&item.title);
    if item.title.is_empty() {
        return None;
    }
    item.creator = collapse(&item.creator);
    item.reason = collapse(&item.reason);
    item.year = item.year.trim().to_string();
    Some(item)
}

/// De-duplicates and caps a sequence of candidates
pub fn dedupe<I>(candidates: I) -> Vec<CandidateItem>
where
    I: IntoIterator<Item = CandidateItem>,
{
    let mut unique = UniqueItems::new();
    unique.extend_from(candidates);
    unique.into_items()
}
