//! Queue Manager
//!
//! Owns the ordered list of pending utterances and the current position.
//! Pure data structure: it decides where items land and how the index moves,
//! never whether playback should start. The controller makes that call from
//! the returned outcome.

use super::settings::VoiceSelector;

/// Maximum accepted text length, in characters
pub const MAX_TEXT_LENGTH: usize = 32767;

/// Per-item options
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemOptions {
    /// Language tag for this item
    pub lang: Option<String>,
    /// Voice override for this item
    pub voice: Option<VoiceSelector>,
}

/// One queued utterance (immutable once created)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueItem {
    text: String,
    options: ItemOptions,
}

impl QueueItem {
    /// Create an item from already-trimmed, validated text
    pub fn new(text: impl Into<String>, options: ItemOptions) -> Self {
        Self {
            text: text.into(),
            options,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn options(&self) -> &ItemOptions {
        &self.options
    }
}

/// Where a newly added item lands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InsertionPolicy {
    /// Queue becomes just this item
    Replace,
    /// Insert before the current item and play it now
    Immediate,
    /// Insert right after the current item
    Next,
    /// Append to the end
    #[default]
    Append,
}

impl InsertionPolicy {
    /// Parse a policy name; unrecognized values fall back to `Append`
    pub fn parse(value: &str) -> Self {
        match value {
            "replace" => InsertionPolicy::Replace,
            "immediate" => InsertionPolicy::Immediate,
            "next" => InsertionPolicy::Next,
            _ => InsertionPolicy::Append,
        }
    }

    /// Whether this policy always restarts playback at the current index
    pub fn forces_restart(self) -> bool {
        matches!(self, InsertionPolicy::Replace | InsertionPolicy::Immediate)
    }
}

/// Effect of `remove` on the current position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    /// Removed item came after the current one
    Unaffected,
    /// Removed item came before the current one; index shifted down
    Shifted,
    /// Removed the current item; `replacement` is true when an item now
    /// sits at the (possibly decremented) index
    CurrentRemoved { replacement: bool },
}

/// Ordered queue plus current index
///
/// Index is within `[0, len-1]` whenever the queue is non-empty and exactly
/// 0 when it is empty.
#[derive(Debug, Default)]
pub struct QueueManager {
    items: Vec<QueueItem>,
    index: usize,
}

impl QueueManager {
    /// Create new empty queue manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `item` according to `policy`
    ///
    /// Returns the position the item landed at.
    pub fn insert(&mut self, item: QueueItem, policy: InsertionPolicy) -> usize {
        let len = self.items.len();
        match policy {
            InsertionPolicy::Replace => {
                self.items = vec![item];
                self.index = 0;
                0
            }
            InsertionPolicy::Immediate => {
                // Current item and its successors shift right
                let position = self.index.min(len);
                self.items.insert(position, item);
                position
            }
            InsertionPolicy::Next => {
                if len > 0 && self.index < len - 1 {
                    let position = self.index + 1;
                    self.items.insert(position, item);
                    position
                } else {
                    self.items.push(item);
                    self.items.len() - 1
                }
            }
            InsertionPolicy::Append => {
                self.items.push(item);
                self.items.len() - 1
            }
        }
    }

    /// Remove the item at `index`
    ///
    /// Returns None (and changes nothing) when `index` is out of range.
    pub fn remove(&mut self, index: usize) -> Option<RemoveOutcome> {
        if index >= self.items.len() {
            return None;
        }

        let was_last = index == self.items.len() - 1;
        self.items.remove(index);

        let outcome = if index < self.index {
            self.index -= 1;
            RemoveOutcome::Shifted
        } else if index > self.index {
            RemoveOutcome::Unaffected
        } else {
            if was_last && index > 0 {
                self.index -= 1;
            }
            RemoveOutcome::CurrentRemoved {
                replacement: self.index < self.items.len(),
            }
        };

        if self.items.is_empty() {
            self.index = 0;
        }

        Some(outcome)
    }

    /// Remove every item and reset the index
    pub fn clear(&mut self) {
        self.items.clear();
        self.index = 0;
    }

    /// Jump to `index` if it is in range
    pub fn set_index(&mut self, index: usize) -> bool {
        if index < self.items.len() {
            self.index = index;
            true
        } else {
            false
        }
    }

    /// Move to the next item if one exists
    pub fn advance(&mut self) -> bool {
        if self.has_next() {
            self.index += 1;
            true
        } else {
            false
        }
    }

    /// Move to the previous item if one exists
    pub fn retreat(&mut self) -> bool {
        if self.has_previous() {
            self.index -= 1;
            true
        } else {
            false
        }
    }

    pub fn current(&self) -> Option<&QueueItem> {
        self.items.get(self.index)
    }


    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn has_next(&self) -> bool {
        self.index + 1 < self.items.len()
    }

    pub fn has_previous(&self) -> bool {
        !self.items.is_empty() && self.index > 0
    }

    /// Text-only projection, in playback order
    pub fn texts(&self) -> Vec<String> {
        self.items.iter().map(|item| item.text.clone()).collect()
    }
}
