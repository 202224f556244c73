/*!
 * Cross-file label uniqueness.
 *
 * Files are fed through one registry in a fixed order after all per-file
 * work is done. The first `\label{key}` seen for a key wins; later
 * duplicates are removed from the text.
 */

use std::collections::HashSet;

use log::warn;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static LABEL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\\label\{([^}]+)\}").expect("Invalid label regex")
});

#[derive(Debug, Default)]
pub struct LabelRegistry {
    seen: HashSet<String>,
    removed: usize,
}

impl LabelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every label in `text`, returning the text with duplicates removed
    pub fn deduplicate(&mut self, text: &str, filename: &str) -> String {
        let mut removed_here = 0;
        let result = LABEL_REGEX.replace_all(text, |caps: &Captures| {
            let key = caps[1].trim().to_string();
            if self.seen.insert(key) {
                caps[0].to_string()
            } else {
                removed_here += 1;
                String::new()
            }
        });

        if removed_here > 0 {
            warn!("Removed {} duplicate label(s) from {}", removed_here, filename);
            self.removed += removed_here;
        }
        result.into_owned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.seen.contains(key)
    }

    /// Number of distinct labels registered
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    /// Duplicates removed so far
    pub fn removed(&self) -> usize {
        self.removed
    }
}
