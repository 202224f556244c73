/*!
 * Per-node replacement guard.
 *
 * Prose nodes should never gain LaTeX-active characters during translation:
 * a stray brace or dollar sign in one node can break the whole document.
 * Characters that pair with text outside the node (an unmatched `$`, the `%`
 * after a skipped backslash) must not be dropped either.
 */

use thiserror::Error;

/// Characters with special meaning to TeX
const ACTIVE_CHARS: [char; 10] = ['{', '}', '\\', '$', '%', '&', '#', '^', '_', '~'];

/// Active characters whose count must be kept exactly
const KEPT_CHARS: [char; 4] = ['$', '%', '#', '&'];

/// Why a node replacement was refused
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NodeIssue {
    #[error("Replacement is blank")]
    Blank,

    #[error("Replacement adds LaTeX-active character '{character}' ({original} in original, {replacement} in replacement)")]
    ActiveCharacterAdded {
        character: char,
        original: usize,
        replacement: usize,
    },

    #[error("Replacement drops LaTeX-active character '{character}' ({original} in original, {replacement} in replacement)")]
    ActiveCharacterRemoved {
        character: char,
        original: usize,
        replacement: usize,
    },
}

/// Checks single-node replacements before they are accepted
#[derive(Debug, Clone, Copy, Default)]
pub struct NodeValidator;

impl NodeValidator {
    pub fn new() -> Self {
        Self
    }

    pub fn check(&self, original: &str, replacement: &str) -> Result<(), NodeIssue> {
        if replacement.trim().is_empty() {
            return Err(NodeIssue::Blank);
        }

        for character in ACTIVE_CHARS {
            let before = original.matches(character).count();
            let after = replacement.matches(character).count();
            if after > before {
                return Err(NodeIssue::ActiveCharacterAdded {
                    character,
                    original: before,
                    replacement: after,
                });
            }
            if after < before && KEPT_CHARS.contains(&character) {
                return Err(NodeIssue::ActiveCharacterRemoved {
                    character,
                    original: before,
                    replacement: after,
                });
            }
        }
        Ok(())
    }
}
