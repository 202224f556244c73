/*!
 * Whitespace preservation for translated nodes.
 *
 * Nodes keep the exact whitespace around them in the source (newlines
 * before a `\section`, indentation inside an environment). Translators tend
 * to trim or reflow it, so the original padding is put back around the
 * translated core.
 */

/// Restores surrounding whitespace on translated text
pub struct FormatPreserver;

impl FormatPreserver {
    /// Leading whitespace of `original`, trimmed `translated`, trailing whitespace of `original`
    pub fn restore_whitespace(original: &str, translated: &str) -> String {
        let (_, core, _) = Self::split_padding(translated);
        if core.is_empty() {
            return String::new();
        }

        let (leading, _, trailing) = Self::split_padding(original);

        let mut result = String::with_capacity(leading.len() + core.len() + trailing.len());
        result.push_str(leading);
        result.push_str(core);
        result.push_str(trailing);
        result
    }

    /// Split text into (leading whitespace, core, trailing whitespace)
    pub fn split_padding(text: &str) -> (&str, &str, &str) {
        let trimmed_start = text.trim_start();
        let leading = &text[..text.len() - trimmed_start.len()];
        let core = trimmed_start.trim_end();
        let trailing = &trimmed_start[core.len()..];
        (leading, core, trailing)
    }
}
