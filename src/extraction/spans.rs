/*!
 * Skip-span computation.
 *
 * A skip span is a half-open byte range that must be copied through
 * untouched. Comments are found first and blanked out; the remaining passes
 * (preamble, block environments, math, structural commands, URLs, bare
 * command tokens, escaped and structural characters) run on the blanked text,
 * so a `$` or `\end{...}` inside a comment never pairs with live LaTeX.
 * All spans are unioned and merged at the end.
 *
 * Every pass only places span boundaries next to ASCII bytes, so all offsets
 * are valid `str` slice boundaries.
 */

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashSet;

/// Block environments whose whole body is preserved verbatim
pub const BLOCK_ENVIRONMENTS: &[&str] = &[
    // math displays
    "equation", "equation*", "align", "align*", "aligned",
    "gather", "gather*", "multline", "multline*",
    "eqnarray", "eqnarray*", "flalign", "flalign*",
    "split", "cases", "subequations", "math", "displaymath",
    // pictures
    "tikzpicture", "tikzcd", "pgfpicture",
    // algorithms and code
    "algorithm", "algorithm2e", "algorithmic",
    "verbatim", "verbatim*", "Verbatim", "lstlisting", "minted",
    // bibliography
    "thebibliography", "filecontents", "filecontents*",
];

static BEGIN_DOCUMENT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\\begin\s*\{document\}").expect("Invalid begin-document regex")
});

static BEGIN_ENV_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\\begin\{([^{}]+)\}").expect("Invalid begin-environment regex")
});

static PAREN_MATH_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)\\\(.*?\\\)|\\\[.*?\\\]").expect("Invalid paren math regex")
});

// Command token, optional [..] argument, then one {..} argument that may hold
// brace groups one level deep.
static COMMAND_WITH_ARG_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"\\(?:",
        r"usepackage|documentclass|bibliographystyle|bibliography|",
        r"includegraphics|input|include|import|",
        r"cite[tp]?|(?:auto)?ref|label|eqref|pageref|",
        r"newcommand|renewcommand|providecommand|def|let|",
        r"DeclareMathOperator\*?|DeclareRobustCommand|",
        r"setcounter|setlength|addtolength|settowidth|settoheight|",
        r"hypersetup|geometry|PassOptionsToPackage|RequirePackage|",
        r"newtheorem\*?|theoremstyle|",
        r"begin|end|",
        r"hspace\*?|vspace\*?|rule|raisebox|",
        r"bibitem|newblock",
        r")\s*(?:\[[^\]]*\])?\s*\{[^{}]*(?:\{[^{}]*\}[^{}]*)*\}",
    ))
    .expect("Invalid command-with-argument regex")
});

static URL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\\(?:url|href)\s*\{[^}]*\}").expect("Invalid url regex")
});

static COMMAND_TOKEN_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\\[a-zA-Z@]+\*?").expect("Invalid command token regex")
});

// Escaped pairs first so `\%` and friends stay one unit
static SPECIAL_CHAR_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\\[%$#&_{}]|[{}\[\]\\^_~&]").expect("Invalid special character regex")
});

/// Half-open byte range `[start, end)` that must be preserved verbatim
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SkipSpan {
    pub start: usize,
    pub end: usize,
}

impl SkipSpan {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Whether the two half-open ranges share at least one byte
    pub fn overlaps(&self, start: usize, end: usize) -> bool {
        self.start < end && start < self.end
    }
}

/// Computes the merged skip spans of one file
#[derive(Debug, Clone)]
pub struct SpanComputer {
    environments: HashSet<String>,
}

impl Default for SpanComputer {
    fn default() -> Self {
        Self::new::<&str>(&[])
    }
}

impl SpanComputer {
    /// Build a computer that also preserves the given extra environments
    pub fn new<S: AsRef<str>>(extra_environments: &[S]) -> Self {
        let environments = BLOCK_ENVIRONMENTS
            .iter()
            .map(|e| e.to_string())
            .chain(extra_environments.iter().map(|e| e.as_ref().trim().to_string()))
            .filter(|e| !e.is_empty())
            .collect();
        Self { environments }
    }

    /// Whether an environment name is preserved as a block
    pub fn preserves(&self, environment: &str) -> bool {
        self.environments.contains(environment)
    }

    /// All skip spans of `text`, sorted and merged
    pub fn compute(&self, text: &str) -> Vec<SkipSpan> {
        let mut spans = Vec::new();
        comment_spans(text, &mut spans);
        let live = blank_spans(text, &spans);
        let live: &str = &live;

        preamble_span(live, &mut spans);
        self.block_environment_spans(live, &mut spans);
        inline_math_spans(live, &mut spans);
        regex_spans(&PAREN_MATH_REGEX, live, &mut spans);
        regex_spans(&COMMAND_WITH_ARG_REGEX, live, &mut spans);
        regex_spans(&URL_REGEX, live, &mut spans);
        // Bare tokens only: a following argument may be prose (\emph, \caption)
        regex_spans(&COMMAND_TOKEN_REGEX, live, &mut spans);
        regex_spans(&SPECIAL_CHAR_REGEX, live, &mut spans);

        merge_spans(spans)
    }

    /// Each preserved environment spans from its `\begin{name}` to the
    /// matching `\end{name}` of the same name, honoring same-name nesting.
    fn block_environment_spans(&self, text: &str, spans: &mut Vec<SkipSpan>) {
        let mut cursor = 0;
        for cap in BEGIN_ENV_REGEX.captures_iter(text) {
            let (Some(whole), Some(name)) = (cap.get(0), cap.get(1)) else {
                continue;
            };
            if whole.start() < cursor || !self.preserves(name.as_str()) {
                continue;
            }
            if let Some(end) = find_environment_end(text, name.as_str(), whole.end()) {
                spans.push(SkipSpan::new(whole.start(), end));
                cursor = end;
            }
        }
    }
}

/// Offset just past the `\end{name}` closing an environment opened before `from`
fn find_environment_end(text: &str, name: &str, from: usize) -> Option<usize> {
    let open = format!("\\begin{{{}}}", name);
    let close = format!("\\end{{{}}}", name);
    let mut depth = 1usize;
    let mut pos = from;

    loop {
        let next_close = text[pos..].find(&close)? + pos;
        match text[pos..next_close].find(&open) {
            Some(rel) => {
                depth += 1;
                pos += rel + open.len();
            }
            None => {
                depth -= 1;
                pos = next_close + close.len();
                if depth == 0 {
                    return Some(pos);
                }
            }
        }
    }
}

fn preamble_span(text: &str, spans: &mut Vec<SkipSpan>) {
    if let Some(m) = BEGIN_DOCUMENT_REGEX.find(text) {
        spans.push(SkipSpan::new(0, m.end()));
    }
}

fn regex_spans(regex: &Regex, text: &str, spans: &mut Vec<SkipSpan>) {
    spans.extend(regex.find_iter(text).map(|m| SkipSpan::new(m.start(), m.end())));
}

/// True when `bytes[i]` follows an odd run of backslashes (`\\` is a line break)
fn is_escaped(bytes: &[u8], i: usize) -> bool {
    bytes[..i].iter().rev().take_while(|&&b| b == b'\\').count() % 2 == 1
}

/// Copy of `text` with every byte of `spans` replaced by a space. Offsets are
/// unchanged; `spans` must be sorted, disjoint and on char boundaries.
fn blank_spans<'a>(text: &'a str, spans: &[SkipSpan]) -> Cow<'a, str> {
    if spans.is_empty() {
        return Cow::Borrowed(text);
    }
    let mut blanked = String::with_capacity(text.len());
    let mut cursor = 0;
    for span in spans {
        blanked.push_str(&text[cursor..span.start]);
        blanked.extend(std::iter::repeat_n(' ', span.len()));
        cursor = span.end;
    }
    blanked.push_str(&text[cursor..]);
    Cow::Owned(blanked)
}

/// `$...$` and `$$...$$`; a backslash-escaped `$` neither opens nor closes
fn inline_math_spans(text: &str, spans: &mut Vec<SkipSpan>) {
    let bytes = text.as_bytes();
    let find_single = |from: usize| (from..bytes.len()).find(|&j| bytes[j] == b'$' && !is_escaped(bytes, j));
    let find_double = |from: usize| {
        (from..bytes.len().saturating_sub(1))
            .find(|&j| bytes[j] == b'$' && bytes[j + 1] == b'$' && !is_escaped(bytes, j))
    };

    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'$' || is_escaped(bytes, i) {
            i += 1;
            continue;
        }
        if bytes.get(i + 1) == Some(&b'$') {
            if let Some(close) = find_double(i + 2) {
                spans.push(SkipSpan::new(i, close + 2));
                i = close + 2;
                continue;
            }
        }
        match find_single(i + 1) {
            Some(close) => {
                spans.push(SkipSpan::new(i, close + 1));
                i = close + 1;
            }
            None => i += 1,
        }
    }
}

/// `%` to end of line, unless the `%` is escaped
fn comment_spans(text: &str, spans: &mut Vec<SkipSpan>) {
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && !is_escaped(bytes, i) {
            let end = text[i..].find('\n').map(|rel| i + rel).unwrap_or(text.len());
            spans.push(SkipSpan::new(i, end));
            i = end;
        } else {
            i += 1;
        }
    }
}

/// Sort by start and coalesce every span that starts at or before the end of
/// the current merged span. Empty spans are dropped.
pub fn merge_spans(mut spans: Vec<SkipSpan>) -> Vec<SkipSpan> {
    spans.retain(|s| !s.is_empty());
    spans.sort_unstable();

    let mut merged: Vec<SkipSpan> = Vec::with_capacity(spans.len());
    for span in spans {
        match merged.last_mut() {
            Some(last) if span.start <= last.end => last.end = last.end.max(span.end),
            _ => merged.push(span),
        }
    }
    merged
}
