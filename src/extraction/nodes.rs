/*!
 * Text node extraction.
 *
 * Text nodes are the gaps between merged skip spans that carry enough prose
 * to be worth translating. Gaps that fail the content filter are folded back
 * into the skip spans, so the returned spans and nodes always tile the whole
 * input.
 */

use log::{debug, info};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::app_config::ExtractionConfig;

use super::spans::{merge_spans, SkipSpan, SpanComputer};

static NEWTHEOREM_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\\newtheorem\*?\s*\{([^{}]+)\}").expect("Invalid newtheorem regex")
});

static DOCUMENT_CLASS_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)\\document(?:class|style)(?:\[.*?\])?\{.*?\}").expect("Invalid documentclass regex")
});

/// Default minimum trimmed length of a text node
pub const DEFAULT_MIN_NODE_LENGTH: usize = 10;

/// A span of translatable prose
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextNode {
    /// Byte offset of the first byte of the node
    pub start: usize,
    /// Byte offset one past the last byte of the node
    pub end: usize,
    /// Original text, including surrounding whitespace
    pub text: String,
    /// Translated text; `None` keeps the original
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replacement: Option<String>,
}

impl TextNode {
    pub fn new(start: usize, end: usize, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
            replacement: None,
        }
    }

    /// Whether the node carries a usable replacement
    pub fn is_translated(&self) -> bool {
        self.replacement.as_deref().is_some_and(|r| !r.trim().is_empty())
    }

    /// The text reintegration will emit for this node
    pub fn output_text(&self) -> &str {
        match self.replacement.as_deref() {
            Some(r) if !r.trim().is_empty() => r,
            _ => &self.text,
        }
    }
}

impl fmt::Debug for TextNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let preview: String = self.text.chars().take(40).collect();
        write!(f, "TextNode({}:{} {:?})", self.start, self.end, preview)
    }
}

/// Result of extracting one file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Extraction {
    /// Translatable nodes, in ascending offset order
    pub nodes: Vec<TextNode>,
    /// Spans to preserve verbatim, sorted and non-overlapping
    pub skip_spans: Vec<SkipSpan>,
}

/// Splits a document into skip spans and text nodes
#[derive(Debug, Clone)]
pub struct NodeExtractor {
    min_node_length: usize,
    extra_environments: Vec<String>,
}

impl Default for NodeExtractor {
    fn default() -> Self {
        Self {
            min_node_length: DEFAULT_MIN_NODE_LENGTH,
            extra_environments: Vec::new(),
        }
    }
}

impl NodeExtractor {
    pub fn new(config: &ExtractionConfig) -> Self {
        Self {
            min_node_length: config.min_node_length,
            extra_environments: config.extra_environments.clone(),
        }
    }

    /// Extract nodes and spans. Theorem-like environments declared in `text`
    /// itself are always added to `extra_environments`.
    pub fn extract<S: AsRef<str>>(&self, text: &str, extra_environments: &[S]) -> Extraction {
        let detected = detect_theorem_environments(text);
        if !detected.is_empty() {
            info!("Detected {} custom theorem envs: {:?}", detected.len(), detected);
        }

        let environments: Vec<String> = self
            .extra_environments
            .iter()
            .cloned()
            .chain(extra_environments.iter().map(|e| e.as_ref().to_string()))
            .chain(detected)
            .collect();

        let computed = SpanComputer::new(environments.as_slice()).compute(text);
        let (nodes, rejected_gaps) = self.split_gaps(text, &computed);

        let mut skip_spans = computed;
        skip_spans.extend(rejected_gaps);
        let skip_spans = merge_spans(skip_spans);

        debug!("Text extractor: {} text nodes, {} skip spans", nodes.len(), skip_spans.len());
        Extraction { nodes, skip_spans }
    }

    /// Walk the gaps around `spans`; gaps that pass the filter become nodes,
    /// the others are returned as extra skip spans.
    fn split_gaps(&self, text: &str, spans: &[SkipSpan]) -> (Vec<TextNode>, Vec<SkipSpan>) {
        let mut nodes = Vec::new();
        let mut rejected = Vec::new();
        let mut prev_end = 0;

        let boundaries = spans
            .iter()
            .map(|s| (s.start, s.end))
            .chain(std::iter::once((text.len(), text.len())));

        for (span_start, span_end) in boundaries {
            if span_start > prev_end {
                let gap = &text[prev_end..span_start];
                if self.is_translatable(gap) {
                    nodes.push(TextNode::new(prev_end, span_start, gap));
                } else {
                    rejected.push(SkipSpan::new(prev_end, span_start));
                }
            }
            prev_end = prev_end.max(span_end);
        }

        (nodes, rejected)
    }

    /// Long enough, has a letter, and is not only digits and punctuation
    fn is_translatable(&self, gap: &str) -> bool {
        let stripped = gap.trim();
        if stripped.chars().count() < self.min_node_length {
            return false;
        }
        if !stripped.chars().any(char::is_alphabetic) {
            return false;
        }
        !stripped
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_whitespace() || c.is_ascii_punctuation())
    }
}

/// Extract with default settings
pub fn extract<S: AsRef<str>>(text: &str, extra_environments: &[S]) -> Extraction {
    NodeExtractor::default().extract(text, extra_environments)
}

/// Names declared with `\newtheorem{name}` or `\newtheorem*{name}`, in order, without duplicates
pub fn detect_theorem_environments(text: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for cap in NEWTHEOREM_REGEX.captures_iter(text) {
        let name = cap[1].trim();
        if !name.is_empty() && !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}

/// True when a class declaration, `\begin{document}` and `\end{document}` appear in that order
pub fn is_complete_latex(text: &str) -> bool {
    let Some(class) = DOCUMENT_CLASS_REGEX.find(text) else {
        return false;
    };
    let (Some(begin), Some(end)) = (text.find("\\begin{document}"), text.find("\\end{document}")) else {
        return false;
    };
    class.end() <= begin && begin < end
}
