/*!
 * Reintegration of translated nodes.
 *
 * Rebuilds a document by copying the original text between nodes and
 * emitting each node's replacement, or its original text when the
 * replacement is missing or blank. With no replacements the output is
 * byte-for-byte identical to the input.
 */

use log::warn;

use super::nodes::TextNode;

/// Stitch node replacements back into `original` at their exact offsets
pub fn reintegrate(original: &str, nodes: &[TextNode]) -> String {
    if nodes.is_empty() {
        return original.to_string();
    }

    let mut ordered: Vec<&TextNode> = nodes.iter().collect();
    ordered.sort_by_key(|n| n.start);

    let mut output = String::with_capacity(original.len());
    let mut cursor = 0;

    for node in ordered {
        let (Some(between), Some(_)) = (original.get(cursor..node.start), original.get(node.start..node.end)) else {
            warn!(
                "Ignoring node {}..{}: out of bounds or overlapping (cursor {}, length {})",
                node.start,
                node.end,
                cursor,
                original.len()
            );
            continue;
        };
        output.push_str(between);
        output.push_str(node.output_text());
        cursor = node.end;
    }

    output.push_str(&original[cursor..]);
    output
}
