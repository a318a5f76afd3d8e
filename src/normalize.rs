use crate::types::PART_DELIMITER;

/// Sentinel marker deepseek-style models emit after a visible reasoning
/// preamble.
pub const REASONING_MARKER: &str = "</think>";

/// Extract the final answer from a raw model reply and split it into
/// ordered parts.
///
/// If the reply contains `</think>` followed by a blank line, everything
/// up to and including that marker is discarded. If the marker appears
/// without the blank-line separator, the fallback is to keep everything
/// after the last marker rather than fail. The retained text is trimmed
/// and split on `|`; empty parts are preserved positionally because
/// downstream alignment is by position.
///
/// Pure function, best-effort by design: malformed output still yields
/// whatever positional parts it can (spec'd soft-failure policy), pushing
/// validation to the consumers of the parts.
pub fn normalize_response(raw: &str) -> Vec<String> {
    extract_answer(raw)
        .split(PART_DELIMITER)
        .map(str::to_string)
        .collect()
}

fn extract_answer(raw: &str) -> &str {
    let separator = format!("{REASONING_MARKER}\n\n");
    let answer = if let Some((_, after)) = raw.split_once(&separator) {
        after
    } else if let Some(idx) = raw.rfind(REASONING_MARKER) {
        // Marker without the blank-line separator: treat the remainder
        // after the last marker as the answer (never panic, never
        // mis-split).
        &raw[idx + REASONING_MARKER.len()..]
    } else {
        raw
    };
    answer.trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_response_is_trimmed_and_split() {
        assert_eq!(
            normalize_response("  韭菜|猪肉|水饺 \n"),
            vec!["韭菜", "猪肉", "水饺"]
        );
    }

    #[test]
    fn reasoning_preamble_is_stripped() {
        let raw = "<think>\n先分析这道菜的构成。\n</think>\n\n韭菜|猪肉|水饺";
        assert_eq!(normalize_response(raw), vec!["韭菜", "猪肉", "水饺"]);
    }

    #[test]
    fn marker_without_blank_line_falls_back_to_remainder() {
        let raw = "<think>分析</think>\n酸辣|土豆丝";
        assert_eq!(normalize_response(raw), vec!["酸辣", "土豆丝"]);
    }

    #[test]
    fn later_markers_win_in_fallback() {
        let raw = "</think>noise</think>材料|形式";
        assert_eq!(normalize_response(raw), vec!["材料", "形式"]);
    }

    #[test]
    fn empty_parts_are_preserved_positionally() {
        assert_eq!(normalize_response("a||c"), vec!["a", "", "c"]);
    }

    #[test]
    fn single_part_answer() {
        assert_eq!(normalize_response("饭"), vec!["饭"]);
    }
}
