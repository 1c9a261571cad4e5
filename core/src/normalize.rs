// leafweave-core/src/normalize.rs
// Textual safety net over the stitched script.
//
// The structural walk already emits stable names for every node it visits.
// Collaborator-internal text can still name nodes by their ephemeral ids
// (a control pointing at a tile layer, a plugin pointing at its map), so the
// whole script is scanned for `_<id>` suffixes and any id the mapping knows
// is rewritten in place.

use std::ops::Range;

use crate::ids::IdentifierMapping;

/// Spans of `_` + `[a-z0-9]+` runs that are not followed by `_`.
///
/// A run followed by `_` gives back its last character so the remainder is
/// still followed by an alphanumeric; a one-character run followed by `_`
/// does not match at all.
pub fn suffix_spans(text: &str) -> Vec<Range<usize>> {
    let bytes = text.as_bytes();
    let mut spans = Vec::new();
    let mut idx = 0;

    while idx < bytes.len() {
        if bytes[idx] != b'_' {
            idx += 1;
            continue;
        }
        let run_start = idx + 1;
        let mut end = run_start;
        while end < bytes.len() && is_suffix_char(bytes[end]) {
            end += 1;
        }
        let run_len = end - run_start;
        if run_len == 0 {
            idx += 1;
            continue;
        }
        if end < bytes.len() && bytes[end] == b'_' {
            if run_len > 1 {
                spans.push(idx..end - 1);
                idx = end - 1;
            } else {
                idx += 1;
            }
            continue;
        }
        spans.push(idx..end);
        idx = end;
    }
    spans
}

fn is_suffix_char(byte: u8) -> bool {
    byte.is_ascii_lowercase() || byte.is_ascii_digit()
}

/// Rewrites `_<ephemeral>` to `_<stable>` wherever the mapping knows the id.
/// Unknown candidates are left alone.
pub fn normalize(script: &str, mapping: &IdentifierMapping) -> String {
    let mut out = String::with_capacity(script.len());
    let mut cursor = 0;
    for span in suffix_spans(script) {
        let candidate = script[span.clone()].trim_start_matches('_');
        match mapping.get(candidate) {
            Some(stable) if !stable.is_empty() => {
                out.push_str(&script[cursor..span.start]);
                out.push('_');
                out.push_str(stable);
                cursor = span.end;
            }
            _ => {}
        }
    }
    out.push_str(&script[cursor..]);
    out
}

/// Removes the whitespace prefix shared by every non-blank line.
/// Whitespace-only lines come out empty.
pub fn dedent(text: &str) -> String {
    let mut margin: Option<&str> = None;
    for line in text.split('\n') {
        if line.trim().is_empty() {
            continue;
        }
        let indent = &line[..line.len() - line.trim_start().len()];
        margin = Some(match margin {
            None => indent,
            Some(current) => common_prefix(current, indent),
        });
    }
    let margin = margin.unwrap_or("");

    text.split('\n')
        .map(|line| {
            if line.trim().is_empty() {
                ""
            } else {
                line.strip_prefix(margin).unwrap_or(line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn common_prefix<'a>(a: &'a str, b: &str) -> &'a str {
    let len = a
        .char_indices()
        .zip(b.chars())
        .take_while(|((_, x), y)| x == y)
        .last()
        .map(|((idx, ch), _)| idx + ch.len_utf8())
        .unwrap_or(0);
    &a[..len]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matched<'a>(text: &'a str) -> Vec<&'a str> {
        suffix_spans(text).into_iter().map(|s| &text[s]).collect()
    }

    #[test]
    fn scanner_backtracks_before_underscore() {
        assert_eq!(matched("marker_5f9d46;"), vec!["_5f9d46"]);
        assert_eq!(matched("tile_layer_abc)"), vec!["_laye", "_abc"]);
        assert_eq!(matched("marker_div_0_1"), vec!["_di", "_1"]);
        assert_eq!(matched("__a"), vec!["_a"]);
        assert!(matched("A_B C_").is_empty());
    }

    #[test]
    fn normalize_rewrites_known_ids_only() {
        let mut mapping = IdentifierMapping::new();
        mapping.insert("abc123", "div_0");
        mapping.insert("blank", "");
        let script = "L.control.layers({\"osm\": tile_layer_abc123}).addTo(map_zzz9); x_blank;";
        let out = normalize(script, &mapping);
        assert_eq!(
            out,
            "L.control.layers({\"osm\": tile_layer_div_0}).addTo(map_zzz9); x_blank;"
        );
    }

    #[test]
    fn normalize_is_noop_on_clean_input() {
        let mut mapping = IdentifierMapping::new();
        mapping.insert("a", "div");
        let script = "var M = L.map('X', {zoom: 4});\nM.setView([1.5, 2]);";
        assert_eq!(normalize(script, &mapping), script);
    }

    #[test]
    fn dedent_strips_shared_margin() {
        let text = "\n    var a = 1;\n      if (a) {}\n  \n    a += 1;\n";
        assert_eq!(dedent(text), "\nvar a = 1;\n  if (a) {}\n\na += 1;\n");
    }

    #[test]
    fn dedent_mixed_margins_keep_common_part() {
        assert_eq!(dedent("\t a\n\tb"), " a\nb");
        assert_eq!(dedent("a\n  b"), "a\n  b");
    }
}
