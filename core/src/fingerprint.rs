// leafweave-core/src/fingerprint.rs
// Content fingerprint the host uses to decide whether two renders are the
// same interactive session.

use std::sync::OnceLock;

use regex::Regex;
use sha2::{Digest, Sha256};

fn suffix_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"_[a-z0-9]+").expect("static suffix pattern"))
}

/// Per-session path segments some tile services put in their URLs.
fn session_url_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"maps/[-a-z0-9]+/").expect("static url pattern"))
}

/// Script with every `_<suffix>` and tile-session path removed, so renders
/// that differ only in generated ids compare equal.
pub fn standardize_script(script: &str) -> String {
    let stripped = suffix_pattern().replace_all(script, "");
    session_url_pattern().replace_all(&stripped, "").into_owned()
}

/// SHA-256 hex digest over the standardized script, the key and the hover
/// flag.
pub fn content_fingerprint(script: &str, key: &str, return_on_hover: bool) -> String {
    let mut hasher = Sha256::new();
    hasher.update(standardize_script(script).as_bytes());
    hasher.update(key.as_bytes());
    hasher.update(if return_on_hover { b"true".as_slice() } else { b"false".as_slice() });
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standardize_drops_suffixes_and_session_paths() {
        let script = "var marker_3fa9 = L.tileLayer('https://x/maps/ab-12/{z}').addTo(map_div);";
        assert_eq!(
            standardize_script(script),
            "var marker = L.tileLayer('https://x/{z}').addTo(map);"
        );
    }

    #[test]
    fn fingerprint_is_fixed_length_hex() {
        let fp = content_fingerprint("var map_div = L.map('map_div');", "k_0", false);
        assert_eq!(fp.len(), 64);
        assert!(fp.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn ephemeral_suffixes_do_not_change_fingerprint() {
        let a = content_fingerprint("var marker_aaa111 = 1;", "k", false);
        let b = content_fingerprint("var marker_bbb222 = 1;", "k", false);
        assert_eq!(a, b);
    }

    #[test]
    fn key_and_hover_change_fingerprint() {
        let base = content_fingerprint("var map_div = 1;", "k", false);
        assert_ne!(base, content_fingerprint("var map_div = 1;", "k", true));
        assert_ne!(base, content_fingerprint("var map_div = 1;", "other", false));
    }
}
