//! Filesystem-safe names for free-text fields.

/// Characters that break paths on at least one supported platform.
pub const FORBIDDEN_CHARS: [char; 9] = ['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Replace every path-breaking character with a hyphen.
pub fn sanitize(text: &str) -> String {
    text.chars()
        .map(|c| if FORBIDDEN_CHARS.contains(&c) { '-' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_sanitize_replaces_every_forbidden_char() {
        assert_eq!(sanitize(r#"a/b\c:d*e?f"g<h>i|j"#), "a-b-c-d-e-f-g-h-i-j");
    }

    #[test]
    fn test_sanitize_keeps_other_text() {
        assert_eq!(sanitize("Société Générale - Lot 4"), "Société Générale - Lot 4");
        assert_eq!(sanitize(""), "");
    }

    #[test]
    fn test_sanitize_output_is_clean_and_stable() {
        let inputs = ["Acme/Corp", "C:\\temp\\x", "<<??>>", "a|b|c", "\"quoted\"", "plain"];
        for input in inputs {
            let once = sanitize(input);
            assert!(!once.contains(FORBIDDEN_CHARS), "{input:?} -> {once:?}");
            assert_eq!(sanitize(&once), once);
        }
    }
}
