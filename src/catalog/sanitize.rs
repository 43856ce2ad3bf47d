//! Display string sanitization
//!
//! Applied to catalog codes and names before they leave the gateway.

/// Maximum length of a sanitized string, in characters
pub const MAX_DISPLAY_CHARS: usize = 255;

/// Strip `<` and `>`, trim, and cap at [`MAX_DISPLAY_CHARS`] characters.
///
/// `None` and blank input yield an empty string. The result is trimmed again
/// after truncation so that `clean(clean(x)) == clean(x)`.
pub fn clean(text: Option<&str>) -> String {
    let Some(text) = text else {
        return String::new();
    };
    if text.trim().is_empty() {
        return String::new();
    }

    let stripped: String = text.chars().filter(|c| !matches!(c, '<' | '>')).collect();
    let trimmed = stripped.trim();

    match trimmed.char_indices().nth(MAX_DISPLAY_CHARS) {
        Some((cut, _)) => trimmed[..cut].trim_end().to_string(),
        None => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_input() {
        assert_eq!(clean(None), "");
        assert_eq!(clean(Some("")), "");
        assert_eq!(clean(Some("  \t\n")), "");
    }

    #[test]
    fn test_strips_angle_brackets_and_trims() {
        assert_eq!(clean(Some("  <b>NDA</b> ")), "bNDA/b");
        assert_eq!(clean(Some("<script>alert(1)</script>")), "scriptalert(1)/script");
        assert_eq!(clean(Some(" <> ")), "");
    }

    #[test]
    fn test_truncates_to_max_chars() {
        let long = "é".repeat(300);
        let cleaned = clean(Some(&long));
        assert_eq!(cleaned.chars().count(), MAX_DISPLAY_CHARS);
    }

    #[test]
    fn test_exact_max_len_untouched() {
        let exact = "a".repeat(MAX_DISPLAY_CHARS);
        assert_eq!(clean(Some(&exact)), exact);
    }

    #[test]
    fn test_idempotent() {
        let mut samples = vec![
            "plain".to_string(),
            "  <i>x</i>  ".to_string(),
            "<<>>".to_string(),
            format!("{} tail", "a".repeat(254)),
            format!("<{}>", "b ".repeat(200)),
            "\u{a0}nbsp\u{a0}".to_string(),
        ];
        samples.push(format!("  {}", "c".repeat(400)));

        for sample in samples {
            let once = clean(Some(&sample));
            let twice = clean(Some(&once));
            assert_eq!(once, twice, "sample {sample:?}");
            assert!(!once.contains('<') && !once.contains('>'));
            assert!(once.chars().count() <= MAX_DISPLAY_CHARS);
        }
    }

    #[test]
    fn test_truncation_does_not_leave_trailing_space() {
        let sample = format!("{} tail", "a".repeat(254));
        let cleaned = clean(Some(&sample));
        assert_eq!(cleaned, "a".repeat(254));
    }
}
