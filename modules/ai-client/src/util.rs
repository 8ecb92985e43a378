/// Truncate a string to at most `max_bytes` bytes at a character boundary.
pub fn truncate_to_char_boundary(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_on_char_boundary() {
        let text = "Rotterdam → Shanghai";
        let truncated = truncate_to_char_boundary(text, 11);
        assert!(truncated.len() <= 11);
        assert!(text.starts_with(truncated));
        assert_eq!(truncated, "Rotterdam ");
    }

    #[test]
    fn short_strings_are_untouched() {
        assert_eq!(truncate_to_char_boundary("FCL", 100), "FCL");
    }
}
