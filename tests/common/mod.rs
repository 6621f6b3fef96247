use retrograde::{Match, Pattern, Range};

/// Compile \p pattern with default flags, panicking on failure.
pub fn compile(pattern: &str) -> Pattern {
    Pattern::new(pattern)
        .unwrap_or_else(|err| panic!("pattern should have parsed: {}: {}", pattern, err))
}

/// Compile \p pattern with \p flags, panicking on failure.
pub fn compilef(pattern: &str, flags: &str) -> Pattern {
    Pattern::with_flags(pattern, flags)
        .unwrap_or_else(|err| panic!("pattern should have parsed: {}: {}", pattern, err))
}

/// Format a Match by inserting commas between the overall match and all
/// capture groups, non-participating groups rendering as empty.
pub fn format_match(m: &Match, input: &str) -> String {
    let mut result = input[m.range()].to_string();
    for group in &m.captures {
        result.push(',');
        if let Some(group) = group {
            result.push_str(&input[group.clone()]);
        }
    }
    result
}

/// All match ranges of \p pattern in \p text, with captures formatted.
pub fn all_matches(pattern: &Pattern, text: &str) -> Vec<(Range, String)> {
    pattern
        .match_ranges(text)
        .iter()
        .map(|m| (m.range(), format_match(m, text)))
        .collect()
}

/// Reverse a string's characters.
pub fn reverse_text(text: &str) -> String {
    text.chars().rev().collect()
}

pub trait StringTestHelpers {
    /// "Fluent" style helper for testing that a String equals a str.
    fn test_eq(&self, s: &str);
}

impl StringTestHelpers for String {
    fn test_eq(&self, rhs: &str) {
        assert_eq!(self.as_str(), rhs)
    }
}
