//! Extraction of the literal alternatives of a static pattern.
//!
//! A pattern like `cat|dog` matches exactly two strings, and a caller that
//! knows this can run a plain substring search instead of the pattern
//! engine. The walk is over the raw source rather than the syntax tree so
//! it can bail out immediately on the first dynamic construct.

/// Enumerate every string \p pattern can match, or None if the matched
/// text is not a closed finite set of literals (classes, quantifiers,
/// wildcards, backreferences and anchors all disqualify it).
pub fn static_strings(pattern: &str) -> Option<Vec<String>> {
    let mut results = Vec::new();
    let mut current = String::new();
    let mut chars = pattern.chars();

    while let Some(c) = chars.next() {
        match c {
            '|' => results.push(std::mem::take(&mut current)),

            // Unescaped syntax characters make the match set dynamic.
            '(' | ')' | '[' | ']' | '{' | '}' | '*' | '+' | '?' | '^' | '$' | '.' => return None,

            '\\' => {
                let cp = match chars.next()? {
                    'n' => 0xA,
                    'r' => 0xD,
                    't' => 0x9,
                    'f' => 0xC,
                    'v' => 0xB,

                    'c' => {
                        let letter = chars.next()?;
                        if !letter.is_ascii_alphabetic() {
                            return None;
                        }
                        (letter as u32) % 32
                    }

                    '0' => {
                        // Up to two octal digits.
                        let mut cp = 0;
                        for _ in 0..2 {
                            match chars.clone().next().and_then(|c| c.to_digit(8)) {
                                Some(d) => {
                                    chars.next();
                                    cp = cp * 8 + d;
                                }
                                None => break,
                            }
                        }
                        cp
                    }

                    'x' => {
                        let hi = chars.next()?.to_digit(16)?;
                        let lo = chars.next()?.to_digit(16)?;
                        hi * 16 + lo
                    }

                    'u' => {
                        let mut rest = chars.clone();
                        if rest.next() == Some('{') {
                            chars.next();
                            let mut cp = 0u32;
                            let mut digits = 0;
                            loop {
                                let c = chars.next()?;
                                if c == '}' {
                                    break;
                                }
                                digits += 1;
                                cp = cp.saturating_mul(16).saturating_add(c.to_digit(16)?);
                            }
                            if digits == 0 {
                                return None;
                            }
                            cp
                        } else {
                            let mut cp = 0;
                            for _ in 0..4 {
                                cp = cp * 16 + chars.next()?.to_digit(16)?;
                            }
                            cp
                        }
                    }

                    // Class escapes, assertions, property classes and
                    // backreferences are never a single literal.
                    'd' | 'D' | 's' | 'S' | 'w' | 'W' | 'b' | 'B' | 'p' | 'P' | 'k' => {
                        return None
                    }
                    '1'..='9' => return None,

                    // Identity escape.
                    other => other as u32,
                };
                current.push(char::from_u32(cp)?);
            }

            c => current.push(c),
        }
    }

    results.push(current);
    Some(results)
}
