//! Parser from pattern source to the syntax tree.

use crate::api::Flags;
use crate::ast::{
    AnchorType, Bracket, BracketChar, BracketItem, ClassEscape, Escape, EscapeStyle, Expr, Group,
    Lookaround, Node, Quantifier, Sequence,
};
use crate::types::{CaptureGroupID, CaptureGroupName, CharacterClassType, MAX_CAPTURE_GROUPS};

/// Represents an error encountered while parsing a pattern.
/// The text contains a human-readable message; the position is the byte
/// offset into the pattern source where parsing failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{text} (near offset {position})")]
pub struct Error {
    pub text: String,
    pub position: usize,
}

fn error_at<T, S: ToString>(text: S, position: usize) -> Result<T, Error> {
    Err(Error {
        text: text.to_string(),
        position,
    })
}

/// Append \p node to \p result, coalescing adjacent literal runs.
fn push_node(result: &mut Sequence, node: Node) {
    if let Node::Literal(s) = &node {
        if let Some(Node::Literal(prev)) = result.last_mut() {
            prev.push_str(s);
            return;
        }
    }
    result.push(node);
}

/// A character escape: either a real escape node or an identity escape
/// standing for the character itself.
enum EscapedChar {
    Escape(Escape),
    Identity(char),
}

/// One member parsed inside a bracket expression.
enum BracketAtom {
    Char(BracketChar),
    Class(ClassEscape),
    Property { name: String, negate: bool },
}

impl BracketAtom {
    fn into_item(self) -> BracketItem {
        match self {
            BracketAtom::Char(c) => BracketItem::Char(c),
            BracketAtom::Class(ce) => BracketItem::Class(ce),
            BracketAtom::Property { name, negate } => BracketItem::Property { name, negate },
        }
    }
}

/// Represents the state used to parse a pattern.
struct Parser<'a> {
    /// The pattern source.
    source: &'a str,

    /// Cursor position as a byte offset into the source.
    pos: usize,

    /// Flags used. Only parsing-relevant flags matter here; the rest are
    /// carried through for re-rendering.
    flags: Flags,

    /// Number of capturing groups encountered so far.
    group_count: CaptureGroupID,

    /// Names of capturing groups in index order; None for unnamed groups.
    group_names: Vec<Option<CaptureGroupName>>,

    /// Maximum numeric backreference encountered, and where.
    max_backref: CaptureGroupID,
    max_backref_pos: usize,

    /// Named backreferences encountered, validated after the full pass so
    /// that forward references parse.
    named_backrefs: Vec<(CaptureGroupName, usize)>,
}

impl<'a> Parser<'a> {
    fn error<T, S: ToString>(&self, text: S) -> Result<T, Error> {
        error_at(text, self.pos)
    }

    /// Peek at the next character.
    fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    /// \return the next character, advancing the cursor.
    fn next(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    /// Consume a character known to be next, returning it.
    fn consume(&mut self, c: char) -> char {
        let nc = self.next();
        debug_assert!(nc == Some(c), "char was not next");
        c
    }

    /// If the next character is \p c, consume it and return true.
    fn try_consume(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    /// If the source continues with the string \p s, consume it and return
    /// true.
    fn try_consume_str(&mut self, s: &str) -> bool {
        if self.source[self.pos..].starts_with(s) {
            self.pos += s.len();
            true
        } else {
            false
        }
    }

    fn try_parse(mut self) -> Result<Expr, Error> {
        // Parse a disjunction. If we consume everything, it's success. If
        // there's something left, it's an error (for example, an excess
        // closing paren).
        let alts = self.consume_disjunction()?;
        match self.peek() {
            Some(')') => self.error("Unbalanced parenthesis"),
            Some(c) => self.error(format!("Unexpected char: {}", c)),
            None => self.finalize(alts),
        }
    }

    fn consume_disjunction(&mut self) -> Result<Vec<Sequence>, Error> {
        let mut alts = vec![self.consume_sequence()?];
        while self.try_consume('|') {
            alts.push(self.consume_sequence()?);
        }
        Ok(alts)
    }

    fn consume_sequence(&mut self) -> Result<Sequence, Error> {
        let mut result: Sequence = Vec::new();
        loop {
            let c = match self.peek() {
                None => break,
                Some(c) => c,
            };
            let mut quantifier_allowed = true;
            match c {
                // A sequence is terminated by a closing paren or a vertical
                // bar (alternation).
                ')' | '|' => break,

                '^' => {
                    self.consume('^');
                    result.push(Node::Anchor(AnchorType::Start));
                    quantifier_allowed = false;
                }

                '$' => {
                    self.consume('$');
                    result.push(Node::Anchor(AnchorType::End));
                    quantifier_allowed = false;
                }

                '\\' => {
                    self.consume('\\');
                    let node = self.consume_atom_escape()?;
                    if let Node::Anchor(_) = node {
                        quantifier_allowed = false;
                    }
                    push_node(&mut result, node);
                }

                '.' => {
                    self.consume('.');
                    result.push(Node::Dot);
                }

                '(' => {
                    if self.try_consume_str("(?=") {
                        quantifier_allowed = false;
                        result.push(self.consume_lookaround(false, false)?);
                    } else if self.try_consume_str("(?!") {
                        quantifier_allowed = false;
                        result.push(self.consume_lookaround(true, false)?);
                    } else if self.try_consume_str("(?<=") {
                        quantifier_allowed = false;
                        result.push(self.consume_lookaround(false, true)?);
                    } else if self.try_consume_str("(?<!") {
                        quantifier_allowed = false;
                        result.push(self.consume_lookaround(true, true)?);
                    } else if self.try_consume_str("(?:") {
                        let alts = self.consume_disjunction()?;
                        result.push(Node::Group(Group {
                            alts,
                            index: None,
                            name: None,
                        }));
                    } else if self.try_consume_str("(?<") {
                        let name = self.consume_group_name()?;
                        let index = self.new_capture_group(Some(name.clone()))?;
                        let alts = self.consume_disjunction()?;
                        result.push(Node::Group(Group {
                            alts,
                            index: Some(index),
                            name: Some(name),
                        }));
                    } else if self.try_consume_str("(?") {
                        return self.error("Invalid group");
                    } else {
                        self.consume('(');
                        let index = self.new_capture_group(None)?;
                        let alts = self.consume_disjunction()?;
                        result.push(Node::Group(Group {
                            alts,
                            index: Some(index),
                            name: None,
                        }));
                    }
                    if !self.try_consume(')') {
                        return self.error("Unbalanced parenthesis");
                    }
                }

                '[' => {
                    result.push(self.consume_bracket()?);
                }

                ']' => {
                    return self.error("Unbalanced bracket");
                }

                c => {
                    // It's an error if this parses successfully as a
                    // quantifier; note this covers *, + and ?. A brace that
                    // fails to parse as a quantifier falls through and is
                    // taken literally.
                    let saved = self.pos;
                    if self.try_consume_quantifier()?.is_some() {
                        self.pos = saved;
                        return self.error("Nothing to repeat");
                    }
                    self.pos = saved;
                    self.consume(c);
                    push_node(&mut result, Node::Literal(c.to_string()));
                }
            }

            // We just parsed a term; try parsing a quantifier.
            let quant_pos = self.pos;
            if let Some(quant) = self.try_consume_quantifier()? {
                if !quantifier_allowed {
                    return error_at("Quantifier not allowed here", quant_pos);
                }
                if let Some(max) = quant.max {
                    if quant.min > max {
                        return error_at("Invalid quantifier", quant_pos);
                    }
                }
                let target = match result.pop() {
                    // A quantifier binds only the last character of a
                    // coalesced literal run.
                    Some(Node::Literal(mut s)) => {
                        let last = s.pop().expect("literal runs are never empty");
                        if !s.is_empty() {
                            result.push(Node::Literal(s));
                        }
                        Node::Literal(last.to_string())
                    }
                    Some(node) => node,
                    None => return error_at("Nothing to repeat", quant_pos),
                };
                result.push(Node::Repeat {
                    node: Box::new(target),
                    quant,
                });
            }
        }
        Ok(result)
    }

    /// Parse the body of a lookaround whose opening sequence has been
    /// consumed. The shared caller consumes the closing paren.
    fn consume_lookaround(&mut self, negate: bool, behind: bool) -> Result<Node, Error> {
        let alts = self.consume_disjunction()?;
        Ok(Node::Lookaround(Lookaround {
            alts,
            negate,
            behind,
        }))
    }

    fn new_capture_group(
        &mut self,
        name: Option<CaptureGroupName>,
    ) -> Result<CaptureGroupID, Error> {
        if self.group_count as usize >= MAX_CAPTURE_GROUPS {
            return self.error("Capture group count limit exceeded");
        }
        if let Some(name) = &name {
            if self.group_names.iter().any(|n| n.as_deref() == Some(name.as_str())) {
                return self.error(format!("Duplicate capture group name: {}", name));
            }
        }
        self.group_count += 1;
        self.group_names.push(name);
        Ok(self.group_count)
    }

    /// Parse a group name up to and including the closing '>'.
    fn consume_group_name(&mut self) -> Result<CaptureGroupName, Error> {
        let mut name = String::new();
        loop {
            match self.next() {
                Some('>') => break,
                Some(c) if c.is_alphanumeric() || c == '_' || c == '$' => name.push(c),
                Some(c) => return self.error(format!("Invalid character in group name: {}", c)),
                None => return self.error("Unterminated group name"),
            }
        }
        if name.is_empty() {
            return self.error("Empty group name");
        }
        Ok(name)
    }

    /// Parse a property class name up to and including the closing brace.
    /// The leading \p or \P has been consumed.
    fn consume_property_name(&mut self) -> Result<String, Error> {
        if !self.try_consume('{') {
            return self.error("Invalid property class");
        }
        let mut name = String::new();
        loop {
            match self.next() {
                Some('}') => break,
                Some(c) if c.is_ascii_alphanumeric() || c == '_' || c == '=' => name.push(c),
                Some(c) => {
                    return self.error(format!("Invalid character in property name: {}", c))
                }
                None => return self.error("Unterminated property class"),
            }
        }
        if name.is_empty() {
            return self.error("Empty property class");
        }
        Ok(name)
    }

    fn consume_atom_escape(&mut self) -> Result<Node, Error> {
        let c = match self.peek() {
            Some(c) => c,
            None => return self.error("Incomplete escape"),
        };
        match c {
            'b' | 'B' => {
                self.consume(c);
                Ok(Node::Anchor(if c == 'b' {
                    AnchorType::WordBoundary
                } else {
                    AnchorType::NotWordBoundary
                }))
            }

            'd' | 'D' | 's' | 'S' | 'w' | 'W' => {
                self.consume(c);
                Ok(Node::Class(class_escape(c)))
            }

            '1'..='9' => {
                // This is a backreference.
                let start = self.pos;
                let val = self.try_consume_decimal().unwrap();
                if val as usize > MAX_CAPTURE_GROUPS {
                    return error_at(format!("Backreference \\{} too large", val), start);
                }
                if val > self.max_backref {
                    self.max_backref = val;
                    self.max_backref_pos = start;
                }
                Ok(Node::BackRef(val))
            }

            'k' => {
                self.consume('k');
                if !self.try_consume('<') {
                    return self.error("Invalid named backreference");
                }
                let start = self.pos;
                let name = self.consume_group_name()?;
                self.named_backrefs.push((name.clone(), start));
                Ok(Node::NamedBackRef(name))
            }

            'p' | 'P' => {
                self.consume(c);
                let name = self.consume_property_name()?;
                Ok(Node::Property {
                    name,
                    negate: c == 'P',
                })
            }

            _ => match self.consume_character_escape()? {
                EscapedChar::Escape(e) => Ok(Node::Escaped(e)),
                EscapedChar::Identity(c) => Ok(Node::Literal(c.to_string())),
            },
        }
    }

    fn consume_character_escape(&mut self) -> Result<EscapedChar, Error> {
        let c = match self.peek() {
            Some(c) => c,
            None => return self.error("Incomplete escape"),
        };
        match c {
            'f' | 'n' | 'r' | 't' | 'v' => {
                self.consume(c);
                let cp = match c {
                    'f' => 0xC,
                    'n' => 0xA,
                    'r' => 0xD,
                    't' => 0x9,
                    _ => 0xB,
                };
                Ok(EscapedChar::Escape(Escape {
                    style: EscapeStyle::Letter(c),
                    cp,
                }))
            }

            'c' => {
                // Control escape.
                self.consume('c');
                match self.next() {
                    Some(letter) if letter.is_ascii_alphabetic() => {
                        Ok(EscapedChar::Escape(Escape {
                            style: EscapeStyle::Control(letter),
                            cp: (letter as u32) % 32,
                        }))
                    }
                    _ => self.error("Invalid character escape"),
                }
            }

            '0' => {
                // \0 optionally followed by up to two octal digits.
                self.consume('0');
                let mut cp = 0u32;
                for _ in 0..2 {
                    match self.peek().and_then(|c| c.to_digit(8)) {
                        Some(d) => {
                            self.next();
                            cp = cp * 8 + d;
                        }
                        None => break,
                    }
                }
                Ok(EscapedChar::Escape(Escape {
                    style: EscapeStyle::Octal,
                    cp,
                }))
            }

            'x' => {
                // Hex escape: x HexDigit HexDigit.
                self.consume('x');
                let hi = self.next().and_then(|c| c.to_digit(16));
                let lo = self.next().and_then(|c| c.to_digit(16));
                match (hi, lo) {
                    (Some(hi), Some(lo)) => Ok(EscapedChar::Escape(Escape {
                        style: EscapeStyle::Hex,
                        cp: hi * 16 + lo,
                    })),
                    _ => self.error("Invalid character escape"),
                }
            }

            'u' => {
                self.consume('u');
                if self.try_consume('{') {
                    let mut cp = 0u32;
                    let mut digits = 0;
                    loop {
                        match self.next() {
                            Some('}') => break,
                            Some(c) => match c.to_digit(16) {
                                Some(d) => {
                                    digits += 1;
                                    cp = cp.saturating_mul(16).saturating_add(d);
                                }
                                None => return self.error("Invalid unicode escape"),
                            },
                            None => return self.error("Unterminated unicode escape"),
                        }
                    }
                    if digits == 0 || cp > 0x10FFFF {
                        return self.error("Invalid unicode escape");
                    }
                    Ok(EscapedChar::Escape(Escape {
                        style: EscapeStyle::UnicodeBrace,
                        cp,
                    }))
                } else {
                    let mut cp = 0u32;
                    for _ in 0..4 {
                        match self.next().and_then(|c| c.to_digit(16)) {
                            Some(d) => cp = cp * 16 + d,
                            None => return self.error("Invalid unicode escape"),
                        }
                    }
                    Ok(EscapedChar::Escape(Escape {
                        style: EscapeStyle::Unicode,
                        cp,
                    }))
                }
            }

            // Identity escapes: syntax characters plus a few conventional
            // extras.
            '^' | '$' | '\\' | '.' | '*' | '+' | '?' | '(' | ')' | '[' | ']' | '{' | '}' | '|'
            | '/' | '-' => Ok(EscapedChar::Identity(self.consume(c))),

            c if c.is_ascii_alphabetic() => Ok(EscapedChar::Identity(self.consume(c))),

            _ => self.error("Invalid character escape"),
        }
    }

    fn consume_bracket(&mut self) -> Result<Node, Error> {
        self.consume('[');
        let mut result = Bracket::default();
        result.negate = self.try_consume('^');

        loop {
            match self.peek() {
                None => return self.error("Unbalanced bracket"),
                Some(']') => {
                    self.consume(']');
                    return Ok(Node::Bracket(result));
                }
                _ => {}
            }

            let first = match self.try_consume_bracket_atom()? {
                Some(atom) => atom,
                None => continue,
            };

            // Check for a dash; we may have a range.
            if !self.try_consume('-') {
                result.items.push(first.into_item());
                continue;
            }

            let second = match self.try_consume_bracket_atom()? {
                Some(atom) => atom,
                None => {
                    // No second atom. For example: [a-].
                    result.items.push(first.into_item());
                    result
                        .items
                        .push(BracketItem::Char(BracketChar::Literal('-')));
                    continue;
                }
            };

            match (first, second) {
                (BracketAtom::Char(lo), BracketAtom::Char(hi)) => {
                    // Ranges must be in order: z-a is invalid.
                    if lo.code_point() > hi.code_point() {
                        return self.error("Invalid character range");
                    }
                    result.items.push(BracketItem::Range(lo, hi));
                }
                // A dash adjacent to a class is a literal dash, not a range
                // operator: [\d-z] has the three members \d, '-' and 'z'.
                (first, second) => {
                    result.items.push(first.into_item());
                    result
                        .items
                        .push(BracketItem::Char(BracketChar::Literal('-')));
                    result.items.push(second.into_item());
                }
            }
        }
    }

    fn try_consume_bracket_atom(&mut self) -> Result<Option<BracketAtom>, Error> {
        let c = match self.peek() {
            Some(c) => c,
            None => return Ok(None),
        };
        match c {
            // End of bracket.
            ']' => Ok(None),

            // Escape sequence.
            '\\' => {
                self.consume('\\');
                let ec = match self.peek() {
                    Some(c) => c,
                    None => return self.error("Unterminated escape"),
                };
                match ec {
                    'd' | 'D' | 's' | 'S' | 'w' | 'W' => {
                        self.consume(ec);
                        Ok(Some(BracketAtom::Class(class_escape(ec))))
                    }

                    'p' | 'P' => {
                        self.consume(ec);
                        let name = self.consume_property_name()?;
                        Ok(Some(BracketAtom::Property {
                            name,
                            negate: ec == 'P',
                        }))
                    }

                    // Inside a bracket, \b is the backspace character.
                    'b' => {
                        self.consume('b');
                        Ok(Some(BracketAtom::Char(BracketChar::Escaped(Escape {
                            style: EscapeStyle::Letter('b'),
                            cp: 0x8,
                        }))))
                    }

                    _ => match self.consume_character_escape()? {
                        EscapedChar::Escape(e) => {
                            Ok(Some(BracketAtom::Char(BracketChar::Escaped(e))))
                        }
                        EscapedChar::Identity(c) => {
                            Ok(Some(BracketAtom::Char(BracketChar::Literal(c))))
                        }
                    },
                }
            }

            c => {
                self.consume(c);
                Ok(Some(BracketAtom::Char(BracketChar::Literal(c))))
            }
        }
    }

    fn try_consume_quantifier(&mut self) -> Result<Option<Quantifier>, Error> {
        if let Some(mut quant) = self.try_consume_quantifier_prefix()? {
            quant.lazy = self.try_consume('?');
            Ok(Some(quant))
        } else {
            Ok(None)
        }
    }

    fn try_consume_quantifier_prefix(&mut self) -> Result<Option<Quantifier>, Error> {
        let c = match self.peek() {
            Some(c) => c,
            None => return Ok(None),
        };
        match c {
            '*' => {
                self.consume('*');
                Ok(Some(Quantifier {
                    min: 0,
                    max: None,
                    lazy: false,
                }))
            }
            '+' => {
                self.consume('+');
                Ok(Some(Quantifier {
                    min: 1,
                    max: None,
                    lazy: false,
                }))
            }
            '?' => {
                self.consume('?');
                Ok(Some(Quantifier {
                    min: 0,
                    max: Some(1),
                    lazy: false,
                }))
            }
            '{' => {
                // A brace that does not form a valid quantifier is not an
                // error; it is an ordinary character.
                let saved = self.pos;
                self.consume('{');
                let min = match self.try_consume_decimal() {
                    Some(v) => v,
                    None => {
                        self.pos = saved;
                        return Ok(None);
                    }
                };
                let max = if self.try_consume(',') {
                    // {3,} parses with no upper bound.
                    self.try_consume_decimal()
                } else {
                    Some(min)
                };
                if !self.try_consume('}') {
                    self.pos = saved;
                    return Ok(None);
                }
                Ok(Some(Quantifier {
                    min,
                    max,
                    lazy: false,
                }))
            }
            _ => Ok(None),
        }
    }

    /// Parse a decimal integer. If the value would overflow, u32::MAX is
    /// returned; all decimal digits are consumed regardless.
    fn try_consume_decimal(&mut self) -> Option<u32> {
        let mut result: u32 = 0;
        let mut digits = 0;
        while let Some(d) = self.peek().and_then(|c| c.to_digit(10)) {
            self.next();
            digits += 1;
            result = result.saturating_mul(10).saturating_add(d);
        }
        if digits > 0 {
            Some(result)
        } else {
            None
        }
    }

    fn finalize(self, alts: Vec<Sequence>) -> Result<Expr, Error> {
        debug_assert!(self.group_count as usize <= MAX_CAPTURE_GROUPS);
        if self.max_backref > self.group_count {
            return error_at(
                format!(
                    "Backreference \\{} exceeds number of capture groups",
                    self.max_backref
                ),
                self.max_backref_pos,
            );
        }
        for (name, position) in &self.named_backrefs {
            if !self
                .group_names
                .iter()
                .any(|n| n.as_deref() == Some(name.as_str()))
            {
                return error_at(
                    format!("Backreference to unknown group name: {}", name),
                    *position,
                );
            }
        }
        Ok(Expr {
            alts,
            flags: self.flags,
            group_count: self.group_count,
            group_names: self.group_names,
        })
    }
}

fn class_escape(letter: char) -> ClassEscape {
    let class_type = match letter.to_ascii_lowercase() {
        'd' => CharacterClassType::Digits,
        's' => CharacterClassType::Spaces,
        'w' => CharacterClassType::Words,
        _ => panic!("not a class escape letter"),
    };
    ClassEscape {
        class_type,
        negate: letter.is_ascii_uppercase(),
    }
}

/// Try parsing a given pattern with the given flags.
/// Return the resulting syntax tree, or an error.
pub fn parse(pattern: &str, flags: Flags) -> Result<Expr, Error> {
    let parser = Parser {
        source: pattern,
        pos: 0,
        flags,
        group_count: 0,
        group_names: Vec::new(),
        max_backref: 0,
        max_backref_pos: 0,
        named_backrefs: Vec::new(),
    };
    parser.try_parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(pattern: &str) -> Expr {
        parse(pattern, Flags::default()).unwrap()
    }

    fn roundtrips(pattern: &str) {
        assert_eq!(parsed(pattern).to_string(), pattern, "pattern: {}", pattern);
    }

    #[test]
    fn rendering_roundtrips() {
        roundtrips("");
        roundtrips("abc");
        roundtrips("a(b)c");
        roundtrips("cat|dog|");
        roundtrips("(?:ab|cd)+ef");
        roundtrips(r"(?<year>\d{4})-\k<year>");
        roundtrips(r"(?=x)(?!y)(?<=z)(?<!w)");
        roundtrips(r"[^\s]{2,3}?");
        roundtrips(r"a.b\.c");
        roundtrips(r"\p{Lu}\P{L}");
        roundtrips(r"^ab$");
        roundtrips(r"(a)\1");
    }

    #[test]
    fn literal_runs_coalesce() {
        let expr = parsed("abc");
        assert_eq!(expr.alts.len(), 1);
        assert_eq!(expr.alts[0], vec![Node::Literal("abc".to_string())]);
    }

    #[test]
    fn quantifier_binds_last_literal_char() {
        let expr = parsed("ab*");
        assert_eq!(expr.alts[0].len(), 2);
        assert_eq!(expr.alts[0][0], Node::Literal("a".to_string()));
        assert!(matches!(
            &expr.alts[0][1],
            Node::Repeat { node, .. } if **node == Node::Literal("b".to_string())
        ));
        assert_eq!(expr.to_string(), "ab*");
    }

    #[test]
    fn group_indices_are_assigned_in_source_order() {
        let expr = parsed("((a)(b))(?:c)(?<last>d)");
        assert_eq!(expr.group_count, 4);
        assert_eq!(
            expr.group_names,
            vec![None, None, None, Some("last".to_string())]
        );
        let groups = expr.capture_groups();
        assert_eq!(groups.len(), 4);
        for (i, group) in groups.iter().enumerate() {
            assert_eq!(group.index, Some(i as u32 + 1));
        }
        assert_eq!(expr.group_index("last"), Some(4));
        assert_eq!(expr.group_index("missing"), None);
    }

    #[test]
    fn named_backreference_may_precede_its_group() {
        let expr = parsed(r"\k<name>(?<name>a)");
        assert_eq!(expr.group_count, 1);
        assert!(parse(r"\k<other>(?<name>a)", Flags::default()).is_err());
    }

    #[test]
    fn numeric_backreference_validation() {
        assert!(parse(r"(a)\1", Flags::default()).is_ok());
        assert!(parse(r"\1(a)", Flags::default()).is_ok());
        let err = parse(r"(a)\2", Flags::default()).unwrap_err();
        assert!(err.text.contains("exceeds"));
        assert_eq!(err.position, 4);
    }

    #[test]
    fn malformed_braces_are_literal() {
        assert_eq!(parsed("a{").to_string(), r"a\{");
        assert_eq!(parsed("a{2").to_string(), r"a\{2");
        assert_eq!(parsed("a{,2}").to_string(), r"a\{,2\}");
        assert_eq!(parsed("{x}").to_string(), r"\{x\}");
        // A well-formed brace quantifier still applies.
        assert_eq!(parsed("a{2,}").to_string(), "a{2,}");
    }

    #[test]
    fn quantifier_errors() {
        assert!(parse("*a", Flags::default()).is_err());
        assert!(parse("a**", Flags::default()).is_err());
        assert!(parse("^*", Flags::default()).is_err());
        assert!(parse(r"\b+", Flags::default()).is_err());
        assert!(parse("(?=a)*", Flags::default()).is_err());
        assert!(parse("a{3,2}", Flags::default()).is_err());
    }

    #[test]
    fn bracket_edge_cases() {
        // Trailing dash is literal.
        roundtrips(r"[a\-]");
        assert_eq!(parsed("[a-]").to_string(), r"[a\-]");
        // Members that need re-escaping on output.
        assert_eq!(parsed(r"[a-z\d\]^-]").to_string(), r"[a-z\d\]\^\-]");
        // Dash adjacent to a class is literal.
        assert_eq!(parsed(r"[\d-z]").to_string(), r"[\d\-z]");
        assert_eq!(parsed(r"[a-\d]").to_string(), r"[a\-\d]");
        // Inside a bracket \b is backspace, not a word boundary.
        let expr = parsed(r"[\b]");
        match &expr.alts[0][0] {
            Node::Bracket(b) => match &b.items[0] {
                BracketItem::Char(c) => assert_eq!(c.code_point(), 0x8),
                other => panic!("unexpected item: {:?}", other),
            },
            other => panic!("unexpected node: {:?}", other),
        }
        // Out-of-order ranges are invalid.
        assert!(parse("[z-a]", Flags::default()).is_err());
        // Escaped range endpoints.
        let expr = parsed(r"[\x41-\x5a]");
        match &expr.alts[0][0] {
            Node::Bracket(b) => assert!(matches!(
                &b.items[0],
                BracketItem::Range(lo, hi) if lo.code_point() == 0x41 && hi.code_point() == 0x5a
            )),
            other => panic!("unexpected node: {:?}", other),
        }
    }

    #[test]
    fn escape_values() {
        let expr = parsed(r"\n\x41\u{43}\cA\07");
        let cps: Vec<u32> = expr.alts[0]
            .iter()
            .map(|n| match n {
                Node::Escaped(e) => e.cp,
                other => panic!("unexpected node: {:?}", other),
            })
            .collect();
        assert_eq!(cps, vec![0xA, 0x41, 0x43, 0x1, 0o7]);
    }

    #[test]
    fn parse_errors() {
        for pattern in &[
            "(", "(a", ")", "a)", "[", "[a", "(?", "(?<", "(?<>a)", r"\",
            r"\x4", r"\u12", r"\u{}", r"\u{110000}", r"\c1", r"\k<", r"\kx",
            r"\p", r"\p{}", "]",
        ] {
            assert!(
                parse(pattern, Flags::default()).is_err(),
                "pattern should not have parsed: {}",
                pattern
            );
        }
    }

    #[test]
    fn duplicate_group_names_rejected() {
        assert!(parse("(?<x>a)(?<x>b)", Flags::default()).is_err());
    }

    #[test]
    fn errors_carry_positions() {
        let err = parse("ab(cd", Flags::default()).unwrap_err();
        assert_eq!(err.position, 5);
        let err = parse("ab)", Flags::default()).unwrap_err();
        assert_eq!(err.position, 2);
    }
}
