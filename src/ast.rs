//! Syntax tree for patterns.
//!
//! Unlike the intermediate representations used by matching engines, this
//! tree preserves the syntactic form of the pattern: escapes remember how
//! they were spelled, brackets keep their members in source order, and the
//! whole tree can be rendered back to a pattern string acceptable to the
//! host engine. That property is what makes structural reversal possible.

use crate::api::Flags;
use crate::types::{CaptureGroupID, CaptureGroupName, CharacterClassType};
use core::fmt::{self, Write};

/// How a code point escape was spelled in the source.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EscapeStyle {
    /// \xHH
    Hex,
    /// \uHHHH
    Unicode,
    /// \u{H+}
    UnicodeBrace,
    /// \0 followed by up to two octal digits.
    Octal,
    /// \cX control escape; the field is the control letter.
    Control(char),
    /// A single-letter escape like \n or \t.
    Letter(char),
}

/// A code point escape, kept as (spelling, value) so the code point
/// survives reversal without being re-rendered eagerly.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Escape {
    pub style: EscapeStyle,
    pub cp: u32,
}

impl Escape {
    fn write(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.style {
            EscapeStyle::Hex => write!(f, "\\x{:02x}", self.cp),
            EscapeStyle::Unicode => write!(f, "\\u{:04x}", self.cp),
            EscapeStyle::UnicodeBrace => write!(f, "\\u{{{:x}}}", self.cp),
            // The host engine rejects legacy octal, so re-render as hex.
            // The escape never exceeds \077 so two digits always suffice.
            EscapeStyle::Octal => write!(f, "\\x{:02x}", self.cp),
            EscapeStyle::Control(letter) => write!(f, "\\c{}", letter),
            EscapeStyle::Letter(letter) => write!(f, "\\{}", letter),
        }
    }
}

/// A shorthand class escape like \d or \W, usable both as an atom and as a
/// bracket member.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ClassEscape {
    pub class_type: CharacterClassType,
    pub negate: bool,
}

impl ClassEscape {
    fn write(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let letter = self.class_type.letter();
        let letter = if self.negate {
            letter.to_ascii_uppercase()
        } else {
            letter
        };
        write!(f, "\\{}", letter)
    }
}

/// A single bracket member character: written literally or as an escape.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BracketChar {
    Literal(char),
    Escaped(Escape),
}

impl BracketChar {
    /// \return the code point this member stands for.
    pub fn code_point(&self) -> u32 {
        match self {
            BracketChar::Literal(c) => *c as u32,
            BracketChar::Escaped(e) => e.cp,
        }
    }

    fn write(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            BracketChar::Literal(c) => {
                if matches!(c, ']' | '\\' | '^' | '-') {
                    f.write_char('\\')?;
                }
                f.write_char(c)
            }
            BracketChar::Escaped(e) => e.write(f),
        }
    }
}

/// One member of a bracket expression.
#[derive(Debug, Clone, PartialEq)]
pub enum BracketItem {
    Char(BracketChar),
    Range(BracketChar, BracketChar),
    Class(ClassEscape),
    Property { name: String, negate: bool },
}

/// A bracket expression like [a-z\d].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Bracket {
    pub negate: bool,
    pub items: Vec<BracketItem>,
}

impl Bracket {
    /// Normalize away the negation so that two brackets can be merged by
    /// item union alone. Only a lone shorthand class can be flipped; any
    /// other negated bracket (and any bracket containing a Unicode property
    /// class) is not statically invertible.
    pub fn make_positive(&self) -> Option<Bracket> {
        if self
            .items
            .iter()
            .any(|item| matches!(item, BracketItem::Property { .. }))
        {
            return None;
        }
        if !self.negate {
            return Some(self.clone());
        }
        match self.items.as_slice() {
            [BracketItem::Class(ce)] => Some(Bracket {
                negate: false,
                items: vec![BracketItem::Class(ClassEscape {
                    class_type: ce.class_type,
                    negate: !ce.negate,
                })],
            }),
            _ => None,
        }
    }

    fn write(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_char('[')?;
        if self.negate {
            f.write_char('^')?;
        }
        for item in &self.items {
            match item {
                BracketItem::Char(c) => c.write(f)?,
                BracketItem::Range(lo, hi) => {
                    lo.write(f)?;
                    f.write_char('-')?;
                    hi.write(f)?;
                }
                BracketItem::Class(ce) => ce.write(f)?,
                BracketItem::Property { name, negate } => {
                    write_property(name, *negate, f)?
                }
            }
        }
        f.write_char(']')
    }
}

/// A zero-width anchor.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AnchorType {
    Start,
    End,
    WordBoundary,
    NotWordBoundary,
}

/// A quantifier. `max` of None means unbounded.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Quantifier {
    pub min: u32,
    pub max: Option<u32>,
    pub lazy: bool,
}

impl Quantifier {
    fn write(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match (self.min, self.max) {
            (0, None) => f.write_char('*')?,
            (1, None) => f.write_char('+')?,
            (0, Some(1)) => f.write_char('?')?,
            (min, Some(max)) if min == max => write!(f, "{{{}}}", min)?,
            (min, None) => write!(f, "{{{},}}", min)?,
            (min, Some(max)) => write!(f, "{{{},{}}}", min, max)?,
        }
        if self.lazy {
            f.write_char('?')?;
        }
        Ok(())
    }
}

/// A sequence of nodes matched one after another.
pub type Sequence = Vec<Node>;

/// A group: capturing, named capturing, or non-capturing.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub alts: Vec<Sequence>,
    /// 1-based capture index; None for non-capturing groups.
    pub index: Option<CaptureGroupID>,
    pub name: Option<CaptureGroupName>,
}

/// A lookaround assertion.
#[derive(Debug, Clone, PartialEq)]
pub struct Lookaround {
    pub alts: Vec<Sequence>,
    pub negate: bool,
    pub behind: bool,
}

/// The node types of the syntax tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// A run of ordinary characters. Adjacent runs are coalesced by the
    /// parser; rendering re-escapes metacharacters.
    Literal(String),

    /// A code point escape like \x0a.
    Escaped(Escape),

    /// A shorthand class escape like \d outside a bracket.
    Class(ClassEscape),

    /// A Unicode property class \p{Name} or \P{Name}.
    Property { name: String, negate: bool },

    /// A bracket expression.
    Bracket(Bracket),

    /// The dot wildcard.
    Dot,

    /// A zero-width anchor.
    Anchor(AnchorType),

    /// A quantified node.
    Repeat { node: Box<Node>, quant: Quantifier },

    /// A group.
    Group(Group),

    /// A lookaround assertion.
    Lookaround(Lookaround),

    /// A numeric backreference like \3.
    BackRef(CaptureGroupID),

    /// A named backreference like \k<word>.
    NamedBackRef(CaptureGroupName),
}

/// A parsed pattern: the root disjunction plus capture group bookkeeping.
///
/// Capture group indices are contiguous starting at 1, in left-to-right
/// first-encounter order; `group_names[i - 1]` is the name of group `i`
/// (None for unnamed groups).
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub alts: Vec<Sequence>,
    pub flags: Flags,
    pub group_count: CaptureGroupID,
    pub group_names: Vec<Option<CaptureGroupName>>,
}

impl Expr {
    /// \return references to all capturing groups, ordered by index.
    /// Panics if the contiguous-index invariant is broken, which would be a
    /// parser defect.
    pub fn capture_groups(&self) -> Vec<&Group> {
        let mut found: Vec<Option<&Group>> = vec![None; self.group_count as usize];
        for alt in &self.alts {
            collect_sequence(alt, &mut found);
        }
        found
            .into_iter()
            .map(|g| g.expect("capture group indices are not contiguous"))
            .collect()
    }

    /// \return the index of the named capture group \p name, if any.
    pub fn group_index(&self, name: &str) -> Option<CaptureGroupID> {
        self.group_names
            .iter()
            .position(|n| n.as_deref() == Some(name))
            .map(|pos| pos as CaptureGroupID + 1)
    }

    /// \return the capture group indices in rendering order.
    ///
    /// A host engine numbers groups by the position of their opening paren
    /// in the source. For a freshly parsed pattern that order is the
    /// identity, but reversal moves groups around, so the rendered source
    /// renumbers backreferences positionally and match results are mapped
    /// back through this order.
    pub fn capture_order(&self) -> Vec<CaptureGroupID> {
        let mut order = Vec::with_capacity(self.group_count as usize);
        for alt in &self.alts {
            order_sequence(alt, &mut order);
        }
        debug_assert_eq!(order.len(), self.group_count as usize);
        order
    }

    /// \return the rendering position of each group, indexed by group
    /// index minus one. The inverse of `capture_order`.
    fn capture_positions(&self) -> Vec<CaptureGroupID> {
        let mut positions = vec![0; self.group_count as usize];
        for (p, index) in self.capture_order().iter().enumerate() {
            positions[*index as usize - 1] = p as CaptureGroupID + 1;
        }
        positions
    }

    /// Compute the set of characters a match can begin with, as a synthetic
    /// positive bracket expression. \return None if the set is not
    /// statically determinable (dot, property classes, backreferences).
    pub fn first_characters(&self) -> Option<Bracket> {
        let mut acc = Bracket::default();
        for alt in &self.alts {
            first_of_sequence(alt, &mut acc)?;
        }
        Some(acc)
    }
}

fn order_sequence(seq: &[Node], order: &mut Vec<CaptureGroupID>) {
    for node in seq {
        order_node(node, order);
    }
}

fn order_node(node: &Node, order: &mut Vec<CaptureGroupID>) {
    match node {
        Node::Repeat { node, .. } => order_node(node, order),
        Node::Group(group) => {
            if let Some(index) = group.index {
                order.push(index);
            }
            for alt in &group.alts {
                order_sequence(alt, order);
            }
        }
        Node::Lookaround(look) => {
            for alt in &look.alts {
                order_sequence(alt, order);
            }
        }
        _ => {}
    }
}

fn collect_sequence<'a>(seq: &'a [Node], found: &mut Vec<Option<&'a Group>>) {
    for node in seq {
        collect_node(node, found);
    }
}

fn collect_node<'a>(node: &'a Node, found: &mut Vec<Option<&'a Group>>) {
    match node {
        Node::Repeat { node, .. } => collect_node(node, found),
        Node::Group(group) => {
            if let Some(index) = group.index {
                found[index as usize - 1] = Some(group);
            }
            for alt in &group.alts {
                collect_sequence(alt, found);
            }
        }
        Node::Lookaround(look) => {
            for alt in &look.alts {
                collect_sequence(alt, found);
            }
        }
        _ => {}
    }
}

/// Whether a sequence prefix consumes a character or can be skipped.
enum FirstStep {
    Consumed,
    Transparent,
}

fn first_of_sequence(seq: &[Node], acc: &mut Bracket) -> Option<FirstStep> {
    for node in seq {
        if let FirstStep::Consumed = first_of_node(node, acc)? {
            return Some(FirstStep::Consumed);
        }
    }
    // Ran off the end: the sequence can match the empty string.
    Some(FirstStep::Transparent)
}

fn first_of_node(node: &Node, acc: &mut Bracket) -> Option<FirstStep> {
    match node {
        Node::Literal(s) => match s.chars().next() {
            Some(c) => {
                acc.items.push(BracketItem::Char(BracketChar::Literal(c)));
                Some(FirstStep::Consumed)
            }
            None => Some(FirstStep::Transparent),
        },
        Node::Escaped(e) => {
            acc.items.push(BracketItem::Char(BracketChar::Escaped(*e)));
            Some(FirstStep::Consumed)
        }
        Node::Class(ce) => {
            acc.items.push(BracketItem::Class(*ce));
            Some(FirstStep::Consumed)
        }
        Node::Bracket(b) => {
            let positive = b.make_positive()?;
            acc.items.extend(positive.items);
            Some(FirstStep::Consumed)
        }
        Node::Property { .. } | Node::Dot | Node::BackRef(_) | Node::NamedBackRef(_) => None,
        Node::Anchor(_) | Node::Lookaround(_) => Some(FirstStep::Transparent),
        Node::Repeat { node, quant } => {
            let step = first_of_node(node, acc)?;
            if quant.min == 0 {
                Some(FirstStep::Transparent)
            } else {
                Some(step)
            }
        }
        Node::Group(group) => {
            let mut all_consume = FirstStep::Consumed;
            for alt in &group.alts {
                if let FirstStep::Transparent = first_of_sequence(alt, acc)? {
                    all_consume = FirstStep::Transparent;
                }
            }
            Some(all_consume)
        }
    }
}

fn is_metachar(c: char) -> bool {
    matches!(
        c,
        '^' | '$' | '\\' | '.' | '*' | '+' | '?' | '(' | ')' | '[' | ']' | '{' | '}' | '|'
    )
}

fn write_literal(s: &str, f: &mut fmt::Formatter) -> fmt::Result {
    for c in s.chars() {
        if is_metachar(c) {
            f.write_char('\\')?;
        }
        f.write_char(c)?;
    }
    Ok(())
}

fn write_property(name: &str, negate: bool, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "\\{}{{{}}}", if negate { 'P' } else { 'p' }, name)
}

fn write_alternatives(
    alts: &[Sequence],
    positions: &[CaptureGroupID],
    f: &mut fmt::Formatter,
) -> fmt::Result {
    for (i, alt) in alts.iter().enumerate() {
        if i > 0 {
            f.write_char('|')?;
        }
        for node in alt {
            write_node(node, positions, f)?;
        }
    }
    Ok(())
}

fn write_node(node: &Node, positions: &[CaptureGroupID], f: &mut fmt::Formatter) -> fmt::Result {
    match node {
        Node::Literal(s) => write_literal(s, f),
        Node::Escaped(e) => e.write(f),
        Node::Class(ce) => ce.write(f),
        Node::Property { name, negate } => write_property(name, *negate, f),
        Node::Bracket(b) => b.write(f),
        Node::Dot => f.write_char('.'),
        Node::Anchor(AnchorType::Start) => f.write_char('^'),
        Node::Anchor(AnchorType::End) => f.write_char('$'),
        Node::Anchor(AnchorType::WordBoundary) => f.write_str("\\b"),
        Node::Anchor(AnchorType::NotWordBoundary) => f.write_str("\\B"),
        Node::Repeat { node, quant } => {
            // A coalesced literal run is not an atom; regroup it so the
            // quantifier binds the whole run.
            let needs_group = matches!(node.as_ref(), Node::Literal(s) if s.chars().count() > 1);
            if needs_group {
                f.write_str("(?:")?;
                write_node(node, positions, f)?;
                f.write_char(')')?;
            } else {
                write_node(node, positions, f)?;
            }
            quant.write(f)
        }
        Node::Group(group) => {
            match (group.index, &group.name) {
                (None, _) => f.write_str("(?:")?,
                (Some(_), None) => f.write_char('(')?,
                (Some(_), Some(name)) => write!(f, "(?<{}>", name)?,
            }
            write_alternatives(&group.alts, positions, f)?;
            f.write_char(')')
        }
        Node::Lookaround(look) => {
            f.write_str(match (look.behind, look.negate) {
                (false, false) => "(?=",
                (false, true) => "(?!",
                (true, false) => "(?<=",
                (true, true) => "(?<!",
            })?;
            write_alternatives(&look.alts, positions, f)?;
            f.write_char(')')
        }
        // Backreferences are renumbered to the group's rendering position,
        // which is where the host engine will see it.
        Node::BackRef(index) => {
            let renumbered = positions
                .get(*index as usize - 1)
                .copied()
                .unwrap_or(*index);
            write!(f, "\\{}", renumbered)
        }
        Node::NamedBackRef(name) => write!(f, "\\k<{}>", name),
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write_node(self, &[], f)
    }
}

impl fmt::Display for Expr {
    /// Render the pattern in a form the host engine accepts.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write_alternatives(&self.alts, &self.capture_positions(), f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse;

    fn first_chars(pattern: &str) -> Option<String> {
        let expr = parse(pattern, Flags::default()).unwrap();
        expr.first_characters().map(|b| Node::Bracket(b).to_string())
    }

    #[test]
    fn first_characters_of_literals_and_alternatives() {
        assert_eq!(first_chars("abc"), Some("[a]".to_string()));
        assert_eq!(first_chars("cat|dog"), Some("[cd]".to_string()));
        assert_eq!(first_chars("(ab|cd)x"), Some("[ac]".to_string()));
    }

    #[test]
    fn first_characters_see_through_zero_width_prefixes() {
        assert_eq!(first_chars("^abc"), Some("[a]".to_string()));
        assert_eq!(first_chars(r"\bword"), Some("[w]".to_string()));
        assert_eq!(first_chars("(?=x)yz"), Some("[y]".to_string()));
        assert_eq!(first_chars("a*bc"), Some("[ab]".to_string()));
    }

    #[test]
    fn first_characters_of_classes() {
        assert_eq!(first_chars(r"\d+"), Some(r"[\d]".to_string()));
        assert_eq!(first_chars("[a-fx]y"), Some("[a-fx]".to_string()));
        assert_eq!(first_chars(r"[^\d]y"), Some(r"[\D]".to_string()));
    }

    #[test]
    fn first_characters_not_static() {
        assert_eq!(first_chars("a|.b"), None);
        assert_eq!(first_chars(r"\1(a)"), None);
        assert_eq!(first_chars("[^ab]c"), None);
        assert_eq!(first_chars(r"\p{L}x"), None);
    }

    #[test]
    fn make_positive_flips_lone_shorthand() {
        let negated = Bracket {
            negate: true,
            items: vec![BracketItem::Class(ClassEscape {
                class_type: CharacterClassType::Digits,
                negate: false,
            })],
        };
        let positive = negated.make_positive().unwrap();
        assert!(!positive.negate);
        assert_eq!(Node::Bracket(positive).to_string(), r"[\D]");

        let mixed = Bracket {
            negate: true,
            items: vec![
                BracketItem::Char(BracketChar::Literal('a')),
                BracketItem::Char(BracketChar::Literal('b')),
            ],
        };
        assert!(mixed.make_positive().is_none());
    }

    #[test]
    fn quantifier_rendering() {
        let expr = parse("a*b+?c{2}d{3,}e{4,5}f??", Flags::default()).unwrap();
        assert_eq!(expr.to_string(), "a*b+?c{2}d{3,}e{4,5}f??");
    }

    #[test]
    fn escape_rendering_preserves_spelling() {
        let expr = parse(r"\x41B\u{1f600}\cJ\n", Flags::default()).unwrap();
        assert_eq!(expr.to_string(), r"\x41B\u{1f600}\cJ\n");
    }

    #[test]
    fn octal_escapes_render_as_hex() {
        let expr = parse(r"\012", Flags::default()).unwrap();
        assert_eq!(expr.to_string(), r"\x0a");
    }
}
