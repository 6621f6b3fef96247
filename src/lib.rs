/*!

# retrograde - backward regular expression search by pattern reversal

Editors that search backward from a cursor need backward-match semantics,
but matching engines only scan forward. Rather than implement a second
engine, this crate analyzes and transforms the pattern itself: a pattern is
parsed into a syntax tree, structurally reversed, and handed back to the
ordinary forward engine to run over character-reversed text. Matching the
reversed pattern against reversed text mirrors matching the original
pattern against the original text, captures included.

The crate targets EcmaScript (aka JavaScript) pattern syntax and uses the
[`regress`](https://crates.io/crates/regress) engine as its matching
primitive. It performs no NFA/DFA execution of its own.

# Example: finding the last match

```rust
use retrograde::Pattern;
let re = Pattern::new(r"\d+").unwrap();
let m = re.find_last("12 34 56").unwrap();
assert_eq!(m.range(), 6..8);
```

For small texts this iterates forward matches; past a size threshold it
reverses the pattern and the text and matches once, which is O(n) no
matter how many matches precede the last one.

# Example: reversing a pattern

Reversal is structural: sequences flip their order, lookarounds flip their
direction, anchors swap ends, and backreferences are rewired so that a
group is always captured before it is referenced.

```rust
use retrograde::{parse, reverse, Flags};
let expr = parse("a(?=b)", Flags::default()).unwrap();
assert_eq!(reverse(&expr).to_string(), "(?<=b)a");

let expr = parse(r"(ab)x\1", Flags::default()).unwrap();
assert_eq!(reverse(&expr).to_string(), r"(ba)x\1");
```

# Example: picking a scanning strategy

A pattern that can never match a line feed can be searched one buffer line
at a time instead of materializing the whole buffer:

```rust
use retrograde::{can_match_line_feed, parse, Flags};
let expr = parse("a(b)c", Flags::default()).unwrap();
assert!(!can_match_line_feed(&expr));

let expr = parse(r"a[\s\S]b", Flags::default()).unwrap();
assert!(can_match_line_feed(&expr));
```

# Example: static strings

Patterns that are plain alternations of literals can skip the pattern
engine entirely:

```rust
use retrograde::static_strings;
let strings = static_strings("cat|dog").unwrap();
assert_eq!(strings, vec!["cat".to_string(), "dog".to_string()]);
assert_eq!(static_strings("a.b"), None);
```

# Supported syntax

The parser recognizes ES 2018 pattern syntax: alternation, quantifiers
(greedy and lazy), capturing, named and non-capturing groups, lookahead
and lookbehind, bracket expressions, shorthand classes, Unicode property
classes, numeric and named backreferences, and the usual escape forms.
Flags are the JavaScript letters (`i`, `m`, `s`, `u`, plus `g`/`y` carried
through for rendering).

# Offsets

All reported offsets are byte indexes into the caller's text, including
those recovered from a reversed match: reversing a string's characters
preserves each character's UTF-8 width, so offsets mirror exactly.

*/

#![warn(clippy::all)]

pub use crate::api::*;
pub use crate::exec::{alternate, LAST_MATCH_REVERSAL_THRESHOLD};
pub use crate::literals::static_strings;
pub use crate::newline::can_match_line_feed;
pub use crate::parse::parse;
pub use crate::reverse::reverse;
pub use crate::types::{CaptureGroupID, CaptureGroupName, CharacterClassType};

pub mod ast;

mod api;
mod exec;
mod literals;
mod newline;
mod parse;
mod reverse;
mod types;
