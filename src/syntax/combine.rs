//! Prefix pattern union
//!
//! Joins many independently written, prefix-anchored patterns into one
//! alternation that can split source text into tokens in a single pass.
//! Each input pattern is rewritten so it behaves the same inside the
//! union as it did alone:
//!
//! - capturing groups that no back-reference targets become
//!   non-capturing, and back-references are renumbered into one shared
//!   numbering across the whole union;
//! - a leading `^` is dropped so the pattern can match anywhere, while a
//!   doubled `^^` survives as a single true start-of-input assertion;
//! - when case-insensitive and case-sensitive patterns with letters are
//!   mixed, the case-insensitive ones have their letters and character
//!   classes expanded to explicit upper/lower pairs.
//!
//! A catch-all single character alternative goes last, so the union
//! matches at every position.

use std::collections::BTreeMap;
use std::ops::Range;

use super::matcher::Matcher;
use super::rules::Pattern;
use crate::error::{ConfigError, Result};

/// Alternative appended to every union
const CATCH_ALL: &str = "(?s:.)";

/// ASCII letters whose case folding reaches outside ASCII: the Kelvin sign
/// and the long s
const FOLD_OUTSIDE_ASCII: [(char, char); 2] = [('k', '\u{212a}'), ('s', '\u{17f}')];

/// A piece of pattern source, as seen by the rewriter
#[derive(Debug, Clone, PartialEq, Eq)]
enum Part {
    /// A bracketed character class, brackets included
    Class(String),
    /// An escape sequence other than a numeric one
    Escape(String),
    /// `\` followed by decimal digits: a back-reference or a legacy escape
    Numeric(u32),
    /// A group opener such as `(`, `(?:`, `(?=` or `(?P<name>`
    Open { text: String, capturing: bool },
    /// `)`
    Close,
    /// A bare inline flag directive such as `(?i)` or `(?x-s)`
    Flags(String),
    /// `^`
    Caret,
    /// A run of anything else
    Literal(String),
}

impl Part {
    fn render(&self) -> String {
        match self {
            Part::Class(text) | Part::Escape(text) | Part::Flags(text) | Part::Literal(text) => {
                text.clone()
            }
            Part::Numeric(n) => format!("\\{n}"),
            Part::Open { text, .. } => text.clone(),
            Part::Close => ")".to_string(),
            Part::Caret => "^".to_string(),
        }
    }

    /// Inline flag letters set by this part, if it is a flag group
    fn flag_letters(&self) -> Option<&str> {
        let text = match self {
            Part::Flags(text) => text.strip_suffix(')')?,
            Part::Open { text, capturing: false } => text.strip_suffix(':')?,
            _ => return None,
        };
        let flags = text.strip_prefix("(?")?;
        flags
            .chars()
            .all(|c| c.is_ascii_alphabetic() || c == '-')
            .then_some(flags)
    }
}

/// Split pattern source into classes, escapes, group punctuation, carets
/// and literal runs.
fn split_parts(source: &str) -> Vec<Part> {
    let chars: Vec<(usize, char)> = source.char_indices().collect();
    let end_of = |i: usize| chars.get(i).map_or(source.len(), |&(at, _)| at);
    let mut parts = Vec::new();
    let mut literal_start: Option<usize> = None;
    let mut i = 0;

    macro_rules! flush_literal {
        ($upto:expr) => {
            if let Some(start) = literal_start.take() {
                parts.push(Part::Literal(source[start..$upto].to_string()));
            }
        };
    }

    while i < chars.len() {
        let (at, c) = chars[i];
        match c {
            '[' => {
                flush_literal!(at);
                let mut j = i + 1;
                if matches!(chars.get(j), Some((_, '^'))) {
                    j += 1;
                }
                // a leading `]` is a literal member
                if matches!(chars.get(j), Some((_, ']'))) {
                    j += 1;
                }
                let mut depth = 0usize;
                while j < chars.len() {
                    match chars[j].1 {
                        '\\' => j += 1,
                        '[' => depth += 1,
                        ']' if depth == 0 => break,
                        ']' => depth -= 1,
                        _ => {}
                    }
                    j += 1;
                }
                let close = (j + 1).min(chars.len());
                parts.push(Part::Class(source[at..end_of(close)].to_string()));
                i = close;
            }
            '\\' => {
                flush_literal!(at);
                let Some(&(_, next)) = chars.get(i + 1) else {
                    parts.push(Part::Escape("\\".to_string()));
                    break;
                };
                if next.is_ascii_digit() {
                    let mut j = i + 1;
                    while matches!(chars.get(j), Some((_, d)) if d.is_ascii_digit()) {
                        j += 1;
                    }
                    let digits = &source[end_of(i + 1)..end_of(j)];
                    match digits.parse::<u32>() {
                        Ok(n) => parts.push(Part::Numeric(n)),
                        Err(_) => parts.push(Part::Escape(source[at..end_of(j)].to_string())),
                    }
                    i = j;
                    continue;
                }
                let j = escape_end(&chars, i + 1);
                parts.push(Part::Escape(source[at..end_of(j)].to_string()));
                i = j;
            }
            '(' => {
                flush_literal!(at);
                let rest = &source[at..];
                let (len, part) = if let Some(name_len) = named_group_len(rest) {
                    (
                        name_len,
                        Part::Open { text: rest[..name_len].to_string(), capturing: true },
                    )
                } else if rest.starts_with("(?") {
                    group_directive(rest)
                } else {
                    (1, Part::Open { text: "(".to_string(), capturing: true })
                };
                parts.push(part);
                let stop = at + len;
                while i < chars.len() && chars[i].0 < stop {
                    i += 1;
                }
            }
            ')' => {
                flush_literal!(at);
                parts.push(Part::Close);
                i += 1;
            }
            '^' => {
                flush_literal!(at);
                parts.push(Part::Caret);
                i += 1;
            }
            _ => {
                literal_start.get_or_insert(at);
                i += 1;
            }
        }
    }
    flush_literal!(source.len());
    parts
}

/// Index one past the end of the escape whose letter sits at `i`
fn escape_end(chars: &[(usize, char)], i: usize) -> usize {
    let Some(&(_, letter)) = chars.get(i) else {
        return i;
    };
    let braced = matches!(chars.get(i + 1), Some((_, '{')));
    let closing = |open: char, close: char| {
        let mut j = i + 1;
        if !matches!(chars.get(j), Some((_, c)) if *c == open) {
            return None;
        }
        while j < chars.len() && chars[j].1 != close {
            j += 1;
        }
        Some((j + 1).min(chars.len()))
    };
    match letter {
        'x' | 'u' | 'U' if braced => closing('{', '}').unwrap_or(i + 1),
        'x' => hex_run(chars, i + 1, 2),
        'u' => hex_run(chars, i + 1, 4),
        'U' => hex_run(chars, i + 1, 8),
        'p' | 'P' | 'b' | 'B' if braced => closing('{', '}').unwrap_or(i + 1),
        'p' | 'P' => (i + 2).min(chars.len()),
        'k' => closing('<', '>').unwrap_or(i + 1),
        _ => i + 1,
    }
}

fn hex_run(chars: &[(usize, char)], from: usize, max: usize) -> usize {
    let mut j = from;
    while j < chars.len() && j - from < max && chars[j].1.is_ascii_hexdigit() {
        j += 1;
    }
    j
}

/// Length of a named capturing group opener at the start of `rest`
fn named_group_len(rest: &str) -> Option<usize> {
    let after = rest
        .strip_prefix("(?P<")
        .or_else(|| rest.strip_prefix("(?<").filter(|s| !s.starts_with(['=', '!'])))?;
    let name_len = after.find('>')?;
    Some(rest.len() - after.len() + name_len + 1)
}

/// Classify a `(?` opener that is not a named group
fn group_directive(rest: &str) -> (usize, Part) {
    for opener in ["(?:", "(?=", "(?!", "(?<=", "(?<!"] {
        if rest.starts_with(opener) {
            return (
                opener.len(),
                Part::Open { text: opener.to_string(), capturing: false },
            );
        }
    }
    let flags_end = rest[2..]
        .find(|c: char| !(c.is_ascii_alphabetic() || c == '-'))
        .map(|n| n + 2);
    match flags_end.and_then(|n| rest[n..].chars().next().map(|c| (n, c))) {
        Some((n, ':')) => (
            n + 1,
            Part::Open { text: rest[..=n].to_string(), capturing: false },
        ),
        Some((n, ')')) => (n + 1, Part::Flags(rest[..=n].to_string())),
        _ => (2, Part::Open { text: "(?".to_string(), capturing: false }),
    }
}

/// Whether `source` turns on multiline mode with an inline flag
pub(crate) fn has_inline_multiline(source: &str) -> bool {
    split_parts(source).iter().any(|part| {
        part.flag_letters()
            .is_some_and(|flags| flags.split('-').next().is_some_and(|on| on.contains('m')))
    })
}

/// Whether the pattern spells out characters that care about case
fn has_case_sensitive_letters(parts: &[Part]) -> bool {
    parts.iter().any(|part| match part {
        Part::Literal(text) => text.chars().any(has_case),
        Part::Class(text) => class_letters(text),
        Part::Escape(text) => case_fold_escape(text) != *text,
        _ => false,
    })
}

fn class_letters(class: &str) -> bool {
    let mut chars = class.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if matches!(chars.next(), Some('p' | 'P' | 'x' | 'u' | 'U')) {
                return true;
            }
        } else if has_case(c) {
            return true;
        }
    }
    false
}

/// Render a code point so it is safe inside a character class
fn encode_escape(code: u32) -> String {
    match char::from_u32(code) {
        Some(c) if code >= 0x20 && !matches!(c, '&' | '~') => {
            if matches!(c, '\\' | '-' | ']' | '[' | '^') {
                format!("\\{c}")
            } else {
                c.to_string()
            }
        }
        _ => format!("\\x{{{code:x}}}"),
    }
}

/// One member of a simple character class
enum ClassItem {
    /// A single code point
    Code(u32),
    /// A shorthand class such as `\d`, kept verbatim
    Shorthand(String),
    /// The range operator
    Dash,
}

fn decode_class_escape(body: &[char], i: usize) -> (ClassItem, usize) {
    let Some(&letter) = body.get(i) else {
        return (ClassItem::Code(u32::from('\\')), i);
    };
    let hex = |from: usize, max: usize, braced: bool| -> (u32, usize) {
        let mut j = from;
        let mut digits = String::new();
        while j < body.len() && (braced || digits.len() < max) {
            let c = body[j];
            if braced && c == '}' {
                j += 1;
                break;
            }
            if !c.is_ascii_hexdigit() {
                break;
            }
            digits.push(c);
            j += 1;
        }
        (u32::from_str_radix(&digits, 16).unwrap_or(0), j)
    };
    match letter {
        'd' | 'D' | 's' | 'S' | 'w' | 'W' => (ClassItem::Shorthand(format!("\\{letter}")), i + 1),
        'x' | 'u' => {
            let braced = body.get(i + 1) == Some(&'{');
            let from = if braced { i + 2 } else { i + 1 };
            let (code, end) = hex(from, if letter == 'x' { 2 } else { 4 }, braced);
            (ClassItem::Code(code), end)
        }
        'n' => (ClassItem::Code(0x0a), i + 1),
        't' => (ClassItem::Code(0x09), i + 1),
        'r' => (ClassItem::Code(0x0d), i + 1),
        'f' => (ClassItem::Code(0x0c), i + 1),
        'v' => (ClassItem::Code(0x0b), i + 1),
        'a' => (ClassItem::Code(0x07), i + 1),
        'e' => (ClassItem::Code(0x1b), i + 1),
        other => (ClassItem::Code(u32::from(other)), i + 1),
    }
}

/// Expand a character class so it matches both cases of every ASCII
/// letter it covers.
///
/// Classes using features this rewriter does not model (nesting, set
/// operations, Unicode properties) are wrapped in a scoped `(?i:...)`
/// group instead.
fn case_fold_class(class: &str) -> String {
    let inner = class
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .unwrap_or(class);
    let (inverse, body) = match inner.strip_prefix('^') {
        Some(rest) => (true, rest),
        None => (false, inner),
    };
    let complex = body.contains('[')
        || ["&&", "--", "~~", "\\p", "\\P"].iter().any(|op| body.contains(op));
    if complex {
        return format!("(?i:{class})");
    }

    let chars: Vec<char> = body.chars().collect();
    let mut items = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '\\' => {
                let (item, next) = decode_class_escape(&chars, i + 1);
                items.push(item);
                i = next;
            }
            '-' => {
                items.push(ClassItem::Dash);
                i += 1;
            }
            c => {
                items.push(ClassItem::Code(u32::from(c)));
                i += 1;
            }
        }
    }

    // non-ASCII members have case pairs the range arithmetic below misses
    if items
        .iter()
        .any(|item| matches!(item, ClassItem::Code(code) if *code > 0x7f))
    {
        return format!("(?i:{class})");
    }

    let mut shorthands = Vec::new();
    let mut ranges: Vec<(u32, u32)> = Vec::new();
    let mut k = 0;
    while k < items.len() {
        let start = match &items[k] {
            ClassItem::Shorthand(text) => {
                shorthands.push(text.clone());
                k += 1;
                continue;
            }
            ClassItem::Dash => u32::from('-'),
            ClassItem::Code(code) => *code,
        };
        let end = match (items.get(k + 1), items.get(k + 2)) {
            (Some(ClassItem::Dash), Some(ClassItem::Code(end)))
                if k > 0 || start != u32::from('-') =>
            {
                k += 2;
                *end
            }
            _ => start,
        };
        k += 1;
        ranges.push((start, end));
        if !(end < 65 || start > 122) {
            if !(end < 65 || start > 90) {
                ranges.push((start.max(65) | 32, end.min(90) | 32));
            }
            if !(end < 97 || start > 122) {
                ranges.push((start.max(97) & !32, end.min(122) & !32));
            }
        }
    }

    for (letter, other) in FOLD_OUTSIDE_ASCII {
        let code = u32::from(letter);
        if ranges.iter().any(|&(start, end)| start <= code && code <= end) {
            ranges.push((u32::from(other), u32::from(other)));
        }
    }

    ranges.sort_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)));
    let mut merged: Vec<(u32, u32)> = Vec::new();
    for (start, end) in ranges {
        match merged.last_mut() {
            Some(last) if start <= last.1 + 1 => last.1 = last.1.max(end),
            _ => merged.push((start, end)),
        }
    }

    let mut out = String::from("[");
    if inverse {
        out.push('^');
    }
    for shorthand in shorthands {
        out.push_str(&shorthand);
    }
    for (start, end) in merged {
        out.push_str(&encode_escape(start));
        if end > start {
            out.push('-');
            out.push_str(&encode_escape(end));
        }
    }
    out.push(']');
    out
}

/// Replace every cased character in a literal run with a form that
/// matches all of its cases
fn case_fold_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len() * 2);
    for c in text.chars() {
        if c.is_ascii_alphabetic() {
            let lower = c.to_ascii_lowercase();
            out.push('[');
            out.push(c.to_ascii_uppercase());
            out.push(lower);
            let other = FOLD_OUTSIDE_ASCII.iter().find(|(letter, _)| *letter == lower);
            if let Some(&(_, other)) = other {
                out.push(other);
            }
            out.push(']');
        } else if !c.is_ascii() && has_case(c) {
            out.push_str("(?i:");
            out.push(c);
            out.push(')');
        } else {
            out.push(c);
        }
    }
    out
}

/// Whether `c` has another case form
fn has_case(c: char) -> bool {
    !c.to_lowercase().eq(std::iter::once(c)) || !c.to_uppercase().eq(std::iter::once(c))
}

/// Fold an escape that can stand for a cased character
fn case_fold_escape(text: &str) -> String {
    if !text.starts_with('\\') {
        // a legacy numeric escape already rendered as its character
        return case_fold_literal(text);
    }
    let letter = text.chars().nth(1);
    if matches!(letter, Some('p' | 'P' | 'x' | 'u' | 'U')) {
        format!("(?i:{text})")
    } else {
        text.to_string()
    }
}

/// The single tokenizer pattern built from a rule set
#[derive(Debug, Clone)]
pub struct CombinedPattern {
    matcher: Matcher,
    case_insensitive: bool,
    folded: bool,
    group_count: u32,
}

impl CombinedPattern {
    /// Final pattern source handed to the regex engine
    pub fn as_str(&self) -> &str {
        self.matcher.as_str()
    }

    /// Whether the whole union was compiled case-insensitively
    pub fn is_case_insensitive(&self) -> bool {
        self.case_insensitive
    }

    /// Whether case-insensitive members were expanded letter by letter
    pub fn is_case_folded(&self) -> bool {
        self.folded
    }

    /// Capturing groups kept in the union (back-reference targets only)
    pub fn group_count(&self) -> u32 {
        self.group_count
    }

    /// Whether the union needed the backtracking engine
    pub fn is_backtracking(&self) -> bool {
        self.matcher.is_backtracking()
    }

    /// The token starting at byte `pos` of `text`.
    ///
    /// Never empty while `pos` is inside `text`: a member that matches
    /// the empty string yields to the catch-all single character.
    pub fn token_at(&self, text: &str, pos: usize) -> Result<Range<usize>> {
        let one_char = || pos + text[pos..].chars().next().map_or(0, char::len_utf8);
        match self.matcher.find_at(text, pos)? {
            Some(found) if found.start == pos && found.end > pos => Ok(found),
            _ => Ok(pos..one_char()),
        }
    }
}

/// Rewrites patterns one at a time, sharing one group numbering
struct UnionBuilder {
    next_group: u32,
    fold_case: bool,
}

impl UnionBuilder {
    fn rewrite(&mut self, pattern: &Pattern) -> String {
        let mut parts = split_parts(pattern.source());

        // which local groups are back-reference targets
        let mut targets: BTreeMap<u32, u32> = BTreeMap::new();
        let mut group_index = 0;
        for part in parts.iter_mut() {
            match part {
                Part::Open { capturing: true, .. } => group_index += 1,
                Part::Numeric(n) if *n >= 1 && *n <= group_index => {
                    targets.insert(*n, 0);
                }
                Part::Numeric(n) => {
                    // keep a legacy escape from becoming a reference into
                    // another rule's groups
                    let code = *n;
                    *part = Part::Escape(encode_escape(code));
                }
                _ => {}
            }
        }
        for global in targets.values_mut() {
            self.next_group += 1;
            *global = self.next_group;
        }

        let mut group_index = 0;
        for part in parts.iter_mut() {
            match part {
                Part::Open { text, capturing: true } => {
                    group_index += 1;
                    let open = if targets.contains_key(&group_index) { "(" } else { "(?:" };
                    *text = open.to_string();
                }
                Part::Numeric(n) => {
                    if let Some(global) = targets.get(n) {
                        *n = *global;
                    }
                }
                _ => {}
            }
        }

        // the union matches anywhere; `^^` still means start of input
        let mut rendered = Vec::with_capacity(parts.len());
        for (i, part) in parts.iter().enumerate() {
            if *part == Part::Caret && parts.get(i + 1) != Some(&Part::Caret) {
                continue;
            }
            rendered.push(if self.fold_case && pattern.is_case_insensitive() {
                match part {
                    Part::Class(text) => case_fold_class(text),
                    Part::Literal(text) => case_fold_literal(text),
                    Part::Escape(text) => case_fold_escape(text),
                    other => other.render(),
                }
            } else {
                part.render()
            });
        }
        rendered.concat()
    }
}

/// Build the single tokenizer pattern for `patterns`, in order.
///
/// Fails if any pattern uses multiline mode or the union does not compile.
#[tracing::instrument(level = "debug", skip_all, fields(patterns = patterns.len()))]
pub fn combine_prefix_patterns(
    patterns: &[Pattern],
) -> std::result::Result<CombinedPattern, ConfigError> {
    if let Some(bad) = patterns.iter().find(|p| p.is_multiline()) {
        return Err(ConfigError::MultilinePattern(bad.source().to_string()));
    }

    let any_insensitive = patterns.iter().any(Pattern::is_case_insensitive);
    let mixed = any_insensitive
        && patterns.iter().any(|p| {
            !p.is_case_insensitive() && has_case_sensitive_letters(&split_parts(p.source()))
        });
    let case_insensitive = any_insensitive && !mixed;

    let mut builder = UnionBuilder { next_group: 0, fold_case: mixed };
    let mut alternatives: Vec<String> = patterns
        .iter()
        .map(|p| format!("(?:{})", builder.rewrite(p)))
        .collect();
    alternatives.push(CATCH_ALL.to_string());

    let mut source = alternatives.join("|");
    if case_insensitive {
        source.insert_str(0, "(?i)");
    }
    tracing::debug!(len = source.len(), case_insensitive, folded = mixed, "combined tokenizer");

    Ok(CombinedPattern {
        matcher: Matcher::new(&source)?,
        case_insensitive,
        folded: mixed,
        group_count: builder.next_group,
    })
}
