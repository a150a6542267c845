//! Compiled pattern backend
//!
//! Grammar patterns are compiled with the [`regex`] crate whenever they
//! can be. Look-around and back-references are outside what `regex`
//! supports, so those patterns fall up to [`fancy_regex`], which runs a
//! backtracking engine and delegates the simple parts back to `regex`.

use std::ops::Range;

use crate::error::{ConfigError, Error, Result};

/// Upper bound on compiled program size for either backend
const SIZE_LIMIT: usize = 1 << 25;

/// Backtracking steps allowed per match before giving up
const BACKTRACK_LIMIT: usize = 1_000_000;

/// Spans of groups 0, 1 and 2 of a successful match
///
/// Only the first two groups ever matter to decoration: group 1 holds an
/// embedded region, group 2 its right-hand context.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Captured {
    groups: [Option<Range<usize>>; 3],
}

impl Captured {
    /// Span of the whole match
    pub fn whole(&self) -> Range<usize> {
        self.groups[0].clone().unwrap_or(0..0)
    }

    /// Span of group `index`, if it participated in the match
    pub fn group(&self, index: usize) -> Option<Range<usize>> {
        self.groups.get(index).cloned().flatten()
    }
}

/// A compiled pattern, backed by whichever engine can run it
#[derive(Debug, Clone)]
pub enum Matcher {
    /// Finite-automaton engine
    Plain(regex::Regex),
    /// Backtracking engine for look-around and back-references
    Backtracking(fancy_regex::Regex),
}

impl Matcher {
    /// Compile `pattern`, trying `regex` first
    pub fn new(pattern: &str) -> std::result::Result<Self, ConfigError> {
        let plain = regex::RegexBuilder::new(pattern)
            .size_limit(SIZE_LIMIT)
            .build();
        match plain {
            Ok(re) => Ok(Matcher::Plain(re)),
            Err(_) => fancy_regex::RegexBuilder::new(pattern)
                .delegate_size_limit(SIZE_LIMIT)
                .backtrack_limit(BACKTRACK_LIMIT)
                .build()
                .map(Matcher::Backtracking)
                .map_err(|err| ConfigError::InvalidPattern {
                    pattern: pattern.to_string(),
                    message: err.to_string(),
                }),
        }
    }

    /// Whether this matcher needed the backtracking engine
    pub fn is_backtracking(&self) -> bool {
        matches!(self, Matcher::Backtracking(_))
    }

    /// The pattern source this matcher was compiled from
    pub fn as_str(&self) -> &str {
        match self {
            Matcher::Plain(re) => re.as_str(),
            Matcher::Backtracking(re) => re.as_str(),
        }
    }

    /// Leftmost match in `text` starting the search at byte `start`
    ///
    /// Assertions such as `^` and `\b` still see the text before `start`.
    pub fn find_at(&self, text: &str, start: usize) -> Result<Option<Range<usize>>> {
        match self {
            Matcher::Plain(re) => Ok(re.find_at(text, start).map(|m| m.range())),
            Matcher::Backtracking(re) => re
                .find_from_pos(text, start)
                .map(|found| found.map(|m| m.start()..m.end()))
                .map_err(|err| Error::Match(err.to_string())),
        }
    }

    /// First match in `text` together with its leading groups
    pub fn captures(&self, text: &str) -> Result<Option<Captured>> {
        match self {
            Matcher::Plain(re) => Ok(re.captures(text).map(|caps| {
                let mut captured = Captured::default();
                for (index, slot) in captured.groups.iter_mut().enumerate() {
                    *slot = caps.get(index).map(|m| m.range());
                }
                captured
            })),
            Matcher::Backtracking(re) => {
                let caps = re
                    .captures(text)
                    .map_err(|err| Error::Match(err.to_string()))?;
                Ok(caps.map(|caps| {
                    let mut captured = Captured::default();
                    for (index, slot) in captured.groups.iter_mut().enumerate() {
                        *slot = caps.get(index).map(|m| m.start()..m.end());
                    }
                    captured
                }))
            }
        }
    }
}
