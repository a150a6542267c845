//! Pattern rules for syntax highlighting
//!
//! This module defines the rule types a grammar is written in: a pattern
//! with its matching flags, and the style it assigns.

use bitflags::bitflags;

use super::combine::has_inline_multiline;
use super::tokens::StyleTag;

bitflags! {
    /// Matching flags carried alongside pattern source
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PatternFlags: u8 {
        /// Letters match regardless of case
        const CASE_INSENSITIVE = 1;
        /// `^` and `$` match at line breaks
        const MULTILINE = 1 << 1;
    }
}

/// Prefix-anchored pattern source plus flags
///
/// Patterns are kept as source until a lexer is compiled, since the
/// union builder needs to rewrite them before anything is compiled.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pattern {
    source: String,
    flags: PatternFlags,
}

impl Pattern {
    /// Create a case-sensitive pattern.
    ///
    /// A leading `(?i)` is folded into [`PatternFlags::CASE_INSENSITIVE`].
    pub fn new(source: &str) -> Self {
        match source.strip_prefix("(?i)") {
            Some(rest) => Self {
                source: rest.to_string(),
                flags: PatternFlags::CASE_INSENSITIVE,
            },
            None => Self {
                source: source.to_string(),
                flags: PatternFlags::empty(),
            },
        }
    }

    /// Create a case-insensitive pattern
    pub fn case_insensitive(source: &str) -> Self {
        Self::new(source).with_flags(PatternFlags::CASE_INSENSITIVE)
    }

    /// Builder: add flags
    pub fn with_flags(mut self, flags: PatternFlags) -> Self {
        self.flags |= flags;
        self
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn flags(&self) -> PatternFlags {
        self.flags
    }

    pub fn is_case_insensitive(&self) -> bool {
        self.flags.contains(PatternFlags::CASE_INSENSITIVE)
    }

    /// Whether the pattern asks for multiline mode, by flag or inline group
    pub fn is_multiline(&self) -> bool {
        self.flags.contains(PatternFlags::MULTILINE) || has_inline_multiline(&self.source)
    }

    /// Source for matching a whole token on its own
    pub(crate) fn anchored_source(&self) -> String {
        if self.is_case_insensitive() {
            format!("(?i)^(?:{})", self.source)
        } else {
            format!("^(?:{})", self.source)
        }
    }
}

/// A single pattern rule
///
/// Assigns `style` to a token whose start matches `pattern`. A rule with
/// shortcut characters is tried first, and alone, for tokens beginning
/// with one of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternRule {
    /// Style assigned to matching tokens
    pub style: StyleTag,
    /// Prefix-anchored pattern
    pub pattern: Pattern,
    /// First characters that dispatch straight to this rule
    pub shortcut: Vec<char>,
}

impl PatternRule {
    /// Create a new pattern rule with no shortcut characters
    pub fn new(style: StyleTag, pattern: Pattern) -> Self {
        Self {
            style,
            pattern,
            shortcut: Vec::new(),
        }
    }

    /// Builder: dispatch tokens starting with any of `chars` to this rule
    pub fn with_shortcut(mut self, chars: &str) -> Self {
        for c in chars.chars() {
            if !self.shortcut.contains(&c) {
                self.shortcut.push(c);
            }
        }
        self
    }

    pub fn has_shortcut(&self) -> bool {
        !self.shortcut.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leading_case_flag_folded() {
        let pattern = Pattern::new("(?i)^select\\b");
        assert!(pattern.is_case_insensitive());
        assert_eq!(pattern.source(), "^select\\b");
        assert_eq!(pattern, Pattern::case_insensitive("^select\\b"));
        assert!(!Pattern::new("^x(?i)y").is_case_insensitive());
    }

    #[test]
    fn test_multiline_detection() {
        assert!(Pattern::new("^a$").with_flags(PatternFlags::MULTILINE).is_multiline());
        assert!(Pattern::new("(?m)^a$").is_multiline());
        assert!(Pattern::new("^(?im:a)").is_multiline());
        assert!(!Pattern::new("^(?s:a.)").is_multiline());
        assert!(!Pattern::new(r"^\(\?m\)").is_multiline());
    }

    #[test]
    fn test_anchored_source() {
        assert_eq!(Pattern::new("^a|b").anchored_source(), "^(?:^a|b)");
        assert_eq!(Pattern::case_insensitive("^a").anchored_source(), "(?i)^(?:^a)");
    }

    #[test]
    fn test_shortcut_chars_deduplicated() {
        let rule = PatternRule::new(StyleTag::String, Pattern::new("^\"[^\"]*\"?"))
            .with_shortcut("\"'\"");
        assert_eq!(rule.shortcut, vec!['"', '\'']);
        assert!(rule.has_shortcut());
        assert!(!PatternRule::new(StyleTag::Plain, Pattern::new("^a")).has_shortcut());
    }
}
