//! Grammars and compiled lexers
//!
//! A [`Grammar`] is plain data: ordered shortcut rules, ordered fallback
//! rules, and any auxiliary grammars it brings along. [`Lexer::compile`]
//! turns it into the immutable form that decoration runs against.

use std::collections::hash_map::Entry;

use rustc_hash::{FxHashMap, FxHashSet};

use super::combine::{combine_prefix_patterns, CombinedPattern};
use super::matcher::{Captured, Matcher};
use super::rules::{Pattern, PatternRule};
use super::tokens::StyleTag;
use crate::error::{ConfigError, Result};

/// A complete grammar for one language
#[derive(Debug, Clone, Default)]
pub struct Grammar {
    /// Rules dispatched by a token's first character, in order
    pub shortcuts: Vec<PatternRule>,
    /// Rules tried in order when dispatch does not apply
    pub fallbacks: Vec<PatternRule>,
    /// Grammars registered alongside this one when it is first compiled
    pub auxiliary: Vec<AuxiliaryGrammar>,
}

/// A grammar contributed to the registry by a composite grammar
#[derive(Debug, Clone)]
pub struct AuxiliaryGrammar {
    /// Identifiers the grammar is registered under
    pub ids: Vec<String>,
    pub grammar: Grammar,
}

impl Grammar {
    /// Create an empty grammar
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: append a shortcut rule
    pub fn shortcut(mut self, rule: PatternRule) -> Self {
        self.shortcuts.push(rule);
        self
    }

    /// Builder: append a fallback rule
    pub fn fallback(mut self, rule: PatternRule) -> Self {
        self.fallbacks.push(rule);
        self
    }

    /// Builder: contribute `grammar` under `ids` when this one compiles
    pub fn auxiliary(mut self, ids: &[&str], grammar: Grammar) -> Self {
        self.auxiliary.push(AuxiliaryGrammar {
            ids: ids.iter().map(|id| id.to_string()).collect(),
            grammar,
        });
        self
    }

    /// Every rule pattern, shortcuts first, in declaration order
    fn patterns(&self) -> impl Iterator<Item = &Pattern> {
        self.shortcuts
            .iter()
            .chain(&self.fallbacks)
            .map(|rule| &rule.pattern)
    }
}

/// A rule with its pattern compiled for matching whole tokens
#[derive(Debug, Clone)]
struct CompiledRule {
    style: StyleTag,
    matcher: Matcher,
}

impl CompiledRule {
    fn compile(rule: &PatternRule) -> std::result::Result<Self, ConfigError> {
        Ok(Self {
            style: rule.style.clone(),
            matcher: Matcher::new(&rule.pattern.anchored_source())?,
        })
    }
}

/// The style chosen for a token, plus the groups its rule captured
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub style: StyleTag,
    /// `None` when no rule matched and the token fell back to plain
    pub captures: Option<Captured>,
}

/// A compiled grammar
///
/// Immutable once built, so one instance can serve any number of
/// concurrent decorations.
#[derive(Debug)]
pub struct Lexer {
    /// Shortcut rules followed by fallback rules
    rules: Vec<CompiledRule>,
    /// Index of the first fallback rule in `rules`
    first_fallback: usize,
    /// First character to index into `rules`
    shortcuts: FxHashMap<char, usize>,
    tokenizer: CombinedPattern,
}

impl Lexer {
    /// Compile a grammar.
    ///
    /// Every rule with shortcut characters takes part in dispatch, fallback
    /// rules included. Two rules may name the same character only if they
    /// assign the same style; the later one then takes the character.
    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(shortcuts = grammar.shortcuts.len(), fallbacks = grammar.fallbacks.len())
    )]
    pub fn compile(grammar: &Grammar) -> std::result::Result<Self, ConfigError> {
        let declared: Vec<&PatternRule> =
            grammar.shortcuts.iter().chain(&grammar.fallbacks).collect();
        let mut shortcuts: FxHashMap<char, usize> = FxHashMap::default();
        for (index, rule) in declared.iter().enumerate() {
            for &ch in &rule.shortcut {
                match shortcuts.entry(ch) {
                    Entry::Occupied(mut slot) => {
                        let first = declared[*slot.get()];
                        if first.style != rule.style {
                            return Err(ConfigError::ConflictingShortcut {
                                ch,
                                first: first.style.to_string(),
                                second: rule.style.to_string(),
                            });
                        }
                        slot.insert(index);
                    }
                    Entry::Vacant(slot) => {
                        slot.insert(index);
                    }
                }
            }
        }

        let rules = declared
            .iter()
            .map(|rule| CompiledRule::compile(rule))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        // a repeated pattern can never win a later alternative
        let mut seen = FxHashSet::default();
        let patterns: Vec<Pattern> = grammar
            .patterns()
            .filter(|pattern| seen.insert(*pattern))
            .cloned()
            .collect();
        let tokenizer = combine_prefix_patterns(&patterns)?;

        tracing::debug!(
            shortcut_chars = shortcuts.len(),
            unique_patterns = patterns.len(),
            backtracking = tokenizer.is_backtracking(),
            "compiled lexer"
        );

        Ok(Self {
            rules,
            first_fallback: grammar.shortcuts.len(),
            shortcuts,
            tokenizer,
        })
    }

    /// The combined tokenizer pattern
    pub fn tokenizer(&self) -> &CombinedPattern {
        &self.tokenizer
    }

    /// Split `source` into tokens, left to right, with no gaps
    pub fn tokenize<'a>(&self, source: &'a str) -> Result<Vec<&'a str>> {
        let mut tokens = Vec::new();
        let mut pos = 0;
        while pos < source.len() {
            let span = self.tokenizer.token_at(source, pos)?;
            tokens.push(&source[span.clone()]);
            pos = span.end;
        }
        Ok(tokens)
    }

    /// Pick the style for one token.
    ///
    /// A shortcut rule for the token's first character is tried alone
    /// first; if it does not match, fallback rules are tried in order.
    /// Tokens no rule matches are plain.
    pub fn classify(&self, token: &str) -> Result<Classification> {
        let shortcut = token
            .chars()
            .next()
            .and_then(|ch| self.shortcuts.get(&ch))
            .copied();
        let fallbacks =
            (self.first_fallback..self.rules.len()).filter(|&index| Some(index) != shortcut);
        for index in shortcut.into_iter().chain(fallbacks) {
            let rule = &self.rules[index];
            if let Some(captures) = rule.matcher.captures(token)? {
                return Ok(Classification {
                    style: rule.style.clone(),
                    captures: Some(captures),
                });
            }
        }
        Ok(Classification {
            style: StyleTag::Plain,
            captures: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(style: StyleTag, pattern: &str) -> PatternRule {
        PatternRule::new(style, Pattern::new(pattern))
    }

    fn test_grammar() -> Grammar {
        Grammar::new()
            .shortcut(rule(StyleTag::String, r#"^"[^"]*"?"#).with_shortcut("\""))
            .shortcut(rule(StyleTag::Comment, r"^#[^\r\n]*").with_shortcut("#"))
            .fallback(rule(StyleTag::Keyword, r"^(?:if|else)\b"))
            .fallback(rule(StyleTag::Literal, r"^\d+"))
            .fallback(rule(StyleTag::Plain, r"^[a-z]+"))
    }

    #[test]
    fn test_tokenize_covers_input() {
        let lexer = Lexer::compile(&test_grammar()).unwrap();
        let tokens = lexer.tokenize(r#"if x "y" 42#c"#).unwrap();
        assert_eq!(tokens, vec!["if", " ", "x", " ", "\"y\"", " ", "42", "#c"]);
        assert_eq!(tokens.concat(), r#"if x "y" 42#c"#);
        assert!(lexer.tokenize("").unwrap().is_empty());
    }

    #[test]
    fn test_classify_order() {
        let lexer = Lexer::compile(&test_grammar()).unwrap();
        assert_eq!(lexer.classify("\"y\"").unwrap().style, StyleTag::String);
        assert_eq!(lexer.classify("else").unwrap().style, StyleTag::Keyword);
        assert_eq!(lexer.classify("elsewhere").unwrap().style, StyleTag::Plain);
        assert_eq!(lexer.classify("42").unwrap().style, StyleTag::Literal);

        let unmatched = lexer.classify(" ").unwrap();
        assert_eq!(unmatched.style, StyleTag::Plain);
        assert!(unmatched.captures.is_none());
    }

    #[test]
    fn test_shortcut_miss_tries_fallbacks() {
        let grammar = Grammar::new()
            .shortcut(rule(StyleTag::Comment, r"^--[^\n]*").with_shortcut("-"))
            .fallback(rule(StyleTag::Punctuation, r"^[-+]"));
        let lexer = Lexer::compile(&grammar).unwrap();
        assert_eq!(lexer.classify("-- hi").unwrap().style, StyleTag::Comment);
        assert_eq!(lexer.classify("-").unwrap().style, StyleTag::Punctuation);
    }

    #[test]
    fn test_fallback_rule_with_shortcut_dispatches() {
        let grammar = Grammar::new()
            .fallback(rule(StyleTag::Plain, r"^\w+"))
            .fallback(rule(StyleTag::Type, r"^@\w+").with_shortcut("@"));
        let lexer = Lexer::compile(&grammar).unwrap();
        assert_eq!(lexer.classify("@Override").unwrap().style, StyleTag::Type);
        assert_eq!(lexer.classify("@").unwrap().style, StyleTag::Plain);
    }

    #[test]
    fn test_conflicting_shortcut() {
        let grammar = Grammar::new()
            .shortcut(rule(StyleTag::String, r"^'[^']*'").with_shortcut("'"))
            .shortcut(rule(StyleTag::Literal, r"^'\w").with_shortcut("'"));
        let err = Lexer::compile(&grammar).unwrap_err();
        assert_eq!(
            err,
            ConfigError::ConflictingShortcut {
                ch: '\'',
                first: "str".into(),
                second: "lit".into(),
            }
        );
    }

    #[test]
    fn test_same_style_shortcut_last_wins() {
        let grammar = Grammar::new()
            .shortcut(rule(StyleTag::String, r"^'a'").with_shortcut("'"))
            .shortcut(rule(StyleTag::String, r"^'[^']*'").with_shortcut("'"));
        let lexer = Lexer::compile(&grammar).unwrap();
        // only the later rule is consulted for `'`
        let classified = lexer.classify("'bc'").unwrap();
        assert_eq!(classified.style, StyleTag::String);
        assert_eq!(classified.captures.unwrap().whole(), 0..4);
    }

    #[test]
    fn test_duplicate_patterns_joined_once() {
        let grammar = Grammar::new()
            .fallback(rule(StyleTag::Keyword, r"^\w+"))
            .fallback(rule(StyleTag::Plain, r"^\w+"));
        let lexer = Lexer::compile(&grammar).unwrap();
        assert_eq!(lexer.tokenizer().as_str(), r"(?:\w+)|(?s:.)");
    }

    #[test]
    fn test_embedding_captures() {
        let grammar = Grammar::new().fallback(rule(
            StyleTag::embedded("js"),
            r"^<script>([\s\S]*?)(</script>)",
        ));
        let lexer = Lexer::compile(&grammar).unwrap();
        let classified = lexer.classify("<script>x</script>").unwrap();
        assert_eq!(classified.style, StyleTag::embedded("js"));
        let captures = classified.captures.unwrap();
        assert_eq!(captures.group(1), Some(8..9));
        assert_eq!(captures.group(2), Some(9..18));
    }

    #[test]
    fn test_multiline_rule_rejected() {
        let grammar = Grammar::new().fallback(rule(StyleTag::Plain, "(?m)^a$"));
        assert!(matches!(
            Lexer::compile(&grammar),
            Err(ConfigError::MultilinePattern(_))
        ));
    }
}
