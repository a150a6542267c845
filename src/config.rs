//! Grammar file support
//!
//! Loads language grammars from TOML files, so a language can be added
//! without recompiling.
//!
//! Example:
//! ```toml
//! ids = ["ini", "cfg"]
//!
//! [[shortcut]]
//! style = "com"
//! pattern = '^;[^\r\n]*'
//! chars = ";"
//!
//! [[fallback]]
//! style = "pln"
//! pattern = '^[a-z_]\w*'
//! case_insensitive = true
//!
//! [[auxiliary]]
//! ids = ["ini-key"]
//! [[auxiliary.fallback]]
//! style = "kwd"
//! pattern = '^[\s\S]+'
//! ```

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{ConfigError, Result};
use crate::syntax::{Grammar, Pattern, PatternRule, StyleTag};

/// A language grammar as written in a grammar file
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GrammarFile {
    /// Identifiers the language is registered under
    pub ids: Vec<String>,
    #[serde(default)]
    pub shortcut: Vec<RuleSpec>,
    #[serde(default)]
    pub fallback: Vec<RuleSpec>,
    #[serde(default)]
    pub auxiliary: Vec<AuxiliarySpec>,
}

/// One pattern rule
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleSpec {
    /// Short style name, or `lang-<id>` for an embedding
    pub style: String,
    pub pattern: String,
    /// Characters that dispatch straight to this rule
    pub chars: Option<String>,
    #[serde(default)]
    pub case_insensitive: bool,
}

/// A helper grammar registered together with the file's language
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuxiliarySpec {
    pub ids: Vec<String>,
    #[serde(default)]
    pub shortcut: Vec<RuleSpec>,
    #[serde(default)]
    pub fallback: Vec<RuleSpec>,
}

impl GrammarFile {
    /// Parse grammar file contents
    pub fn parse(contents: &str) -> std::result::Result<Self, ConfigError> {
        let file: GrammarFile =
            toml::from_str(contents).map_err(|e| ConfigError::Grammar(e.to_string()))?;
        if file.ids.is_empty() {
            return Err(ConfigError::Grammar("`ids` must name at least one language".into()));
        }
        Ok(file)
    }

    /// Load and parse a grammar file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Ok(Self::parse(&contents)?)
    }

    /// Build the grammar, including its auxiliary grammars
    pub fn into_grammar(self) -> std::result::Result<Grammar, ConfigError> {
        let mut grammar = build(&self.shortcut, &self.fallback)?;
        for aux in &self.auxiliary {
            let ids: Vec<&str> = aux.ids.iter().map(String::as_str).collect();
            grammar = grammar.auxiliary(&ids, build(&aux.shortcut, &aux.fallback)?);
        }
        Ok(grammar)
    }
}

impl RuleSpec {
    fn to_rule(&self) -> std::result::Result<PatternRule, ConfigError> {
        let style = StyleTag::from_name(&self.style)
            .ok_or_else(|| ConfigError::UnknownStyle(self.style.clone()))?;
        let pattern = if self.case_insensitive {
            Pattern::case_insensitive(&self.pattern)
        } else {
            Pattern::new(&self.pattern)
        };
        let rule = PatternRule::new(style, pattern);
        Ok(match &self.chars {
            Some(chars) => rule.with_shortcut(chars),
            None => rule,
        })
    }
}

fn build(
    shortcuts: &[RuleSpec],
    fallbacks: &[RuleSpec],
) -> std::result::Result<Grammar, ConfigError> {
    let mut grammar = Grammar::new();
    for entry in shortcuts {
        grammar = grammar.shortcut(entry.to_rule()?);
    }
    for entry in fallbacks {
        grammar = grammar.fallback(entry.to_rule()?);
    }
    Ok(grammar)
}
