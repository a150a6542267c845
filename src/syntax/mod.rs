//! Lexing and decoration
//!
//! A grammar is two ordered lists of pattern rules. The rules are joined
//! into one pattern that splits source into tokens, each token is
//! classified by the first rule matching it whole, and the resulting
//! style changes are reported as position-indexed decorations:
//! - `combine`: joining rule patterns into one prefix pattern
//! - `language`: grammars and compiled lexers
//! - `decorate`: the decoration walk, including embedded languages
//! - `style`: decoration streams and compaction
//! - `manager`: the language registry

pub mod builtin;
mod combine;
mod decorate;
mod language;
mod manager;
mod matcher;
mod rules;
mod style;
mod tokens;

pub use combine::{combine_prefix_patterns, CombinedPattern};
pub use decorate::{decorate, decorate_raw};
pub use language::{AuxiliaryGrammar, Classification, Grammar, Lexer};
pub use manager::{GrammarFactory, LanguageSource, Registry, DEFAULT_CODE, DEFAULT_MARKUP};
pub use matcher::{Captured, Matcher};
pub use rules::{Pattern, PatternFlags, PatternRule};
pub use style::{compact, spans, Decoration, Span};
pub use tokens::{StyleTag, EMBED_PREFIX};
