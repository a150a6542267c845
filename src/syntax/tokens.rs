//! Style tags for decorated source
//!
//! This module defines the lexical categories a grammar can assign to a
//! token, plus the special embedding tag that hands a sub-region of a
//! token to another grammar.

use std::fmt;
use std::sync::Arc;

/// Prefix that marks a style name as an embedded-language hand-off
pub const EMBED_PREFIX: &str = "lang-";

/// Lexical category of a token
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum StyleTag {
    /// String literals
    String,
    /// Language keywords
    Keyword,
    /// Comments
    Comment,
    /// Type names
    Type,
    /// Literal values (numbers, `null`, `true`)
    Literal,
    /// Punctuation runs
    Punctuation,
    /// Plain text and identifiers
    #[default]
    Plain,
    /// Markup tag names
    Tag,
    /// Markup declarations such as a DOCTYPE
    Declaration,
    /// Embedded source whose language could not be decorated
    Source,
    /// Markup attribute names
    AttribName,
    /// Markup attribute values
    AttribValue,
    /// Markup that is not code (line numbers and the like)
    NoCode,
    /// Opening bracket in Lisp-like grammars
    Open,
    /// Closing bracket in Lisp-like grammars
    Close,
    /// Group 1 of the match is written in the named language.
    /// An empty name means "guess from the content".
    Embedded(Arc<str>),
}

impl StyleTag {
    /// Build an embedding tag for a language identifier
    pub fn embedded(language: &str) -> Self {
        StyleTag::Embedded(Arc::from(language))
    }

    /// Whether this tag hands its match off to another grammar
    pub fn is_embedded(&self) -> bool {
        matches!(self, StyleTag::Embedded(_))
    }

    /// Language named by an embedding tag, `None` for "guess"
    pub fn embedded_language(&self) -> Option<&str> {
        match self {
            StyleTag::Embedded(name) if !name.is_empty() => Some(&**name),
            _ => None,
        }
    }

    /// Short name used by grammar files and renderers
    pub fn name(&self) -> &str {
        match self {
            StyleTag::String => "str",
            StyleTag::Keyword => "kwd",
            StyleTag::Comment => "com",
            StyleTag::Type => "typ",
            StyleTag::Literal => "lit",
            StyleTag::Punctuation => "pun",
            StyleTag::Plain => "pln",
            StyleTag::Tag => "tag",
            StyleTag::Declaration => "dec",
            StyleTag::Source => "src",
            StyleTag::AttribName => "atn",
            StyleTag::AttribValue => "atv",
            StyleTag::NoCode => "nocode",
            StyleTag::Open => "opn",
            StyleTag::Close => "clo",
            StyleTag::Embedded(_) => "lang",
        }
    }

    /// Parse a style from its short name or a `lang-` embedding name
    pub fn from_name(name: &str) -> Option<Self> {
        if let Some(language) = name.strip_prefix(EMBED_PREFIX) {
            return Some(StyleTag::embedded(language));
        }
        match name {
            "str" => Some(StyleTag::String),
            "kwd" => Some(StyleTag::Keyword),
            "com" => Some(StyleTag::Comment),
            "typ" => Some(StyleTag::Type),
            "lit" => Some(StyleTag::Literal),
            "pun" => Some(StyleTag::Punctuation),
            "pln" => Some(StyleTag::Plain),
            "tag" => Some(StyleTag::Tag),
            "dec" => Some(StyleTag::Declaration),
            "src" => Some(StyleTag::Source),
            "atn" => Some(StyleTag::AttribName),
            "atv" => Some(StyleTag::AttribValue),
            "nocode" => Some(StyleTag::NoCode),
            "opn" => Some(StyleTag::Open),
            "clo" => Some(StyleTag::Close),
            _ => None,
        }
    }
}

impl fmt::Display for StyleTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StyleTag::Embedded(language) => write!(f, "{EMBED_PREFIX}{language}"),
            other => f.write_str(other.name()),
        }
    }
}
