//! codelex - a data-driven lexical highlighter
//!
//! Grammars are ordered lists of regular-expression rules. A [`Lexer`]
//! compiled from a grammar splits source text into tokens and classifies
//! them, and [`Registry::decorate`] turns a source string into a stream of
//! position-indexed style changes, following embedded languages into the
//! grammars they name.

pub mod config;
pub mod error;
pub mod syntax;

pub use error::{ConfigError, Error, Result};
pub use syntax::{Decoration, Grammar, Lexer, Pattern, PatternRule, Registry, Span, StyleTag};
