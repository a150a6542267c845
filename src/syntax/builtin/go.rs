//! Go
//!
//! Only comments are styled. Go identifiers and types are too ambiguous
//! to guess at without parsing, so strings and code stay plain.

use crate::syntax::language::Grammar;
use crate::syntax::rules::{Pattern, PatternRule};
use crate::syntax::tokens::StyleTag;

pub fn go() -> Grammar {
    Grammar::new()
        .shortcut(
            PatternRule::new(StyleTag::Plain, Pattern::new(r"^[\t\n\r \xA0]+"))
                .with_shortcut("\t\n\r \u{a0}"),
        )
        .shortcut(
            PatternRule::new(
                StyleTag::Plain,
                Pattern::new(
                    r#"^(?:"(?:[^"\\]|\\[\s\S])*(?:"|$)|'(?:[^'\\]|\\[\s\S])+(?:'|$)|`[^`]*(?:`|$))"#,
                ),
            )
            .with_shortcut("\"'"),
        )
        .fallback(PatternRule::new(
            StyleTag::Comment,
            Pattern::new(r"^(?://[^\r\n]*|/\*[\s\S]*?\*/)"),
        ))
        .fallback(PatternRule::new(
            StyleTag::Plain,
            Pattern::case_insensitive(r#"^(?:[^/"'`]|/(?![/*]))+"#),
        ))
}
