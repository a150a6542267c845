//! Lua

use crate::syntax::language::Grammar;
use crate::syntax::rules::{Pattern, PatternRule};
use crate::syntax::tokens::StyleTag;

fn rule(style: StyleTag, pattern: &str) -> PatternRule {
    PatternRule::new(style, Pattern::new(pattern))
}

fn rule_ci(style: StyleTag, pattern: &str) -> PatternRule {
    PatternRule::new(style, Pattern::case_insensitive(pattern))
}

pub fn lua() -> Grammar {
    Grammar::new()
        .shortcut(rule(StyleTag::Plain, r"^[\t\n\r \xA0]+").with_shortcut("\t\n\r \u{a0}"))
        .shortcut(
            rule(
                StyleTag::String,
                r#"^(?:"(?:[^"\\]|\\[\s\S])*(?:"|$)|'(?:[^'\\]|\\[\s\S])*(?:'|$))"#,
            )
            .with_shortcut("\"'"),
        )
        // long brackets close on the same number of `=`
        .fallback(rule(
            StyleTag::Comment,
            r"^--(?:\[(=*)\[[\s\S]*?(?:\]\1\]|$)|[^\r\n]*)",
        ))
        .fallback(rule(StyleTag::String, r"^\[(=*)\[[\s\S]*?(?:\]\1\]|$)"))
        .fallback(rule(
            StyleTag::Keyword,
            r"^(?:and|break|do|else|elseif|end|false|for|function|if|in|local|nil|not|or|repeat|return|then|true|until|while)\b",
        ))
        .fallback(rule_ci(
            StyleTag::Literal,
            r"^[+-]?(?:0x[\da-f]+|(?:(?:\.\d+|\d+(?:\.\d*)?)(?:e[+\-]?\d+)?))",
        ))
        .fallback(rule_ci(StyleTag::Plain, r"^[a-z_]\w*"))
        .fallback(rule(
            StyleTag::Punctuation,
            r#"^[^\w\t\n\r \xA0][^\w\n\r \xA0"'\-+=]*"#,
        ))
}
