//! Generic markup grammars
//!
//! `markup` splits a document into text, comments, declarations and
//! tags, handing script and style bodies to `js` and `css`. Each tag goes
//! to `in.tag`, which styles names, attributes and values, and passes
//! unquoted values to `uq.val`.

use crate::syntax::language::Grammar;
use crate::syntax::rules::{Pattern, PatternRule};
use crate::syntax::tokens::StyleTag;

fn rule(style: StyleTag, pattern: &str) -> PatternRule {
    PatternRule::new(style, Pattern::new(pattern))
}

fn rule_ci(style: StyleTag, pattern: &str) -> PatternRule {
    PatternRule::new(style, Pattern::case_insensitive(pattern))
}

/// HTML, XML and friends
pub fn markup() -> Grammar {
    let guess = StyleTag::embedded("");
    Grammar::new()
        .fallback(rule(StyleTag::Plain, r"^[^<?]+"))
        .fallback(rule(StyleTag::Declaration, r"^<!\w[^>]*(?:>|$)"))
        .fallback(rule(StyleTag::Comment, r"^<!--[\s\S]*?(?:-->|$)"))
        // processing instructions and server-side blocks, language unknown
        .fallback(rule(guess.clone(), r"^<\?([\s\S]+?)(?:\?>|$)"))
        .fallback(rule(guess.clone(), r"^<%([\s\S]+?)(?:%>|$)"))
        .fallback(rule(StyleTag::Punctuation, r"^(?:<[%?]|[%?]>)"))
        .fallback(rule_ci(guess, r"^<xmp\b[^>]*>([\s\S]+?)</xmp\b[^>]*>"))
        .fallback(rule_ci(
            StyleTag::embedded("js"),
            r"^<script\b[^>]*>([\s\S]*?)(</script\b[^>]*>)",
        ))
        .fallback(rule_ci(
            StyleTag::embedded("css"),
            r"^<style\b[^>]*>([\s\S]*?)(</style\b[^>]*>)",
        ))
        .fallback(rule_ci(StyleTag::embedded("in.tag"), r"^(</?[a-z][^<>]*>)"))
}

/// The inside of a single tag
pub fn in_tag() -> Grammar {
    Grammar::new()
        .shortcut(rule(StyleTag::Plain, r"^\s+").with_shortcut(" \t\r\n"))
        .shortcut(rule(StyleTag::AttribValue, r#"^(?:"[^"]*"?|'[^']*'?)"#).with_shortcut("\"'"))
        .fallback(rule_ci(StyleTag::Tag, r"^^</?[a-z](?:[\w.:-]*\w)?|/?>$"))
        .fallback(rule_ci(StyleTag::AttribName, r"^(?!style[\s=]|on)[a-z](?:[\w:-]*\w)?"))
        .fallback(rule_ci(
            StyleTag::embedded("uq.val"),
            r#"^=\s*([^>'"\s]*(?:[^>'"\s/]|/(?=\s)))"#,
        ))
        .fallback(rule(StyleTag::Punctuation, r"^[=<>/]+"))
        .fallback(rule_ci(StyleTag::embedded("js"), r#"^on\w+\s*=\s*"([^"]+)""#))
        .fallback(rule_ci(StyleTag::embedded("js"), r"^on\w+\s*=\s*'([^']+)'"))
        .fallback(rule_ci(StyleTag::embedded("js"), r#"^on\w+\s*=\s*([^"'>\s]+)"#))
        .fallback(rule_ci(StyleTag::embedded("css"), r#"^style\s*=\s*"([^"]+)""#))
        .fallback(rule_ci(StyleTag::embedded("css"), r"^style\s*=\s*'([^']+)'"))
        .fallback(rule_ci(StyleTag::embedded("css"), r#"^style\s*=\s*([^"'>\s]+)"#))
}

/// An unquoted attribute value
pub fn unquoted_value() -> Grammar {
    Grammar::new().fallback(rule(StyleTag::AttribValue, r"^[\s\S]+"))
}
