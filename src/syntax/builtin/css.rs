//! CSS
//!
//! Property names are handed to `css-kw` and the body of `url(...)` to
//! `css-str`; both are registered alongside `css` on first use.

use crate::syntax::language::Grammar;
use crate::syntax::rules::{Pattern, PatternRule};
use crate::syntax::tokens::StyleTag;

const IDENTIFIER: &str = r"-?(?:[_a-z]|(?:\\[0-9a-f]+ ?))(?:[_a-z0-9\-]|\\(?:\\[0-9a-f]+ ?))*";

fn rule(style: StyleTag, pattern: &str) -> PatternRule {
    PatternRule::new(style, Pattern::new(pattern))
}

fn rule_ci(style: StyleTag, pattern: &str) -> PatternRule {
    PatternRule::new(style, Pattern::case_insensitive(pattern))
}

pub fn css() -> Grammar {
    Grammar::new()
        .shortcut(rule(StyleTag::Plain, r"^[ \t\r\n\f]+").with_shortcut(" \t\r\n\u{c}"))
        .fallback(rule(
            StyleTag::String,
            r#"^"(?:[^\n\r\f\\"]|\\(?:\r\n?|\n|\f)|\\[\s\S])*""#,
        ))
        .fallback(rule(
            StyleTag::String,
            r#"^'(?:[^\n\r\f\\']|\\(?:\r\n?|\n|\f)|\\[\s\S])*'"#,
        ))
        .fallback(rule_ci(StyleTag::embedded("css-str"), r#"^url\(([^)"']+)\)"#))
        .fallback(rule_ci(
            StyleTag::Keyword,
            r"^(?:url|rgb|!important|@import|@page|@media|@charset|inherit)(?=[^\-\w]|$)",
        ))
        .fallback(rule_ci(
            StyleTag::embedded("css-kw"),
            &format!(r"^({IDENTIFIER})\s*:"),
        ))
        .fallback(rule(StyleTag::Comment, r"^/\*[^*]*\*+(?:[^/*][^*]*\*+)*/"))
        .fallback(rule(StyleTag::Comment, r"^(?:<!--|-->)"))
        .fallback(rule_ci(StyleTag::Literal, r"^(?:\d+|\d*\.\d+)(?:%|[a-z]+)?"))
        .fallback(rule_ci(StyleTag::Literal, r"^#(?:[0-9a-f]{3}){1,2}\b"))
        .fallback(rule_ci(StyleTag::Plain, &format!("^{IDENTIFIER}")))
        .fallback(rule_ci(StyleTag::Punctuation, r#"^[^\s\w'"]+"#))
        .auxiliary(
            &["css-kw"],
            Grammar::new().fallback(rule_ci(StyleTag::Keyword, &format!("^{IDENTIFIER}"))),
        )
        .auxiliary(
            &["css-str"],
            Grammar::new().fallback(rule(StyleTag::String, r#"^[^)"']+"#)),
        )
}

#[cfg(test)]
mod tests {
    use crate::syntax::manager::Registry;
    use crate::syntax::style::Decoration;

    fn styles(stream: &[Decoration]) -> Vec<(usize, &str)> {
        stream.iter().map(|d| (d.offset, d.style.name())).collect()
    }

    #[test]
    fn test_property_names_are_keywords() {
        let registry = Registry::with_builtins().unwrap();
        let stream = registry.decorate(Some("css"), "a{color:red}", 0).unwrap();
        assert_eq!(
            styles(&stream),
            vec![(0, "pln"), (1, "pun"), (2, "kwd"), (7, "pun"), (8, "pln"), (11, "pun")]
        );
        assert!(registry.is_registered("css-kw"));
    }

    #[test]
    fn test_url_body_is_string() {
        let registry = Registry::with_builtins().unwrap();
        let stream = registry.decorate(Some("css"), "url(a.png)", 0).unwrap();
        assert_eq!(styles(&stream), vec![(0, "kwd"), (3, "pun"), (4, "str"), (9, "pun")]);
    }

    #[test]
    fn test_comment_and_colors() {
        let registry = Registry::with_builtins().unwrap();
        let stream = registry.decorate(Some("css"), "/* x */ #FFF", 0).unwrap();
        assert_eq!(styles(&stream), vec![(0, "com"), (7, "pln"), (8, "lit")]);
    }
}
