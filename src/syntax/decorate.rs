//! Decoration of source text
//!
//! Splits source into tokens with a lexer's combined pattern, classifies
//! each token, and hands embedded regions to the grammar they name. The
//! functions here hold no state between calls, so any number of them can
//! run at once against shared lexers.

use std::ops::Range;

use rustc_hash::FxHashMap;

use super::language::Lexer;
use super::manager::Registry;
use super::matcher::Captured;
use super::style::{compact, Decoration};
use super::tokens::StyleTag;
use crate::error::Result;

/// Decorate `source`, which starts at absolute offset `base_pos`, and
/// return the canonical stream.
pub fn decorate(
    registry: &Registry,
    lexer: &Lexer,
    source: &str,
    base_pos: usize,
) -> Result<Vec<Decoration>> {
    let raw = decorate_raw(registry, lexer, source, base_pos)?;
    Ok(compact(&raw, base_pos, source.len()))
}

/// Decorate `source` without compacting.
///
/// The stream opens with a plain entry at `base_pos` and holds one entry
/// per token, in emission order. Embedded regions contribute their own
/// entries in place, so offsets may repeat.
pub fn decorate_raw(
    registry: &Registry,
    lexer: &Lexer,
    source: &str,
    base_pos: usize,
) -> Result<Vec<Decoration>> {
    let mut out = Vec::new();
    append_decorations(registry, lexer, source, base_pos, &mut out)?;
    Ok(out)
}

fn append_decorations(
    registry: &Registry,
    lexer: &Lexer,
    source: &str,
    base_pos: usize,
    out: &mut Vec<Decoration>,
) -> Result<()> {
    out.push(Decoration::new(base_pos, StyleTag::Plain));

    // styles depend only on token text
    let mut memo: FxHashMap<&str, StyleTag> = FxHashMap::default();
    let mut pos = 0;
    for token in lexer.tokenize(source)? {
        let token_start = base_pos + pos;
        pos += token.len();

        if let Some(style) = memo.get(token) {
            out.push(Decoration::new(token_start, style.clone()));
            continue;
        }

        let classified = lexer.classify(token)?;
        let region = classified
            .captures
            .as_ref()
            .and_then(|captures| embedded_region(token, captures));
        match (&classified.style, region) {
            (StyleTag::Embedded(_), Some(region)) => {
                let language = classified.style.embedded_language();
                let embedded = &token[region.clone()];
                tracing::trace!(
                    language = language.unwrap_or(""),
                    offset = token_start + region.start,
                    len = embedded.len(),
                    "decorating embedded region"
                );
                append_decorations(registry, lexer, &token[..region.start], token_start, out)?;
                let inner = registry.resolve(language, embedded)?;
                append_decorations(registry, &inner, embedded, token_start + region.start, out)?;
                append_decorations(
                    registry,
                    lexer,
                    &token[region.end..],
                    token_start + region.end,
                    out,
                )?;
            }
            (StyleTag::Embedded(_), None) => {
                memo.insert(token, StyleTag::Source);
                out.push(Decoration::new(token_start, StyleTag::Source));
            }
            (style, _) => {
                memo.insert(token, style.clone());
                out.push(Decoration::new(token_start, style.clone()));
            }
        }
    }
    Ok(())
}

/// Span of the embedded region inside `token`, or `None` if group 1 is
/// missing or empty.
///
/// A non-empty group 2 is the right-hand context: the region is the group 1
/// length ending where that context begins.
fn embedded_region(token: &str, captures: &Captured) -> Option<Range<usize>> {
    let group = captures.group(1).filter(|g| !g.is_empty())?;
    let Some(context) = captures.group(2).filter(|c| !c.is_empty()) else {
        return Some(group);
    };
    let end = context.start;
    let start = end.checked_sub(group.len())?;
    if token.is_char_boundary(start) && token.is_char_boundary(end) {
        Some(start..end)
    } else {
        Some(group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::language::Grammar;
    use crate::syntax::rules::{Pattern, PatternRule};

    fn rule(style: StyleTag, pattern: &str) -> PatternRule {
        PatternRule::new(style, Pattern::new(pattern))
    }

    fn styles(stream: &[Decoration]) -> Vec<(usize, String)> {
        stream
            .iter()
            .map(|d| (d.offset, d.style.to_string()))
            .collect()
    }

    fn pairs(entries: &[(usize, &str)]) -> Vec<(usize, String)> {
        entries.iter().map(|&(o, s)| (o, s.to_string())).collect()
    }

    #[test]
    fn test_shortcut_and_fallback() {
        let grammar = Grammar::new()
            .shortcut(rule(StyleTag::String, r#"^"[^"]*""#).with_shortcut("\""))
            .fallback(rule(StyleTag::Plain, r#"^[^"]+"#));
        let lexer = Lexer::compile(&grammar).unwrap();
        let registry = Registry::new();

        let stream = decorate(&registry, &lexer, r#"a"b"c"#, 0).unwrap();
        assert_eq!(styles(&stream), pairs(&[(0, "pln"), (1, "str"), (4, "pln")]));
    }

    #[test]
    fn test_embedded_offsets_are_absolute() {
        let registry = Registry::new();
        let js = Grammar::new().fallback(rule(StyleTag::Plain, r"^[\s\S]+"));
        registry.register("js", js).unwrap();

        let markup = Grammar::new()
            .fallback(rule(StyleTag::embedded("js"), r"^<script>([\s\S]*?)</script>"))
            .fallback(rule(StyleTag::Tag, r"^</?\w+>"));
        let lexer = Lexer::compile(&markup).unwrap();

        let stream = decorate(&registry, &lexer, "<script>x</script>", 0).unwrap();
        assert_eq!(styles(&stream), pairs(&[(0, "tag"), (8, "pln"), (9, "tag")]));

        let shifted = decorate(&registry, &lexer, "<script>x</script>", 100).unwrap();
        assert_eq!(styles(&shifted), pairs(&[(100, "tag"), (108, "pln"), (109, "tag")]));
    }

    #[test]
    fn test_right_context_group() {
        let registry = Registry::new();
        registry
            .register("inner", Grammar::new().fallback(rule(StyleTag::Keyword, r"^\w+")))
            .unwrap();
        // group 1 text also occurs earlier in the token
        let grammar = Grammar::new()
            .fallback(rule(StyleTag::embedded("inner"), r"^ab=(ab)(;)"))
            .fallback(rule(StyleTag::Punctuation, r"^[^\w]+"));
        let lexer = Lexer::compile(&grammar).unwrap();

        let raw = decorate_raw(&registry, &lexer, "ab=ab;", 0).unwrap();
        let stream = compact(&raw, 0, 6);
        assert_eq!(styles(&stream), pairs(&[(0, "pln"), (2, "pun"), (3, "kwd"), (5, "pun")]));
    }

    #[test]
    fn test_right_context_inside_token() {
        let registry = Registry::new();
        registry
            .register("inner", Grammar::new().fallback(rule(StyleTag::Keyword, r"^\w+")))
            .unwrap();
        let grammar = Grammar::new()
            .fallback(rule(StyleTag::embedded("inner"), r"^<s>(\w+)(</s)>"))
            .fallback(rule(StyleTag::Punctuation, r"^[^\w]+"));
        let lexer = Lexer::compile(&grammar).unwrap();

        let raw = decorate_raw(&registry, &lexer, "<s>ab</s>", 0).unwrap();
        let stream = compact(&raw, 0, 9);
        assert_eq!(
            styles(&stream),
            pairs(&[
                (0, "pun"),
                (1, "pln"),
                (2, "pun"),
                (3, "kwd"),
                (5, "pun"),
                (7, "pln"),
                (8, "pun"),
            ])
        );
    }

    #[test]
    fn test_empty_right_context_ignored() {
        let registry = Registry::new();
        registry
            .register("inner", Grammar::new().fallback(rule(StyleTag::Keyword, r"^\w+")))
            .unwrap();
        let grammar = Grammar::new()
            .fallback(rule(StyleTag::embedded("inner"), r"^\[(\w+)()\]"))
            .fallback(rule(StyleTag::Punctuation, r"^[^\w]+"));
        let lexer = Lexer::compile(&grammar).unwrap();

        let raw = decorate_raw(&registry, &lexer, "[ab]", 0).unwrap();
        let stream = compact(&raw, 0, 4);
        assert_eq!(styles(&stream), pairs(&[(0, "pun"), (1, "kwd"), (3, "pun")]));
    }

    #[test]
    fn test_empty_embedding_becomes_source() {
        let registry = Registry::new();
        let grammar = Grammar::new().fallback(rule(StyleTag::embedded("js"), r"^<s>(\w*)</s>"));
        let lexer = Lexer::compile(&grammar).unwrap();

        let stream = decorate(&registry, &lexer, "<s></s>", 0).unwrap();
        assert_eq!(styles(&stream), pairs(&[(0, "src")]));
    }

    #[test]
    fn test_raw_stream_last_write_wins() {
        let registry = Registry::new();
        registry
            .register("num", Grammar::new().fallback(rule(StyleTag::Literal, r"^\d+")))
            .unwrap();
        let grammar = Grammar::new()
            .fallback(rule(StyleTag::embedded("num"), r"^\[(\d+)\]"))
            .fallback(rule(StyleTag::Punctuation, r"^[\[\]]"));
        let lexer = Lexer::compile(&grammar).unwrap();

        let raw = decorate_raw(&registry, &lexer, "[12]", 0).unwrap();
        // the embedded seed and its first token share offset 1
        assert_eq!(
            styles(&raw),
            pairs(&[
                (0, "pln"),
                (0, "pln"),
                (0, "pun"),
                (1, "pln"),
                (1, "lit"),
                (3, "pln"),
                (3, "pun"),
            ])
        );
        let stream = compact(&raw, 0, 4);
        assert_eq!(styles(&stream), pairs(&[(0, "pun"), (1, "lit"), (3, "pun")]));
    }

    #[test]
    fn test_unknown_embedded_language_guesses() {
        let registry = Registry::new();
        let grammar = Grammar::new()
            .fallback(rule(StyleTag::embedded(""), r"^\{([^}]*)\}"));
        let lexer = Lexer::compile(&grammar).unwrap();

        // guessed as generic code: `x` plain, `1` literal
        let stream = decorate(&registry, &lexer, "{x = 1}", 0).unwrap();
        assert!(stream.iter().any(|d| d.offset == 5 && d.style == StyleTag::Literal));
    }

    #[test]
    fn test_empty_source() {
        let registry = Registry::new();
        let lexer = Lexer::compile(&Grammar::new()).unwrap();
        assert_eq!(
            decorate_raw(&registry, &lexer, "", 7).unwrap(),
            vec![Decoration::new(7, StyleTag::Plain)]
        );
        assert!(decorate(&registry, &lexer, "", 7).unwrap().is_empty());
    }
}
