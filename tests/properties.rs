//! Property-based tests for tokenizing and decoration.
//!
//! Random sources are run through the built-in grammars and the
//! resulting streams are checked for the guarantees renderers rely on.

use codelex::syntax::{
    combine_prefix_patterns, compact, decorate_raw, Decoration, Pattern, Registry,
};
use proptest::prelude::*;

// ============================================================================
// Strategies for generating test inputs
// ============================================================================

/// Strategy for registered language identifiers, plus one nobody registered
fn arb_language() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just("default-code"),
        Just("default-markup"),
        Just("c"),
        Just("css"),
        Just("go"),
        Just("html"),
        Just("java"),
        Just("js"),
        Just("lua"),
        Just("py"),
        Just("rust"),
        Just("sh"),
        Just("unregistered"),
    ]
}

/// Strategy for source text with markup, code punctuation and non-ASCII
fn arb_source() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z0-9 =;:{}()<>/*#'\"\\n\\t.-]{0,60}",
        r#"<[a-z]{1,6}( [a-z]{1,4}="[a-z ]{0,6}")?>[a-zé 0-9]{0,10}</[a-z]{1,6}>"#,
        ".{0,40}",
    ]
}

/// Strategy for a small pattern mixing literals, classes and non-ASCII
/// letters
fn arb_cased_pattern() -> impl Strategy<Value = String> {
    let atom = (
        prop_oneof![
            Just("a"),
            Just("A"),
            Just("b"),
            Just("k"),
            Just("é"),
            Just("É"),
            Just("[a-b]"),
            Just("[^a]"),
            Just("[é]"),
            Just("[A-K]"),
        ],
        any::<bool>(),
    )
        .prop_map(|(atom, repeat)| if repeat { format!("{atom}+") } else { atom.to_string() });
    prop::collection::vec(atom, 1..4).prop_map(|atoms| atoms.concat())
}

fn registry() -> &'static Registry {
    Registry::global().unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// A non-empty source gets a stream starting at the base offset, with
    /// strictly increasing in-range offsets on char boundaries and no two
    /// neighbours sharing a style
    #[test]
    fn stream_covers_source(lang in arb_language(), source in arb_source(), base in 0usize..1000) {
        let stream = registry().decorate(Some(lang), &source, base).unwrap();
        if source.is_empty() {
            prop_assert!(stream.is_empty());
        } else {
            prop_assert_eq!(stream[0].offset, base);
        }
        for pair in stream.windows(2) {
            prop_assert!(pair[0].offset < pair[1].offset);
            prop_assert_ne!(&pair[0].style, &pair[1].style);
        }
        for decoration in &stream {
            prop_assert!(decoration.offset < base + source.len());
            prop_assert!(source.is_char_boundary(decoration.offset - base));
        }
    }

    /// Shifting the base offset shifts every entry and changes nothing else
    #[test]
    fn base_offset_only_shifts(
        lang in arb_language(),
        source in arb_source(),
        base in 1usize..1000,
    ) {
        let at_zero = registry().decorate(Some(lang), &source, 0).unwrap();
        let shifted: Vec<Decoration> = registry()
            .decorate(Some(lang), &source, base)
            .unwrap()
            .into_iter()
            .map(|d| Decoration::new(d.offset - base, d.style))
            .collect();
        prop_assert_eq!(at_zero, shifted);
    }

    /// Compacting a compacted stream leaves it unchanged
    #[test]
    fn compaction_is_idempotent(lang in arb_language(), source in arb_source()) {
        let lexer = registry().resolve(Some(lang), &source).unwrap();
        let raw = decorate_raw(registry(), &lexer, &source, 0).unwrap();
        let once = compact(&raw, 0, source.len());
        let twice = compact(&once, 0, source.len());
        prop_assert_eq!(once, twice);
    }

    /// Tokens are non-empty and concatenate back to the source
    #[test]
    fn tokens_partition_source(lang in arb_language(), source in arb_source()) {
        let lexer = registry().resolve(Some(lang), &source).unwrap();
        let tokens = lexer.tokenize(&source).unwrap();
        prop_assert!(tokens.iter().all(|token| !token.is_empty()));
        prop_assert_eq!(tokens.concat(), source);
    }

    /// The combined pattern matches what the first matching input pattern
    /// matches, or a single character when none does
    #[test]
    fn union_takes_first_match(
        words in prop::collection::vec("[ab]{1,3}", 1..5),
        text in "[abc]{1,6}",
    ) {
        let patterns: Vec<Pattern> = words
            .iter()
            .map(|word| Pattern::new(&format!("^{}", regex::escape(word))))
            .collect();
        let combined = combine_prefix_patterns(&patterns).unwrap();

        let expected = words
            .iter()
            .find(|word| text.starts_with(word.as_str()))
            .map_or(1, |word| word.len());
        prop_assert_eq!(combined.token_at(&text, 0).unwrap(), 0..expected);
    }

    /// Mixing case-sensitive and case-insensitive patterns keeps each one's
    /// own matching rules
    #[test]
    fn union_respects_each_case_mode(
        sources in prop::collection::vec((arb_cased_pattern(), any::<bool>()), 1..5),
        text in "[aAbBéÉkKx\u{212A}ſ]{1,6}",
    ) {
        let patterns: Vec<Pattern> = sources
            .iter()
            .map(|(source, insensitive)| {
                let source = format!("^{source}");
                if *insensitive {
                    Pattern::case_insensitive(&source)
                } else {
                    Pattern::new(&source)
                }
            })
            .collect();
        let combined = combine_prefix_patterns(&patterns).unwrap();

        let expected = sources
            .iter()
            .find_map(|(source, insensitive)| {
                let flags = if *insensitive { "(?i)" } else { "" };
                let alone = regex::Regex::new(&format!("{flags}^(?:{source})")).unwrap();
                alone.find(&text).map(|m| m.end())
            })
            .unwrap_or_else(|| text.chars().next().map_or(0, char::len_utf8));
        prop_assert_eq!(combined.token_at(&text, 0).unwrap(), 0..expected);
    }
}
