//! Built-in language grammars
//!
//! Grammar tables for the generic fallbacks and a set of common
//! languages. Every table is a plain function so the registry can compile
//! it lazily.

mod css;
mod go;
mod lua;
mod markup;
mod source;

use super::language::Grammar;
use super::manager::{DEFAULT_CODE, DEFAULT_MARKUP};

pub use source::{HashComments, RegexLiterals, SourceOptions, StringStyle};

/// A built-in grammar and the identifiers it answers to
pub struct BuiltinLanguage {
    pub ids: &'static [&'static str],
    pub grammar: fn() -> Grammar,
}

/// Grammars every registry starts with
pub fn default_languages() -> Vec<BuiltinLanguage> {
    vec![
        BuiltinLanguage {
            ids: &[DEFAULT_CODE],
            grammar: source::default_code,
        },
        BuiltinLanguage {
            ids: &[DEFAULT_MARKUP, "htm", "html", "mxml", "xhtml", "xml", "xsl"],
            grammar: markup::markup,
        },
        BuiltinLanguage {
            ids: &["in.tag"],
            grammar: markup::in_tag,
        },
        BuiltinLanguage {
            ids: &["uq.val"],
            grammar: markup::unquoted_value,
        },
    ]
}

/// Language grammars added on top of the defaults
pub fn all_languages() -> Vec<BuiltinLanguage> {
    vec![
        BuiltinLanguage {
            ids: &["c", "cc", "cpp", "cxx", "cyc", "m"],
            grammar: source::c,
        },
        BuiltinLanguage {
            ids: &["json"],
            grammar: source::json,
        },
        BuiltinLanguage {
            ids: &["cs"],
            grammar: source::csharp,
        },
        BuiltinLanguage {
            ids: &["java"],
            grammar: source::java,
        },
        BuiltinLanguage {
            ids: &["bash", "bsh", "csh", "sh"],
            grammar: source::shell,
        },
        BuiltinLanguage {
            ids: &["cv", "py", "python"],
            grammar: source::python,
        },
        BuiltinLanguage {
            ids: &["perl", "pl", "pm"],
            grammar: source::perl,
        },
        BuiltinLanguage {
            ids: &["rb", "ruby"],
            grammar: source::ruby,
        },
        BuiltinLanguage {
            ids: &["javascript", "js"],
            grammar: source::javascript,
        },
        BuiltinLanguage {
            ids: &["coffee"],
            grammar: source::coffee,
        },
        BuiltinLanguage {
            ids: &["rc", "rs", "rust"],
            grammar: source::rust,
        },
        BuiltinLanguage {
            ids: &["proto"],
            grammar: source::proto,
        },
        BuiltinLanguage {
            ids: &["regex"],
            grammar: source::regex,
        },
        BuiltinLanguage {
            ids: &["css"],
            grammar: css::css,
        },
        BuiltinLanguage {
            ids: &["go"],
            grammar: go::go,
        },
        BuiltinLanguage {
            ids: &["lua"],
            grammar: lua::lua,
        },
    ]
}
