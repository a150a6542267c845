//! Language registry
//!
//! Maps language identifiers to lexers. Grammars are registered as
//! factories and compiled the first time they are resolved; after that
//! every caller shares one compiled [`Lexer`].

use std::path::Path;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use super::builtin;
use super::decorate;
use super::language::{AuxiliaryGrammar, Grammar, Lexer};
use super::style::Decoration;
use crate::config::GrammarFile;
use crate::error::{ConfigError, Result};

/// Grammar used for unknown languages whose text starts with `<`
pub const DEFAULT_MARKUP: &str = "default-markup";

/// Grammar used for every other unknown language
pub const DEFAULT_CODE: &str = "default-code";

static GLOBAL: OnceCell<Registry> = OnceCell::new();

/// Produces a grammar on demand
pub type GrammarFactory = Arc<dyn Fn() -> Grammar + Send + Sync>;

/// What a language identifier is registered with
#[derive(Clone)]
pub enum LanguageSource {
    /// An already compiled lexer
    Lexer(Arc<Lexer>),
    /// A grammar compiled on first use
    Grammar(GrammarFactory),
}

impl From<Lexer> for LanguageSource {
    fn from(lexer: Lexer) -> Self {
        LanguageSource::Lexer(Arc::new(lexer))
    }
}

impl From<Arc<Lexer>> for LanguageSource {
    fn from(lexer: Arc<Lexer>) -> Self {
        LanguageSource::Lexer(lexer)
    }
}

impl From<Grammar> for LanguageSource {
    fn from(grammar: Grammar) -> Self {
        LanguageSource::Grammar(Arc::new(move || grammar.clone()))
    }
}

impl From<fn() -> Grammar> for LanguageSource {
    fn from(factory: fn() -> Grammar) -> Self {
        LanguageSource::Grammar(Arc::new(factory))
    }
}

/// One registration, shared by all of its identifiers
struct Slot {
    /// First identifier, for logging
    name: String,
    factory: Option<GrammarFactory>,
    lexer: OnceCell<Arc<Lexer>>,
}

impl Slot {
    fn new(name: &str, source: LanguageSource) -> Self {
        match source {
            LanguageSource::Lexer(lexer) => Self {
                name: name.to_string(),
                factory: None,
                lexer: OnceCell::with_value(lexer),
            },
            LanguageSource::Grammar(factory) => Self {
                name: name.to_string(),
                factory: Some(factory),
                lexer: OnceCell::new(),
            },
        }
    }
}

/// Language identifier to lexer mapping
///
/// Safe to share between threads. Resolving an already compiled language
/// takes a read lock only long enough to find its slot.
pub struct Registry {
    slots: RwLock<FxHashMap<String, Arc<Slot>>>,
}

impl Registry {
    /// Create a registry holding only the generic markup and code grammars
    /// and the tag grammars markup embeds.
    pub fn new() -> Self {
        let mut slots = FxHashMap::default();
        for language in builtin::default_languages() {
            let Some(name) = language.ids.first() else {
                continue;
            };
            let slot = Arc::new(Slot::new(name, LanguageSource::from(language.grammar)));
            for id in language.ids {
                slots.insert(id.to_string(), Arc::clone(&slot));
            }
        }
        Self {
            slots: RwLock::new(slots),
        }
    }

    /// Create a registry with every built-in language
    pub fn with_builtins() -> std::result::Result<Self, ConfigError> {
        let registry = Self::new();
        for language in builtin::all_languages() {
            registry.register_all(language.ids, language.grammar)?;
        }
        Ok(registry)
    }

    /// The process-wide registry of built-in languages
    pub fn global() -> std::result::Result<&'static Registry, ConfigError> {
        GLOBAL.get_or_try_init(Self::with_builtins)
    }

    /// Register a language under one identifier
    pub fn register(
        &self,
        id: &str,
        source: impl Into<LanguageSource>,
    ) -> std::result::Result<(), ConfigError> {
        self.register_all(&[id], source)
    }

    /// Register a language under several identifiers sharing one lexer.
    ///
    /// If any identifier is already taken, nothing is registered, and the
    /// existing registration for that identifier is removed as well, so it
    /// resolves to neither grammar. The two default grammars are never
    /// removed this way, since resolution falls back to them.
    pub fn register_all(
        &self,
        ids: &[&str],
        source: impl Into<LanguageSource>,
    ) -> std::result::Result<(), ConfigError> {
        let Some(name) = ids.first() else {
            return Ok(());
        };
        let slot = Arc::new(Slot::new(name, source.into()));
        let mut slots = self.slots.write();
        if let Some(duplicate) = first_duplicate(&slots, ids) {
            if duplicate != DEFAULT_CODE && duplicate != DEFAULT_MARKUP {
                slots.remove(duplicate);
            }
            tracing::warn!(language = duplicate, "rejected duplicate language registration");
            return Err(ConfigError::DuplicateLanguage(duplicate.to_string()));
        }
        for id in ids {
            slots.insert(id.to_string(), Arc::clone(&slot));
        }
        tracing::debug!(language = %name, aliases = ids.len() - 1, "registered language");
        Ok(())
    }

    /// Register the grammar in a TOML grammar file
    pub fn register_file(&self, path: &Path) -> Result<()> {
        let file = GrammarFile::load(path)?;
        let ids = file.ids.clone();
        let grammar = file.into_grammar()?;
        let ids: Vec<&str> = ids.iter().map(String::as_str).collect();
        self.register_all(&ids, grammar)?;
        Ok(())
    }

    /// Whether `id` has a registration
    pub fn is_registered(&self, id: &str) -> bool {
        self.slots.read().contains_key(id)
    }

    /// List registered identifiers
    pub fn languages(&self) -> Vec<String> {
        let mut names: Vec<String> = self.slots.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Find the lexer for `id`.
    ///
    /// Without an identifier, or with one nobody registered, the generic
    /// markup grammar is used when `source` starts with `<` after
    /// whitespace, and the generic code grammar otherwise.
    pub fn resolve(
        &self,
        id: Option<&str>,
        source: &str,
    ) -> std::result::Result<Arc<Lexer>, ConfigError> {
        let slot = match id.and_then(|id| self.slot(id)) {
            Some(slot) => slot,
            None => {
                let fallback = guess_language(source);
                self.slot(fallback)
                    .ok_or_else(|| ConfigError::UnknownLanguage(fallback.to_string()))?
            }
        };
        self.instantiate(&slot)
    }

    /// Resolve a language and decorate `source` with it
    pub fn decorate(
        &self,
        id: Option<&str>,
        source: &str,
        base_pos: usize,
    ) -> Result<Vec<Decoration>> {
        let lexer = self.resolve(id, source)?;
        decorate::decorate(self, &lexer, source, base_pos)
    }

    /// Compile every registered grammar now, including auxiliary grammars
    /// registered along the way.
    pub fn warm_up(&self) -> std::result::Result<(), ConfigError> {
        loop {
            let pending: Vec<Arc<Slot>> = self
                .slots
                .read()
                .values()
                .filter(|slot| slot.lexer.get().is_none())
                .cloned()
                .collect();
            if pending.is_empty() {
                return Ok(());
            }
            for slot in pending {
                self.instantiate(&slot)?;
            }
        }
    }

    fn slot(&self, id: &str) -> Option<Arc<Slot>> {
        self.slots.read().get(id).cloned()
    }

    fn instantiate(&self, slot: &Slot) -> std::result::Result<Arc<Lexer>, ConfigError> {
        let lexer = slot.lexer.get_or_try_init(|| {
            let factory = slot
                .factory
                .as_ref()
                .ok_or_else(|| ConfigError::UnknownLanguage(slot.name.clone()))?;
            tracing::debug!(language = %slot.name, "compiling grammar");
            let grammar = factory();
            let lexer = Lexer::compile(&grammar)?;
            self.register_auxiliary(&grammar.auxiliary)?;
            Ok::<_, ConfigError>(Arc::new(lexer))
        })?;
        Ok(Arc::clone(lexer))
    }

    /// Add the auxiliary grammars of a freshly compiled grammar, all or none
    fn register_auxiliary(
        &self,
        auxiliary: &[AuxiliaryGrammar],
    ) -> std::result::Result<(), ConfigError> {
        if auxiliary.is_empty() {
            return Ok(());
        }
        let mut slots = self.slots.write();
        for aux in auxiliary {
            let ids: Vec<&str> = aux.ids.iter().map(String::as_str).collect();
            if let Some(duplicate) = first_duplicate(&slots, &ids) {
                tracing::warn!(language = duplicate, "auxiliary grammar already registered");
                return Err(ConfigError::DuplicateLanguage(duplicate.to_string()));
            }
        }
        for aux in auxiliary {
            let Some(name) = aux.ids.first() else {
                continue;
            };
            let slot = Arc::new(Slot::new(name, LanguageSource::from(aux.grammar.clone())));
            for id in &aux.ids {
                slots.insert(id.clone(), Arc::clone(&slot));
            }
            tracing::debug!(language = %name, "registered auxiliary grammar");
        }
        Ok(())
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

/// First of `ids` that is already registered or repeated within `ids`
fn first_duplicate<'a>(slots: &FxHashMap<String, Arc<Slot>>, ids: &[&'a str]) -> Option<&'a str> {
    ids.iter()
        .enumerate()
        .find(|&(i, id)| slots.contains_key(*id) || ids[..i].contains(id))
        .map(|(_, id)| *id)
}

/// Generic grammar for text in an unknown language
fn guess_language(source: &str) -> &'static str {
    if source.trim_start().starts_with('<') {
        DEFAULT_MARKUP
    } else {
        DEFAULT_CODE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::rules::{Pattern, PatternRule};
    use crate::syntax::tokens::StyleTag;

    fn single_rule(style: StyleTag) -> Grammar {
        Grammar::new().fallback(PatternRule::new(style, Pattern::new(r"^[\s\S]+")))
    }

    #[test]
    fn test_duplicate_registration_resolves_to_neither() {
        let registry = Registry::new();
        registry.register("foo", single_rule(StyleTag::Keyword)).unwrap();
        let err = registry.register("foo", single_rule(StyleTag::String)).unwrap_err();
        assert_eq!(err, ConfigError::DuplicateLanguage("foo".into()));
        assert!(!registry.is_registered("foo"));

        // falls through to the generic code grammar
        let lexer = registry.resolve(Some("foo"), "x").unwrap();
        let code = registry.resolve(Some(DEFAULT_CODE), "x").unwrap();
        assert!(Arc::ptr_eq(&lexer, &code));
    }

    #[test]
    fn test_duplicate_default_keeps_fallback() {
        let registry = Registry::new();
        let code = registry.resolve(Some(DEFAULT_CODE), "x").unwrap();
        let err = registry
            .register(DEFAULT_CODE, single_rule(StyleTag::String))
            .unwrap_err();
        assert_eq!(err, ConfigError::DuplicateLanguage(DEFAULT_CODE.into()));
        let err = registry
            .register(DEFAULT_MARKUP, single_rule(StyleTag::String))
            .unwrap_err();
        assert_eq!(err, ConfigError::DuplicateLanguage(DEFAULT_MARKUP.into()));

        assert!(registry.is_registered(DEFAULT_CODE));
        assert!(registry.is_registered(DEFAULT_MARKUP));
        let guessed = registry.resolve(Some("nope"), "x = 1").unwrap();
        assert!(Arc::ptr_eq(&guessed, &code));
        assert!(registry.decorate(Some("nope"), "<p>", 0).is_ok());
    }

    #[test]
    fn test_duplicate_within_one_call() {
        let registry = Registry::new();
        let err = registry
            .register_all(&["a", "b", "a"], single_rule(StyleTag::Plain))
            .unwrap_err();
        assert_eq!(err, ConfigError::DuplicateLanguage("a".into()));
        assert!(!registry.is_registered("b"));
    }

    #[test]
    fn test_unknown_language_guessed_from_source() {
        let registry = Registry::new();
        let markup = registry.resolve(Some(DEFAULT_MARKUP), "").unwrap();
        let code = registry.resolve(Some(DEFAULT_CODE), "").unwrap();

        let guessed = registry.resolve(Some("nope"), "  <html></html>").unwrap();
        assert!(Arc::ptr_eq(&guessed, &markup));
        let guessed = registry.resolve(None, "x = 1").unwrap();
        assert!(Arc::ptr_eq(&guessed, &code));
    }

    #[test]
    fn test_aliases_share_lexer() {
        let registry = Registry::new();
        let html = registry.resolve(Some("html"), "").unwrap();
        let xml = registry.resolve(Some("xml"), "").unwrap();
        assert!(Arc::ptr_eq(&html, &xml));
    }

    #[test]
    fn test_compiled_lexer_registration() {
        let registry = Registry::new();
        let lexer = Arc::new(Lexer::compile(&single_rule(StyleTag::Comment)).unwrap());
        registry.register("notes", Arc::clone(&lexer)).unwrap();
        assert!(Arc::ptr_eq(&registry.resolve(Some("notes"), "").unwrap(), &lexer));
    }

    #[test]
    fn test_auxiliary_registered_on_first_use() {
        let registry = Registry::new();
        let grammar =
            single_rule(StyleTag::Plain).auxiliary(&["host-kw"], single_rule(StyleTag::Keyword));
        registry.register("host", grammar).unwrap();
        assert!(!registry.is_registered("host-kw"));

        registry.resolve(Some("host"), "").unwrap();
        assert!(registry.is_registered("host-kw"));
        let stream = registry.decorate(Some("host-kw"), "abc", 0).unwrap();
        assert_eq!(stream, vec![Decoration::new(0, StyleTag::Keyword)]);
    }

    #[test]
    fn test_bad_grammar_fails_at_resolve() {
        let registry = Registry::new();
        let grammar =
            Grammar::new().fallback(PatternRule::new(StyleTag::Plain, Pattern::new("(?m)^a$")));
        registry.register("bad", grammar).unwrap();
        assert!(matches!(
            registry.resolve(Some("bad"), ""),
            Err(ConfigError::MultilinePattern(_))
        ));
        assert!(registry.warm_up().is_err());
    }

    #[test]
    fn test_concurrent_resolve_compiles_once() {
        let registry = Registry::new();
        registry.register("lazy", single_rule(StyleTag::Literal)).unwrap();

        let lexers: Vec<Arc<Lexer>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| registry.resolve(Some("lazy"), "").unwrap()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        for lexer in &lexers[1..] {
            assert!(Arc::ptr_eq(&lexers[0], lexer));
        }
    }

    #[test]
    fn test_builtins_warm_up() {
        let registry = Registry::with_builtins().unwrap();
        registry.warm_up().unwrap();
        for id in ["js", "css", "css-kw", "css-str", "go", "lua", "py", "rust", "in.tag"] {
            assert!(registry.is_registered(id), "{id} missing");
        }
        assert!(Registry::global().unwrap().is_registered("java"));
    }
}
