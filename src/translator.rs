//! The per-session translation handle.

use std::sync::Arc;

use unic_langid::LanguageIdentifier;

use crate::cache::ResolutionCache;
use crate::catalog::CatalogStore;
use crate::error::{PhrasebookError, PhrasebookResult};
use crate::template::{self, RenderContext};
use crate::value::Bindings;

/// A lightweight handle bound to one language.
///
/// Construct one per client session; the handle holds nothing but the bound
/// language, a reference to the shared [`CatalogStore`], and its own private
/// [`ResolutionCache`]. Because the cache is per-handle, dropping the handle
/// releases exactly that session's memoised resolutions — deterministically,
/// through ordinary ownership, with no reliance on finaliser timing.
///
/// Resolution is a pure function of `(language, key, bindings)` at call time.
/// Reloading a catalogue does not purge caches, so a handle that already
/// resolved a key keeps returning the text rendered from the old catalogue
/// for identical bindings. This staleness is a documented limitation of the
/// memoisation, not silently corrected; create a fresh handle (or call
/// [`clear_cache`](Self::clear_cache)) after a reload when that matters.
///
/// # Examples
/// ```rust
/// use phrasebook::{Bindings, CatalogStore, Translator, langid};
/// use std::sync::Arc;
///
/// # fn main() -> Result<(), phrasebook::PhrasebookError> {
/// let store = Arc::new(CatalogStore::new());
/// store.load_json(langid!("en"), r#"{"Hello": "Hi, {name}!"}"#)?;
///
/// let translator = Translator::new(Arc::clone(&store), langid!("en"));
/// let text = translator.resolve("Hello", &Bindings::new().with("name", "Alex"))?;
/// assert_eq!(text, "Hi, Alex!");
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Translator {
    store: Arc<CatalogStore>,
    language: LanguageIdentifier,
    cache: ResolutionCache,
}

impl Translator {
    /// Creates a handle bound to `language`.
    ///
    /// The language need not be loaded yet; every resolve checks the store at
    /// call time.
    #[must_use]
    pub fn new(store: Arc<CatalogStore>, language: LanguageIdentifier) -> Self {
        Self {
            store,
            language,
            cache: ResolutionCache::new(),
        }
    }

    /// The language this handle is bound to.
    #[must_use]
    pub fn language(&self) -> &LanguageIdentifier {
        &self.language
    }

    /// Resolves `key` to rendered text, substituting `bindings`.
    ///
    /// The catalogue is validated before the cache is consulted, so an
    /// unloaded language always fails even when an identical call was
    /// memoised earlier.
    ///
    /// # Errors
    ///
    /// Returns [`PhrasebookError::UnknownLanguage`] when no catalogue is
    /// loaded for the bound language, [`PhrasebookError::UnknownKey`] when
    /// the key is absent, and rendering errors
    /// ([`PhrasebookError::UndefinedVariable`],
    /// [`PhrasebookError::TemplateSyntax`]) untouched.
    pub fn resolve(&self, key: &str, bindings: &Bindings) -> PhrasebookResult<String> {
        let catalog = self.store.catalog(&self.language)?;
        self.cache
            .get_or_compute(&self.language, key, bindings, || {
                let template =
                    catalog
                        .template(key)
                        .ok_or_else(|| PhrasebookError::UnknownKey {
                            language: self.language.clone(),
                            key: key.to_owned(),
                        })?;
                let ctx = RenderContext {
                    bindings,
                    language: &self.language,
                    store: &self.store,
                };
                template::render(template, &ctx)
            })
    }

    /// Index-style sugar for [`resolve`](Self::resolve); semantically
    /// identical.
    ///
    /// # Errors
    ///
    /// Exactly as [`resolve`](Self::resolve).
    pub fn resolve_indexed(&self, key: &str, bindings: &Bindings) -> PhrasebookResult<String> {
        self.resolve(key, bindings)
    }

    /// Maps a binding-free display string back to its message key.
    ///
    /// Only literal templates can match: values substituted into a rendered
    /// string cannot be recovered, so text produced from a template with
    /// placeholders will not reverse-resolve.
    ///
    /// # Errors
    ///
    /// Returns [`PhrasebookError::UnknownLanguage`] when no catalogue is
    /// loaded and [`PhrasebookError::UnknownLiteral`] when nothing matches.
    pub fn reverse_resolve(&self, literal: &str) -> PhrasebookResult<String> {
        self.store.key_for_literal(&self.language, literal)
    }

    /// Applies the bound language's plural rule to `magnitude`.
    ///
    /// # Errors
    ///
    /// Returns [`PhrasebookError::UndefinedVariable`] when no rule is
    /// registered for the bound language.
    pub fn plural_category(&self, magnitude: u64) -> PhrasebookResult<usize> {
        self.store.plural_category(&self.language, magnitude)
    }

    /// Number of resolutions memoised by this handle.
    #[must_use]
    pub fn cached_entries(&self) -> usize {
        self.cache.len()
    }

    /// Discards this handle's memoised resolutions.
    ///
    /// Other handles, including ones bound to the same language, are
    /// unaffected.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use unic_langid::langid;

    fn store_with_english() -> Arc<CatalogStore> {
        let store = Arc::new(CatalogStore::new());
        store
            .load_json(
                langid!("en"),
                r#"{"Button1": "Return", "Hello": "Hi, {name}!"}"#,
            )
            .expect("catalogue should parse");
        store
    }

    #[rstest]
    fn resolves_with_substitution() {
        let translator = Translator::new(store_with_english(), langid!("en"));
        let text = translator
            .resolve("Hello", &Bindings::new().with("name", "Alex"))
            .expect("key exists");
        assert_eq!(text, "Hi, Alex!");
    }

    #[rstest]
    fn resolve_indexed_matches_resolve() {
        let translator = Translator::new(store_with_english(), langid!("en"));
        let bindings = Bindings::new().with("name", "Alex");
        assert_eq!(
            translator.resolve("Hello", &bindings).expect("key exists"),
            translator
                .resolve_indexed("Hello", &bindings)
                .expect("key exists"),
        );
    }

    #[rstest]
    fn repeated_resolution_is_memoised_once() {
        let translator = Translator::new(store_with_english(), langid!("en"));
        let bindings = Bindings::new().with("name", "Alex");
        translator.resolve("Hello", &bindings).expect("key exists");
        translator.resolve("Hello", &bindings).expect("key exists");
        assert_eq!(translator.cached_entries(), 1);
    }

    #[rstest]
    fn caches_are_private_to_each_handle() {
        let store = store_with_english();
        let first = Translator::new(Arc::clone(&store), langid!("en"));
        let second = Translator::new(store, langid!("en"));
        first
            .resolve("Button1", &Bindings::new())
            .expect("key exists");
        assert_eq!(first.cached_entries(), 1);
        assert_eq!(second.cached_entries(), 0);
    }

    #[rstest]
    fn clear_cache_releases_entries() {
        let translator = Translator::new(store_with_english(), langid!("en"));
        translator
            .resolve("Button1", &Bindings::new())
            .expect("key exists");
        translator.clear_cache();
        assert_eq!(translator.cached_entries(), 0);
    }

    #[rstest]
    fn reverse_resolves_a_literal() {
        let translator = Translator::new(store_with_english(), langid!("en"));
        let key = translator.reverse_resolve("Return").expect("stored");
        assert_eq!(key, "Button1");
    }

    #[rstest]
    fn unloaded_language_fails_even_when_cached() {
        let store = store_with_english();
        let translator = Translator::new(Arc::clone(&store), langid!("en"));
        translator
            .resolve("Button1", &Bindings::new())
            .expect("key exists");

        store.unload(&[langid!("en")]).expect("loaded");

        let err = translator
            .resolve("Button1", &Bindings::new())
            .unwrap_err();
        assert!(matches!(err, PhrasebookError::UnknownLanguage { .. }));
    }

    #[rstest]
    fn unknown_key_propagates() {
        let translator = Translator::new(store_with_english(), langid!("en"));
        let err = translator
            .resolve("Missing", &Bindings::new())
            .unwrap_err();
        assert!(matches!(err, PhrasebookError::UnknownKey { .. }));
    }

    #[rstest]
    fn plural_category_uses_the_bound_language() {
        let store = Arc::new(CatalogStore::new());
        let translator = Translator::new(store, langid!("ru"));
        assert_eq!(translator.plural_category(21).expect("rule shipped"), 0);
    }
}
