//! Catalogue storage: forward and reverse message mappings per language.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use unic_langid::{LanguageIdentifier, langid};

use crate::error::{PhrasebookError, PhrasebookResult};
use crate::plural::{self, PluralRule};

/// The message set for one language: key → template, plus the inverted
/// literal → key index used by reverse lookup.
///
/// Catalogues are immutable once built; a reload replaces the whole value.
/// The reverse index is rebuilt in full from the same pass over the source
/// entries, so when two keys share a literal the key registered last wins.
/// That collapse is an accepted ambiguity of reverse lookup, not an error.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    forward: HashMap<String, String>,
    reverse: HashMap<String, String>,
}

impl Catalog {
    fn from_entries(entries: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut forward = HashMap::new();
        let mut reverse = HashMap::new();
        for (key, template) in entries {
            reverse.insert(template.clone(), key.clone());
            forward.insert(key, template);
        }
        Self { forward, reverse }
    }

    /// Returns the template stored under `key`.
    #[must_use]
    pub fn template(&self, key: &str) -> Option<&str> {
        self.forward.get(key).map(String::as_str)
    }

    /// Returns the key whose stored template equals `literal`.
    ///
    /// Only binding-free templates can match: reverse lookup compares against
    /// the stored text, so substituted values cannot be recovered.
    #[must_use]
    pub fn key_for_literal(&self, literal: &str) -> Option<&str> {
        self.reverse.get(literal).map(String::as_str)
    }

    /// Number of messages in the catalogue.
    #[must_use]
    pub fn len(&self) -> usize {
        self.forward.len()
    }

    /// Whether the catalogue holds no messages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }
}

/// Registry of catalogues and plural rules, keyed by language.
///
/// The store is an explicit object with an explicit lifecycle — construct it
/// once, load catalogues into it, and hand an `Arc` of it to each
/// [`Translator`](crate::Translator) — rather than a process-global reached
/// through ambient lookup. Catalogues are held as `Arc` snapshots behind a
/// short-lived lock: a load or unload swaps the entry while in-flight
/// resolves keep reading the snapshot they already cloned, so the hot path
/// never blocks on an unrelated reload.
///
/// Unloading a language does not purge resolution caches held by existing
/// translator handles, and handles constructed before an unload remain valid
/// objects. Callers must not assume cross-consistency between a store
/// mutation and previously issued handles.
#[derive(Debug)]
pub struct CatalogStore {
    catalogs: RwLock<HashMap<LanguageIdentifier, Arc<Catalog>>>,
    rules: RwLock<HashMap<LanguageIdentifier, PluralRule>>,
}

impl Default for CatalogStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogStore {
    /// Creates an empty store with the shipped plural rules (`ru`, `en`)
    /// pre-registered.
    #[must_use]
    pub fn new() -> Self {
        let mut rules: HashMap<LanguageIdentifier, PluralRule> = HashMap::new();
        rules.insert(langid!("ru"), plural::russian);
        rules.insert(langid!("en"), plural::english);
        Self {
            catalogs: RwLock::new(HashMap::new()),
            rules: RwLock::new(rules),
        }
    }

    fn read_catalogs(&self) -> RwLockReadGuard<'_, HashMap<LanguageIdentifier, Arc<Catalog>>> {
        self.catalogs.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_catalogs(&self) -> RwLockWriteGuard<'_, HashMap<LanguageIdentifier, Arc<Catalog>>> {
        self.catalogs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a catalogue for `language`, replacing any prior one.
    ///
    /// `entries` are consumed in iteration order; for keys sharing a literal
    /// the entry seen last claims the reverse mapping.
    pub fn load(
        &self,
        language: LanguageIdentifier,
        entries: impl IntoIterator<Item = (String, String)>,
    ) {
        let catalog = Catalog::from_entries(entries);
        tracing::debug!(language = %language, messages = catalog.len(), "loaded catalogue");
        self.write_catalogs().insert(language, Arc::new(catalog));
    }

    /// Parses a flat JSON object of string→string and registers it for
    /// `language`.
    ///
    /// Keys are consumed in lexicographic order, which pins down the
    /// last-wins winner for duplicate literals deterministically.
    ///
    /// # Errors
    ///
    /// Returns [`PhrasebookError::CatalogLoad`] when the source is not valid
    /// JSON or is not a flat object with string values.
    pub fn load_json(&self, language: LanguageIdentifier, source: &str) -> PhrasebookResult<()> {
        let entries: BTreeMap<String, String> =
            serde_json::from_str(source).map_err(|parse_error| PhrasebookError::CatalogLoad {
                language: language.clone(),
                source: parse_error,
            })?;
        self.load(language, entries);
        Ok(())
    }

    /// Removes the catalogues for every listed language.
    ///
    /// Validation happens before any removal: either all listed languages are
    /// unloaded or none are. Caches and handles created before the unload are
    /// deliberately left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`PhrasebookError::UnknownLanguage`] naming the first listed
    /// language that has no catalogue.
    pub fn unload(&self, languages: &[LanguageIdentifier]) -> PhrasebookResult<()> {
        let mut catalogs = self.write_catalogs();
        if let Some(missing) = languages
            .iter()
            .find(|language| !catalogs.contains_key(*language))
        {
            return Err(PhrasebookError::UnknownLanguage {
                language: missing.clone(),
            });
        }
        for language in languages {
            catalogs.remove(language);
            tracing::debug!(language = %language, "unloaded catalogue");
        }
        Ok(())
    }

    /// Returns a snapshot of the catalogue for `language`.
    ///
    /// The snapshot stays readable even if the language is reloaded or
    /// unloaded afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`PhrasebookError::UnknownLanguage`] when no catalogue is
    /// loaded for `language`.
    pub fn catalog(&self, language: &LanguageIdentifier) -> PhrasebookResult<Arc<Catalog>> {
        self.read_catalogs()
            .get(language)
            .cloned()
            .ok_or_else(|| PhrasebookError::UnknownLanguage {
                language: language.clone(),
            })
    }

    /// Looks up the template for `key` in the `language` catalogue.
    ///
    /// # Errors
    ///
    /// Returns [`PhrasebookError::UnknownLanguage`] when the language is not
    /// loaded and [`PhrasebookError::UnknownKey`] when the key is absent.
    pub fn template(&self, language: &LanguageIdentifier, key: &str) -> PhrasebookResult<String> {
        let catalog = self.catalog(language)?;
        catalog
            .template(key)
            .map(str::to_owned)
            .ok_or_else(|| PhrasebookError::UnknownKey {
                language: language.clone(),
                key: key.to_owned(),
            })
    }

    /// Looks up the key whose stored template equals `literal`.
    ///
    /// # Errors
    ///
    /// Returns [`PhrasebookError::UnknownLanguage`] when the language is not
    /// loaded and [`PhrasebookError::UnknownLiteral`] when nothing matches.
    pub fn key_for_literal(
        &self,
        language: &LanguageIdentifier,
        literal: &str,
    ) -> PhrasebookResult<String> {
        let catalog = self.catalog(language)?;
        catalog
            .key_for_literal(literal)
            .map(str::to_owned)
            .ok_or_else(|| PhrasebookError::UnknownLiteral {
                language: language.clone(),
                literal: literal.to_owned(),
            })
    }

    /// Whether a catalogue is currently loaded for `language`.
    #[must_use]
    pub fn is_loaded(&self, language: &LanguageIdentifier) -> bool {
        self.read_catalogs().contains_key(language)
    }

    /// Languages with a loaded catalogue, sorted for stable output.
    #[must_use]
    pub fn languages(&self) -> Vec<LanguageIdentifier> {
        let mut languages: Vec<_> = self.read_catalogs().keys().cloned().collect();
        languages.sort_by_key(ToString::to_string);
        languages
    }

    /// Registers (or replaces) the plural rule for `language`.
    pub fn register_plural_rule(&self, language: LanguageIdentifier, rule: PluralRule) {
        tracing::debug!(language = %language, "registered plural rule");
        self.rules
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(language, rule);
    }

    /// Returns the plural rule registered for `language`, if any.
    #[must_use]
    pub fn plural_rule(&self, language: &LanguageIdentifier) -> Option<PluralRule> {
        self.rules
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(language)
            .copied()
    }

    /// Applies the plural rule for `language` to `magnitude`.
    ///
    /// # Errors
    ///
    /// Returns [`PhrasebookError::UndefinedVariable`] naming the missing
    /// helper when no rule is registered, matching what a template invocation
    /// of the rule would raise.
    pub fn plural_category(
        &self,
        language: &LanguageIdentifier,
        magnitude: u64,
    ) -> PhrasebookResult<usize> {
        let rule =
            self.plural_rule(language)
                .ok_or_else(|| PhrasebookError::UndefinedVariable {
                    name: format!("self.{language}_plural"),
                })?;
        Ok(rule(magnitude))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn loaded_store() -> CatalogStore {
        let store = CatalogStore::new();
        store
            .load_json(
                langid!("en"),
                r#"{"Button1": "Return", "Button2": "Start", "Hello": "Hi, {name}!"}"#,
            )
            .expect("catalogue should parse");
        store
    }

    #[rstest]
    fn template_lookup_succeeds() {
        let store = loaded_store();
        let template = store.template(&langid!("en"), "Button1").expect("loaded");
        assert_eq!(template, "Return");
    }

    #[rstest]
    fn unknown_language_is_reported() {
        let store = loaded_store();
        let err = store.template(&langid!("de"), "Button1").unwrap_err();
        assert!(matches!(err, PhrasebookError::UnknownLanguage { .. }));
    }

    #[rstest]
    fn unknown_key_is_reported() {
        let store = loaded_store();
        let err = store.template(&langid!("en"), "Missing").unwrap_err();
        assert!(matches!(err, PhrasebookError::UnknownKey { .. }));
    }

    #[rstest]
    fn reverse_lookup_returns_key() {
        let store = loaded_store();
        let key = store
            .key_for_literal(&langid!("en"), "Return")
            .expect("literal is stored");
        assert_eq!(key, "Button1");
    }

    #[rstest]
    fn reverse_lookup_misses_unknown_literal() {
        let store = loaded_store();
        let err = store
            .key_for_literal(&langid!("en"), "Never stored")
            .unwrap_err();
        assert!(matches!(err, PhrasebookError::UnknownLiteral { .. }));
    }

    #[rstest]
    fn duplicate_literals_collapse_last_wins() {
        let store = CatalogStore::new();
        store
            .load_json(langid!("en"), r#"{"A": "X", "B": "X"}"#)
            .expect("catalogue should parse");
        // JSON entries register in lexicographic key order, so "B" is last.
        let key = store.key_for_literal(&langid!("en"), "X").expect("stored");
        assert_eq!(key, "B");
    }

    #[rstest]
    fn reload_replaces_catalogue_and_reverse_index() {
        let store = loaded_store();
        store
            .load_json(langid!("en"), r#"{"Button1": "Back"}"#)
            .expect("catalogue should parse");

        assert_eq!(store.template(&langid!("en"), "Button1").unwrap(), "Back");
        assert!(store.template(&langid!("en"), "Button2").is_err());
        assert!(store.key_for_literal(&langid!("en"), "Return").is_err());
        assert_eq!(store.key_for_literal(&langid!("en"), "Back").unwrap(), "Button1");
    }

    #[rstest]
    #[case::not_json("not json at all")]
    #[case::nested_object(r#"{"Key": {"nested": "no"}}"#)]
    #[case::numeric_value(r#"{"Key": 3}"#)]
    #[case::top_level_array(r#"["Key"]"#)]
    fn malformed_sources_fail_to_load(#[case] source: &str) {
        let store = CatalogStore::new();
        let err = store.load_json(langid!("en"), source).unwrap_err();
        assert!(matches!(err, PhrasebookError::CatalogLoad { .. }));
    }

    #[rstest]
    fn unload_removes_catalogue() {
        let store = loaded_store();
        store.unload(&[langid!("en")]).expect("loaded");
        assert!(!store.is_loaded(&langid!("en")));
        assert!(store.template(&langid!("en"), "Button1").is_err());
    }

    #[rstest]
    fn unload_of_unknown_language_fails_without_removing_others() {
        let store = loaded_store();
        let err = store.unload(&[langid!("en"), langid!("de")]).unwrap_err();
        assert!(matches!(err, PhrasebookError::UnknownLanguage { .. }));
        assert!(store.is_loaded(&langid!("en")));
    }

    #[rstest]
    fn snapshot_outlives_unload() {
        let store = loaded_store();
        let snapshot = store.catalog(&langid!("en")).expect("loaded");
        store.unload(&[langid!("en")]).expect("loaded");
        assert_eq!(snapshot.template("Button1"), Some("Return"));
    }

    #[rstest]
    fn languages_lists_loaded_tags_sorted() {
        let store = loaded_store();
        store.load(langid!("de"), Vec::new());
        assert_eq!(store.languages(), vec![langid!("de"), langid!("en")]);
    }

    #[rstest]
    fn shipped_rules_are_registered() {
        let store = CatalogStore::new();
        assert_eq!(store.plural_category(&langid!("ru"), 25).unwrap(), 2);
        assert_eq!(store.plural_category(&langid!("en"), 1).unwrap(), 0);
    }

    #[rstest]
    fn missing_rule_is_an_undefined_helper() {
        let store = CatalogStore::new();
        let err = store.plural_category(&langid!("de"), 1).unwrap_err();
        assert!(matches!(err, PhrasebookError::UndefinedVariable { .. }));
    }

    #[rstest]
    fn custom_rule_can_be_registered() {
        let store = CatalogStore::new();
        store.register_plural_rule(langid!("de"), |magnitude| usize::from(magnitude != 1));
        assert_eq!(store.plural_category(&langid!("de"), 3).unwrap(), 1);
    }
}
