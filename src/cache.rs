//! Memoisation of rendered resolutions.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use unic_langid::LanguageIdentifier;

use crate::error::PhrasebookResult;
use crate::value::{Bindings, Value};

/// Canonical signature for one resolution: language, key, and the bindings
/// as name-sorted pairs. Derived `Hash`/`Eq` over [`Value`] makes the
/// signature type-aware, so `Int(1)` and `Str("1")` occupy distinct entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Signature {
    language: String,
    key: String,
    bindings: Vec<(String, Value)>,
}

impl Signature {
    fn new(language: &LanguageIdentifier, key: &str, bindings: &Bindings) -> Self {
        Self {
            language: language.to_string(),
            key: key.to_owned(),
            bindings: bindings
                .iter()
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect(),
        }
    }
}

/// Unbounded memo of `(language, key, bindings)` → rendered text.
///
/// Caching is strictly a performance optimisation: for fixed inputs the
/// cached and uncached paths return identical strings, and failed renders are
/// never stored. Entries live until [`clear`](Self::clear) or until the owner
/// drops. Reads take a shared lock, so concurrent resolves on the same handle
/// do not serialise on each other; a racing double-compute is tolerated
/// because rendering is idempotent.
#[derive(Debug, Default)]
pub struct ResolutionCache {
    entries: RwLock<HashMap<Signature, String>>,
}

impl ResolutionCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the memoised text for the signature, or invokes `compute`,
    /// stores its output, and returns it.
    ///
    /// # Errors
    ///
    /// Propagates whatever `compute` returns; errors are not memoised, so a
    /// later call retries the computation.
    pub fn get_or_compute(
        &self,
        language: &LanguageIdentifier,
        key: &str,
        bindings: &Bindings,
        compute: impl FnOnce() -> PhrasebookResult<String>,
    ) -> PhrasebookResult<String> {
        let signature = Signature::new(language, key, bindings);
        {
            let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(hit) = entries.get(&signature) {
                tracing::trace!(language = %language, key, "resolution cache hit");
                return Ok(hit.clone());
            }
        }
        let rendered = compute()?;
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(signature, rendered.clone());
        Ok(rendered)
    }

    /// Discards every entry.
    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Number of memoised resolutions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether nothing is memoised.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
