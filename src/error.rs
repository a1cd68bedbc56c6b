//! Error types produced by catalogue lookups and template rendering.

use thiserror::Error;
use unic_langid::LanguageIdentifier;

/// Convenience alias for fallible phrasebook operations.
pub type PhrasebookResult<T> = Result<T, PhrasebookError>;

/// Errors that can occur while loading catalogues or resolving messages.
///
/// Every failure is surfaced to the caller immediately: there is no default
/// language, and a missing translation is never silently replaced with the
/// key or an empty string. Callers that prefer to degrade (for example by
/// showing the raw key) do so at their own layer.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PhrasebookError {
    /// The catalogue source could not be parsed into a flat mapping of
    /// string keys to string templates.
    #[error("failed to parse catalogue source for '{language}': {source}")]
    CatalogLoad {
        /// Language the catalogue was being loaded for.
        language: LanguageIdentifier,
        /// Underlying parser error.
        #[source]
        source: serde_json::Error,
    },

    /// No catalogue is loaded for the requested language.
    #[error("no catalogue loaded for language '{language}'")]
    UnknownLanguage {
        /// Language that was requested.
        language: LanguageIdentifier,
    },

    /// The catalogue for the language has no message under the key.
    #[error("no message keyed '{key}' in the '{language}' catalogue")]
    UnknownKey {
        /// Language whose catalogue was consulted.
        language: LanguageIdentifier,
        /// Message key that was requested.
        key: String,
    },

    /// Reverse lookup found no message whose template equals the literal.
    #[error("no message in the '{language}' catalogue reads '{literal}'")]
    UnknownLiteral {
        /// Language whose reverse mapping was consulted.
        language: LanguageIdentifier,
        /// Display text that was looked up.
        literal: String,
    },

    /// A template expression referenced a name that is neither bound nor a
    /// registered helper.
    #[error("template references '{name}', which is not bound")]
    UndefinedVariable {
        /// Name the expression tried to resolve.
        name: String,
    },

    /// A template placeholder is malformed or uses a construct outside the
    /// restricted expression grammar.
    #[error("malformed template placeholder: {detail}")]
    TemplateSyntax {
        /// Description of the offending construct.
        detail: String,
    },
}
