//! Message catalogue resolution with safe template substitution.
//!
//! `phrasebook` maps `(language, key, bindings)` to rendered text. Catalogues
//! are flat key→template mappings (typically parsed from JSON); templates may
//! embed `{expression}` placeholders drawn from a deliberately restricted
//! grammar — variable references, indexing, literal lists, and calls to
//! registered pure plural rules through `self` — so catalogue authors shape
//! text without ever executing code. Resolutions are memoised per handle, and
//! each catalogue carries a reverse index mapping a binding-free display
//! string back to its key.
//!
//! Catalogue loading is the caller's I/O: fetch the document however suits
//! the application and hand the parsed mapping (or the raw JSON text) to the
//! [`CatalogStore`]. A [`Translator`] is then a cheap per-session handle:
//!
//! ```rust
//! use phrasebook::{Bindings, CatalogStore, Translator, langid};
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), phrasebook::PhrasebookError> {
//! let store = Arc::new(CatalogStore::new());
//! store.load_json(
//!     langid!("ru"),
//!     r#"{
//!         "Button1": "Назад",
//!         "Stock": "доступно {amount} {['акция', 'акции', 'акций'][self.ru_plural(amount)]}"
//!     }"#,
//! )?;
//!
//! let translator = Translator::new(Arc::clone(&store), langid!("ru"));
//! assert_eq!(
//!     translator.resolve("Stock", &Bindings::new().with("amount", 25))?,
//!     "доступно 25 акций",
//! );
//! assert_eq!(translator.reverse_resolve("Назад")?, "Button1");
//! # Ok(())
//! # }
//! ```
//!
//! Missing translations are never masked: every lookup failure is a
//! [`PhrasebookError`] for the caller to handle, with no fallback language.

mod cache;
mod catalog;
mod error;
pub mod plural;
mod template;
mod translator;
mod value;

pub use cache::ResolutionCache;
pub use catalog::{Catalog, CatalogStore};
pub use error::{PhrasebookError, PhrasebookResult};
pub use plural::PluralRule;
pub use translator::Translator;
pub use value::{Bindings, Value};

pub use unic_langid::{LanguageIdentifier, langid};
