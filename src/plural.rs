//! Per-language plural rules.
//!
//! A rule maps a nonnegative quantity to a category index selecting the
//! grammatically correct word form. Catalogue templates pick an inflected
//! word out of a literal list with the index, for example:
//!
//! ```json
//! { "Stock": "доступно {amount} {['акция', 'акции', 'акций'][self.ru_plural(amount)]}" }
//! ```
//!
//! Rules are registered per language on the [`CatalogStore`] and invoked from
//! templates through `self`; they must be pure so memoised resolutions stay
//! valid.
//!
//! [`CatalogStore`]: crate::CatalogStore

/// A pure plural rule: quantity in, category index out.
pub type PluralRule = fn(u64) -> usize;

/// Russian plural categories: one (1, 21, 101…), few (2–4, 22–24…),
/// many (0, 5–20, 25–30…).
///
/// The teens 11–19 always take the "many" form, so the last two digits are
/// inspected before the last digit.
#[must_use]
pub fn russian(magnitude: u64) -> usize {
    let last_two = magnitude % 100;
    if last_two / 10 == 1 {
        return 2;
    }
    match last_two % 10 {
        1 => 0,
        2..=4 => 1,
        _ => 2,
    }
}

/// English plural categories: singular (1) and plural (everything else).
#[must_use]
pub fn english(magnitude: u64) -> usize {
    usize::from(magnitude != 1)
}
