//! Name ordering for Brazilian Portuguese category labels.
//!
//! Comparison happens in two levels. The primary level strips diacritics and
//! case, so "Água", "agua" and "AGUA" all land next to "Aluguel" rather than
//! after "Z". The secondary level breaks primary ties by accents, placing the
//! unaccented spelling first. Case alone never orders two names; callers
//! relying on a stable sort keep the input order for those ties.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CollationKey {
    primary: String,
    secondary: String,
}

pub fn collation_key(name: &str) -> CollationKey {
    let secondary: String = name.nfd().flat_map(char::to_lowercase).collect();
    let primary = secondary
        .chars()
        .filter(|c| !is_combining_mark(*c))
        .collect();

    CollationKey { primary, secondary }
}
