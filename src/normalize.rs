//! Heuristic suffix stripping for French word variants.
//!
//! This is deliberately not a stemmer. It exists so that "glisser" and
//! "glissement" collapse to a common base without any linguistic machinery,
//! and it mis-normalizes words that share a short suffix with a longer one
//! earlier in the list. That behavior is pinned by tests; do not "improve"
//! it, as doing so changes which words highlight.

/// Suffixes tried in priority order; the first hit wins. List order is the
/// tie-break, not suffix length.
pub(crate) const SUFFIXES: &[&str] = &[
    "ement", "ment", "tion", "sion", "er", "é", "ée", "és", "ées", "al", "aux", "ite", "itude",
    "ance", "ence", "ure", "age", "ire",
];

/// A word reduced to its approximate base form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    pub base: String,
    pub original: String,
}

/// Lower-cases the word and strips the first matching suffix whose removal
/// leaves a stem of more than two characters. Lengths are counted in chars
/// so accented letters weigh the same as plain ones.
pub fn normalize(word: &str) -> Normalized {
    let lowered = word.to_lowercase();
    let word_len = lowered.chars().count();

    for suffix in SUFFIXES {
        let suffix_len = suffix.chars().count();
        if word_len <= suffix_len + 2 {
            continue;
        }
        if let Some(stem) = lowered.strip_suffix(suffix) {
            if stem.chars().count() > 2 {
                return Normalized {
                    base: stem.to_string(),
                    original: word.to_string(),
                };
            }
        }
    }

    Normalized {
        base: lowered,
        original: word.to_string(),
    }
}
