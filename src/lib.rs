//! Recognition and highlighting of French glossary terms in learner-facing
//! text: a read-only vocabulary snapshot, a heuristic variant normalizer,
//! a longest-literal-first matcher, and a per-block popover state machine.

pub mod highlight;
mod matcher;
mod normalize;
pub mod observe;
pub mod repository;

use std::collections::HashSet;
use std::fmt;

use serde::de::{self, Deserializer, SeqAccess};
use serde::{Deserialize, Serialize};

pub use matcher::{MatchKind, MatchSpan, find_matching_term, highlight_spans};
pub use normalize::{Normalized, normalize};

/// One vocabulary record: a canonical term, its definition, and the
/// alternate surface forms that should resolve to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TermEntry {
    pub id: String,
    pub term: String,
    pub definition: String,
    #[serde(default)]
    pub example: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    /// Canonical names of related entries, used only for display lookups.
    #[serde(default, deserialize_with = "lenient_string_list")]
    pub related_terms: Vec<String>,
    /// Alternate spellings resolving to this entry ("glisse" -> "glisser").
    #[serde(default, deserialize_with = "lenient_string_list")]
    pub variants: Vec<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// Term/definition summary pair, as shown in the related-terms section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedTerm {
    pub term: String,
    pub definition: String,
}

/// Immutable snapshot of the active vocabulary for one matching pass.
///
/// Construction drops inactive entries and preserves the remaining order;
/// every first-match-wins rule in the matcher is defined against that
/// store order.
#[derive(Debug, Clone, Default)]
pub struct TermStore {
    entries: Vec<TermEntry>,
}

impl TermStore {
    pub fn new(entries: Vec<TermEntry>) -> Self {
        Self {
            entries: entries.into_iter().filter(|e| e.is_active).collect(),
        }
    }

    /// Active entries in store order.
    pub fn entries(&self) -> &[TermEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Case-insensitive lookup of a canonical term.
    pub fn get(&self, term: &str) -> Option<&TermEntry> {
        let lowered = term.to_lowercase();
        self.entries
            .iter()
            .find(|e| e.term.to_lowercase() == lowered)
    }

    /// Sorted unique non-empty category labels.
    pub fn categories(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut categories: Vec<String> = self
            .entries
            .iter()
            .filter_map(|e| e.category.as_deref())
            .filter(|c| !c.is_empty() && seen.insert(c.to_string()))
            .map(str::to_string)
            .collect();
        categories.sort();
        categories
    }

    pub fn by_category<'a>(
        &'a self,
        category: &'a str,
    ) -> impl Iterator<Item = &'a TermEntry> + 'a {
        self.entries
            .iter()
            .filter(move |e| e.category.as_deref() == Some(category))
    }

    /// Resolves canonical names to term/definition pairs.
    ///
    /// Names that match no active entry are silently omitted; that is the
    /// contract, not an error.
    pub fn resolve_related(&self, names: &[String]) -> Vec<RelatedTerm> {
        self.entries
            .iter()
            .filter(|e| {
                let lowered = e.term.to_lowercase();
                names.iter().any(|n| n.to_lowercase() == lowered)
            })
            .map(|e| RelatedTerm {
                term: e.term.clone(),
                definition: e.definition.clone(),
            })
            .collect()
    }

    /// Loose containment scan: which entries appear somewhere in the text.
    ///
    /// Checks containment in both directions per whitespace token, as the
    /// instruction-tagging feature always has. Much coarser than
    /// [`highlight_spans`]; use it only to flag candidate keywords.
    pub fn scan_keywords(&self, text: &str) -> Vec<&TermEntry> {
        if text.is_empty() {
            return Vec::new();
        }
        let lowered = text.to_lowercase();
        let words: Vec<&str> = lowered.split_whitespace().collect();
        self.entries
            .iter()
            .filter(|e| {
                let term = e.term.to_lowercase();
                words.iter().any(|w| w.contains(&term) || term.contains(w))
            })
            .collect()
    }
}

fn default_true() -> bool {
    true
}

/// Accepts a list of strings, skipping non-string elements; any other JSON
/// shape (null, a bare string, a number) degrades to the empty list so a
/// malformed column never fails the whole snapshot. The entry's canonical
/// term stays eligible for matching either way.
fn lenient_string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Item {
        Str(String),
        Other(de::IgnoredAny),
    }

    struct LenientList;

    impl<'de> de::Visitor<'de> for LenientList {
        type Value = Vec<String>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "a list of strings")
        }

        fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
        where
            A: SeqAccess<'de>,
        {
            let mut items = Vec::new();
            while let Some(item) = seq.next_element::<Item>()? {
                if let Item::Str(s) = item {
                    if !s.is_empty() {
                        items.push(s);
                    }
                }
            }
            Ok(items)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E> {
            Ok(Vec::new())
        }

        fn visit_none<E>(self) -> Result<Self::Value, E> {
            Ok(Vec::new())
        }

        fn visit_some<D2>(self, deserializer: D2) -> Result<Self::Value, D2::Error>
        where
            D2: Deserializer<'de>,
        {
            deserializer.deserialize_any(LenientList)
        }

        fn visit_str<E>(self, _: &str) -> Result<Self::Value, E> {
            Ok(Vec::new())
        }

        fn visit_bool<E>(self, _: bool) -> Result<Self::Value, E> {
            Ok(Vec::new())
        }

        fn visit_i64<E>(self, _: i64) -> Result<Self::Value, E> {
            Ok(Vec::new())
        }

        fn visit_u64<E>(self, _: u64) -> Result<Self::Value, E> {
            Ok(Vec::new())
        }

        fn visit_f64<E>(self, _: f64) -> Result<Self::Value, E> {
            Ok(Vec::new())
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: de::MapAccess<'de>,
        {
            while map
                .next_entry::<de::IgnoredAny, de::IgnoredAny>()?
                .is_some()
            {}
            Ok(Vec::new())
        }
    }

    deserializer.deserialize_any(LenientList)
}

#[cfg(test)]
pub(crate) fn entry(term: &str, definition: &str) -> TermEntry {
    TermEntry {
        id: term.to_lowercase(),
        term: term.to_string(),
        definition: definition.to_string(),
        example: None,
        category: None,
        related_terms: Vec::new(),
        variants: Vec::new(),
        is_active: true,
    }
}
