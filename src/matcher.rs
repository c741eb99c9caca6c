//! Locates glossary terms in free text and resolves each occurrence to its
//! vocabulary entry.
//!
//! One case-insensitive, word-boundary-delimited alternation covers every
//! canonical term and every declared variant, longest literal first so a
//! compound term beats a shorter substring at the same position. Anything
//! that goes wrong while building or applying the pattern degrades to the
//! plain, unhighlighted text; highlighting is decorative and must never
//! break the page around it.

use std::collections::HashSet;
use std::ops::Range;

use regex::Regex;
use tracing::warn;

use crate::normalize::normalize;
use crate::observe::{MatchEvent, MatchObserver};
use crate::{TermEntry, TermStore};

/// How an occurrence resolved to its entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// Case-insensitive match against a canonical term.
    Exact,
    /// Case-insensitive match against a declared variant.
    Variant,
    /// The word and the canonical term share a normalized base.
    Normalized,
}

/// A contiguous piece of the source text, tagged with the entry it resolved
/// to, or untagged for plain text. Spans partition the input in order.
#[derive(Debug, Clone)]
pub struct MatchSpan<'a> {
    pub text: &'a str,
    pub matched_term: Option<&'a TermEntry>,
}

/// Span record kept by the highlight block: offsets into the text plus an
/// index into the store, so the block can own both without self-reference.
#[derive(Debug, Clone)]
pub(crate) struct SpanRecord {
    pub(crate) range: Range<usize>,
    pub(crate) term: Option<usize>,
}

/// Resolves a single word against the active set.
///
/// Resolution order, first success wins: exact canonical term, declared
/// variant, shared normalized base longer than two chars. Every stage scans
/// entries in store order and takes the first hit; that ordering is the
/// documented tie-break for variant collisions.
pub fn find_matching_term<'a>(word: &str, store: &'a TermStore) -> Option<&'a TermEntry> {
    resolve(word, store).map(|(index, _)| &store.entries()[index])
}

pub(crate) fn resolve(word: &str, store: &TermStore) -> Option<(usize, MatchKind)> {
    let lowered = word.to_lowercase();

    for (index, entry) in store.entries().iter().enumerate() {
        if entry.term.to_lowercase() == lowered {
            return Some((index, MatchKind::Exact));
        }
    }

    for (index, entry) in store.entries().iter().enumerate() {
        if entry
            .variants
            .iter()
            .any(|variant| variant.to_lowercase() == lowered)
        {
            return Some((index, MatchKind::Variant));
        }
    }

    let word_norm = normalize(word);
    for (index, entry) in store.entries().iter().enumerate() {
        let term_norm = normalize(&entry.term);
        if term_norm.base == word_norm.base && term_norm.base.chars().count() > 2 {
            return Some((index, MatchKind::Normalized));
        }
    }

    None
}

/// Splits `text` into matched and plain spans against the active set.
///
/// Round-trip invariant: concatenating the span texts in order reproduces
/// the input exactly, whitespace and punctuation included.
pub fn highlight_spans<'a>(
    text: &'a str,
    store: &'a TermStore,
    observer: &dyn MatchObserver,
) -> Vec<MatchSpan<'a>> {
    scan(text, store, observer)
        .into_iter()
        .map(|record| MatchSpan {
            text: &text[record.range.clone()],
            matched_term: record.term.map(|index| &store.entries()[index]),
        })
        .collect()
}

pub(crate) fn scan(text: &str, store: &TermStore, observer: &dyn MatchObserver) -> Vec<SpanRecord> {
    if text.is_empty() {
        return Vec::new();
    }
    let Some(pattern) = build_pattern(store, observer) else {
        return vec![SpanRecord {
            range: 0..text.len(),
            term: None,
        }];
    };

    let mut records = Vec::new();
    let mut cursor = 0usize;
    for found in pattern.find_iter(text) {
        if found.start() > cursor {
            push_piece(text, cursor..found.start(), store, observer, &mut records);
        }
        push_piece(text, found.range(), store, observer, &mut records);
        cursor = found.end();
    }
    if cursor < text.len() {
        push_piece(text, cursor..text.len(), store, observer, &mut records);
    }
    records
}

/// Every piece goes through resolution, delimiter and gap alike: a gap that
/// happens to be exactly one resolvable word still highlights.
fn push_piece(
    text: &str,
    range: Range<usize>,
    store: &TermStore,
    observer: &dyn MatchObserver,
    records: &mut Vec<SpanRecord>,
) {
    let piece = &text[range.clone()];
    if piece.is_empty() {
        return;
    }
    let term = match resolve(piece, store) {
        Some((index, kind)) => {
            observer.emit(MatchEvent::SpanMatched {
                text: piece.to_string(),
                term: store.entries()[index].term.clone(),
                kind,
            });
            Some(index)
        }
        None => None,
    };
    records.push(SpanRecord { range, term });
}

/// Builds the combined alternation: canonical terms first, then variants,
/// escaped, de-duplicated, stably sorted by descending char length.
/// Returns `None` when no literal forms exist or the engine rejects the
/// pattern; both cases render the input unhighlighted.
fn build_pattern(store: &TermStore, observer: &dyn MatchObserver) -> Option<Regex> {
    let mut literals: Vec<String> = Vec::new();
    for entry in store.entries() {
        literals.push(regex::escape(&entry.term));
    }
    for entry in store.entries() {
        for variant in &entry.variants {
            if !variant.is_empty() {
                literals.push(regex::escape(variant));
            }
        }
    }

    let mut seen = HashSet::new();
    literals.retain(|literal| seen.insert(literal.clone()));
    literals.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()));

    if literals.is_empty() {
        return None;
    }

    let source = format!(r"(?i)\b(?:{})\b", literals.join("|"));
    match Regex::new(&source) {
        Ok(pattern) => {
            observer.emit(MatchEvent::PatternBuilt {
                literal_count: literals.len(),
                pattern_len: source.len(),
            });
            Some(pattern)
        }
        Err(err) => {
            warn!(error = %err, literal_count = literals.len(), "glossary pattern rejected, rendering plain text");
            observer.emit(MatchEvent::PatternRejected {
                literal_count: literals.len(),
            });
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry;
    use crate::observe::{EventLog, NoopObserver};

    fn texts<'a>(spans: &'a [MatchSpan<'a>]) -> String {
        spans.iter().map(|s| s.text).collect()
    }

    fn matched_terms<'a>(spans: &'a [MatchSpan<'a>]) -> Vec<&'a str> {
        spans
            .iter()
            .filter_map(|s| s.matched_term.map(|t| t.term.as_str()))
            .collect()
    }

    #[test]
    fn round_trip_reconstructs_input_exactly() {
        let mut glisser = entry("Glisser", "Déplacer un doigt.");
        glisser.variants = vec!["glisse".into(), "glissement".into()];
        let store = TermStore::new(vec![glisser, entry("Écran", "Surface d'affichage.")]);

        let text = "Faites un glissement, puis touchez l'écran  (deux fois) !";
        let spans = highlight_spans(text, &store, &NoopObserver);
        assert_eq!(texts(&spans), text);
    }

    #[test]
    fn empty_store_yields_one_plain_span() {
        let store = TermStore::new(Vec::new());
        let text = "Aucun terme ici.";
        let spans = highlight_spans(text, &store, &NoopObserver);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, text);
        assert!(spans[0].matched_term.is_none());
    }

    #[test]
    fn empty_text_yields_no_spans() {
        let store = TermStore::new(vec![entry("Scroll", "Faire défiler.")]);
        assert!(highlight_spans("", &store, &NoopObserver).is_empty());
    }

    #[test]
    fn longer_literal_wins_at_the_same_position() {
        let store = TermStore::new(vec![
            entry("Scroll", "Faire défiler."),
            entry("Scrolling", "Défilement continu."),
        ]);
        let spans = highlight_spans("Scrolling vers le bas", &store, &NoopObserver);
        assert_eq!(matched_terms(&spans), vec!["Scrolling"]);
        assert_eq!(spans[0].text, "Scrolling");
    }

    #[test]
    fn declared_variant_resolves_to_its_entry() {
        let mut glisser = entry("Glisser", "Déplacer un doigt.");
        glisser.variants = vec!["glisse".into(), "glissement".into()];
        let store = TermStore::new(vec![glisser]);

        let spans = highlight_spans("Faites un glissement vers le bas", &store, &NoopObserver);
        assert_eq!(matched_terms(&spans), vec!["Glisser"]);

        let found = find_matching_term("glissement", &store).expect("variant resolves");
        assert_eq!(found.term, "Glisser");
        assert_eq!(
            resolve("glissement", &store),
            Some((0, MatchKind::Variant))
        );
    }

    #[test]
    fn suffix_normalization_is_the_last_resort() {
        // No variant declared: "glissement" still reaches "Glisser"
        // because both normalize to "gliss".
        let store = TermStore::new(vec![entry("Glisser", "Déplacer un doigt.")]);
        assert_eq!(
            resolve("glissement", &store),
            Some((0, MatchKind::Normalized))
        );

        // "paramétrisation" normalizes to "paramétrisa", not "paramètre":
        // the heuristic does not bridge that pair.
        let store = TermStore::new(vec![entry("Paramètre", "Réglage de l'appareil.")]);
        assert!(resolve("paramétrisation", &store).is_none());
        // A coinage that strips straight back to the term does match.
        assert_eq!(
            resolve("paramètretion", &store),
            Some((0, MatchKind::Normalized))
        );
    }

    #[test]
    fn matching_is_case_insensitive() {
        let store = TermStore::new(vec![entry("Scroll", "Faire défiler.")]);
        for word in ["SCROLL", "scroll", "Scroll"] {
            assert_eq!(resolve(word, &store), Some((0, MatchKind::Exact)), "{word}");
        }
        let spans = highlight_spans("SCROLL puis scroll", &store, &NoopObserver);
        assert_eq!(matched_terms(&spans), vec!["Scroll", "Scroll"]);
    }

    #[test]
    fn inactive_entries_never_match() {
        let mut bluetooth = entry("Bluetooth", "Liaison sans fil.");
        bluetooth.is_active = false;
        let store = TermStore::new(vec![bluetooth]);

        let spans = highlight_spans("Activez le Bluetooth", &store, &NoopObserver);
        assert_eq!(spans.len(), 1);
        assert!(spans[0].matched_term.is_none());
    }

    #[test]
    fn first_entry_in_store_order_wins_variant_collisions() {
        let mut first = entry("Glisser", "Déplacer un doigt.");
        first.variants = vec!["swipe".into()];
        let mut second = entry("Balayer", "Geste rapide du doigt.");
        second.variants = vec!["swipe".into()];
        let store = TermStore::new(vec![first, second]);

        let found = find_matching_term("swipe", &store).expect("collision resolves");
        assert_eq!(found.term, "Glisser");
    }

    #[test]
    fn punctuation_in_terms_is_escaped() {
        let store = TermStore::new(vec![entry("Wi-Fi", "Connexion sans fil.")]);
        let spans = highlight_spans("Activez le Wi-Fi.", &store, &NoopObserver);
        assert_eq!(matched_terms(&spans), vec!["Wi-Fi"]);
        assert_eq!(texts(&spans), "Activez le Wi-Fi.");
    }

    #[test]
    fn multi_word_terms_match_as_one_span() {
        let store = TermStore::new(vec![
            entry("Carte SIM", "Puce d'abonné."),
            entry("Carte", "Support d'information."),
        ]);
        let spans = highlight_spans("Insérez la carte SIM ici", &store, &NoopObserver);
        assert_eq!(matched_terms(&spans), vec!["Carte SIM"]);
    }

    #[test]
    fn observer_receives_pattern_and_span_events() {
        let log = EventLog::new();
        let mut glisser = entry("Glisser", "Déplacer un doigt.");
        glisser.variants = vec!["glisse".into()];
        let store = TermStore::new(vec![glisser]);

        highlight_spans("Faites glisser l'image", &store, &log);
        let events = log.events();
        assert!(matches!(
            events[0],
            MatchEvent::PatternBuilt { literal_count: 2, .. }
        ));
        assert!(events.iter().any(|e| matches!(
            e,
            MatchEvent::SpanMatched { term, kind: MatchKind::Exact, .. } if term == "Glisser"
        )));
    }
}
