//! Per-block presentation state for highlighted text.
//!
//! A block goes `Loading -> Ready` once its term snapshot is available;
//! each matched span then carries an independently openable popover. The
//! event loop is assumed single-threaded: every await point is split into
//! a request half and an apply half so the caller's runtime drives the
//! fetches, and a generation counter discards responses that arrive after
//! the block was reset (the "ignore late response" guard).

use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use tracing::warn;

use crate::matcher::{self, MatchSpan, SpanRecord};
use crate::observe::{MatchObserver, NoopObserver};
use crate::repository::{RepositoryError, TermRepository};
use crate::{RelatedTerm, TermEntry, TermStore};

/// Related entries cached per block session; eviction only costs a
/// refetch, which is idempotent.
const RELATED_CACHE_CAP: NonZeroUsize = NonZeroUsize::new(64).unwrap();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockState {
    /// Terms not yet available; the block renders its text as one plain span.
    Loading,
    /// Spans computed; matched spans are interactive.
    Ready,
}

/// Related-terms section of a popover.
#[derive(Debug, Clone, PartialEq)]
pub enum RelatedSection {
    /// Nothing to show: the popover is closed, or its entry declares no
    /// related terms.
    NotRequested,
    /// Fetch in flight; the primary definition renders without waiting.
    Loading,
    Loaded(Vec<RelatedTerm>),
    /// Fetch failed; the popover renders without the section.
    Unavailable,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PopoverState {
    pub is_open: bool,
    pub related: RelatedSection,
}

impl PopoverState {
    fn closed() -> Self {
        Self {
            is_open: false,
            related: RelatedSection::NotRequested,
        }
    }
}

/// Pending related-terms lookup produced by [`HighlightBlock::activate`].
///
/// Run the fetch, then hand the outcome back through
/// [`HighlightBlock::apply_related`].
#[derive(Debug, Clone)]
pub struct RelatedRequest {
    span: usize,
    generation: u64,
    names: Vec<String>,
}

impl RelatedRequest {
    pub fn names(&self) -> &[String] {
        &self.names
    }
}

pub struct HighlightBlock<R: TermRepository + ?Sized> {
    repo: Arc<R>,
    observer: Arc<dyn MatchObserver>,
    text: String,
    state: BlockState,
    store: TermStore,
    spans: Vec<SpanRecord>,
    popovers: Vec<PopoverState>,
    open: Option<usize>,
    generation: u64,
    related_cache: LruCache<String, Vec<RelatedTerm>>,
}

impl<R: TermRepository + ?Sized> HighlightBlock<R> {
    /// A block that still needs its snapshot; call [`load`](Self::load).
    pub fn new(text: impl Into<String>, repo: Arc<R>) -> Self {
        Self {
            repo,
            observer: Arc::new(NoopObserver),
            text: text.into(),
            state: BlockState::Loading,
            store: TermStore::default(),
            spans: Vec::new(),
            popovers: Vec::new(),
            open: None,
            generation: 0,
            related_cache: LruCache::new(RELATED_CACHE_CAP),
        }
    }

    /// A block over caller-supplied terms; skips the snapshot fetch and
    /// starts out `Ready`. The repository is still used for related-terms
    /// lookups.
    pub fn with_terms(text: impl Into<String>, terms: Vec<TermEntry>, repo: Arc<R>) -> Self {
        let mut block = Self::new(text, repo);
        block.install(TermStore::new(terms));
        block
    }

    /// Routes matching diagnostics to the given observer.
    pub fn with_observer(mut self, observer: Arc<dyn MatchObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn state(&self) -> BlockState {
        self.state
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Fetches the active snapshot once. A failed fetch degrades to a
    /// `Ready` block with zero highlighting; the page never blocks on
    /// decoration.
    pub async fn load(&mut self) {
        if self.state == BlockState::Ready {
            return;
        }
        let generation = self.generation;
        let result = self.repo.fetch_active_terms().await;
        self.apply_terms(generation, result);
    }

    /// Applies a snapshot fetched under `generation`; stale responses from
    /// before a [`reset_text`](Self::reset_text) are discarded unseen.
    pub fn apply_terms(
        &mut self,
        generation: u64,
        result: Result<Vec<TermEntry>, RepositoryError>,
    ) {
        if generation != self.generation {
            return;
        }
        let entries = match result {
            Ok(entries) => entries,
            Err(err) => {
                warn!(error = %err, "glossary unavailable, rendering plain text");
                Vec::new()
            }
        };
        self.install(TermStore::new(entries));
    }

    fn install(&mut self, store: TermStore) {
        self.spans = matcher::scan(&self.text, &store, self.observer.as_ref());
        self.popovers = vec![PopoverState::closed(); self.spans.len()];
        self.open = None;
        self.store = store;
        self.state = BlockState::Ready;
    }

    /// Replaces the block's text, dropping the computed spans and marking
    /// any in-flight fetch stale. The related-terms cache survives; it
    /// belongs to the session, not the text.
    pub fn reset_text(&mut self, text: impl Into<String>) {
        self.generation += 1;
        self.text = text.into();
        self.state = BlockState::Loading;
        self.store = TermStore::default();
        self.spans.clear();
        self.popovers.clear();
        self.open = None;
    }

    /// The spans to render, in order. While `Loading` the text renders as
    /// one plain span. Concatenating the span texts always reproduces the
    /// block text exactly.
    pub fn spans(&self) -> Vec<MatchSpan<'_>> {
        if self.state == BlockState::Loading {
            if self.text.is_empty() {
                return Vec::new();
            }
            return vec![MatchSpan {
                text: &self.text,
                matched_term: None,
            }];
        }
        self.spans
            .iter()
            .map(|record| MatchSpan {
                text: &self.text[record.range.clone()],
                matched_term: record.term.map(|index| &self.store.entries()[index]),
            })
            .collect()
    }

    /// Index of the span whose popover is open, if any.
    pub fn open_popover(&self) -> Option<usize> {
        self.open
    }

    pub fn popover(&self, span: usize) -> Option<&PopoverState> {
        self.popovers.get(span)
    }

    /// Entry behind a matched span.
    pub fn span_entry(&self, span: usize) -> Option<&TermEntry> {
        self.spans
            .get(span)?
            .term
            .map(|index| &self.store.entries()[index])
    }

    /// Opens the popover for a matched span, closing any sibling popover
    /// (one open popover per block). Returns the related-terms request to
    /// execute, or `None` when the entry declares no related terms, the
    /// summaries are already cached, or the span is plain text.
    pub fn activate(&mut self, span: usize) -> Option<RelatedRequest> {
        let term_index = self.spans.get(span)?.term?;
        if self.popovers[span].is_open {
            return None;
        }
        if let Some(previous) = self.open.take() {
            self.popovers[previous] = PopoverState::closed();
        }
        self.open = Some(span);
        self.popovers[span].is_open = true;

        let entry = &self.store.entries()[term_index];
        if entry.related_terms.is_empty() {
            return None;
        }
        if let Some(cached) = self.related_cache.get(&entry.term) {
            self.popovers[span].related = RelatedSection::Loaded(cached.clone());
            return None;
        }
        self.popovers[span].related = RelatedSection::Loading;
        Some(RelatedRequest {
            span,
            generation: self.generation,
            names: entry.related_terms.clone(),
        })
    }

    /// Applies the outcome of a related-terms fetch. Stale requests are
    /// discarded; failures leave the popover open without the section.
    pub fn apply_related(
        &mut self,
        request: RelatedRequest,
        result: Result<Vec<RelatedTerm>, RepositoryError>,
    ) {
        if request.generation != self.generation {
            return;
        }
        match result {
            Ok(related) => {
                if let Some(Some(term_index)) = self.spans.get(request.span).map(|s| s.term) {
                    let term = self.store.entries()[term_index].term.clone();
                    self.related_cache.put(term, related.clone());
                }
                if let Some(popover) = self.popovers.get_mut(request.span) {
                    if popover.is_open {
                        popover.related = RelatedSection::Loaded(related);
                    }
                }
            }
            Err(err) => {
                warn!(error = %err, "related terms unavailable, omitting section");
                if let Some(popover) = self.popovers.get_mut(request.span) {
                    if popover.is_open {
                        popover.related = RelatedSection::Unavailable;
                    }
                }
            }
        }
    }

    /// Activate plus the fetch it requests, in one call.
    pub async fn open(&mut self, span: usize) {
        if let Some(request) = self.activate(span) {
            let result = self.repo.resolve_related_terms(request.names()).await;
            self.apply_related(request, result);
        }
    }

    pub fn close(&mut self, span: usize) {
        if let Some(popover) = self.popovers.get_mut(span) {
            *popover = PopoverState::closed();
        }
        if self.open == Some(span) {
            self.open = None;
        }
    }
}
