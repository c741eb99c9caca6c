//! Boundary contract with the external term repository.
//!
//! The repository is the sole source of truth and sole mutator of
//! vocabulary data; this crate only reads snapshots through it. Both calls
//! are expected to fail occasionally (network); callers degrade, they do
//! not propagate.

use async_trait::async_trait;
use thiserror::Error;

use crate::{RelatedTerm, TermEntry};

#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The active term snapshot could not be obtained. Recovery: render
    /// the text with zero highlighting.
    #[error("failed to fetch glossary terms: {0}")]
    TermFetch(String),
    /// Related-terms lookup failed after a popover opened. Recovery: show
    /// the popover without the related section.
    #[error("failed to resolve related terms: {0}")]
    RelatedFetch(String),
}

#[async_trait]
pub trait TermRepository: Send + Sync {
    /// Snapshot of all currently active entries, variants and related
    /// names included.
    async fn fetch_active_terms(&self) -> Result<Vec<TermEntry>, RepositoryError>;

    /// Resolves canonical names to term/definition summaries. Missing
    /// names are silently omitted from the result, not an error.
    async fn resolve_related_terms(
        &self,
        names: &[String],
    ) -> Result<Vec<RelatedTerm>, RepositoryError>;
}

/// In-memory repository over a fixed entry list. Backs the CLI glossary
/// file and the tests; applies the same active-only and missing-omitted
/// semantics as the hosted table.
#[derive(Debug, Clone, Default)]
pub struct StaticTerms {
    entries: Vec<TermEntry>,
}

impl StaticTerms {
    pub fn new(entries: Vec<TermEntry>) -> Self {
        Self { entries }
    }
}

#[async_trait]
impl TermRepository for StaticTerms {
    async fn fetch_active_terms(&self) -> Result<Vec<TermEntry>, RepositoryError> {
        Ok(self
            .entries
            .iter()
            .filter(|e| e.is_active)
            .cloned()
            .collect())
    }

    async fn resolve_related_terms(
        &self,
        names: &[String],
    ) -> Result<Vec<RelatedTerm>, RepositoryError> {
        Ok(self
            .entries
            .iter()
            .filter(|e| e.is_active)
            .filter(|e| {
                let lowered = e.term.to_lowercase();
                names.iter().any(|n| n.to_lowercase() == lowered)
            })
            .map(|e| RelatedTerm {
                term: e.term.clone(),
                definition: e.definition.clone(),
            })
            .collect())
    }
}
