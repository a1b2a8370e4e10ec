//! Full-text search collaborator.
//!
//! The engine only needs [`TextSearch`]: index a material after each save and
//! answer a raw term with the ids of matching materials. [`TokenIndex`] is
//! the bundled in-memory implementation, an inverted index over each
//! material's flattened text.

use std::collections::BTreeSet;

use dashmap::DashMap;
use rust_stemmers::{Algorithm, Stemmer};

use crate::error::CompileError;
use crate::filter::FilterExpr;
use crate::model::{Material, MaterialId};
use crate::store::MaterialStore;

/// One full-text match, resolvable to a stored material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SearchHit {
    pub id: MaterialId,
}

/// Full-text search provider.
pub trait TextSearch: Send + Sync {
    /// Index (or re-index) a saved material. Unsaved materials are ignored.
    fn index(&self, material: &Material);

    /// Drop a material from the index.
    fn remove(&self, id: MaterialId);

    /// Materials whose document contains every token of `term`.
    fn raw_search(&self, term: &str) -> Result<Vec<SearchHit>, CompileError>;

    /// Number of indexed materials.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Lower-cased, English-stemmed tokens of a document or query; commas
/// separate like spaces. No stop words are dropped.
pub fn tokenize(text: &str) -> Vec<String> {
    let stemmer = Stemmer::create(Algorithm::English);
    let mut tokens: Vec<String> = text
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty())
        .map(|t| stemmer.stem(&t.to_lowercase()).into_owned())
        .collect();
    tokens.sort();
    tokens.dedup();
    tokens
}

/// The text indexed for a material: its csv projection and derived sets.
pub fn document_text(material: &Material) -> String {
    format!(
        "{} {} {} {}",
        material.csv, material.elements, material.periods, material.groups
    )
}

/// In-memory inverted index.
#[derive(Debug, Default)]
pub struct TokenIndex {
    postings: DashMap<String, BTreeSet<MaterialId>>,
    documents: DashMap<MaterialId, Vec<String>>,
}

impl TokenIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index over every material in `store`.
    pub fn rebuild_from(store: &dyn MaterialStore) -> crate::store::StoreResult<Self> {
        let index = Self::new();
        for material in store.execute(&FilterExpr::All)? {
            index.index(&material);
        }
        tracing::debug!(documents = index.len(), "rebuilt full-text index");
        Ok(index)
    }

    fn unlink(&self, id: MaterialId, tokens: &[String]) {
        for token in tokens {
            let emptied = match self.postings.get_mut(token) {
                Some(mut ids) => {
                    ids.remove(&id);
                    ids.is_empty()
                }
                None => false,
            };
            if emptied {
                self.postings.remove_if(token, |_, ids| ids.is_empty());
            }
        }
    }
}

impl TextSearch for TokenIndex {
    fn index(&self, material: &Material) {
        let Some(id) = material.id else {
            return;
        };
        let tokens = tokenize(&document_text(material));
        if let Some((_, previous)) = self.documents.remove(&id) {
            self.unlink(id, &previous);
        }
        for token in &tokens {
            self.postings.entry(token.clone()).or_default().insert(id);
        }
        self.documents.insert(id, tokens);
    }

    fn remove(&self, id: MaterialId) {
        if let Some((_, previous)) = self.documents.remove(&id) {
            self.unlink(id, &previous);
        }
    }

    fn raw_search(&self, term: &str) -> Result<Vec<SearchHit>, CompileError> {
        let tokens = tokenize(term);
        let mut matched: Option<BTreeSet<MaterialId>> = None;
        for token in &tokens {
            let ids = self
                .postings
                .get(token)
                .map(|ids| ids.value().clone())
                .unwrap_or_default();
            matched = Some(match matched {
                Some(acc) => acc.intersection(&ids).copied().collect(),
                None => ids,
            });
        }
        Ok(matched
            .unwrap_or_default()
            .into_iter()
            .map(|id| SearchHit { id })
            .collect())
    }

    fn len(&self) -> usize {
        self.documents.len()
    }
}
