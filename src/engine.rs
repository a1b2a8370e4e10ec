//! Engine facade: top-level API for the materials database.
//!
//! The `Engine` owns the storage and full-text collaborators and sequences
//! each public operation: validate, then compile or ingest, then project.
//! It holds no per-request state.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;

use crate::compile::{QueryCompiler, QueryDescription};
use crate::config::MaterialsConfig;
use crate::error::MaterialsResult;
use crate::fulltext::{TextSearch, TokenIndex};
use crate::ingest::{IngestSummary, Ingestor};
use crate::project::{Record, project};
use crate::schema;
use crate::store::{DEFAULT_MAX_COMPOUND_LEN, DurableStore, MaterialStore, MemStore};

/// Configuration for the materials engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Data directory for persistence. `None` for memory-only mode.
    pub data_dir: Option<PathBuf>,
    /// Build and maintain the full-text index.
    pub full_text: bool,
    /// Longest accepted compound string.
    pub max_compound_len: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            full_text: true,
            max_compound_len: DEFAULT_MAX_COMPOUND_LEN,
        }
    }
}

impl From<&MaterialsConfig> for EngineConfig {
    fn from(config: &MaterialsConfig) -> Self {
        Self {
            data_dir: config.data_dir.clone(),
            full_text: config.full_text,
            max_compound_len: config.max_compound_len,
        }
    }
}

/// The materials query and ingestion engine.
pub struct Engine {
    store: Arc<dyn MaterialStore>,
    search: Option<Arc<dyn TextSearch>>,
    persistent: bool,
}

impl Engine {
    /// Create a new engine with the given configuration.
    ///
    /// With a data directory the redb store is opened and, when full-text
    /// search is enabled, the index is rebuilt from its contents.
    pub fn new(config: EngineConfig) -> MaterialsResult<Self> {
        let store: Arc<dyn MaterialStore> = match &config.data_dir {
            Some(dir) => Arc::new(
                DurableStore::open(dir)?.with_max_compound_len(config.max_compound_len),
            ),
            None => Arc::new(MemStore::new().with_max_compound_len(config.max_compound_len)),
        };
        let search: Option<Arc<dyn TextSearch>> = if config.full_text {
            Some(Arc::new(TokenIndex::rebuild_from(store.as_ref())?))
        } else {
            None
        };

        tracing::info!(
            persistent = config.data_dir.is_some(),
            full_text = config.full_text,
            materials = store.len()?,
            "initializing materials engine"
        );

        Ok(Self {
            store,
            search,
            persistent: config.data_dir.is_some(),
        })
    }

    /// Build an engine around caller-supplied collaborators.
    ///
    /// The caller is responsible for `search` already covering whatever is
    /// in `store`.
    pub fn with_collaborators(
        store: Arc<dyn MaterialStore>,
        search: Option<Arc<dyn TextSearch>>,
    ) -> Self {
        Self {
            store,
            search,
            persistent: false,
        }
    }

    pub fn store(&self) -> &Arc<dyn MaterialStore> {
        &self.store
    }

    pub fn text_search(&self) -> Option<&Arc<dyn TextSearch>> {
        self.search.as_ref()
    }

    fn ingestor(&self) -> Ingestor<'_> {
        Ingestor::new(self.store.as_ref(), self.search.as_deref())
    }

    /// Validate and store an `add` document, returning the stored records.
    ///
    /// Strict: the first bad entry fails the request, but entries before it
    /// remain stored.
    pub fn add(&self, payload: &[u8]) -> MaterialsResult<Vec<Record>> {
        let document = schema::validate_add(payload)?;
        let stored = self.ingestor().ingest_add(&document)?;
        Ok(project(&stored))
    }

    /// Validate, compile, and run a `search` document.
    ///
    /// `term` is the optional free-text constraint.
    pub fn search(&self, payload: &[u8], term: Option<&str>) -> MaterialsResult<Vec<Record>> {
        let document = schema::validate_search(payload)?;
        let query = QueryDescription::new(document, term.map(str::to_string));
        let filter = QueryCompiler::new(self.store.as_ref(), self.search.as_deref())
            .compile(&query)?;
        let results = self.store.execute(&filter)?;
        tracing::debug!(results = results.len(), "search executed");
        Ok(project(&results))
    }

    /// Bulk-load a CSV upload.
    pub fn upload(&self, bytes: &[u8]) -> MaterialsResult<IngestSummary> {
        Ok(self.ingestor().ingest_csv(bytes)?)
    }

    pub fn info(&self) -> MaterialsResult<EngineInfo> {
        Ok(EngineInfo {
            material_count: self.store.len()?,
            indexed_count: self.search.as_ref().map_or(0, |s| s.len()),
            full_text: self.search.is_some(),
            persistent: self.persistent,
        })
    }
}

/// Summary information about the engine state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EngineInfo {
    pub material_count: usize,
    pub indexed_count: usize,
    pub full_text: bool,
    pub persistent: bool,
}

impl std::fmt::Display for EngineInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "materials engine info")?;
        writeln!(f, "  materials:    {}", self.material_count)?;
        writeln!(f, "  indexed:      {}", self.indexed_count)?;
        writeln!(f, "  full text:    {}", self.full_text)?;
        writeln!(f, "  persistent:   {}", self.persistent)?;
        Ok(())
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("full_text", &self.search.is_some())
            .field("persistent", &self.persistent)
            .finish()
    }
}
