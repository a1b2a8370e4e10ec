//! Ingestion pipeline: CSV bulk loads and JSON `add` documents.
//!
//! Every record is stored with a two-phase save:
//!
//! 1. derive fields, save the bare material (this assigns its id)
//! 2. attach all properties, derive again, save again
//!
//! The second save is what brings the cached `csv` text and the full-text
//! index up to date with the complete property set. Do not merge the two.
//!
//! CSV loads are best-effort: a bad record is tallied and skipped. `add`
//! documents are strict: the first failure aborts the request. Entries
//! saved before the failure stay saved; the add path is not atomic.

use serde::Serialize;

use crate::chem;
use crate::error::{IngestError, StoreError};
use crate::fulltext::TextSearch;
use crate::model::{Material, MaterialId};
use crate::schema::AddDocument;
use crate::store::{self, MaterialStore, StoreResult};

/// First field of the mandatory CSV header line.
pub const CSV_HEADER_FIELD: &str = "Chemical formula";

/// What happened to one CSV data line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RecordOutcome {
    Accepted { id: u64 },
    /// Field count was not `1 + 2k` with `k >= 1`.
    Skipped { fields: usize },
    /// A save was rejected.
    Failed { reason: String },
}

/// Outcome of one CSV data line, by 1-based line number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordReport {
    pub line: usize,
    pub compound: String,
    #[serde(flatten)]
    pub outcome: RecordOutcome,
}

/// Aggregate result of one ingestion batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestSummary {
    /// Records stored with all their properties.
    pub accepted: usize,
    /// Non-blank data lines (CSV) or entries (add) processed.
    pub total: usize,
    pub records: Vec<RecordReport>,
}

impl IngestSummary {
    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, RecordOutcome::Skipped { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, RecordOutcome::Failed { .. }))
    }

    fn count(&self, pred: impl Fn(&RecordOutcome) -> bool) -> usize {
        self.records.iter().filter(|r| pred(&r.outcome)).count()
    }
}

impl std::fmt::Display for IngestSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} of {} records loaded", self.accepted, self.total)
    }
}

/// Input accepted by [`Ingestor::ingest`].
#[derive(Debug, Clone, Copy)]
pub enum IngestSource<'a> {
    Csv(&'a [u8]),
    Add(&'a AddDocument),
}

/// Loads records into a store, keeping the full-text index in step.
pub struct Ingestor<'a> {
    store: &'a dyn MaterialStore,
    search: Option<&'a dyn TextSearch>,
}

impl<'a> Ingestor<'a> {
    pub fn new(store: &'a dyn MaterialStore, search: Option<&'a dyn TextSearch>) -> Self {
        Self { store, search }
    }

    /// Ingest either source, summarising the batch.
    pub fn ingest(&self, source: IngestSource<'_>) -> Result<IngestSummary, IngestError> {
        match source {
            IngestSource::Csv(bytes) => self.ingest_csv(bytes),
            IngestSource::Add(document) => {
                let stored = self.ingest_add(document)?;
                Ok(IngestSummary {
                    accepted: stored.len(),
                    total: document.entries.len(),
                    records: Vec::new(),
                })
            }
        }
    }

    /// Derive fields, save, and re-index one material.
    ///
    /// The compound is checked against the store's limits before it is
    /// parsed.
    pub fn persist(&self, material: &mut Material) -> StoreResult<MaterialId> {
        store::check_compound(&material.compound, self.store.max_compound_len())?;
        chem::prepare_for_save(material).map_err(|e| StoreError::InvalidCompound {
            compound: material.compound.clone(),
            reason: e.to_string(),
        })?;
        let id = self.store.save(material)?;
        if let Some(search) = self.search {
            search.index(material);
        }
        Ok(id)
    }

    /// Create a material and its properties with the two-phase save.
    ///
    /// On error the material may already exist without its properties.
    pub fn store_record<'p>(
        &self,
        compound: &str,
        properties: impl IntoIterator<Item = (&'p str, String)>,
    ) -> StoreResult<Material> {
        let mut material = Material::new(compound);
        self.persist(&mut material)?;
        for (name, value) in properties {
            material.add_property(name, value);
        }
        self.persist(&mut material)?;
        Ok(material)
    }

    /// Best-effort CSV load.
    ///
    /// Fields follow RFC 4180 quoting and are trimmed. Only an undecodable
    /// upload or a wrong header aborts; header problems are detected before
    /// any record is touched.
    pub fn ingest_csv(&self, bytes: &[u8]) -> Result<IngestSummary, IngestError> {
        let text = std::str::from_utf8(bytes).map_err(|_| IngestError::BadEncoding)?;
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(text.as_bytes());
        let mut records = reader.records();

        let header_line = || text.lines().next().unwrap_or_default().to_string();
        match records.next() {
            Some(Ok(header)) if header.get(0) == Some(CSV_HEADER_FIELD) => {}
            _ => {
                return Err(IngestError::BadHeader {
                    line: header_line(),
                });
            }
        }

        let mut summary = IngestSummary::default();
        for result in records {
            let record = match result {
                Ok(record) => record,
                Err(e) => {
                    summary.total += 1;
                    let line_no = e.position().map_or(0, |p| p.line() as usize);
                    tracing::warn!(line = line_no, error = %e, "unreadable csv record");
                    summary.records.push(RecordReport {
                        line: line_no,
                        compound: String::new(),
                        outcome: RecordOutcome::Failed {
                            reason: e.to_string(),
                        },
                    });
                    continue;
                }
            };
            let fields: Vec<&str> = record.iter().collect();
            if fields.len() == 1 && fields[0].is_empty() {
                continue;
            }
            summary.total += 1;
            let line_no = record.position().map_or(0, |p| p.line() as usize);
            let compound = fields[0].to_string();

            let outcome = if fields.len() < 2 || fields.len() % 2 == 0 {
                tracing::warn!(line = line_no, fields = fields.len(), "skipping malformed csv record");
                RecordOutcome::Skipped {
                    fields: fields.len(),
                }
            } else {
                let pairs = fields[1..]
                    .chunks_exact(2)
                    .map(|pair| (pair[0], pair[1].to_string()));
                match self.store_record(&compound, pairs) {
                    Ok(material) => {
                        summary.accepted += 1;
                        let id = material.id.map_or(0, MaterialId::get);
                        tracing::debug!(line = line_no, %compound, id, "csv record stored");
                        RecordOutcome::Accepted { id }
                    }
                    Err(e) => {
                        tracing::warn!(line = line_no, %compound, error = %e, "csv record failed");
                        RecordOutcome::Failed {
                            reason: e.to_string(),
                        }
                    }
                }
            };
            summary.records.push(RecordReport {
                line: line_no,
                compound,
                outcome,
            });
        }

        tracing::info!(
            accepted = summary.accepted,
            total = summary.total,
            skipped = summary.skipped(),
            failed = summary.failed(),
            "csv upload processed"
        );
        Ok(summary)
    }

    /// Strict load of a validated `add` document.
    ///
    /// Numeric property values are stored in their JSON spelling.
    pub fn ingest_add(&self, document: &AddDocument) -> Result<Vec<Material>, IngestError> {
        let mut stored = Vec::with_capacity(document.entries.len());
        for entry in &document.entries {
            let pairs = entry
                .properties
                .iter()
                .map(|p| (p.name.as_str(), p.value.canonical()));
            let material = self
                .store_record(&entry.compound, pairs)
                .map_err(|e| IngestError::AddFailed {
                    compound: entry.compound.clone(),
                    message: e.to_string(),
                })?;
            stored.push(material);
        }
        tracing::info!(entries = stored.len(), "add document stored");
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fulltext::TokenIndex;
    use crate::schema::validate_add;
    use crate::store::MemStore;

    #[test]
    fn single_record_upload() {
        let store = MemStore::new();
        let summary = Ingestor::new(&store, None)
            .ingest_csv(b"Chemical formula,p1,1\nH2O,mass,18\n")
            .unwrap();
        assert_eq!((summary.accepted, summary.total), (1, 1));
        assert_eq!(summary.to_string(), "1 of 1 records loaded");

        let stored = &store.execute(&crate::filter::FilterExpr::All).unwrap()[0];
        assert_eq!(stored.compound, "H2O");
        assert_eq!(stored.csv, "H2O,mass,18");
        assert_eq!(stored.elements, "H,O");
        assert_eq!(stored.properties[0].value_float, Some(18.0));
    }

    #[test]
    fn bad_records_are_tallied_not_fatal() {
        let store = MemStore::new();
        let csv = "Chemical formula,a,b\n\
                   H2O,mass,18\n\
                   NaCl,mass\n\
                   KCl\n\
                   Qq2,mass,1\n\
                   \n\
                   TiO2,gap,3.0,structure,rutile\n";
        let summary = Ingestor::new(&store, None).ingest_csv(csv.as_bytes()).unwrap();
        assert_eq!(summary.total, 5);
        assert_eq!(summary.accepted, 2);
        assert_eq!(summary.skipped(), 2);
        assert_eq!(summary.failed(), 1);
        assert_eq!(store.len().unwrap(), 2);
        assert_eq!(
            summary.records[1].outcome,
            RecordOutcome::Skipped { fields: 2 }
        );
        assert_eq!(summary.records[3].line, 5);
    }

    #[test]
    fn header_must_name_chemical_formula() {
        let store = MemStore::new();
        let err = Ingestor::new(&store, None)
            .ingest_csv(b"Formula,a,b\nH2O,mass,18\n")
            .unwrap_err();
        match err {
            IngestError::BadHeader { line } => assert_eq!(line, "Formula,a,b"),
            other => panic!("unexpected {other:?}"),
        }
        assert!(store.is_empty().unwrap());

        assert!(matches!(
            Ingestor::new(&store, None).ingest_csv(b""),
            Err(IngestError::BadHeader { .. })
        ));
    }

    #[test]
    fn undecodable_upload_is_fatal() {
        let store = MemStore::new();
        assert!(matches!(
            Ingestor::new(&store, None).ingest_csv(&[0x43, 0xff, 0xfe]),
            Err(IngestError::BadEncoding)
        ));
    }

    #[test]
    fn crlf_and_bom_are_tolerated() {
        let store = MemStore::new();
        let summary = Ingestor::new(&store, None)
            .ingest_csv("\u{feff}Chemical formula,a,b\r\nH2O,mass,18\r\n".as_bytes())
            .unwrap();
        assert_eq!(summary.accepted, 1);
    }

    #[test]
    fn quoted_fields_are_unquoted() {
        let store = MemStore::new();
        let csv = "Chemical formula,a,b\n\
                   NaCl,structure,\"rock salt, cubic\"\n\
                   \"KCl\",mass,74.5\n";
        let summary = Ingestor::new(&store, None).ingest_csv(csv.as_bytes()).unwrap();
        assert_eq!((summary.accepted, summary.total), (2, 2));

        let all = store.execute(&crate::filter::FilterExpr::All).unwrap();
        assert_eq!(all[0].properties[0].value, "rock salt, cubic");
        assert_eq!(all[1].compound, "KCl");
        assert_eq!(all[1].properties[0].value_float, Some(74.5));
    }

    #[test]
    fn deeply_nested_compound_fails_its_record_only() {
        let store = MemStore::new();
        let csv = format!(
            "Chemical formula,a,b\n{},mass,1\nH2O,mass,18\n",
            "(".repeat(20_000)
        );
        let summary = Ingestor::new(&store, None).ingest_csv(csv.as_bytes()).unwrap();
        assert_eq!((summary.accepted, summary.total), (1, 2));
        assert!(matches!(
            summary.records[0].outcome,
            RecordOutcome::Failed { .. }
        ));

        // Within the length limit, nesting is capped by the parser.
        let csv = format!("Chemical formula,a,b\n{}H,mass,1\n", "(".repeat(60));
        let summary = Ingestor::new(&store, None).ingest_csv(csv.as_bytes()).unwrap();
        match &summary.records[0].outcome {
            RecordOutcome::Failed { reason } => assert!(reason.contains("nested")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn second_save_refreshes_index() {
        let store = MemStore::new();
        let index = TokenIndex::new();
        Ingestor::new(&store, Some(&index))
            .ingest_csv(b"Chemical formula,a,b\nNaCl,structure,halite\n")
            .unwrap();
        assert_eq!(index.raw_search("halite").unwrap().len(), 1);
    }

    #[test]
    fn add_document_is_strict() {
        let store = MemStore::new();
        let doc = validate_add(
            br#"[{"compound":"H2O","properties":[{"propertyName":"mass","propertyValue":18}]},
                 {"compound":"Zz","properties":[{"propertyName":"mass","propertyValue":"1"}]},
                 {"compound":"NaCl","properties":[{"propertyName":"mass","propertyValue":"58.44"}]}]"#,
        )
        .unwrap();
        let err = Ingestor::new(&store, None).ingest_add(&doc).unwrap_err();
        match err {
            IngestError::AddFailed { compound, .. } => assert_eq!(compound, "Zz"),
            other => panic!("unexpected {other:?}"),
        }
        // Entries before the failure were kept.
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn add_document_stores_numbers_as_text() {
        let store = MemStore::new();
        let doc = validate_add(
            br#"[{"compound":"H2O","properties":[{"propertyName":"mass","propertyValue":18}]}]"#,
        )
        .unwrap();
        let summary = Ingestor::new(&store, None)
            .ingest(IngestSource::Add(&doc))
            .unwrap();
        assert_eq!((summary.accepted, summary.total), (1, 1));
        let m = &store.execute(&crate::filter::FilterExpr::All).unwrap()[0];
        assert_eq!(m.properties[0].value, "18");
        assert_eq!(m.properties[0].value_float, Some(18.0));
    }
}
