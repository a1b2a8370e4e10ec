// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # materials-db
//!
//! Query translation and ingestion engine for a materials database: chemical
//! compounds with arbitrary name/value properties.
//!
//! ## Architecture
//!
//! - **Schema validation** (`schema`): structural checks for `add` and `search` documents
//! - **Query compilation** (`compile`, `operator`, `value`): documents → [`filter::FilterExpr`]
//! - **Ingestion** (`ingest`): best-effort CSV uploads and strict JSON adds
//! - **Derived fields** (`chem`): formula parsing into elements, periods, groups
//! - **Storage** (`store`): in-memory (DashMap) or durable (redb)
//! - **Full-text search** (`fulltext`): inverted index kept in step with each save
//! - **Projection** (`project`): stored materials → external records
//!
//! ## Library usage
//!
//! ```no_run
//! use materials_db::engine::{Engine, EngineConfig};
//!
//! let engine = Engine::new(EngineConfig::default()).unwrap();
//! engine
//!     .upload(b"Chemical formula,property,value\nNaCl,structure,cubic\n")
//!     .unwrap();
//! let hits = engine
//!     .search(br#"{"compound":{"logic":"contains","value":"cl"}}"#, None)
//!     .unwrap();
//! assert_eq!(hits[0].compound, "NaCl");
//! ```

pub mod chem;
pub mod compile;
pub mod config;
pub mod engine;
pub mod error;
pub mod filter;
pub mod fulltext;
pub mod ingest;
pub mod model;
pub mod operator;
pub mod project;
pub mod schema;
pub mod store;
pub mod value;
