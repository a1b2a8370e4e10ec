//! Rich diagnostic error types for the materials engine.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]` derives,
//! so a rejected request carries an error code and a hint about what to change.
//! Every message names the offending value (compound, operator token, or line).

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type for the materials engine.
#[derive(Debug, Error, Diagnostic)]
pub enum MaterialsError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),
}

impl MaterialsError {
    /// Whether the caller caused this error (bad document, bad operator, bad upload).
    ///
    /// Boundary layers map client errors to 400 and everything else to 500.
    pub fn is_client_error(&self) -> bool {
        match self {
            MaterialsError::Schema(_) | MaterialsError::Compile(_) => true,
            MaterialsError::Ingest(_) => true,
            MaterialsError::Store(StoreError::InvalidCompound { .. }) => true,
            MaterialsError::Store(_) | MaterialsError::Config(_) => false,
        }
    }
}

/// Convenience alias for engine-level results.
pub type MaterialsResult<T> = std::result::Result<T, MaterialsError>;

// ---------------------------------------------------------------------------
// Schema errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum SchemaError {
    #[error("the text you provided is not a json")]
    #[diagnostic(
        code(materials::schema::not_a_document),
        help("The request body must be a single well-formed JSON value.")
    )]
    NotADocument,

    #[error("the json you provided does not conform to the {schema} schema: {reason}")]
    #[diagnostic(
        code(materials::schema::nonconforming),
        help(
            "Check required keys, value types, and that no extra keys are present. \
             Arrays must be non-empty and must not repeat an entry."
        )
    )]
    Nonconforming { schema: String, reason: String },

    #[error("there is no schema corresponding to \"{kind}\"")]
    #[diagnostic(
        code(materials::schema::unknown),
        help("Known schemas are: add, search.")
    )]
    UnknownSchema { kind: String },
}

// ---------------------------------------------------------------------------
// Compile errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum CompileError {
    #[error("unknown search operator \"{token}\" for {target}")]
    #[diagnostic(
        code(materials::compile::unknown_operator),
        help(
            "Recognised operators are eq, ==, =, match, matches, contain, contains, \
             contained, in, >, gt, more, >=, gte, ge, <, lt, less, <=, =<, lte, le."
        )
    )]
    UnknownOperator { token: String, target: String },

    #[error("operator \"{operator}\" is inconsistent with {kind} value \"{value}\"")]
    #[diagnostic(
        code(materials::compile::operator_mismatch),
        help(
            "Textual values accept only equality and containment; numeric values \
             accept equality and ordering comparisons."
        )
    )]
    OperatorMismatch {
        operator: String,
        kind: String,
        value: String,
    },

    #[error("search index out of sync: hit {id} has no stored material")]
    #[diagnostic(
        code(materials::compile::index_out_of_sync),
        help("Rebuild the full-text index from the material store.")
    )]
    IndexOutOfSync { id: u64 },

    #[error("full-text search is disabled, cannot search for \"{term}\"")]
    #[diagnostic(
        code(materials::compile::search_unavailable),
        help("Enable `full_text` in the configuration or drop the search term.")
    )]
    SearchUnavailable { term: String },

    #[error("full-text search failed: {message}")]
    #[diagnostic(code(materials::compile::search))]
    Search { message: String },
}

// ---------------------------------------------------------------------------
// Ingestion errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum IngestError {
    #[error("bad encoding: the uploaded file is not valid UTF-8 text")]
    #[diagnostic(
        code(materials::ingest::bad_encoding),
        help("Re-save the file as UTF-8 encoded CSV.")
    )]
    BadEncoding,

    #[error("bad header: expected a line starting with \"Chemical formula,\", got \"{line}\"")]
    #[diagnostic(
        code(materials::ingest::bad_header),
        help(
            "The first line of the upload must be the column header, whose first \
             field is literally `Chemical formula`."
        )
    )]
    BadHeader { line: String },

    #[error("could not add compound \"{compound}\": {message}")]
    #[diagnostic(
        code(materials::ingest::add_failed),
        help(
            "Entries before this one were already stored; fix the compound and \
             resubmit only the remaining entries."
        )
    )]
    AddFailed { compound: String, message: String },
}

// ---------------------------------------------------------------------------
// Store errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum StoreError {
    #[error("invalid compound \"{compound}\": {reason}")]
    #[diagnostic(
        code(materials::store::invalid_compound),
        help("The compound must be a proper chemical formula such as H2O or Fe2(SO4)3.")
    )]
    InvalidCompound { compound: String, reason: String },

    #[error("redb transaction error: {message}")]
    #[diagnostic(
        code(materials::store::redb),
        help(
            "The embedded database encountered a transaction error. \
             This may indicate corruption; try running with a fresh data directory."
        )
    )]
    Redb { message: String },

    #[error("serialization error: {message}")]
    #[diagnostic(
        code(materials::store::serde),
        help(
            "Failed to encode or decode a stored material. The stored format may \
             have changed between versions; re-upload your data."
        )
    )]
    Serialization { message: String },

    #[error("I/O error: {source}")]
    #[diagnostic(
        code(materials::store::io),
        help("Check that the data directory exists and has correct permissions.")
    )]
    Io {
        #[source]
        source: std::io::Error,
    },
}

// ---------------------------------------------------------------------------
// Formula errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum DeriveError {
    #[error("empty chemical formula")]
    #[diagnostic(code(materials::chem::empty))]
    Empty,

    #[error("unknown element \"{symbol}\" at offset {offset}")]
    #[diagnostic(
        code(materials::chem::unknown_element),
        help("Element symbols are case-sensitive: a capital letter optionally followed by a lower-case one.")
    )]
    UnknownElement { symbol: String, offset: usize },

    #[error("unbalanced bracket at offset {offset}")]
    #[diagnostic(code(materials::chem::unbalanced))]
    Unbalanced { offset: usize },

    #[error("unexpected character '{found}' at offset {offset}")]
    #[diagnostic(code(materials::chem::unexpected))]
    Unexpected { found: char, offset: usize },

    #[error("invalid count \"{count}\" at offset {offset}")]
    #[diagnostic(
        code(materials::chem::bad_count),
        help("Counts must be positive integers or decimals, e.g. Fe2O3 or Li0.5CoO2.")
    )]
    BadCount { count: String, offset: usize },

    #[error("brackets nested deeper than {limit} levels at offset {offset}")]
    #[diagnostic(code(materials::chem::too_deep))]
    TooDeep { limit: usize, offset: usize },
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read config: {path}")]
    #[diagnostic(
        code(materials::config::read),
        help("Ensure the config file exists and is readable.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {message}")]
    #[diagnostic(
        code(materials::config::parse),
        help("Check the TOML syntax in the config file.")
    )]
    Parse { path: String, message: String },

    #[error("failed to write config: {path}")]
    #[diagnostic(code(materials::config::write))]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
