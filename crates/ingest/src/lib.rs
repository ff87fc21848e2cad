//! Format-sniffing and per-format parsers for bibliographic export files.
//!
//! ## Supported formats
//!
//! - **RIS** (`.ris`) — two-letter field tags, `TY`/`ER` delimited records.
//! - **PubMed/MEDLINE** (`.nbib`, `.txt`) — 2-4 char tags, indentation-based
//!   continuation.
//! - **BibTeX** (`.bib`) — `@type{key, field = value, ...}` entries.
//! - **Web of Science / ISI** (`.ciw`) — `PT`/`ER` delimited, space-joined
//!   continuation values.
//! - **EndNote Tagged** (`.enw`) — `%X ` single-character tags, blank-line
//!   delimited records.
//!
//! Every parser turns a file's lines into [`srdedupe_model::CanonicalRecord`]s
//! with empty `canon`/`keys`/`flags` — normalization is the next stage's
//! job. [`ingest_file`] and [`ingest_folder`] are the entry points; the
//! per-format `parse_*` functions are exposed for callers that already
//! know a file's format and want to skip sniffing.

mod base;
mod bibtex;
mod endnote;
mod error;
mod ingestion;
mod pubmed;
mod ris;
mod wos;

pub use base::{
    detect_encoding, format_for_extension, sniff_format, FileContext, ParseResult,
    SUPPORTED_EXTENSIONS,
};
pub use bibtex::parse_bibtex;
pub use endnote::parse_endnote;
pub use error::IngestError;
pub use ingestion::{
    ingest_file, ingest_folder, FileIngestionResult, IngestionReport, INGESTION_VERSION,
};
pub use pubmed::parse_pubmed;
pub use ris::parse_ris;
pub use wos::parse_wos;
