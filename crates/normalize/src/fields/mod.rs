//! Per-field normalizers. Each takes the record's raw tags and source
//! format and returns a typed result plus the provenance entries it
//! produced, ready to be folded into the record's provenance map.

mod authors;
mod doi;
mod journal;
mod other;
mod pages;
mod pmid;
mod title;
mod year;

pub use authors::{normalize_authors, AuthorsResult};
pub use doi::{normalize_doi, DoiResult};
pub use journal::{normalize_journal, JournalResult};
pub use other::{extract_other_fields, OtherFieldsResult};
pub use pages::{normalize_pages, PagesResult};
pub use pmid::{normalize_pmid_pmcid, PmidResult};
pub use title::{normalize_title, TitleResult};
pub use year::{extract_year, YearResult};
