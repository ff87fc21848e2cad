//! Orchestrates field normalization, key generation, and flag derivation
//! into a single pass over a canonical record.

use srdedupe_model::{Canon, CanonicalRecord, Provenance};

use crate::fields::{
    extract_other_fields, extract_year, normalize_authors, normalize_doi, normalize_journal,
    normalize_pages, normalize_pmid_pmcid, normalize_title,
};
use crate::flags::generate_flags;
use crate::keys::generate_keys;

/// Populates `canon`, `keys`, `flags`, and `provenance` on a record that
/// has already been ingested. Pure and idempotent: normalizing an
/// already-normalized record yields the same result.
pub fn normalize(record: CanonicalRecord) -> CanonicalRecord {
    let raw_tags = &record.raw.tags;
    let source_format = record.meta.source_format.as_str();

    let mut provenance = Provenance::new();

    let (doi_result, doi_prov) = normalize_doi(raw_tags, source_format);
    provenance.extend(doi_prov);

    let (pmid_result, pmid_prov) = normalize_pmid_pmcid(raw_tags, source_format);
    provenance.extend(pmid_prov);

    let (title_result, title_prov) = normalize_title(raw_tags, source_format);
    provenance.extend(title_prov);

    let (authors_result, authors_prov) = normalize_authors(raw_tags, source_format);
    provenance.extend(authors_prov);

    let (year_result, year_prov) = extract_year(raw_tags, source_format);
    provenance.extend(year_prov);

    let (journal_result, journal_prov) = normalize_journal(raw_tags, source_format);
    provenance.extend(journal_prov);

    let (pages_result, pages_prov) = normalize_pages(raw_tags, source_format);
    provenance.extend(pages_prov);

    let other_fields = extract_other_fields(raw_tags, source_format);

    let keys = generate_keys(
        title_result.norm_basic.as_deref(),
        year_result.norm,
        authors_result.first_sig.as_deref(),
        journal_result.norm.as_deref(),
    );

    let flags = generate_flags(
        doi_result.norm.as_deref(),
        pmid_result.pmid_norm.as_deref(),
        title_result.raw.as_deref(),
        authors_result.parsed.as_deref(),
        year_result.norm,
        pages_result.unreliable,
        other_fields.publication_type.as_deref(),
    );

    let canon = Canon {
        doi: doi_result.raw,
        doi_norm: doi_result.norm,
        doi_url: doi_result.url,
        pmid: pmid_result.pmid_raw,
        pmid_norm: pmid_result.pmid_norm,
        pmcid: pmid_result.pmcid,
        title_raw: title_result.raw,
        title_norm_basic: title_result.norm_basic,
        abstract_raw: other_fields.abstract_raw,
        abstract_norm_basic: other_fields.abstract_norm,
        authors_raw: authors_result.raw,
        authors_parsed: authors_result.parsed,
        first_author_sig: authors_result.first_sig,
        author_sig_strict: authors_result.sig_strict,
        author_sig_loose: authors_result.sig_loose,
        year_raw: year_result.raw,
        year_norm: year_result.norm,
        year_source: year_result.source,
        journal_full: journal_result.full,
        journal_abbrev: journal_result.abbrev,
        journal_norm: journal_result.norm,
        volume: other_fields.volume,
        issue: other_fields.issue,
        pages_raw: pages_result.raw,
        pages_norm_long: pages_result.norm_long,
        page_first: pages_result.first,
        page_last: pages_result.last,
        article_number: pages_result.article_number,
        language: other_fields.language,
        publication_type: other_fields.publication_type,
    };

    CanonicalRecord {
        schema_version: record.schema_version,
        rid: record.rid,
        record_digest: record.record_digest,
        source_digest: record.source_digest,
        meta: record.meta,
        raw: record.raw,
        canon,
        keys,
        flags,
        provenance,
    }
}
