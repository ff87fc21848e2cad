//! Field-level merge rules for canonical records.
use std::collections::BTreeSet;

use srdedupe_model::{Canon, CanonicalRecord};

use crate::error::MergeError;
use crate::models::{MergeProvenance, MergeProvenanceField};

/// Merges canonical fields across a cluster's records into one `Canon`,
/// recording per-field provenance. Errors if the cluster carries more than
/// one distinct value for a strong identifier (DOI, PMID, PMCID) — that
/// should have been caught by the clustering consistency gates already.
pub fn merge_canon_fields(
    records: &[CanonicalRecord],
    survivor_rid: &str,
) -> Result<(Canon, MergeProvenance), MergeError> {
    let mut provenance = MergeProvenance::default();
    let survivor = records.iter().find(|r| r.rid == survivor_rid).unwrap_or(&records[0]);

    let (doi_norm, doi_prov) = merge_strong_id(records, "doi_norm", |c| c.doi_norm.as_deref())?;
    let (pmid_norm, pmid_prov) = merge_strong_id(records, "pmid_norm", |c| c.pmid_norm.as_deref())?;
    let (pmcid, pmcid_prov) = merge_strong_id(records, "pmcid", |c| c.pmcid.as_deref())?;
    provenance.fields.insert("doi_norm".to_string(), doi_prov);
    provenance.fields.insert("pmid_norm".to_string(), pmid_prov);
    provenance.fields.insert("pmcid".to_string(), pmcid_prov);

    let (title_record, title_prov) = pick_longest_text_record(records, |c| c.title_raw.as_deref(), survivor_rid);
    let (abstract_record, abstract_prov) =
        pick_longest_text_record(records, |c| c.abstract_raw.as_deref(), survivor_rid);
    provenance.fields.insert("title_raw".to_string(), title_prov);
    provenance.fields.insert("abstract_raw".to_string(), abstract_prov);

    let title_raw = title_record.and_then(|r| r.canon.title_raw.clone());
    let title_norm_basic = title_record.and_then(|r| r.canon.title_norm_basic.clone());
    let abstract_raw = abstract_record.and_then(|r| r.canon.abstract_raw.clone());
    let abstract_norm_basic = abstract_record.and_then(|r| r.canon.abstract_norm_basic.clone());

    let (author_record, author_prov) = pick_best_author_record(records, survivor_rid);
    provenance.fields.insert("authors".to_string(), author_prov);

    let authors_raw = author_record.and_then(|r| r.canon.authors_raw.clone());
    let authors_parsed = author_record.and_then(|r| r.canon.authors_parsed.clone());
    let first_author_sig = author_record.and_then(|r| r.canon.first_author_sig.clone());
    let author_sig_strict = author_record.and_then(|r| r.canon.author_sig_strict.clone());
    let author_sig_loose = author_record.and_then(|r| r.canon.author_sig_loose.clone());

    let (year_norm, year_source, year_prov) = merge_year(records, survivor_rid);
    provenance.fields.insert("year_norm".to_string(), year_prov);

    let (journal_record, journal_prov) = pick_longest_text_record(records, |c| c.journal_full.as_deref(), survivor_rid);
    provenance.fields.insert("journal_full".to_string(), journal_prov);

    let journal_full = journal_record.and_then(|r| r.canon.journal_full.clone());
    let journal_norm = journal_record.and_then(|r| r.canon.journal_norm.clone());

    let (page_record, pages_prov) = pick_best_pagination_record(records, survivor_rid);
    provenance.fields.insert("pages".to_string(), pages_prov);

    let (language, lang_prov) = merge_language(records, survivor_rid);
    let (publication_type, pub_type_prov) = merge_publication_type(records, survivor_rid);
    provenance.fields.insert("language".to_string(), lang_prov);
    provenance.fields.insert("publication_type".to_string(), pub_type_prov);

    let merged_canon = Canon {
        doi: doi_norm.clone(),
        doi_norm: doi_norm.clone(),
        doi_url: doi_norm.as_ref().map(|d| format!("https://doi.org/{d}")),
        pmid: pmid_norm.clone(),
        pmid_norm,
        pmcid,
        title_raw,
        title_norm_basic,
        abstract_raw,
        abstract_norm_basic,
        authors_raw,
        authors_parsed,
        first_author_sig,
        author_sig_strict,
        author_sig_loose,
        year_raw: year_norm.map(|y| y.to_string()),
        year_norm,
        year_source,
        journal_full,
        journal_abbrev: survivor.canon.journal_abbrev.clone(),
        journal_norm,
        volume: page_record.canon.volume.clone(),
        issue: page_record.canon.issue.clone(),
        pages_raw: page_record.canon.pages_raw.clone(),
        pages_norm_long: page_record.canon.pages_norm_long.clone(),
        page_first: page_record.canon.page_first.clone(),
        page_last: page_record.canon.page_last.clone(),
        article_number: page_record.canon.article_number.clone(),
        language,
        publication_type,
    };

    Ok((merged_canon, provenance))
}

fn merge_strong_id(
    records: &[CanonicalRecord],
    field_name: &str,
    accessor: impl Fn(&Canon) -> Option<&str>,
) -> Result<(Option<String>, MergeProvenanceField), MergeError> {
    let values: Vec<(&str, &str)> =
        records.iter().filter_map(|r| accessor(&r.canon).map(|v| (v, r.rid.as_str()))).collect();

    if values.is_empty() {
        return Ok((None, MergeProvenanceField::single("", "no_value_in_cluster")));
    }

    let unique_values: BTreeSet<&str> = values.iter().map(|(v, _)| *v).collect();
    if unique_values.len() > 1 {
        return Err(MergeError::ConflictingStrongId {
            field: field_name.to_string(),
            values: unique_values.into_iter().map(String::from).collect(),
        });
    }

    let (value, rid) = values[0];
    Ok((Some(value.to_string()), MergeProvenanceField::single(rid, "unique_id_in_cluster")))
}

fn pick_longest_text_record<'a>(
    records: &'a [CanonicalRecord],
    accessor: impl Fn(&Canon) -> Option<&str>,
    survivor_rid: &str,
) -> (Option<&'a CanonicalRecord>, MergeProvenanceField) {
    let mut candidates: Vec<(&CanonicalRecord, usize)> = records
        .iter()
        .filter_map(|r| accessor(&r.canon).map(|v| (r, v.len())))
        .collect();

    if candidates.is_empty() {
        return (None, MergeProvenanceField::single(survivor_rid, "no_value_in_cluster"));
    }

    candidates.sort_by(|a, b| {
        b.1.cmp(&a.1)
            .then_with(|| (a.0.rid != survivor_rid).cmp(&(b.0.rid != survivor_rid)))
            .then_with(|| a.0.rid.cmp(&b.0.rid))
    });
    let chosen = candidates[0].0;
    (Some(chosen), MergeProvenanceField::single(chosen.rid.clone(), "prefer_longest_non_null"))
}

fn pick_best_author_record<'a>(
    records: &'a [CanonicalRecord],
    survivor_rid: &str,
) -> (Option<&'a CanonicalRecord>, MergeProvenanceField) {
    let mut candidates: Vec<(&CanonicalRecord, usize)> = records
        .iter()
        .filter_map(|r| r.canon.authors_parsed.as_ref().map(|a| (r, a.len())))
        .filter(|(_, n)| *n > 0)
        .collect();

    if candidates.is_empty() {
        return (None, MergeProvenanceField::single(survivor_rid, "no_authors_in_cluster"));
    }

    candidates.sort_by(|a, b| {
        b.1.cmp(&a.1)
            .then_with(|| (a.0.rid != survivor_rid).cmp(&(b.0.rid != survivor_rid)))
            .then_with(|| a.0.rid.cmp(&b.0.rid))
    });
    let chosen = candidates[0].0;
    (Some(chosen), MergeProvenanceField::single(chosen.rid.clone(), "max_parsed_authors"))
}

fn merge_year(records: &[CanonicalRecord], survivor_rid: &str) -> (Option<i32>, Option<String>, MergeProvenanceField) {
    let years: Vec<(i32, &str)> = records
        .iter()
        .filter_map(|r| r.canon.year_norm.map(|y| (y, r.rid.as_str())))
        .collect();

    if years.is_empty() {
        return (None, None, MergeProvenanceField::single(survivor_rid, "no_year_in_cluster"));
    }

    let mut counts: std::collections::BTreeMap<i32, u32> = std::collections::BTreeMap::new();
    for (y, _) in &years {
        *counts.entry(*y).or_insert(0) += 1;
    }
    let mode_count = *counts.values().max().unwrap();
    let ties: Vec<i32> = counts.iter().filter(|(_, c)| **c == mode_count).map(|(y, _)| *y).collect();

    let chosen_year = if ties.len() > 1 {
        let survivor_year = years.iter().find(|(_, rid)| *rid == survivor_rid).map(|(y, _)| *y);
        match survivor_year {
            Some(y) if ties.contains(&y) => y,
            _ => *ties.iter().min().unwrap(),
        }
    } else {
        ties[0]
    };

    let chosen_rid = years.iter().find(|(y, _)| *y == chosen_year).map(|(_, rid)| *rid).unwrap();

    (
        Some(chosen_year),
        Some("merge:mode".to_string()),
        MergeProvenanceField::single(chosen_rid, "year_mode"),
    )
}

fn pick_best_pagination_record<'a>(
    records: &'a [CanonicalRecord],
    survivor_rid: &str,
) -> (&'a CanonicalRecord, MergeProvenanceField) {
    let mut candidates: Vec<&CanonicalRecord> = records.iter().collect();
    candidates.sort_by(|a, b| {
        let a_reliable = !a.flags.pages_unreliable;
        let b_reliable = !b.flags.pages_unreliable;
        let a_has_range = a.canon.page_first.is_some() && a.canon.page_last.is_some();
        let b_has_range = b.canon.page_first.is_some() && b.canon.page_last.is_some();

        (!a_reliable)
            .cmp(&(!b_reliable))
            .then_with(|| (!a_has_range).cmp(&(!b_has_range)))
            .then_with(|| (a.rid != survivor_rid).cmp(&(b.rid != survivor_rid)))
            .then_with(|| a.rid.cmp(&b.rid))
    });
    let chosen = candidates[0];
    (chosen, MergeProvenanceField::single(chosen.rid.clone(), "prefer_reliable_pages"))
}

/// `Canon.language` is a single optional string, unlike the original's
/// `str | list[str]` union — merges to the survivor's language if present,
/// else the lexicographically smallest distinct value across the cluster.
fn merge_language(records: &[CanonicalRecord], survivor_rid: &str) -> (Option<String>, MergeProvenanceField) {
    let values: BTreeSet<&str> = records.iter().filter_map(|r| r.canon.language.as_deref()).collect();
    if values.is_empty() {
        return (None, MergeProvenanceField::single(survivor_rid, "no_value_in_cluster"));
    }
    if values.len() == 1 {
        let value = *values.iter().next().unwrap();
        let rid = records
            .iter()
            .find(|r| r.canon.language.as_deref() == Some(value))
            .map(|r| r.rid.clone())
            .unwrap_or_else(|| survivor_rid.to_string());
        return (Some(value.to_string()), MergeProvenanceField::single(rid, "single_value"));
    }

    let survivor_language = records.iter().find(|r| r.rid == survivor_rid).and_then(|r| r.canon.language.as_deref());
    let chosen = survivor_language.filter(|l| values.contains(l)).unwrap_or_else(|| values.iter().next().unwrap());
    (
        Some(chosen.to_string()),
        MergeProvenanceField::single(survivor_rid, "multiple_values_kept_survivor_or_smallest"),
    )
}

fn merge_publication_type(
    records: &[CanonicalRecord],
    survivor_rid: &str,
) -> (Option<Vec<String>>, MergeProvenanceField) {
    let mut seen: BTreeSet<String> = BTreeSet::new();
    let mut values: Vec<String> = Vec::new();
    let mut rids: Vec<String> = Vec::new();

    for record in records {
        let Some(items) = &record.canon.publication_type else { continue };
        for item in items {
            if seen.insert(item.clone()) {
                values.push(item.clone());
                rids.push(record.rid.clone());
            }
        }
    }

    if values.is_empty() {
        return (None, MergeProvenanceField::single(survivor_rid, "no_value_in_cluster"));
    }

    values.sort();
    let rule = if values.len() > 1 { "union_distinct_sorted" } else { "single_value" };
    let from_rid = if rids.len() > 1 { MergeProvenanceField::multiple(rids, rule) } else { MergeProvenanceField::single(rids[0].clone(), rule) };

    (Some(values), from_rid)
}
