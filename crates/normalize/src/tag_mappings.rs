//! Centralized tag mappings for each supported bibliographic format.
//!
//! Adding a new format requires only adding an entry to [`tags_for`].

/// Returns the priority-ordered tag names that carry `field` in
/// `source_format`, or an empty slice if the field has no mapping in that
/// format.
pub fn tags_for(source_format: &str, field: &str) -> &'static [&'static str] {
    let table: &[(&str, &[&str])] = match source_format {
        "ris" => RIS,
        "nbib" | "pubmed" => NBIB,
        "wos" => WOS,
        "bibtex" => BIBTEX,
        "endnote_tagged" => ENDNOTE,
        _ => return &[],
    };
    table
        .iter()
        .find(|(name, _)| *name == field)
        .map(|(_, tags)| *tags)
        .unwrap_or(&[])
}

const RIS: &[(&str, &[&str])] = &[
    ("doi", &["DO", "DI", "M3"]),
    ("doi_url", &["UR", "L1", "L2", "L3", "L4"]),
    ("pmid", &["PM"]),
    ("pmcid", &["PMC"]),
    ("title", &["TI", "T1"]),
    ("author", &["AU", "A1"]),
    ("year", &["PY", "Y1", "DA"]),
    ("journal_full", &["JF", "JO", "T2"]),
    ("journal_abbrev", &["JA", "J1", "J2"]),
    ("volume", &["VL"]),
    ("issue", &["IS"]),
    ("pages_start", &["SP"]),
    ("pages_end", &["EP"]),
    ("abstract", &["AB", "N2"]),
    ("language", &["LA"]),
    ("publication_type", &["TY"]),
];

const NBIB: &[(&str, &[&str])] = &[
    ("doi", &["AID", "LID"]),
    ("doi_url", &["UR"]),
    ("pmid", &["PMID"]),
    ("pmid_aid", &["AID", "LID"]),
    ("pmcid", &["PMC"]),
    ("pmcid_aid", &["AID", "LID"]),
    ("title", &["TI"]),
    ("author", &["AU", "FAU"]),
    ("year", &["DP", "DEP", "DA"]),
    ("journal_full", &["JT"]),
    ("journal_abbrev", &["TA"]),
    ("volume", &["VI"]),
    ("issue", &["IP"]),
    ("pages", &["PG"]),
    ("abstract", &["AB"]),
    ("language", &["LA"]),
    ("publication_type", &["PT"]),
];

const WOS: &[(&str, &[&str])] = &[
    ("doi", &["DI", "D2"]),
    ("pmid", &["PM"]),
    ("title", &["TI"]),
    ("author", &["AU", "AF"]),
    ("year", &["PY"]),
    ("journal_full", &["SO"]),
    ("journal_abbrev", &["J9", "JI"]),
    ("volume", &["VL"]),
    ("issue", &["IS"]),
    ("pages_start", &["BP"]),
    ("pages_end", &["EP"]),
    ("abstract", &["AB"]),
    ("language", &["LA"]),
    ("publication_type", &["DT", "PT"]),
];

const BIBTEX: &[(&str, &[&str])] = &[
    ("doi", &["doi"]),
    ("doi_url", &["url"]),
    ("title", &["title"]),
    ("author", &["author"]),
    ("year", &["year"]),
    ("journal_full", &["journal"]),
    ("journal_abbrev", &["journaltitle", "shortjournal"]),
    ("volume", &["volume"]),
    ("issue", &["number"]),
    ("pages", &["pages"]),
    ("abstract", &["abstract"]),
    ("language", &["language"]),
    ("publication_type", &["__bibtex_entrytype"]),
];

const ENDNOTE: &[(&str, &[&str])] = &[
    ("doi", &["R"]),
    ("doi_url", &["U"]),
    ("pmid", &["M"]),
    ("title", &["T"]),
    ("author", &["A"]),
    ("year", &["D"]),
    ("journal_full", &["J", "B"]),
    ("volume", &["V"]),
    ("issue", &["N"]),
    ("pages", &["P"]),
    ("abstract", &["X"]),
    ("language", &["G"]),
    ("publication_type", &["0"]),
];
