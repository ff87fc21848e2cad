mod doi_exact;
mod minhash_lsh;
mod pmid_exact;
mod rare_tokens;
mod simhash;
mod year_author;
mod year_title;

pub use doi_exact::DoiExactBlocker;
pub use minhash_lsh::MinHashLshTitleBlocker;
pub use pmid_exact::PmidExactBlocker;
pub use rare_tokens::RareTitleTokenBlocker;
pub use simhash::SimHashTitleBlocker;
pub use year_author::YearPm1FirstAuthorBlocker;
pub use year_title::YearPm1TitlePrefixBlocker;
