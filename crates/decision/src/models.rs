//! Data model for the three-way decision policy: decisions, reason codes,
//! thresholds, calibration metadata, and confusion matrices.
use serde::{Deserialize, Serialize};

/// Three-way decision outcome for a pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    #[serde(rename = "AUTO_DUP")]
    AutoDup,
    #[serde(rename = "REVIEW")]
    Review,
    #[serde(rename = "AUTO_KEEP")]
    AutoKeep,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::AutoDup => "AUTO_DUP",
            Decision::Review => "REVIEW",
            Decision::AutoKeep => "AUTO_KEEP",
        }
    }
}

/// Reason codes explaining why a decision was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReasonCode {
    #[serde(rename = "p_above_t_high")]
    PAboveTHigh,
    #[serde(rename = "p_between_thresholds")]
    PBetweenThresholds,
    #[serde(rename = "p_below_t_low")]
    PBelowTLow,
    #[serde(rename = "forced_review_conflicting_doi")]
    ForcedReviewConflictingDoi,
    #[serde(rename = "forced_review_conflicting_pmid")]
    ForcedReviewConflictingPmid,
    #[serde(rename = "forced_review_title_truncated")]
    ForcedReviewTitleTruncated,
    #[serde(rename = "forced_review_pages_unreliable")]
    ForcedReviewPagesUnreliable,
    #[serde(rename = "forced_review_erratum_notice")]
    ForcedReviewErratumNotice,
    #[serde(rename = "forced_review_retraction_notice")]
    ForcedReviewRetractionNotice,
    #[serde(rename = "forced_review_corrected_republished")]
    ForcedReviewCorrectedRepublished,
    #[serde(rename = "forced_review_linked_citation")]
    ForcedReviewLinkedCitation,
}

impl ReasonCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReasonCode::PAboveTHigh => "p_above_t_high",
            ReasonCode::PBetweenThresholds => "p_between_thresholds",
            ReasonCode::PBelowTLow => "p_below_t_low",
            ReasonCode::ForcedReviewConflictingDoi => "forced_review_conflicting_doi",
            ReasonCode::ForcedReviewConflictingPmid => "forced_review_conflicting_pmid",
            ReasonCode::ForcedReviewTitleTruncated => "forced_review_title_truncated",
            ReasonCode::ForcedReviewPagesUnreliable => "forced_review_pages_unreliable",
            ReasonCode::ForcedReviewErratumNotice => "forced_review_erratum_notice",
            ReasonCode::ForcedReviewRetractionNotice => "forced_review_retraction_notice",
            ReasonCode::ForcedReviewCorrectedRepublished => "forced_review_corrected_republished",
            ReasonCode::ForcedReviewLinkedCitation => "forced_review_linked_citation",
        }
    }

    /// The forced-review category this reason belongs to, if any.
    pub fn category(&self) -> Option<&'static str> {
        match self {
            ReasonCode::ForcedReviewConflictingDoi | ReasonCode::ForcedReviewConflictingPmid => {
                Some("conflicting_ids")
            }
            ReasonCode::ForcedReviewErratumNotice
            | ReasonCode::ForcedReviewRetractionNotice
            | ReasonCode::ForcedReviewCorrectedRepublished
            | ReasonCode::ForcedReviewLinkedCitation => Some("special_records"),
            ReasonCode::ForcedReviewTitleTruncated | ReasonCode::ForcedReviewPagesUnreliable => {
                Some("data_quality")
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub tp: u64,
    pub fp: u64,
    pub tn: u64,
    #[serde(rename = "fn")]
    pub fn_: u64,
}

/// Decision thresholds. `t_high_np`/`t_high_conformal` are `None` both when
/// a calibration stage was skipped and when it ran but found no feasible
/// threshold (everything rejected) — JSON has no finite representation of
/// the `+inf` sentinel the math otherwise produces, so infeasibility is
/// modelled as absence rather than an unrepresentable float.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Thresholds {
    pub t_high: f64,
    pub t_low: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub t_high_np: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub t_high_conformal: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NpCalibration {
    pub alpha: f64,
    pub calibration_set: String,
    pub method: String,
    pub calibration_size: usize,
    pub estimated_fpr: f64,
    pub confusion_matrix: ConfusionMatrix,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConformalCalibration {
    pub method: String,
    pub alpha: f64,
    pub delta: f64,
    pub n_calib: usize,
    pub score_field: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub t_high_conformal: Option<f64>,
    pub xi_hat: f64,
    pub xi_lcb: f64,
    pub feasible: bool,
    pub n_thresholds_checked: usize,
    pub confusion_matrix: ConfusionMatrix,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationPair {
    pub pair_id: String,
    pub score: f64,
    pub is_duplicate: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reason {
    pub code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairDecision {
    pub pair_id: String,
    pub rid_a: String,
    pub rid_b: String,
    pub p_match: f64,
    pub decision: Decision,
    pub thresholds: Thresholds,
    pub np: NpCalibration,
    pub reasons: Vec<Reason>,
    pub warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conformal: Option<ConformalCalibration>,
}

#[derive(Debug, Clone, Default)]
pub struct ForcedReviewCounts {
    pub conflicting_ids: u64,
    pub special_records: u64,
    pub data_quality: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionSummary {
    pub pairs_in: u64,
    pub auto_dup: u64,
    pub review: u64,
    pub auto_keep: u64,
    pub forced_review_conflicting_ids: u64,
    pub forced_review_special_records: u64,
    pub forced_review_data_quality: u64,
    pub estimated_fpr_at_t_high: f64,
    pub alpha: f64,
    pub thresholds: Thresholds,
}
