//! Three-way decision policy: turns pairwise scores into AUTO-DUP / REVIEW /
//! AUTO-KEEP decisions under statistical false-positive-rate control.
//!
//! [`np_calibration`] finds the most permissive score threshold whose
//! empirical FPR on a labeled calibration set stays within `alpha`.
//! [`conformal_calibration`] tightens that threshold with a distribution-free
//! SCRC-I bound when enabled. [`safety_gates`] forces REVIEW on conflicting
//! IDs, special-record flags, and data-quality warnings regardless of score.
//! [`policy`] ties all three together into the `pair_decisions.jsonl` stage.

pub mod conformal_calibration;
pub mod error;
pub mod models;
pub mod np_calibration;
pub mod policy;
pub mod safety_gates;

pub use conformal_calibration::calibrate_conformal_threshold;
pub use error::DecisionError;
pub use models::{
    CalibrationPair, ConfusionMatrix, ConformalCalibration, Decision, DecisionSummary,
    ForcedReviewCounts, NpCalibration, PairDecision, Reason, ReasonCode, Thresholds,
};
pub use np_calibration::{calibrate_np_threshold, load_calibration_set, DEFAULT_MIN_CALIBRATION_PAIRS};
pub use policy::{
    compute_final_threshold, make_decision, make_pair_decisions, write_conformal_calibration_report,
    write_decision_summary,
};
pub use safety_gates::check_safety_gates;
