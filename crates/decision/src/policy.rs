//! Three-way decision policy: turns scored pairs into AUTO-DUP / REVIEW /
//! AUTO-KEEP decisions, applying safety gates ahead of the threshold test.
use std::collections::BTreeMap;
use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use tracing::instrument;

use srdedupe_model::CanonicalRecord;

use crate::error::DecisionError;
use crate::models::{
    ConformalCalibration, Decision, DecisionSummary, NpCalibration, PairDecision, Reason,
    ReasonCode, Thresholds,
};
use crate::safety_gates::check_safety_gates;

/// Decides a single pair given its posterior, the active thresholds, and
/// any safety-gate reasons already computed for it. Safety-gate reasons
/// always win over the threshold test.
pub fn make_decision(
    p_match: f64,
    thresholds: &Thresholds,
    forced_reasons: &[ReasonCode],
) -> (Decision, Vec<Reason>) {
    if !forced_reasons.is_empty() {
        let reasons = forced_reasons.iter().map(|r| Reason { code: r.as_str().to_string() }).collect();
        return (Decision::Review, reasons);
    }

    if p_match >= thresholds.t_high {
        return (
            Decision::AutoDup,
            vec![Reason { code: "p_above_t_high".to_string() }],
        );
    }
    if p_match < thresholds.t_low {
        return (
            Decision::AutoKeep,
            vec![Reason { code: "p_below_t_low".to_string() }],
        );
    }
    (
        Decision::Review,
        vec![Reason { code: "p_between_thresholds".to_string() }],
    )
}

/// Final `t_high` is `max(t_high_np, t_high_conformal)` when conformal
/// calibration ran, so conformal control can only tighten AUTO-DUP, never
/// loosen it. `None` (infeasible/no threshold) behaves as +infinity:
/// propagates to an infeasible final threshold.
pub fn compute_final_threshold(
    t_high_np: Option<f64>,
    conformal_calibration: Option<&ConformalCalibration>,
) -> (Option<f64>, Option<f64>, Option<f64>) {
    match conformal_calibration {
        None => (t_high_np, t_high_np, None),
        Some(conformal) => {
            let t_high_conformal = conformal.t_high_conformal;
            let final_threshold = match (t_high_np, t_high_conformal) {
                (Some(np), Some(c)) => Some(np.max(c)),
                _ => None,
            };
            (final_threshold, t_high_np, t_high_conformal)
        }
    }
}

#[derive(Debug, Clone, Default)]
struct DecisionCounts {
    auto_dup: u64,
    review: u64,
    auto_keep: u64,
}

impl DecisionCounts {
    fn record(&mut self, decision: Decision) {
        match decision {
            Decision::AutoDup => self.auto_dup += 1,
            Decision::Review => self.review += 1,
            Decision::AutoKeep => self.auto_keep += 1,
        }
    }
}

/// Reads `pair_scores.jsonl`, applies safety gates and thresholds to every
/// pair, and writes deterministic `pair_decisions.jsonl`.
#[instrument(skip(records, np_calibration, conformal_calibration), fields(records = records.len()))]
pub fn make_pair_decisions(
    pair_scores_path: &Path,
    records: &[CanonicalRecord],
    thresholds: &Thresholds,
    np_calibration: &NpCalibration,
    output_path: &Path,
    conformal_calibration: Option<&ConformalCalibration>,
) -> Result<DecisionSummary, DecisionError> {
    let record_index: BTreeMap<&str, &CanonicalRecord> =
        records.iter().map(|r| (r.rid.as_str(), r)).collect();

    let file = fs::File::open(pair_scores_path).map_err(|e| DecisionError::Io {
        path: pair_scores_path.display().to_string(),
        message: e.to_string(),
    })?;
    let reader = BufReader::new(file);

    let mut decision_counts = DecisionCounts::default();
    let mut forced_conflicting_ids = 0u64;
    let mut forced_special_records = 0u64;
    let mut forced_data_quality = 0u64;
    let mut pairs_in = 0u64;
    let mut pair_decisions = Vec::new();

    for line in reader.lines() {
        let line = line.map_err(|e| DecisionError::Io {
            path: pair_scores_path.display().to_string(),
            message: e.to_string(),
        })?;
        if line.trim().is_empty() {
            continue;
        }
        let data: serde_json::Value =
            serde_json::from_str(&line).map_err(|e| DecisionError::MalformedPairScore {
                message: e.to_string(),
            })?;
        pairs_in += 1;

        let pair_id = data["pair_id"].as_str().unwrap_or_default().to_string();
        let rid_a = data["rid_a"].as_str().unwrap_or_default().to_string();
        let rid_b = data["rid_b"].as_str().unwrap_or_default().to_string();
        let p_match = data["p_match"].as_f64().unwrap_or(0.0);
        let warnings: Vec<String> = data["warnings"]
            .as_array()
            .map(|arr| arr.iter().filter_map(|v| v.as_str().map(String::from)).collect())
            .unwrap_or_default();

        let record_a = record_index.get(rid_a.as_str());
        let record_b = record_index.get(rid_b.as_str());

        let forced_reasons = match (record_a, record_b) {
            (Some(a), Some(b)) => check_safety_gates(a, b, &warnings),
            _ => Vec::new(),
        };

        for reason in &forced_reasons {
            match reason.category() {
                Some("conflicting_ids") => forced_conflicting_ids += 1,
                Some("special_records") => forced_special_records += 1,
                Some("data_quality") => forced_data_quality += 1,
                _ => {}
            }
        }

        let (decision, reasons) = make_decision(p_match, thresholds, &forced_reasons);
        decision_counts.record(decision);

        pair_decisions.push(PairDecision {
            pair_id,
            rid_a,
            rid_b,
            p_match,
            decision,
            thresholds: *thresholds,
            np: np_calibration.clone(),
            reasons,
            warnings,
            conformal: conformal_calibration.cloned(),
        });
    }

    pair_decisions.sort_by(|a, b| a.pair_id.cmp(&b.pair_id));

    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent).map_err(|e| DecisionError::Io {
            path: parent.display().to_string(),
            message: e.to_string(),
        })?;
    }
    let mut file = fs::File::create(output_path).map_err(|e| DecisionError::Io {
        path: output_path.display().to_string(),
        message: e.to_string(),
    })?;
    for pd in &pair_decisions {
        let line = srdedupe_model::jsonl::to_sorted_line(pd).map_err(|e| DecisionError::Io {
            path: output_path.display().to_string(),
            message: e.to_string(),
        })?;
        writeln!(file, "{line}").map_err(|e| DecisionError::Io {
            path: output_path.display().to_string(),
            message: e.to_string(),
        })?;
    }

    Ok(DecisionSummary {
        pairs_in,
        auto_dup: decision_counts.auto_dup,
        review: decision_counts.review,
        auto_keep: decision_counts.auto_keep,
        forced_review_conflicting_ids: forced_conflicting_ids,
        forced_review_special_records: forced_special_records,
        forced_review_data_quality: forced_data_quality,
        estimated_fpr_at_t_high: np_calibration.estimated_fpr,
        alpha: np_calibration.alpha,
        thresholds: *thresholds,
    })
}

/// Writes a pretty-printed, sorted-key summary document.
pub fn write_decision_summary(summary: &DecisionSummary, output_path: &Path) -> Result<(), DecisionError> {
    write_pretty_json(summary, output_path)
}

/// Writes a pretty-printed, sorted-key conformal calibration report.
pub fn write_conformal_calibration_report(
    conformal: &ConformalCalibration,
    output_path: &Path,
) -> Result<(), DecisionError> {
    write_pretty_json(conformal, output_path)
}

fn write_pretty_json<T: serde::Serialize>(value: &T, output_path: &Path) -> Result<(), DecisionError> {
    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent).map_err(|e| DecisionError::Io {
            path: parent.display().to_string(),
            message: e.to_string(),
        })?;
    }
    let as_value = serde_json::to_value(value).map_err(|e| DecisionError::Io {
        path: output_path.display().to_string(),
        message: e.to_string(),
    })?;
    let text = serde_json::to_string_pretty(&as_value).map_err(|e| DecisionError::Io {
        path: output_path.display().to_string(),
        message: e.to_string(),
    })?;
    fs::write(output_path, text).map_err(|e| DecisionError::Io {
        path: output_path.display().to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ConfusionMatrix;

    fn thresholds() -> Thresholds {
        Thresholds { t_high: 0.9, t_low: 0.1, t_high_np: Some(0.9), t_high_conformal: None }
    }

    #[test]
    fn above_t_high_is_auto_dup() {
        let (d, _) = make_decision(0.95, &thresholds(), &[]);
        assert_eq!(d, Decision::AutoDup);
    }

    #[test]
    fn below_t_low_is_auto_keep() {
        let (d, _) = make_decision(0.05, &thresholds(), &[]);
        assert_eq!(d, Decision::AutoKeep);
    }

    #[test]
    fn between_thresholds_is_review() {
        let (d, reasons) = make_decision(0.5, &thresholds(), &[]);
        assert_eq!(d, Decision::Review);
        assert_eq!(reasons[0].code, "p_between_thresholds");
    }

    #[test]
    fn forced_reasons_override_high_score() {
        let (d, reasons) = make_decision(0.99, &thresholds(), &[ReasonCode::ForcedReviewConflictingDoi]);
        assert_eq!(d, Decision::Review);
        assert_eq!(reasons[0].code, "forced_review_conflicting_doi");
    }

    #[test]
    fn final_threshold_is_max_of_np_and_conformal() {
        let conformal = ConformalCalibration {
            method: "scrc_i".to_string(),
            alpha: 0.01,
            delta: 0.05,
            n_calib: 500,
            score_field: "p_match".to_string(),
            t_high_conformal: Some(0.95),
            xi_hat: 0.1,
            xi_lcb: 0.08,
            feasible: true,
            n_thresholds_checked: 50,
            confusion_matrix: ConfusionMatrix { tp: 1, fp: 0, tn: 1, fn_: 0 },
        };
        let (final_t, np, c) = compute_final_threshold(Some(0.9), Some(&conformal));
        assert_eq!(final_t, Some(0.95));
        assert_eq!(np, Some(0.9));
        assert_eq!(c, Some(0.95));
    }

    #[test]
    fn final_threshold_is_infeasible_when_np_is_infeasible() {
        let (final_t, _, _) = compute_final_threshold(None, None);
        assert!(final_t.is_none());
    }
}
