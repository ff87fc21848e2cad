//! Selective Conformal Risk Control (SCRC-I): a distribution-free,
//! high-probability bound on the false-positive rate among AUTO-DUP
//! selections, using a DKW concentration bound.
use tracing::instrument;

use crate::error::DecisionError;
use crate::models::{CalibrationPair, ConformalCalibration, ConfusionMatrix};

/// Runs the SCRC-I calibration sweep over unique scores, descending, and
/// keeps the smallest (most permissive) threshold that remains conformally
/// safe. `score_field` is metadata only — callers choose whether scores are
/// `p_match` or `llr` before building `calibration_pairs`.
#[instrument(skip(calibration_pairs), fields(n = calibration_pairs.len()))]
pub fn calibrate_conformal_threshold(
    calibration_pairs: &[CalibrationPair],
    alpha: f64,
    delta: f64,
    score_field: &str,
) -> Result<ConformalCalibration, DecisionError> {
    if calibration_pairs.is_empty() {
        return Err(DecisionError::EmptyCalibrationSet);
    }
    if !(0.0 < alpha && alpha < 1.0) {
        return Err(DecisionError::InvalidAlpha(alpha));
    }
    if !(0.0 < delta && delta < 1.0) {
        return Err(DecisionError::InvalidDelta(delta));
    }

    let n = calibration_pairs.len();
    let total_positives = calibration_pairs.iter().filter(|p| p.is_duplicate).count();
    let total_negatives = n - total_positives;

    let eps = ((1.0 / (2.0 * n as f64)) * (2.0 / delta).ln()).sqrt();

    let mut sorted: Vec<&CalibrationPair> = calibration_pairs.iter().collect();
    sorted.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

    // f64 isn't Ord, so de-duplicate via a sorted Vec rather than a BTreeSet.
    let mut unique_scores: Vec<f64> = calibration_pairs.iter().map(|p| p.score).collect();
    unique_scores.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
    unique_scores.dedup();

    let mut best_threshold: Option<f64> = None;
    let mut best_xi_hat = 0.0;
    let mut best_xi_lcb = 0.0;
    let mut best_tp = 0u64;
    let mut best_fp = 0u64;
    let mut feasible_found = false;

    let mut running_tp = 0u64;
    let mut running_fp = 0u64;
    let mut pair_idx = 0usize;

    for threshold in &unique_scores {
        while pair_idx < n && sorted[pair_idx].score >= *threshold {
            if sorted[pair_idx].is_duplicate {
                running_tp += 1;
            } else {
                running_fp += 1;
            }
            pair_idx += 1;
        }

        let n_accepted = running_tp + running_fp;
        let xi_hat = n_accepted as f64 / n as f64;
        let xi_lcb = (xi_hat - eps).max(0.0);

        if (n as f64 + 1.0) * alpha * xi_lcb < 1.0 {
            continue;
        }

        let conformal_bound = ((n as f64 + 1.0) * alpha * xi_lcb).ceil() - 1.0;

        if running_fp as f64 <= conformal_bound {
            best_threshold = Some(*threshold);
            best_xi_hat = xi_hat;
            best_xi_lcb = xi_lcb;
            best_tp = running_tp;
            best_fp = running_fp;
            feasible_found = true;
        }
    }

    if !feasible_found {
        let cm = ConfusionMatrix {
            tp: 0,
            fp: 0,
            tn: total_negatives as u64,
            fn_: total_positives as u64,
        };
        return Ok(ConformalCalibration {
            method: "scrc_i".to_string(),
            alpha,
            delta,
            n_calib: n,
            score_field: score_field.to_string(),
            t_high_conformal: None,
            xi_hat: 0.0,
            xi_lcb: 0.0,
            feasible: false,
            n_thresholds_checked: unique_scores.len(),
            confusion_matrix: cm,
        });
    }

    let cm = ConfusionMatrix {
        tp: best_tp,
        fp: best_fp,
        tn: total_negatives as u64 - best_fp,
        fn_: total_positives as u64 - best_tp,
    };
    Ok(ConformalCalibration {
        method: "scrc_i".to_string(),
        alpha,
        delta,
        n_calib: n,
        score_field: score_field.to_string(),
        t_high_conformal: best_threshold,
        xi_hat: best_xi_hat,
        xi_lcb: best_xi_lcb,
        feasible: true,
        n_thresholds_checked: unique_scores.len(),
        confusion_matrix: cm,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(n_pos: usize, n_neg: usize) -> Vec<CalibrationPair> {
        let mut out = Vec::new();
        for i in 0..n_pos {
            out.push(CalibrationPair {
                pair_id: format!("p{i}"),
                score: 0.9 + (i as f64) * 0.0001,
                is_duplicate: true,
            });
        }
        for i in 0..n_neg {
            out.push(CalibrationPair {
                pair_id: format!("n{i}"),
                score: 0.1 + (i as f64) * 0.0001,
                is_duplicate: false,
            });
        }
        out
    }

    #[test]
    fn empty_set_is_an_error() {
        let err = calibrate_conformal_threshold(&[], 0.01, 0.05, "p_match").unwrap_err();
        assert!(matches!(err, DecisionError::EmptyCalibrationSet));
    }

    #[test]
    fn alpha_out_of_range_is_an_error() {
        let p = pairs(5, 5);
        let err = calibrate_conformal_threshold(&p, 1.5, 0.05, "p_match").unwrap_err();
        assert!(matches!(err, DecisionError::InvalidAlpha(_)));
    }

    #[test]
    fn well_separated_scores_are_feasible() {
        let p = pairs(200, 200);
        let cal = calibrate_conformal_threshold(&p, 0.05, 0.05, "p_match").unwrap();
        assert!(cal.feasible);
        assert!(cal.t_high_conformal.is_some());
    }

    #[test]
    fn tiny_calibration_set_can_be_infeasible() {
        let p = pairs(1, 1);
        let cal = calibrate_conformal_threshold(&p, 0.001, 0.05, "p_match").unwrap();
        assert!(!cal.feasible);
        assert!(cal.t_high_conformal.is_none());
    }
}
