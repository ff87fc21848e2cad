//! Neyman-Pearson empirical FPR calibration: the most permissive threshold
//! such that empirical FPR(threshold) <= alpha.
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::instrument;

use crate::error::DecisionError;
use crate::models::{CalibrationPair, ConfusionMatrix, NpCalibration};

pub const DEFAULT_MIN_CALIBRATION_PAIRS: usize = 200;

/// Calibrates the NP threshold. Returns `None` when no threshold keeps FPR
/// within `alpha` (everything would be rejected).
#[instrument(skip(calibration_pairs), fields(n = calibration_pairs.len()))]
pub fn calibrate_np_threshold(
    calibration_pairs: &[CalibrationPair],
    alpha: f64,
    calibration_set_id: &str,
    min_calibration_pairs: usize,
) -> Result<(Option<f64>, NpCalibration), DecisionError> {
    if calibration_pairs.is_empty() {
        return Err(DecisionError::EmptyCalibrationSet);
    }
    if calibration_pairs.len() < min_calibration_pairs {
        return Err(DecisionError::CalibrationSetTooSmall {
            found: calibration_pairs.len(),
            minimum: min_calibration_pairs,
        });
    }

    let total_positives = calibration_pairs.iter().filter(|p| p.is_duplicate).count();
    let total_negatives = calibration_pairs.len() - total_positives;
    let n = calibration_pairs.len();

    if total_negatives == 0 {
        let lowest = calibration_pairs.iter().map(|p| p.score).fold(f64::INFINITY, f64::min);
        let cm = ConfusionMatrix { tp: total_positives as u64, fp: 0, tn: 0, fn_: 0 };
        return Ok((
            Some(lowest),
            build_np_calibration(alpha, calibration_set_id, n, 0.0, cm),
        ));
    }

    let mut sorted: Vec<&CalibrationPair> = calibration_pairs.iter().collect();
    sorted.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

    let mut best_threshold: Option<f64> = None;
    let mut best_fpr = 0.0;
    let mut best_tp = 0u64;
    let mut best_fp = 0u64;

    let mut running_tp = 0u64;
    let mut running_fp = 0u64;
    let mut i = 0;

    while i < n {
        let current_score = sorted[i].score;
        while i < n && sorted[i].score == current_score {
            if sorted[i].is_duplicate {
                running_tp += 1;
            } else {
                running_fp += 1;
            }
            i += 1;
        }

        let fpr = running_fp as f64 / total_negatives as f64;

        if fpr <= alpha {
            best_threshold = Some(current_score);
            best_fpr = fpr;
            best_tp = running_tp;
            best_fp = running_fp;
        } else {
            break;
        }
    }

    let Some(threshold) = best_threshold else {
        let cm = ConfusionMatrix {
            tp: 0,
            fp: 0,
            tn: total_negatives as u64,
            fn_: total_positives as u64,
        };
        return Ok((None, build_np_calibration(alpha, calibration_set_id, n, 0.0, cm)));
    };

    let cm = ConfusionMatrix {
        tp: best_tp,
        fp: best_fp,
        tn: total_negatives as u64 - best_fp,
        fn_: total_positives as u64 - best_tp,
    };
    Ok((
        Some(threshold),
        build_np_calibration(alpha, calibration_set_id, n, best_fpr, cm),
    ))
}

fn build_np_calibration(
    alpha: f64,
    calibration_set_id: &str,
    n: usize,
    fpr: f64,
    cm: ConfusionMatrix,
) -> NpCalibration {
    NpCalibration {
        alpha,
        calibration_set: calibration_set_id.to_string(),
        method: "neyman_pearson".to_string(),
        calibration_size: n,
        estimated_fpr: fpr,
        confusion_matrix: cm,
    }
}

/// Loads labeled calibration pairs from a `{pair_id, p_match, is_duplicate}`
/// JSON-Lines file.
pub fn load_calibration_set(path: &Path) -> Result<Vec<CalibrationPair>, DecisionError> {
    let file = fs::File::open(path).map_err(|e| DecisionError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    let reader = BufReader::new(file);

    let mut pairs = Vec::new();
    for (line_num, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| DecisionError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        if line.trim().is_empty() {
            continue;
        }
        let value: serde_json::Value =
            serde_json::from_str(&line).map_err(|e| DecisionError::MalformedCalibrationData {
                line: line_num + 1,
                message: e.to_string(),
            })?;
        let pair_id = value["pair_id"].as_str().ok_or_else(|| DecisionError::MalformedCalibrationData {
            line: line_num + 1,
            message: "missing pair_id".to_string(),
        })?;
        let score = value["p_match"].as_f64().ok_or_else(|| DecisionError::MalformedCalibrationData {
            line: line_num + 1,
            message: "missing p_match".to_string(),
        })?;
        let is_duplicate = value["is_duplicate"].as_bool().ok_or_else(|| {
            DecisionError::MalformedCalibrationData {
                line: line_num + 1,
                message: "missing is_duplicate".to_string(),
            }
        })?;
        pairs.push(CalibrationPair { pair_id: pair_id.to_string(), score, is_duplicate });
    }
    Ok(pairs)
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
        let err = calibrate_np_threshold(&[], 0.01, "cal", DEFAULT_MIN_CALIBRATION_PAIRS).unwrap_err();
        assert!(matches!(err, DecisionError::EmptyCalibrationSet));
    }

    #[test]
    fn too_small_set_is_an_error() {
        let p = pairs(5, 5);
        let err = calibrate_np_threshold(&p, 0.01, "cal", 200).unwrap_err();
        assert!(matches!(err, DecisionError::CalibrationSetTooSmall { .. }));
    }

    #[test]
    fn no_negatives_yields_lowest_score() {
        let p = pairs(200, 0);
        let (threshold, _) = calibrate_np_threshold(&p, 0.01, "cal", 10).unwrap();
        assert!(threshold.is_some());
    }

    #[test]
    fn strictly_separated_scores_find_permissive_threshold() {
        let p = pairs(150, 150);
        let (threshold, cal) = calibrate_np_threshold(&p, 0.01, "cal", 200).unwrap();
        assert!(threshold.is_some());
        assert!(cal.estimated_fpr <= 0.01);
    }

    #[test]
    fn fpr_always_exceeding_alpha_is_infeasible() {
        let mut p = pairs(100, 100);
        for pair in p.iter_mut() {
            pair.score = 0.5;
        }
        let (threshold, _) = calibrate_np_threshold(&p, 0.0, "cal", 200).unwrap();
        assert!(threshold.is_none());
    }
}
