//! Fellegi-Sunter model configuration, loading, and LLR/posterior math.
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ScoringError;

/// Numerically stable sigmoid: avoids overflow in `exp(-x)` for large
/// negative `x` by evaluating `exp(x) / (1 + exp(x))` on that branch.
pub fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let exp_x = x.exp();
        exp_x / (1.0 + exp_x)
    }
}

/// Inverse of [`sigmoid`]. `p` must lie in the open interval (0, 1).
pub fn logit(p: f64) -> Option<f64> {
    if p <= 0.0 || p >= 1.0 {
        return None;
    }
    Some((p / (1.0 - p)).ln())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMeta {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelWeight {
    pub name: String,
    pub weight: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldModelConfig {
    pub levels: Vec<LevelWeight>,
}

/// On-disk shape of a frozen Fellegi-Sunter model: `{model, lambda_prior,
/// round_decimals, fields: {field_name: {levels: [{name, weight}, ...]}}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FSModelConfig {
    pub model: ModelMeta,
    pub lambda_prior: f64,
    pub round_decimals: u32,
    pub fields: BTreeMap<String, FieldModelConfig>,
}

/// A loaded, ready-to-score Fellegi-Sunter model.
#[derive(Debug, Clone)]
pub struct FSModel {
    pub name: String,
    pub version: String,
    pub round_decimals: u32,
    pub lambda_prior: f64,
    logit_prior: f64,
    field_weights: BTreeMap<String, BTreeMap<String, f64>>,
}

impl FSModel {
    /// Builds a model from a parsed config, caching `logit(lambda_prior)`.
    /// `lambda_prior` must lie in (0, 1); config authors are expected to
    /// supply a sane prior, same as the model this was ported from.
    pub fn new(config: FSModelConfig) -> Self {
        let logit_prior = logit(config.lambda_prior).unwrap_or(0.0);
        let mut field_weights = BTreeMap::new();
        for (field, field_config) in &config.fields {
            let levels = field_config
                .levels
                .iter()
                .map(|l| (l.name.clone(), l.weight))
                .collect();
            field_weights.insert(field.clone(), levels);
        }
        Self {
            name: config.model.name,
            version: config.model.version,
            round_decimals: config.round_decimals,
            lambda_prior: config.lambda_prior,
            logit_prior,
            field_weights,
        }
    }

    pub fn get_weight(&self, field: &str, level: &str) -> Result<f64, ScoringError> {
        self.field_weights
            .get(field)
            .and_then(|levels| levels.get(level))
            .copied()
            .ok_or_else(|| ScoringError::MissingWeight {
                field: field.to_string(),
                level: level.to_string(),
            })
    }

    /// `LLR = logit(lambda_prior) + sum(per-field weights)`.
    pub fn compute_llr(&self, field_levels: &[(String, String)]) -> Result<f64, ScoringError> {
        let mut llr = self.logit_prior;
        for (field, level) in field_levels {
            llr += self.get_weight(field, level)?;
        }
        Ok(llr)
    }

    pub fn compute_p_match(&self, llr: f64) -> f64 {
        sigmoid(llr)
    }

    pub fn round_value(&self, value: f64) -> f64 {
        let factor = 10f64.powi(self.round_decimals as i32);
        (value * factor).round() / factor
    }

    /// Top `top_k` field contributions sorted by `|weight|` descending, ties
    /// broken by field name ascending for determinism across runs.
    pub fn top_contributions(
        &self,
        field_weights: &[(String, String, f64)],
        top_k: usize,
    ) -> Vec<Contribution> {
        let mut sorted: Vec<&(String, String, f64)> = field_weights.iter().collect();
        sorted.sort_by(|a, b| {
            b.2.abs()
                .partial_cmp(&a.2.abs())
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        sorted
            .into_iter()
            .take(top_k)
            .map(|(field, level, weight)| Contribution {
                field: field.clone(),
                level: level.clone(),
                weight: self.round_value(*weight),
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    pub field: String,
    pub level: String,
    pub weight: f64,
}

/// Loads a model from a YAML (or JSON, a YAML subset) file at `path`.
pub fn load_model(path: &Path) -> Result<FSModel, ScoringError> {
    let text = fs::read_to_string(path).map_err(|e| ScoringError::ModelRead {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    let config: FSModelConfig = serde_yaml::from_str(&text).map_err(|e| ScoringError::ModelParse {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    Ok(FSModel::new(config))
}
