//! Question repository consumed by the engine.
//!
//! Banks are plain JSON documents with three question sets. Field values may
//! be authored on either scale; [`QuestionBank::normalize_scales`] detects
//! front-scale columns and converts them to backend units.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::{Dimension, ScaleKind, ScaleMapper};

#[derive(Debug, Error)]
pub enum BankError {
    #[error("failed to read question bank: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid question bank JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("duplicate question id: {0}")]
    DuplicateId(String),
    #[error("question {id} has invalid weight {weight}")]
    InvalidWeight { id: String, weight: f64 },
    #[error("question {id} has a non-finite {field}")]
    NonFinite { id: String, field: &'static str },
    #[error("question {id} is declared {declared:?} but its id routes to {routed:?}")]
    DimensionMismatch {
        id: String,
        declared: Dimension,
        routed: Dimension,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    #[serde(default)]
    pub text: String,
    pub weight: f64,
    /// Score level this question discriminates best (backend units once normalized).
    pub suitability: f64,
    /// Backend value of the most extreme "disagree" answer.
    pub low_bound: f64,
    /// Backend value of the most extreme "agree" answer.
    pub high_bound: f64,
    /// Declared scale affiliation; self-assessment items carry one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimension: Option<Dimension>,
}

impl Question {
    pub fn dimension(&self) -> Dimension {
        self.dimension.unwrap_or_else(|| Dimension::of_id(&self.id))
    }
}

#[derive(Debug, Clone, Copy)]
enum Field {
    Suitability,
    LowBound,
    HighBound,
}

impl Field {
    const ALL: [Field; 3] = [Field::Suitability, Field::LowBound, Field::HighBound];

    fn get(self, q: &Question) -> f64 {
        match self {
            Field::Suitability => q.suitability,
            Field::LowBound => q.low_bound,
            Field::HighBound => q.high_bound,
        }
    }

    fn set(self, q: &mut Question, value: f64) {
        match self {
            Field::Suitability => q.suitability = value,
            Field::LowBound => q.low_bound = value,
            Field::HighBound => q.high_bound = value,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Field::Suitability => "suitability",
            Field::LowBound => "lowBound",
            Field::HighBound => "highBound",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionBank {
    #[serde(default)]
    pub self_assessment: Vec<Question>,
    #[serde(default)]
    pub p: Vec<Question>,
    #[serde(default)]
    pub w: Vec<Question>,
}

impl QuestionBank {
    pub fn from_json_str(json: &str) -> Result<Self, BankError> {
        let bank: Self = serde_json::from_str(json)?;
        bank.validate()?;
        Ok(bank)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, BankError> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let bank = Self::from_json_str(&raw)?;
        tracing::info!(
            path = %path.as_ref().display(),
            self_assessment = bank.self_assessment.len(),
            p = bank.p.len(),
            w = bank.w.len(),
            "question bank loaded"
        );
        Ok(bank)
    }

    /// Dynamic-phase pool for a dimension, in table order.
    pub fn pool(&self, dimension: Dimension) -> &[Question] {
        match dimension {
            Dimension::P => &self.p,
            Dimension::W => &self.w,
        }
    }

    pub fn find(&self, id: &str) -> Option<&Question> {
        self.self_assessment
            .iter()
            .chain(self.p.iter())
            .chain(self.w.iter())
            .find(|q| q.id == id)
    }

    pub fn validate(&self) -> Result<(), BankError> {
        let mut seen = HashSet::new();
        let sets = [
            (&self.self_assessment, None),
            (&self.p, Some(Dimension::P)),
            (&self.w, Some(Dimension::W)),
        ];

        for (questions, pool_dimension) in sets {
            for q in questions.iter() {
                if !seen.insert(q.id.as_str()) {
                    return Err(BankError::DuplicateId(q.id.clone()));
                }
                if !q.weight.is_finite() || q.weight <= 0.0 {
                    return Err(BankError::InvalidWeight {
                        id: q.id.clone(),
                        weight: q.weight,
                    });
                }
                for field in Field::ALL {
                    if !field.get(q).is_finite() {
                        return Err(BankError::NonFinite {
                            id: q.id.clone(),
                            field: field.name(),
                        });
                    }
                }

                let routed = Dimension::of_id(&q.id);
                if let Some(declared) = q.dimension.or(pool_dimension) {
                    if declared != routed {
                        return Err(BankError::DimensionMismatch {
                            id: q.id.clone(),
                            declared,
                            routed,
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// Convert every field column that looks front-scale into backend units.
    /// Ambiguous columns are left as authored.
    pub fn normalize_scales(&mut self, mapper: &ScaleMapper) {
        for questions in [&mut self.self_assessment, &mut self.p, &mut self.w] {
            if questions.is_empty() {
                continue;
            }
            for field in Field::ALL {
                let column: Vec<f64> = questions.iter().map(|q| field.get(q)).collect();
                if mapper.which_scale(column.clone()) != Some(ScaleKind::Front) {
                    continue;
                }
                let converted = mapper.front_to_back(column).into_vec();
                for (q, value) in questions.iter_mut().zip(converted) {
                    field.set(q, value);
                }
                tracing::debug!(field = field.name(), "front-scale column converted to back scale");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(id: &str, suitability: f64, low: f64, high: f64) -> Question {
        Question {
            id: id.to_string(),
            text: format!("text of {id}"),
            weight: 1.0,
            suitability,
            low_bound: low,
            high_bound: high,
            dimension: None,
        }
    }

    #[test]
    fn test_parse_and_validate() {
        let json = r#"{
            "selfAssessment": [
                {"id": "SA1", "weight": 2, "suitability": 0, "lowBound": -100, "highBound": 100, "dimension": "W"}
            ],
            "p": [{"id": "P1", "text": "q", "weight": 1, "suitability": 10, "lowBound": -80, "highBound": 80}],
            "w": []
        }"#;
        let bank = QuestionBank::from_json_str(json).unwrap();
        assert_eq!(bank.self_assessment[0].dimension(), Dimension::W);
        assert_eq!(bank.p[0].dimension(), Dimension::P);
        assert!(bank.find("P1").is_some());
        assert!(bank.find("SA1").is_some());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let bank = QuestionBank {
            p: vec![question("P1", 0.0, -1.0, 1.0), question("P1", 0.0, -1.0, 1.0)],
            ..Default::default()
        };
        assert!(matches!(bank.validate(), Err(BankError::DuplicateId(id)) if id == "P1"));
    }

    #[test]
    fn test_non_positive_weight_rejected() {
        let mut q = question("P1", 0.0, -1.0, 1.0);
        q.weight = 0.0;
        let bank = QuestionBank {
            p: vec![q],
            ..Default::default()
        };
        assert!(matches!(bank.validate(), Err(BankError::InvalidWeight { .. })));
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let bank = QuestionBank {
            w: vec![question("P9", 0.0, -1.0, 1.0)],
            ..Default::default()
        };
        assert!(matches!(
            bank.validate(),
            Err(BankError::DimensionMismatch { declared: Dimension::W, routed: Dimension::P, .. })
        ));

        let mut sa = question("SA_W1", 0.0, -1.0, 1.0);
        sa.dimension = Some(Dimension::P);
        let bank = QuestionBank {
            self_assessment: vec![sa],
            ..Default::default()
        };
        assert!(matches!(bank.validate(), Err(BankError::DimensionMismatch { .. })));
    }

    #[test]
    fn test_normalize_converts_front_columns_only() {
        let mapper = ScaleMapper::default();
        let mut bank = QuestionBank {
            p: vec![question("P1", 1.0, -100.0, 100.0), question("P2", 4.0, -50.0, 50.0)],
            ..Default::default()
        };
        bank.normalize_scales(&mapper);

        // suitability column [1, 4] is front scale
        assert!((bank.p[0].suitability + 100.0).abs() < 1e-9);
        assert!((bank.p[1].suitability - 100.0).abs() < 1e-9);
        // bound columns straddle both ranges and stay as authored
        assert_eq!(bank.p[0].low_bound, -100.0);
        assert_eq!(bank.p[1].high_bound, 50.0);
    }
}
