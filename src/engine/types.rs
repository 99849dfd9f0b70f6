use serde::{Deserialize, Serialize};

// ==================== Dimensions & Phases ====================

/// One of the two latent traits estimated by a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dimension {
    P,
    W,
}

impl Dimension {
    /// Question IDs encode membership: anything containing `P` belongs to P.
    pub fn of_id(id: &str) -> Self {
        if id.contains('P') {
            Dimension::P
        } else {
            Dimension::W
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            Dimension::P => "P",
            Dimension::W => "W",
        }
    }

    pub fn other(self) -> Self {
        match self {
            Dimension::P => Dimension::W,
            Dimension::W => Dimension::P,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    SelfAssessment,
    Dynamic,
    VideoFeedback,
    Terminal,
}

// ==================== Scale Values ====================

/// Which numeric range a value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScaleKind {
    Back,
    Front,
}

/// Input/output of the mapper. Shape is preserved across every conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScaleValues {
    Scalar(f64),
    Sequence(Vec<f64>),
}

impl ScaleValues {
    pub fn as_slice(&self) -> &[f64] {
        match self {
            ScaleValues::Scalar(x) => std::slice::from_ref(x),
            ScaleValues::Sequence(xs) => xs,
        }
    }

    pub fn into_vec(self) -> Vec<f64> {
        match self {
            ScaleValues::Scalar(x) => vec![x],
            ScaleValues::Sequence(xs) => xs,
        }
    }

    pub fn map(self, mut f: impl FnMut(f64) -> f64) -> Self {
        match self {
            ScaleValues::Scalar(x) => ScaleValues::Scalar(f(x)),
            ScaleValues::Sequence(xs) => ScaleValues::Sequence(xs.into_iter().map(f).collect()),
        }
    }

    /// `(min, max)` of the contained values, `None` for an empty sequence.
    pub fn extent(&self) -> Option<(f64, f64)> {
        let values = self.as_slice();
        if values.is_empty() {
            return None;
        }
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Some((min, max))
    }
}

impl From<f64> for ScaleValues {
    fn from(x: f64) -> Self {
        ScaleValues::Scalar(x)
    }
}

impl From<Vec<f64>> for ScaleValues {
    fn from(xs: Vec<f64>) -> Self {
        ScaleValues::Sequence(xs)
    }
}

impl From<&[f64]> for ScaleValues {
    fn from(xs: &[f64]) -> Self {
        ScaleValues::Sequence(xs.to_vec())
    }
}

// ==================== Tracker Records ====================

/// A question dispatched to the presentation layer and awaiting its answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingQuestion {
    pub id: String,
    pub weight: f64,
    pub low_bound: f64,
    pub high_bound: f64,
}

/// One answer after conversion to backend units, with the running score it produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredAnswer {
    pub question_id: String,
    pub low_bound: f64,
    pub high_bound: f64,
    pub answer: f64,
    pub score: f64,
}

/// Question index (1-based history length) at which each criterion first held; 0 = never.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CriteriaProgress {
    pub score_delta: usize,
    pub answer_delta: usize,
    pub spread_delta: usize,
}

// ==================== Session Records ====================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmitBatch {
    pub ids: Vec<String>,
    pub done: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScorePair {
    pub p: f64,
    pub w: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalReport {
    /// Front-scale scores.
    pub p_score: f64,
    pub w_score: f64,
    /// Backend-scale score histories, one entry per answer.
    pub p_history: Vec<f64>,
    pub w_history: Vec<f64>,
    pub p_criteria: CriteriaProgress,
    pub w_criteria: CriteriaProgress,
    pub p_converged: bool,
    pub w_converged: bool,
    pub dynamic_questions: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_of_id() {
        assert_eq!(Dimension::of_id("P12"), Dimension::P);
        assert_eq!(Dimension::of_id("SA_P3"), Dimension::P);
        assert_eq!(Dimension::of_id("W7"), Dimension::W);
        assert_eq!(Dimension::of_id("Video_W_2-3"), Dimension::W);
        assert_eq!(Dimension::of_id("p1"), Dimension::W);
    }

    #[test]
    fn test_scale_values_extent() {
        let values = ScaleValues::from(vec![3.0, -1.0, 2.0]);
        assert_eq!(values.extent(), Some((-1.0, 3.0)));
        assert_eq!(ScaleValues::from(Vec::<f64>::new()).extent(), None);
        assert_eq!(ScaleValues::from(5.0).extent(), Some((5.0, 5.0)));
    }

    #[test]
    fn test_scale_values_map_preserves_shape() {
        let scalar = ScaleValues::from(2.0).map(|x| x * 2.0);
        assert_eq!(scalar, ScaleValues::Scalar(4.0));
        let seq = ScaleValues::from(vec![1.0]).map(|x| x + 1.0);
        assert_eq!(seq, ScaleValues::Sequence(vec![2.0]));
    }
}
