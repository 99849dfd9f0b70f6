use thiserror::Error;

use super::types::Phase;

#[derive(Debug, Error, PartialEq)]
pub enum MapperError {
    #[error("front scale needs at least 2 values, got {0}")]
    TooFewFrontValues(usize),
    #[error("invalid {scale} bounds: [{low}, {high}]")]
    InvalidBounds {
        scale: &'static str,
        low: f64,
        high: f64,
    },
}

/// Contract breaches at the session boundary.
#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    #[error(transparent)]
    Mapper(#[from] MapperError),
    #[error("answer count mismatch: expected {expected}, got {actual}")]
    AnswerCountMismatch { expected: usize, actual: usize },
    #[error("discrete answer {value} for {question_id} is not one of 0..=4")]
    DiscreteAnswerOutOfRange { question_id: String, value: f64 },
    #[error("continuous answer {value} for {question_id} is outside [0, {base}]")]
    ContinuousAnswerOutOfRange {
        question_id: String,
        value: f64,
        base: f64,
    },
    #[error("answer for {actual} does not match pending question {expected:?}")]
    UnexpectedQuestion {
        expected: Option<String>,
        actual: String,
    },
    #[error("unknown question: {0}")]
    UnknownQuestion(String),
    #[error("{operation} is not allowed in phase {phase:?}")]
    PhaseViolation {
        operation: &'static str,
        phase: Phase,
    },
}
