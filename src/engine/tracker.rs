//! Per-dimension score tracking, convergence tests and next-question ranking.

use std::collections::{HashSet, VecDeque};

use crate::bank::Question;

use super::config::ConvergenceConfig;
use super::error::EngineError;
use super::mapper::linspace;
use super::types::{CriteriaProgress, Dimension, PendingQuestion, ScoredAnswer};

/// Number of points on the discrete answer scale.
pub const DISCRETE_POINTS: usize = 5;

pub struct ScaleTracker {
    dimension: Dimension,
    questions: Vec<Question>,
    batch: usize,
    battery: usize,
    answered: HashSet<String>,
    pending_next: VecDeque<String>,
    answers: Vec<f64>,
    weights: Vec<f64>,
    score: f64,
    history: Vec<f64>,
    converged: bool,
    criteria: CriteriaProgress,
    outbox: Vec<PendingQuestion>,
}

impl ScaleTracker {
    pub fn new(dimension: Dimension, questions: Vec<Question>, batch: usize, battery: usize) -> Self {
        Self {
            dimension,
            questions,
            batch: batch.max(1),
            battery,
            answered: HashSet::new(),
            pending_next: VecDeque::new(),
            answers: Vec::new(),
            weights: Vec::new(),
            score: 0.0,
            history: Vec::new(),
            converged: false,
            criteria: CriteriaProgress::default(),
            outbox: Vec::new(),
        }
    }

    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn history(&self) -> &[f64] {
        &self.history
    }

    pub fn answers(&self) -> &[f64] {
        &self.answers
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn converged(&self) -> bool {
        self.converged
    }

    pub fn criteria(&self) -> CriteriaProgress {
        self.criteria
    }

    pub fn battery(&self) -> usize {
        self.battery
    }

    pub fn outbox(&self) -> &[PendingQuestion] {
        &self.outbox
    }

    pub fn is_answered(&self, id: &str) -> bool {
        self.answered.contains(id)
    }

    /// Apply received answers, in outbox order, then clear the outbox.
    ///
    /// Discrete answers index five evenly spaced points between the bounds.
    /// Continuous answers in `[0, base]` convert as `low + (answer / base) * high`.
    pub fn update_score(
        &mut self,
        received: &[f64],
        continuous: bool,
        base: f64,
    ) -> Result<Vec<ScoredAnswer>, EngineError> {
        self.check_answers(received, continuous, base)?;

        let outbox = std::mem::take(&mut self.outbox);
        let mut scored = Vec::with_capacity(outbox.len());
        for (pending, &raw) in outbox.into_iter().zip(received) {
            let answer = if continuous {
                pending.low_bound + (raw / base) * pending.high_bound
            } else {
                linspace(pending.low_bound, pending.high_bound, DISCRETE_POINTS)[raw as usize]
            };
            self.answers.push(answer);
            self.weights.push(pending.weight);

            let weighted: f64 = self.answers.iter().zip(&self.weights).map(|(a, w)| a * w).sum();
            let total: f64 = self.weights.iter().sum();
            self.score = weighted / total;
            self.history.push(self.score);

            tracing::debug!(
                dimension = self.dimension.tag(),
                question_id = %pending.id,
                answer,
                score = self.score,
                "answer applied"
            );

            scored.push(ScoredAnswer {
                question_id: pending.id,
                low_bound: pending.low_bound,
                high_bound: pending.high_bound,
                answer,
                score: self.score,
            });
        }
        Ok(scored)
    }

    /// Validate answers against the outbox without applying them.
    pub fn check_answers(&self, received: &[f64], continuous: bool, base: f64) -> Result<(), EngineError> {
        if received.len() != self.outbox.len() {
            return Err(EngineError::AnswerCountMismatch {
                expected: self.outbox.len(),
                actual: received.len(),
            });
        }
        for (pending, &answer) in self.outbox.iter().zip(received) {
            validate_answer(&pending.id, answer, continuous, base)?;
        }
        Ok(())
    }

    /// Best-matching unanswered question, or `None` once the pool is exhausted
    /// (which also marks the tracker converged).
    pub fn next_question(&mut self) -> Option<String> {
        if self.pending_next.is_empty() {
            let mut candidates: Vec<&Question> = self
                .questions
                .iter()
                .filter(|q| !self.answered.contains(&q.id))
                .collect();
            // stable: equal distances keep table order
            candidates.sort_by(|a, b| {
                (a.suitability - self.score)
                    .abs()
                    .total_cmp(&(b.suitability - self.score).abs())
            });

            if candidates.is_empty() {
                if !self.converged {
                    tracing::info!(dimension = self.dimension.tag(), "question pool exhausted");
                }
                self.converged = true;
                return None;
            }
            self.pending_next = candidates
                .into_iter()
                .take(self.batch)
                .map(|q| q.id.clone())
                .collect();
        }
        self.pending_next.pop_front()
    }

    /// Look up a question of this tracker's pool and mark it administered.
    pub fn question_info(&mut self, id: &str) -> Option<Question> {
        let question = self.questions.iter().find(|q| q.id == id)?.clone();
        self.answered.insert(question.id.clone());
        Some(question)
    }

    pub fn update_sent(&mut self, id: impl Into<String>, weight: f64, low_bound: f64, high_bound: f64) {
        self.outbox.push(PendingQuestion {
            id: id.into(),
            weight,
            low_bound,
            high_bound,
        });
    }

    /// Drop a dispatched batch that never got answers. Its pool questions become
    /// selectable again. Returns how many entries were dropped.
    pub fn discard_sent(&mut self) -> usize {
        let stale = std::mem::take(&mut self.outbox);
        for pending in &stale {
            self.answered.remove(&pending.id);
        }
        stale.len()
    }

    /// Run all three criteria; the tracker converges once they hold together.
    pub fn check_convergence(&mut self, config: &ConvergenceConfig) -> bool {
        let score_ok = self.check_score_convergence(config.tolerance, config.relative);
        let answer_ok = self.check_delta_mean(config.delta_mu);
        let spread_ok = self.check_delta_std(config.delta_sigma);

        let index = self.history.len();
        for (holds, slot) in [
            (score_ok, &mut self.criteria.score_delta),
            (answer_ok, &mut self.criteria.answer_delta),
            (spread_ok, &mut self.criteria.spread_delta),
        ] {
            if holds && *slot == 0 {
                *slot = index;
            }
        }

        if score_ok && answer_ok && spread_ok && !self.converged {
            self.converged = true;
            tracing::info!(
                dimension = self.dimension.tag(),
                score = self.score,
                questions = index,
                "score converged"
            );
        }
        self.converged
    }

    /// Change between the last two scores is below `tolerance`.
    pub fn check_score_convergence(&self, tolerance: f64, relative: bool) -> bool {
        let &[.., previous, last] = self.history.as_slice() else {
            return false;
        };
        let mut dev = (last - previous).abs();
        if relative {
            if previous == 0.0 {
                return false;
            }
            dev /= previous.abs();
        }
        dev < tolerance
    }

    /// The last answer lies within `delta` of the score before it.
    pub fn check_delta_mean(&self, delta: f64) -> bool {
        let &[.., previous, _] = self.history.as_slice() else {
            return false;
        };
        match self.answers.last() {
            Some(last) => (last - previous).abs() < delta,
            None => false,
        }
    }

    /// Spread of the battery answers matches the spread of everything after.
    pub fn check_delta_std(&self, delta: f64) -> bool {
        if self.answers.len() <= self.battery {
            return false;
        }
        let (battery, after) = self.answers.split_at(self.battery);
        (population_std(battery) - population_std(after)).abs() < delta
    }
}

fn validate_answer(id: &str, answer: f64, continuous: bool, base: f64) -> Result<(), EngineError> {
    if continuous {
        if !answer.is_finite() || answer < 0.0 || answer > base {
            return Err(EngineError::ContinuousAnswerOutOfRange {
                question_id: id.to_string(),
                value: answer,
                base,
            });
        }
    } else if answer.fract() != 0.0 || !(0.0..DISCRETE_POINTS as f64).contains(&answer) {
        return Err(EngineError::DiscreteAnswerOutOfRange {
            question_id: id.to_string(),
            value: answer,
        });
    }
    Ok(())
}

fn population_std(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    var.sqrt()
}
