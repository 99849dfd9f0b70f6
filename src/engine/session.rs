//! Two-dimension adaptive session: self-assessment, dynamic selection and
//! video feedback, driven by an emit/receive protocol.

use std::sync::Arc;

use crate::audit::{AuditEntry, AuditSink};
use crate::bank::{Question, QuestionBank};

use super::config::EngineConfig;
use super::error::EngineError;
use super::mapper::ScaleMapper;
use super::tracker::ScaleTracker;
use super::types::{Dimension, EmitBatch, FinalReport, Phase, ScorePair, ScoredAnswer};

pub struct AdaptiveSession {
    config: EngineConfig,
    mapper: ScaleMapper,
    bank: Arc<QuestionBank>,
    p: ScaleTracker,
    w: ScaleTracker,
    phase: Phase,
    self_assessment_sent: bool,
    dynamic_count: usize,
    previous_dimension: Dimension,
    done: bool,
    audit: Option<Box<dyn AuditSink>>,
}

impl AdaptiveSession {
    pub fn new(bank: Arc<QuestionBank>, config: EngineConfig) -> Result<Self, EngineError> {
        let mapper = ScaleMapper::new(&config.mapper)?;
        let battery_of = |dimension: Dimension| {
            config.battery.unwrap_or_else(|| {
                bank.self_assessment
                    .iter()
                    .filter(|q| q.dimension() == dimension)
                    .count()
            })
        };
        let p = ScaleTracker::new(
            Dimension::P,
            bank.pool(Dimension::P).to_vec(),
            config.batch,
            battery_of(Dimension::P),
        );
        let w = ScaleTracker::new(
            Dimension::W,
            bank.pool(Dimension::W).to_vec(),
            config.batch,
            battery_of(Dimension::W),
        );

        Ok(Self {
            config,
            mapper,
            bank,
            p,
            w,
            phase: Phase::SelfAssessment,
            self_assessment_sent: false,
            dynamic_count: 1,
            // the first dynamic question goes to P
            previous_dimension: Dimension::W,
            done: false,
            audit: None,
        })
    }

    pub fn with_audit(mut self, sink: impl AuditSink + 'static) -> Self {
        self.audit = Some(Box::new(sink));
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn mapper(&self) -> &ScaleMapper {
        &self.mapper
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn dynamic_count(&self) -> usize {
        self.dynamic_count
    }

    pub fn tracker(&self, dimension: Dimension) -> &ScaleTracker {
        match dimension {
            Dimension::P => &self.p,
            Dimension::W => &self.w,
        }
    }

    fn tracker_mut(&mut self, dimension: Dimension) -> &mut ScaleTracker {
        match dimension {
            Dimension::P => &mut self.p,
            Dimension::W => &mut self.w,
        }
    }

    /// Any bank question by id, for presentation.
    pub fn question(&self, id: &str) -> Option<&Question> {
        self.bank.find(id)
    }

    /// Queue every self-assessment item, in bank order, as a single batch.
    pub fn self_assessment_emit(&mut self) -> Result<Vec<String>, EngineError> {
        if self.phase != Phase::SelfAssessment || self.self_assessment_sent {
            return Err(EngineError::PhaseViolation {
                operation: "self_assessment_emit",
                phase: self.phase,
            });
        }
        self.self_assessment_sent = true;

        let bank = Arc::clone(&self.bank);
        let mut ids = Vec::with_capacity(bank.self_assessment.len());
        for q in &bank.self_assessment {
            self.tracker_mut(q.dimension())
                .update_sent(q.id.clone(), q.weight, q.low_bound, q.high_bound);
            ids.push(q.id.clone());
        }
        tracing::info!(questions = ids.len(), "self-assessment emitted");
        Ok(ids)
    }

    /// Apply answers to the most recently emitted batch.
    ///
    /// Returns front-scale scores for video answers and backend scores otherwise.
    pub fn receive(
        &mut self,
        answers: &[f64],
        asked_ids: &[String],
        is_self_assessment: bool,
        is_video: bool,
    ) -> Result<ScorePair, EngineError> {
        if answers.len() != asked_ids.len() {
            return Err(EngineError::AnswerCountMismatch {
                expected: asked_ids.len(),
                actual: answers.len(),
            });
        }
        if is_self_assessment && is_video {
            return Err(EngineError::PhaseViolation {
                operation: "receive",
                phase: self.phase,
            });
        }
        let expected_phase = if is_self_assessment {
            Phase::SelfAssessment
        } else if is_video {
            Phase::VideoFeedback
        } else {
            Phase::Dynamic
        };
        if self.phase != expected_phase {
            return Err(EngineError::PhaseViolation {
                operation: "receive",
                phase: self.phase,
            });
        }

        let mut partitions: [(Dimension, Vec<f64>, Vec<&str>); 2] =
            [(Dimension::P, Vec::new(), Vec::new()), (Dimension::W, Vec::new(), Vec::new())];
        for (&answer, id) in answers.iter().zip(asked_ids) {
            let slot = match Dimension::of_id(id) {
                Dimension::P => 0,
                Dimension::W => 1,
            };
            partitions[slot].1.push(answer);
            partitions[slot].2.push(id.as_str());
        }

        let base = self.config.continuous_base;

        // every partition must line up with its tracker before anything is applied
        for (dimension, dimension_answers, ids) in &partitions {
            let tracker = self.tracker(*dimension);
            tracker.check_answers(dimension_answers, is_video, base)?;
            if let Some((pending, id)) = tracker.outbox().iter().zip(ids).find(|(p, id)| p.id != **id) {
                return Err(EngineError::UnexpectedQuestion {
                    expected: Some(pending.id.clone()),
                    actual: id.to_string(),
                });
            }
        }

        let check_convergence = !is_self_assessment
            && !is_video
            && self.dynamic_count > self.config.convergence.check_after;

        for (dimension, dimension_answers, _) in partitions {
            if dimension_answers.is_empty() {
                continue;
            }
            let scored = self
                .tracker_mut(dimension)
                .update_score(&dimension_answers, is_video, base)?;
            self.record_audit(dimension, &scored);
            if check_convergence {
                let convergence = self.config.convergence.clone();
                self.tracker_mut(dimension).check_convergence(&convergence);
            }
        }

        if is_self_assessment {
            self.phase = Phase::Dynamic;
        } else if is_video {
            self.phase = Phase::Terminal;
        } else {
            self.dynamic_count += 1;
        }

        if is_video {
            Ok(self.front_scores())
        } else {
            Ok(ScorePair {
                p: self.p.score(),
                w: self.w.score(),
            })
        }
    }

    /// Emit at most one dynamic question, alternating dimensions.
    pub fn test_core_emit(&mut self) -> Result<EmitBatch, EngineError> {
        if self.phase != Phase::Dynamic {
            if self.done {
                return Ok(EmitBatch { ids: Vec::new(), done: true });
            }
            return Err(EngineError::PhaseViolation {
                operation: "test_core_emit",
                phase: self.phase,
            });
        }

        self.discard_unanswered("test_core_emit");

        if (self.p.converged() && self.w.converged())
            || self.dynamic_count > 2 * self.config.max_questions
        {
            self.finish_dynamic("converged or question limit reached");
            return Ok(EmitBatch { ids: Vec::new(), done: true });
        }

        let preferred = self.previous_dimension.other();
        let dimension = if self.tracker(preferred).converged() {
            preferred.other()
        } else {
            preferred
        };

        let tracker = self.tracker_mut(dimension);
        let Some(question) = tracker.next_question().and_then(|id| tracker.question_info(&id)) else {
            self.finish_dynamic("question pool exhausted");
            return Ok(EmitBatch { ids: Vec::new(), done: true });
        };
        tracker.update_sent(question.id.clone(), question.weight, question.low_bound, question.high_bound);
        self.previous_dimension = dimension;

        tracing::debug!(
            dimension = dimension.tag(),
            question_id = %question.id,
            dynamic_count = self.dynamic_count,
            "dynamic question emitted"
        );
        Ok(EmitBatch {
            ids: vec![question.id],
            done: false,
        })
    }

    /// Queue one synthetic video item per dimension, bracketing the current score
    /// between the two nearest integer front-scale checkpoints.
    pub fn video_emit(&mut self) -> Result<Vec<String>, EngineError> {
        match self.phase {
            Phase::Dynamic => self.finish_dynamic("video feedback requested"),
            Phase::VideoFeedback => {}
            phase => {
                return Err(EngineError::PhaseViolation {
                    operation: "video_emit",
                    phase,
                })
            }
        }

        self.discard_unanswered("video_emit");

        let checkpoints = self.mapper.checkpoints();
        let weight = self.config.video_weight;
        let mut ids = Vec::with_capacity(2);

        for dimension in [Dimension::P, Dimension::W] {
            let score = self.tracker(dimension).score();
            let (low, high) = bracket(&checkpoints, score);
            let id = format!(
                "Video_{}_{}-{}",
                dimension.tag(),
                self.mapper.back_to_front_value(low),
                self.mapper.back_to_front_value(high)
            );
            self.tracker_mut(dimension).update_sent(id.clone(), weight, low, high);
            ids.push(id);
        }
        tracing::info!(videos = ?ids, "video feedback emitted");
        Ok(ids)
    }

    pub fn front_scores(&self) -> ScorePair {
        ScorePair {
            p: self.mapper.back_to_front_value(self.p.score()),
            w: self.mapper.back_to_front_value(self.w.score()),
        }
    }

    pub fn report(&self) -> FinalReport {
        let front = self.front_scores();
        FinalReport {
            p_score: front.p,
            w_score: front.w,
            p_history: self.p.history().to_vec(),
            w_history: self.w.history().to_vec(),
            p_criteria: self.p.criteria(),
            w_criteria: self.w.criteria(),
            p_converged: self.p.converged(),
            w_converged: self.w.converged(),
            dynamic_questions: self.dynamic_count - 1,
        }
    }

    fn finish_dynamic(&mut self, reason: &'static str) {
        if !self.done {
            tracing::info!(
                reason,
                dynamic_count = self.dynamic_count,
                p_score = self.p.score(),
                w_score = self.w.score(),
                "dynamic phase finished"
            );
        }
        self.done = true;
        self.phase = Phase::VideoFeedback;
    }

    /// A new batch supersedes whatever was sent before it and never answered.
    fn discard_unanswered(&mut self, operation: &'static str) {
        for dimension in [Dimension::P, Dimension::W] {
            let dropped = self.tracker_mut(dimension).discard_sent();
            if dropped > 0 {
                tracing::warn!(
                    operation,
                    dimension = dimension.tag(),
                    dropped,
                    "unanswered questions superseded by a new batch"
                );
            }
        }
    }

    fn record_audit(&mut self, dimension: Dimension, scored: &[ScoredAnswer]) {
        let Some(sink) = self.audit.as_mut() else {
            return;
        };
        let other_score = match dimension {
            Dimension::P => self.w.score(),
            Dimension::W => self.p.score(),
        };
        for s in scored {
            let question_text = match self.bank.find(&s.question_id) {
                Some(q) => q.text.clone(),
                None => s.question_id.clone(),
            };
            let (p_score, w_score) = match dimension {
                Dimension::P => (s.score, other_score),
                Dimension::W => (other_score, s.score),
            };
            sink.record(AuditEntry {
                question_id: s.question_id.clone(),
                question_text,
                low_bound: s.low_bound,
                high_bound: s.high_bound,
                dimension,
                answer: self.mapper.back_to_front_value(s.answer),
                p_score: self.mapper.back_to_front_value(p_score),
                w_score: self.mapper.back_to_front_value(w_score),
            });
        }
    }
}

/// Nearest checkpoint to `score` and its neighbour on the side the score lies,
/// returned ascending. A score exactly on a checkpoint pairs with the next one
/// up, or the one below at the upper edge.
fn bracket(checkpoints: &[f64], score: f64) -> (f64, f64) {
    let last = checkpoints.len() - 1;
    let mut base = 0;
    for (i, cp) in checkpoints.iter().enumerate() {
        if (cp - score).abs() < (checkpoints[base] - score).abs() {
            base = i;
        }
    }

    let other = if score > checkpoints[base] && base < last {
        base + 1
    } else if score < checkpoints[base] && base > 0 {
        base - 1
    } else if base == last {
        base - 1
    } else {
        base + 1
    };

    let (a, b) = (checkpoints[base], checkpoints[other]);
    (a.min(b), a.max(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bracket_between_checkpoints() {
        let cps = [-100.0, -50.0, 50.0, 100.0];
        assert_eq!(bracket(&cps, 10.0), (-50.0, 50.0));
        assert_eq!(bracket(&cps, -60.0), (-100.0, -50.0));
        assert_eq!(bracket(&cps, 70.0), (50.0, 100.0));
    }

    #[test]
    fn test_bracket_on_checkpoint_edges() {
        let cps = [-100.0, -50.0, 50.0, 100.0];
        assert_eq!(bracket(&cps, 100.0), (50.0, 100.0));
        assert_eq!(bracket(&cps, -100.0), (-100.0, -50.0));
        assert_eq!(bracket(&cps, -50.0), (-50.0, 50.0));
    }

    #[test]
    fn test_bracket_outside_range() {
        let cps = [-100.0, -50.0, 50.0, 100.0];
        assert_eq!(bracket(&cps, 130.0), (50.0, 100.0));
        assert_eq!(bracket(&cps, -130.0), (-100.0, -50.0));
    }
}
