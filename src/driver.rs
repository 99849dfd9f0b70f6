//! Drives a session end to end against a respondent, following the same
//! request sequence a web front end would issue.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::bank::Question;
use crate::engine::tracker::DISCRETE_POINTS;
use crate::engine::{AdaptiveSession, Dimension, EngineError, FinalReport};

pub trait Respondent {
    /// Discrete answer in `0..=4`.
    fn answer_question(&mut self, question: &Question) -> u8;

    /// Continuous answer in `0..=base`.
    fn answer_video(&mut self, video_id: &str, dimension: Dimension, base: f64) -> f64;
}

/// Virtual respondent with a fixed latent level per dimension, in backend units.
pub struct SimulatedRespondent {
    p_level: f64,
    w_level: f64,
    noise: f64,
    back_bounds: (f64, f64),
    rng: ChaCha8Rng,
}

impl SimulatedRespondent {
    pub fn new(p_level: f64, w_level: f64, seed: u64) -> Self {
        Self {
            p_level,
            w_level,
            noise: 0.0,
            back_bounds: (-100.0, 100.0),
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Uniform jitter of up to `noise` backend units around the latent level.
    pub fn with_noise(mut self, noise: f64) -> Self {
        self.noise = noise.abs();
        self
    }

    pub fn with_back_bounds(mut self, low: f64, high: f64) -> Self {
        self.back_bounds = (low, high);
        self
    }

    fn level(&mut self, dimension: Dimension) -> f64 {
        let base = match dimension {
            Dimension::P => self.p_level,
            Dimension::W => self.w_level,
        };
        if self.noise > 0.0 {
            base + self.rng.gen_range(-self.noise..=self.noise)
        } else {
            base
        }
    }
}

impl Respondent for SimulatedRespondent {
    fn answer_question(&mut self, question: &Question) -> u8 {
        let target = self.level(question.dimension());
        let step = (question.high_bound - question.low_bound) / (DISCRETE_POINTS - 1) as f64;
        let mut best = 0u8;
        let mut best_dist = f64::INFINITY;
        for i in 0..DISCRETE_POINTS {
            let dist = (question.low_bound + step * i as f64 - target).abs();
            if dist < best_dist {
                best_dist = dist;
                best = i as u8;
            }
        }
        best
    }

    fn answer_video(&mut self, _video_id: &str, dimension: Dimension, base: f64) -> f64 {
        let level = self.level(dimension);
        let (low, high) = self.back_bounds;
        (base * (level - low) / (high - low)).clamp(0.0, base)
    }
}

/// Run self-assessment, the dynamic loop and the video round, then report.
pub fn run_test(
    session: &mut AdaptiveSession,
    respondent: &mut impl Respondent,
) -> Result<FinalReport, EngineError> {
    let asked = session.self_assessment_emit()?;
    let answers = collect_answers(session, &asked, respondent)?;
    session.receive(&answers, &asked, true, false)?;

    loop {
        let batch = session.test_core_emit()?;
        if batch.done {
            break;
        }
        let answers = collect_answers(session, &batch.ids, respondent)?;
        let scores = session.receive(&answers, &batch.ids, false, false)?;
        tracing::debug!(p = scores.p, w = scores.w, "dynamic scores");
    }

    let videos = session.video_emit()?;
    let base = session.config().continuous_base;
    let answers: Vec<f64> = videos
        .iter()
        .map(|id| respondent.answer_video(id, Dimension::of_id(id), base))
        .collect();
    let front = session.receive(&answers, &videos, false, true)?;
    tracing::info!(p = front.p, w = front.w, "test complete");

    Ok(session.report())
}

fn collect_answers(
    session: &AdaptiveSession,
    ids: &[String],
    respondent: &mut impl Respondent,
) -> Result<Vec<f64>, EngineError> {
    ids.iter()
        .map(|id| {
            let question = session
                .question(id)
                .ok_or_else(|| EngineError::UnknownQuestion(id.clone()))?;
            Ok(f64::from(respondent.answer_question(question)))
        })
        .collect()
}
