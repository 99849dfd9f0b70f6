//! Property-based tests for the estimation engine.
//!
//! Invariants:
//! - Mapper: front_to_back is monotone; quantized front values survive a round trip
//! - Tracker: score is the weighted mean of recorded answers
//! - Tracker: no question is served twice
//! - Tracker: convergence never resets
//! - Session: dynamic picks alternate while nothing converges

mod common;

use proptest::prelude::*;

use pwscale::engine::{
    ConvergenceConfig, Dimension, EngineConfig, MapperConfig, ScaleMapper, ScaleTracker,
};

use common::*;

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_mapper_config() -> impl Strategy<Value = MapperConfig> {
    (
        (-10i32..=5i32),
        (1i32..=10i32),
        (2usize..=11usize),
        (-200i32..=0i32),
        (1i32..=200i32),
    )
        .prop_map(|(front_low, span, front_values, back_low, back_span)| MapperConfig {
            front_low: front_low as f64,
            front_high: (front_low + span) as f64,
            front_values,
            back_low: back_low as f64,
            back_high: (back_low + back_span) as f64,
        })
}

/// (weight, discrete answer, low bound, high bound)
fn arb_answer() -> impl Strategy<Value = (f64, u8, f64, f64)> {
    (
        (1u32..=100u32).prop_map(|w| w as f64 / 10.0),
        0u8..=4u8,
        (-100i32..=0i32).prop_map(f64::from),
        (0i32..=100i32).prop_map(f64::from),
    )
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn mapper_front_to_back_is_monotone(
        config in arb_mapper_config(),
        a in 0.0f64..=1.0,
        b in 0.0f64..=1.0,
    ) {
        let mapper = ScaleMapper::new(&config).unwrap();
        let (low, high) = mapper.front_bounds();
        let (x1, x2) = (low + a.min(b) * (high - low), low + a.max(b) * (high - low));
        prop_assert!(mapper.front_to_back_value(x1) <= mapper.front_to_back_value(x2) + 1e-9);
    }

    #[test]
    fn mapper_round_trip_within_one_step(config in arb_mapper_config(), index in 0usize..11) {
        let mapper = ScaleMapper::new(&config).unwrap();
        let values = mapper.front_values().to_vec();
        let x = values[index % values.len()];
        let step = values[1] - values[0];
        let back = mapper.front_to_back_value(x);
        let front = mapper.back_to_front_value(back);
        prop_assert!((front - x).abs() <= step + 1e-9, "x={x} back={back} front={front}");
    }

    #[test]
    fn tracker_score_is_weighted_mean(answers in prop::collection::vec(arb_answer(), 1..30)) {
        let mut tracker = ScaleTracker::new(Dimension::P, Vec::new(), 1, 0);
        for (weight, answer, low, high) in &answers {
            tracker.update_sent("P_x", *weight, *low, *high);
            tracker.update_score(&[f64::from(*answer)], false, 10.0).unwrap();
        }
        let weighted: f64 = tracker.answers().iter().zip(tracker.weights()).map(|(a, w)| a * w).sum();
        let total: f64 = tracker.weights().iter().sum();
        prop_assert!((tracker.score() - weighted / total).abs() < 1e-9);
        prop_assert_eq!(tracker.answers().len(), tracker.history().len());
        prop_assert_eq!(tracker.weights().len(), tracker.history().len());
    }

    #[test]
    fn tracker_never_repeats_questions(
        answers in prop::collection::vec(0u8..=4u8, 0..40),
        batch in 1usize..4,
    ) {
        let mut tracker = ScaleTracker::new(Dimension::P, pool("P", 15), batch, 0);
        let mut served = Vec::new();
        for answer in answers {
            let Some(id) = tracker.next_question() else { break };
            prop_assert!(!served.contains(&id));
            let q = tracker.question_info(&id).unwrap();
            tracker.update_sent(q.id.clone(), q.weight, q.low_bound, q.high_bound);
            tracker.update_score(&[f64::from(answer)], false, 10.0).unwrap();
            served.push(id);
        }
    }

    #[test]
    fn tracker_convergence_is_monotone(answers in prop::collection::vec(0u8..=4u8, 1..40)) {
        let mut tracker = ScaleTracker::new(Dimension::W, Vec::new(), 1, 3);
        let config = ConvergenceConfig { tolerance: 30.0, delta_mu: 60.0, delta_sigma: 40.0, ..ConvergenceConfig::default() };
        let mut was_converged = false;
        for answer in answers {
            tracker.update_sent("W_x", 1.0, -100.0, 100.0);
            tracker.update_score(&[f64::from(answer)], false, 10.0).unwrap();
            let now = tracker.check_convergence(&config);
            prop_assert!(!was_converged || now);
            was_converged = now;
        }
    }

    #[test]
    fn session_alternates_dimensions(answers in prop::collection::vec(0u8..=4u8, 1..20)) {
        let config = EngineConfig { max_questions: 30, ..no_convergence_config() };
        let mut s = session(sample_bank(), config);
        finish_self_assessment(&mut s, &[2.0; 4]);
        let mut previous: Option<Dimension> = None;
        for answer in answers {
            let batch = s.test_core_emit().unwrap();
            if batch.done {
                break;
            }
            let dim = Dimension::of_id(&batch.ids[0]);
            prop_assert_ne!(Some(dim), previous);
            previous = Some(dim);
            s.receive(&[f64::from(answer)], &batch.ids, false, false).unwrap();
        }
    }
}
