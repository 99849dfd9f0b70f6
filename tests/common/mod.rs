#![allow(dead_code)]

use std::sync::Arc;

use pwscale::bank::{Question, QuestionBank};
use pwscale::engine::{AdaptiveSession, ConvergenceConfig, Dimension, EngineConfig};

pub fn question(id: &str, weight: f64, suitability: f64, low: f64, high: f64) -> Question {
    Question {
        id: id.to_string(),
        text: format!("Statement {id}"),
        weight,
        suitability,
        low_bound: low,
        high_bound: high,
        dimension: None,
    }
}

fn sa_question(id: &str, dimension: Dimension) -> Question {
    Question {
        dimension: Some(dimension),
        ..question(id, 2.0, 0.0, -100.0, 100.0)
    }
}

/// Pool of `n` items with suitabilities spread evenly over [-80, 80].
pub fn pool(prefix: &str, n: usize) -> Vec<Question> {
    (0..n)
        .map(|i| {
            let suitability = if n > 1 {
                -80.0 + 160.0 * i as f64 / (n - 1) as f64
            } else {
                0.0
            };
            question(&format!("{prefix}{}", i + 1), 1.0, suitability, -100.0, 100.0)
        })
        .collect()
}

pub fn sample_bank() -> QuestionBank {
    QuestionBank {
        self_assessment: vec![
            sa_question("SA_P1", Dimension::P),
            sa_question("SA_P2", Dimension::P),
            sa_question("SA_W1", Dimension::W),
            sa_question("SA_W2", Dimension::W),
        ],
        p: pool("P", 12),
        w: pool("W", 12),
    }
}

/// Config that never runs convergence checks.
pub fn no_convergence_config() -> EngineConfig {
    EngineConfig {
        convergence: ConvergenceConfig {
            check_after: usize::MAX,
            ..ConvergenceConfig::default()
        },
        ..EngineConfig::default()
    }
}

/// Config whose criteria hold whenever they can be evaluated.
pub fn eager_convergence_config() -> EngineConfig {
    EngineConfig {
        convergence: ConvergenceConfig {
            tolerance: f64::MAX,
            delta_mu: f64::MAX,
            delta_sigma: f64::MAX,
            relative: false,
            check_after: 0,
        },
        ..EngineConfig::default()
    }
}

pub fn session(bank: QuestionBank, config: EngineConfig) -> AdaptiveSession {
    AdaptiveSession::new(Arc::new(bank), config).unwrap()
}

/// Emit and answer the self-assessment batch with `answers`.
pub fn finish_self_assessment(session: &mut AdaptiveSession, answers: &[f64]) {
    let asked = session.self_assessment_emit().unwrap();
    session.receive(answers, &asked, true, false).unwrap();
}
