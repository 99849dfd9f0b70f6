use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapperConfig {
    pub front_low: f64,
    pub front_high: f64,
    pub front_values: usize,
    pub back_low: f64,
    pub back_high: f64,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            front_low: 1.0,
            front_high: 4.0,
            front_values: 7,
            back_low: -100.0,
            back_high: 100.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvergenceConfig {
    /// Max change between the last two scores.
    pub tolerance: f64,
    /// Max distance between the last answer and the score before it.
    pub delta_mu: f64,
    /// Max difference between battery and post-battery answer spread.
    pub delta_sigma: f64,
    /// Interpret `tolerance` as a fraction of the previous score.
    pub relative: bool,
    /// Dynamic question count that must be exceeded before checks run.
    pub check_after: usize,
}

impl Default for ConvergenceConfig {
    fn default() -> Self {
        Self {
            tolerance: 100.0,
            delta_mu: 50.0,
            delta_sigma: 50.0,
            relative: false,
            check_after: 6,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    pub mapper: MapperConfig,
    pub convergence: ConvergenceConfig,
    pub batch: usize,
    pub max_questions: usize,
    pub video_weight: f64,
    pub continuous_base: f64,
    /// `None` uses the number of self-assessment items routed to each tracker.
    pub battery: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            mapper: MapperConfig::default(),
            convergence: ConvergenceConfig::default(),
            batch: 1,
            max_questions: 15,
            video_weight: 5.0,
            continuous_base: 10.0,
            battery: None,
        }
    }
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|value| value.trim().parse::<T>().ok())
}

/// Finite, strictly positive values only; anything else keeps the default.
fn env_positive(key: &str) -> Option<f64> {
    env_parse::<f64>(key).filter(|val| val.is_finite() && *val > 0.0)
}

impl EngineConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(val) = env_parse("PWSCALE_FRONT_LOW") {
            config.mapper.front_low = val;
        }
        if let Some(val) = env_parse("PWSCALE_FRONT_HIGH") {
            config.mapper.front_high = val;
        }
        if let Some(val) = env_parse("PWSCALE_FRONT_VALUES") {
            config.mapper.front_values = val;
        }
        if let Some(val) = env_parse("PWSCALE_BACK_LOW") {
            config.mapper.back_low = val;
        }
        if let Some(val) = env_parse("PWSCALE_BACK_HIGH") {
            config.mapper.back_high = val;
        }

        if let Some(val) = env_parse("PWSCALE_TOLERANCE") {
            config.convergence.tolerance = val;
        }
        if let Some(val) = env_parse("PWSCALE_DELTA_MU") {
            config.convergence.delta_mu = val;
        }
        if let Some(val) = env_parse("PWSCALE_DELTA_SIGMA") {
            config.convergence.delta_sigma = val;
        }
        if let Some(val) = env_parse("PWSCALE_RELATIVE_TOLERANCE") {
            config.convergence.relative = val;
        }
        if let Some(val) = env_parse("PWSCALE_CHECK_AFTER") {
            config.convergence.check_after = val;
        }

        if let Some(val) = env_parse::<usize>("PWSCALE_BATCH") {
            config.batch = val.max(1);
        }
        if let Some(val) = env_parse("PWSCALE_MAX_QUESTIONS") {
            config.max_questions = val;
        }
        if let Some(val) = env_positive("PWSCALE_VIDEO_WEIGHT") {
            config.video_weight = val;
        }
        if let Some(val) = env_positive("PWSCALE_CONTINUOUS_BASE") {
            config.continuous_base = val;
        }
        if let Some(val) = env_parse("PWSCALE_BATTERY") {
            config.battery = Some(val);
        }

        config
    }
}
