use std::path::PathBuf;

use crate::engine::EngineConfig;

#[derive(Debug, Clone)]
pub struct Config {
    pub questions_path: PathBuf,
    pub results_path: Option<PathBuf>,
    /// Latent `(P, W)` levels for a simulated respondent; console otherwise.
    pub simulate: Option<(f64, f64)>,
    pub simulate_noise: f64,
    pub seed: u64,
    pub log_level: String,
    /// Directory for rotated log files; `None` logs to the console only.
    pub log_dir: Option<PathBuf>,
    pub engine: EngineConfig,
}

impl Config {
    pub fn from_env() -> Self {
        let questions_path = std::env::var("PWSCALE_QUESTIONS")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("questions.json"));

        let results_path = std::env::var("PWSCALE_RESULTS")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);

        let simulate = std::env::var("PWSCALE_SIMULATE")
            .ok()
            .and_then(|value| parse_levels(&value));

        let simulate_noise = std::env::var("PWSCALE_SIMULATE_NOISE")
            .ok()
            .and_then(|value| value.parse::<f64>().ok())
            .unwrap_or(15.0);

        let seed = std::env::var("PWSCALE_SEED")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .unwrap_or(42);

        let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let file_logs = std::env::var("ENABLE_FILE_LOGS")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);
        let log_dir = file_logs.then(|| {
            std::env::var("LOG_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./logs"))
        });

        Self {
            questions_path,
            results_path,
            simulate,
            simulate_noise,
            seed,
            log_level,
            log_dir,
            engine: EngineConfig::from_env(),
        }
    }
}

/// `"40"` applies to both dimensions, `"40,-20"` sets P then W.
fn parse_levels(value: &str) -> Option<(f64, f64)> {
    let mut parts = value.split(',').map(|part| part.trim().parse::<f64>());
    match (parts.next(), parts.next(), parts.next()) {
        (Some(Ok(both)), None, None) => Some((both, both)),
        (Some(Ok(p)), Some(Ok(w)), None) => Some((p, w)),
        _ => None,
    }
}
