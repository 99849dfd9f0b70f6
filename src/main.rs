use std::io::{BufRead, Write};
use std::process::ExitCode;
use std::sync::Arc;

use thiserror::Error;

use pwscale::audit::ResultsLog;
use pwscale::bank::{BankError, Question, QuestionBank};
use pwscale::config::Config;
use pwscale::driver::{run_test, Respondent, SimulatedRespondent};
use pwscale::engine::{AdaptiveSession, Dimension, EngineError, ScaleMapper};
use pwscale::logging;

#[derive(Debug, Error)]
enum RunError {
    #[error(transparent)]
    Bank(#[from] BankError),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Audit(#[from] pwscale::audit::AuditError),
    #[error("failed to encode report: {0}")]
    Report(#[from] serde_json::Error),
}

/// Prompts on the terminal, one question at a time.
struct ConsoleRespondent {
    asked: usize,
}

impl ConsoleRespondent {
    fn prompt(&mut self, text: &str, hint: &str) -> String {
        let stdin = std::io::stdin();
        let mut line = String::new();
        print!("{text}\n {hint}: ");
        let _ = std::io::stdout().flush();
        if stdin.lock().read_line(&mut line).is_err() {
            return String::new();
        }
        line.trim().to_string()
    }
}

impl Respondent for ConsoleRespondent {
    fn answer_question(&mut self, question: &Question) -> u8 {
        self.asked += 1;
        let text = format!("Question #{}: {}", self.asked, question.text);
        loop {
            match self.prompt(&text, "Enter 0, 1, 2, 3, or 4").parse::<u8>() {
                Ok(answer) if answer <= 4 => return answer,
                _ => println!("Please answer with a whole number from 0 to 4."),
            }
        }
    }

    fn answer_video(&mut self, video_id: &str, _dimension: Dimension, base: f64) -> f64 {
        let text = format!("Video {video_id}: how well does it describe you?");
        loop {
            match self.prompt(&text, &format!("Enter a number from 0 to {base}")).parse::<f64>() {
                Ok(answer) if (0.0..=base).contains(&answer) => return answer,
                _ => println!("Please answer with a number from 0 to {base}."),
            }
        }
    }
}

fn run(config: &Config) -> Result<(), RunError> {
    let mapper = ScaleMapper::new(&config.engine.mapper).map_err(EngineError::from)?;
    let mut bank = QuestionBank::load(&config.questions_path)?;
    bank.normalize_scales(&mapper);

    let results = ResultsLog::shared();
    let mut session = AdaptiveSession::new(Arc::new(bank), config.engine.clone())?
        .with_audit(Arc::clone(&results));

    let report = match config.simulate {
        Some((p_level, w_level)) => {
            tracing::info!(p_level, w_level, seed = config.seed, "running simulated respondent");
            let (low, high) = mapper.back_bounds();
            let mut respondent = SimulatedRespondent::new(p_level, w_level, config.seed)
                .with_noise(config.simulate_noise)
                .with_back_bounds(low, high);
            run_test(&mut session, &mut respondent)?
        }
        None => {
            println!("WELCOME TO THE ADAPTIVE PW SCALE TEST");
            run_test(&mut session, &mut ConsoleRespondent { asked: 0 })?
        }
    };

    println!("{}", serde_json::to_string_pretty(&report)?);

    if let Some(ref path) = config.results_path {
        results.lock().save(path)?;
    }
    Ok(())
}

fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let config = Config::from_env();
    let _log_guard = logging::init_tracing(&config.log_level, config.log_dir.as_deref());

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "pwscale run failed");
            ExitCode::FAILURE
        }
    }
}
