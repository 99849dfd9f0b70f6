//! # pwscale - adaptive two-dimension questionnaire engine
//!
//! Estimates two latent scores (P and W) while a questionnaire is running:
//!
//! - [`engine::ScaleMapper`] - linear mapping between the backend scale and the
//!   quantized front scale shown to users
//! - [`engine::ScaleTracker`] - running weighted score, convergence tests and
//!   next-question ranking for one dimension
//! - [`engine::AdaptiveSession`] - self-assessment, dynamic and video phases
//!   behind an emit/receive protocol
//!
//! Collaborators live beside the engine: [`bank`] (question repository),
//! [`audit`] (answer log), [`store`] (per-user sessions) and [`driver`]
//! (end-to-end runs against a respondent).
//!
//! ```rust
//! use std::sync::Arc;
//! use pwscale::bank::QuestionBank;
//! use pwscale::driver::{run_test, SimulatedRespondent};
//! use pwscale::engine::{AdaptiveSession, EngineConfig};
//!
//! let bank = QuestionBank::from_json_str(r#"{
//!     "selfAssessment": [
//!         {"id": "SA_P1", "weight": 1, "suitability": 0, "lowBound": -100, "highBound": 100},
//!         {"id": "SA_W1", "weight": 1, "suitability": 0, "lowBound": -100, "highBound": 100}
//!     ],
//!     "p": [{"id": "P1", "weight": 1, "suitability": 20, "lowBound": -100, "highBound": 100}],
//!     "w": [{"id": "W1", "weight": 1, "suitability": -20, "lowBound": -100, "highBound": 100}]
//! }"#).unwrap();
//!
//! let mut session = AdaptiveSession::new(Arc::new(bank), EngineConfig::default()).unwrap();
//! let mut respondent = SimulatedRespondent::new(50.0, -50.0, 1);
//! let report = run_test(&mut session, &mut respondent).unwrap();
//! assert!(report.p_score > report.w_score);
//! ```

pub mod audit;
pub mod bank;
pub mod config;
pub mod driver;
pub mod engine;
pub mod logging;
pub mod store;

pub use audit::{AuditEntry, AuditRecord, AuditSink, ResultsLog, SharedResultsLog};
pub use bank::{BankError, Question, QuestionBank};
pub use engine::{AdaptiveSession, Dimension, EngineConfig, EngineError, ScaleMapper, ScaleTracker};
pub use store::SessionStore;
