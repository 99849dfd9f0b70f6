pub mod config;
pub mod error;
pub mod mapper;
pub mod session;
pub mod tracker;
pub mod types;

pub use config::{ConvergenceConfig, EngineConfig, MapperConfig};
pub use error::{EngineError, MapperError};
pub use mapper::ScaleMapper;
pub use session::AdaptiveSession;
pub use tracker::ScaleTracker;
pub use types::*;
