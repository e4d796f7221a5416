pub mod candidates;
pub mod cli;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod limiter;
pub mod matcher;
pub mod ui;
pub mod warning;

pub use domain::{Decision, DecisionRecord, PolicyDocument, UpdateCandidate, UpdateType};
pub use engine::{evaluate, DecisionEngine, Evaluation};
pub use error::{ConfigError, PolicyError, Result};
pub use limiter::{Limiter, LimiterState, SharedLimiter};
