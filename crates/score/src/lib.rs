//! Authority and reach scoring for registered actors.

pub mod baseline;
pub mod context;
pub mod error;
pub mod prompt;
pub mod scorer;

pub use baseline::Baseline;
pub use context::{ActorContext, CaseStudy, LinkedEvent, fetch_actor_context};
pub use error::ScoreError;
pub use scorer::{ActorScore, ActorScorer, ScoreOutcome, validate_actor_score};
