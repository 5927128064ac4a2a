pub mod cache;
pub mod config;
pub mod metrics;
pub mod pipeline;
pub mod server;

pub use cache::ScreeningCache;
pub use config::AppConfig;
pub use pipeline::Pipeline;
pub use server::{AppState, router};
