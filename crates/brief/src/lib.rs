//! Weekly intelligence brief: gather recent records, synthesise, save.

pub mod error;
pub mod fetcher;
pub mod prompt;
pub mod writer;

pub use error::BriefError;
pub use fetcher::{
    ActiveScenario, BriefData, BriefFetcher, BriefWindow, DEFAULT_LOOKBACK_DAYS,
    MAX_LOOKBACK_DAYS, RecentEvent, RecentIntelFeed, ScoreMover,
};
pub use writer::{BriefWriter, markdown_to_blocks, parse_inline_bold};
