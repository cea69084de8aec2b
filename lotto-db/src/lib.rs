pub mod db;
pub mod error;
pub mod export;
pub mod models;
pub mod rules;

pub use error::RulesError;
pub use models::{CombinationBatch, Draw, GenerationMode, LotteryRule, MatchScore, Pool};
pub use rules::RulesTable;
