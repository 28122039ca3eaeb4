/// Core functionality modules
///
/// Project records, discovery, ranking by access history and query
/// filtering.

pub mod filter;
pub mod project;
pub mod project_detector;
pub mod ranking;

pub use filter::{FilterEngine, MatchTier};
pub use project::{path_key, Project};
pub use project_detector::ProjectDetector;
pub use ranking::RankingEngine;
