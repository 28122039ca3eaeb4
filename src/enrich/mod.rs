/// Enrichment module
///
/// Best-effort per-project facts (git status, notes, plan progress) fetched
/// concurrently and attached to the discovered projects.

pub mod models;
pub mod pipeline;
pub mod plans;
pub mod sources;
pub mod vcs;

pub use models::{EnrichOptions, EnrichmentRecord, NoteCounts, PlanStats, VcsStatus};
pub use pipeline::{EnrichReport, EnrichmentPipeline, PRIMARY_CONCURRENCY, SECONDARY_CONCURRENCY};
pub use plans::ChecklistParser;
pub use sources::{FactSource, LocalFacts};
