/// Bounded-concurrency enrichment
///
/// Cheap global facts are fetched once per call. Per-project facts fan out
/// over a `JoinSet`, with a semaphore capping how many run at a time. Results
/// are only written into the projects after every task has joined.

use crate::core::project::{path_key, Project};
use crate::enrich::models::{EnrichOptions, NoteCounts};
use crate::enrich::sources::FactSource;
use crate::error::Result;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// In-flight limit for the primary per-project lookup (vcs status)
pub const PRIMARY_CONCURRENCY: usize = 10;

/// In-flight limit for the secondary lookup (plan stats)
pub const SECONDARY_CONCURRENCY: usize = 5;

/// Counts of what one `enrich` call managed to fetch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnrichReport {
    pub targets: usize,
    pub notes_fetched: bool,
    pub vcs_ok: usize,
    pub vcs_failed: usize,
    pub plans_ok: usize,
    pub plans_failed: usize,
}

type Fetch<T> = fn(&dyn FactSource, &Path) -> Result<T>;

/// Augments projects with best-effort facts
pub struct EnrichmentPipeline {
    source: Arc<dyn FactSource>,
    primary_limit: usize,
    secondary_limit: usize,
}

impl EnrichmentPipeline {
    pub fn new(source: Arc<dyn FactSource>) -> Self {
        Self {
            source,
            primary_limit: PRIMARY_CONCURRENCY,
            secondary_limit: SECONDARY_CONCURRENCY,
        }
    }

    /// Override the in-flight limits; zero is treated as one
    pub fn with_limits(mut self, primary: usize, secondary: usize) -> Self {
        self.primary_limit = primary.max(1);
        self.secondary_limit = secondary.max(1);
        self
    }

    /// Fill in `facts` on the selected projects
    ///
    /// Never fails: a project whose lookup fails keeps that field unset. The
    /// projects are untouched until every dispatched task has finished.
    pub async fn enrich(&self, projects: &mut [Project], options: &EnrichOptions) -> EnrichReport {
        let only: Option<HashSet<String>> = options
            .only
            .as_ref()
            .map(|paths| paths.iter().map(|p| path_key(p)).collect());

        let targets: Vec<(usize, PathBuf)> = projects
            .iter()
            .enumerate()
            .filter(|(_, project)| {
                only.as_ref()
                    .map(|only| only.contains(&path_key(&project.path)))
                    .unwrap_or(true)
            })
            .map(|(index, project)| (index, project.path.clone()))
            .collect();

        let mut report = EnrichReport {
            targets: targets.len(),
            ..Default::default()
        };

        if targets.is_empty() {
            return report;
        }

        let notes = if options.global_facts {
            self.fetch_notes().await
        } else {
            None
        };

        let vcs = if options.vcs_status {
            self.fan_out(&targets, self.primary_limit, "vcs status", |source, path| {
                source.vcs_status(path)
            })
            .await
        } else {
            Vec::new()
        };

        // Secondary lookups start once the primary batch has joined
        let plans = if options.plan_stats {
            self.fan_out(&targets, self.secondary_limit, "plan stats", |source, path| {
                source.plan_stats(path)
            })
            .await
        } else {
            Vec::new()
        };

        // Write-back: each index is owned by exactly one result
        if let Some(notes) = &notes {
            report.notes_fetched = true;
            for (index, _) in &targets {
                let project = &mut projects[*index];
                project.facts.notes = notes.get(&project.name).copied();
            }
        }

        for (index, status) in vcs {
            match status {
                Some(status) => {
                    projects[index].facts.vcs = Some(status);
                    report.vcs_ok += 1;
                }
                None => {
                    projects[index].facts.vcs = None;
                    report.vcs_failed += 1;
                }
            }
        }

        for (index, stats) in plans {
            match stats {
                Some(stats) => {
                    projects[index].facts.plans = Some(stats);
                    report.plans_ok += 1;
                }
                None => {
                    projects[index].facts.plans = None;
                    report.plans_failed += 1;
                }
            }
        }

        tracing::debug!(
            "Enriched {} projects: vcs {}/{} plans {}/{}",
            report.targets,
            report.vcs_ok,
            report.vcs_ok + report.vcs_failed,
            report.plans_ok,
            report.plans_ok + report.plans_failed
        );

        report
    }

    async fn fetch_notes(&self) -> Option<HashMap<String, NoteCounts>> {
        let source = Arc::clone(&self.source);
        match tokio::task::spawn_blocking(move || source.note_counts()).await {
            Ok(Ok(notes)) => Some(notes),
            Ok(Err(e)) => {
                tracing::debug!("Note lookup failed: {}", e);
                None
            }
            Err(e) => {
                tracing::debug!("Note lookup task failed: {}", e);
                None
            }
        }
    }

    /// Run `fetch` for every target with at most `limit` in flight
    ///
    /// Returns one entry per target that finished; `None` marks a failure.
    async fn fan_out<T: Send + 'static>(
        &self,
        targets: &[(usize, PathBuf)],
        limit: usize,
        label: &'static str,
        fetch: Fetch<T>,
    ) -> Vec<(usize, Option<T>)> {
        let semaphore = Arc::new(Semaphore::new(limit.max(1)));
        let mut tasks = JoinSet::new();

        for (index, path) in targets.iter().cloned() {
            let semaphore = Arc::clone(&semaphore);
            let source = Arc::clone(&self.source);

            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();

                let shown = path.display().to_string();
                let outcome = tokio::task::spawn_blocking(move || fetch(source.as_ref(), &path)).await;

                let value = match outcome {
                    Ok(Ok(value)) => Some(value),
                    Ok(Err(e)) => {
                        tracing::debug!("{} failed for {}: {}", label, shown, e);
                        None
                    }
                    Err(e) => {
                        tracing::debug!("{} task for {} failed: {}", label, shown, e);
                        None
                    }
                };
                (index, value)
            });
        }

        // Join barrier
        let mut results = Vec::with_capacity(targets.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(result) => results.push(result),
                Err(e) => tracing::debug!("{} task failed to join: {}", label, e),
            }
        }

        results
    }
}
