//! Collection pipeline
//!
//! [`Collector`] walks the requested resource kinds in the fixed order
//! clones, views, downloads, stars. For each kind it fetches, normalizes
//! into [`DailyRecord`](crate::traffic::DailyRecord)s and upserts into the
//! database before moving to the next. The first failure ends the run.

use chrono::{DateTime, Utc};

use crate::config::{Credentials, GitHubConfig};
use crate::db::Database;
use crate::error::Result;
use crate::traffic::{Fetcher, ResourceKind, Transport};

/// Milestones reported while a run is in progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// About to request the kind
    Fetching(ResourceKind),
    /// Response decoded and normalized
    Fetched { kind: ResourceKind, records: usize },
    /// Records written to the database
    Stored { kind: ResourceKind, rows: usize },
}

/// Outcome for one resource kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KindSummary {
    pub kind: ResourceKind,
    /// Records produced by normalization
    pub records: usize,
    /// Upsert statements executed
    pub rows: usize,
}

/// Result of a full collection run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// One entry per collected kind, in collection order
    pub per_kind: Vec<KindSummary>,
    /// HTTP requests issued
    pub requests: usize,
}

impl RunSummary {
    /// Total upsert statements across all kinds
    pub fn total_rows(&self) -> usize {
        self.per_kind.iter().map(|k| k.rows).sum()
    }
}

/// Drives fetch, normalize and persist for one repository
pub struct Collector<T> {
    fetcher: Fetcher<T>,
}

impl<T: Transport> Collector<T> {
    pub fn new(credentials: Credentials, transport: T, config: &GitHubConfig) -> Self {
        Self {
            fetcher: Fetcher::new(transport, credentials, config),
        }
    }

    /// Resolve credentials through `lookup` first.
    ///
    /// A missing credential fails here, before the transport is ever used.
    pub fn from_lookup<F>(lookup: F, transport: T, config: &GitHubConfig) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let credentials = Credentials::from_lookup(lookup)?;
        Ok(Self::new(credentials, transport, config))
    }

    /// Collect every kind in `kinds`, reordered to the fixed collection order.
    ///
    /// Stops at the first error; kinds already stored stay stored.
    pub fn collect<F>(
        &self,
        db: &Database,
        kinds: &[ResourceKind],
        on_progress: F,
    ) -> Result<RunSummary>
    where
        F: FnMut(Progress),
    {
        self.collect_at(db, kinds, Utc::now(), on_progress)
    }

    /// Like [`collect`](Self::collect), stamping snapshots with the day of `now`
    pub fn collect_at<F>(
        &self,
        db: &Database,
        kinds: &[ResourceKind],
        now: DateTime<Utc>,
        mut on_progress: F,
    ) -> Result<RunSummary>
    where
        F: FnMut(Progress),
    {
        let repo = self.fetcher.credentials().slug();
        let mut summary = RunSummary::default();

        tracing::info!(repo = %repo, kinds = kinds.len(), "Starting collection");

        for kind in ResourceKind::ALL.into_iter().filter(|k| kinds.contains(k)) {
            on_progress(Progress::Fetching(kind));
            tracing::info!(kind = %kind, "fetching {}", kind);

            let resource = match self.fetcher.fetch(kind) {
                Ok(resource) => resource,
                Err(e) => {
                    tracing::error!(kind = %kind, error = %e, "Fetch failed, aborting run");
                    return Err(e);
                }
            };

            let records = resource.daily_records_at(now);
            on_progress(Progress::Fetched {
                kind,
                records: records.len(),
            });
            tracing::info!(kind = %kind, records = records.len(), "{} fetched", kind);

            let rows = db.upsert_records(kind, &records)?;
            on_progress(Progress::Stored { kind, rows });
            tracing::info!(kind = %kind, rows, "{} stored", kind);

            summary.per_kind.push(KindSummary {
                kind,
                records: records.len(),
                rows,
            });
        }

        summary.requests = self.fetcher.requests_made();
        tracing::info!(
            repo = %repo,
            requests = summary.requests,
            rows = summary.total_rows(),
            "Collection complete"
        );

        Ok(summary)
    }
}
