//! Batched, timeout-bounded collection cycles.

use super::{BalanceSource, CollectError};
use crate::logging::event_names;
use crate::report::Render;
use crate::store::{Dataset, ProxyKind, Snapshot};
use br_common::{Amount, EntityId};
use br_config::{CollectorSettings, RetentionSettings};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{info, warn};

/// Outcome counts for one cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionReport {
    pub timestamp: i64,
    /// Entities with a fresh balance.
    pub success: usize,
    /// Entities whose query failed, whether or not a fallback was found.
    pub failed: usize,
    /// Failed entities carried over from the previous snapshot.
    pub fallback: usize,
    /// Snapshots dropped by retention after this cycle.
    pub evicted: usize,
}

impl CollectionReport {
    /// Failed entities with no previous value, absent from the new snapshot.
    pub fn omitted(&self) -> usize {
        self.failed - self.fallback
    }
}

impl Render for CollectionReport {
    fn markdown(&self) -> String {
        format!(
            "# Collection\n\n- Collected: {}\n- Failed: {} ({} fell back to the previous value)\n- Evicted snapshots: {}\n",
            self.success, self.failed, self.fallback, self.evicted
        )
    }

    fn summary(&self) -> String {
        format!(
            "collected {}, failed {}, fallback {}, evicted {}",
            self.success, self.failed, self.fallback, self.evicted
        )
    }
}

/// One remote call: a single status entity, or one summary proxy and the
/// entities it is expected to report.
#[derive(Debug, Clone)]
enum Job {
    Status {
        proxy: String,
        entity: EntityId,
    },
    Summary {
        proxy: String,
        entities: Vec<EntityId>,
    },
}

type Outcome = Vec<(EntityId, Result<Amount, CollectError>)>;

/// Run `f` on a worker thread and wait at most `timeout` for its result.
///
/// A call that overruns is abandoned; its worker finishes in the background
/// and the result is dropped.
fn call_with_timeout<T, F>(timeout: Duration, f: F) -> Result<T, CollectError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, CollectError> + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    thread::Builder::new()
        .name("burnrate-call".to_string())
        .spawn(move || {
            let _ = tx.send(f());
        })
        .map_err(|e| CollectError::Source(format!("failed to spawn worker: {}", e)))?;

    match rx.recv_timeout(timeout) {
        Ok(result) => result,
        Err(RecvTimeoutError::Timeout) => Err(CollectError::Timeout {
            timeout_ms: timeout.as_millis() as u64,
        }),
        Err(RecvTimeoutError::Disconnected) => {
            Err(CollectError::Source("worker exited without a result".to_string()))
        }
    }
}

/// Queries balances and maintains the snapshot log.
pub struct Collector {
    source: Arc<dyn BalanceSource>,
    settings: CollectorSettings,
    retention: RetentionSettings,
}

impl std::fmt::Debug for Collector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collector")
            .field("settings", &self.settings)
            .field("retention", &self.retention)
            .finish_non_exhaustive()
    }
}

impl Collector {
    pub fn new(
        source: Arc<dyn BalanceSource>,
        settings: CollectorSettings,
        retention: RetentionSettings,
    ) -> Self {
        Collector {
            source,
            settings,
            retention,
        }
    }

    fn timeout(&self) -> Duration {
        Duration::from_millis(self.settings.call_timeout_ms)
    }

    fn jobs(dataset: &Dataset) -> Vec<Job> {
        let mut jobs = Vec::new();
        let mut summaries: BTreeMap<&str, Vec<EntityId>> = BTreeMap::new();
        for record in dataset.registry.valid() {
            match record.proxy_kind {
                ProxyKind::Status => jobs.push(Job::Status {
                    proxy: record.proxy_reference.clone(),
                    entity: record.entity_id.clone(),
                }),
                ProxyKind::Summary => summaries
                    .entry(record.proxy_reference.as_str())
                    .or_default()
                    .push(record.entity_id.clone()),
            }
        }
        jobs.extend(summaries.into_iter().map(|(proxy, entities)| Job::Summary {
            proxy: proxy.to_string(),
            entities,
        }));
        jobs
    }

    fn run(&self, job: Job) -> Outcome {
        let source = Arc::clone(&self.source);
        match job {
            Job::Status { proxy, entity } => {
                let id = entity.clone();
                let result =
                    call_with_timeout(self.timeout(), move || source.query_status(&proxy, &id));
                vec![(entity, result)]
            }
            Job::Summary { proxy, entities } => {
                let p = proxy.clone();
                match call_with_timeout(self.timeout(), move || source.query_summary(&p)) {
                    Ok(mut balances) => entities
                        .into_iter()
                        .map(|entity| {
                            let result = balances.remove(&entity).ok_or_else(|| {
                                CollectError::MissingFromSummary {
                                    proxy: proxy.clone(),
                                    entity_id: entity.clone(),
                                }
                            });
                            (entity, result)
                        })
                        .collect(),
                    Err(err) => {
                        warn!(
                            target: event_names::COLLECT_PROXY_FAILED,
                            proxy = %proxy,
                            entities = entities.len() as u64,
                            error = %err,
                            "summary proxy failed"
                        );
                        let message = err.to_string();
                        entities
                            .into_iter()
                            .map(|entity| {
                                let result = Err(CollectError::Proxy {
                                    proxy: proxy.clone(),
                                    message: message.clone(),
                                });
                                (entity, result)
                            })
                            .collect()
                    }
                }
            }
        }
    }

    /// Query every valid entity and build the next snapshot without
    /// touching `dataset`. The returned report has `evicted == 0`.
    pub fn gather(&self, dataset: &Dataset, timestamp: i64) -> (Snapshot, CollectionReport) {
        let jobs = Self::jobs(dataset);
        let batch_size = self.settings.batch_size.max(1);
        info!(
            target: event_names::COLLECT_STARTED,
            jobs = jobs.len() as u64,
            batch_size = batch_size as u64,
            "collection started"
        );

        let outcomes: Vec<(EntityId, Result<Amount, CollectError>)> = jobs
            .chunks(batch_size)
            .flat_map(|chunk| {
                thread::scope(|s| {
                    let handles: Vec<_> = chunk
                        .iter()
                        .map(|job| (job, s.spawn(|| self.run(job.clone()))))
                        .collect();
                    handles
                        .into_iter()
                        .flat_map(|(job, handle)| {
                            handle.join().unwrap_or_else(|_| {
                                let entities = match job {
                                    Job::Status { entity, .. } => vec![entity.clone()],
                                    Job::Summary { entities, .. } => entities.clone(),
                                };
                                entities
                                    .into_iter()
                                    .map(|e| {
                                        (e, Err(CollectError::Source("query thread panicked".into())))
                                    })
                                    .collect()
                            })
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let previous = dataset.snapshots.latest();
        let mut snapshot = Snapshot::new(timestamp);
        let mut report = CollectionReport {
            timestamp,
            ..Default::default()
        };

        for (entity, result) in outcomes {
            match result {
                Ok(balance) => {
                    report.success += 1;
                    snapshot.balances.insert(entity, balance);
                }
                Err(err) => {
                    report.failed += 1;
                    let fallback = previous.and_then(|s| s.balance(entity.as_str()));
                    warn!(
                        target: event_names::COLLECT_ENTITY_FAILED,
                        entity_id = %entity,
                        error = %err,
                        fallback = fallback.is_some(),
                        "balance query failed"
                    );
                    if let Some(value) = fallback {
                        report.fallback += 1;
                        snapshot.balances.insert(entity, value);
                    }
                }
            }
        }

        (snapshot, report)
    }

    /// Apply count and age retention. Returns how many snapshots were dropped.
    pub fn apply_retention(&self, dataset: &mut Dataset) -> usize {
        let mut evicted = dataset
            .snapshots
            .evict_over_cap(self.retention.max_snapshots);
        if let (Some(max_age), Some(newest)) =
            (self.retention.max_age_ms, dataset.snapshots.latest_timestamp())
        {
            evicted += dataset
                .snapshots
                .prune_older_than(newest.saturating_sub(max_age));
        }
        if evicted > 0 {
            info!(
                target: event_names::COLLECT_EVICTED,
                evicted = evicted as u64,
                retained = dataset.snapshots.len() as u64,
                "old snapshots evicted"
            );
        }
        evicted
    }

    /// Run one full cycle: gather, prepend, and apply retention.
    pub fn collect(&self, dataset: &mut Dataset, timestamp: i64) -> CollectionReport {
        let (snapshot, mut report) = self.gather(dataset, timestamp);
        dataset.snapshots.prepend(snapshot);
        report.evicted = self.apply_retention(dataset);
        info!(
            target: event_names::COLLECT_FINISHED,
            success = report.success as u64,
            failed = report.failed as u64,
            fallback = report.fallback as u64,
            evicted = report.evicted as u64,
            "collection finished"
        );
        report
    }
}
