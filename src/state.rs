//! In-memory dashboard state and the sync operation that feeds it.

use chrono::{DateTime, Utc};
use log::{info, warn};
use std::collections::HashMap;

use crate::backend::RecordSource;
use crate::columns::{Dataset, Entity};
use crate::error::Result;
use crate::normalize::{normalize_all, FlatRecord};

/// Normalized rows of every entity in a dataset, in dataset order
pub type SyncedRows = Vec<(Entity, Vec<FlatRecord>)>;

/// Fetch every table of `dataset` one after another and normalize the rows
///
/// Stops at the first failing table.
pub async fn sync_dataset(source: &dyn RecordSource, dataset: Dataset) -> Result<SyncedRows> {
    let mut synced = Vec::with_capacity(dataset.entities().len());
    for &entity in dataset.entities() {
        let raws = source.fetch_table(entity.table()).await?;
        info!("fetched {} rows from {}", raws.len(), entity.table());
        synced.push((entity, normalize_all(entity, &raws)));
    }
    Ok(synced)
}

/// Rows currently shown by the dashboard, plus the UI bits around them
#[derive(Debug, Clone)]
pub struct DashboardState {
    rows: HashMap<Entity, Vec<FlatRecord>>,
    active_tab: Entity,
    status: String,
    last_synced: Option<DateTime<Utc>>,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self {
            rows: HashMap::new(),
            active_tab: Entity::Submissions,
            status: "Not synced yet".to_string(),
            last_synced: None,
        }
    }
}

impl DashboardState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows of `entity`; empty until a sync succeeds
    pub fn rows(&self, entity: Entity) -> &[FlatRecord] {
        self.rows.get(&entity).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_rows(&self, dataset: Dataset) -> bool {
        dataset
            .entities()
            .iter()
            .any(|entity| !self.rows(*entity).is_empty())
    }

    pub fn active_tab(&self) -> Entity {
        self.active_tab
    }

    pub fn set_active_tab(&mut self, entity: Entity) {
        self.active_tab = entity;
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }

    pub fn last_synced(&self) -> Option<DateTime<Utc>> {
        self.last_synced
    }

    /// Drop every loaded row
    pub fn clear(&mut self) {
        self.rows.clear();
        self.last_synced = None;
    }

    /// Record the outcome of a sync
    ///
    /// Success replaces the rows of the synced entities. Failure clears all
    /// loaded data, so stale or partial rows are never shown, and surfaces the
    /// error as the status line.
    pub fn apply_sync(&mut self, dataset: Dataset, outcome: Result<SyncedRows>) {
        match outcome {
            Ok(synced) => {
                let total: usize = synced.iter().map(|(_, rows)| rows.len()).sum();
                for (entity, rows) in synced {
                    self.rows.insert(entity, rows);
                }
                self.last_synced = Some(Utc::now());
                self.status = format!("Synced {total} rows from {dataset}");
                info!("{}", self.status);
            }
            Err(err) => {
                warn!("sync of {dataset} failed: {err}");
                self.clear();
                self.status = format!("Sync failed: {err}");
            }
        }
    }
}
