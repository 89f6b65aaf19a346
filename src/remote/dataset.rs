use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::payload::DatasetRecord;
use super::traits::GestureService;

/// Backend availability for the status indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackendStatus {
    Online,
    Offline,
}

/// Probe the liveness endpoint. Never fails; errors read as `Offline`.
pub async fn check_backend(service: &dyn GestureService) -> BackendStatus {
    match service.health().await {
        Ok(()) => BackendStatus::Online,
        Err(e) => {
            log::warn!("Backend unreachable: {}", e);
            BackendStatus::Offline
        }
    }
}

/// Per-label example counts from the dataset listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DatasetSummary {
    counts: BTreeMap<String, usize>,
    total: usize,
}

impl DatasetSummary {
    pub fn from_records(records: &[DatasetRecord]) -> Self {
        let mut counts = BTreeMap::new();
        for record in records {
            *counts.entry(record.label.clone()).or_insert(0) += 1;
        }
        Self {
            counts,
            total: records.len(),
        }
    }

    pub async fn fetch(service: &dyn GestureService) -> Result<Self> {
        let records = service.dataset().await?;
        Ok(Self::from_records(&records))
    }

    pub fn count(&self, label: &str) -> usize {
        self.counts.get(label).copied().unwrap_or(0)
    }

    pub fn labels(&self) -> impl Iterator<Item = (&str, usize)> {
        self.counts.iter().map(|(label, count)| (label.as_str(), *count))
    }

    pub fn total(&self) -> usize {
        self.total
    }
}
