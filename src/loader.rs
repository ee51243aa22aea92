//! Loads and reconciles all input tables once per process.

use crate::{
    config::DashboardConfig,
    curated::{check_consistency, derive_curated_subset, ConsistencyReport, CuratedRecord},
    error::{HofError, Result},
    measurements::{load_measurements, sorted_cell_types, MeasurementRow},
    metadata::{load_metadata, MetadataRow, MetadataTable},
};
use lazy_static::lazy_static;
use std::{
    collections::{HashMap, HashSet},
    path::PathBuf,
    sync::{Arc, Mutex},
};
use tracing::{error, info};

lazy_static! {
    static ref DATASET_CACHE: Mutex<HashMap<DashboardConfig, Arc<Dataset>>> =
        Mutex::new(HashMap::new());
}

/// The three reconciled tables, read-only after load.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub measurements: Vec<MeasurementRow>,
    pub metadata: MetadataTable,
    /// Where the metadata came from; `None` when the file was absent or unreadable.
    pub metadata_source: Option<PathBuf>,
    pub curated: Vec<CuratedRecord>,
    /// Every cell type in the measurements, in display order.
    pub cell_types: Vec<String>,
    pub report: ConsistencyReport,
}

impl Dataset {
    /// Reconciles already-loaded tables: curated subset, cell-type order and
    /// the consistency report.
    pub fn from_tables(
        measurements: Vec<MeasurementRow>,
        metadata: MetadataTable,
        metadata_source: Option<PathBuf>,
    ) -> Self {
        let curated = derive_curated_subset(&metadata, &measurements);
        let cell_types = sorted_cell_types(&measurements);
        let report = check_consistency(&measurements, &metadata, &curated);
        report.log();
        Self {
            measurements,
            metadata,
            metadata_source,
            curated,
            cell_types,
            report,
        }
    }

    pub fn has_curated_data(&self) -> bool {
        !self.curated.is_empty()
    }

    pub fn curated_ids(&self) -> HashSet<&str> {
        self.curated.iter().map(|r| r.enhancer_id.as_str()).collect()
    }

    pub fn curated_record(&self, enhancer_id: &str) -> Option<&CuratedRecord> {
        self.curated.iter().find(|r| r.enhancer_id == enhancer_id)
    }

    /// Metadata rows of curated enhancers, in table order.
    pub fn base_metadata(&self) -> Vec<&MetadataRow> {
        let ids = self.curated_ids();
        self.metadata
            .rows
            .iter()
            .filter(|r| ids.contains(r.enhancer_id.as_str()))
            .collect()
    }

    pub fn measurements_for<'a>(
        &'a self,
        enhancer_id: &'a str,
    ) -> impl Iterator<Item = &'a MeasurementRow> + 'a {
        self.measurements
            .iter()
            .filter(move |r| r.enhancer_id == enhancer_id)
    }
}

/// Reads every input file and builds a fresh [`Dataset`].
///
/// Missing or empty measurements are fatal. Missing or unreadable metadata is
/// logged and treated as an empty table.
pub fn load(config: &DashboardConfig) -> Result<Dataset> {
    info!("Loading data from '{}'", config.data_dir.display());
    let measurements = load_measurements(&config.data_dir, &config.chunk_patterns)?;
    if measurements.is_empty() {
        return Err(HofError::String(format!(
            "Measurement chunks in '{}' contain no rows",
            config.data_dir.display()
        )));
    }

    let metadata_path = config.metadata_path();
    let (metadata, metadata_source) = match load_metadata(&metadata_path) {
        Ok(Some(table)) => (table, Some(metadata_path)),
        Ok(None) => (MetadataTable::default(), None),
        Err(e) => {
            error!("Error loading metadata '{}': {e}", metadata_path.display());
            (MetadataTable::default(), None)
        }
    };

    Ok(Dataset::from_tables(measurements, metadata, metadata_source))
}

/// Like [`load`], but each configuration is loaded at most once per process.
/// There is no invalidation; changed files need a restart.
pub fn load_cached(config: &DashboardConfig) -> Result<Arc<Dataset>> {
    let mut cache = DATASET_CACHE
        .lock()
        .map_err(|_| HofError::String("Dataset cache lock poisoned".to_string()))?;
    if let Some(dataset) = cache.get(config) {
        return Ok(dataset.clone());
    }
    let dataset = Arc::new(load(config)?);
    cache.insert(config.clone(), dataset.clone());
    Ok(dataset)
}
