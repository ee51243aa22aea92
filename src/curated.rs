//! The curated ("hall of fame") subset and the load-time consistency check.

use crate::{
    measurements::{count_inverted_intervals, MeasurementRow},
    metadata::{MetadataRow, MetadataTable},
};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{info, warn};

/// One hall-of-fame enhancer: location from its first measurement, attributes
/// from its first metadata row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CuratedRecord {
    pub enhancer_id: String,
    pub chr: String,
    pub start: i64,
    pub end: i64,
    pub cargo: Option<String>,
    pub experiment: Option<String>,
    pub proximal_gene: Option<String>,
    pub gc_delivered: Option<String>,
}

impl CuratedRecord {
    pub fn length(&self) -> i64 {
        self.end - self.start
    }

    pub fn location(&self) -> String {
        format!("{}:{}-{}", self.chr, self.start, self.end)
    }
}

/// Builds the curated subset, ordered by enhancer id.
///
/// An enhancer qualifies when at least one metadata row carries the exact
/// `"TRUE"` hall-of-fame flag and it has at least one measurement.
pub fn derive_curated_subset(
    metadata: &MetadataTable,
    measurements: &[MeasurementRow],
) -> Vec<CuratedRecord> {
    if metadata.is_empty() {
        warn!("No metadata available - cannot identify Hall of Fame enhancers");
        return vec![];
    }

    let hof_rows: Vec<&MetadataRow> = metadata
        .rows
        .iter()
        .filter(|r| r.is_hall_of_fame())
        .collect();
    info!("Found {} Hall of Fame records in metadata", hof_rows.len());
    if hof_rows.is_empty() {
        return vec![];
    }
    let hof_ids: HashSet<&str> = hof_rows.iter().map(|r| r.enhancer_id.as_str()).collect();
    info!("Found {} unique Hall of Fame enhancers", hof_ids.len());

    let mut first_measurement: BTreeMap<&str, &MeasurementRow> = BTreeMap::new();
    for row in measurements {
        if hof_ids.contains(row.enhancer_id.as_str()) {
            first_measurement.entry(row.enhancer_id.as_str()).or_insert(row);
        }
    }

    let mut first_metadata: HashMap<&str, &MetadataRow> = HashMap::new();
    for row in &metadata.rows {
        first_metadata.entry(row.enhancer_id.as_str()).or_insert(row);
    }

    let curated: Vec<CuratedRecord> = first_measurement
        .into_iter()
        .map(|(id, m)| {
            let meta = first_metadata.get(id).copied();
            CuratedRecord {
                enhancer_id: id.to_string(),
                chr: m.chr.clone(),
                start: m.start,
                end: m.end,
                cargo: meta.and_then(|r| r.cargo.clone()),
                experiment: meta.and_then(|r| r.experiment.clone()),
                proximal_gene: meta.and_then(|r| r.proximal_gene.clone()),
                gc_delivered: meta.and_then(|r| r.gc_delivered.clone()),
            }
        })
        .collect();

    let missing = hof_ids.len() - curated.len();
    if missing > 0 {
        warn!("{missing} Hall of Fame enhancers have no measurements and are left out");
    }
    info!(
        "Extracted {} Hall of Fame enhancers, {} with cargo",
        curated.len(),
        curated.iter().filter(|r| r.cargo.is_some()).count()
    );
    curated
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsistencyReport {
    pub measurement_rows: usize,
    pub measurement_enhancers: usize,
    pub cell_types: usize,
    pub metadata_rows: usize,
    pub metadata_enhancers: usize,
    pub curated_rows: usize,
    pub common_enhancers: usize,
    pub inverted_intervals: usize,
}

impl ConsistencyReport {
    pub fn log(&self) {
        if self.measurement_rows > 0 {
            info!(
                "Measurements: {} rows, {} enhancers, {} cell types",
                self.measurement_rows, self.measurement_enhancers, self.cell_types
            );
        } else {
            warn!("Measurements missing or empty");
        }
        if self.metadata_rows > 0 {
            info!(
                "Metadata: {} records, {} enhancers",
                self.metadata_rows, self.metadata_enhancers
            );
        } else {
            warn!("Metadata missing or empty");
        }
        info!("Curated enhancers: {}", self.curated_rows);
        info!(
            "Common enhancers between datasets: {}",
            self.common_enhancers
        );
        if self.inverted_intervals > 0 {
            warn!("Rows with start >= end: {}", self.inverted_intervals);
        }
    }
}

/// Counts rows and shared identifiers. Read-only; never fails.
pub fn check_consistency(
    measurements: &[MeasurementRow],
    metadata: &MetadataTable,
    curated: &[CuratedRecord],
) -> ConsistencyReport {
    let measurement_ids: HashSet<&str> = measurements
        .iter()
        .map(|r| r.enhancer_id.as_str())
        .collect();
    let metadata_ids: HashSet<&str> = metadata
        .rows
        .iter()
        .map(|r| r.enhancer_id.as_str())
        .collect();
    ConsistencyReport {
        measurement_rows: measurements.len(),
        measurement_enhancers: measurement_ids.len(),
        cell_types: measurements.iter().map(|r| r.cell_type.as_str()).unique().count(),
        metadata_rows: metadata.len(),
        metadata_enhancers: metadata_ids.len(),
        curated_rows: curated.len(),
        common_enhancers: measurement_ids.intersection(&metadata_ids).count(),
        inverted_intervals: count_inverted_intervals(measurements),
    }
}
