//! Chunked accessibility measurements: discovery, loading and de-duplication.

use crate::error::{HofError, Result};
use globset::Glob;
use itertools::Itertools;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info, warn};

/// Rank given to cell types without a leading number; they sort last.
pub const UNRANKED_CELL_TYPE: u64 = 999;

lazy_static! {
    static ref LEADING_NUMBER: Regex = Regex::new(r"^(\d+)").expect("valid regex");
}

/// One accessibility measurement of an enhancer in one cell type/replicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementRow {
    pub enhancer_id: String,
    pub chr: String,
    pub start: i64,
    pub end: i64,
    pub cell_type: String,
    pub accessibility: f64,
}

impl MeasurementRow {
    pub fn length(&self) -> i64 {
        self.end - self.start
    }

    pub fn location(&self) -> String {
        format!("{}:{}-{}", self.chr, self.start, self.end)
    }

    fn dedup_key(&self) -> (&str, &str, i64, i64, &str, u64) {
        (
            &self.enhancer_id,
            &self.chr,
            self.start,
            self.end,
            &self.cell_type,
            // 0.0 and -0.0 are the same score.
            (self.accessibility + 0.0).to_bits(),
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeasurementSummary {
    pub total_enhancers: usize,
    pub total_measurements: usize,
    pub cell_types: usize,
    pub chromosomes: usize,
    pub max_accessibility: f64,
    pub mean_accessibility: f64,
}

/// Lists chunk files: for each pattern in order, the matching file names in
/// ascending order.
pub fn discover_chunk_files(dir: &Path, patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut names: Vec<String> = vec![];
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            names.push(entry.file_name().to_string_lossy().to_string());
        }
    }
    names.sort();

    let mut ret = vec![];
    for pattern in patterns {
        let matcher = Glob::new(pattern)
            .map_err(|e| HofError::InvalidPattern {
                pattern: pattern.to_string(),
                message: e.to_string(),
            })?
            .compile_matcher();
        let matched: Vec<&String> = names.iter().filter(|n| matcher.is_match(n)).collect();
        info!("Pattern {pattern}: found {} files", matched.len());
        ret.extend(matched.into_iter().map(|n| dir.join(n)));
    }
    Ok(ret)
}

/// A chunk row as read from disk. Empty or unparsable scores become `None`.
#[derive(Deserialize)]
struct ChunkRecord {
    enhancer_id: String,
    chr: String,
    start: i64,
    end: i64,
    cell_type: String,
    #[serde(deserialize_with = "csv::invalid_option")]
    accessibility: Option<f64>,
}

impl ChunkRecord {
    fn into_row(self) -> Option<MeasurementRow> {
        let accessibility = self.accessibility.filter(|v| !v.is_nan())?;
        Some(MeasurementRow {
            enhancer_id: self.enhancer_id,
            chr: self.chr,
            start: self.start,
            end: self.end,
            cell_type: self.cell_type,
            accessibility,
        })
    }
}

/// Reads one chunk file. Rows without a numeric accessibility score are
/// skipped with a warning.
pub fn read_chunk(path: &Path) -> Result<Vec<MeasurementRow>> {
    let file = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let mut rdr = csv::Reader::from_path(path)?;
    let mut rows = vec![];
    let mut skipped = 0;
    for record in rdr.deserialize::<ChunkRecord>() {
        match record?.into_row() {
            Some(row) => rows.push(row),
            None => skipped += 1,
        }
    }
    if skipped > 0 {
        warn!("{file}: skipped {skipped} rows without an accessibility score");
    }
    debug!("Loaded {file}: {} rows", rows.len());
    Ok(rows)
}

/// Drops exact duplicate rows, keeping the first occurrence.
pub fn drop_duplicates(rows: Vec<MeasurementRow>) -> Vec<MeasurementRow> {
    let keep: Vec<bool> = {
        let mut seen = HashSet::with_capacity(rows.len());
        rows.iter().map(|row| seen.insert(row.dedup_key())).collect()
    };
    rows.into_iter()
        .zip(keep)
        .filter_map(|(row, first)| first.then_some(row))
        .collect()
}

/// Loads and concatenates every chunk file, then removes duplicates.
/// Fails when no chunk file matches any pattern.
pub fn load_measurements(dir: &Path, patterns: &[String]) -> Result<Vec<MeasurementRow>> {
    let files = discover_chunk_files(dir, patterns)?;
    if files.is_empty() {
        return Err(HofError::NoMeasurementFiles {
            dir: dir.to_path_buf(),
            patterns: patterns.to_vec(),
        });
    }

    let mut combined = vec![];
    for file in &files {
        combined.extend(read_chunk(file)?);
    }
    info!(
        "Combined {} chunks: {} total rows",
        files.len(),
        combined.len()
    );

    let before = combined.len();
    let combined = drop_duplicates(combined);
    if combined.len() < before {
        info!("Removed {} duplicate rows", before - combined.len());
    }

    let inverted = count_inverted_intervals(&combined);
    if inverted > 0 {
        warn!("{inverted} measurement rows have start >= end");
    }
    Ok(combined)
}

pub fn count_inverted_intervals(rows: &[MeasurementRow]) -> usize {
    rows.iter().filter(|r| r.start >= r.end).count()
}

/// Sort rank of a cell-type label: its leading integer, if any.
pub fn cell_type_rank(label: &str) -> u64 {
    LEADING_NUMBER
        .captures(label)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<u64>().ok())
        .unwrap_or(UNRANKED_CELL_TYPE)
}

/// Stable sort of cell-type labels by their leading number.
pub fn sort_cell_types(labels: &mut [String]) {
    labels.sort_by_key(|label| cell_type_rank(label));
}

/// Distinct cell types in first-appearance order, sorted by rank.
pub fn sorted_cell_types(rows: &[MeasurementRow]) -> Vec<String> {
    let mut labels: Vec<String> = rows.iter().map(|r| r.cell_type.clone()).unique().collect();
    sort_cell_types(&mut labels);
    labels
}

pub fn measurement_summary(rows: &[MeasurementRow]) -> MeasurementSummary {
    if rows.is_empty() {
        return MeasurementSummary::default();
    }
    let max_accessibility = rows
        .iter()
        .map(|r| r.accessibility)
        .fold(f64::NEG_INFINITY, f64::max);
    let mean_accessibility =
        rows.iter().map(|r| r.accessibility).sum::<f64>() / rows.len() as f64;
    MeasurementSummary {
        total_enhancers: rows.iter().map(|r| r.enhancer_id.as_str()).unique().count(),
        total_measurements: rows.len(),
        cell_types: rows.iter().map(|r| r.cell_type.as_str()).unique().count(),
        chromosomes: rows.iter().map(|r| r.chr.as_str()).unique().count(),
        max_accessibility,
        mean_accessibility,
    }
}
