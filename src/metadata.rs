//! Enhancer and experiment metadata: loading, column renaming and typed rows.

use crate::{
    error::{HofError, Result},
    imaging::{normalize_links, ImagingLinks},
};
use arrow::{array::Array, ipc::reader::FileReader, util::display::array_value_to_string};
use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fs::File, path::Path};
use tracing::{debug, info, warn};

pub const COL_ENHANCER_ID: &str = "enhancer_id";
pub const COL_CARGO: &str = "cargo";
pub const COL_EXPERIMENT: &str = "experiment";
pub const COL_PROXIMAL_GENE: &str = "proximal_gene";
pub const COL_GC_DELIVERED: &str = "GC delivered";
pub const COL_HALL_OF_FAME: &str = "Hall_of_fame";
pub const COL_IMAGE_LINK: &str = "image_link";
pub const COL_NEUROGLANCER_1: &str = "neuroglancer_1";
pub const COL_NEUROGLANCER_3: &str = "neuroglancer_3";
pub const COL_VIEWER_LINK: &str = "viewer_link";
pub const COL_CORONAL_MIP: &str = "coronal_mip";
pub const COL_SAGITTAL_MIP: &str = "sagittal_mip";

/// Only this exact literal marks a hall-of-fame row.
pub const HALL_OF_FAME_MARKER: &str = "TRUE";

/// Source column name -> internal column name. Unlisted columns pass through.
pub const COLUMN_RENAMES: [(&str, &str); 10] = [
    ("Enhancer_ID", COL_ENHANCER_ID),
    ("Cargo", COL_CARGO),
    ("Experiment_Type", COL_EXPERIMENT),
    ("Proximal_Gene", COL_PROXIMAL_GENE),
    ("Image_link", COL_IMAGE_LINK),
    ("Neuroglancer 1", COL_NEUROGLANCER_1),
    ("Neuroglancer 3", COL_NEUROGLANCER_3),
    ("Viewer Link", COL_VIEWER_LINK),
    ("Coronal_MIP", COL_CORONAL_MIP),
    ("Sagittal_MIP", COL_SAGITTAL_MIP),
];

const TYPED_COLUMNS: [&str; 12] = [
    COL_ENHANCER_ID,
    COL_CARGO,
    COL_EXPERIMENT,
    COL_PROXIMAL_GENE,
    COL_GC_DELIVERED,
    COL_HALL_OF_FAME,
    COL_IMAGE_LINK,
    COL_NEUROGLANCER_1,
    COL_NEUROGLANCER_3,
    COL_VIEWER_LINK,
    COL_CORONAL_MIP,
    COL_SAGITTAL_MIP,
];

pub fn rename_column(name: &str) -> String {
    COLUMN_RENAMES
        .iter()
        .find(|(source, _)| *source == name)
        .map(|(_, internal)| internal.to_string())
        .unwrap_or_else(|| name.to_string())
}

/// Untyped table as read from disk: column names plus optional text cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl RawTable {
    pub fn from_arrow_ipc(path: &Path) -> Result<Self> {
        let reader = FileReader::try_new(File::open(path)?, None)?;
        let columns = reader
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().to_string())
            .collect();
        let mut rows = vec![];
        for batch in reader {
            let batch = batch?;
            for row in 0..batch.num_rows() {
                let mut cells = Vec::with_capacity(batch.num_columns());
                for column in batch.columns() {
                    if column.is_null(row) {
                        cells.push(None);
                    } else {
                        cells.push(Some(array_value_to_string(column.as_ref(), row)?));
                    }
                }
                rows.push(cells);
            }
        }
        Ok(Self { columns, rows })
    }

    pub fn from_csv(path: &Path) -> Result<Self> {
        let mut rdr = ReaderBuilder::new().has_headers(true).from_path(path)?;
        let columns = rdr.headers()?.iter().map(|s| s.to_string()).collect();
        let mut rows = vec![];
        for record in rdr.records() {
            let record = record?;
            rows.push(
                record
                    .iter()
                    .map(|s| (!s.is_empty()).then(|| s.to_string()))
                    .collect(),
            );
        }
        Ok(Self { columns, rows })
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        match extension.as_str() {
            "feather" | "arrow" | "ipc" => Self::from_arrow_ipc(path),
            "csv" => Self::from_csv(path),
            _ => Err(HofError::UnsupportedMetadataFormat(path.to_path_buf())),
        }
    }

    /// Applies the rename table and reports which columns changed.
    pub fn rename_columns(&mut self) -> Vec<(String, String)> {
        let mut renamed = vec![];
        for column in self.columns.iter_mut() {
            let internal = rename_column(column);
            if internal != *column {
                renamed.push((column.clone(), internal.clone()));
                *column = internal;
            }
        }
        renamed
    }
}

/// One metadata record (one enhancer in one experiment).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetadataRow {
    pub enhancer_id: String,
    pub cargo: Option<String>,
    pub experiment: Option<String>,
    pub proximal_gene: Option<String>,
    pub gc_delivered: Option<String>,
    pub hall_of_fame: Option<String>,
    pub imaging: ImagingLinks,
    /// Pass-through columns, keyed by their (renamed) column name.
    pub extra: BTreeMap<String, Option<String>>,
}

impl MetadataRow {
    pub fn is_hall_of_fame(&self) -> bool {
        self.hall_of_fame.as_deref() == Some(HALL_OF_FAME_MARKER)
    }

    fn from_cells(columns: &[String], cells: Vec<Option<String>>) -> Option<Self> {
        let mut named: BTreeMap<String, Option<String>> =
            columns.iter().cloned().zip(cells).collect();
        let mut take = |name: &str| named.remove(name).flatten();

        let enhancer_id = take(COL_ENHANCER_ID).filter(|id| !id.is_empty())?;
        let cargo = take(COL_CARGO);
        let experiment = take(COL_EXPERIMENT);
        let proximal_gene = take(COL_PROXIMAL_GENE);
        let gc_delivered = take(COL_GC_DELIVERED);
        let hall_of_fame = take(COL_HALL_OF_FAME);
        let imaging = ImagingLinks {
            image_link: normalize_links(take(COL_IMAGE_LINK).as_deref()),
            neuroglancer_1: normalize_links(take(COL_NEUROGLANCER_1).as_deref()),
            neuroglancer_3: normalize_links(take(COL_NEUROGLANCER_3).as_deref()),
            viewer_link: normalize_links(take(COL_VIEWER_LINK).as_deref()),
            coronal_mip: normalize_links(take(COL_CORONAL_MIP).as_deref()),
            sagittal_mip: normalize_links(take(COL_SAGITTAL_MIP).as_deref()),
        };
        Some(Self {
            enhancer_id,
            cargo,
            experiment,
            proximal_gene,
            gc_delivered,
            hall_of_fame,
            imaging,
            extra: named,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetadataTable {
    /// Column names after renaming, in file order.
    pub columns: Vec<String>,
    pub rows: Vec<MetadataRow>,
}

impl MetadataTable {
    pub fn from_raw(raw: RawTable) -> Self {
        let RawTable { columns, rows } = raw;
        let total = rows.len();
        let rows: Vec<MetadataRow> = rows
            .into_iter()
            .filter_map(|cells| MetadataRow::from_cells(&columns, cells))
            .collect();
        if rows.len() < total {
            warn!(
                "Dropped {} metadata rows without an enhancer id",
                total - rows.len()
            );
        }
        for column in TYPED_COLUMNS {
            if !columns.iter().any(|c| c == column) {
                debug!("Metadata has no '{column}' column");
            }
        }
        Self { columns, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows_for<'a>(&'a self, enhancer_id: &'a str) -> impl Iterator<Item = &'a MetadataRow> + 'a {
        self.rows.iter().filter(move |r| r.enhancer_id == enhancer_id)
    }

    /// First metadata row for an enhancer; the representative one.
    pub fn first_for(&self, enhancer_id: &str) -> Option<&MetadataRow> {
        self.rows.iter().find(|r| r.enhancer_id == enhancer_id)
    }
}

/// Loads the metadata table. A missing file is not an error: `Ok(None)`.
pub fn load_metadata(path: &Path) -> Result<Option<MetadataTable>> {
    if !path.exists() {
        warn!("Metadata file not found at '{}'", path.display());
        return Ok(None);
    }
    let mut raw = RawTable::from_path(path)?;
    info!("Loaded metadata: {} records", raw.rows.len());
    let renamed = raw.rename_columns();
    debug!("Renamed columns: {renamed:?}");
    debug!("Metadata columns: {:?}", raw.columns);
    Ok(Some(MetadataTable::from_raw(raw)))
}
