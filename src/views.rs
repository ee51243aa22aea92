//! What the dashboard shows for a given selection: a summary table of the
//! matching curated enhancers, or the detail panel of one of them.

use crate::{
    curated::CuratedRecord,
    filters::{candidate_enhancers, Facet, FilterSelections},
    imaging::{imaging_sections, ExperimentKind, ImagingSection},
    loader::Dataset,
    metadata::MetadataRow,
};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

pub const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub enhancer: String,
    pub location: String,
    pub length_bp: i64,
    pub cargo: String,
    pub experiment: String,
    pub gene: String,
    pub gc_delivered: String,
    /// Distinct experiment types recorded for this enhancer.
    pub experiments: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailAttributes {
    pub cargo: Option<String>,
    pub experiment: Option<String>,
    pub gene: Option<String>,
    pub gc_delivered: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImagingPanel {
    /// Experiment and GC amount of the metadata row the links came from.
    pub experiment: Option<String>,
    pub gc_delivered: Option<String>,
    pub experiment_kind: ExperimentKind,
    /// Non-empty sections in display order; empty means "no imaging data".
    pub sections: Vec<ImagingSection>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellTypeBar {
    pub cell_type: String,
    pub mean_accessibility: f64,
    pub values: Vec<f64>,
}

impl CellTypeBar {
    pub fn replicates(&self) -> usize {
        self.values.len()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessibilityChart {
    pub enhancer_id: String,
    /// Set when the chart is restricted to one cell type.
    pub cell_type: Option<String>,
    /// Measurements of the enhancer before the cell-type restriction.
    pub enhancer_rows: usize,
    pub bars: Vec<CellTypeBar>,
}

impl AccessibilityChart {
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn max_accessibility(&self) -> f64 {
        self.bars
            .iter()
            .flat_map(|b| b.values.iter().copied())
            .fold(0.0, f64::max)
    }

    /// Message for an empty chart.
    pub fn empty_message(&self) -> String {
        match (&self.cell_type, self.enhancer_rows) {
            (_, 0) => "No peak accessibility data available for this enhancer.".to_string(),
            (Some(cell_type), _) => {
                format!("No accessibility data available for {cell_type} cell type.")
            }
            (None, _) => "No accessibility data available.".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailView {
    pub enhancer_id: String,
    pub chr: String,
    pub start: i64,
    pub end: i64,
    pub length_bp: i64,
    /// From the enhancer's first metadata row; `None` without metadata.
    pub attributes: Option<DetailAttributes>,
    pub imaging: Option<ImagingPanel>,
    pub chart: AccessibilityChart,
}

impl DetailView {
    pub fn location(&self) -> String {
        format!("{}:{}-{}", self.chr, self.start, self.end)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum DashboardView {
    /// Nothing curated was loaded; rendering stops here.
    NoCuratedData,
    /// Filters exclude every curated enhancer.
    NoMatches,
    Summary { rows: Vec<SummaryRow> },
    Detail(Box<DetailView>),
    EnhancerNotFound { enhancer_id: String },
}

fn or_na(value: Option<&String>) -> String {
    value.cloned().unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

pub fn summary_row(dataset: &Dataset, record: &CuratedRecord) -> SummaryRow {
    let first = dataset.metadata.first_for(&record.enhancer_id);
    let experiments = dataset
        .metadata
        .rows_for(&record.enhancer_id)
        .filter_map(|r| r.experiment.as_deref())
        .unique()
        .count();
    let (cargo, experiment, gene, gc_delivered) = match first {
        Some(row) => (
            or_na(row.cargo.as_ref()),
            or_na(row.experiment.as_ref()),
            or_na(row.proximal_gene.as_ref()),
            or_na(row.gc_delivered.as_ref()),
        ),
        None => (
            NOT_AVAILABLE.to_string(),
            NOT_AVAILABLE.to_string(),
            NOT_AVAILABLE.to_string(),
            NOT_AVAILABLE.to_string(),
        ),
    };
    SummaryRow {
        enhancer: record.enhancer_id.clone(),
        location: record.location(),
        length_bp: record.length(),
        cargo,
        experiment,
        gene,
        gc_delivered,
        experiments,
    }
}

/// Picks the metadata row whose imaging links belong to the selected
/// experiment, narrowed by the GC amount when one is selected. Without an
/// experiment selection, or without a match, the enhancer's first row is used.
pub fn imaging_row<'a>(
    dataset: &'a Dataset,
    enhancer_id: &'a str,
    selections: &FilterSelections,
) -> Option<&'a MetadataRow> {
    let gc_delivered = selections.selected(Facet::GcDelivered);
    selections
        .selected(Facet::Experiment)
        .and_then(|experiment| {
            dataset.metadata.rows_for(enhancer_id).find(|row| {
                row.experiment.as_deref() == Some(experiment)
                    && gc_delivered.is_none_or(|gc| row.gc_delivered.as_deref() == Some(gc))
            })
        })
        .or_else(|| dataset.metadata.first_for(enhancer_id))
}

pub fn imaging_panel(row: &MetadataRow) -> ImagingPanel {
    let experiment_kind = ExperimentKind::from_experiment(row.experiment.as_deref());
    ImagingPanel {
        experiment: row.experiment.clone(),
        gc_delivered: row.gc_delivered.clone(),
        experiment_kind,
        sections: imaging_sections(&row.imaging, experiment_kind),
    }
}

/// Accessibility by cell type, bars in the global cell-type order.
pub fn accessibility_chart(
    dataset: &Dataset,
    enhancer_id: &str,
    cell_type: Option<&str>,
) -> AccessibilityChart {
    let rows: Vec<_> = dataset.measurements_for(enhancer_id).collect();
    let enhancer_rows = rows.len();
    let bars = dataset
        .cell_types
        .iter()
        .filter(|ct| cell_type.is_none_or(|wanted| wanted == ct.as_str()))
        .filter_map(|ct| {
            let values: Vec<f64> = rows
                .iter()
                .filter(|r| &r.cell_type == ct)
                .map(|r| r.accessibility)
                .collect();
            if values.is_empty() {
                return None;
            }
            Some(CellTypeBar {
                cell_type: ct.clone(),
                mean_accessibility: values.iter().sum::<f64>() / values.len() as f64,
                values,
            })
        })
        .collect();
    AccessibilityChart {
        enhancer_id: enhancer_id.to_string(),
        cell_type: cell_type.map(str::to_string),
        enhancer_rows,
        bars,
    }
}

pub fn detail_view(
    dataset: &Dataset,
    record: &CuratedRecord,
    selections: &FilterSelections,
) -> DetailView {
    let attributes = dataset
        .metadata
        .first_for(&record.enhancer_id)
        .map(|row| DetailAttributes {
            cargo: row.cargo.clone(),
            experiment: row.experiment.clone(),
            gene: row.proximal_gene.clone(),
            gc_delivered: row.gc_delivered.clone(),
        });
    let imaging = imaging_row(dataset, &record.enhancer_id, selections).map(imaging_panel);
    DetailView {
        enhancer_id: record.enhancer_id.clone(),
        chr: record.chr.clone(),
        start: record.start,
        end: record.end,
        length_bp: record.length(),
        attributes,
        imaging,
        chart: accessibility_chart(
            dataset,
            &record.enhancer_id,
            selections.selected(Facet::CellType),
        ),
    }
}

pub fn build_view(dataset: &Dataset, selections: &FilterSelections) -> DashboardView {
    if !dataset.has_curated_data() {
        return DashboardView::NoCuratedData;
    }
    let candidates = candidate_enhancers(dataset, selections);
    if candidates.is_empty() {
        return DashboardView::NoMatches;
    }
    match selections.selected(Facet::Enhancer) {
        None => DashboardView::Summary {
            rows: candidates
                .iter()
                .filter_map(|id| dataset.curated_record(id))
                .map(|record| summary_row(dataset, record))
                .collect(),
        },
        Some(enhancer_id) => match candidates
            .contains(&enhancer_id)
            .then(|| dataset.curated_record(enhancer_id))
            .flatten()
        {
            Some(record) => {
                DashboardView::Detail(Box::new(detail_view(dataset, record, selections)))
            }
            None => DashboardView::EnhancerNotFound {
                enhancer_id: enhancer_id.to_string(),
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::DashboardConfig,
        imaging::ImageryKind,
        loader::{load, tests::write_fixture},
    };
    use tempfile::tempdir;

    fn dataset() -> Dataset {
        let td = tempdir().unwrap();
        write_fixture(td.path());
        load(&DashboardConfig::default().with_data_dir(td.path())).unwrap()
    }

    fn detail(view: DashboardView) -> DetailView {
        match view {
            DashboardView::Detail(detail) => *detail,
            other => panic!("expected detail view, got {other:?}"),
        }
    }

    #[test]
    fn test_summary_lists_all_curated() {
        let dataset = dataset();
        let view = build_view(&dataset, &FilterSelections::default());
        let DashboardView::Summary { rows } = view else {
            panic!("expected summary");
        };
        assert_eq!(rows.len(), 3);
        let e1 = &rows[0];
        assert_eq!(e1.enhancer, "E1");
        assert_eq!(e1.location, "chr1:100-600");
        assert_eq!(e1.length_bp, 500);
        assert_eq!(e1.cargo, "GFP");
        assert_eq!(e1.experiment, "LIGHTSHEET");
        assert_eq!(e1.gc_delivered, "1e9");
        assert_eq!(e1.experiments, 2);
        // E3 has an empty gene and no GC amount.
        assert_eq!(rows[2].gene, "");
        assert_eq!(rows[2].gc_delivered, NOT_AVAILABLE);
    }

    #[test]
    fn test_attribute_filters_must_match_one_row() {
        let dataset = dataset();
        let selections = FilterSelections::default()
            .with(Facet::Experiment, "EPI")
            .with(Facet::GcDelivered, "1e10");
        let ids = candidate_enhancers(&dataset, &selections);
        assert_eq!(ids, vec!["E1", "E2"]);

        // E1 has a LIGHTSHEET row and a 1e10 row, but no single row with both.
        let selections = FilterSelections::default()
            .with(Facet::Experiment, "LIGHTSHEET")
            .with(Facet::GcDelivered, "1e10");
        assert_eq!(build_view(&dataset, &selections), DashboardView::NoMatches);
    }

    #[test]
    fn test_detail_surfaces_selected_experiment_imaging() {
        let dataset = dataset();
        let selections = FilterSelections::default()
            .with(Facet::Enhancer, "E1")
            .with(Facet::Experiment, "EPI");
        let view = detail(build_view(&dataset, &selections));
        let imaging = view.imaging.unwrap();
        assert_eq!(imaging.experiment.as_deref(), Some("EPI"));
        assert_eq!(imaging.gc_delivered.as_deref(), Some("1e10"));
        assert_eq!(imaging.experiment_kind, ExperimentKind::Epi);
        assert_eq!(imaging.sections.len(), 1);
        assert_eq!(imaging.sections[0].kind, ImageryKind::ContactSheet);
        assert_eq!(
            imaging.sections[0].links,
            vec!["https://img/e1-epi-a.png", "https://img/e1-epi-b.png"]
        );
        // Header attributes still come from the first metadata row.
        assert_eq!(
            view.attributes.unwrap().experiment.as_deref(),
            Some("LIGHTSHEET")
        );
    }

    #[test]
    fn test_detail_falls_back_to_first_row_for_imaging() {
        let dataset = dataset();
        let selections = FilterSelections::default().with(Facet::Enhancer, "E1");
        let view = detail(build_view(&dataset, &selections));
        assert_eq!(view.location(), "chr1:100-600");
        assert_eq!(view.length_bp, 500);
        let imaging = view.imaging.unwrap();
        assert_eq!(imaging.experiment_kind, ExperimentKind::Lightsheet);
        let kinds: Vec<ImageryKind> = imaging.sections.iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![ImageryKind::Viewer, ImageryKind::MipProjection, ImageryKind::ContactSheet]
        );
    }

    #[test]
    fn test_gc_alone_does_not_pick_imaging_row() {
        let dataset = dataset();
        // Only the EPI row has 1e10, but without an experiment the first row is shown.
        let selections = FilterSelections::default()
            .with(Facet::Enhancer, "E1")
            .with(Facet::GcDelivered, "1e10");
        let row = imaging_row(&dataset, "E1", &selections).unwrap();
        assert_eq!(row.experiment.as_deref(), Some("LIGHTSHEET"));
        assert_eq!(row.gc_delivered.as_deref(), Some("1e9"));

        // Experiment and GC that never occur together fall back to the first row.
        let selections = FilterSelections::default()
            .with(Facet::Experiment, "EPI")
            .with(Facet::GcDelivered, "1e9");
        let row = imaging_row(&dataset, "E1", &selections).unwrap();
        assert_eq!(row.experiment.as_deref(), Some("LIGHTSHEET"));

        let selections = FilterSelections::default()
            .with(Facet::Experiment, "EPI")
            .with(Facet::GcDelivered, "1e10");
        let row = imaging_row(&dataset, "E1", &selections).unwrap();
        assert_eq!(row.experiment.as_deref(), Some("EPI"));
    }

    #[test]
    fn test_detail_without_imaging_links() {
        let dataset = dataset();
        let selections = FilterSelections::default().with(Facet::Enhancer, "E2");
        let view = detail(build_view(&dataset, &selections));
        assert!(view.imaging.unwrap().sections.is_empty());
    }

    #[test]
    fn test_chart_groups_by_cell_type() {
        let dataset = dataset();
        let chart = accessibility_chart(&dataset, "E1", None);
        assert_eq!(chart.enhancer_rows, 3);
        let cell_types: Vec<&str> = chart.bars.iter().map(|b| b.cell_type.as_str()).collect();
        assert_eq!(cell_types, vec!["2-Glia", "10-Neuron"]);
        assert_eq!(chart.bars[0].replicates(), 2);
        assert_eq!(chart.bars[0].mean_accessibility, 2.0);
        assert_eq!(chart.max_accessibility(), 2.5);
    }

    #[test]
    fn test_chart_restricted_to_cell_type() {
        let dataset = dataset();
        let selections = FilterSelections::default()
            .with(Facet::Enhancer, "E1")
            .with(Facet::CellType, "10-Neuron");
        let view = detail(build_view(&dataset, &selections));
        assert_eq!(view.chart.bars.len(), 1);
        assert_eq!(view.chart.bars[0].values, vec![0.5]);

        let chart = accessibility_chart(&dataset, "E2", Some("Unknown"));
        assert!(chart.is_empty());
        assert_eq!(
            chart.empty_message(),
            "No accessibility data available for Unknown cell type."
        );
    }

    #[test]
    fn test_enhancer_outside_candidates_is_not_found() {
        let dataset = dataset();
        let selections = FilterSelections::default()
            .with(Facet::Enhancer, "E1")
            .with(Facet::Cargo, "mCherry");
        assert_eq!(
            build_view(&dataset, &selections),
            DashboardView::EnhancerNotFound {
                enhancer_id: "E1".to_string()
            }
        );
    }

    #[test]
    fn test_no_curated_data() {
        let dataset = Dataset::default();
        assert_eq!(
            build_view(&dataset, &FilterSelections::default()),
            DashboardView::NoCuratedData
        );
    }
}
