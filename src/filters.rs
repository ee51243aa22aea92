//! Cascading facet filters.
//!
//! Each cascading facet offers the distinct values that remain after applying
//! every *other* cascading facet's selection to the curated metadata rows. The
//! cell-type facet never cascades: it always offers every cell type.

use crate::{loader::Dataset, metadata::MetadataRow};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Selection value meaning "no constraint".
pub const ALL: &str = "All";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Facet {
    Enhancer,
    Cargo,
    Experiment,
    Gene,
    GcDelivered,
    CellType,
}

/// Facets whose options depend on the other selections.
pub const CASCADING_FACETS: [Facet; 5] = [
    Facet::Enhancer,
    Facet::Cargo,
    Facet::Experiment,
    Facet::Gene,
    Facet::GcDelivered,
];

/// Facets backed by a metadata attribute (everything but the enhancer id and
/// cell type).
pub const ATTRIBUTE_FACETS: [Facet; 4] = [
    Facet::Cargo,
    Facet::Experiment,
    Facet::Gene,
    Facet::GcDelivered,
];

impl Facet {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Enhancer => "Select Enhancer",
            Self::Cargo => "Filter by Cargo",
            Self::Experiment => "Filter by Experiment",
            Self::Gene => "Filter by Proximal Gene",
            Self::GcDelivered => "Filter by GC Delivered",
            Self::CellType => "Filter by Cell Type",
        }
    }

    /// Value of this facet on a metadata row. Cell type is not a metadata
    /// attribute.
    pub fn metadata_value<'a>(&self, row: &'a MetadataRow) -> Option<&'a str> {
        match self {
            Self::Enhancer => Some(row.enhancer_id.as_str()),
            Self::Cargo => row.cargo.as_deref(),
            Self::Experiment => row.experiment.as_deref(),
            Self::Gene => row.proximal_gene.as_deref(),
            Self::GcDelivered => row.gc_delivered.as_deref(),
            Self::CellType => None,
        }
    }

    /// The facets whose current selection constrains this facet's options.
    pub fn constrained_by(&self) -> &'static [Facet] {
        use Facet::*;
        match self {
            Enhancer => &[Cargo, Experiment, Gene, GcDelivered],
            Cargo => &[Enhancer, Experiment, Gene, GcDelivered],
            Experiment => &[Enhancer, Cargo, Gene, GcDelivered],
            Gene => &[Enhancer, Cargo, Experiment, GcDelivered],
            GcDelivered => &[Enhancer, Cargo, Experiment, Gene],
            CellType => &[],
        }
    }
}

/// Current value of all six facets; `"All"` means unconstrained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSelections {
    pub enhancer: String,
    pub cargo: String,
    pub experiment: String,
    pub gene: String,
    pub gc_delivered: String,
    pub cell_type: String,
}

impl Default for FilterSelections {
    fn default() -> Self {
        Self {
            enhancer: ALL.to_string(),
            cargo: ALL.to_string(),
            experiment: ALL.to_string(),
            gene: ALL.to_string(),
            gc_delivered: ALL.to_string(),
            cell_type: ALL.to_string(),
        }
    }
}

impl FilterSelections {
    pub fn value(&self, facet: Facet) -> &str {
        match facet {
            Facet::Enhancer => &self.enhancer,
            Facet::Cargo => &self.cargo,
            Facet::Experiment => &self.experiment,
            Facet::Gene => &self.gene,
            Facet::GcDelivered => &self.gc_delivered,
            Facet::CellType => &self.cell_type,
        }
    }

    fn value_mut(&mut self, facet: Facet) -> &mut String {
        match facet {
            Facet::Enhancer => &mut self.enhancer,
            Facet::Cargo => &mut self.cargo,
            Facet::Experiment => &mut self.experiment,
            Facet::Gene => &mut self.gene,
            Facet::GcDelivered => &mut self.gc_delivered,
            Facet::CellType => &mut self.cell_type,
        }
    }

    /// The selected value, or `None` for "All".
    pub fn selected(&self, facet: Facet) -> Option<&str> {
        Some(self.value(facet)).filter(|v| *v != ALL)
    }

    pub fn set(&mut self, facet: Facet, value: impl Into<String>) {
        *self.value_mut(facet) = value.into();
    }

    pub fn with(mut self, facet: Facet, value: impl Into<String>) -> Self {
        self.set(facet, value);
        self
    }

    /// Resets every selection that is no longer offered back to "All".
    pub fn reconcile(&self, options: &FacetOptions) -> Self {
        let mut ret = self.clone();
        for facet in CASCADING_FACETS.into_iter().chain([Facet::CellType]) {
            if let Some(value) = self.selected(facet) {
                if !options.values(facet).iter().any(|o| o == value) {
                    ret.set(facet, ALL);
                }
            }
        }
        ret
    }

    fn matches(&self, row: &MetadataRow, facets: &[Facet]) -> bool {
        facets.iter().all(|facet| match self.selected(*facet) {
            Some(wanted) => facet.metadata_value(row) == Some(wanted),
            None => true,
        })
    }
}

/// Selectable values per facet, "All" not included.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetOptions {
    pub enhancers: Vec<String>,
    pub cargos: Vec<String>,
    pub experiments: Vec<String>,
    pub genes: Vec<String>,
    pub gc_delivered: Vec<String>,
    pub cell_types: Vec<String>,
}

impl FacetOptions {
    pub fn values(&self, facet: Facet) -> &[String] {
        match facet {
            Facet::Enhancer => &self.enhancers,
            Facet::Cargo => &self.cargos,
            Facet::Experiment => &self.experiments,
            Facet::Gene => &self.genes,
            Facet::GcDelivered => &self.gc_delivered,
            Facet::CellType => &self.cell_types,
        }
    }

    fn values_mut(&mut self, facet: Facet) -> &mut Vec<String> {
        match facet {
            Facet::Enhancer => &mut self.enhancers,
            Facet::Cargo => &mut self.cargos,
            Facet::Experiment => &mut self.experiments,
            Facet::Gene => &mut self.genes,
            Facet::GcDelivered => &mut self.gc_delivered,
            Facet::CellType => &mut self.cell_types,
        }
    }
}

/// Orders option values. GC amounts sort numerically when every value parses
/// as a number other than NaN, otherwise as text.
fn sort_values(facet: Facet, values: &mut [String]) {
    let as_number = |v: &str| v.trim().parse::<f64>().ok().filter(|n| !n.is_nan());
    if facet == Facet::GcDelivered && values.iter().all(|v| as_number(v.as_str()).is_some()) {
        values.sort_by(|a, b| {
            let a = as_number(a.as_str()).unwrap_or(f64::INFINITY);
            let b = as_number(b.as_str()).unwrap_or(f64::INFINITY);
            a.total_cmp(&b)
        });
    } else {
        values.sort();
    }
}

/// Options still selectable for one cascading facet.
pub fn facet_options(
    facet: Facet,
    selections: &FilterSelections,
    base_metadata: &[&MetadataRow],
) -> Vec<String> {
    let mut values: Vec<String> = base_metadata
        .iter()
        .filter(|row| selections.matches(row, facet.constrained_by()))
        .filter_map(|row| facet.metadata_value(row))
        .filter(|v| !v.is_empty())
        .unique()
        .map(str::to_string)
        .collect();
    sort_values(facet, &mut values);
    values
}

/// Options for all six facets given the current selections.
pub fn options_for(
    selections: &FilterSelections,
    base_metadata: &[&MetadataRow],
    cell_types: &[String],
) -> FacetOptions {
    let mut ret = FacetOptions::default();
    for facet in CASCADING_FACETS {
        *ret.values_mut(facet) = facet_options(facet, selections, base_metadata);
    }
    ret.cell_types = cell_types.to_vec();
    ret
}

/// Curated enhancers that pass the attribute facets, in curated order.
///
/// One metadata row has to satisfy every non-"All" attribute selection. The
/// enhancer facet is not applied here.
pub fn candidate_enhancers<'a>(
    dataset: &'a Dataset,
    selections: &FilterSelections,
) -> Vec<&'a str> {
    let curated = dataset.curated.iter().map(|r| r.enhancer_id.as_str());
    if ATTRIBUTE_FACETS.iter().all(|f| selections.selected(*f).is_none()) {
        return curated.collect();
    }
    let matching: HashSet<&str> = dataset
        .metadata
        .rows
        .iter()
        .filter(|row| selections.matches(row, &ATTRIBUTE_FACETS))
        .map(|row| row.enhancer_id.as_str())
        .collect();
    curated.filter(|id| matching.contains(id)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(id: &str, cargo: &str, experiment: &str, gene: &str, gc: &str) -> MetadataRow {
        let opt = |s: &str| (!s.is_empty()).then(|| s.to_string());
        MetadataRow {
            enhancer_id: id.to_string(),
            cargo: opt(cargo),
            experiment: opt(experiment),
            proximal_gene: opt(gene),
            gc_delivered: opt(gc),
            hall_of_fame: Some("TRUE".to_string()),
            ..Default::default()
        }
    }

    fn rows() -> Vec<MetadataRow> {
        vec![
            meta("E1", "GFP", "LIGHTSHEET", "Gad2", "1e9"),
            meta("E1", "GFP", "EPI", "Gad2", "1e10"),
            meta("E2", "mCherry", "EPI", "Pvalb", "1e10"),
            meta("E3", "GFP", "Confocal", "", "5e9"),
            meta("E4", "", "EPI", "Sst", ""),
        ]
    }

    fn cell_types() -> Vec<String> {
        vec!["2-Glia".into(), "10-Neuron".into(), "Unknown".into()]
    }

    #[test]
    fn test_constraint_table_skips_self_and_cell_type() {
        for facet in CASCADING_FACETS {
            let others = facet.constrained_by();
            assert_eq!(others.len(), 4);
            assert!(!others.contains(&facet));
            assert!(!others.contains(&Facet::CellType));
        }
        assert!(Facet::CellType.constrained_by().is_empty());
    }

    #[test]
    fn test_options_without_selection() {
        let rows = rows();
        let base: Vec<&MetadataRow> = rows.iter().collect();
        let options = options_for(&FilterSelections::default(), &base, &cell_types());
        assert_eq!(options.enhancers, vec!["E1", "E2", "E3", "E4"]);
        assert_eq!(options.cargos, vec!["GFP", "mCherry"]);
        assert_eq!(options.experiments, vec!["Confocal", "EPI", "LIGHTSHEET"]);
        assert_eq!(options.genes, vec!["Gad2", "Pvalb", "Sst"]);
        assert_eq!(options.gc_delivered, vec!["1e9", "5e9", "1e10"]);
        assert_eq!(options.cell_types, cell_types());
    }

    #[test]
    fn test_cargo_selection_narrows_experiments() {
        let rows = rows();
        let base: Vec<&MetadataRow> = rows.iter().collect();
        let selections = FilterSelections::default().with(Facet::Cargo, "mCherry");
        let options = options_for(&selections, &base, &cell_types());
        assert_eq!(options.experiments, vec!["EPI"]);
        assert_eq!(options.enhancers, vec!["E2"]);
        // A facet is never constrained by its own selection.
        assert_eq!(options.cargos, vec!["GFP", "mCherry"]);
    }

    #[test]
    fn test_cell_type_is_independent() {
        let rows = rows();
        let base: Vec<&MetadataRow> = rows.iter().collect();
        let plain = options_for(&FilterSelections::default(), &base, &cell_types());
        let narrowed = FilterSelections::default()
            .with(Facet::Enhancer, "E2")
            .with(Facet::Cargo, "mCherry")
            .with(Facet::Experiment, "EPI")
            .with(Facet::Gene, "Pvalb")
            .with(Facet::GcDelivered, "1e10")
            .with(Facet::CellType, "2-Glia");
        let options = options_for(&narrowed, &base, &cell_types());
        assert_eq!(options.cell_types, plain.cell_types);
        assert_eq!(options.enhancers, vec!["E2"]);
    }

    #[test]
    fn test_options_are_idempotent() {
        let rows = rows();
        let base: Vec<&MetadataRow> = rows.iter().collect();
        let selections = FilterSelections::default().with(Facet::Experiment, "EPI");
        let first = options_for(&selections, &base, &cell_types());
        let second = options_for(&selections, &base, &cell_types());
        assert_eq!(first, second);
        assert_eq!(first.gc_delivered, vec!["1e10"]);
    }

    #[test]
    fn test_gc_sorts_as_text_when_not_numeric() {
        let mut values = vec!["high".to_string(), "1e9".to_string(), "low".to_string()];
        sort_values(Facet::GcDelivered, &mut values);
        assert_eq!(values, vec!["1e9", "high", "low"]);
    }

    #[test]
    fn test_gc_sort_with_nan_values() {
        let mut values: Vec<String> = (0..60)
            .map(|i| {
                if i % 7 == 0 {
                    "NaN".to_string()
                } else {
                    format!("{}e9", (i * 37) % 23)
                }
            })
            .collect();
        sort_values(Facet::GcDelivered, &mut values);
        assert!(values.windows(2).all(|w| w[0] <= w[1]));

        let mut values: Vec<String> = (0..30).map(|i| format!("{}", (i * 17) % 30)).collect();
        sort_values(Facet::GcDelivered, &mut values);
        let numbers: Vec<f64> = values.iter().map(|v| v.parse().unwrap()).collect();
        assert!(numbers.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(values[0], "0");
        assert_eq!(values[29], "29");
    }

    #[test]
    fn test_reconcile_resets_unavailable_values() {
        let rows = rows();
        let base: Vec<&MetadataRow> = rows.iter().collect();
        let selections = FilterSelections::default()
            .with(Facet::Cargo, "mCherry")
            .with(Facet::Experiment, "LIGHTSHEET")
            .with(Facet::CellType, "99-Nope");
        let options = options_for(&selections, &base, &cell_types());
        let reconciled = selections.reconcile(&options);
        assert_eq!(reconciled.cargo, ALL);
        assert_eq!(reconciled.experiment, ALL);
        assert_eq!(reconciled.cell_type, ALL);

        let selections = FilterSelections::default().with(Facet::Cargo, "GFP");
        let options = options_for(&selections, &base, &cell_types());
        assert_eq!(selections.reconcile(&options), selections);
    }

    #[test]
    fn test_selection_accessors() {
        let selections = FilterSelections::default().with(Facet::Gene, "Gad2");
        assert_eq!(selections.selected(Facet::Gene), Some("Gad2"));
        assert_eq!(selections.selected(Facet::Cargo), None);
        assert_eq!(selections.value(Facet::Cargo), ALL);
        let parsed: FilterSelections = serde_json::from_str(r#"{"cargo":"GFP"}"#).unwrap();
        assert_eq!(parsed.cargo, "GFP");
        assert_eq!(parsed.enhancer, ALL);
    }
}
