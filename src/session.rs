//! One user's interaction with the dashboard: selections in, a consistent
//! frame of selections, options and view out.

use crate::{
    filters::{options_for, FacetOptions, FilterSelections},
    loader::Dataset,
    views::{build_view, DashboardView},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Everything needed to draw the dashboard once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionFrame {
    /// The selections actually applied, after stale values were reset.
    pub selections: FilterSelections,
    pub options: FacetOptions,
    pub view: DashboardView,
}

#[derive(Debug, Clone)]
pub struct DashboardSession {
    dataset: Arc<Dataset>,
    selections: FilterSelections,
}

impl DashboardSession {
    pub fn new(dataset: Arc<Dataset>) -> Self {
        Self {
            dataset,
            selections: FilterSelections::default(),
        }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn selections(&self) -> &FilterSelections {
        &self.selections
    }

    /// Applies the requested selections and recomputes the frame.
    ///
    /// Options are computed from the request, then any selection that is no
    /// longer among its options falls back to "All" and the options are
    /// recomputed. The view uses the reconciled selections, which are also
    /// kept for the next update.
    pub fn update(&mut self, requested: FilterSelections) -> SessionFrame {
        let base_metadata = self.dataset.base_metadata();
        let cell_types = &self.dataset.cell_types;
        let mut options = options_for(&requested, &base_metadata, cell_types);
        let selections = requested.reconcile(&options);
        if selections != requested {
            debug!("Reset stale selections: {requested:?} -> {selections:?}");
            // Resetting only widens the other facets, so one pass suffices.
            options = options_for(&selections, &base_metadata, cell_types);
        }
        let view = build_view(&self.dataset, &selections);
        self.selections = selections.clone();
        SessionFrame {
            selections,
            options,
            view,
        }
    }

    /// Recomputes the frame for the current selections.
    pub fn refresh(&mut self) -> SessionFrame {
        self.update(self.selections.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::DashboardConfig,
        filters::{Facet, ALL},
        loader::{load, tests::write_fixture},
    };
    use tempfile::tempdir;

    fn session() -> DashboardSession {
        let td = tempdir().unwrap();
        write_fixture(td.path());
        let dataset = load(&DashboardConfig::default().with_data_dir(td.path())).unwrap();
        DashboardSession::new(Arc::new(dataset))
    }

    #[test]
    fn test_initial_frame() {
        let mut session = session();
        let frame = session.refresh();
        assert_eq!(frame.selections, FilterSelections::default());
        assert_eq!(frame.options.enhancers, vec!["E1", "E2", "E3"]);
        assert_eq!(frame.options.cell_types, vec!["2-Glia", "10-Neuron", "Unknown"]);
        assert!(matches!(frame.view, DashboardView::Summary { ref rows } if rows.len() == 3));
    }

    #[test]
    fn test_cargo_narrows_other_facets() {
        let mut session = session();
        let frame = session.update(FilterSelections::default().with(Facet::Cargo, "mCherry"));
        assert_eq!(frame.options.enhancers, vec!["E2"]);
        assert_eq!(frame.options.experiments, vec!["EPI"]);
        assert_eq!(frame.options.genes, vec!["Pvalb"]);
        // Cargo options ignore the cargo selection itself.
        assert_eq!(frame.options.cargos, vec!["GFP", "mCherry"]);
        // Cell types never narrow.
        assert_eq!(frame.options.cell_types.len(), 3);
    }

    #[test]
    fn test_stale_selection_resets_to_all() {
        let mut session = session();
        session.update(FilterSelections::default().with(Facet::Enhancer, "E1"));
        // E1 has no mCherry row: neither value is offered given the other.
        let requested = session.selections().clone().with(Facet::Cargo, "mCherry");
        let frame = session.update(requested);
        assert_eq!(frame.selections.value(Facet::Enhancer), ALL);
        assert_eq!(frame.selections.value(Facet::Cargo), ALL);
        assert_eq!(session.selections(), &frame.selections);
        assert!(matches!(frame.view, DashboardView::Summary { ref rows } if rows.len() == 3));
        // Options describe the reset state, not the request.
        assert_eq!(frame.options.enhancers, vec!["E1", "E2", "E3"]);
        assert_eq!(frame.options.cargos, vec!["GFP", "mCherry"]);

        // A compatible pair survives.
        let frame = session.update(
            FilterSelections::default()
                .with(Facet::Enhancer, "E2")
                .with(Facet::Cargo, "mCherry"),
        );
        assert_eq!(frame.selections.value(Facet::Enhancer), "E2");
        assert_eq!(frame.selections.value(Facet::Cargo), "mCherry");
        assert!(matches!(frame.view, DashboardView::Detail(_)));
    }

    #[test]
    fn test_unknown_cell_type_resets() {
        let mut session = session();
        let frame = session.update(FilterSelections::default().with(Facet::CellType, "99-Nothing"));
        assert_eq!(frame.selections.value(Facet::CellType), ALL);
    }

    #[test]
    fn test_detail_frame() {
        let mut session = session();
        let frame = session.update(
            FilterSelections::default()
                .with(Facet::Enhancer, "E1")
                .with(Facet::CellType, "2-Glia"),
        );
        let DashboardView::Detail(detail) = frame.view else {
            panic!("expected detail view");
        };
        assert_eq!(detail.enhancer_id, "E1");
        assert_eq!(detail.chart.bars.len(), 1);
        // With E1 selected the other facets only offer E1's values.
        assert_eq!(frame.options.experiments, vec!["EPI", "LIGHTSHEET"]);
        assert_eq!(frame.options.gc_delivered, vec!["1e9", "1e10"]);
    }

    #[test]
    fn test_no_curated_data_frame() {
        let mut session = DashboardSession::new(Arc::new(Dataset::default()));
        let frame = session.refresh();
        assert_eq!(frame.view, DashboardView::NoCuratedData);
        assert!(frame.options.enhancers.is_empty());
    }
}
