//! Imaging references attached to metadata rows, and the order in which a
//! detail panel presents them.

use serde::{Deserialize, Serialize};

/// Literal the metadata export writes for "no link".
pub const NO_VALUE_MARKER: &str = "FALSE";

/// Turns one raw multi-link cell into an ordered list of URLs.
/// Null, empty, and the `"FALSE"` marker all mean "no value".
pub fn normalize_links(raw: Option<&str>) -> Vec<String> {
    match raw {
        None => vec![],
        Some(s) if s.is_empty() || s == NO_VALUE_MARKER => vec![],
        Some(s) => s
            .split(',')
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(str::to_string)
            .collect(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageryKind {
    ContactSheet,
    Viewer,
    MipProjection,
}

impl ImageryKind {
    pub fn title(&self) -> &'static str {
        match self {
            Self::ContactSheet => "Contact Sheets",
            Self::Viewer => "Neuroglancer Viewers",
            Self::MipProjection => "MIP Projections",
        }
    }

    pub fn item_label(&self, index: usize) -> String {
        match self {
            Self::ContactSheet => format!("Contact Sheet {}", index + 1),
            Self::Viewer => format!("Viewer {}", index + 1),
            Self::MipProjection => format!("MIP Projection {}", index + 1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExperimentKind {
    Lightsheet,
    Epi,
    Other,
}

impl ExperimentKind {
    pub fn from_experiment(experiment: Option<&str>) -> Self {
        match experiment.map(|e| e.to_uppercase()).as_deref() {
            Some("LIGHTSHEET") => Self::Lightsheet,
            Some("EPI") => Self::Epi,
            _ => Self::Other,
        }
    }

    pub fn section_order(&self) -> [ImageryKind; 3] {
        match self {
            Self::Lightsheet => [
                ImageryKind::Viewer,
                ImageryKind::MipProjection,
                ImageryKind::ContactSheet,
            ],
            Self::Epi | Self::Other => [
                ImageryKind::ContactSheet,
                ImageryKind::Viewer,
                ImageryKind::MipProjection,
            ],
        }
    }
}

/// Imaging links of one metadata row, parsed once at load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImagingLinks {
    pub image_link: Vec<String>,
    pub neuroglancer_1: Vec<String>,
    pub neuroglancer_3: Vec<String>,
    pub viewer_link: Vec<String>,
    pub coronal_mip: Vec<String>,
    pub sagittal_mip: Vec<String>,
}

impl ImagingLinks {
    pub fn links(&self, kind: ImageryKind) -> Vec<String> {
        let parts: Vec<&Vec<String>> = match kind {
            ImageryKind::ContactSheet => vec![&self.image_link],
            ImageryKind::Viewer => vec![&self.neuroglancer_1, &self.neuroglancer_3, &self.viewer_link],
            ImageryKind::MipProjection => vec![&self.coronal_mip, &self.sagittal_mip],
        };
        parts.into_iter().flatten().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        [
            ImageryKind::ContactSheet,
            ImageryKind::Viewer,
            ImageryKind::MipProjection,
        ]
        .iter()
        .all(|kind| self.links(*kind).is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImagingSection {
    pub kind: ImageryKind,
    pub links: Vec<String>,
}

/// Non-empty sections in the order the experiment type calls for.
pub fn imaging_sections(links: &ImagingLinks, experiment: ExperimentKind) -> Vec<ImagingSection> {
    experiment
        .section_order()
        .into_iter()
        .map(|kind| ImagingSection {
            kind,
            links: links.links(kind),
        })
        .filter(|section| !section.links.is_empty())
        .collect()
}
