use crate::{
    about::APP_TITLE,
    config::DashboardConfig,
    filters::{Facet, FacetOptions, FilterSelections, ALL, CASCADING_FACETS},
    imaging::ImageryKind,
    loader::load_cached,
    render_chart::{nice_axis_max, y_for_value},
    session::{DashboardSession, SessionFrame},
    views::{AccessibilityChart, DashboardView, DetailView, SummaryRow, NOT_AVAILABLE},
};
use eframe::egui::{self, Align2, Color32, FontId, Rect, Sense, Ui};
use tracing::{error, info};

const BAR_COLOR: Color32 = Color32::from_rgb(31, 119, 180);
const CHART_HEIGHT: f32 = 280.0;
const IMAGE_MAX_WIDTH: f32 = 640.0;

pub struct DashboardApp {
    config: DashboardConfig,
    session: Option<DashboardSession>,
    load_error: Option<String>,
    requested: FilterSelections,
    frame: Option<SessionFrame>,
    update_has_run_before: bool,
}

impl DashboardApp {
    pub fn new(config: DashboardConfig) -> Self {
        let mut ret = Self {
            config: config.clone(),
            session: None,
            load_error: None,
            requested: FilterSelections::default(),
            frame: None,
            update_has_run_before: false,
        };
        ret.load(config);
        ret
    }

    fn load(&mut self, config: DashboardConfig) {
        self.frame = None;
        self.requested = FilterSelections::default();
        match load_cached(&config) {
            Ok(dataset) => {
                info!(
                    "Dashboard ready: {} curated enhancers",
                    dataset.curated.len()
                );
                self.session = Some(DashboardSession::new(dataset));
                self.load_error = None;
            }
            Err(e) => {
                error!("Error loading data: {e}");
                self.session = None;
                self.load_error = Some(e.to_string());
            }
        }
        self.config = config;
    }

    fn current_frame(&mut self) -> Option<&SessionFrame> {
        let session = self.session.as_mut()?;
        let stale = self
            .frame
            .as_ref()
            .is_none_or(|f| f.selections != self.requested);
        if stale {
            let frame = session.update(self.requested.clone());
            self.requested = frame.selections.clone();
            self.frame = Some(frame);
        }
        self.frame.as_ref()
    }

    pub fn render_menu_bar(&mut self, ui: &mut Ui) {
        egui::MenuBar::new().ui(ui, |ui| {
            ui.menu_button("File", |ui| {
                if ui.button("Open data folder...").clicked() {
                    if let Some(dir) = rfd::FileDialog::new()
                        .set_directory(&self.config.data_dir)
                        .pick_folder()
                    {
                        let config = self.config.clone().with_data_dir(dir);
                        self.load(config);
                    }
                }
                if ui.button("Quit").clicked() {
                    ui.ctx().send_viewport_cmd(egui::ViewportCommand::Close);
                }
            });
        });
    }

    fn render_filters(ui: &mut Ui, requested: &mut FilterSelections, options: &FacetOptions) {
        ui.heading("Filters");
        ui.separator();
        for facet in CASCADING_FACETS.into_iter().chain([Facet::CellType]) {
            facet_combo(ui, facet, requested, options.values(facet));
            ui.add_space(4.0);
        }
        ui.separator();
        if ui.button("Reset filters").clicked() {
            *requested = FilterSelections::default();
        }
    }

    fn render_view(ui: &mut Ui, view: &DashboardView) {
        match view {
            DashboardView::NoCuratedData => {
                ui.colored_label(
                    Color32::YELLOW,
                    "No Hall of Fame enhancers found. Check the metadata file.",
                );
            }
            DashboardView::NoMatches => {
                ui.colored_label(Color32::YELLOW, "No enhancers match the selected filters.");
            }
            DashboardView::Summary { rows } => render_summary(ui, rows),
            DashboardView::Detail(detail) => render_detail(ui, detail),
            DashboardView::EnhancerNotFound { enhancer_id } => {
                ui.colored_label(
                    Color32::YELLOW,
                    format!("Enhancer {enhancer_id} does not match the selected filters."),
                );
            }
        }
    }
}

fn facet_combo(ui: &mut Ui, facet: Facet, requested: &mut FilterSelections, options: &[String]) {
    let mut current = requested.value(facet).to_string();
    egui::ComboBox::from_label(facet.label())
        .selected_text(current.clone())
        .width(200.0)
        .show_ui(ui, |ui| {
            ui.selectable_value(&mut current, ALL.to_string(), ALL);
            for option in options {
                ui.selectable_value(&mut current, option.clone(), option.as_str());
            }
        });
    if current != requested.value(facet) {
        requested.set(facet, current);
    }
}

fn render_summary(ui: &mut Ui, rows: &[SummaryRow]) {
    ui.heading("Hall of Fame Enhancers Summary");
    ui.label(format!("{} enhancers", rows.len()));
    egui::ScrollArea::both().show(ui, |ui| {
        egui::Grid::new("summary_table")
            .striped(true)
            .spacing([16.0, 4.0])
            .show(ui, |ui| {
                for header in [
                    "Enhancer",
                    "Location",
                    "Length",
                    "Cargo",
                    "Experiment",
                    "Gene",
                    "GC Delivered",
                    "Experiments",
                ] {
                    ui.strong(header);
                }
                ui.end_row();
                for row in rows {
                    ui.label(row.enhancer.as_str());
                    ui.monospace(row.location.as_str());
                    ui.label(format!("{} bp", row.length_bp));
                    ui.label(row.cargo.as_str());
                    ui.label(row.experiment.as_str());
                    ui.label(row.gene.as_str());
                    ui.label(row.gc_delivered.as_str());
                    ui.label(row.experiments.to_string());
                    ui.end_row();
                }
            });
    });
}

fn or_na(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or(NOT_AVAILABLE)
}

fn render_detail(ui: &mut Ui, detail: &DetailView) {
    egui::ScrollArea::vertical().show(ui, |ui| {
        ui.heading(format!("Enhancer {}", detail.enhancer_id));
        egui::Grid::new("detail_attributes")
            .num_columns(2)
            .spacing([16.0, 4.0])
            .show(ui, |ui| {
                ui.strong("Location");
                ui.monospace(detail.location());
                ui.end_row();
                ui.strong("Length");
                ui.label(format!("{} bp", detail.length_bp));
                ui.end_row();
                if let Some(attributes) = &detail.attributes {
                    for (label, value) in [
                        ("Cargo", &attributes.cargo),
                        ("Experiment", &attributes.experiment),
                        ("Proximal Gene", &attributes.gene),
                        ("GC Delivered", &attributes.gc_delivered),
                    ] {
                        ui.strong(label);
                        ui.label(or_na(value));
                        ui.end_row();
                    }
                }
            });
        if detail.attributes.is_none() {
            ui.colored_label(Color32::YELLOW, "No metadata available for this enhancer.");
        }

        ui.separator();
        ui.heading("Imaging Data");
        match &detail.imaging {
            Some(imaging) if !imaging.sections.is_empty() => {
                ui.label(format!(
                    "Experiment: {}  GC delivered: {}",
                    or_na(&imaging.experiment),
                    or_na(&imaging.gc_delivered)
                ));
                for section in &imaging.sections {
                    ui.add_space(6.0);
                    ui.strong(section.kind.title());
                    for (idx, link) in section.links.iter().enumerate() {
                        let label = section.kind.item_label(idx);
                        match section.kind {
                            ImageryKind::Viewer => {
                                ui.hyperlink_to(label, link);
                            }
                            ImageryKind::ContactSheet | ImageryKind::MipProjection => {
                                ui.label(label);
                                ui.add(
                                    egui::Image::from_uri(link.as_str())
                                        .max_width(IMAGE_MAX_WIDTH)
                                        .maintain_aspect_ratio(true),
                                );
                                ui.hyperlink_to("Open full size", link);
                            }
                        }
                    }
                }
            }
            _ => {
                ui.label("No imaging data available for this enhancer.");
            }
        }

        ui.separator();
        ui.heading("Peak Accessibility");
        paint_chart(ui, &detail.chart);
    });
}

fn paint_chart(ui: &mut Ui, chart: &AccessibilityChart) {
    if chart.is_empty() {
        ui.colored_label(Color32::YELLOW, chart.empty_message());
        return;
    }
    let size = egui::vec2(ui.available_width().max(240.0), CHART_HEIGHT);
    let (rect, response) = ui.allocate_exact_size(size, Sense::hover());
    let painter = ui.painter_at(rect);
    let text_color = ui.visuals().text_color();
    let plot = Rect::from_min_max(
        rect.min + egui::vec2(48.0, 10.0),
        rect.max - egui::vec2(10.0, 40.0),
    );
    let axis_max = nice_axis_max(chart.max_accessibility());

    for tick in 0..=4 {
        let value = axis_max * tick as f64 / 4.0;
        let y = y_for_value(value, axis_max, plot.top(), plot.bottom());
        painter.line_segment(
            [egui::pos2(plot.left(), y), egui::pos2(plot.right(), y)],
            (0.5, Color32::GRAY),
        );
        painter.text(
            egui::pos2(plot.left() - 6.0, y),
            Align2::RIGHT_CENTER,
            format!("{value:.2}"),
            FontId::monospace(10.0),
            text_color,
        );
    }

    let slot = plot.width() / chart.bars.len() as f32;
    for (idx, bar) in chart.bars.iter().enumerate() {
        let x = plot.left() + slot * idx as f32;
        let center = x + slot / 2.0;
        let top = y_for_value(bar.mean_accessibility, axis_max, plot.top(), plot.bottom());
        let bar_rect = Rect::from_min_max(
            egui::pos2(x + slot * 0.15, top),
            egui::pos2(x + slot * 0.85, plot.bottom()),
        );
        painter.rect_filled(bar_rect, 2.0, BAR_COLOR);
        for value in &bar.values {
            let y = y_for_value(*value, axis_max, plot.top(), plot.bottom());
            painter.circle_filled(egui::pos2(center, y), 2.5, text_color);
        }
        painter.text(
            egui::pos2(center, plot.bottom() + 4.0),
            Align2::CENTER_TOP,
            &bar.cell_type,
            FontId::proportional(11.0),
            text_color,
        );
        if response
            .hover_pos()
            .is_some_and(|pos| pos.x >= x && pos.x < x + slot)
        {
            painter.text(
                egui::pos2(center, top - 4.0),
                Align2::CENTER_BOTTOM,
                format!("{:.3} (n={})", bar.mean_accessibility, bar.replicates()),
                FontId::monospace(10.0),
                text_color,
            );
        }
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if !self.update_has_run_before {
            egui_extras::install_image_loaders(ctx);
            self.update_has_run_before = true;
        }

        egui::TopBottomPanel::top("top").show(ctx, |ui| {
            self.render_menu_bar(ui);
        });

        if let Some(message) = &self.load_error {
            egui::CentralPanel::default().show(ctx, |ui| {
                ui.heading(APP_TITLE);
                ui.colored_label(Color32::RED, format!("Error loading data: {message}"));
                ui.label("Use File > Open data folder... to pick another directory.");
            });
            return;
        }

        let Some(frame) = self.current_frame() else {
            return;
        };
        let mut requested = frame.selections.clone();
        let options = frame.options.clone();
        let view = frame.view.clone();

        egui::SidePanel::left("filters")
            .resizable(true)
            .show(ctx, |ui| {
                Self::render_filters(ui, &mut requested, &options);
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading(APP_TITLE);
            if let Some(session) = &self.session {
                let report = &session.dataset().report;
                ui.label(format!(
                    "{} measured enhancers, {} curated, {} cell types",
                    report.measurement_enhancers, report.curated_rows, report.cell_types
                ));
            }
            ui.separator();
            Self::render_view(ui, &view);
        });

        self.requested = requested;
    }

    fn ui(&mut self, _ui: &mut egui::Ui, _frame: &mut eframe::Frame) {}
}
