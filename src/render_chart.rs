use crate::{error::Result, views::AccessibilityChart};
use std::{fs, path::Path};
use svg::node::element::{Circle, Line, Rectangle, Text};
use svg::Document;

const SVG_HEIGHT: f32 = 520.0;
const PLOT_LEFT: f32 = 80.0;
const PLOT_TOP: f32 = 70.0;
const PLOT_BOTTOM: f32 = SVG_HEIGHT - 140.0;
const BAR_SLOT: f32 = 56.0;
const MIN_PLOT_WIDTH: f32 = 320.0;
const Y_TICKS: usize = 5;
const BAR_FILL: &str = "#1f77b4";

/// Rounds the largest value up to 1, 2 or 5 times a power of ten so axis
/// ticks land on readable numbers.
pub fn nice_axis_max(max: f64) -> f64 {
    if !max.is_finite() || max <= 0.0 {
        return 1.0;
    }
    let magnitude = 10f64.powf(max.log10().floor());
    let step = [1.0, 2.0, 5.0, 10.0]
        .into_iter()
        .find(|m| m * magnitude >= max)
        .unwrap_or(10.0);
    step * magnitude
}

/// Vertical position of `value` between `top` (axis max) and `bottom` (zero).
pub fn y_for_value(value: f64, axis_max: f64, top: f32, bottom: f32) -> f32 {
    let f = (value / axis_max.max(f64::EPSILON)).clamp(0.0, 1.0) as f32;
    bottom - f * (bottom - top)
}

fn chart_title(chart: &AccessibilityChart) -> String {
    match &chart.cell_type {
        Some(cell_type) => format!("Peak Accessibility for {} - {cell_type}", chart.enhancer_id),
        None => format!("Peak Accessibility by Cell Type for {}", chart.enhancer_id),
    }
}

pub fn export_accessibility_svg(chart: &AccessibilityChart) -> String {
    let plot_width = (chart.bars.len() as f32 * BAR_SLOT).max(MIN_PLOT_WIDTH);
    let plot_right = PLOT_LEFT + plot_width;
    let svg_width = plot_right + 40.0;
    let axis_max = nice_axis_max(chart.max_accessibility());

    let mut doc = Document::new()
        .set("viewBox", (0, 0, svg_width, SVG_HEIGHT))
        .set("width", svg_width)
        .set("height", SVG_HEIGHT)
        .add(
            Rectangle::new()
                .set("x", 0)
                .set("y", 0)
                .set("width", svg_width)
                .set("height", SVG_HEIGHT)
                .set("fill", "#ffffff"),
        )
        .add(
            Text::new(chart_title(chart))
                .set("x", PLOT_LEFT)
                .set("y", 36)
                .set("font-family", "sans-serif")
                .set("font-size", 18)
                .set("fill", "#111827"),
        );

    if chart.is_empty() {
        return doc
            .add(
                Text::new(chart.empty_message())
                    .set("x", PLOT_LEFT)
                    .set("y", (PLOT_TOP + PLOT_BOTTOM) / 2.0)
                    .set("font-family", "sans-serif")
                    .set("font-size", 14)
                    .set("fill", "#6b7280"),
            )
            .to_string();
    }

    for tick in 0..=Y_TICKS {
        let value = axis_max * tick as f64 / Y_TICKS as f64;
        let y = y_for_value(value, axis_max, PLOT_TOP, PLOT_BOTTOM);
        doc = doc
            .add(
                Line::new()
                    .set("x1", PLOT_LEFT)
                    .set("y1", y)
                    .set("x2", plot_right)
                    .set("y2", y)
                    .set("stroke", "#e5e7eb")
                    .set("stroke-width", 1),
            )
            .add(
                Text::new(format!("{value:.2}"))
                    .set("x", PLOT_LEFT - 8.0)
                    .set("y", y + 4.0)
                    .set("text-anchor", "end")
                    .set("font-family", "monospace")
                    .set("font-size", 11)
                    .set("fill", "#374151"),
            );
    }

    for (idx, bar) in chart.bars.iter().enumerate() {
        let x = PLOT_LEFT + BAR_SLOT * idx as f32;
        let center = x + BAR_SLOT / 2.0;
        let top = y_for_value(bar.mean_accessibility, axis_max, PLOT_TOP, PLOT_BOTTOM);
        doc = doc.add(
            Rectangle::new()
                .set("x", x + 8.0)
                .set("y", top)
                .set("width", BAR_SLOT - 16.0)
                .set("height", PLOT_BOTTOM - top)
                .set("fill", BAR_FILL)
                .set("fill-opacity", 0.85),
        );
        // Individual measurements on top of the mean.
        for value in &bar.values {
            doc = doc.add(
                Circle::new()
                    .set("cx", center)
                    .set("cy", y_for_value(*value, axis_max, PLOT_TOP, PLOT_BOTTOM))
                    .set("r", 2.5)
                    .set("fill", "#111827"),
            );
        }
        doc = doc.add(
            Text::new(bar.cell_type.clone())
                .set("x", center)
                .set("y", PLOT_BOTTOM + 14.0)
                .set("text-anchor", "end")
                .set("transform", format!("rotate(-45 {center} {})", PLOT_BOTTOM + 14.0))
                .set("font-family", "sans-serif")
                .set("font-size", 11)
                .set("fill", "#374151"),
        );
    }

    doc.add(
        Line::new()
            .set("x1", PLOT_LEFT)
            .set("y1", PLOT_BOTTOM)
            .set("x2", plot_right)
            .set("y2", PLOT_BOTTOM)
            .set("stroke", "#374151")
            .set("stroke-width", 1.5),
    )
    .add(
        Text::new("Accessibility")
            .set("x", 18)
            .set("y", (PLOT_TOP + PLOT_BOTTOM) / 2.0)
            .set("transform", format!("rotate(-90 18 {})", (PLOT_TOP + PLOT_BOTTOM) / 2.0))
            .set("text-anchor", "middle")
            .set("font-family", "sans-serif")
            .set("font-size", 12)
            .set("fill", "#374151"),
    )
    .to_string()
}

pub fn write_accessibility_svg(chart: &AccessibilityChart, path: &Path) -> Result<()> {
    fs::write(path, export_accessibility_svg(chart))?;
    Ok(())
}
