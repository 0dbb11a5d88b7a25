use std::path::Path;

use anyhow::Result;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::RGBColor;

use crate::score::ScoreFormat;
use crate::series::{ChromosomeColor, HighlightColor, PlotData};

/// Highlight labels sit this far right of their point, in axis units (bp).
const LABEL_X_OFFSET: f64 = 20_000_000.0;
/// Marker area (points^2) of zero-score genes, independent of `--point-size`.
const ZERO_POINT_SIZE: f64 = 300.0;
const POINTS_PER_INCH: f64 = 72.0;

/// Figure options that are not part of the plot data.
#[derive(Debug, Clone)]
pub struct Figure {
    pub width_in: f64,
    pub height_in: f64,
    pub dpi: u32,
    /// matplotlib-style marker area in points^2
    pub point_size: f64,
    pub format: ScoreFormat,
    pub annotation: Option<String>,
}

impl Figure {
    pub fn pixel_size(&self) -> (u32, u32) {
        let w = (self.width_in * self.dpi as f64).round().max(1.0) as u32;
        let h = (self.height_in * self.dpi as f64).round().max(1.0) as u32;
        (w, h)
    }

    /// Font size in pixels for a size given in points.
    fn font_px(&self, pt: f64) -> u32 {
        (pt * self.dpi as f64 / POINTS_PER_INCH).round().max(1.0) as u32
    }

    /// Circle radius in pixels for a marker area in points^2.
    fn marker_radius(&self, area: f64) -> u32 {
        (area.max(0.0).sqrt() / 2.0 * self.dpi as f64 / POINTS_PER_INCH)
            .round()
            .max(1.0) as u32
    }

    fn x_desc(&self) -> &str {
        self.annotation.as_deref().unwrap_or("Chromosome")
    }
}

fn chromosome_rgb(c: ChromosomeColor) -> RGBColor {
    match c {
        ChromosomeColor::Blue => RGBColor(0, 0, 255),
        ChromosomeColor::Green => RGBColor(0, 128, 0),
        ChromosomeColor::Red => RGBColor(255, 0, 0),
        ChromosomeColor::Yellow => RGBColor(191, 191, 0),
    }
}

fn highlight_rgb(c: HighlightColor) -> RGBColor {
    match c {
        HighlightColor::Red => RGBColor(255, 0, 0),
        HighlightColor::Blue => RGBColor(0, 0, 255),
    }
}

/// Draw `data` to `output_path`. `.svg` selects the SVG backend, anything else a bitmap
/// whose encoding follows the extension.
pub fn render(data: &PlotData, fig: &Figure, output_path: &Path) -> Result<()> {
    let size = fig.pixel_size();
    let is_svg = output_path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("svg"));

    log::info!(
        "Size  : {}x{} px ({}x{} in @ {} dpi)",
        size.0,
        size.1,
        fig.width_in,
        fig.height_in,
        fig.dpi
    );

    if is_svg {
        let root = SVGBackend::new(output_path, size).into_drawing_area();
        draw(&root, data, fig)?;
        root.present()?;
    } else {
        let root = BitMapBackend::new(output_path, size).into_drawing_area();
        draw(&root, data, fig)?;
        root.present()?;
    }

    log::info!("Plot complete. Total {} points drawn.", data.point_count());
    Ok(())
}

fn draw<DB: DrawingBackend>(root: &DrawingArea<DB, Shift>, data: &PlotData, fig: &Figure) -> Result<()>
where
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)?;

    let (x_lo, mut x_hi) = (data.x_range.0 as f64, data.x_range.1 as f64);
    if x_hi <= x_lo {
        x_hi = x_lo + 1.0;
    }
    let (y_lo, y_hi) = data.y_range;

    let label_px = fig.font_px(16.0);
    let mut chart = ChartBuilder::on(root)
        .caption(fig.format.title(), ("sans-serif", fig.font_px(24.0)))
        .margin(fig.font_px(10.0))
        .x_label_area_size(label_px * 4)
        .y_label_area_size(label_px * 4)
        .build_cartesian_2d(x_lo..x_hi, y_lo..y_hi)?;

    chart
        .configure_mesh()
        .x_desc(fig.x_desc())
        .y_desc(fig.format.y_label())
        .x_labels(0)
        .label_style(("sans-serif", fig.font_px(10.0)))
        .axis_desc_style(("sans-serif", label_px))
        .disable_x_mesh()
        .disable_y_mesh()
        .draw()?;

    // chromosome names under the x axis, one per segment center
    let gap = fig.font_px(4.0) as i32;
    for (tick, name) in data.axis_labels() {
        let (px, py) = chart.backend_coord(&(tick, y_lo));
        root.draw(&Text::new(
            name.to_string(),
            (px, py + gap),
            ("sans-serif", fig.font_px(10.0))
                .into_font()
                .color(&BLACK)
                .pos(Pos::new(HPos::Center, VPos::Top)),
        ))?;
    }

    let zero_r = fig.marker_radius(ZERO_POINT_SIZE);
    let point_r = fig.marker_radius(fig.point_size);
    let edge = fig.font_px(1.0).max(1);

    for chrom in &data.chromosomes {
        let color = chromosome_rgb(chrom.color);

        chart.draw_series(
            chrom
                .zero
                .points()
                .map(|(x, y)| Circle::new((x as f64, y), zero_r, color.filled())),
        )?;

        chart.draw_series(
            chrom
                .nonzero
                .points()
                .map(|(x, y)| Circle::new((x as f64, y), point_r, color.filled())),
        )?;
        chart.draw_series(
            chrom
                .nonzero
                .points()
                .map(|(x, y)| Circle::new((x as f64, y), point_r, BLACK.stroke_width(edge))),
        )?;
    }

    for h in &data.highlights {
        chart.draw_series(std::iter::once(Text::new(
            h.gene.clone(),
            (h.x as f64 + LABEL_X_OFFSET, h.y),
            ("sans-serif", label_px)
                .into_font()
                .color(&highlight_rgb(h.color))
                .pos(Pos::new(HPos::Left, VPos::Bottom)),
        )))?;
    }

    Ok(())
}
