// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use anyhow::{Context, Result};
use plotters::prelude::*;
use std::path::{Path, PathBuf};

use crate::chart::{
    series_color, ChartSurface, LineChart, PointKind, DATASET_LABEL, MAX_LABEL, MIN_LABEL,
};

/// Draws the line chart to an SVG file, rewriting the same file on every redraw.
pub struct SvgSurface {
    path: PathBuf,
    width: u32,
    height: u32,
}

impl SvgSurface {
    pub fn new(output_dir: &Path, width: u32, height: u32) -> Result<Self> {
        std::fs::create_dir_all(output_dir).with_context(|| {
            format!("Failed to create output directory: {}", output_dir.display())
        })?;

        Ok(Self {
            path: output_dir.join("chart.svg"),
            width,
            height,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Y range with some headroom; the axis does not start at zero.
pub(crate) fn value_range(min: f64, max: f64) -> (f64, f64) {
    let span = max - min;
    let pad = if span > 0.0 {
        span * 0.1
    } else {
        min.abs().max(1.0) * 0.05
    };
    (min - pad, max + pad)
}

impl ChartSurface for SvgSurface {
    fn draw(&mut self, chart: &LineChart) -> Result<()> {
        let data = &chart.data;
        let n = data.len();

        let root = SVGBackend::new(&self.path, (self.width, self.height)).into_drawing_area();
        root.fill(&WHITE)?;

        let (y_low, y_high) = value_range(data.min, data.max);
        let mut ctx = ChartBuilder::on(&root)
            .caption(&chart.title, ("sans-serif", 28).into_font().color(&BLACK))
            .margin(20)
            .x_label_area_size(60)
            .y_label_area_size(80)
            .build_cartesian_2d(0usize..n, y_low..y_high)?;

        let labels = &data.labels;
        ctx.configure_mesh()
            .x_labels(n.min(10))
            .x_label_formatter(&|i| labels.get(*i).cloned().unwrap_or_default())
            .y_label_formatter(&|v| format!("{:.2}", v))
            .axis_desc_style(("sans-serif", 16))
            .draw()?;

        let line_color = series_color();
        ctx.draw_series(LineSeries::new(
            data.values.iter().enumerate().map(|(i, v)| (i, *v)),
            line_color.stroke_width(2),
        ))?
        .label(DATASET_LABEL)
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], line_color.stroke_width(2)));

        for (kind, label) in [
            (PointKind::Default, None),
            (PointKind::Max, Some(MAX_LABEL)),
            (PointKind::Min, Some(MIN_LABEL)),
        ] {
            let color = kind.color();
            let radius = kind.radius();
            let indices = data.indices_of(kind);

            // Static output has no hover; extrema get a ring at their hover radius instead.
            if kind != PointKind::Default {
                let ring = kind.hover_radius();
                ctx.draw_series(indices.iter().map(|&i| {
                    Circle::new((i, data.values[i]), ring, color.stroke_width(1))
                }))?;
            }

            let points = indices
                .into_iter()
                .map(move |i| Circle::new((i, data.values[i]), radius, color.filled()));

            let series = ctx.draw_series(points)?;
            if let Some(label) = label {
                series
                    .label(label)
                    .legend(move |(x, y)| Circle::new((x + 10, y), 5, color.filled()));
            }
        }

        ctx.configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()?;

        root.present()
            .with_context(|| format!("Failed to write chart: {}", self.path.display()))?;
        log::debug!("Chart redrawn to {} ({} points)", self.path.display(), n);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_value_range_pads_both_sides() {
        let (low, high) = value_range(900.0, 1000.0);
        assert_relative_eq!(low, 890.0);
        assert_relative_eq!(high, 1010.0);
    }

    #[test]
    fn test_flat_series_gets_nonempty_range() {
        let (low, high) = value_range(5.0, 5.0);
        assert!(low < 5.0 && high > 5.0);

        let (low, high) = value_range(0.0, 0.0);
        assert!(low < high);
    }

    #[test]
    fn test_surface_targets_chart_svg() {
        let dir = tempfile::tempdir().unwrap();
        let surface = SvgSurface::new(&dir.path().join("out"), 800, 400).unwrap();
        assert!(dir.path().join("out").is_dir());
        assert_eq!(surface.path(), dir.path().join("out").join("chart.svg"));
    }
}
