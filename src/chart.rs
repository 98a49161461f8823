// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use anyhow::Result;
use plotters::style::RGBColor;

use crate::models::SeriesPoint;

pub const DATASET_LABEL: &str = "Valor Histórico";
pub const MAX_LABEL: &str = "Máximo Histórico";
pub const MIN_LABEL: &str = "Mínimo Histórico";

const COLOR_MAX: RGBColor = RGBColor(255, 0, 0);
const COLOR_MIN: RGBColor = RGBColor(0, 255, 0);
const COLOR_SERIES: RGBColor = RGBColor(75, 192, 192);

/// How a single point is highlighted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointKind {
    Max,
    Min,
    Default,
}

impl PointKind {
    /// Every occurrence of an extremum is highlighted. A value equal to both
    /// extremes (flat series) counts as a maximum.
    fn classify(value: f64, max: f64, min: f64) -> Self {
        if value == max {
            PointKind::Max
        } else if value == min {
            PointKind::Min
        } else {
            PointKind::Default
        }
    }

    pub fn color(&self) -> RGBColor {
        match self {
            PointKind::Max => COLOR_MAX,
            PointKind::Min => COLOR_MIN,
            PointKind::Default => COLOR_SERIES,
        }
    }

    pub fn css_color(&self) -> &'static str {
        match self {
            PointKind::Max => "red",
            PointKind::Min => "#00ff00",
            PointKind::Default => "rgba(75, 192, 192, 1)",
        }
    }

    pub fn radius(&self) -> u32 {
        match self {
            PointKind::Max | PointKind::Min => 6,
            PointKind::Default => 3,
        }
    }

    pub fn hover_radius(&self) -> u32 {
        match self {
            PointKind::Max | PointKind::Min => 8,
            PointKind::Default => 5,
        }
    }
}

pub fn series_color() -> RGBColor {
    COLOR_SERIES
}

/// Labels, values and per-point styling derived from one series.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
    pub max: f64,
    pub min: f64,
    pub kinds: Vec<PointKind>,
}

impl ChartData {
    /// `None` for an empty series: there is nothing to render.
    pub fn from_series(series: &[SeriesPoint]) -> Option<Self> {
        let first = series.first()?;

        let (max, min) = series
            .iter()
            .fold((first.value, first.value), |(max, min), point| {
                (max.max(point.value), min.min(point.value))
            });

        let labels = series.iter().map(|p| p.day().to_string()).collect();
        let values: Vec<f64> = series.iter().map(|p| p.value).collect();
        let kinds = values
            .iter()
            .map(|v| PointKind::classify(*v, max, min))
            .collect();

        Some(Self {
            labels,
            values,
            max,
            min,
            kinds,
        })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn indices_of(&self, kind: PointKind) -> Vec<usize> {
        self.kinds
            .iter()
            .enumerate()
            .filter(|(_, k)| **k == kind)
            .map(|(i, _)| i)
            .collect()
    }

    /// Tooltip text for a raw value, annotated when it matches an extremum.
    pub fn tooltip_label(&self, value: f64) -> String {
        let mut label = format!("{}: {:.2}", DATASET_LABEL, value);
        if value == self.max {
            label.push_str(&format!(" ({})", MAX_LABEL));
        } else if value == self.min {
            label.push_str(&format!(" ({})", MIN_LABEL));
        }
        label
    }
}

/// The single live chart of a session.
#[derive(Debug, Clone, PartialEq)]
pub struct LineChart {
    pub title: String,
    pub data: ChartData,
    /// Number of in-place updates since construction.
    pub redraws: u64,
}

impl LineChart {
    pub fn tooltip(&self, index: usize) -> Option<String> {
        let value = self.data.values.get(index)?;
        let label = self.data.labels.get(index)?;
        Some(format!("{} - {}", label, self.data.tooltip_label(*value)))
    }
}

/// Where a chart gets drawn.
pub trait ChartSurface: Send {
    fn draw(&mut self, chart: &LineChart) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    Created,
    Updated,
}

#[derive(Debug, Default)]
pub struct ChartState {
    chart: Option<LineChart>,
}

impl ChartState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn chart(&self) -> Option<&LineChart> {
        self.chart.as_ref()
    }

    /// Build the chart on first use, afterwards swap its data in place and
    /// redraw. The data is replaced even if the surface fails to draw.
    pub fn render(
        &mut self,
        data: ChartData,
        surface: &mut dyn ChartSurface,
    ) -> Result<RenderOutcome> {
        let outcome = match self.chart.as_mut() {
            Some(chart) => {
                chart.data = data;
                chart.redraws += 1;
                RenderOutcome::Updated
            }
            None => {
                self.chart = Some(LineChart {
                    title: DATASET_LABEL.to_string(),
                    data,
                    redraws: 0,
                });
                RenderOutcome::Created
            }
        };

        if let Some(chart) = self.chart.as_ref() {
            surface.draw(chart)?;
        }
        Ok(outcome)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegendEntry {
    pub label: &'static str,
    pub kind: PointKind,
}

/// Contents of the legend panel.
#[derive(Debug, Clone, PartialEq)]
pub enum Legend {
    Entries(Vec<LegendEntry>),
    Message(String),
}

impl Legend {
    /// The three fixed entries shown after every chart update.
    pub fn standard() -> Self {
        Legend::Entries(vec![
            LegendEntry {
                label: MAX_LABEL,
                kind: PointKind::Max,
            },
            LegendEntry {
                label: MIN_LABEL,
                kind: PointKind::Min,
            },
            LegendEntry {
                label: DATASET_LABEL,
                kind: PointKind::Default,
            },
        ])
    }

    pub fn lines(&self) -> Vec<String> {
        match self {
            Legend::Entries(entries) => entries
                .iter()
                .map(|e| format!("■ {} ({})", e.label, e.kind.css_color()))
                .collect(),
            Legend::Message(message) => vec![message.clone()],
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Records every chart it is asked to draw.
    #[derive(Default)]
    pub(crate) struct RecordingSurface {
        pub drawn: Vec<LineChart>,
    }

    impl ChartSurface for RecordingSurface {
        fn draw(&mut self, chart: &LineChart) -> Result<()> {
            self.drawn.push(chart.clone());
            Ok(())
        }
    }

    pub(crate) fn series(values: &[f64]) -> Vec<SeriesPoint> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| SeriesPoint {
                date: format!("2024-05-{:02}T04:00:00.000Z", i + 1),
                value: *v,
            })
            .collect()
    }

    #[test]
    fn test_empty_series_has_nothing_to_render() {
        assert!(ChartData::from_series(&[]).is_none());
    }

    #[test]
    fn test_labels_drop_time_of_day() {
        let data = ChartData::from_series(&series(&[1.0, 2.0])).unwrap();
        assert_eq!(data.labels, vec!["2024-05-01", "2024-05-02"]);
        assert_eq!(data.values, vec![1.0, 2.0]);
    }

    #[test]
    fn test_every_extremum_occurrence_is_highlighted() {
        let values = [3.0, 9.0, 1.0, 9.0, 5.0, 1.0];
        let data = ChartData::from_series(&series(&values)).unwrap();

        assert_eq!(data.max, 9.0);
        assert_eq!(data.min, 1.0);
        assert!(values.iter().all(|v| *v <= data.max && *v >= data.min));
        assert_eq!(data.indices_of(PointKind::Max), vec![1, 3]);
        assert_eq!(data.indices_of(PointKind::Min), vec![2, 5]);
        assert_eq!(data.indices_of(PointKind::Default), vec![0, 4]);
    }

    #[test]
    fn test_single_point_counts_as_max() {
        let data = ChartData::from_series(&series(&[42.0])).unwrap();
        assert_eq!(data.kinds, vec![PointKind::Max]);
        assert_eq!(data.tooltip_label(42.0), "Valor Histórico: 42.00 (Máximo Histórico)");
    }

    #[test]
    fn test_tooltip_annotations() {
        let data = ChartData::from_series(&series(&[900.0, 950.25, 910.0])).unwrap();
        assert_eq!(data.tooltip_label(950.25), "Valor Histórico: 950.25 (Máximo Histórico)");
        assert_eq!(data.tooltip_label(900.0), "Valor Histórico: 900.00 (Mínimo Histórico)");
        assert_eq!(data.tooltip_label(910.0), "Valor Histórico: 910.00");
    }

    #[test]
    fn test_point_styles() {
        assert_eq!(PointKind::Max.radius(), 6);
        assert_eq!(PointKind::Min.hover_radius(), 8);
        assert_eq!(PointKind::Default.radius(), 3);
        assert_eq!(PointKind::Default.hover_radius(), 5);
    }

    #[test]
    fn test_update_in_place_matches_fresh_build() {
        let mut surface = RecordingSurface::default();
        let mut state = ChartState::new();

        let first = ChartData::from_series(&series(&[1.0, 5.0, 3.0])).unwrap();
        let second = ChartData::from_series(&series(&[7.0, 2.0, 2.0, 8.0])).unwrap();

        assert_eq!(
            state.render(first, &mut surface).unwrap(),
            RenderOutcome::Created
        );
        assert_eq!(
            state.render(second.clone(), &mut surface).unwrap(),
            RenderOutcome::Updated
        );

        let mut fresh_state = ChartState::new();
        fresh_state.render(second, &mut surface).unwrap();

        let updated = state.chart().unwrap();
        let fresh = fresh_state.chart().unwrap();
        assert_eq!(updated.data, fresh.data);
        assert_eq!(updated.redraws, 1);
        assert_eq!(surface.drawn.len(), 3);
    }

    #[test]
    fn test_rendering_same_series_twice_is_stable() {
        let mut surface = RecordingSurface::default();
        let mut state = ChartState::new();
        let data = ChartData::from_series(&series(&[4.0, 4.5, 3.9])).unwrap();

        state.render(data.clone(), &mut surface).unwrap();
        state.render(data.clone(), &mut surface).unwrap();

        assert_eq!(state.chart().unwrap().data, data);
        assert_eq!(surface.drawn[0].data, surface.drawn[1].data);
    }

    #[test]
    fn test_tooltip_by_index() {
        let mut surface = RecordingSurface::default();
        let mut state = ChartState::new();
        let data = ChartData::from_series(&series(&[1.0, 2.0])).unwrap();
        state.render(data, &mut surface).unwrap();

        let chart = state.chart().unwrap();
        assert_eq!(
            chart.tooltip(1).unwrap(),
            "2024-05-02 - Valor Histórico: 2.00 (Máximo Histórico)"
        );
        assert!(chart.tooltip(2).is_none());
    }

    #[test]
    fn test_standard_legend_has_three_entries() {
        let lines = Legend::standard().lines();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains(MAX_LABEL));
        assert!(lines[1].contains("#00ff00"));
        assert!(lines[2].contains(DATASET_LABEL));
    }
}
