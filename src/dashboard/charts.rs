use crate::service::{ExperimentRecord, LoadTestRecord};
use crate::theme::Theme;
use eframe::egui::{self, Color32};
use egui_plot::{Bar, BarChart, Legend, Line, Plot, PlotPoints};

const CHART_HEIGHT: f32 = 260.0;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExperimentSeries {
    pub labels: Vec<String>,
    pub rouge: Vec<f64>,
    pub fk_grade: Vec<f64>,
}

impl ExperimentSeries {
    pub fn from_records(records: &[ExperimentRecord]) -> Self {
        Self {
            labels: records.iter().map(|record| record.file.clone()).collect(),
            rouge: records
                .iter()
                .map(|record| record.rouge_l.unwrap_or(0.0))
                .collect(),
            fk_grade: records
                .iter()
                .map(|record| record.fk_grade.unwrap_or(0.0))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadTestSeries {
    pub labels: Vec<String>,
    pub p95: Vec<f64>,
    pub rps: Vec<f64>,
    pub error_rate_pct: Vec<f64>,
}

impl LoadTestSeries {
    pub fn from_records(records: &[LoadTestRecord]) -> Self {
        Self {
            labels: records
                .iter()
                .map(|record| format!("{} users", record.concurrency))
                .collect(),
            p95: records
                .iter()
                .map(|record| record.p95_ms.unwrap_or(0.0))
                .collect(),
            rps: records.iter().map(|record| record.rps.unwrap_or(0.0)).collect(),
            error_rate_pct: records
                .iter()
                .map(|record| record.error_rate.unwrap_or(0.0) * 100.0)
                .collect(),
        }
    }
}

/// Tick label for category axes: only whole indices get a name.
pub fn category_label(labels: &[String], value: f64) -> String {
    let index = value.round();
    if (value - index).abs() > 1e-6 || index < 0.0 {
        return String::new();
    }
    labels.get(index as usize).cloned().unwrap_or_default()
}

fn points(values: &[f64]) -> PlotPoints<'_> {
    values
        .iter()
        .enumerate()
        .map(|(index, value)| [index as f64, *value])
        .collect()
}

pub fn experiment_chart(ui: &mut egui::Ui, series: &ExperimentSeries, theme: &Theme) {
    let bars: Vec<Bar> = series
        .rouge
        .iter()
        .enumerate()
        .map(|(index, value)| {
            Bar::new(index as f64, *value)
                .name(&series.labels[index])
                .width(0.6)
        })
        .collect();
    let labels = series.labels.clone();

    Plot::new("experiment_chart")
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .allow_scroll(false)
        .x_axis_formatter(move |mark, _range| category_label(&labels, mark.value))
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(
                BarChart::new(bars)
                    .name("ROUGE-L")
                    .color(theme.accent_primary),
            );
            plot_ui.line(
                Line::new(points(&series.fk_grade))
                    .name("Flesch-Kincaid Grade")
                    .color(Color32::from_rgb(114, 9, 183)),
            );
        });
}

pub fn load_test_chart(ui: &mut egui::Ui, series: &LoadTestSeries, theme: &Theme) {
    let labels = series.labels.clone();

    Plot::new("load_test_chart")
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .allow_scroll(false)
        .x_axis_formatter(move |mark, _range| category_label(&labels, mark.value))
        .show(ui, |plot_ui| {
            plot_ui.line(
                Line::new(points(&series.p95))
                    .name("p95 Latency (ms)")
                    .color(Color32::from_rgb(247, 37, 133))
                    .width(2.0),
            );
            plot_ui.line(
                Line::new(points(&series.rps))
                    .name("Requests per Second")
                    .color(theme.accent_primary)
                    .width(2.0),
            );
        });
}
