use crate::event::AppEvent;
use crate::notice::{NoticeKind, Notices};
use crate::service::{Dispatcher, ExperimentRecord, LoadTestRecord, ServiceError};
use crate::theme::Theme;
use eframe::egui::{self, RichText};
use std::time::{Duration, Instant};
use tracing::warn;

pub mod charts;

use charts::{ExperimentSeries, LoadTestSeries};

pub const REFRESH_INTERVAL: Duration = Duration::from_secs(60);
pub const NO_EXPERIMENTS_TEXT: &str =
    "No experiment data available. Run an evaluation to see metrics.";
pub const NO_LOAD_TESTS_TEXT: &str =
    "No load test data available. Run a load test to see metrics.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardStats {
    pub total_tests: usize,
    pub total_experiments: usize,
    pub latest_latency: Option<String>,
    pub latest_rouge: Option<String>,
}

/// Stats cards; the "latest" figures come from the first record of each list.
pub fn compute_stats(experiments: &[ExperimentRecord], load_tests: &[LoadTestRecord]) -> DashboardStats {
    let latest_latency = load_tests
        .first()
        .and_then(|record| record.p95_ms)
        .filter(|p95| *p95 != 0.0)
        .map(|p95| format!("{p95:.2}ms"));
    let latest_rouge = experiments
        .first()
        .and_then(|record| record.rouge_l)
        .filter(|rouge| *rouge != 0.0)
        .map(|rouge| format!("{:.1}%", rouge * 100.0));

    DashboardStats {
        total_tests: load_tests.len(),
        total_experiments: experiments.len(),
        latest_latency,
        latest_rouge,
    }
}

pub struct Dashboard {
    dispatcher: Dispatcher,
    experiments: Vec<ExperimentRecord>,
    load_tests: Vec<LoadTestRecord>,
    last_refresh: Option<Instant>,
    load_test_running: bool,
    eval_running: bool,
}

impl Dashboard {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher,
            experiments: Vec::new(),
            load_tests: Vec::new(),
            last_refresh: None,
            load_test_running: false,
            eval_running: false,
        }
    }

    pub fn stats(&self) -> DashboardStats {
        compute_stats(&self.experiments, &self.load_tests)
    }

    #[cfg(test)]
    pub fn is_load_test_running(&self) -> bool {
        self.load_test_running
    }

    #[cfg(test)]
    pub fn is_eval_running(&self) -> bool {
        self.eval_running
    }

    pub fn refresh(&mut self, now: Instant) {
        self.last_refresh = Some(now);
        let service = self.dispatcher.service();
        self.dispatcher
            .spawn(async move { AppEvent::ExperimentsLoaded(service.experiments().await) });
        let service = self.dispatcher.service();
        self.dispatcher
            .spawn(async move { AppEvent::LoadTestsLoaded(service.load_tests().await) });
    }

    /// Refreshes on first use and then once per interval.
    pub fn tick(&mut self, now: Instant) -> bool {
        let due = self
            .last_refresh
            .map_or(true, |last| now.saturating_duration_since(last) >= REFRESH_INTERVAL);
        if due {
            self.refresh(now);
        }
        due
    }

    pub fn run_load_test(&mut self) {
        if self.load_test_running {
            return;
        }
        self.load_test_running = true;
        let service = self.dispatcher.service();
        self.dispatcher
            .spawn(async move { AppEvent::LoadTestFinished(service.run_load_test().await) });
    }

    pub fn run_eval(&mut self) {
        if self.eval_running {
            return;
        }
        self.eval_running = true;
        let service = self.dispatcher.service();
        self.dispatcher
            .spawn(async move { AppEvent::EvalFinished(service.run_eval().await) });
    }

    fn finish_run(
        &mut self,
        result: Result<(), ServiceError>,
        success: &str,
        failure: &str,
        notices: &mut Notices,
    ) {
        match result {
            Ok(()) => {
                notices.toast(NoticeKind::Success, success);
                self.refresh(Instant::now());
            }
            Err(err) => {
                warn!(error = %err, "{failure}");
                notices.toast(NoticeKind::Error, failure);
            }
        }
    }

    pub fn apply_event(&mut self, event: AppEvent, notices: &mut Notices) -> Option<AppEvent> {
        match event {
            AppEvent::ExperimentsLoaded(Ok(records)) => self.experiments = records,
            AppEvent::ExperimentsLoaded(Err(err)) => {
                warn!(error = %err, "loading experiments failed");
                notices.toast(NoticeKind::Error, "Failed to load experiment data");
            }
            AppEvent::LoadTestsLoaded(Ok(records)) => self.load_tests = records,
            AppEvent::LoadTestsLoaded(Err(err)) => {
                warn!(error = %err, "loading load tests failed");
                notices.toast(NoticeKind::Error, "Failed to load load test data");
            }
            AppEvent::LoadTestFinished(result) => {
                self.load_test_running = false;
                self.finish_run(
                    result,
                    "Load test completed successfully",
                    "Load test failed. Please try again.",
                    notices,
                );
            }
            AppEvent::EvalFinished(result) => {
                self.eval_running = false;
                self.finish_run(
                    result,
                    "Evaluation completed successfully",
                    "Evaluation failed. Please try again.",
                    notices,
                );
            }
            other => return Some(other),
        }
        None
    }

    pub fn render(&mut self, ui: &mut egui::Ui, theme: &Theme) {
        ui.horizontal(|ui| {
            ui.heading("Metrics Dashboard");
            ui.separator();
            let label = if self.load_test_running {
                "Running Load Test..."
            } else {
                "Run Load Test"
            };
            if ui
                .add_enabled(!self.load_test_running, egui::Button::new(label))
                .clicked()
            {
                self.run_load_test();
            }
            let label = if self.eval_running {
                "Running Evaluation..."
            } else {
                "Run Evaluation"
            };
            if ui
                .add_enabled(!self.eval_running, egui::Button::new(label))
                .clicked()
            {
                self.run_eval();
            }
            if self.load_test_running || self.eval_running {
                ui.spinner();
            }
        });
        ui.add_space(theme.spacing_8);

        let stats = self.stats();
        ui.horizontal(|ui| {
            stat_card(ui, theme, "Load Tests", &stats.total_tests.to_string());
            stat_card(ui, theme, "Experiments", &stats.total_experiments.to_string());
            stat_card(
                ui,
                theme,
                "Latest p95",
                stats.latest_latency.as_deref().unwrap_or("-"),
            );
            stat_card(
                ui,
                theme,
                "Latest ROUGE-L",
                stats.latest_rouge.as_deref().unwrap_or("-"),
            );
        });
        ui.add_space(theme.spacing_12);

        egui::ScrollArea::vertical()
            .id_salt("dashboard_scroll")
            .show(ui, |ui| {
                theme.card_frame().show(ui, |ui| {
                    ui.strong("Experiment Metrics");
                    if self.experiments.is_empty() {
                        ui.label(RichText::new(NO_EXPERIMENTS_TEXT).color(theme.text_muted));
                    } else {
                        let series = ExperimentSeries::from_records(&self.experiments);
                        charts::experiment_chart(ui, &series, theme);
                    }
                });
                ui.add_space(theme.spacing_12);
                theme.card_frame().show(ui, |ui| {
                    ui.strong("Load Test p95 Latency");
                    if self.load_tests.is_empty() {
                        ui.label(RichText::new(NO_LOAD_TESTS_TEXT).color(theme.text_muted));
                    } else {
                        let series = LoadTestSeries::from_records(&self.load_tests);
                        charts::load_test_chart(ui, &series, theme);
                        egui::Grid::new("load_test_errors")
                            .striped(true)
                            .show(ui, |ui| {
                                ui.strong("Concurrency");
                                ui.strong("Error rate");
                                ui.end_row();
                                for (label, rate) in
                                    series.labels.iter().zip(&series.error_rate_pct)
                                {
                                    ui.label(label);
                                    ui.label(format!("{rate:.1}%"));
                                    ui.end_row();
                                }
                            });
                    }
                });
            });
    }
}

fn stat_card(ui: &mut egui::Ui, theme: &Theme, label: &str, value: &str) {
    theme.card_frame().show(ui, |ui| {
        ui.set_min_width(140.0);
        ui.vertical(|ui| {
            ui.label(RichText::new(label).color(theme.text_muted).size(12.0));
            ui.label(RichText::new(value).color(theme.text_primary).size(20.0).strong());
        });
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::fake::Harness;

    fn experiment(file: &str, rouge: Option<f64>) -> ExperimentRecord {
        ExperimentRecord {
            file: file.to_string(),
            rouge_l: rouge,
            fk_grade: Some(9.0),
            latency_s: Some(1.5),
        }
    }

    fn load_test(concurrency: u32, p95: Option<f64>) -> LoadTestRecord {
        LoadTestRecord {
            concurrency,
            p95_ms: p95,
            rps: Some(12.0),
            error_rate: Some(0.0),
        }
    }

    #[test]
    fn stats_format_the_latest_records() {
        let stats = compute_stats(
            &[experiment("a.pdf", Some(0.4234)), experiment("b.pdf", Some(0.1))],
            &[load_test(10, Some(123.456))],
        );
        assert_eq!(stats.total_experiments, 2);
        assert_eq!(stats.total_tests, 1);
        assert_eq!(stats.latest_latency.as_deref(), Some("123.46ms"));
        assert_eq!(stats.latest_rouge.as_deref(), Some("42.3%"));
    }

    #[test]
    fn absent_or_zero_metrics_are_hidden() {
        let stats = compute_stats(&[experiment("a.pdf", Some(0.0))], &[load_test(1, None)]);
        assert!(stats.latest_latency.is_none());
        assert!(stats.latest_rouge.is_none());

        let empty = compute_stats(&[], &[]);
        assert_eq!(empty.total_tests, 0);
        assert!(empty.latest_rouge.is_none());
    }

    #[test]
    fn tick_refreshes_once_per_interval() {
        let harness = Harness::new();
        let mut dashboard = Dashboard::new(harness.dispatcher.clone());
        let start = Instant::now();

        assert!(dashboard.tick(start));
        assert!(!dashboard.tick(start + Duration::from_secs(30)));
        assert!(dashboard.tick(start + REFRESH_INTERVAL));
    }

    #[test]
    fn refresh_replaces_both_datasets() {
        let harness = Harness::new();
        harness
            .service
            .experiments
            .lock()
            .push(experiment("nda.pdf", Some(0.5)));
        harness.service.load_tests.lock().push(load_test(5, Some(80.0)));
        let mut dashboard = Dashboard::new(harness.dispatcher.clone());
        let mut notices = Notices::default();

        dashboard.refresh(Instant::now());
        for _ in 0..2 {
            let event = harness.next_event();
            assert!(dashboard.apply_event(event, &mut notices).is_none());
        }

        let stats = dashboard.stats();
        assert_eq!(stats.total_experiments, 1);
        assert_eq!(stats.total_tests, 1);
        assert_eq!(stats.latest_latency.as_deref(), Some("80.00ms"));
    }

    #[test]
    fn successful_run_toasts_and_refreshes() {
        let harness = Harness::new();
        let mut dashboard = Dashboard::new(harness.dispatcher.clone());
        let mut notices = Notices::default();

        dashboard.run_load_test();
        assert!(dashboard.is_load_test_running());
        dashboard.run_load_test();

        let event = harness.next_event();
        dashboard.apply_event(event, &mut notices);

        assert!(!dashboard.is_load_test_running());
        assert_eq!(notices.toasts()[0].text, "Load test completed successfully");
        for _ in 0..2 {
            let event = harness.next_event();
            dashboard.apply_event(event, &mut notices);
        }
        let calls = harness.service.calls();
        assert_eq!(calls.iter().filter(|call| *call == "run_load_test").count(), 1);
        assert!(calls.contains(&"experiments".to_string()));
        assert!(calls.contains(&"load_tests".to_string()));
    }

    #[test]
    fn failed_eval_restores_the_button_without_refreshing() {
        let harness = Harness::new();
        harness.service.fail_writes();
        let mut dashboard = Dashboard::new(harness.dispatcher.clone());
        let mut notices = Notices::default();

        dashboard.run_eval();
        let event = harness.next_event();
        dashboard.apply_event(event, &mut notices);

        assert!(!dashboard.is_eval_running());
        assert_eq!(notices.toasts()[0].text, "Evaluation failed. Please try again.");
        harness.assert_idle();
    }

    #[test]
    fn chat_events_are_handed_back() {
        let harness = Harness::new();
        let mut dashboard = Dashboard::new(harness.dispatcher.clone());
        let mut notices = Notices::default();
        let event = AppEvent::Saved(Ok(()));
        assert!(matches!(
            dashboard.apply_event(event, &mut notices),
            Some(AppEvent::Saved(Ok(())))
        ));
    }
}
