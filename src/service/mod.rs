use crate::event::AppEvent;
use crate::session::history::{HistoryEntry, HistorySummary, SaveSummaryRequest};
use crate::session::SummaryResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::path::PathBuf;
use std::sync::{mpsc, Arc, OnceLock};
use thiserror::Error;
use tokio::runtime::Handle;

pub mod http;

pub use http::HttpSummaryService;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Transport(#[from] reqwest::Error),
    #[error("{}", describe_status(.status, .message))]
    Status { status: u16, message: Option<String> },
    #[error("could not read {}: {source}", .path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn describe_status(status: &u16, message: &Option<String>) -> String {
    match message {
        Some(message) => format!("{message} (HTTP {status})"),
        None => format!("server responded with HTTP {status}"),
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentRecord {
    #[serde(default)]
    pub file: String,
    #[serde(rename = "rougeL", default)]
    pub rouge_l: Option<f64>,
    #[serde(default)]
    pub fk_grade: Option<f64>,
    #[serde(default)]
    pub latency_s: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadTestRecord {
    #[serde(default)]
    pub concurrency: u32,
    #[serde(default)]
    pub p95_ms: Option<f64>,
    #[serde(default)]
    pub rps: Option<f64>,
    #[serde(default)]
    pub error_rate: Option<f64>,
}

/// The remote summarization, history, metrics and account endpoints.
#[async_trait]
pub trait SummaryService: Send + Sync {
    async fn summarize(&self, file_name: &str, bytes: Vec<u8>) -> ServiceResult<SummaryResult>;
    async fn save_summary(&self, request: &SaveSummaryRequest) -> ServiceResult<()>;
    async fn list_summaries(&self) -> ServiceResult<Vec<HistorySummary>>;
    async fn get_summary(&self, id: &str) -> ServiceResult<HistoryEntry>;
    async fn delete_summary(&self, id: &str) -> ServiceResult<()>;
    async fn experiments(&self) -> ServiceResult<Vec<ExperimentRecord>>;
    async fn load_tests(&self) -> ServiceResult<Vec<LoadTestRecord>>;
    async fn run_load_test(&self) -> ServiceResult<()>;
    async fn run_eval(&self) -> ServiceResult<()>;
    async fn sign_up(&self, username: &str, password: &str) -> ServiceResult<()>;
    async fn change_password(&self, new_password: &str) -> ServiceResult<()>;
}

/// Runs service calls on the tokio runtime and posts their outcome back to the UI thread.
#[derive(Clone)]
pub struct Dispatcher {
    service: Arc<dyn SummaryService>,
    runtime_handle: Handle,
    tx: mpsc::Sender<AppEvent>,
    repaint: Arc<OnceLock<egui::Context>>,
}

impl Dispatcher {
    pub fn new(
        service: Arc<dyn SummaryService>,
        runtime_handle: Handle,
        tx: mpsc::Sender<AppEvent>,
    ) -> Self {
        Self {
            service,
            runtime_handle,
            tx,
            repaint: Arc::new(OnceLock::new()),
        }
    }

    pub fn attach_repaint(&self, ctx: egui::Context) {
        let _ = self.repaint.set(ctx);
    }

    pub fn service(&self) -> Arc<dyn SummaryService> {
        Arc::clone(&self.service)
    }

    pub fn spawn<F>(&self, task: F)
    where
        F: Future<Output = AppEvent> + Send + 'static,
    {
        let tx = self.tx.clone();
        let repaint = Arc::clone(&self.repaint);
        self.runtime_handle.spawn(async move {
            let event = task.await;
            if tx.send(event).is_err() {
                tracing::debug!("event receiver dropped before completion was delivered");
                return;
            }
            if let Some(ctx) = repaint.get() {
                ctx.request_repaint();
            }
        });
    }
}

#[cfg(test)]
pub mod fake {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::VecDeque;

    /// Scripted service used by controller and dashboard tests.
    #[derive(Default)]
    pub struct FakeService {
        pub calls: Mutex<Vec<String>>,
        pub summarize: Mutex<VecDeque<ServiceResult<SummaryResult>>>,
        pub list: Mutex<VecDeque<ServiceResult<Vec<HistorySummary>>>>,
        pub entries: Mutex<VecDeque<ServiceResult<HistoryEntry>>>,
        pub saved: Mutex<Vec<SaveSummaryRequest>>,
        pub fail_writes: Mutex<bool>,
        pub experiments: Mutex<Vec<ExperimentRecord>>,
        pub load_tests: Mutex<Vec<LoadTestRecord>>,
    }

    impl FakeService {
        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().clone()
        }

        pub fn fail_writes(&self) {
            *self.fail_writes.lock() = true;
        }

        fn record(&self, call: impl Into<String>) {
            self.calls.lock().push(call.into());
        }

        fn write_outcome(&self) -> ServiceResult<()> {
            if *self.fail_writes.lock() {
                Err(server_error())
            } else {
                Ok(())
            }
        }
    }

    pub fn server_error() -> ServiceError {
        ServiceError::Status {
            status: 500,
            message: None,
        }
    }

    #[async_trait]
    impl SummaryService for FakeService {
        async fn summarize(&self, file_name: &str, _bytes: Vec<u8>) -> ServiceResult<SummaryResult> {
            self.record(format!("summarize {file_name}"));
            self.summarize
                .lock()
                .pop_front()
                .unwrap_or_else(|| Err(server_error()))
        }

        async fn save_summary(&self, request: &SaveSummaryRequest) -> ServiceResult<()> {
            self.record("save_summary");
            self.saved.lock().push(request.clone());
            self.write_outcome()
        }

        async fn list_summaries(&self) -> ServiceResult<Vec<HistorySummary>> {
            self.record("list_summaries");
            self.list.lock().pop_front().unwrap_or_else(|| Ok(Vec::new()))
        }

        async fn get_summary(&self, id: &str) -> ServiceResult<HistoryEntry> {
            self.record(format!("get_summary {id}"));
            self.entries
                .lock()
                .pop_front()
                .unwrap_or_else(|| Err(server_error()))
        }

        async fn delete_summary(&self, id: &str) -> ServiceResult<()> {
            self.record(format!("delete_summary {id}"));
            self.write_outcome()
        }

        async fn experiments(&self) -> ServiceResult<Vec<ExperimentRecord>> {
            self.record("experiments");
            Ok(self.experiments.lock().clone())
        }

        async fn load_tests(&self) -> ServiceResult<Vec<LoadTestRecord>> {
            self.record("load_tests");
            Ok(self.load_tests.lock().clone())
        }

        async fn run_load_test(&self) -> ServiceResult<()> {
            self.record("run_load_test");
            self.write_outcome()
        }

        async fn run_eval(&self) -> ServiceResult<()> {
            self.record("run_eval");
            self.write_outcome()
        }

        async fn sign_up(&self, username: &str, _password: &str) -> ServiceResult<()> {
            self.record(format!("sign_up {username}"));
            self.write_outcome()
        }

        async fn change_password(&self, _new_password: &str) -> ServiceResult<()> {
            self.record("change_password");
            self.write_outcome()
        }
    }

    pub struct Harness {
        pub service: Arc<FakeService>,
        pub dispatcher: Dispatcher,
        pub rx: mpsc::Receiver<AppEvent>,
        _runtime: tokio::runtime::Runtime,
    }

    impl Harness {
        pub fn new() -> Self {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .worker_threads(1)
                .enable_all()
                .build()
                .expect("test runtime should build");
            let service = Arc::new(FakeService::default());
            let (tx, rx) = mpsc::channel();
            let dispatcher = Dispatcher::new(service.clone(), runtime.handle().clone(), tx);
            Self {
                service,
                dispatcher,
                rx,
                _runtime: runtime,
            }
        }

        pub fn next_event(&self) -> AppEvent {
            self.rx
                .recv_timeout(std::time::Duration::from_secs(5))
                .expect("a completion event should arrive")
        }

        pub fn assert_idle(&self) {
            assert!(
                self.rx
                    .recv_timeout(std::time::Duration::from_millis(100))
                    .is_err(),
                "no request should have been dispatched"
            );
        }
    }
}
