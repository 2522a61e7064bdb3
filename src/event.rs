use crate::service::{ExperimentRecord, LoadTestRecord, ServiceError};
use crate::session::history::{HistoryEntry, HistorySummary};
use crate::session::SummaryResult;

/// Completion of one background request, delivered to the UI thread.
#[derive(Debug)]
pub enum AppEvent {
    Summarized {
        token: u64,
        file_name: String,
        result: Result<SummaryResult, ServiceError>,
    },
    Saved(Result<(), ServiceError>),
    HistoryListed(Result<Vec<HistorySummary>, ServiceError>),
    HistoryItemLoaded {
        token: u64,
        result: Result<HistoryEntry, ServiceError>,
    },
    HistoryItemDeleted {
        id: String,
        result: Result<(), ServiceError>,
    },
    ExperimentsLoaded(Result<Vec<ExperimentRecord>, ServiceError>),
    LoadTestsLoaded(Result<Vec<LoadTestRecord>, ServiceError>),
    LoadTestFinished(Result<(), ServiceError>),
    EvalFinished(Result<(), ServiceError>),
    SignedUp(Result<(), ServiceError>),
    PasswordChanged(Result<(), ServiceError>),
}
