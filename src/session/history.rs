use crate::session::{SummaryResult, SUMMARY_TITLE};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Literal prefix written by [`crate::session::Message::serialized`] for summary messages.
pub const SUMMARY_CONTENT_PREFIX: &str = "<b>Summary</b><br><br>";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistorySummary {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl HistorySummary {
    pub fn label(&self) -> &str {
        if self.title.is_empty() {
            &self.filename
        } else {
            &self.title
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub summary: Vec<String>,
    #[serde(default)]
    pub jargon: BTreeMap<String, String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl HistoryEntry {
    pub fn summary_body(&self) -> &str {
        self.content
            .strip_prefix(SUMMARY_CONTENT_PREFIX)
            .unwrap_or(&self.content)
    }

    pub fn result(&self) -> SummaryResult {
        SummaryResult {
            summary: self.summary.clone(),
            jargon: self.jargon.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaveSummaryRequest {
    pub title: String,
    pub filename: String,
    pub content: String,
    pub summary: Vec<String>,
    pub jargon: BTreeMap<String, String>,
}

pub fn default_title(filename: Option<&str>, now: DateTime<Local>) -> String {
    match filename {
        Some(name) if !name.trim().is_empty() => name.to_string(),
        _ => format!("{SUMMARY_TITLE} {}", now.format("%Y-%m-%d %H:%M:%S")),
    }
}
