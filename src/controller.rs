use crate::event::AppEvent;
use crate::export;
use crate::markup;
use crate::notice::{NoticeKind, Notices};
use crate::service::{Dispatcher, ServiceError};
use crate::session::history::{default_title, HistoryEntry, HistorySummary, SaveSummaryRequest};
use crate::session::{
    MessageId, Role, SessionContext, SummaryResult, Transcript, JARGON_TITLE, SUMMARY_TITLE,
};
use crate::ui::menu::{ContextMenu, MenuEntry};
use chrono::Local;
use eframe::egui::Pos2;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const NARROW_VIEWPORT_WIDTH: f32 = 768.0;
pub const UPLOAD_IDLE_LABEL: &str = "Upload Document";
pub const UPLOAD_BUSY_LABEL: &str = "Processing...";
pub const UPLOAD_ERROR_PREFIX: &str = "Error processing document:";
pub const GUEST_HISTORY_TEXT: &str = "Log in to view your saved summaries.";
pub const EMPTY_HISTORY_TEXT: &str = "No saved summaries yet.";
pub const LOGIN_TO_SAVE_TEXT: &str = "Please log in to save summaries to your history.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuAction {
    Export(MessageId),
    Save(MessageId),
    Delete(String),
}

impl MenuEntry for MenuAction {
    fn label(&self) -> String {
        match self {
            Self::Export(_) => "Export as PDF".to_string(),
            Self::Save(_) => "Save to history".to_string(),
            Self::Delete(_) => "Delete".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryView {
    GuestPlaceholder,
    Loading,
    Entries(Vec<HistorySummary>),
    Empty,
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadState {
    Idle,
    Pending { token: u64 },
}

/// The summary the trailing "Summary" message was rendered from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentResult {
    pub filename: Option<String>,
    pub result: SummaryResult,
    pub message_id: MessageId,
}

pub struct ChatController {
    session: SessionContext,
    dispatcher: Dispatcher,
    export_dir: PathBuf,
    transcript: Transcript,
    current: Option<CurrentResult>,
    rendered: BTreeMap<MessageId, CurrentResult>,
    upload: UploadState,
    selected_file: Option<PathBuf>,
    latest_token: u64,
    history: HistoryView,
    menu: ContextMenu<MenuAction>,
    viewport_narrow: bool,
    sidebar_open: bool,
}

impl ChatController {
    pub fn new(session: SessionContext, dispatcher: Dispatcher, export_dir: PathBuf) -> Self {
        let history = if session.is_guest() {
            HistoryView::GuestPlaceholder
        } else {
            HistoryView::Loading
        };
        Self {
            session,
            dispatcher,
            export_dir,
            transcript: Transcript::with_welcome(),
            current: None,
            rendered: BTreeMap::new(),
            upload: UploadState::Idle,
            selected_file: None,
            latest_token: 0,
            history,
            menu: ContextMenu::default(),
            viewport_narrow: false,
            sidebar_open: false,
        }
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn current(&self) -> Option<&CurrentResult> {
        self.current.as_ref()
    }

    pub fn history(&self) -> &HistoryView {
        &self.history
    }

    pub fn selected_file(&self) -> Option<&Path> {
        self.selected_file.as_deref()
    }

    pub fn is_uploading(&self) -> bool {
        matches!(self.upload, UploadState::Pending { .. })
    }

    pub fn upload_label(&self) -> &'static str {
        match self.upload {
            UploadState::Idle => UPLOAD_IDLE_LABEL,
            UploadState::Pending { .. } => UPLOAD_BUSY_LABEL,
        }
    }

    #[cfg(test)]
    pub fn latest_token(&self) -> u64 {
        self.latest_token
    }

    pub fn menu_mut(&mut self) -> &mut ContextMenu<MenuAction> {
        &mut self.menu
    }

    pub fn set_viewport_width(&mut self, width: f32) {
        let narrow = width < NARROW_VIEWPORT_WIDTH;
        if narrow && !self.viewport_narrow {
            self.sidebar_open = false;
        }
        self.viewport_narrow = narrow;
    }

    pub fn is_narrow(&self) -> bool {
        self.viewport_narrow
    }

    pub fn sidebar_visible(&self) -> bool {
        !self.viewport_narrow || self.sidebar_open
    }

    pub fn toggle_sidebar(&mut self) {
        self.sidebar_open = !self.sidebar_open;
    }

    fn next_token(&mut self) -> u64 {
        self.latest_token += 1;
        self.latest_token
    }

    pub fn upload(&mut self, path: PathBuf) {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        self.transcript
            .push(Role::User, None, markup::escape(&file_name));
        let token = self.next_token();
        self.upload = UploadState::Pending { token };
        self.selected_file = Some(path.clone());
        info!(file = %file_name, token, "uploading document for summarization");

        let service = self.dispatcher.service();
        self.dispatcher.spawn(async move {
            let result = match tokio::fs::read(&path).await {
                Ok(bytes) => service.summarize(&file_name, bytes).await,
                Err(source) => Err(ServiceError::ReadFile { path, source }),
            };
            AppEvent::Summarized {
                token,
                file_name,
                result,
            }
        });
    }

    fn finish_upload(
        &mut self,
        token: u64,
        file_name: String,
        result: Result<SummaryResult, ServiceError>,
    ) {
        if self.upload == (UploadState::Pending { token }) {
            self.upload = UploadState::Idle;
            self.selected_file = None;
        }

        if token != self.latest_token {
            debug!(token, latest = self.latest_token, "discarding superseded summary response");
            return;
        }

        match result {
            Ok(result) => {
                info!(file = %file_name, paragraphs = result.summary.len(), terms = result.jargon.len(), "summary received");
                let body = markup::summary_body(&result.summary);
                self.show_result(Some(file_name), result, body);
            }
            Err(err) => {
                warn!(file = %file_name, error = %err, "summarization failed");
                self.transcript.push(
                    Role::System,
                    None,
                    markup::escape(&format!("{UPLOAD_ERROR_PREFIX} {err}")),
                );
            }
        }
    }

    fn show_result(&mut self, filename: Option<String>, result: SummaryResult, body: String) {
        let message_id = self.transcript.push_with_options(SUMMARY_TITLE, body);
        if !result.jargon.is_empty() {
            self.transcript.push(
                Role::System,
                Some(JARGON_TITLE),
                markup::jargon_body(&result.jargon),
            );
        }
        let rendered = CurrentResult {
            filename,
            result,
            message_id,
        };
        self.rendered.insert(message_id, rendered.clone());
        self.current = Some(rendered);
    }

    pub fn open_message_menu(&mut self, id: MessageId, anchor: Pos2) {
        self.menu
            .show(anchor, vec![MenuAction::Export(id), MenuAction::Save(id)]);
    }

    pub fn open_history_menu(&mut self, entry_id: &str, anchor: Pos2) {
        self.menu
            .show(anchor, vec![MenuAction::Delete(entry_id.to_string())]);
    }

    pub fn run_menu_action(&mut self, action: MenuAction, notices: &mut Notices) {
        self.menu.hide();
        match action {
            MenuAction::Export(id) => self.export_message(id, notices),
            MenuAction::Save(id) => self.save_to_history(id, notices),
            MenuAction::Delete(entry_id) => self.delete_history_item(entry_id),
        }
    }

    pub fn export_message(&mut self, id: MessageId, notices: &mut Notices) {
        let Some(message) = self.transcript.get(id) else {
            notices.toast(NoticeKind::Error, "That message is no longer in the chat.");
            return;
        };

        let title = message.title.as_deref().unwrap_or(SUMMARY_TITLE);
        match export::export_pdf(&self.export_dir, title, &message.plain_body(), Local::now()) {
            Ok(path) => {
                info!(path = %path.display(), "exported summary");
                notices.toast(
                    NoticeKind::Success,
                    format!("Exported to {}", path.display()),
                );
            }
            Err(err) => {
                warn!(error = %err, "export failed");
                notices.toast(NoticeKind::Error, format!("Export failed: {err}"));
            }
        }
    }

    pub fn save_to_history(&mut self, id: MessageId, notices: &mut Notices) {
        if self.session.is_guest() {
            notices.toast(NoticeKind::Info, LOGIN_TO_SAVE_TEXT);
            return;
        }
        let Some(message) = self.transcript.get(id) else {
            notices.toast(NoticeKind::Error, "That message is no longer in the chat.");
            return;
        };
        // Each summary message saves with the result it was rendered from.
        let Some(source) = self.rendered.get(&id) else {
            notices.toast(NoticeKind::Info, "There is no summary to save yet.");
            return;
        };

        let request = SaveSummaryRequest {
            title: default_title(source.filename.as_deref(), Local::now()),
            filename: source.filename.clone().unwrap_or_default(),
            content: message.serialized(),
            summary: source.result.summary.clone(),
            jargon: source.result.jargon.clone(),
        };
        info!(title = %request.title, "saving summary to history");

        let service = self.dispatcher.service();
        self.dispatcher.spawn(async move {
            AppEvent::Saved(service.save_summary(&request).await)
        });
    }

    fn finish_save(&mut self, result: Result<(), ServiceError>, notices: &mut Notices) {
        match result {
            Ok(()) => {
                notices.toast(NoticeKind::Success, "Summary saved to history");
                self.load_history();
            }
            Err(err) => {
                warn!(error = %err, "saving summary failed");
                notices.toast(NoticeKind::Error, format!("Could not save summary: {err}"));
            }
        }
    }

    pub fn load_history(&mut self) {
        if self.session.is_guest() {
            self.history = HistoryView::GuestPlaceholder;
            return;
        }

        self.history = HistoryView::Loading;
        let service = self.dispatcher.service();
        self.dispatcher
            .spawn(async move { AppEvent::HistoryListed(service.list_summaries().await) });
    }

    fn finish_history_list(
        &mut self,
        result: Result<Vec<HistorySummary>, ServiceError>,
        notices: &mut Notices,
    ) {
        self.history = match result {
            Ok(entries) if entries.is_empty() => HistoryView::Empty,
            Ok(entries) => {
                debug!(count = entries.len(), "history loaded");
                HistoryView::Entries(entries)
            }
            Err(err) => {
                warn!(error = %err, "loading history failed");
                notices.toast(NoticeKind::Error, "Failed to load history");
                HistoryView::Failed(format!("Could not load history: {err}"))
            }
        };
    }

    pub fn load_history_item(&mut self, id: &str) {
        let token = self.next_token();
        let id = id.to_string();
        info!(entry = %id, token, "loading saved summary");

        let service = self.dispatcher.service();
        self.dispatcher.spawn(async move {
            AppEvent::HistoryItemLoaded {
                token,
                result: service.get_summary(&id).await,
            }
        });
    }

    fn finish_history_item(
        &mut self,
        token: u64,
        result: Result<HistoryEntry, ServiceError>,
        notices: &mut Notices,
    ) {
        if token != self.latest_token {
            debug!(token, latest = self.latest_token, "discarding superseded history entry");
            return;
        }

        match result {
            Ok(entry) => {
                self.menu.hide();
                self.transcript.clear();
                self.rendered.clear();
                let filename = Some(entry.filename.clone()).filter(|name| !name.is_empty());
                let body = entry.summary_body().to_string();
                self.show_result(filename, entry.result(), body);
                if self.viewport_narrow {
                    self.sidebar_open = false;
                }
            }
            Err(err) => {
                warn!(error = %err, "loading saved summary failed");
                notices.alert(format!("Could not load this summary: {err}"));
            }
        }
    }

    pub fn delete_history_item(&mut self, id: String) {
        info!(entry = %id, "deleting saved summary");
        let service = self.dispatcher.service();
        self.dispatcher.spawn(async move {
            let result = service.delete_summary(&id).await;
            AppEvent::HistoryItemDeleted { id, result }
        });
    }

    fn finish_delete(&mut self, id: String, result: Result<(), ServiceError>, notices: &mut Notices) {
        if let Err(err) = result {
            warn!(entry = %id, error = %err, "deleting saved summary failed");
            notices.toast(NoticeKind::Error, format!("Could not delete summary: {err}"));
            return;
        }

        if let HistoryView::Entries(entries) = &mut self.history {
            entries.retain(|entry| entry.id != id);
            if entries.is_empty() {
                self.history = HistoryView::Empty;
            }
        }
        notices.toast(NoticeKind::Success, "Summary deleted");
    }

    /// Starts over; responses still in flight are dropped when they land.
    pub fn new_chat(&mut self) {
        self.transcript.reset();
        self.current = None;
        self.rendered.clear();
        self.menu.hide();
        self.latest_token += 1;
    }

    /// Applies a completion that belongs to the chat, handing anything else back.
    pub fn apply_event(&mut self, event: AppEvent, notices: &mut Notices) -> Option<AppEvent> {
        match event {
            AppEvent::Summarized {
                token,
                file_name,
                result,
            } => self.finish_upload(token, file_name, result),
            AppEvent::Saved(result) => self.finish_save(result, notices),
            AppEvent::HistoryListed(result) => self.finish_history_list(result, notices),
            AppEvent::HistoryItemLoaded { token, result } => {
                self.finish_history_item(token, result, notices)
            }
            AppEvent::HistoryItemDeleted { id, result } => self.finish_delete(id, result, notices),
            other => return Some(other),
        }
        None
    }
}
