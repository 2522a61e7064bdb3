use crate::auth::{AccountForm, AccountPanel};
use crate::config::Config;
use crate::controller::{ChatController, HistoryView, EMPTY_HISTORY_TEXT, GUEST_HISTORY_TEXT};
use crate::dashboard::{self, Dashboard};
use crate::event::AppEvent;
use crate::notice::{NoticeKind, Notices};
use crate::service::Dispatcher;
use crate::session::{MessageId, Role, SessionContext};
use crate::theme::Theme;
use crate::ui::menu::ContextMenu;
use crate::ui::{markup_label, section_title};
use eframe::egui::{self, Frame, Margin, RichText, ScrollArea};
use std::path::PathBuf;
use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::Instant;
use tracing::{debug, warn};

const DOCUMENT_EXTENSIONS: [&str; 3] = ["pdf", "docx", "txt"];
const UPLOAD_PENDING_TEXT: &str = "Please wait for the current document to finish processing.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tab {
    Chat,
    Dashboard,
}

/// The account form the profile dropdown offers for this session.
pub fn profile_actions(session: &SessionContext) -> Vec<AccountForm> {
    if session.is_guest() {
        vec![AccountForm::SignUp]
    } else {
        vec![AccountForm::ChangePassword]
    }
}

pub struct DocsumApp {
    rx: Receiver<AppEvent>,
    theme: Theme,
    chat: ChatController,
    dashboard: Option<Dashboard>,
    account: AccountPanel,
    notices: Notices,
    profile_menu: ContextMenu<AccountForm>,
    tab: Tab,
    server_url: String,
    diagnostics_log: Vec<String>,
    scroll_to_bottom: bool,
}

impl DocsumApp {
    pub fn new(rx: Receiver<AppEvent>, dispatcher: Dispatcher, config: &Config, theme: Theme) -> Self {
        let dashboard = config
            .session
            .is_admin()
            .then(|| Dashboard::new(dispatcher.clone()));
        let mut chat = ChatController::new(
            config.session.clone(),
            dispatcher.clone(),
            config.export_dir.clone(),
        );
        chat.load_history();

        Self {
            rx,
            theme,
            chat,
            dashboard,
            account: AccountPanel::new(dispatcher),
            notices: Notices::default(),
            profile_menu: ContextMenu::default(),
            tab: Tab::Chat,
            server_url: config.server_url.clone(),
            diagnostics_log: Vec::new(),
            scroll_to_bottom: false,
        }
    }

    fn timestamp() -> String {
        chrono::Local::now().format("%H:%M:%S").to_string()
    }

    fn log_diagnostic(&mut self, message: impl Into<String>) {
        let entry = format!("[{}] {}", Self::timestamp(), message.into());
        self.diagnostics_log.push(entry);
    }

    fn drain_events(&mut self) {
        loop {
            match self.rx.try_recv() {
                Ok(event) => self.route_event(event),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    warn!("event channel disconnected");
                    self.log_diagnostic("event channel disconnected");
                    break;
                }
            }
        }
    }

    fn route_event(&mut self, event: AppEvent) {
        let messages_before = self.chat.transcript().len();
        let Some(event) = self.chat.apply_event(event, &mut self.notices) else {
            self.scroll_to_bottom |= self.chat.transcript().len() != messages_before;
            return;
        };
        let event = match self.dashboard.as_mut() {
            Some(dashboard) => match dashboard.apply_event(event, &mut self.notices) {
                Some(event) => event,
                None => return,
            },
            None => event,
        };
        if let Some(event) = self.account.apply_event(event, &mut self.notices) {
            debug!(?event, "no handler for event");
        }
    }

    fn collect_diagnostics(&mut self) {
        for error in self.notices.take_errors() {
            self.log_diagnostic(error);
        }
    }

    fn start_upload(&mut self, path: PathBuf) {
        if self.chat.is_uploading() {
            debug!(path = %path.display(), "ignoring document while an upload is pending");
            self.notices.toast(NoticeKind::Info, UPLOAD_PENDING_TEXT);
            return;
        }
        self.tab = Tab::Chat;
        self.scroll_to_bottom = true;
        self.chat.upload(path);
    }

    fn pick_document(&mut self) {
        let picked = rfd::FileDialog::new()
            .set_title("Choose a legal document")
            .add_filter("Documents", &DOCUMENT_EXTENSIONS)
            .pick_file();
        if let Some(path) = picked {
            self.start_upload(path);
        }
    }

    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        let dropped = ctx.input(|input| {
            input
                .raw
                .dropped_files
                .iter()
                .find_map(|file| file.path.clone())
        });
        if let Some(path) = dropped {
            self.start_upload(path);
        }
    }

    fn render_top_bar(&mut self, ctx: &egui::Context) {
        let theme = self.theme.clone();
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if self.chat.is_narrow() && ui.button("☰ History").clicked() {
                    self.chat.toggle_sidebar();
                }
                ui.strong("Legal Document Summarizer");
                ui.separator();
                ui.label(RichText::new(&self.server_url).color(theme.text_muted).small());

                if self.dashboard.is_some() {
                    ui.separator();
                    ui.selectable_value(&mut self.tab, Tab::Chat, "Chat");
                    ui.selectable_value(&mut self.tab, Tab::Dashboard, "Dashboard");
                }

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let profile = ui.add(
                        egui::Button::new(format!("👤 {}", self.chat.session().display_name()))
                            .stroke(theme.subtle_button_stroke()),
                    );
                    if profile.clicked() {
                        let actions = profile_actions(self.chat.session());
                        self.profile_menu
                            .toggle(profile.rect.left_bottom(), actions);
                    }
                    if ui.button("New chat").clicked() {
                        self.chat.new_chat();
                        self.tab = Tab::Chat;
                    }
                });
            });
        });
    }

    fn render_history_panel(&mut self, ctx: &egui::Context) {
        if !self.chat.sidebar_visible() {
            return;
        }

        let theme = self.theme.clone();
        let mut load: Option<String> = None;
        let mut menu: Option<(String, egui::Pos2)> = None;

        egui::SidePanel::left("history_panel")
            .resizable(true)
            .default_width(240.0)
            .show(ctx, |ui| {
                section_title(ui, &theme, "History");
                ui.add_space(theme.spacing_4);
                ScrollArea::vertical()
                    .id_salt("history_list")
                    .show(ui, |ui| match self.chat.history() {
                        HistoryView::GuestPlaceholder => {
                            ui.label(RichText::new(GUEST_HISTORY_TEXT).color(theme.text_muted));
                        }
                        HistoryView::Loading => {
                            ui.horizontal(|ui| {
                                ui.spinner();
                                ui.label("Loading...");
                            });
                        }
                        HistoryView::Empty => {
                            ui.label(RichText::new(EMPTY_HISTORY_TEXT).color(theme.text_muted));
                        }
                        HistoryView::Failed(text) => {
                            ui.label(RichText::new(text).color(theme.danger));
                        }
                        HistoryView::Entries(entries) => {
                            for entry in entries {
                                ui.horizontal(|ui| {
                                    let width = (ui.available_width() - 32.0).max(80.0);
                                    let row = ui.add_sized(
                                        [width, theme.button_height],
                                        egui::Button::new(entry.label()),
                                    );
                                    if row.clicked() {
                                        load = Some(entry.id.clone());
                                    }
                                    let more = ui.button("⋯");
                                    if more.clicked() {
                                        menu = Some((entry.id.clone(), more.rect.left_bottom()));
                                    }
                                });
                            }
                        }
                    });
            });

        if let Some(id) = load {
            self.scroll_to_bottom = true;
            self.chat.load_history_item(&id);
        }
        if let Some((id, anchor)) = menu {
            self.chat.open_history_menu(&id, anchor);
        }
    }

    fn render_transcript(&mut self, ui: &mut egui::Ui) {
        let theme = self.theme.clone();
        let mut options: Option<(MessageId, egui::Pos2)> = None;

        for message in self.chat.transcript().messages() {
            let (fill, align) = match message.role {
                Role::User => (theme.accent_muted, egui::Align::Max),
                Role::System => (theme.surface_2, egui::Align::Min),
            };
            let text_color = match message.role {
                Role::User => theme.text_on_accent,
                Role::System => theme.text_primary,
            };

            ui.with_layout(egui::Layout::top_down(align), |ui| {
                theme.panel_frame(fill, theme.spacing_12 as i8).show(ui, |ui| {
                    ui.set_max_width(ui.available_width() * 0.8);
                    ui.horizontal(|ui| {
                        if let Some(title) = &message.title {
                            ui.label(RichText::new(title).color(text_color).strong());
                        }
                        if message.has_options {
                            ui.with_layout(
                                egui::Layout::right_to_left(egui::Align::Center),
                                |ui| {
                                    let button = ui.button("⋯");
                                    if button.clicked() {
                                        options = Some((message.id, button.rect.left_bottom()));
                                    }
                                },
                            );
                        }
                    });
                    markup_label(ui, &message.body, text_color);
                });
            });
            ui.add_space(theme.spacing_8);
        }

        if let Some((id, anchor)) = options {
            self.chat.open_message_menu(id, anchor);
        }
    }

    fn render_upload_bar(&mut self, ui: &mut egui::Ui) {
        let theme = self.theme.clone();
        let mut pick = false;

        theme.composer_frame().show(ui, |ui| {
            ui.horizontal(|ui| {
                let uploading = self.chat.is_uploading();
                let button = egui::Button::new(
                    RichText::new(self.chat.upload_label()).color(theme.text_on_accent),
                )
                .fill(theme.accent_primary)
                .min_size(egui::vec2(160.0, theme.button_height));
                if ui.add_enabled(!uploading, button).clicked() {
                    pick = true;
                }
                if uploading {
                    ui.spinner();
                }
                let last_summarized = self
                    .chat
                    .current()
                    .and_then(|current| current.filename.as_deref());
                match (
                    self.chat.selected_file().and_then(|path| path.file_name()),
                    last_summarized,
                ) {
                    (Some(name), _) => {
                        ui.label(RichText::new(name.to_string_lossy()).color(theme.warning));
                    }
                    (None, Some(filename)) => {
                        ui.label(
                            RichText::new(format!("Showing summary of {filename}"))
                                .color(theme.text_muted),
                        );
                    }
                    (None, None) => {
                        ui.label(
                            RichText::new("PDF, DOCX or TXT. You can also drop a file here.")
                                .color(theme.text_muted),
                        );
                    }
                }
            });
        });

        if pick {
            self.pick_document();
        }
    }

    fn render_chat(&mut self, ui: &mut egui::Ui) {
        let transcript_height = (ui.available_height() - 190.0).max(120.0);
        ScrollArea::vertical()
            .id_salt("chat_transcript")
            .max_height(transcript_height)
            .auto_shrink([false, false])
            .stick_to_bottom(true)
            .show(ui, |ui| {
                self.render_transcript(ui);
                if self.scroll_to_bottom {
                    ui.scroll_to_cursor(Some(egui::Align::BOTTOM));
                }
            });
        self.scroll_to_bottom = false;

        ui.add_space(self.theme.spacing_8);
        self.render_upload_bar(ui);

        ui.add_space(self.theme.spacing_8);
        egui::CollapsingHeader::new("Diagnostics")
            .default_open(false)
            .show(ui, |ui| {
                ScrollArea::vertical()
                    .id_salt("diagnostics_log")
                    .max_height(90.0)
                    .stick_to_bottom(true)
                    .show(ui, |ui| {
                        if self.diagnostics_log.is_empty() {
                            ui.label(RichText::new("No errors so far").color(self.theme.text_muted));
                        }
                        for entry in &self.diagnostics_log {
                            ui.label(RichText::new(entry).monospace());
                        }
                    });
            });
    }

    fn render_center_panel(&mut self, ctx: &egui::Context) {
        let frame = Frame::new()
            .fill(self.theme.surface_0)
            .inner_margin(Margin::same(self.theme.spacing_16 as i8));
        egui::CentralPanel::default().frame(frame).show(ctx, |ui| {
            if self.tab == Tab::Dashboard {
                if let Some(dashboard) = self.dashboard.as_mut() {
                    dashboard.tick(Instant::now());
                    ctx.request_repaint_after(dashboard::REFRESH_INTERVAL);
                    dashboard.render(ui, &self.theme);
                    return;
                }
            }
            self.render_chat(ui);
        });
    }

    fn render_overlays(&mut self, ctx: &egui::Context) {
        if let Some(action) = self.chat.menu_mut().render(ctx, "options_menu", &self.theme) {
            self.chat.run_menu_action(action, &mut self.notices);
        }
        if let Some(form) = self.profile_menu.render(ctx, "profile_menu", &self.theme) {
            self.account.open(form);
        }
        self.account.render(ctx, &self.theme, &mut self.notices);
        self.notices.render(ctx, &self.theme);
    }
}

impl eframe::App for DocsumApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_events();
        self.chat.set_viewport_width(ctx.screen_rect().width());
        self.handle_dropped_files(ctx);

        self.render_top_bar(ctx);
        self.render_history_panel(ctx);
        self.render_center_panel(ctx);
        self.render_overlays(ctx);
        self.collect_diagnostics();
    }
}
