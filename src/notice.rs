use crate::theme::Theme;
use eframe::egui::{self, RichText};
use std::time::{Duration, Instant};

pub const TOAST_LIFETIME: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Info,
    Error,
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub kind: NoticeKind,
    pub text: String,
    shown_at: Instant,
}

/// Toasts expire on their own; the alert stays until acknowledged.
#[derive(Debug, Default)]
pub struct Notices {
    toasts: Vec<Toast>,
    alert: Option<String>,
    unlogged: Vec<String>,
}

impl Notices {
    pub fn toast(&mut self, kind: NoticeKind, text: impl Into<String>) {
        self.toast_at(kind, text, Instant::now());
    }

    pub fn toast_at(&mut self, kind: NoticeKind, text: impl Into<String>, now: Instant) {
        let text = text.into();
        if kind == NoticeKind::Error {
            self.unlogged.push(text.clone());
        }
        self.toasts.push(Toast {
            kind,
            text,
            shown_at: now,
        });
    }

    pub fn alert(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.unlogged.push(text.clone());
        self.alert = Some(text);
    }

    /// Errors surfaced since the last call, for the diagnostics log.
    pub fn take_errors(&mut self) -> Vec<String> {
        std::mem::take(&mut self.unlogged)
    }

    #[cfg(test)]
    pub fn toasts(&self) -> &[Toast] {
        &self.toasts
    }

    #[cfg(test)]
    pub fn current_alert(&self) -> Option<&str> {
        self.alert.as_deref()
    }

    pub fn acknowledge_alert(&mut self) {
        self.alert = None;
    }

    pub fn prune(&mut self, now: Instant) {
        self.toasts
            .retain(|toast| now.saturating_duration_since(toast.shown_at) < TOAST_LIFETIME);
    }

    pub fn render(&mut self, ctx: &egui::Context, theme: &Theme) {
        self.prune(Instant::now());

        if !self.toasts.is_empty() {
            egui::Area::new(egui::Id::new("toasts"))
                .order(egui::Order::Foreground)
                .anchor(egui::Align2::RIGHT_BOTTOM, [-theme.spacing_16, -theme.spacing_16])
                .show(ctx, |ui| {
                    for toast in &self.toasts {
                        let (icon, color) = match toast.kind {
                            NoticeKind::Success => ("✓", theme.success),
                            NoticeKind::Info => ("ℹ", theme.accent_primary),
                            NoticeKind::Error => ("⚠", theme.danger),
                        };
                        theme.card_frame().show(ui, |ui| {
                            ui.horizontal(|ui| {
                                ui.label(RichText::new(icon).color(color).strong());
                                ui.label(RichText::new(&toast.text).color(theme.text_primary));
                            });
                        });
                    }
                });
            ctx.request_repaint_after(Duration::from_millis(250));
        }

        let mut acknowledged = false;
        if let Some(text) = &self.alert {
            egui::Window::new("Notice")
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
                .show(ctx, |ui| {
                    ui.label(text);
                    ui.add_space(theme.spacing_8);
                    if ui.button("OK").clicked() {
                        acknowledged = true;
                    }
                });
        }
        if acknowledged {
            self.acknowledge_alert();
        }
    }
}
