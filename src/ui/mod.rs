pub mod menu;

use crate::markup::{self, Span};
use crate::theme::Theme;
use eframe::egui::{self, Color32, RichText};

/// Renders a markup body. Each `<br>` starts a new wrapped row.
pub fn markup_label(ui: &mut egui::Ui, body: &str, color: Color32) {
    for row in markup_rows(body) {
        if row.is_empty() {
            ui.add_space(4.0);
            continue;
        }
        ui.horizontal_wrapped(|ui| {
            ui.spacing_mut().item_spacing.x = 0.0;
            for (text, bold) in row {
                let mut rich = RichText::new(text).color(color);
                if bold {
                    rich = rich.strong();
                }
                ui.label(rich);
            }
        });
    }
}

/// Groups parsed spans into rows split on line breaks.
pub fn markup_rows(body: &str) -> Vec<Vec<(String, bool)>> {
    let mut rows = vec![Vec::new()];
    for span in markup::parse(body) {
        match span {
            Span::Text { text, bold } => {
                if let Some(row) = rows.last_mut() {
                    row.push((text, bold));
                }
            }
            Span::LineBreak => rows.push(Vec::new()),
        }
    }
    rows
}

pub fn section_title(ui: &mut egui::Ui, theme: &Theme, title: &str) {
    ui.label(
        RichText::new(title)
            .text_style(egui::TextStyle::Name("section".into()))
            .color(theme.text_muted)
            .strong(),
    );
}
