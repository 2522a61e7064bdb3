use crate::theme::Theme;
use eframe::egui::{self, Pos2};

/// A labelled entry a [`ContextMenu`] can offer.
pub trait MenuEntry: Clone {
    fn label(&self) -> String;
}

/// One overlay shared by every anchor that opens it. Showing it again moves
/// it and swaps its actions.
#[derive(Debug, Clone)]
pub struct ContextMenu<A> {
    anchor: Pos2,
    actions: Vec<A>,
    visible: bool,
    armed: bool,
}

impl<A> Default for ContextMenu<A> {
    fn default() -> Self {
        Self {
            anchor: Pos2::ZERO,
            actions: Vec::new(),
            visible: false,
            armed: false,
        }
    }
}

impl<A: MenuEntry> ContextMenu<A> {
    pub fn show(&mut self, anchor: Pos2, actions: Vec<A>) {
        self.anchor = anchor;
        self.actions = actions;
        self.visible = true;
        // The click that opened the menu must not also close it.
        self.armed = false;
    }

    pub fn toggle(&mut self, anchor: Pos2, actions: Vec<A>) {
        if self.visible {
            self.hide();
        } else {
            self.show(anchor, actions);
        }
    }

    pub fn hide(&mut self) {
        self.visible = false;
        self.armed = false;
        self.actions.clear();
    }

    #[cfg(test)]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    #[cfg(test)]
    pub fn actions(&self) -> &[A] {
        &self.actions
    }

    #[cfg(test)]
    pub fn anchor(&self) -> Pos2 {
        self.anchor
    }

    /// Called once the menu has been on screen for a frame.
    pub fn arm(&mut self) {
        if self.visible {
            self.armed = true;
        }
    }

    /// Outside clicks dismiss the menu once, and only after it was armed.
    pub fn outside_click(&mut self) -> bool {
        if self.visible && self.armed {
            self.hide();
            return true;
        }
        false
    }

    /// Draws the overlay and returns the action the user picked, if any.
    pub fn render(&mut self, ctx: &egui::Context, id: &str, theme: &Theme) -> Option<A> {
        if !self.visible {
            return None;
        }

        let mut chosen = None;
        let area = egui::Area::new(egui::Id::new(id))
            .order(egui::Order::Foreground)
            .fixed_pos(self.anchor)
            .show(ctx, |ui| {
                theme.card_frame().show(ui, |ui| {
                    ui.set_min_width(160.0);
                    for action in &self.actions {
                        if ui.button(action.label()).clicked() {
                            chosen = Some(action.clone());
                        }
                    }
                });
            });

        if chosen.is_some() {
            self.hide();
        } else if area.response.clicked_elsewhere() {
            self.outside_click();
        } else {
            self.arm();
        }
        chosen
    }
}
