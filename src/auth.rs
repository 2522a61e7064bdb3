use crate::event::AppEvent;
use crate::notice::{NoticeKind, Notices};
use crate::service::{Dispatcher, ServiceError};
use crate::theme::Theme;
use crate::ui::menu::MenuEntry;
use eframe::egui;
use thiserror::Error;
use tracing::{info, warn};

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Password must be at least 6 characters and include letters & numbers.")]
    WeakPassword,
    #[error("New password must be at least 6 characters and include letters & numbers.")]
    WeakNewPassword,
    #[error("Please choose a username.")]
    MissingUsername,
}

pub fn passes_rule(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LEN
        && password.chars().any(|ch| ch.is_ascii_alphabetic())
        && password.chars().any(|ch| ch.is_ascii_digit())
}

pub fn validate_sign_up(username: &str, password: &str) -> Result<(), ValidationError> {
    if username.trim().is_empty() {
        return Err(ValidationError::MissingUsername);
    }
    if !passes_rule(password) {
        return Err(ValidationError::WeakPassword);
    }
    Ok(())
}

pub fn validate_new_password(password: &str) -> Result<(), ValidationError> {
    if passes_rule(password) {
        Ok(())
    } else {
        Err(ValidationError::WeakNewPassword)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountForm {
    SignUp,
    ChangePassword,
}

impl MenuEntry for AccountForm {
    fn label(&self) -> String {
        match self {
            Self::SignUp => "Create account".to_string(),
            Self::ChangePassword => "Change password".to_string(),
        }
    }
}

/// Signup and change-password forms; weak passwords never leave the client.
pub struct AccountPanel {
    dispatcher: Dispatcher,
    open: Option<AccountForm>,
    username: String,
    password: String,
    new_password: String,
    pending: bool,
}

impl AccountPanel {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher,
            open: None,
            username: String::new(),
            password: String::new(),
            new_password: String::new(),
            pending: false,
        }
    }

    pub fn open(&mut self, form: AccountForm) {
        self.open = Some(form);
    }

    #[cfg(test)]
    pub fn open_form(&self) -> Option<AccountForm> {
        self.open
    }

    #[cfg(test)]
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn submit_sign_up(&mut self, notices: &mut Notices) {
        if let Err(err) = validate_sign_up(&self.username, &self.password) {
            notices.alert(err.to_string());
            return;
        }

        let username = self.username.trim().to_string();
        let password = std::mem::take(&mut self.password);
        info!(username = %username, "submitting signup");
        self.pending = true;
        let service = self.dispatcher.service();
        self.dispatcher.spawn(async move {
            AppEvent::SignedUp(service.sign_up(&username, &password).await)
        });
    }

    pub fn submit_new_password(&mut self, notices: &mut Notices) {
        if let Err(err) = validate_new_password(&self.new_password) {
            notices.alert(err.to_string());
            return;
        }

        let new_password = std::mem::take(&mut self.new_password);
        info!("submitting password change");
        self.pending = true;
        let service = self.dispatcher.service();
        self.dispatcher.spawn(async move {
            AppEvent::PasswordChanged(service.change_password(&new_password).await)
        });
    }

    fn finish(&mut self, result: Result<(), ServiceError>, success: &str, notices: &mut Notices) {
        self.pending = false;
        match result {
            Ok(()) => {
                self.open = None;
                notices.toast(NoticeKind::Success, success);
            }
            Err(err) => {
                warn!(error = %err, "account request failed");
                notices.toast(NoticeKind::Error, format!("Request failed: {err}"));
            }
        }
    }

    pub fn apply_event(&mut self, event: AppEvent, notices: &mut Notices) -> Option<AppEvent> {
        match event {
            AppEvent::SignedUp(result) => {
                self.finish(result, "Account created. You can now log in.", notices)
            }
            AppEvent::PasswordChanged(result) => self.finish(result, "Password updated", notices),
            other => return Some(other),
        }
        None
    }

    pub fn render(&mut self, ctx: &egui::Context, theme: &Theme, notices: &mut Notices) {
        let Some(form) = self.open else {
            return;
        };

        let mut open = true;
        let title = form.label();
        egui::Window::new(title)
            .open(&mut open)
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.spacing_mut().item_spacing.y = theme.spacing_8;
                match form {
                    AccountForm::SignUp => {
                        ui.label("Username");
                        ui.text_edit_singleline(&mut self.username);
                        ui.label("Password");
                        ui.add(egui::TextEdit::singleline(&mut self.password).password(true));
                    }
                    AccountForm::ChangePassword => {
                        ui.label("New password");
                        ui.add(egui::TextEdit::singleline(&mut self.new_password).password(true));
                    }
                }
                ui.small("At least 6 characters, with letters and numbers.");

                ui.horizontal(|ui| {
                    if self.pending {
                        ui.spinner();
                    }
                    if ui
                        .add_enabled(!self.pending, egui::Button::new("Submit"))
                        .clicked()
                    {
                        match form {
                            AccountForm::SignUp => self.submit_sign_up(notices),
                            AccountForm::ChangePassword => self.submit_new_password(notices),
                        }
                    }
                });
            });

        if !open {
            self.open = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::fake::Harness;

    #[test]
    fn password_rule_matches_documented_examples() {
        assert!(passes_rule("abc123"));
        assert!(!passes_rule("abcdef"));
        assert!(!passes_rule("12345"));
        assert!(!passes_rule("ab12"));
        assert!(!passes_rule("123456"));
        assert!(!passes_rule(""));
        assert!(passes_rule("Passw0rd!"));
    }

    #[test]
    fn forms_use_their_own_messages() {
        assert_eq!(
            validate_sign_up("dana", "short").unwrap_err().to_string(),
            "Password must be at least 6 characters and include letters & numbers."
        );
        assert_eq!(
            validate_new_password("abcdef").unwrap_err().to_string(),
            "New password must be at least 6 characters and include letters & numbers."
        );
        assert_eq!(
            validate_sign_up("  ", "abc123"),
            Err(ValidationError::MissingUsername)
        );
        assert!(validate_sign_up("dana", "abc123").is_ok());
    }

    #[test]
    fn weak_password_is_rejected_locally() {
        let harness = Harness::new();
        let mut panel = AccountPanel::new(harness.dispatcher.clone());
        let mut notices = Notices::default();
        panel.open(AccountForm::ChangePassword);
        panel.new_password = "abcdef".to_string();

        panel.submit_new_password(&mut notices);

        assert!(notices
            .current_alert()
            .is_some_and(|text| text.starts_with("New password must be")));
        assert!(!panel.is_pending());
        harness.assert_idle();
        assert!(harness.service.calls().is_empty());
    }

    #[test]
    fn valid_signup_reaches_the_service_and_closes_the_form() {
        let harness = Harness::new();
        let mut panel = AccountPanel::new(harness.dispatcher.clone());
        let mut notices = Notices::default();
        panel.open(AccountForm::SignUp);
        panel.username = "dana".to_string();
        panel.password = "abc123".to_string();

        panel.submit_sign_up(&mut notices);
        assert!(panel.is_pending());
        assert!(panel.password.is_empty());

        let event = harness.next_event();
        assert!(panel.apply_event(event, &mut notices).is_none());

        assert!(!panel.is_pending());
        assert!(panel.open_form().is_none());
        assert_eq!(harness.service.calls(), vec!["sign_up dana"]);
        assert_eq!(notices.toasts().len(), 1);
    }
}
