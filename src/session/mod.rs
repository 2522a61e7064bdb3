use crate::markup;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub mod history;

pub const SUMMARY_TITLE: &str = "Summary";
pub const JARGON_TITLE: &str = "Legal Terms Explained";
pub const WELCOME_TEXT: &str = "Upload a legal document (PDF, DOCX or TXT) and I'll summarize it in plain language and explain any legal jargon it uses.";

/// Who is using the client, decided once at start-up.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionContext {
    #[default]
    Guest,
    Member { username: String, admin: bool },
}

impl SessionContext {
    pub fn is_guest(&self) -> bool {
        matches!(self, Self::Guest)
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Member { admin: true, .. })
    }

    pub fn display_name(&self) -> &str {
        match self {
            Self::Guest => "Guest",
            Self::Member { username, .. } => username,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageId(u64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "msg-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    System,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: MessageId,
    pub role: Role,
    pub title: Option<String>,
    pub body: String,
    pub has_options: bool,
}

impl Message {
    /// Stored form used when the message is saved to history.
    pub fn serialized(&self) -> String {
        match &self.title {
            Some(title) => format!("<b>{}</b><br><br>{}", markup::escape(title), self.body),
            None => self.body.clone(),
        }
    }

    pub fn plain_body(&self) -> String {
        markup::to_plain_text(&self.body)
    }
}

/// Paragraphs and jargon explanations produced by one summarization call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryResult {
    #[serde(default)]
    pub summary: Vec<String>,
    #[serde(default)]
    pub jargon: BTreeMap<String, String>,
}

#[derive(Debug, Default)]
pub struct Transcript {
    messages: Vec<Message>,
    next_id: u64,
}

impl Transcript {
    pub fn with_welcome() -> Self {
        let mut transcript = Self::default();
        transcript.reset();
        transcript
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn get(&self, id: MessageId) -> Option<&Message> {
        self.messages.iter().find(|message| message.id == id)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn push(&mut self, role: Role, title: Option<&str>, body: String) -> MessageId {
        self.push_message(role, title, body, false)
    }

    pub fn push_with_options(&mut self, title: &str, body: String) -> MessageId {
        self.push_message(Role::System, Some(title), body, true)
    }

    fn push_message(
        &mut self,
        role: Role,
        title: Option<&str>,
        body: String,
        has_options: bool,
    ) -> MessageId {
        self.next_id += 1;
        let id = MessageId(self.next_id);
        self.messages.push(Message {
            id,
            role,
            title: title.map(str::to_string),
            body,
            has_options,
        });
        id
    }

    /// Identifiers keep increasing across clears.
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn reset(&mut self) {
        self.clear();
        self.push(Role::System, None, markup::escape(WELCOME_TEXT));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_transcript_holds_only_the_welcome_message() {
        let transcript = Transcript::with_welcome();
        assert_eq!(transcript.len(), 1);
        let welcome = &transcript.messages()[0];
        assert_eq!(welcome.role, Role::System);
        assert!(welcome.title.is_none());
        assert!(!welcome.has_options);
    }

    #[test]
    fn identities_are_monotonic_across_clears() {
        let mut transcript = Transcript::default();
        let first = transcript.push(Role::User, None, "a.pdf".to_string());
        transcript.clear();
        let second = transcript.push(Role::User, None, "b.pdf".to_string());
        assert!(second > first);
        assert!(transcript.get(first).is_none());
        assert_eq!(transcript.get(second).map(|m| m.body.as_str()), Some("b.pdf"));
    }

    #[test]
    fn serialized_message_prefixes_the_title() {
        let mut transcript = Transcript::default();
        let id = transcript.push_with_options(SUMMARY_TITLE, "a<br><br>b".to_string());
        let message = transcript.get(id).expect("message should exist");
        assert_eq!(message.serialized(), "<b>Summary</b><br><br>a<br><br>b");
        assert_eq!(message.plain_body(), "a\n\nb");
    }
}
