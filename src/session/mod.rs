use crate::classify::RequestKind;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

pub mod store;

pub const STUDIO_ID: &str = "app-development-studio";

pub const DEFAULT_APP_TITLE: &str = "Generated App";
pub const DEFAULT_APP_ICON: &str = "📱";

const WELCOME_MESSAGE: &str = "Hello! I'm your assistant for app development.\n\n\
I can help you create custom applications for the AI-OS shell:\n\n\
1. **Describe your app** - tell me what you want to build\n\
2. **Answer questions** - I'll ask clarifying questions with a few options\n\
3. **Preview & refine** - see the app take shape in the preview\n\
4. **Save to AI-OS** - register the finished app with the host shell\n\n\
Just start by describing what you want to create!";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageAttachment {
    /// base64 data URL, e.g. "data:image/png;base64,...."
    pub encoded_data: String,
    pub mime_type: String,
    pub file_name: String,
    pub size_bytes: u64,
}

impl ImageAttachment {
    /// Strips the data-URL prologue, leaving the raw base64 payload.
    pub fn base64_payload(&self) -> &str {
        match self.encoded_data.split_once(";base64,") {
            Some((_, payload)) => payload,
            None => self.encoded_data.as_str(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub text: String,
    #[serde(default)]
    pub images: Vec<ImageAttachment>,
    pub created_at: String,
}

impl ChatMessage {
    pub fn new(role: Role, text: impl Into<String>, images: Vec<ImageAttachment>) -> Self {
        Self {
            role,
            text: text.into(),
            images,
            created_at: timestamp(),
        }
    }
}

/// Images staged for the next outgoing message. Appended by upload, drag-drop
/// and paste handlers; fully drained on send.
#[derive(Debug, Clone, Default)]
pub struct PendingUploads {
    items: Vec<ImageAttachment>,
}

impl PendingUploads {
    pub fn push(&mut self, attachment: ImageAttachment) {
        self.items.push(attachment);
    }

    pub fn remove(&mut self, index: usize) -> Option<ImageAttachment> {
        if index < self.items.len() {
            Some(self.items.remove(index))
        } else {
            None
        }
    }

    pub fn drain(&mut self) -> Vec<ImageAttachment> {
        std::mem::take(&mut self.items)
    }

    pub fn items(&self) -> &[ImageAttachment] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// One generated mini-app. Replaced wholesale on every successful generation
/// or edit; fields are never merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppPayload {
    pub title: String,
    pub icon: String,
    pub html: String,
    pub css: String,
    pub javascript: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionOption {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

pub const MAX_SUGGESTION_OPTIONS: usize = 4;

pub const FORCE_CREATE_LABEL: &str = "Just build something reasonable";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionSet {
    pub question: String,
    pub options: Vec<SuggestionOption>,
}

impl SuggestionSet {
    /// Options as shown in the clarification panel: capped at four, with a
    /// synthetic force-create escape hatch always appended.
    pub fn panel_options(&self) -> Vec<SuggestionOption> {
        let mut options: Vec<SuggestionOption> = self
            .options
            .iter()
            .take(MAX_SUGGESTION_OPTIONS)
            .cloned()
            .collect();
        options.push(SuggestionOption {
            label: FORCE_CREATE_LABEL.to_string(),
            description: Some("Skip the questions and generate a first version now".to_string()),
        });
        options
    }
}

#[derive(Debug)]
pub struct SessionState {
    pub current_app: Option<AppPayload>,
    pub committed_app_id: Option<String>,
    pub chat_history: Vec<ChatMessage>,
    pub is_processing: bool,
    pub pending_images: PendingUploads,
}

impl SessionState {
    pub fn new() -> Self {
        let mut session = Self {
            current_app: None,
            committed_app_id: None,
            chat_history: Vec::new(),
            is_processing: false,
            pending_images: PendingUploads::default(),
        };
        session.push_assistant(WELCOME_MESSAGE);
        session
    }

    pub fn push_user(&mut self, text: impl Into<String>, images: Vec<ImageAttachment>) {
        self.chat_history
            .push(ChatMessage::new(Role::User, text, images));
    }

    pub fn push_assistant(&mut self, text: impl Into<String>) {
        self.chat_history
            .push(ChatMessage::new(Role::Assistant, text, Vec::new()));
    }

    /// Resets chat history to the single welcome message. The current app and
    /// its committed id are untouched; clearing chat is not discarding work.
    pub fn clear_chat(&mut self) {
        self.chat_history.clear();
        self.push_assistant(WELCOME_MESSAGE);
    }

    /// Installs a freshly generated payload. Creating a new app invalidates
    /// the committed host id so the next save registers a new record; edits
    /// keep it so repeated saves update in place.
    pub fn accept_app(&mut self, payload: AppPayload, kind: RequestKind) {
        if kind == RequestKind::Create {
            self.committed_app_id = None;
        }
        self.current_app = Some(payload);
    }

    pub fn mark_committed(&mut self, app_id: String) {
        self.committed_app_id = Some(app_id);
    }
}

pub fn timestamp() -> String {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(duration) => duration.as_secs().to_string(),
        Err(_) => "0".to_string(),
    }
}

pub fn timestamp_millis() -> u128 {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(duration) => duration.as_millis(),
        Err(_) => 0,
    }
}
