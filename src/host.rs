use crate::session::SessionState;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use uuid::Uuid;

pub const AI_GENERATED_KIND: &str = "ai-generated";

/// The record the studio pushes into the host shell's apps collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub icon: String,
    pub html: String,
    pub css: String,
    pub javascript: String,
    pub namespace: String,
    pub content: String,
    #[serde(default)]
    pub prompt_history: Vec<String>,
    pub custom_request: String,
}

#[derive(Debug, Clone)]
pub struct SaveOptions {
    pub description: String,
    pub save_prompt: bool,
}

#[derive(Debug, Clone)]
pub struct SaveOutcome {
    pub success: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveError {
    /// Save requested with nothing generated yet.
    NoActiveApp,
    /// The host shell rejected or failed the persistence call.
    Persistence(String),
}

impl fmt::Display for SaveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoActiveApp => write!(f, "no app to save; generate an app first"),
            Self::Persistence(message) => write!(f, "failed to save app: {message}"),
        }
    }
}

impl std::error::Error for SaveError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveReport {
    pub app_id: String,
    pub title: String,
    pub updated: bool,
}

/// Call interface of the external AI-OS windowing shell. The studio only ever
/// talks to the shell through this port; tests substitute the in-memory one.
pub trait HostShell {
    fn generate_app_id(&mut self) -> String;

    /// Wraps raw html/css/js into the shell's window content format.
    fn create_app_content(&self, html: &str, css: &str, javascript: &str, app_id: &str) -> String;

    fn save_to_persistence(
        &mut self,
        app_id: &str,
        record: &AppRecord,
        options: &SaveOptions,
    ) -> SaveOutcome;

    fn find_app(&self, app_id: &str) -> Option<&AppRecord>;

    /// Replaces the record with a matching id, or pushes a new one.
    fn upsert_app(&mut self, record: AppRecord);

    fn apps(&self) -> &[AppRecord];

    // Side-effecting refresh hooks with no return value.
    fn refresh_shared_apps_registry(&mut self);
    fn refresh_app_count(&mut self);
    fn refresh_apps_submenu(&mut self);
}

/// Registers the current app with the host shell. First save generates a new
/// id; repeat saves of the same studio session update the existing record in
/// place rather than duplicating it.
pub fn save_app(shell: &mut dyn HostShell, session: &mut SessionState) -> Result<SaveReport, SaveError> {
    let app = session.current_app.clone().ok_or(SaveError::NoActiveApp)?;

    let (app_id, updated) = match &session.committed_app_id {
        Some(existing) => (existing.clone(), true),
        None => (shell.generate_app_id(), false),
    };

    let content = shell.create_app_content(&app.html, &app.css, &app.javascript, &app_id);
    let record = AppRecord {
        id: app_id.clone(),
        kind: AI_GENERATED_KIND.to_string(),
        title: app.title.clone(),
        icon: app.icon.clone(),
        html: app.html.clone(),
        css: app.css.clone(),
        javascript: app.javascript.clone(),
        namespace: format!("app_{}", app_id.replace('-', "_")),
        content,
        prompt_history: Vec::new(),
        custom_request: format!("App Development Studio: {}", app.title),
    };

    shell.upsert_app(record.clone());
    shell.refresh_shared_apps_registry();
    shell.refresh_app_count();
    shell.refresh_apps_submenu();

    let options = SaveOptions {
        description: format!("App Development Studio app: {}", app.title),
        save_prompt: false,
    };
    let outcome = shell.save_to_persistence(&app_id, &record, &options);
    if !outcome.success {
        return Err(SaveError::Persistence(
            outcome.error.unwrap_or_else(|| "unknown error".to_string()),
        ));
    }

    session.mark_committed(app_id.clone());
    tracing::info!(app_id = %app_id, updated, "app registered with host shell");
    Ok(SaveReport {
        app_id,
        title: app.title,
        updated,
    })
}

/// Host shell double used when the studio runs without a real AI-OS instance
/// and by the tests.
#[derive(Debug, Default)]
pub struct InMemoryHostShell {
    apps: Vec<AppRecord>,
    persisted: BTreeSet<String>,
    refresh_calls: u32,
    fail_persistence_with: Option<String>,
}

impl InMemoryHostShell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn persisted_ids(&self) -> &BTreeSet<String> {
        &self.persisted
    }

    pub fn refresh_calls(&self) -> u32 {
        self.refresh_calls
    }

    #[cfg(test)]
    pub fn fail_persistence(&mut self, message: impl Into<String>) {
        self.fail_persistence_with = Some(message.into());
    }
}

impl HostShell for InMemoryHostShell {
    fn generate_app_id(&mut self) -> String {
        Uuid::new_v4().to_string()
    }

    fn create_app_content(&self, html: &str, css: &str, javascript: &str, app_id: &str) -> String {
        format!(
            "<div id=\"content_{app_id}\">{html}</div>\n<style>{css}</style>\n\
<script>{javascript}</script>"
        )
    }

    fn save_to_persistence(
        &mut self,
        app_id: &str,
        _record: &AppRecord,
        _options: &SaveOptions,
    ) -> SaveOutcome {
        if let Some(message) = &self.fail_persistence_with {
            return SaveOutcome {
                success: false,
                error: Some(message.clone()),
            };
        }
        self.persisted.insert(app_id.to_string());
        SaveOutcome {
            success: true,
            error: None,
        }
    }

    fn find_app(&self, app_id: &str) -> Option<&AppRecord> {
        self.apps.iter().find(|record| record.id == app_id)
    }

    fn upsert_app(&mut self, record: AppRecord) {
        match self.apps.iter_mut().find(|existing| existing.id == record.id) {
            Some(existing) => *existing = record,
            None => self.apps.push(record),
        }
    }

    fn apps(&self) -> &[AppRecord] {
        &self.apps
    }

    fn refresh_shared_apps_registry(&mut self) {
        self.refresh_calls += 1;
    }

    fn refresh_app_count(&mut self) {
        self.refresh_calls += 1;
    }

    fn refresh_apps_submenu(&mut self) {
        self.refresh_calls += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::RequestKind;
    use crate::session::{AppPayload, SessionState};

    fn session_with_app(title: &str) -> SessionState {
        let mut session = SessionState::new();
        session.accept_app(
            AppPayload {
                title: title.to_string(),
                icon: "📱".to_string(),
                html: "<div>x</div>".to_string(),
                css: ".x { color: red }".to_string(),
                javascript: "window[appNamespace].init = function() {};".to_string(),
                description: None,
            },
            RequestKind::Create,
        );
        session
    }

    #[test]
    fn save_without_current_app_fails() {
        let mut shell = InMemoryHostShell::new();
        let mut session = SessionState::new();
        assert_eq!(
            save_app(&mut shell, &mut session).unwrap_err(),
            SaveError::NoActiveApp
        );
    }

    #[test]
    fn first_save_registers_a_record_and_commits_the_id() {
        let mut shell = InMemoryHostShell::new();
        let mut session = session_with_app("Notes");

        let report = save_app(&mut shell, &mut session).expect("save should succeed");
        assert!(!report.updated);
        assert_eq!(shell.apps().len(), 1);
        assert_eq!(session.committed_app_id.as_deref(), Some(report.app_id.as_str()));

        let record = shell.find_app(&report.app_id).expect("record should exist");
        assert_eq!(record.kind, AI_GENERATED_KIND);
        assert_eq!(record.namespace, format!("app_{}", report.app_id.replace('-', "_")));
        assert!(record.content.contains(&format!("content_{}", report.app_id)));
        assert!(record.prompt_history.is_empty());
        assert!(shell.persisted_ids().contains(&report.app_id));
    }

    #[test]
    fn saving_twice_updates_in_place_rather_than_duplicating() {
        let mut shell = InMemoryHostShell::new();
        let mut session = session_with_app("Notes");

        let first = save_app(&mut shell, &mut session).expect("first save should succeed");
        session.current_app.as_mut().expect("app set").title = "Notes v2".to_string();
        let second = save_app(&mut shell, &mut session).expect("second save should succeed");

        assert!(second.updated);
        assert_eq!(first.app_id, second.app_id);
        assert_eq!(shell.apps().len(), 1);
        assert_eq!(shell.apps()[0].title, "Notes v2");
    }

    #[test]
    fn new_app_after_save_gets_its_own_record() {
        let mut shell = InMemoryHostShell::new();
        let mut session = session_with_app("Notes");
        let first = save_app(&mut shell, &mut session).expect("save should succeed");

        // A create-path generation resets the committed id.
        session.accept_app(
            session.current_app.clone().expect("app set"),
            RequestKind::Create,
        );
        let second = save_app(&mut shell, &mut session).expect("save should succeed");

        assert_ne!(first.app_id, second.app_id);
        assert_eq!(shell.apps().len(), 2);
    }

    #[test]
    fn persistence_failure_surfaces_and_leaves_session_uncommitted() {
        let mut shell = InMemoryHostShell::new();
        shell.fail_persistence("disk full");
        let mut session = session_with_app("Notes");

        let error = save_app(&mut shell, &mut session).unwrap_err();
        assert_eq!(error, SaveError::Persistence("disk full".to_string()));
        assert!(session.committed_app_id.is_none());
    }
}
