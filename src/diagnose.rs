use crate::interpret::{interpret_reply, ReplyOutcome};
use crate::session::{AppPayload, SuggestionSet};
use serde_json::Value;

pub const DIAGNOSIS_FALLBACK_MESSAGE: &str =
    "Sorry, I encountered an error while processing your request. Please try again.";

const APP_SOURCE_LIMIT: usize = 2000;

/// Asks the model to turn a generation failure into clarifying questions
/// instead of surfacing a raw error to the user.
pub fn build_diagnosis_prompt(
    error_message: &str,
    original_request: &str,
    current_app: Option<&AppPayload>,
) -> String {
    let mut prompt = format!(
        "An app generation request failed. Analyze what went wrong and help the user recover.\n\n\
Error: {error_message}\n\n\
The user originally asked: \"{original_request}\"\n\n"
    );

    if let Some(app) = current_app {
        let source = format!(
            "HTML:\n{}\n\nCSS:\n{}\n\nJavaScript:\n{}",
            app.html, app.css, app.javascript
        );
        let truncated = truncate_chars(&source, APP_SOURCE_LIMIT);
        prompt.push_str(&format!(
            "The app being edited (possibly truncated):\n{truncated}\n\n"
        ));
    }

    prompt.push_str(
        "Respond with JSON in this exact format:\n\
{\n\
  \"type\": \"suggestions\",\n\
  \"question\": \"A short explanation of the likely problem, phrased as a question about what the user wants\",\n\
  \"suggestions\": [\n\
    {\"text\": \"A concrete way to rephrase or simplify the request\", \"description\": \"Why this might work\"}\n\
  ]\n\
}\n\n\
Offer 2-4 suggestions. Keep each one actionable.",
    );
    prompt
}

/// A diagnosis reply only helps if it yields a suggestion panel; anything
/// else falls back to [`DIAGNOSIS_FALLBACK_MESSAGE`].
pub fn interpret_diagnosis(reply: &Value) -> Option<SuggestionSet> {
    match interpret_reply(reply) {
        ReplyOutcome::Suggestions(set) => Some(set),
        _ => None,
    }
}

fn truncate_chars(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let truncated: String = text.chars().take(limit).collect();
    format!("{truncated}\n... (truncated)")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn prompt_carries_error_and_original_request() {
        let prompt = build_diagnosis_prompt("model returned garbage", "make a todo app", None);
        assert!(prompt.contains("Error: model returned garbage"));
        assert!(prompt.contains("\"make a todo app\""));
        assert!(!prompt.contains("The app being edited"));
    }

    #[test]
    fn prompt_embeds_and_truncates_app_source() {
        let app = AppPayload {
            title: "Big".to_string(),
            icon: "📱".to_string(),
            html: "x".repeat(3000),
            css: String::new(),
            javascript: String::new(),
            description: None,
        };
        let prompt = build_diagnosis_prompt("oops", "edit it", Some(&app));
        assert!(prompt.contains("The app being edited"));
        assert!(prompt.contains("... (truncated)"));
    }

    #[test]
    fn diagnosis_accepts_only_suggestion_panels() {
        let suggestions = json!({
            "type": "suggestions",
            "question": "What kind of app?",
            "suggestions": [{"text": "A simpler version"}]
        });
        let set = interpret_diagnosis(&suggestions).expect("should yield a panel");
        assert_eq!(set.question, "What kind of app?");

        assert!(interpret_diagnosis(&json!("plain text")).is_none());
        assert!(interpret_diagnosis(&json!({"html": "<div></div>"})).is_none());
    }
}
