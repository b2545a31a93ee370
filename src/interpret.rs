use crate::session::{
    AppPayload, SuggestionOption, SuggestionSet, DEFAULT_APP_ICON, DEFAULT_APP_TITLE,
};
use serde::Deserialize;
use serde_json::Value;

/// Shown when a reply looks like a clarification attempt but its JSON is
/// broken; distinct from the generic fallback so the failure is not silently
/// swallowed as chat text.
pub const SUGGESTIONS_FORMAT_ERROR_MESSAGE: &str = "I tried to ask you a clarifying question but \
the response came back in a broken format. Please rephrase your request and I'll try again.";

/// Exactly one of these per LLM reply; the dispatch target for the studio.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplyOutcome {
    App(AppPayload),
    Suggestions(SuggestionSet),
    Text(String),
}

#[derive(Debug, Deserialize)]
struct WireSuggestion {
    text: String,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireSuggestions {
    question: String,
    #[serde(default)]
    suggestions: Vec<WireSuggestion>,
}

/// Classifies one LLM reply into exactly one outcome. Ordered, first match
/// wins: suggestions object, app object, embedded-JSON string, plain text.
/// Total over all input shapes; never fails.
pub fn interpret_reply(reply: &Value) -> ReplyOutcome {
    match reply {
        Value::Object(_) => match interpret_object(reply) {
            Some(outcome) => outcome,
            None => ReplyOutcome::Text(
                serde_json::to_string_pretty(reply).unwrap_or_else(|_| reply.to_string()),
            ),
        },
        Value::String(raw) => interpret_string(raw),
        other => ReplyOutcome::Text(other.to_string()),
    }
}

fn interpret_object(value: &Value) -> Option<ReplyOutcome> {
    if value.get("type").and_then(Value::as_str) == Some("suggestions") {
        let wire: WireSuggestions = serde_json::from_value(value.clone()).ok()?;
        return Some(ReplyOutcome::Suggestions(SuggestionSet {
            question: wire.question,
            options: wire
                .suggestions
                .into_iter()
                .map(|suggestion| SuggestionOption {
                    label: suggestion.text,
                    description: suggestion.description,
                })
                .collect(),
        }));
    }

    let html = value.get("html").and_then(Value::as_str).unwrap_or("");
    if !html.is_empty() {
        let text_field = |key: &str| {
            value
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or("")
                .to_string()
        };
        return Some(ReplyOutcome::App(AppPayload {
            title: value
                .get("title")
                .and_then(Value::as_str)
                .filter(|title| !title.is_empty())
                .unwrap_or(DEFAULT_APP_TITLE)
                .to_string(),
            icon: value
                .get("icon")
                .and_then(Value::as_str)
                .filter(|icon| !icon.is_empty())
                .unwrap_or(DEFAULT_APP_ICON)
                .to_string(),
            html: html.to_string(),
            css: text_field("css"),
            javascript: text_field("javascript"),
            description: value
                .get("description")
                .and_then(Value::as_str)
                .map(ToString::to_string),
        }));
    }

    None
}

fn interpret_string(raw: &str) -> ReplyOutcome {
    match extract_json_object(raw) {
        Some(candidate) => match serde_json::from_str::<Value>(candidate) {
            Ok(parsed) => match interpret_object(&parsed) {
                Some(outcome) => outcome,
                None => ReplyOutcome::Text(raw.to_string()),
            },
            Err(_) => parse_failure_fallback(raw),
        },
        None => parse_failure_fallback(raw),
    }
}

fn parse_failure_fallback(raw: &str) -> ReplyOutcome {
    if raw.contains("suggestions") {
        ReplyOutcome::Text(SUGGESTIONS_FORMAT_ERROR_MESSAGE.to_string())
    } else {
        ReplyOutcome::Text(raw.to_string())
    }
}

/// Locates the first balanced top-level `{...}` substring, so app JSON can be
/// fished out of surrounding prose. String-literal aware; braces inside JSON
/// strings do not count toward the balance.
pub fn extract_json_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in raw[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&raw[start..start + offset + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn suggestions_object_yields_suggestion_set() {
        let reply = json!({
            "type": "suggestions",
            "question": "What kind of game?",
            "suggestions": [
                {"text": "Puzzle", "description": "Grid-based logic"},
                {"text": "Arcade"}
            ]
        });
        let outcome = interpret_reply(&reply);
        let ReplyOutcome::Suggestions(set) = outcome else {
            panic!("expected suggestions outcome, got {outcome:?}");
        };
        assert_eq!(set.question, "What kind of game?");
        assert_eq!(set.options.len(), 2);
        assert_eq!(set.options[0].label, "Puzzle");
        assert_eq!(set.options[0].description.as_deref(), Some("Grid-based logic"));
        assert!(set.options[1].description.is_none());
    }

    #[test]
    fn app_object_yields_payload_with_defaults() {
        let reply = json!({"html": "<div>hi</div>"});
        let ReplyOutcome::App(app) = interpret_reply(&reply) else {
            panic!("expected app outcome");
        };
        assert_eq!(app.title, DEFAULT_APP_TITLE);
        assert_eq!(app.icon, DEFAULT_APP_ICON);
        assert_eq!(app.html, "<div>hi</div>");
        assert_eq!(app.css, "");
        assert_eq!(app.javascript, "");
    }

    #[test]
    fn suggestions_check_wins_over_app_check() {
        // A reply carrying both markers is a clarification, not an app.
        let reply = json!({
            "type": "suggestions",
            "question": "Which?",
            "suggestions": [],
            "html": "<div>ignored</div>"
        });
        assert!(matches!(
            interpret_reply(&reply),
            ReplyOutcome::Suggestions(_)
        ));
    }

    #[test]
    fn stringified_app_json_embedded_in_prose_yields_payload() {
        let raw = "Here is your app:\n{\"title\": \"Timer\", \"icon\": \"⏱\", \"html\": \"<div id=\\\"t\\\">{}</div>\", \"css\": \".t { color: red }\", \"javascript\": \"\"}\nEnjoy!";
        let ReplyOutcome::App(app) = interpret_reply(&Value::String(raw.to_string())) else {
            panic!("expected app outcome");
        };
        assert_eq!(app.title, "Timer");
        assert_eq!(app.css, ".t { color: red }");
    }

    #[test]
    fn stringified_suggestions_yield_suggestion_set() {
        let raw = serde_json::to_string(&json!({
            "type": "suggestions",
            "question": "Dark or light?",
            "suggestions": [{"text": "Dark"}]
        }))
        .expect("fixture should serialize");
        assert!(matches!(
            interpret_reply(&Value::String(raw)),
            ReplyOutcome::Suggestions(_)
        ));
    }

    #[test]
    fn plain_string_yields_text_verbatim() {
        let outcome = interpret_reply(&Value::String("just a chat reply".to_string()));
        assert_eq!(outcome, ReplyOutcome::Text("just a chat reply".to_string()));
    }

    #[test]
    fn parsed_object_matching_neither_shape_falls_back_to_raw_text() {
        let raw = "note: {\"status\": \"ok\"} nothing else";
        let outcome = interpret_reply(&Value::String(raw.to_string()));
        assert_eq!(outcome, ReplyOutcome::Text(raw.to_string()));
    }

    #[test]
    fn malformed_suggestions_string_yields_distinct_format_error() {
        let raw = "{\"type\": \"suggestions\", \"question\": unterminated";
        let outcome = interpret_reply(&Value::String(raw.to_string()));
        assert_eq!(
            outcome,
            ReplyOutcome::Text(SUGGESTIONS_FORMAT_ERROR_MESSAGE.to_string())
        );
    }

    #[test]
    fn non_object_non_string_reply_is_stringified() {
        assert_eq!(
            interpret_reply(&json!(42)),
            ReplyOutcome::Text("42".to_string())
        );
        assert_eq!(
            interpret_reply(&Value::Null),
            ReplyOutcome::Text("null".to_string())
        );
    }

    #[test]
    fn extract_json_object_ignores_braces_inside_strings() {
        let raw = "x {\"a\": \"{not a block}\", \"b\": {\"c\": 1}} y";
        assert_eq!(
            extract_json_object(raw),
            Some("{\"a\": \"{not a block}\", \"b\": {\"c\": 1}}")
        );
    }

    #[test]
    fn extract_json_object_returns_none_without_balanced_block() {
        assert!(extract_json_object("no braces here").is_none());
        assert!(extract_json_object("{ unbalanced").is_none());
    }
}
