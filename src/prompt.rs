use crate::session::{AppPayload, STUDIO_ID};
use serde_json::Value;
use std::fmt;

const NONE_REGISTERED: &str = "None currently registered";

const ROLE_PROMPT: &str = "You are an expert web developer specializing in creating modular, \
theme-aware web applications. Your task is to generate HTML, CSS, and JavaScript code for a \
new app based on user requests.";

const CONTEXT_PROMPT: &str = "AI-OS SYSTEM CONTEXT:

You are generating code for ai-os, a windowed operating system that runs web applications in \
isolated environments.

NAMESPACE SYSTEM:
- The ai-os system automatically creates a unique namespace for each app
- Variable 'appNamespace' is PROVIDED to your code (DO NOT declare it yourself)
- All HTML element IDs MUST use {appId}_ prefix
- All CSS classes MUST use {appId}__ prefix
- Your init function MUST be: window[appNamespace].init = function() { ... }";

const FORMAT_PROMPT: &str = "RESPONSE FORMAT - Return ONLY a JSON object with this structure:
{
  \"title\": \"App Name\",
  \"icon\": \"📱\",
  \"html\": \"complete HTML content\",
  \"css\": \"complete CSS styles\",
  \"javascript\": \"complete JavaScript functionality INCLUDING MANDATORY INIT FUNCTION\"
}

If the request is too vague to build, instead return:
{
  \"type\": \"suggestions\",
  \"question\": \"one clarifying question\",
  \"suggestions\": [{\"text\": \"option label\", \"description\": \"short explanation\"}]
}";

const JAVASCRIPT_GUIDELINES: &str = "ESSENTIAL JAVASCRIPT GUIDELINES:
- Handle all user interactions with the addEventListener pattern
- NEVER declare the namespace variable yourself; appNamespace is already in scope
- NEVER use window.prompt() or window.alert()
- NEVER add global key event listeners; use the provided app.onKey() method instead
- MANDATORY init function: window[appNamespace].init = function() { ... };";

const CSS_GUIDELINES: &str = "ESSENTIAL CSS GUIDELINES:
- Apps inherit .app-light-theme or .app-dark-theme classes; design for BOTH modes
- Never light text on light backgrounds or dark text on dark backgrounds
- The app must be responsive and fit well in a window 300-600px wide";

const EDIT_ROLE_PROMPT: &str = "You are an expert web developer specializing in modifying and \
improving existing web applications. Your task is to make SPECIFIC MODIFICATIONS to an existing \
app based on user requests.

CRITICAL: You are EDITING an existing app, NOT creating a new one from scratch. Only modify the \
parts that need to change; preserve everything else.";

const EDIT_FORMAT_PROMPT: &str = "RESPONSE FORMAT - Return ONLY a JSON object with this structure:
{
  \"title\": \"App Name (keep same unless the user requests a title change)\",
  \"icon\": \"📱 (keep same unless the user requests an icon change)\",
  \"html\": \"COMPLETE HTML content with modifications applied\",
  \"css\": \"COMPLETE CSS styles with modifications applied\",
  \"javascript\": \"COMPLETE JavaScript with modifications applied INCLUDING MANDATORY INIT FUNCTION\",
  \"description\": \"Brief, clear description of the specific modifications made\"
}";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptError {
    NoActiveApp,
}

impl fmt::Display for PromptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoActiveApp => write!(f, "no current app to edit"),
        }
    }
}

impl std::error::Error for PromptError {}

/// One registered shared-data object, flattened to a prompt context line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataDescriptor {
    pub key: String,
    pub description: String,
    pub structure: String,
}

impl DataDescriptor {
    pub fn prompt_line(&self) -> String {
        format!("- {}: {} ({})", self.key, self.description, self.structure)
    }
}

/// Read-only snapshot of the environment taken just before a prompt is built.
#[derive(Debug, Clone, Default)]
pub struct EnvironmentContext {
    pub theme_name: String,
    pub data_objects: Vec<DataDescriptor>,
    pub api_descriptors: String,
}

impl EnvironmentContext {
    fn data_objects_block(&self) -> String {
        if self.data_objects.is_empty() {
            NONE_REGISTERED.to_string()
        } else {
            self.data_objects
                .iter()
                .map(DataDescriptor::prompt_line)
                .collect::<Vec<_>>()
                .join("\n")
        }
    }

    fn api_block(&self) -> &str {
        if self.api_descriptors.is_empty() {
            NONE_REGISTERED
        } else {
            self.api_descriptors.as_str()
        }
    }
}

/// Fixed, deterministic structure heuristic for data registry values. Not a
/// schema inference system: arrays report length and the first three element
/// keys, objects report their first three keys, everything else its type name.
pub fn structure_summary(value: &Value) -> String {
    match value {
        Value::Array(items) => {
            if items.is_empty() {
                return "Empty array".to_string();
            }
            match items.first() {
                Some(Value::Object(map)) => format!(
                    "Array of {} objects with keys: {}",
                    items.len(),
                    leading_keys(map)
                ),
                Some(first) => format!("Array of {} {}", items.len(), type_name(first)),
                None => "Empty array".to_string(),
            }
        }
        Value::Object(map) => format!("Object with keys: {}", leading_keys(map)),
        other => type_name(other).to_string(),
    }
}

fn leading_keys(map: &serde_json::Map<String, Value>) -> String {
    let keys: Vec<&str> = map.keys().take(3).map(String::as_str).collect();
    let suffix = if map.len() > keys.len() { "..." } else { "" };
    format!("{}{}", keys.join(", "), suffix)
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Builds the full create-mode prompt: fixed instructional fragments
/// interleaved with the live environment snapshot, then the user request.
/// Pure function of its inputs.
pub fn build_create_prompt(user_message: &str, env: &EnvironmentContext) -> String {
    format!(
        "{ROLE_PROMPT}\n\n{context}\n\nTASK:\nCreate a COMPLETE, FUNCTIONAL app that works in a \
window. The app will be placed inside a window with ID \"content_{studio_id}\". Use vanilla \
HTML, CSS, and JavaScript; pre-loaded libraries (THREE.js v0.177.0 as THREE, Chart.js v4.4.1 \
as Chart) are available if needed.\n\n{format}\n\n{namespace}\n\n{css}\n- Current theme: \
{theme}\n\n{javascript}\n\nAVAILABLE DATA OBJECTS:\n{data}\n\nAVAILABLE APIS:\n{apis}\n\n\
Now create a functional app for: {user_message}",
        context = CONTEXT_PROMPT.replace("{appId}", STUDIO_ID),
        studio_id = STUDIO_ID,
        format = FORMAT_PROMPT,
        namespace = namespace_guidelines(),
        css = CSS_GUIDELINES,
        theme = env.theme_name,
        javascript = JAVASCRIPT_GUIDELINES,
        data = env.data_objects_block(),
        apis = env.api_block(),
    )
}

/// Builds the edit-mode prompt. The current app's full source is embedded
/// verbatim so the model can produce a complete replacement. Fails when no
/// app exists to edit.
pub fn build_edit_prompt(
    user_message: &str,
    env: &EnvironmentContext,
    current_app: Option<&AppPayload>,
) -> Result<String, PromptError> {
    let app = current_app.ok_or(PromptError::NoActiveApp)?;
    Ok(format!(
        "{EDIT_ROLE_PROMPT}\n\nCURRENT APP INFORMATION:\n- Title: {title}\n- Description: \
{description}\n\nCURRENT APP CODE:\n=== HTML ===\n{html}\n\n=== CSS ===\n{css}\n\n\
=== JAVASCRIPT ===\n{javascript}\n\nEDITING REQUIREMENTS:\n1. PRESERVE existing functionality \
unless specifically asked to change it\n2. Make ONLY the modifications requested by the user\n\
3. Maintain the same app structure and namespace system\n4. Ensure modifications integrate \
seamlessly with existing code\n\nUSER'S MODIFICATION REQUEST:\n{user_message}\n\n\
{format}\n\n{javascript_guidelines}\n\nMODIFICATION GUIDELINES:\n- Current theme: {theme}\n\
- Maintain theme compatibility (.app-light-theme and .app-dark-theme)\n- Preserve namespace \
isolation with {studio_id}_ prefixes\n\nAVAILABLE DATA OBJECTS:\n{data}\n\nAVAILABLE APIS:\n\
{apis}",
        title = app.title,
        description = app.description.as_deref().unwrap_or("No description"),
        html = app.html,
        css = app.css,
        javascript = app.javascript,
        format = EDIT_FORMAT_PROMPT,
        javascript_guidelines = JAVASCRIPT_GUIDELINES,
        theme = env.theme_name,
        studio_id = STUDIO_ID,
        data = env.data_objects_block(),
        apis = env.api_block(),
    ))
}

fn namespace_guidelines() -> String {
    format!(
        "NAMESPACE ISOLATION REQUIREMENTS:\n- ALL HTML element IDs MUST be prefixed with \
\"{id}_\"\n- ALL CSS classes MUST be prefixed with \"{id}__\"\n- ALL custom events MUST be \
prefixed with \"{id}:\"\n- Use querySelector with app-specific selectors: \
document.querySelector('#{id}_elementId')",
        id = STUDIO_ID
    )
}
