use crate::llm::LlmPurpose;
use serde_json::Value;

/// Events posted from async LLM work back to the UI thread. The frame loop
/// drains these each repaint.
#[derive(Debug, Clone)]
pub enum AppEvent {
    LlmReply { purpose: LlmPurpose, reply: Value },
    LlmFailed { purpose: LlmPurpose, message: String },
}
