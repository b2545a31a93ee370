use crate::classify::RequestKind;
use crate::event::AppEvent;
use crate::session::ImageAttachment;
use anyhow::{anyhow, Result};
use serde_json::{json, Value};
use std::sync::mpsc;
use tokio::runtime::Handle;

const DEFAULT_ENDPOINT: &str = "https://api.anthropic.com/v1/messages";
const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
const DEFAULT_MAX_TOKENS: u32 = 4096;

pub const CREATE_CONTEXT_LABEL: &str = "App Development Studio";
pub const EDIT_CONTEXT_LABEL: &str = "App Development Studio - Edit";
pub const DIAGNOSIS_CONTEXT_LABEL: &str = "App Development Studio - Diagnosis";

/// Why a request was sent, carried through the event loop so the reply lands
/// in the right handler.
#[derive(Debug, Clone)]
pub enum LlmPurpose {
    Generate {
        kind: RequestKind,
        user_message: String,
    },
    Diagnose {
        original_request: String,
    },
}

impl LlmPurpose {
    pub fn context_label(&self) -> &'static str {
        match self {
            Self::Generate {
                kind: RequestKind::Create,
                ..
            } => CREATE_CONTEXT_LABEL,
            Self::Generate {
                kind: RequestKind::Edit,
                ..
            } => EDIT_CONTEXT_LABEL,
            Self::Diagnose { .. } => DIAGNOSIS_CONTEXT_LABEL,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
    pub max_tokens: u32,
}

impl LlmConfig {
    pub fn from_env() -> Self {
        Self {
            endpoint: std::env::var("APPSTUDIO_LLM_ENDPOINT")
                .unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string()),
            api_key: std::env::var("APPSTUDIO_API_KEY").unwrap_or_default(),
            model: std::env::var("APPSTUDIO_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}

/// Claude-style messages client. Replies come back as a JSON string value
/// holding the first content block's text; the interpreter deals with shape
/// from there.
#[derive(Clone)]
pub struct HttpLlmClient {
    client: reqwest::Client,
    config: LlmConfig,
}

impl HttpLlmClient {
    pub fn new(config: LlmConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    pub async fn call(&self, prompt: &str, images: &[ImageAttachment]) -> Result<Value> {
        if !self.config.is_configured() {
            return Err(anyhow!("no API key configured; set APPSTUDIO_API_KEY"));
        }

        let mut content: Vec<Value> = Vec::with_capacity(images.len() + 1);
        for image in images {
            content.push(json!({
                "type": "image",
                "source": {
                    "type": "base64",
                    "media_type": image.mime_type,
                    "data": image.base64_payload(),
                }
            }));
        }
        content.push(json!({"type": "text", "text": prompt}));

        let body = json!({
            "model": self.config.model,
            "max_tokens": self.config.max_tokens,
            "messages": [{"role": "user", "content": content}],
        });

        let response = self
            .client
            .post(&self.config.endpoint)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(anyhow!("LLM API error {status}: {text}"));
        }

        let reply: Value = response.json().await?;
        let text = reply
            .get("content")
            .and_then(Value::as_array)
            .and_then(|blocks| blocks.first())
            .and_then(|block| block.get("text"))
            .and_then(Value::as_str)
            .ok_or_else(|| anyhow!("LLM reply carried no text content"))?;
        Ok(Value::String(text.to_string()))
    }
}

/// Bridges async LLM calls onto the UI event channel. Each send spawns on
/// the runtime and posts exactly one event back.
#[derive(Clone)]
pub struct StudioLlm {
    tx: mpsc::Sender<AppEvent>,
    client: HttpLlmClient,
    runtime_handle: Handle,
}

impl StudioLlm {
    pub fn new(tx: mpsc::Sender<AppEvent>, client: HttpLlmClient, runtime_handle: Handle) -> Self {
        Self {
            tx,
            client,
            runtime_handle,
        }
    }

    pub fn send(&self, prompt: String, images: Vec<ImageAttachment>, purpose: LlmPurpose) {
        let tx = self.tx.clone();
        let client = self.client.clone();

        tracing::debug!(context = purpose.context_label(), "dispatching LLM request");
        self.runtime_handle.spawn(async move {
            match client.call(&prompt, &images).await {
                Ok(reply) => {
                    let _ = tx.send(AppEvent::LlmReply { purpose, reply });
                }
                Err(err) => {
                    let _ = tx.send(AppEvent::LlmFailed {
                        purpose,
                        message: err.to_string(),
                    });
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_labels_track_purpose() {
        let create = LlmPurpose::Generate {
            kind: RequestKind::Create,
            user_message: "make an app".to_string(),
        };
        let edit = LlmPurpose::Generate {
            kind: RequestKind::Edit,
            user_message: "tweak it".to_string(),
        };
        let diagnose = LlmPurpose::Diagnose {
            original_request: "make an app".to_string(),
        };
        assert_eq!(create.context_label(), CREATE_CONTEXT_LABEL);
        assert_eq!(edit.context_label(), EDIT_CONTEXT_LABEL);
        assert_eq!(diagnose.context_label(), DIAGNOSIS_CONTEXT_LABEL);
    }

    #[test]
    fn unconfigured_client_is_detected_before_any_request() {
        let config = LlmConfig {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: String::new(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
        };
        assert!(!config.is_configured());
    }
}
