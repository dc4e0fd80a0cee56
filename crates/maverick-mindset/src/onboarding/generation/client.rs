//! Blocking client for OpenAI-compatible `chat/completions` endpoints.
//!
//! Calls log the template, model, latency and response size. Prompt contents and the API key
//! are never logged.

use std::time::{Duration, Instant};

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

use super::{GenerationError, PromptRequest, TextGenerator};

const CLIENT_USER_AGENT: &str = "maverick-mindset/0.1";

#[derive(Debug, Clone)]
pub struct ChatCompletionsConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub timeout: Duration,
}

pub struct ChatCompletionsClient {
    client: reqwest::blocking::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl ChatCompletionsClient {
    pub fn new(config: ChatCompletionsConfig) -> Result<Self, GenerationError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| GenerationError::Transport(err.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
            model: config.model,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn completion_request(&self, request: &PromptRequest) -> ChatCompletionRequest {
        let json = request.template.expects_json();
        ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessageReq {
                    role: "system",
                    content: request.system().trim().to_string(),
                },
                ChatMessageReq {
                    role: "user",
                    content: request.render(),
                },
            ],
            temperature: if json { 0.2 } else { 0.7 },
            response_format: json.then(|| ResponseFormat {
                kind: "json_object",
            }),
        }
    }
}

impl TextGenerator for ChatCompletionsClient {
    #[instrument(
        level = "info",
        skip(self, request),
        fields(template = request.template.label(), model = %self.model)
    )]
    fn generate(&self, request: &PromptRequest) -> Result<String, GenerationError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = self.completion_request(request);
        let start = Instant::now();

        let response = self
            .client
            .post(&url)
            .header(USER_AGENT, CLIENT_USER_AGENT)
            .header(CONTENT_TYPE, "application/json")
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .map_err(|err| {
                error!(elapsed = ?start.elapsed(), error = %err, "generator request failed");
                GenerationError::Transport(err.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().unwrap_or_default();
            let message = extract_error_message(&text).unwrap_or(text);
            error!(status = status.as_u16(), elapsed = ?start.elapsed(), "generator returned an error");
            return Err(GenerationError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .map_err(|err| GenerationError::Transport(err.to_string()))?;
        if let Some(usage) = &parsed.usage {
            info!(
                prompt_tokens = ?usage.prompt_tokens,
                completion_tokens = ?usage.completion_tokens,
                "generator usage"
            );
        }

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or(GenerationError::Empty)?;

        info!(elapsed = ?start.elapsed(), response_len = content.len(), "generator response received");
        Ok(content)
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessageReq>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct ChatMessageReq {
    role: &'static str,
    content: String,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageResp,
}

#[derive(Deserialize)]
struct ChatMessageResp {
    content: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: Option<u32>,
    #[serde(default)]
    completion_tokens: Option<u32>,
}

fn extract_error_message(body: &str) -> Option<String> {
    #[derive(Deserialize)]
    struct ErrorWrap {
        error: ErrorBody,
    }
    #[derive(Deserialize)]
    struct ErrorBody {
        message: String,
    }

    serde_json::from_str::<ErrorWrap>(body)
        .ok()
        .map(|wrap| wrap.error.message)
}
