//! LLM gateway: the one outbound call of the service.
//!
//! Both supported providers (OpenAI and Gemini) are reached through the
//! OpenAI-compatible `chat/completions` endpoint, so a single client covers them.
//! Calls are instrumented and log model names, latencies and token usage (never
//! prompt contents or API keys). There is no retry; the caller gets the first
//! failure.

use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

use crate::config::{ProviderSettings, Settings};
use crate::domain::TokenUsage;
use crate::util::trunc_for_log;

const CLIENT_UA: &str = concat!("exam-article-backend/", env!("CARGO_PKG_VERSION"));

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Provider {
  OpenAi,
  Gemini,
}

impl Provider {
  pub const ALL: [Provider; 2] = [Provider::OpenAi, Provider::Gemini];

  pub fn as_str(&self) -> &'static str {
    match self {
      Provider::OpenAi => "openai",
      Provider::Gemini => "gemini",
    }
  }
}

impl fmt::Display for Provider {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Provider {
  type Err = ();

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "openai" => Ok(Provider::OpenAi),
      "gemini" | "google" => Ok(Provider::Gemini),
      _ => Err(()),
    }
  }
}

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
  #[error("provider '{provider}' is not configured (missing API key)")]
  NotConfigured { provider: Provider },

  #[error("upstream HTTP {status}: {message}")]
  Upstream { status: u16, message: String },

  #[error("transport error: {0}")]
  Transport(String),

  #[error("request timed out after {timeout_secs}s")]
  Timeout { timeout_secs: u64 },

  #[error("malformed provider response: {0}")]
  Malformed(String),

  #[error("provider returned an empty completion")]
  EmptyCompletion,
}

/// One generation call.
#[derive(Clone, Debug)]
pub struct CompletionRequest<'a> {
  pub provider: Provider,
  pub model: &'a str,
  pub system: &'a str,
  pub user: &'a str,
  pub max_tokens: u32,
  pub temperature: f32,
  pub timeout: Duration,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Completion {
  pub text: String,
  pub usage: TokenUsage,
}

/// The capability the generation pipeline depends on. Injected through `AppState`.
#[async_trait]
pub trait LlmGateway: Send + Sync {
  async fn generate(&self, req: CompletionRequest<'_>) -> Result<Completion, LlmError>;

  /// Whether `provider` has credentials and can be called.
  fn is_available(&self, provider: Provider) -> bool;
}

/// reqwest-backed gateway speaking the chat-completions protocol.
#[derive(Clone)]
pub struct ChatCompletionsGateway {
  client: reqwest::Client,
  openai: ProviderSettings,
  gemini: ProviderSettings,
}

impl ChatCompletionsGateway {
  pub fn new(settings: &Settings) -> Result<Self, reqwest::Error> {
    let client = reqwest::Client::builder()
      .timeout(settings.generation_timeout)
      .build()?;
    Ok(Self { client, openai: settings.openai.clone(), gemini: settings.gemini.clone() })
  }

  fn endpoint(&self, provider: Provider) -> &ProviderSettings {
    match provider {
      Provider::OpenAi => &self.openai,
      Provider::Gemini => &self.gemini,
    }
  }

  async fn send(&self, req: &CompletionRequest<'_>, api_key: &str, base_url: &str) -> Result<Completion, LlmError> {
    let url = format!("{}/chat/completions", base_url.trim_end_matches('/'));
    let body = ChatCompletionRequest {
      model: req.model.to_string(),
      messages: vec![
        ChatMessageReq { role: "system".into(), content: req.system.into() },
        ChatMessageReq { role: "user".into(), content: req.user.into() },
      ],
      temperature: req.temperature,
      max_tokens: Some(req.max_tokens),
    };

    let res = self.client.post(&url)
      .header(USER_AGENT, CLIENT_UA)
      .header(CONTENT_TYPE, "application/json")
      .header(AUTHORIZATION, format!("Bearer {}", api_key))
      .timeout(req.timeout)
      .json(&body).send().await
      .map_err(|e| classify(e, req.timeout))?;

    if !res.status().is_success() {
      let status = res.status().as_u16();
      let body = res.text().await.unwrap_or_default();
      let message = extract_provider_error(&body).unwrap_or_else(|| trunc_for_log(&body, 300));
      return Err(LlmError::Upstream { status, message });
    }

    let raw = res.text().await.map_err(|e| classify(e, req.timeout))?;
    parse_completion(&raw)
  }
}

#[async_trait]
impl LlmGateway for ChatCompletionsGateway {
  #[instrument(
    level = "info",
    target = "llm",
    skip(self, req),
    fields(provider = %req.provider, model = %req.model, max_tokens = req.max_tokens, prompt_len = req.system.len() + req.user.len())
  )]
  async fn generate(&self, req: CompletionRequest<'_>) -> Result<Completion, LlmError> {
    let endpoint = self.endpoint(req.provider);
    let api_key = endpoint
      .api_key
      .as_deref()
      .ok_or(LlmError::NotConfigured { provider: req.provider })?;

    let start = Instant::now();
    // Outer bound covers connect + body read; reqwest's own timeout may fire first.
    let result = match tokio::time::timeout(req.timeout, self.send(&req, api_key, &endpoint.base_url)).await {
      Ok(r) => r,
      Err(_) => Err(LlmError::Timeout { timeout_secs: req.timeout.as_secs() }),
    };
    let elapsed = start.elapsed();

    match &result {
      Ok(c) => info!(
        target: "llm",
        ?elapsed,
        prompt_tokens = c.usage.prompt_tokens,
        completion_tokens = c.usage.completion_tokens,
        total_tokens = c.usage.total_tokens,
        response_len = c.text.len(),
        "Completion received"
      ),
      Err(e) => error!(target: "llm", ?elapsed, error = %e, "Completion failed"),
    }
    result
  }

  fn is_available(&self, provider: Provider) -> bool {
    self.endpoint(provider).api_key.is_some()
  }
}

fn classify(e: reqwest::Error, timeout: Duration) -> LlmError {
  if e.is_timeout() {
    LlmError::Timeout { timeout_secs: timeout.as_secs() }
  } else {
    LlmError::Transport(e.to_string())
  }
}

fn parse_completion(raw: &str) -> Result<Completion, LlmError> {
  let body: ChatCompletionResponse =
    serde_json::from_str(raw).map_err(|e| LlmError::Malformed(e.to_string()))?;
  let text = body.choices.first()
    .and_then(|c| c.message.content.clone())
    .unwrap_or_default()
    .trim()
    .to_string();
  if text.is_empty() {
    return Err(LlmError::EmptyCompletion);
  }
  let usage = body.usage.map(|u| {
    let prompt = u.prompt_tokens.unwrap_or(0);
    let completion = u.completion_tokens.unwrap_or(0);
    TokenUsage {
      prompt_tokens: prompt,
      completion_tokens: completion,
      total_tokens: u.total_tokens.unwrap_or(prompt + completion),
    }
  }).unwrap_or_default();
  Ok(Completion { text, usage })
}

// --- Chat DTOs ---

#[derive(Serialize)]
struct ChatCompletionRequest {
  model: String,
  messages: Vec<ChatMessageReq>,
  temperature: f32,
  #[serde(skip_serializing_if = "Option::is_none")]
  max_tokens: Option<u32>,
}
#[derive(Serialize)]
struct ChatMessageReq { role: String, content: String }

#[derive(Deserialize)]
struct ChatCompletionResponse {
  choices: Vec<ChatChoice>,
  #[serde(default)] usage: Option<Usage>,
}
#[derive(Deserialize)]
struct ChatChoice { message: ChatMessageResp }
#[derive(Deserialize)]
struct ChatMessageResp { content: Option<String> }
#[derive(Deserialize)]
struct Usage {
  #[serde(default)] prompt_tokens: Option<u32>,
  #[serde(default)] completion_tokens: Option<u32>,
  #[serde(default)] total_tokens: Option<u32>,
}

/// Try to extract a clean error message from an OpenAI-style error body.
/// Gemini's compatibility layer sometimes wraps the object in a one-element array.
fn extract_provider_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap { error: EObj }
  #[derive(Deserialize)]
  struct EObj { message: String }
  if let Ok(w) = serde_json::from_str::<EWrap>(body) {
    return Some(w.error.message);
  }
  serde_json::from_str::<Vec<EWrap>>(body)
    .ok()
    .and_then(|v| v.into_iter().next())
    .map(|w| w.error.message)
}
