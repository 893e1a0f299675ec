//! Error taxonomy surfaced by the API and its JSON envelope.
//!
//! Every failure becomes `{"success": false, "error": {"code", "message", "details"}}`.

use axum::{
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use serde_json::{json, Value};
use tracing::{error, warn};

use crate::llm::LlmError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
  #[error("Unsupported exam type: {exam_type}")]
  InvalidExamType { exam_type: String, supported: Vec<String> },

  /// Raised for topics and for writing styles; `field` tells which one.
  #[error("{exam_type} does not support {field} '{value}'")]
  InvalidTopic { exam_type: String, field: &'static str, value: String, allowed: Vec<String> },

  #[error("{exam_type} does not support difficulty '{difficulty}'{}", default_note(.missing_default))]
  InvalidDifficultyScore { exam_type: String, difficulty: String, supported: Vec<String>, missing_default: bool },

  #[error("Word count {word_count} is out of range ({min}-{max}) for {exam_type}")]
  InvalidWordCount { exam_type: String, word_count: i64, min: u32, max: u32 },

  #[error("Paragraph count {paragraph_count} is out of range ({min}-{max})")]
  InvalidParagraphCount { paragraph_count: i64, min: u32, max: u32 },

  #[error("Too many focus points: {count} given, at most {max} allowed")]
  InvalidFocusPoints { count: usize, max: usize },

  #[error("Template error for {exam_type}: {message}")]
  TemplateError { exam_type: String, message: String },

  #[error("Unsupported LLM provider: {provider}")]
  UnsupportedProvider { provider: String, supported: Vec<String> },

  #[error("LLM provider error ({provider}): {message}")]
  ProviderError { provider: String, model: String, message: String, upstream_status: Option<u16> },

  #[error("Article generation timed out after {timeout_secs}s")]
  GenerationTimeout { provider: String, model: String, timeout_secs: u64 },

  #[error("Invalid request body: {message}")]
  InvalidRequest { status: StatusCode, message: String },
}

fn default_note(missing_default: &bool) -> &'static str {
  if *missing_default { " (no default word count)" } else { "" }
}

impl ApiError {
  pub fn code(&self) -> &'static str {
    match self {
      ApiError::InvalidExamType { .. } => "INVALID_EXAM_TYPE",
      ApiError::InvalidTopic { .. } => "INVALID_TOPIC",
      ApiError::InvalidDifficultyScore { .. } => "INVALID_DIFFICULTY_SCORE",
      ApiError::InvalidWordCount { .. } => "INVALID_WORD_COUNT",
      ApiError::InvalidParagraphCount { .. } => "INVALID_PARAGRAPH_COUNT",
      ApiError::InvalidFocusPoints { .. } => "INVALID_FOCUS_POINTS",
      ApiError::TemplateError { .. } => "TEMPLATE_ERROR",
      ApiError::UnsupportedProvider { .. } => "UNSUPPORTED_PROVIDER",
      ApiError::ProviderError { .. } => "PROVIDER_ERROR",
      ApiError::GenerationTimeout { .. } => "GENERATION_TIMEOUT",
      ApiError::InvalidRequest { .. } => "INVALID_REQUEST",
    }
  }

  pub fn status(&self) -> StatusCode {
    match self {
      ApiError::TemplateError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
      ApiError::ProviderError { .. } => StatusCode::BAD_GATEWAY,
      ApiError::GenerationTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
      ApiError::InvalidRequest { status, .. } => *status,
      _ => StatusCode::BAD_REQUEST,
    }
  }

  pub fn details(&self) -> Value {
    match self {
      ApiError::InvalidExamType { exam_type, supported } =>
        json!({ "exam_type": exam_type, "supported_types": supported }),
      ApiError::InvalidTopic { exam_type, field, value, allowed } =>
        json!({ "exam_type": exam_type, "field": field, "value": value, "allowed": allowed }),
      ApiError::InvalidDifficultyScore { exam_type, difficulty, supported, missing_default } =>
        json!({
          "exam_type": exam_type,
          "difficulty_score": difficulty,
          "supported_difficulties": supported,
          "missing_default_word_count": missing_default,
        }),
      ApiError::InvalidWordCount { exam_type, word_count, min, max } => {
        let violated = if *word_count < i64::from(*min) { "word_count_min" } else { "word_count_max" };
        json!({
          "exam_type": exam_type,
          "word_count": word_count,
          "min_count": min,
          "max_count": max,
          "violated_bound": violated,
        })
      }
      ApiError::InvalidParagraphCount { paragraph_count, min, max } =>
        json!({ "paragraph_count": paragraph_count, "min_count": min, "max_count": max }),
      ApiError::InvalidFocusPoints { count, max } => json!({ "focus_points_count": count, "max_count": max }),
      ApiError::TemplateError { exam_type, .. } => json!({ "exam_type": exam_type }),
      ApiError::UnsupportedProvider { provider, supported } =>
        json!({ "provider": provider, "supported_providers": supported }),
      ApiError::ProviderError { provider, model, upstream_status, .. } =>
        json!({ "provider": provider, "model": model, "upstream_status": upstream_status }),
      ApiError::GenerationTimeout { provider, model, timeout_secs } =>
        json!({ "provider": provider, "model": model, "timeout_seconds": timeout_secs }),
      ApiError::InvalidRequest { status, .. } => json!({ "status": status.as_u16() }),
    }
  }

  /// Map a gateway failure onto the taxonomy, tagging it with the target model.
  pub fn from_llm(err: LlmError, provider: &str, model: &str) -> Self {
    match err {
      LlmError::Timeout { timeout_secs } => ApiError::GenerationTimeout {
        provider: provider.to_string(),
        model: model.to_string(),
        timeout_secs,
      },
      LlmError::Upstream { status, message } => ApiError::ProviderError {
        provider: provider.to_string(),
        model: model.to_string(),
        message,
        upstream_status: Some(status),
      },
      other => ApiError::ProviderError {
        provider: provider.to_string(),
        model: model.to_string(),
        message: other.to_string(),
        upstream_status: None,
      },
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    if status.is_server_error() {
      error!(target: "generation", code = self.code(), %status, error = %self, "Request failed");
    } else {
      warn!(target: "generation", code = self.code(), %status, error = %self, "Request rejected");
    }
    let body = json!({
      "success": false,
      "error": {
        "code": self.code(),
        "message": self.to_string(),
        "details": self.details(),
      }
    });
    (status, Json(body)).into_response()
  }
}
