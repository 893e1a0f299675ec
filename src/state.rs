//! Application state: settings, the exam catalog and the LLM gateway.
//!
//! Everything here is read-only after startup; requests share it through an `Arc`
//! without locking.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::config::{ExamCatalog, Settings};
use crate::error::ApiError;
use crate::llm::{LlmGateway, Provider};
use crate::templates::exam_template;

pub struct AppState {
  pub settings: Settings,
  pub catalog: Arc<ExamCatalog>,
  pub llm: Arc<dyn LlmGateway>,
}

impl AppState {
  #[instrument(level = "info", skip_all)]
  pub fn new(settings: Settings, catalog: ExamCatalog, llm: Arc<dyn LlmGateway>) -> Self {
    for code in catalog.codes() {
      if exam_template(&code).is_none() {
        warn!(target: "exam_article_backend", exam_type = %code, "No instruction template for exam type; generation will fail with TEMPLATE_ERROR");
      }
    }

    for p in Provider::ALL {
      if llm.is_available(p) {
        info!(target: "exam_article_backend", provider = %p, model = %settings_model(&settings, p), "LLM provider enabled");
      } else {
        info!(target: "exam_article_backend", provider = %p, "LLM provider disabled (no API key)");
      }
    }
    info!(target: "exam_article_backend", provider = %settings.default_provider, "Default LLM provider");

    Self { settings, catalog: Arc::new(catalog), llm }
  }

  /// Pick the provider for a request: explicit name or the configured default.
  pub fn resolve_provider(&self, requested: Option<&str>) -> Result<Provider, ApiError> {
    let Some(name) = requested else {
      return Ok(self.settings.default_provider);
    };
    name.parse::<Provider>().map_err(|_| ApiError::UnsupportedProvider {
      provider: name.to_string(),
      supported: Provider::ALL.iter().map(|p| p.as_str().to_string()).collect(),
    })
  }

  pub fn default_model(&self, provider: Provider) -> &str {
    settings_model(&self.settings, provider)
  }
}

fn settings_model(settings: &Settings, provider: Provider) -> &str {
  match provider {
    Provider::OpenAi => &settings.openai.model,
    Provider::Gemini => &settings.gemini.model,
  }
}
