//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented and logs parameters and basic result info.

use std::sync::Arc;

use axum::{
  extract::{rejection::JsonRejection, Path, State},
  Json,
};
use tracing::{info, instrument};

use crate::domain::GenerationRequest;
use crate::error::ApiError;
use crate::llm::Provider;
use crate::logic::generate_article;
use crate::protocol::*;
use crate::state::AppState;
use crate::templates::exam_template;

#[instrument(level = "info", skip(state))]
pub async fn http_root(State(state): State<Arc<AppState>>) -> Json<RootOut> {
  Json(RootOut {
    message: format!("Welcome to {}", state.settings.app_name),
    version: state.settings.app_version.clone(),
    status: "running",
  })
}

#[instrument(level = "info", skip(state))]
pub async fn http_health(State(state): State<Arc<AppState>>) -> Json<HealthOut> {
  Json(HealthOut {
    status: "healthy",
    app_name: state.settings.app_name.clone(),
    version: state.settings.app_version.clone(),
    supported_exam_types: state.catalog.codes(),
  })
}

#[instrument(level = "info", skip(state, body))]
pub async fn http_post_generate(
  State(state): State<Arc<AppState>>,
  body: Result<Json<GenerateIn>, JsonRejection>,
) -> Result<Json<GenerateOut>, ApiError> {
  let Json(body) = body.map_err(|rej| ApiError::InvalidRequest { status: rej.status(), message: rej.body_text() })?;
  let req = GenerationRequest::from(body);
  info!(target: "generation", exam_type = %req.exam_type, topic = %req.topic, "HTTP generate received");

  let data = generate_article(&state, req).await?;
  let message = format!("Generated a {} passage about '{}'", data.exam_type, data.topic);
  Ok(Json(GenerateOut { success: true, data, message }))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_exam_types(State(state): State<Arc<AppState>>) -> Json<ExamTypesOut> {
  Json(ExamTypesOut { exam_types: state.catalog.codes() })
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_exam_type(
  State(state): State<Arc<AppState>>,
  Path(exam_type): Path<String>,
) -> Result<Json<ExamInfoOut>, ApiError> {
  let code = exam_type.trim().to_uppercase();
  let exam = state.catalog.get(&code).ok_or_else(|| ApiError::InvalidExamType {
    exam_type: code.clone(),
    supported: state.catalog.codes(),
  })?;
  Ok(Json(ExamInfoOut::from(exam)))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_templates(State(state): State<Arc<AppState>>) -> Json<TemplatesOut> {
  let available_templates = state
    .catalog
    .iter()
    .map(|e| {
      let info = TemplateInfo {
        topics: e.topics.clone(),
        difficulties: e.difficulties.clone(),
        styles: e.writing_styles.clone(),
        has_template: exam_template(&e.code).is_some(),
      };
      (e.code.clone(), info)
    })
    .collect();
  Json(TemplatesOut { available_templates, supported_exam_types: state.catalog.codes() })
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_providers(State(state): State<Arc<AppState>>) -> Json<ProvidersOut> {
  let mut available_providers = Vec::new();
  let mut provider_info = std::collections::BTreeMap::new();
  for p in Provider::ALL {
    let available = state.llm.is_available(p);
    if available {
      available_providers.push(p.as_str().to_string());
    }
    let base_url = match p {
      Provider::OpenAi => state.settings.openai.base_url.clone(),
      Provider::Gemini => state.settings.gemini.base_url.clone(),
    };
    provider_info.insert(
      p.as_str().to_string(),
      ProviderInfo { model: state.default_model(p).to_string(), base_url, available },
    );
  }
  Json(ProvidersOut {
    available_providers,
    provider_info,
    default_provider: state.settings.default_provider.as_str().to_string(),
  })
}
