//! Public protocol structs for the HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::domain::{ExamDefinition, GenerationRequest, GenerationResult, ScoreRange, ValidationRules};

//
// Generation
//

#[derive(Debug, Deserialize)]
pub struct GenerateIn {
  pub exam_type: String,
  pub topic: String,
  #[serde(alias = "difficulty", deserialize_with = "string_or_number")]
  pub difficulty_score: String,
  #[serde(default)]
  pub word_count: Option<i64>,
  #[serde(default)]
  pub paragraph_count: Option<i64>,
  #[serde(default)]
  pub style: Option<String>,
  #[serde(default)]
  pub focus_points: Option<Vec<String>>,
  #[serde(default)]
  pub llm_provider: Option<String>,
  #[serde(default)]
  pub model: Option<String>,
}

/// Accept `"160"` as well as `160` / `6.5` for difficulty labels.
/// Integral floats (`160.0`) are written without the fraction.
fn string_or_number<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
  match Value::deserialize(d)? {
    Value::String(s) => Ok(s),
    Value::Number(n) => Ok(number_label(&n)),
    other => Err(serde::de::Error::custom(format!("expected string or number, got {other}"))),
  }
}

fn number_label(n: &serde_json::Number) -> String {
  match n.as_f64() {
    Some(f) if n.is_f64() && f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
    _ => n.to_string(),
  }
}

fn trimmed(s: Option<String>) -> Option<String> {
  s.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl From<GenerateIn> for GenerationRequest {
  fn from(body: GenerateIn) -> Self {
    let focus_points = body
      .focus_points
      .unwrap_or_default()
      .into_iter()
      .map(|p| p.trim().to_string())
      .filter(|p| !p.is_empty())
      .collect();
    GenerationRequest {
      exam_type: body.exam_type.trim().to_uppercase(),
      topic: body.topic.trim().to_string(),
      difficulty_score: body.difficulty_score.trim().to_string(),
      word_count: body.word_count,
      paragraph_count: body.paragraph_count,
      style: trimmed(body.style),
      focus_points,
      llm_provider: trimmed(body.llm_provider),
      model: trimmed(body.model),
    }
  }
}

#[derive(Debug, Serialize)]
pub struct GenerateOut {
  pub success: bool,
  pub data: GenerationResult,
  pub message: String,
}

//
// Catalog reads
//

#[derive(Serialize)]
pub struct ExamTypesOut {
  pub exam_types: Vec<String>,
}

#[derive(Serialize)]
pub struct ExamInfoOut {
  pub exam_type: String,
  pub full_name: String,
  pub description: String,
  pub supported_difficulties: Vec<String>,
  pub writing_styles: Vec<String>,
  pub common_topics: Vec<String>,
  pub default_word_count: BTreeMap<String, u32>,
  pub validation_rules: ValidationRules,
  pub score_range: ScoreRange,
}

impl From<&ExamDefinition> for ExamInfoOut {
  fn from(e: &ExamDefinition) -> Self {
    Self {
      exam_type: e.code.clone(),
      full_name: e.full_name.clone(),
      description: e.description.clone(),
      supported_difficulties: e.difficulties.clone(),
      writing_styles: e.writing_styles.clone(),
      common_topics: e.topics.clone(),
      default_word_count: e.default_word_count.clone(),
      validation_rules: e.validation_rules.clone(),
      score_range: e.score_range.clone(),
    }
  }
}

#[derive(Serialize)]
pub struct TemplateInfo {
  pub topics: Vec<String>,
  pub difficulties: Vec<String>,
  pub styles: Vec<String>,
  pub has_template: bool,
}

#[derive(Serialize)]
pub struct TemplatesOut {
  pub available_templates: BTreeMap<String, TemplateInfo>,
  pub supported_exam_types: Vec<String>,
}

#[derive(Serialize)]
pub struct ProviderInfo {
  pub model: String,
  pub base_url: String,
  pub available: bool,
}

#[derive(Serialize)]
pub struct ProvidersOut {
  pub available_providers: Vec<String>,
  pub provider_info: BTreeMap<String, ProviderInfo>,
  pub default_provider: String,
}

#[derive(Serialize)]
pub struct RootOut {
  pub message: String,
  pub version: String,
  pub status: &'static str,
}

#[derive(Serialize)]
pub struct HealthOut {
  pub status: &'static str,
  pub app_name: String,
  pub version: String,
  pub supported_exam_types: Vec<String>,
}
