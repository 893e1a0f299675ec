//! Domain models: exam definitions (catalog entries), generation requests in their
//! raw and validated forms, the resolved prompt and the generation result.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Word-count bounds for one exam.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct ValidationRules {
  pub word_count_min: u32,
  pub word_count_max: u32,
}

/// Numeric score scale of an exam (informational, also used to sanity-check labels).
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct ScoreRange {
  pub min: f64,
  pub max: f64,
  pub step: f64,
}

/// One entry of the exam catalog. Immutable once loaded.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ExamDefinition {
  pub code: String,
  pub full_name: String,
  #[serde(default)]
  pub description: String,
  pub topics: Vec<String>,
  pub difficulties: Vec<String>,
  #[serde(default)]
  pub writing_styles: Vec<String>,
  #[serde(default)]
  pub default_word_count: BTreeMap<String, u32>,
  pub validation_rules: ValidationRules,
  pub score_range: ScoreRange,
}

impl ExamDefinition {
  pub fn has_topic(&self, topic: &str) -> bool {
    self.topics.iter().any(|t| t == topic)
  }

  pub fn has_difficulty(&self, label: &str) -> bool {
    self.difficulties.iter().any(|d| d == label)
  }

  pub fn has_style(&self, style: &str) -> bool {
    self.writing_styles.iter().any(|s| s == style)
  }

  pub fn default_word_count_for(&self, label: &str) -> Option<u32> {
    self.default_word_count.get(label).copied()
  }
}

/// Incoming generation parameters after normalisation, before validation.
///
/// Counts are signed so that negative input reaches the validator and is
/// reported with the proper error code instead of a deserialisation failure.
#[derive(Clone, Debug, Default)]
pub struct GenerationRequest {
  pub exam_type: String,
  pub topic: String,
  pub difficulty_score: String,
  pub word_count: Option<i64>,
  pub paragraph_count: Option<i64>,
  pub style: Option<String>,
  pub focus_points: Vec<String>,
  pub llm_provider: Option<String>,
  pub model: Option<String>,
}

/// Fully instantiated prompt plus the exam-specific blocks that went into it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedPrompt {
  /// System message: base template, exam instructions and requirements.
  pub text: String,
  /// Short user turn asking for the article.
  pub user: String,
  pub instructions: &'static str,
  pub requirements: &'static str,
}

/// Token counts as reported by the provider. Missing counts are zero.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenUsage {
  pub prompt_tokens: u32,
  pub completion_tokens: u32,
  pub total_tokens: u32,
}

#[derive(Clone, Debug, Serialize)]
pub struct ExamSummary {
  pub full_name: String,
  pub description: String,
}

/// Everything the success envelope carries about one generation.
#[derive(Clone, Debug, Serialize)]
pub struct GenerationResult {
  pub generation_id: String,
  pub article: String,
  pub actual_word_count: usize,
  pub exam_type: String,
  pub topic: String,
  pub difficulty_score: String,
  pub target_word_count: u32,
  pub paragraph_count: u32,
  pub style: Option<String>,
  pub focus_points: Vec<String>,
  pub llm_provider: String,
  pub model: String,
  pub generation_time_seconds: f64,
  pub usage: TokenUsage,
  pub generated_at: DateTime<Utc>,
  pub exam_info: ExamSummary,
}
