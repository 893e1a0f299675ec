//! Request validation against the exam catalog.
//!
//! Checks run in a fixed order so the reported error is reproducible:
//! exam_type → topic → difficulty → word_count → paragraph_count → style → focus_points.
//! Topics are a closed list per exam; free text is not accepted.

use crate::config::ExamCatalog;
use crate::domain::GenerationRequest;
use crate::error::ApiError;

pub const PARAGRAPH_MIN: u32 = 1;
pub const PARAGRAPH_MAX: u32 = 10;
pub const DEFAULT_PARAGRAPHS: u32 = 3;
pub const MAX_FOCUS_POINTS: usize = 10;

/// A request that satisfied every rule of its exam definition.
///
/// Fields are private to this module, so `validate` is the only constructor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidatedRequest {
  exam_type: String,
  topic: String,
  difficulty_score: String,
  word_count: u32,
  paragraph_count: u32,
  style: Option<String>,
  focus_points: Vec<String>,
  llm_provider: Option<String>,
  model: Option<String>,
}

impl ValidatedRequest {
  pub fn exam_type(&self) -> &str { &self.exam_type }
  pub fn topic(&self) -> &str { &self.topic }
  pub fn difficulty_score(&self) -> &str { &self.difficulty_score }
  pub fn word_count(&self) -> u32 { self.word_count }
  pub fn paragraph_count(&self) -> u32 { self.paragraph_count }
  pub fn style(&self) -> Option<&str> { self.style.as_deref() }
  pub fn focus_points(&self) -> &[String] { &self.focus_points }
  pub fn llm_provider(&self) -> Option<&str> { self.llm_provider.as_deref() }
  pub fn model(&self) -> Option<&str> { self.model.as_deref() }
}

pub fn validate(catalog: &ExamCatalog, req: GenerationRequest) -> Result<ValidatedRequest, ApiError> {
  let exam = catalog.get(&req.exam_type).ok_or_else(|| ApiError::InvalidExamType {
    exam_type: req.exam_type.clone(),
    supported: catalog.codes(),
  })?;

  if !exam.has_topic(&req.topic) {
    return Err(ApiError::InvalidTopic {
      exam_type: exam.code.clone(),
      field: "topic",
      value: req.topic,
      allowed: exam.topics.clone(),
    });
  }

  if !exam.has_difficulty(&req.difficulty_score) {
    return Err(ApiError::InvalidDifficultyScore {
      exam_type: exam.code.clone(),
      difficulty: req.difficulty_score,
      supported: exam.difficulties.clone(),
      missing_default: false,
    });
  }

  let rules = &exam.validation_rules;
  let word_count = match req.word_count {
    Some(w) if w < i64::from(rules.word_count_min) || w > i64::from(rules.word_count_max) => {
      return Err(ApiError::InvalidWordCount {
        exam_type: exam.code.clone(),
        word_count: w,
        min: rules.word_count_min,
        max: rules.word_count_max,
      });
    }
    // In range, so it fits u32.
    Some(w) => w as u32,
    None => exam.default_word_count_for(&req.difficulty_score).ok_or_else(|| {
      ApiError::InvalidDifficultyScore {
        exam_type: exam.code.clone(),
        difficulty: req.difficulty_score.clone(),
        supported: exam.difficulties.clone(),
        missing_default: true,
      }
    })?,
  };

  let paragraph_count = match req.paragraph_count {
    None => DEFAULT_PARAGRAPHS,
    Some(p) if p >= i64::from(PARAGRAPH_MIN) && p <= i64::from(PARAGRAPH_MAX) => p as u32,
    Some(p) => {
      return Err(ApiError::InvalidParagraphCount {
        paragraph_count: p,
        min: PARAGRAPH_MIN,
        max: PARAGRAPH_MAX,
      });
    }
  };

  if let Some(style) = &req.style {
    if !exam.has_style(style) {
      return Err(ApiError::InvalidTopic {
        exam_type: exam.code.clone(),
        field: "style",
        value: style.clone(),
        allowed: exam.writing_styles.clone(),
      });
    }
  }

  if req.focus_points.len() > MAX_FOCUS_POINTS {
    return Err(ApiError::InvalidFocusPoints { count: req.focus_points.len(), max: MAX_FOCUS_POINTS });
  }

  Ok(ValidatedRequest {
    exam_type: exam.code.clone(),
    topic: req.topic,
    difficulty_score: req.difficulty_score,
    word_count,
    paragraph_count,
    style: req.style,
    focus_points: req.focus_points,
    llm_provider: req.llm_provider,
    model: req.model,
  })
}
