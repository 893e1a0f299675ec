//! Process configuration: environment settings and the exam catalog (TOML).
//!
//! Environment variables (all optional):
//!   API_HOST / PORT (or API_PORT)
//!   OPENAI_API_KEY, OPENAI_BASE_URL, OPENAI_MODEL
//!   GEMINI_API_KEY, GEMINI_BASE_URL, GEMINI_MODEL
//!   DEFAULT_LLM_PROVIDER, GENERATION_TIMEOUT (seconds), MAX_ARTICLE_TOKENS
//!   APP_NAME, EXAM_CONFIG_PATH
//!
//! The exam catalog is loaded once at startup. Without EXAM_CONFIG_PATH the
//! built-in `config/exams.toml` is used. Any read, parse or consistency error
//! aborts startup.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::{info, warn};

use crate::domain::ExamDefinition;
use crate::llm::Provider;

const BUILTIN_EXAMS: &str = include_str!("../config/exams.toml");

const PLACEHOLDER_KEYS: &[&str] = &["your_openai_api_key_here", "your_gemini_api_key_here"];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
  #[error("Failed to read exam config '{path}': {source}")]
  Read { path: PathBuf, source: std::io::Error },

  #[error("Failed to parse exam config '{origin}': {source}")]
  Parse { origin: String, source: toml::de::Error },

  #[error("Invalid exam config '{origin}': {message}")]
  Invalid { origin: String, message: String },
}

/// Connection settings for one chat-completions provider.
#[derive(Clone, Debug)]
pub struct ProviderSettings {
  pub api_key: Option<String>,
  pub base_url: String,
  pub model: String,
}

#[derive(Clone, Debug)]
pub struct Settings {
  pub app_name: String,
  pub app_version: String,
  pub host: String,
  pub port: u16,
  pub openai: ProviderSettings,
  pub gemini: ProviderSettings,
  pub default_provider: Provider,
  pub generation_timeout: Duration,
  pub max_article_tokens: u32,
  pub exam_config_path: Option<PathBuf>,
}

impl Settings {
  pub fn from_env() -> Self {
    Self::from_lookup(|k| std::env::var(k).ok())
  }

  /// Build settings through an arbitrary key lookup; empty values count as unset.
  pub fn from_lookup<F>(lookup: F) -> Self
  where
    F: Fn(&str) -> Option<String>,
  {
    let get = |k: &str| lookup(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
    let secret = |k: &str| get(k).filter(|v| !PLACEHOLDER_KEYS.contains(&v.as_str()));

    let port = get("PORT")
      .or_else(|| get("API_PORT"))
      .and_then(|p| parse_or_warn::<u16>("PORT", &p))
      .unwrap_or(8000);
    let timeout_secs = get("GENERATION_TIMEOUT")
      .and_then(|v| parse_or_warn::<u64>("GENERATION_TIMEOUT", &v))
      .filter(|s| *s > 0)
      .unwrap_or(30);
    let max_article_tokens = get("MAX_ARTICLE_TOKENS")
      .and_then(|v| parse_or_warn::<u32>("MAX_ARTICLE_TOKENS", &v))
      .filter(|n| *n > 0)
      .unwrap_or(2000);
    let default_provider = get("DEFAULT_LLM_PROVIDER")
      .and_then(|p| parse_or_warn::<Provider>("DEFAULT_LLM_PROVIDER", &p))
      .unwrap_or(Provider::OpenAi);

    Self {
      app_name: get("APP_NAME").unwrap_or_else(|| "ArticleGenerator".into()),
      app_version: env!("CARGO_PKG_VERSION").to_string(),
      host: get("API_HOST").unwrap_or_else(|| "0.0.0.0".into()),
      port,
      openai: ProviderSettings {
        api_key: secret("OPENAI_API_KEY"),
        base_url: get("OPENAI_BASE_URL").unwrap_or_else(|| "https://api.openai.com/v1".into()),
        model: get("OPENAI_MODEL").unwrap_or_else(|| "gpt-4o-mini".into()),
      },
      gemini: ProviderSettings {
        api_key: secret("GEMINI_API_KEY"),
        base_url: get("GEMINI_BASE_URL")
          .unwrap_or_else(|| "https://generativelanguage.googleapis.com/v1beta/openai".into()),
        model: get("GEMINI_MODEL").unwrap_or_else(|| "gemini-2.5-flash".into()),
      },
      default_provider,
      generation_timeout: Duration::from_secs(timeout_secs),
      max_article_tokens,
      exam_config_path: get("EXAM_CONFIG_PATH").map(PathBuf::from),
    }
  }
}

fn parse_or_warn<T: std::str::FromStr>(key: &str, raw: &str) -> Option<T> {
  match raw.parse::<T>() {
    Ok(v) => Some(v),
    Err(_) => {
      warn!(target: "exam_article_backend", %key, value = %raw, "Ignoring unparsable setting; using default");
      None
    }
  }
}

/// The read-only exam table, in document order.
#[derive(Clone, Debug)]
pub struct ExamCatalog {
  exams: Vec<ExamDefinition>,
}

#[derive(Deserialize)]
struct CatalogFile {
  exams: Vec<ExamDefinition>,
}

impl ExamCatalog {
  pub fn builtin() -> Result<Self, ConfigError> {
    Self::from_toml_str(BUILTIN_EXAMS, "builtin")
  }

  pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
    let raw = std::fs::read_to_string(path)
      .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
    Self::from_toml_str(&raw, &path.display().to_string())
  }

  /// Load from EXAM_CONFIG_PATH when set, otherwise the built-in catalog.
  pub fn load(settings: &Settings) -> Result<Self, ConfigError> {
    let catalog = match &settings.exam_config_path {
      Some(path) => Self::from_path(path)?,
      None => Self::builtin()?,
    };
    let origin = settings
      .exam_config_path
      .as_ref()
      .map(|p| p.display().to_string())
      .unwrap_or_else(|| "builtin".into());
    info!(target: "exam_article_backend", %origin, exam_types = ?catalog.codes(), "Loaded exam catalog");
    Ok(catalog)
  }

  pub fn from_toml_str(raw: &str, origin: &str) -> Result<Self, ConfigError> {
    let file: CatalogFile = toml::from_str(raw)
      .map_err(|source| ConfigError::Parse { origin: origin.to_string(), source })?;
    check_exams(&file.exams).map_err(|message| ConfigError::Invalid { origin: origin.to_string(), message })?;
    Ok(Self { exams: file.exams })
  }

  pub fn get(&self, code: &str) -> Option<&ExamDefinition> {
    self.exams.iter().find(|e| e.code == code)
  }

  pub fn codes(&self) -> Vec<String> {
    self.exams.iter().map(|e| e.code.clone()).collect()
  }

  pub fn iter(&self) -> impl Iterator<Item = &ExamDefinition> {
    self.exams.iter()
  }
}

fn check_exams(exams: &[ExamDefinition]) -> Result<(), String> {
  if exams.is_empty() {
    return Err("no exam types defined".into());
  }
  let mut seen = HashSet::new();
  for e in exams {
    if e.code.trim().is_empty() {
      return Err("exam with empty code".into());
    }
    if e.code != e.code.trim().to_uppercase() {
      return Err(format!("{}: exam codes must be upper-case without surrounding spaces", e.code));
    }
    if !seen.insert(e.code.as_str()) {
      return Err(format!("{}: duplicate exam code", e.code));
    }
    if e.topics.is_empty() {
      return Err(format!("{}: topics must not be empty", e.code));
    }
    if e.difficulties.is_empty() {
      return Err(format!("{}: difficulties must not be empty", e.code));
    }
    let rules = &e.validation_rules;
    if rules.word_count_min > rules.word_count_max {
      return Err(format!(
        "{}: word_count_min {} exceeds word_count_max {}",
        e.code, rules.word_count_min, rules.word_count_max
      ));
    }
    for (label, words) in &e.default_word_count {
      if !e.has_difficulty(label) {
        return Err(format!("{}: default_word_count has undeclared difficulty '{}'", e.code, label));
      }
      if *words < rules.word_count_min || *words > rules.word_count_max {
        return Err(format!(
          "{}: default word count {} for '{}' is outside {}-{}",
          e.code, words, label, rules.word_count_min, rules.word_count_max
        ));
      }
    }
    let range = &e.score_range;
    if range.min > range.max || range.step <= 0.0 {
      return Err(format!("{}: invalid score_range {}-{} step {}", e.code, range.min, range.max, range.step));
    }
    for label in &e.difficulties {
      if let Ok(score) = label.parse::<f64>() {
        if score < range.min || score > range.max {
          return Err(format!(
            "{}: difficulty '{}' lies outside score range {}-{}",
            e.code, label, range.min, range.max
          ));
        }
      }
    }
  }
  Ok(())
}
