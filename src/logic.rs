//! The generation pipeline: validate → pick provider → resolve prompt → one LLM call → result.
//!
//! Validation and template failures return before the gateway is touched.

use std::time::Instant;

use chrono::Utc;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::domain::{ExamSummary, GenerationRequest, GenerationResult};
use crate::error::ApiError;
use crate::llm::CompletionRequest;
use crate::state::AppState;
use crate::templates::resolve;
use crate::util::count_words;
use crate::validator::validate;

const TEMPERATURE: f32 = 0.7;

#[instrument(
  level = "info",
  target = "generation",
  skip(state, req),
  fields(exam_type = %req.exam_type, topic = %req.topic, difficulty = %req.difficulty_score)
)]
pub async fn generate_article(state: &AppState, req: GenerationRequest) -> Result<GenerationResult, ApiError> {
  let validated = validate(&state.catalog, req)?;
  debug!(
    target: "generation",
    word_count = validated.word_count(),
    paragraph_count = validated.paragraph_count(),
    "Request validated"
  );

  let provider = state.resolve_provider(validated.llm_provider())?;
  let model = validated
    .model()
    .map(str::to_string)
    .unwrap_or_else(|| state.default_model(provider).to_string());

  let prompt = resolve(&validated)?;
  debug!(target: "generation", system_len = prompt.text.len(), user_len = prompt.user.len(), "Prompt resolved");

  let max_tokens = validated.word_count().saturating_mul(2).min(state.settings.max_article_tokens);
  let started = Instant::now();
  let completion = state
    .llm
    .generate(CompletionRequest {
      provider,
      model: &model,
      system: &prompt.text,
      user: &prompt.user,
      max_tokens,
      temperature: TEMPERATURE,
      timeout: state.settings.generation_timeout,
    })
    .await
    .map_err(|e| ApiError::from_llm(e, provider.as_str(), &model))?;
  let elapsed = started.elapsed();

  // Present in the catalog: validation above looked it up.
  let exam_info = state
    .catalog
    .get(validated.exam_type())
    .map(|e| ExamSummary { full_name: e.full_name.clone(), description: e.description.clone() })
    .unwrap_or_else(|| ExamSummary { full_name: validated.exam_type().to_string(), description: String::new() });

  let result = GenerationResult {
    generation_id: Uuid::new_v4().to_string(),
    actual_word_count: count_words(&completion.text),
    article: completion.text,
    exam_type: validated.exam_type().to_string(),
    topic: validated.topic().to_string(),
    difficulty_score: validated.difficulty_score().to_string(),
    target_word_count: validated.word_count(),
    paragraph_count: validated.paragraph_count(),
    style: validated.style().map(str::to_string),
    focus_points: validated.focus_points().to_vec(),
    llm_provider: provider.as_str().to_string(),
    model,
    generation_time_seconds: elapsed.as_secs_f64(),
    usage: completion.usage,
    generated_at: Utc::now(),
    exam_info,
  };

  info!(
    target: "generation",
    id = %result.generation_id,
    provider = %result.llm_provider,
    model = %result.model,
    target_words = result.target_word_count,
    actual_words = result.actual_word_count,
    total_tokens = result.usage.total_tokens,
    elapsed_ms = elapsed.as_millis() as u64,
    "Article generated"
  );
  Ok(result)
}

#[cfg(test)]
pub(crate) mod testing {
  //! Scripted gateway used by pipeline and router tests.

  use std::sync::atomic::{AtomicUsize, Ordering};
  use std::sync::{Arc, Mutex};

  use async_trait::async_trait;

  use crate::config::{ExamCatalog, Settings};
  use crate::domain::TokenUsage;
  use crate::llm::{Completion, CompletionRequest, LlmError, LlmGateway, Provider};
  use crate::state::AppState;

  pub enum Script {
    Reply(&'static str),
    Fail(fn() -> LlmError),
  }

  pub struct FakeGateway {
    pub calls: AtomicUsize,
    pub last_system: Mutex<Option<String>>,
    pub last_model: Mutex<Option<String>>,
    pub last_max_tokens: Mutex<Option<u32>>,
    script: Script,
  }

  impl FakeGateway {
    pub fn new(script: Script) -> Arc<Self> {
      Arc::new(Self {
        calls: AtomicUsize::new(0),
        last_system: Mutex::new(None),
        last_model: Mutex::new(None),
        last_max_tokens: Mutex::new(None),
        script,
      })
    }

    pub fn call_count(&self) -> usize {
      self.calls.load(Ordering::SeqCst)
    }
  }

  #[async_trait]
  impl LlmGateway for FakeGateway {
    async fn generate(&self, req: CompletionRequest<'_>) -> Result<Completion, LlmError> {
      self.calls.fetch_add(1, Ordering::SeqCst);
      *self.last_system.lock().unwrap() = Some(req.system.to_string());
      *self.last_model.lock().unwrap() = Some(req.model.to_string());
      *self.last_max_tokens.lock().unwrap() = Some(req.max_tokens);
      match &self.script {
        Script::Reply(text) => Ok(Completion {
          text: text.to_string(),
          usage: TokenUsage { prompt_tokens: 120, completion_tokens: 30, total_tokens: 150 },
        }),
        Script::Fail(make) => Err(make()),
      }
    }

    fn is_available(&self, _provider: Provider) -> bool {
      true
    }
  }

  pub fn state_with(fake: Arc<FakeGateway>) -> AppState {
    let settings = Settings::from_lookup(|_| None);
    AppState::new(settings, ExamCatalog::builtin().unwrap(), fake)
  }
}
