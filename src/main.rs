//! Exam Article Generator Backend
//!
//! - Axum HTTP API that produces exam-style reading passages
//! - Exam catalog from TOML (built in, or EXAM_CONFIG_PATH)
//! - OpenAI-compatible chat completions (OpenAI or Gemini)
//!
//! Important env variables:
//!   API_HOST             : bind address (default "0.0.0.0")
//!   PORT / API_PORT      : u16 (default 8000)
//!   OPENAI_API_KEY       : enables the OpenAI provider if present
//!   OPENAI_BASE_URL      : default "https://api.openai.com/v1"
//!   OPENAI_MODEL         : default "gpt-4o-mini"
//!   GEMINI_API_KEY       : enables the Gemini provider if present
//!   GEMINI_MODEL         : default "gemini-2.5-flash"
//!   DEFAULT_LLM_PROVIDER : "openai" (default) or "gemini"
//!   GENERATION_TIMEOUT   : seconds per LLM call (default 30)
//!   MAX_ARTICLE_TOKENS   : completion token cap (default 2000)
//!   EXAM_CONFIG_PATH     : path to an exam catalog TOML
//!   LOG_LEVEL            : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT           : "pretty" (default) or "json"

mod telemetry;
mod util;
mod domain;
mod error;
mod config;
mod validator;
mod templates;
mod llm;
mod state;
mod protocol;
mod logic;
mod routes;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::info;

use crate::config::{ExamCatalog, Settings};
use crate::llm::ChatCompletionsGateway;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  let settings = Settings::from_env();
  // A broken catalog stops startup here rather than failing per request.
  let catalog = ExamCatalog::load(&settings)?;
  let gateway = Arc::new(ChatCompletionsGateway::new(&settings)?);

  let addr: SocketAddr = format!("{}:{}", settings.host, settings.port)
    .parse()
    .unwrap_or_else(|_| SocketAddr::from(([0, 0, 0, 0], settings.port)));

  let state = Arc::new(AppState::new(settings, catalog, gateway));
  let app = build_router(state);

  let listener = TcpListener::bind(addr).await?;
  info!(target: "exam_article_backend", %addr, "HTTP server listening");
  axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
  info!(target: "exam_article_backend", "Server stopped");
  Ok(())
}

async fn shutdown_signal() {
  let ctrl_c = async {
    let _ = tokio::signal::ctrl_c().await;
  };

  #[cfg(unix)]
  let terminate = async {
    match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
      Ok(mut sig) => {
        sig.recv().await;
      }
      Err(_) => std::future::pending::<()>().await,
    }
  };
  #[cfg(not(unix))]
  let terminate = std::future::pending::<()>();

  tokio::select! {
    _ = ctrl_c => {},
    _ = terminate => {},
  }
  info!(target: "exam_article_backend", "Shutdown signal received");
}
