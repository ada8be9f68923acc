//! The external model boundary.
//!
//! Scorers and the tutor only see `dyn Judge`; the OpenAI client is one implementation,
//! `DisabledJudge` is used when no API key is configured, and tests plug in scripted ones.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{Role, Turn};

#[derive(Debug, Error)]
pub enum JudgeError {
  #[error("no model provider configured")]
  Disabled,
  #[error("transport error: {0}")]
  Http(String),
  #[error("provider returned HTTP {status}: {message}")]
  Status { status: u16, message: String },
  #[error("could not decode provider response: {0}")]
  Decode(String),
  #[error("provider returned an empty completion")]
  EmptyCompletion,
}

/// Sampling knobs for a single call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CallOptions {
  pub temperature: f32,
  pub max_tokens: Option<u32>,
  /// Ask the provider for a JSON object response when it supports it.
  pub json_object: bool,
}

impl CallOptions {
  pub const ASSESSMENT: CallOptions = CallOptions { temperature: 0.3, max_tokens: Some(800), json_object: true };
  pub const LEGACY_LEVEL: CallOptions = CallOptions { temperature: 0.3, max_tokens: Some(200), json_object: false };
  pub const TOPIC_CHECK: CallOptions = CallOptions { temperature: 0.1, max_tokens: Some(10), json_object: false };
  pub const TUTOR_OPENING: CallOptions = CallOptions { temperature: 0.7, max_tokens: Some(300), json_object: false };
  pub const TUTOR_REPLY: CallOptions = CallOptions { temperature: 0.7, max_tokens: Some(400), json_object: false };
}

#[async_trait]
pub trait Judge: Send + Sync {
  /// Single system + user exchange; returns the raw completion text.
  async fn complete(&self, system: &str, user: &str, opts: CallOptions) -> Result<String, JudgeError>;

  /// Multi-turn exchange. Providers without native chat get a flattened transcript.
  async fn converse(&self, system: &str, turns: &[Turn], opts: CallOptions) -> Result<String, JudgeError> {
    let transcript = turns
      .iter()
      .map(|t| match t.role {
        Role::User => format!("Student: {}", t.content),
        Role::Assistant => format!("Tutor: {}", t.content),
      })
      .collect::<Vec<_>>()
      .join("\n");
    self.complete(system, &transcript, opts).await
  }

  /// Label used in logs.
  fn name(&self) -> &str;
}

/// Stand-in when no provider is configured. Every call fails fast, so callers land on
/// their local fallbacks.
pub struct DisabledJudge;

#[async_trait]
impl Judge for DisabledJudge {
  async fn complete(&self, _system: &str, _user: &str, _opts: CallOptions) -> Result<String, JudgeError> {
    Err(JudgeError::Disabled)
  }

  fn name(&self) -> &str { "disabled" }
}


#[cfg(test)]
mod tests {
  use super::testing::ScriptedJudge;
  use super::*;

  #[tokio::test]
  async fn disabled_judge_always_errors() {
    let err = DisabledJudge.complete("s", "u", CallOptions::ASSESSMENT).await.unwrap_err();
    assert!(matches!(err, JudgeError::Disabled));
  }

  #[tokio::test]
  async fn default_converse_flattens_turns() {
    let judge = ScriptedJudge::always("ok");
    let turns = vec![Turn::assistant("What is light?"), Turn::user("Energy?")];
    let out = judge.converse("sys", &turns, CallOptions::TUTOR_REPLY).await.unwrap();
    assert_eq!(out, "ok");
    assert_eq!(judge.user_prompts(), vec!["Tutor: What is light?\nStudent: Energy?".to_string()]);
  }
}
