//! Core behaviors behind the HTTP handlers.
//!
//! This includes:
//!   - The two scoring entry points (five-dimension and legacy level)
//!   - The chat turn: tutor reply, then cumulative evaluation, then optional persistence
//!   - Topic screening and the opening message

use tracing::{info, instrument, warn};

use crate::domain::{Difficulty, Role, Turn};
use crate::error::{require_non_empty, ApiError};
use crate::scoring::EvaluationResult;
use crate::state::AppState;
use crate::store::ScoreRecord;

#[instrument(level = "info", skip(state, topic, student_reply, tutor_reply, history, difficulty), fields(%difficulty, history_len = history.len()))]
pub async fn evaluate_socratic_dimensions(
  state: &AppState,
  topic: &str,
  student_reply: &str,
  tutor_reply: &str,
  history: &[Turn],
  difficulty: &str,
) -> Result<EvaluationResult, ApiError> {
  require_non_empty("topic", topic)?;
  let difficulty = Difficulty::parse(difficulty);
  Ok(state.dimension_scorer.evaluate(topic, difficulty, student_reply, tutor_reply, history).await)
}

#[instrument(level = "info", skip(state, topic, student_reply, current_level, difficulty, history), fields(%difficulty, current_level = current_level, history_len = history.len()))]
pub async fn evaluate_understanding_level(
  state: &AppState,
  topic: &str,
  student_reply: &str,
  current_level: u32,
  difficulty: &str,
  history: &[Turn],
) -> Result<u32, ApiError> {
  require_non_empty("topic", topic)?;
  let difficulty = Difficulty::parse(difficulty);
  Ok(state.legacy_scorer.evaluate(topic, difficulty, current_level, student_reply, history).await)
}

/// Where a chat turn's score should be recorded.
#[derive(Debug, Clone)]
pub struct RecordTarget {
  pub session_id: String,
  pub student_id: String,
  pub message_id: String,
}

pub struct ChatTurnOutcome {
  pub reply: String,
  pub evaluation: EvaluationResult,
  pub record: Option<ScoreRecord>,
}

/// One dialogue step: generate the tutor's next question, then score the student's
/// latest answer against the whole conversation.
///
/// Callers must not run two turns for the same student concurrently; the cumulative
/// history is theirs, not ours.
#[instrument(level = "info", skip(state, topic, history, understanding_level, difficulty, target), fields(history_len = history.len(), understanding_level = understanding_level, difficulty = %difficulty.unwrap_or("normal")))]
pub async fn chat_turn(
  state: &AppState,
  topic: &str,
  history: &[Turn],
  understanding_level: u32,
  difficulty: Option<&str>,
  target: Option<RecordTarget>,
) -> Result<ChatTurnOutcome, ApiError> {
  require_non_empty("topic", topic)?;
  let difficulty = Difficulty::from_opt(difficulty);

  let reply = state.tutor.socratic_reply(topic, history, understanding_level).await;

  let last_user = history
    .iter()
    .rev()
    .find(|t| t.role == Role::User)
    .map(|t| t.content.as_str())
    .unwrap_or_default();
  if last_user.is_empty() {
    warn!(target: "assessment", "Chat turn without a student message; scoring an empty reply");
  }

  let evaluation = state
    .dimension_scorer
    .evaluate(topic, difficulty, last_user, &reply, history)
    .await;

  let record = match target {
    Some(t) => Some(state.scores.save(&t.session_id, &t.student_id, &t.message_id, &evaluation).await),
    None => None,
  };

  info!(
    target: "assessment",
    overall = evaluation.overall_score(),
    completed = evaluation.is_completed(),
    recorded = record.is_some(),
    "Chat turn scored"
  );
  Ok(ChatTurnOutcome { reply, evaluation, record })
}

#[instrument(level = "info", skip(state, topic), fields(topic_len = topic.len()))]
pub async fn validate_topic(state: &AppState, topic: &str) -> Result<(), ApiError> {
  require_non_empty("topic_content", topic)?;
  if state.tutor.validate_topic(topic).await {
    Ok(())
  } else {
    Err(ApiError::InvalidTopic)
  }
}

#[instrument(level = "info", skip(state, topic), fields(topic_len = topic.len()))]
pub async fn initial_message(state: &AppState, topic: &str) -> Result<String, ApiError> {
  require_non_empty("topic", topic)?;
  Ok(state.tutor.initial_message(topic).await)
}
