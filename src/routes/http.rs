//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented and logs parameters and basic result info.

use std::sync::Arc;
use axum::{extract::{State, Query}, Json, response::IntoResponse};
use tracing::{info, instrument};

use crate::error::ApiError;
use crate::legacy::progress_feedback;
use crate::logic::{self, RecordTarget};
use crate::protocol::*;
use crate::scoring::{dimension_feedback, EvaluationResult};
use crate::state::AppState;

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

#[instrument(level = "info", skip(state, body), fields(topic_len = body.topic_content.len(), content_type = ?body.content_type))]
pub async fn http_post_topic_validate(
  State(state): State<Arc<AppState>>,
  Json(body): Json<TopicValidateIn>,
) -> Result<Json<TopicValidateOut>, ApiError> {
  logic::validate_topic(&state, &body.topic_content).await?;
  Ok(Json(TopicValidateOut { valid: true, message: "Learning topic has been set.".into() }))
}

#[instrument(level = "info", skip(state, body), fields(topic_len = body.topic.len(), difficulty = ?body.difficulty))]
pub async fn http_post_chat_initial(
  State(state): State<Arc<AppState>>,
  Json(body): Json<InitialIn>,
) -> Result<Json<InitialOut>, ApiError> {
  let initial_message = logic::initial_message(&state, &body.topic).await?;
  Ok(Json(InitialOut { initial_message, understanding_score: 0 }))
}

#[instrument(level = "info", skip(state, body), fields(n_messages = body.messages.len(), session_id = ?body.session_id, student_id = ?body.student_id))]
pub async fn http_post_chat_socratic(
  State(state): State<Arc<AppState>>,
  Json(body): Json<SocraticChatIn>,
) -> Result<Json<SocraticChatOut>, ApiError> {
  let target = match (&body.session_id, &body.student_id) {
    (Some(session_id), Some(student_id)) => Some(RecordTarget {
      session_id: session_id.clone(),
      student_id: student_id.clone(),
      message_id: body.message_id.clone().unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
    }),
    _ => None,
  };

  let outcome = logic::chat_turn(
    &state,
    &body.topic,
    &body.messages,
    body.understanding_level,
    body.difficulty.as_deref(),
    target,
  )
  .await?;

  let ev = &outcome.evaluation;
  info!(target: "assessment", overall = ev.overall_score(), completed = ev.is_completed(), "HTTP chat turn served");
  Ok(Json(SocraticChatOut {
    socratic_response: outcome.reply.clone(),
    understanding_score: ev.overall_score(),
    is_completed: ev.is_completed(),
    dimensions: *ev.dimensions(),
    insights: ev.insights().clone(),
    growth_indicators: ev.growth_indicators().to_vec(),
    next_focus: ev.next_focus().to_string(),
    feedback: dimension_feedback(ev.dimensions()).to_string(),
    record_id: outcome.record.map(|r| r.id),
  }))
}

#[instrument(level = "info", skip(state, body), fields(history_len = body.history.len(), difficulty = ?body.difficulty))]
pub async fn http_post_assess_dimensions(
  State(state): State<Arc<AppState>>,
  Json(body): Json<DimensionsIn>,
) -> Result<Json<EvaluationResult>, ApiError> {
  let result = logic::evaluate_socratic_dimensions(
    &state,
    &body.topic,
    &body.student_reply,
    &body.tutor_reply,
    &body.history,
    body.difficulty.as_deref().unwrap_or("normal"),
  )
  .await?;
  Ok(Json(result))
}

#[instrument(level = "info", skip(state, body), fields(current_level = body.current_level, difficulty = ?body.difficulty))]
pub async fn http_post_assess_level(
  State(state): State<Arc<AppState>>,
  Json(body): Json<LevelIn>,
) -> Result<Json<LevelOut>, ApiError> {
  let level = logic::evaluate_understanding_level(
    &state,
    &body.topic,
    &body.student_reply,
    body.current_level,
    body.difficulty.as_deref().unwrap_or("normal"),
    &body.history,
  )
  .await?;
  Ok(Json(LevelOut { level, feedback: progress_feedback(level) }))
}

#[instrument(level = "info", skip(state), fields(session_id = %q.session_id, student_id = ?q.student_id))]
pub async fn http_get_scores(
  State(state): State<Arc<AppState>>,
  Query(q): Query<ScoresQuery>,
) -> impl IntoResponse {
  let scores = match &q.student_id {
    Some(student_id) => state.scores.student_scores(&q.session_id, student_id).await,
    None => state.scores.session_scores(&q.session_id).await,
  };
  info!(target: "scores", n = scores.len(), "HTTP scores served");
  Json(ScoresOut { scores })
}

#[instrument(level = "info", skip(state), fields(session_id = %q.session_id, student_id = %q.student_id))]
pub async fn http_get_latest_score(
  State(state): State<Arc<AppState>>,
  Query(q): Query<LatestScoreQuery>,
) -> impl IntoResponse {
  let score = state.scores.latest_for_student(&q.session_id, &q.student_id).await;
  Json(LatestScoreOut { score })
}
