//! In-memory score records, one per (message, student, session).
//!
//! Stands in for the database-backed store; records are append-only and read back
//! newest first for reporting.

use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::domain::DimensionSet;
use crate::scoring::EvaluationResult;

#[derive(Clone, Debug, Serialize)]
pub struct ScoreRecord {
  pub id: String,
  pub session_id: String,
  pub student_id: String,
  pub message_id: String,
  pub overall_score: u32,
  pub dimensions: DimensionSet,
  pub is_completed: bool,
  pub evaluation: EvaluationResult,
  pub created_at: DateTime<Utc>,
}

#[derive(Clone, Default)]
pub struct ScoreStore {
  by_session: Arc<RwLock<HashMap<String, Vec<ScoreRecord>>>>,
}

impl ScoreStore {
  pub fn new() -> Self {
    Self::default()
  }

  #[instrument(target = "scores", level = "debug", skip(self, evaluation))]
  pub async fn save(
    &self,
    session_id: &str,
    student_id: &str,
    message_id: &str,
    evaluation: &EvaluationResult,
  ) -> ScoreRecord {
    let record = ScoreRecord {
      id: Uuid::new_v4().to_string(),
      session_id: session_id.to_string(),
      student_id: student_id.to_string(),
      message_id: message_id.to_string(),
      overall_score: evaluation.overall_score(),
      dimensions: *evaluation.dimensions(),
      is_completed: evaluation.is_completed(),
      evaluation: evaluation.clone(),
      created_at: Utc::now(),
    };
    self
      .by_session
      .write()
      .await
      .entry(session_id.to_string())
      .or_default()
      .push(record.clone());
    debug!(target: "scores", id = %record.id, overall = record.overall_score, "Score record saved");
    record
  }

  /// All records of one student in a session, newest first.
  pub async fn student_scores(&self, session_id: &str, student_id: &str) -> Vec<ScoreRecord> {
    let by_session = self.by_session.read().await;
    by_session
      .get(session_id)
      .map(|records| {
        records
          .iter()
          .rev()
          .filter(|r| r.student_id == student_id)
          .cloned()
          .collect()
      })
      .unwrap_or_default()
  }

  /// All records of a session, newest first.
  pub async fn session_scores(&self, session_id: &str) -> Vec<ScoreRecord> {
    let by_session = self.by_session.read().await;
    by_session
      .get(session_id)
      .map(|records| records.iter().rev().cloned().collect())
      .unwrap_or_default()
  }

  pub async fn latest_for_student(&self, session_id: &str, student_id: &str) -> Option<ScoreRecord> {
    let by_session = self.by_session.read().await;
    by_session
      .get(session_id)?
      .iter()
      .rev()
      .find(|r| r.student_id == student_id)
      .cloned()
  }
}
