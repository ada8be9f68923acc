//! Public protocol structs for the HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};

use crate::domain::{DimensionSet, Insights, Turn};
use crate::store::ScoreRecord;

#[derive(Debug, Deserialize)]
pub struct TopicValidateIn {
    pub topic_content: String,
    /// "text" today; "pdf" / "url" are reserved.
    #[serde(default)]
    pub content_type: Option<String>,
}
#[derive(Serialize)]
pub struct TopicValidateOut {
    pub valid: bool,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct InitialIn {
    pub topic: String,
    #[serde(default)]
    pub difficulty: Option<String>,
}
#[derive(Serialize)]
pub struct InitialOut {
    pub initial_message: String,
    pub understanding_score: u32,
}

#[derive(Debug, Deserialize)]
pub struct SocraticChatIn {
    pub topic: String,
    pub messages: Vec<Turn>,
    #[serde(default)]
    pub understanding_level: u32,
    #[serde(default)]
    pub difficulty: Option<String>,
    /// When session and student ids are both present the turn's score is recorded.
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub student_id: Option<String>,
    #[serde(default)]
    pub message_id: Option<String>,
}
#[derive(Serialize)]
pub struct SocraticChatOut {
    pub socratic_response: String,
    pub understanding_score: u32,
    pub is_completed: bool,
    pub dimensions: DimensionSet,
    pub insights: Insights,
    pub growth_indicators: Vec<String>,
    pub next_focus: String,
    pub feedback: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DimensionsIn {
    pub topic: String,
    pub student_reply: String,
    #[serde(default)]
    pub tutor_reply: String,
    #[serde(default)]
    pub history: Vec<Turn>,
    #[serde(default)]
    pub difficulty: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LevelIn {
    pub topic: String,
    pub student_reply: String,
    #[serde(default)]
    pub current_level: u32,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub history: Vec<Turn>,
}
#[derive(Serialize)]
pub struct LevelOut {
    pub level: u32,
    pub feedback: String,
}

#[derive(Debug, Deserialize)]
pub struct ScoresQuery {
    pub session_id: String,
    #[serde(default)]
    pub student_id: Option<String>,
}
#[derive(Serialize)]
pub struct ScoresOut {
    pub scores: Vec<ScoreRecord>,
}

#[derive(Debug, Deserialize)]
pub struct LatestScoreQuery {
    pub session_id: String,
    pub student_id: String,
}
#[derive(Serialize)]
pub struct LatestScoreOut {
    pub score: Option<ScoreRecord>,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}
