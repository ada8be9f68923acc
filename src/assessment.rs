//! Five-dimension Socratic assessment.
//!
//! Flow:
//! 1) Render the WHOLE conversation (every tutor question and student answer, each
//!    previewed) so the judge scores the trajectory, not a single exchange.
//! 2) One judge call with the fixed instruction block and the rendered context.
//! 3) Strict typed parse of the judge's JSON; dimension values are clamped to [0, 100].
//! 4) Overall score and completion are derived locally (see `scoring`).
//!
//! Any failure in 2) or 3) yields `EvaluationResult::fallback()`. There is no
//! anti-regression floor here; steady growth is requested from the judge in the prompt.

use std::sync::Arc;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use thiserror::Error;
use tracing::{debug, error, info, instrument};

use crate::config::Prompts;
use crate::domain::{Difficulty, Dimension, DimensionSet, Insights, Role, Turn};
use crate::judge::{CallOptions, Judge, JudgeError};
use crate::scoring::EvaluationResult;
use crate::util::{fill_template, preview, trunc_for_log};

/// Per-message preview length inside the rendered conversation.
pub const TURN_PREVIEW_CHARS: usize = 200;

#[derive(Debug, Error)]
pub enum AssessmentError {
  #[error("judge call failed: {0}")]
  Judge(#[from] JudgeError),
  #[error("judge output does not match the evaluation schema: {0}")]
  MalformedOutput(#[from] serde_json::Error),
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawDimensions {
  #[serde(deserialize_with = "saturating_score")]
  depth: i64,
  #[serde(deserialize_with = "saturating_score")]
  breadth: i64,
  #[serde(deserialize_with = "saturating_score")]
  application: i64,
  #[serde(deserialize_with = "saturating_score")]
  metacognition: i64,
  #[serde(deserialize_with = "saturating_score")]
  engagement: i64,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawEvaluation {
  dimensions: RawDimensions,
  insights: Insights,
  growth_indicators: Vec<String>,
  next_focus: String,
}

/// Integer scores only. Integers too large for `i64` (which serde_json hands over as
/// whole floats) saturate so they still clamp; fractional values are rejected.
fn saturating_score<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
  let n = serde_json::Number::deserialize(deserializer)?;
  if let Some(v) = n.as_i64() {
    return Ok(v);
  }
  if n.as_u64().is_some() {
    return Ok(i64::MAX);
  }
  match n.as_f64() {
    Some(f) if f.fract() == 0.0 && f >= i64::MAX as f64 => Ok(i64::MAX),
    Some(f) if f.fract() == 0.0 && f <= i64::MIN as f64 => Ok(i64::MIN),
    _ => Err(D::Error::custom(format!("expected an integer score, got {}", n))),
  }
}

#[derive(Clone)]
pub struct DimensionScorer {
  judge: Arc<dyn Judge>,
  prompts: Arc<Prompts>,
}

impl DimensionScorer {
  pub fn new(judge: Arc<dyn Judge>, prompts: Arc<Prompts>) -> Self {
    Self { judge, prompts }
  }

  /// Score one turn. Never fails: judge or parse problems produce the fixed fallback.
  #[instrument(
    target = "assessment",
    level = "info",
    skip(self, topic, difficulty, student_reply, tutor_reply, history),
    fields(judge = %self.judge.name(), %difficulty, history_len = history.len(), reply_len = student_reply.len())
  )]
  pub async fn evaluate(
    &self,
    topic: &str,
    difficulty: Difficulty,
    student_reply: &str,
    tutor_reply: &str,
    history: &[Turn],
  ) -> EvaluationResult {
    match self.try_evaluate(topic, difficulty, student_reply, tutor_reply, history).await {
      Ok(result) => {
        info!(
          target: "assessment",
          overall = result.overall_score(),
          completed = result.is_completed(),
          "Five-dimension evaluation complete"
        );
        result
      }
      Err(e) => {
        error!(target: "assessment", error = %e, "Evaluation failed; using default evaluation");
        EvaluationResult::fallback()
      }
    }
  }

  async fn try_evaluate(
    &self,
    topic: &str,
    difficulty: Difficulty,
    student_reply: &str,
    tutor_reply: &str,
    history: &[Turn],
  ) -> Result<EvaluationResult, AssessmentError> {
    let user = self.build_user_prompt(topic, difficulty, student_reply, tutor_reply, history);
    let raw = self
      .judge
      .complete(&self.prompts.assessment_system, &user, CallOptions::ASSESSMENT)
      .await?;
    debug!(target: "assessment", raw = %trunc_for_log(&raw, 200), "Judge evaluation received");
    parse_evaluation(&raw, difficulty)
  }

  fn build_user_prompt(
    &self,
    topic: &str,
    difficulty: Difficulty,
    student_reply: &str,
    tutor_reply: &str,
    history: &[Turn],
  ) -> String {
    let turn_count = history.iter().filter(|t| t.role == Role::User).count().to_string();
    let conversation = conversation_summary(history);
    fill_template(
      &self.prompts.assessment_user_template,
      &[
        ("topic", topic),
        ("difficulty", difficulty.as_str()),
        ("turn_count", &turn_count),
        ("conversation", &conversation),
        ("tutor_reply", tutor_reply),
        ("student_reply", student_reply),
      ],
    )
  }
}

/// Render every prior turn, numbered from each tutor question.
pub fn conversation_summary(history: &[Turn]) -> String {
  if history.is_empty() {
    return "The conversation has not started yet.".into();
  }
  let mut turn = 0usize;
  let mut parts = Vec::with_capacity(history.len());
  for msg in history {
    let body = preview(&msg.content, TURN_PREVIEW_CHARS);
    match msg.role {
      Role::Assistant => {
        turn += 1;
        parts.push(format!("[Turn {} - tutor question]\n{}", turn, body));
      }
      Role::User => parts.push(format!("[Turn {} - student answer]\n{}", turn, body)),
    }
  }
  parts.join("\n\n")
}

/// Strictly decode the judge's JSON and derive the result for `difficulty`.
pub fn parse_evaluation(raw: &str, difficulty: Difficulty) -> Result<EvaluationResult, AssessmentError> {
  let parsed: RawEvaluation = serde_json::from_str(raw.trim())?;
  let d = &parsed.dimensions;
  let raw = [d.depth, d.breadth, d.application, d.metacognition, d.engagement];
  for (dim, v) in Dimension::ALL.iter().zip(raw) {
    if !(0..=100).contains(&v) {
      debug!(target: "assessment", dimension = dim.key(), value = v, "Out-of-range dimension value clamped");
    }
  }
  let dimensions = DimensionSet::clamped(d.depth, d.breadth, d.application, d.metacognition, d.engagement);
  Ok(EvaluationResult::derive(
    dimensions,
    difficulty.profile(),
    parsed.insights,
    parsed.growth_indicators,
    parsed.next_focus,
  ))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::judge::testing::{FailingJudge, ScriptedJudge};

  fn judge_json(d: [i64; 5]) -> String {
    serde_json::json!({
      "dimensions": {
        "depth": d[0], "breadth": d[1], "application": d[2], "metacognition": d[3], "engagement": d[4]
      },
      "insights": {
        "depth": "d", "breadth": "b", "application": "a", "metacognition": "m", "engagement": "e"
      },
      "growth_indicators": ["asks why"],
      "next_focus": "connect to daily life"
    })
    .to_string()
  }

  fn scorer(judge: Arc<dyn Judge>) -> DimensionScorer {
    DimensionScorer::new(judge, Arc::new(Prompts::default()))
  }

  #[tokio::test]
  async fn first_turn_scenario_rounds_half_up() {
    let judge = Arc::new(ScriptedJudge::always(judge_json([10, 10, 10, 5, 20])));
    let r = scorer(judge.clone())
      .evaluate("photosynthesis", Difficulty::Normal, "I don't know", "What do plants need?", &[])
      .await;
    assert_eq!(r.overall_score(), 11);
    assert!(!r.is_completed());
    assert_eq!(r.next_focus(), "connect to daily life");
    let prompt = &judge.user_prompts()[0];
    assert!(prompt.contains("photosynthesis"));
    assert!(prompt.contains("Conversation turns: 0"));
    assert!(prompt.contains("has not started"));
  }

  #[tokio::test]
  async fn out_of_range_values_are_clamped() {
    let judge = Arc::new(ScriptedJudge::always(judge_json([140, -20, 100, 0, 101])));
    let r = scorer(judge).evaluate("t", Difficulty::Easy, "x", "y", &[]).await;
    let d = r.dimensions();
    assert_eq!(d.get(Dimension::Depth), 100);
    assert_eq!(d.get(Dimension::Breadth), 0);
    assert_eq!(d.get(Dimension::Engagement), 100);
    // 25 + 0 + 20 + 0 + 15
    assert_eq!(r.overall_score(), 60);
  }

  #[tokio::test]
  async fn integers_beyond_i64_still_clamp() {
    let raw = judge_json([0, 0, 0, 0, 0])
      .replace("\"depth\":0", "\"depth\":100000000000000000000")
      .replace("\"breadth\":0", "\"breadth\":-100000000000000000000")
      .replace("\"application\":0", "\"application\":18446744073709551615");
    let r = scorer(Arc::new(ScriptedJudge::always(raw))).evaluate("t", Difficulty::Normal, "x", "y", &[]).await;
    let d = r.dimensions();
    assert_eq!(d.get(Dimension::Depth), 100);
    assert_eq!(d.get(Dimension::Breadth), 0);
    assert_eq!(d.get(Dimension::Application), 100);
    assert_ne!(r, EvaluationResult::fallback());
  }

  #[tokio::test]
  async fn placeholders_inside_conversation_text_are_kept_verbatim() {
    let history = vec![
      Turn::assistant("what does f\"{student_reply}\" print?"),
      Turn::user("it prints {tutor_reply} and {topic}"),
    ];
    let judge = Arc::new(ScriptedJudge::always(judge_json([50, 50, 50, 50, 50])));
    scorer(judge.clone())
      .evaluate("python", Difficulty::Normal, "LATEST", "NEWQ", &history)
      .await;
    let prompt = &judge.user_prompts()[0];
    assert!(prompt.contains("what does f\"{student_reply}\" print?"));
    assert!(prompt.contains("it prints {tutor_reply} and {topic}"));
    assert!(prompt.contains("Tutor's latest question: \"NEWQ\""));
    assert!(prompt.contains("Student's latest answer: \"LATEST\""));
  }

  #[tokio::test]
  async fn four_maxed_and_one_short_is_not_complete() {
    let judge = Arc::new(ScriptedJudge::always(judge_json([100, 100, 100, 59, 100])));
    let r = scorer(judge).evaluate("t", Difficulty::Normal, "x", "y", &[]).await;
    assert!(!r.is_completed());

    let judge = Arc::new(ScriptedJudge::always(judge_json([100, 100, 100, 60, 100])));
    let r = scorer(judge).evaluate("t", Difficulty::Normal, "x", "y", &[]).await;
    assert!(r.is_completed());
  }

  #[tokio::test]
  async fn judge_failure_yields_fixed_default() {
    let r = scorer(Arc::new(FailingJudge)).evaluate("t", Difficulty::Hard, "x", "y", &[]).await;
    assert_eq!(r, EvaluationResult::fallback());
  }

  #[tokio::test]
  async fn malformed_outputs_yield_fixed_default() {
    let bad = [
      "not json at all".to_string(),
      r#"{"dimensions":{"depth":50}}"#.to_string(),
      judge_json([1, 2, 3, 4, 5]).replace("\"engagement\":5", "\"engagement\":\"high\""),
      r#"{"dimensions":{"depth":1,"breadth":1,"application":1,"metacognition":1,"engagement":1,"curiosity":9},
          "insights":{"depth":"","breadth":"","application":"","metacognition":"","engagement":""},
          "growth_indicators":[],"next_focus":""}"#.to_string(),
      r#"{"dimensions":{"depth":72.5,"breadth":1,"application":1,"metacognition":1,"engagement":1},
          "insights":{"depth":"","breadth":"","application":"","metacognition":"","engagement":""},
          "growth_indicators":[],"next_focus":""}"#.to_string(),
      r#"{"dimensions":{"depth":72.0,"breadth":1,"application":1,"metacognition":1,"engagement":1},
          "insights":{"depth":"","breadth":"","application":"","metacognition":"","engagement":""},
          "growth_indicators":[],"next_focus":""}"#.to_string(),
      r#"{"dimensions":{"depth":1,"breadth":1,"application":1,"metacognition":1,"engagement":1},
          "insights":{"depth":"","breadth":"","application":"","metacognition":"","engagement":""},
          "growth_indicators":[],"next_focus":"","confidence":0.9}"#.to_string(),
    ];
    for raw in bad {
      let r = scorer(Arc::new(ScriptedJudge::always(raw.clone())))
        .evaluate("t", Difficulty::Normal, "x", "y", &[])
        .await;
      assert_eq!(r, EvaluationResult::fallback(), "input: {raw}");
    }
  }

  #[tokio::test]
  async fn unknown_difficulty_matches_normal() {
    let raw = judge_json([75, 70, 75, 60, 70]);
    let a = scorer(Arc::new(ScriptedJudge::always(raw.clone())))
      .evaluate("t", Difficulty::parse("impossible"), "x", "y", &[])
      .await;
    let b = scorer(Arc::new(ScriptedJudge::always(raw)))
      .evaluate("t", Difficulty::Normal, "x", "y", &[])
      .await;
    assert_eq!(a, b);
    assert!(a.is_completed());
  }

  #[tokio::test]
  async fn prompt_carries_the_full_trajectory() {
    let long_answer = "x".repeat(500);
    let history = vec![
      Turn::assistant("What do plants need to grow?"),
      Turn::user("Water and sunlight."),
      Turn::assistant("Why sunlight?"),
      Turn::user(long_answer.clone()),
    ];
    let judge = Arc::new(ScriptedJudge::always(judge_json([50, 50, 50, 50, 50])));
    scorer(judge.clone())
      .evaluate("photosynthesis", Difficulty::Normal, &long_answer, "Where does the energy go?", &history)
      .await;
    let prompt = &judge.user_prompts()[0];
    assert!(prompt.contains("[Turn 1 - tutor question]\nWhat do plants need to grow?"));
    assert!(prompt.contains("[Turn 1 - student answer]\nWater and sunlight."));
    assert!(prompt.contains("[Turn 2 - tutor question]\nWhy sunlight?"));
    assert!(prompt.contains(&format!("[Turn 2 - student answer]\n{}...", "x".repeat(200))));
    assert!(prompt.contains("Conversation turns: 2"));
  }

  #[tokio::test]
  async fn growing_trajectory_scores_do_not_regress() {
    let judge = Arc::new(ScriptedJudge::new([
      judge_json([20, 15, 10, 10, 30]),
      judge_json([35, 30, 25, 20, 45]),
      judge_json([55, 50, 45, 40, 60]),
      judge_json([78, 72, 76, 62, 75]),
    ]));
    let s = scorer(judge);
    let mut history = Vec::new();
    let mut last = 0;
    let answers = ["light?", "plants make sugar", "chlorophyll absorbs light", "so leaves are solar panels"];
    for (i, answer) in answers.iter().enumerate() {
      history.push(Turn::assistant(format!("question {i}")));
      history.push(Turn::user(*answer));
      let r = s.evaluate("photosynthesis", Difficulty::Normal, answer, "next?", &history).await;
      assert!(r.overall_score() >= last, "turn {i} regressed");
      last = r.overall_score();
      assert_eq!(r.is_completed(), i == answers.len() - 1);
    }
  }

  #[test]
  fn summary_numbers_turns_from_tutor_questions() {
    let history = vec![Turn::user("hi"), Turn::assistant("q1"), Turn::user("a1")];
    let s = conversation_summary(&history);
    assert_eq!(s, "[Turn 0 - student answer]\nhi\n\n[Turn 1 - tutor question]\nq1\n\n[Turn 1 - student answer]\na1");
  }
}
