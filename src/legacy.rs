//! Single-scalar understanding level with bounded drift per turn.
//!
//! The judge suggests an absolute score; we only let the level move inside
//! `[current - max_decrease, current + max_increase]` for the active tier, then clamp
//! to [0, 100]. Upward moves are large and downward moves are small, so one weak
//! answer cannot erase demonstrated mastery.

use std::sync::{Arc, OnceLock};

use regex::Regex;
use tracing::{debug, error, info, instrument, warn};

use crate::config::Prompts;
use crate::domain::{Difficulty, Role, Turn};
use crate::judge::{CallOptions, Judge};
use crate::util::{fill_template, preview};

/// How many trailing turns are shown to the judge.
const RECENT_TURNS: usize = 6;
const RECENT_PREVIEW_CHARS: usize = 100;

#[derive(Clone)]
pub struct LegacyLevelScorer {
  judge: Arc<dyn Judge>,
  prompts: Arc<Prompts>,
}

impl LegacyLevelScorer {
  pub fn new(judge: Arc<dyn Judge>, prompts: Arc<Prompts>) -> Self {
    Self { judge, prompts }
  }

  /// New level after this turn. Returns `current_level` untouched when the judge
  /// fails or its reply carries no score marker.
  #[instrument(
    target = "assessment",
    level = "info",
    skip(self, topic, difficulty, current_level, student_reply, history),
    fields(judge = %self.judge.name(), %difficulty, current_level = current_level, history_len = history.len())
  )]
  pub async fn evaluate(
    &self,
    topic: &str,
    difficulty: Difficulty,
    current_level: u32,
    student_reply: &str,
    history: &[Turn],
  ) -> u32 {
    let current_level = current_level.min(100);
    let user = self.build_prompt(topic, difficulty, current_level, student_reply, history);

    let raw = match self
      .judge
      .complete(&self.prompts.legacy_level_system, &user, CallOptions::LEGACY_LEVEL)
      .await
    {
      Ok(raw) => raw,
      Err(e) => {
        error!(target: "assessment", error = %e, current_level, "Legacy level call failed; keeping current level");
        return current_level;
      }
    };

    let Some(suggested) = parse_score_marker(&raw) else {
      warn!(target: "assessment", current_level, "No score marker in judge reply; keeping current level");
      return current_level;
    };

    let level = bounded_level(current_level, suggested, difficulty);
    info!(target: "assessment", %difficulty, suggested, previous = current_level, level, "Legacy level updated");
    level
  }

  fn build_prompt(
    &self,
    topic: &str,
    difficulty: Difficulty,
    current_level: u32,
    student_reply: &str,
    history: &[Turn],
  ) -> String {
    let profile = difficulty.profile();
    let history_block = recent_history(history);
    fill_template(
      &self.prompts.legacy_level_user_template,
      &[
        ("topic", topic),
        ("difficulty", difficulty.as_str()),
        ("level_desc", profile.level_desc),
        ("current_level", &current_level.to_string()),
        ("history", &history_block),
        ("student_reply", student_reply),
        ("max_increase", &profile.max_increase.to_string()),
        ("max_decrease", &profile.max_decrease.to_string()),
        ("completion_criteria", profile.completion_criteria),
      ],
    )
  }
}

/// Excerpt of the last few turns. A single message is not worth a history block.
fn recent_history(history: &[Turn]) -> String {
  if history.len() <= 1 {
    return String::new();
  }
  let start = history.len().saturating_sub(RECENT_TURNS);
  let mut out = String::from("\n# Conversation so far (for reference):\n");
  for (i, msg) in history[start..].iter().enumerate() {
    let who = match msg.role {
      Role::User => "Student",
      Role::Assistant => "Tutor",
    };
    out.push_str(&format!("{}. {}: {}\n", i + 1, who, preview(&msg.content, RECENT_PREVIEW_CHARS)));
  }
  out
}

fn score_marker() -> &'static Regex {
  static MARKER: OnceLock<Regex> = OnceLock::new();
  MARKER.get_or_init(|| {
    Regex::new(r"(?i)(?:점수|score)\s*:\s*([0-9]+)").expect("score marker pattern is valid")
  })
}

/// Pull the judge's suggested score out of free text.
///
/// Contract: the first `점수: <N>` (or `score: <N>`, any case) marker wins, where `N`
/// is a run of ASCII digits. Returns `None` when no marker is present. Numbers too
/// large for a `u32` saturate; `bounded_level` then pulls them into range.
pub fn parse_score_marker(text: &str) -> Option<u32> {
  let caps = score_marker().captures(text)?;
  // Only ASCII digits match, so parsing can fail on overflow alone.
  Some(caps.get(1)?.as_str().parse::<u32>().unwrap_or(u32::MAX))
}

/// Apply the tier's drift window, then the absolute [0, 100] range.
pub fn bounded_level(current_level: u32, suggested: u32, difficulty: Difficulty) -> u32 {
  let profile = difficulty.profile();
  let floor = current_level.saturating_sub(profile.max_decrease);
  let ceiling = current_level + profile.max_increase;
  let level = suggested.clamp(floor, ceiling).min(100);
  debug!(target: "assessment", floor, ceiling, suggested, level, "Drift window applied");
  level
}

/// Stage label and encouragement for a legacy level.
pub fn progress_feedback(level: u32) -> String {
  let (stage, message) = match level {
    0..=20 => ("Getting started", "You've just begun exploring. Let's discover it together!"),
    21..=40 => ("Basic understanding", "A basic understanding is forming. Shall we go deeper?"),
    41..=60 => ("Beginner", "You understand the concept well. Look for connections!"),
    61..=80 => ("Intermediate", "Great understanding! Try some critical thinking."),
    _ => ("Advanced", "You're showing expert-level understanding!"),
  };
  format!("{}: {}", stage, message)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::judge::testing::{FailingJudge, ScriptedJudge};

  fn scorer(judge: Arc<dyn Judge>) -> LegacyLevelScorer {
    LegacyLevelScorer::new(judge, Arc::new(Prompts::default()))
  }

  #[tokio::test]
  async fn normal_tier_caps_jump_and_drop() {
    let up = scorer(Arc::new(ScriptedJudge::always("점수: 100\n근거: excellent")))
      .evaluate("photosynthesis", Difficulty::Normal, 50, "answer", &[])
      .await;
    assert_eq!(up, 100);

    let down = scorer(Arc::new(ScriptedJudge::always("점수: 0\n근거: wrong")))
      .evaluate("photosynthesis", Difficulty::Normal, 50, "answer", &[])
      .await;
    assert_eq!(down, 45);
  }

  #[tokio::test]
  async fn upward_jump_is_limited_by_tier() {
    let judge = Arc::new(ScriptedJudge::always("점수: 95"));
    assert_eq!(scorer(judge.clone()).evaluate("t", Difficulty::Easy, 10, "a", &[]).await, 70);
    assert_eq!(scorer(judge.clone()).evaluate("t", Difficulty::Normal, 10, "a", &[]).await, 60);
    assert_eq!(scorer(judge).evaluate("t", Difficulty::Hard, 10, "a", &[]).await, 50);
  }

  #[tokio::test]
  async fn downward_drift_is_limited_by_tier() {
    let judge = Arc::new(ScriptedJudge::always("score: 0"));
    assert_eq!(scorer(judge.clone()).evaluate("t", Difficulty::Easy, 80, "a", &[]).await, 77);
    assert_eq!(scorer(judge.clone()).evaluate("t", Difficulty::Hard, 80, "a", &[]).await, 73);
    assert_eq!(scorer(judge).evaluate("t", Difficulty::Normal, 2, "a", &[]).await, 0);
  }

  #[tokio::test]
  async fn overflowing_suggestion_moves_to_the_ceiling() {
    let judge = Arc::new(ScriptedJudge::always("점수: 123456789012345678901234567890"));
    assert_eq!(scorer(judge).evaluate("t", Difficulty::Hard, 30, "a", &[]).await, 70);
  }

  #[tokio::test]
  async fn placeholders_inside_history_are_kept_verbatim() {
    let history = vec![Turn::assistant("what is {max_increase}?"), Turn::user("maybe {current_level}")];
    let judge = Arc::new(ScriptedJudge::always("점수: 40"));
    scorer(judge.clone()).evaluate("t", Difficulty::Normal, 30, "a", &history).await;
    let prompt = &judge.user_prompts()[0];
    assert!(prompt.contains("1. Tutor: what is {max_increase}?"));
    assert!(prompt.contains("2. Student: maybe {current_level}"));
  }

  #[tokio::test]
  async fn missing_marker_keeps_level() {
    let judge = Arc::new(ScriptedJudge::always("The student did well overall."));
    assert_eq!(scorer(judge).evaluate("t", Difficulty::Normal, 37, "a", &[]).await, 37);
  }

  #[tokio::test]
  async fn judge_failure_keeps_level() {
    assert_eq!(scorer(Arc::new(FailingJudge)).evaluate("t", Difficulty::Hard, 64, "a", &[]).await, 64);
  }

  #[tokio::test]
  async fn unknown_difficulty_behaves_like_normal() {
    let judge = Arc::new(ScriptedJudge::always("점수: 100"));
    let odd = scorer(judge.clone()).evaluate("t", Difficulty::parse("extreme"), 20, "a", &[]).await;
    let normal = scorer(judge).evaluate("t", Difficulty::Normal, 20, "a", &[]).await;
    assert_eq!(odd, normal);
    assert_eq!(odd, 70);
  }

  #[tokio::test]
  async fn prompt_shows_only_recent_turns() {
    let history: Vec<Turn> = (0..10)
      .map(|i| if i % 2 == 0 { Turn::assistant(format!("q{i}")) } else { Turn::user(format!("a{i}")) })
      .collect();
    let judge = Arc::new(ScriptedJudge::always("점수: 40"));
    scorer(judge.clone()).evaluate("t", Difficulty::Normal, 30, "a9", &history).await;
    let prompt = &judge.user_prompts()[0];
    assert!(!prompt.contains("Tutor: q2\n"));
    assert!(prompt.contains("1. Tutor: q4"));
    assert!(prompt.contains("6. Student: a9"));
    assert!(prompt.contains("Current understanding: 30 points"));
  }

  #[test]
  fn marker_parsing() {
    assert_eq!(parse_score_marker("점수: 72\n근거: good"), Some(72));
    assert_eq!(parse_score_marker("점수:88"), Some(88));
    assert_eq!(parse_score_marker("Score : 15"), Some(15));
    assert_eq!(parse_score_marker("rationale first\n점수: 9 then 점수: 99"), Some(9));
    assert_eq!(parse_score_marker("점수: high"), None);
    assert_eq!(parse_score_marker("no marker 77"), None);
    assert_eq!(parse_score_marker("점수: 99999999999999"), Some(u32::MAX));
    assert_eq!(parse_score_marker("점수: ٧٢"), None);
  }

  #[test]
  fn bounded_level_clamps_to_absolute_range() {
    assert_eq!(bounded_level(90, 100, Difficulty::Normal), 100);
    assert_eq!(bounded_level(90, 250, Difficulty::Easy), 100);
    assert_eq!(bounded_level(3, 0, Difficulty::Hard), 0);
    assert_eq!(bounded_level(50, 52, Difficulty::Normal), 52);
  }

  #[test]
  fn progress_bands() {
    assert!(progress_feedback(0).starts_with("Getting started"));
    assert!(progress_feedback(40).starts_with("Basic understanding"));
    assert!(progress_feedback(60).starts_with("Beginner"));
    assert!(progress_feedback(80).starts_with("Intermediate"));
    assert!(progress_feedback(81).starts_with("Advanced"));
  }
}
