//! The Socratic tutor voice: topic screening, opening question, and follow-up questions.
//! Every call has a canned fallback so the student always gets a reply.

use std::sync::Arc;

use tracing::{error, info, instrument};

use crate::config::Prompts;
use crate::domain::Turn;
use crate::judge::{CallOptions, Judge};
use crate::util::fill_template;

pub const FALLBACK_REPLY: &str = "Sorry, something went wrong for a moment. Could you say that again?";

#[derive(Clone)]
pub struct Tutor {
  judge: Arc<dyn Judge>,
  prompts: Arc<Prompts>,
}

impl Tutor {
  pub fn new(judge: Arc<dyn Judge>, prompts: Arc<Prompts>) -> Self {
    Self { judge, prompts }
  }

  /// Ask the model whether the topic is fit for a middle-school Socratic session.
  /// Anything other than a clear YES (including call failure) is a rejection.
  #[instrument(target = "tutor", level = "info", skip(self, topic), fields(topic_len = topic.len()))]
  pub async fn validate_topic(&self, topic: &str) -> bool {
    let user = fill_template(&self.prompts.topic_validation_template, &[("topic", topic)]);
    match self.judge.complete("", &user, CallOptions::TOPIC_CHECK).await {
      Ok(answer) => answer.trim().eq_ignore_ascii_case("yes"),
      Err(e) => {
        error!(target: "tutor", error = %e, "Topic validation failed; rejecting topic");
        false
      }
    }
  }

  #[instrument(target = "tutor", level = "info", skip(self, topic), fields(topic_len = topic.len()))]
  pub async fn initial_message(&self, topic: &str) -> String {
    let system = self.system_prompt(topic, 0);
    let user = fill_template(&self.prompts.tutor_opening_template, &[("topic", topic)]);
    match self.judge.complete(&system, &user, CallOptions::TUTOR_OPENING).await {
      Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
      Ok(_) => opening_fallback(topic),
      Err(e) => {
        error!(target: "tutor", error = %e, "Opening message generation failed; using fallback");
        opening_fallback(topic)
      }
    }
  }

  /// Next Socratic question given the conversation so far.
  #[instrument(target = "tutor", level = "info", skip(self, topic, history, understanding_level), fields(history_len = history.len(), understanding_level = understanding_level))]
  pub async fn socratic_reply(&self, topic: &str, history: &[Turn], understanding_level: u32) -> String {
    let system = self.system_prompt(topic, understanding_level);
    match self.judge.converse(&system, history, CallOptions::TUTOR_REPLY).await {
      Ok(text) if !text.trim().is_empty() => {
        info!(target: "tutor", reply_len = text.len(), "Tutor reply generated");
        text.trim().to_string()
      }
      Ok(_) => FALLBACK_REPLY.to_string(),
      Err(e) => {
        error!(target: "tutor", error = %e, "Tutor reply failed; using fallback");
        FALLBACK_REPLY.to_string()
      }
    }
  }

  fn system_prompt(&self, topic: &str, understanding_level: u32) -> String {
    fill_template(
      &self.prompts.tutor_system_template,
      &[
        ("topic", topic),
        ("understanding_level", &understanding_level.to_string()),
        ("approach", approach_for(understanding_level)),
      ],
    )
  }
}

/// Questioning strategy by current understanding.
pub fn approach_for(understanding_level: u32) -> &'static str {
  if understanding_level < 30 {
    "explore the basic concept with examples"
  } else if understanding_level < 70 {
    "connect and compare, ask deeper questions"
  } else {
    "creative application and synthesis"
  }
}

fn opening_fallback(topic: &str) -> String {
  format!("Hello! Shall we explore '{}' together today? First, what comes to mind when you think about this topic?", topic)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::judge::testing::{FailingJudge, ScriptedJudge};

  fn tutor(judge: Arc<dyn Judge>) -> Tutor {
    Tutor::new(judge, Arc::new(Prompts::default()))
  }

  #[tokio::test]
  async fn topic_validation_accepts_only_yes() {
    assert!(tutor(Arc::new(ScriptedJudge::always(" yes \n"))).validate_topic("fractions").await);
    assert!(!tutor(Arc::new(ScriptedJudge::always("NO"))).validate_topic("fractions").await);
    assert!(!tutor(Arc::new(ScriptedJudge::always("Yes, definitely"))).validate_topic("fractions").await);
    assert!(!tutor(Arc::new(FailingJudge)).validate_topic("fractions").await);
  }

  #[tokio::test]
  async fn opening_falls_back_with_topic() {
    let msg = tutor(Arc::new(FailingJudge)).initial_message("volcanoes").await;
    assert!(msg.contains("'volcanoes'"));
    let msg = tutor(Arc::new(ScriptedJudge::always("   "))).initial_message("volcanoes").await;
    assert!(msg.contains("'volcanoes'"));
  }

  #[tokio::test]
  async fn reply_uses_level_specific_approach() {
    let judge = Arc::new(ScriptedJudge::always("Why do you think so?"));
    let t = tutor(judge.clone());
    let reply = t.socratic_reply("gravity", &[Turn::user("things fall")], 75).await;
    assert_eq!(reply, "Why do you think so?");
    let calls = judge.calls.lock().unwrap();
    let system = &calls[0].0;
    assert!(system.contains("creative application and synthesis"));
    assert!(system.contains("Current understanding: 75%"));
  }

  #[tokio::test]
  async fn reply_failure_is_apologetic() {
    let reply = tutor(Arc::new(FailingJudge)).socratic_reply("gravity", &[], 0).await;
    assert_eq!(reply, FALLBACK_REPLY);
  }

  #[test]
  fn approach_bands() {
    assert_eq!(approach_for(0), "explore the basic concept with examples");
    assert_eq!(approach_for(30), "connect and compare, ask deeper questions");
    assert_eq!(approach_for(70), "creative application and synthesis");
  }
}
