//! Loading agent configuration (prompts) from TOML.
//!
//! Every prompt has a built-in default; a TOML file at AGENT_CONFIG_PATH may override
//! any subset of them. Templates use `{key}` placeholders (see `util::fill_template`).

use serde::Deserialize;
use tracing::{error, info};

#[derive(Clone, Debug, Deserialize, Default)]
pub struct AgentConfig {
  #[serde(default)]
  pub prompts: Prompts,
}

/// Prompts sent to the model. Wording is tunable; the JSON schema in
/// `assessment_system` and the `점수:` marker in `legacy_level_user_template`
/// are what the parsers rely on.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Prompts {
  // Five-dimension assessment
  pub assessment_system: String,
  pub assessment_user_template: String,
  // Single-scalar legacy level
  pub legacy_level_system: String,
  pub legacy_level_user_template: String,
  // Tutor voice
  pub topic_validation_template: String,
  pub tutor_system_template: String,
  pub tutor_opening_template: String,
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      assessment_system: DEFAULT_ASSESSMENT_SYSTEM.trim().into(),
      assessment_user_template: "Topic: {topic}\nDifficulty: {difficulty}\nConversation turns: {turn_count}\n\nFull conversation so far:\n{conversation}\n\nTutor's latest question: \"{tutor_reply}\"\nStudent's latest answer: \"{student_reply}\"\n\nAnalyse the whole conversation above and perform the five-dimension evaluation.".into(),
      legacy_level_system: "You are an education expert who scores a student's understanding. Follow the output format exactly.".into(),
      legacy_level_user_template: DEFAULT_LEGACY_TEMPLATE.trim().into(),
      topic_validation_template: "Decide whether the following topic is educationally appropriate for middle school students.\n\nTopic: {topic}\n\nCriteria:\n1. Suitable for middle school level?\n2. Has educational value?\n3. Can be explored through Socratic dialogue?\n4. Safe and wholesome?\n\nAnswer only \"YES\" if appropriate or \"NO\" otherwise.".into(),
      tutor_system_template: DEFAULT_TUTOR_SYSTEM.trim().into(),
      tutor_opening_template: "The student is starting to learn about '{topic}'.\nOpen the conversation following the Socratic method.\n\nRules:\n1. Start with a question that probes what the student already knows\n2. Friendly, encouraging tone\n3. Do not give the answer; guide the thinking\n4. Use language suitable for middle school students".into(),
    }
  }
}

const DEFAULT_ASSESSMENT_SYSTEM: &str = r#"
You are an expert in five-dimension Socratic assessment.

Evaluation principles:
- Evaluate the learner's cumulative understanding and growth across the WHOLE conversation, not only the latest answer
- Scores should rise gradually as the conversation progresses
- Understanding once demonstrated does not easily regress
- Prefer steady growth over sharp swings
- Consider the learner's overall trajectory

Five dimensions (each 0-100, cumulative):
1. depth: surface -> essential understanding
2. breadth: single -> multiple perspectives
3. application: abstract -> concrete real-life connections
4. metacognition: awareness of one's own thinking process
5. engagement: passive -> active Socratic inquiry

Output format. Respond ONLY with this JSON object:
{
  "dimensions": {
    "depth": <int>,
    "breadth": <int>,
    "application": <int>,
    "metacognition": <int>,
    "engagement": <int>
  },
  "insights": {
    "depth": "<explanation>",
    "breadth": "<explanation>",
    "application": "<explanation>",
    "metacognition": "<explanation>",
    "engagement": "<explanation>"
  },
  "growth_indicators": ["<indicator>", "<indicator>"],
  "next_focus": "<suggested next learning direction>"
}
"#;

const DEFAULT_LEGACY_TEMPLATE: &str = r#"
Evaluate the student's understanding of the following topic.

# Topic: {topic}
# Difficulty: {difficulty} ({level_desc})
# Current understanding: {current_level} points
{history}
# Student's latest answer: "{student_reply}"

Principles:
1. The current score is {current_level}.
2. Judge cumulative understanding over the whole conversation.
3. Score movement limits: up at most {max_increase} points, down at most {max_decrease} points.
4. Completion at {difficulty}: {completion_criteria}

Absolute scale:
- 0-20: does not know or completely wrong
- 21-40: knows the term only, cannot explain
- 41-60: basic concept understood, lacks depth
- 61-80: accurate, systematic, connects related concepts
- 81-100: expert-level, critical or creative insight

Required output format:
점수: [integer 0-100]
근거: [short rationale]
"#;

const DEFAULT_TUTOR_SYSTEM: &str = r#"
# Socratic AI tutor

## Role
You practise Socratic maieutics: help the student "give birth" to knowledge themselves.
The students are in middle school and are learning about '{topic}'.

## Principles
- Never give direct answers
- Confess uncertainty: "I'm not sure either, let's explore together"
- Deepen step by step
- Productive discomfort: appropriate cognitive challenge

## Question ladder
1. Clarification  2. Assumptions  3. Evidence  4. Perspectives  5. Implications  6. Metacognition

## Current approach
Current understanding: {understanding_level}%
Recommended approach: {approach}

## Conversation rules
- One question at a time
- Reuse keywords from the student's answer
- Encourage and praise
- Stay on '{topic}'; gently steer back when the student drifts
"#;

/// Attempt to load `AgentConfig` from AGENT_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_agent_config_from_env() -> Option<AgentConfig> {
  let path = std::env::var("AGENT_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match parse_agent_config(&s) {
      Ok(cfg) => {
        info!(target: "socratic_backend", %path, "Loaded agent config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "socratic_backend", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "socratic_backend", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}

pub fn parse_agent_config(raw: &str) -> Result<AgentConfig, toml::de::Error> {
  toml::from_str::<AgentConfig>(raw)
}
