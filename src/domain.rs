//! Domain models: conversation turns, difficulty profiles, and the five Socratic dimensions.

use serde::{Deserialize, Serialize};

/// Who authored a conversation turn.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
  User,
  Assistant,
}

/// One prior message of the dialogue. Borrowed read-only by the scorers.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Turn {
  pub role: Role,
  #[serde(default)] pub content: String,
}

#[cfg(test)]
impl Turn {
  pub fn user(content: impl Into<String>) -> Self {
    Self { role: Role::User, content: content.into() }
  }

  pub fn assistant(content: impl Into<String>) -> Self {
    Self { role: Role::Assistant, content: content.into() }
  }
}

/// Difficulty tier chosen by the instructor for a session.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
  Easy,
  #[default]
  Normal,
  Hard,
}

impl Difficulty {
  /// Lenient parse: anything that is not a known tier is `Normal`.
  pub fn parse(raw: &str) -> Self {
    match raw.trim().to_ascii_lowercase().as_str() {
      "easy" => Difficulty::Easy,
      "hard" => Difficulty::Hard,
      _ => Difficulty::Normal,
    }
  }

  /// Same as `parse`, treating a missing value as `Normal`.
  pub fn from_opt(raw: Option<&str>) -> Self {
    raw.map(Self::parse).unwrap_or_default()
  }

  pub fn as_str(self) -> &'static str {
    match self {
      Difficulty::Easy => "easy",
      Difficulty::Normal => "normal",
      Difficulty::Hard => "hard",
    }
  }

  pub fn profile(self) -> &'static DifficultyProfile {
    match self {
      Difficulty::Easy => &EASY_PROFILE,
      Difficulty::Normal => &NORMAL_PROFILE,
      Difficulty::Hard => &HARD_PROFILE,
    }
  }
}

impl std::fmt::Display for Difficulty {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

/// The five axes a student's understanding is scored on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Dimension {
  Depth,
  Breadth,
  Application,
  Metacognition,
  Engagement,
}

impl Dimension {
  pub const ALL: [Dimension; 5] = [
    Dimension::Depth,
    Dimension::Breadth,
    Dimension::Application,
    Dimension::Metacognition,
    Dimension::Engagement,
  ];

  pub fn key(self) -> &'static str {
    match self {
      Dimension::Depth => "depth",
      Dimension::Breadth => "breadth",
      Dimension::Application => "application",
      Dimension::Metacognition => "metacognition",
      Dimension::Engagement => "engagement",
    }
  }

  /// Weight in percent. The five weights add up to 100.
  pub fn weight_pct(self) -> u32 {
    match self {
      Dimension::Depth => 25,
      Dimension::Breadth => 20,
      Dimension::Application => 20,
      Dimension::Metacognition => 20,
      Dimension::Engagement => 15,
    }
  }
}

/// Fixed-key scores for the five dimensions, each in [0, 100].
///
/// Fields are private so every instance goes through a clamping constructor.
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
pub struct DimensionSet {
  depth: u32,
  breadth: u32,
  application: u32,
  metacognition: u32,
  engagement: u32,
}

impl DimensionSet {
  /// Build from raw (possibly out-of-range) values, clamping each into [0, 100].
  pub fn clamped(depth: i64, breadth: i64, application: i64, metacognition: i64, engagement: i64) -> Self {
    Self {
      depth: clamp_score(depth),
      breadth: clamp_score(breadth),
      application: clamp_score(application),
      metacognition: clamp_score(metacognition),
      engagement: clamp_score(engagement),
    }
  }

  const fn fixed(depth: u32, breadth: u32, application: u32, metacognition: u32, engagement: u32) -> Self {
    Self { depth, breadth, application, metacognition, engagement }
  }

  pub fn get(&self, dim: Dimension) -> u32 {
    match dim {
      Dimension::Depth => self.depth,
      Dimension::Breadth => self.breadth,
      Dimension::Application => self.application,
      Dimension::Metacognition => self.metacognition,
      Dimension::Engagement => self.engagement,
    }
  }

  /// (dimension, score) pairs in canonical order.
  pub fn iter(&self) -> impl Iterator<Item = (Dimension, u32)> + '_ {
    Dimension::ALL.into_iter().map(move |d| (d, self.get(d)))
  }
}

/// Clamp any judge-supplied integer into the score range.
pub fn clamp_score(v: i64) -> u32 {
  v.clamp(0, 100) as u32
}

/// Free-text explanation per dimension, as returned by the judge.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct Insights {
  pub depth: String,
  pub breadth: String,
  pub application: String,
  pub metacognition: String,
  pub engagement: String,
}

/// Per-tier completion bar plus the legacy scorer's per-turn drift window.
#[derive(Clone, Copy, Debug)]
pub struct DifficultyProfile {
  pub thresholds: DimensionSet,
  /// Largest upward move per turn, in points out of 100.
  pub max_increase: u32,
  /// Largest downward move per turn, in points out of 100.
  pub max_decrease: u32,
  /// Audience description handed to the legacy judge prompt.
  pub level_desc: &'static str,
  /// What "done" means at this tier, handed to the legacy judge prompt.
  pub completion_criteria: &'static str,
}

// At `easy` the application bar sits above every other dimension.
static EASY_PROFILE: DifficultyProfile = DifficultyProfile {
  thresholds: DimensionSet::fixed(60, 50, 70, 40, 50),
  max_increase: 60,
  max_decrease: 3,
  level_desc: "upper elementary school level",
  completion_criteria: "understands the basic concept and can give a simple example",
};

static NORMAL_PROFILE: DifficultyProfile = DifficultyProfile {
  thresholds: DimensionSet::fixed(75, 70, 75, 60, 70),
  max_increase: 50,
  max_decrease: 5,
  level_desc: "middle school level",
  completion_criteria: "understands the core concept and can connect it to related concepts",
};

static HARD_PROFILE: DifficultyProfile = DifficultyProfile {
  thresholds: DimensionSet::fixed(85, 80, 80, 80, 85),
  max_increase: 40,
  max_decrease: 7,
  level_desc: "high school level or above",
  completion_criteria: "shows deep understanding, critical thinking and creative application",
};
