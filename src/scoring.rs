//! Shared scoring result type and the derivation rules that guard it.
//!
//! `overall_score` and `is_completed` are never set by hand: the only way to get an
//! `EvaluationResult` is `EvaluationResult::derive`, which computes both from the
//! (already clamped) dimension scores and the active difficulty profile.

use serde::Serialize;

use crate::domain::{Dimension, DimensionSet, DifficultyProfile, Insights};

/// One scored turn. Immutable after construction.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct EvaluationResult {
  dimensions: DimensionSet,
  overall_score: u32,
  is_completed: bool,
  insights: Insights,
  growth_indicators: Vec<String>,
  next_focus: String,
}

impl EvaluationResult {
  pub fn derive(
    dimensions: DimensionSet,
    profile: &DifficultyProfile,
    insights: Insights,
    growth_indicators: Vec<String>,
    next_focus: String,
  ) -> Self {
    Self {
      overall_score: weighted_overall(&dimensions),
      is_completed: meets_thresholds(&dimensions, profile),
      dimensions,
      insights,
      growth_indicators,
      next_focus,
    }
  }

  /// The placeholder evaluation handed back whenever the judge cannot be used.
  pub fn fallback() -> Self {
    let dimensions = DimensionSet::clamped(30, 25, 20, 15, 35);
    Self {
      // 30*.25 + 25*.2 + 20*.2 + 15*.2 + 35*.15 = 24.75, reported as 25.
      overall_score: 25,
      is_completed: false,
      dimensions,
      insights: Insights {
        depth: "Something went wrong while evaluating this answer.".into(),
        ..Insights::default()
      },
      growth_indicators: vec!["Please keep the conversation going.".into()],
      next_focus: "Let's continue exploring together.".into(),
    }
  }

  pub fn dimensions(&self) -> &DimensionSet { &self.dimensions }
  pub fn overall_score(&self) -> u32 { self.overall_score }
  pub fn is_completed(&self) -> bool { self.is_completed }
  pub fn insights(&self) -> &Insights { &self.insights }
  pub fn growth_indicators(&self) -> &[String] { &self.growth_indicators }
  pub fn next_focus(&self) -> &str { &self.next_focus }
}

/// round_half_up(Σ score × weight), computed in integer percent so it is exact.
pub fn weighted_overall(dims: &DimensionSet) -> u32 {
  let basis: u32 = dims.iter().map(|(d, v)| v * d.weight_pct()).sum();
  (basis + 50) / 100
}

/// Completion is conjunctive: every dimension must reach its tier threshold.
pub fn meets_thresholds(dims: &DimensionSet, profile: &DifficultyProfile) -> bool {
  Dimension::ALL
    .iter()
    .all(|d| dims.get(*d) >= profile.thresholds.get(*d))
}

/// Short encouragement line picked from the plain mean of the five dimensions.
pub fn dimension_feedback(dims: &DimensionSet) -> &'static str {
  let total: u32 = dims.iter().map(|(_, v)| v).sum();
  let mean = f64::from(total) / Dimension::ALL.len() as f64;
  if mean >= 80.0 {
    "Outstanding Socratic thinking!"
  } else if mean >= 60.0 {
    "Your thinking is getting deeper and broader!"
  } else if mean >= 40.0 {
    "You're making good progress!"
  } else {
    "Let's start the journey of inquiry together!"
  }
}
