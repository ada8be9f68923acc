//! Application state: the judge, the two scorers, the tutor, and the score store.
//!
//! Built once in `main` and handed to the router; nothing here is a process-wide global.
//! Scorers and tutor share one `Arc<dyn Judge>`, which is the OpenAI client when
//! OPENAI_API_KEY is set and `DisabledJudge` otherwise (every call then falls back locally).

use std::sync::Arc;

use tracing::{info, instrument};

use crate::assessment::DimensionScorer;
use crate::config::{load_agent_config_from_env, Prompts};
use crate::judge::{DisabledJudge, Judge};
use crate::legacy::LegacyLevelScorer;
use crate::openai::OpenAI;
use crate::store::ScoreStore;
use crate::tutor::Tutor;

#[derive(Clone)]
pub struct AppState {
    pub dimension_scorer: DimensionScorer,
    pub legacy_scorer: LegacyLevelScorer,
    pub tutor: Tutor,
    pub scores: ScoreStore,
}

impl AppState {
    /// Wire everything around an explicit judge and prompt set.
    pub fn new(judge: Arc<dyn Judge>, prompts: Prompts) -> Self {
        let prompts = Arc::new(prompts);
        Self {
            dimension_scorer: DimensionScorer::new(judge.clone(), prompts.clone()),
            legacy_scorer: LegacyLevelScorer::new(judge.clone(), prompts.clone()),
            tutor: Tutor::new(judge, prompts),
            scores: ScoreStore::new(),
        }
    }

    /// Build state from env: load prompt overrides, pick the judge.
    #[instrument(level = "info", skip_all)]
    pub fn from_env() -> Self {
        let prompts = load_agent_config_from_env()
            .map(|c| c.prompts)
            .unwrap_or_default();

        let judge: Arc<dyn Judge> = match OpenAI::from_env() {
            Some(oa) => {
                info!(target: "socratic_backend", base_url = %oa.base_url, model = %oa.model, "OpenAI enabled.");
                Arc::new(oa)
            }
            None => {
                info!(target: "socratic_backend", "OpenAI disabled (no OPENAI_API_KEY). Scoring will use default evaluations.");
                Arc::new(DisabledJudge)
            }
        };

        Self::new(judge, prompts)
    }
}
