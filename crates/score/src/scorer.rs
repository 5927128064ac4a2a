use chrono::Local;
use extract::prompt::STRICT_SUFFIX;
use extract::{ExtractError, GenerationRequest, ModelSettings, TextGenerator, generate_json_with_retry};
use index::fields::actors;
use index::{DocumentStore, Properties};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{info, warn};

use crate::baseline::Baseline;
use crate::context::{ActorContext, fetch_actor_context};
use crate::error::ScoreError;
use crate::prompt::{SCORE_SYSTEM_PROMPT, build_score_message};

pub const AUTHORITY_WEIGHT: f64 = 0.6;
pub const REACH_WEIGHT: f64 = 0.4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorScore {
    pub authority_score: u8,
    pub reach_score: u8,
    pub reasoning: String,
}

impl ActorScore {
    pub fn pf_score(&self) -> f64 {
        f64::from(self.authority_score) * AUTHORITY_WEIGHT + f64::from(self.reach_score) * REACH_WEIGHT
    }
}

fn score_field(data: &Map<String, Value>, field: &str) -> Result<u8, ExtractError> {
    let value = data.get(field).unwrap_or(&Value::Null);
    value
        .as_u64()
        .filter(|n| *n <= 100)
        .and_then(|n| u8::try_from(n).ok())
        .ok_or_else(|| ExtractError::validation(field, format!("{value} is not an integer 0-100")))
}

/// Scores must be JSON integers in `0..=100` and the reasoning a string.
/// Anything else is a hard failure, not a coercion.
pub fn validate_actor_score(data: Map<String, Value>) -> Result<ActorScore, ExtractError> {
    let authority_score = score_field(&data, "authority_score")?;
    let reach_score = score_field(&data, "reach_score")?;
    let reasoning = data
        .get("reasoning")
        .and_then(Value::as_str)
        .ok_or_else(|| ExtractError::validation("reasoning", "missing or not a string"))?;

    Ok(ActorScore {
        authority_score,
        reach_score,
        reasoning: reasoning.to_string(),
    })
}

/// Result of scoring one actor. Failures carry the page id as the name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreOutcome {
    pub actor_name: String,
    pub actor_page_id: String,
    pub authority_score: Option<u8>,
    pub reach_score: Option<u8>,
    pub pf_score: Option<f64>,
    pub reasoning: Option<String>,
    pub success: bool,
    pub error: Option<String>,
}

impl ScoreOutcome {
    fn scored(context: ActorContext, score: ActorScore) -> Self {
        Self {
            actor_name: context.name,
            actor_page_id: context.page_id,
            authority_score: Some(score.authority_score),
            reach_score: Some(score.reach_score),
            pf_score: Some(score.pf_score()),
            reasoning: Some(score.reasoning),
            success: true,
            error: None,
        }
    }

    fn failed(actor_page_id: &str, error: &ScoreError) -> Self {
        Self {
            actor_name: actor_page_id.to_string(),
            actor_page_id: actor_page_id.to_string(),
            authority_score: None,
            reach_score: None,
            pf_score: None,
            reasoning: None,
            success: false,
            error: Some(error.to_string()),
        }
    }
}

pub struct ActorScorer {
    generator: Arc<dyn TextGenerator>,
    store: Arc<dyn DocumentStore>,
    events_database: String,
    settings: ModelSettings,
}

impl ActorScorer {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        store: Arc<dyn DocumentStore>,
        events_database: impl Into<String>,
        settings: ModelSettings,
    ) -> Self {
        Self {
            generator,
            store,
            events_database: events_database.into(),
            settings,
        }
    }

    /// Fetch context, ask the model, validate and write the scores back.
    /// Nothing is written unless the reply validates.
    pub async fn score_actor(&self, actor_page_id: &str) -> Result<ScoreOutcome, ScoreError> {
        let context = fetch_actor_context(self.store.as_ref(), &self.events_database, actor_page_id)
            .await
            .map_err(ScoreError::Context)?;
        let baseline = Baseline::for_actor_type(&context.actor_type);

        let request = GenerationRequest::new(
            &self.settings,
            SCORE_SYSTEM_PROMPT,
            build_score_message(&context, baseline),
        )
        .cached();
        let score = generate_json_with_retry(
            self.generator.as_ref(),
            &request,
            STRICT_SUFFIX,
            validate_actor_score,
        )
        .await?;

        self.write_scores(actor_page_id, &score).await?;
        info!(
            actor = %context.name,
            authority = score.authority_score,
            reach = score.reach_score,
            pf_score = score.pf_score(),
            "actor scored"
        );
        Ok(ScoreOutcome::scored(context, score))
    }

    /// Score each actor in turn. A failure is recorded and the batch moves on.
    pub async fn score_actors(&self, actor_page_ids: &[String]) -> Vec<ScoreOutcome> {
        let total = actor_page_ids.len();
        let mut outcomes = Vec::with_capacity(total);

        for (i, actor_page_id) in actor_page_ids.iter().enumerate() {
            info!(actor_page_id = %actor_page_id, "scoring actor {}/{}", i + 1, total);
            match self.score_actor(actor_page_id).await {
                Ok(outcome) => outcomes.push(outcome),
                Err(err) => {
                    warn!(actor_page_id = %actor_page_id, error = %err, "failed to score actor");
                    outcomes.push(ScoreOutcome::failed(actor_page_id, &err));
                }
            }
        }
        outcomes
    }

    async fn write_scores(&self, actor_page_id: &str, score: &ActorScore) -> Result<(), ScoreError> {
        let properties = Properties::new()
            .number(actors::AUTHORITY_SCORE, score.authority_score)
            .number(actors::REACH_SCORE, score.reach_score)
            .rich_text(actors::SCORE_REASONING, &score.reasoning)
            .date(actors::LAST_SCORED, Local::now().date_naive().to_string());

        self.store
            .update_page(actor_page_id, &properties)
            .await
            .map_err(ScoreError::WriteBack)?;
        Ok(())
    }
}
