use chrono::{DateTime, Duration, SecondsFormat, Utc};
use index::fields::{events, intel_feeds, scenarios, score_snapshots};
use index::{
    Condition, DatabaseIds, Direction, DocumentStore, Filter, Page, QueryRequest, Sort,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

pub const DEFAULT_LOOKBACK_DAYS: u32 = 7;
/// Longest lookback a brief can cover.
pub const MAX_LOOKBACK_DAYS: u32 = 365;

/// The period a brief covers, ending now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BriefWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl BriefWindow {
    /// `lookback_days` is capped at [`MAX_LOOKBACK_DAYS`].
    pub fn ending_at(end: DateTime<Utc>, lookback_days: u32) -> Self {
        let days = lookback_days.min(MAX_LOOKBACK_DAYS);
        Self {
            start: end - Duration::days(i64::from(days)),
            end,
        }
    }

    pub fn last_days(lookback_days: u32) -> Self {
        Self::ending_at(Utc::now(), lookback_days)
    }

    /// e.g. `Feb 22 – Feb 28, 2026`
    pub fn label(&self) -> String {
        format!(
            "{} – {}",
            self.start.format("%b %-d"),
            self.end.format("%b %-d, %Y")
        )
    }

    pub fn cutoff_timestamp(&self) -> String {
        self.start.to_rfc3339_opts(SecondsFormat::Secs, true)
    }

    pub fn start_date(&self) -> String {
        self.start.date_naive().to_string()
    }

    pub fn end_date(&self) -> String {
        self.end.date_naive().to_string()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecentEvent {
    pub name: String,
    pub event_type: String,
    pub description: String,
    pub pf_signal: String,
    pub date: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecentIntelFeed {
    pub name: String,
    pub so_what_summary: String,
    pub confidence_shift: String,
    pub gap_implication: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreMover {
    pub actor: String,
    pub score: Option<f64>,
    pub score_delta: Option<f64>,
    pub trigger_notes: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActiveScenario {
    pub name: String,
    pub scenario_class: String,
    pub probability_estimate: String,
    pub trigger_condition: String,
}

/// Everything a brief is written from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BriefData {
    pub events: Vec<RecentEvent>,
    pub intel_feeds: Vec<RecentIntelFeed>,
    pub score_snapshots: Vec<ScoreMover>,
    pub active_scenarios: Vec<ActiveScenario>,
    pub window: BriefWindow,
    pub date_range: String,
}

impl BriefData {
    pub fn empty(window: BriefWindow) -> Self {
        Self {
            events: Vec::new(),
            intel_feeds: Vec::new(),
            score_snapshots: Vec::new(),
            active_scenarios: Vec::new(),
            date_range: window.label(),
            window,
        }
    }
}

fn recent_event(page: &Page) -> RecentEvent {
    RecentEvent {
        name: page.text_any(&[events::NAME, events::EVENT_NAME]),
        event_type: page.select(events::EVENT_TYPE).unwrap_or_default(),
        description: page.text(events::DESCRIPTION),
        pf_signal: page.select(events::PF_SIGNAL).unwrap_or_default(),
        date: page.date(events::DATE).unwrap_or_default(),
    }
}

fn recent_intel_feed(page: &Page) -> RecentIntelFeed {
    RecentIntelFeed {
        name: page.text_any(&[intel_feeds::TITLE, intel_feeds::NAME]),
        so_what_summary: page.text(intel_feeds::SO_WHAT_SUMMARY),
        confidence_shift: page.select(intel_feeds::CONFIDENCE_SHIFT).unwrap_or_default(),
        gap_implication: page
            .select(intel_feeds::GAP_IMPLICATION)
            .or_else(|| page.select(events::PF_SIGNAL))
            .unwrap_or_default(),
    }
}

fn score_mover(page: &Page) -> ScoreMover {
    ScoreMover {
        actor: page.text_any(&[score_snapshots::TITLE, score_snapshots::NAME]),
        score: page.number(score_snapshots::SCORE),
        score_delta: page.number(score_snapshots::SCORE_DELTA),
        trigger_notes: page.text(score_snapshots::TRIGGER_NOTES),
    }
}

fn active_scenario(page: &Page) -> ActiveScenario {
    ActiveScenario {
        name: page.text(scenarios::SCENARIO_NAME),
        scenario_class: page.select(scenarios::SCENARIO_CLASS).unwrap_or_default(),
        probability_estimate: page.select(scenarios::PROBABILITY_ESTIMATE).unwrap_or_default(),
        trigger_condition: page.text(scenarios::TRIGGER_CONDITION),
    }
}

/// Reads the recent activity a weekly brief summarises.
pub struct BriefFetcher {
    store: Arc<dyn DocumentStore>,
    databases: DatabaseIds,
}

impl BriefFetcher {
    pub fn new(store: Arc<dyn DocumentStore>, databases: DatabaseIds) -> Self {
        Self { store, databases }
    }

    pub async fn fetch_all(&self, lookback_days: u32) -> BriefData {
        self.fetch_window(BriefWindow::last_days(lookback_days)).await
    }

    /// Each database is queried independently; one that fails contributes
    /// an empty list.
    pub async fn fetch_window(&self, window: BriefWindow) -> BriefData {
        let recent = QueryRequest::filtered(Filter::CreatedOnOrAfter(window.cutoff_timestamp()))
            .sorted_by(Sort::CreatedTime(Direction::Descending));

        let snapshots = QueryRequest::filtered(Filter::And(vec![
            Filter::property(
                score_snapshots::SNAPSHOT_DATE,
                Condition::DateOnOrAfter(window.start_date()),
            ),
            Filter::property(score_snapshots::SCORE_DELTA, Condition::NumberIsNotEmpty),
        ]))
        .sorted_by(Sort::property(score_snapshots::SCORE_DELTA, Direction::Ascending));

        let active = QueryRequest::filtered(Filter::select_equals(scenarios::STATUS, "Active"))
            .sorted_by(Sort::property(scenarios::PROBABILITY_ESTIMATE, Direction::Descending));

        let data = BriefData {
            events: self
                .query_or_empty("events", &self.databases.events, &recent)
                .await
                .iter()
                .map(recent_event)
                .collect(),
            intel_feeds: self
                .query_or_empty("intel feeds", &self.databases.intel_feeds, &recent)
                .await
                .iter()
                .map(recent_intel_feed)
                .collect(),
            score_snapshots: self
                .query_or_empty("score snapshots", &self.databases.score_snapshots, &snapshots)
                .await
                .iter()
                .map(score_mover)
                .collect(),
            active_scenarios: self
                .query_or_empty("scenarios", &self.databases.scenarios, &active)
                .await
                .iter()
                .map(active_scenario)
                .collect(),
            date_range: window.label(),
            window,
        };

        info!(
            events = data.events.len(),
            intel_feeds = data.intel_feeds.len(),
            score_snapshots = data.score_snapshots.len(),
            scenarios = data.active_scenarios.len(),
            date_range = %data.date_range,
            "brief data fetched"
        );
        data
    }

    async fn query_or_empty(
        &self,
        label: &str,
        database_id: &str,
        request: &QueryRequest,
    ) -> Vec<Page> {
        match self.store.query_all(database_id, request).await {
            Ok(pages) => pages,
            Err(err) => {
                warn!(database = label, error = %err, "query failed, continuing without it");
                Vec::new()
            }
        }
    }
}
