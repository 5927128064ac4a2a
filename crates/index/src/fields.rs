//! Property names, grouped per database.

pub mod sources {
    pub const TITLE: &str = "Title";
    pub const SOURCE_TYPE: &str = "Source Type";
    pub const RELIABILITY: &str = "Reliability";
    pub const AUTHOR_ORGANIZATION: &str = "Author / Organization";
    pub const SUMMARY: &str = "Summary";
    pub const URL: &str = "URL";
    pub const PUBLICATION_DATE: &str = "Publication Date";

    pub const CORE: &[&str] = &[TITLE, SOURCE_TYPE, RELIABILITY];
}

pub mod events {
    pub const EVENT_NAME: &str = "Event Name";
    /// Older event pages use a plain `Name` title.
    pub const NAME: &str = "Name";
    pub const EVENT_TYPE: &str = "Event Type";
    pub const DESCRIPTION: &str = "Description";
    pub const PF_SIGNAL: &str = "PF Signal";
    pub const DATE: &str = "Date";
    pub const KEY_SOURCES: &str = "Key Sources";
    pub const KEY_ACTORS: &str = "Key Actors";

    pub const CORE: &[&str] = &[EVENT_NAME, EVENT_TYPE, KEY_SOURCES];
}

pub mod intel_feeds {
    pub const TITLE: &str = "Title";
    pub const NAME: &str = "Name";
    pub const SO_WHAT_SUMMARY: &str = "So What Summary";
    pub const RELEVANCE_SCORE: &str = "Relevance Score";
    pub const VERDICT: &str = "Verdict";
    pub const GAP_IMPLICATION: &str = "Gap Implication";
    pub const CONFIDENCE_SHIFT: &str = "Confidence Shift";
    pub const SOURCE: &str = "Source";
    pub const EVENT: &str = "Event";

    pub const CORE: &[&str] = &[TITLE, SO_WHAT_SUMMARY, RELEVANCE_SCORE];
}

pub mod actors {
    pub const NAME: &str = "Name";
    pub const ACTOR_TYPE: &str = "Actor Type";
    pub const ISO3: &str = "ISO3";
    pub const NOTES: &str = "Notes";
    pub const CASE_STUDIES: &str = "Case Studies";
    pub const AUTHORITY_SCORE: &str = "Authority Score";
    pub const REACH_SCORE: &str = "Reach Score";
    pub const SCORE_REASONING: &str = "Score Reasoning";
    pub const LAST_SCORED: &str = "Last Scored";

    pub const CORE: &[&str] = &[NAME, ACTOR_TYPE];
}

pub mod case_studies {
    pub const TITLE: &str = "Title";
    pub const NAME: &str = "Name";
    pub const SUMMARY: &str = "Summary";
}

pub mod activity_log {
    pub const LOG_TITLE: &str = "Log Title";
    pub const AGENT_ID: &str = "Agent ID";
    pub const ACTION_TYPE: &str = "Action Type";
    pub const TARGET_DATABASE: &str = "Target Database";
    pub const TARGET_RECORD: &str = "Target Record";
    pub const SOURCE_MATERIAL: &str = "Source Material";
    pub const CONFIDENCE: &str = "Confidence";
    pub const NOTES: &str = "Notes";
    pub const TIMESTAMP: &str = "Timestamp";
    pub const STATUS: &str = "Status";
    pub const VISIBILITY: &str = "Visibility";

    pub const CORE: &[&str] = &[LOG_TITLE, AGENT_ID, ACTION_TYPE, TIMESTAMP, STATUS];
}

pub mod score_snapshots {
    pub const TITLE: &str = "Title";
    pub const NAME: &str = "Name";
    pub const SCORE: &str = "Score";
    pub const SCORE_DELTA: &str = "Score Delta";
    pub const SNAPSHOT_DATE: &str = "Snapshot Date";
    pub const TRIGGER_NOTES: &str = "Trigger Notes";
}

pub mod scenarios {
    pub const SCENARIO_NAME: &str = "Scenario Name";
    pub const SCENARIO_CLASS: &str = "Scenario Class";
    pub const PROBABILITY_ESTIMATE: &str = "Probability Estimate";
    pub const TRIGGER_CONDITION: &str = "Trigger Condition";
    pub const STATUS: &str = "Status";
}

pub mod briefs {
    pub const TITLE: &str = "Title";
    pub const BRIEF_TYPE: &str = "Brief Type";
    pub const GENERATED_BY: &str = "Generated By";
    pub const DATE_RANGE: &str = "Date Range";
    pub const EDITORIAL_PRIORITY: &str = "Editorial Priority";
    pub const STATUS: &str = "Status";
    pub const VISIBILITY: &str = "Visibility";
    pub const PERIOD_START: &str = "Period Start";
    pub const PERIOD_END: &str = "Period End";

    pub const CORE: &[&str] = &[TITLE, BRIEF_TYPE, DATE_RANGE];
}
