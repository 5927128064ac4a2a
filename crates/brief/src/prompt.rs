//! Brief prompt and the plain-text rendering of each data list.

use crate::fetcher::{ActiveScenario, BriefData, RecentEvent, RecentIntelFeed, ScoreMover};

pub const DEFAULT_PRIORITY: &str = "No specific priority — use your analytical judgment.";

pub const BRIEF_SYSTEM_PROMPT: &str = r#"You are the analytical engine for PowerFlow, a geopolitical intelligence system that tracks the gap between claimed authority and exercised control. Synthesize recent system data into a concise, structured weekly intelligence brief.

Write it as a high-quality analyst note, not a news summary. Put analytical insight ahead of event description: tell the reader what the data reveals about underlying power dynamics, not only what happened. Be specific and non-obvious. Avoid motivational language, generic framing, and restating what the reader can already see.

Use these exact section headers, in this order:

## THE HEADLINE
One paragraph (3-4 sentences). The single most analytically significant structural shift this week and why it matters beyond the immediate event. It frames everything that follows.

## KEY MOVEMENTS
Only the 3-5 most consequential PF score shifts, chosen for analytical significance rather than size of delta. Format each as:
**[Actor]** Δ [delta] → [brief analytical clause on what the shift means, not only what caused it].

Skip minor or baseline-entry changes. The full ledger follows at the bottom.

## ANALYTICAL SYNTHESIS
2-3 paragraphs. This is the core intelligence layer. What do the week's events and score shifts, taken together, reveal about the underlying system? What second-order story would a news reader miss? Which structural dynamic was confirmed, accelerated or broken this week? Reference specific actors and events, but focus on what they *mean* for the power landscape.

## SCENARIOS TO WATCH
For each active scenario provided: **bold name**, probability estimate, one sentence on current status, one sentence on the specific trigger condition to monitor. Name the actual threshold rather than a generic "watch for escalation."

## SCORE LEDGER
Every score change this week in compact form, one line per actor: **[Actor]** Δ[delta] ([old] → [new]): [one brief clause]. No elaboration; this section is reference, not analysis."#;

fn or_default<'a>(value: &'a str, default: &'a str) -> &'a str {
    if value.is_empty() { default } else { value }
}

pub fn format_events(events: &[RecentEvent]) -> String {
    if events.is_empty() {
        return "  (none this period)".to_string();
    }
    events
        .iter()
        .map(|event| {
            let mut line = format!(
                "- [{}] {}",
                or_default(&event.event_type, "Event"),
                or_default(&event.name, "Unnamed")
            );
            if !event.date.is_empty() {
                line.push_str(&format!(" ({})", event.date));
            }
            if !event.pf_signal.is_empty() {
                line.push_str(&format!(" | PF Signal: {}", event.pf_signal));
            }
            if !event.description.is_empty() {
                line.push_str(&format!("\n  {}", event.description));
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_intel_feeds(feeds: &[RecentIntelFeed]) -> String {
    if feeds.is_empty() {
        return "  (none this period)".to_string();
    }
    feeds
        .iter()
        .map(|feed| {
            let mut line = format!("- {}", or_default(&feed.name, "Unnamed"));
            if !feed.confidence_shift.is_empty() {
                line.push_str(&format!(" | {}", feed.confidence_shift));
            }
            if !feed.so_what_summary.is_empty() {
                line.push_str(&format!("\n  {}", feed.so_what_summary));
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_score_movers(movers: &[ScoreMover]) -> String {
    if movers.is_empty() {
        return "  (no material score changes this period)".to_string();
    }
    movers
        .iter()
        .map(|mover| {
            let score = mover.score.map_or_else(|| "n/a".to_string(), |s| format!("{s:.0}"));
            let delta = mover
                .score_delta
                .map_or_else(|| "n/a".to_string(), |d| format!("{d:+.0}"));
            let mut line = format!(
                "- **{}** | Score: {} (Δ {})",
                or_default(&mover.actor, "Unknown"),
                score,
                delta
            );
            if !mover.trigger_notes.is_empty() {
                line.push_str(&format!("\n  {}", mover.trigger_notes));
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_scenarios(scenarios: &[ActiveScenario]) -> String {
    if scenarios.is_empty() {
        return "  (no active scenarios)".to_string();
    }
    scenarios
        .iter()
        .map(|scenario| {
            let mut line = format!("- **{}**", or_default(&scenario.name, "Unnamed"));
            if !scenario.scenario_class.is_empty() {
                line.push_str(&format!(" [{}]", scenario.scenario_class));
            }
            if !scenario.probability_estimate.is_empty() {
                line.push_str(&format!(" | p={}", scenario.probability_estimate));
            }
            if !scenario.trigger_condition.is_empty() {
                line.push_str(&format!("\n  Trigger: {}", scenario.trigger_condition));
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn build_brief_message(data: &BriefData, priority: &str) -> String {
    let priority = if priority.trim().is_empty() { DEFAULT_PRIORITY } else { priority };
    format!(
        "EDITORIAL PRIORITY: {priority}\n\n\
         RECENT DATA:\n\n\
         EVENTS ({} this week):\n{}\n\n\
         INTELLIGENCE FEEDS ({} this week):\n{}\n\n\
         SCORE MOVERS ({} this week):\n{}\n\n\
         ACTIVE SCENARIOS:\n{}\n\n\
         DATE RANGE: {}\n\n\
         Generate the PowerFlow Weekly Brief now.",
        data.events.len(),
        format_events(&data.events),
        data.intel_feeds.len(),
        format_intel_feeds(&data.intel_feeds),
        data.score_snapshots.len(),
        format_score_movers(&data.score_snapshots),
        format_scenarios(&data.active_scenarios),
        data.date_range,
    )
}
