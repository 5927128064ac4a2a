use extract::{GenerationRequest, ModelSettings, TextGenerator};
use index::fields::briefs;
use index::{
    ActivityEntry, Block, DatabaseIds, DocumentStore, PageRef, Properties, TextSegment,
    create_with_fallback, log_activity,
};
use regex::Regex;
use std::sync::{Arc, LazyLock};
use tracing::info;

use crate::error::BriefError;
use crate::fetcher::BriefData;
use crate::prompt::{BRIEF_SYSTEM_PROMPT, build_brief_message};

pub const SYNTHESIS_AGENT: &str = "Agent-F: Synthesis";

static BOLD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*[^*]+\*\*").expect("valid regex"));

/// Split `**bold**` runs out of a line. A line with no text still yields
/// one plain segment.
pub fn parse_inline_bold(text: &str) -> Vec<TextSegment> {
    let mut segments = Vec::new();
    let mut last = 0;
    for found in BOLD.find_iter(text) {
        if found.start() > last {
            segments.push(TextSegment::plain(&text[last..found.start()]));
        }
        let inner = &found.as_str()[2..found.as_str().len() - 2];
        segments.push(TextSegment::bold(inner));
        last = found.end();
    }
    if last < text.len() {
        segments.push(TextSegment::plain(&text[last..]));
    }
    if segments.is_empty() {
        segments.push(TextSegment::plain(text));
    }
    segments
}

/// `## ` lines become headings, other non-blank lines paragraphs.
pub fn markdown_to_blocks(text: &str) -> Vec<Block> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| match line.strip_prefix("## ") {
            Some(heading) => Block::Heading2(heading.trim().to_string()),
            None => Block::Paragraph(parse_inline_bold(line)),
        })
        .collect()
}

pub struct BriefWriter {
    generator: Arc<dyn TextGenerator>,
    store: Arc<dyn DocumentStore>,
    databases: DatabaseIds,
    settings: ModelSettings,
}

impl BriefWriter {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        store: Arc<dyn DocumentStore>,
        databases: DatabaseIds,
        settings: ModelSettings,
    ) -> Self {
        Self {
            generator,
            store,
            databases,
            settings,
        }
    }

    pub async fn generate(&self, data: &BriefData, priority: &str) -> Result<String, BriefError> {
        let request = GenerationRequest::new(
            &self.settings,
            BRIEF_SYSTEM_PROMPT,
            build_brief_message(data, priority),
        )
        .cached();

        let brief = self.generator.generate(&request).await?;
        info!(chars = brief.len(), date_range = %data.date_range, "brief generated");
        Ok(brief.trim().to_string())
    }

    /// Write an approved brief as a draft page, body converted from markdown.
    pub async fn save(
        &self,
        brief_text: &str,
        data: &BriefData,
        priority: &str,
    ) -> Result<PageRef, BriefError> {
        let database_id = self.databases.briefs()?;

        let properties = Properties::new()
            .title(briefs::TITLE, format!("Weekly Brief — {}", data.date_range))
            .select(briefs::BRIEF_TYPE, "Weekly")
            .select(briefs::GENERATED_BY, SYNTHESIS_AGENT)
            .rich_text(briefs::DATE_RANGE, &data.date_range)
            .rich_text(briefs::EDITORIAL_PRIORITY, priority)
            .select(briefs::STATUS, "Draft")
            .select(briefs::VISIBILITY, "Internal")
            .date(briefs::PERIOD_START, data.window.start_date())
            .date(briefs::PERIOD_END, data.window.end_date());

        let blocks = markdown_to_blocks(brief_text);
        let page = create_with_fallback(
            self.store.as_ref(),
            database_id,
            &properties,
            briefs::CORE,
            &blocks,
        )
        .await?;
        info!(page = %page.url, blocks = blocks.len(), "brief saved");
        Ok(page)
    }

    /// Record a synthesis run. Never fails.
    pub async fn log_activity(&self, status: &str, notes: &str) -> Option<PageRef> {
        let entry = ActivityEntry {
            log_title: "PowerFlow Weekly Brief — Synthesis".to_string(),
            agent_id: SYNTHESIS_AGENT.to_string(),
            action_type: "Synthesis Write".to_string(),
            notes: notes.to_string(),
            status: status.to_string(),
            ..Default::default()
        };
        log_activity(
            self.store.as_ref(),
            self.databases.activity_log.as_deref(),
            &entry,
        )
        .await
    }
}
