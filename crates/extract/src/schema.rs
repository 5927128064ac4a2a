use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A closed set of labels with fixed wire values.
pub trait Label: Copy + Sized + 'static {
    const ALL: &'static [Self];

    fn as_str(&self) -> &'static str;

    /// Exact, case-sensitive match against the wire value.
    fn parse(value: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|l| l.as_str() == value)
    }
}

macro_rules! impl_display_for_label {
    ($($ty:ty),* $(,)?) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.as_str())
                }
            }
        )*
    };
}

// ---------------------------------------------------------------------------
// Screening
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    #[serde(rename = "Strong Match")]
    StrongMatch,
    #[serde(rename = "Moderate Match")]
    ModerateMatch,
    #[serde(rename = "Weak Match")]
    WeakMatch,
    #[serde(rename = "Not Relevant")]
    NotRelevant,
}

impl Verdict {
    /// Tier for a score already clamped to [0, 100].
    pub fn from_score(score: u8) -> Self {
        match score {
            70..=u8::MAX => Verdict::StrongMatch,
            40..=69 => Verdict::ModerateMatch,
            10..=39 => Verdict::WeakMatch,
            _ => Verdict::NotRelevant,
        }
    }
}

impl Label for Verdict {
    const ALL: &'static [Self] = &[
        Verdict::StrongMatch,
        Verdict::ModerateMatch,
        Verdict::WeakMatch,
        Verdict::NotRelevant,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            Verdict::StrongMatch => "Strong Match",
            Verdict::ModerateMatch => "Moderate Match",
            Verdict::WeakMatch => "Weak Match",
            Verdict::NotRelevant => "Not Relevant",
        }
    }
}

/// Databases a screened document may feed. Anything else is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AffectedDatabase {
    #[serde(rename = "Events Timeline")]
    EventsTimeline,
    #[serde(rename = "Actors Registry")]
    ActorsRegistry,
    #[serde(rename = "PowerFlow Assessments")]
    PowerFlowAssessments,
    #[serde(rename = "Conflicts Registry")]
    ConflictsRegistry,
    #[serde(rename = "Geopolitical Units")]
    GeopoliticalUnits,
    #[serde(rename = "Scenarios & Stress Tests")]
    ScenariosAndStressTests,
}

impl Label for AffectedDatabase {
    const ALL: &'static [Self] = &[
        AffectedDatabase::EventsTimeline,
        AffectedDatabase::ActorsRegistry,
        AffectedDatabase::PowerFlowAssessments,
        AffectedDatabase::ConflictsRegistry,
        AffectedDatabase::GeopoliticalUnits,
        AffectedDatabase::ScenariosAndStressTests,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            AffectedDatabase::EventsTimeline => "Events Timeline",
            AffectedDatabase::ActorsRegistry => "Actors Registry",
            AffectedDatabase::PowerFlowAssessments => "PowerFlow Assessments",
            AffectedDatabase::ConflictsRegistry => "Conflicts Registry",
            AffectedDatabase::GeopoliticalUnits => "Geopolitical Units",
            AffectedDatabase::ScenariosAndStressTests => "Scenarios & Stress Tests",
        }
    }
}

/// The five rubric dimensions, each scored 0–20.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    /// Is the sovereignty/authority gap the subject of the document?
    SovereigntyGap,
    ActorRelevance,
    EventActionability,
    /// Geographic and thematic scope.
    Scope,
    /// Source quality and information density.
    SourceQuality,
}

impl Label for Dimension {
    const ALL: &'static [Self] = &[
        Dimension::SovereigntyGap,
        Dimension::ActorRelevance,
        Dimension::EventActionability,
        Dimension::Scope,
        Dimension::SourceQuality,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            Dimension::SovereigntyGap => "sovereignty_gap",
            Dimension::ActorRelevance => "actor_relevance",
            Dimension::EventActionability => "event_actionability",
            Dimension::Scope => "scope",
            Dimension::SourceQuality => "source_quality",
        }
    }
}

pub const DIMENSION_MAX: u8 = 20;

pub type DimensionScores = BTreeMap<Dimension, u8>;

/// Canonical output of the relevance screener.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreeningResult {
    pub score: u8,
    pub verdict: Verdict,
    pub reasoning: String,
    pub affected_databases: Vec<AffectedDatabase>,
    pub key_signals: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimension_scores: Option<DimensionScores>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub penalties: Option<i32>,
}

impl ScreeningResult {
    /// Placeholder result for text ingested without screening.
    pub fn manual(score: u8, reasoning: impl Into<String>) -> Self {
        let score = score.min(100);
        Self {
            score,
            verdict: Verdict::from_score(score),
            reasoning: reasoning.into(),
            affected_databases: Vec::new(),
            key_signals: Vec::new(),
            dimension_scores: None,
            penalties: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceType {
    Academic,
    Government,
    News,
    #[serde(rename = "Think tank")]
    ThinkTank,
    #[serde(rename = "OSINT")]
    Osint,
    #[serde(rename = "Legal document")]
    LegalDocument,
    Other,
}

impl Label for SourceType {
    const ALL: &'static [Self] = &[
        SourceType::Academic,
        SourceType::Government,
        SourceType::News,
        SourceType::ThinkTank,
        SourceType::Osint,
        SourceType::LegalDocument,
        SourceType::Other,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            SourceType::Academic => "Academic",
            SourceType::Government => "Government",
            SourceType::News => "News",
            SourceType::ThinkTank => "Think tank",
            SourceType::Osint => "OSINT",
            SourceType::LegalDocument => "Legal document",
            SourceType::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Reliability {
    High,
    Medium,
    Low,
}

impl Label for Reliability {
    const ALL: &'static [Self] = &[Reliability::High, Reliability::Medium, Reliability::Low];

    fn as_str(&self) -> &'static str {
        match self {
            Reliability::High => "High",
            Reliability::Medium => "Medium",
            Reliability::Low => "Low",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    #[serde(rename = "Legal change")]
    LegalChange,
    #[serde(rename = "Military or coercive action")]
    MilitaryOrCoerciveAction,
    #[serde(rename = "Sanctions or economic measure")]
    SanctionsOrEconomicMeasure,
    #[serde(rename = "Institutional reform")]
    InstitutionalReform,
    #[serde(rename = "Alliance or treaty shift")]
    AllianceOrTreatyShift,
    #[serde(rename = "Information-cyber")]
    InformationCyber,
    Other,
}

impl Label for EventType {
    const ALL: &'static [Self] = &[
        EventType::LegalChange,
        EventType::MilitaryOrCoerciveAction,
        EventType::SanctionsOrEconomicMeasure,
        EventType::InstitutionalReform,
        EventType::AllianceOrTreatyShift,
        EventType::InformationCyber,
        EventType::Other,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            EventType::LegalChange => "Legal change",
            EventType::MilitaryOrCoerciveAction => "Military or coercive action",
            EventType::SanctionsOrEconomicMeasure => "Sanctions or economic measure",
            EventType::InstitutionalReform => "Institutional reform",
            EventType::AllianceOrTreatyShift => "Alliance or treaty shift",
            EventType::InformationCyber => "Information-cyber",
            EventType::Other => "Other",
        }
    }
}

/// Whether an event widens or narrows the gap between an actor's claimed
/// and exercised authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PfSignal {
    Widens,
    Narrows,
    #[serde(rename = "No clear effect")]
    NoClearEffect,
    Indirect,
}

impl Label for PfSignal {
    const ALL: &'static [Self] = &[
        PfSignal::Widens,
        PfSignal::Narrows,
        PfSignal::NoClearEffect,
        PfSignal::Indirect,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            PfSignal::Widens => "Widens",
            PfSignal::Narrows => "Narrows",
            PfSignal::NoClearEffect => "No clear effect",
            PfSignal::Indirect => "Indirect",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActorType {
    State,
    #[serde(rename = "Non-State")]
    NonState,
    Hybrid,
    #[serde(rename = "IGO")]
    Igo,
    Individual,
}

impl Label for ActorType {
    const ALL: &'static [Self] = &[
        ActorType::State,
        ActorType::NonState,
        ActorType::Hybrid,
        ActorType::Igo,
        ActorType::Individual,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            ActorType::State => "State",
            ActorType::NonState => "Non-State",
            ActorType::Hybrid => "Hybrid",
            ActorType::Igo => "IGO",
            ActorType::Individual => "Individual",
        }
    }
}

impl_display_for_label!(
    Verdict,
    AffectedDatabase,
    Dimension,
    SourceType,
    Reliability,
    EventType,
    PfSignal,
    ActorType,
);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub title: String,
    pub author_organization: String,
    pub publication_date: String,
    pub source_type: SourceType,
    pub reliability: Reliability,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub event_name: String,
    pub date: String,
    pub event_type: EventType,
    pub description: String,
    pub pf_signal: PfSignal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub name: String,
    pub actor_type: ActorType,
    pub role_in_event: String,
    #[serde(default)]
    pub iso3: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub source: Source,
    pub event: Event,
    pub actors: Vec<Actor>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_thresholds() {
        assert_eq!(Verdict::from_score(100), Verdict::StrongMatch);
        assert_eq!(Verdict::from_score(70), Verdict::StrongMatch);
        assert_eq!(Verdict::from_score(69), Verdict::ModerateMatch);
        assert_eq!(Verdict::from_score(40), Verdict::ModerateMatch);
        assert_eq!(Verdict::from_score(39), Verdict::WeakMatch);
        assert_eq!(Verdict::from_score(10), Verdict::WeakMatch);
        assert_eq!(Verdict::from_score(9), Verdict::NotRelevant);
        assert_eq!(Verdict::from_score(0), Verdict::NotRelevant);
    }

    #[test]
    fn test_parse_is_exact_and_case_sensitive() {
        assert_eq!(ActorType::parse("Non-State"), Some(ActorType::NonState));
        assert_eq!(ActorType::parse("non-state"), None);
        assert_eq!(SourceType::parse("Think tank"), Some(SourceType::ThinkTank));
        assert_eq!(
            AffectedDatabase::parse("Scenarios & Stress Tests"),
            Some(AffectedDatabase::ScenariosAndStressTests)
        );
        assert_eq!(PfSignal::parse(""), None);
    }

    #[test]
    fn test_serde_uses_wire_labels() {
        let json = serde_json::to_string(&EventType::MilitaryOrCoerciveAction).unwrap();
        assert_eq!(json, "\"Military or coercive action\"");
        let json = serde_json::to_string(&Dimension::SovereigntyGap).unwrap();
        assert_eq!(json, "\"sovereignty_gap\"");

        for label in Verdict::ALL {
            let json = serde_json::to_string(label).unwrap();
            assert_eq!(json, format!("\"{}\"", label.as_str()));
        }
    }

    #[test]
    fn test_manual_result_derives_verdict() {
        let result = ScreeningResult::manual(50, "Manually ingested.");
        assert_eq!(result.verdict, Verdict::ModerateMatch);
        assert!(result.dimension_scores.is_none());
    }
}
