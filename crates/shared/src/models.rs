use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Fallback accent for section labels that are not in the fixed set
pub const DEFAULT_SECTION_COLOR: &str = "#64748B";

/// The fixed, ordered set of briefing sections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    WarsAndConflicts,
    IndiaAiMission,
    IndiaSemiconductorMission,
    AiBigTech,
    AiBusinessNews,
    UsPoliticsAndEconomy,
    IndiaPoliticsAndEconomy,
    IndiaGovernmentPolicies,
    Fortune500,
    IndiaCorporate,
    IndiaStartups,
    AiStartups,
    IndiaEconomyAndRareEarth,
}

impl Section {
    pub const ALL: [Section; 13] = [
        Section::WarsAndConflicts,
        Section::IndiaAiMission,
        Section::IndiaSemiconductorMission,
        Section::AiBigTech,
        Section::AiBusinessNews,
        Section::UsPoliticsAndEconomy,
        Section::IndiaPoliticsAndEconomy,
        Section::IndiaGovernmentPolicies,
        Section::Fortune500,
        Section::IndiaCorporate,
        Section::IndiaStartups,
        Section::AiStartups,
        Section::IndiaEconomyAndRareEarth,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Section::WarsAndConflicts => "Wars & Conflicts",
            Section::IndiaAiMission => "India AI Mission",
            Section::IndiaSemiconductorMission => "India Semiconductor Mission",
            Section::AiBigTech => "AI — Big Tech",
            Section::AiBusinessNews => "AI Business News",
            Section::UsPoliticsAndEconomy => "US Politics & Economy",
            Section::IndiaPoliticsAndEconomy => "India Politics & Economy",
            Section::IndiaGovernmentPolicies => "India Government Policies",
            Section::Fortune500 => "Fortune 500",
            Section::IndiaCorporate => "India Corporate",
            Section::IndiaStartups => "India Startups",
            Section::AiStartups => "AI Startups",
            Section::IndiaEconomyAndRareEarth => "India Economy & Rare Earth",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            Section::WarsAndConflicts => "#DC2626",
            Section::IndiaAiMission => "#F59E0B",
            Section::IndiaSemiconductorMission => "#3B82F6",
            Section::AiBigTech => "#8B5CF6",
            Section::AiBusinessNews => "#6366F1",
            Section::UsPoliticsAndEconomy => "#0EA5E9",
            Section::IndiaPoliticsAndEconomy => "#F97316",
            Section::IndiaGovernmentPolicies => "#EF4444",
            Section::Fortune500 => "#10B981",
            Section::IndiaCorporate => "#14B8A6",
            Section::IndiaStartups => "#EC4899",
            Section::AiStartups => "#A855F7",
            Section::IndiaEconomyAndRareEarth => "#78716C",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.label() == label)
    }

    /// Accent color for any label, including ones outside the fixed set
    pub fn color_for_label(label: &str) -> &'static str {
        Self::from_label(label)
            .map(|s| s.color())
            .unwrap_or(DEFAULT_SECTION_COLOR)
    }
}

/// One section's search request: what to ask for and roughly how many stories
#[derive(Debug, Clone)]
pub struct SectionSpec {
    pub section: Section,
    /// Advisory only; the model decides how many it actually returns
    pub count: usize,
    pub query: &'static str,
}

pub static DEFAULT_SECTIONS: [SectionSpec; 13] = [
    SectionSpec {
        section: Section::WarsAndConflicts,
        count: 5,
        query: "Active wars and armed conflicts worldwide: front-line developments, ceasefire talks, humanitarian impact",
    },
    SectionSpec {
        section: Section::IndiaAiMission,
        count: 2,
        query: "IndiaAI Mission updates: compute capacity, foundation model grants, government AI programmes",
    },
    SectionSpec {
        section: Section::IndiaSemiconductorMission,
        count: 2,
        query: "India Semiconductor Mission updates: fab and OSAT approvals, incentives, chip plant construction",
    },
    SectionSpec {
        section: Section::AiBigTech,
        count: 4,
        query: "Latest from OpenAI, Google AI, Microsoft AI, Grok/xAI and Cursor: model launches, products, partnerships",
    },
    SectionSpec {
        section: Section::AiBusinessNews,
        count: 3,
        query: "Global AI business news: funding, acquisitions, enterprise adoption, regulation affecting AI companies",
    },
    SectionSpec {
        section: Section::UsPoliticsAndEconomy,
        count: 3,
        query: "US politics and economy: White House, Congress, Federal Reserve, inflation, jobs, trade policy",
    },
    SectionSpec {
        section: Section::IndiaPoliticsAndEconomy,
        count: 3,
        query: "India politics and economy: national and state politics, RBI, inflation, markets, trade",
    },
    SectionSpec {
        section: Section::IndiaGovernmentPolicies,
        count: 2,
        query: "India government policies: new schemes, cabinet decisions, regulatory changes, ministry announcements",
    },
    SectionSpec {
        section: Section::Fortune500,
        count: 2,
        query: "Fortune 500 company news: earnings, leadership changes, layoffs, major deals",
    },
    SectionSpec {
        section: Section::IndiaCorporate,
        count: 2,
        query: "India corporate news across BFSI, pharma, manufacturing, mining, hospitality and services",
    },
    SectionSpec {
        section: Section::IndiaStartups,
        count: 10,
        query: "Top stories from the India startup ecosystem: funding rounds, IPOs, unicorns, shutdowns",
    },
    SectionSpec {
        section: Section::AiStartups,
        count: 10,
        query: "Top stories from the AI startup ecosystem worldwide: funding rounds, launches, acquisitions",
    },
    SectionSpec {
        section: Section::IndiaEconomyAndRareEarth,
        count: 2,
        query: "India Budget, economics and GDP, and rare earth and critical mineral mining priorities",
    },
];

/// A single curated news item
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Story {
    pub section: String,
    pub headline: String,
    pub source: String,
    pub date: String,
    pub summary: String,
    pub url: String,
}

impl Story {
    /// Build a story from a loosely-typed record, stamping it with `section`.
    ///
    /// Missing or null fields become empty strings; non-string values are
    /// kept as their JSON text. Any `section` the model wrote is ignored.
    pub fn from_record(section: Section, record: &Map<String, Value>) -> Self {
        let field = |key: &str| match record.get(key) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.trim().to_string(),
            Some(other) => other.to_string(),
        };

        Self {
            section: section.label().to_string(),
            headline: field("headline"),
            source: field("source"),
            date: field("date"),
            summary: field("summary"),
            url: field("url"),
        }
    }
}
