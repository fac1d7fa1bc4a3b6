//! Transit predictions from `/transit`, grouped per period and per life area.

use serde::{Deserialize, Serialize};

use crate::request::ChartRequest;

/// Periods requested from the service, in the order they are reported.
pub const PREDICTION_PERIODS: [&str; 5] =
    ["today", "tomorrow", "week-end", "month-end", "year-end"];

const PERSONAL_CATEGORIES: [&str; 3] = ["Identity", "Emotion", "Self"];
const CAREER_CATEGORIES: [&str; 3] = ["Career", "Ambition", "Status"];
const RELATIONSHIP_CATEGORIES: [&str; 3] = ["Relationships", "Love", "Partnership"];
const HEALTH_CATEGORIES: [&str; 3] = ["Health", "Wellness", "Energy"];

const NO_TRANSITS: &str = "No transits available for this period";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorizedTransit {
    /// e.g. "Mars square Sun"
    pub planet: String,
    pub category: String,
    pub interpretation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionData {
    pub today: String,
    pub tomorrow: String,
    pub this_week: String,
    pub this_month: String,
    pub this_year: String,
    pub personal_insights: Vec<CategorizedTransit>,
    pub career_guidance: Vec<CategorizedTransit>,
    pub relationship_advice: Vec<CategorizedTransit>,
    pub health_wellness: Vec<CategorizedTransit>,
}

#[derive(Debug, Serialize)]
pub(crate) struct TransitRequest<'a> {
    pub user: &'a ChartRequest,
    pub period: &'static [&'static str],
}

/// The service sends interpretations either as one string or as sentences.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum InterpretationText {
    Text(String),
    Lines(Vec<String>),
}

impl InterpretationText {
    fn joined(&self) -> String {
        match self {
            InterpretationText::Text(text) => text.clone(),
            InterpretationText::Lines(lines) => lines.join(" "),
        }
    }
}

/// Any field may be absent or `null`.
#[derive(Debug, Clone, Deserialize)]
struct RawTransit {
    date: Option<String>,
    transiting_planet: Option<String>,
    natal_planet: Option<String>,
    aspect_type: Option<String>,
    category: Option<String>,
    interpretation: Option<InterpretationText>,
}

impl RawTransit {
    fn title(&self) -> String {
        format!(
            "{} {} {}",
            self.transiting_planet.as_deref().unwrap_or_default(),
            self.aspect_type.as_deref().unwrap_or_default(),
            self.natal_planet.as_deref().unwrap_or_default()
        )
    }

    fn category(&self) -> &str {
        self.category.as_deref().unwrap_or("General")
    }

    fn text(&self) -> Option<String> {
        self.interpretation.as_ref().map(InterpretationText::joined)
    }

    fn categorized(&self) -> CategorizedTransit {
        CategorizedTransit {
            planet: self.title(),
            category: self.category().to_string(),
            interpretation: self
                .text()
                .unwrap_or_else(|| "No interpretation available".to_string()),
            date: self.date.clone(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawPredictions {
    today: Option<Vec<RawTransit>>,
    tomorrow: Option<Vec<RawTransit>>,
    #[serde(rename = "week-end")]
    week_end: Option<Vec<RawTransit>>,
    #[serde(rename = "month-end")]
    month_end: Option<Vec<RawTransit>>,
    #[serde(rename = "year-end")]
    year_end: Option<Vec<RawTransit>>,
}

fn format_period(transits: &[RawTransit]) -> String {
    if transits.is_empty() {
        return NO_TRANSITS.to_string();
    }
    transits
        .iter()
        .map(|t| format!("{} ({}): {}", t.title(), t.category(), t.text().unwrap_or_default()))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn in_categories(transits: &[&RawTransit], categories: &[&str]) -> Vec<CategorizedTransit> {
    transits
        .iter()
        .filter(|t| t.category.as_deref().is_some_and(|c| categories.contains(&c)))
        .map(|t| t.categorized())
        .collect()
}

impl PredictionData {
    pub(crate) fn from_service(raw: RawPredictions) -> Self {
        let today = raw.today.unwrap_or_default();
        let tomorrow = raw.tomorrow.unwrap_or_default();
        let week_end = raw.week_end.unwrap_or_default();
        let month_end = raw.month_end.unwrap_or_default();
        let year_end = raw.year_end.unwrap_or_default();

        let all: Vec<&RawTransit> = today
            .iter()
            .chain(&tomorrow)
            .chain(&week_end)
            .chain(&month_end)
            .chain(&year_end)
            .collect();

        PredictionData {
            today: format_period(&today),
            tomorrow: format_period(&tomorrow),
            this_week: format_period(&week_end),
            this_month: format_period(&month_end),
            this_year: format_period(&year_end),
            personal_insights: in_categories(&all, &PERSONAL_CATEGORIES),
            career_guidance: in_categories(&all, &CAREER_CATEGORIES),
            relationship_advice: in_categories(&all, &RELATIONSHIP_CATEGORIES),
            health_wellness: in_categories(&all, &HEALTH_CATEGORIES),
        }
    }
}
