//! Synastry reading between two people, as returned by `/compatibility`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::request::ChartRequest;

const NEUTRAL_SCORE: f64 = 50.0;
const KEY_ASPECT_COUNT: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynastryEntry {
    pub p1: String,
    pub p2: String,
    pub aspect: String,
    pub orb: f64,
    pub interpretation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynastryAspect {
    pub aspect: String,
    /// Category the service filed the aspect under.
    pub nature: String,
    pub orb: f64,
    pub person1_planet: String,
    pub person2_planet: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompatibilityInterpretation {
    pub overall: String,
    pub sun_signs: String,
    pub moon_signs: String,
    pub venus: String,
    pub mars: String,
    pub key_aspects: Vec<String>,
}

/// Scores are whole numbers in 0..=100.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailedCompatibilityResult {
    pub overall_compatibility: u8,
    pub aspect_compatibility: u8,
    pub element_compatibility: u8,
    pub house_compatibility: u8,
    pub sign_compatibility: u8,
    pub special_compatibility: u8,
    pub interpretation: CompatibilityInterpretation,
    pub synastry_aspects: Vec<SynastryAspect>,
    pub categorized_synastry: BTreeMap<String, Vec<SynastryEntry>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CompatibilityRequest<'a> {
    pub person1: &'a ChartRequest,
    pub person2: &'a ChartRequest,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawCompatibility {
    compatibility: Option<RawScores>,
    sun1: Option<String>,
    sun2: Option<String>,
    synastry: Option<BTreeMap<String, Vec<RawSynastryEntry>>>,
}

/// Any field may be absent or `null`.
#[derive(Debug, Default, Deserialize)]
struct RawSynastryEntry {
    p1: Option<String>,
    p2: Option<String>,
    aspect: Option<String>,
    orb: Option<f64>,
    interpretation: Option<String>,
}

impl From<RawSynastryEntry> for SynastryEntry {
    fn from(raw: RawSynastryEntry) -> Self {
        SynastryEntry {
            p1: raw.p1.unwrap_or_default(),
            p2: raw.p2.unwrap_or_default(),
            aspect: raw.aspect.unwrap_or_default(),
            orb: raw.orb.filter(|o| o.is_finite()).unwrap_or_default(),
            interpretation: raw.interpretation.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawScores {
    overall_score: Option<f64>,
    communication_score: Option<f64>,
    emotional_score: Option<f64>,
    intimacy_score: Option<f64>,
    overall_explanation: Option<String>,
    emotional_explanation: Option<String>,
    intimacy_explanation: Option<String>,
    communication_explanation: Option<String>,
}

fn score(value: Option<f64>) -> f64 {
    value
        .filter(|v| v.is_finite())
        .unwrap_or(NEUTRAL_SCORE)
        .clamp(0.0, 100.0)
}

fn percent(value: f64) -> u8 {
    value.round().clamp(0.0, 100.0) as u8
}

impl DetailedCompatibilityResult {
    pub(crate) fn from_service(raw: RawCompatibility) -> Self {
        let scores = raw.compatibility.unwrap_or_default();
        let overall = score(scores.overall_score);
        let communication = score(scores.communication_score);
        let emotional = score(scores.emotional_score);
        let intimacy = score(scores.intimacy_score);

        let sun_signs = format!(
            "{} and {}: {}",
            raw.sun1.as_deref().unwrap_or("Unknown"),
            raw.sun2.as_deref().unwrap_or("Unknown"),
            scores.overall_explanation.as_deref().unwrap_or("Analysis not available")
        );

        let categorized_synastry: BTreeMap<String, Vec<SynastryEntry>> = raw
            .synastry
            .unwrap_or_default()
            .into_iter()
            .map(|(category, entries)| {
                (category, entries.into_iter().map(SynastryEntry::from).collect())
            })
            .collect();
        let synastry_aspects: Vec<SynastryAspect> = categorized_synastry
            .iter()
            .flat_map(|(category, entries)| {
                entries.iter().map(move |entry| SynastryAspect {
                    aspect: entry.aspect.clone(),
                    nature: category.clone(),
                    orb: entry.orb,
                    person1_planet: entry.p1.clone(),
                    person2_planet: entry.p2.clone(),
                })
            })
            .collect();

        let mut tightest: Vec<&SynastryAspect> = synastry_aspects.iter().collect();
        tightest.sort_by(|a, b| a.orb.abs().total_cmp(&b.orb.abs()));
        let key_aspects = tightest
            .into_iter()
            .take(KEY_ASPECT_COUNT)
            .map(|a| format!("{} {} {}", a.person1_planet, a.aspect, a.person2_planet))
            .collect();

        DetailedCompatibilityResult {
            overall_compatibility: percent(overall),
            aspect_compatibility: percent(communication),
            element_compatibility: percent(emotional),
            house_compatibility: percent(intimacy),
            sign_compatibility: percent((overall + emotional) / 2.0),
            special_compatibility: percent((communication + emotional + intimacy) / 3.0),
            interpretation: CompatibilityInterpretation {
                sun_signs,
                overall: scores
                    .overall_explanation
                    .unwrap_or_else(|| "Compatibility analysis not available".to_string()),
                moon_signs: scores
                    .emotional_explanation
                    .unwrap_or_else(|| "Moon sign analysis not available".to_string()),
                venus: scores
                    .intimacy_explanation
                    .unwrap_or_else(|| "Venus analysis not available".to_string()),
                mars: scores
                    .communication_explanation
                    .unwrap_or_else(|| "Mars analysis not available".to_string()),
                key_aspects,
            },
            synastry_aspects,
            categorized_synastry,
        }
    }
}
