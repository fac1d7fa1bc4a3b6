use serde::{Deserialize, Serialize};

use crate::request::ChartRequest;
use crate::zodiac::band_for;
use crate::{CelestialBody, House};

// ---------------------------
// ## Structures
// ---------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanetPlacement {
    pub name: String,
    pub sign: String,
    /// Degree within the sign, 0..30.
    pub degree: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub house: Option<u8>,
    pub symbol: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HouseRecord {
    pub number: u8,
    pub sign: String,
    pub degree: f64,
    pub meaning: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BirthInfoBlock {
    pub date: String,
    pub time: String,
    pub place: String,
    pub coordinates: String,
    pub timezone: String,
}

/// A normalized birth chart, built once per successful service call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BirthChartData {
    pub sun_sign: String,
    pub moon_sign: String,
    pub rising_sign: String,
    pub planets: Vec<PlanetPlacement>,
    pub houses: Vec<HouseRecord>,
    pub birth_info: BirthInfoBlock,
    pub sign_interpretations: Vec<String>,
    pub house_interpretations: Vec<String>,
    pub aspect_interpretations: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interpretation: Option<String>,
}

// ---------------------------
// ## Service payload
// ---------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawBirthChart {
    sun_sign: Option<String>,
    moon_sign: Option<String>,
    rising_sign: Option<String>,
    planets: Option<Vec<RawPlanet>>,
    houses: Option<Vec<RawHouse>>,
    birth_info: Option<RawBirthInfo>,
    sign_interpretations: Option<Vec<String>>,
    house_interpretations: Option<Vec<String>>,
    aspect_interpretations: Option<Vec<String>>,
    interpretation: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawPlanet {
    name: Option<String>,
    sign: Option<String>,
    degree: Option<f64>,
    house: Option<u8>,
    symbol: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawHouse {
    number: u8,
    sign: Option<String>,
    degree: Option<f64>,
    meaning: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawBirthInfo {
    date: Option<String>,
    time: Option<String>,
    place: Option<String>,
    coordinates: Option<String>,
    timezone: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

impl BirthChartData {
    /// Maps the service's `data` object onto a chart, filling gaps from the
    /// request that produced it and from the static sign, planet and house tables.
    pub(crate) fn from_service(raw: RawBirthChart, request: &ChartRequest) -> Self {
        let sun_sign = non_empty(raw.sun_sign).unwrap_or_else(|| {
            let [_, month, day] = request.birth_date;
            band_for(month as u32, day as u32).name.to_string()
        });
        let moon_sign = non_empty(raw.moon_sign).unwrap_or_default();
        let rising_sign = non_empty(raw.rising_sign).unwrap_or_default();

        let planets = raw
            .planets
            .unwrap_or_default()
            .into_iter()
            .map(|planet| {
                let name = planet.name.unwrap_or_default();
                let symbol = non_empty(planet.symbol).unwrap_or_else(|| {
                    CelestialBody::from_name(&name)
                        .map(|body| body.symbol().to_string())
                        .unwrap_or_default()
                });
                PlanetPlacement {
                    sign: planet.sign.unwrap_or_default(),
                    degree: planet.degree.unwrap_or_default(),
                    house: planet.house,
                    symbol,
                    name,
                }
            })
            .collect();

        let houses = raw
            .houses
            .unwrap_or_default()
            .into_iter()
            .map(|house| {
                let meaning = non_empty(house.meaning).unwrap_or_else(|| {
                    House::from_index(house.number as usize)
                        .map(|h| h.meaning().to_string())
                        .unwrap_or_default()
                });
                HouseRecord {
                    number: house.number,
                    sign: house.sign.unwrap_or_default(),
                    degree: house.degree.unwrap_or_default(),
                    meaning,
                }
            })
            .collect();

        let info = raw.birth_info.unwrap_or_default();
        let birth_info = BirthInfoBlock {
            date: non_empty(info.date).unwrap_or_else(|| request.date_label()),
            time: non_empty(info.time).unwrap_or_else(|| request.birth_time.to_string()),
            place: non_empty(info.place).unwrap_or_else(|| request.birth_place.clone()),
            coordinates: non_empty(info.coordinates).unwrap_or_else(|| request.coordinates_label()),
            timezone: non_empty(info.timezone)
                .or_else(|| request.timezone.clone())
                .unwrap_or_else(|| "UTC".to_string()),
        };

        let interpretation = non_empty(raw.interpretation).unwrap_or_else(|| {
            format!(
                "You are a {} with {} Moon and {} Rising.",
                sun_sign, moon_sign, rising_sign
            )
        });

        BirthChartData {
            sun_sign,
            moon_sign,
            rising_sign,
            planets,
            houses,
            birth_info,
            sign_interpretations: raw.sign_interpretations.unwrap_or_default(),
            house_interpretations: raw.house_interpretations.unwrap_or_default(),
            aspect_interpretations: raw.aspect_interpretations.unwrap_or_default(),
            interpretation: Some(interpretation),
        }
    }

    pub fn planet(&self, name: &str) -> Option<&PlanetPlacement> {
        self.planets.iter().find(|p| p.name.eq_ignore_ascii_case(name))
    }
}
