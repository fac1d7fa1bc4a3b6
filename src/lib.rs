// src/lib.rs

use serde::{Deserialize, Serialize};
use std::fmt;

pub mod chart;
pub mod client;
pub mod compatibility;
pub mod config;
pub mod error;
pub mod geocode;
pub mod houses;
pub mod predictions;
pub mod request;
pub mod zodiac;

pub use chart::{BirthChartData, BirthInfoBlock, HouseRecord, PlanetPlacement};
pub use client::{AstrologyClient, CalculationState};
pub use compatibility::DetailedCompatibilityResult;
pub use config::{ClientConfig, ReferenceLocation};
pub use error::ChartError;
pub use geocode::PlaceCandidate;
pub use houses::{resolve_house, HouseCusps};
pub use predictions::{CategorizedTransit, PredictionData};
pub use request::{BirthFacts, BirthTime, ChartRequest, ClockTime, Gender};
pub use zodiac::{band_for, record_for, sign_for_date, ZodiacSignRecord, ZODIAC_SIGNS};

// ---------------------------
// ## Enumerations
// ---------------------------

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ZodiacSign {
    Aries = 0,
    Taurus,
    Gemini,
    Cancer,
    Leo,
    Virgo,
    Libra,
    Scorpio,
    Sagittarius,
    Capricorn,
    Aquarius,
    Pisces,
}

impl ZodiacSign {
    /// Canonical order, starting from Aries.
    pub const ALL: [ZodiacSign; 12] = [
        ZodiacSign::Aries,
        ZodiacSign::Taurus,
        ZodiacSign::Gemini,
        ZodiacSign::Cancer,
        ZodiacSign::Leo,
        ZodiacSign::Virgo,
        ZodiacSign::Libra,
        ZodiacSign::Scorpio,
        ZodiacSign::Sagittarius,
        ZodiacSign::Capricorn,
        ZodiacSign::Aquarius,
        ZodiacSign::Pisces,
    ];

    /// Tropical sign for an ecliptic longitude, in 30° sectors from 0° Aries.
    pub fn from_longitude(longitude: f64) -> Self {
        let normalized_longitude = longitude.rem_euclid(360.0);
        let sign_index = (normalized_longitude / 30.0).floor() as usize;
        Self::ALL.get(sign_index).copied().unwrap_or(ZodiacSign::Aries)
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|sign| sign.name().eq_ignore_ascii_case(name.trim()))
    }

    pub fn name(&self) -> &'static str {
        match self {
            ZodiacSign::Aries => "Aries",
            ZodiacSign::Taurus => "Taurus",
            ZodiacSign::Gemini => "Gemini",
            ZodiacSign::Cancer => "Cancer",
            ZodiacSign::Leo => "Leo",
            ZodiacSign::Virgo => "Virgo",
            ZodiacSign::Libra => "Libra",
            ZodiacSign::Scorpio => "Scorpio",
            ZodiacSign::Sagittarius => "Sagittarius",
            ZodiacSign::Capricorn => "Capricorn",
            ZodiacSign::Aquarius => "Aquarius",
            ZodiacSign::Pisces => "Pisces",
        }
    }
}

impl fmt::Display for ZodiacSign {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Element {
    Fire,
    Earth,
    Air,
    Water,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    Cardinal,
    Fixed,
    Mutable,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CelestialBody {
    Sun,
    Moon,
    Mercury,
    Venus,
    Mars,
    Jupiter,
    Saturn,
    Uranus,
    Neptune,
    Pluto,
}

impl CelestialBody {
    pub fn iter() -> impl Iterator<Item = CelestialBody> {
        [
            CelestialBody::Sun,
            CelestialBody::Moon,
            CelestialBody::Mercury,
            CelestialBody::Venus,
            CelestialBody::Mars,
            CelestialBody::Jupiter,
            CelestialBody::Saturn,
            CelestialBody::Uranus,
            CelestialBody::Neptune,
            CelestialBody::Pluto,
        ]
        .iter()
        .copied()
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::iter().find(|body| body.name().eq_ignore_ascii_case(name.trim()))
    }

    pub fn name(&self) -> &'static str {
        match self {
            CelestialBody::Sun => "Sun",
            CelestialBody::Moon => "Moon",
            CelestialBody::Mercury => "Mercury",
            CelestialBody::Venus => "Venus",
            CelestialBody::Mars => "Mars",
            CelestialBody::Jupiter => "Jupiter",
            CelestialBody::Saturn => "Saturn",
            CelestialBody::Uranus => "Uranus",
            CelestialBody::Neptune => "Neptune",
            CelestialBody::Pluto => "Pluto",
        }
    }

    /// Display glyph used next to planet placements.
    pub fn symbol(&self) -> &'static str {
        match self {
            CelestialBody::Sun => "☉",
            CelestialBody::Moon => "☽",
            CelestialBody::Mercury => "☿",
            CelestialBody::Venus => "♀",
            CelestialBody::Mars => "♂",
            CelestialBody::Jupiter => "♃",
            CelestialBody::Saturn => "♄",
            CelestialBody::Uranus => "♅",
            CelestialBody::Neptune => "♆",
            CelestialBody::Pluto => "♇",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum House {
    First = 1,
    Second,
    Third,
    Fourth,
    Fifth,
    Sixth,
    Seventh,
    Eighth,
    Ninth,
    Tenth,
    Eleventh,
    Twelfth,
}

impl House {
    pub fn from_index(index: usize) -> Option<House> {
        match index {
            1 => Some(House::First),
            2 => Some(House::Second),
            3 => Some(House::Third),
            4 => Some(House::Fourth),
            5 => Some(House::Fifth),
            6 => Some(House::Sixth),
            7 => Some(House::Seventh),
            8 => Some(House::Eighth),
            9 => Some(House::Ninth),
            10 => Some(House::Tenth),
            11 => Some(House::Eleventh),
            12 => Some(House::Twelfth),
            _ => None,
        }
    }

    pub fn all() -> impl Iterator<Item = House> {
        (1..=12).filter_map(House::from_index)
    }

    pub fn number(&self) -> u8 {
        *self as u8
    }

    /// The house that follows this one around the wheel, 12 wrapping to 1.
    pub fn next(&self) -> House {
        House::from_index(self.number() as usize % 12 + 1).unwrap_or(House::First)
    }

    pub fn meaning(&self) -> &'static str {
        houses::HOUSE_MEANINGS[self.number() as usize - 1]
    }
}

impl fmt::Display for House {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}
