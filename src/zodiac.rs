//! Sun-sign banding by calendar date.
//!
//! The twelve records below are walked in canonical order starting from Aries;
//! the first band whose start or end month matches wins. Capricorn is the only
//! band crossing the year boundary.

use chrono::{Datelike, Month, NaiveDate};
use serde::Serialize;

use crate::{Element, Quality, ZodiacSign};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct MonthDay {
    pub month: u32,
    pub day: u32,
}

impl MonthDay {
    pub const fn new(month: u32, day: u32) -> Self {
        MonthDay { month, day }
    }

    fn label(&self) -> String {
        let month = u8::try_from(self.month)
            .ok()
            .and_then(|m| Month::try_from(m).ok())
            .map(|m| m.name())
            .unwrap_or("?");
        format!("{} {}", month, self.day)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZodiacSignRecord {
    pub sign: ZodiacSign,
    pub name: &'static str,
    pub symbol: &'static str,
    pub element: Element,
    pub quality: Quality,
    pub date_range_start: MonthDay,
    pub date_range_end: MonthDay,
    pub ruling_planet: &'static str,
    pub traits: &'static [&'static str],
    pub compatible_signs: &'static [ZodiacSign],
}

impl ZodiacSignRecord {
    /// Inclusive band check. Days are not validated against the month length.
    pub fn contains(&self, month: u32, day: u32) -> bool {
        (month == self.date_range_start.month && day >= self.date_range_start.day)
            || (month == self.date_range_end.month && day <= self.date_range_end.day)
    }

    /// Human readable band, e.g. "March 21 - April 19".
    pub fn dates(&self) -> String {
        format!("{} - {}", self.date_range_start.label(), self.date_range_end.label())
    }

    pub fn is_compatible_with(&self, other: ZodiacSign) -> bool {
        self.compatible_signs.contains(&other)
    }
}

pub static ZODIAC_SIGNS: [ZodiacSignRecord; 12] = [
    ZodiacSignRecord {
        sign: ZodiacSign::Aries,
        name: "Aries",
        symbol: "♈",
        element: Element::Fire,
        quality: Quality::Cardinal,
        date_range_start: MonthDay::new(3, 21),
        date_range_end: MonthDay::new(4, 19),
        ruling_planet: "Mars",
        traits: &["Bold", "Energetic", "Pioneering", "Competitive"],
        compatible_signs: &[
            ZodiacSign::Gemini,
            ZodiacSign::Leo,
            ZodiacSign::Sagittarius,
            ZodiacSign::Aquarius,
        ],
    },
    ZodiacSignRecord {
        sign: ZodiacSign::Taurus,
        name: "Taurus",
        symbol: "♉",
        element: Element::Earth,
        quality: Quality::Fixed,
        date_range_start: MonthDay::new(4, 20),
        date_range_end: MonthDay::new(5, 20),
        ruling_planet: "Venus",
        traits: &["Reliable", "Patient", "Practical", "Devoted"],
        compatible_signs: &[
            ZodiacSign::Cancer,
            ZodiacSign::Virgo,
            ZodiacSign::Capricorn,
            ZodiacSign::Pisces,
        ],
    },
    ZodiacSignRecord {
        sign: ZodiacSign::Gemini,
        name: "Gemini",
        symbol: "♊",
        element: Element::Air,
        quality: Quality::Mutable,
        date_range_start: MonthDay::new(5, 21),
        date_range_end: MonthDay::new(6, 20),
        ruling_planet: "Mercury",
        traits: &["Adaptable", "Curious", "Witty", "Communicative"],
        compatible_signs: &[
            ZodiacSign::Aries,
            ZodiacSign::Leo,
            ZodiacSign::Libra,
            ZodiacSign::Aquarius,
        ],
    },
    ZodiacSignRecord {
        sign: ZodiacSign::Cancer,
        name: "Cancer",
        symbol: "♋",
        element: Element::Water,
        quality: Quality::Cardinal,
        date_range_start: MonthDay::new(6, 21),
        date_range_end: MonthDay::new(7, 22),
        ruling_planet: "Moon",
        traits: &["Nurturing", "Intuitive", "Emotional", "Protective"],
        compatible_signs: &[
            ZodiacSign::Taurus,
            ZodiacSign::Virgo,
            ZodiacSign::Scorpio,
            ZodiacSign::Pisces,
        ],
    },
    ZodiacSignRecord {
        sign: ZodiacSign::Leo,
        name: "Leo",
        symbol: "♌",
        element: Element::Fire,
        quality: Quality::Fixed,
        date_range_start: MonthDay::new(7, 23),
        date_range_end: MonthDay::new(8, 22),
        ruling_planet: "Sun",
        traits: &["Confident", "Generous", "Creative", "Dramatic"],
        compatible_signs: &[
            ZodiacSign::Aries,
            ZodiacSign::Gemini,
            ZodiacSign::Libra,
            ZodiacSign::Sagittarius,
        ],
    },
    ZodiacSignRecord {
        sign: ZodiacSign::Virgo,
        name: "Virgo",
        symbol: "♍",
        element: Element::Earth,
        quality: Quality::Mutable,
        date_range_start: MonthDay::new(8, 23),
        date_range_end: MonthDay::new(9, 22),
        ruling_planet: "Mercury",
        traits: &["Analytical", "Practical", "Helpful", "Perfectionist"],
        compatible_signs: &[
            ZodiacSign::Taurus,
            ZodiacSign::Cancer,
            ZodiacSign::Scorpio,
            ZodiacSign::Capricorn,
        ],
    },
    ZodiacSignRecord {
        sign: ZodiacSign::Libra,
        name: "Libra",
        symbol: "♎",
        element: Element::Air,
        quality: Quality::Cardinal,
        date_range_start: MonthDay::new(9, 23),
        date_range_end: MonthDay::new(10, 22),
        ruling_planet: "Venus",
        traits: &["Harmonious", "Diplomatic", "Fair", "Social"],
        compatible_signs: &[
            ZodiacSign::Gemini,
            ZodiacSign::Leo,
            ZodiacSign::Sagittarius,
            ZodiacSign::Aquarius,
        ],
    },
    ZodiacSignRecord {
        sign: ZodiacSign::Scorpio,
        name: "Scorpio",
        symbol: "♏",
        element: Element::Water,
        quality: Quality::Fixed,
        date_range_start: MonthDay::new(10, 23),
        date_range_end: MonthDay::new(11, 21),
        ruling_planet: "Pluto",
        traits: &["Intense", "Passionate", "Mysterious", "Transformative"],
        compatible_signs: &[
            ZodiacSign::Cancer,
            ZodiacSign::Virgo,
            ZodiacSign::Capricorn,
            ZodiacSign::Pisces,
        ],
    },
    ZodiacSignRecord {
        sign: ZodiacSign::Sagittarius,
        name: "Sagittarius",
        symbol: "♐",
        element: Element::Fire,
        quality: Quality::Mutable,
        date_range_start: MonthDay::new(11, 22),
        date_range_end: MonthDay::new(12, 21),
        ruling_planet: "Jupiter",
        traits: &["Adventurous", "Optimistic", "Philosophical", "Free-spirited"],
        compatible_signs: &[
            ZodiacSign::Aries,
            ZodiacSign::Leo,
            ZodiacSign::Libra,
            ZodiacSign::Aquarius,
        ],
    },
    ZodiacSignRecord {
        sign: ZodiacSign::Capricorn,
        name: "Capricorn",
        symbol: "♑",
        element: Element::Earth,
        quality: Quality::Cardinal,
        date_range_start: MonthDay::new(12, 22),
        date_range_end: MonthDay::new(1, 19),
        ruling_planet: "Saturn",
        traits: &["Ambitious", "Disciplined", "Responsible", "Traditional"],
        compatible_signs: &[
            ZodiacSign::Taurus,
            ZodiacSign::Virgo,
            ZodiacSign::Scorpio,
            ZodiacSign::Pisces,
        ],
    },
    ZodiacSignRecord {
        sign: ZodiacSign::Aquarius,
        name: "Aquarius",
        symbol: "♒",
        element: Element::Air,
        quality: Quality::Fixed,
        date_range_start: MonthDay::new(1, 20),
        date_range_end: MonthDay::new(2, 18),
        ruling_planet: "Uranus",
        traits: &["Independent", "Innovative", "Humanitarian", "Eccentric"],
        compatible_signs: &[
            ZodiacSign::Aries,
            ZodiacSign::Gemini,
            ZodiacSign::Libra,
            ZodiacSign::Sagittarius,
        ],
    },
    ZodiacSignRecord {
        sign: ZodiacSign::Pisces,
        name: "Pisces",
        symbol: "♓",
        element: Element::Water,
        quality: Quality::Mutable,
        date_range_start: MonthDay::new(2, 19),
        date_range_end: MonthDay::new(3, 20),
        ruling_planet: "Neptune",
        traits: &["Intuitive", "Compassionate", "Artistic", "Dreamy"],
        compatible_signs: &[
            ZodiacSign::Taurus,
            ZodiacSign::Cancer,
            ZodiacSign::Scorpio,
            ZodiacSign::Capricorn,
        ],
    },
];

/// Sun sign for a (month, day) pair.
///
/// Never fails: anything not matched by an earlier band lands on Pisces.
pub fn band_for(month: u32, day: u32) -> &'static ZodiacSignRecord {
    ZODIAC_SIGNS
        .iter()
        .find(|record| record.contains(month, day))
        .unwrap_or(&ZODIAC_SIGNS[11])
}

pub fn sign_for_date(date: NaiveDate) -> &'static ZodiacSignRecord {
    band_for(date.month(), date.day())
}

pub fn record_for(sign: ZodiacSign) -> &'static ZodiacSignRecord {
    &ZODIAC_SIGNS[sign as usize]
}

/// Local headline shown when the astrology service cannot be reached.
pub fn fallback_horoscope(date: NaiveDate) -> String {
    let record = sign_for_date(date);
    format!(
        "Horoscope for {} {} ({}): ruled by {}, {}.",
        record.symbol,
        record.name,
        record.dates(),
        record.ruling_planet,
        record.traits.join(", ").to_lowercase()
    )
}
