//! House placement from a fixed set of twelve cusp longitudes.

use std::collections::BTreeMap;

use crate::chart::HouseRecord;
use crate::error::ChartError;
use crate::{House, ZodiacSign};

pub const HOUSE_MEANINGS: [&str; 12] = [
    "Self & Identity",
    "Money & Possessions",
    "Communication",
    "Home & Family",
    "Creativity & Romance",
    "Health & Work",
    "Relationships",
    "Transformation",
    "Philosophy & Travel",
    "Career & Status",
    "Friendships & Goals",
    "Spirituality & Subconscious",
];

const FULL_CIRCLE: f64 = 360.0;
const SPAN_TOLERANCE: f64 = 1e-6;

/// Twelve cusp longitudes, indexed by house number.
///
/// Construction checks that every house 1..=12 appears exactly once and that
/// walking the cusps from house 1 around to house 12 and back covers the
/// circle exactly once.
#[derive(Debug, Clone, PartialEq)]
pub struct HouseCusps {
    cusps: [f64; 12],
}

impl HouseCusps {
    pub fn new(entries: impl IntoIterator<Item = (u8, f64)>) -> Result<Self, ChartError> {
        let mut cusps: [Option<f64>; 12] = [None; 12];
        let mut count = 0usize;

        for (number, degree) in entries {
            count += 1;
            let house = House::from_index(number as usize).ok_or_else(|| {
                ChartError::MalformedCuspConfiguration(format!(
                    "house number {} out of range",
                    number
                ))
            })?;
            if !degree.is_finite() {
                return Err(ChartError::MalformedCuspConfiguration(format!(
                    "cusp of house {} is not a finite degree",
                    house
                )));
            }
            let slot = &mut cusps[house.number() as usize - 1];
            if slot.is_some() {
                return Err(ChartError::MalformedCuspConfiguration(format!(
                    "house {} listed more than once",
                    house
                )));
            }
            *slot = Some(degree.rem_euclid(FULL_CIRCLE));
        }

        if count != 12 {
            return Err(ChartError::MalformedCuspConfiguration(format!(
                "expected 12 cusps, got {}",
                count
            )));
        }

        let mut degrees = [0.0; 12];
        for (index, cusp) in cusps.iter().enumerate() {
            degrees[index] = cusp.ok_or_else(|| {
                ChartError::MalformedCuspConfiguration(format!("house {} missing", index + 1))
            })?;
        }

        let result = HouseCusps { cusps: degrees };
        result.check_partition()?;
        Ok(result)
    }

    /// Cusps given in house order, house 1 first.
    pub fn from_degrees(degrees: [f64; 12]) -> Result<Self, ChartError> {
        Self::new(degrees.into_iter().enumerate().map(|(i, d)| (i as u8 + 1, d)))
    }

    /// Equal-house layout: thirty degree houses starting at the ascendant.
    pub fn equal(ascendant: f64) -> Result<Self, ChartError> {
        if !ascendant.is_finite() {
            return Err(ChartError::MalformedCuspConfiguration(format!(
                "ascendant {} is not a finite degree",
                ascendant
            )));
        }
        let start = ascendant.rem_euclid(FULL_CIRCLE);
        let mut cusps = [0.0; 12];
        for (index, cusp) in cusps.iter_mut().enumerate() {
            *cusp = start + 30.0 * index as f64;
        }
        Self::from_degrees(cusps)
    }

    /// Cusps as the astrology service sends them: `{"1": 12.5, "2": 40.1, ...}`.
    pub fn from_service_map(map: &BTreeMap<String, f64>) -> Result<Self, ChartError> {
        let entries = map
            .iter()
            .map(|(key, degree)| {
                key.trim()
                    .parse::<u8>()
                    .map(|number| (number, *degree))
                    .map_err(|_| {
                        let message = format!("invalid house key {:?}", key);
                        ChartError::MalformedCuspConfiguration(message)
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(entries)
    }

    pub fn cusp(&self, house: House) -> f64 {
        self.cusps[house.number() as usize - 1]
    }

    pub fn iter(&self) -> impl Iterator<Item = (House, f64)> + '_ {
        House::all().map(move |house| (house, self.cusp(house)))
    }

    /// One display record per house, sign taken from the cusp longitude.
    pub fn house_records(&self) -> Vec<HouseRecord> {
        self.iter()
            .map(|(house, degree)| HouseRecord {
                number: house.number(),
                sign: ZodiacSign::from_longitude(degree).to_string(),
                degree,
                meaning: house.meaning().to_string(),
            })
            .collect()
    }

    fn check_partition(&self) -> Result<(), ChartError> {
        let mut total = 0.0;
        for (house, start) in self.iter() {
            let arc = (self.cusp(house.next()) - start).rem_euclid(FULL_CIRCLE);
            if arc <= 0.0 {
                return Err(ChartError::MalformedCuspConfiguration(format!(
                    "houses {} and {} share cusp {:.4}",
                    house,
                    house.next(),
                    start
                )));
            }
            total += arc;
        }
        if (total - FULL_CIRCLE).abs() > SPAN_TOLERANCE {
            return Err(ChartError::MalformedCuspConfiguration(format!(
                "cusps span {:.4} degrees instead of one full circle",
                total
            )));
        }
        Ok(())
    }
}

/// House that contains `longitude`.
///
/// Each house spans `[cusp, next cusp)`; a house whose next cusp is not larger
/// than its own crosses 0° and is compared in a frame rotated by 360°. A
/// longitude exactly on a cusp belongs to the house that cusp opens.
pub fn resolve_house(longitude: f64, cusps: &HouseCusps) -> Result<House, ChartError> {
    let longitude = longitude.rem_euclid(FULL_CIRCLE);

    for (house, start) in cusps.iter() {
        let mut end = cusps.cusp(house.next());
        if end <= start {
            end += FULL_CIRCLE;
        }

        let mut adjusted = longitude;
        if longitude < start && end > FULL_CIRCLE {
            adjusted += FULL_CIRCLE;
        }

        if adjusted >= start && adjusted < end {
            return Ok(house);
        }
    }

    Err(ChartError::MalformedCuspConfiguration(format!(
        "no house contains longitude {}",
        longitude
    )))
}
