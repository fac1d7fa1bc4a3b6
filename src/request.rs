//! Birth facts as entered by the user, and the request body the astrology
//! service expects for them.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, NaiveTime, Timelike};
use serde::{Serialize, Serializer};

use crate::config::ReferenceLocation;

/// Wall-clock time of birth. Goes over the wire as `[hour, minute, second]`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ClockTime {
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
}

impl ClockTime {
    pub const NOON: ClockTime = ClockTime { hour: 12, minute: 0, second: 0 };

    pub fn new(hour: u32, minute: u32, second: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, second).map(Self::from)
    }
}

impl From<NaiveTime> for ClockTime {
    fn from(time: NaiveTime) -> Self {
        ClockTime {
            hour: time.hour(),
            minute: time.minute(),
            second: time.second(),
        }
    }
}

impl FromStr for ClockTime {
    type Err = chrono::ParseError;

    /// Accepts `HH:MM` or `HH:MM:SS`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        NaiveTime::parse_from_str(s, "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
            .map(ClockTime::from)
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl Serialize for ClockTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        [self.hour, self.minute, self.second].serialize(serializer)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BirthTime {
    Known(ClockTime),
    /// The user does not know the time; noon is substituted.
    Unknown,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Female,
    Male,
    Other,
}

impl Gender {
    /// Maps questionnaire answers ("Women", "Man", ...) onto the service's values.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "female" | "woman" | "women" => Gender::Female,
            "male" | "man" | "men" => Gender::Male,
            _ => Gender::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BirthFacts {
    pub name: Option<String>,
    pub date: NaiveDate,
    pub time: BirthTime,
    pub place: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub gender: Gender,
}

impl BirthFacts {
    pub fn new(date: NaiveDate, time: BirthTime, place: impl Into<String>, gender: Gender) -> Self {
        BirthFacts {
            name: None,
            date,
            time,
            place: place.into(),
            latitude: None,
            longitude: None,
            gender,
        }
    }

    pub fn with_coordinates(mut self, latitude: f64, longitude: f64) -> Self {
        self.latitude = Some(latitude);
        self.longitude = Some(longitude);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Explicit coordinates when both are present, the reference location otherwise.
    pub fn coordinates(&self, fallback: &ReferenceLocation) -> (f64, f64) {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) if lat.is_finite() && lng.is_finite() => (lat, lng),
            _ => (fallback.latitude, fallback.longitude),
        }
    }

    /// The entered time, or noon when it is unknown.
    pub fn clock_time(&self) -> ClockTime {
        match self.time {
            BirthTime::Known(time) => time,
            BirthTime::Unknown => ClockTime::NOON,
        }
    }

    pub fn build_request(&self, fallback: &ReferenceLocation) -> ChartRequest {
        let (lat, lng) = self.coordinates(fallback);
        ChartRequest {
            name: self.name.clone(),
            birth_date: [self.date.year(), self.date.month() as i32, self.date.day() as i32],
            birth_time: self.clock_time(),
            birth_place: self.place.clone(),
            gender: self.gender,
            lat,
            lng,
            timezone: None,
        }
    }
}

/// Request body for one person, as posted to the astrology service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub birth_date: [i32; 3],
    pub birth_time: ClockTime,
    pub birth_place: String,
    pub gender: Gender,
    pub lat: f64,
    pub lng: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

impl ChartRequest {
    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = Some(timezone.into());
        self
    }

    pub fn date_label(&self) -> String {
        let [year, month, day] = self.birth_date;
        format!("{:04}-{:02}-{:02}", year, month, day)
    }

    pub fn coordinates_label(&self) -> String {
        format!("{}, {}", self.lat, self.lng)
    }

    pub fn birth_date(&self) -> Option<NaiveDate> {
        let [year, month, day] = self.birth_date;
        NaiveDate::from_ymd_opt(year, month as u32, day as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn june_15() -> NaiveDate {
        NaiveDate::from_ymd_opt(1990, 6, 15).unwrap()
    }

    #[test]
    fn test_unknown_time_encodes_noon() {
        let facts = BirthFacts::new(june_15(), BirthTime::Unknown, "Anywhere", Gender::Other);
        for fallback in [ReferenceLocation::new_york(), ReferenceLocation::paris()] {
            let request = facts.build_request(&fallback);
            assert_eq!(request.birth_time.to_string(), "12:00");
            assert_eq!(serde_json::to_value(&request).unwrap()["birth_time"], json!([12, 0, 0]));
        }
    }

    #[test]
    fn test_known_time_is_kept() {
        let time = ClockTime::new(7, 10, 0).unwrap();
        let facts = BirthFacts::new(june_15(), BirthTime::Known(time), "Calicut", Gender::Male);
        let request = facts.build_request(&ReferenceLocation::new_york());
        assert_eq!(request.birth_time.to_string(), "07:10");
    }

    #[test]
    fn test_explicit_coordinates_override_reference_location() {
        let facts = BirthFacts::new(june_15(), BirthTime::Unknown, "Paris, France", Gender::Female)
            .with_coordinates(48.8566, 2.3522);
        let request = facts.build_request(&ReferenceLocation::new_york());

        assert_eq!(request.lat, 48.8566);
        assert_eq!(request.lng, 2.3522);
        assert_eq!(request.birth_place, "Paris, France");
        assert_eq!(request.date_label(), "1990-06-15");
        assert_eq!(request.coordinates_label(), "48.8566, 2.3522");
    }

    #[test]
    fn test_missing_coordinates_use_reference_location() {
        let facts = BirthFacts {
            latitude: Some(10.0),
            ..BirthFacts::new(june_15(), BirthTime::Unknown, "Somewhere", Gender::Other)
        };
        let request = facts.build_request(&ReferenceLocation::new_york());
        assert_eq!((request.lat, request.lng), (40.7128, -74.0060));
    }

    #[test]
    fn test_wire_shape() {
        let time = BirthTime::Known("08:30".parse().unwrap());
        let facts = BirthFacts::new(june_15(), time, "Kochi", Gender::from_label("Women"))
            .with_coordinates(9.9312, 76.2673);
        let request = facts
            .build_request(&ReferenceLocation::new_york())
            .with_timezone("Asia/Kolkata");

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "birth_date": [1990, 6, 15],
                "birth_time": [8, 30, 0],
                "birth_place": "Kochi",
                "gender": "female",
                "lat": 9.9312,
                "lng": 76.2673,
                "timezone": "Asia/Kolkata"
            })
        );
    }

    #[test]
    fn test_clock_time_parsing() {
        assert_eq!("12:00".parse::<ClockTime>().unwrap());
        assert_eq!("23:59:30".parse::<ClockTime>().unwrap(), ClockTime::new(23, 59, 30).unwrap());
        assert!("25:00".parse::<ClockTime>().is_err());
        assert!(ClockTime::new(24, 0, 0).is_none());
    }

    #[test]
    fn test_gender_labels() {
        assert_eq!(Gender::from_label("Man"), Gender::Male);
        assert_eq!(Gender::from_label("FEMALE"), Gender::Female);
        assert_eq!(Gender::from_label("prefer not to say"), Gender::Other);
    }
}
