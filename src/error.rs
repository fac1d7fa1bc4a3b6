use thiserror::Error;

// ---------------------------
// ## Error Handling
// ---------------------------

#[derive(Error, Debug)]
pub enum ChartError {
    /// The astrology service answered with a non-success status or payload.
    #[error("{0}")]
    ChartCalculationFailed(String),

    #[error("Malformed cusp configuration: {0}")]
    MalformedCuspConfiguration(String),

    /// Place search failed. Recovered inside the geocoder, never returned.
    #[error("Geocoding unavailable: {0}")]
    GeocodingUnavailable(String),

    /// Timezone lookup failed. Recovered with the local timezone, never returned.
    #[error("Timezone resolution failed: {0}")]
    TimezoneResolutionFailed(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
}

impl ChartError {
    pub fn calculation_failed(message: impl Into<String>) -> Self {
        ChartError::ChartCalculationFailed(message.into())
    }
}
