use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceLocation {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl ReferenceLocation {
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        ReferenceLocation {
            name: name.into(),
            latitude,
            longitude,
        }
    }

    pub fn new_york() -> Self {
        ReferenceLocation::new("New York", 40.7128, -74.0060)
    }

    pub fn paris() -> Self {
        ReferenceLocation::new("Paris", 48.8566, 2.3522)
    }
}

/// Endpoints and defaults used by [`crate::AstrologyClient`].
///
/// Every field has a default, so a config file only needs the keys it changes.
/// Environment variables prefixed with `AZTRO_` override the file, nested keys
/// separated by `__` (e.g. `AZTRO_DEFAULT_CHART_LOCATION__LATITUDE`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub timezone_url: String,
    pub geocoder_url: String,
    pub geocoder_limit: u32,
    pub request_timeout_secs: u64,
    /// Used for birth charts entered without coordinates.
    pub default_chart_location: ReferenceLocation,
    /// Used for compatibility and prediction requests without coordinates.
    pub default_partner_location: ReferenceLocation,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://new-astrology-backend.onrender.com".to_string(),
            timezone_url: "https://api.geotimezone.com/public/timezone".to_string(),
            geocoder_url: "https://photon.komoot.io".to_string(),
            geocoder_limit: 8,
            request_timeout_secs: 30,
            default_chart_location: ReferenceLocation::new_york(),
            default_partner_location: ReferenceLocation::paris(),
        }
    }
}

impl ClientConfig {
    /// Loads defaults, then the optional file at `path`, then `AZTRO_*` variables.
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::with_name(path));
        }
        let s = builder
            .add_source(
                Environment::with_prefix("AZTRO")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        let config: ClientConfig = s.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_base_url.trim().is_empty() {
            return Err(ConfigError::Message("api_base_url must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_base_url.trim_end_matches('/'), path.trim_start_matches('/'))
    }
}
