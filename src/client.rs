//! Async client for the astrology service.
//!
//! Every calculation is one POST to the service. Timezone lookup and place
//! search are best effort and never fail the caller. There are no retries: a
//! failed attempt is reported and the caller decides whether to try again.

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::chart::{BirthChartData, RawBirthChart};
use crate::compatibility::{CompatibilityRequest, DetailedCompatibilityResult, RawCompatibility};
use crate::config::{ClientConfig, ReferenceLocation};
use crate::error::ChartError;
use crate::geocode::{self, PlaceCandidate};
use crate::predictions::{PredictionData, RawPredictions, TransitRequest, PREDICTION_PERIODS};
use crate::request::{BirthFacts, ChartRequest};

const SUCCESS_STATUS: &str = "success";
const INVALID_RESPONSE: &str = "Invalid response from server";

/// Envelope shared by every calculation endpoint.
#[derive(Debug, Deserialize)]
struct ServiceEnvelope<T> {
    status: Option<String>,
    message: Option<String>,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TimezoneResponse {
    #[serde(rename = "timezoneId", alias = "iana_timezone")]
    timezone_id: Option<String>,
}

// ---------------------------
// ## Calculation state
// ---------------------------

/// Lifecycle of one calculation attempt:
/// `Idle -> Requesting -> Succeeded | Failed`.
#[derive(Debug)]
pub enum CalculationState<T> {
    Idle,
    Requesting,
    Succeeded(T),
    Failed(ChartError),
}

impl<T> Default for CalculationState<T> {
    fn default() -> Self {
        CalculationState::Idle
    }
}

impl<T> CalculationState<T> {
    /// Starts a fresh attempt, discarding whatever the previous one produced.
    pub fn begin(&mut self) {
        *self = CalculationState::Requesting;
    }

    /// Records the outcome. Ignored unless an attempt is in flight.
    pub fn finish(&mut self, result: Result<T, ChartError>) -> bool {
        if !matches!(self, CalculationState::Requesting) {
            return false;
        }
        *self = match result {
            Ok(value) => CalculationState::Succeeded(value),
            Err(e) => CalculationState::Failed(e),
        };
        true
    }

    pub fn reset(&mut self) {
        *self = CalculationState::Idle;
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, CalculationState::Succeeded(_) | CalculationState::Failed(_))
    }

    pub fn result(&self) -> Option<&T> {
        match self {
            CalculationState::Succeeded(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&ChartError> {
        match self {
            CalculationState::Failed(e) => Some(e),
            _ => None,
        }
    }
}

// ---------------------------
// ## AstrologyClient
// ---------------------------

#[derive(Debug, Clone)]
pub struct AstrologyClient {
    client: Client,
    config: ClientConfig,
}

impl AstrologyClient {
    pub fn new(config: ClientConfig) -> Result<Self, ChartError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    /// Uses a caller-provided transport, e.g. one with proxies or custom TLS.
    pub fn with_client(client: Client, config: ClientConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Request body for a birth chart, without the timezone.
    pub fn build_request(&self, facts: &BirthFacts) -> ChartRequest {
        facts.build_request(&self.config.default_chart_location)
    }

    fn build_partner_request(&self, facts: &BirthFacts) -> ChartRequest {
        facts.build_request(&self.config.default_partner_location)
    }

    /// IANA timezone for a coordinate pair. Falls back to the local timezone
    /// on any failure and never returns an error.
    pub async fn resolve_timezone(&self, latitude: f64, longitude: f64) -> String {
        match self.lookup_timezone(latitude, longitude).await {
            Ok(timezone) => timezone,
            Err(e) => {
                let fallback = local_timezone();
                tracing::warn!(
                    latitude,
                    longitude,
                    error = %e,
                    fallback = %fallback,
                    "Timezone lookup failed, using local timezone"
                );
                fallback
            }
        }
    }

    async fn lookup_timezone(&self, latitude: f64, longitude: f64) -> Result<String, ChartError> {
        let url = format!(
            "{}?latitude={}&longitude={}",
            self.config.timezone_url, latitude, longitude
        );
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ChartError::TimezoneResolutionFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ChartError::TimezoneResolutionFailed(format!("HTTP {}", response.status())));
        }

        let body: TimezoneResponse = response
            .json()
            .await
            .map_err(|e| ChartError::TimezoneResolutionFailed(e.to_string()))?;

        body.timezone_id
            .filter(|tz| !tz.trim().is_empty())
            .ok_or_else(|| {
                ChartError::TimezoneResolutionFailed("response has no timezone".to_string())
            })
    }

    /// Builds the request, resolves its timezone and submits it.
    pub async fn calculate_birth_chart(
        &self,
        facts: &BirthFacts,
    ) -> Result<BirthChartData, ChartError> {
        let request = self.build_request(facts);
        let timezone = self.resolve_timezone(request.lat, request.lng).await;
        self.submit(&request.with_timezone(timezone)).await
    }

    /// One POST to `/birth-chart`, normalized into a [`BirthChartData`].
    pub async fn submit(&self, request: &ChartRequest) -> Result<BirthChartData, ChartError> {
        let raw: RawBirthChart = self
            .post("birth-chart", request, "Failed to calculate birth chart")
            .await?;
        Ok(BirthChartData::from_service(raw, request))
    }

    /// Runs [`Self::calculate_birth_chart`] through a [`CalculationState`].
    pub async fn run_birth_chart(
        &self,
        state: &mut CalculationState<BirthChartData>,
        facts: &BirthFacts,
    ) {
        state.begin();
        let result = self.calculate_birth_chart(facts).await;
        state.finish(result);
    }

    pub async fn calculate_detailed_compatibility(
        &self,
        person1: &BirthFacts,
        person2: &BirthFacts,
    ) -> Result<DetailedCompatibilityResult, ChartError> {
        let first = self.build_partner_request(person1);
        let second = self.build_partner_request(person2);
        let body = CompatibilityRequest {
            person1: &first,
            person2: &second,
        };
        let raw: RawCompatibility = self
            .post("compatibility", &body, "Failed to calculate compatibility")
            .await?;
        Ok(DetailedCompatibilityResult::from_service(raw))
    }

    pub async fn calculate_predictions(
        &self,
        person: &BirthFacts,
    ) -> Result<PredictionData, ChartError> {
        let user = self.build_partner_request(person);
        let body = TransitRequest {
            user: &user,
            period: &PREDICTION_PERIODS,
        };
        let raw: RawPredictions = self
            .post("transit", &body, "Failed to calculate predictions")
            .await?;
        Ok(PredictionData::from_service(raw))
    }

    pub async fn search_places(&self, query: &str) -> Vec<PlaceCandidate> {
        geocode::search_places(
            &self.client,
            &self.config.geocoder_url,
            query,
            self.config.geocoder_limit,
        )
        .await
    }

    /// Reference location used when a birth chart has no coordinates.
    pub fn default_location(&self) -> &ReferenceLocation {
        &self.config.default_chart_location
    }

    async fn post<B, T>(&self, path: &str, body: &B, failure: &str) -> Result<T, ChartError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.config.endpoint(path);
        tracing::debug!(url = %url, "Submitting calculation");

        let response = self.client.post(&url).json(body).send().await?;
        let status = response.status();

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&error_body)
                .ok()
                .and_then(|b| b.message)
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| failure.to_string());
            tracing::error!(code = status.as_u16(), message = %message, "Astrology service error");
            return Err(ChartError::calculation_failed(message));
        }

        let envelope: ServiceEnvelope<T> = response
            .json()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, url = %url, "Unreadable astrology service response");
                ChartError::calculation_failed(INVALID_RESPONSE)
            })?;

        if envelope.status.as_deref() != Some(SUCCESS_STATUS) {
            let message = envelope
                .message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| INVALID_RESPONSE.to_string());
            tracing::error!(
                status = ?envelope.status,
                message = %message,
                "Astrology service rejected request"
            );
            return Err(ChartError::calculation_failed(message));
        }

        envelope.data.ok_or_else(|| {
            tracing::error!(url = %url, "Astrology service reported success without data");
            ChartError::calculation_failed(INVALID_RESPONSE)
        })
    }
}

/// IANA name of the timezone this process runs in, or "UTC" if unknown.
pub fn local_timezone() -> String {
    iana_time_zone::get_timezone().unwrap_or_else(|_| "UTC".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{BirthTime, ClockTime, Gender};
    use chrono::NaiveDate;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(server: &MockServer) -> ClientConfig {
        ClientConfig {
            api_base_url: server.uri(),
            timezone_url: format!("{}/timezone", server.uri()),
            geocoder_url: server.uri(),
            ..ClientConfig::default()
        }
    }

    fn test_client(server: &MockServer) -> AstrologyClient {
        AstrologyClient::new(test_config(server)).expect("Failed to create client")
    }

    fn paris_facts() -> BirthFacts {
        BirthFacts::new(
            NaiveDate::from_ymd_opt(1990, 6, 15).unwrap(),
            BirthTime::Unknown,
            "Paris, France",
            Gender::Female,
        )
        .with_coordinates(48.8566, 2.3522)
    }

    fn chart_payload() -> serde_json::Value {
        json!({
            "status": "success",
            "data": {
                "sunSign": "Gemini",
                "moonSign": "Aries",
                "risingSign": "Virgo",
                "planets": [
                    { "name": "Sun", "sign": "Gemini", "degree": 24.1, "house": 10, "symbol": "☉" }
                ],
                "houses": [
                    { "number": 1, "sign": "Virgo", "degree": 12.0, "meaning": "Self & Identity" }
                ]
            }
        })
    }

    async fn mount_timezone(server: &MockServer, timezone: &str) {
        Mock::given(method("GET"))
            .and(path("/timezone"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "timezoneId": timezone })),
            )
            .mount(server)
            .await;
    }

    #[test]
    fn test_unknown_time_is_always_noon() {
        let client = AstrologyClient::with_client(Client::new(), ClientConfig::default());
        let facts = BirthFacts::new(
            NaiveDate::from_ymd_opt(2001, 3, 9).unwrap(),
            BirthTime::Unknown,
            "Nowhere",
            Gender::Other,
        );
        for request in [client.build_request(&facts), client.build_partner_request(&facts)] {
            assert_eq!(request.birth_time, ClockTime::NOON);
            assert_eq!(serde_json::to_value(&request).unwrap()["birth_time"], json!([12, 0, 0]));
        }
    }

    #[tokio::test]
    async fn test_birth_chart_request_body() {
        let server = MockServer::start().await;
        mount_timezone(&server, "Europe/Paris").await;
        Mock::given(method("POST"))
            .and(path("/birth-chart"))
            .and(body_partial_json(json!({
                "birth_date": [1990, 6, 15],
                "birth_time": [12, 0, 0],
                "birth_place": "Paris, France",
                "gender": "female",
                "lat": 48.8566,
                "lng": 2.3522,
                "timezone": "Europe/Paris"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(chart_payload()))
            .expect(1)
            .mount(&server)
            .await;

        let chart = test_client(&server).calculate_birth_chart(&paris_facts()).await;

        assert!(chart.is_ok(), "Expected Ok, got Err: {:?}", chart.err());
        let chart = chart.unwrap();
        assert_eq!(chart.sun_sign, "Gemini");
        assert_eq!(chart.birth_info.time, "12:00");
        assert_eq!(chart.birth_info.coordinates, "48.8566, 2.3522");
        assert_eq!(chart.birth_info.timezone, "Europe/Paris");
    }

    #[tokio::test]
    async fn test_error_status_message_is_surfaced() {
        let server = MockServer::start().await;
        mount_timezone(&server, "Europe/Paris").await;
        Mock::given(method("POST"))
            .and(path("/birth-chart"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "status": "error", "message": "invalid date" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let err = test_client(&server)
            .calculate_birth_chart(&paris_facts())
            .await
            .unwrap_err();

        match err {
            ChartError::ChartCalculationFailed(message) => assert_eq!(message, "invalid date"),
            other => panic!("Expected ChartCalculationFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_http_error_uses_body_message_or_generic() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/birth-chart"))
            .respond_with(
                ResponseTemplate::new(422)
                    .set_body_json(json!({ "message": "latitude out of range" })),
            )
            .mount(&server)
            .await;
        let client = test_client(&server);
        let request = client.build_request(&paris_facts()).with_timezone("UTC");
        let err = client.submit(&request).await.unwrap_err();
        assert_eq!(err.to_string(), "latitude out of range");

        let bare = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
            .expect(1)
            .mount(&bare)
            .await;
        let err = test_client(&bare).submit(&request).await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to calculate birth chart");
    }

    #[tokio::test]
    async fn test_status_without_message_is_generic() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "pending" })))
            .mount(&server)
            .await;
        let client = test_client(&server);
        let request = client.build_request(&paris_facts());
        let err = client.submit(&request).await.unwrap_err();
        assert_eq!(err.to_string(), INVALID_RESPONSE);
    }

    #[tokio::test]
    async fn test_missing_houses_defaults_to_empty() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/birth-chart"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "success",
                "data": { "sunSign": "Gemini", "moonSign": "Aries", "risingSign": "Virgo" }
            })))
            .mount(&server)
            .await;
        let client = test_client(&server);
        let chart = client
            .submit(&client.build_request(&paris_facts()))
            .await
            .expect("chart without houses");
        assert!(chart.houses.is_empty());
        assert!(chart.planets.is_empty());
        assert!(chart.aspect_interpretations.is_empty());
    }

    #[tokio::test]
    async fn test_success_without_data_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/birth-chart"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "success" })))
            .expect(1)
            .mount(&server)
            .await;
        let client = test_client(&server);
        let err = client
            .submit(&client.build_request(&paris_facts()))
            .await
            .unwrap_err();
        assert!(matches!(err, ChartError::ChartCalculationFailed(_)));
        assert_eq!(err.to_string(), INVALID_RESPONSE);
    }

    #[tokio::test]
    async fn test_no_retry_after_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;
        let client = test_client(&server);
        assert!(client.submit(&client.build_request(&paris_facts())).await.is_err());
    }

    #[tokio::test]
    async fn test_timezone_falls_back_to_local() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/timezone"))
            .and(query_param("latitude", "48.8566"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        let client = test_client(&server);
        assert_eq!(client.resolve_timezone(48.8566, 2.3522).await, local_timezone());

        let empty = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "offset": "UTC+1" })))
            .mount(&empty)
            .await;
        assert_eq!(test_client(&empty).resolve_timezone(0.0, 0.0).await, local_timezone());
    }

    #[tokio::test]
    async fn test_timezone_lookup_failure_does_not_abort_chart() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/timezone"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/birth-chart"))
            .and(body_partial_json(json!({ "timezone": local_timezone() })))
            .respond_with(ResponseTemplate::new(200).set_body_json(chart_payload()))
            .expect(1)
            .mount(&server)
            .await;

        let chart = test_client(&server).calculate_birth_chart(&paris_facts()).await;
        assert!(chart.is_ok(), "Expected Ok, got Err: {:?}", chart.err());
    }

    #[tokio::test]
    async fn test_missing_coordinates_use_new_york() {
        let server = MockServer::start().await;
        mount_timezone(&server, "America/New_York").await;
        Mock::given(method("POST"))
            .and(path("/birth-chart"))
            .and(body_partial_json(json!({ "lat": 40.7128, "lng": -74.0060 })))
            .respond_with(ResponseTemplate::new(200).set_body_json(chart_payload()))
            .expect(1)
            .mount(&server)
            .await;

        let facts = BirthFacts::new(
            NaiveDate::from_ymd_opt(1985, 1, 2).unwrap(),
            BirthTime::Known(ClockTime::new(3, 45, 0).unwrap()),
            "Unknown town",
            Gender::Male,
        );
        let chart = test_client(&server).calculate_birth_chart(&facts).await.unwrap();
        assert_eq!(chart.birth_info.time, "03:45");
    }

    #[tokio::test]
    async fn test_compatibility_round_trip() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/compatibility"))
            .and(body_partial_json(json!({
                "person1": { "name": "Ana", "lat": 48.8566, "lng": 2.3522, "birth_time": [12, 0, 0] },
                "person2": { "name": "Ravi", "lat": 10.522, "lng": 76.21 }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "success",
                "data": {
                    "compatibility": { "overall_score": 72, "emotional_score": 80 },
                    "sun1": "Gemini",
                    "sun2": "Cancer"
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let ana = BirthFacts::new(
            NaiveDate::from_ymd_opt(1990, 6, 15).unwrap(),
            BirthTime::Unknown,
            "Paris",
            Gender::Female,
        )
        .with_name("Ana");
        let ravi = BirthFacts::new(
            NaiveDate::from_ymd_opt(1991, 6, 22).unwrap(),
            BirthTime::Known(ClockTime::new(7, 10, 0).unwrap()),
            "Thrissur",
            Gender::Male,
        )
        .with_name("Ravi")
        .with_coordinates(10.522, 76.21);

        let result = test_client(&server)
            .calculate_detailed_compatibility(&ana, &ravi)
            .await
            .unwrap();
        assert_eq!(result.overall_compatibility, 72);
        assert_eq!(result.sign_compatibility, 76);
        assert_eq!(result.aspect_compatibility, 50);
    }

    #[tokio::test]
    async fn test_compatibility_failure_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/compatibility"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;
        let err = test_client(&server)
            .calculate_detailed_compatibility(&paris_facts(), &paris_facts())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Failed to calculate compatibility");
    }

    #[tokio::test]
    async fn test_predictions_request_periods() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/transit"))
            .and(body_partial_json(json!({
                "period": ["today", "tomorrow", "week-end", "month-end", "year-end"],
                "user": { "birth_place": "Paris, France" }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "success",
                "data": {
                    "today": [{
                        "transiting_planet": "Jupiter",
                        "natal_planet": "Venus",
                        "aspect_type": "sextile",
                        "category": "Love",
                        "interpretation": ["Open doors."]
                    }]
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let predictions = test_client(&server).calculate_predictions(&paris_facts()).await.unwrap();
        assert_eq!(predictions.today, "Jupiter sextile Venus (Love): Open doors.");
        assert_eq!(predictions.relationship_advice.len(), 1);
    }

    #[tokio::test]
    async fn test_state_machine_transitions() {
        let server = MockServer::start().await;
        mount_timezone(&server, "Europe/Paris").await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(chart_payload()))
            .mount(&server)
            .await;
        let client = test_client(&server);

        let mut state = CalculationState::default();
        assert!(matches!(state, CalculationState::Idle));
        client.run_birth_chart(&mut state, &paris_facts()).await;
        assert!(state.is_terminal());
        assert_eq!(state.result().map(|c| c.rising_sign.as_str()), Some("Virgo"));

        // a finished attempt does not accept another outcome
        assert!(!state.finish(Err(ChartError::calculation_failed("late"))));
        assert!(state.error().is_none());

        state.begin();
        assert!(matches!(state, CalculationState::Requesting));
        assert!(state.finish(Err(ChartError::calculation_failed("boom"))));
        assert_eq!(state.error().map(|e| e.to_string()).as_deref(), Some("boom"));

        state.reset();
        assert!(matches!(state, CalculationState::Idle));
    }
}
