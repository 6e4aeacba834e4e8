/*
 *  weather.rs
 *
 *  wupws - backyard weather, worth the wait
 *	(c) 2020-26 Stuart Hunter
 *
 *	TODO:
 *
 *	This program is free software: you can redistribute it and/or modify
 *	it under the terms of the GNU General Public License as published by
 *	the Free Software Foundation, either version 3 of the License, or
 *	(at your option) any later version.
 *
 *	This program is distributed in the hope that it will be useful,
 *	but WITHOUT ANY WARRANTY; without even the implied warranty of
 *	MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *	GNU General Public License for more details.
 *
 *	See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *	Public License.
 *
 */
use std::fmt::{self, Display};
use std::future::Future;
use std::io::Read;
use std::time::{Duration, Instant};

use flate2::read::GzDecoder;
use log::{error, info};
use reqwest::{Client, header};
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::config::{NumericPrecision, StationConfig};
use crate::constants::{RESOURCE_CURRENT, RESOURCE_FORECAST};
use crate::snapshot::{
    ConditionField, DailyForecast, ForecastField, ForecastValue, Observation, WeatherSnapshot,
};
use crate::throttle::Throttle;
use crate::translate::{self, TranslationError, TranslationTable};
use crate::units::{UnitSystem, Units};

/// The two API endpoints queried each cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    CurrentObservations,
    DailyForecast,
}

impl Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::CurrentObservations => f.write_str("CURRENT"),
            Endpoint::DailyForecast => f.write_str("FORECAST"),
        }
    }
}

/// Custom error type for weather API operations. None of these cross the
/// refresh() boundary; they surface inside RefreshOutcome::Failed and logs.
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("HTTP request error: {0}")]
    HttpRequest(#[from] reqwest::Error),
    #[error("request timed out")]
    Timeout,
    #[error("JSON deserialization error: {0}")]
    Deserialization(#[from] serde_json::Error),
    #[error("NO {0} RESULT")]
    Empty(Endpoint),
    #[error("Error from {url}: {message}")]
    Provider { url: String, message: String },
    #[error("no observations in current result")]
    MissingObservation,
    #[error("translation error: {0}")]
    Translation(#[from] TranslationError),
    #[error("Polling error: {0}")]
    Polling(String),
}

/// Outcome of one refresh() call. Failures are part of the result, not
/// exceptions: the stored snapshot is only ever replaced on Updated.
#[derive(Debug)]
pub enum RefreshOutcome {
    /// A fresh snapshot replaced the stored one.
    Updated,
    /// Called inside the minimum-interval window; the cached snapshot stands.
    Throttled,
    /// The cycle failed; the prior snapshot (if any) is untouched.
    Failed(WeatherError),
}

impl RefreshOutcome {
    pub fn updated(&self) -> bool {
        matches!(self, RefreshOutcome::Updated)
    }
}

/// Seam between the orchestrator and the HTTP stack. Production uses the
/// reqwest-backed HttpTransport; tests substitute canned bodies.
pub trait Transport {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<String, WeatherError>> + Send;
}

/// reqwest-backed transport. The API serves gzip when asked; bodies are
/// decoded manually with a plain-text fallback since responses to error
/// statuses come back uncompressed.
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, WeatherError> {
        const VERSION: &str = concat!(env!("CARGO_PKG_NAME"), " v", env!("CARGO_PKG_VERSION"));

        let mut headers = header::HeaderMap::new();
        headers.insert("User-Agent", header::HeaderValue::from_static(VERSION));
        headers.insert("Accept", header::HeaderValue::from_static("application/json"));
        headers.insert("Accept-Encoding", header::HeaderValue::from_static("gzip"));
        headers.insert("Connection", header::HeaderValue::from_static("close"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

fn map_reqwest(err: reqwest::Error) -> WeatherError {
    if err.is_timeout() {
        WeatherError::Timeout
    } else {
        WeatherError::HttpRequest(err)
    }
}

impl Transport for HttpTransport {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<String, WeatherError>> + Send {
        let client = self.client.clone();
        let url = url.to_string();
        async move {
            let response = client.get(&url).send().await.map_err(map_reqwest)?;
            let raw = response.bytes().await.map_err(map_reqwest)?;

            // Try to decode as gzip first, fall back to plain text if it fails
            let mut decoder = GzDecoder::new(&raw[..]);
            let mut decoded = String::new();
            match decoder.read_to_string(&mut decoded) {
                Ok(_) => Ok(decoded),
                Err(_) => Ok(String::from_utf8_lossy(&raw).to_string()),
            }
        }
    }
}

/// Compose the request URL for an endpoint. Pure function of its inputs;
/// the precision parameter is appended only when it is not "none", and the
/// forecast endpoint carries the language tag.
pub fn build_url(
    endpoint: Endpoint,
    config: &StationConfig,
    latitude: f64,
    longitude: f64,
) -> String {
    let mut url = match endpoint {
        Endpoint::CurrentObservations => {
            let mut url = format!("{RESOURCE_CURRENT}{}", config.pws_id);
            if config.numeric_precision != NumericPrecision::None {
                url.push_str("&numericPrecision=");
                url.push_str(config.numeric_precision.as_str());
            }
            url
        }
        Endpoint::DailyForecast => {
            format!("{RESOURCE_FORECAST}{latitude},{longitude}&language={}", config.lang)
        }
    };
    url.push_str("&format=json&apiKey=");
    url.push_str(&config.api_key);
    url.push_str("&units=");
    url.push_str(config.unit_system.api_code());
    url
}

#[derive(Debug, Default, Deserialize)]
struct CurrentResponse {
    #[serde(default)]
    observations: Vec<Observation>,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorEntry {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    errors: Vec<ProviderErrorEntry>,
}

fn ensure_not_empty(endpoint: Endpoint, body: &str) -> Result<(), WeatherError> {
    let trimmed = body.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Err(WeatherError::Empty(endpoint));
    }
    Ok(())
}

/// Fail the cycle when the provider reports errors in-band. The error list
/// rides on an otherwise-valid JSON object, so this check runs before the
/// typed parse.
fn check_errors(url: &str, body: &str) -> Result<(), WeatherError> {
    let envelope: ErrorEnvelope = serde_json::from_str(body).unwrap_or_default();
    if envelope.errors.is_empty() {
        return Ok(());
    }
    let message = envelope
        .errors
        .iter()
        .filter_map(|e| e.message.as_deref())
        .collect::<Vec<_>>()
        .join("; ");
    Err(WeatherError::Provider { url: url.to_string(), message })
}

/// Handle onto a running background poll task.
pub struct PollerHandle {
    stop_tx: mpsc::Sender<()>,
    handle: JoinHandle<()>,
}

impl PollerHandle {
    /// Signal the poll task to exit and wait for it.
    pub async fn stop(self) {
        if let Err(e) = self.stop_tx.send(()).await {
            error!("Failed to send stop signal to weather polling task: {e}");
        }
        if let Err(e) = self.handle.await {
            error!("Weather polling task failed to join: {e}");
        }
        info!("Weather polling stopped.");
    }
}

/// Update coordinator for one personal weather station: owns the fetch
/// cadence, the latest snapshot, and the accessor surface the presentation
/// layer reads through.
pub struct WeatherStation<T: Transport> {
    config: StationConfig,
    transport: T,
    throttle: Throttle,
    // working copy of the coordinates; back-filled once from the first
    // observation response when the config leaves them unset
    latitude: Option<f64>,
    longitude: Option<f64>,
    snapshot: Option<WeatherSnapshot>,
    tranfile: TranslationTable,
    snapshot_tx: Option<watch::Sender<Option<WeatherSnapshot>>>,
    stop_sender: Option<mpsc::Sender<()>>,
    #[allow(dead_code)]
    pub last_fetch_time: Option<Instant>, // track last fetched
}

#[allow(dead_code)]
impl<T: Transport> WeatherStation<T> {
    /// Creates a new station coordinator. Fails only when the translation
    /// fallback cannot be loaded - that is a setup error, not a runtime one.
    pub fn new(config: StationConfig, transport: T) -> Result<Self, WeatherError> {
        let tranfile = translate::load_translations(&config.translations_dir, &config.lang)?;
        let throttle = Throttle::new(config.update_interval);
        let (latitude, longitude) = (config.latitude, config.longitude);
        Ok(Self {
            config,
            transport,
            throttle,
            latitude,
            longitude,
            snapshot: None,
            tranfile,
            snapshot_tx: None,
            stop_sender: None,
            last_fetch_time: None,
        })
    }

    /// Run one update cycle, throttled to the configured interval. Repeated
    /// calls inside the window return Throttled and keep serving the cached
    /// snapshot; failed cycles leave the prior snapshot untouched and are
    /// retried on the next tick, never within this one.
    pub async fn refresh(&mut self) -> RefreshOutcome {
        if !self.throttle.should_run() {
            return RefreshOutcome::Throttled;
        }
        match self.fetch_cycle().await {
            Ok(snapshot) => {
                self.snapshot = Some(snapshot.clone());
                self.last_fetch_time = Some(Instant::now());
                if let Some(tx) = &self.snapshot_tx {
                    let _ = tx.send(Some(snapshot));
                }
                info!("Weather data fetched successfully for {}.", self.config.pws_id);
                RefreshOutcome::Updated
            }
            Err(e) => {
                match &e {
                    WeatherError::Empty(_) | WeatherError::Provider { .. } => {
                        error!("Check WUnderground API {e}");
                    }
                    _ => error!("Error fetching WUnderground data: {e}"),
                }
                RefreshOutcome::Failed(e)
            }
        }
    }

    /// The fallible inner cycle: current observations, then the forecast.
    /// Sequential on purpose - the forecast geocode may come from the
    /// observation response on the first pass.
    async fn fetch_cycle(&mut self) -> Result<WeatherSnapshot, WeatherError> {
        let url = build_url(
            Endpoint::CurrentObservations,
            &self.config,
            self.latitude.unwrap_or_default(),
            self.longitude.unwrap_or_default(),
        );
        let body = self.transport.fetch(&url).await?;
        ensure_not_empty(Endpoint::CurrentObservations, &body)?;
        check_errors(&url, &body)?;
        let current: CurrentResponse = serde_json::from_str(&body)?;
        let observation = current
            .observations
            .into_iter()
            .next()
            .ok_or(WeatherError::MissingObservation)?;

        if self.latitude.is_none() {
            self.latitude = observation.lat;
        }
        if self.longitude.is_none() {
            self.longitude = observation.lon;
        }

        let forecast = if self.config.forecast_enable {
            let (Some(latitude), Some(longitude)) = (self.latitude, self.longitude) else {
                return Err(WeatherError::Polling(
                    "no coordinates available for the forecast request".to_string(),
                ));
            };
            let url = build_url(Endpoint::DailyForecast, &self.config, latitude, longitude);
            let body = self.transport.fetch(&url).await?;
            ensure_not_empty(Endpoint::DailyForecast, &body)?;
            check_errors(&url, &body)?;
            let mut forecast: DailyForecast = serde_json::from_str(&body)?;
            forecast.normalize();
            Some(forecast)
        } else {
            None
        };

        Ok(WeatherSnapshot { observation, forecast })
    }

    /// True once any snapshot has ever been obtained. A station that fails
    /// every poll after one success keeps reporting last-known values.
    pub fn available(&self) -> bool {
        self.snapshot.is_some()
    }

    pub fn snapshot(&self) -> Option<&WeatherSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn get_condition(&self, field: ConditionField) -> Option<f64> {
        self.snapshot
            .as_ref()?
            .get_condition(self.config.unit_system, field)
    }

    pub fn get_forecast(&self, field: ForecastField, period: usize) -> Option<ForecastValue> {
        self.snapshot.as_ref()?.get_forecast(field, period)
    }

    pub fn unit_system(&self) -> UnitSystem {
        self.config.unit_system
    }

    pub fn units_of_measurement(&self) -> Units {
        self.config.unit_system.units_of_measurement()
    }

    pub fn pws_id(&self) -> &str {
        &self.config.pws_id
    }

    pub fn translations(&self) -> &TranslationTable {
        &self.tranfile
    }

    pub fn config(&self) -> &StationConfig {
        &self.config
    }

    /// Coordinates in use for the forecast request, once known.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        Some((self.latitude?, self.longitude?))
    }
}

impl<T: Transport + Send + 'static> WeatherStation<T> {
    /// Starts a background polling task with lock-free updates via a watch
    /// channel. Takes ownership of the station; readers observe the shared
    /// snapshot through the receiver, never triggering fetches themselves.
    pub fn start_polling_with_watch(
        mut self,
    ) -> Result<(PollerHandle, watch::Receiver<Option<WeatherSnapshot>>), WeatherError> {
        if self.snapshot_tx.is_some() {
            return Err(WeatherError::Polling("Polling already running".to_string()));
        }

        let (snapshot_tx, snapshot_rx) = watch::channel(self.snapshot.clone());
        self.snapshot_tx = Some(snapshot_tx);

        let (stop_tx, mut stop_rx) = mpsc::channel(1);
        self.stop_sender = Some(stop_tx.clone());

        let interval = self.throttle.interval();
        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = tokio::time::sleep(interval) => {
                        match self.refresh().await {
                            RefreshOutcome::Updated => info!("Weather polling successful."),
                            RefreshOutcome::Throttled => {}
                            RefreshOutcome::Failed(e) => error!("Weather polling failed: {e}"),
                        }
                    }
                    _ = stop_rx.recv() => {
                        info!("Weather polling task received stop signal. Exiting.");
                        break;
                    }
                }
            }
            self.stop_sender = None;
        });

        Ok((PollerHandle { stop_tx, handle }, snapshot_rx))
    }
}

// Stop the background task when the station goes out of scope without an
// explicit shutdown. Drop cannot await, so this is best-effort.
impl<T: Transport> Drop for WeatherStation<T> {
    fn drop(&mut self) {
        if let Some(sender) = self.stop_sender.take() {
            let _ = sender.try_send(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StationConfig;
    use serde_json::json;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};

    fn test_config() -> StationConfig {
        StationConfig {
            log_level: None,
            api_key: "testkey".to_string(),
            pws_id: "KAZBISBE8".to_string(),
            numeric_precision: NumericPrecision::None,
            lang: "en-US".to_string(),
            latitude: None,
            longitude: None,
            unit_system: UnitSystem::Imperial,
            calendarday_temp: false,
            forecast_enable: true,
            update_interval: Duration::from_secs(300),
            request_timeout: Duration::from_secs(30),
            // the real table shipped with the crate; tests run from its root
            translations_dir: PathBuf::from("translations"),
        }
    }

    fn current_body() -> String {
        json!({
            "observations": [{
                "stationID": "KAZBISBE8",
                "obsTimeLocal": "2022-12-05 11:28:46",
                "neighborhood": "PalominasEast",
                "solarRadiation": 579.1,
                "lon": -110.039001,
                "lat": 31.386,
                "uv": 5.0,
                "winddir": 190,
                "humidity": 60.0,
                "imperial": {
                    "temp": 67.1, "heatIndex": 67.1, "dewpt": 52.9, "windChill": 67.1,
                    "windSpeed": 6.7, "windGust": 8.1, "pressure": 29.77,
                    "precipRate": 0.0, "precipTotal": 0.0, "elev": 4465.0
                }
            }]
        })
        .to_string()
    }

    fn forecast_body() -> String {
        json!({
            "dayOfWeek": ["Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday"],
            "temperatureMax": [67, 64, 60, 59, 62, 63],
            "temperatureMin": [40, 37, 31, 32, 30, 31],
            "calendarDayTemperatureMax": [67, 64, 60, 59, 62, 63],
            "calendarDayTemperatureMin": [46, 40, 37, 31, 32, 30],
            "validTimeUtc": [
                1670248800i64, 1670335200i64, 1670421600i64,
                1670508000i64, 1670594400i64, 1670680800i64
            ],
            "daypart": [{
                "iconCode": [30, 33, 32, 31, 34, 33, 34, 29, 30, 29, 32, 31],
                "temperature": [67, 40, 64, 37, 60, 31, 59, 32, 62, 30, 63, 31],
                "precipChance": [1, 7, 7, 7, 6, 8, 8, 4, 3, 3, 2, 2]
            }]
        })
        .to_string()
    }

    /// Canned transport: per-endpoint bodies behind a shared handle so tests
    /// can swap them between cycles. None simulates a timeout.
    #[derive(Clone, Default)]
    struct MockState {
        current: Option<String>,
        forecast: Option<String>,
        calls: Vec<String>,
    }

    #[derive(Clone)]
    struct MockTransport {
        state: Arc<Mutex<MockState>>,
    }

    impl MockTransport {
        fn new(current: &str, forecast: &str) -> Self {
            Self {
                state: Arc::new(Mutex::new(MockState {
                    current: Some(current.to_string()),
                    forecast: Some(forecast.to_string()),
                    calls: Vec::new(),
                })),
            }
        }

        fn call_count(&self) -> usize {
            self.state.lock().unwrap().calls.len()
        }

        fn call(&self, index: usize) -> String {
            self.state.lock().unwrap().calls[index].clone()
        }

        fn set_current(&self, body: Option<&str>) {
            self.state.lock().unwrap().current = body.map(str::to_string);
        }
    }

    impl Transport for MockTransport {
        fn fetch(&self, url: &str) -> impl Future<Output = Result<String, WeatherError>> + Send {
            let mut state = self.state.lock().unwrap();
            state.calls.push(url.to_string());
            let body = if url.starts_with(RESOURCE_CURRENT) {
                state.current.clone()
            } else {
                state.forecast.clone()
            };
            async move { body.ok_or(WeatherError::Timeout) }
        }
    }

    fn station_with(
        config: StationConfig,
        transport: MockTransport,
    ) -> WeatherStation<MockTransport> {
        WeatherStation::new(config, transport).unwrap()
    }

    #[test]
    fn test_build_url_precision_none_omits_parameter() {
        let config = test_config();
        let url = build_url(Endpoint::CurrentObservations, &config, 0.0, 0.0);
        assert!(!url.contains("numericPrecision"));
        assert!(url.contains("stationId=KAZBISBE8"));
        assert!(url.contains("&format=json&apiKey=testkey&units=e"));
    }

    #[test]
    fn test_build_url_precision_decimal_appears_once() {
        let mut config = test_config();
        config.numeric_precision = NumericPrecision::Decimal;
        let url = build_url(Endpoint::CurrentObservations, &config, 0.0, 0.0);
        assert_eq!(url.matches("numericPrecision=decimal").count(), 1);
    }

    #[test]
    fn test_build_url_forecast_geocode_and_language() {
        let mut config = test_config();
        config.unit_system = UnitSystem::Metric;
        let url = build_url(Endpoint::DailyForecast, &config, 31.386, -110.039001);
        assert!(url.contains("geocode=31.386,-110.039001"));
        assert!(url.contains("&language=en-US"));
        assert!(url.contains("&units=m"));
        assert!(!url.contains("numericPrecision"));
    }

    #[tokio::test]
    async fn test_refresh_success_stores_snapshot() {
        let transport = MockTransport::new(&current_body(), &forecast_body());
        let mut station = station_with(test_config(), transport.clone());
        assert!(!station.available());

        assert!(station.refresh().await.updated());
        assert!(station.available());
        assert_eq!(transport.call_count(), 2);
        assert_eq!(station.get_condition(ConditionField::Temp), Some(67.1));
        assert_eq!(station.get_condition(ConditionField::Humidity), Some(60.0));
        assert_eq!(
            station
                .get_forecast(ForecastField::TemperatureMax, 3)
                .and_then(|v| v.as_f64()),
            Some(64.0)
        );
    }

    #[tokio::test]
    async fn test_refresh_backfills_coordinates() {
        let transport = MockTransport::new(&current_body(), &forecast_body());
        let mut station = station_with(test_config(), transport.clone());
        assert_eq!(station.coordinates(), None);

        station.refresh().await;
        assert_eq!(station.coordinates(), Some((31.386, -110.039001)));
        // the forecast request was keyed by the back-filled geocode
        assert!(transport.call(1).contains("geocode=31.386,-110.039001"));
    }

    #[tokio::test]
    async fn test_refresh_is_throttled_within_interval() {
        let transport = MockTransport::new(&current_body(), &forecast_body());
        let mut station = station_with(test_config(), transport.clone());

        assert!(station.refresh().await.updated());
        assert!(matches!(station.refresh().await, RefreshOutcome::Throttled));
        assert!(matches!(station.refresh().await, RefreshOutcome::Throttled));
        // exactly one request pair went out
        assert_eq!(transport.call_count(), 2);
    }

    #[tokio::test]
    async fn test_refresh_runs_again_after_interval() {
        let mut config = test_config();
        config.update_interval = Duration::from_millis(5);
        let transport = MockTransport::new(&current_body(), &forecast_body());
        let mut station = station_with(config, transport.clone());

        assert!(station.refresh().await.updated());
        assert!(matches!(station.refresh().await, RefreshOutcome::Throttled));
        std::thread::sleep(Duration::from_millis(10));
        assert!(station.refresh().await.updated());
        assert_eq!(transport.call_count(), 4);
    }

    #[tokio::test]
    async fn test_provider_error_fails_cycle_and_preserves_snapshot() {
        let mut config = test_config();
        config.update_interval = Duration::from_millis(1);
        let transport = MockTransport::new(&current_body(), &forecast_body());
        let mut station = station_with(config, transport.clone());

        assert!(station.refresh().await.updated());
        let before = station.snapshot().cloned();

        transport.set_current(Some(r#"{"errors": [{"message": "bad key"}]}"#));
        std::thread::sleep(Duration::from_millis(5));
        match station.refresh().await {
            RefreshOutcome::Failed(e) => {
                let msg = e.to_string();
                assert!(msg.contains("bad key"), "unexpected message: {msg}");
            }
            other => panic!("expected Failed, got {other:?}"),
        }
        // prior snapshot untouched; station still reports last-known values
        assert_eq!(station.snapshot().cloned(), before);
        assert!(station.available());
        assert_eq!(station.get_condition(ConditionField::Temp), Some(67.1));
    }

    #[tokio::test]
    async fn test_concatenated_provider_messages() {
        let transport = MockTransport::new(
            r#"{"errors": [{"message": "bad key"}, {"message": "bad station"}]}"#,
            &forecast_body(),
        );
        let mut station = station_with(test_config(), transport);
        match station.refresh().await {
            RefreshOutcome::Failed(WeatherError::Provider { message, .. }) => {
                assert_eq!(message, "bad key; bad station");
            }
            other => panic!("expected Provider error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_null_body_is_terminal_for_cycle() {
        let transport = MockTransport::new("null", &forecast_body());
        let mut station = station_with(test_config(), transport.clone());
        match station.refresh().await {
            RefreshOutcome::Failed(e) => assert_eq!(e.to_string(), "NO CURRENT RESULT"),
            other => panic!("expected Failed, got {other:?}"),
        }
        assert!(!station.available());
        // the forecast request was never issued
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test]
    async fn test_transport_failure_preserves_snapshot() {
        let mut config = test_config();
        config.update_interval = Duration::from_millis(1);
        let transport = MockTransport::new(&current_body(), &forecast_body());
        let mut station = station_with(config, transport.clone());

        assert!(station.refresh().await.updated());
        transport.set_current(None); // simulated timeout
        std::thread::sleep(Duration::from_millis(5));
        assert!(matches!(
            station.refresh().await,
            RefreshOutcome::Failed(WeatherError::Timeout)
        ));
        assert!(station.available());
    }

    #[tokio::test]
    async fn test_forecast_disabled_skips_second_request() {
        let mut config = test_config();
        config.forecast_enable = false;
        let transport = MockTransport::new(&current_body(), &forecast_body());
        let mut station = station_with(config, transport.clone());

        assert!(station.refresh().await.updated());
        assert_eq!(transport.call_count(), 1);
        assert!(station.snapshot().unwrap().forecast.is_none());
        assert_eq!(station.get_forecast(ForecastField::TemperatureMax, 0), None);
    }

    #[tokio::test]
    async fn test_forecast_arrays_normalized_to_five_days() {
        let transport = MockTransport::new(&current_body(), &forecast_body());
        let mut station = station_with(test_config(), transport);
        station.refresh().await;
        let forecast = station.snapshot().unwrap().forecast.as_ref().unwrap();
        assert_eq!(forecast.temperature_max.len(), 5);
        assert_eq!(forecast.daypart[0].icon_code.len(), 10);
    }

    #[tokio::test]
    async fn test_polling_publishes_snapshots() {
        let mut config = test_config();
        config.update_interval = Duration::from_millis(5);
        let transport = MockTransport::new(&current_body(), &forecast_body());
        let station = station_with(config, transport);

        let (poller, mut rx) = station.start_polling_with_watch().unwrap();
        rx.changed().await.unwrap();
        let snapshot = rx.borrow().clone().unwrap();
        assert_eq!(
            snapshot.get_condition(UnitSystem::Imperial, ConditionField::Temp),
            Some(67.1)
        );
        poller.stop().await;
    }
}
