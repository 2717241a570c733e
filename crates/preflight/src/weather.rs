//! Best-effort weather lookup.
//!
//! A [`Geolocator`] supplies the current position, a [`WeatherSource`] turns
//! it into a [`WeatherReport`]. [`NoaaClient`] is the production source,
//! backed by the US National Weather Service API. [`WeatherLookup`] allows
//! one fetch at a time and exposes whether one is in flight.
//!
//! A report is produced whole or not at all, so a failed lookup can never
//! leave the mission's weather partially overwritten.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::WeatherConfig;
use crate::error::{Error, Result};
use crate::mission::Weather;

/// A geographic position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude, -90..=90.
    pub latitude: f64,
    /// Longitude, -180..=180.
    pub longitude: f64,
}

impl Coordinate {
    /// Create a validated coordinate.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCoordinate`] if either value is out of range
    /// or not finite.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        let valid = latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude);
        if valid {
            Ok(Self {
                latitude,
                longitude,
            })
        } else {
            Err(Error::InvalidCoordinate {
                latitude,
                longitude,
            })
        }
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4},{:.4}", self.latitude, self.longitude)
    }
}

/// Source of the current position.
pub trait Geolocator {
    /// Report the current position.
    ///
    /// # Errors
    ///
    /// Returns [`Error::GeolocationUnavailable`] when the position is denied
    /// or unknown.
    fn current_position(&self) -> Result<Coordinate>;
}

/// A geolocator with a fixed answer: a known position or "unavailable".
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FixedPosition(Option<Coordinate>);

impl FixedPosition {
    /// Always report `coordinate`, or unavailability when `None`.
    #[must_use]
    pub fn new(coordinate: Option<Coordinate>) -> Self {
        Self(coordinate)
    }

    /// Never report a position.
    #[must_use]
    pub fn unavailable() -> Self {
        Self(None)
    }
}

impl Geolocator for FixedPosition {
    fn current_position(&self) -> Result<Coordinate> {
        self.0.ok_or_else(|| {
            Error::GeolocationUnavailable(
                "no position given; pass --lat/--lon or set weather.latitude/longitude".to_string(),
            )
        })
    }
}

/// One forecast mapped onto the mission's weather triple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeatherReport {
    /// Temperature with unit, e.g. `72°F`.
    pub temperature: String,
    /// Wind speed text, e.g. `5 to 10 mph`.
    pub wind: String,
    /// Short forecast, e.g. `Partly Cloudy`.
    pub precipitation: String,
}

impl From<WeatherReport> for Weather {
    fn from(report: WeatherReport) -> Self {
        Self {
            temperature: Some(report.temperature),
            wind: Some(report.wind),
            precipitation: Some(report.precipitation),
        }
    }
}

/// A provider of forecasts.
#[async_trait::async_trait]
pub trait WeatherSource: Send + Sync {
    /// Fetch the current forecast for `at`.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider is unreachable, answers with a
    /// failure status, or returns data without a usable forecast period.
    async fn forecast(&self, at: Coordinate) -> Result<WeatherReport>;
}

/// Client for the National Weather Service (`api.weather.gov`).
///
/// Resolution takes two requests: `/points/{lat},{lon}` yields the forecast
/// URL for the grid cell, and that URL yields the forecast periods. Only the
/// first period is used.
#[derive(Debug, Clone)]
pub struct NoaaClient {
    http: reqwest::Client,
    base_url: String,
}

impl NoaaClient {
    /// Create a client.
    ///
    /// The service rejects requests without a `User-Agent`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: &str, user_agent: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Create a client from the `[weather]` configuration section.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: &WeatherConfig) -> Result<Self> {
        Self::new(&config.api_base_url, &config.user_agent, config.timeout())
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        debug!("GET {}", url);
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::WeatherHttp {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|err| Error::weather_malformed(err.to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct PointResponse {
    properties: PointProperties,
}

#[derive(Debug, Deserialize)]
struct PointProperties {
    forecast: String,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    properties: ForecastProperties,
}

#[derive(Debug, Deserialize)]
struct ForecastProperties {
    #[serde(default)]
    periods: Vec<ForecastPeriod>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ForecastPeriod {
    temperature: serde_json::Number,
    temperature_unit: String,
    wind_speed: String,
    short_forecast: String,
}

impl From<ForecastPeriod> for WeatherReport {
    fn from(period: ForecastPeriod) -> Self {
        Self {
            temperature: format!("{}°{}", period.temperature, period.temperature_unit),
            wind: period.wind_speed,
            precipitation: period.short_forecast,
        }
    }
}

#[async_trait::async_trait]
impl WeatherSource for NoaaClient {
    async fn forecast(&self, at: Coordinate) -> Result<WeatherReport> {
        let points_url = format!("{}/points/{at}", self.base_url);
        let point: PointResponse = self.get_json(&points_url).await?;

        let forecast: ForecastResponse = self.get_json(&point.properties.forecast).await?;
        let period = forecast
            .properties
            .periods
            .into_iter()
            .next()
            .ok_or_else(|| Error::weather_malformed("forecast has no periods"))?;

        Ok(period.into())
    }
}

/// Single-flight wrapper around a [`WeatherSource`].
///
/// While a fetch is outstanding [`is_loading`](Self::is_loading) is true and
/// further fetches fail fast with [`Error::WeatherBusy`]. There is no retry
/// and no cancellation.
#[derive(Debug)]
pub struct WeatherLookup<S> {
    source: S,
    in_flight: AtomicBool,
}

/// Clears the in-flight flag on every exit path.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl<S: WeatherSource> WeatherLookup<S> {
    /// Wrap a source.
    pub fn new(source: S) -> Self {
        Self {
            source,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Whether a fetch is outstanding.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Fetch a report for `at`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WeatherBusy`] if another fetch is outstanding, or the
    /// source's error.
    pub async fn fetch(&self, at: Coordinate) -> Result<WeatherReport> {
        let _guard = self.begin()?;
        info!("Fetching weather for {}", at);
        self.source.forecast(at).await
    }

    fn begin(&self) -> Result<InFlight<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map(|_| InFlight(&self.in_flight))
            .map_err(|_| Error::WeatherBusy)
    }
}
