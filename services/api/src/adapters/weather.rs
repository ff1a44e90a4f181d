//! services/api/src/adapters/weather.rs
//!
//! This module contains the adapter for the OpenWeather current-conditions API.
//! It implements the `WeatherService` port from the `core` crate.

use agrivision_core::ports::{PortError, PortResult, WeatherService};
use agrivision_core::weather::WeatherReading;
use async_trait::async_trait;
use serde::Deserialize;

const OPENWEATHER_URL: &str = "https://api.openweathermap.org/data/2.5/weather";

#[derive(Deserialize)]
struct OpenWeatherResponse {
    name: String,
    main: MainBlock,
}

#[derive(Deserialize)]
struct MainBlock {
    temp: f64,
    humidity: f64,
    pressure: f64,
}

impl From<OpenWeatherResponse> for WeatherReading {
    fn from(r: OpenWeatherResponse) -> Self {
        WeatherReading {
            location: r.name,
            temperature_c: r.main.temp,
            humidity_pct: r.main.humidity,
            pressure_hpa: r.main.pressure,
        }
    }
}

#[derive(Clone)]
pub struct OpenWeatherAdapter {
    http: reqwest::Client,
    api_key: String,
}

impl OpenWeatherAdapter {
    /// Creates a new `OpenWeatherAdapter`.
    pub fn new(http: reqwest::Client, api_key: String) -> Self {
        Self { http, api_key }
    }
}

#[async_trait]
impl WeatherService for OpenWeatherAdapter {
    async fn current(&self, city: &str) -> PortResult<WeatherReading> {
        let response = self
            .http
            .get(OPENWEATHER_URL)
            .query(&[("q", city), ("units", "metric"), ("appid", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PortError::Unexpected(format!("weather provider returned {}", status)));
        }

        response
            .json::<OpenWeatherResponse>()
            .await
            .map(WeatherReading::from)
            .map_err(|e| PortError::Unexpected(e.to_string()))
    }
}
