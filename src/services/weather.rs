//! Weather provider abstraction.
//!
//! The risk pipeline depends on the `WeatherProvider` trait rather than a
//! concrete data source, so handlers run against the mock generator and
//! tests run against deterministic fixtures. A real weather API client
//! would slot in as another implementation.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Default temperature (°C) when a caller-supplied observation omits it.
pub const DEFAULT_TEMPERATURE: f64 = 25.0;
/// Default relative humidity (%).
pub const DEFAULT_HUMIDITY: f64 = 50.0;
/// Default wind speed (km/h).
pub const DEFAULT_WIND_SPEED: f64 = 10.0;
/// Default rain probability (%).
pub const DEFAULT_RAIN_PROBABILITY: f64 = 20.0;
/// Default air quality index.
pub const DEFAULT_AQI: f64 = 50.0;

/// A single weather observation for a city at a point in time.
///
/// Values are unvalidated floats — probabilities can exceed 100 and the
/// scorer clamps downstream, never here.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WeatherObservation {
    /// City the observation is for
    pub city: String,
    /// Air temperature in Celsius
    pub temperature: f64,
    /// Relative humidity percentage
    pub humidity: f64,
    /// Wind speed in km/h
    pub wind_speed: f64,
    /// Probability of rain, percentage
    pub rain_probability: f64,
    /// Air quality index
    pub aqi: f64,
    /// Human-readable condition summary
    pub condition: String,
    /// When this observation applies
    pub timestamp: DateTime<Utc>,
}

/// Caller-supplied partial weather, accepted on the analyze endpoint.
///
/// Absent fields resolve to the documented defaults, so a request can pin
/// down just the conditions it cares about.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WeatherOverride {
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub wind_speed: Option<f64>,
    pub rain_probability: Option<f64>,
    pub aqi: Option<f64>,
}

impl WeatherOverride {
    /// Resolve into a full observation, substituting defaults for missing
    /// fields.
    pub fn resolve(&self, city: &str) -> WeatherObservation {
        WeatherObservation {
            city: city.to_string(),
            temperature: self.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            humidity: self.humidity.unwrap_or(DEFAULT_HUMIDITY),
            wind_speed: self.wind_speed.unwrap_or(DEFAULT_WIND_SPEED),
            rain_probability: self.rain_probability.unwrap_or(DEFAULT_RAIN_PROBABILITY),
            aqi: self.aqi.unwrap_or(DEFAULT_AQI),
            condition: "Manual".to_string(),
            timestamp: Utc::now(),
        }
    }
}

/// Source of weather observations and daily forecasts.
pub trait WeatherProvider: Send + Sync {
    /// Current conditions for a city.
    fn current(&self, city: &str) -> WeatherObservation;

    /// One observation per day for the next `days` days, starting today.
    fn forecast(&self, city: &str, days: u32) -> Vec<WeatherObservation>;
}

/// Mock provider generating plausible conditions at random.
///
/// Ranges: temperature 22–32 °C, humidity 50–80 %, wind 5–20 km/h, rain
/// probability 0–100 %, AQI 30–100.
#[derive(Debug, Clone, Default)]
pub struct MockWeatherProvider;

impl MockWeatherProvider {
    pub fn new() -> Self {
        Self
    }

    fn observation(city: &str, timestamp: DateTime<Utc>, condition: &str) -> WeatherObservation {
        let mut rng = rand::thread_rng();
        WeatherObservation {
            city: city.to_string(),
            temperature: 22.0 + rng.gen_range(0.0..10.0),
            humidity: 50.0 + rng.gen_range(0.0..30.0),
            wind_speed: 5.0 + rng.gen_range(0.0..15.0),
            rain_probability: rng.gen_range(0.0..100.0),
            aqi: 30.0 + rng.gen_range(0.0..70.0),
            condition: condition.to_string(),
            timestamp,
        }
    }
}

impl WeatherProvider for MockWeatherProvider {
    fn current(&self, city: &str) -> WeatherObservation {
        let observation = Self::observation(city, Utc::now(), "Partly Cloudy");
        tracing::info!("Weather data generated for {}", city);
        observation
    }

    fn forecast(&self, city: &str, days: u32) -> Vec<WeatherObservation> {
        let conditions = ["Sunny", "Cloudy", "Rainy"];
        let now = Utc::now();
        let forecast: Vec<WeatherObservation> = (0..days)
            .map(|i| {
                let condition = conditions[rand::thread_rng().gen_range(0..conditions.len())];
                Self::observation(city, now + Duration::days(i as i64), condition)
            })
            .collect();
        tracing::info!("Forecast generated for {} over {} days", city, days);
        forecast
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_resolve_all_defaults() {
        let resolved = WeatherOverride::default().resolve("Mumbai");
        assert_eq!(resolved.city, "Mumbai");
        assert_eq!(resolved.temperature, DEFAULT_TEMPERATURE);
        assert_eq!(resolved.humidity, DEFAULT_HUMIDITY);
        assert_eq!(resolved.wind_speed, DEFAULT_WIND_SPEED);
        assert_eq!(resolved.rain_probability, DEFAULT_RAIN_PROBABILITY);
        assert_eq!(resolved.aqi, DEFAULT_AQI);
    }

    #[test]
    fn test_override_resolve_partial() {
        let partial = WeatherOverride {
            temperature: Some(38.0),
            rain_probability: Some(90.0),
            ..WeatherOverride::default()
        };
        let resolved = partial.resolve("Chennai");
        assert_eq!(resolved.temperature, 38.0);
        assert_eq!(resolved.rain_probability, 90.0);
        // Everything else falls back to defaults
        assert_eq!(resolved.humidity, DEFAULT_HUMIDITY);
        assert_eq!(resolved.wind_speed, DEFAULT_WIND_SPEED);
        assert_eq!(resolved.aqi, DEFAULT_AQI);
    }

    #[test]
    fn test_mock_current_within_ranges() {
        let provider = MockWeatherProvider::new();
        for _ in 0..50 {
            let obs = provider.current("Pune");
            assert!((22.0..32.0).contains(&obs.temperature));
            assert!((50.0..80.0).contains(&obs.humidity));
            assert!((5.0..20.0).contains(&obs.wind_speed));
            assert!((0.0..100.0).contains(&obs.rain_probability));
            assert!((30.0..100.0).contains(&obs.aqi));
        }
    }

    #[test]
    fn test_mock_forecast_length_and_order() {
        let provider = MockWeatherProvider::new();
        let forecast = provider.forecast("Delhi", 5);
        assert_eq!(forecast.len(), 5);
        for pair in forecast.windows(2) {
            assert!(pair[0].timestamp < pair[1].timestamp);
        }
    }

    #[test]
    fn test_mock_forecast_zero_days() {
        let provider = MockWeatherProvider::new();
        assert!(provider.forecast("Delhi", 0).is_empty());
    }
}
