//! Risk classification and tactical advice.
//!
//! `classify` buckets the overall score into Low/Moderate/High with fixed
//! boundaries shared with the dashboard history view. `suggestions`
//! evaluates the advisory rules in a fixed order and caps the list at five.
//! `find_alternative_date` scores the provider's multi-day forecast with
//! the same engine and recommends the lowest-risk day, reporting the true
//! reduction against the original date's score.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::services::scorer::{EventDescriptor, RiskEngine, RiskPrediction, Sport};
use crate::services::weather::{WeatherObservation, WeatherProvider};

/// Scores below this are Low risk.
pub const MODERATE_THRESHOLD: u8 = 30;
/// Scores at or above this are High risk.
pub const HIGH_THRESHOLD: u8 = 60;

/// An alternative date is only recommended above this overall score.
pub const ALTERNATIVE_RISK_THRESHOLD: u8 = 60;

/// Maximum number of tactical suggestions returned.
pub const MAX_SUGGESTIONS: usize = 5;

/// Three-level risk bucket derived from the overall score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub enum RiskCategory {
    Low,
    Moderate,
    High,
}

impl RiskCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskCategory::Low => "Low",
            RiskCategory::Moderate => "Moderate",
            RiskCategory::High => "High",
        }
    }
}

/// Bucket an overall risk score: `<30 → Low`, `<60 → Moderate`, else High.
pub fn classify(overall_risk: u8) -> RiskCategory {
    if overall_risk < MODERATE_THRESHOLD {
        RiskCategory::Low
    } else if overall_risk < HIGH_THRESHOLD {
        RiskCategory::Moderate
    } else {
        RiskCategory::High
    }
}

/// Derive tactical suggestions from a prediction and the conditions.
///
/// Rules fire in a fixed order (performance, heat, wind, rain, air
/// quality, then one sport-specific rule) and the list is truncated to the
/// first `MAX_SUGGESTIONS` in that order.
pub fn suggestions(
    prediction: &RiskPrediction,
    weather: &WeatherObservation,
    sport: Option<Sport>,
) -> Vec<String> {
    let mut suggestions = Vec::new();

    if prediction.performance_impact > 50 {
        suggestions.push(
            "Consider scheduling more frequent breaks due to expected performance impact"
                .to_string(),
        );
    }

    if weather.temperature > 35.0 {
        suggestions
            .push("Extreme heat detected - schedule hydration breaks every 15 minutes".to_string());
    }

    if weather.wind_speed > 30.0 {
        suggestions
            .push("High winds may affect ball trajectory - adjust playing strategy".to_string());
    }

    if weather.rain_probability > 50.0 {
        suggestions
            .push("High chance of rain - prepare covers and have indoor backup plan".to_string());
    }

    if weather.aqi > 150.0 {
        suggestions
            .push("Poor air quality - consider limiting outdoor activity duration".to_string());
    }

    match sport {
        Some(Sport::Cricket) if weather.humidity > 70.0 => {
            suggestions
                .push("High humidity may aid swing bowling - adjust batting strategy".to_string());
        }
        Some(Sport::Football) if weather.temperature < 10.0 => {
            suggestions.push(
                "Cold conditions - ensure proper warm-up to prevent muscle injuries".to_string(),
            );
        }
        Some(Sport::Tennis) if weather.wind_speed > 20.0 => {
            suggestions.push("Windy conditions - focus on lower, controlled shots".to_string());
        }
        _ => {}
    }

    suggestions.truncate(MAX_SUGGESTIONS);
    suggestions
}

/// A recommended replacement date with its estimated improvement.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AlternativeDate {
    /// Recommended event date
    pub date: DateTime<Utc>,
    /// Risk reduction in percentage points versus the original date
    pub risk_reduction: u8,
}

/// Find a lower-risk date within the next `lookahead_days` days.
///
/// Scores each forecast day after today with the same engine as the
/// original request and picks the day with the lowest overall risk.
/// Returns `None` when no candidate improves on `current_risk`.
pub async fn find_alternative_date(
    provider: &dyn WeatherProvider,
    engine: &RiskEngine,
    event: &EventDescriptor,
    current_risk: u8,
    lookahead_days: u32,
) -> Option<AlternativeDate> {
    let forecast = provider.forecast(&event.city, lookahead_days + 1);

    let mut best: Option<(DateTime<Utc>, u8)> = None;
    // The first forecast entry is today; candidates start tomorrow.
    for candidate in forecast.into_iter().skip(1) {
        let candidate_event = EventDescriptor {
            sport: event.sport,
            city: event.city.clone(),
            starts_at: candidate.timestamp,
        };
        let prediction = engine.predict(&candidate, &candidate_event).await;
        let is_better = best
            .map(|(_, risk)| prediction.overall_risk < risk)
            .unwrap_or(true);
        if is_better {
            best = Some((candidate.timestamp, prediction.overall_risk));
        }
    }

    match best {
        Some((date, risk)) if risk < current_risk => Some(AlternativeDate {
            date,
            risk_reduction: current_risk - risk,
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::model::ModelHandle;
    use chrono::{Duration, Utc};

    fn observation(
        temperature: f64,
        humidity: f64,
        wind_speed: f64,
        rain_probability: f64,
        aqi: f64,
    ) -> WeatherObservation {
        WeatherObservation {
            city: "Testville".to_string(),
            temperature,
            humidity,
            wind_speed,
            rain_probability,
            aqi,
            condition: "Clear".to_string(),
            timestamp: Utc::now(),
        }
    }

    fn prediction(performance_impact: u8) -> RiskPrediction {
        RiskPrediction {
            performance_impact,
            injury_probability: 0,
            disruption_probability: 0,
            overall_risk: 0,
        }
    }

    #[test]
    fn test_classify_boundaries() {
        assert_eq!(classify(0), RiskCategory::Low);
        assert_eq!(classify(29), RiskCategory::Low);
        assert_eq!(classify(30), RiskCategory::Moderate);
        assert_eq!(classify(59), RiskCategory::Moderate);
        assert_eq!(classify(60), RiskCategory::High);
        assert_eq!(classify(100), RiskCategory::High);
    }

    #[test]
    fn test_no_suggestions_in_calm_conditions() {
        let weather = observation(22.0, 50.0, 10.0, 0.0, 50.0);
        let result = suggestions(&prediction(10), &weather, Some(Sport::Football));
        assert!(result.is_empty());
    }

    #[test]
    fn test_single_rule_fires() {
        let weather = observation(36.0, 50.0, 10.0, 0.0, 50.0);
        let result = suggestions(&prediction(10), &weather, Some(Sport::Football));
        assert_eq!(result.len(), 1);
        assert!(result[0].contains("hydration"));
    }

    #[test]
    fn test_sport_specific_rules() {
        let humid = observation(22.0, 80.0, 10.0, 0.0, 50.0);
        let cricket = suggestions(&prediction(10), &humid, Some(Sport::Cricket));
        assert_eq!(cricket.len(), 1);
        assert!(cricket[0].contains("swing bowling"));

        let cold = observation(5.0, 50.0, 10.0, 0.0, 50.0);
        let football = suggestions(&prediction(10), &cold, Some(Sport::Football));
        assert!(football.iter().any(|s| s.contains("warm-up")));

        let windy = observation(22.0, 50.0, 25.0, 0.0, 50.0);
        let tennis = suggestions(&prediction(10), &windy, Some(Sport::Tennis));
        assert_eq!(tennis.len(), 1);
        assert!(tennis[0].contains("lower, controlled shots"));

        // Unknown sport: no sport-specific rule fires at all.
        let unknown = suggestions(&prediction(10), &windy, None);
        assert!(unknown.is_empty());
    }

    #[test]
    fn test_suggestions_capped_and_ordered() {
        // All six rules are eligible: performance, heat, wind, rain, AQI,
        // and the Tennis wind rule. Only the first five survive.
        let weather = observation(40.0, 50.0, 35.0, 60.0, 200.0);
        let result = suggestions(&prediction(60), &weather, Some(Sport::Tennis));
        assert_eq!(result.len(), MAX_SUGGESTIONS);
        assert!(result[0].contains("frequent breaks"));
        assert!(result[1].contains("Extreme heat"));
        assert!(result[2].contains("High winds"));
        assert!(result[3].contains("chance of rain"));
        assert!(result[4].contains("air quality"));
        assert!(!result.iter().any(|s| s.contains("controlled shots")));
    }

    // Deterministic forecast fixture for alternative-date tests.
    struct FixtureProvider {
        days: Vec<WeatherObservation>,
    }

    impl WeatherProvider for FixtureProvider {
        fn current(&self, _city: &str) -> WeatherObservation {
            self.days[0].clone()
        }

        fn forecast(&self, _city: &str, days: u32) -> Vec<WeatherObservation> {
            self.days.iter().take(days as usize).cloned().collect()
        }
    }

    fn day_observation(offset_days: i64, weather: WeatherObservation) -> WeatherObservation {
        WeatherObservation {
            timestamp: Utc::now() + Duration::days(offset_days),
            ..weather
        }
    }

    #[tokio::test]
    async fn test_alternative_date_picks_lowest_risk_day() {
        let provider = FixtureProvider {
            days: vec![
                day_observation(0, observation(40.0, 80.0, 35.0, 90.0, 200.0)),
                day_observation(1, observation(38.0, 75.0, 30.0, 80.0, 180.0)),
                // Ideal conditions: scores exactly zero.
                day_observation(2, observation(22.0, 50.0, 10.0, 0.0, 50.0)),
                day_observation(3, observation(30.0, 60.0, 15.0, 40.0, 90.0)),
            ],
        };
        let engine = RiskEngine::new(ModelHandle::new("/nonexistent/model.json"));
        let event = EventDescriptor {
            sport: Some(Sport::Cricket),
            city: "Mumbai".to_string(),
            starts_at: Utc::now(),
        };

        let alternative = find_alternative_date(&provider, &engine, &event, 80, 7)
            .await
            .unwrap();
        assert_eq!(alternative.date, provider.days[2].timestamp);
        assert_eq!(alternative.risk_reduction, 80);
    }

    #[tokio::test]
    async fn test_alternative_date_none_when_no_improvement() {
        // Every candidate day is just as bad as the original.
        let stormy = observation(45.0, 90.0, 40.0, 95.0, 300.0);
        let provider = FixtureProvider {
            days: (0..5)
                .map(|i| day_observation(i, stormy.clone()))
                .collect(),
        };
        let engine = RiskEngine::new(ModelHandle::new("/nonexistent/model.json"));
        let event = EventDescriptor {
            sport: Some(Sport::Cricket),
            city: "Mumbai".to_string(),
            starts_at: Utc::now(),
        };

        let alternative = find_alternative_date(&provider, &engine, &event, 100, 7).await;
        assert!(alternative.is_none());
    }

    #[tokio::test]
    async fn test_alternative_date_skips_today() {
        // Today is perfect but is not a candidate; tomorrow is the best
        // remaining day.
        let provider = FixtureProvider {
            days: vec![
                day_observation(0, observation(22.0, 50.0, 10.0, 0.0, 50.0)),
                day_observation(1, observation(25.0, 55.0, 12.0, 10.0, 60.0)),
                day_observation(2, observation(40.0, 80.0, 35.0, 90.0, 200.0)),
            ],
        };
        let engine = RiskEngine::new(ModelHandle::new("/nonexistent/model.json"));
        let event = EventDescriptor {
            sport: Some(Sport::Tennis),
            city: "Pune".to_string(),
            starts_at: Utc::now(),
        };

        let alternative = find_alternative_date(&provider, &engine, &event, 70, 7)
            .await
            .unwrap();
        assert_eq!(alternative.date, provider.days[1].timestamp);
    }
}
