//! Risk scoring.
//!
//! Two scoring strategies share the `RiskScorer` interface: `ModelScorer`
//! (in `services::model`) runs the loaded predictive model, and
//! `FormulaScorer` is the deterministic closed-form fallback that is always
//! available. `RiskEngine` selects between them per request and degrades
//! silently — a model failure is a warning in the logs, never an error to
//! the caller.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::services::model::{ModelError, ModelHandle, ModelScorer};
use crate::services::weather::WeatherObservation;

/// Number of input features fed to the predictive model.
pub const FEATURE_DIM: usize = 8;

/// Ensemble weights, applied to predictions in list order.
pub const ENSEMBLE_WEIGHTS: [f64; 4] = [0.4, 0.3, 0.2, 0.1];

/// Sports the scoring pipeline knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sport {
    Cricket,
    Football,
    Tennis,
}

impl Sport {
    /// Parse a sport name. Unrecognized names yield `None`; the pipeline
    /// treats those with a neutral multiplier rather than rejecting them.
    pub fn parse(name: &str) -> Option<Sport> {
        match name {
            "Cricket" => Some(Sport::Cricket),
            "Football" => Some(Sport::Football),
            "Tennis" => Some(Sport::Tennis),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Sport::Cricket => "Cricket",
            Sport::Football => "Football",
            Sport::Tennis => "Tennis",
        }
    }

    /// Per-sport scalar amplifying base risk. Cricket events are the most
    /// weather-sensitive, football the least.
    pub fn multiplier(self) -> f64 {
        match self {
            Sport::Cricket => 1.2,
            Sport::Football => 1.0,
            Sport::Tennis => 1.1,
        }
    }
}

/// Multiplier for an optional sport; unknown sports are neutral.
pub fn sport_multiplier(sport: Option<Sport>) -> f64 {
    sport.map(Sport::multiplier).unwrap_or(1.0)
}

/// The event being assessed.
#[derive(Debug, Clone)]
pub struct EventDescriptor {
    /// `None` when the request named an unrecognized sport.
    pub sport: Option<Sport>,
    pub city: String,
    pub starts_at: DateTime<Utc>,
}

/// The four risk sub-scores, each rounded and clamped to 0–100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RiskPrediction {
    /// Expected impact on player performance
    pub performance_impact: u8,
    /// Probability of weather-related injury
    pub injury_probability: u8,
    /// Probability of event disruption (delays, stoppages)
    pub disruption_probability: u8,
    /// Composite 0–100 risk score
    pub overall_risk: u8,
}

/// Round and clamp a raw score into the 0–100 range.
pub(crate) fn clamp_score(value: f64) -> u8 {
    value.clamp(0.0, 100.0).round() as u8
}

/// A scoring strategy: weather + event in, four sub-scores out.
pub trait RiskScorer {
    fn score(
        &self,
        weather: &WeatherObservation,
        event: &EventDescriptor,
    ) -> Result<RiskPrediction, ModelError>;
}

/// Normalize an observation and event into the model's feature vector:
/// temperature/50, humidity/100, wind/50, rain/100, aqi/500, and three
/// one-hot sport indicators. An unknown sport leaves all indicators zero.
pub fn feature_vector(weather: &WeatherObservation, sport: Option<Sport>) -> [f64; FEATURE_DIM] {
    [
        weather.temperature / 50.0,
        weather.humidity / 100.0,
        weather.wind_speed / 50.0,
        weather.rain_probability / 100.0,
        weather.aqi / 500.0,
        (sport == Some(Sport::Cricket)) as u8 as f64,
        (sport == Some(Sport::Football)) as u8 as f64,
        (sport == Some(Sport::Tennis)) as u8 as f64,
    ]
}

/// Deterministic closed-form scorer. Always available.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormulaScorer;

impl FormulaScorer {
    /// Compute the four sub-scores from five weather sub-risks:
    ///
    /// - tempRisk     = clamp(|t − 22| × 3, 0, 100)
    /// - humidityRisk = max(0, (h − 70) × 2)
    /// - windRisk     = max(0, (w − 20) × 5)
    /// - rainRisk     = rain × 0.8
    /// - aqiRisk      = max(0, (aqi − 100) × 0.5)
    pub fn compute(weather: &WeatherObservation, sport: Option<Sport>) -> RiskPrediction {
        let temp_risk = ((weather.temperature - 22.0).abs() * 3.0).clamp(0.0, 100.0);
        let humidity_risk = ((weather.humidity - 70.0) * 2.0).max(0.0);
        let wind_risk = ((weather.wind_speed - 20.0) * 5.0).max(0.0);
        let rain_risk = weather.rain_probability * 0.8;
        let aqi_risk = ((weather.aqi - 100.0) * 0.5).max(0.0);

        let base_risk = (temp_risk + humidity_risk + wind_risk + rain_risk + aqi_risk) / 5.0;
        let multiplier = sport_multiplier(sport);

        RiskPrediction {
            performance_impact: clamp_score(base_risk * 1.1),
            injury_probability: clamp_score(
                (temp_risk * 0.3 + humidity_risk * 0.2 + wind_risk * 0.3 + aqi_risk * 0.2)
                    * multiplier,
            ),
            disruption_probability: clamp_score(rain_risk + wind_risk * 0.5),
            overall_risk: clamp_score(base_risk * multiplier),
        }
    }
}

impl RiskScorer for FormulaScorer {
    fn score(
        &self,
        weather: &WeatherObservation,
        event: &EventDescriptor,
    ) -> Result<RiskPrediction, ModelError> {
        Ok(Self::compute(weather, event.sport))
    }
}

/// Weighted average of multiple model outputs into one overall score.
///
/// Applies `ENSEMBLE_WEIGHTS` to the first min(4, n) predictions in list
/// order and normalizes by the weights actually used. Empty input → 0.
pub fn ensemble_overall_risk(predictions: &[RiskPrediction]) -> u8 {
    if predictions.is_empty() {
        return 0;
    }

    let mut weighted_sum = 0.0;
    let mut total_weight = 0.0;
    for (prediction, weight) in predictions.iter().zip(ENSEMBLE_WEIGHTS) {
        weighted_sum += prediction.overall_risk as f64 * weight;
        total_weight += weight;
    }

    (weighted_sum / total_weight).round() as u8
}

/// Strategy selection over the loaded model and the formula fallback.
///
/// Holds the process-wide model handle; the model is consulted when loaded
/// and the formula takes over on any inference failure.
#[derive(Clone)]
pub struct RiskEngine {
    model: ModelHandle,
}

impl RiskEngine {
    pub fn new(model: ModelHandle) -> Self {
        Self { model }
    }

    pub fn model(&self) -> &ModelHandle {
        &self.model
    }

    /// Score an event. Never fails: model problems fall back to the
    /// formula with a logged warning.
    pub async fn predict(
        &self,
        weather: &WeatherObservation,
        event: &EventDescriptor,
    ) -> RiskPrediction {
        {
            let guard = self.model.read().await;
            if let Some(loaded) = guard.as_ref() {
                match ModelScorer::new(&loaded.model).score(weather, event) {
                    Ok(prediction) => return prediction,
                    Err(e) => {
                        tracing::warn!("Model inference failed, falling back to formula: {}", e);
                    }
                }
            }
        }

        FormulaScorer::compute(weather, event.sport)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

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

    #[test]
    fn test_formula_ideal_conditions_score_zero() {
        // 22°C, 50% humidity, 10 km/h wind, no rain, AQI 50 — every
        // sub-risk is exactly zero.
        let weather = observation(22.0, 50.0, 10.0, 0.0, 50.0);
        let prediction = FormulaScorer::compute(&weather, Some(Sport::Football));
        assert_eq!(
            prediction,
            RiskPrediction {
                performance_impact: 0,
                injury_probability: 0,
                disruption_probability: 0,
                overall_risk: 0,
            }
        );
    }

    #[test]
    fn test_formula_known_values() {
        // tempRisk=54, humidityRisk=20, windRisk=75, rainRisk=48, aqiRisk=50
        // baseRisk=49.4, Cricket multiplier 1.2
        let weather = observation(40.0, 80.0, 35.0, 60.0, 200.0);
        let prediction = FormulaScorer::compute(&weather, Some(Sport::Cricket));
        assert_eq!(prediction.overall_risk, 59); // round(49.4 * 1.2)
        assert_eq!(prediction.performance_impact, 54); // round(49.4 * 1.1)
        assert_eq!(prediction.injury_probability, 63); // round(52.7 * 1.2)
        assert_eq!(prediction.disruption_probability, 86); // round(48 + 37.5)
    }

    #[test]
    fn test_formula_extreme_inputs_stay_clamped() {
        let weather = observation(100.0, 200.0, 150.0, 200.0, 999.0);
        let prediction = FormulaScorer::compute(&weather, Some(Sport::Cricket));
        assert_eq!(prediction.overall_risk, 100);
        assert_eq!(prediction.performance_impact, 100);
        assert_eq!(prediction.injury_probability, 100);
        assert_eq!(prediction.disruption_probability, 100);
    }

    #[test]
    fn test_sport_multiplier_ordering() {
        // Same weather, baseRisk > 0: Cricket >= Tennis >= Football
        let weather = observation(30.0, 50.0, 10.0, 0.0, 50.0);
        let cricket = FormulaScorer::compute(&weather, Some(Sport::Cricket)).overall_risk;
        let tennis = FormulaScorer::compute(&weather, Some(Sport::Tennis)).overall_risk;
        let football = FormulaScorer::compute(&weather, Some(Sport::Football)).overall_risk;
        assert!(cricket >= tennis);
        assert!(tennis >= football);
    }

    #[test]
    fn test_unknown_sport_scores_like_neutral_multiplier() {
        let weather = observation(35.0, 80.0, 25.0, 40.0, 120.0);
        assert_eq!(Sport::parse("Hockey"), None);
        let unknown = FormulaScorer::compute(&weather, None);
        let football = FormulaScorer::compute(&weather, Some(Sport::Football));
        // Football's multiplier is 1.0, same as the unknown-sport default,
        // so overallRisk and injuryProbability agree.
        assert_eq!(unknown.overall_risk, football.overall_risk);
        assert_eq!(unknown.injury_probability, football.injury_probability);
    }

    #[test]
    fn test_sport_parse_is_exact() {
        assert_eq!(Sport::parse("Cricket"), Some(Sport::Cricket));
        assert_eq!(Sport::parse("Football"), Some(Sport::Football));
        assert_eq!(Sport::parse("Tennis"), Some(Sport::Tennis));
        assert_eq!(Sport::parse("cricket"), None);
        assert_eq!(Sport::parse(""), None);
    }

    #[test]
    fn test_feature_vector_normalization() {
        let weather = observation(25.0, 50.0, 25.0, 50.0, 250.0);
        let features = feature_vector(&weather, Some(Sport::Cricket));
        assert_eq!(features[0], 0.5);
        assert_eq!(features[1], 0.5);
        assert_eq!(features[2], 0.5);
        assert_eq!(features[3], 0.5);
        assert_eq!(features[4], 0.5);
        assert_eq!(&features[5..], &[1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_feature_vector_unknown_sport_has_no_indicator() {
        let weather = observation(25.0, 50.0, 25.0, 50.0, 250.0);
        let features = feature_vector(&weather, None);
        assert_eq!(&features[5..], &[0.0, 0.0, 0.0]);
    }

    fn prediction_with_overall(overall_risk: u8) -> RiskPrediction {
        RiskPrediction {
            performance_impact: 0,
            injury_probability: 0,
            disruption_probability: 0,
            overall_risk,
        }
    }

    #[test]
    fn test_ensemble_empty_is_zero() {
        assert_eq!(ensemble_overall_risk(&[]), 0);
    }

    #[test]
    fn test_ensemble_single_normalizes_to_itself() {
        assert_eq!(ensemble_overall_risk(&[prediction_with_overall(80)]), 80);
    }

    #[test]
    fn test_ensemble_two_predictions() {
        // (100*0.4 + 50*0.3) / 0.7 = 78.57 → 79
        let predictions = [prediction_with_overall(100), prediction_with_overall(50)];
        assert_eq!(ensemble_overall_risk(&predictions), 79);
    }

    #[test]
    fn test_ensemble_ignores_past_fourth_prediction() {
        let four = [
            prediction_with_overall(80),
            prediction_with_overall(60),
            prediction_with_overall(40),
            prediction_with_overall(20),
        ];
        // 0.4*80 + 0.3*60 + 0.2*40 + 0.1*20 = 60
        assert_eq!(ensemble_overall_risk(&four), 60);

        let five = [
            prediction_with_overall(80),
            prediction_with_overall(60),
            prediction_with_overall(40),
            prediction_with_overall(20),
            prediction_with_overall(100),
        ];
        assert_eq!(ensemble_overall_risk(&five), 60);
    }

    #[test]
    fn test_clamp_score_bounds() {
        assert_eq!(clamp_score(-5.0), 0);
        assert_eq!(clamp_score(0.0), 0);
        assert_eq!(clamp_score(49.5), 50);
        assert_eq!(clamp_score(100.0), 100);
        assert_eq!(clamp_score(240.0), 100);
    }
}
