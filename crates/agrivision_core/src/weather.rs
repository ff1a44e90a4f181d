//! crates/agrivision_core/src/weather.rs
//!
//! Weather readings, the rule-based outbreak risk advisory derived from them,
//! and the static regional outbreak hotspots.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherReading {
    pub location: String,
    pub temperature_c: f64,
    pub humidity_pct: f64,
    pub pressure_hpa: f64,
}

impl WeatherReading {
    /// The reading shown when live data is unavailable.
    pub fn simulated() -> Self {
        Self {
            location: "Pune (Simulated)".to_string(),
            temperature_c: 28.0,
            humidity_pct: 82.0,
            pressure_hpa: 1012.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Critical,
    Warning,
    Optimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RiskAdvisory {
    pub level: RiskLevel,
    pub message: String,
}

const HUMIDITY_THRESHOLD_PCT: f64 = 75.0;
const HEAT_THRESHOLD_C: f64 = 35.0;

/// Humidity wins over heat; both thresholds are strict.
pub fn assess_risk(reading: &WeatherReading) -> RiskAdvisory {
    let (level, message) = if reading.humidity_pct > HUMIDITY_THRESHOLD_PCT {
        (
            RiskLevel::Critical,
            "CRITICAL: Humidity > 75% detected. High risk for Downy Mildew and Soybean Rust.",
        )
    } else if reading.temperature_c > HEAT_THRESHOLD_C {
        (
            RiskLevel::Warning,
            "WARNING: Heat stress. Increase irrigation for root nodule protection.",
        )
    } else {
        (
            RiskLevel::Optimal,
            "OPTIMAL: Environment stable. Low-risk for regional pathogens.",
        )
    };
    RiskAdvisory {
        level,
        message: message.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutbreakHotspot {
    pub id: u32,
    pub lat: f64,
    pub lng: f64,
    pub disease: &'static str,
    pub risk: &'static str,
    pub radius_m: u32,
}

pub fn outbreak_hotspots() -> Vec<OutbreakHotspot> {
    vec![
        OutbreakHotspot {
            id: 1,
            lat: 18.5204,
            lng: 73.8567,
            disease: "Soybean Rust",
            risk: "High",
            radius_m: 5000,
        },
        OutbreakHotspot {
            id: 2,
            lat: 19.9975,
            lng: 73.7898,
            disease: "Downy Mildew",
            risk: "Medium",
            radius_m: 8000,
        },
        OutbreakHotspot {
            id: 3,
            lat: 18.1856,
            lng: 74.6106,
            disease: "Root Rot",
            risk: "Critical",
            radius_m: 4000,
        },
    ]
}
