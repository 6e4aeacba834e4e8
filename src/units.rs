use std::fmt;

use serde::{Deserialize, Serialize};

/// Measurement system the station reports in. Selects both the `units` query
/// parameter sent to the API and the nested key observation values are read
/// from in the response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    Metric,
    #[default]
    Imperial,
}

/// Unit labels for one measurement system, in the fixed order the
/// presentation layer indexes them: temperature, precipitation accumulation,
/// altitude, wind speed, pressure, precipitation rate, percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Units {
    pub temperature: &'static str,
    pub precip_length: &'static str,
    pub altitude: &'static str,
    pub speed: &'static str,
    pub pressure: &'static str,
    pub precip_rate: &'static str,
    pub percentage: &'static str,
}

pub const METRIC_UNITS: Units = Units {
    temperature: "°C",
    precip_length: "mm",
    altitude: "m",
    speed: "km/h",
    pressure: "mbar",
    precip_rate: "mm/h",
    percentage: "%",
};

pub const IMPERIAL_UNITS: Units = Units {
    temperature: "°F",
    precip_length: "in",
    altitude: "ft",
    speed: "mph",
    pressure: "inHg",
    precip_rate: "in/h",
    percentage: "%",
};

impl UnitSystem {
    /// One-letter code the API expects on the `units` query parameter.
    pub fn api_code(self) -> &'static str {
        match self {
            UnitSystem::Metric => "m",
            UnitSystem::Imperial => "e",
        }
    }

    /// Key of the nested per-unit-system object inside an observation.
    pub fn observation_key(self) -> &'static str {
        match self {
            UnitSystem::Metric => "metric",
            UnitSystem::Imperial => "imperial",
        }
    }

    pub fn units_of_measurement(self) -> Units {
        match self {
            UnitSystem::Metric => METRIC_UNITS,
            UnitSystem::Imperial => IMPERIAL_UNITS,
        }
    }
}

impl fmt::Display for UnitSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.observation_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_codes() {
        assert_eq!(UnitSystem::Metric.api_code(), "m");
        assert_eq!(UnitSystem::Imperial.api_code(), "e");
        assert_eq!(UnitSystem::Metric.observation_key(), "metric");
        assert_eq!(UnitSystem::Imperial.observation_key(), "imperial");
    }

    #[test]
    fn test_unit_labels_distinct_per_position() {
        let m = UnitSystem::Metric.units_of_measurement();
        let e = UnitSystem::Imperial.units_of_measurement();
        // Every physical unit differs between the systems; percentage is the
        // provider's shared label for both.
        assert_ne!(m.temperature, e.temperature);
        assert_ne!(m.precip_length, e.precip_length);
        assert_ne!(m.altitude, e.altitude);
        assert_ne!(m.speed, e.speed);
        assert_ne!(m.pressure, e.pressure);
        assert_ne!(m.precip_rate, e.precip_rate);
        assert_eq!(m.percentage, "%");
        assert_eq!(e.percentage, "%");
    }

    #[test]
    fn test_fixed_order_metric() {
        let m = METRIC_UNITS;
        assert_eq!(
            (
                m.temperature,
                m.precip_length,
                m.altitude,
                m.speed,
                m.pressure,
                m.precip_rate,
                m.percentage
            ),
            ("°C", "mm", "m", "km/h", "mbar", "mm/h", "%")
        );
    }
}
