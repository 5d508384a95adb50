//! Data models for the store climate pipeline.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---

/// One row exactly as it arrives from the sheet.
///
/// Every field is optional text: the sheet carries whatever the sensors (or
/// hands) put in it, and the cleaning pipeline decides what is usable. Field
/// names mirror the sheet's column headers.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawRow {
    // ---
    #[serde(rename = "Store")]
    pub store: Option<String>,
    #[serde(rename = "Date")]
    pub date: Option<String>,
    #[serde(rename = "Time")]
    pub time: Option<String>,
    #[serde(rename = "Temperature(°C)")]
    pub temperature: Option<String>,
    #[serde(rename = "Humidity(%)")]
    pub humidity: Option<String>,
}

/// One cleaned sensor sample for one store.
///
/// A `Reading` only exists if store, timestamp, temperature and humidity all
/// parsed; rows that fail any of those are dropped during cleaning and never
/// reach this type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    // ---
    pub store: String,
    /// Date + time-of-day combined, in the sheet's local time.
    pub timestamp: NaiveDateTime,
    pub temperature: f64,
    pub humidity: f64,
}

/// Ordered sequence of cleaned readings. Insertion order is source row order
/// until [`crate::pipeline::sort_by_time`] is applied.
pub type Table = Vec<Reading>;

// ---

/// Derived classification of a metric value against its thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusLevel {
    Normal,
    NearThreshold,
    OutOfRange,
}

/// Raised when a non-finite value reaches classification.
///
/// NaN compares false against everything, so feeding it through the threshold
/// checks would silently classify as `Normal`. The guard makes bad data an
/// explicit condition instead.
#[derive(Debug, Error, PartialEq)]
#[error("cannot classify non-finite metric value {0}")]
pub struct NonFiniteValue(pub f64);

/// Acceptable band for a metric, plus the warning margin around each edge.
#[derive(Debug, Clone, Copy)]
pub struct Thresholds {
    pub low: f64,
    pub high: f64,
    pub near_band: f64,
}

impl Thresholds {
    /// Classify a value against these thresholds.
    ///
    /// Out-of-range is checked first: the near band can overlap the
    /// out-of-range zone right at a boundary (e.g. 26°C is both > 25 and
    /// within 2 of 25), and out-of-range wins there. Near-threshold uses a
    /// strict `<` on the distance to either edge.
    pub fn classify(&self, value: f64) -> Result<StatusLevel, NonFiniteValue> {
        // ---
        if !value.is_finite() {
            return Err(NonFiniteValue(value));
        }

        if value > self.high || value < self.low {
            return Ok(StatusLevel::OutOfRange);
        }

        if (value - self.high).abs() < self.near_band || (value - self.low).abs() < self.near_band
        {
            return Ok(StatusLevel::NearThreshold);
        }

        Ok(StatusLevel::Normal)
    }
}

// ---

/// A monitored metric: display label, unit suffix, and thresholds.
#[derive(Debug, Clone, Copy)]
pub struct Metric {
    pub label: &'static str,
    pub unit: &'static str,
    pub thresholds: Thresholds,
}

/// Temperature in °C: acceptable 18–25, warn within 2 of either edge.
pub const TEMPERATURE: Metric = Metric {
    label: "Temperature",
    unit: "°C",
    thresholds: Thresholds {
        low: 18.0,
        high: 25.0,
        near_band: 2.0,
    },
};

/// Relative humidity in %: acceptable 55–75, warn within 5 of either edge.
pub const HUMIDITY: Metric = Metric {
    label: "Humidity",
    unit: "%",
    thresholds: Thresholds {
        low: 55.0,
        high: 75.0,
        near_band: 5.0,
    },
};

impl Metric {
    /// Human-readable warning for the dashboard, or `None` when the value is
    /// in the normal band.
    pub fn warning_message(&self, value: f64, level: StatusLevel) -> Option<String> {
        // ---
        match level {
            StatusLevel::Normal => None,
            StatusLevel::NearThreshold => Some(format!(
                "{} is near threshold! Current {}: {:.2}{}",
                self.label, self.label, value, self.unit
            )),
            StatusLevel::OutOfRange => Some(format!(
                "{} is out of range! Current {}: {:.2}{}",
                self.label, self.label, value, self.unit
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn test_temperature_classification() {
        // ---
        let t = TEMPERATURE.thresholds;

        // Well inside the band
        assert_eq!(t.classify(22.0), Ok(StatusLevel::Normal));

        // Above the high threshold
        assert_eq!(t.classify(30.0), Ok(StatusLevel::OutOfRange));

        // Below the low threshold
        assert_eq!(t.classify(17.0), Ok(StatusLevel::OutOfRange));

        // Within 2 of high=25: |23.5 - 25| = 1.5 < 2
        assert_eq!(t.classify(23.5), Ok(StatusLevel::NearThreshold));

        // Within 2 of low=18
        assert_eq!(t.classify(19.0), Ok(StatusLevel::NearThreshold));
    }

    #[test]
    fn test_near_band_is_strict() {
        // ---
        // |23 - 25| = 2, not < 2, so still normal
        let t = TEMPERATURE.thresholds;
        assert_eq!(t.classify(23.0), Ok(StatusLevel::Normal));
        assert_eq!(t.classify(20.0), Ok(StatusLevel::Normal));
    }

    #[test]
    fn test_out_of_range_beats_near_band() {
        // ---
        // 26 is within 2 of high=25 but also above it; out-of-range wins.
        let t = TEMPERATURE.thresholds;
        assert_eq!(t.classify(26.0), Ok(StatusLevel::OutOfRange));
        assert_eq!(t.classify(17.5), Ok(StatusLevel::OutOfRange));
    }

    #[test]
    fn test_humidity_classification() {
        // ---
        let h = HUMIDITY.thresholds;
        assert_eq!(h.classify(65.0), Ok(StatusLevel::Normal));
        assert_eq!(h.classify(80.0), Ok(StatusLevel::OutOfRange));
        assert_eq!(h.classify(50.0), Ok(StatusLevel::OutOfRange));
        assert_eq!(h.classify(72.0), Ok(StatusLevel::NearThreshold));
        assert_eq!(h.classify(58.0), Ok(StatusLevel::NearThreshold));
    }

    #[test]
    fn test_non_finite_is_rejected() {
        // ---
        let t = TEMPERATURE.thresholds;
        assert!(t.classify(f64::NAN).is_err());
        assert!(t.classify(f64::INFINITY).is_err());
        assert!(t.classify(f64::NEG_INFINITY).is_err());
    }

    #[test]
    fn test_warning_messages() {
        // ---
        assert_eq!(TEMPERATURE.warning_message(22.0, StatusLevel::Normal), None);
        assert_eq!(
            TEMPERATURE.warning_message(26.5, StatusLevel::OutOfRange),
            Some("Temperature is out of range! Current Temperature: 26.50°C".to_string())
        );
        assert_eq!(
            HUMIDITY.warning_message(73.0, StatusLevel::NearThreshold),
            Some("Humidity is near threshold! Current Humidity: 73.00%".to_string())
        );
    }
}
