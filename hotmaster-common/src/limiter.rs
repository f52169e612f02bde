//! Limiter parameter model
//!
//! Three loudness presets (low, medium, high) are named bundles of limiter
//! parameters. A job may carry user overrides that replace any subset of a
//! preset's fields before an engine configuration is built.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Default limiter threshold, just below 16-bit full scale
pub const DEFAULT_THRESHOLD: f64 = (32768.0 - 61.0) / 32768.0;

/// Limiter timing and smoothing parameters (times in milliseconds)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LimiterConfig {
    pub attack: f64,
    pub hold: f64,
    pub release: f64,
    pub attack_filter_coefficient: f64,
    pub hold_filter_order: u32,
    pub hold_filter_coefficient: f64,
    pub release_filter_order: u32,
    pub release_filter_coefficient: f64,
}

impl Default for LimiterConfig {
    fn default() -> Self {
        Self {
            attack: 1.0,
            hold: 1.0,
            release: 3000.0,
            attack_filter_coefficient: -2.0,
            hold_filter_order: 1,
            hold_filter_coefficient: 7.0,
            release_filter_order: 1,
            release_filter_coefficient: 800.0,
        }
    }
}

/// A limiter configuration plus its output threshold
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LimiterPreset {
    pub limiter: LimiterConfig,
    pub threshold: f64,
}

impl LimiterPreset {
    /// Copy of this preset with every supplied override applied
    pub fn with_overrides(&self, overrides: &LimiterOverrides) -> LimiterPreset {
        let mut limiter = self.limiter;
        if let Some(v) = overrides.attack {
            limiter.attack = v;
        }
        if let Some(v) = overrides.hold {
            limiter.hold = v;
        }
        if let Some(v) = overrides.release {
            limiter.release = v;
        }
        if let Some(v) = overrides.attack_filter_coefficient {
            limiter.attack_filter_coefficient = v;
        }
        if let Some(v) = overrides.hold_filter_order {
            limiter.hold_filter_order = v;
        }
        if let Some(v) = overrides.hold_filter_coefficient {
            limiter.hold_filter_coefficient = v;
        }
        if let Some(v) = overrides.release_filter_order {
            limiter.release_filter_order = v;
        }
        if let Some(v) = overrides.release_filter_coefficient {
            limiter.release_filter_coefficient = v;
        }

        LimiterPreset {
            limiter,
            threshold: overrides.threshold.unwrap_or(self.threshold),
        }
    }
}

/// Named loudness presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoudnessPreset {
    Low,
    Medium,
    High,
}

impl LoudnessPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoudnessPreset::Low => "low",
            LoudnessPreset::Medium => "medium",
            LoudnessPreset::High => "high",
        }
    }

    /// Limiter parameters for this preset
    pub fn params(&self) -> LimiterPreset {
        match self {
            LoudnessPreset::Low => LimiterPreset {
                limiter: LimiterConfig {
                    attack: 20.0,
                    hold: 2.0,
                    release: 4000.0,
                    attack_filter_coefficient: -1.0,
                    hold_filter_order: 1,
                    hold_filter_coefficient: 4.0,
                    release_filter_order: 2,
                    release_filter_coefficient: 1200.0,
                },
                threshold: DEFAULT_THRESHOLD,
            },
            LoudnessPreset::Medium => LimiterPreset {
                limiter: LimiterConfig::default(),
                threshold: 0.95,
            },
            LoudnessPreset::High => LimiterPreset {
                limiter: LimiterConfig {
                    attack: 1.0,
                    hold: 1.0,
                    release: 1000.0,
                    attack_filter_coefficient: -6.0,
                    hold_filter_order: 2,
                    hold_filter_coefficient: 15.0,
                    release_filter_order: 1,
                    release_filter_coefficient: 200.0,
                },
                threshold: 0.85,
            },
        }
    }
}

/// User-supplied limiter overrides; absent fields keep the preset value
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LimiterOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attack: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hold: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attack_filter_coefficient: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hold_filter_order: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hold_filter_coefficient: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_filter_order: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_filter_coefficient: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
}

/// Form field name → how its value is parsed and checked
#[derive(Clone, Copy)]
enum FieldRule {
    Positive,
    Finite,
    Order,
    Threshold,
}

const FORM_FIELDS: [(&str, FieldRule); 9] = [
    ("limiter_attack", FieldRule::Positive),
    ("limiter_hold", FieldRule::Positive),
    ("limiter_release", FieldRule::Positive),
    ("limiter_attack_filter", FieldRule::Finite),
    ("limiter_hold_order", FieldRule::Order),
    ("limiter_hold_filter", FieldRule::Positive),
    ("limiter_release_order", FieldRule::Order),
    ("limiter_release_filter", FieldRule::Positive),
    ("limiter_threshold", FieldRule::Threshold),
];

impl LimiterOverrides {
    /// Parse overrides from upload form fields
    ///
    /// Empty values are skipped and unknown keys are ignored. The first
    /// invalid value aborts parsing with [`Error::InvalidInput`].
    pub fn from_form(form: &HashMap<String, String>) -> Result<Self> {
        let mut overrides = LimiterOverrides::default();

        for (key, rule) in FORM_FIELDS {
            let raw = match form.get(key).map(|v| v.trim()) {
                Some(raw) if !raw.is_empty() => raw,
                _ => continue,
            };

            let value: f64 = raw.parse().map_err(|_| match rule {
                FieldRule::Order => Error::InvalidInput(format!("Invalid integer value for {}.", key)),
                _ => Error::InvalidInput(format!(
                    "Invalid value for {}. Please provide a number.",
                    key
                )),
            })?;
            check_value(key, rule, value)?;

            match key {
                "limiter_attack" => overrides.attack = Some(value),
                "limiter_hold" => overrides.hold = Some(value),
                "limiter_release" => overrides.release = Some(value),
                "limiter_attack_filter" => overrides.attack_filter_coefficient = Some(value),
                "limiter_hold_order" => overrides.hold_filter_order = Some(value.trunc() as u32),
                "limiter_hold_filter" => overrides.hold_filter_coefficient = Some(value),
                "limiter_release_order" => overrides.release_filter_order = Some(value.trunc() as u32),
                "limiter_release_filter" => overrides.release_filter_coefficient = Some(value),
                "limiter_threshold" => overrides.threshold = Some(value),
                _ => {}
            }
        }

        Ok(overrides)
    }

    /// Re-check every present field against the same rules as [`from_form`](Self::from_form)
    pub fn validate(&self) -> Result<()> {
        let checks: [(&str, FieldRule, Option<f64>); 9] = [
            ("limiter_attack", FieldRule::Positive, self.attack),
            ("limiter_hold", FieldRule::Positive, self.hold),
            ("limiter_release", FieldRule::Positive, self.release),
            ("limiter_attack_filter", FieldRule::Finite, self.attack_filter_coefficient),
            ("limiter_hold_order", FieldRule::Order, self.hold_filter_order.map(f64::from)),
            ("limiter_hold_filter", FieldRule::Positive, self.hold_filter_coefficient),
            ("limiter_release_order", FieldRule::Order, self.release_filter_order.map(f64::from)),
            ("limiter_release_filter", FieldRule::Positive, self.release_filter_coefficient),
            ("limiter_threshold", FieldRule::Threshold, self.threshold),
        ];

        for (key, rule, value) in checks {
            if let Some(value) = value {
                check_value(key, rule, value)?;
            }
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        *self == LimiterOverrides::default()
    }
}

fn check_value(key: &str, rule: FieldRule, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(Error::InvalidInput(format!(
            "{} must be a finite number.",
            title_case(key)
        )));
    }

    match rule {
        FieldRule::Finite => Ok(()),
        FieldRule::Positive if value <= 0.0 => Err(Error::InvalidInput(format!(
            "{} must be greater than zero.",
            title_case(key)
        ))),
        // Orders are truncated toward zero, so 0.5 is as invalid as 0
        FieldRule::Order if value.trunc() <= 0.0 => Err(Error::InvalidInput(format!(
            "{} must be greater than zero.",
            title_case(key)
        ))),
        FieldRule::Order if value.trunc() > f64::from(u32::MAX) => Err(Error::InvalidInput(format!(
            "{} is too large.",
            title_case(key)
        ))),
        FieldRule::Threshold if !(value > 0.0 && value < 1.0) => Err(Error::InvalidInput(
            "Limiter threshold must be between 0 and 1.".to_string(),
        )),
        _ => Ok(()),
    }
}

/// `limiter_hold_order` → `Limiter Hold Order`
fn title_case(key: &str) -> String {
    key.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_threshold_bounds() {
        assert!(LimiterOverrides::from_form(&form(&[("limiter_threshold", "0")])).is_err());
        assert!(LimiterOverrides::from_form(&form(&[("limiter_threshold", "1")])).is_err());

        let ok = LimiterOverrides::from_form(&form(&[("limiter_threshold", "0.5")])).unwrap();
        assert_eq!(ok.threshold, Some(0.5));
    }

    #[test]
    fn test_threshold_error_message() {
        let err = LimiterOverrides::from_form(&form(&[("limiter_threshold", "1.2")])).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid input: Limiter threshold must be between 0 and 1."
        );
    }

    #[test]
    fn test_positive_fields_reject_zero_and_negative() {
        let err = LimiterOverrides::from_form(&form(&[("limiter_release", "0")])).unwrap_err();
        assert!(err.to_string().contains("Limiter Release must be greater than zero."));

        assert!(LimiterOverrides::from_form(&form(&[("limiter_hold_filter", "-3")])).is_err());
    }

    #[test]
    fn test_attack_filter_may_be_negative() {
        let ok = LimiterOverrides::from_form(&form(&[("limiter_attack_filter", "-4.5")])).unwrap();
        assert_eq!(ok.attack_filter_coefficient, Some(-4.5));
    }

    #[test]
    fn test_non_finite_rejected() {
        assert!(LimiterOverrides::from_form(&form(&[("limiter_attack", "inf")])).is_err());
        assert!(LimiterOverrides::from_form(&form(&[("limiter_attack_filter", "NaN")])).is_err());
    }

    #[test]
    fn test_orders_truncate() {
        let ok = LimiterOverrides::from_form(&form(&[("limiter_hold_order", "2.9")])).unwrap();
        assert_eq!(ok.hold_filter_order, Some(2));

        let err = LimiterOverrides::from_form(&form(&[("limiter_release_order", "abc")])).unwrap_err();
        assert!(err.to_string().contains("Invalid integer value for limiter_release_order."));

        assert!(LimiterOverrides::from_form(&form(&[("limiter_release_order", "0.4")])).is_err());
    }

    #[test]
    fn test_empty_and_unknown_fields_ignored() {
        let parsed = LimiterOverrides::from_form(&form(&[
            ("limiter_attack", ""),
            ("limiter_colour", "blue"),
        ]))
        .unwrap();
        assert!(parsed.is_empty());
    }

    #[test]
    fn test_overrides_replace_only_supplied_fields() {
        let overrides = LimiterOverrides {
            release: Some(500.0),
            threshold: Some(0.7),
            ..Default::default()
        };

        let high = LoudnessPreset::High.params();
        let merged = high.with_overrides(&overrides);

        assert_eq!(merged.limiter.release, 500.0);
        assert_eq!(merged.threshold, 0.7);
        assert_eq!(merged.limiter.attack, high.limiter.attack);
        assert_eq!(merged.limiter.hold_filter_order, 2);
        assert_eq!(merged.limiter.release_filter_coefficient, 200.0);
    }

    #[test]
    fn test_validate_matches_form_rules() {
        let bad = LimiterOverrides {
            hold_filter_order: Some(0),
            ..Default::default()
        };
        assert!(bad.validate().is_err());

        let good = LimiterOverrides {
            threshold: Some(0.5),
            attack_filter_coefficient: Some(-2.0),
            ..Default::default()
        };
        assert!(good.validate().is_ok());
    }

    #[test]
    fn test_medium_preset_matches_engine_defaults() {
        let medium = LoudnessPreset::Medium.params();
        assert_eq!(medium.limiter, LimiterConfig::default());
        assert_eq!(medium.threshold, 0.95);
        assert!(LoudnessPreset::Low.params().threshold > 0.99);
    }
}
