use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::signal::{Gender, SignalSource};

/// Static prior weight per source, before any contextual adjustment.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcePriors {
    pub name: f64,
    pub sport: f64,
    pub photo: f64,
}

impl SourcePriors {
    #[inline]
    pub fn get(&self, source: SignalSource) -> f64 {
        match source {
            SignalSource::Name => self.name,
            SignalSource::Sport => self.sport,
            SignalSource::Photo => self.photo,
        }
    }
}

impl Default for SourcePriors {
    fn default() -> Self {
        Self {
            name: 0.4,
            sport: 0.3,
            photo: 0.3,
        }
    }
}

/// Multipliers applied when an `InferenceContext` flag is raised.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextFactors {
    /// Sport weight when the team assignment looks suspect.
    pub suspect_team: f64,
    /// Photo weight for group photos.
    pub group_photo: f64,
    pub low_quality_photo: f64,
    /// Name weight for names shared across genders.
    pub ambiguous_name: f64,
}

impl Default for ContextFactors {
    fn default() -> Self {
        Self {
            suspect_team: 0.3,
            group_photo: 0.05,
            low_quality_photo: 0.5,
            ambiguous_name: 0.4,
        }
    }
}

/// Shape of the confidence score.
///
/// `confidence = p* + agreement_bonus * agreement * margin * (1 - p*)`
/// where `p*` is the winner's mass and `margin` its lead over the runner-up.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceCfg {
    pub agreement_bonus: f64,
}

impl Default for ConfidenceCfg {
    fn default() -> Self {
        Self { agreement_bonus: 0.5 }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionCfg {
    pub priors: SourcePriors,

    /// Signals with reliability strictly below this are decayed.
    pub reliability_floor: f64,
    pub reliability_decay: f64,

    /// Signals whose own top probability reaches this are boosted.
    pub boost_certainty: f64,
    pub boost_factor: f64,

    pub context: ContextFactors,

    /// Override fires when a signal's reliability exceeds `override_reliability`
    /// and its top probability exceeds `override_certainty`.
    pub override_reliability: f64,
    pub override_certainty: f64,

    pub tie_order: [Gender; 3],
    pub tie_epsilon: f64,

    /// Allowed drift of a record's distribution sum from 1.
    pub sum_tolerance: f64,

    pub confidence: ConfidenceCfg,

    /// Below this confidence the inferred gender is reported as unknown.
    pub min_confidence: Option<f64>,
}

impl Default for FusionCfg {
    fn default() -> Self {
        Self {
            priors: SourcePriors::default(),
            reliability_floor: 0.6,
            reliability_decay: 0.5,
            boost_certainty: 0.9,
            boost_factor: 1.25,
            context: ContextFactors::default(),
            override_reliability: 0.9,
            override_certainty: 0.85,
            tie_order: [Gender::Male, Gender::Female, Gender::Unknown],
            tie_epsilon: 1e-9,
            sum_tolerance: 1e-6,
            confidence: ConfidenceCfg::default(),
            min_confidence: None,
        }
    }
}

fn unit(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidThreshold { name, value })
    }
}

fn non_negative(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidThreshold { name, value })
    }
}

impl FusionCfg {
    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let cfg: FusionCfg = toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load and validate a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&contents)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut prior_sum = 0.0;
        for source in SignalSource::ALL {
            let value = self.priors.get(source);
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidPrior { signal: source, value });
            }
            prior_sum += value;
        }
        if prior_sum <= 0.0 {
            return Err(ConfigError::InvalidThreshold { name: "priors (sum)", value: prior_sum });
        }

        unit("reliability_floor", self.reliability_floor)?;
        unit("reliability_decay", self.reliability_decay)?;
        unit("boost_certainty", self.boost_certainty)?;
        non_negative("boost_factor", self.boost_factor)?;

        unit("context.suspect_team", self.context.suspect_team)?;
        unit("context.group_photo", self.context.group_photo)?;
        unit("context.low_quality_photo", self.context.low_quality_photo)?;
        unit("context.ambiguous_name", self.context.ambiguous_name)?;

        unit("override_reliability", self.override_reliability)?;
        unit("override_certainty", self.override_certainty)?;

        for g in Gender::ALL {
            if self.tie_order.iter().filter(|&&o| o == g).count() != 1 {
                return Err(ConfigError::InvalidTieOrder(self.tie_order));
            }
        }
        non_negative("tie_epsilon", self.tie_epsilon)?;

        if !(self.sum_tolerance.is_finite() && self.sum_tolerance > 0.0 && self.sum_tolerance < 1.0) {
            return Err(ConfigError::InvalidThreshold { name: "sum_tolerance", value: self.sum_tolerance });
        }

        unit("confidence.agreement_bonus", self.confidence.agreement_bonus)?;
        if let Some(min) = self.min_confidence {
            unit("min_confidence", min)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        FusionCfg::default().validate().unwrap();
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg = FusionCfg::from_toml_str(
            r#"
            reliability_floor = 0.4
            tie_order = ["female", "male", "unknown"]

            [priors]
            name = 0.5
            "#,
        )
        .unwrap();
        assert_eq!(cfg.reliability_floor, 0.4);
        assert_eq!(cfg.priors.name, 0.5);
        assert_eq!(cfg.priors.sport, 0.3);
        assert_eq!(cfg.tie_order[0], Gender::Female);
        assert_eq!(cfg.override_certainty, 0.85);
    }

    #[test]
    fn rejects_out_of_range_prior() {
        let err = FusionCfg::from_toml_str("[priors]\nphoto = 1.5\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPrior { signal: SignalSource::Photo, .. }));
    }

    #[test]
    fn rejects_all_zero_priors() {
        let mut cfg = FusionCfg::default();
        cfg.priors = SourcePriors { name: 0.0, sport: 0.0, photo: 0.0 };
        assert!(matches!(cfg.validate(), Err(ConfigError::InvalidThreshold { .. })));
    }

    #[test]
    fn rejects_repeated_tie_order() {
        let mut cfg = FusionCfg::default();
        cfg.tie_order = [Gender::Male, Gender::Male, Gender::Unknown];
        assert!(matches!(cfg.validate(), Err(ConfigError::InvalidTieOrder(_))));
    }

    #[test]
    fn rejects_garbage_toml() {
        assert!(matches!(FusionCfg::from_toml_str("priors = 3"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = FusionCfg::load("/nonexistent/genfer/fusion.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
