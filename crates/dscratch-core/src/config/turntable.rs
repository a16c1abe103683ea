//! Per-turntable settings as stored on disk

use serde::{Deserialize, Serialize};

use crate::error::{DscratchError, DscratchResult};
use crate::vinyl::{Rpm, VinylType};

/// Turntable settings
///
/// Every optional field left to `None` takes the vinyl format default, so a
/// config written for one format stays meaningful after switching format.
///
/// ```yaml
/// vinyl_type: mixvibes
/// rpm: 45
/// min_amplitude: 0.01
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TurntableConfig {
    pub vinyl_type: VinylType,
    pub rpm: Rpm,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_amplify_coeff: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_amplitude: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_amplitude_for_normal_speed: Option<f32>,
}

impl TurntableConfig {
    /// Format defaults for `vinyl_type`
    pub fn for_vinyl(vinyl_type: VinylType) -> Self {
        Self {
            vinyl_type,
            ..Self::default()
        }
    }

    pub fn input_amplify_coeff(&self) -> i32 {
        self.input_amplify_coeff
            .unwrap_or_else(|| self.vinyl_type.default_input_amplify_coeff())
    }

    pub fn min_amplitude(&self) -> f32 {
        self.min_amplitude
            .unwrap_or_else(|| self.vinyl_type.default_min_amplitude())
    }

    pub fn min_amplitude_for_normal_speed(&self) -> f32 {
        self.min_amplitude_for_normal_speed
            .unwrap_or_else(|| self.vinyl_type.default_min_amplitude_for_normal_speed())
    }

    /// Check the overrides the same way the turntable setters do
    pub fn validate(&self) -> DscratchResult<()> {
        let coeff = self.input_amplify_coeff();
        if coeff < 1 {
            return Err(DscratchError::InvalidAmplifyCoeff(coeff));
        }
        for amplitude in [self.min_amplitude(), self.min_amplitude_for_normal_speed()] {
            if !amplitude.is_finite() || amplitude <= 0.0 {
                return Err(DscratchError::InvalidAmplitude(amplitude));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_follow_format() {
        let config = TurntableConfig::for_vinyl(VinylType::Mixvibes);
        assert_eq!(config.input_amplify_coeff(), VinylType::Mixvibes.default_input_amplify_coeff());
        assert_eq!(config.min_amplitude(), VinylType::Mixvibes.default_min_amplitude());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_yaml_overrides() {
        let yaml = "vinyl_type: final_scratch\nrpm: 45\nmin_amplitude: 0.02\n";
        let config: TurntableConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.vinyl_type, VinylType::FinalScratch);
        assert_eq!(config.rpm, Rpm::Rpm45);
        assert!((config.min_amplitude() - 0.02).abs() < f32::EPSILON);
        assert_eq!(
            config.min_amplitude_for_normal_speed(),
            VinylType::FinalScratch.default_min_amplitude_for_normal_speed()
        );
    }

    #[test]
    fn test_unsupported_rpm_rejected() {
        assert!(serde_yaml::from_str::<TurntableConfig>("rpm: 78\n").is_err());
    }

    #[test]
    fn test_validate_rejects_bad_overrides() {
        let config = TurntableConfig {
            input_amplify_coeff: Some(0),
            ..TurntableConfig::default()
        };
        assert_eq!(config.validate(), Err(DscratchError::InvalidAmplifyCoeff(0)));

        let config = TurntableConfig {
            min_amplitude: Some(-1.0),
            ..TurntableConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
