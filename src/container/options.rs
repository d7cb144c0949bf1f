// ============================================================================
// spark-features - Container Options
// ============================================================================

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::constants::DEFAULT_FRAME_RATE;
use crate::error::{FeatureError, Result};

/// Tunables for a features container.
///
/// ```
/// use spark_features::ContainerOptions;
/// use std::time::Duration;
///
/// let options: ContainerOptions = serde_json::from_str(r#"{"debounce_ms": 50}"#).unwrap();
/// assert_eq!(options.frame_rate, 60);
/// assert_eq!(options.debounce_window(), Duration::from_millis(50));
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerOptions {
    /// Render-loop rate; the debounce window is one frame at this rate
    pub frame_rate: u32,

    /// Explicit debounce window in milliseconds, overriding `frame_rate`
    pub debounce_ms: Option<f64>,
}

impl ContainerOptions {
    pub fn validate(&self) -> Result<()> {
        if self.frame_rate == 0 {
            return Err(FeatureError::config("frame_rate must be greater than zero"));
        }
        if let Some(ms) = self.debounce_ms {
            if !ms.is_finite() || ms < 0.0 {
                return Err(FeatureError::config(format!(
                    "debounce_ms must be a finite, non-negative number (got {})",
                    ms
                )));
            }
        }
        Ok(())
    }

    /// Quiet period after which a burst of feature changes bumps the
    /// revision. Call on validated options.
    pub fn debounce_window(&self) -> Duration {
        match self.debounce_ms {
            Some(ms) => Duration::from_micros((ms * 1000.0).round() as u64),
            None => Duration::from_nanos(1_000_000_000 / u64::from(self.frame_rate.max(1))),
        }
    }
}

impl Default for ContainerOptions {
    fn default() -> Self {
        Self {
            frame_rate: DEFAULT_FRAME_RATE,
            debounce_ms: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::constants::FRAME;

    #[test]
    fn default_window_is_one_frame() {
        let options = ContainerOptions::default();
        assert!(options.validate().is_ok());
        assert_eq!(options.debounce_window(), FRAME);
    }

    #[test]
    fn frame_rate_sets_the_window() {
        let options = ContainerOptions {
            frame_rate: 30,
            ..Default::default()
        };
        assert_eq!(options.debounce_window(), Duration::from_nanos(33_333_333));
    }

    #[test]
    fn invalid_options_are_config_errors() {
        let zero = ContainerOptions {
            frame_rate: 0,
            ..Default::default()
        };
        assert!(matches!(zero.validate(), Err(FeatureError::Config(_))));

        let negative = ContainerOptions {
            debounce_ms: Some(-1.0),
            ..Default::default()
        };
        assert!(matches!(negative.validate(), Err(FeatureError::Config(_))));

        let nan = ContainerOptions {
            debounce_ms: Some(f64::NAN),
            ..Default::default()
        };
        assert!(nan.validate().is_err());
    }

    #[test]
    fn deserializes_with_defaults() {
        let options: ContainerOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options, ContainerOptions::default());

        let options: ContainerOptions = serde_json::from_str(r#"{"frame_rate": 120}"#).unwrap();
        assert_eq!(options.frame_rate, 120);
        assert_eq!(options.debounce_ms, None);
    }
}
