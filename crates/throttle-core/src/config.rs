use serde::{Deserialize, Serialize};

use crate::error::ThrottleError;
use crate::strategy::StrategyKind;

/// Throttling configuration.
///
/// Every field has a default, so `{}` is a valid config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThrottleConfig {
    pub strategy: StrategyKind,
    /// Name of the execution slot, used in log spans.
    pub slot_name: String,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::Serial,
            slot_name: "serial".to_string(),
        }
    }
}

impl ThrottleConfig {
    pub fn from_json(s: &str) -> Result<Self, ThrottleError> {
        let config: Self =
            serde_json::from_str(s).map_err(|e| ThrottleError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ThrottleError> {
        if self.slot_name.trim().is_empty() {
            return Err(ThrottleError::InvalidConfig(
                "slot_name must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
