use std::{collections::BTreeMap, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{
    cadence::{Cadence, StepUnit},
    controller::ButtonId,
    error::ConfigError,
    keymap::KeyMap,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputDelivery {
    /// Send the packed controller byte to the core before every step.
    #[default]
    Packed,
    /// Forward every accepted press/release to the core as it arrives.
    Discrete,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Granularity of one core step. Unset means whatever the core declares.
    pub step_unit: Option<StepUnit>,
    /// Overrides the interval implied by the step unit.
    pub emulation_interval_ms: Option<f64>,
    /// Display refresh period for hosts without a refresh signal of their own.
    pub refresh_interval_ms: f64,
    pub input_delivery: InputDelivery,
    pub key_bindings: BTreeMap<String, ButtonId>,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            step_unit: None,
            emulation_interval_ms: None,
            refresh_interval_ms: 1000. / 60.,
            input_delivery: InputDelivery::Packed,
            key_bindings: KeyMap::default_bindings(),
        }
    }
}

impl DriverConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(ms) = self.emulation_interval_ms {
            if !valid_millis(ms) {
                return Err(ConfigError::Interval(ms));
            }
        }
        if !valid_millis(self.refresh_interval_ms) {
            return Err(ConfigError::RefreshInterval(self.refresh_interval_ms));
        }
        Ok(())
    }

    /// The configured step unit, falling back to the one `core_unit` names.
    pub fn step_unit_for(&self, core_unit: StepUnit) -> StepUnit {
        self.step_unit.unwrap_or(core_unit)
    }

    /// Tick spacing for a core that steps by `core_unit`.
    pub fn cadence(&self, core_unit: StepUnit) -> Result<Cadence, ConfigError> {
        let unit = self.step_unit_for(core_unit);
        match self.emulation_interval_ms {
            Some(ms) => Cadence::from_millis(ms, unit),
            None => Ok(Cadence::for_unit(unit)),
        }
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs_f64(self.refresh_interval_ms / 1000.)
    }

    pub fn key_map(&self) -> KeyMap {
        KeyMap::from_bindings(&self.key_bindings)
    }
}

// At least a microsecond, and finite.
fn valid_millis(ms: f64) -> bool {
    ms.is_finite() && ms >= 0.001
}
