use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// How much emulated time one `EmulationCore::step` covers. This is a property
/// of the core; the driver only uses it to pick a matching default interval.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepUnit {
    #[default]
    Frame,
    Scanline,
}

impl StepUnit {
    pub const FRAMES_PER_SECOND: u32 = 60;
    /// NTSC scanlines per frame, including vblank and pre-render.
    pub const SCANLINES_PER_FRAME: u32 = 262;

    pub fn steps_per_second(self) -> u32 {
        match self {
            StepUnit::Frame => Self::FRAMES_PER_SECOND,
            StepUnit::Scanline => Self::FRAMES_PER_SECOND * Self::SCANLINES_PER_FRAME,
        }
    }

    pub fn default_interval(self) -> Duration {
        Duration::from_secs(1) / self.steps_per_second()
    }
}

/// Target wall-clock spacing between emulation ticks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cadence {
    pub interval: Duration,
    pub unit: StepUnit,
}

impl Cadence {
    pub fn for_unit(unit: StepUnit) -> Self {
        Self {
            interval: unit.default_interval(),
            unit,
        }
    }

    /// Fails on negative, non-finite or overflowing intervals.
    pub fn from_millis(ms: f64, unit: StepUnit) -> Result<Self, ConfigError> {
        let interval =
            Duration::try_from_secs_f64(ms / 1000.).map_err(|_| ConfigError::Interval(ms))?;
        Ok(Self { interval, unit })
    }

    pub fn interval_millis(&self) -> f64 {
        self.interval.as_secs_f64() * 1000.
    }
}

impl Default for Cadence {
    fn default() -> Self {
        Self::for_unit(StepUnit::Frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_cadence_is_sixty_hertz() {
        let c = Cadence::default();
        assert_eq!(c.unit, StepUnit::Frame);
        assert!((c.interval_millis() - 1000. / 60.).abs() < 1e-3);
    }

    #[test]
    fn scanline_cadence() {
        let c = Cadence::for_unit(StepUnit::Scanline);
        let frame = Cadence::for_unit(StepUnit::Frame);
        let ratio = frame.interval.as_secs_f64() / c.interval.as_secs_f64();
        assert!((ratio - 262.).abs() < 0.01);
    }

    #[test]
    fn explicit_millis() {
        let c = Cadence::from_millis(5., StepUnit::Scanline).unwrap();
        assert_eq!(c.interval, Duration::from_millis(5));
        assert_eq!(c.unit, StepUnit::Scanline);
    }

    #[test]
    fn unrepresentable_millis_are_errors() {
        for ms in [-1., f64::NAN, f64::INFINITY, f64::MAX] {
            assert!(
                matches!(
                    Cadence::from_millis(ms, StepUnit::Frame),
                    Err(ConfigError::Interval(_))
                ),
                "{ms}"
            );
        }
    }
}
