use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::PinError;

/// Conversion from raw ADC counts to volts.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct AdcScale {
    pub reference_volts: f64,
    pub full_scale: u32,
}

impl Default for AdcScale {
    fn default() -> Self {
        // 12-bit converter against the 1.8 V analog reference.
        Self { reference_volts: 1.8, full_scale: 4096 }
    }
}

impl AdcScale {
    pub fn volts(&self, raw: u32) -> f64 {
        f64::from(raw) * self.reference_volts / f64::from(self.full_scale)
    }
}

/// Where the kernel exposes each kind of pin.
///
/// Every field falls back to the board default, so a config file only needs to
/// name what differs:
///
/// ```json
/// { "pwm_base": "/tmp/fake-sys/class/pwm/" }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SysfsLayout {
    pub gpio_base: PathBuf,
    pub adc_base: PathBuf,
    pub pwm_base: PathBuf,
    pub adc_scale: AdcScale,
}

impl Default for SysfsLayout {
    fn default() -> Self {
        Self {
            gpio_base: PathBuf::from("/sys/class/gpio/"),
            adc_base: PathBuf::from("/sys/bus/iio/devices/iio:device0/"),
            pwm_base: PathBuf::from("/sys/class/pwm/"),
            adc_scale: AdcScale::default(),
        }
    }
}

impl SysfsLayout {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn load(path: &Path) -> Result<Self, PinError> {
        let json = std::fs::read_to_string(path).map_err(|source| {
            PinError::Io { path: path.to_owned(), source }
        })?;
        let layout = Self::from_json(&json).map_err(|source| {
            PinError::Layout { path: path.to_owned(), source }
        })?;
        debug!("[Pin] loaded sysfs layout from {}", path.display());
        Ok(layout)
    }
}
