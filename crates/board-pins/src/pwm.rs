use core::ops::Deref;

use pin_registry::ResourceKey;
use tracing::debug;

use crate::error::PinError;
use crate::pin::{Pin, PinContext, PinProperty};

/// Handle on one PWM output. Times are in nanoseconds.
#[derive(Debug)]
pub struct PwmPin {
    pin: Pin,
}

impl PwmPin {
    /// Open PWM output `device` (0..=3).
    pub fn new(ctx: &PinContext, device: u32) -> Result<Self, PinError> {
        let pin = Pin::open(ctx, ResourceKey::pwm(device))?;
        debug!("[Pin] initializing pwm{device} at {}", pin.path().display());
        Ok(Self { pin })
    }

    pub fn period_ns(&self) -> Result<u32, PinError> {
        self.pin.read_parsed(PinProperty::PwmPeriod, "a period in ns")
    }

    pub fn set_period_ns(&self, period: u32) -> Result<(), PinError> {
        self.pin.write_property(PinProperty::PwmPeriod, period)
    }

    pub fn duty_cycle_ns(&self) -> Result<u32, PinError> {
        self.pin.read_parsed(PinProperty::PwmDuty, "a duty cycle in ns")
    }

    pub fn set_duty_cycle_ns(&self, duty: u32) -> Result<(), PinError> {
        self.pin.write_property(PinProperty::PwmDuty, duty)
    }

    /// Set the duty cycle as a share of the current period.
    ///
    /// Returns the duty time written.
    pub fn set_duty_cycle_percent(&self, percent: f64) -> Result<u32, PinError> {
        if !(0.0..=100.0).contains(&percent) {
            return Err(PinError::InvalidArgument(format!(
                "duty cycle {percent}% is outside 0..=100"
            )));
        }
        let period = self.period_ns()?;
        let duty = (f64::from(period) * percent / 100.0) as u32;
        self.set_duty_cycle_ns(duty)?;
        Ok(duty)
    }

    pub fn set_enabled(&self, enabled: bool) -> Result<(), PinError> {
        self.pin.write_property(PinProperty::PwmEnable, u8::from(enabled))
    }
}

impl Deref for PwmPin {
    type Target = Pin;

    #[inline]
    fn deref(&self) -> &Pin {
        &self.pin
    }
}
