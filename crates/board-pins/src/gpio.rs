use core::fmt;
use core::ops::Deref;
use core::str::FromStr;

use pin_registry::ResourceKey;
use tracing::{debug, trace};

use crate::error::PinError;
use crate::pin::{Pin, PinContext, PinProperty};

/// GPIO pin direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpioDirection {
    In,
    Out,
}

impl GpioDirection {
    /// Contents of the sysfs `direction` file.
    pub const fn as_str(self) -> &'static str {
        match self {
            GpioDirection::In => "in",
            GpioDirection::Out => "out",
        }
    }
}

impl fmt::Display for GpioDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GpioDirection {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in" => Ok(GpioDirection::In),
            "out" => Ok(GpioDirection::Out),
            _ => Err(()),
        }
    }
}

/// GPIO logic level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpioValue {
    Low,
    High,
}

impl From<bool> for GpioValue {
    fn from(value: bool) -> Self {
        if value { GpioValue::High } else { GpioValue::Low }
    }
}

impl From<GpioValue> for bool {
    fn from(value: GpioValue) -> Self {
        matches!(value, GpioValue::High)
    }
}

impl fmt::Display for GpioValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            GpioValue::Low => "0",
            GpioValue::High => "1",
        })
    }
}

impl FromStr for GpioValue {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "0" => Ok(GpioValue::Low),
            "1" => Ok(GpioValue::High),
            _ => Err(()),
        }
    }
}

/// Handle on one exported GPIO line.
#[derive(Debug)]
pub struct GpioPin {
    pin: Pin,
}

impl GpioPin {
    /// Open GPIO `device`, optionally configuring its direction.
    ///
    /// Configuration runs under the pin's drive lock. If another handle holds
    /// it, nothing is written and the call fails with [`PinError::Busy`].
    pub fn new(
        ctx: &PinContext,
        device: u32,
        direction: Option<GpioDirection>,
    ) -> Result<Self, PinError> {
        let gpio = Self { pin: Pin::open(ctx, ResourceKey::gpio(device))? };
        debug!("[Pin] initializing gpio{device}");

        if let Some(direction) = direction {
            let Some(_guard) = gpio.try_exclusive()? else {
                return Err(PinError::Busy { key: gpio.key() });
            };
            gpio.configure(direction)?;
        }
        Ok(gpio)
    }

    /// Switch the line to `direction`.
    ///
    /// Outputs are driven low before the direction flips, so the line never
    /// glitches high on configuration. The caller should hold the drive lock.
    pub fn configure(&self, direction: GpioDirection) -> Result<(), PinError> {
        if direction == GpioDirection::Out {
            self.set_value(GpioValue::Low)?;
        }
        self.set_direction(direction)
    }

    pub fn set_value(&self, value: GpioValue) -> Result<(), PinError> {
        self.pin.write_property(PinProperty::Value, value)
    }

    pub fn value(&self) -> Result<GpioValue, PinError> {
        self.pin.read_parsed(PinProperty::Value, "0 or 1")
    }

    pub fn set_direction(&self, direction: GpioDirection) -> Result<(), PinError> {
        trace!("[Pin] setting gpio{} to {direction}", self.key().device);
        self.pin.write_property(PinProperty::Direction, direction)
    }

    pub fn direction(&self) -> Result<GpioDirection, PinError> {
        self.pin.read_parsed(PinProperty::Direction, "in or out")
    }
}

impl Deref for GpioPin {
    type Target = Pin;

    #[inline]
    fn deref(&self) -> &Pin {
        &self.pin
    }
}
