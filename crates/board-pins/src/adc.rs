use core::ops::Deref;

use pin_registry::ResourceKey;
use tracing::debug;

use crate::error::PinError;
use crate::layout::AdcScale;
use crate::pin::{Pin, PinContext, PinProperty};

/// Handle on one IIO voltage channel.
#[derive(Debug)]
pub struct AdcPin {
    pin: Pin,
    scale: AdcScale,
}

impl AdcPin {
    pub fn new(ctx: &PinContext, device: u32) -> Result<Self, PinError> {
        let pin = Pin::open(ctx, ResourceKey::adc(device))?;
        debug!("[Pin] initializing adc{device}");
        Ok(Self { pin, scale: ctx.layout().adc_scale })
    }

    /// Raw converter counts.
    pub fn read_raw(&self) -> Result<u32, PinError> {
        self.pin.read_parsed(PinProperty::AdcValue, "an unsigned integer")
    }

    pub fn read_volts(&self) -> Result<f64, PinError> {
        Ok(self.scale.volts(self.read_raw()?))
    }
}

impl Deref for AdcPin {
    type Target = Pin;

    #[inline]
    fn deref(&self) -> &Pin {
        &self.pin
    }
}
