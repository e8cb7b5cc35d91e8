//! Pin handles for the board's GPIO, ADC and PWM pins.
//!
//! Each handle is backed by kernel control files under sysfs and registers
//! itself with the process-wide [`PIN_REGISTRY`](pin_registry::PIN_REGISTRY)
//! for as long as it lives. Handles on the same physical pin can arbitrate
//! exclusive drive access through [`Pin::try_exclusive`].

mod adc;
mod error;
mod gpio;
mod layout;
mod pin;
mod pwm;
mod transport;

pub use adc::AdcPin;
pub use error::PinError;
pub use gpio::{GpioDirection, GpioPin, GpioValue};
pub use layout::{AdcScale, SysfsLayout};
pub use pin::{BoardRegistry, Pin, PinContext, PinExclusive, PinProperty};
pub use pwm::PwmPin;
pub use transport::{PinTransport, SysfsTransport};

pub use pin_registry::{
    Arbitration, HandleId, LockState, LockStatus, PinKind, RegistryError,
    ResourceKey,
};
