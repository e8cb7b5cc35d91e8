use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use pin_registry::{
    Arbitration, ExclusiveGuard, HandleId, LockStatus, PinKind, PinLease,
    PinRegistry, ResourceKey, PIN_REGISTRY,
};
use tracing::debug;

use crate::error::PinError;
use crate::layout::SysfsLayout;
use crate::transport::{PinTransport, SysfsTransport};

/// Registry type shared by every pin handle.
pub type BoardRegistry = PinRegistry<CriticalSectionRawMutex>;

/// Scoped exclusive access to a pin.
pub type PinExclusive<'a> =
    ExclusiveGuard<'a, 'static, CriticalSectionRawMutex>;

/// Properties a pin exposes as control files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinProperty {
    /// GPIO logic level.
    Value,
    /// GPIO direction, `in` or `out`.
    Direction,
    /// Raw ADC counts.
    AdcValue,
    PwmDuty,
    PwmPeriod,
    PwmEnable,
}

/// Everything a pin handle needs besides its own index.
#[derive(Clone)]
pub struct PinContext {
    registry: &'static BoardRegistry,
    layout: Arc<SysfsLayout>,
    transport: Arc<dyn PinTransport>,
}

impl PinContext {
    /// Context on the process-wide registry, writing through sysfs.
    pub fn new(layout: SysfsLayout) -> Self {
        Self {
            registry: &PIN_REGISTRY,
            layout: Arc::new(layout),
            transport: Arc::new(SysfsTransport::new()),
        }
    }

    pub fn with_transport(mut self, transport: Arc<dyn PinTransport>) -> Self {
        self.transport = transport;
        self
    }

    pub fn with_registry(mut self, registry: &'static BoardRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn registry(&self) -> &'static BoardRegistry {
        self.registry
    }

    pub fn layout(&self) -> &SysfsLayout {
        &self.layout
    }

    /// Control directory (or file, for ADC) of the pin behind `key`.
    pub fn pin_path(&self, key: ResourceKey) -> Result<PathBuf, PinError> {
        let (base, entry) = match key.kind {
            PinKind::Gpio => (&self.layout.gpio_base, format!("gpio{}", key.device)),
            PinKind::Adc => {
                (&self.layout.adc_base, format!("in_voltage{}_raw", key.device))
            }
            PinKind::Pwm => (&self.layout.pwm_base, pwm_entry(key.device)?),
        };
        Ok(base.join(entry))
    }
}

impl Default for PinContext {
    fn default() -> Self {
        Self::new(SysfsLayout::default())
    }
}

/// PWM outputs 0..=3 live on two chips: bit 1 picks `pwmchip2` over
/// `pwmchip0`, bit 0 picks the channel.
fn pwm_entry(device: u32) -> Result<String, PinError> {
    if device > 3 {
        return Err(PinError::InvalidDevice { kind: PinKind::Pwm, device });
    }
    let chip = if device & 0b10 != 0 { 2 } else { 0 };
    Ok(format!("pwmchip{chip}/pwm{}", device & 0b01))
}

/// A registered handle on one physical pin.
///
/// The typed handles ([`GpioPin`](crate::GpioPin), [`AdcPin`](crate::AdcPin),
/// [`PwmPin`](crate::PwmPin)) wrap this and dereference to it. The handle stays
/// registered until it is dropped.
pub struct Pin {
    lease: PinLease<'static, CriticalSectionRawMutex>,
    path: PathBuf,
    transport: Arc<dyn PinTransport>,
}

impl Pin {
    /// Register a new handle on `key`. No hardware is touched.
    pub fn open(ctx: &PinContext, key: ResourceKey) -> Result<Self, PinError> {
        let path = ctx.pin_path(key)?;
        let lease = PinLease::new(ctx.registry, key)?;
        debug!("[Pin] {} opened {key} at {}", lease.id(), path.display());
        Ok(Self { lease, path, transport: ctx.transport.clone() })
    }

    #[inline]
    pub fn key(&self) -> ResourceKey {
        self.lease.key()
    }

    #[inline]
    pub fn id(&self) -> HandleId {
        self.lease.id()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn property_path(&self, property: PinProperty) -> PathBuf {
        match property {
            PinProperty::Value => self.path.join("value"),
            PinProperty::Direction => self.path.join("direction"),
            PinProperty::AdcValue => self.path.clone(),
            PinProperty::PwmDuty => self.path.join("duty_cycle"),
            PinProperty::PwmPeriod => self.path.join("period"),
            PinProperty::PwmEnable => self.path.join("enable"),
        }
    }

    pub fn write_property(
        &self,
        property: PinProperty,
        data: impl Display,
    ) -> Result<(), PinError> {
        self.transport.write(&self.property_path(property), &data.to_string())
    }

    pub fn read_property(&self, property: PinProperty) -> Result<String, PinError> {
        self.transport.read(&self.property_path(property))
    }

    pub(crate) fn read_parsed<T: FromStr>(
        &self,
        property: PinProperty,
        expected: &'static str,
    ) -> Result<T, PinError> {
        let raw = self.read_property(property)?;
        raw.parse().map_err(|_| PinError::Parse {
            path: self.property_path(property),
            raw,
            expected,
        })
    }

    pub fn acquire_lock(&self) -> Result<Arbitration, PinError> {
        Ok(self.lease.acquire_lock()?)
    }

    pub fn release_lock(&self) -> Result<Arbitration, PinError> {
        Ok(self.lease.release_lock()?)
    }

    pub fn lock_status(&self) -> Result<LockStatus, PinError> {
        Ok(self.lease.lock_status()?)
    }

    pub fn is_locked(&self) -> Result<bool, PinError> {
        Ok(self.lease.is_locked()?)
    }

    /// Hold the pin's drive lock until the guard drops.
    ///
    /// `Ok(None)` means another handle on the same pin holds it.
    pub fn try_exclusive(&self) -> Result<Option<PinExclusive<'_>>, PinError> {
        Ok(self.lease.try_exclusive()?)
    }
}

impl std::fmt::Debug for Pin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pin")
            .field("key", &self.key())
            .field("id", &self.id())
            .field("path", &self.path)
            .finish()
    }
}
