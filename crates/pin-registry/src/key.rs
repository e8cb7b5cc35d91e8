use core::fmt;

/// The kinds of pin the board exposes through sysfs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PinKind {
    Gpio,
    Adc,
    Pwm,
}

impl PinKind {
    /// Lowercase name, as used in sysfs paths and log lines.
    pub const fn as_str(self) -> &'static str {
        match self {
            PinKind::Gpio => "gpio",
            PinKind::Adc => "adc",
            PinKind::Pwm => "pwm",
        }
    }
}

impl fmt::Display for PinKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of one physical pin, shared by every handle bound to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceKey {
    pub kind: PinKind,
    pub device: u32,
}

impl ResourceKey {
    /// Key for pin `device` of `kind`.
    pub const fn new(kind: PinKind, device: u32) -> Self {
        Self { kind, device }
    }

    /// Key for GPIO line `device`.
    pub const fn gpio(device: u32) -> Self {
        Self::new(PinKind::Gpio, device)
    }

    /// Key for ADC channel `device`.
    pub const fn adc(device: u32) -> Self {
        Self::new(PinKind::Adc, device)
    }

    /// Key for PWM output `device`.
    pub const fn pwm(device: u32) -> Self {
        Self::new(PinKind::Pwm, device)
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.kind, self.device)
    }
}
