use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use board_pins::{
    AdcPin, BoardRegistry, GpioDirection, GpioPin, GpioValue, LockStatus,
    PinContext, PinError, PinKind, PinTransport, PwmPin, RegistryError,
    ResourceKey, SysfsLayout,
};

// ---------------------------------------------------------------------------
// Mock transport
// ---------------------------------------------------------------------------

/// In-memory stand-in for the sysfs tree.
#[derive(Default)]
struct MockTransport {
    files: Mutex<HashMap<PathBuf, String>>,
    /// Every write, in order.
    writes: Mutex<Vec<(PathBuf, String)>>,
}

impl MockTransport {
    fn preset(&self, path: &str, contents: &str) {
        self.files.lock().unwrap().insert(PathBuf::from(path), contents.to_owned());
    }

    fn contents(&self, path: &str) -> Option<String> {
        self.files.lock().unwrap().get(Path::new(path)).cloned()
    }

    fn writes(&self) -> Vec<(String, String)> {
        self.writes
            .lock()
            .unwrap()
            .iter()
            .map(|(p, d)| (p.display().to_string(), d.clone()))
            .collect()
    }
}

impl PinTransport for MockTransport {
    fn write(&self, path: &Path, data: &str) -> Result<(), PinError> {
        self.writes.lock().unwrap().push((path.to_owned(), data.to_owned()));
        self.files.lock().unwrap().insert(path.to_owned(), data.to_owned());
        Ok(())
    }

    fn read(&self, path: &Path) -> Result<String, PinError> {
        self.files.lock().unwrap().get(path).cloned().ok_or_else(|| PinError::Io {
            path: path.to_owned(),
            source: std::io::ErrorKind::NotFound.into(),
        })
    }
}

// ---------------------------------------------------------------------------
// Helper
// ---------------------------------------------------------------------------

/// Context with its own registry so tests never share lock state.
fn make_context() -> (PinContext, Arc<MockTransport>, &'static BoardRegistry) {
    let registry: &'static BoardRegistry = Box::leak(Box::new(BoardRegistry::new()));
    let transport = Arc::new(MockTransport::default());
    let ctx = PinContext::new(SysfsLayout::default())
        .with_registry(registry)
        .with_transport(transport.clone());
    (ctx, transport, registry)
}

// ---------------------------------------------------------------------------
// GPIO
// ---------------------------------------------------------------------------

#[test]
fn gpio_output_is_driven_low_before_direction() {
    let (ctx, transport, _) = make_context();

    let _gpio = GpioPin::new(&ctx, 12, Some(GpioDirection::Out)).unwrap();

    assert_eq!(
        transport.writes(),
        vec![
            ("/sys/class/gpio/gpio12/value".to_owned(), "0".to_owned()),
            ("/sys/class/gpio/gpio12/direction".to_owned(), "out".to_owned()),
        ]
    );
}

#[test]
fn gpio_without_direction_touches_nothing() {
    let (ctx, transport, _) = make_context();

    let _gpio = GpioPin::new(&ctx, 7, None).unwrap();

    assert!(transport.writes().is_empty());
}

#[test]
fn gpio_input_sets_direction_only() {
    let (ctx, transport, _) = make_context();

    let _gpio = GpioPin::new(&ctx, 7, Some(GpioDirection::In)).unwrap();

    assert_eq!(
        transport.writes(),
        vec![("/sys/class/gpio/gpio7/direction".to_owned(), "in".to_owned())]
    );
}

#[test]
fn gpio_output_setup_waits_for_the_drive_lock() {
    let (ctx, transport, registry) = make_context();
    let a = GpioPin::new(&ctx, 12, None).unwrap();
    let _guard = a.try_exclusive().unwrap().expect("pin should be free");
    a.set_value(GpioValue::High).unwrap();
    let before = transport.writes();

    let err = GpioPin::new(&ctx, 12, Some(GpioDirection::Out)).unwrap_err();

    assert!(matches!(err, PinError::Busy { key } if key == ResourceKey::gpio(12)));
    assert_eq!(transport.writes(), before);
    assert_eq!(transport.contents("/sys/class/gpio/gpio12/value").as_deref(), Some("1"));
    assert_eq!(a.lock_status().unwrap(), LockStatus::HeldBySelf);
    // The refused handle does not linger in the registry.
    assert_eq!(registry.handle_count(ResourceKey::gpio(12)), 1);
}

#[test]
fn gpio_setup_releases_the_lock_it_took() {
    let (ctx, _, _) = make_context();

    let gpio = GpioPin::new(&ctx, 12, Some(GpioDirection::Out)).unwrap();

    assert_eq!(gpio.lock_status().unwrap(), LockStatus::Unlocked);
}

#[test]
fn gpio_configure_under_held_lock_keeps_it() {
    let (ctx, transport, _) = make_context();
    let gpio = GpioPin::new(&ctx, 4, None).unwrap();
    assert!(gpio.acquire_lock().unwrap().is_granted());

    gpio.configure(GpioDirection::Out).unwrap();

    assert_eq!(
        transport.writes(),
        vec![
            ("/sys/class/gpio/gpio4/value".to_owned(), "0".to_owned()),
            ("/sys/class/gpio/gpio4/direction".to_owned(), "out".to_owned()),
        ]
    );
    assert_eq!(gpio.lock_status().unwrap(), LockStatus::HeldBySelf);
}

#[test]
fn gpio_value_round_trip_through_files() {
    let (ctx, transport, _) = make_context();
    let gpio = GpioPin::new(&ctx, 3, Some(GpioDirection::Out)).unwrap();

    gpio.set_value(GpioValue::High).unwrap();
    assert_eq!(transport.contents("/sys/class/gpio/gpio3/value").as_deref(), Some("1"));
    assert_eq!(gpio.value().unwrap(), GpioValue::High);
    assert_eq!(gpio.direction().unwrap(), GpioDirection::Out);
}

#[test]
fn gpio_garbage_value_is_a_parse_error() {
    let (ctx, transport, _) = make_context();
    let gpio = GpioPin::new(&ctx, 3, None).unwrap();
    transport.preset("/sys/class/gpio/gpio3/value", "2");

    let err = gpio.value().unwrap_err();
    assert!(matches!(err, PinError::Parse { ref raw, .. } if raw == "2"));
}

#[test]
fn missing_control_file_is_an_io_error() {
    let (ctx, _, _) = make_context();
    let gpio = GpioPin::new(&ctx, 9, None).unwrap();

    assert!(matches!(gpio.direction(), Err(PinError::Io { .. })));
}

// ---------------------------------------------------------------------------
// ADC
// ---------------------------------------------------------------------------

#[test]
fn adc_scales_raw_counts() {
    let (ctx, transport, _) = make_context();
    transport.preset("/sys/bus/iio/devices/iio:device0/in_voltage2_raw", "2048");

    let adc = AdcPin::new(&ctx, 2).unwrap();

    assert_eq!(adc.read_raw().unwrap(), 2048);
    assert!((adc.read_volts().unwrap() - 0.9).abs() < 1e-9);
}

#[test]
fn adc_uses_layout_scale() {
    let (_, transport, registry) = make_context();
    let mut layout = SysfsLayout::default();
    layout.adc_scale.reference_volts = 3.3;
    let ctx = PinContext::new(layout)
        .with_registry(registry)
        .with_transport(transport.clone());
    transport.preset("/sys/bus/iio/devices/iio:device0/in_voltage0_raw", "4096");

    let adc = AdcPin::new(&ctx, 0).unwrap();
    assert!((adc.read_volts().unwrap() - 3.3).abs() < 1e-9);
}

// ---------------------------------------------------------------------------
// PWM
// ---------------------------------------------------------------------------

#[test]
fn pwm_duty_percent_follows_period() {
    let (ctx, transport, _) = make_context();
    let pwm = PwmPin::new(&ctx, 3).unwrap();
    assert_eq!(pwm.path(), Path::new("/sys/class/pwm/pwmchip2/pwm1"));

    pwm.set_period_ns(20_000).unwrap();
    assert_eq!(pwm.set_duty_cycle_percent(25.0).unwrap(), 5_000);
    pwm.set_enabled(true).unwrap();

    assert_eq!(pwm.duty_cycle_ns().unwrap(), 5_000);
    assert_eq!(
        transport.contents("/sys/class/pwm/pwmchip2/pwm1/enable").as_deref(),
        Some("1")
    );
}

#[test]
fn pwm_duty_percent_out_of_range() {
    let (ctx, transport, _) = make_context();
    let pwm = PwmPin::new(&ctx, 0).unwrap();

    assert!(matches!(
        pwm.set_duty_cycle_percent(120.0),
        Err(PinError::InvalidArgument(_))
    ));
    assert!(transport.writes().is_empty());
}

#[test]
fn invalid_pwm_device_is_rejected_before_registration() {
    let (ctx, _, registry) = make_context();

    let err = PwmPin::new(&ctx, 4).unwrap_err();

    assert!(matches!(err, PinError::InvalidDevice { kind: PinKind::Pwm, device: 4 }));
    assert_eq!(registry.registration_count(), 0);
}

// ---------------------------------------------------------------------------
// Registry integration
// ---------------------------------------------------------------------------

#[test]
fn dropping_a_pin_unregisters_it() {
    let (ctx, _, registry) = make_context();

    let gpio = GpioPin::new(&ctx, 12, None).unwrap();
    assert_eq!(registry.handle_count(ResourceKey::gpio(12)), 1);

    drop(gpio);
    assert_eq!(registry.registration_count(), 0);
}

#[test]
fn two_handles_on_one_gpio_contend() {
    let (ctx, _, registry) = make_context();
    let a = GpioPin::new(&ctx, 12, None).unwrap();
    let b = GpioPin::new(&ctx, 12, None).unwrap();
    assert_eq!(registry.handle_count(ResourceKey::gpio(12)), 2);

    {
        let _guard = a.try_exclusive().unwrap().expect("pin should be free");
        assert!(b.try_exclusive().unwrap().is_none());
        assert_eq!(b.lock_status().unwrap(), LockStatus::HeldByOther(a.id()));
    }

    assert!(b.acquire_lock().unwrap().is_granted());
    drop(b);
    assert_eq!(a.lock_status().unwrap(), LockStatus::Unlocked);
}

#[test]
fn different_kinds_with_same_index_do_not_contend() {
    let (ctx, _, _) = make_context();
    let gpio = GpioPin::new(&ctx, 1, None).unwrap();
    let pwm = PwmPin::new(&ctx, 1).unwrap();

    assert!(gpio.acquire_lock().unwrap().is_granted());
    assert!(pwm.acquire_lock().unwrap().is_granted());
}

#[test]
fn registry_errors_surface_as_pin_errors() {
    let (ctx, _, registry) = make_context();
    let gpio = GpioPin::new(&ctx, 5, None).unwrap();

    // Pull the handle out from under the pin.
    registry.unregister(gpio.key(), gpio.id()).unwrap();

    assert!(matches!(
        gpio.acquire_lock(),
        Err(PinError::Registry(RegistryError::NotRegistered { .. }))
    ));
}
