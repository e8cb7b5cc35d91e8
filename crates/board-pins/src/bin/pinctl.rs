use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use board_pins::{
    AdcPin, GpioDirection, GpioPin, GpioValue, Pin, PinContext, PwmPin,
    SysfsLayout, SysfsTransport,
};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Drive the board's GPIO, ADC and PWM pins")]
struct Cli {
    /// JSON file overriding the sysfs layout
    #[arg(long, global = true)]
    layout: Option<PathBuf>,

    /// Read every control file back after writing it and log mismatches
    #[arg(long, global = true)]
    confirm_writes: bool,

    /// Raise log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read or drive a GPIO line
    Gpio {
        device: u32,
        #[command(subcommand)]
        action: GpioAction,
    },
    /// Read an ADC channel
    Adc { device: u32 },
    /// Configure a PWM output
    Pwm {
        device: u32,
        #[arg(long)]
        period_ns: Option<u32>,
        #[arg(long, conflicts_with = "duty_percent")]
        duty_ns: Option<u32>,
        #[arg(long)]
        duty_percent: Option<f64>,
        #[arg(long, conflicts_with = "disable")]
        enable: bool,
        #[arg(long)]
        disable: bool,
    },
}

#[derive(Subcommand)]
enum GpioAction {
    /// Print the current level
    Get,
    /// Drive the line as an output
    Set { level: Level },
    /// Print or change the direction
    Direction { direction: Option<Direction> },
}

#[derive(Clone, Copy, ValueEnum)]
enum Level {
    High,
    Low,
}

impl From<Level> for GpioValue {
    fn from(level: Level) -> Self {
        match level {
            Level::High => GpioValue::High,
            Level::Low => GpioValue::Low,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Direction {
    In,
    Out,
}

impl From<Direction> for GpioDirection {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::In => GpioDirection::In,
            Direction::Out => GpioDirection::Out,
        }
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

/// Run `f` while holding the pin's drive lock.
fn exclusive<T>(pin: &Pin, f: impl FnOnce() -> Result<T>) -> Result<T> {
    let Some(_guard) = pin.try_exclusive()? else {
        bail!("{} is held by another handle", pin.key());
    };
    f()
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let layout = match &cli.layout {
        Some(path) => SysfsLayout::load(path)
            .with_context(|| format!("loading layout {}", path.display()))?,
        None => SysfsLayout::default(),
    };
    let mut ctx = PinContext::new(layout);
    if cli.confirm_writes {
        ctx = ctx.with_transport(Arc::new(SysfsTransport::confirming()));
    }

    match cli.command {
        Commands::Gpio { device, action } => {
            let gpio = GpioPin::new(&ctx, device, None)?;
            exclusive(&gpio, || {
                match action {
                    GpioAction::Get => {
                        let value = gpio.value()?;
                        println!("gpio{device}: {}", if bool::from(value) { "high" } else { "low" });
                    }
                    GpioAction::Set { level } => {
                        gpio.configure(GpioDirection::Out)?;
                        gpio.set_value(level.into())?;
                        info!("gpio{device} driven {}", GpioValue::from(level));
                    }
                    GpioAction::Direction { direction: Some(direction) } => {
                        gpio.set_direction(direction.into())?;
                        info!("gpio{device} set to {}", GpioDirection::from(direction));
                    }
                    GpioAction::Direction { direction: None } => {
                        println!("gpio{device}: {}", gpio.direction()?);
                    }
                }
                Ok(())
            })?;
        }
        Commands::Adc { device } => {
            let adc = AdcPin::new(&ctx, device)?;
            exclusive(&adc, || {
                let raw = adc.read_raw()?;
                println!(
                    "adc{device}: {raw} ({:.4} V)",
                    ctx.layout().adc_scale.volts(raw)
                );
                Ok(())
            })?;
        }
        Commands::Pwm { device, period_ns, duty_ns, duty_percent, enable, disable } => {
            let pwm = PwmPin::new(&ctx, device)?;
            exclusive(&pwm, || {
                if let Some(period) = period_ns {
                    pwm.set_period_ns(period)?;
                }
                if let Some(duty) = duty_ns {
                    pwm.set_duty_cycle_ns(duty)?;
                }
                if let Some(percent) = duty_percent {
                    let duty = pwm.set_duty_cycle_percent(percent)?;
                    info!("pwm{device} duty set to {duty} ns");
                }
                if enable || disable {
                    pwm.set_enabled(enable)?;
                }
                println!(
                    "pwm{device}: period {} ns, duty {} ns",
                    pwm.period_ns()?,
                    pwm.duty_cycle_ns()?
                );
                Ok(())
            })?;
        }
    }

    Ok(())
}
