//! Main-loop bodies of the two firmware images
//!
//! Each `poll()` is one pass of the loop; the binaries call it forever.

use crate::drivers::lsm6dso::{self, Lsm6dso, RawAxes, Vec3};
use crate::drivers::{Console, Milli};
use crate::hal::pwm::{DutyLevel, FanPwm};
use crate::hal::twi::TwiError;
use crate::hal::{BusyWait, Registers};
use crate::os::TickSource;
use embedded_hal::serial;
use ufmt::uwrite;

/// Single-character fan commands
pub fn parse_command(byte: u8) -> Option<DutyLevel> {
    match byte {
        b'w' => Some(DutyLevel::Low),
        b's' => Some(DutyLevel::Medium),
        b'W' => Some(DutyLevel::High),
        b'x' | b'X' => Some(DutyLevel::Off),
        _ => None,
    }
}

/// Outcome of one received command byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    Duty(DutyLevel),
    Unrecognized(u8),
}

/// Serial-commanded fan speed
pub struct FanControl<S, R> {
    console: Console<S>,
    pwm: FanPwm<R>,
}

impl<S, R, E> FanControl<S, R>
where
    S: serial::Read<u8, Error = E> + serial::Write<u8, Error = E>,
    R: Registers,
{
    /// Takes a configured PWM
    pub fn new(console: Console<S>, pwm: FanPwm<R>) -> Self {
        Self { console, pwm }
    }

    pub fn banner(&mut self) -> Result<(), E> {
        self.console.write_line("Fan Control Ready")?;
        self.console
            .write_line("Commands: w=low, s=medium, W=high, x=stop")
    }

    /// Handle at most one waiting byte; never blocks on an empty line
    pub fn poll(&mut self) -> Result<Option<Dispatch>, E> {
        match self.console.read_byte()? {
            Some(byte) => self.dispatch(byte).map(Some),
            None => Ok(None),
        }
    }

    pub fn dispatch(&mut self, byte: u8) -> Result<Dispatch, E> {
        match parse_command(byte) {
            Some(level) => {
                self.pwm.set_duty(level);
                self.acknowledge(level)?;
                Ok(Dispatch::Duty(level))
            }
            None => {
                self.console.write_str("Unknown: ")?;
                self.console.write_byte(byte)?;
                self.console.write_str("\n")?;
                Ok(Dispatch::Unrecognized(byte))
            }
        }
    }

    pub fn pwm(&self) -> &FanPwm<R> {
        &self.pwm
    }

    fn acknowledge(&mut self, level: DutyLevel) -> Result<(), E> {
        match level {
            DutyLevel::Off => uwrite!(&mut self.console, "Fan: {}\n", level.label()),
            _ => uwrite!(
                &mut self.console,
                "Fan: {} ({}%)\n",
                level.label(),
                level.percent()
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportError<E> {
    Bus(TwiError),
    Serial(E),
    /// WHO_AM_I did not match; carries what was read
    UnknownDevice(u8),
}

impl<E> From<TwiError> for ReportError<E> {
    fn from(e: TwiError) -> Self {
        ReportError::Bus(e)
    }
}

/// One sampling pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub raw: RawAxes,
    pub accel: Vec3,
}

/// Timer-paced accelerometer reporting
pub struct ImuReporter<S, R, W> {
    console: Console<S>,
    imu: Lsm6dso<R, W>,
}

impl<S, R, W> ImuReporter<S, R, W>
where
    S: serial::Write<u8>,
    R: Registers,
    W: BusyWait,
{
    pub fn new(console: Console<S>, imu: Lsm6dso<R, W>) -> Self {
        Self { console, imu }
    }

    /// Check the part and configure it. An error here is fatal to the
    /// caller: there is nothing to retry against a wrong or missing sensor.
    pub fn start(&mut self) -> Result<(), ReportError<S::Error>> {
        let identity = self.imu.verify_identity()?;

        self.report(|console| {
            console.write_str("WHO_AM_I value: 0x")?;
            console.write_hex(identity.id)?;
            console.write_str("\n")?;
            if identity.matches {
                console.write_line("LSM6DSO communication successful!")
            } else {
                console.write_line("Error: LSM6DSO not found or communication failed.")
            }
        })?;
        if !identity.matches {
            return Err(ReportError::UnknownDevice(identity.id));
        }

        self.imu
            .configure(lsm6dso::CTRL1_XL_104HZ_4G, lsm6dso::CTRL2_G_104HZ_500DPS)?;

        self.report(|console| {
            console.write_line("LSM6DSO configured.")?;
            console.write_line("Reading IMU data (X, Y, Z in g):")
        })
    }

    /// Sample and print if the tick source says it is time
    pub fn poll(
        &mut self,
        ticks: &TickSource,
    ) -> Result<Option<Reading>, ReportError<S::Error>> {
        if !ticks.take_sample_ready() {
            return Ok(None);
        }

        let raw = self.imu.read_accel()?;
        let accel = raw.to_g();
        self.report(|console| {
            uwrite!(
                console,
                "X: {}  Y: {}  Z: {}\n",
                Milli::from_f32(accel.x),
                Milli::from_f32(accel.y),
                Milli::from_f32(accel.z)
            )
        })?;

        Ok(Some(Reading { raw, accel }))
    }

    pub fn console(&mut self) -> &mut Console<S> {
        &mut self.console
    }

    fn report(
        &mut self,
        write: impl FnOnce(&mut Console<S>) -> Result<(), S::Error>,
    ) -> Result<(), ReportError<S::Error>> {
        write(&mut self.console).map_err(ReportError::Serial)
    }
}
