//! LSM6DSO 6-axis IMU driver
//!
//! Transactions are built from the [`Twi`] primitives:
//!
//! - register write: `START, SLA+W, reg, data, STOP`
//! - register read: `START, SLA+W, reg, rSTART, SLA+R, read+NACK, STOP`
//! - burst read: as above, every byte acked except the last
//!
//! The bus status is checked after each step. Whatever happens, a
//! transaction that issued a START also issues exactly one STOP.

use crate::hal::twi::{Twi, TwiError, TwiStatus};
use crate::hal::{BusyWait, Registers};

pub const LSM6DSO_ADDR: u8 = 0x6B;

/// Expected WHO_AM_I contents
pub const LSM6DSO_ID: u8 = 0x6C;

// Registers
pub const REG_WHO_AM_I: u8 = 0x0F;
pub const REG_CTRL1_XL: u8 = 0x10;
pub const REG_CTRL2_G: u8 = 0x11;
pub const REG_OUTX_L_G: u8 = 0x22;
pub const REG_OUTX_L_A: u8 = 0x28;

/// Accel 104 Hz, ±4 g
pub const CTRL1_XL_104HZ_4G: u8 = 0b0100_1000;
/// Gyro 104 Hz, ±500 dps
pub const CTRL2_G_104HZ_500DPS: u8 = 0b0100_0100;

/// mg per LSB at ±4 g
pub const ACCEL_SENSITIVITY_4G: f32 = 0.122;
/// mdps per LSB at ±500 dps
pub const GYRO_SENSITIVITY_500DPS: f32 = 17.5;

/// Acceleration in g from a ±4 g raw sample
#[inline]
pub fn accel_g(raw: i16) -> f32 {
    raw as f32 * ACCEL_SENSITIVITY_4G / 1000.0
}

/// Angular rate in °/s from a ±500 dps raw sample
#[inline]
pub fn gyro_dps(raw: i16) -> f32 {
    raw as f32 * GYRO_SENSITIVITY_500DPS / 1000.0
}

/// 3-axis sensor data in physical units
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// Raw two's-complement axis values
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RawAxes {
    pub x: i16,
    pub y: i16,
    pub z: i16,
}

impl RawAxes {
    /// X/Y/Z, each stored low byte first
    pub fn from_le_bytes(data: [u8; 6]) -> Self {
        Self {
            x: i16::from_le_bytes([data[0], data[1]]),
            y: i16::from_le_bytes([data[2], data[3]]),
            z: i16::from_le_bytes([data[4], data[5]]),
        }
    }

    pub fn map(self, f: fn(i16) -> f32) -> Vec3 {
        Vec3 {
            x: f(self.x),
            y: f(self.y),
            z: f(self.z),
        }
    }

    pub fn to_g(self) -> Vec3 {
        self.map(accel_g)
    }

    pub fn to_dps(self) -> Vec3 {
        self.map(gyro_dps)
    }
}

/// WHO_AM_I as read back, and whether it names an LSM6DSO
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub id: u8,
    pub matches: bool,
}

pub struct Lsm6dso<R, W> {
    twi: Twi<R, W>,
}

impl<R: Registers, W: BusyWait> Lsm6dso<R, W> {
    /// Takes an initialised bus
    pub fn new(twi: Twi<R, W>) -> Self {
        Self { twi }
    }

    pub fn who_am_i(&mut self) -> Result<u8, TwiError> {
        self.read_register(REG_WHO_AM_I)
    }

    /// Read WHO_AM_I and compare it against [`LSM6DSO_ID`]. A mismatch is
    /// not a bus error: `matches` is false and `id` holds what answered.
    pub fn verify_identity(&mut self) -> Result<Identity, TwiError> {
        let id = self.who_am_i()?;
        Ok(Identity {
            id,
            matches: id == LSM6DSO_ID,
        })
    }

    /// Write pre-encoded CTRL1_XL and CTRL2_G values
    pub fn configure(&mut self, accel_config: u8, gyro_config: u8) -> Result<(), TwiError> {
        self.write_register(REG_CTRL1_XL, accel_config)?;
        self.write_register(REG_CTRL2_G, gyro_config)
    }

    pub fn read_accel(&mut self) -> Result<RawAxes, TwiError> {
        self.read_axes(REG_OUTX_L_A)
    }

    pub fn read_gyro(&mut self) -> Result<RawAxes, TwiError> {
        self.read_axes(REG_OUTX_L_G)
    }

    pub fn write_register(&mut self, reg: u8, value: u8) -> Result<(), TwiError> {
        self.transaction(|twi| {
            Self::address(twi, false)?;
            Self::send(twi, reg)?;
            Self::send(twi, value)
        })
    }

    pub fn read_register(&mut self, reg: u8) -> Result<u8, TwiError> {
        let mut value = [0u8; 1];
        self.read_registers(reg, &mut value)?;
        Ok(value[0])
    }

    /// Burst read starting at `reg`; the device auto-increments its pointer
    pub fn read_registers(&mut self, reg: u8, buffer: &mut [u8]) -> Result<(), TwiError> {
        if buffer.is_empty() {
            return Ok(());
        }

        self.transaction(|twi| {
            Self::address(twi, false)?;
            Self::send(twi, reg)?;

            twi.start()?;
            twi.expect(TwiStatus::RepStartTransmitted)?;
            Self::address(twi, true)?;

            let last = buffer.len() - 1;
            for (i, slot) in buffer.iter_mut().enumerate() {
                *slot = if i < last {
                    twi.read_with_ack()?
                } else {
                    twi.read_with_nack()?
                };
            }
            Ok(())
        })
    }

    fn read_axes(&mut self, reg: u8) -> Result<RawAxes, TwiError> {
        let mut data = [0u8; 6];
        self.read_registers(reg, &mut data)?;
        Ok(RawAxes::from_le_bytes(data))
    }

    /// START, run `body`, STOP. The STOP is sent on every path past a
    /// START attempt, including a failed one.
    fn transaction<T>(
        &mut self,
        body: impl FnOnce(&mut Twi<R, W>) -> Result<T, TwiError>,
    ) -> Result<T, TwiError> {
        let run = || -> Result<T, TwiError> {
            self.twi.start()?;
            self.twi.expect(TwiStatus::StartTransmitted)?;
            body(&mut self.twi)
        };
        let result = run();
        self.twi.stop();
        result
    }

    fn address(twi: &mut Twi<R, W>, read: bool) -> Result<(), TwiError> {
        twi.write(LSM6DSO_ADDR << 1 | read as u8)?;
        twi.expect(if read {
            TwiStatus::AddrReadAck
        } else {
            TwiStatus::AddrWriteAck
        })
    }

    fn send(twi: &mut Twi<R, W>, byte: u8) -> Result<(), TwiError> {
        twi.write(byte)?;
        twi.expect(TwiStatus::DataWriteAck)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::wait::Bounded;
    use crate::sim::{BusEvent, SimDevice, SimTwi};

    const W: u8 = LSM6DSO_ADDR << 1;
    const R: u8 = LSM6DSO_ADDR << 1 | 1;

    fn sensor() -> SimTwi {
        let mut device = SimDevice::new(LSM6DSO_ADDR);
        device.set_register(REG_WHO_AM_I, LSM6DSO_ID);
        SimTwi::new(device)
    }

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn register_write_sequence() {
        let mut sim = sensor();
        let mut imu = Lsm6dso::new(Twi::new(&mut sim));
        imu.write_register(REG_CTRL1_XL, CTRL1_XL_104HZ_4G).unwrap();
        assert_eq!(
            sim.events(),
            &[
                BusEvent::Start,
                BusEvent::Write(W),
                BusEvent::Write(REG_CTRL1_XL),
                BusEvent::Write(CTRL1_XL_104HZ_4G),
                BusEvent::Stop,
            ]
        );
        assert_eq!(sim.device().register(REG_CTRL1_XL), CTRL1_XL_104HZ_4G);
    }

    #[test]
    fn register_read_sequence() {
        let mut sim = sensor();
        let mut imu = Lsm6dso::new(Twi::new(&mut sim));
        assert_eq!(imu.who_am_i(), Ok(LSM6DSO_ID));
        assert_eq!(
            sim.events(),
            &[
                BusEvent::Start,
                BusEvent::Write(W),
                BusEvent::Write(REG_WHO_AM_I),
                BusEvent::Start,
                BusEvent::Write(R),
                BusEvent::ReadNack(LSM6DSO_ID),
                BusEvent::Stop,
            ]
        );
    }

    #[test]
    fn burst_read_nacks_only_last_byte() {
        let mut sim = sensor();
        sim.device_mut().set_i16(REG_OUTX_L_A, 1000);
        sim.device_mut().set_i16(REG_OUTX_L_A + 2, -500);
        sim.device_mut().set_i16(REG_OUTX_L_A + 4, 2000);

        let mut imu = Lsm6dso::new(Twi::new(&mut sim));
        let raw = imu.read_accel().unwrap();
        assert_eq!(raw, RawAxes { x: 1000, y: -500, z: 2000 });

        let events = sim.events();
        let reads: Vec<_> = events
            .iter()
            .filter(|e| matches!(e, BusEvent::ReadAck(_) | BusEvent::ReadNack(_)))
            .collect();
        assert_eq!(reads.len(), 6);
        assert!(reads[..5].iter().all(|e| matches!(e, BusEvent::ReadAck(_))));
        assert!(matches!(reads[5], BusEvent::ReadNack(_)));
        assert_eq!(events[events.len() - 2], BusEvent::ReadNack(0x07));
        assert_eq!(events.last(), Some(&BusEvent::Stop));
    }

    #[test]
    fn configure_writes_both_control_registers() {
        let mut sim = sensor();
        let mut imu = Lsm6dso::new(Twi::new(&mut sim));
        imu.configure(CTRL1_XL_104HZ_4G, CTRL2_G_104HZ_500DPS).unwrap();
        assert_eq!(sim.device().register(REG_CTRL1_XL), 0x48);
        assert_eq!(sim.device().register(REG_CTRL2_G), 0x44);
        let stops = sim.events().iter().filter(|e| **e == BusEvent::Stop).count();
        assert_eq!(stops, 2);
    }

    #[test]
    fn identity_matches_expected_part() {
        let mut sim = sensor();
        let mut imu = Lsm6dso::new(Twi::new(&mut sim));
        let identity = imu.verify_identity().unwrap();
        assert!(identity.matches);
        assert_eq!(identity.id, LSM6DSO_ID);
    }

    #[test]
    fn identity_mismatch_is_false_not_error() {
        let mut sim = sensor();
        sim.device_mut().set_register(REG_WHO_AM_I, 0x68);
        let mut imu = Lsm6dso::new(Twi::new(&mut sim));
        assert_eq!(
            imu.verify_identity(),
            Ok(Identity {
                id: 0x68,
                matches: false,
            })
        );
    }

    #[test]
    fn absent_device_nacks_and_still_stops() {
        let mut sim = SimTwi::new(SimDevice::new(0x6A));
        let mut imu = Lsm6dso::new(Twi::new(&mut sim));
        assert_eq!(
            imu.verify_identity(),
            Err(TwiError::Status {
                expected: TwiStatus::AddrWriteAck,
                actual: TwiStatus::AddrWriteNack as u8,
            })
        );
        assert_eq!(
            sim.events(),
            &[BusEvent::Start, BusEvent::Write(W), BusEvent::Stop]
        );
        assert!(!sim.in_transfer());
    }

    #[test]
    fn stalled_bus_is_reported() {
        let mut sim = sensor();
        sim.stall(true);
        let mut imu = Lsm6dso::new(Twi::with_wait(&mut sim, Bounded::new(16)));
        assert_eq!(imu.read_accel(), Err(TwiError::Stalled));
        assert_eq!(sim.events().last(), Some(&BusEvent::Stop));
    }

    #[test]
    fn gyro_burst_uses_gyro_block() {
        let mut sim = sensor();
        sim.device_mut().set_i16(REG_OUTX_L_G, -1000);
        let mut imu = Lsm6dso::new(Twi::new(&mut sim));
        let raw = imu.read_gyro().unwrap();
        assert_eq!(raw.x, -1000);
        assert!(close(raw.to_dps().x, -17.5));
        assert_eq!(sim.events()[2], BusEvent::Write(REG_OUTX_L_G));
    }

    #[test]
    fn conversion_is_linear_and_odd() {
        assert_eq!(accel_g(0), 0.0);
        for raw in [1, 100, 1000, 8192, i16::MAX] {
            assert_eq!(accel_g(-raw), -accel_g(raw));
            assert!(close(accel_g(raw), raw as f32 * 0.122 / 1000.0));
        }
        let g = RawAxes { x: 1000, y: -500, z: 2000 }.to_g();
        assert!(close(g.x, 0.122));
        assert!(close(g.y, -0.061));
        assert!(close(g.z, 0.244));
    }
}
