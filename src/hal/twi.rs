//! TWI (I2C) master sequencer
//!
//! Each primitive programs TWCR0 and, except for STOP, busy-waits on TWINT.
//! Callers compose them into transactions; see [`crate::drivers::lsm6dso`].

use crate::hal::regs::{Reg, Registers};
use crate::hal::wait::{BusyWait, Spin, Stalled};

const TWINT: u8 = 1 << 7;
const TWEA: u8 = 1 << 6;
const TWSTA: u8 = 1 << 5;
const TWSTO: u8 = 1 << 4;
const TWEN: u8 = 1 << 2;

/// Status bits of TWSR0, prescaler bits masked off
const STATUS_MASK: u8 = 0xF8;

/// TWI speed modes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TwiSpeed {
    Standard100k,
    Fast400k,
}

impl TwiSpeed {
    pub const fn hz(self) -> u32 {
        match self {
            TwiSpeed::Standard100k => 100_000,
            TwiSpeed::Fast400k => 400_000,
        }
    }
}

/// Master-mode status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TwiStatus {
    StartTransmitted = 0x08,
    RepStartTransmitted = 0x10,
    AddrWriteAck = 0x18,
    AddrWriteNack = 0x20,
    DataWriteAck = 0x28,
    DataWriteNack = 0x30,
    ArbitrationLost = 0x38,
    AddrReadAck = 0x40,
    AddrReadNack = 0x48,
    DataReadAck = 0x50,
    DataReadNack = 0x58,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TwiError {
    /// TWINT never came back
    Stalled,
    /// The bus reported something other than the expected status
    Status { expected: TwiStatus, actual: u8 },
}

impl From<Stalled> for TwiError {
    fn from(_: Stalled) -> Self {
        TwiError::Stalled
    }
}

/// TWBR value for a prescaler of 1: `((cpu / scl) - 16) / 2`
pub const fn bit_rate(cpu_hz: u32, scl_hz: u32) -> u8 {
    let ratio = cpu_hz / scl_hz;
    if ratio <= 16 {
        return 0;
    }
    let twbr = (ratio - 16) / 2;
    if twbr > 0xFF {
        0xFF
    } else {
        twbr as u8
    }
}

/// TWI peripheral driver
pub struct Twi<R, W = Spin> {
    regs: R,
    wait: W,
}

impl<R: Registers> Twi<R, Spin> {
    pub fn new(regs: R) -> Self {
        Self::with_wait(regs, Spin)
    }
}

impl<R: Registers, W: BusyWait> Twi<R, W> {
    pub fn with_wait(regs: R, wait: W) -> Self {
        Self { regs, wait }
    }

    /// Program the bit rate for `scl_hz` and enable the interface
    pub fn init(&mut self, cpu_hz: u32, scl_hz: u32) {
        self.regs.write(Reg::Twsr0, 0);
        self.regs.write(Reg::Twbr0, bit_rate(cpu_hz, scl_hz));
        self.regs.write(Reg::Twcr0, TWEN);
    }

    pub fn set_speed(&mut self, cpu_hz: u32, speed: TwiSpeed) {
        self.regs.write(Reg::Twbr0, bit_rate(cpu_hz, speed.hz()));
    }

    /// Current TWBR0 value
    pub fn bit_rate(&self) -> u8 {
        self.regs.read(Reg::Twbr0)
    }

    /// Send START (or repeated START inside a transfer)
    pub fn start(&mut self) -> Result<(), TwiError> {
        self.regs.write(Reg::Twcr0, TWINT | TWSTA | TWEN);
        self.wait_complete()
    }

    /// Send STOP. The hardware times the condition itself, nothing to wait for.
    pub fn stop(&mut self) {
        self.regs.write(Reg::Twcr0, TWINT | TWSTO | TWEN);
    }

    /// Shift out one byte. Ack/nack is left in the status register.
    pub fn write(&mut self, byte: u8) -> Result<(), TwiError> {
        self.regs.write(Reg::Twdr0, byte);
        self.regs.write(Reg::Twcr0, TWINT | TWEN);
        self.wait_complete()
    }

    /// Receive a byte and acknowledge it, asking for more
    pub fn read_with_ack(&mut self) -> Result<u8, TwiError> {
        self.read(true)
    }

    /// Receive the last byte of a transfer
    pub fn read_with_nack(&mut self) -> Result<u8, TwiError> {
        self.read(false)
    }

    /// Masked status of the last operation
    pub fn get_status(&self) -> u8 {
        self.regs.read(Reg::Twsr0) & STATUS_MASK
    }

    pub fn expect(&self, expected: TwiStatus) -> Result<(), TwiError> {
        let actual = self.get_status();
        if actual == expected as u8 {
            Ok(())
        } else {
            Err(TwiError::Status { expected, actual })
        }
    }

    fn read(&mut self, ack: bool) -> Result<u8, TwiError> {
        let control = if ack { TWINT | TWEN | TWEA } else { TWINT | TWEN };
        self.regs.write(Reg::Twcr0, control);
        self.wait_complete()?;
        Ok(self.regs.read(Reg::Twdr0))
    }

    fn wait_complete(&mut self) -> Result<(), TwiError> {
        let regs = &self.regs;
        self.wait.until(|| regs.read(Reg::Twcr0) & TWINT != 0)?;
        Ok(())
    }
}
