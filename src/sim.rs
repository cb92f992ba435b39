//! Host-side register simulation
//!
//! [`RegisterFile`] is plain storage for peripherals whose behaviour is
//! fully described by what was written (timer, PWM, USART setup).
//! [`SimTwi`] models the TWI master state machine together with one
//! register-mapped slave, and records every bus condition it sees.

use crate::hal::regs::{Reg, Registers};
use heapless::Vec;

const TWINT: u8 = 1 << 7;
const TWEA: u8 = 1 << 6;
const TWSTA: u8 = 1 << 5;
const TWSTO: u8 = 1 << 4;

const EVENT_CAPACITY: usize = 128;

const REGISTER_COUNT: usize = Reg::Udr0 as usize + 1;

/// Plain register storage, one cell per [`Reg`]
#[derive(Clone)]
pub struct RegisterFile {
    cells: [u8; REGISTER_COUNT],
}

impl RegisterFile {
    pub const fn new() -> Self {
        Self {
            cells: [0; REGISTER_COUNT],
        }
    }

    pub fn get(&self, reg: Reg) -> u8 {
        self.cells[reg as usize]
    }

    pub fn set(&mut self, reg: Reg, value: u8) {
        self.cells[reg as usize] = value;
    }
}

impl Default for RegisterFile {
    fn default() -> Self {
        Self::new()
    }
}

impl Registers for RegisterFile {
    fn read(&self, reg: Reg) -> u8 {
        self.get(reg)
    }

    fn write(&mut self, reg: Reg, value: u8) {
        self.set(reg, value)
    }
}

/// What a logic analyser would see on SDA/SCL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusEvent {
    Start,
    Write(u8),
    ReadAck(u8),
    ReadNack(u8),
    Stop,
}

/// Register-mapped slave with an auto-incrementing register pointer
pub struct SimDevice {
    address: u8,
    registers: [u8; 128],
    pointer: u8,
}

impl SimDevice {
    pub const fn new(address: u8) -> Self {
        Self {
            address,
            registers: [0; 128],
            pointer: 0,
        }
    }

    pub fn set_register(&mut self, reg: u8, value: u8) {
        self.registers[(reg & 0x7F) as usize] = value;
    }

    pub fn register(&self, reg: u8) -> u8 {
        self.registers[(reg & 0x7F) as usize]
    }

    /// Load a little-endian 16-bit value at `reg`, `reg + 1`
    pub fn set_i16(&mut self, reg: u8, value: i16) {
        let [low, high] = value.to_le_bytes();
        self.set_register(reg, low);
        self.set_register(reg.wrapping_add(1), high);
    }

    fn next(&mut self) -> u8 {
        let value = self.register(self.pointer);
        self.pointer = (self.pointer + 1) & 0x7F;
        value
    }

    fn store(&mut self, value: u8) {
        self.set_register(self.pointer, value);
        self.pointer = (self.pointer + 1) & 0x7F;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Address,
    Pointer,
    Transmit,
    Receive,
    NotAddressed,
}

/// Simulated TWI peripheral wired to a single [`SimDevice`]
pub struct SimTwi {
    others: RegisterFile,
    twbr: u8,
    twsr: u8,
    twcr: u8,
    twdr: u8,
    phase: Phase,
    in_transfer: bool,
    stalled: bool,
    device: SimDevice,
    events: Vec<BusEvent, EVENT_CAPACITY>,
}

impl SimTwi {
    pub fn new(device: SimDevice) -> Self {
        Self {
            others: RegisterFile::new(),
            twbr: 0,
            twsr: 0xF8,
            twcr: 0,
            twdr: 0xFF,
            phase: Phase::Idle,
            in_transfer: false,
            stalled: false,
            device,
            events: Vec::new(),
        }
    }

    /// Keep TWINT low forever after the next operation
    pub fn stall(&mut self, stalled: bool) {
        self.stalled = stalled;
    }

    pub fn events(&self) -> &[BusEvent] {
        &self.events
    }

    pub fn control(&self) -> u8 {
        self.twcr
    }

    pub fn device(&self) -> &SimDevice {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut SimDevice {
        &mut self.device
    }

    /// True while a START has not been matched by a STOP
    pub fn in_transfer(&self) -> bool {
        self.in_transfer
    }

    fn record(&mut self, event: BusEvent) {
        // A full log just stops recording
        let _ = self.events.push(event);
    }

    fn control_write(&mut self, value: u8) {
        if value & TWINT == 0 {
            self.twcr = (self.twcr & TWINT) | value;
            return;
        }

        if value & TWSTO != 0 {
            self.record(BusEvent::Stop);
            self.in_transfer = false;
            self.phase = Phase::Idle;
            self.twsr = 0xF8 | (self.twsr & 0x03);
            self.twcr = value & !(TWINT | TWSTO);
            return;
        }

        let status = if value & TWSTA != 0 {
            self.record(BusEvent::Start);
            let status = if self.in_transfer { 0x10 } else { 0x08 };
            self.in_transfer = true;
            self.phase = Phase::Address;
            status
        } else {
            self.transfer(value & TWEA != 0)
        };

        self.twsr = status | (self.twsr & 0x03);
        self.twcr = if self.stalled {
            value & !TWINT
        } else {
            value | TWINT
        };
    }

    fn transfer(&mut self, ack: bool) -> u8 {
        match self.phase {
            Phase::Address => {
                let byte = self.twdr;
                self.record(BusEvent::Write(byte));
                let read = byte & 1 != 0;
                match (byte >> 1 == self.device.address, read) {
                    (true, false) => {
                        self.phase = Phase::Pointer;
                        0x18
                    }
                    (true, true) => {
                        self.phase = Phase::Receive;
                        0x40
                    }
                    (false, false) => {
                        self.phase = Phase::NotAddressed;
                        0x20
                    }
                    (false, true) => {
                        self.phase = Phase::NotAddressed;
                        0x48
                    }
                }
            }
            Phase::Pointer => {
                let byte = self.twdr;
                self.record(BusEvent::Write(byte));
                self.device.pointer = byte & 0x7F;
                self.phase = Phase::Transmit;
                0x28
            }
            Phase::Transmit => {
                let byte = self.twdr;
                self.record(BusEvent::Write(byte));
                self.device.store(byte);
                0x28
            }
            Phase::Receive => {
                let byte = self.device.next();
                self.twdr = byte;
                if ack {
                    self.record(BusEvent::ReadAck(byte));
                    0x50
                } else {
                    self.record(BusEvent::ReadNack(byte));
                    0x58
                }
            }
            Phase::NotAddressed | Phase::Idle => {
                let byte = self.twdr;
                self.record(BusEvent::Write(byte));
                // Nobody drives SDA: data reads back as 0xFF, writes are nacked
                self.twdr = 0xFF;
                0x30
            }
        }
    }
}

impl Registers for SimTwi {
    fn read(&self, reg: Reg) -> u8 {
        match reg {
            Reg::Twbr0 => self.twbr,
            Reg::Twsr0 => self.twsr,
            Reg::Twcr0 => self.twcr,
            Reg::Twdr0 => self.twdr,
            other => self.others.get(other),
        }
    }

    fn write(&mut self, reg: Reg, value: u8) {
        match reg {
            Reg::Twbr0 => self.twbr = value,
            Reg::Twsr0 => self.twsr = (self.twsr & STATUS_BITS) | (value & 0x03),
            Reg::Twcr0 => self.control_write(value),
            Reg::Twdr0 => self.twdr = value,
            other => self.others.set(other, value),
        }
    }
}

const STATUS_BITS: u8 = 0xF8;
