//! Timer0 as a periodic tick source
//!
//! CTC mode with OCR0A as TOP; the compare-A interrupt fires once per tick.

use crate::hal::regs::{Reg, Registers};

const WGM01: u8 = 1 << 1;
const OCIE0A: u8 = 1 << 1;
const CS_MASK: u8 = 0x07;

/// Clock select values for Timer0
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Prescaler {
    Stop = 0,
    Direct = 1,
    Div8 = 2,
    Div64 = 3,
    Div256 = 4,
    Div1024 = 5,
}

impl Prescaler {
    pub const fn divisor(self) -> u32 {
        match self {
            Prescaler::Stop => 0,
            Prescaler::Direct => 1,
            Prescaler::Div8 => 8,
            Prescaler::Div64 => 64,
            Prescaler::Div256 => 256,
            Prescaler::Div1024 => 1024,
        }
    }
}

/// OCR0A for a CTC period of `1 / tick_hz`. A stopped clock or a zero
/// rate gives 0.
pub const fn compare_value(cpu_hz: u32, prescaler: Prescaler, tick_hz: u32) -> u8 {
    let divisor = prescaler.divisor() as u64 * tick_hz as u64;
    if divisor == 0 {
        return 0;
    }
    let counts = cpu_hz as u64 / divisor;
    if counts == 0 {
        0
    } else if counts > 256 {
        0xFF
    } else {
        (counts - 1) as u8
    }
}

pub struct TickTimer<R> {
    regs: R,
}

impl<R: Registers> TickTimer<R> {
    pub fn new(regs: R) -> Self {
        Self { regs }
    }

    /// Program a `tick_hz` compare-match interrupt and start counting.
    /// Interrupts still need to be enabled globally afterwards.
    pub fn start(&mut self, cpu_hz: u32, tick_hz: u32) {
        let prescaler = Prescaler::Div64;

        self.regs.write(Reg::Tccr0a, WGM01);
        self.regs.write(Reg::Tccr0b, 0);
        self.regs.write(Reg::Tcnt0, 0);
        self.regs.write(Reg::Ocr0a, compare_value(cpu_hz, prescaler, tick_hz));
        self.regs.modify(Reg::Timsk0, |r| r | OCIE0A);
        self.regs.modify(Reg::Tccr0b, |r| (r & !CS_MASK) | prescaler as u8);
    }

    pub fn stop(&mut self) {
        self.regs.modify(Reg::Tccr0b, |r| r & !CS_MASK);
        self.regs.modify(Reg::Timsk0, |r| r & !OCIE0A);
    }

    pub fn counter(&self) -> u8 {
        self.regs.read(Reg::Tcnt0)
    }
}
