//! PWM (Pulse Width Modulation) HAL implementation
//!
//! Timer0 runs in fast PWM mode 7: the counter wraps at OCR0A (TOP) and
//! OC0B (PD5) is cleared on compare match, set at BOTTOM. OCR0B is double
//! buffered by the hardware, so a new duty takes effect on the next period
//! without glitching the current one.

use crate::hal::regs::{Reg, Registers};
use crate::hal::timer::Prescaler;

const COM0B1: u8 = 1 << 5;
const WGM01: u8 = 1 << 1;
const WGM00: u8 = 1 << 0;
const WGM02: u8 = 1 << 3;
const DDD5: u8 = 1 << 5;

/// Fan speed steps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DutyLevel {
    Off,
    Low,
    Medium,
    High,
}

impl DutyLevel {
    /// Share of TOP driven high, in percent
    pub const fn percent(self) -> u8 {
        match self {
            DutyLevel::Off => 0,
            DutyLevel::Low => 25,
            DutyLevel::Medium => 50,
            DutyLevel::High => 80,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            DutyLevel::Off => "STOPPED",
            DutyLevel::Low => "LOW",
            DutyLevel::Medium => "MEDIUM",
            DutyLevel::High => "HIGH",
        }
    }

    /// Compare value for a given TOP. Never exceeds `top`.
    pub const fn compare(self, top: u8) -> u8 {
        (top as u16 * self.percent() as u16 / 100) as u8
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PwmConfig {
    pub cpu_hz: u32,
    pub frequency_hz: u32,
}

impl PwmConfig {
    /// Smallest prescaler whose TOP fits the 8-bit counter
    pub fn timing(&self) -> (Prescaler, u8) {
        const CHOICES: [Prescaler; 5] = [
            Prescaler::Direct,
            Prescaler::Div8,
            Prescaler::Div64,
            Prescaler::Div256,
            Prescaler::Div1024,
        ];

        let wanted = self.frequency_hz.max(1);
        for prescaler in CHOICES {
            let Some(divisor) = prescaler.divisor().checked_mul(wanted) else {
                // Faster than the timer can go
                return (Prescaler::Direct, 0);
            };
            let counts = self.cpu_hz / divisor;
            if counts == 0 {
                return (Prescaler::Direct, 0);
            }
            if counts <= 256 {
                return (prescaler, (counts - 1) as u8);
            }
        }

        // Slower than the timer can go: longest period available
        (Prescaler::Div1024, 0xFF)
    }
}

impl Default for PwmConfig {
    fn default() -> Self {
        Self {
            cpu_hz: crate::config::CPU_FREQ_HZ,
            frequency_hz: crate::config::FAN_PWM_HZ,
        }
    }
}

/// Single-channel fan PWM on OC0B
pub struct FanPwm<R> {
    regs: R,
    top: u8,
    prescaler: Prescaler,
    level: DutyLevel,
}

impl<R: Registers> FanPwm<R> {
    pub fn new(regs: R, config: PwmConfig) -> Self {
        let (prescaler, top) = config.timing();
        Self {
            regs,
            top,
            prescaler,
            level: DutyLevel::Off,
        }
    }

    /// Put PD5 in output mode and start the timer with the fan off
    pub fn configure(&mut self) {
        self.regs.modify(Reg::Ddrd, |r| r | DDD5);

        self.regs.write(Reg::Ocr0a, self.top);
        self.regs.write(Reg::Ocr0b, 0);
        self.level = DutyLevel::Off;

        // Non-inverting on OC0B, OC0A disconnected (it holds TOP)
        self.regs.write(Reg::Tccr0a, COM0B1 | WGM01 | WGM00);
        self.regs.write(Reg::Tccr0b, WGM02 | self.prescaler as u8);
    }

    pub fn set_duty(&mut self, level: DutyLevel) {
        self.regs.write(Reg::Ocr0b, level.compare(self.top));
        self.level = level;
    }

    pub fn level(&self) -> DutyLevel {
        self.level
    }

    pub fn top(&self) -> u8 {
        self.top
    }

    pub fn prescaler(&self) -> Prescaler {
        self.prescaler
    }

    /// Value currently in OCR0B
    pub fn compare(&self) -> u8 {
        self.regs.read(Reg::Ocr0b)
    }
}
