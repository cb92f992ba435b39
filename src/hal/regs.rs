//! Register-level access to the ATmega328PB peripherals
//!
//! Every HAL driver talks to its peripheral through [`Registers`], so the
//! bus and timer sequencing can run against `Mmio` (the `avr-device`
//! register blocks) on the chip or against the fakes in [`crate::sim`] on a
//! host.

/// Registers used by the firmware
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reg {
    Ddrd,
    Portd,
    Tccr0a,
    Tccr0b,
    Tcnt0,
    Ocr0a,
    Ocr0b,
    Timsk0,
    Twbr0,
    Twsr0,
    Twdr0,
    Twcr0,
    Ucsr0a,
    Ucsr0b,
    Ucsr0c,
    Ubrr0l,
    Ubrr0h,
    Udr0,
}

/// 8-bit register read/write/modify
pub trait Registers {
    fn read(&self, reg: Reg) -> u8;

    fn write(&mut self, reg: Reg, value: u8);

    /// Read-modify-write. Not atomic with respect to interrupts.
    #[inline]
    fn modify<F: FnOnce(u8) -> u8>(&mut self, reg: Reg, f: F) {
        let value = self.read(reg);
        self.write(reg, f(value));
    }
}

impl<T: Registers + ?Sized> Registers for &mut T {
    #[inline]
    fn read(&self, reg: Reg) -> u8 {
        (**self).read(reg)
    }

    #[inline]
    fn write(&mut self, reg: Reg, value: u8) {
        (**self).write(reg, value)
    }
}

#[cfg(target_arch = "avr")]
pub use self::mmio::Mmio;

#[cfg(target_arch = "avr")]
mod mmio {
    use super::{Reg, Registers};
    use avr_device::atmega328pb::{PORTD, TC0, TWI0, USART0};

    /// The real register file, through the `avr-device` peripheral blocks
    pub struct Mmio {
        _private: (),
    }

    impl Mmio {
        /// # Safety
        ///
        /// The caller must make sure no two drivers drive the same
        /// peripheral through separate handles.
        pub const unsafe fn steal() -> Self {
            Self { _private: () }
        }
    }

    impl Registers for Mmio {
        fn read(&self, reg: Reg) -> u8 {
            unsafe {
                let portd = &*PORTD::ptr();
                let tc0 = &*TC0::ptr();
                let twi = &*TWI0::ptr();
                let usart = &*USART0::ptr();

                match reg {
                    Reg::Ddrd => portd.ddrd.read().bits(),
                    Reg::Portd => portd.portd.read().bits(),
                    Reg::Tccr0a => tc0.tccr0a.read().bits(),
                    Reg::Tccr0b => tc0.tccr0b.read().bits(),
                    Reg::Tcnt0 => tc0.tcnt0.read().bits(),
                    Reg::Ocr0a => tc0.ocr0a.read().bits(),
                    Reg::Ocr0b => tc0.ocr0b.read().bits(),
                    Reg::Timsk0 => tc0.timsk0.read().bits(),
                    Reg::Twbr0 => twi.twbr.read().bits(),
                    Reg::Twsr0 => twi.twsr.read().bits(),
                    Reg::Twdr0 => twi.twdr.read().bits(),
                    Reg::Twcr0 => twi.twcr.read().bits(),
                    Reg::Ucsr0a => usart.ucsr0a.read().bits(),
                    Reg::Ucsr0b => usart.ucsr0b.read().bits(),
                    Reg::Ucsr0c => usart.ucsr0c.read().bits(),
                    Reg::Ubrr0l => usart.ubrr0.read().bits() as u8,
                    Reg::Ubrr0h => (usart.ubrr0.read().bits() >> 8) as u8,
                    Reg::Udr0 => usart.udr0.read().bits(),
                }
            }
        }

        fn write(&mut self, reg: Reg, value: u8) {
            unsafe {
                let portd = &*PORTD::ptr();
                let tc0 = &*TC0::ptr();
                let twi = &*TWI0::ptr();
                let usart = &*USART0::ptr();

                match reg {
                    Reg::Ddrd => portd.ddrd.write(|w| w.bits(value)),
                    Reg::Portd => portd.portd.write(|w| w.bits(value)),
                    Reg::Tccr0a => tc0.tccr0a.write(|w| w.bits(value)),
                    Reg::Tccr0b => tc0.tccr0b.write(|w| w.bits(value)),
                    Reg::Tcnt0 => tc0.tcnt0.write(|w| w.bits(value)),
                    Reg::Ocr0a => tc0.ocr0a.write(|w| w.bits(value)),
                    Reg::Ocr0b => tc0.ocr0b.write(|w| w.bits(value)),
                    Reg::Timsk0 => tc0.timsk0.write(|w| w.bits(value)),
                    Reg::Twbr0 => twi.twbr.write(|w| w.bits(value)),
                    Reg::Twsr0 => twi.twsr.write(|w| w.bits(value)),
                    Reg::Twdr0 => twi.twdr.write(|w| w.bits(value)),
                    Reg::Twcr0 => twi.twcr.write(|w| w.bits(value)),
                    Reg::Ucsr0a => usart.ucsr0a.write(|w| w.bits(value)),
                    Reg::Ucsr0b => usart.ucsr0b.write(|w| w.bits(value)),
                    Reg::Ucsr0c => usart.ucsr0c.write(|w| w.bits(value)),
                    // UBRR0 is one 16-bit register in the device description
                    Reg::Ubrr0l => usart
                        .ubrr0
                        .modify(|r, w| w.bits((r.bits() & 0xFF00) | value as u16)),
                    Reg::Ubrr0h => usart
                        .ubrr0
                        .modify(|r, w| w.bits((r.bits() & 0x00FF) | (value as u16) << 8)),
                    Reg::Udr0 => usart.udr0.write(|w| w.bits(value)),
                }
            }
        }
    }
}
