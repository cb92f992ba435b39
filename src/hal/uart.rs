//! Polled USART0
//!
//! No interrupts and no ring buffer: `read` reports `WouldBlock` until RXC0
//! is set, which doubles as the "byte available" check for the main loop.

use crate::hal::regs::{Reg, Registers};
use embedded_hal::serial;

// UCSR0A
const RXC0: u8 = 1 << 7;
const TXC0: u8 = 1 << 6;
const UDRE0: u8 = 1 << 5;
const FE0: u8 = 1 << 4;
const DOR0: u8 = 1 << 3;
const UPE0: u8 = 1 << 2;
// UCSR0B
const RXEN0: u8 = 1 << 4;
const TXEN0: u8 = 1 << 3;
// UCSR0C
const UCSZ01: u8 = 1 << 2;
const UCSZ00: u8 = 1 << 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UartError {
    Framing,
    Overrun,
    Parity,
}

/// UBRR0 for normal-speed asynchronous mode
pub const fn baud_divisor(cpu_hz: u32, baud: u32) -> u16 {
    (cpu_hz / 16 / baud - 1) as u16
}

pub struct Usart0<R> {
    regs: R,
}

impl<R: Registers> Usart0<R> {
    /// 8N1 at `baud`, receiver and transmitter on
    pub fn new(mut regs: R, cpu_hz: u32, baud: u32) -> Self {
        let ubrr = baud_divisor(cpu_hz, baud);
        regs.write(Reg::Ubrr0h, (ubrr >> 8) as u8);
        regs.write(Reg::Ubrr0l, ubrr as u8);
        regs.write(Reg::Ucsr0b, RXEN0 | TXEN0);
        regs.write(Reg::Ucsr0c, UCSZ01 | UCSZ00);
        Self { regs }
    }

    pub fn byte_available(&self) -> bool {
        self.regs.read(Reg::Ucsr0a) & RXC0 != 0
    }
}

impl<R: Registers> serial::Read<u8> for Usart0<R> {
    type Error = UartError;

    fn read(&mut self) -> nb::Result<u8, UartError> {
        let status = self.regs.read(Reg::Ucsr0a);
        if status & RXC0 == 0 {
            return Err(nb::Error::WouldBlock);
        }

        // Error flags belong to the byte in UDR0; reading UDR0 clears them
        let byte = self.regs.read(Reg::Udr0);
        if status & FE0 != 0 {
            Err(nb::Error::Other(UartError::Framing))
        } else if status & DOR0 != 0 {
            Err(nb::Error::Other(UartError::Overrun))
        } else if status & UPE0 != 0 {
            Err(nb::Error::Other(UartError::Parity))
        } else {
            Ok(byte)
        }
    }
}

impl<R: Registers> serial::Write<u8> for Usart0<R> {
    type Error = UartError;

    fn write(&mut self, byte: u8) -> nb::Result<(), UartError> {
        if self.regs.read(Reg::Ucsr0a) & UDRE0 == 0 {
            return Err(nb::Error::WouldBlock);
        }
        self.regs.write(Reg::Udr0, byte);
        Ok(())
    }

    fn flush(&mut self) -> nb::Result<(), UartError> {
        if self.regs.read(Reg::Ucsr0a) & TXC0 == 0 {
            Err(nb::Error::WouldBlock)
        } else {
            Ok(())
        }
    }
}
