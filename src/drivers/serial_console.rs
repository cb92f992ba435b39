use embedded_hal::serial;
use ufmt::{uDisplay, uWrite, uwrite, Formatter};

/// Line-oriented text console over any blocking-capable serial port.
/// `\n` goes out as `\r\n`.
pub struct Console<S> {
    serial: S,
}

impl<S> Console<S> {
    pub fn new(serial: S) -> Self {
        Self { serial }
    }
}

impl<S: serial::Write<u8>> Console<S> {
    pub fn write_byte(&mut self, byte: u8) -> Result<(), S::Error> {
        nb::block!(self.serial.write(byte))
    }

    pub fn write_str(&mut self, s: &str) -> Result<(), S::Error> {
        self.put_str(s)
    }

    pub fn write_line(&mut self, s: &str) -> Result<(), S::Error> {
        self.put_str(s)?;
        self.put_str("\n")
    }

    // Debug helper - print hex value
    pub fn write_hex(&mut self, val: u8) -> Result<(), S::Error> {
        const HEX_CHARS: [u8; 16] = *b"0123456789ABCDEF";
        self.write_byte(HEX_CHARS[(val >> 4) as usize])?;
        self.write_byte(HEX_CHARS[(val & 0xF) as usize])
    }

    // Print formatted debug info
    pub fn debug(&mut self, msg: &str, val: u8) -> Result<(), S::Error> {
        self.put_str("[DBG] ")?;
        self.put_str(msg)?;
        self.put_str(": 0x")?;
        self.write_hex(val)?;
        self.put_str("\n")
    }

    fn put_str(&mut self, s: &str) -> Result<(), S::Error> {
        for byte in s.bytes() {
            if byte == b'\n' {
                self.write_byte(b'\r')?;
            }
            self.write_byte(byte)?;
        }
        Ok(())
    }
}

impl<S: serial::Read<u8>> Console<S> {
    /// Next received byte, or `None` when nothing is waiting
    pub fn read_byte(&mut self) -> Result<Option<u8>, S::Error> {
        match self.serial.read() {
            Ok(byte) => Ok(Some(byte)),
            Err(nb::Error::WouldBlock) => Ok(None),
            Err(nb::Error::Other(e)) => Err(e),
        }
    }
}

impl<S: serial::Write<u8>> uWrite for Console<S> {
    type Error = S::Error;

    fn write_str(&mut self, s: &str) -> Result<(), S::Error> {
        self.put_str(s)
    }
}

/// Thousandths printed as a fixed three-decimal number
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Milli(pub i32);

impl Milli {
    /// Round half away from zero
    pub fn from_f32(value: f32) -> Self {
        let scaled = value * 1000.0;
        if scaled < 0.0 {
            Milli((scaled - 0.5) as i32)
        } else {
            Milli((scaled + 0.5) as i32)
        }
    }
}

impl uDisplay for Milli {
    fn fmt<W>(&self, f: &mut Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: uWrite + ?Sized,
    {
        if self.0 < 0 {
            f.write_str("-")?;
        }
        let abs = self.0.unsigned_abs();
        let frac = abs % 1000;
        uwrite!(f, "{}.", abs / 1000)?;
        if frac < 100 {
            f.write_str("0")?;
        }
        if frac < 10 {
            f.write_str("0")?;
        }
        uwrite!(f, "{}", frac)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_mock::serial::{Mock, Transaction};

    struct Text(std::string::String);

    impl uWrite for Text {
        type Error = core::convert::Infallible;

        fn write_str(&mut self, s: &str) -> Result<(), Self::Error> {
            self.0.push_str(s);
            Ok(())
        }
    }

    fn render(value: Milli) -> std::string::String {
        let mut out = Text(std::string::String::new());
        uwrite!(&mut out, "{}", value).unwrap();
        out.0
    }

    #[test]
    fn milli_formats_three_decimals() {
        assert_eq!(render(Milli(122)), "0.122");
        assert_eq!(render(Milli(-61)), "-0.061");
        assert_eq!(render(Milli(1005)), "1.005");
        assert_eq!(render(Milli(-4000)), "-4.000");
        assert_eq!(render(Milli(0)), "0.000");
    }

    #[test]
    fn milli_rounds_half_away_from_zero() {
        assert_eq!(Milli::from_f32(0.122), Milli(122));
        assert_eq!(Milli::from_f32(-0.061), Milli(-61));
        assert_eq!(Milli::from_f32(0.0016), Milli(2));
        assert_eq!(Milli::from_f32(-0.0016), Milli(-2));
    }

    #[test]
    fn newline_becomes_crlf() {
        let serial = Mock::new(&[Transaction::write_many(b"ok\r\n")]);
        let mut console = Console::new(serial.clone());
        console.write_line("ok").unwrap();
        serial.clone().done();
    }

    #[test]
    fn debug_prints_hex() {
        let serial = Mock::new(&[Transaction::write_many(b"[DBG] TWBR: 0x48\r\n")]);
        let mut console = Console::new(serial.clone());
        console.debug("TWBR", 72).unwrap();
        serial.clone().done();
    }

    #[test]
    fn read_byte_maps_would_block_to_none() {
        let serial = Mock::new(&[
            Transaction::read_error(nb::Error::WouldBlock),
            Transaction::read(b'x'),
        ]);
        let mut console = Console::new(serial.clone());
        assert_eq!(console.read_byte(), Ok(None));
        assert_eq!(console.read_byte(), Ok(Some(b'x')));
        serial.clone().done();
    }
}
