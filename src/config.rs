//! Configuration constants for ATmega328PB firmware

/// CPU frequency in Hz, from `MCU_FREQ_HZ` as set by the build script
pub const CPU_FREQ_HZ: u32 = parse_hz(env!("MCU_FREQ_HZ"));

/// UART baud rate of the fan control image
pub const FAN_UART_BAUD: u32 = 9600;

/// UART baud rate of the IMU reporting image
pub const IMU_UART_BAUD: u32 = 19200;

/// I2C bus (SCL) frequency in Hz
pub const TWI_SCL_HZ: u32 = 100_000;

/// Tick interrupt rate, one tick per millisecond
pub const TICK_HZ: u32 = 1000;

/// Ticks between two IMU samples
pub const SAMPLE_INTERVAL_TICKS: u16 = 100;

/// Fan PWM frequency (4-wire PC fan standard)
pub const FAN_PWM_HZ: u32 = 25_000;

/// Decimal digits to Hz; the build script has already rejected anything else
const fn parse_hz(digits: &str) -> u32 {
    let bytes = digits.as_bytes();
    let mut value = 0u32;
    let mut i = 0;
    while i < bytes.len() {
        value = value * 10 + (bytes[i] - b'0') as u32;
        i += 1;
    }
    value
}
