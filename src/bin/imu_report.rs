//! IMU reporting image: every 100 ms the LSM6DSO accelerometer is sampled
//! over I2C and printed on USART0 at 19200 baud.
#![cfg_attr(target_arch = "avr", no_std)]
#![cfg_attr(target_arch = "avr", no_main)]
#![cfg_attr(target_arch = "avr", feature(abi_avr_interrupt))]

#[cfg(target_arch = "avr")]
mod firmware {
    use panic_halt as _;

    use atmega328pb_firmware::application::ImuReporter;
    use atmega328pb_firmware::config::{CPU_FREQ_HZ, IMU_UART_BAUD, TICK_HZ, TWI_SCL_HZ};
    use atmega328pb_firmware::drivers::{Console, Lsm6dso};
    use atmega328pb_firmware::hal::{Mmio, TickTimer, Twi, Usart0};
    use atmega328pb_firmware::os::TICKS;

    #[avr_device::interrupt(atmega328pb)]
    fn TIMER0_COMPA() {
        TICKS.on_compare_match();
    }

    #[avr_device::entry]
    fn main() -> ! {
        avr_device::interrupt::disable();

        let uart = Usart0::new(unsafe { Mmio::steal() }, CPU_FREQ_HZ, IMU_UART_BAUD);
        let mut twi = Twi::new(unsafe { Mmio::steal() });
        twi.init(CPU_FREQ_HZ, TWI_SCL_HZ);

        #[cfg(feature = "debug")]
        let bit_rate = twi.bit_rate();

        let mut timer = TickTimer::new(unsafe { Mmio::steal() });
        timer.start(CPU_FREQ_HZ, TICK_HZ);

        let mut app = ImuReporter::new(Console::new(uart), Lsm6dso::new(twi));

        #[cfg(feature = "debug")]
        app.console().debug("TWBR", bit_rate).ok();

        unsafe { avr_device::interrupt::enable() };

        if app.start().is_err() {
            // Wrong or missing sensor: halt
            loop {
                avr_device::asm::nop();
            }
        }

        loop {
            // A failed sample is skipped, the next tick retries the read
            app.poll(&TICKS).ok();
        }
    }
}

#[cfg(not(target_arch = "avr"))]
fn main() {
    eprintln!("imu_report runs on the ATmega328PB only; use `cargo test` on the host");
}
