//! Fan control image: single-character commands on USART0 at 9600 baud set
//! the PWM duty on OC0B (PD5).
#![cfg_attr(target_arch = "avr", no_std)]
#![cfg_attr(target_arch = "avr", no_main)]

#[cfg(target_arch = "avr")]
mod firmware {
    use panic_halt as _;

    use atmega328pb_firmware::application::FanControl;
    use atmega328pb_firmware::config::{CPU_FREQ_HZ, FAN_UART_BAUD};
    use atmega328pb_firmware::drivers::Console;
    use atmega328pb_firmware::hal::{FanPwm, Mmio, PwmConfig, Usart0};

    #[avr_device::entry]
    fn main() -> ! {
        // Each driver owns a distinct set of registers
        let uart = Usart0::new(unsafe { Mmio::steal() }, CPU_FREQ_HZ, FAN_UART_BAUD);
        let mut pwm = FanPwm::new(unsafe { Mmio::steal() }, PwmConfig::default());
        pwm.configure();

        let mut app = FanControl::new(Console::new(uart), pwm);

        // Global enable only once every peripheral is set up
        unsafe { avr_device::interrupt::enable() };

        app.banner().ok();

        loop {
            // Line errors drop the byte; the next poll starts clean
            app.poll().ok();
        }
    }
}

#[cfg(not(target_arch = "avr"))]
fn main() {
    eprintln!("fan_control runs on the ATmega328PB only; use `cargo test` on the host");
}
