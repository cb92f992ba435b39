pub mod pwm;
pub mod regs;
pub mod timer;
pub mod twi;
pub mod uart;
pub mod wait;

// Re-export commonly used types
pub use pwm::{DutyLevel, FanPwm, PwmConfig};
#[cfg(target_arch = "avr")]
pub use regs::Mmio;
pub use regs::{Reg, Registers};
pub use timer::{Prescaler, TickTimer};
pub use twi::{Twi, TwiError, TwiSpeed, TwiStatus};
pub use uart::{UartError, Usart0};
pub use wait::{Bounded, BusyWait, Spin, Stalled};
