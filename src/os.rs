//! Millisecond tick and sample scheduling shared with the timer interrupt
//!
//! Single producer, single consumer: only [`TickSource::on_compare_match`]
//! (called from TIMER0_COMPA) writes the counter and raises the flag, only
//! the main loop clears it. There is no queue. If the main loop is slower
//! than the sample interval, the flag is simply raised again and the missed
//! boundary goes unnoticed.
//!
//! The flag is consumed with a swap. On AVR `portable-atomic` implements it
//! by masking interrupts for the duration, so a tick cannot land between
//! the read and the clear. A plain load followed by a store would have that
//! window; it is harmless at a 100 ms interval but it would exist.

use crate::config::SAMPLE_INTERVAL_TICKS;
use portable_atomic::{AtomicBool, AtomicU16, AtomicU32, Ordering};

pub struct TickSource {
    period: u16,
    count: AtomicU16,
    uptime_ms: AtomicU32,
    sample_ready: AtomicBool,
}

impl TickSource {
    pub const fn new(period: u16) -> Self {
        Self {
            period,
            count: AtomicU16::new(0),
            uptime_ms: AtomicU32::new(0),
            sample_ready: AtomicBool::new(false),
        }
    }

    /// Interrupt side. Keep it this short: it delays I2C bus timing.
    #[inline]
    pub fn on_compare_match(&self) {
        self.uptime_ms.fetch_add(1, Ordering::Relaxed);

        let next = self.count.load(Ordering::Relaxed) + 1;
        if next >= self.period {
            self.count.store(0, Ordering::Relaxed);
            self.sample_ready.store(true, Ordering::Release);
        } else {
            self.count.store(next, Ordering::Relaxed);
        }
    }

    /// Main-loop side: true at most once per raised flag
    #[inline]
    pub fn take_sample_ready(&self) -> bool {
        self.sample_ready.swap(false, Ordering::Acquire)
    }

    pub fn is_sample_ready(&self) -> bool {
        self.sample_ready.load(Ordering::Acquire)
    }

    /// Ticks since the last flag
    pub fn count(&self) -> u16 {
        self.count.load(Ordering::Relaxed)
    }

    /// Milliseconds since the timer started, wrapping after ~49 days
    pub fn millis(&self) -> u32 {
        self.uptime_ms.load(Ordering::Relaxed)
    }

    pub fn period(&self) -> u16 {
        self.period
    }
}

/// Global tick state for the IMU image
pub static TICKS: TickSource = TickSource::new(SAMPLE_INTERVAL_TICKS);
