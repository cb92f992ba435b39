//! Busy-wait strategies for hardware status bits

/// The polled condition never became true
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stalled;

/// Blocks until a hardware flag reports completion
pub trait BusyWait {
    fn until<F: FnMut() -> bool>(&mut self, ready: F) -> Result<(), Stalled>;
}

/// Polls forever. A dead bus hangs the caller, same as the bare loop would.
#[derive(Debug, Default, Clone, Copy)]
pub struct Spin;

impl BusyWait for Spin {
    #[inline]
    fn until<F: FnMut() -> bool>(&mut self, mut ready: F) -> Result<(), Stalled> {
        while !ready() {
            core::hint::spin_loop();
        }
        Ok(())
    }
}

/// Gives up after a fixed number of polls
#[derive(Debug, Clone, Copy)]
pub struct Bounded {
    pub polls: u32,
}

impl Bounded {
    pub const fn new(polls: u32) -> Self {
        Self { polls }
    }
}

impl BusyWait for Bounded {
    fn until<F: FnMut() -> bool>(&mut self, mut ready: F) -> Result<(), Stalled> {
        for _ in 0..self.polls {
            if ready() {
                return Ok(());
            }
            core::hint::spin_loop();
        }
        Err(Stalled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spin_returns_once_ready() {
        let mut polls = 0;
        assert_eq!(
            Spin.until(|| {
                polls += 1;
                polls == 5
            }),
            Ok(())
        );
        assert_eq!(polls, 5);
    }

    #[test]
    fn bounded_reports_stall() {
        let mut polls = 0;
        let result = Bounded::new(10).until(|| {
            polls += 1;
            false
        });
        assert_eq!(result, Err(Stalled));
        assert_eq!(polls, 10);
    }

    #[test]
    fn bounded_succeeds_within_budget() {
        let mut polls = 0;
        let result = Bounded::new(10).until(|| {
            polls += 1;
            polls == 3
        });
        assert_eq!(result, Ok(()));
    }
}
