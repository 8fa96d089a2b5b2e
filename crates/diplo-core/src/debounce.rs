//! Single-slot debouncer with injected time
//!
//! Holds at most one pending deadline. Scheduling again always replaces the
//! previous deadline, and firing clears it. The caller supplies `now`, so the
//! same type drives both `std::time::Instant` and `tokio::time::Instant`.

use std::ops::Add;
use std::time::Duration;

/// Quiescence window for continuous inputs
pub const DEBOUNCE_DELAY: Duration = Duration::from_millis(500);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Debouncer<I> {
    delay: Duration,
    deadline: Option<I>,
}

impl<I> Debouncer<I>
where
    I: Copy + Ord + Add<Duration, Output = I>,
{
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Cancel any pending task and schedule a new one; returns the new deadline
    pub fn schedule(&mut self, now: I) -> I {
        let deadline = now + self.delay;
        self.deadline = Some(deadline);
        deadline
    }

    /// Drop the pending task; returns whether one existed
    pub fn cancel(&mut self) -> bool {
        self.deadline.take().is_some()
    }

    pub fn deadline(&self) -> Option<I> {
        self.deadline
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Fire once if the deadline has passed, clearing it
    pub fn fire_if_due(&mut self, now: I) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

impl<I> Default for Debouncer<I>
where
    I: Copy + Ord + Add<Duration, Output = I>,
{
    fn default() -> Self {
        Self::new(DEBOUNCE_DELAY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_reschedule_replaces_deadline() {
        let start = Instant::now();
        let mut debouncer = Debouncer::default();
        debouncer.schedule(start);
        debouncer.schedule(start + Duration::from_millis(300));

        assert!(!debouncer.fire_if_due(start + Duration::from_millis(600)));
        assert!(debouncer.fire_if_due(start + Duration::from_millis(800)));
        assert!(!debouncer.is_pending());
        assert!(!debouncer.fire_if_due(start + Duration::from_millis(2000)));
    }

    #[test]
    fn test_cancel() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(Duration::from_millis(10));
        assert!(!debouncer.cancel());
        let deadline = debouncer.schedule(start);
        assert_eq!(debouncer.deadline(), Some(deadline));
        assert!(debouncer.cancel());
        assert!(!debouncer.fire_if_due(start + Duration::from_secs(1)));
    }
}
