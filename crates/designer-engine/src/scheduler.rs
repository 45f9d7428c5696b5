//! Deferred re-layout scheduling
//!
//! Model, selection and mode changes never re-render inline. They mark the
//! diagram dirty and the host's event loop calls
//! [`crate::controller::InteractionController::tick`], which renders once
//! the deadline has passed. Any number of changes before the deadline fold
//! into that single render, and since a render always projects the latest
//! model, a late tick can never draw a stale one.
//!
//! The first render waits longer than later ones so the host surface can
//! settle its measurements.

use std::time::{Duration, Instant};

/// Coalescing timer for diagram re-layout
#[derive(Debug, Clone)]
pub struct RelayoutScheduler {
    delay: Duration,
    initial_delay: Duration,
    due: Option<Instant>,
    rendered: bool,
}

impl RelayoutScheduler {
    pub fn new(delay: Duration, initial_delay: Duration) -> Self {
        Self {
            delay,
            initial_delay,
            due: None,
            rendered: false,
        }
    }

    /// Request a re-layout; an already pending request keeps its deadline
    pub fn schedule(&mut self, now: Instant) {
        if self.due.is_none() {
            let delay = if self.rendered {
                self.delay
            } else {
                self.initial_delay
            };
            self.due = Some(now + delay);
        }
    }

    /// Consume the pending request if its deadline has passed
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.due {
            Some(due) if due <= now => {
                self.due = None;
                self.rendered = true;
                true
            }
            _ => false,
        }
    }

    /// Consume the pending request regardless of its deadline
    pub fn take(&mut self) -> bool {
        let pending = self.due.take().is_some();
        if pending {
            self.rendered = true;
        }
        pending
    }

    pub fn is_pending(&self) -> bool {
        self.due.is_some()
    }

    /// When the pending re-layout is due
    pub fn deadline(&self) -> Option<Instant> {
        self.due
    }

    /// Time left until the pending re-layout is due (zero when overdue)
    pub fn time_until(&self, now: Instant) -> Option<Duration> {
        self.due.map(|due| due.saturating_duration_since(now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheduler() -> RelayoutScheduler {
        RelayoutScheduler::new(Duration::from_millis(50), Duration::from_millis(400))
    }

    #[test]
    fn test_first_render_uses_initial_delay() {
        let mut scheduler = scheduler();
        let now = Instant::now();
        scheduler.schedule(now);

        assert!(!scheduler.poll(now + Duration::from_millis(50)));
        assert!(scheduler.poll(now + Duration::from_millis(400)));
        assert!(!scheduler.is_pending());
    }

    #[test]
    fn test_later_renders_use_short_delay() {
        let mut scheduler = scheduler();
        let now = Instant::now();
        scheduler.schedule(now);
        assert!(scheduler.take());

        scheduler.schedule(now);
        assert_eq!(scheduler.deadline(), Some(now + Duration::from_millis(50)));
    }

    #[test]
    fn test_requests_coalesce() {
        let mut scheduler = scheduler();
        let now = Instant::now();
        scheduler.schedule(now);
        scheduler.take();

        scheduler.schedule(now);
        scheduler.schedule(now + Duration::from_millis(10));
        scheduler.schedule(now + Duration::from_millis(20));

        assert!(scheduler.poll(now + Duration::from_millis(50)));
        assert!(!scheduler.poll(now + Duration::from_millis(100)));
    }

    #[test]
    fn test_time_until() {
        let mut scheduler = scheduler();
        let now = Instant::now();
        assert_eq!(scheduler.time_until(now), None);

        scheduler.schedule(now);
        assert_eq!(
            scheduler.time_until(now + Duration::from_millis(100)),
            Some(Duration::from_millis(300))
        );
        assert_eq!(
            scheduler.time_until(now + Duration::from_secs(1)),
            Some(Duration::ZERO)
        );
    }
}
