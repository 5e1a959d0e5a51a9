//! Per-station state machine.

use std::fmt;

use tracing::trace;

use crate::{
    backoff::{BackoffWindows, compute_backoff},
    common::{StationId, Tick},
    config::RetryCap,
};

/// Observable state of a station.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StationState {
    /// Waiting out a non-zero countdown
    Counting,
    /// Countdown exhausted, contends for the channel
    Ready,
    /// Occupying the channel until `ends_at`
    Transmitting {
        /// Tick at which the transmission completes
        ends_at: Tick,
    },
}

impl fmt::Display for StationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StationState::Counting => write!(f, "Counting"),
            StationState::Ready => write!(f, "Ready"),
            StationState::Transmitting { ends_at } => write!(f, "Transmitting until {ends_at}"),
        }
    }
}

/// A simulated contender for the shared channel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Station {
    id: StationId,
    countdown: u64,
    retry_count: u32,
    transmission_ends_at: Option<Tick>,
}

impl Station {
    /// Creates a station with its initial countdown drawn from the first
    /// window at tick 0.
    pub fn new(id: StationId, windows: &BackoffWindows) -> Self {
        Self {
            id,
            countdown: compute_backoff(id, 0, windows.initial()),
            retry_count: 0,
            transmission_ends_at: None,
        }
    }

    /// Station id.
    pub fn id(&self) -> StationId {
        self.id
    }

    /// Ticks left before the station contends again.
    pub fn countdown(&self) -> u64 {
        self.countdown
    }

    /// Consecutive collisions since the last success or reset.
    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    /// Whether the station currently occupies the channel.
    pub fn is_transmitting(&self) -> bool {
        self.transmission_ends_at.is_some()
    }

    /// Current state.
    pub fn state(&self) -> StationState {
        match self.transmission_ends_at {
            Some(ends_at) => StationState::Transmitting { ends_at },
            None if self.countdown == 0 => StationState::Ready,
            None => StationState::Counting,
        }
    }

    /// Ends the transmission if it completes at `now`. Returns true when it
    /// did.
    pub fn finish_if_due(&mut self, now: Tick, windows: &BackoffWindows) -> bool {
        match self.transmission_ends_at {
            Some(ends_at) if ends_at <= now => {
                self.transmission_ends_at = None;
                self.retry_count = 0;
                self.countdown = compute_backoff(self.id, now, windows.initial());
                trace!(id = self.id, now, state = %self.state(), "Transmission finished");
                true
            }
            _ => false,
        }
    }

    /// Advances an idle station by one tick. Returns true when the station
    /// is a candidate for the channel this tick.
    pub fn advance(&mut self) -> bool {
        if self.is_transmitting() {
            return false;
        }

        if self.countdown > 0 {
            self.countdown -= 1;
            return false;
        }

        true
    }

    /// Seizes the channel for `duration` ticks starting at `now`.
    pub fn start_transmission(&mut self, now: Tick, duration: u64) -> Tick {
        let ends_at = now.saturating_add(duration);
        self.transmission_ends_at = Some(ends_at);
        ends_at
    }

    /// Applies a collision at `now`.
    pub fn collide(&mut self, now: Tick, windows: &BackoffWindows, max_retries: u32, cap: RetryCap) {
        self.retry_count = self.retry_count.saturating_add(1);

        let window = if cap == RetryCap::Reset && self.retry_count > max_retries {
            trace!(id = self.id, retries = self.retry_count, "Retry cap exceeded, restarting");
            self.retry_count = 0;
            windows.initial()
        } else {
            windows.window_for_stage(self.retry_count)
        };

        self.countdown = compute_backoff(self.id, now, window);
        trace!(id = self.id, now, retries = self.retry_count, state = %self.state(), "Collided");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn windows(w: &[u64]) -> BackoffWindows {
        BackoffWindows::new(w.to_vec()).unwrap()
    }

    #[test_log::test]
    fn test_initial_countdown() {
        let w = windows(&[4, 8]);

        assert_eq!(Station::new(0, &w).countdown(), 0);
        assert_eq!(Station::new(3, &w).countdown(), 3);
        assert_eq!(Station::new(6, &w).countdown(), 2);
        assert_eq!(Station::new(6, &w).state(), StationState::Counting);
        assert_eq!(Station::new(4, &w).state(), StationState::Ready);
    }

    #[test_log::test]
    fn test_state_display() {
        let w = windows(&[4]);
        let mut station = Station::new(1, &w);

        assert_eq!(station.state().to_string(), "Counting");
        station.advance();
        assert_eq!(station.state().to_string(), "Ready");
        station.start_transmission(2, 3);
        assert_eq!(station.state().to_string(), "Transmitting until 5");
    }

    #[test_log::test]
    fn test_countdown_reaches_ready_without_contending() {
        let w = windows(&[4]);
        let mut station = Station::new(2, &w);

        assert!(!station.advance());
        assert_eq!(station.countdown(), 1);
        assert!(!station.advance());
        assert_eq!(station.state(), StationState::Ready);

        // Only contends on the tick after reaching zero
        assert!(station.advance());
        assert!(station.advance());
    }

    #[test_log::test]
    fn test_transmission_lifecycle() {
        let w = windows(&[4]);
        let mut station = Station::new(0, &w);

        let ends_at = station.start_transmission(5, 3);
        assert_eq!(ends_at, 8);
        assert_eq!(station.state(), StationState::Transmitting { ends_at: 8 });
        assert!(!station.advance(), "transmitting stations never contend");

        assert!(!station.finish_if_due(7, &w));
        assert!(station.is_transmitting());

        assert!(station.finish_if_due(8, &w));
        assert!(!station.is_transmitting());
        assert_eq!(station.retry_count(), 0);
        assert_eq!(station.countdown(), 8 % 4);
    }

    #[test_log::test]
    fn test_finish_resets_retries() {
        let w = windows(&[2, 4]);
        let mut station = Station::new(1, &w);

        station.collide(0, &w, 10, RetryCap::Reset);
        station.collide(1, &w, 10, RetryCap::Reset);
        assert_eq!(station.retry_count(), 2);

        station.start_transmission(2, 1);
        station.finish_if_due(3, &w);
        assert_eq!(station.retry_count(), 0);
    }

    #[test_log::test]
    fn test_collision_uses_stage_window() {
        let w = windows(&[2, 8]);
        let mut station = Station::new(3, &w);

        // first collision stays on the first window
        station.collide(4, &w, 10, RetryCap::Reset);
        assert_eq!(station.retry_count(), 1);
        assert_eq!(station.countdown(), (3 + 4) % 2);

        station.collide(5, &w, 10, RetryCap::Reset);
        assert_eq!(station.retry_count(), 2);
        assert_eq!(station.countdown(), (3 + 5) % 8);

        // saturated
        station.collide(6, &w, 10, RetryCap::Reset);
        assert_eq!(station.countdown(), (3 + 6) % 8);
    }

    #[test_log::test]
    fn test_retry_cap_reset() {
        let w = windows(&[3, 16]);
        let mut station = Station::new(1, &w);

        station.collide(0, &w, 2, RetryCap::Reset);
        station.collide(1, &w, 2, RetryCap::Reset);
        assert_eq!(station.retry_count(), 2);

        station.collide(2, &w, 2, RetryCap::Reset);
        assert_eq!(station.retry_count(), 0);
        assert_eq!(station.countdown(), (1 + 2) % 3);
    }

    #[test_log::test]
    fn test_retry_cap_unbounded() {
        let w = windows(&[3, 16]);
        let mut station = Station::new(1, &w);

        for tick in 0..5 {
            station.collide(tick, &w, 2, RetryCap::Unbounded);
        }
        assert_eq!(station.retry_count(), 5);
        assert_eq!(station.countdown(), (1 + 4) % 16);
    }

    #[test_log::test]
    fn test_zero_retry_cap() {
        let w = windows(&[1]);
        let mut station = Station::new(0, &w);

        station.collide(0, &w, 0, RetryCap::Reset);
        assert_eq!(station.retry_count(), 0);
        assert_eq!(station.countdown(), 0);
    }
}
