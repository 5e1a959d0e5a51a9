//! Deterministic backoff generation and the retry-stage window table.

use crate::common::{StationId, Tick};

/// Wait count for `station` at `tick` inside a window of `window` slots.
///
/// Pure, so identical inputs always reproduce the same trace. Always in
/// `[0, window)`; a zero window is treated as a single slot.
pub fn compute_backoff(station: StationId, tick: Tick, window: u64) -> u64 {
    let window = window.max(1);

    // (station + tick) mod window, without overflowing on huge ticks
    ((station as u64 % window) + (tick % window)) % window
}

/// Ordered backoff windows, one per collision-retry stage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BackoffWindows {
    windows: Vec<u64>,
}

impl BackoffWindows {
    /// Builds the table. Returns `None` for an empty table.
    pub fn new(windows: Vec<u64>) -> Option<Self> {
        if windows.is_empty() {
            return None;
        }

        Some(Self {
            windows: windows.into_iter().map(|w| w.max(1)).collect(),
        })
    }

    /// Window used for fresh stations and after a successful transmission.
    pub fn initial(&self) -> u64 {
        self.windows[0]
    }

    /// Window for a station that has seen `retry_count` consecutive
    /// collisions. Saturates at the last entry.
    pub fn window_for_stage(&self, retry_count: u32) -> u64 {
        let stage = (retry_count as usize).min(self.windows.len()).max(1);
        self.windows[stage - 1]
    }

    /// The raw window sizes.
    pub fn as_slice(&self) -> &[u64] {
        &self.windows
    }
}
