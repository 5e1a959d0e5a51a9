//! The shared channel and the per-tick contention resolver.

use crate::{
    common::{StationId, Tick},
    config::Exclusivity,
};

/// Occupancy of the single shared medium.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Channel {
    /// Nobody is transmitting
    #[default]
    Idle,
    /// Occupied by `holder` until `ends_at`
    Busy {
        /// Most recent successful transmitter
        holder: StationId,
        /// Tick at which the medium frees up
        ends_at: Tick,
    },
}

impl Channel {
    /// Whether a successful transmission occupies the medium.
    pub fn is_busy(&self) -> bool {
        matches!(self, Channel::Busy { .. })
    }

    /// Records a new transmission. With overlapping transmissions the
    /// medium stays busy until the latest one ends.
    pub fn occupy(&mut self, holder: StationId, ends_at: Tick) {
        let ends_at = match *self {
            Channel::Busy { ends_at: current, .. } => current.max(ends_at),
            Channel::Idle => ends_at,
        };

        *self = Channel::Busy { holder, ends_at };
    }

    /// Frees the medium if its occupation ends at `now`. Returns the
    /// released holder.
    pub fn release_if_due(&mut self, now: Tick) -> Option<StationId> {
        match *self {
            Channel::Busy { holder, ends_at } if ends_at <= now => {
                *self = Channel::Idle;
                Some(holder)
            }
            _ => None,
        }
    }
}

/// Outcome of one tick of contention.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// No station attempted to transmit
    Silent,
    /// Candidates sensed a busy medium and hold off
    Deferred(Vec<StationId>),
    /// The single candidate seizes the channel
    Success(StationId),
    /// Several candidates transmitted at once
    Collision(Vec<StationId>),
}

/// Decides the outcome for this tick's `ready` candidates.
///
/// `ready` must be in ascending id order, which every verdict preserves.
pub fn resolve(channel: &Channel, exclusivity: Exclusivity, ready: &[StationId]) -> Verdict {
    if ready.is_empty() {
        return Verdict::Silent;
    }

    if exclusivity == Exclusivity::Exclusive && channel.is_busy() {
        return Verdict::Deferred(ready.to_vec());
    }

    match ready {
        [only] => Verdict::Success(*only),
        _ => Verdict::Collision(ready.to_vec()),
    }
}
