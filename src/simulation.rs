//! Tick-driven contention simulation.

use tracing::{debug, info, instrument, trace};

use crate::{
    channel::{Channel, Verdict, resolve},
    common::{StationId, Tick},
    config::{Accounting, Policy, SimConfig},
    station::Station,
};

/// Counters gathered over a run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SimulationReport {
    /// Ticks simulated
    pub ticks: Tick,
    /// Successful transmission starts
    pub successes: u64,
    /// Ticks that resolved as a collision
    pub collisions: u64,
    /// Ticks in which ready stations held off a busy channel
    pub deferrals: u64,
    /// Ticks during which a successful transmission occupied the channel
    pub occupied_ticks: u64,
    /// Productive measure divided by the horizon, in `[0, 1]`
    pub utilization: f64,
}

/// A single run in progress.
pub struct Simulation {
    config: SimConfig,
    policy: Policy,
    stations: Vec<Station>,
    channel: Channel,
    now: Tick,
    report: SimulationReport,
}

impl Simulation {
    /// Creates all stations with their initial countdowns.
    pub fn new(config: SimConfig, policy: Policy) -> Self {
        let stations = (0..config.stations)
            .map(|id| Station::new(id, &config.backoff_windows))
            .collect();

        Self {
            config,
            policy,
            stations,
            channel: Channel::Idle,
            now: 0,
            report: SimulationReport::default(),
        }
    }

    /// Stations in ascending id order.
    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    /// Current channel occupancy.
    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    /// Next tick to be simulated.
    pub fn now(&self) -> Tick {
        self.now
    }

    /// Whether the horizon has been reached.
    pub fn is_finished(&self) -> bool {
        self.now >= self.config.horizon
    }

    /// Simulates one tick and returns how contention was resolved. Does
    /// nothing past the horizon.
    pub fn step(&mut self) -> Verdict {
        if self.is_finished() {
            return Verdict::Silent;
        }

        let now = self.now;
        let windows = &self.config.backoff_windows;

        // finished transmissions free their stations and the medium
        for station in self.stations.iter_mut() {
            station.finish_if_due(now, windows);
        }
        if let Some(holder) = self.channel.release_if_due(now) {
            trace!(now, holder, "Channel idle");
        }

        let ready: Vec<StationId> = self
            .stations
            .iter_mut()
            .filter_map(|station| station.advance().then_some(station.id()))
            .collect();

        let verdict = resolve(&self.channel, self.policy.exclusivity, &ready);

        match &verdict {
            Verdict::Silent => {}
            Verdict::Deferred(ids) => {
                trace!(now, ?ids, "Channel busy, deferring");
                self.report.deferrals += 1;
            }
            Verdict::Success(id) => {
                let ends_at = self.stations[*id].start_transmission(now, self.config.transmission_ticks);
                self.channel.occupy(*id, ends_at);
                self.report.successes += 1;
                debug!(now, id, ends_at, "Transmission started");
            }
            Verdict::Collision(ids) => {
                for &id in ids {
                    self.stations[id].collide(
                        now,
                        windows,
                        self.config.max_retries,
                        self.policy.retry_cap,
                    );
                }
                self.report.collisions += 1;
                debug!(now, ?ids, "Collision");
            }
        }

        if self.channel.is_busy() {
            self.report.occupied_ticks += 1;
        }

        self.now += 1;
        self.report.ticks = self.now;
        verdict
    }

    /// Runs the remaining ticks and returns the final report.
    #[instrument(skip(self), fields(stations = self.config.stations, horizon = self.config.horizon))]
    pub fn run(mut self) -> SimulationReport {
        info!(policy = ?self.policy, "Simulation started");

        while !self.is_finished() {
            self.step();
        }

        let report = self.into_report();
        info!(
            successes = report.successes,
            collisions = report.collisions,
            occupied_ticks = report.occupied_ticks,
            utilization = report.utilization,
            "Simulation finished"
        );
        report
    }

    /// Report for the ticks simulated so far, with utilization measured
    /// against the full horizon.
    pub fn into_report(self) -> SimulationReport {
        let productive = match self.policy.accounting {
            Accounting::Occupancy => self.report.occupied_ticks,
            Accounting::Starts => self.report.successes,
        };

        debug_assert!(
            productive <= self.config.horizon,
            "productive measure {productive} exceeds horizon {}",
            self.config.horizon
        );

        let utilization = if self.config.horizon == 0 {
            0.0
        } else {
            productive as f64 / self.config.horizon as f64
        };

        SimulationReport {
            utilization,
            ..self.report
        }
    }
}

/// Runs `config` with the default policy and returns the utilization rate.
pub fn run(config: &SimConfig) -> f64 {
    Simulation::new(config.clone(), Policy::default()).run().utilization
}
