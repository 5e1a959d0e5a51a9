//! Simulation parameters, run policies, and the tagged parameter file.

use std::{fs, path::Path};

use clap::ValueEnum;
use tracing::{debug, instrument, warn};

use crate::{
    backoff::BackoffWindows,
    common::Tick,
    error::{ConfigError, Error, ParseError},
};

/// How productive channel use is measured.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum Accounting {
    /// Ticks inside the horizon during which a successful transmission
    /// occupies the channel
    #[default]
    Occupancy,
    /// One unit per successful transmission start
    Starts,
}

/// Whether a busy channel blocks new contention.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum Exclusivity {
    /// Ready stations defer while any transmission is in progress
    #[default]
    Exclusive,
    /// Stations contend regardless of ongoing transmissions
    Overlapping,
}

/// What happens once a station's retries exceed `M`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum RetryCap {
    /// Restart from the first window with a zero retry count
    #[default]
    Reset,
    /// Keep counting and stay on the last window
    Unbounded,
}

/// Policy choices for a run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Policy {
    /// Utilization accounting
    pub accounting: Accounting,
    /// Channel exclusivity
    pub exclusivity: Exclusivity,
    /// Retry cap behaviour
    pub retry_cap: RetryCap,
}

/// Immutable parameters of a run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SimConfig {
    /// `N`, number of stations
    pub stations: usize,
    /// `L`, ticks a successful transmission occupies the channel
    pub transmission_ticks: u64,
    /// `M`, collisions tolerated before a reset
    pub max_retries: u32,
    /// `T`, number of simulated ticks
    pub horizon: Tick,
    /// `R`, windows per retry stage
    pub backoff_windows: BackoffWindows,
}

impl SimConfig {
    /// Builds a validated configuration.
    pub fn new(
        stations: usize,
        transmission_ticks: u64,
        max_retries: u32,
        horizon: Tick,
        backoff_windows: Vec<u64>,
    ) -> Result<Self, ConfigError> {
        if stations == 0 {
            return Err(ConfigError::NoStations);
        }
        if transmission_ticks == 0 {
            return Err(ConfigError::ZeroDuration);
        }

        let backoff_windows = BackoffWindows::new(backoff_windows).ok_or(ConfigError::Missing('R'))?;

        Ok(Self {
            stations,
            transmission_ticks,
            max_retries,
            horizon,
            backoff_windows,
        })
    }

    /// Same parameters with a different station count.
    pub fn with_stations(&self, stations: usize) -> Result<Self, ConfigError> {
        if stations == 0 {
            return Err(ConfigError::NoStations);
        }

        Ok(Self {
            stations,
            ..self.clone()
        })
    }

    /// Reads and parses a parameter file.
    #[instrument]
    pub fn from_file(path: &Path) -> crate::Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| Error::InputOpen {
            path: path.to_path_buf(),
            source,
        })?;

        Self::parse(&text)
    }

    /// Parses the tagged parameter format:
    ///
    /// ```text
    /// N 2
    /// L 3
    /// M 5
    /// R 4 8
    /// T 10
    /// ```
    ///
    /// Tags may come in any order. `R` takes the integers following it on
    /// the line of its first value, up to the next tag.
    ///
    /// Tags and values must be separated by whitespace: `N2` is an unknown
    /// tag, not `N 2`, unlike readers that split a leading tag character
    /// off a glued token.
    pub fn parse(text: &str) -> crate::Result<Self> {
        let tokens: Vec<(usize, &str)> = text
            .lines()
            .enumerate()
            .flat_map(|(i, line)| line.split_whitespace().map(move |t| (i + 1, t)))
            .collect();

        let mut stations = None;
        let mut transmission_ticks = None;
        let mut max_retries = None;
        let mut horizon = None;
        let mut windows: Vec<u64> = Vec::new();

        let mut pos = 0;
        while pos < tokens.len() {
            let (line, token) = tokens[pos];
            pos += 1;

            let tag = match token.chars().next() {
                Some(tag) if is_tag(token) => tag,
                _ => {
                    return Err(ParseError::UnknownTag {
                        line,
                        tag: token.to_string(),
                    }
                    .into());
                }
            };

            let Some(&(value_line, value)) = tokens.get(pos) else {
                return Err(ParseError::MissingValue { line, tag }.into());
            };

            if tag == 'R' {
                let start = pos;
                while let Some(&(l, t)) = tokens.get(pos)
                    && l == value_line
                    && !is_tag(t)
                {
                    let window = parse_number(l, tag, t)?;
                    if window == 0 {
                        return Err(ParseError::ZeroWindow { line: l }.into());
                    }
                    windows.push(window);
                    pos += 1;
                }
                if pos == start {
                    return Err(ParseError::MissingValue { line, tag }.into());
                }
                debug!(line, ?windows, "Read backoff windows");
                continue;
            }

            let number = parse_number(value_line, tag, value)?;
            pos += 1;

            let slot = match tag {
                'N' => &mut stations,
                'L' => &mut transmission_ticks,
                'M' => &mut max_retries,
                _ => &mut horizon,
            };
            if let Some(previous) = slot.replace(number) {
                warn!(line, %tag, previous, number, "Parameter given twice, keeping the latest");
            }
            debug!(line, %tag, number, "Read parameter");
        }

        let stations = stations.ok_or(ConfigError::Missing('N'))?;
        let transmission_ticks = transmission_ticks.ok_or(ConfigError::Missing('L'))?;
        let max_retries = max_retries.ok_or(ConfigError::Missing('M'))?;
        let horizon = horizon.ok_or(ConfigError::Missing('T'))?;
        if windows.is_empty() {
            return Err(ConfigError::Missing('R').into());
        }

        let stations = usize::try_from(stations).map_err(|_| ConfigError::OutOfRange('N'))?;
        let max_retries = u32::try_from(max_retries).map_err(|_| ConfigError::OutOfRange('M'))?;

        Ok(Self::new(stations, transmission_ticks, max_retries, horizon, windows)?)
    }
}

fn is_tag(token: &str) -> bool {
    matches!(token, "N" | "L" | "M" | "T" | "R")
}

fn parse_number(line: usize, tag: char, token: &str) -> Result<u64, ParseError> {
    token.parse().map_err(|_| ParseError::MalformedNumber {
        line,
        tag,
        token: token.to_string(),
    })
}
