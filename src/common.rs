/// Index of a simulated station, in `[0, N)`.
pub type StationId = usize;

/// Discrete simulation time.
pub type Tick = u64;

/// Result file written when no `--output` is given.
pub static DEFAULT_OUTPUT_PATH: &str = "output.txt";

/// Number of fractional digits in the reported utilization.
pub static UTILIZATION_PRECISION: usize = 2;
