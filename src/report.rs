//! Result formatting, the output file, and station-count sweeps.

use std::{fs, path::Path};

use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use tracing::{debug, info, instrument};

use crate::{
    common::UTILIZATION_PRECISION,
    config::{Policy, SimConfig},
    error::{ConfigError, Error},
    simulation::{Simulation, SimulationReport},
};

/// Utilization with two fractional digits, e.g. `0.73`.
pub fn format_utilization(utilization: f64) -> String {
    format!("{utilization:.prec$}", prec = UTILIZATION_PRECISION)
}

/// Writes the one-line result file, replacing any previous one.
#[instrument]
pub fn write_output(path: &Path, utilization: f64) -> crate::Result<()> {
    let line = format!("{}\n", format_utilization(utilization));

    fs::write(path, line).map_err(|source| Error::OutputWrite {
        path: path.to_path_buf(),
        source,
    })?;

    debug!("Result written");
    Ok(())
}

/// One row of a sweep.
#[derive(Clone, Debug, PartialEq)]
pub struct SweepPoint {
    /// Station count of this run
    pub stations: usize,
    /// Its report
    pub report: SimulationReport,
}

/// Reruns `config` for every station count in `1..=max_stations`.
///
/// Runs are independent and spread over the rayon pool; rows come back in
/// station-count order.
#[instrument(skip(config))]
pub fn sweep(config: &SimConfig, policy: Policy, max_stations: usize) -> crate::Result<Vec<SweepPoint>> {
    if max_stations == 0 {
        return Err(ConfigError::NoStations.into());
    }

    let progress = ProgressBar::new(max_stations as u64);
    if let Ok(style) = ProgressStyle::with_template("{bar:40} {pos}/{len} station counts") {
        progress.set_style(style);
    }

    let points = (1..=max_stations)
        .into_par_iter()
        .map(|stations| {
            let config = config.with_stations(stations)?;
            let report = Simulation::new(config, policy).run();
            progress.inc(1);

            Ok(SweepPoint { stations, report })
        })
        .collect::<Result<Vec<_>, ConfigError>>()?;

    progress.finish_and_clear();
    info!(runs = points.len(), "Sweep finished");

    Ok(points)
}

/// Renders sweep rows as a `stations utilization` table.
pub fn sweep_table(points: &[SweepPoint]) -> String {
    let mut table = String::from("stations utilization\n");
    for point in points {
        table.push_str(&format!(
            "{:>8} {}\n",
            point.stations,
            format_utilization(point.report.utilization)
        ));
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    fn scratch_dir(name: &str) -> std::path::PathBuf {
        let dir = env::temp_dir().join(format!("csma-sim-{}-{name}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test_log::test]
    fn test_format_utilization() {
        assert_eq!(format_utilization(0.0), "0.00");
        assert_eq!(format_utilization(1.0), "1.00");
        assert_eq!(format_utilization(0.7333), "0.73");
        assert_eq!(format_utilization(1.0 / 3.0), "0.33");
    }

    #[test_log::test]
    fn test_write_output_replaces_file() {
        let path = scratch_dir("write").join("output.txt");

        fs::write(&path, "stale contents\nmore\n").unwrap();
        write_output(&path, 0.9).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "0.90\n");
    }

    #[test_log::test]
    fn test_write_output_unwritable() {
        let path = scratch_dir("unwritable").join("missing-dir").join("output.txt");

        let err = write_output(&path, 0.5).unwrap_err();
        assert!(matches!(err, Error::OutputWrite { .. }));
    }

    #[test_log::test]
    #[serial]
    fn test_write_output_relative_path() {
        let dir = scratch_dir("relative");
        let previous = env::current_dir().unwrap();

        env::set_current_dir(&dir).unwrap();
        let result = write_output(Path::new(crate::common::DEFAULT_OUTPUT_PATH), 0.25);
        env::set_current_dir(previous).unwrap();

        result.unwrap();
        assert_eq!(fs::read_to_string(dir.join("output.txt")).unwrap(), "0.25\n");
    }

    #[test_log::test]
    fn test_sweep_matches_individual_runs() {
        let config = SimConfig::new(2, 3, 5, 120, vec![4, 8]).unwrap();
        let points = sweep(&config, Policy::default(), 6).unwrap();

        assert_eq!(points.len(), 6);
        for (i, point) in points.iter().enumerate() {
            assert_eq!(point.stations, i + 1);

            let single = Simulation::new(config.with_stations(i + 1).unwrap(), Policy::default()).run();
            assert_eq!(point.report, single);
        }
    }

    #[test_log::test]
    fn test_sweep_rejects_zero() {
        let config = SimConfig::new(2, 3, 5, 10, vec![4]).unwrap();
        assert!(matches!(
            sweep(&config, Policy::default(), 0),
            Err(Error::Config(ConfigError::NoStations))
        ));
    }

    #[test_log::test]
    fn test_sweep_table() {
        let config = SimConfig::new(1, 1, 1, 10, vec![1]).unwrap();
        let points = sweep(&config, Policy::default(), 2).unwrap();

        let table = sweep_table(&points);
        let mut lines = table.lines();
        assert_eq!(lines.next(), Some("stations utilization"));
        assert_eq!(lines.next(), Some("       1 1.00"));
        assert_eq!(lines.count(), 1);
    }
}
