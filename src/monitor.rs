#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::cast_precision_loss)]
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use chrono::Local;
use libct400_sys::core::{CtResult, Detector};
use libct400_sys::Ct400;

use crate::ring_buffer::TraceBuffer2n;

/// Live power monitor settings: which detector, how often, and for how
/// long. `samples == 0` polls until the process is interrupted.
#[derive(Debug, Clone)]
pub struct MonitorSetup {
    pub detector: Detector,
    pub interval_ms: u64,
    pub samples: u32,
    report_every_exponent: u8,
    pub trail_exponent: usize,
    pub log_file: Option<PathBuf>,
}

impl Default for MonitorSetup {
    fn default() -> Self {
        MonitorSetup {
            detector: Detector::D1,
            interval_ms: 250,
            samples: 0,
            report_every_exponent: 4,
            trail_exponent: 6,
            log_file: None,
        }
    }
}

impl MonitorSetup {
    /// Report cadence, rounded down to a power of two so the check in the
    /// polling loop is a mask.
    pub fn set_report_every(&mut self, every: u32) {
        self.report_every_exponent = floor_exp(every.max(1));
    }

    #[must_use]
    pub fn should_report(&self, sample: u32) -> bool {
        sample & ((1 << self.report_every_exponent) - 1) == 0
    }
}

/// What a finished (or interrupted-by-count) monitor run saw.
#[derive(Debug, Clone, Copy)]
pub struct MonitorReport {
    pub samples: u32,
    pub last_dbm: f64,
    pub max_dbm: f64,
    pub min_dbm: f64,
}

fn floor_exp(num: u32) -> u8 {
    if num <= 1 {
        0
    } else {
        (31 - num.leading_zeros()) as u8
    }
}

/// Polls one detector reading per iteration, keeps a short trail of recent
/// samples, and prints a current/max/average line every 2^k samples.
pub fn run(ct: &Ct400, setup: &MonitorSetup) -> CtResult<MonitorReport> {
    let mut trail = TraceBuffer2n::<f64>::new(setup.trail_exponent.min(20))
        .expect("trail exponent clamped to a valid size");
    let mut sink = setup.log_file.as_ref().and_then(|path| {
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(f) => Some(BufWriter::new(f)),
            Err(e) => {
                log::error!("cannot open monitor log {}: {e}", path.display());
                None
            }
        }
    });

    let mut report = MonitorReport {
        samples: 0,
        last_dbm: f64::NAN,
        max_dbm: f64::NEG_INFINITY,
        min_dbm: f64::INFINITY,
    };
    let mut sample: u32 = 0;
    loop {
        let readings = ct.read_power_detectors()?;
        let dbm = readings.detector_dbm(setup.detector);
        trail.append(dbm);
        report.samples = sample + 1;
        report.last_dbm = dbm;
        report.max_dbm = report.max_dbm.max(dbm);
        report.min_dbm = report.min_dbm.min(dbm);

        let mut sink_failed = false;
        if let Some(s) = sink.as_mut() {
            if writeln!(s, "{}\t{dbm:.3}", Local::now().format("%H:%M:%S%.3f")).is_err() {
                sink_failed = true;
            }
        }
        if sink_failed {
            log::error!("monitor log write failed; stopping the log");
            sink = None;
        }

        if setup.should_report(sample) {
            let window_avg = trail.iter().sum::<f64>() / trail.len() as f64;
            println!(
                "[{}] {:?}: {:.3} dBm | max {:.3} dBm | avg[{}] {:.3} dBm",
                Local::now(),
                setup.detector,
                dbm,
                report.max_dbm,
                trail.len(),
                window_avg
            );
        }

        sample += 1;
        if setup.samples != 0 && sample >= setup.samples {
            break;
        }
        thread::sleep(Duration::from_millis(setup.interval_ms));
    }
    if let Some(s) = sink.as_mut() {
        let _ = s.flush();
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floor_exp_test() {
        assert_eq!(floor_exp(1), 0);
        assert_eq!(floor_exp(2), 1);
        assert_eq!(floor_exp(3), 1);
        assert_eq!(floor_exp(4), 2);
        assert_eq!(floor_exp(2048), 11);
    }

    #[test]
    fn report_cadence_is_a_power_of_two() {
        let mut setup = MonitorSetup::default();
        setup.set_report_every(24);
        let hits: Vec<u32> = (0..64).filter(|&i| setup.should_report(i)).collect();
        assert_eq!(hits, vec![0, 16, 32, 48]);
    }

    #[cfg(not(windows))]
    #[test]
    fn bounded_run_reports_every_sample() {
        let ct = Ct400::init().unwrap();
        let setup = MonitorSetup {
            samples: 3,
            interval_ms: 0,
            ..MonitorSetup::default()
        };
        let report = run(&ct, &setup).unwrap();
        assert_eq!(report.samples, 3);
        assert!(report.last_dbm.is_finite());
        assert!(report.min_dbm <= report.max_dbm);
    }
}
