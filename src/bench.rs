#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
use std::str::Split;
use std::time::Instant;

use chrono::Local;
use libct400_sys::core::{CtResult, Detector, LaserInput};
use libct400_sys::laser::{Laser, LaserSettings};
use libct400_sys::scan::{BncSetup, ScanBuilder};
use libct400_sys::tester::PowerReadings;
use libct400_sys::Ct400;

use crate::monitor::{self, MonitorReport, MonitorSetup};
use crate::sweep::SweepSetup;
use crate::traces::{save_driver_files, OutputSetup, SweepRecord};

/// The whole test bench: the driver session plus everything the operator
/// can point at it. All hardware access in the application goes through
/// here, one blocking driver call at a time.
#[derive(Debug)]
pub struct Bench {
    pub ct: Ct400,
    pub laser: LaserSettings,
    /// the source power the laser falls back to when no power is given
    pub default_power_mw: f64,
    pub sweep: SweepSetup,
    pub bnc: BncSetup,
    pub monitor: MonitorSetup,
    pub output: OutputSetup,
    pub last_sweep: Option<SweepRecord>,
    /// detectors re-referenced since the last calibration reset
    pub calibrated: Vec<Detector>,
}

impl Bench {
    #[must_use]
    pub fn new(ct: Ct400) -> Self {
        Bench {
            ct,
            laser: LaserSettings::default(),
            default_power_mw: 6.0,
            sweep: SweepSetup::new(),
            bnc: BncSetup::default(),
            monitor: MonitorSetup::default(),
            output: OutputSetup::default(),
            last_sweep: None,
            calibrated: Vec::new(),
        }
    }

    /// Turns the source on, parked at `wavelength_nm`. Falls back to the
    /// default power when none is given.
    pub fn laser_on(&self, wavelength_nm: f64, power_mw: Option<f64>) -> CtResult<()> {
        self.ct.ensure_connected()?;
        let power = power_mw.unwrap_or(self.default_power_mw);
        let laser = Laser::new(&self.ct, self.laser);
        laser.configure(true)?;
        laser.command(true, wavelength_nm, power)?;
        log::info!("laser on at {wavelength_nm} nm, {power} mW");
        Ok(())
    }

    pub fn laser_off(&self) -> CtResult<()> {
        self.ct.ensure_connected()?;
        Laser::new(&self.ct, self.laser).command(false, self.sweep.park_nm, self.default_power_mw)?;
        log::info!("laser off");
        Ok(())
    }

    /// Routes the input switch to a different port and remembers it for all
    /// later laser and sweep commands.
    pub fn select_input(&mut self, input: LaserInput) -> CtResult<()> {
        self.laser.input = input;
        Laser::new(&self.ct, self.laser).select()
    }

    pub fn read_powers(&self) -> CtResult<PowerReadings> {
        self.ct.ensure_connected()?;
        self.ct.read_power_detectors()
    }

    /// Configures, runs and records a sweep with the current setup, writes
    /// the configured output files, then optionally parks the laser.
    pub fn run_sweep(&mut self) -> CtResult<&SweepRecord> {
        self.ct.ensure_connected()?;
        let started = Local::now();
        let clock = Instant::now();

        let mut laser = self.laser;
        laser.sweep_speed_nm_s = self.sweep.speed_nm_s();
        let sweep = ScanBuilder::new(&self.ct, laser)
            .power_mw(self.sweep.power_mw())
            .range_nm(self.sweep.start_nm(), self.sweep.stop_nm())
            .resolution_pm(self.sweep.resolution_pm())
            .detectors(
                self.sweep.enable_d2,
                self.sweep.enable_d3,
                self.sweep.enable_d4,
                self.sweep.enable_ext,
            )
            .bnc(self.bnc)
            .apply()?
            .run()?;

        let detectors = self.sweep.detectors_used();
        let record =
            SweepRecord::collect(&sweep, &detectors, started, clock.elapsed().as_secs_f64())?;
        println!("[{}] {}", Local::now(), record.summary());
        for (i, line) in record.lines_nm.iter().enumerate() {
            println!("spectral line #{}: {line:.4} nm", i + 1);
        }

        // File output is best effort; the traces stay on the record either way.
        let stem = record.file_stem();
        if self.output.driver_files {
            if let Err(e) = save_driver_files(&sweep, &detectors, &self.output.directory, &stem) {
                log::error!("driver trace files not written: {e}");
            }
        }
        if self.output.record_file {
            let path = self.output.directory.join(format!("{stem}_sweep.txt"));
            match record.write_txt(&path) {
                Ok(()) => log::info!("sweep record written to {}", path.display()),
                Err(e) => log::error!("sweep record not written: {e}"),
            }
        }

        if self.sweep.park_laser {
            // the driver leaves the source wherever the sweep ended
            Laser::new(&self.ct, laser).command(true, self.sweep.park_nm, self.default_power_mw)?;
            log::info!(
                "laser parked at {} nm, {} mW",
                self.sweep.park_nm,
                self.default_power_mw
            );
        }

        Ok(self.last_sweep.insert(record))
    }

    /// Re-references one detector against the last sweep. The driver holds
    /// the offset; we only keep the session bookkeeping.
    pub fn update_calibration(&mut self, detector: Detector) -> CtResult<()> {
        if self.last_sweep.is_none() {
            log::warn!("calibration update without a sweep on record; the driver may refuse it");
        }
        self.ct.update_calibration(detector)?;
        if !self.calibrated.contains(&detector) {
            self.calibrated.push(detector);
        }
        Ok(())
    }

    pub fn reset_calibration(&mut self) -> CtResult<()> {
        self.ct.reset_calibration()?;
        self.calibrated.clear();
        Ok(())
    }

    pub fn monitor_powers(&self, setup: &MonitorSetup) -> CtResult<MonitorReport> {
        self.ct.ensure_connected()?;
        monitor::run(&self.ct, setup)
    }

    /// Dispatches one colon-separated console command. `Ok(None)` is a
    /// silent success, `Ok(Some(_))` carries a reply for the operator, and
    /// `Err(())` means the command did not parse. Hardware failures come
    /// back as replies so an operator typo cannot be told apart from a
    /// refused driver call only by reading the text.
    #[allow(clippy::too_many_lines)]
    pub fn process_command(&mut self, cmd: Split<'_, char>) -> Result<Option<String>, ()> {
        let parts: Vec<&str> = cmd.collect();
        match &parts[..] {
            // -----------------------------------------------------------------------------
            //   Direct laser control
            // -----------------------------------------------------------------------------
            ["LASER", "ON", wav] => done(self.laser_on(wav.parse().map_err(|_| ())?, None)),
            ["LASER", "ON", wav, pow] => done(self.laser_on(
                wav.parse().map_err(|_| ())?,
                Some(pow.parse().map_err(|_| ())?),
            )),
            ["LASER", "OFF"] => done(self.laser_off()),
            ["LASER", "INPUT", "SET", port] => {
                let input = port
                    .parse::<i64>()
                    .ok()
                    .and_then(LaserInput::from_index)
                    .ok_or(())?;
                done(self.select_input(input))
            }
            ["LASER", "INPUT", "GET"] => Ok(Some((self.laser.input as i32).to_string())),
            // -----------------------------------------------------------------------------
            //   Spot power readings
            // -----------------------------------------------------------------------------
            ["POWER", "READ"] => Ok(Some(match self.read_powers() {
                Ok(p) => format!(
                    "Pout: {:.3} dBm | P1: {:.3} dBm | P2: {:.3} dBm | P3: {:.3} dBm | P4: {:.3} dBm | Vext: {:.4} V",
                    p.out_dbm, p.p1_dbm, p.p2_dbm, p.p3_dbm, p.p4_dbm, p.ext_v
                ),
                Err(e) => format!("error: {e}"),
            })),
            // -----------------------------------------------------------------------------
            //   Sweep setup
            // -----------------------------------------------------------------------------
            ["SWEEP", "POWER", "SET", x] => {
                self.sweep.set_power_mw(x.parse().map_err(|_| ())?);
                Ok(None)
            }
            ["SWEEP", "POWER", "GET"] => Ok(Some(self.sweep.power_mw().to_string())),
            ["SWEEP", "RANGE", "SET", start, stop] => {
                self.sweep.set_range_nm(
                    start.parse().map_err(|_| ())?,
                    stop.parse().map_err(|_| ())?,
                );
                Ok(None)
            }
            ["SWEEP", "RANGE", "GET"] => Ok(Some(format!(
                "{}..{} nm",
                self.sweep.start_nm(),
                self.sweep.stop_nm()
            ))),
            ["SWEEP", "RESOLUTION", "SET", x] => {
                self.sweep.set_resolution_pm(x.parse().map_err(|_| ())?);
                Ok(None)
            }
            ["SWEEP", "RESOLUTION", "GET"] => Ok(Some(self.sweep.resolution_pm().to_string())),
            ["SWEEP", "SPEED", "SET", x] => {
                self.sweep.set_speed_nm_s(x.parse().map_err(|_| ())?);
                Ok(None)
            }
            ["SWEEP", "SPEED", "GET"] => Ok(Some(self.sweep.speed_nm_s().to_string())),
            ["SWEEP", "DETECTOR", "SET", which, state] => {
                let on = match *state {
                    "ON" => true,
                    "OFF" => false,
                    _ => return Err(()),
                };
                match *which {
                    "2" => self.sweep.enable_d2 = on,
                    "3" => self.sweep.enable_d3 = on,
                    "4" => self.sweep.enable_d4 = on,
                    "5" | "EXT" => self.sweep.enable_ext = on,
                    _ => return Err(()),
                }
                Ok(None)
            }
            ["SWEEP", "DETECTORS", "GET"] => Ok(Some(format!("{:?}", self.sweep.detectors_used()))),
            ["SWEEP", "PARK", "SET", "ON"] => {
                self.sweep.park_laser = true;
                Ok(None)
            }
            ["SWEEP", "PARK", "SET", "OFF"] => {
                self.sweep.park_laser = false;
                Ok(None)
            }
            ["SWEEP", "PARK", "GET"] => Ok(Some(format!(
                "{} ({} nm)",
                if self.sweep.park_laser { "ON" } else { "OFF" },
                self.sweep.park_nm
            ))),
            ["SWEEP", "RUN"] => Ok(Some(match self.run_sweep() {
                Ok(record) => record.summary(),
                Err(e) => format!("error: {e}"),
            })),
            // -----------------------------------------------------------------------------
            //   Detector calibration
            // -----------------------------------------------------------------------------
            ["CAL", "UPDATE", det] => {
                let detector = det
                    .parse::<i64>()
                    .ok()
                    .and_then(Detector::from_index)
                    .ok_or(())?;
                done(self.update_calibration(detector))
            }
            ["CAL", "RESET"] => done(self.reset_calibration()),
            ["CAL", "GET"] => Ok(Some(format!("{:?}", self.calibrated))),
            // -----------------------------------------------------------------------------
            //   Live monitor
            // -----------------------------------------------------------------------------
            ["MONITOR", "RUN"] => Ok(Some(self.monitor_reply(self.monitor.clone()))),
            ["MONITOR", "RUN", samples] => {
                let mut setup = self.monitor.clone();
                setup.samples = samples.parse().map_err(|_| ())?;
                Ok(Some(self.monitor_reply(setup)))
            }
            ["MONITOR", "RUN", samples, det] => {
                let mut setup = self.monitor.clone();
                setup.samples = samples.parse().map_err(|_| ())?;
                setup.detector = det
                    .parse::<i64>()
                    .ok()
                    .and_then(Detector::from_index)
                    .ok_or(())?;
                Ok(Some(self.monitor_reply(setup)))
            }
            // -----------------------------------------------------------------------------
            //   Instrument info
            // -----------------------------------------------------------------------------
            ["INFO"] => Ok(Some(self.info_reply())),
            _ => Err(()),
        }
    }

    fn monitor_reply(&self, setup: MonitorSetup) -> String {
        match self.monitor_powers(&setup) {
            Ok(report) => format!(
                "{:?}: {} samples, last {:.3} dBm (min {:.3}, max {:.3})",
                setup.detector, report.samples, report.last_dbm, report.min_dbm, report.max_dbm
            ),
            Err(e) => format!("error: {e}"),
        }
    }

    fn info_reply(&self) -> String {
        let inputs = self.ct.nb_inputs();
        let detectors = self.ct.nb_detectors();
        let kind = self.ct.ct400_type();
        match (inputs, detectors, kind) {
            (Ok(i), Ok(d), Ok(k)) => format!("inputs: {i} | detectors: {d} | option: {k:?}"),
            _ => "error: instrument did not answer".to_string(),
        }
    }
}

fn done(result: CtResult<()>) -> Result<Option<String>, ()> {
    match result {
        Ok(()) => Ok(None),
        Err(e) => Ok(Some(format!("error: {e}"))),
    }
}

#[cfg(all(test, not(windows)))]
mod tests {
    use super::*;

    fn quiet_bench() -> Bench {
        let mut bench = Bench::new(Ct400::init().expect("mock init cannot fail"));
        bench.output.driver_files = false;
        bench.output.record_file = false;
        bench
    }

    #[test]
    fn sweep_commands_drive_a_full_cycle() {
        let mut bench = quiet_bench();
        assert_eq!(
            bench.process_command("SWEEP:RANGE:SET:1551:1553".split(':')),
            Ok(None)
        );
        assert_eq!(
            bench.process_command("SWEEP:RESOLUTION:SET:250".split(':')),
            Ok(None)
        );
        assert_eq!(
            bench.process_command("SWEEP:DETECTOR:SET:2:ON".split(':')),
            Ok(None)
        );
        let reply = bench
            .process_command("SWEEP:RUN".split(':'))
            .unwrap()
            .unwrap();
        assert!(reply.contains("resampled"), "unexpected reply: {reply}");

        let record = bench.last_sweep.as_ref().unwrap();
        // 2 nm at 250 pm, inclusive
        assert_eq!(record.counts.resampled_points, 9);
        assert_eq!(record.wavelength_nm.len(), 9);
        assert_eq!(record.detectors.len(), 2);
        assert_eq!(record.detectors[0].0, Detector::D1);
        assert_eq!(record.detectors[1].0, Detector::D2);
    }

    #[test]
    fn laser_and_power_commands_answer() {
        let mut bench = quiet_bench();
        assert_eq!(bench.process_command("LASER:ON:1550".split(':')), Ok(None));
        let reply = bench
            .process_command("POWER:READ".split(':'))
            .unwrap()
            .unwrap();
        assert!(reply.contains("Pout"));
        assert_eq!(bench.process_command("LASER:OFF".split(':')), Ok(None));
    }

    #[test]
    fn calibration_bookkeeping_follows_driver_calls() {
        let mut bench = quiet_bench();
        assert_eq!(bench.process_command("CAL:UPDATE:2".split(':')), Ok(None));
        assert_eq!(bench.process_command("CAL:UPDATE:2".split(':')), Ok(None));
        assert_eq!(bench.calibrated, vec![Detector::D2]);
        assert_eq!(bench.process_command("CAL:RESET".split(':')), Ok(None));
        assert!(bench.calibrated.is_empty());
    }

    #[test]
    fn malformed_commands_are_rejected() {
        let mut bench = quiet_bench();
        assert_eq!(bench.process_command("SWEEP:NONSENSE".split(':')), Err(()));
        assert_eq!(
            bench.process_command("SWEEP:RANGE:SET:abc:1560".split(':')),
            Err(())
        );
        assert_eq!(bench.process_command("LASER:INPUT:SET:7".split(':')), Err(()));
    }

    #[test]
    fn out_of_range_sweep_surfaces_driver_message() {
        let mut bench = quiet_bench();
        bench.sweep.set_range_nm(1490.0, 1700.0);
        let reply = bench
            .process_command("SWEEP:RUN".split(':'))
            .unwrap()
            .unwrap();
        assert!(reply.starts_with("error:"), "unexpected reply: {reply}");
    }
}
