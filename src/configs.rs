#![allow(clippy::missing_errors_doc)]
use std::path::PathBuf;

use libct400_sys::core::{Detector, LaserInput, LaserSource, Unit};
use libct400_sys::laser::LaserSettings;
use libct400_sys::scan::BncSetup;
use libct400_sys::Ct400;

use crate::bench::Bench;
use crate::monitor::MonitorSetup;
use crate::sweep::SweepSetup;
use crate::traces::OutputSetup;
use crate::util::{tomlget, tomlget_opt, tomlget_or};

pub fn laser_from_config(cfg: &toml::Value) -> Result<LaserSettings, String> {
    let mut out = LaserSettings::default();
    out.gpib_address = tomlget_or!(cfg, "laser", "gpib_address", as_integer, i32, 10);
    out.input = LaserInput::from_index(tomlget_or!(cfg, "laser", "input", as_integer, i64, 1))
        .ok_or("laser input must be one of 1-4")?;
    out.source = laser_source_from_name(tomlget_or!(cfg, "laser", "source", as_str, "t100s-hp"))?;
    out.min_wavelength_nm = tomlget_or!(cfg, "laser", "min_wavelength_nm", as_float, f64, 1500.0);
    out.max_wavelength_nm = tomlget_or!(cfg, "laser", "max_wavelength_nm", as_float, f64, 1630.0);
    if out.min_wavelength_nm >= out.max_wavelength_nm {
        return Err("laser wavelength limits are inverted".into());
    }
    out.sweep_speed_nm_s = tomlget_or!(cfg, "laser", "speed_nm_s", as_integer, i32, 100);
    Ok(out)
}

fn laser_source_from_name(name: &str) -> Result<LaserSource, String> {
    match name.to_ascii_lowercase().as_str() {
        "tunics-plus" => Ok(LaserSource::TunicsPlus),
        "tunics-purity" => Ok(LaserSource::TunicsPurity),
        "tunics-reference" => Ok(LaserSource::TunicsReference),
        "t100s-hp" | "tunics-t100s-hp" => Ok(LaserSource::TunicsT100sHp),
        "t100r" | "tunics-t100r" => Ok(LaserSource::TunicsT100r),
        "jdsu-sws" => Ok(LaserSource::JdsuSws),
        "agilent" => Ok(LaserSource::Agilent),
        _ => Err(format!("unknown laser source '{name}'")),
    }
}

pub fn sweep_from_config(cfg: &toml::Value) -> Result<SweepSetup, String> {
    let mut out = SweepSetup::new();
    out.set_power_mw(tomlget_or!(cfg, "sweep", "power_mw", as_float, f64, 6.0));
    out.set_range_nm(
        tomlget!(cfg, "sweep", "start_nm", as_float, f64),
        tomlget!(cfg, "sweep", "stop_nm", as_float, f64),
    );
    out.set_resolution_pm(tomlget_or!(cfg, "sweep", "resolution_pm", as_integer, u32, 1));
    out.set_speed_nm_s(tomlget_or!(cfg, "sweep", "speed_nm_s", as_integer, i32, 100));
    out.enable_d2 = tomlget_or!(cfg, "detectors", "detector_2", as_bool, false);
    out.enable_d3 = tomlget_or!(cfg, "detectors", "detector_3", as_bool, false);
    out.enable_d4 = tomlget_or!(cfg, "detectors", "detector_4", as_bool, false);
    out.enable_ext = tomlget_or!(cfg, "detectors", "external", as_bool, false);
    out.park_laser = tomlget_or!(cfg, "sweep", "park_laser", as_bool, false);
    out.park_nm = tomlget_or!(cfg, "sweep", "park_nm", as_float, f64, 1550.0);
    Ok(out)
}

pub fn bnc_from_config(cfg: &toml::Value) -> Result<BncSetup, String> {
    let mut out = BncSetup::default();
    out.convert_to_power = tomlget_or!(cfg, "bnc", "convert_to_power", as_bool, false);
    out.alpha = tomlget_or!(cfg, "bnc", "alpha", as_float, f64, 0.0);
    out.beta = tomlget_or!(cfg, "bnc", "beta", as_float, f64, 0.0);
    out.unit = match tomlget_or!(cfg, "bnc", "unit", as_str, "mw") {
        "mw" | "mW" => Unit::MilliWatt,
        "dbm" | "dBm" => Unit::Dbm,
        other => return Err(format!("unknown BNC unit '{other}'")),
    };
    Ok(out)
}

pub fn monitor_from_config(cfg: &toml::Value) -> Result<MonitorSetup, String> {
    let mut out = MonitorSetup::default();
    out.detector =
        Detector::from_index(tomlget_or!(cfg, "monitor", "detector", as_integer, i64, 1))
            .ok_or("monitor detector must be one of 1-5")?;
    out.interval_ms = tomlget_or!(cfg, "monitor", "interval_ms", as_integer, u64, 250);
    out.samples = tomlget_or!(cfg, "monitor", "samples", as_integer, u32, 0);
    out.set_report_every(tomlget_or!(cfg, "monitor", "report_every", as_integer, u32, 16));
    out.trail_exponent = tomlget_or!(cfg, "monitor", "trail_exponent", as_integer, usize, 6);
    out.log_file = tomlget_opt!(cfg, "monitor", "log_file", as_str).map(PathBuf::from);
    Ok(out)
}

pub fn output_from_config(cfg: &toml::Value) -> Result<OutputSetup, String> {
    Ok(OutputSetup {
        directory: PathBuf::from(tomlget_or!(cfg, "output", "directory", as_str, ".")),
        driver_files: tomlget_or!(cfg, "output", "driver_files", as_bool, true),
        record_file: tomlget_or!(cfg, "output", "record_file", as_bool, true),
    })
}

#[must_use]
pub fn autorun_from_config(cfg: &toml::Value) -> bool {
    tomlget_or!(cfg, "sweep", "autorun", as_bool, false)
}

pub fn bench_from_config(cfg: &toml::Value, ct: Ct400) -> Result<Bench, String> {
    let mut out = Bench::new(ct);
    out.laser = laser_from_config(cfg)?;
    out.default_power_mw = tomlget_or!(cfg, "laser", "default_power_mw", as_float, f64, 6.0);
    out.sweep = sweep_from_config(cfg)?;
    out.bnc = bnc_from_config(cfg)?;
    out.monitor = monitor_from_config(cfg)?;
    out.output = output_from_config(cfg)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(text: &str) -> toml::Value {
        toml::from_str(text).expect("test config parses")
    }

    #[test]
    fn laser_section_overrides_defaults() {
        let cfg = cfg(r#"
            [laser]
            gpib_address = 12
            input = 2
            source = "agilent"
            min_wavelength_nm = 1520.0
            max_wavelength_nm = 1570.0
            speed_nm_s = 50
        "#);
        let laser = laser_from_config(&cfg).unwrap();
        assert_eq!(laser.gpib_address, 12);
        assert_eq!(laser.input, LaserInput::In2);
        assert_eq!(laser.source, LaserSource::Agilent);
        assert_eq!(laser.sweep_speed_nm_s, 50);
    }

    #[test]
    fn unknown_laser_source_is_an_error() {
        let cfg = cfg(r#"
            [laser]
            source = "model-t"
        "#);
        assert!(laser_from_config(&cfg).is_err());
    }

    #[test]
    fn sweep_section_requires_a_range_and_clamps_the_rest() {
        let cfg = cfg(r#"
            [sweep]
            start_nm = 1550.0
            stop_nm = 1560.0
            resolution_pm = 400
            speed_nm_s = 3

            [detectors]
            detector_3 = true
        "#);
        let sweep = sweep_from_config(&cfg).unwrap();
        assert_eq!(sweep.resolution_pm(), 250);
        assert_eq!(sweep.speed_nm_s(), 10);
        assert!(sweep.enable_d3);
        assert!(!sweep.enable_d2);

        let no_range: toml::Value = toml::from_str("").unwrap();
        assert!(sweep_from_config(&no_range).is_err());
    }

    #[test]
    fn monitor_defaults_are_usable() {
        let empty: toml::Value = toml::from_str("").unwrap();
        let monitor = monitor_from_config(&empty).unwrap();
        assert_eq!(monitor.detector, Detector::D1);
        assert_eq!(monitor.interval_ms, 250);
        assert!(monitor.log_file.is_none());
        assert!(!autorun_from_config(&empty));
    }
}
