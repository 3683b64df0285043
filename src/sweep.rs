#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
use libct400_sys::core::Detector;
use libct400_sys::scan::{
    MAX_RESOLUTION_PM, MAX_SPEED_NM_S, MIN_RESOLUTION_PM, MIN_SPEED_NM_S,
};
use serde::{Deserialize, Serialize};

/// Everything that varies between wavelength sweeps. Setters clamp to what
/// the instrument accepts and warn instead of refusing, so an off-range
/// config file still produces a usable sweep.
#[derive(Debug, Clone)]
pub struct SweepSetup {
    power_mw: f64,
    start_nm: f64,
    stop_nm: f64,
    resolution_pm: u32,
    speed_nm_s: i32,
    pub enable_d2: bool,
    pub enable_d3: bool,
    pub enable_d4: bool,
    pub enable_ext: bool,
    /// re-arm the source at `park_nm` once the sweep has finished
    pub park_laser: bool,
    pub park_nm: f64,
}

impl SweepSetup {
    #[must_use]
    pub fn new() -> Self {
        SweepSetup {
            power_mw: 6.0,
            start_nm: 1500.0,
            stop_nm: 1630.0,
            resolution_pm: 1,
            speed_nm_s: 100,
            enable_d2: false,
            enable_d3: false,
            enable_d4: false,
            enable_ext: false,
            park_laser: false,
            park_nm: 1550.0,
        }
    }

    #[must_use]
    pub fn power_mw(&self) -> f64 {
        self.power_mw
    }

    #[must_use]
    pub fn start_nm(&self) -> f64 {
        self.start_nm
    }

    #[must_use]
    pub fn stop_nm(&self) -> f64 {
        self.stop_nm
    }

    #[must_use]
    pub fn resolution_pm(&self) -> u32 {
        self.resolution_pm
    }

    #[must_use]
    pub fn speed_nm_s(&self) -> i32 {
        self.speed_nm_s
    }

    pub fn set_power_mw(&mut self, power_mw: f64) {
        if power_mw.is_nan() || power_mw <= 0.0 {
            log::warn!(
                "laser power {power_mw} mW is not usable; keeping {} mW",
                self.power_mw
            );
            return;
        }
        self.power_mw = power_mw;
    }

    pub fn set_range_nm(&mut self, start_nm: f64, stop_nm: f64) {
        if start_nm.is_nan() || stop_nm.is_nan() {
            log::warn!("sweep range is not a number; keeping {}..{} nm", self.start_nm, self.stop_nm);
            return;
        }
        if stop_nm < start_nm {
            log::warn!("sweep range {start_nm}..{stop_nm} nm is inverted; swapping the limits");
            self.start_nm = stop_nm;
            self.stop_nm = start_nm;
        } else {
            self.start_nm = start_nm;
            self.stop_nm = stop_nm;
        }
    }

    pub fn set_resolution_pm(&mut self, resolution_pm: u32) {
        let clamped = resolution_pm.clamp(MIN_RESOLUTION_PM, MAX_RESOLUTION_PM);
        if clamped != resolution_pm {
            log::warn!(
                "sampling resolution given as {resolution_pm} pm. Valid resolutions are {MIN_RESOLUTION_PM} to {MAX_RESOLUTION_PM} pm. Proceeding with {clamped} pm"
            );
        }
        self.resolution_pm = clamped;
    }

    pub fn set_speed_nm_s(&mut self, speed_nm_s: i32) {
        let clamped = speed_nm_s.clamp(MIN_SPEED_NM_S, MAX_SPEED_NM_S);
        if clamped != speed_nm_s {
            log::warn!(
                "sweep speed given as {speed_nm_s} nm/s. Valid speeds are {MIN_SPEED_NM_S} to {MAX_SPEED_NM_S} nm/s. Proceeding with {clamped} nm/s"
            );
        }
        self.speed_nm_s = clamped;
    }

    /// Detector 1 always records; the rest follow their enable flags. The
    /// BNC input shows up as detector 5 in the driver's trace getters.
    #[must_use]
    pub fn detectors_used(&self) -> Vec<Detector> {
        let mut out = vec![Detector::D1];
        if self.enable_d2 {
            out.push(Detector::D2);
        }
        if self.enable_d3 {
            out.push(Detector::D3);
        }
        if self.enable_d4 {
            out.push(Detector::D4);
        }
        if self.enable_ext {
            out.push(Detector::D5);
        }
        out
    }
}

impl Default for SweepSetup {
    fn default() -> Self {
        SweepSetup::new()
    }
}

#[derive(Serialize, Deserialize, Debug)]
struct SweepSerialize {
    power_mw: f64,
    start_nm: f64,
    stop_nm: f64,
    resolution_pm: u32,
    speed_nm_s: i32,
    enable_d2: bool,
    enable_d3: bool,
    enable_d4: bool,
    enable_ext: bool,
    park_laser: bool,
    park_nm: f64,
}

impl SweepSerialize {
    fn into_setup(self) -> SweepSetup {
        let mut out = SweepSetup::new();
        out.set_power_mw(self.power_mw);
        out.set_range_nm(self.start_nm, self.stop_nm);
        out.set_resolution_pm(self.resolution_pm);
        out.set_speed_nm_s(self.speed_nm_s);
        out.enable_d2 = self.enable_d2;
        out.enable_d3 = self.enable_d3;
        out.enable_d4 = self.enable_d4;
        out.enable_ext = self.enable_ext;
        out.park_laser = self.park_laser;
        out.park_nm = self.park_nm;
        out
    }

    fn from_setup(setup: &SweepSetup) -> Self {
        SweepSerialize {
            power_mw: setup.power_mw,
            start_nm: setup.start_nm,
            stop_nm: setup.stop_nm,
            resolution_pm: setup.resolution_pm,
            speed_nm_s: setup.speed_nm_s,
            enable_d2: setup.enable_d2,
            enable_d3: setup.enable_d3,
            enable_d4: setup.enable_d4,
            enable_ext: setup.enable_ext,
            park_laser: setup.park_laser,
            park_nm: setup.park_nm,
        }
    }
}

impl<'de> Deserialize<'de> for SweepSetup {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        Ok(SweepSerialize::deserialize(d)?.into_setup())
    }
}

impl Serialize for SweepSetup {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        SweepSerialize::from_setup(self).serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolution_and_speed_clamp_to_instrument_limits() {
        let mut setup = SweepSetup::new();
        setup.set_resolution_pm(0);
        assert_eq!(setup.resolution_pm(), 1);
        setup.set_resolution_pm(300);
        assert_eq!(setup.resolution_pm(), 250);
        setup.set_speed_nm_s(5);
        assert_eq!(setup.speed_nm_s(), 10);
        setup.set_speed_nm_s(500);
        assert_eq!(setup.speed_nm_s(), 100);
    }

    #[test]
    fn inverted_range_is_swapped() {
        let mut setup = SweepSetup::new();
        setup.set_range_nm(1560.0, 1550.0);
        assert!((setup.start_nm() - 1550.0).abs() < f64::EPSILON);
        assert!((setup.stop_nm() - 1560.0).abs() < f64::EPSILON);
    }

    #[test]
    fn unusable_power_keeps_previous_value() {
        let mut setup = SweepSetup::new();
        setup.set_power_mw(3.0);
        setup.set_power_mw(-1.0);
        assert!((setup.power_mw() - 3.0).abs() < f64::EPSILON);
        setup.set_power_mw(f64::NAN);
        assert!((setup.power_mw() - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn detector_one_always_records() {
        let mut setup = SweepSetup::new();
        assert_eq!(setup.detectors_used(), vec![Detector::D1]);
        setup.enable_d3 = true;
        setup.enable_ext = true;
        assert_eq!(
            setup.detectors_used(),
            vec![Detector::D1, Detector::D3, Detector::D5]
        );
    }
}
