#![warn(clippy::pedantic)]
#![warn(clippy::all)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::cast_sign_loss)]
use std::ffi::{CStr, CString};
use std::path::Path;
use std::ptr::addr_of_mut;

use crate::core;
use crate::core::{CtResult, Detector, Error, Unit};
use crate::laser::LaserSettings;
use crate::tester::Ct400;

pub const MIN_RESOLUTION_PM: u32 = 1;
pub const MAX_RESOLUTION_PM: u32 = 250;
pub const MIN_SPEED_NM_S: i32 = 10;
pub const MAX_SPEED_NM_S: i32 = 100;

/// External BNC input handling during a sweep. When conversion is enabled
/// the driver maps the voltage onto optical power as `alpha * x + beta`;
/// otherwise the input is recorded as a raw voltage.
#[derive(Debug, Clone, Copy)]
pub struct BncSetup {
    pub convert_to_power: bool,
    pub alpha: f64,
    pub beta: f64,
    pub unit: Unit,
}

impl Default for BncSetup {
    fn default() -> Self {
        BncSetup {
            convert_to_power: false,
            alpha: 0.0,
            beta: 0.0,
            unit: Unit::MilliWatt,
        }
    }
}

/// Point counts reported by the driver once a sweep has completed.
/// `discard_points` is the index of the first valid top pulse; samples
/// before it never appear in the sync arrays.
#[derive(Debug, Default, Clone, Copy)]
pub struct PointCounts {
    pub data_points: i32,
    pub discard_points: i32,
    pub resampled_points: i32,
}

/// Stages a sweep configuration and writes it to the driver in the call
/// order the driver requires. `apply` leaves the instrument armed; nothing
/// moves until `Scan::run`.
#[derive(Debug)]
pub struct ScanBuilder<'a> {
    ct: &'a Ct400,
    laser: LaserSettings,
    power_mw: f64,
    start_nm: f64,
    stop_nm: f64,
    resolution_pm: u32,
    enable_d2: bool,
    enable_d3: bool,
    enable_d4: bool,
    enable_ext: bool,
    bnc: BncSetup,
    sync_out: bool,
    sync_in: bool,
}

impl<'a> ScanBuilder<'a> {
    #[must_use]
    pub fn new(ct: &'a Ct400, laser: LaserSettings) -> Self {
        ScanBuilder {
            ct,
            laser,
            power_mw: 1.0,
            start_nm: laser.min_wavelength_nm,
            stop_nm: laser.max_wavelength_nm,
            resolution_pm: MIN_RESOLUTION_PM,
            enable_d2: false,
            enable_d3: false,
            enable_d4: false,
            enable_ext: false,
            bnc: BncSetup::default(),
            sync_out: false,
            sync_in: false,
        }
    }

    #[must_use]
    pub fn power_mw(mut self, power_mw: f64) -> Self {
        self.power_mw = power_mw;
        self
    }

    #[must_use]
    pub fn range_nm(mut self, start_nm: f64, stop_nm: f64) -> Self {
        self.start_nm = start_nm;
        self.stop_nm = stop_nm;
        self
    }

    #[must_use]
    pub fn resolution_pm(mut self, resolution_pm: u32) -> Self {
        self.resolution_pm = resolution_pm.clamp(MIN_RESOLUTION_PM, MAX_RESOLUTION_PM);
        self
    }

    /// Detector 1 always records; 2 through 4 and the BNC input opt in here.
    #[must_use]
    pub fn detectors(mut self, d2: bool, d3: bool, d4: bool, ext: bool) -> Self {
        self.enable_d2 = d2;
        self.enable_d3 = d3;
        self.enable_d4 = d4;
        self.enable_ext = ext;
        self
    }

    #[must_use]
    pub fn bnc(mut self, bnc: BncSetup) -> Self {
        self.bnc = bnc;
        self
    }

    #[must_use]
    pub fn external_sync(mut self, output: bool, input: bool) -> Self {
        self.sync_out = output;
        self.sync_in = input;
        self
    }

    /// Writes the staged configuration to the driver.
    ///
    /// # Errors
    /// `NotConnected` if the instrument dropped off the bus, otherwise the
    /// first driver call that refuses the configuration.
    pub fn apply(self) -> CtResult<Scan<'a>> {
        self.ct.ensure_connected()?;
        let h = self.ct.handle();
        wrap_call!(
            CT400_SetLaser,
            h,
            self.laser.input as core::ct400_laser_input_t,
            core::enable_flag(true),
            self.laser.gpib_address,
            self.laser.source as core::ct400_laser_source_t,
            self.laser.min_wavelength_nm,
            self.laser.max_wavelength_nm,
            self.laser.sweep_speed_nm_s,
        )?;
        wrap_call!(CT400_SetScan, h, self.power_mw, self.start_nm, self.stop_nm)?;
        wrap_call!(CT400_SetSamplingResolution, h, self.resolution_pm)?;
        wrap_call!(
            CT400_SetDetectorArray,
            h,
            core::enable_flag(self.enable_d2),
            core::enable_flag(self.enable_d3),
            core::enable_flag(self.enable_d4),
            core::enable_flag(self.enable_ext),
        )?;
        wrap_call!(
            CT400_SetBNC,
            h,
            core::enable_flag(self.bnc.convert_to_power),
            self.bnc.alpha,
            self.bnc.beta,
            self.bnc.unit as core::ct400_unit_t,
        )?;
        wrap_call!(
            CT400_SetExternalSynchronization,
            h,
            core::enable_flag(self.sync_out),
        )?;
        wrap_call!(
            CT400_SetExternalSynchronizationIN,
            h,
            core::enable_flag(self.sync_in),
        )?;
        Ok(Scan { ct: self.ct })
    }
}

/// A configured sweep that has not run yet.
#[derive(Debug)]
pub struct Scan<'a> {
    ct: &'a Ct400,
}

impl<'a> Scan<'a> {
    /// Runs the sweep to completion. Blocks inside the driver until the
    /// laser has covered the configured range.
    ///
    /// # Errors
    /// `Error::Scan` carries the driver's error code and its description
    /// from the 1024-byte message buffer.
    pub fn run(self) -> CtResult<Sweep<'a>> {
        wrap_call!(CT400_ScanStart, self.ct.handle())?;
        let mut buf = [0u8; core::ERROR_BUFFER_LEN];
        let code = unsafe { core::CT400_ScanWaitEnd(self.ct.handle(), buf.as_mut_ptr().cast()) };
        if code < 0 {
            return Err(Error::CallFailed("CT400_ScanWaitEnd"));
        }
        if code != 0 {
            let message = CStr::from_bytes_until_nul(&buf)
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            return Err(Error::Scan { code, message });
        }
        let counts = read_counts(self.ct)?;
        Ok(Sweep {
            ct: self.ct,
            counts,
        })
    }

    /// Aborts a sweep armed or left over on the instrument.
    pub fn abort(self) -> CtResult<()> {
        wrap_call!(CT400_ScanStop, self.ct.handle())
    }
}

fn read_counts(ct: &Ct400) -> CtResult<PointCounts> {
    let mut data = 0i32;
    let mut discard = 0i32;
    wrap_call!(
        CT400_GetNbDataPoints,
        ct.handle(),
        addr_of_mut!(data),
        addr_of_mut!(discard),
    )?;
    let resampled = unsafe { core::CT400_GetNbDataPointsResampled(ct.handle()) };
    if resampled < 0 {
        return Err(Error::CallFailed("CT400_GetNbDataPointsResampled"));
    }
    Ok(PointCounts {
        data_points: data,
        discard_points: discard,
        resampled_points: resampled,
    })
}

/// A completed sweep. Accessors copy the driver's fixed-size output buffers
/// into freshly allocated vectors sized from the reported counts.
#[derive(Debug)]
pub struct Sweep<'a> {
    ct: &'a Ct400,
    counts: PointCounts,
}

impl Sweep<'_> {
    #[must_use]
    pub fn counts(&self) -> PointCounts {
        self.counts
    }

    pub fn wavelength_sync(&self) -> CtResult<Vec<f64>> {
        let n = self.counts.data_points;
        let mut out = vec![0.0f64; n.max(0) as usize];
        let got = unsafe {
            core::CT400_ScanGetWavelengthSyncArray(self.ct.handle(), out.as_mut_ptr(), n)
        };
        if got < 0 {
            return Err(Error::CallFailed("CT400_ScanGetWavelengthSyncArray"));
        }
        out.truncate(got as usize);
        Ok(out)
    }

    pub fn wavelength_resampled(&self) -> CtResult<Vec<f64>> {
        let n = self.counts.resampled_points;
        let mut out = vec![0.0f64; n.max(0) as usize];
        let got = unsafe {
            core::CT400_ScanGetWavelengthResampledArray(self.ct.handle(), out.as_mut_ptr(), n)
        };
        if got < 0 {
            return Err(Error::CallFailed("CT400_ScanGetWavelengthResampledArray"));
        }
        out.truncate(got as usize);
        Ok(out)
    }

    pub fn power_sync(&self) -> CtResult<Vec<f64>> {
        let n = self.counts.data_points;
        let mut out = vec![0.0f64; n.max(0) as usize];
        let got =
            unsafe { core::CT400_ScanGetPowerSyncArray(self.ct.handle(), out.as_mut_ptr(), n) };
        if got < 0 {
            return Err(Error::CallFailed("CT400_ScanGetPowerSyncArray"));
        }
        out.truncate(got as usize);
        Ok(out)
    }

    pub fn power_resampled(&self) -> CtResult<Vec<f64>> {
        let n = self.counts.resampled_points;
        let mut out = vec![0.0f64; n.max(0) as usize];
        let got = unsafe {
            core::CT400_ScanGetPowerResampledArray(self.ct.handle(), out.as_mut_ptr(), n)
        };
        if got < 0 {
            return Err(Error::CallFailed("CT400_ScanGetPowerResampledArray"));
        }
        out.truncate(got as usize);
        Ok(out)
    }

    pub fn detector_sync(&self, detector: Detector) -> CtResult<Vec<f64>> {
        let n = self.counts.data_points;
        let mut out = vec![0.0f64; n.max(0) as usize];
        let got = unsafe {
            core::CT400_ScanGetDetectorArray(
                self.ct.handle(),
                detector as core::ct400_detector_t,
                out.as_mut_ptr(),
                n,
            )
        };
        if got < 0 {
            return Err(Error::CallFailed("CT400_ScanGetDetectorArray"));
        }
        out.truncate(got as usize);
        Ok(out)
    }

    pub fn detector_resampled(&self, detector: Detector) -> CtResult<Vec<f64>> {
        let n = self.counts.resampled_points;
        let mut out = vec![0.0f64; n.max(0) as usize];
        let got = unsafe {
            core::CT400_ScanGetDetectorResampledArray(
                self.ct.handle(),
                detector as core::ct400_detector_t,
                out.as_mut_ptr(),
                n,
            )
        };
        if got < 0 {
            return Err(Error::CallFailed("CT400_ScanGetDetectorResampledArray"));
        }
        out.truncate(got as usize);
        Ok(out)
    }

    /// Spectral lines found by the driver's heterodyne detection, in nm.
    /// Empty unless a second source was connected for the sweep.
    pub fn lines_detected(&self) -> CtResult<Vec<f64>> {
        let n = unsafe { core::CT400_GetNbLinesDetected(self.ct.handle()) };
        if n < 0 {
            return Err(Error::CallFailed("CT400_GetNbLinesDetected"));
        }
        let mut out = vec![0.0f64; n as usize];
        let got = unsafe {
            core::CT400_ScanGetLinesDetectionArray(self.ct.handle(), out.as_mut_ptr(), n)
        };
        if got < 0 {
            return Err(Error::CallFailed("CT400_ScanGetLinesDetectionArray"));
        }
        out.truncate(got as usize);
        Ok(out)
    }

    pub fn save_wavelength_sync(&self, path: &Path) -> CtResult<()> {
        let c = path_cstring(path)?;
        wrap_call!(
            CT400_ScanSaveWavelengthSyncFile,
            self.ct.handle(),
            c.as_ptr().cast_mut(),
        )
    }

    pub fn save_wavelength_resampled(&self, path: &Path) -> CtResult<()> {
        let c = path_cstring(path)?;
        wrap_call!(
            CT400_ScanSaveWavelengthResampledFile,
            self.ct.handle(),
            c.as_ptr().cast_mut(),
        )
    }

    pub fn save_power_sync(&self, path: &Path) -> CtResult<()> {
        let c = path_cstring(path)?;
        wrap_call!(
            CT400_ScanSavePowerSyncFile,
            self.ct.handle(),
            c.as_ptr().cast_mut(),
        )
    }

    pub fn save_power_resampled(&self, path: &Path) -> CtResult<()> {
        let c = path_cstring(path)?;
        wrap_call!(
            CT400_ScanSavePowerResampledFile,
            self.ct.handle(),
            c.as_ptr().cast_mut(),
        )
    }

    pub fn save_detector_sync(&self, detector: Detector, path: &Path) -> CtResult<()> {
        let c = path_cstring(path)?;
        wrap_call!(
            CT400_ScanSaveDetectorFile,
            self.ct.handle(),
            detector as core::ct400_detector_t,
            c.as_ptr().cast_mut(),
        )
    }

    pub fn save_detector_resampled(&self, detector: Detector, path: &Path) -> CtResult<()> {
        let c = path_cstring(path)?;
        wrap_call!(
            CT400_ScanSaveDetectorResampledFile,
            self.ct.handle(),
            detector as core::ct400_detector_t,
            c.as_ptr().cast_mut(),
        )
    }
}

// The driver takes char* but only reads the path.
fn path_cstring(path: &Path) -> CtResult<CString> {
    Ok(CString::new(path.to_string_lossy().into_owned())?)
}

#[cfg(all(test, feature = "no_api"))]
mod tests {
    use super::*;
    use crate::core::LaserInput;

    fn settings() -> LaserSettings {
        LaserSettings {
            input: LaserInput::In2,
            ..LaserSettings::default()
        }
    }

    #[test]
    fn sweep_counts_follow_configuration() {
        let ct = Ct400::init().unwrap();
        let sweep = ScanBuilder::new(&ct, settings())
            .power_mw(5.0)
            .range_nm(1550.0, 1560.0)
            .resolution_pm(250)
            .apply()
            .unwrap()
            .run()
            .unwrap();

        let counts = sweep.counts();
        // 10 nm at 250 pm, inclusive of both ends
        assert_eq!(counts.resampled_points, 41);
        assert!(counts.data_points > counts.resampled_points);
        assert!(counts.discard_points > 0);

        let wl = sweep.wavelength_resampled().unwrap();
        assert_eq!(wl.len(), 41);
        assert!((wl[0] - 1550.0).abs() < 1e-9);
        assert!((wl[40] - 1560.0).abs() < 1e-9);
        assert!(wl.windows(2).all(|w| w[1] > w[0]));

        let trace = sweep.detector_resampled(Detector::D1).unwrap();
        assert_eq!(trace.len(), 41);
        assert!(trace.iter().all(|p| p.is_finite() && *p < 0.0));

        assert_eq!(sweep.wavelength_sync().unwrap().len() as i32, counts.data_points);
    }

    #[test]
    fn sweep_outside_laser_limits_reports_driver_error() {
        let ct = Ct400::init().unwrap();
        let err = ScanBuilder::new(&ct, settings())
            .range_nm(1500.0, 1700.0)
            .apply()
            .unwrap()
            .run()
            .unwrap_err();
        match err {
            Error::Scan { code, message } => {
                assert_ne!(code, 0);
                assert!(!message.is_empty());
            }
            other => panic!("expected scan error, got {other:?}"),
        }
    }

    #[test]
    fn disabled_detector_refuses_trace() {
        let ct = Ct400::init().unwrap();
        let sweep = ScanBuilder::new(&ct, settings())
            .range_nm(1550.0, 1551.0)
            .resolution_pm(100)
            .apply()
            .unwrap()
            .run()
            .unwrap();
        assert!(sweep.detector_resampled(Detector::D3).is_err());
    }
}
