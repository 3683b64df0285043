// Stand-in for CT400_lib, selected by the `no_api` feature. Call traces go
// through log::trace! with the time since the first CT400_Init, and enough
// configuration state is kept per handle that the point counts and trace
// arrays a program reads back are consistent with the sweep it configured.

macro_rules! fn_ok {
    ($call:ident $(, ($arg:ident : $t:ty))* $(,)?) => {
			#[allow(unused_variables)]
			pub unsafe fn $call (uiHandle: u64, $($arg : $t, )*) -> i32 {
				if !handle_valid(uiHandle) {
					return -1;
				}
				log::trace!(
					concat!("[{:.3}] ",  stringify!($call), $( concat!(" (", stringify!($arg), " = {:?})"), )*),
					API_START_TIME.elapsed().as_secs_f32()
					$(, $arg )*
				);
				0
			}
		}
}

use std::collections::HashMap;
use std::f64::consts::PI;
use std::ffi::CStr;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::sync::Mutex;
use std::time::Instant;

use lazy_static::lazy_static;

pub type ct400_laser_source_t = ::std::os::raw::c_int;
pub type ct400_laser_input_t = ::std::os::raw::c_int;
pub type ct400_detector_t = ::std::os::raw::c_int;
pub type ct400_enable_t = ::std::os::raw::c_int;
pub type ct400_unit_t = ::std::os::raw::c_int;

const FIRST_HANDLE: u64 = 0xC74_000;
const SYNC_EXTRA_POINTS: i32 = 40;
const DISCARD_POINTS: i32 = 57;
const FRINGE_PERIOD_NM: f64 = 0.8;

#[derive(Debug, Clone, Copy)]
struct MockLaser {
    min_nm: f64,
    max_nm: f64,
}

#[derive(Debug, Clone)]
struct MockState {
    laser: Option<MockLaser>,
    emitting: bool,
    cmd_wavelength_nm: f64,
    cmd_power_mw: f64,
    scan_power_mw: f64,
    scan_min_nm: f64,
    scan_max_nm: f64,
    resolution_pm: u32,
    detectors: [bool; 4],
    swept: bool,
}

impl Default for MockState {
    fn default() -> Self {
        MockState {
            laser: None,
            emitting: false,
            cmd_wavelength_nm: 1550.0,
            cmd_power_mw: 1.0,
            scan_power_mw: 1.0,
            scan_min_nm: 0.0,
            scan_max_nm: 0.0,
            resolution_pm: 10,
            detectors: [false; 4],
            swept: false,
        }
    }
}

impl MockState {
    fn resampled_points(&self) -> i32 {
        let span_pm = (self.scan_max_nm - self.scan_min_nm) * 1000.0;
        if span_pm <= 0.0 {
            return 0;
        }
        (span_pm / f64::from(self.resolution_pm)) as i32 + 1
    }

    fn sync_points(&self) -> i32 {
        self.resampled_points() + SYNC_EXTRA_POINTS
    }

    fn grid_nm(&self, points: i32, index: i32) -> f64 {
        if points <= 1 {
            return self.scan_min_nm;
        }
        let step = (self.scan_max_nm - self.scan_min_nm) / f64::from(points - 1);
        self.scan_min_nm + step * f64::from(index)
    }

    // A transmission fringe so traces look like a real component under test:
    // a cosine ripple around a per-detector insertion loss.
    fn detector_dbm(&self, detector: i32, wavelength_nm: f64) -> f64 {
        let base = -3.0 - 1.5 * f64::from(detector - 1);
        base + 2.5
            * ((wavelength_nm - self.scan_min_nm) * 2.0 * PI / FRINGE_PERIOD_NM
                + f64::from(detector))
            .cos()
    }

    fn detector_enabled(&self, detector: i32) -> bool {
        match detector {
            1 => true,
            2..=4 => self.detectors[(detector - 2) as usize],
            5 => self.detectors[3],
            _ => false,
        }
    }

    fn source_dbm(&self) -> f64 {
        10.0 * self.scan_power_mw.max(1e-6).log10()
    }

    fn ripple_dbm(&self, index: i32) -> f64 {
        self.source_dbm() + 0.05 * (f64::from(index) * 2.0 * PI / 64.0).cos()
    }

    fn line_positions_nm(&self) -> [f64; 2] {
        let span = self.scan_max_nm - self.scan_min_nm;
        [
            self.scan_min_nm + 0.3 * span,
            self.scan_min_nm + 0.6 * span,
        ]
    }
}

lazy_static! {
    static ref API_START_TIME: Instant = Instant::now();
    static ref INSTRUMENTS: Mutex<HashMap<u64, MockState>> = Mutex::new(HashMap::new());
    static ref NEXT_HANDLE: Mutex<u64> = Mutex::new(FIRST_HANDLE);
}

fn handle_valid(handle: u64) -> bool {
    INSTRUMENTS
        .lock()
        .expect("mock state lock poisoned")
        .contains_key(&handle)
}

fn with_state<T>(handle: u64, f: impl FnOnce(&mut MockState) -> T) -> Option<T> {
    INSTRUMENTS
        .lock()
        .expect("mock state lock poisoned")
        .get_mut(&handle)
        .map(f)
}

fn state_snapshot(handle: u64) -> Option<MockState> {
    with_state(handle, |state| state.clone())
}

fn trace_call(name: &str) {
    log::trace!("[{:.3}] {}", API_START_TIME.elapsed().as_secs_f32(), name);
}

unsafe fn fill_array(
    dst: *mut f64,
    requested: i32,
    available: i32,
    value: impl Fn(i32) -> f64,
) -> i32 {
    if dst.is_null() {
        return -1;
    }
    let n = requested.min(available).max(0);
    let out = std::slice::from_raw_parts_mut(dst, n as usize);
    for (i, slot) in out.iter_mut().enumerate() {
        *slot = value(i as i32);
    }
    n
}

pub unsafe fn CT400_Init(iError: *mut i32) -> u64 {
    lazy_static::initialize(&API_START_TIME);
    if !iError.is_null() {
        *iError = 0;
    }
    let handle = {
        let mut next = NEXT_HANDLE.lock().expect("mock state lock poisoned");
        let handle = *next;
        *next += 1;
        handle
    };
    INSTRUMENTS
        .lock()
        .expect("mock state lock poisoned")
        .insert(handle, MockState::default());
    log::trace!(
        "[{:.3}] CT400_Init -> handle {:#x}",
        API_START_TIME.elapsed().as_secs_f32(),
        handle
    );
    handle
}

pub unsafe fn CT400_CheckConnected(uiHandle: u64) -> i32 {
    i32::from(handle_valid(uiHandle))
}

pub unsafe fn CT400_GetNbInputs(uiHandle: u64) -> i32 {
    if handle_valid(uiHandle) {
        4
    } else {
        -1
    }
}

pub unsafe fn CT400_GetNbDetectors(uiHandle: u64) -> i32 {
    if handle_valid(uiHandle) {
        4
    } else {
        -1
    }
}

pub unsafe fn CT400_GetCT400Type(uiHandle: u64) -> i32 {
    if handle_valid(uiHandle) {
        0 // SMF
    } else {
        -1
    }
}

pub unsafe fn CT400_SetLaser(
    uiHandle: u64,
    eLaser: ct400_laser_input_t,
    eEnable: ct400_enable_t,
    iGPIBAdress: i32,
    eLaserType: ct400_laser_source_t,
    dMinWavelength: f64,
    dMaxWavelength: f64,
    Speed: i32,
) -> i32 {
    if dMinWavelength >= dMaxWavelength {
        return -1;
    }
    log::trace!(
        "[{:.3}] CT400_SetLaser (input = {}) (enable = {}) (gpib = {}) (source = {}) (range = {}..{} nm) (speed = {} nm/s)",
        API_START_TIME.elapsed().as_secs_f32(),
        eLaser,
        eEnable,
        iGPIBAdress,
        eLaserType,
        dMinWavelength,
        dMaxWavelength,
        Speed
    );
    with_state(uiHandle, |state| {
        state.laser = Some(MockLaser {
            min_nm: dMinWavelength,
            max_nm: dMaxWavelength,
        });
        state.emitting = eEnable != 0;
        0
    })
    .unwrap_or(-1)
}

pub unsafe fn CT400_SetSamplingResolution(uiHandle: u64, uiResolution: u32) -> i32 {
    if uiResolution == 0 || uiResolution > 250 {
        return -1;
    }
    trace_call("CT400_SetSamplingResolution");
    with_state(uiHandle, |state| {
        state.resolution_pm = uiResolution;
        0
    })
    .unwrap_or(-1)
}

pub unsafe fn CT400_SetScan(
    uiHandle: u64,
    dLaserPower: f64,
    dMinWavelength: f64,
    dMaxWavelength: f64,
) -> i32 {
    trace_call("CT400_SetScan");
    with_state(uiHandle, |state| {
        state.scan_power_mw = dLaserPower;
        state.scan_min_nm = dMinWavelength;
        state.scan_max_nm = dMaxWavelength;
        state.swept = false;
        0
    })
    .unwrap_or(-1)
}

pub unsafe fn CT400_SetDetectorArray(
    uiHandle: u64,
    eDect2: ct400_enable_t,
    eDect3: ct400_enable_t,
    eDect4: ct400_enable_t,
    eExt: ct400_enable_t,
) -> i32 {
    trace_call("CT400_SetDetectorArray");
    with_state(uiHandle, |state| {
        state.detectors = [eDect2 != 0, eDect3 != 0, eDect4 != 0, eExt != 0];
        0
    })
    .unwrap_or(-1)
}

fn_ok!(
    CT400_SetBNC,
    (eEnable: ct400_enable_t),
    (dAlpha: f64),
    (dBeta: f64),
    (eUnit: ct400_unit_t)
);
fn_ok!(CT400_SetExternalSynchronization, (eEnable: ct400_enable_t));
fn_ok!(CT400_SetExternalSynchronizationIN, (eEnable: ct400_enable_t));
fn_ok!(CT400_ScanStop);
fn_ok!(CT400_UpdateCalibration, (eDetector: ct400_detector_t));
fn_ok!(CT400_ResetCalibration);
fn_ok!(CT400_SwitchInput, (eLaser: ct400_laser_input_t));

pub unsafe fn CT400_ScanStart(uiHandle: u64) -> i32 {
    trace_call("CT400_ScanStart");
    with_state(uiHandle, |state| {
        if state.laser.is_none() {
            return -1;
        }
        state.swept = false;
        0
    })
    .unwrap_or(-1)
}

pub unsafe fn CT400_ScanWaitEnd(uiHandle: u64, tcError: *mut ::std::os::raw::c_char) -> i32 {
    trace_call("CT400_ScanWaitEnd");
    let verdict = with_state(uiHandle, |state| {
        if state.scan_min_nm >= state.scan_max_nm {
            return (1, "scan range is empty");
        }
        if let Some(laser) = state.laser {
            if state.scan_min_nm < laser.min_nm || state.scan_max_nm > laser.max_nm {
                return (2, "scan range exceeds the configured laser limits");
            }
        }
        state.swept = true;
        (0, "")
    });
    let Some((code, message)) = verdict else {
        return -1;
    };
    if !tcError.is_null() {
        let dst = std::slice::from_raw_parts_mut(tcError.cast::<u8>(), ERROR_BUFFER_LEN);
        let bytes = message.as_bytes();
        let n = bytes.len().min(dst.len() - 1);
        dst[..n].copy_from_slice(&bytes[..n]);
        dst[n] = 0;
    }
    code
}

pub unsafe fn CT400_GetNbDataPoints(
    uiHandle: u64,
    iDataPoints: *mut i32,
    iDiscardPoints: *mut i32,
) -> i32 {
    trace_call("CT400_GetNbDataPoints");
    let Some(state) = state_snapshot(uiHandle) else {
        return -1;
    };
    if !state.swept {
        return -1;
    }
    let points = state.sync_points();
    if !iDataPoints.is_null() {
        *iDataPoints = points;
    }
    if !iDiscardPoints.is_null() {
        *iDiscardPoints = DISCARD_POINTS;
    }
    points
}

pub unsafe fn CT400_GetNbDataPointsResampled(uiHandle: u64) -> i32 {
    trace_call("CT400_GetNbDataPointsResampled");
    let Some(state) = state_snapshot(uiHandle) else {
        return -1;
    };
    if state.swept {
        state.resampled_points()
    } else {
        -1
    }
}

pub unsafe fn CT400_GetNbLinesDetected(uiHandle: u64) -> i32 {
    trace_call("CT400_GetNbLinesDetected");
    let Some(state) = state_snapshot(uiHandle) else {
        return -1;
    };
    if state.swept {
        2
    } else {
        -1
    }
}

pub unsafe fn CT400_ScanGetLinesDetectionArray(
    uiHandle: u64,
    dArray: *mut f64,
    iArraySize: i32,
) -> i32 {
    trace_call("CT400_ScanGetLinesDetectionArray");
    let Some(state) = state_snapshot(uiHandle) else {
        return -1;
    };
    if !state.swept {
        return -1;
    }
    let lines = state.line_positions_nm();
    fill_array(dArray, iArraySize, 2, |i| lines[i as usize])
}

pub unsafe fn CT400_ScanGetWavelengthSyncArray(
    uiHandle: u64,
    dArray: *mut f64,
    iArraySize: i32,
) -> i32 {
    trace_call("CT400_ScanGetWavelengthSyncArray");
    let Some(state) = state_snapshot(uiHandle) else {
        return -1;
    };
    if !state.swept {
        return -1;
    }
    let n = state.sync_points();
    fill_array(dArray, iArraySize, n, |i| state.grid_nm(n, i))
}

pub unsafe fn CT400_ScanGetWavelengthResampledArray(
    uiHandle: u64,
    dArray: *mut f64,
    iArraySize: i32,
) -> i32 {
    trace_call("CT400_ScanGetWavelengthResampledArray");
    let Some(state) = state_snapshot(uiHandle) else {
        return -1;
    };
    if !state.swept {
        return -1;
    }
    let n = state.resampled_points();
    fill_array(dArray, iArraySize, n, |i| state.grid_nm(n, i))
}

pub unsafe fn CT400_ScanGetPowerSyncArray(uiHandle: u64, dArray: *mut f64, iArraySize: i32) -> i32 {
    trace_call("CT400_ScanGetPowerSyncArray");
    let Some(state) = state_snapshot(uiHandle) else {
        return -1;
    };
    if !state.swept {
        return -1;
    }
    fill_array(dArray, iArraySize, state.sync_points(), |i| {
        state.ripple_dbm(i)
    })
}

pub unsafe fn CT400_ScanGetPowerResampledArray(
    uiHandle: u64,
    dArray: *mut f64,
    iArraySize: i32,
) -> i32 {
    trace_call("CT400_ScanGetPowerResampledArray");
    let Some(state) = state_snapshot(uiHandle) else {
        return -1;
    };
    if !state.swept {
        return -1;
    }
    fill_array(dArray, iArraySize, state.resampled_points(), |i| {
        state.ripple_dbm(i)
    })
}

pub unsafe fn CT400_ScanGetDetectorArray(
    uiHandle: u64,
    eDetector: ct400_detector_t,
    dArray: *mut f64,
    iArraySize: i32,
) -> i32 {
    trace_call("CT400_ScanGetDetectorArray");
    let Some(state) = state_snapshot(uiHandle) else {
        return -1;
    };
    if !state.swept || !state.detector_enabled(eDetector) {
        return -1;
    }
    let n = state.sync_points();
    fill_array(dArray, iArraySize, n, |i| {
        state.detector_dbm(eDetector, state.grid_nm(n, i))
    })
}

pub unsafe fn CT400_ScanGetDetectorResampledArray(
    uiHandle: u64,
    eDetector: ct400_detector_t,
    dArray: *mut f64,
    iArraySize: i32,
) -> i32 {
    trace_call("CT400_ScanGetDetectorResampledArray");
    let Some(state) = state_snapshot(uiHandle) else {
        return -1;
    };
    if !state.swept || !state.detector_enabled(eDetector) {
        return -1;
    }
    let n = state.resampled_points();
    fill_array(dArray, iArraySize, n, |i| {
        state.detector_dbm(eDetector, state.grid_nm(n, i))
    })
}

unsafe fn save_columns(
    uiHandle: u64,
    pcPath: *mut ::std::os::raw::c_char,
    value: impl Fn(&MockState, i32, f64) -> Option<f64>,
) -> i32 {
    if pcPath.is_null() {
        return -1;
    }
    let path = CStr::from_ptr(pcPath).to_string_lossy().into_owned();
    let Some(state) = state_snapshot(uiHandle) else {
        return -1;
    };
    if !state.swept {
        return -1;
    }
    let Ok(file) = File::create(&path) else {
        return -1;
    };
    let mut out = BufWriter::new(file);
    let n = state.resampled_points();
    for i in 0..n {
        let lambda = state.grid_nm(n, i);
        let line = match value(&state, i, lambda) {
            Some(v) => format!("{lambda:.5}\t{v:.3}\n"),
            None => format!("{lambda:.5}\n"),
        };
        if out.write_all(line.as_bytes()).is_err() {
            return -1;
        }
    }
    if out.flush().is_err() {
        return -1;
    }
    0
}

pub unsafe fn CT400_ScanSaveWavelengthSyncFile(
    uiHandle: u64,
    pcPath: *mut ::std::os::raw::c_char,
) -> i32 {
    trace_call("CT400_ScanSaveWavelengthSyncFile");
    save_columns(uiHandle, pcPath, |_, _, _| None)
}

pub unsafe fn CT400_ScanSaveWavelengthResampledFile(
    uiHandle: u64,
    pcPath: *mut ::std::os::raw::c_char,
) -> i32 {
    trace_call("CT400_ScanSaveWavelengthResampledFile");
    save_columns(uiHandle, pcPath, |_, _, _| None)
}

pub unsafe fn CT400_ScanSavePowerSyncFile(
    uiHandle: u64,
    pcPath: *mut ::std::os::raw::c_char,
) -> i32 {
    trace_call("CT400_ScanSavePowerSyncFile");
    save_columns(uiHandle, pcPath, |state, i, _| Some(state.ripple_dbm(i)))
}

pub unsafe fn CT400_ScanSavePowerResampledFile(
    uiHandle: u64,
    pcPath: *mut ::std::os::raw::c_char,
) -> i32 {
    trace_call("CT400_ScanSavePowerResampledFile");
    save_columns(uiHandle, pcPath, |state, i, _| Some(state.ripple_dbm(i)))
}

pub unsafe fn CT400_ScanSaveDetectorFile(
    uiHandle: u64,
    eDetector: ct400_detector_t,
    pcPath: *mut ::std::os::raw::c_char,
) -> i32 {
    trace_call("CT400_ScanSaveDetectorFile");
    save_columns(uiHandle, pcPath, move |state, _, lambda| {
        Some(state.detector_dbm(eDetector, lambda))
    })
}

pub unsafe fn CT400_ScanSaveDetectorResampledFile(
    uiHandle: u64,
    eDetector: ct400_detector_t,
    pcPath: *mut ::std::os::raw::c_char,
) -> i32 {
    trace_call("CT400_ScanSaveDetectorResampledFile");
    save_columns(uiHandle, pcPath, move |state, _, lambda| {
        Some(state.detector_dbm(eDetector, lambda))
    })
}

pub unsafe fn CT400_ReadPowerDetectors(
    uiHandle: u64,
    Pout: *mut f64,
    P1: *mut f64,
    P2: *mut f64,
    P3: *mut f64,
    P4: *mut f64,
    Vext: *mut f64,
) -> i32 {
    trace_call("CT400_ReadPowerDetectors");
    let Some(state) = state_snapshot(uiHandle) else {
        return -1;
    };
    let wobble = 0.02 * (API_START_TIME.elapsed().as_secs_f64() * 2.0 * PI).cos();
    let out = if state.emitting {
        10.0 * state.cmd_power_mw.max(1e-6).log10()
    } else {
        -70.0
    };
    let dets = [P1, P2, P3, P4];
    for (i, det) in dets.into_iter().enumerate() {
        if det.is_null() {
            continue;
        }
        *det = if state.emitting {
            state.detector_dbm(i as i32 + 1, state.cmd_wavelength_nm) + wobble
        } else {
            -70.0 - i as f64
        };
    }
    if !Pout.is_null() {
        *Pout = out + wobble;
    }
    if !Vext.is_null() {
        *Vext = 0.42;
    }
    0
}

pub unsafe fn CT400_CmdLaser(
    uiHandle: u64,
    eLaser: ct400_laser_input_t,
    eEnable: ct400_enable_t,
    dWavelength: f64,
    dPower: f64,
) -> i32 {
    let _ = eLaser;
    trace_call("CT400_CmdLaser");
    with_state(uiHandle, |state| {
        state.emitting = eEnable != 0;
        state.cmd_wavelength_nm = dWavelength;
        state.cmd_power_mw = dPower;
        0
    })
    .unwrap_or(-1)
}

pub unsafe fn CT400_Close(uiHandle: u64) -> i32 {
    trace_call("CT400_Close");
    if INSTRUMENTS
        .lock()
        .expect("mock state lock poisoned")
        .remove(&uiHandle)
        .is_some()
    {
        0
    } else {
        -1
    }
}
