#![warn(clippy::pedantic)]
#![warn(clippy::all)]
#![allow(clippy::missing_errors_doc)]
use std::ptr::addr_of_mut;

use enum_primitive::FromPrimitive;

use crate::core;
use crate::core::{Ct400Type, CtResult, Detector, Error};

/// Owns the driver handle produced by `CT400_Init`. Every other wrapper type
/// borrows a `Ct400`, so no driver call can outlive the session, and the
/// handle is released exactly once on drop.
#[derive(Debug)]
pub struct Ct400 {
    handle: u64,
}

/// One spot reading of all detectors: the instrument output, the four
/// internal detectors (dBm), and the raw voltage on the external BNC input.
#[derive(Debug, Default, Clone, Copy)]
pub struct PowerReadings {
    pub out_dbm: f64,
    pub p1_dbm: f64,
    pub p2_dbm: f64,
    pub p3_dbm: f64,
    pub p4_dbm: f64,
    pub ext_v: f64,
}

impl PowerReadings {
    /// Reading for one internal detector.
    #[must_use]
    pub fn detector_dbm(&self, detector: Detector) -> f64 {
        match detector {
            Detector::D1 => self.p1_dbm,
            Detector::D2 => self.p2_dbm,
            Detector::D3 => self.p3_dbm,
            Detector::D4 => self.p4_dbm,
            Detector::D5 => self.ext_v,
        }
    }
}

impl Ct400 {
    /// Initialises the driver and claims a handle.
    ///
    /// # Errors
    /// `FirmwareMismatch` if the instrument's DSP firmware is too old for
    /// the installed driver, `InitFailed` with the driver's code for any
    /// other initialisation failure.
    pub fn init() -> CtResult<Self> {
        let mut err: i32 = 0;
        let handle = unsafe { core::CT400_Init(addr_of_mut!(err)) };
        if handle == 0 {
            if err == core::FIRMWARE_MISMATCH {
                return Err(Error::FirmwareMismatch);
            }
            return Err(Error::InitFailed(err));
        }
        if err != 0 {
            log::warn!("CT400_Init reported warning {err}");
        }
        Ok(Ct400 { handle })
    }

    pub(crate) fn handle(&self) -> u64 {
        self.handle
    }

    #[must_use]
    pub fn check_connected(&self) -> bool {
        unsafe { core::CT400_CheckConnected(self.handle) == 1 }
    }

    pub fn ensure_connected(&self) -> CtResult<()> {
        if self.check_connected() {
            Ok(())
        } else {
            Err(Error::NotConnected)
        }
    }

    pub fn nb_inputs(&self) -> CtResult<i32> {
        let n = unsafe { core::CT400_GetNbInputs(self.handle) };
        if n < 0 {
            return Err(Error::CallFailed("CT400_GetNbInputs"));
        }
        Ok(n)
    }

    pub fn nb_detectors(&self) -> CtResult<i32> {
        let n = unsafe { core::CT400_GetNbDetectors(self.handle) };
        if n < 0 {
            return Err(Error::CallFailed("CT400_GetNbDetectors"));
        }
        Ok(n)
    }

    /// The fibre option the instrument was built with (SMF, PM13 or PM15).
    pub fn ct400_type(&self) -> CtResult<Ct400Type> {
        let t = unsafe { core::CT400_GetCT400Type(self.handle) };
        Ct400Type::from_i32(t).ok_or(Error::CallFailed("CT400_GetCT400Type"))
    }

    /// Reads the instantaneous power on the output and all detectors.
    pub fn read_power_detectors(&self) -> CtResult<PowerReadings> {
        let mut r = PowerReadings::default();
        wrap_call!(
            CT400_ReadPowerDetectors,
            self.handle,
            addr_of_mut!(r.out_dbm),
            addr_of_mut!(r.p1_dbm),
            addr_of_mut!(r.p2_dbm),
            addr_of_mut!(r.p3_dbm),
            addr_of_mut!(r.p4_dbm),
            addr_of_mut!(r.ext_v),
        )?;
        Ok(r)
    }

    /// Re-references a detector against the trace recorded by the last
    /// sweep, cancelling the loss of everything upstream of the component
    /// under test. The output must have been patched straight into that
    /// detector for the preceding sweep.
    pub fn update_calibration(&self, detector: Detector) -> CtResult<()> {
        wrap_call!(
            CT400_UpdateCalibration,
            self.handle,
            detector as core::ct400_detector_t,
        )
    }

    /// Discards every offset applied through `update_calibration`.
    pub fn reset_calibration(&self) -> CtResult<()> {
        wrap_call!(CT400_ResetCalibration, self.handle)
    }
}

impl Drop for Ct400 {
    fn drop(&mut self) {
        log::trace!("closing CT400 handle {:#x}", self.handle);
        unsafe { core::CT400_Close(self.handle) };
    }
}
