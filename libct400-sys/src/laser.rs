#![warn(clippy::pedantic)]
#![warn(clippy::all)]
#![allow(clippy::missing_errors_doc)]
use crate::core;
use crate::core::{CtResult, LaserInput, LaserSource};
use crate::tester::Ct400;

/// Everything the driver needs to know about the source patched into one of
/// the four laser inputs. Defaults match a Tunics T100S-HP on input 1.
#[derive(Debug, Clone, Copy)]
pub struct LaserSettings {
    pub input: LaserInput,
    pub gpib_address: i32,
    pub source: LaserSource,
    pub min_wavelength_nm: f64,
    pub max_wavelength_nm: f64,
    pub sweep_speed_nm_s: i32,
}

impl Default for LaserSettings {
    fn default() -> Self {
        LaserSettings {
            input: LaserInput::In1,
            gpib_address: 10,
            source: LaserSource::TunicsT100sHp,
            min_wavelength_nm: 1500.0,
            max_wavelength_nm: 1630.0,
            sweep_speed_nm_s: 100,
        }
    }
}

#[derive(Debug)]
pub struct Laser<'a> {
    ct: &'a Ct400,
    pub settings: LaserSettings,
}

impl<'a> Laser<'a> {
    #[must_use]
    pub fn new(ct: &'a Ct400, settings: LaserSettings) -> Self {
        Laser { ct, settings }
    }

    /// Registers the source with the driver. A sweep or `command` addressed
    /// at this input is undefined until the driver has seen the source
    /// description once.
    pub fn configure(&self, enable: bool) -> CtResult<()> {
        wrap_call!(
            CT400_SetLaser,
            self.ct.handle(),
            self.settings.input as core::ct400_laser_input_t,
            core::enable_flag(enable),
            self.settings.gpib_address,
            self.settings.source as core::ct400_laser_source_t,
            self.settings.min_wavelength_nm,
            self.settings.max_wavelength_nm,
            self.settings.sweep_speed_nm_s,
        )
    }

    /// Pilots the source directly: output on or off, parked at the given
    /// wavelength and power.
    pub fn command(&self, enable: bool, wavelength_nm: f64, power_mw: f64) -> CtResult<()> {
        wrap_call!(
            CT400_CmdLaser,
            self.ct.handle(),
            self.settings.input as core::ct400_laser_input_t,
            core::enable_flag(enable),
            wavelength_nm,
            power_mw,
        )
    }

    /// Routes the optical input switch to this laser's port.
    pub fn select(&self) -> CtResult<()> {
        wrap_call!(
            CT400_SwitchInput,
            self.ct.handle(),
            self.settings.input as core::ct400_laser_input_t,
        )
    }
}
