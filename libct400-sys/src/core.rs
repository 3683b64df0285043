#![allow(non_upper_case_globals)]
#![allow(non_camel_case_types)]
#![allow(non_snake_case)]
#![warn(clippy::pedantic)]
#![warn(clippy::all)]
#![allow(clippy::wildcard_imports)]
use enum_primitive::*;
use thiserror::Error;

#[cfg(not(feature = "no_api"))]
include!("bindings.rs");

#[cfg(feature = "no_api")]
include!("mock/mod.rs");

// The driver reports failure as a negative return value; everything else is
// a success (several entry points return counts on success).
macro_rules! wrap_call {
    ($call:ident $(, $arg:expr)* $(,)?) => {
			{log::trace!(concat!("call ", stringify!($call)));
			if unsafe { crate::core:: $call ($($arg,)*) } < 0 {
				Err($crate::core::Error::CallFailed(stringify!($call)))
			} else {
				Ok(())
			}}
		}
}

/// `CT400_ScanWaitEnd` writes its error description into a caller-provided
/// buffer of exactly this many bytes.
pub const ERROR_BUFFER_LEN: usize = 1024;

/// `CT400_Init` reports this through its out-parameter when the DSP firmware
/// on the instrument is too old for the installed driver.
pub const FIRMWARE_MISMATCH: i32 = -1001;

#[derive(Debug, Error)]
pub enum Error {
    #[error("CT400_Init failed (driver error {0})")]
    InitFailed(i32),

    #[error("DSP firmware version not compatible with the installed driver")]
    FirmwareMismatch,

    #[error("the CT400 is not connected")]
    NotConnected,

    #[error("driver call {0} returned failure")]
    CallFailed(&'static str),

    #[error("sweep failed with driver error {code}: {message}")]
    Scan { code: i32, message: String },

    #[error("file path is not representable as a C string")]
    InvalidPath(#[from] std::ffi::NulError),
}

pub type CtResult<T> = Result<T, Error>;

enum_from_primitive! {
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(C)]
pub enum LaserSource {
    TunicsPlus = 0,
    TunicsPurity,
    TunicsReference,
    TunicsT100sHp,
    TunicsT100r,
    JdsuSws,
    Agilent,
}
}

enum_from_primitive! {
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(C)]
pub enum LaserInput {
    In1 = 1,
    In2,
    In3,
    In4,
}
}

enum_from_primitive! {
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(C)]
pub enum Detector {
    D1 = 1,
    D2,
    D3,
    D4,
    D5,
}
}

impl LaserInput {
    /// Input port by its front-panel number (1 through 4).
    #[must_use]
    pub fn from_index(index: i64) -> Option<Self> {
        match index {
            1 => Some(LaserInput::In1),
            2 => Some(LaserInput::In2),
            3 => Some(LaserInput::In3),
            4 => Some(LaserInput::In4),
            _ => None,
        }
    }
}

impl Detector {
    /// Detector by its front-panel number (1 through 5, 5 being the BNC).
    #[must_use]
    pub fn from_index(index: i64) -> Option<Self> {
        match index {
            1 => Some(Detector::D1),
            2 => Some(Detector::D2),
            3 => Some(Detector::D3),
            4 => Some(Detector::D4),
            5 => Some(Detector::D5),
            _ => None,
        }
    }
}

enum_from_primitive! {
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(C)]
pub enum Ct400Type {
    Smf = 0,
    Pm13,
    Pm15,
}
}

enum_from_primitive! {
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(C)]
pub enum Unit {
    MilliWatt = 0,
    Dbm,
}
}

// ENABLE / DISABLE in the vendor header
#[must_use]
pub(crate) fn enable_flag(on: bool) -> ct400_enable_t {
    ct400_enable_t::from(on)
}
