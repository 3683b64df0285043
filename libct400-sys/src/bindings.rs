/* Declarations for CT400_lib, transcribed from the vendor's CT400_Lib.h.
 * Kept in the layout bindgen emits so the file can be regenerated against a
 * newer header drop. The DLL exports __stdcall entry points, hence
 * extern "system". */

pub type ct400_laser_source_t = ::std::os::raw::c_int;
pub type ct400_laser_input_t = ::std::os::raw::c_int;
pub type ct400_detector_t = ::std::os::raw::c_int;
pub type ct400_enable_t = ::std::os::raw::c_int;
pub type ct400_unit_t = ::std::os::raw::c_int;

extern "system" {
    pub fn CT400_Init(iError: *mut i32) -> u64;

    pub fn CT400_CheckConnected(uiHandle: u64) -> i32;

    pub fn CT400_GetNbInputs(uiHandle: u64) -> i32;

    pub fn CT400_GetNbDetectors(uiHandle: u64) -> i32;

    pub fn CT400_GetCT400Type(uiHandle: u64) -> i32;

    pub fn CT400_SetLaser(
        uiHandle: u64,
        eLaser: ct400_laser_input_t,
        eEnable: ct400_enable_t,
        iGPIBAdress: i32,
        eLaserType: ct400_laser_source_t,
        dMinWavelength: f64,
        dMaxWavelength: f64,
        Speed: i32,
    ) -> i32;

    pub fn CT400_SetSamplingResolution(uiHandle: u64, uiResolution: u32) -> i32;

    pub fn CT400_SetScan(
        uiHandle: u64,
        dLaserPower: f64,
        dMinWavelength: f64,
        dMaxWavelength: f64,
    ) -> i32;

    pub fn CT400_SetDetectorArray(
        uiHandle: u64,
        eDect2: ct400_enable_t,
        eDect3: ct400_enable_t,
        eDect4: ct400_enable_t,
        eExt: ct400_enable_t,
    ) -> i32;

    pub fn CT400_SetBNC(
        uiHandle: u64,
        eEnable: ct400_enable_t,
        dAlpha: f64,
        dBeta: f64,
        eUnit: ct400_unit_t,
    ) -> i32;

    pub fn CT400_SetExternalSynchronization(uiHandle: u64, eEnable: ct400_enable_t) -> i32;

    pub fn CT400_SetExternalSynchronizationIN(uiHandle: u64, eEnable: ct400_enable_t) -> i32;

    pub fn CT400_ScanStart(uiHandle: u64) -> i32;

    pub fn CT400_ScanStop(uiHandle: u64) -> i32;

    pub fn CT400_ScanWaitEnd(uiHandle: u64, tcError: *mut ::std::os::raw::c_char) -> i32;

    pub fn CT400_GetNbDataPoints(
        uiHandle: u64,
        iDataPoints: *mut i32,
        iDiscardPoints: *mut i32,
    ) -> i32;

    pub fn CT400_GetNbDataPointsResampled(uiHandle: u64) -> i32;

    pub fn CT400_GetNbLinesDetected(uiHandle: u64) -> i32;

    pub fn CT400_ScanGetLinesDetectionArray(
        uiHandle: u64,
        dArray: *mut f64,
        iArraySize: i32,
    ) -> i32;

    pub fn CT400_ScanGetWavelengthSyncArray(
        uiHandle: u64,
        dArray: *mut f64,
        iArraySize: i32,
    ) -> i32;

    pub fn CT400_ScanGetWavelengthResampledArray(
        uiHandle: u64,
        dArray: *mut f64,
        iArraySize: i32,
    ) -> i32;

    pub fn CT400_ScanGetPowerSyncArray(uiHandle: u64, dArray: *mut f64, iArraySize: i32) -> i32;

    pub fn CT400_ScanGetPowerResampledArray(
        uiHandle: u64,
        dArray: *mut f64,
        iArraySize: i32,
    ) -> i32;

    pub fn CT400_ScanGetDetectorArray(
        uiHandle: u64,
        eDetector: ct400_detector_t,
        dArray: *mut f64,
        iArraySize: i32,
    ) -> i32;

    pub fn CT400_ScanGetDetectorResampledArray(
        uiHandle: u64,
        eDetector: ct400_detector_t,
        dArray: *mut f64,
        iArraySize: i32,
    ) -> i32;

    pub fn CT400_ScanSaveWavelengthSyncFile(
        uiHandle: u64,
        pcPath: *mut ::std::os::raw::c_char,
    ) -> i32;

    pub fn CT400_ScanSaveWavelengthResampledFile(
        uiHandle: u64,
        pcPath: *mut ::std::os::raw::c_char,
    ) -> i32;

    pub fn CT400_ScanSavePowerSyncFile(uiHandle: u64, pcPath: *mut ::std::os::raw::c_char) -> i32;

    pub fn CT400_ScanSavePowerResampledFile(
        uiHandle: u64,
        pcPath: *mut ::std::os::raw::c_char,
    ) -> i32;

    pub fn CT400_ScanSaveDetectorFile(
        uiHandle: u64,
        eDetector: ct400_detector_t,
        pcPath: *mut ::std::os::raw::c_char,
    ) -> i32;

    pub fn CT400_ScanSaveDetectorResampledFile(
        uiHandle: u64,
        eDetector: ct400_detector_t,
        pcPath: *mut ::std::os::raw::c_char,
    ) -> i32;

    pub fn CT400_UpdateCalibration(uiHandle: u64, eDetector: ct400_detector_t) -> i32;

    pub fn CT400_ResetCalibration(uiHandle: u64) -> i32;

    pub fn CT400_SwitchInput(uiHandle: u64, eLaser: ct400_laser_input_t) -> i32;

    pub fn CT400_ReadPowerDetectors(
        uiHandle: u64,
        Pout: *mut f64,
        P1: *mut f64,
        P2: *mut f64,
        P3: *mut f64,
        P4: *mut f64,
        Vext: *mut f64,
    ) -> i32;

    pub fn CT400_CmdLaser(
        uiHandle: u64,
        eLaser: ct400_laser_input_t,
        eEnable: ct400_enable_t,
        dWavelength: f64,
        dPower: f64,
    ) -> i32;

    pub fn CT400_Close(uiHandle: u64) -> i32;
}
