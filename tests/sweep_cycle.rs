// Full configure-sweep-retrieve cycles against the driver stand-in. On a
// machine with the instrument the same code paths run against the real DLL,
// which is why everything here stays behind the mock-only cfg.
#![cfg(not(windows))]

use std::fs;
use std::path::PathBuf;

use ct400ctl::bench::Bench;
use ct400ctl::configs;
use libct400_sys::core::Detector;
use libct400_sys::Ct400;

fn scratch_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("ct400ctl-{}-{tag}", std::process::id()));
    fs::create_dir_all(&dir).expect("scratch directory");
    dir
}

#[test]
fn sweep_writes_record_and_driver_files() {
    let ct = Ct400::init().unwrap();
    let mut bench = Bench::new(ct);
    bench.sweep.set_range_nm(1550.0, 1560.0);
    bench.sweep.set_resolution_pm(250);
    bench.sweep.enable_d2 = true;
    bench.output.directory = scratch_dir("sweep");

    let record = bench.run_sweep().unwrap().clone();
    assert_eq!(record.counts.resampled_points, 41);
    assert_eq!(record.wavelength_nm.len(), 41);
    assert_eq!(record.detectors.len(), 2);
    assert_eq!(record.detectors[0].0, Detector::D1);
    assert_eq!(record.detectors[0].1.len(), 41);
    assert_eq!(record.lines_nm.len(), 2);
    assert!(record
        .wavelength_nm
        .windows(2)
        .all(|w| w[1] > w[0]));

    let stem = record.file_stem();
    let record_path = bench.output.directory.join(format!("{stem}_sweep.txt"));
    let text = fs::read_to_string(&record_path).expect("sweep record file");
    assert!(text.starts_with("wavelength_nm\tD1_dbm\tD2_dbm"));
    let data_rows = text
        .lines()
        .skip(1)
        .filter(|l| !l.starts_with('#'))
        .count();
    assert_eq!(data_rows, 41);

    for suffix in [
        "lambda_sync",
        "lambda_resampled",
        "power_sync",
        "power_resampled",
        "detector1_resampled",
        "detector2_resampled",
    ] {
        let path = bench.output.directory.join(format!("{stem}_{suffix}.txt"));
        assert!(path.exists(), "missing driver file {}", path.display());
    }
    let driver_lambda = fs::read_to_string(
        bench
            .output
            .directory
            .join(format!("{stem}_lambda_resampled.txt")),
    )
    .unwrap();
    assert_eq!(driver_lambda.lines().count(), 41);

    fs::remove_dir_all(&bench.output.directory).ok();
}

#[test]
fn config_file_builds_a_working_bench() {
    let dir = scratch_dir("config");
    let cfg: toml::Value = toml::from_str(&format!(
        r#"
        [laser]
        gpib_address = 12
        input = 2
        source = "t100s-hp"
        default_power_mw = 5.0

        [sweep]
        power_mw = 5.0
        start_nm = 1551.0
        stop_nm = 1552.0
        resolution_pm = 100
        park_laser = true

        [detectors]
        detector_4 = true

        [output]
        directory = "{}"
        driver_files = false
    "#,
        dir.display()
    ))
    .unwrap();

    let mut bench = configs::bench_from_config(&cfg, Ct400::init().unwrap()).unwrap();
    assert_eq!(bench.default_power_mw, 5.0);
    assert_eq!(bench.sweep.resolution_pm(), 100);

    let record = bench.run_sweep().unwrap();
    // 1 nm at 100 pm, inclusive
    assert_eq!(record.counts.resampled_points, 11);
    assert_eq!(record.detectors.len(), 2);
    assert_eq!(record.detectors[1].0, Detector::D4);

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn session_survives_a_failed_sweep() {
    let ct = Ct400::init().unwrap();
    let mut bench = Bench::new(ct);
    bench.output.driver_files = false;
    bench.output.record_file = false;

    // outside the laser's 1500-1630 nm limits
    bench.sweep.set_range_nm(1600.0, 1700.0);
    assert!(bench.run_sweep().is_err());
    assert!(bench.last_sweep.is_none());

    // the handle is still good for a corrected sweep
    bench.sweep.set_range_nm(1550.0, 1551.0);
    bench.sweep.set_resolution_pm(250);
    let record = bench.run_sweep().unwrap();
    assert_eq!(record.counts.resampled_points, 5);
}
