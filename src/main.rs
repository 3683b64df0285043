#![warn(clippy::pedantic)]
#![warn(clippy::all)]

use std::env;
use std::fs::read_to_string;
use std::path::{Path, PathBuf};

use chrono::Local;

use ct400ctl::{configs, console, util};
use libct400_sys::Ct400;

fn main() {
    env_logger::init();

    let cfg_path = env::args()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| util::find_file(Path::new("config.toml")))
        .expect("no configuration file given and no config.toml found");
    println!("Reading config file {}", cfg_path.display());
    let cfg_text = read_to_string(&cfg_path).expect("Failed to open config file!");
    let cfg: toml::Value = toml::from_str(&cfg_text).expect("Failed to parse config file");

    let ct = Ct400::init().expect("Failed to initialize the CT400!");
    assert!(ct.check_connected(), "the CT400 is not connected");
    println!(
        "Number of inputs: {}",
        ct.nb_inputs().expect("instrument did not report its inputs")
    );
    println!(
        "Number of detectors: {}",
        ct.nb_detectors()
            .expect("instrument did not report its detectors")
    );
    println!(
        "Instrument option: {:?}",
        ct.ct400_type().expect("instrument did not report its type")
    );

    let mut bench =
        configs::bench_from_config(&cfg, ct).expect("Failed to construct bench from config file");

    if configs::autorun_from_config(&cfg) {
        match bench.run_sweep() {
            Ok(record) => println!("{}", record.summary()),
            Err(e) => eprintln!("[{}] sweep failed: {e}", Local::now()),
        }
    }

    console::run(&mut bench);
}
