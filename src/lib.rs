extern crate libct400_sys;
extern crate serde;
extern crate toml;

pub mod bench;
pub mod configs;
pub mod console;
pub mod monitor;
pub mod ring_buffer;
pub mod sweep;
pub mod traces;
pub mod util;
