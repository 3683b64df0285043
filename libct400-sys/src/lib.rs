#![warn(clippy::pedantic)]
#![warn(clippy::all)]

#[macro_use]
pub mod core;
pub mod laser;
pub mod scan;
pub mod tester;

pub use tester::Ct400;
