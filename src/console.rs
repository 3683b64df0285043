#![warn(clippy::pedantic)]
use std::io::{self, BufRead, Write};

use chrono::Local;

use crate::bench::Bench;

/// Reads colon-separated commands from stdin and feeds them to the bench
/// until EOF or an EXIT/QUIT. One command, one blocking driver round-trip,
/// one reply line.
pub fn run(bench: &mut Bench) {
    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        let _ = io::stdout().flush();
        line.clear();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                eprintln!("[{}] failed to read command: {e}", Local::now());
                break;
            }
        }
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed.eq_ignore_ascii_case("exit") || trimmed.eq_ignore_ascii_case("quit") {
            break;
        }
        match bench.process_command(trimmed.split(':')) {
            Ok(None) => println!("ok"),
            Ok(Some(reply)) => println!("{reply}"),
            Err(()) => eprintln!("[{}] failed to process command <{trimmed}>", Local::now()),
        }
    }
}
