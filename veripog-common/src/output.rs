//! Unified routines to print data.

use crate::error::CheckFailure;
use ansi_term::Colour;
use atty::{self, Stream};
use libc::{self, signal};
use std::{
    fmt::Display,
    fs::{File, OpenOptions},
    io::Write,
    time::SystemTime,
};

/// Prefix of statistics and verdict lines.
const DATA_PREFIX: &str = "CHECK";

/// Destination for all diagnostics.
///
/// Messages go to stdout; when a log file is configured, each message is
/// appended there as well. The file is opened per message so that concurrent
/// workers (which serialize on a mutex around the logger) never hold a
/// long-lived handle.
#[derive(Debug)]
pub struct Logger {
    /// Verbosity level 0..4.
    pub verbosity: i32,
    /// Name of the log file, if any.
    logfile: Option<String>,
}

impl Logger {
    /// Create a logger; truncates the log file if one is given.
    pub fn new(verbosity: i32, logfile: Option<String>) -> Logger {
        if let Some(name) = &logfile {
            // Truncate, matching the original tool; later writes append.
            let _ = File::create(name);
        }
        Logger { verbosity, logfile }
    }
    /// Append a line to the log file, if one is configured.
    fn log_line(&self, line: &str) {
        if let Some(name) = &self.logfile {
            if let Ok(mut file) = OpenOptions::new().append(true).open(name) {
                let _ = writeln!(file, "{}", line);
            }
        }
    }
    /// Write a statistics or verdict line, like `CHECK: <message>`.
    pub fn data(&self, level: i32, message: impl Display) {
        if level > self.verbosity {
            return;
        }
        let line = format!("{}: {}", DATA_PREFIX, message);
        puts!("{}\n", line);
        self.log_line(&line);
    }
    /// Write a diagnostic line for the given verbosity level.
    pub fn info(&self, level: i32, message: impl Display) {
        if level > self.verbosity {
            return;
        }
        let line = format!("{}", message);
        puts!("{}\n", line);
        self.log_line(&line);
    }
    /// Write a warning, in yellow when stdout is a terminal.
    pub fn warning(&self, message: impl Display) {
        let line = format!("WARNING: {}", message);
        if is_a_tty() {
            puts!("{}\n", Colour::Yellow.bold().paint(line.as_str()));
        } else {
            puts!("{}\n", line);
        }
        self.log_line(&line);
    }
    /// Report a fatal failure; the caller exits afterwards.
    pub fn failure(&self, failure: &CheckFailure) {
        let line = format!("{}", failure);
        if is_a_tty() {
            puts!("{}\n", Colour::Red.bold().paint(line.as_str()));
        } else {
            puts!("{}\n", line);
        }
        self.log_line(&line);
    }
    /// Write the final verdict banner.
    pub fn banner(&self, message: impl Display) {
        self.data(0, message);
    }
}

/// Write a key-value pair to stdout.
pub fn print_key_value(key: &str, value: impl Display) {
    requires!(key.len() < 35);
    comment!("{:<35} {:>15}", format!("{}:", key), value);
}

/// We handle SIGPIPE ourselves to avoid printing errors.
pub fn install_signal_handler() {
    // You can't disable assert! in Rust so this is fine.
    assert!(unsafe { signal(libc::SIGPIPE, libc::SIG_DFL) } != libc::SIG_ERR);
}

/// Our version of `std::unreachable()`, unsafe if invariants are disabled.
pub fn unreachable() -> ! {
    invariant!(false, "unreachable");
    unsafe { std::hint::unreachable_unchecked() }
}

/// Check whether we are writing to a terminal.
pub fn is_a_tty() -> bool {
    atty::is(Stream::Stdout)
}

/// A RAII object that prints a timing message when it is destroyed.
pub struct Timer {
    /// The name of the thing that is being timed
    name: &'static str,
    /// The start time, set at construction time
    start: SystemTime,
    /// Whether this timer should be silenced
    pub disabled: bool,
}

impl Timer {
    /// Create a timer with a given name.
    pub fn name(name: &'static str) -> Timer {
        Timer {
            name,
            start: SystemTime::now(),
            disabled: false,
        }
    }
    /// Seconds elapsed since construction.
    pub fn elapsed(&self) -> f64 {
        match self.start.elapsed() {
            Ok(duration) => duration.as_secs_f64(),
            Err(_) => 0.0,
        }
    }
}

impl Drop for Timer {
    /// Write the elapsed time as comment.
    fn drop(&mut self) {
        if self.disabled {
            return;
        }
        let elapsed_time = self.start.elapsed().expect("failed to get time");
        print_key_value(
            &format!("{} (s)", self.name),
            format!(
                "{}.{:03}",
                elapsed_time.as_secs(),
                elapsed_time.subsec_millis()
            ),
        );
    }
}
