//! # photostat CLI
//!
//! Command-line interface for the photo import engine.
//!
//! ## Usage
//! ```bash
//! photostat config --repository ~/Photos
//! photostat import -p /media/card/DCIM --visibility private --tags holiday
//! photostat import -p ~/Downloads --visibility public --link --dry
//! ```

mod cli;

use std::process::ExitCode;

fn main() -> ExitCode {
    cli::run()
}
