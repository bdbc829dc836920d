//! tombola CLI entry point
//!
//! Minimal entrypoint: parse arguments, dispatch to the CLI module, print
//! errors to stderr and exit non-zero on failure. All setup (config loading,
//! runtime construction, context initialization) lives in `cli`.

use tombola::cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
