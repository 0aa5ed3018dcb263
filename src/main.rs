//! specforge CLI binary.
//!
//! The entrypoint is minimal: all logic lives in the library and
//! `cli::run()` handles output; main only maps errors to the process exit.

fn main() {
    if let Err(e) = specforge::cli::run() {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
