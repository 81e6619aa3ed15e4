//! gitread CLI binary
//!
//! Minimal entrypoint; all logic is in the library and `cli::run()` handles
//! every bit of output including errors.

fn main() {
    if let Err(code) = gitread::cli::run() {
        std::process::exit(code);
    }
}
