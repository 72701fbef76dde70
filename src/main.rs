//! Tracks local projects and the hostname:port pairs they claim.
//!
//! Binary crate entry point. All CLI logic is in the `cli` module; the
//! registry itself lives in the `locport` library crate.

mod cli;

fn main() {
    cli::run();
}
