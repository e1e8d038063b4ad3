//! CLI subcommand implementations for the `jobscout` binary.

pub mod doctor;
pub mod scrape_cmd;
pub mod serve;
