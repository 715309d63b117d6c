//! Clap command tree definition.
//!
//! Builds the full `clap::Command` tree for the operator CLI. Every
//! subcommand works on one data directory, chosen with `--data-dir`.

use clap::{Arg, ArgAction, Command};

/// Default data directory when `--data-dir` is not given.
pub const DEFAULT_DATA_DIR: &str = "data";

/// Build the complete CLI command tree.
pub fn build_cli() -> Command {
    Command::new("clinicdb")
        .about("Maintenance tool for ClinicDB data directories")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("data-dir")
                .long("data-dir")
                .help("Data directory (default: data)")
                .global(true),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("JSON output mode")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .subcommand(build_reset())
        .subcommand(build_reset_all())
        .subcommand(build_seed_admin())
        .subcommand(build_seed_cie10())
        .subcommand(build_stats())
        .subcommand(build_export())
}

// =========================================================================
// Reset
// =========================================================================

fn build_reset() -> Command {
    Command::new("reset")
        .about("Replace one table with an empty container; ids restart at 1")
        .arg(Arg::new("table").required(true).help("Table name, e.g. patients"))
}

fn build_reset_all() -> Command {
    Command::new("reset-all").about("Reset every table")
}

// =========================================================================
// Seeding
// =========================================================================

fn build_seed_admin() -> Command {
    Command::new("seed-admin")
        .about("Create the bootstrap administrator unless the username exists")
        .arg(Arg::new("username").long("username").required(true))
        .arg(
            Arg::new("password-hash")
                .long("password-hash")
                .required(true)
                .help("Already hashed password; stored as given"),
        )
        .arg(Arg::new("full-name").long("full-name").required(true))
        .arg(Arg::new("email").long("email"))
}

fn build_seed_cie10() -> Command {
    Command::new("seed-cie10")
        .about("Load CIE10 codes from a JSON file, skipping codes already present")
        .arg(
            Arg::new("file")
                .required(true)
                .help("JSON array of {code, description, category?}"),
        )
}

// =========================================================================
// Inspection
// =========================================================================

fn build_stats() -> Command {
    Command::new("stats").about("Row count and load status of every table")
}

fn build_export() -> Command {
    Command::new("export")
        .about("Write the rows of a date range into a standalone container")
        .arg(Arg::new("table").required(true))
        .arg(
            Arg::new("from")
                .long("from")
                .required(true)
                .help("First day, YYYY-MM-DD"),
        )
        .arg(
            Arg::new("to")
                .long("to")
                .required(true)
                .help("Last day, YYYY-MM-DD"),
        )
        .arg(Arg::new("out").long("out").required(true).help("Output file"))
}
