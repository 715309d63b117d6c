//! ArgMatches → CliAction translation.
//!
//! All argument validation (table names, dates) happens here so that
//! `main` only dispatches well-formed actions.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::ArgMatches;
use clinicdb_engine::TableId;

/// A fully parsed CLI request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliAction {
    /// Reset one table
    Reset(TableId),
    /// Reset every table
    ResetAll,
    /// Seed the bootstrap administrator
    SeedAdmin {
        username: String,
        password_hash: String,
        full_name: String,
        email: Option<String>,
    },
    /// Seed CIE10 codes from a JSON file
    SeedCie10 { file: PathBuf },
    /// Per-table status
    Stats,
    /// Export a date range of one table
    Export {
        table: TableId,
        from: NaiveDate,
        to: NaiveDate,
        out: PathBuf,
    },
}

/// Translate parsed arguments into an action.
pub fn matches_to_action(matches: &ArgMatches) -> Result<CliAction, String> {
    match matches.subcommand() {
        Some(("reset", sub)) => Ok(CliAction::Reset(parse_table(required(sub, "table")?)?)),
        Some(("reset-all", _)) => Ok(CliAction::ResetAll),
        Some(("seed-admin", sub)) => Ok(CliAction::SeedAdmin {
            username: required(sub, "username")?.to_string(),
            password_hash: required(sub, "password-hash")?.to_string(),
            full_name: required(sub, "full-name")?.to_string(),
            email: sub.get_one::<String>("email").cloned(),
        }),
        Some(("seed-cie10", sub)) => Ok(CliAction::SeedCie10 {
            file: PathBuf::from(required(sub, "file")?),
        }),
        Some(("stats", _)) => Ok(CliAction::Stats),
        Some(("export", sub)) => {
            let from = parse_date(required(sub, "from")?)?;
            let to = parse_date(required(sub, "to")?)?;
            if from > to {
                return Err(format!("--from {} is after --to {}", from, to));
            }
            Ok(CliAction::Export {
                table: parse_table(required(sub, "table")?)?,
                from,
                to,
                out: PathBuf::from(required(sub, "out")?),
            })
        }
        Some((other, _)) => Err(format!("unknown command '{}'", other)),
        None => Err("no command given".to_string()),
    }
}

fn required<'a>(matches: &'a ArgMatches, name: &str) -> Result<&'a str, String> {
    matches
        .get_one::<String>(name)
        .map(String::as_str)
        .ok_or_else(|| format!("missing argument '{}'", name))
}

fn parse_table(s: &str) -> Result<TableId, String> {
    s.parse::<TableId>()
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| format!("invalid date '{}' (expected YYYY-MM-DD): {}", s, e))
}
