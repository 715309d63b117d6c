//! ClinicDB CLI: maintenance commands for a data directory.
//!
//! `clinicdb [--data-dir DIR] [--json] COMMAND`
//!
//! Commands run one at a time against the store and exit. The store's
//! lock file keeps the CLI from running against a directory that a server
//! process has open.
//!
//! Exit status is 2 for bad arguments or input the store rejects, and 1 when
//! the store itself fails (I/O, corrupt container, config).

mod commands;
mod format;
mod parse;

use std::process;

use clinicdb_engine::{
    load_cie10_file, seed_admin, seed_cie10, Clinic, Error, Filter, Result, TableId,
};
use tracing_subscriber::EnvFilter;

use commands::{build_cli, DEFAULT_DATA_DIR};
use format::{format_error, format_output, Output, OutputMode};
use parse::{matches_to_action, CliAction};

const EXIT_FAILURE: i32 = 1;
const EXIT_USAGE: i32 = 2;

fn exit_code(err: &Error) -> i32 {
    if err.is_client_error() {
        EXIT_USAGE
    } else {
        EXIT_FAILURE
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let matches = build_cli().get_matches();
    let output_mode = if matches.get_flag("json") {
        OutputMode::Json
    } else {
        OutputMode::Human
    };

    let action = match matches_to_action(&matches) {
        Ok(action) => action,
        Err(e) => {
            eprintln!("(error) {}", e);
            process::exit(EXIT_USAGE);
        }
    };

    let data_dir = matches
        .get_one::<String>("data-dir")
        .map(|s| s.as_str())
        .unwrap_or(DEFAULT_DATA_DIR);

    let result = Clinic::open(data_dir).and_then(|clinic| execute(&clinic, action));
    match result {
        Ok(output) => {
            let formatted = format_output(&output, output_mode);
            if !formatted.is_empty() {
                println!("{}", formatted);
            }
        }
        Err(e) => {
            eprintln!("{}", format_error(&e, output_mode));
            process::exit(exit_code(&e));
        }
    }
}

fn execute(clinic: &Clinic, action: CliAction) -> Result<Output> {
    let store = clinic.store();
    match action {
        CliAction::Reset(table) => {
            store.reset(table)?;
            Ok(Output::Reset(vec![table]))
        }
        CliAction::ResetAll => {
            store.reset_all()?;
            Ok(Output::Reset(TableId::ALL.to_vec()))
        }
        CliAction::SeedAdmin {
            username,
            password_hash,
            full_name,
            email,
        } => {
            let outcome = seed_admin(
                &clinic.users,
                &username,
                &password_hash,
                &full_name,
                email.as_deref(),
            )?;
            Ok(Output::Admin {
                created: outcome.is_created(),
                username,
            })
        }
        CliAction::SeedCie10 { file } => {
            let entries = load_cie10_file(&file)?;
            Ok(Output::Seeded(seed_cie10(&clinic.cie10_codes, entries)?))
        }
        CliAction::Stats => Ok(Output::Stats(store.load_report())),
        CliAction::Export {
            table,
            from,
            to,
            out,
        } => {
            if table.schema().date_column.is_none() {
                return Err(Error::validation(format!(
                    "{} has no date column to export by",
                    table
                )));
            }
            let report = store.export_to(table, &Filter::new().between(from, to), &out)?;
            Ok(Output::Exported(report))
        }
    }
}
