//! Output → human/json string formatting.
//!
//! Two modes:
//! - **Human** (default): aligned plain text
//! - **JSON** (`--json`): `serde_json::to_string_pretty`

use clinicdb_engine::{Error, ExportReport, SeedReport, TableId, TableStatus};

/// Output formatting mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

/// Result of one executed action.
#[derive(Debug)]
pub enum Output {
    /// Tables that were reset
    Reset(Vec<TableId>),
    /// Admin seeding: username and whether it was created
    Admin { username: String, created: bool },
    /// CIE10 seeding counts
    Seeded(SeedReport),
    /// Status of every table
    Stats(Vec<TableStatus>),
    /// Export written
    Exported(ExportReport),
}

/// Format a successful output.
pub fn format_output(output: &Output, mode: OutputMode) -> String {
    match mode {
        OutputMode::Json => format_json(output),
        OutputMode::Human => format_human(output),
    }
}

/// Format an error.
pub fn format_error(err: &Error, mode: OutputMode) -> String {
    match mode {
        OutputMode::Json => serde_json::to_string_pretty(&serde_json::json!({
            "error": format!("{}", err)
        }))
        .unwrap_or_else(|_| format!("{{\"error\": \"{}\"}}", err)),
        OutputMode::Human => format!("(error) {}", err),
    }
}

fn format_human(output: &Output) -> String {
    match output {
        Output::Reset(tables) => tables
            .iter()
            .map(|t| format!("reset {}", t))
            .collect::<Vec<_>>()
            .join("\n"),
        Output::Admin { username, created } => {
            if *created {
                format!("created admin '{}'", username)
            } else {
                format!("admin '{}' already exists, skipped", username)
            }
        }
        Output::Seeded(report) => format!(
            "created {}, skipped {}",
            report.created, report.skipped
        ),
        Output::Stats(statuses) => {
            let mut lines = Vec::with_capacity(statuses.len());
            for status in statuses {
                let state = match &status.error {
                    None => "ok".to_string(),
                    Some(reason) => format!("CORRUPT: {}", reason),
                };
                lines.push(format!(
                    "{:<20} {:>8} rows  {}",
                    status.table.as_str(),
                    status.rows,
                    state
                ));
            }
            lines.join("\n")
        }
        Output::Exported(report) => format!(
            "exported {} rows of {} to {}",
            report.rows,
            report.table,
            report.path.display()
        ),
    }
}

fn format_json(output: &Output) -> String {
    let value = match output {
        Output::Reset(tables) => serde_json::json!({ "reset": tables }),
        Output::Admin { username, created } => {
            serde_json::json!({ "username": username, "created": created })
        }
        Output::Seeded(report) => serde_json::json!(report),
        Output::Stats(statuses) => serde_json::json!(statuses),
        Output::Exported(report) => serde_json::json!(report),
    };
    serde_json::to_string_pretty(&value).unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e))
}
