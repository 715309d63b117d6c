//! Idempotent seeding
//!
//! Seeding inserts rows keyed by a unique column and treats an existing
//! key as success: the row is reported as skipped, never overwritten and
//! never an error. Running the same seed twice leaves the store unchanged.

use std::path::Path;

use serde::Serialize;
use tracing::info;

use clinicdb_core::{Cie10Code, Error, NewCie10Code, NewUser, Result, Role, User};

use crate::table::Table;

/// Result of one idempotent insert
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedOutcome<T> {
    /// The row was inserted
    Created(T),
    /// A row with the same key already existed; it is returned unchanged
    Skipped(T),
}

impl<T> SeedOutcome<T> {
    /// Whether the row was inserted
    pub fn is_created(&self) -> bool {
        matches!(self, SeedOutcome::Created(_))
    }

    /// The inserted or pre-existing row
    pub fn into_inner(self) -> T {
        match self {
            SeedOutcome::Created(t) | SeedOutcome::Skipped(t) => t,
        }
    }

    /// Convert the payload, keeping the outcome
    pub fn try_map<U, F>(self, f: F) -> Result<SeedOutcome<U>>
    where
        F: FnOnce(T) -> Result<U>,
    {
        Ok(match self {
            SeedOutcome::Created(t) => SeedOutcome::Created(f(t)?),
            SeedOutcome::Skipped(t) => SeedOutcome::Skipped(f(t)?),
        })
    }
}

/// Counts of a seeding run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    /// Rows inserted
    pub created: usize,
    /// Rows whose key already existed
    pub skipped: usize,
}

impl SeedReport {
    fn record<T>(&mut self, outcome: &SeedOutcome<T>) {
        if outcome.is_created() {
            self.created += 1;
        } else {
            self.skipped += 1;
        }
    }
}

/// Seed CIE10 codes keyed by `code`
///
/// Stops at the first code that fails validation; codes seeded before it
/// stay stored.
pub fn seed_cie10<I>(codes: &Table<Cie10Code>, entries: I) -> Result<SeedReport>
where
    I: IntoIterator<Item = NewCie10Code>,
{
    let mut report = SeedReport::default();
    for entry in entries {
        let outcome = codes.create_or_skip(entry, "code")?;
        report.record(&outcome);
    }
    info!(
        target: "clinicdb::seed",
        created = report.created,
        skipped = report.skipped,
        "CIE10 codes seeded"
    );
    Ok(report)
}

/// Seed user accounts keyed by `username`
pub fn seed_users<I>(users: &Table<User>, entries: I) -> Result<SeedReport>
where
    I: IntoIterator<Item = NewUser>,
{
    let mut report = SeedReport::default();
    for entry in entries {
        let outcome = users.create_or_skip(entry, "username")?;
        report.record(&outcome);
    }
    info!(
        target: "clinicdb::seed",
        created = report.created,
        skipped = report.skipped,
        "Users seeded"
    );
    Ok(report)
}

/// Seed the bootstrap administrator
///
/// The account is active and flagged `must_change_password`.
pub fn seed_admin(
    users: &Table<User>,
    username: &str,
    password_hash: &str,
    full_name: &str,
    email: Option<&str>,
) -> Result<SeedOutcome<User>> {
    let outcome = users.create_or_skip(
        NewUser {
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            full_name: full_name.to_string(),
            email: email.map(str::to_string),
            role: Role::Admin,
            is_active: true,
            must_change_password: true,
        },
        "username",
    )?;
    info!(
        target: "clinicdb::seed",
        username,
        created = outcome.is_created(),
        "Admin account seeded"
    );
    Ok(outcome)
}

/// Read CIE10 seed entries from a JSON array of
/// `{"code", "description", "category"?}` objects
pub fn load_cie10_file(path: impl AsRef<Path>) -> Result<Vec<NewCie10Code>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|e| {
        Error::validation(format!(
            "invalid CIE10 seed file '{}': {}",
            path.display(),
            e
        ))
    })
}
