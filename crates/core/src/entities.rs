//! Typed entities
//!
//! One struct per table for stored rows (`User`, `Patient`, ...) and one
//! creation payload per table (`NewUser`, `NewPatient`, ...). Creation
//! payloads list exactly the fields a caller supplies; identifiers, derived
//! counters and generated-document flags are filled in by the store.
//!
//! Conversions go through [`Row`] so the storage layer only ever sees one
//! representation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::row::Row;
use crate::schema::{schema, TableId};
use crate::value::Value;

/// A typed view of one table's rows
pub trait Entity: Sized + Clone + Send + Sync + 'static {
    /// Creation payload
    type New: Send;

    /// Table the entity lives in
    const TABLE: TableId;

    /// Primary key
    fn id(&self) -> i64;

    /// Decode a stored row
    fn from_row(row: &Row) -> Result<Self>;

    /// Encode into a row
    fn to_row(&self) -> Row;

    /// Encode a creation payload into a row with id 0 and derived columns zeroed
    fn new_row(new: Self::New) -> Row;
}

fn row(table: TableId, cells: Vec<Value>) -> Row {
    Row::from_cells_unchecked(schema(table), cells)
}

// ============================================================================
// Users
// ============================================================================

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full access, manages accounts
    Admin,
    /// Creates clinical records
    Doctor,
    /// Read-only access
    Reader,
}

impl Role {
    /// Stored representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Doctor => "doctor",
            Role::Reader => "reader",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "admin" => Ok(Role::Admin),
            "doctor" => Ok(Role::Doctor),
            "reader" => Ok(Role::Reader),
            other => Err(Error::validation(format!("unknown role '{}'", other))),
        }
    }
}

/// A user account
///
/// `password_hash` is opaque: hashing happens outside the store.
/// `must_change_password` is stored and returned, never enforced here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Primary key
    pub id: i64,
    /// Login name (unique)
    pub username: String,
    /// Opaque credential hash
    pub password_hash: String,
    /// Display name
    pub full_name: String,
    /// Contact email
    pub email: Option<String>,
    /// Access role
    pub role: Role,
    /// Whether the account may log in
    pub is_active: bool,
    /// Set by bootstrap seeding for first-login accounts
    pub must_change_password: bool,
}

/// Creation payload for [`User`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    /// Login name (unique)
    pub username: String,
    /// Opaque credential hash
    pub password_hash: String,
    /// Display name
    pub full_name: String,
    /// Contact email
    #[serde(default)]
    pub email: Option<String>,
    /// Access role
    pub role: Role,
    /// Whether the account may log in
    #[serde(default = "default_true")]
    pub is_active: bool,
    /// Flag for first-login accounts
    #[serde(default)]
    pub must_change_password: bool,
}

fn default_true() -> bool {
    true
}

impl Entity for User {
    type New = NewUser;
    const TABLE: TableId = TableId::Users;

    fn id(&self) -> i64 {
        self.id
    }

    fn from_row(row: &Row) -> Result<Self> {
        Ok(User {
            id: row.int("id")?,
            username: row.text("username")?,
            password_hash: row.text("password_hash")?,
            full_name: row.text("full_name")?,
            email: row.opt_text("email"),
            role: row.text("role")?.parse()?,
            is_active: row.boolean("is_active")?,
            must_change_password: row.boolean("must_change_password")?,
        })
    }

    fn to_row(&self) -> Row {
        row(
            Self::TABLE,
            vec![
                Value::Int(self.id),
                self.username.clone().into(),
                self.password_hash.clone().into(),
                self.full_name.clone().into(),
                self.email.clone().into(),
                self.role.as_str().into(),
                self.is_active.into(),
                self.must_change_password.into(),
            ],
        )
    }

    fn new_row(new: NewUser) -> Row {
        row(
            Self::TABLE,
            vec![
                Value::Int(0),
                new.username.into(),
                new.password_hash.into(),
                new.full_name.into(),
                new.email.into(),
                new.role.as_str().into(),
                new.is_active.into(),
                new.must_change_password.into(),
            ],
        )
    }
}

// ============================================================================
// CIE10 codes
// ============================================================================

/// A CIE10 (ICD-10) diagnostic code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cie10Code {
    /// Primary key
    pub id: i64,
    /// Code, e.g. `J06.9` (unique)
    pub code: String,
    /// Human-readable description
    pub description: String,
    /// Chapter or grouping
    pub category: Option<String>,
    /// Whether the code is offered for new diagnoses
    pub is_active: bool,
}

/// Creation payload for [`Cie10Code`]; new codes start active
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCie10Code {
    /// Code (unique)
    pub code: String,
    /// Description
    pub description: String,
    /// Chapter or grouping
    #[serde(default)]
    pub category: Option<String>,
}

impl Entity for Cie10Code {
    type New = NewCie10Code;
    const TABLE: TableId = TableId::Cie10Codes;

    fn id(&self) -> i64 {
        self.id
    }

    fn from_row(row: &Row) -> Result<Self> {
        Ok(Cie10Code {
            id: row.int("id")?,
            code: row.text("code")?,
            description: row.text("description")?,
            category: row.opt_text("category"),
            is_active: row.boolean("is_active")?,
        })
    }

    fn to_row(&self) -> Row {
        row(
            Self::TABLE,
            vec![
                Value::Int(self.id),
                self.code.clone().into(),
                self.description.clone().into(),
                self.category.clone().into(),
                self.is_active.into(),
            ],
        )
    }

    fn new_row(new: NewCie10Code) -> Row {
        row(
            Self::TABLE,
            vec![
                Value::Int(0),
                new.code.into(),
                new.description.into(),
                new.category.into(),
                Value::Bool(true),
            ],
        )
    }
}

// ============================================================================
// Patients
// ============================================================================

/// A patient (worker of a client company)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patient {
    /// Primary key
    pub id: i64,
    /// National identification number (unique)
    pub identification: String,
    /// Full name
    pub full_name: String,
    /// Job position
    pub position: Option<String>,
    /// Work area
    pub work_area: Option<String>,
    /// Employer
    pub company: Option<String>,
    /// Date of birth
    pub birth_date: Option<NaiveDate>,
    /// Contact phone
    pub phone: Option<String>,
}

/// Creation payload for [`Patient`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPatient {
    /// National identification number (unique)
    pub identification: String,
    /// Full name
    pub full_name: String,
    /// Job position
    #[serde(default)]
    pub position: Option<String>,
    /// Work area
    #[serde(default)]
    pub work_area: Option<String>,
    /// Employer
    #[serde(default)]
    pub company: Option<String>,
    /// Date of birth
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
    /// Contact phone
    #[serde(default)]
    pub phone: Option<String>,
}

impl Entity for Patient {
    type New = NewPatient;
    const TABLE: TableId = TableId::Patients;

    fn id(&self) -> i64 {
        self.id
    }

    fn from_row(row: &Row) -> Result<Self> {
        Ok(Patient {
            id: row.int("id")?,
            identification: row.text("identification")?,
            full_name: row.text("full_name")?,
            position: row.opt_text("position"),
            work_area: row.opt_text("work_area"),
            company: row.opt_text("company"),
            birth_date: row.opt_date("birth_date"),
            phone: row.opt_text("phone"),
        })
    }

    fn to_row(&self) -> Row {
        row(
            Self::TABLE,
            vec![
                Value::Int(self.id),
                self.identification.clone().into(),
                self.full_name.clone().into(),
                self.position.clone().into(),
                self.work_area.clone().into(),
                self.company.clone().into(),
                self.birth_date.into(),
                self.phone.clone().into(),
            ],
        )
    }

    fn new_row(new: NewPatient) -> Row {
        row(
            Self::TABLE,
            vec![
                Value::Int(0),
                new.identification.into(),
                new.full_name.into(),
                new.position.into(),
                new.work_area.into(),
                new.company.into(),
                new.birth_date.into(),
                new.phone.into(),
            ],
        )
    }
}

// ============================================================================
// Medical records
// ============================================================================

/// A consultation
///
/// `monthly_count` and `annual_count` are computed by the store when the
/// record is created: how many consultations the patient has had in the
/// same calendar month / year, this one included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicalRecord {
    /// Primary key
    pub id: i64,
    /// Patient seen
    pub patient_id: i64,
    /// Attending doctor (user id)
    pub doctor_id: i64,
    /// Consultation date
    pub date: NaiveDate,
    /// Consultation time, `HH:MM`
    pub time: String,
    /// Kind of consultation
    pub consult_type: String,
    /// Main CIE10 code
    pub cie10_code: Option<String>,
    /// Diagnosis text
    pub diagnosis: String,
    /// Prescription text
    pub prescription: Option<String>,
    /// Days of medical leave granted
    pub days_of_rest: i64,
    /// Consultations this calendar month, including this one
    pub monthly_count: i64,
    /// Consultations this calendar year, including this one
    pub annual_count: i64,
    /// Whether a certificate was issued for this consultation
    pub certificate_generated: bool,
}

/// Creation payload for [`MedicalRecord`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMedicalRecord {
    /// Patient seen
    pub patient_id: i64,
    /// Attending doctor (user id)
    pub doctor_id: i64,
    /// Consultation date
    pub date: NaiveDate,
    /// Consultation time, `HH:MM`
    pub time: String,
    /// Kind of consultation
    pub consult_type: String,
    /// Main CIE10 code
    #[serde(default)]
    pub cie10_code: Option<String>,
    /// Diagnosis text
    pub diagnosis: String,
    /// Prescription text
    #[serde(default)]
    pub prescription: Option<String>,
    /// Days of medical leave granted
    #[serde(default)]
    pub days_of_rest: i64,
}

impl Entity for MedicalRecord {
    type New = NewMedicalRecord;
    const TABLE: TableId = TableId::MedicalRecords;

    fn id(&self) -> i64 {
        self.id
    }

    fn from_row(row: &Row) -> Result<Self> {
        Ok(MedicalRecord {
            id: row.int("id")?,
            patient_id: row.int("patient_id")?,
            doctor_id: row.int("doctor_id")?,
            date: row.date("date")?,
            time: row.text("time")?,
            consult_type: row.text("consult_type")?,
            cie10_code: row.opt_text("cie10_code"),
            diagnosis: row.text("diagnosis")?,
            prescription: row.opt_text("prescription"),
            days_of_rest: row.int("days_of_rest")?,
            monthly_count: row.int("monthly_count")?,
            annual_count: row.int("annual_count")?,
            certificate_generated: row.boolean("certificate_generated")?,
        })
    }

    fn to_row(&self) -> Row {
        row(
            Self::TABLE,
            vec![
                Value::Int(self.id),
                Value::Int(self.patient_id),
                Value::Int(self.doctor_id),
                self.date.into(),
                self.time.clone().into(),
                self.consult_type.clone().into(),
                self.cie10_code.clone().into(),
                self.diagnosis.clone().into(),
                self.prescription.clone().into(),
                Value::Int(self.days_of_rest),
                Value::Int(self.monthly_count),
                Value::Int(self.annual_count),
                self.certificate_generated.into(),
            ],
        )
    }

    fn new_row(new: NewMedicalRecord) -> Row {
        row(
            Self::TABLE,
            vec![
                Value::Int(0),
                Value::Int(new.patient_id),
                Value::Int(new.doctor_id),
                new.date.into(),
                new.time.into(),
                new.consult_type.into(),
                new.cie10_code.into(),
                new.diagnosis.into(),
                new.prescription.into(),
                Value::Int(new.days_of_rest),
                Value::Int(0),
                Value::Int(0),
                Value::Bool(false),
            ],
        )
    }
}

// ============================================================================
// Incidents
// ============================================================================

/// A workplace incident report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Incident {
    /// Primary key
    pub id: i64,
    /// Injured patient
    pub patient_id: i64,
    /// Reporting doctor (user id)
    pub doctor_id: i64,
    /// Incident date
    pub date: NaiveDate,
    /// Diagnosis text
    pub diagnosis: String,
    /// Main CIE10 code
    pub cie10_code: Option<String>,
    /// Secondary CIE10 code
    pub secondary_code: Option<String>,
    /// Narrative of the incident
    pub description: Option<String>,
    /// Whether the report PDF was rendered
    pub pdf_generated: bool,
}

/// Creation payload for [`Incident`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewIncident {
    /// Injured patient
    pub patient_id: i64,
    /// Reporting doctor (user id)
    pub doctor_id: i64,
    /// Incident date
    pub date: NaiveDate,
    /// Diagnosis text
    pub diagnosis: String,
    /// Main CIE10 code
    #[serde(default)]
    pub cie10_code: Option<String>,
    /// Secondary CIE10 code
    #[serde(default)]
    pub secondary_code: Option<String>,
    /// Narrative of the incident
    #[serde(default)]
    pub description: Option<String>,
}

impl Entity for Incident {
    type New = NewIncident;
    const TABLE: TableId = TableId::Incidents;

    fn id(&self) -> i64 {
        self.id
    }

    fn from_row(row: &Row) -> Result<Self> {
        Ok(Incident {
            id: row.int("id")?,
            patient_id: row.int("patient_id")?,
            doctor_id: row.int("doctor_id")?,
            date: row.date("date")?,
            diagnosis: row.text("diagnosis")?,
            cie10_code: row.opt_text("cie10_code"),
            secondary_code: row.opt_text("secondary_code"),
            description: row.opt_text("description"),
            pdf_generated: row.boolean("pdf_generated")?,
        })
    }

    fn to_row(&self) -> Row {
        row(
            Self::TABLE,
            vec![
                Value::Int(self.id),
                Value::Int(self.patient_id),
                Value::Int(self.doctor_id),
                self.date.into(),
                self.diagnosis.clone().into(),
                self.cie10_code.clone().into(),
                self.secondary_code.clone().into(),
                self.description.clone().into(),
                self.pdf_generated.into(),
            ],
        )
    }

    fn new_row(new: NewIncident) -> Row {
        row(
            Self::TABLE,
            vec![
                Value::Int(0),
                Value::Int(new.patient_id),
                Value::Int(new.doctor_id),
                new.date.into(),
                new.diagnosis.into(),
                new.cie10_code.into(),
                new.secondary_code.into(),
                new.description.into(),
                Value::Bool(false),
            ],
        )
    }
}

// ============================================================================
// Antidoping records
// ============================================================================

/// An antidoping test result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AntidopingRecord {
    /// Primary key
    pub id: i64,
    /// Tested patient
    pub patient_id: i64,
    /// Test date
    pub date: NaiveDate,
    /// Identification shown at the test
    pub identification: String,
    /// Identity verification outcome
    pub verification: String,
    /// Test evaluation
    pub evaluation: String,
}

/// Creation payload for [`AntidopingRecord`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAntidopingRecord {
    /// Tested patient
    pub patient_id: i64,
    /// Test date
    pub date: NaiveDate,
    /// Identification shown at the test
    pub identification: String,
    /// Identity verification outcome
    pub verification: String,
    /// Test evaluation
    pub evaluation: String,
}

impl Entity for AntidopingRecord {
    type New = NewAntidopingRecord;
    const TABLE: TableId = TableId::AntidopingRecords;

    fn id(&self) -> i64 {
        self.id
    }

    fn from_row(row: &Row) -> Result<Self> {
        Ok(AntidopingRecord {
            id: row.int("id")?,
            patient_id: row.int("patient_id")?,
            date: row.date("date")?,
            identification: row.text("identification")?,
            verification: row.text("verification")?,
            evaluation: row.text("evaluation")?,
        })
    }

    fn to_row(&self) -> Row {
        row(
            Self::TABLE,
            vec![
                Value::Int(self.id),
                Value::Int(self.patient_id),
                self.date.into(),
                self.identification.clone().into(),
                self.verification.clone().into(),
                self.evaluation.clone().into(),
            ],
        )
    }

    fn new_row(new: NewAntidopingRecord) -> Row {
        row(
            Self::TABLE,
            vec![
                Value::Int(0),
                Value::Int(new.patient_id),
                new.date.into(),
                new.identification.into(),
                new.verification.into(),
                new.evaluation.into(),
            ],
        )
    }
}

// ============================================================================
// Certificates
// ============================================================================

/// A medical leave certificate issued for a consultation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certificate {
    /// Primary key
    pub id: i64,
    /// Consultation the certificate belongs to
    pub medical_record_id: i64,
    /// Patient on leave
    pub patient_id: i64,
    /// Issuing doctor (user id)
    pub doctor_id: i64,
    /// First day of leave
    pub start_date: NaiveDate,
    /// Last day of leave
    pub end_date: NaiveDate,
    /// Inclusive day count between the two dates
    pub valid_days: i64,
    /// Whether the certificate PDF was rendered
    pub pdf_generated: bool,
}

/// Creation payload for [`Certificate`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCertificate {
    /// Consultation the certificate belongs to
    pub medical_record_id: i64,
    /// Patient on leave
    pub patient_id: i64,
    /// Issuing doctor (user id)
    pub doctor_id: i64,
    /// First day of leave
    pub start_date: NaiveDate,
    /// Last day of leave
    pub end_date: NaiveDate,
}

impl Entity for Certificate {
    type New = NewCertificate;
    const TABLE: TableId = TableId::Certificates;

    fn id(&self) -> i64 {
        self.id
    }

    fn from_row(row: &Row) -> Result<Self> {
        Ok(Certificate {
            id: row.int("id")?,
            medical_record_id: row.int("medical_record_id")?,
            patient_id: row.int("patient_id")?,
            doctor_id: row.int("doctor_id")?,
            start_date: row.date("start_date")?,
            end_date: row.date("end_date")?,
            valid_days: row.int("valid_days")?,
            pdf_generated: row.boolean("pdf_generated")?,
        })
    }

    fn to_row(&self) -> Row {
        row(
            Self::TABLE,
            vec![
                Value::Int(self.id),
                Value::Int(self.medical_record_id),
                Value::Int(self.patient_id),
                Value::Int(self.doctor_id),
                self.start_date.into(),
                self.end_date.into(),
                Value::Int(self.valid_days),
                self.pdf_generated.into(),
            ],
        )
    }

    fn new_row(new: NewCertificate) -> Row {
        row(
            Self::TABLE,
            vec![
                Value::Int(0),
                Value::Int(new.medical_record_id),
                Value::Int(new.patient_id),
                Value::Int(new.doctor_id),
                new.start_date.into(),
                new.end_date.into(),
                Value::Int(0),
                Value::Bool(false),
            ],
        )
    }
}
