//! Clinic: one typed table per entity over a shared store
//!
//! Also hosts the only workflow spanning two tables, issuing a
//! certificate. It runs as two independent critical sections (create the
//! certificate, then flag the consultation). There is no cross-table
//! transaction: if the second step fails, the certificate exists and the
//! consultation keeps `certificate_generated = false`.

use std::path::Path;
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{info, warn};

use clinicdb_core::{
    AntidopingRecord, Certificate, Changes, Cie10Code, Entity, Incident, MedicalRecord,
    NewCertificate, Patient, Result, TableId, User,
};

use crate::query::Filter;
use crate::store::Store;
use crate::table::Table;

/// Typed access to every clinic table
#[derive(Debug, Clone)]
pub struct Clinic {
    store: Arc<Store>,
    /// User accounts
    pub users: Table<User>,
    /// CIE10 catalogue
    pub cie10_codes: Table<Cie10Code>,
    /// Patients
    pub patients: Table<Patient>,
    /// Consultations
    pub medical_records: Table<MedicalRecord>,
    /// Workplace incidents
    pub incidents: Table<Incident>,
    /// Antidoping tests
    pub antidoping_records: Table<AntidopingRecord>,
    /// Leave certificates
    pub certificates: Table<Certificate>,
}

impl Clinic {
    /// Open the store in `data_dir` and wrap it
    pub fn open(data_dir: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(Store::open(data_dir)?))
    }

    /// Wrap an already opened store
    pub fn new(store: Arc<Store>) -> Self {
        Self {
            users: Table::new(Arc::clone(&store)),
            cie10_codes: Table::new(Arc::clone(&store)),
            patients: Table::new(Arc::clone(&store)),
            medical_records: Table::new(Arc::clone(&store)),
            incidents: Table::new(Arc::clone(&store)),
            antidoping_records: Table::new(Arc::clone(&store)),
            certificates: Table::new(Arc::clone(&store)),
            store,
        }
    }

    /// Underlying store
    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    /// Issue a leave certificate for a consultation
    ///
    /// The certificate's patient is the consultation's patient. Returns the
    /// certificate and the flagged consultation.
    ///
    /// # Errors
    ///
    /// `NotFound` if the consultation does not exist, `Validation` if
    /// `end < start`, `ReferentialIntegrity` for an unknown doctor, and any
    /// error of the second step after the certificate was stored.
    pub fn issue_certificate(
        &self,
        medical_record_id: i64,
        doctor_id: i64,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<(Certificate, MedicalRecord)> {
        let record = self.medical_records.get_by_id(medical_record_id)?;
        let certificate = self.certificates.create(NewCertificate {
            medical_record_id,
            patient_id: record.patient_id,
            doctor_id,
            start_date,
            end_date,
        })?;

        let flagged = self
            .medical_records
            .update(
                medical_record_id,
                &Changes::new().set("certificate_generated", true),
            )
            .map_err(|e| {
                warn!(
                    target: "clinicdb::store",
                    certificate_id = certificate.id,
                    medical_record_id,
                    error = %e,
                    "Certificate stored but consultation not flagged"
                );
                e
            })?;

        info!(
            target: "clinicdb::store",
            certificate_id = certificate.id,
            medical_record_id,
            valid_days = certificate.valid_days,
            "Certificate issued"
        );
        Ok((certificate, flagged))
    }

    /// Certificates issued for a consultation, in issue order
    pub fn certificates_for(&self, medical_record_id: i64) -> Result<Vec<Certificate>> {
        self.medical_records.get_by_id(medical_record_id)?;
        let filter = Filter::new().reference("medical_record_id", medical_record_id);
        self.store
            .export_selection(TableId::Certificates, &filter)?
            .iter()
            .map(Certificate::from_row)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clinicdb_core::{Error, NewMedicalRecord, NewPatient, NewUser, Role};
    use tempfile::TempDir;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn consultation(clinic: &Clinic) -> (i64, i64) {
        let doctor = clinic
            .users
            .create(NewUser {
                username: "drlopez".into(),
                password_hash: "h".into(),
                full_name: "Dr. Lopez".into(),
                email: None,
                role: Role::Doctor,
                is_active: true,
                must_change_password: false,
            })
            .unwrap();
        let patient = clinic
            .patients
            .create(NewPatient {
                identification: "1718".into(),
                full_name: "Carlos Ruiz".into(),
                ..Default::default()
            })
            .unwrap();
        let record = clinic
            .medical_records
            .create(NewMedicalRecord {
                patient_id: patient.id,
                doctor_id: doctor.id,
                date: date(2024, 6, 3),
                time: "10:15".into(),
                consult_type: "occupational".into(),
                cie10_code: Some("M54.5".into()),
                diagnosis: "Low back pain".into(),
                prescription: Some("Ibuprofen".into()),
                days_of_rest: 2,
            })
            .unwrap();
        (record.id, doctor.id)
    }

    #[test]
    fn issue_certificate_flags_consultation() {
        let dir = TempDir::new().unwrap();
        let clinic = Clinic::open(dir.path()).unwrap();
        let (record_id, doctor_id) = consultation(&clinic);

        let (cert, record) = clinic
            .issue_certificate(record_id, doctor_id, date(2024, 6, 3), date(2024, 6, 4))
            .unwrap();
        assert_eq!(cert.valid_days, 2);
        assert_eq!(cert.patient_id, record.patient_id);
        assert!(record.certificate_generated);
        assert!(clinic.medical_records.get_by_id(record_id).unwrap().certificate_generated);
        assert_eq!(clinic.certificates_for(record_id).unwrap(), vec![cert]);
    }

    #[test]
    fn rejected_certificate_leaves_consultation_unflagged() {
        let dir = TempDir::new().unwrap();
        let clinic = Clinic::open(dir.path()).unwrap();
        let (record_id, doctor_id) = consultation(&clinic);

        let err = clinic
            .issue_certificate(record_id, doctor_id, date(2024, 6, 5), date(2024, 6, 1))
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(clinic.certificates.count(), 0);
        assert!(!clinic.medical_records.get_by_id(record_id).unwrap().certificate_generated);

        let err = clinic
            .issue_certificate(record_id, 99, date(2024, 6, 1), date(2024, 6, 1))
            .unwrap_err();
        assert!(matches!(err, Error::ReferentialIntegrity { .. }));
    }

    #[test]
    fn unknown_consultation() {
        let dir = TempDir::new().unwrap();
        let clinic = Clinic::open(dir.path()).unwrap();
        let err = clinic
            .issue_certificate(5, 1, date(2024, 1, 1), date(2024, 1, 1))
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { id: 5, .. }));
    }
}
